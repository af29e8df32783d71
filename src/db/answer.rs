use color_eyre::Result;

use super::models::AnswerRow;
use super::Db;
use crate::{
    models::Answer,
    realtime::{ChangeKind, Record},
};

impl Db {
    pub async fn create_answer(
        &self,
        question_id: i32,
        teacher_id: i32,
        content: &str,
    ) -> Result<Answer> {
        let answer = sqlx::query_as::<_, Answer>(
            r#"
            INSERT INTO answers (content, teacher_id, question_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, created_at, teacher_id, question_id
            "#,
        )
        .bind(content)
        .bind(teacher_id)
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "answer created: id={}, question_id={question_id}, teacher_id={teacher_id}",
            answer.id
        );
        self.feed
            .publish(ChangeKind::Insert, Record::Answer(answer.clone()));

        Ok(answer)
    }

    /// Answers for the given questions, oldest first, with the author's name.
    pub(super) async fn answers_for_questions(&self, question_ids: &[i32]) -> Result<Vec<AnswerRow>> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT a.id, a.content, a.created_at, a.teacher_id, a.question_id,
                   COALESCE(p.full_name, '') AS author_name
            FROM answers a
            LEFT JOIN profiles p ON p.user_id = a.teacher_id
            WHERE a.question_id = ANY($1)
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
