use std::collections::HashMap;

use color_eyre::{eyre::OptionExt, Result};

use super::models::QuestionRow;
use super::Db;
use crate::{
    models::{AnswerView, Question, QuestionStatus, QuestionThread},
    realtime::{ChangeKind, Record},
};

const QUESTION_COLUMNS: &str = "q.id, q.content, q.status, q.created_at, q.student_id, q.teacher_id";

impl Db {
    /// Questions asked by `student_id`, newest first, each with the addressed
    /// teacher's name and every answer.
    pub async fn questions_for_student(&self, student_id: i32) -> Result<Vec<QuestionThread>> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            SELECT {QUESTION_COLUMNS}, COALESCE(p.full_name, '') AS counterpart_name
            FROM questions q
            LEFT JOIN profiles p ON p.user_id = q.teacher_id
            WHERE q.student_id = $1
            ORDER BY q.created_at DESC, q.id DESC
            "#
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_answers(rows).await
    }

    /// Questions addressed to `teacher_id`, newest first, each with the asking
    /// student's name and every answer.
    pub async fn questions_for_teacher(&self, teacher_id: i32) -> Result<Vec<QuestionThread>> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"
            SELECT {QUESTION_COLUMNS}, COALESCE(p.full_name, '') AS counterpart_name
            FROM questions q
            LEFT JOIN profiles p ON p.user_id = q.student_id
            WHERE q.teacher_id = $1
            ORDER BY q.created_at DESC, q.id DESC
            "#
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        self.with_answers(rows).await
    }

    async fn with_answers(&self, rows: Vec<QuestionRow>) -> Result<Vec<QuestionThread>> {
        let ids: Vec<i32> = rows.iter().map(|r| r.question.id).collect();

        let mut answers: HashMap<i32, Vec<AnswerView>> = HashMap::new();
        for row in self.answers_for_questions(&ids).await? {
            answers
                .entry(row.answer.question_id)
                .or_default()
                .push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| QuestionThread {
                answers: answers.remove(&row.question.id).unwrap_or_default(),
                counterpart_name: row.counterpart_name,
                question: row.question,
            })
            .collect())
    }

    pub async fn create_question(
        &self,
        student_id: i32,
        teacher_id: i32,
        content: &str,
    ) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (content, student_id, teacher_id)
            VALUES ($1, $2, $3)
            RETURNING id, content, status, created_at, student_id, teacher_id
            "#,
        )
        .bind(content)
        .bind(student_id)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "question created: id={}, student_id={student_id}, teacher_id={teacher_id}",
            question.id
        );
        self.feed
            .publish(ChangeKind::Insert, Record::Question(question.clone()));

        Ok(question)
    }

    pub async fn mark_answered(&self, question_id: i32) -> Result<Question> {
        let question = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions SET status = $1
            WHERE id = $2
            RETURNING id, content, status, created_at, student_id, teacher_id
            "#,
        )
        .bind(QuestionStatus::Answered.as_str())
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_eyre("question to mark as answered does not exist")?;

        tracing::info!("question marked answered: id={question_id}");
        self.feed
            .publish(ChangeKind::Update, Record::Question(question.clone()));

        Ok(question)
    }

    pub async fn question_belongs_to(&self, question_id: i32, student_id: i32) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM questions WHERE id = $1 AND student_id = $2)",
        )
        .bind(question_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Status of a question addressed to `teacher_id`, `None` if the teacher
    /// has no such question.
    pub async fn assigned_question_status(
        &self,
        teacher_id: i32,
        question_id: i32,
    ) -> Result<Option<QuestionStatus>> {
        let status: Option<String> = sqlx::query_scalar(
            "SELECT status FROM questions WHERE id = $1 AND teacher_id = $2",
        )
        .bind(question_id)
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status.map(|s| s.parse::<QuestionStatus>()).transpose()?)
    }
}
