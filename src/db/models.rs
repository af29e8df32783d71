// Database row structs

use crate::models::{Answer, AnswerView, Question};

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i32,
    pub email: String,
}

#[derive(sqlx::FromRow)]
pub struct QuestionRow {
    #[sqlx(flatten)]
    pub question: Question,
    pub counterpart_name: String,
}

#[derive(sqlx::FromRow)]
pub struct AnswerRow {
    #[sqlx(flatten)]
    pub answer: Answer,
    pub author_name: String,
}

impl From<AnswerRow> for AnswerView {
    fn from(row: AnswerRow) -> Self {
        AnswerView {
            answer: row.answer,
            author_name: row.author_name,
        }
    }
}

/// Returned by user inserts that hit the unique email constraint.
#[derive(Debug, thiserror::Error)]
#[error("email address is already registered")]
pub struct EmailAlreadyRegistered;
