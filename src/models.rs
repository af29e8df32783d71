use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Student, Role::Teacher];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lifecycle of a question. Moves from `Pending` to `Answered` once and never back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Pending,
    Answered,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Pending => "pending",
            QuestionStatus::Answered => "answered",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown question status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for QuestionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QuestionStatus::Pending),
            "answered" => Ok(QuestionStatus::Answered),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for QuestionStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Profile {
    pub user_id: i32,
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Question {
    pub id: i32,
    pub content: String,
    #[sqlx(try_from = "String")]
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    pub student_id: i32,
    pub teacher_id: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Answer {
    pub id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub teacher_id: i32,
    pub question_id: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerView {
    pub answer: Answer,
    /// Display name of the teacher who wrote the answer.
    pub author_name: String,
}

/// A question together with everything a dashboard shows next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionThread {
    pub question: Question,
    /// Teacher's name on the student side, student's name on the teacher side.
    pub counterpart_name: String,
    pub answers: Vec<AnswerView>,
}

impl QuestionThread {
    pub fn is_answered(&self) -> bool {
        self.question.status == QuestionStatus::Answered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_only_known_values() {
        assert_eq!("student".parse::<Role>().unwrap(), Role::Student);
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Teacher);

        for bad in ["", "admin", "Student", " teacher"] {
            assert!(bad.parse::<Role>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn status_round_trips_through_its_column_text() {
        for status in [QuestionStatus::Pending, QuestionStatus::Answered] {
            assert_eq!(status.as_str().parse::<QuestionStatus>().unwrap(), status);
        }
        assert!("closed".parse::<QuestionStatus>().is_err());
    }
}
