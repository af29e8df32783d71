use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use maud::{html, Markup};
use rust_i18n::t;
use serde::Deserialize;

use super::{require_role, toast_only};
use crate::{
    extractors::AuthGuard,
    models::Role,
    rejections::{AppError, ResultExt},
    services::{student::SubmitQuestionOutcome, Notice, NoticeKind},
    views::{
        components,
        student::{self as student_views, QuestionForm},
    },
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/student/questions", get(list_questions).post(submit_question))
}

pub(super) async fn panel(
    state: &AppState,
    student_id: i32,
    form: &QuestionForm<'_>,
) -> Result<Markup, AppError> {
    let teachers = state
        .students
        .list_teachers()
        .await
        .reject("could not list teachers")?;
    let threads = state
        .students
        .list_own_questions(student_id)
        .await
        .reject("could not list questions")?;
    Ok(student_views::panel(&teachers, &threads, form))
}

async fn list_questions(
    State(state): State<AppState>,
    AuthGuard(signed_in): AuthGuard,
) -> Result<Markup, AppError> {
    require_role(&signed_in, Role::Student)?;
    let threads = state
        .students
        .list_own_questions(signed_in.user.id)
        .await
        .reject("could not list questions")?;
    Ok(student_views::question_list(&threads))
}

#[derive(Deserialize)]
struct QuestionPost {
    #[serde(default)]
    content: String,
    #[serde(default)]
    teacher_id: String,
}

async fn submit_question(
    State(state): State<AppState>,
    AuthGuard(signed_in): AuthGuard,
    Form(body): Form<QuestionPost>,
) -> Result<Response, AppError> {
    require_role(&signed_in, Role::Student)?;

    let teacher_id = Some(body.teacher_id.trim())
        .filter(|id| !id.is_empty())
        .map(str::parse::<i32>)
        .transpose()
        .reject_input("invalid teacher id")?;

    let student_id = signed_in.user.id;
    match state
        .students
        .submit_question(student_id, &body.content, teacher_id)
        .await
    {
        SubmitQuestionOutcome::Submitted(question) => {
            tracing::info!("student {student_id} asked question {}", question.id);
            let fresh = panel(&state, student_id, &QuestionForm::default()).await?;
            let notice = Notice::new(
                NoticeKind::Success,
                t!("student.submitted_title"),
                t!("student.submitted_desc"),
            );
            Ok(html! {
                (fresh)
                (components::toast(&notice))
            }
            .into_response())
        }
        SubmitQuestionOutcome::MissingContent | SubmitQuestionOutcome::MissingTeacher => {
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        SubmitQuestionOutcome::Failed => Ok(toast_only(&Notice::new(
            NoticeKind::Error,
            t!("student.submit_failed_title"),
            t!("student.submit_failed_desc"),
        ))),
    }
}
