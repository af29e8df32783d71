use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
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
    services::{teacher::AnswerOutcome, Notice, NoticeKind},
    views::{components, teacher as teacher_views},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/teacher/questions", get(list_questions))
        .route("/teacher/questions/new", get(new_questions))
        .route("/teacher/questions/{id}/answer", post(submit_answer))
}

pub(super) async fn board(state: &AppState, teacher_id: i32) -> Result<Markup, AppError> {
    let board = state
        .teachers
        .board(teacher_id)
        .await
        .reject("could not load assigned questions")?;
    let states = state.teachers.submission_states(teacher_id);
    Ok(teacher_views::board(&board, &states))
}

async fn list_questions(
    State(state): State<AppState>,
    AuthGuard(signed_in): AuthGuard,
) -> Result<Markup, AppError> {
    require_role(&signed_in, Role::Teacher)?;
    board(&state, signed_in.user.id).await
}

#[derive(Deserialize)]
struct NewQuestionsQuery {
    #[serde(default)]
    after: i32,
}

async fn new_questions(
    State(state): State<AppState>,
    AuthGuard(signed_in): AuthGuard,
    Query(query): Query<NewQuestionsQuery>,
) -> Result<Markup, AppError> {
    require_role(&signed_in, Role::Teacher)?;
    let teacher_id = signed_in.user.id;

    let board = state
        .teachers
        .board(teacher_id)
        .await
        .reject("could not load assigned questions")?;
    let states = state.teachers.submission_states(teacher_id);
    Ok(teacher_views::new_pending(&board, query.after, &states))
}

/// Moves the settled question to the answered list, with a toast.
async fn answered(
    state: &AppState,
    teacher_id: i32,
    question_id: i32,
    notice: &Notice,
) -> Result<Response, AppError> {
    let board = state
        .teachers
        .board(teacher_id)
        .await
        .reject("could not load assigned questions")?;
    Ok(html! {
        (teacher_views::answered(&board, question_id))
        (components::toast(notice))
    }
    .into_response())
}

/// Toast for each outcome; `None` when there is nothing to tell.
fn answer_notice(outcome: &AnswerOutcome) -> Option<Notice> {
    let notice = match outcome {
        AnswerOutcome::Answered(_) => Notice::new(
            NoticeKind::Success,
            t!("teacher.submitted_title"),
            t!("teacher.submitted_desc"),
        ),
        AnswerOutcome::AlreadyAnswered => {
            Notice::new(NoticeKind::Info, t!("teacher.already_answered"), "")
        }
        AnswerOutcome::AnswerSavedStatusStale { .. } => Notice::new(
            NoticeKind::Warning,
            t!("teacher.status_stale_title"),
            t!("teacher.status_stale_desc"),
        ),
        AnswerOutcome::Failed(_) => Notice::new(
            NoticeKind::Error,
            t!("teacher.submit_failed_title"),
            t!("teacher.submit_failed_desc"),
        ),
        AnswerOutcome::AlreadyInFlight => Notice::new(NoticeKind::Info, t!("teacher.in_flight"), ""),
        AnswerOutcome::NotAssigned => Notice::new(NoticeKind::Error, t!("teacher.not_assigned"), ""),
        AnswerOutcome::EmptyContent => return None,
    };
    Some(notice)
}

#[derive(Deserialize)]
struct AnswerPost {
    #[serde(default)]
    content: String,
}

async fn submit_answer(
    State(state): State<AppState>,
    AuthGuard(signed_in): AuthGuard,
    Path(question_id): Path<i32>,
    Form(body): Form<AnswerPost>,
) -> Result<Response, AppError> {
    require_role(&signed_in, Role::Teacher)?;
    let teacher_id = signed_in.user.id;

    let outcome = state
        .teachers
        .submit_answer(teacher_id, question_id, &body.content)
        .await;

    let Some(notice) = answer_notice(&outcome) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    match outcome {
        AnswerOutcome::Answered(_) | AnswerOutcome::AlreadyAnswered => {
            answered(&state, teacher_id, question_id, &notice).await
        }
        _ => Ok(toast_only(&notice)),
    }
}
