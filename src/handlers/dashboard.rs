use axum::{extract::State, routing::get, Router};
use rust_i18n::t;

use crate::{
    extractors::{AuthGuard, IsHtmx},
    models::Role,
    rejections::AppError,
    views::{self, dashboard, student::QuestionForm},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard_page))
}

async fn dashboard_page(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    AuthGuard(signed_in): AuthGuard,
) -> Result<maud::Markup, AppError> {
    let user_id = signed_in.user.id;
    let panel = match signed_in.profile.role {
        Role::Student => super::student::panel(&state, user_id, &QuestionForm::default()).await?,
        Role::Teacher => super::teacher::board(&state, user_id).await?,
    };

    Ok(views::render(
        is_htmx,
        &t!("dashboard.title"),
        dashboard::shell(Some(&signed_in.profile), panel),
    ))
}
