pub mod auth;
pub mod dashboard;
pub mod events;
pub mod homepage;
pub mod student;
pub mod teacher;

use axum::response::{IntoResponse, Response};

use crate::{
    models::Role,
    rejections::AppError,
    services::{session::SignedIn, Notice},
    views::components,
};

/// A toast with nothing swapped in place; the form that triggered the request
/// keeps its contents.
fn toast_only(notice: &Notice) -> Response {
    ([("HX-Reswap", "none")], components::toast(notice)).into_response()
}

fn require_role(signed_in: &SignedIn, role: Role) -> Result<(), AppError> {
    if signed_in.profile.role == role {
        Ok(())
    } else {
        tracing::warn!(
            "user {} ({}) tried to use the {role} view",
            signed_in.user.id,
            signed_in.profile.role
        );
        Err(AppError::Unauthorized)
    }
}
