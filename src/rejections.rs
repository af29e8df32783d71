use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::views;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("internal error: {0}")]
    Internal(&'static str),
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad input: {0}")]
    Input(&'static str),
    #[error("not found")]
    NotFound,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Input(_) => "INPUT_ERROR",
            AppError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let page = views::page(
            "Error",
            html! {
                h1 { (self.code()) }
                @if let AppError::Input(message) = &self {
                    p { (message) }
                }
            },
        );
        (self.status(), page).into_response()
    }
}

pub trait ResultExt<T> {
    /// Log the error and turn it into an internal server error.
    fn reject(self, message: &'static str) -> Result<T, AppError>;

    fn reject_input(self, message: &'static str) -> Result<T, AppError>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn reject(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{message}: {e}");
            AppError::Internal(message)
        })
    }

    fn reject_input(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::debug!("{message}: {e}");
            AppError::Input(message)
        })
    }
}
