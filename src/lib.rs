rust_i18n::i18n!("locales", fallback = "en");

pub mod db;
pub mod email;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod realtime;
pub mod rejections;
pub mod services;
pub mod statics;
pub mod utils;
pub mod views;

use axum::{middleware, Router};

use crate::{
    db::Db,
    email::ResendEmailSender,
    services::{auth::AuthService, student::StudentService, teacher::TeacherService},
};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub students: StudentService,
    pub teachers: TeacherService,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: Db, email: ResendEmailSender, base_url: String, secure_cookies: bool) -> Self {
        let feed = db.feed().clone();
        Self {
            auth: AuthService::new(db.clone(), email, base_url),
            students: StudentService::new(db.clone(), feed.clone()),
            teachers: TeacherService::new(db, feed),
            secure_cookies,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::homepage::routes())
        .merge(handlers::auth::routes())
        .merge(handlers::dashboard::routes())
        .merge(handlers::student::routes())
        .merge(handlers::teacher::routes())
        .merge(handlers::events::routes())
        .layer(middleware::from_fn(csrf_check))
        .nest("/static", statics::routes())
        .with_state(state)
}

async fn csrf_check(
    req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    use axum::http::{Method, StatusCode};
    use axum::response::IntoResponse;

    let state_changing = [Method::POST, Method::PUT, Method::PATCH, Method::DELETE];

    if state_changing.contains(req.method()) {
        let has_hx_request = req
            .headers()
            .get("HX-Request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "true");

        if !has_hx_request {
            tracing::warn!("rejected {} {} without HX-Request", req.method(), req.uri().path());
            return (StatusCode::FORBIDDEN, "CSRF check failed").into_response();
        }
    }

    next.run(req).await
}
