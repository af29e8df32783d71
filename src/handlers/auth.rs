use axum::{
    extract::{Form, Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use maud::html;
use rust_i18n::t;
use serde::Deserialize;

use super::toast_only;
use crate::{
    extractors::{CurrentSession, IsHtmx},
    names,
    rejections::{AppError, ResultExt},
    services::{
        auth::{SignInOutcome, SignUpOutcome},
        session::{GuardDecision, RouteGuard},
        Notice, NoticeKind,
    },
    utils,
    views::{
        self,
        auth::AuthTab,
        components, homepage as homepage_views,
    },
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth", get(auth_page))
        .route("/sign-in", post(sign_in_post))
        .route("/sign-up", post(sign_up_post))
        .route("/sign-out", post(sign_out_post))
        .route("/verify-email/{token}", get(verify_email))
        .route("/resend-verification", post(resend_verification))
}

/// Sets the session cookie and sends the browser to the dashboard.
fn signed_in_response(state: &AppState, token: &str) -> Result<Response, AppError> {
    let cookie = utils::cookie(names::USER_SESSION_COOKIE_NAME, token, state.secure_cookies)
        .reject("could not build session cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    headers.insert("HX-Redirect", HeaderValue::from_static(names::DASHBOARD_URL));
    Ok((headers, "").into_response())
}

/// Leaves the submitted form as it is and fills its message slot.
fn form_failed(error: &str) -> Response {
    ([("HX-Reswap", "none")], views::auth::form_error(error)).into_response()
}

#[derive(Deserialize)]
struct AuthQuery {
    tab: Option<String>,
}

async fn auth_page(
    IsHtmx(is_htmx): IsHtmx,
    session: CurrentSession,
    Query(query): Query<AuthQuery>,
) -> Response {
    if let GuardDecision::Allow(_) = RouteGuard::evaluate(&session.context.state()) {
        return utils::redirect(is_htmx, names::DASHBOARD_URL);
    }

    let tab = AuthTab::from_query(query.tab.as_deref());
    views::render(
        is_htmx,
        &t!("auth.title"),
        views::auth::auth_screen(tab),
    )
    .into_response()
}

#[derive(Deserialize)]
struct SignInPost {
    email: String,
    password: String,
}

async fn sign_in_post(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(body): Form<SignInPost>,
) -> Result<Response, AppError> {
    let email = body.email.trim();
    let outcome = session
        .context
        .sign_in(&state.auth, email, &body.password)
        .await;

    let error = match outcome {
        Ok(SignInOutcome::Success(token)) => {
            tracing::info!("{email} signed in");
            return signed_in_response(&state, &token);
        }
        Ok(SignInOutcome::EmptyFields) => t!("auth.empty_fields"),
        Ok(SignInOutcome::InvalidCredentials) => t!("auth.invalid_credentials"),
        Ok(SignInOutcome::EmailNotVerified) => t!("auth.email_not_verified"),
        Err(e) => {
            tracing::error!("sign-in failed for {email}: {e}");
            t!("auth.unexpected_error")
        }
    };

    Ok(form_failed(&error))
}

#[derive(Deserialize)]
struct SignUpPost {
    email: String,
    password: String,
    full_name: String,
    #[serde(default)]
    role: String,
}

async fn sign_up_post(
    State(state): State<AppState>,
    session: CurrentSession,
    Form(body): Form<SignUpPost>,
) -> Result<Response, AppError> {
    let email = body.email.trim();
    let outcome = session
        .context
        .sign_up(&state.auth, email, &body.password, &body.full_name, &body.role)
        .await;

    let error = match outcome {
        Ok(SignUpOutcome::SignedIn(token)) => {
            tracing::info!("{email} signed up as {}", body.role);
            return signed_in_response(&state, &token);
        }
        Ok(SignUpOutcome::ConfirmationPending(email)) => {
            return Ok(html! {
                section #auth-screen { (views::auth::check_email(&email)) }
            }
            .into_response());
        }
        Ok(SignUpOutcome::ConfirmationEmailFailed(_)) => t!("auth.confirmation_email_failed"),
        Ok(SignUpOutcome::EmptyFields) => t!("auth.empty_fields"),
        Ok(SignUpOutcome::MissingRole) => t!("auth.missing_role"),
        Ok(SignUpOutcome::EmailTaken) => t!("auth.email_taken"),
        Err(e) => {
            tracing::error!("sign-up failed for {email}: {e}");
            t!("auth.unexpected_error")
        }
    };

    Ok(form_failed(&error))
}

async fn sign_out_post(
    State(state): State<AppState>,
    session: CurrentSession,
) -> Result<Response, AppError> {
    if let Err(e) = session
        .context
        .sign_out(&state.auth, session.token.as_deref())
        .await
    {
        tracing::warn!("could not delete session on sign-out: {e}");
    }

    let clear = utils::clear_cookie(names::USER_SESSION_COOKIE_NAME, state.secure_cookies)
        .reject("could not build clear cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear);
    headers.insert("HX-Redirect", HeaderValue::from_static(names::AUTH_URL));

    Ok((headers, "").into_response())
}

async fn verify_email(
    State(state): State<AppState>,
    IsHtmx(is_htmx): IsHtmx,
    Path(token): Path<String>,
) -> Result<maud::Markup, AppError> {
    let verified = state
        .auth
        .verify_email(&token)
        .await
        .reject("could not verify email token")?;

    if verified {
        Ok(views::render(
            is_htmx,
            &t!("verify.success_title"),
            homepage_views::email_verified(),
        ))
    } else {
        Ok(views::render(
            is_htmx,
            &t!("verify.failed_title"),
            homepage_views::verification_failed(),
        ))
    }
}

#[derive(Deserialize)]
struct ResendVerificationPost {
    email: String,
}

async fn resend_verification(
    State(state): State<AppState>,
    Form(body): Form<ResendVerificationPost>,
) -> Result<Response, AppError> {
    if !state.auth.confirmation_required() {
        return Err(AppError::Input("email confirmation is not configured"));
    }

    let email = body.email.trim();
    if let Err(e) = state.auth.resend_verification(email).await {
        tracing::error!("could not resend verification to {email}: {e}");
        return Ok(toast_only(&Notice::new(
            NoticeKind::Error,
            t!("auth.resend_failed_title"),
            t!("auth.resend_failed_desc"),
        )));
    }

    // Same answer whether or not the address exists.
    let sent = Notice::new(NoticeKind::Success, t!("auth.resend_sent_title"), "");
    Ok(html! {
        (views::auth::check_email(email))
        (components::toast(&sent))
    }
    .into_response())
}
