use std::{convert::Infallible, time::Duration};

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use rust_i18n::t;

use crate::{
    names,
    services::session::{GuardDecision, RouteGuard, SessionContext, SignedIn},
    utils, views, AppState,
};

/// Upper bound on resolving a session from its cookie.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "true")
}

/// Extracts whether the request is an HTMX request by checking the `HX-Request` header.
pub struct IsHtmx(pub bool);

impl<S: Send + Sync> FromRequestParts<S> for IsHtmx {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IsHtmx(is_htmx(&parts.headers)))
    }
}

/// The session cookie (if any) and a context resolved from it. Resolution
/// that runs past the timeout leaves the context resolving.
pub struct CurrentSession {
    pub token: Option<String>,
    pub context: SessionContext,
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(names::USER_SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string());

        let context = SessionContext::new();
        let resolution = context.resolve(&state.auth, token.as_deref());
        if tokio::time::timeout(RESOLVE_TIMEOUT, resolution).await.is_err() {
            tracing::warn!("session resolution timed out for {}", parts.uri.path());
        }

        Ok(CurrentSession { token, context })
    }
}

/// Answer for a request whose session has not resolved in time. Page loads
/// get a placeholder that polls the same path; htmx requests, which may be
/// fragments or form posts, reload the page they came from instead.
fn still_resolving(is_htmx: bool, path: &str) -> Response {
    if is_htmx {
        return [("HX-Refresh", "true")].into_response();
    }
    views::page(&t!("app.loading_title"), views::layout::loading(path)).into_response()
}

/// Lets a request through only with an identity and a profile. A session
/// still resolving gets a placeholder that polls again; anything else is sent
/// to the sign-in screen.
pub struct AuthGuard(pub SignedIn);

impl FromRequestParts<AppState> for AuthGuard {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_htmx = is_htmx(&parts.headers);
        let session = match CurrentSession::from_request_parts(parts, state).await {
            Ok(session) => session,
            Err(never) => match never {},
        };

        match RouteGuard::evaluate(&session.context.state()) {
            GuardDecision::Allow(signed_in) => Ok(AuthGuard(signed_in)),
            GuardDecision::Loading => Err(still_resolving(is_htmx, parts.uri.path())),
            GuardDecision::RedirectToSignIn => Err(utils::redirect(is_htmx, names::AUTH_URL)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_text(resp: Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn unresolved_page_load_polls_the_same_path() {
        let resp = still_resolving(false, "/dashboard");
        assert!(resp.headers().get("HX-Refresh").is_none());

        let html = body_text(resp).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Loading - EduConnect</title>"));
        assert!(html.contains(r#"hx-get="/dashboard""#));
    }

    #[tokio::test]
    async fn unresolved_htmx_request_reloads_the_page() {
        for path in ["/teacher/questions/5/answer", "/student/questions"] {
            let resp = still_resolving(true, path);
            assert_eq!(resp.headers()["HX-Refresh"], "true");
            assert!(!body_text(resp).await.contains("hx-get"));
        }
    }
}
