use axum::{
    http::{header::InvalidHeaderValue, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Thirty days.
const SESSION_MAX_AGE: u32 = 60 * 60 * 24 * 30;

pub fn cookie(name: &str, value: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}={value}; HttpOnly; Max-Age={SESSION_MAX_AGE}{secure}; Path=/; SameSite=Strict"
    ))
}

pub fn clear_cookie(name: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{name}=; HttpOnly; Max-Age=0{secure}; Path=/; SameSite=Strict"
    ))
}

/// `303 See Other` for plain requests; htmx requests get `HX-Redirect` so the
/// whole page navigates instead of swapping a fragment.
pub fn redirect(is_htmx: bool, to: &'static str) -> Response {
    if is_htmx {
        ([("HX-Redirect", to)], "").into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_and_strict() {
        let value = cookie("user_session", "abc", false).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("user_session=abc;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Strict"));
        assert!(!value.contains("Secure"));

        let secure = cookie("user_session", "abc", true).unwrap();
        assert!(secure.to_str().unwrap().contains("; Secure"));
    }

    #[test]
    fn redirect_depends_on_htmx() {
        let plain = redirect(false, "/auth");
        assert_eq!(plain.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(plain.headers()["location"], "/auth");

        let htmx = redirect(true, "/auth");
        assert_eq!(htmx.status(), axum::http::StatusCode::OK);
        assert_eq!(htmx.headers()["HX-Redirect"], "/auth");
    }

    #[test]
    fn clearing_expires_immediately() {
        let value = clear_cookie("user_session", true).unwrap();
        assert!(value.to_str().unwrap().starts_with("user_session=; HttpOnly; Max-Age=0"));
    }
}
