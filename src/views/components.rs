use chrono::{DateTime, Utc};
use maud::{html, Markup};

use crate::services::{Notice, NoticeKind};

/// htmx navigation link with href fallback + hx-get for in-page swap.
pub fn nav_link(href: &str, body: Markup) -> Markup {
    html! {
        a href=(href)
          hx-get=(href)
          hx-target="main"
          hx-push-url="true"
          hx-swap="innerHTML" {
            (body)
        }
    }
}

fn kind_class(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Info => "toast-info",
        NoticeKind::Success => "toast-success",
        NoticeKind::Warning => "toast-warning",
        NoticeKind::Error => "toast-error",
    }
}

/// A toast that lands in the page's `#toasts` container out of band, so it
/// can ride along with any response or server-sent event.
pub fn toast(notice: &Notice) -> Markup {
    let role = match notice.kind {
        NoticeKind::Error | NoticeKind::Warning => "alert",
        NoticeKind::Info | NoticeKind::Success => "status",
    };
    html! {
        div hx-swap-oob="afterbegin:#toasts" {
            article class={ "toast " (kind_class(notice.kind)) } role=(role)
                hx-on-click="this.remove()" {
                strong { (notice.title) }
                @if !notice.description.is_empty() {
                    p { (notice.description) }
                }
            }
        }
    }
}

pub fn badge(label: &str, class: &str) -> Markup {
    html! {
        mark class={ "badge " (class) } { (label) }
    }
}

/// `Mon, Jan 5, 2026`
pub fn date(at: &DateTime<Utc>) -> String {
    at.format("%a, %b %-d, %Y").to_string()
}

/// `Mon, Jan 5, 2026, 3:07 PM`
pub fn date_time(at: &DateTime<Utc>) -> String {
    at.format("%a, %b %-d, %Y, %-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_is_out_of_band_and_styled_by_kind() {
        let notice = Notice::new(NoticeKind::Warning, "Careful", "Something half worked");
        let html = toast(&notice).into_string();
        assert!(html.contains(r##"hx-swap-oob="afterbegin:#toasts""##));
        assert!(html.contains("toast-warning"));
        assert!(html.contains(r#"role="alert""#));
        assert!(html.contains("Something half worked"));
    }

    #[test]
    fn dates_are_human_readable() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 15, 7, 0).unwrap();
        assert_eq!(date(&at), "Mon, Jan 5, 2026");
        assert_eq!(date_time(&at), "Mon, Jan 5, 2026, 3:07 PM");
    }

    #[test]
    fn toast_escapes_text() {
        let notice = Notice::new(NoticeKind::Info, "<b>", "");
        let html = toast(&notice).into_string();
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<p>"));
    }
}
