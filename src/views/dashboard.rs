use maud::{html, Markup};
use rust_i18n::t;

use crate::{models::Profile, names, views::auth::role_label};

fn header(profile: &Profile) -> Markup {
    html! {
        header.dashboard-header {
            hgroup {
                h2 { (t!("app.name")) }
                p {
                    (t!("dashboard.welcome_back", name = &profile.full_name, role = role_label(profile.role)))
                }
            }
            button.secondary.outline
                hx-post=(names::SIGN_OUT_URL)
                hx-disabled-elt="this" {
                (t!("dashboard.sign_out"))
            }
        }
    }
}

/// The signed-in shell. `panel` is the role-specific view. The shell holds the
/// live-update connection; notices arrive as out-of-band toasts and the panels
/// re-fetch on the same event.
pub fn shell(profile: Option<&Profile>, panel: Markup) -> Markup {
    let Some(profile) = profile else {
        return html! {
            article.empty-state {
                h3 { (t!("dashboard.no_profile")) }
            }
        };
    };

    html! {
        (header(profile))
        div.dashboard hx-ext="sse" sse-connect=(names::EVENTS_URL) {
            div hidden sse-swap="notice" hx-swap="none" {}
            (panel)
        }
    }
}
