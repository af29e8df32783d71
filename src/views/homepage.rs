use maud::{html, Markup};
use rust_i18n::t;

use crate::names;

pub fn landing_page(signed_in: bool) -> Markup {
    html! {
        section.landing-hero {
            h1 { (t!("landing.tagline")) }
            p.landing-hero-desc { (t!("landing.description")) }
            div.landing-cta {
                @if signed_in {
                    a role="button" href=(names::DASHBOARD_URL) {
                        (t!("landing.go_to_dashboard"))
                    }
                } @else {
                    a role="button" href=(names::sign_up_tab_url()) {
                        (t!("landing.get_started"))
                    }
                    a role="button" href=(names::AUTH_URL) class="outline" {
                        (t!("landing.sign_in"))
                    }
                }
            }
        }

        section.landing-features {
            h2 { (t!("landing.features_title")) }
            div.landing-features-grid {
                article.landing-feature-card {
                    h3 { (t!("landing.feature_ask_title")) }
                    p { (t!("landing.feature_ask_desc")) }
                }
                article.landing-feature-card {
                    h3 { (t!("landing.feature_answer_title")) }
                    p { (t!("landing.feature_answer_desc")) }
                }
                article.landing-feature-card {
                    h3 { (t!("landing.feature_live_title")) }
                    p { (t!("landing.feature_live_desc")) }
                }
            }
        }

        @if !signed_in {
            section.landing-bottom-cta {
                h2 { (t!("landing.bottom_cta_title")) }
                p { (t!("landing.bottom_cta_desc")) }
                a role="button" href=(names::sign_up_tab_url()) {
                    (t!("landing.get_started"))
                }
            }
        }
    }
}

pub fn email_verified() -> Markup {
    html! {
        article {
            h1 { (t!("verify.success_title")) }
            p { (t!("verify.success_desc")) }
            a role="button" href=(names::AUTH_URL) { (t!("landing.sign_in")) }
        }
    }
}

pub fn verification_failed() -> Markup {
    html! {
        article {
            h1 { (t!("verify.failed_title")) }
            p { (t!("verify.failed_desc")) }
            a href=(names::sign_up_tab_url()) { (t!("verify.try_again")) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_in_visitors_get_a_dashboard_link() {
        let html = landing_page(true).into_string();
        assert!(html.contains(r#"href="/dashboard""#));
        assert!(!html.contains("tab=signup"));

        let html = landing_page(false).into_string();
        assert!(html.contains(r#"href="/auth""#));
        assert!(html.contains("tab=signup"));
    }
}
