use maud::{html, Markup};
use rust_i18n::t;

use crate::{models::Role, names, views::components};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthTab {
    #[default]
    SignIn,
    SignUp,
}

impl AuthTab {
    pub fn from_query(tab: Option<&str>) -> Self {
        match tab {
            Some(names::SIGN_UP_TAB) => AuthTab::SignUp,
            _ => AuthTab::SignIn,
        }
    }
}

pub fn role_label(role: Role) -> String {
    match role {
        Role::Student => t!("role.student").to_string(),
        Role::Teacher => t!("role.teacher").to_string(),
    }
}

fn tabs(active: AuthTab) -> Markup {
    let tab = |target: AuthTab, href: String, label: String| {
        html! {
            li {
                @if target == active {
                    strong aria-current="page" { (label) }
                } @else {
                    (components::nav_link(&href, html! { (label) }))
                }
            }
        }
    };
    html! {
        nav.auth-tabs {
            ul {
                (tab(AuthTab::SignIn, names::AUTH_URL.to_string(), t!("auth.sign_in_tab").to_string()))
                (tab(AuthTab::SignUp, names::sign_up_tab_url(), t!("auth.sign_up_tab").to_string()))
            }
        }
    }
}

/// Where a failed submission's message lands; the form around it is left as
/// the user filled it in.
fn message_slot() -> Markup {
    html! {
        div #auth-message {}
    }
}

/// Out-of-band message for a failed sign-in or sign-up.
pub fn form_error(error: &str) -> Markup {
    html! {
        div #auth-message hx-swap-oob="true" {
            p.form-error role="alert" { (error) }
        }
    }
}

fn sign_in_form() -> Markup {
    html! {
        form hx-post=(names::SIGN_IN_URL)
             hx-target="#auth-screen"
             hx-swap="outerHTML"
             hx-disabled-elt="find button[type='submit']" {
            (message_slot())
            label {
                (t!("auth.email"))
                input name="email"
                      type="email"
                      autocomplete="email"
                      required="true"
                      placeholder=(t!("auth.email"));
            }
            label {
                (t!("auth.password"))
                input name="password"
                      type="password"
                      autocomplete="current-password"
                      required="true"
                      placeholder=(t!("auth.password"));
            }
            button type="submit" { (t!("auth.sign_in_btn")) }
        }
    }
}

fn sign_up_form() -> Markup {
    html! {
        form hx-post=(names::SIGN_UP_URL)
             hx-target="#auth-screen"
             hx-swap="outerHTML"
             hx-disabled-elt="find button[type='submit']" {
            (message_slot())
            label {
                (t!("auth.full_name"))
                input name="full_name"
                      type="text"
                      autocomplete="name"
                      required="true"
                      placeholder=(t!("auth.full_name"));
            }
            label {
                (t!("auth.email"))
                input name="email"
                      type="email"
                      autocomplete="email"
                      required="true"
                      placeholder=(t!("auth.email"));
            }
            label {
                (t!("auth.password"))
                input name="password"
                      type="password"
                      autocomplete="new-password"
                      required="true"
                      placeholder=(t!("auth.password"));
            }
            label {
                (t!("auth.role"))
                select name="role" required="true" {
                    option value="" disabled selected {
                        (t!("auth.role_placeholder"))
                    }
                    @for role in Role::ALL {
                        option value=(role.as_str()) {
                            (role_label(role))
                        }
                    }
                }
            }
            button type="submit" { (t!("auth.sign_up_btn")) }
        }
    }
}

/// Both forms live in one screen; only the active tab's form is shown.
pub fn auth_screen(active: AuthTab) -> Markup {
    html! {
        section #auth-screen {
            hgroup {
                h1 { (t!("auth.title")) }
                p { (t!("auth.subtitle")) }
            }
            article.auth-card {
                (tabs(active))
                @match active {
                    AuthTab::SignIn => { (sign_in_form()) },
                    AuthTab::SignUp => { (sign_up_form()) },
                }
            }
        }
    }
}

pub fn check_email(email: &str) -> Markup {
    html! {
        article {
            h1 { (t!("auth.check_email_title")) }
            p { (t!("auth.check_email_desc", email = email)) }
            form hx-post=(names::RESEND_VERIFICATION_URL) hx-target="closest article" hx-swap="outerHTML" {
                input type="hidden" name="email" value=(email);
                button.secondary type="submit" { (t!("auth.resend_btn")) }
            }
        }
    }
}
