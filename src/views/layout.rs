use maud::{html, Markup, DOCTYPE};
use rust_i18n::t;

use crate::{names, utils};

const PICO_CSS: &str = "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
const HTMX_JS: &str = "https://unpkg.com/htmx.org@2.0.4";
const HTMX_SSE_JS: &str = "https://unpkg.com/htmx-ext-sse@2.2.2/sse.js";

fn css() -> Markup {
    html! {
        link rel="stylesheet" href=(PICO_CSS);
        link rel="stylesheet" href="/static/index.css";
    }
}

fn js() -> Markup {
    html! {
        script src=(HTMX_JS) {}
        script src=(HTMX_SSE_JS) {}
    }
}

fn icon() -> Markup {
    html! {
        link rel="icon" href="/static/img/icon.svg" type="image/svg+xml" {}
    }
}

fn header() -> Markup {
    html! {
        header {
            nav {
                ul {
                    li."secondary" {
                        a href=(names::HOME_URL) {
                            strong { (t!("app.name")) }
                        }
                    }
                }
                ul {
                    li."secondary" { (utils::VERSION) }
                }
            }
        }
    }
}

fn main(body: Markup) -> Markup {
    html! {
        main { (body) }
    }
}

pub fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        head {
            meta charset="utf-8";
            meta name="viewport" content="width=device-width, initial-scale=1";
            meta name="color-scheme" content="light dark";

            (css())
            (js())
            (icon())

            title { (title) " - " (t!("app.name")) }
        }

        body."container" {
            (header())
            (main(body))
            div #toasts .toasts aria-live="polite" {}
        }
    }
}

pub fn titled(title: &str, body: Markup) -> Markup {
    html! {
        title { (title) " - " (t!("app.name")) }
        (body)
    }
}

/// Full page for plain requests, a titled fragment for htmx swaps.
pub fn render(is_htmx: bool, title: &str, body: Markup) -> Markup {
    if is_htmx {
        titled(title, body)
    } else {
        page(title, body)
    }
}

/// Full-page placeholder shown while the session is still resolving; it asks
/// for `path` again after a short delay.
pub fn loading(path: &str) -> Markup {
    html! {
        div hx-get=(path) hx-trigger="load delay:1s" hx-target="main" hx-swap="innerHTML" {
            p aria-busy="true" { (t!("app.loading")) }
        }
    }
}
