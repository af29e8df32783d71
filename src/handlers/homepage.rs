use axum::{routing::get, Router};
use rust_i18n::t;

use crate::{
    extractors::{CurrentSession, IsHtmx},
    services::session::{GuardDecision, RouteGuard},
    views::{self, homepage as homepage_views},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(homepage))
}

async fn homepage(IsHtmx(is_htmx): IsHtmx, session: CurrentSession) -> maud::Markup {
    let signed_in = matches!(
        RouteGuard::evaluate(&session.context.state()),
        GuardDecision::Allow(_)
    );
    views::render(
        is_htmx,
        &t!("landing.title"),
        homepage_views::landing_page(signed_in),
    )
}
