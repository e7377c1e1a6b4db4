use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Demo account switcher for local development and on-site demos.
pub fn demo_routes() -> Router<AppState> {
    Router::new()
        .route("/demo", get(handlers::demo_accounts))
        .route("/demo/session/{role}", post(handlers::demo_session))
}
