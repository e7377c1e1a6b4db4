use crate::{AppState, guards, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Routes reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST/DELETE /api/auth/session
        // Sign in with a provider-issued token / sign out.
        .route(
            "/api/auth/session",
            post(handlers::create_session).delete(handlers::delete_session),
        )
        // GET /dashboard
        // Entry point after login: 307 to the caller's role home.
        .route("/dashboard", get(guards::dashboard_entry))
}
