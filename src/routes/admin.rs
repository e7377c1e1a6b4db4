use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, put},
};

/// Moderation API. Each handler checks for the ADMIN role after the session
/// has been resolved, so non-admins receive 403 and anonymous callers 401.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::admin_stats))
        .route("/users", get(handlers::admin_users))
        .route("/users/{id}/role", put(handlers::admin_set_role))
        .route("/vacancies/{id}", delete(handlers::admin_remove_vacancy))
}
