use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

/// API routes for any signed-in user. Every handler takes `AuthUser`, so a
/// missing session is rejected with 401 before the handler body runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(handlers::get_me))
        .route(
            "/api/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        // --- Vacancies (posting and closing: CLUB only) ---
        .route(
            "/api/vacancies",
            get(handlers::list_vacancies).post(handlers::create_vacancy),
        )
        .route("/api/vacancies/{id}/close", patch(handlers::close_vacancy))
        // --- Evaluations and shortlists (SCOUT, CLUB, AGENT) ---
        .route("/api/evaluations", post(handlers::create_evaluation))
        .route(
            "/api/players/{id}/evaluations",
            get(handlers::player_evaluations),
        )
        .route(
            "/api/shortlist",
            get(handlers::get_shortlist).post(handlers::add_to_shortlist),
        )
        .route(
            "/api/shortlist/{player_id}",
            delete(handlers::remove_from_shortlist),
        )
        // --- Families (PARENT) ---
        .route("/api/parent/children", post(handlers::link_child))
        // --- Notifications ---
        // The unread count is polled by the client every 30 seconds.
        .route("/api/notifications", get(handlers::get_notifications))
        .route(
            "/api/notifications/unread-count",
            get(handlers::unread_count),
        )
        .route(
            "/api/notifications/{id}/read",
            patch(handlers::mark_notification_read),
        )
}
