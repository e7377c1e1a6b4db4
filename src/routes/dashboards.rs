use crate::{AppState, pages, rbac::RouteGroup};
use axum::{Router, routing::get};

/// Dashboard groups. Paths are registered in full (not nested) so the page
/// guard sees the same path the browser requested.
pub fn dashboard_routes() -> Router<AppState> {
    let router = Router::new()
        .route("/admin", get(pages::admin_home))
        .route("/club", get(pages::club_home))
        .route("/parent", get(pages::parent_home))
        .route("/player", get(pages::player_home))
        .route("/scout", get(pages::talent_desk_home))
        .route("/agent", get(pages::talent_desk_home))
        .route("/talent", get(pages::talent_search))
        .route("/vacancies", get(pages::vacancy_board));

    // Unknown pages inside a group still pass through the guard before the 404,
    // so anonymous visitors are sent to login rather than told what exists.
    // The catch-all never matches an empty remainder, so `{prefix}/` is its own route.
    RouteGroup::ALL.into_iter().fold(router, |router, group| {
        router
            .route(&format!("{}/", group.prefix()), get(pages::unknown_page))
            .route(
                &format!("{}/{{*rest}}", group.prefix()),
                get(pages::unknown_page),
            )
    })
}
