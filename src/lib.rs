use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod demo;
pub mod error;
pub mod guards;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod pages;
pub mod rbac;
pub mod repository;
pub mod validation;

// Routers segregated by access level (public, authenticated, admin, dashboards, demo).
pub mod routes;
use routes::{admin, authenticated, dashboards, demo as demo_routes, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use rbac::{Role, RouteGroup};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json`.
/// Dashboard view models are not part of it: they are consumed by the web
/// client only.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_session, handlers::delete_session, handlers::get_me,
        handlers::get_profile, handlers::update_profile,
        handlers::list_vacancies, handlers::create_vacancy, handlers::close_vacancy,
        handlers::create_evaluation, handlers::player_evaluations,
        handlers::get_shortlist, handlers::add_to_shortlist, handlers::remove_from_shortlist,
        handlers::link_child,
        handlers::get_notifications, handlers::unread_count, handlers::mark_notification_read,
        handlers::admin_stats, handlers::admin_users, handlers::admin_set_role,
        handlers::admin_remove_vacancy,
        handlers::demo_accounts, handlers::demo_session,
    ),
    components(
        schemas(
            models::User, models::Profile, models::Vacancy, models::Evaluation,
            models::ShortlistEntry, models::Notification, models::NotificationKind,
            models::CreateSessionRequest, models::CreateEvaluationRequest,
            models::CreateVacancyRequest, models::UpdateProfileRequest,
            models::AddShortlistRequest, models::LinkChildRequest, models::UpdateRoleRequest,
            models::SessionInfo, models::UnreadCount, models::AdminStats, models::RoleCount,
            models::DemoAccount, rbac::Role, validation::FieldError,
        )
    ),
    tags(
        (name = "atmosfera", description = "Atmosfera hockey platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request: the persistence layer and the immutable configuration.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routers, attaches the access layers to the groups that need
/// them, and wraps everything in the request-id, tracing and logging stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static(logging::REQUEST_ID_HEADER);

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .nest("/api/admin", admin::admin_routes())
        // Dashboards: 307 to login or to the role home before any handler runs.
        .merge(
            dashboards::dashboard_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                guards::page_guard,
            )),
        )
        // Demo switcher: 404 in production unless requested from localhost.
        .merge(
            demo_routes::demo_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                guards::demo_gate,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // The span carries the request id into every event logged downstream;
                // completion is recorded by `log_requests`.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(())
                        .on_failure(()),
                )
                .layer(middleware::from_fn(logging::log_requests))
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span with method, URI and the `x-request-id` value.
fn trace_span_logger(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(logging::REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
