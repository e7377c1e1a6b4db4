use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::resolve_session,
    config::AppConfig,
    error::AppError,
    rbac::{Access, RouteGroup, decide},
};

pub const LOGIN_PATH: &str = "/login";

/// login_redirect
///
/// Location of the login page that returns to `next` once signed in.
pub fn login_redirect(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Path and query of the request, the round-trip target after login.
fn requested_target(request: &Request) -> String {
    request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), |pq| pq.as_str().to_string())
}

/// page_guard
///
/// Route-group gate in front of the dashboards. Unauthenticated requests are
/// sent (307) to login with the requested path and query as `next`; a signed-in
/// role outside the group's allow-list is sent (307) to its own home. Allowed
/// requests continue with the resolved `AuthUser` in the request extensions.
pub async fn page_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(group) = RouteGroup::for_path(request.uri().path()) else {
        return next.run(request).await;
    };
    let requested = requested_target(&request);

    let user = match resolve_session(request.headers(), &state.repo, &state.config).await {
        Ok(user) => Some(user),
        Err(AppError::Unauthorized) => None,
        Err(e) => return e.into_response(),
    };

    match decide(group, user.map(|u| u.role), &requested) {
        Access::Allow => {
            if let Some(user) = user {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        Access::Login { next: target } => {
            tracing::debug!(path = %requested, "no session, redirecting to login");
            Redirect::temporary(&login_redirect(&target)).into_response()
        }
        Access::Redirect(home) => {
            tracing::debug!(path = %requested, home, "role not admitted, redirecting home");
            Redirect::temporary(home).into_response()
        }
    }
}

/// dashboard_entry
///
/// `GET /dashboard`: sends a signed-in user to its role home and everyone else
/// to login.
pub async fn dashboard_entry(State(state): State<AppState>, request: Request) -> Response {
    match resolve_session(request.headers(), &state.repo, &state.config).await {
        Ok(user) => Redirect::temporary(user.role.home()).into_response(),
        Err(AppError::Unauthorized) => {
            Redirect::temporary(&login_redirect(&requested_target(&request))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// host_is_local
///
/// True for `localhost`, `127.0.0.1` and `::1`, with or without a port.
pub fn host_is_local(host: &str) -> bool {
    let host = host.trim();
    let name = if let Some(rest) = host.strip_prefix('[') {
        rest.split_once(']').map_or(rest, |(name, _)| name)
    } else if host.matches(':').count() == 1 {
        host.split_once(':').map_or(host, |(name, _)| name)
    } else {
        host
    };
    matches!(
        name.to_ascii_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "::1"
    )
}

fn request_host(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
}

/// demo_gate
///
/// Hides the demo route group in production: anything but a localhost request
/// gets a plain 404, as if the routes did not exist.
pub async fn demo_gate(State(config): State<AppConfig>, request: Request, next: Next) -> Response {
    if config.env.is_production() && !request_host(&request).is_some_and(host_is_local) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_redirect_encodes_path_and_query() {
        assert_eq!(login_redirect("/admin"), "/login?next=%2Fadmin");
        assert_eq!(
            login_redirect("/talent?position=goalie&age=U18"),
            "/login?next=%2Ftalent%3Fposition%3Dgoalie%26age%3DU18"
        );
    }

    #[test]
    fn local_hosts_are_recognised_with_and_without_ports() {
        for host in ["localhost", "localhost:3000", "LOCALHOST", "127.0.0.1:8080", "[::1]:3000", "::1"] {
            assert!(host_is_local(host), "{host} should be local");
        }
        for host in ["atmosfera.app", "localhost.evil.com", "10.0.0.1", "127.0.0.2:80", ""] {
            assert!(!host_is_local(host), "{host} should not be local");
        }
    }
}
