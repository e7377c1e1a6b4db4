mod common;

use atmosfera::{
    AppError, AppState, Role,
    auth::{AuthUser, Claims, DEV_USER_HEADER, SESSION_COOKIE},
    config::Env,
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Request, header, request::Parts},
};
use common::{TEST_JWT_SECRET, test_app};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

fn request_parts() -> Parts {
    let (parts, _) = Request::builder()
        .uri("/api/me")
        .body(())
        .unwrap()
        .into_parts();
    parts
}

fn state_of(app: &common::TestApp) -> AppState {
    AppState {
        repo: app.repo.clone(),
        config: app.config.clone(),
    }
}

fn token_expiring_in(user_id: Uuid, offset_secs: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + offset_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn bearer_token_resolves_the_stored_role() {
    let app = test_app(Env::Production);
    let scout = app.user(Role::Scout).await;
    let state = state_of(&app);

    let mut parts = request_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", app.token(&scout))).unwrap(),
    );

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user, AuthUser { id: scout.id, role: Role::Scout });
}

#[tokio::test]
async fn session_cookie_is_found_among_other_cookies() {
    let app = test_app(Env::Production);
    let club = app.user(Role::Club).await;
    let state = state_of(&app);

    let mut parts = request_parts();
    parts.headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("lang=sv; {SESSION_COOKIE}={}; theme=ice", app.token(&club)))
            .unwrap(),
    );

    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.role, Role::Club);
}

#[tokio::test]
async fn missing_credentials_are_unauthorized() {
    let app = test_app(Env::Production);
    let state = state_of(&app);

    let mut parts = request_parts();
    let result = AuthUser::from_request_parts(&mut parts, &state).await;

    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let app = test_app(Env::Production);
    let player = app.user(Role::Player).await;
    let state = state_of(&app);

    let mut parts = request_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token_expiring_in(player.id, -3600))).unwrap(),
    );

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn token_for_an_unknown_profile_is_unauthorized() {
    let app = test_app(Env::Production);
    let state = state_of(&app);

    let mut parts = request_parts();
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token_expiring_in(Uuid::new_v4(), 3600)))
            .unwrap(),
    );

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}

#[tokio::test]
async fn dev_header_works_locally_only() {
    let local = test_app(Env::Local);
    let agent = local.user(Role::Agent).await;

    let mut parts = request_parts();
    parts.headers.insert(
        DEV_USER_HEADER,
        HeaderValue::from_str(&agent.id.to_string()).unwrap(),
    );
    let user = AuthUser::from_request_parts(&mut parts, &state_of(&local))
        .await
        .unwrap();
    assert_eq!(user.role, Role::Agent);

    let production = test_app(Env::Production);
    let agent = production.user(Role::Agent).await;
    let mut parts = request_parts();
    parts.headers.insert(
        DEV_USER_HEADER,
        HeaderValue::from_str(&agent.id.to_string()).unwrap(),
    );
    let result = AuthUser::from_request_parts(&mut parts, &state_of(&production)).await;
    assert!(matches!(result, Err(AppError::Unauthorized)));
}
