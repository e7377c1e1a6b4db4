#![allow(dead_code)]

use atmosfera::{
    AppConfig, AppState, MemoryRepository, Role, create_router,
    auth::{DEV_USER_HEADER, SESSION_COOKIE, issue_token},
    config::Env,
    models::User,
    repository::{NewUser, Repository, RepositoryState},
};
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const TEST_JWT_SECRET: &str = "atmosfera-test-secret";

/// A router backed by a fresh in-memory store, plus a handle on that store
/// for seeding and inspection.
pub struct TestApp {
    pub router: Router,
    pub repo: RepositoryState,
    pub config: AppConfig,
}

pub fn test_config(env: Env) -> AppConfig {
    AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn test_app(env: Env) -> TestApp {
    let repo: RepositoryState = Arc::new(MemoryRepository::new());
    let config = test_config(env);
    let router = create_router(AppState {
        repo: repo.clone(),
        config: config.clone(),
    });
    TestApp {
        router,
        repo,
        config,
    }
}

impl TestApp {
    pub async fn user(&self, role: Role) -> User {
        let email = format!("{}-{}@test.local", role.as_str().to_lowercase(), uuid::Uuid::new_v4());
        self.repo
            .create_user(NewUser {
                email,
                role,
                display_name: Some(format!("Test {role}")),
            })
            .await
            .unwrap()
    }

    pub fn token(&self, user: &User) -> String {
        issue_token(user.id, &self.config.jwt_secret, 3600).unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_as(uri: &str, user: &User) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(DEV_USER_HEADER, user.id.to_string())
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("theme=dark; {SESSION_COOKIE}={token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_as(method: &str, uri: &str, user: &User, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(DEV_USER_HEADER, user.id.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_as(method: &str, uri: &str, user: &User) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(DEV_USER_HEADER, user.id.to_string())
        .body(Body::empty())
        .unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without Location header")
        .to_str()
        .unwrap()
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("response body is not the expected JSON")
}
