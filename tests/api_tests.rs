mod common;

use atmosfera::{Role, config::Env, models::SessionInfo};
use common::test_app;
use reqwest::{StatusCode, header, redirect};
use tokio::net::TcpListener;

struct LiveApp {
    address: String,
    app: common::TestApp,
}

async fn spawn_app(env: Env) -> LiveApp {
    let app = test_app(env);
    let router = app.router.clone();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    LiveApp {
        address: format!("http://127.0.0.1:{port}"),
        app,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn health_check() {
    let live = spawn_app(Env::Production).await;

    let response = client()
        .get(format!("{}/health", live.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn browser_flow_from_login_redirect_to_dashboard() {
    let live = spawn_app(Env::Production).await;
    let player = live.app.user(Role::Player).await;
    let token = live.app.token(&player);
    let client = client();

    let response = client
        .get(format!("{}/player", live.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/login?next=%2Fplayer");

    let response = client
        .post(format!("{}/api/auth/session", live.address))
        .json(&serde_json::json!({ "token": token }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let session: SessionInfo = response.json().await.unwrap();
    assert_eq!(session.home, "/player");

    let response = client
        .get(format!("{}/player", live.address))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{}/scout", live.address))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/player");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let live = spawn_app(Env::Local).await;

    let response = client()
        .get(format!("{}/api-docs/openapi.json", live.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = response.json().await.unwrap();
    assert!(doc["paths"]["/api/evaluations"].is_object());
    assert!(doc["paths"]["/api/notifications/unread-count"].is_object());
}
