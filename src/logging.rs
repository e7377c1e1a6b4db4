use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Env;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// init_tracing
///
/// Installs the global subscriber. `RUST_LOG` wins over the defaults; local
/// runs print human-readable lines, production emits one JSON object per event
/// for the log aggregator.
pub fn init_tracing(env: Env) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atmosfera=debug,tower_http=info,axum=info".into());

    match env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

/// log_requests
///
/// Request-logging interceptor. Emits one record per request with method,
/// path, status, duration and request id, then hands the response back
/// untouched. Server errors are logged at ERROR, client errors at WARN.
///
/// Must sit inside `SetRequestIdLayer` so the id header is already present.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;

    if response.status().is_server_error() {
        tracing::error!(target: "atmosfera::http", %method, %path, status, duration_ms, request_id = %request_id, "request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(target: "atmosfera::http", %method, %path, status, duration_ms, request_id = %request_id, "request rejected");
    } else {
        tracing::info!(target: "atmosfera::http", %method, %path, status, duration_ms, request_id = %request_id, "request completed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{self, StatusCode},
        middleware,
        routing::get,
    };
    use serde_json::Value;
    use std::{
        io,
        sync::{Arc, Mutex},
    };
    use tower::ServiceExt;

    /// Shared in-memory sink for the fmt layer.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn http_records(&self) -> Vec<Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str::<Value>(line).unwrap())
                .filter(|record| record["target"] == "atmosfera::http")
                .collect()
        }
    }

    /// Routes JSON events on this thread into a fresh sink until the guard drops.
    fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_writer(move || writer.clone())
            .finish();
        (sink, tracing::subscriber::set_default(subscriber))
    }

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/boom", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .layer(middleware::from_fn(log_requests))
    }

    async fn call(router: Router, uri: &str, request_id: &str) -> StatusCode {
        let request = http::Request::builder()
            .uri(uri)
            .header(REQUEST_ID_HEADER, request_id)
            .body(Body::empty())
            .unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn one_record_per_request_with_level_by_status() {
        let (sink, _guard) = capture();

        assert_eq!(call(app(), "/ok", "req-ok").await, StatusCode::OK);
        assert_eq!(call(app(), "/missing", "req-404").await, StatusCode::NOT_FOUND);
        assert_eq!(
            call(app(), "/boom", "req-500").await,
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let records = sink.http_records();
        assert_eq!(records.len(), 3);

        let expected = [
            ("INFO", "/ok", 200, "req-ok"),
            ("WARN", "/missing", 404, "req-404"),
            ("ERROR", "/boom", 500, "req-500"),
        ];
        for (record, (level, path, status, request_id)) in records.iter().zip(expected) {
            assert_eq!(record["level"], level);
            assert_eq!(record["method"], "GET");
            assert_eq!(record["path"], path);
            assert_eq!(record["status"], status);
            assert_eq!(record["request_id"], request_id);
            assert!(record["duration_ms"].is_u64(), "duration missing in {record}");
        }
    }

    #[tokio::test]
    async fn missing_request_id_is_logged_as_unknown() {
        let (sink, _guard) = capture();

        let request = http::Request::builder().uri("/ok").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let records = sink.http_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["request_id"], "unknown");
    }
}
