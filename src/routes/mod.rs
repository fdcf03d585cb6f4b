//! API Routes
//!
//! - `/api/generate-download-url`, `/api/generate-upload-url` - presigned links
//! - `/api/test-upload-url` - link shape check
//! - `/api/list-files` - bucket listing
//! - `/api/upload-file` - server-side upload proxy
//! - `/api/check-config` - configuration report
//! - `/api/health` - health check
//! - `/` - static front end

pub mod diagnostics;
pub mod files;
pub mod health;
pub mod links;
pub mod static_files;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let server = &state.config.server;
    let body_limit = server.max_upload_bytes;
    let origins = server.cors_allowed_origins.clone();
    let static_dir = server.static_dir.clone();

    let router = Router::new()
        .merge(links::router())
        .merge(files::router())
        .merge(diagnostics::router())
        .merge(health::router())
        .merge(static_files::router(&static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    apply_cors(router, &origins)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{ClientConfig, Config, ServerConfig, StorageConfig};
    use crate::storage::memory::MemoryStore;
    use crate::storage::ObjectStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn test_config() -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
                max_upload_bytes: 1024 * 1024,
                static_dir: PathBuf::from("does-not-exist"),
            },
            storage: StorageConfig {
                endpoint_url: "https://s3.us-east-005.backblazeb2.com".to_string(),
                region: "us-east-005".to_string(),
                key_id: Some("0050428f1a906270000000001".to_string()),
                application_key: Some("K005rH1B5kjFA6QgKtyAbzl1F80qMeY".to_string()),
                bucket_name: "mybucket".to_string(),
            },
            client: ClientConfig {
                api_base: "http://localhost:5001/api".to_string(),
                timeout_secs: None,
            },
        }
    }

    pub fn test_state(store: Arc<dyn ObjectStore>) -> AppState {
        AppState::new(store, test_config())
    }

    pub fn test_state_default() -> AppState {
        test_state(Arc::new(MemoryStore::new()))
    }

    pub fn test_app(store: Arc<dyn ObjectStore>) -> Router {
        create_router(test_state(store))
    }

    pub fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(Arc::new(MemoryStore::new()))
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let response = test_app(Arc::new(MemoryStore::new()))
            .oneshot(
                Request::get("/api/health")
                    .header("Origin", "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_body_limit_applies_to_proxy_uploads() {
        let boundary = "limitboundary";
        let payload = "x".repeat(2 * 1024 * 1024);
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"big.bin\"\r\n\r\n{p}\r\n--{b}--\r\n",
            b = boundary,
            p = payload
        );
        let response = test_app(Arc::new(MemoryStore::new()))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload-file")
                    .header(
                        "Content-Type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
