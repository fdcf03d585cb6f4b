//! Presigned link endpoints
//!
//! - `POST /api/generate-download-url` - time-limited GET link
//! - `POST /api/generate-upload-url` - time-limited PUT link
//! - `POST /api/test-upload-url` - sanity check of a link's shape

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::info;

use crate::models::AppState;
use crate::types::{
    AppError, AppResult, GenerateLinkRequest, LinkResponse, TestUploadUrlRequest,
    TestUploadUrlResponse,
};

pub const DEFAULT_EXPIRATION_SECS: i64 = 3600;
/// SigV4 presigned URLs cannot outlive seven days.
pub const MAX_EXPIRATION_SECS: i64 = 604_800;

const CORS_NOTE: &str = "For direct browser uploads, CORS must be configured on your Backblaze B2 bucket. \
     Uploads that fail direct can still go through POST /api/upload-file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Download,
    Upload,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/generate-download-url", post(generate_download_url))
        .route("/api/generate-upload-url", post(generate_upload_url))
        .route("/api/test-upload-url", post(test_upload_url))
}

async fn generate_download_url(
    State(state): State<AppState>,
    payload: Result<Json<GenerateLinkRequest>, JsonRejection>,
) -> AppResult<Json<LinkResponse>> {
    generate(&state, LinkKind::Download, payload).await
}

async fn generate_upload_url(
    State(state): State<AppState>,
    payload: Result<Json<GenerateLinkRequest>, JsonRejection>,
) -> AppResult<Json<LinkResponse>> {
    generate(&state, LinkKind::Upload, payload).await
}

async fn generate(
    state: &AppState,
    kind: LinkKind,
    payload: Result<Json<GenerateLinkRequest>, JsonRejection>,
) -> AppResult<Json<LinkResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let file_name = request
        .file_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("file_name is required".to_string()))?;

    let expiration = validate_expiration(request.expiration)?;

    let url = match kind {
        LinkKind::Download => state.store.presign_get(&file_name, expiration as u32).await?,
        LinkKind::Upload => state.store.presign_put(&file_name, expiration as u32).await?,
    };

    let expires_at = chrono::Utc::now().timestamp_millis() as f64 / 1000.0 + expiration as f64;

    info!(file_name = %file_name, expiration, kind = ?kind, "Presigned link generated");

    Ok(Json(LinkResponse {
        success: true,
        url: Some(url),
        file_name: Some(file_name),
        expiration_seconds: Some(expiration),
        expires_at: Some(expires_at),
        error: None,
    }))
}

fn validate_expiration(requested: Option<i64>) -> AppResult<i64> {
    let expiration = requested.unwrap_or(DEFAULT_EXPIRATION_SECS);
    if !(1..=MAX_EXPIRATION_SECS).contains(&expiration) {
        return Err(AppError::BadRequest(format!(
            "expiration must be between 1 and {} seconds",
            MAX_EXPIRATION_SECS
        )));
    }
    Ok(expiration)
}

/// POST /api/test-upload-url
async fn test_upload_url(
    payload: Result<Json<TestUploadUrlRequest>, JsonRejection>,
) -> AppResult<Json<TestUploadUrlResponse>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let url = request
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("URL is required".to_string()))?;

    Ok(Json(TestUploadUrlResponse {
        success: true,
        url_valid: looks_presigned(&url),
        note: CORS_NOTE.to_string(),
    }))
}

/// True when the URL is HTTP(S) and carries SigV4 or legacy signature parameters.
pub fn looks_presigned(url: &str) -> bool {
    url.starts_with("http") && (url.contains("X-Amz") || url.contains("AWSAccessKeyId"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests::{body_json, json_request, test_app};
    use crate::storage::memory::MemoryStore;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_generate_upload_url() {
        let app = test_app(Arc::new(MemoryStore::new()));
        let before = chrono::Utc::now().timestamp() as f64;

        let response = app
            .oneshot(json_request(
                "/api/generate-upload-url",
                r#"{"file_name": "report.txt", "expiration": 600}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["file_name"], "report.txt");
        assert_eq!(json["expiration_seconds"], 600);
        assert!(json["url"].as_str().unwrap().contains("Signature=put"));

        let expires_at = json["expires_at"].as_f64().unwrap();
        assert!((expires_at - before - 600.0).abs() < 2.0);
    }

    #[tokio::test]
    async fn test_generate_download_url_defaults_expiration() {
        let app = test_app(Arc::new(MemoryStore::new()));

        let response = app
            .oneshot(json_request(
                "/api/generate-download-url",
                r#"{"file_name": "report.txt"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["expiration_seconds"], DEFAULT_EXPIRATION_SECS);
        assert!(json["url"].as_str().unwrap().contains("Signature=get"));
    }

    #[tokio::test]
    async fn test_missing_file_name_is_rejected() {
        let app = test_app(Arc::new(MemoryStore::new()));

        let response = app
            .oneshot(json_request("/api/generate-upload-url", r#"{"expiration": 60}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "file_name is required");
    }

    #[tokio::test]
    async fn test_file_name_is_signed_as_given() {
        let app = test_app(Arc::new(MemoryStore::new()));

        let response = app
            .clone()
            .oneshot(json_request(
                "/api/generate-download-url",
                r#"{"file_name": " a.txt"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["file_name"], " a.txt");
        assert!(json["url"].as_str().unwrap().contains("/mybucket/ a.txt?"));

        let response = app
            .oneshot(json_request("/api/generate-download-url", r#"{"file_name": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "file_name is required");
    }

    #[tokio::test]
    async fn test_out_of_range_expiration_is_rejected() {
        let app = test_app(Arc::new(MemoryStore::new()));

        for body in [
            r#"{"file_name": "a", "expiration": 0}"#,
            r#"{"file_name": "a", "expiration": -5}"#,
            r#"{"file_name": "a", "expiration": 604801}"#,
        ] {
            let response = app
                .clone()
                .oneshot(json_request("/api/generate-download-url", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let app = test_app(Arc::new(MemoryStore::failing("signing unavailable")));

        let response = app
            .oneshot(json_request(
                "/api/generate-upload-url",
                r#"{"file_name": "a.txt"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "signing unavailable");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = test_app(Arc::new(MemoryStore::new()));

        let response = app
            .oneshot(json_request("/api/generate-upload-url", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_test_upload_url() {
        let app = test_app(Arc::new(MemoryStore::new()));

        let response = app
            .clone()
            .oneshot(json_request(
                "/api/test-upload-url",
                r#"{"url": "https://s3.example.com/b/k?X-Amz-Signature=abc"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["url_valid"], true);

        let response = app
            .oneshot(json_request("/api/test-upload-url", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "URL is required");
    }

    #[test]
    fn test_looks_presigned() {
        assert!(looks_presigned("https://b/k?X-Amz-Credential=x"));
        assert!(looks_presigned("http://b/k?AWSAccessKeyId=x&Signature=y"));
        assert!(!looks_presigned("ftp://b/k?X-Amz-Credential=x"));
        assert!(!looks_presigned("https://b/k"));
    }
}
