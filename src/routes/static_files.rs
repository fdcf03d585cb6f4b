//! Static File Serving
//!
//! Serves a browser front end from the configured static directory when one
//! is present, and a built-in page describing the API otherwise.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::{Path, PathBuf};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::models::AppState;

/// Create router for serving static files
pub fn router(static_dir: &Path) -> Router<AppState> {
    if static_dir.is_dir() {
        info!(path = %static_dir.display(), "Serving static files");
    } else {
        warn!(path = %static_dir.display(), "Static directory not found, serving built-in page");
    }

    let index_path = static_dir.join("index.html");

    Router::new()
        .route("/", get(move || serve_index(index_path.clone())))
        .fallback_service(ServeDir::new(static_dir))
}

async fn serve_index(index_path: PathBuf) -> Response {
    let content = match tokio::fs::read_to_string(&index_path).await {
        Ok(content) => content,
        Err(_) => FALLBACK_HTML.to_string(),
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        content,
    )
        .into_response()
}

const FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Bucket Links</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; max-width: 760px; margin: 0 auto; padding: 40px 20px; }
        code { background: #f0f0f0; padding: 2px 6px; border-radius: 4px; }
        pre { background: #f6f6f6; padding: 12px; border-radius: 6px; overflow-x: auto; }
    </style>
</head>
<body>
    <h1>Bucket Links</h1>
    <p>Presigned link service for S3-compatible storage.</p>
    <ul>
        <li><code>POST /api/generate-download-url</code> - time-limited download link</li>
        <li><code>POST /api/generate-upload-url</code> - time-limited upload link</li>
        <li><code>GET /api/list-files</code> - list bucket contents</li>
        <li><code>POST /api/upload-file</code> - upload through the server (multipart)</li>
        <li><code>GET /api/check-config</code> - configuration and bucket access report</li>
        <li><code>POST /api/test-upload-url</code> - check the shape of a presigned link</li>
        <li><code>GET /api/health</code> - health check</li>
    </ul>
    <pre>curl -X POST http://localhost:5001/api/generate-upload-url \
  -H "Content-Type: application/json" \
  -d '{"file_name": "report.txt", "expiration": 3600}'</pre>
</body>
</html>"#;
