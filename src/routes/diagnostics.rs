//! GET /api/check-config - which settings are present, and whether the
//! credentials can actually reach the bucket.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::models::AppState;

const PERMISSION_HINT: &str = "The Application Key needs permission to access this bucket. \
     Create a key scoped to the bucket with read and write capabilities.";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/check-config", get(check_config))
}

fn presence(value: Option<&str>) -> &'static str {
    if value.is_some() {
        "Set"
    } else {
        "Missing"
    }
}

async fn check_config(State(state): State<AppState>) -> Json<Value> {
    let storage = &state.config.storage;
    let key_id = storage.key_id.as_deref();
    let secret = storage.application_key.as_deref();

    let endpoint = if storage.endpoint_url.is_empty() {
        "Missing"
    } else {
        storage.endpoint_url.as_str()
    };
    let key_id_preview = key_id
        .map(|k| format!("{}...", k.chars().take(10).collect::<String>()))
        .unwrap_or_else(|| "Not set".to_string());

    let mut report = json!({
        "B2_APPLICATION_KEY_ID": presence(key_id),
        "B2_APPLICATION_KEY": presence(secret),
        "B2_ENDPOINT_URL": endpoint,
        "B2_BUCKET_NAME": storage.bucket_name,
        "region": storage.region,
        "key_id_length": key_id.map(str::len).unwrap_or(0),
        "key_length": secret.map(str::len).unwrap_or(0),
        "key_id_preview": key_id_preview,
    });

    match state.store.check_access().await {
        Ok(()) => {
            info!(bucket = %storage.bucket_name, "Bucket access check passed");
            report["connection_test"] = json!("Success");
            report["bucket_access"] = json!("Authorized");
        }
        Err(e) => {
            warn!(bucket = %storage.bucket_name, error = %e, "Bucket access check failed");
            report["connection_test"] = json!(format!("Failed: {}", e));
            report["bucket_access"] = json!("Unauthorized");
            report["error_details"] = json!({
                "error_type": e.kind(),
                "error_message": e.to_string(),
            });
            if e.is_unauthorized() {
                report["fix_required"] = json!(PERMISSION_HINT);
            }
        }
    }

    Json(report)
}

#[cfg(test)]
mod tests {
    use crate::routes::tests::{body_json, test_app};
    use crate::storage::memory::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_check_config_success() {
        let response = test_app(Arc::new(MemoryStore::new()))
            .oneshot(Request::get("/api/check-config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["B2_APPLICATION_KEY_ID"], "Set");
        assert_eq!(json["key_id_length"], 25);
        assert_eq!(json["key_id_preview"], "0050428f1a...");
        assert_eq!(json["connection_test"], "Success");
        assert_eq!(json["bucket_access"], "Authorized");
        assert!(json.get("fix_required").is_none());
        assert!(!json.to_string().contains("K005rH1B5kjFA6QgKtyAbzl1F80qMeY"));
    }

    #[tokio::test]
    async fn test_check_config_unauthorized_hint() {
        let store = Arc::new(MemoryStore::failing("UnauthorizedAccess: not entitled"));
        let response = test_app(store)
            .oneshot(Request::get("/api/check-config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["bucket_access"], "Unauthorized");
        assert_eq!(
            json["connection_test"],
            "Failed: UnauthorizedAccess: not entitled"
        );
        assert_eq!(json["error_details"]["error_type"], "BackendError");
        assert!(json["fix_required"].as_str().is_some());
    }
}
