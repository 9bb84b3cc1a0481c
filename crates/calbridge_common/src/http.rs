// --- File: crates/calbridge_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::{BridgeError, HttpStatusCode};

/// Extension trait for BridgeError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for BridgeError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            error!("Request failed ({}): {}", status_code.as_u16(), self);
        } else {
            warn!("Request rejected ({}): {}", status_code.as_u16(), self);
        }

        let mut body = json!({
            "success": false,
            "error": self.to_string(),
        });
        if let Some(details) = self.details() {
            body["details"] = details.clone();
        }

        (status_code, Json(body)).into_response()
    }
}

/// Implement IntoResponse for BridgeError to make it easier to use in Axum handlers.
impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::validation_error;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let response = validation_error("summary is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "summary is required");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_carries_details() {
        let response = BridgeError::UpstreamError {
            message: "Backend Error".into(),
            details: Some(json!({ "reason": "backendError" })),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["details"]["reason"], "backendError");
    }
}
