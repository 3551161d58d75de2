/**
 * Error Conversion
 *
 * `IntoResponse` for `ApiError`, so handlers can return it directly.
 *
 * # Response Format
 *
 * Errors are returned as JSON:
 * ```json
 * {
 *   "error": "Validation error in field 'message': cannot be empty",
 *   "status": 400
 * }
 * ```
 */
use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::backend::error::types::ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[API] {}", message);
        } else {
            tracing::debug!("[API] {}", message);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap_or_else(
                |_| format!(r#"{{"error":"{}","status":{}}}"#, message, status.as_u16()),
            )))
            .unwrap_or_else(|_| {
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::from("Internal Server Error"))
                    .unwrap()
            })
    }
}
