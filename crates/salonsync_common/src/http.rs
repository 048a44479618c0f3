// --- File: crates/salonsync_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, SalonError};

// Include the client module
pub mod client;

/// Message shown to salon owners whose stored channel secrets no longer decrypt.
pub const RECONFIGURE_CHANNEL_MESSAGE: &str =
    "Stored channel credentials can no longer be read. Please reconfigure your messaging channel.";

/// Extension trait for SalonError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for SalonError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay in the logs
        let error_message = match &self {
            SalonError::DecryptionError(_) => RECONFIGURE_CHANNEL_MESSAGE.to_string(),
            SalonError::DatabaseError(_)
            | SalonError::ConfigError(_)
            | SalonError::InternalError(_) => {
                tracing::error!("Request failed: {}", self);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for SalonError to make it easier to use in Axum handlers.
impl IntoResponse for SalonError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decryption_error_is_rendered_as_reconfigure_hint() {
        let response = SalonError::DecryptionError("aead::Error".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let response = SalonError::ConflictError("taken".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
