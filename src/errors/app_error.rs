use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::provider::ProviderError;
use crate::core::token::TokenError;

/// Errors returned by the call, message and token endpoints
///
/// Rendered as `{"success": false, "error": "<message>"}`. Provider messages
/// are passed through so the client sees why a call or message was refused;
/// missing configuration and token failures use a fixed message so no
/// server detail leaks.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotConfigured(&'static str),

    #[error("{message}")]
    Provider {
        message: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to generate token")]
    Token(#[from] TokenError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Wrap a provider failure, falling back to `fallback` when the provider
    /// gave no usable message
    pub fn provider(source: ProviderError, fallback: &str) -> Self {
        let message = match &source {
            ProviderError::Api { message, .. } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        };
        Self::Provider { message, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured(_) | Self::Provider { .. } | Self::Token(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        }

        let body = match &self {
            // Token failures keep the bare `error` shape the browser client reads
            Self::Token(_) => json!({ "error": self.to_string() }),
            _ => json!({ "success": false, "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_provider_message_passes_through() {
        let error = AppError::provider(
            ProviderError::Api {
                status: 400,
                message: "Invalid 'To' number".to_string(),
            },
            "Failed to make call",
        );
        let (status, body) = body_json(error).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"success": false, "error": "Invalid 'To' number"}));
    }

    #[tokio::test]
    async fn test_provider_without_message_uses_fallback() {
        let error = AppError::provider(
            ProviderError::InvalidResponse("missing sid".to_string()),
            "Failed to send message",
        );
        let (_, body) = body_json(error).await;
        assert_eq!(body["error"], "Failed to send message");
    }

    #[tokio::test]
    async fn test_bad_request_status() {
        let (status, body) = body_json(AppError::BadRequest("Phone number is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_token_error_hides_detail() {
        let (status, body) =
            body_json(AppError::Token(TokenError::MissingCredential("TWILIO_API_SECRET"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to generate token"}));
    }
}
