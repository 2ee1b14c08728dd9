use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Authentication failures raised by the bearer middleware
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Authentication configuration error: {0}")]
    ConfigError(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuthHeader | Self::InvalidAuthHeader | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => "missing_auth_header",
            Self::InvalidAuthHeader => "invalid_auth_header",
            Self::Unauthorized(_) => "unauthorized",
            Self::ConfigError(_) => "auth_config_error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::ConfigError(_) => "Authentication is misconfigured".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response()
    }
}
