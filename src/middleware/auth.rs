use crate::auth::Auth;
use crate::errors::auth_error::AuthError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Extract the bearer token from the Authorization header
fn extract_token(request: &Request) -> Result<String, AuthError> {
    let auth_header = request
        .headers()
        .get("authorization")
        .ok_or(AuthError::MissingAuthHeader)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidAuthHeader)
}

/// Authentication middleware for the provider proxy routes
///
/// When `auth_required` is off, an empty [`Auth`] is inserted and the request
/// passes through. Otherwise the bearer token must match one of the configured
/// API secrets; the matching secret's id is inserted as the [`Auth`] context.
/// Mismatches are answered with 401.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !state.config.auth_required {
        tracing::debug!("Authentication disabled, inserting empty Auth context");
        request.extensions_mut().insert(Auth::empty());
        return Ok(next.run(request).await);
    }

    let request_method = request.method().to_string();
    let request_path = request.uri().path().to_string();

    if !state.config.has_api_secret_auth() {
        return Err(AuthError::ConfigError(
            "Authentication required but no API secrets configured".to_string(),
        ));
    }

    let token = extract_token(&request).inspect_err(|e| {
        tracing::warn!(
            method = %request_method,
            path = %request_path,
            error = %e,
            "Rejecting request without usable bearer token"
        );
    })?;

    match state.config.find_api_secret_id(&token) {
        Some(secret_id) => {
            tracing::info!(
                method = %request_method,
                path = %request_path,
                auth_id = %secret_id,
                "API secret authentication successful"
            );
            request.extensions_mut().insert(Auth::new(secret_id));
            Ok(next.run(request).await)
        }
        None => {
            tracing::warn!(
                method = %request_method,
                path = %request_path,
                "API secret authentication failed: token mismatch"
            );
            Err(AuthError::Unauthorized("Invalid API secret".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(value: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/api/token");
        if let Some(value) = value {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = request_with_header(Some("Bearer secret-a"));
        assert_eq!(extract_token(&request).unwrap(), "secret-a");
    }

    #[test]
    fn test_extract_token_missing_header() {
        let request = request_with_header(None);
        assert!(matches!(
            extract_token(&request),
            Err(AuthError::MissingAuthHeader)
        ));
    }

    #[test]
    fn test_extract_token_rejects_other_schemes() {
        for value in ["Basic abc", "Bearer ", "secret-a"] {
            let request = request_with_header(Some(value));
            assert!(matches!(
                extract_token(&request),
                Err(AuthError::InvalidAuthHeader)
            ));
        }
    }
}
