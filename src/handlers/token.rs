use axum::{Extension, Json, extract::State};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::auth::Auth;
use crate::core::token::TokenError;
use crate::errors::app_error::AppResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Issue a voice access token for the browser client
pub async fn generate_token(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Auth>,
) -> AppResult<Json<TokenResponse>> {
    let issuer = state
        .token_issuer
        .as_ref()
        .ok_or(TokenError::MissingCredential(
            "TWILIO_ACCOUNT_SID/TWILIO_API_KEY/TWILIO_API_SECRET",
        ))?;

    let token = issuer.issue()?;

    debug!(
        identity = issuer.identity(),
        auth_id = ?auth.id,
        "Issued access token"
    );

    Ok(Json(TokenResponse { token }))
}
