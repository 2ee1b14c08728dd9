use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::core::provider::OutboundMessage;
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

const FAILED_TO_SEND_MESSAGE: &str = "Failed to send message";

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message_sid: String,
}

/// Send a text message through the provider
///
/// Provider failures are reported with a fixed message.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let to = request.to.trim();
    if to.is_empty() || request.message.is_empty() {
        return Err(AppError::BadRequest(
            "Both 'to' and 'message' are required".to_string(),
        ));
    }

    let provider = state
        .provider
        .as_ref()
        .ok_or(AppError::NotConfigured(FAILED_TO_SEND_MESSAGE))?;
    let from = state
        .config
        .twilio
        .phone_number
        .as_deref()
        .ok_or(AppError::NotConfigured(FAILED_TO_SEND_MESSAGE))?;

    let message = OutboundMessage {
        to: to.to_string(),
        from: from.to_string(),
        body: request.message,
    };

    let message_sid = provider
        .send_message(&message)
        .await
        .map_err(|source| AppError::Provider {
            message: FAILED_TO_SEND_MESSAGE.to_string(),
            source,
        })?;

    info!(
        provider = provider.name(),
        message_sid = %message_sid,
        "Message sent"
    );

    Ok(Json(SendMessageResponse {
        success: true,
        message_sid,
    }))
}
