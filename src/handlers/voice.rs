//! Voice endpoints
//!
//! - `POST /api/voice/twiml`: call-control webhook the provider invokes for
//!   each call leg. Always answers `200 text/xml` with a well-formed
//!   document, even when the request cannot be routed.
//! - `GET /api/voice`: waiting greeting for calls pointed at the plain voice URL
//! - `POST /api/voice`: place an outbound call through the provider

use axum::{
    Json,
    extract::{Form, State, rejection::FormRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::document::{ControlDocument, ControlDocumentBuilder, WAITING_GREETING};
use crate::core::provider::OutboundCall;
use crate::core::routing::{CallRequestDescriptor, RoutingDecision};
use crate::core::twiml::{FALLBACK_ERROR_TWIML, TWIML_CONTENT_TYPE};
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

const FAILED_TO_MAKE_CALL: &str = "Failed to make call";

/// Form fields posted by the provider's voice runtime
#[derive(Debug, Deserialize)]
pub struct VoiceWebhookForm {
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCallRequest {
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCallResponse {
    pub success: bool,
    pub call_sid: String,
}

/// Serialize a document into a `200 text/xml` response
///
/// Serialization failures are logged and answered with the fixed error
/// document so the provider always receives valid markup.
fn twiml_response(document: &ControlDocument) -> Response {
    let body = match document.to_twiml() {
        Ok(xml) => xml,
        Err(e) => {
            error!(error = %e, "Failed to serialize control document");
            FALLBACK_ERROR_TWIML.to_string()
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// Call-control webhook
pub async fn twiml_webhook(
    State(state): State<Arc<AppState>>,
    form: Result<Form<VoiceWebhookForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "Malformed call-control request");
            return twiml_response(&ControlDocument::error());
        }
    };

    let descriptor = match CallRequestDescriptor::from_fields(form.to, form.from) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            warn!(error = %e, "Malformed call-control request");
            return twiml_response(&ControlDocument::error());
        }
    };

    let decision = state.policy.classify(&descriptor);
    if let RoutingDecision::Error { reason } = &decision {
        warn!(
            caller = %descriptor.caller_identity(),
            reason = %reason,
            "Call could not be routed"
        );
    } else {
        info!(
            caller = %descriptor.caller_identity(),
            callee = %descriptor.callee_identity(),
            decision = decision.kind(),
            "Routing call"
        );
    }

    twiml_response(&ControlDocumentBuilder::render(&decision))
}

/// Waiting greeting for the plain voice URL
pub async fn voice_greeting(State(state): State<Arc<AppState>>) -> Response {
    let document = ControlDocumentBuilder::greeting(
        WAITING_GREETING,
        state.config.routing.inbound_forward_to.as_deref(),
        state.policy.caller_id_override(),
    );
    twiml_response(&document)
}

/// Place an outbound call that dials `phoneNumber` once answered
pub async fn place_call(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlaceCallRequest>,
) -> AppResult<Json<PlaceCallResponse>> {
    let phone_number = request.phone_number.trim();
    if phone_number.is_empty() {
        return Err(AppError::BadRequest("Phone number is required".to_string()));
    }

    let provider = state
        .provider
        .as_ref()
        .ok_or(AppError::NotConfigured(FAILED_TO_MAKE_CALL))?;
    let from = state
        .policy
        .caller_id_override()
        .ok_or(AppError::NotConfigured(FAILED_TO_MAKE_CALL))?;

    let twiml = ControlDocumentBuilder::dial(phone_number, Some(from))
        .to_twiml()
        .map_err(|e| {
            error!(error = %e, "Failed to serialize outbound call document");
            AppError::NotConfigured(FAILED_TO_MAKE_CALL)
        })?;

    let call = OutboundCall {
        to: phone_number.to_string(),
        from: from.to_string(),
        twiml,
    };

    let call_sid = provider
        .place_call(&call)
        .await
        .map_err(|e| AppError::provider(e, FAILED_TO_MAKE_CALL))?;

    info!(
        provider = provider.name(),
        call_sid = %call_sid,
        "Outbound call placed"
    );

    Ok(Json(PlaceCallResponse {
        success: true,
        call_sid,
    }))
}
