//! Public routes invoked by the telephony provider
//!
//! The provider's voice runtime cannot send bearer credentials, so these
//! routes sit outside the auth middleware.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::voice;
use crate::state::AppState;
use std::sync::Arc;

/// Create the webhook router
///
/// # Endpoints
///
/// - `POST /api/voice/twiml` - call-control webhook (form `To`, `From`)
/// - `GET /api/voice` - waiting greeting document
pub fn create_webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/voice/twiml", post(voice::twiml_webhook))
        .route("/api/voice", get(voice::voice_greeting))
        .layer(TraceLayer::new_for_http())
}
