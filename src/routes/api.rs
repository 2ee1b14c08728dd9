use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{message, token, voice};
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router with protected routes
///
/// Authentication and rate limiting are applied by `create_router`
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Protected routes (auth required when AUTH_REQUIRED=true)
        .route("/api/voice", post(voice::place_call))
        .route("/api/message", post(message::send_message))
        .route("/api/token", get(token::generate_token))
        .layer(TraceLayer::new_for_http())
}
