pub mod api;
pub mod webhooks;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use std::time::Duration;

use tower::util::option_layer;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tracing::warn;

use crate::handlers::api::health_check;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Request rates at or above this disable the API rate limiter
pub const RATE_LIMIT_DISABLED_AT: u32 = 100_000;

/// Interval after which one request of the per-IP quota is replenished
fn replenish_interval(requests_per_second: u32) -> Option<Duration> {
    if requests_per_second == 0 || requests_per_second >= RATE_LIMIT_DISABLED_AT {
        return None;
    }
    Some(Duration::from_secs(1) / requests_per_second)
}

/// Assemble every route: public health check, provider webhooks and the
/// protected API behind the auth middleware
///
/// Only the protected API is rate limited. The call-control webhook must
/// always answer with a document, and provider traffic arrives from a few
/// shared addresses.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let config = &app_state.config;
    let governor_layer = replenish_interval(config.rate_limit_requests_per_second)
        .and_then(|period| {
            GovernorConfigBuilder::default()
                .period(period)
                .burst_size(config.rate_limit_burst_size)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
        })
        .map(GovernorLayer::new);

    if governor_layer.is_none() {
        warn!(
            rate = config.rate_limit_requests_per_second,
            "API rate limiting disabled"
        );
    }

    // Create protected API routes with authentication middleware
    let protected_routes = api::create_api_router()
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ))
        .layer(option_layer(governor_layer));

    // Webhook routes are called by the provider and carry no bearer token
    let webhook_routes = webhooks::create_webhook_router();

    // Create public health check route (no auth)
    let public_routes = Router::new().route("/", get(health_check));

    public_routes
        .merge(webhook_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
