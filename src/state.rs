use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::provider::{TelephonyProvider, TwilioRestClient};
use crate::core::routing::CallRoutingPolicy;
use crate::core::token::AccessTokenIssuer;

/// Shared application state
///
/// Built once at startup and shared by every handler. The routing policy is
/// immutable, so concurrent webhook requests need no coordination. Provider
/// and token issuer are optional: missing credentials only disable the
/// endpoints that need them.
pub struct AppState {
    pub config: ServerConfig,
    pub policy: CallRoutingPolicy,
    pub provider: Option<Arc<dyn TelephonyProvider>>,
    pub token_issuer: Option<AccessTokenIssuer>,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let policy = CallRoutingPolicy::from_config(&config);

        if policy.caller_id_override().is_none() {
            warn!(
                "TWILIO_PHONE_NUMBER not set: dials will carry no caller ID and \
                 outbound calls and messages are disabled"
            );
        }

        let provider: Option<Arc<dyn TelephonyProvider>> =
            match TwilioRestClient::from_config(&config.twilio) {
                Ok(client) => {
                    info!(base_url = %client.base_url(), "Telephony provider configured");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    warn!(error = %e, "Telephony provider unavailable");
                    None
                }
            };

        let token_issuer = match AccessTokenIssuer::from_config(&config) {
            Ok(issuer) => Some(issuer),
            Err(e) => {
                warn!(error = %e, "Access token issuing unavailable");
                None
            }
        };

        Arc::new(Self {
            config,
            policy,
            provider,
            token_issuer,
        })
    }

    /// Replace the telephony provider, used to inject test doubles
    pub fn with_provider(config: ServerConfig, provider: Arc<dyn TelephonyProvider>) -> Arc<Self> {
        let policy = CallRoutingPolicy::from_config(&config);
        let token_issuer = AccessTokenIssuer::from_config(&config).ok();
        Arc::new(Self {
            config,
            policy,
            provider: Some(provider),
            token_issuer,
        })
    }
}
