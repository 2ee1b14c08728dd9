//! Telephony provider abstraction
//!
//! Handlers talk to the provider through [`TelephonyProvider`] so the REST
//! client can be swapped out (or pointed at a mock server) without touching
//! the HTTP layer.

pub mod twilio;

use async_trait::async_trait;
use thiserror::Error;

pub use twilio::{TWILIO_API_BASE_URL, TwilioRestClient};

/// Errors returned by telephony provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A credential or setting required for the operation is missing
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// The provider rejected the request
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Transport failure talking to the provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something we could not interpret
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Outbound voice call request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCall {
    pub to: String,
    pub from: String,
    /// Serialized control document the provider runs once the callee answers
    pub twiml: String,
}

/// Outbound text message request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub from: String,
    pub body: String,
}

/// Telephony operations the gateway proxies to the provider
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Place a voice call, returning the provider's call identifier
    async fn place_call(&self, call: &OutboundCall) -> ProviderResult<String>;

    /// Send a text message, returning the provider's message identifier
    async fn send_message(&self, message: &OutboundMessage) -> ProviderResult<String>;
}
