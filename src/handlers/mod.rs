//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `voice` - Call-control webhook, waiting greeting and outbound calls
//! - `message` - Outbound text messages
//! - `token` - Browser client access tokens

pub mod api;
pub mod message;
pub mod token;
pub mod voice;

pub use voice::twiml_webhook;
