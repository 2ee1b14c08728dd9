pub mod document;
pub mod provider;
pub mod routing;
pub mod session;
pub mod token;
pub mod twiml;

// Re-export commonly used types for convenience
pub use routing::{
    CallRequestDescriptor, CallRoutingPolicy, DEFAULT_CLIENT_PREFIX, DEFAULT_INBOUND_GREETING,
    DescriptorError, MISSING_DESTINATION, RoutingDecision,
};

pub use document::{
    ControlDocument, ControlDocumentBuilder, ControlInstruction, DocumentError,
    ERROR_ANNOUNCEMENT, WAITING_GREETING,
};

pub use twiml::{FALLBACK_ERROR_TWIML, TWIML_CONTENT_TYPE, to_twiml};

pub use provider::{
    OutboundCall, OutboundMessage, ProviderError, ProviderResult, TWILIO_API_BASE_URL,
    TelephonyProvider, TwilioRestClient,
};

pub use session::{DeviceSession, EndCause, SessionError, SessionEvent, SessionState};

pub use token::{ACCESS_TOKEN_CONTENT_TYPE, AccessTokenClaims, AccessTokenIssuer, TokenError};
