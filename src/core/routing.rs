//! Call routing policy
//!
//! Classifies an inbound call-control request into a [`RoutingDecision`].
//! The policy is a pure function of its configuration and the request: it
//! performs no I/O, holds no mutable state and is safe to share between
//! request handlers.
//!
//! # Classification
//! - Callee missing or empty: [`RoutingDecision::Error`] with reason `"missing destination"`
//! - Caller starts with the client prefix (`client:` by default):
//!   [`RoutingDecision::BrowserOriginatedDial`]
//! - Anything else: [`RoutingDecision::InboundGreetAndDial`]

use thiserror::Error;

use crate::config::ServerConfig;

/// Caller identity prefix the provider uses for registered software clients
pub const DEFAULT_CLIENT_PREFIX: &str = "client:";

/// Greeting spoken ahead of the dial for calls from the telephone network
pub const DEFAULT_INBOUND_GREETING: &str = "Welcome to the Twilio voice application.";

/// Reason attached to the error decision when no callee was supplied
pub const MISSING_DESTINATION: &str = "missing destination";

/// Errors raised while building a [`CallRequestDescriptor`] from raw input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("caller identity is missing from the request")]
    MissingCaller,
}

/// Identity pair describing one inbound call-control request
///
/// Both values come straight from an untrusted caller and are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequestDescriptor {
    callee_identity: String,
    caller_identity: String,
}

impl CallRequestDescriptor {
    pub fn new(callee_identity: impl Into<String>, caller_identity: impl Into<String>) -> Self {
        Self {
            callee_identity: callee_identity.into(),
            caller_identity: caller_identity.into(),
        }
    }

    /// Build a descriptor from optional request fields
    ///
    /// An absent callee becomes an empty string and is left to the policy,
    /// which turns it into the error decision. An absent caller means the
    /// payload is malformed and is reported as [`DescriptorError::MissingCaller`].
    pub fn from_fields(
        callee_identity: Option<String>,
        caller_identity: Option<String>,
    ) -> Result<Self, DescriptorError> {
        let caller_identity = caller_identity.ok_or(DescriptorError::MissingCaller)?;
        Ok(Self {
            callee_identity: callee_identity.unwrap_or_default(),
            caller_identity,
        })
    }

    pub fn callee_identity(&self) -> &str {
        &self.callee_identity
    }

    pub fn caller_identity(&self) -> &str {
        &self.caller_identity
    }
}

/// Outcome of classifying a [`CallRequestDescriptor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Call placed by a registered software client: dial the callee directly
    BrowserOriginatedDial {
        callee_identity: String,
        caller_id_override: Option<String>,
    },
    /// Call arriving from the telephone network: greet, then dial the callee
    InboundGreetAndDial {
        callee_identity: String,
        caller_id_override: Option<String>,
        greeting: String,
    },
    /// Request could not be routed
    Error { reason: String },
}

impl RoutingDecision {
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            reason: reason.into(),
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrowserOriginatedDial { .. } => "browser_originated_dial",
            Self::InboundGreetAndDial { .. } => "inbound_greet_and_dial",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Routing policy shared by every call-control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRoutingPolicy {
    client_prefix: String,
    inbound_greeting: String,
    caller_id_override: Option<String>,
}

impl Default for CallRoutingPolicy {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CallRoutingPolicy {
    /// Create a policy with the default client prefix and greeting
    pub fn new(caller_id_override: Option<String>) -> Self {
        Self {
            client_prefix: DEFAULT_CLIENT_PREFIX.to_string(),
            inbound_greeting: DEFAULT_INBOUND_GREETING.to_string(),
            caller_id_override,
        }
    }

    /// Create a policy from the server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            client_prefix: config.routing.client_prefix.clone(),
            inbound_greeting: config.routing.inbound_greeting.clone(),
            caller_id_override: config.twilio.phone_number.clone(),
        }
    }

    pub fn with_client_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client_prefix = prefix.into();
        self
    }

    pub fn with_inbound_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.inbound_greeting = greeting.into();
        self
    }

    pub fn client_prefix(&self) -> &str {
        &self.client_prefix
    }

    pub fn caller_id_override(&self) -> Option<&str> {
        self.caller_id_override.as_deref()
    }

    /// Whether the caller identity marks a registered software client
    ///
    /// Only the prefix is checked; whatever follows it is not validated here.
    pub fn is_client_originated(&self, caller_identity: &str) -> bool {
        caller_identity.starts_with(&self.client_prefix)
    }

    /// Classify an inbound request
    pub fn classify(&self, request: &CallRequestDescriptor) -> RoutingDecision {
        if request.callee_identity().is_empty() {
            return RoutingDecision::error(MISSING_DESTINATION);
        }

        let callee_identity = request.callee_identity().to_string();
        let caller_id_override = self.caller_id_override.clone();

        if self.is_client_originated(request.caller_identity()) {
            RoutingDecision::BrowserOriginatedDial {
                callee_identity,
                caller_id_override,
            }
        } else {
            RoutingDecision::InboundGreetAndDial {
                callee_identity,
                caller_id_override,
                greeting: self.inbound_greeting.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CallRoutingPolicy {
        CallRoutingPolicy::new(Some("+15550001111".to_string()))
    }

    #[test]
    fn test_client_caller_dials_directly() {
        let request = CallRequestDescriptor::new("+15551234567", "client:abc123");
        let decision = policy().classify(&request);

        assert_eq!(
            decision,
            RoutingDecision::BrowserOriginatedDial {
                callee_identity: "+15551234567".to_string(),
                caller_id_override: Some("+15550001111".to_string()),
            }
        );
    }

    #[test]
    fn test_network_caller_is_greeted() {
        let request = CallRequestDescriptor::new("+15551234567", "+15559876543");
        let decision = policy().classify(&request);

        assert_eq!(
            decision,
            RoutingDecision::InboundGreetAndDial {
                callee_identity: "+15551234567".to_string(),
                caller_id_override: Some("+15550001111".to_string()),
                greeting: DEFAULT_INBOUND_GREETING.to_string(),
            }
        );
    }

    #[test]
    fn test_empty_callee_is_error() {
        let request = CallRequestDescriptor::new("", "+15559876543");
        assert_eq!(
            policy().classify(&request),
            RoutingDecision::error(MISSING_DESTINATION)
        );

        let request = CallRequestDescriptor::new("", "client:abc");
        assert!(policy().classify(&request).is_error());
    }

    #[test]
    fn test_whitespace_callee_passes_through() {
        let request = CallRequestDescriptor::new(" ", "client:abc");
        assert_eq!(
            policy().classify(&request),
            RoutingDecision::BrowserOriginatedDial {
                callee_identity: " ".to_string(),
                caller_id_override: Some("+15550001111".to_string()),
            }
        );
    }

    #[test]
    fn test_bare_prefix_is_still_client() {
        let request = CallRequestDescriptor::new("+15551234567", "client:");
        assert_eq!(
            policy().classify(&request).kind(),
            "browser_originated_dial"
        );
    }

    #[test]
    fn test_prefix_governs_regardless_of_callee() {
        let request = CallRequestDescriptor::new("client:xyz", "client:abc");
        match policy().classify(&request) {
            RoutingDecision::BrowserOriginatedDial {
                callee_identity, ..
            } => assert_eq!(callee_identity, "client:xyz"),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let request = CallRequestDescriptor::new("+15551234567", "Client:abc");
        assert_eq!(policy().classify(&request).kind(), "inbound_greet_and_dial");
    }

    #[test]
    fn test_custom_prefix_and_greeting() {
        let policy = CallRoutingPolicy::new(None)
            .with_client_prefix("sip:")
            .with_inbound_greeting("Hello there.");

        let request = CallRequestDescriptor::new("+15551234567", "sip:alice@example.com");
        assert_eq!(policy.classify(&request).kind(), "browser_originated_dial");

        let request = CallRequestDescriptor::new("+15551234567", "client:abc");
        assert_eq!(
            policy.classify(&request),
            RoutingDecision::InboundGreetAndDial {
                callee_identity: "+15551234567".to_string(),
                caller_id_override: None,
                greeting: "Hello there.".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        let request = CallRequestDescriptor::new("+15551234567", "+15559876543");
        let policy = policy();
        assert_eq!(policy.classify(&request), policy.classify(&request));
    }

    #[test]
    fn test_from_fields_missing_callee_becomes_empty() {
        let descriptor =
            CallRequestDescriptor::from_fields(None, Some("+15559876543".to_string())).unwrap();
        assert_eq!(descriptor.callee_identity(), "");
        assert!(policy().classify(&descriptor).is_error());
    }

    #[test]
    fn test_from_fields_missing_caller_is_rejected() {
        let result = CallRequestDescriptor::from_fields(Some("+15551234567".to_string()), None);
        assert_eq!(result, Err(DescriptorError::MissingCaller));
    }
}
