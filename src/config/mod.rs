//! Configuration module for the call routing gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use callroute_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use crate::core::provider::TWILIO_API_BASE_URL;
use crate::core::routing::{DEFAULT_CLIENT_PREFIX, DEFAULT_INBOUND_GREETING};

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Identity presented to the provider when none is configured
pub const DEFAULT_TOKEN_IDENTITY: &str = "user";

/// Access token lifetime when none is configured
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 3600;

/// Longest access token lifetime the provider accepts
pub const MAX_TOKEN_TTL_SECONDS: u64 = 86_400;

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// API secret authentication entry with a client identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthApiSecret {
    pub id: String,
    pub secret: String,
}

impl Drop for AuthApiSecret {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.secret.zeroize();
    }
}

/// Telephony provider account settings
///
/// Secrets are zeroized when the value is dropped. Build instances with
/// `TwilioConfig::default()` and assign fields; struct update syntax is not
/// available on types implementing `Drop`.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Number presented as caller ID on dials and used as the sender of
    /// outbound calls and messages
    pub phone_number: Option<String>,
    /// Voice application the browser client's outgoing calls are routed to
    pub twiml_app_sid: Option<String>,
    /// REST API base URL
    pub api_base_url: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            api_key: None,
            api_secret: None,
            phone_number: None,
            twiml_app_sid: None,
            api_base_url: TWILIO_API_BASE_URL.to_string(),
        }
    }
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .field("phone_number", &self.phone_number)
            .field("twiml_app_sid", &self.twiml_app_sid)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

/// Zeroize provider secrets when the configuration is dropped.
impl Drop for TwilioConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut token) = self.auth_token {
            token.zeroize();
        }
        if let Some(ref mut secret) = self.api_secret {
            secret.zeroize();
        }
    }
}

impl TwilioConfig {
    /// Whether the REST API can be called (account SID plus one credential pair)
    pub fn has_rest_credentials(&self) -> bool {
        self.account_sid.is_some()
            && (self.auth_token.is_some() || (self.api_key.is_some() && self.api_secret.is_some()))
    }
}

/// Call routing settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Caller identity prefix marking a browser client
    pub client_prefix: String,
    /// Greeting spoken before dialing calls from the telephone network
    pub inbound_greeting: String,
    /// Destination dialed after the waiting greeting on `GET /api/voice`
    pub inbound_forward_to: Option<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            client_prefix: DEFAULT_CLIENT_PREFIX.to_string(),
            inbound_greeting: DEFAULT_INBOUND_GREETING.to_string(),
            inbound_forward_to: None,
        }
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway, including:
/// - Server settings (host, port, TLS)
/// - Telephony provider account
/// - Call routing and access token settings
/// - Authentication settings
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // Provider account
    pub twilio: TwilioConfig,

    // Routing
    pub routing: RoutingConfig,

    // Access tokens
    pub token_identity: String,
    pub token_ttl_seconds: u64,

    // Authentication configuration
    pub auth_api_secrets: Vec<AuthApiSecret>,
    pub auth_required: bool,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration (protected API routes only)
    /// Sustained requests per second per client IP; one request of the quota
    /// is replenished every `1s / rate`. Values of 100000 or more disable it.
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            tls: None,
            twilio: TwilioConfig::default(),
            routing: RoutingConfig::default(),
            token_identity: DEFAULT_TOKEN_IDENTITY.to_string(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            auth_api_secrets: Vec::new(),
            auth_required: false,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// The .env file is loaded in main.rs, so its values are visible here as
    /// ordinary environment variables. Unset values fall back to defaults.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_tls(&self.tls)?;
        validation::validate_auth_api_secrets(&self.auth_api_secrets)?;
        validation::validate_auth_required(self.auth_required, &self.auth_api_secrets)?;
        validation::validate_routing(&self.routing)?;
        validation::validate_token(&self.token_identity, self.token_ttl_seconds)?;
        validation::validate_rate_limit(
            self.rate_limit_requests_per_second,
            self.rate_limit_burst_size,
        )?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if API secret authentication is configured
    pub fn has_api_secret_auth(&self) -> bool {
        !self.auth_api_secrets.is_empty()
    }

    /// Find the API secret identifier that matches a bearer token
    ///
    /// Returns the configured id when the token matches a known secret.
    pub fn find_api_secret_id(&self, token: &str) -> Option<&str> {
        crate::auth::match_api_secret_id(token, &self.auth_api_secrets)
    }
}

pub(crate) fn parse_auth_api_secrets_json(
    json_str: &str,
) -> Result<Vec<AuthApiSecret>, Box<dyn std::error::Error>> {
    #[derive(serde::Deserialize)]
    struct AuthApiSecretJson {
        id: String,
        secret: String,
    }

    let secrets: Vec<AuthApiSecretJson> = serde_json::from_str(json_str)
        .map_err(|e| format!("Invalid AUTH_API_SECRETS_JSON format: {e}"))?;

    Ok(secrets
        .into_iter()
        .map(|entry| AuthApiSecret {
            id: entry.id,
            secret: entry.secret,
        })
        .collect())
}
