//! Client access tokens
//!
//! Issues the short-lived JWT a browser client uses to register with the
//! provider's voice runtime. Signing is delegated to `jsonwebtoken` (HS256
//! with the API secret); this module only assembles the claims.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ServerConfig;

/// Content type marker the provider requires in the token header
pub const ACCESS_TOKEN_CONTENT_TYPE: &str = "twilio-fpa;v=1";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("System clock is before the Unix epoch")]
    Clock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingGrant {
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingGrant {
    pub application_sid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceGrant {
    pub incoming: IncomingGrant,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<OutgoingGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    pub identity: String,
    pub voice: VoiceGrant,
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub jti: String,
    pub iss: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub grants: Grants,
}

/// Issues voice access tokens for a fixed client identity
#[derive(Clone)]
pub struct AccessTokenIssuer {
    account_sid: String,
    api_key: String,
    api_secret: String,
    application_sid: Option<String>,
    identity: String,
    ttl_seconds: u64,
}

impl std::fmt::Debug for AccessTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenIssuer")
            .field("account_sid", &self.account_sid)
            .field("api_key", &self.api_key)
            .field("application_sid", &self.application_sid)
            .field("identity", &self.identity)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl AccessTokenIssuer {
    pub fn from_config(config: &ServerConfig) -> Result<Self, TokenError> {
        let twilio = &config.twilio;
        Ok(Self {
            account_sid: twilio
                .account_sid
                .clone()
                .ok_or(TokenError::MissingCredential("TWILIO_ACCOUNT_SID"))?,
            api_key: twilio
                .api_key
                .clone()
                .ok_or(TokenError::MissingCredential("TWILIO_API_KEY"))?,
            api_secret: twilio
                .api_secret
                .clone()
                .ok_or(TokenError::MissingCredential("TWILIO_API_SECRET"))?,
            application_sid: twilio.twiml_app_sid.clone(),
            identity: config.token_identity.clone(),
            ttl_seconds: config.token_ttl_seconds,
        })
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Build the claims for a token issued at `issued_at` (Unix seconds)
    pub fn claims(&self, issued_at: u64) -> AccessTokenClaims {
        AccessTokenClaims {
            jti: format!("{}-{}", self.api_key, issued_at),
            iss: self.api_key.clone(),
            sub: self.account_sid.clone(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_seconds),
            grants: Grants {
                identity: self.identity.clone(),
                voice: VoiceGrant {
                    incoming: IncomingGrant { allow: true },
                    outgoing: self
                        .application_sid
                        .as_ref()
                        .map(|sid| OutgoingGrant {
                            application_sid: sid.clone(),
                        }),
                },
            },
        }
    }

    /// Sign a token issued at `issued_at`
    pub fn issue_at(&self, issued_at: u64) -> Result<String, TokenError> {
        let mut header = Header::new(Algorithm::HS256);
        header.cty = Some(ACCESS_TOKEN_CONTENT_TYPE.to_string());

        let claims = self.claims(issued_at);
        let key = EncodingKey::from_secret(self.api_secret.as_bytes());
        Ok(encode(&header, &claims, &key)?)
    }

    /// Sign a token issued now
    pub fn issue(&self) -> Result<String, TokenError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::Clock)?
            .as_secs();
        self.issue_at(now)
    }
}
