//! Environment variable loading
//!
//! | Variable | Field |
//! |---|---|
//! | `HOST`, `PORT` | `host`, `port` |
//! | `TLS_ENABLED`, `TLS_CERT_PATH`, `TLS_KEY_PATH` | `tls` |
//! | `TWILIO_*` | `twilio` |
//! | `ROUTING_CLIENT_PREFIX`, `ROUTING_INBOUND_GREETING`, `ROUTING_INBOUND_FORWARD_TO` | `routing` |
//! | `TOKEN_IDENTITY`, `TOKEN_TTL_SECONDS` | access tokens |
//! | `AUTH_REQUIRED`, `AUTH_API_SECRETS_JSON`, `AUTH_API_SECRET`, `AUTH_API_SECRET_ID` | auth |
//! | `CORS_ALLOWED_ORIGINS`, `RATE_LIMIT_REQUESTS_PER_SECOND`, `RATE_LIMIT_BURST_SIZE` | security |

use std::path::PathBuf;

use super::utils::{env_bool, env_parse, env_string};
use super::{AuthApiSecret, ServerConfig, TlsConfig, parse_auth_api_secrets_json};

/// Identifier given to the single secret read from `AUTH_API_SECRET`
pub(super) const DEFAULT_API_SECRET_ID: &str = "default";

/// Build a configuration from environment variables over the defaults
pub(super) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = ServerConfig::default();

    if let Some(host) = env_string("HOST") {
        config.host = host;
    }
    if let Some(port) = env_parse::<u16>("PORT")? {
        config.port = port;
    }

    config.tls = load_tls()?;

    let twilio = &mut config.twilio;
    twilio.account_sid = env_string("TWILIO_ACCOUNT_SID");
    twilio.auth_token = env_string("TWILIO_AUTH_TOKEN");
    twilio.api_key = env_string("TWILIO_API_KEY");
    twilio.api_secret = env_string("TWILIO_API_SECRET");
    twilio.phone_number = env_string("TWILIO_PHONE_NUMBER");
    twilio.twiml_app_sid = env_string("TWILIO_TWIML_APP_SID");
    if let Some(base_url) = env_string("TWILIO_API_BASE_URL") {
        twilio.api_base_url = base_url;
    }

    // The prefix is read raw so an explicitly empty value reaches validation
    if let Ok(prefix) = std::env::var("ROUTING_CLIENT_PREFIX") {
        config.routing.client_prefix = prefix;
    }
    if let Some(greeting) = env_string("ROUTING_INBOUND_GREETING") {
        config.routing.inbound_greeting = greeting;
    }
    config.routing.inbound_forward_to = env_string("ROUTING_INBOUND_FORWARD_TO");

    if let Some(identity) = env_string("TOKEN_IDENTITY") {
        config.token_identity = identity;
    }
    if let Some(ttl) = env_parse::<u64>("TOKEN_TTL_SECONDS")? {
        config.token_ttl_seconds = ttl;
    }

    config.auth_api_secrets = load_api_secrets()?;
    if let Some(required) = env_bool("AUTH_REQUIRED")? {
        config.auth_required = required;
    }

    config.cors_allowed_origins = env_string("CORS_ALLOWED_ORIGINS");
    if let Some(rps) = env_parse::<u32>("RATE_LIMIT_REQUESTS_PER_SECOND")? {
        config.rate_limit_requests_per_second = rps;
    }
    if let Some(burst) = env_parse::<u32>("RATE_LIMIT_BURST_SIZE")? {
        config.rate_limit_burst_size = burst;
    }

    Ok(config)
}

fn load_tls() -> Result<Option<TlsConfig>, Box<dyn std::error::Error>> {
    if !env_bool("TLS_ENABLED")?.unwrap_or(false) {
        return Ok(None);
    }

    let cert_path = env_string("TLS_CERT_PATH")
        .ok_or("TLS_ENABLED is set but TLS_CERT_PATH is missing")?;
    let key_path =
        env_string("TLS_KEY_PATH").ok_or("TLS_ENABLED is set but TLS_KEY_PATH is missing")?;

    Ok(Some(TlsConfig {
        cert_path: PathBuf::from(cert_path),
        key_path: PathBuf::from(key_path),
    }))
}

/// `AUTH_API_SECRETS_JSON` wins over the legacy single `AUTH_API_SECRET`
fn load_api_secrets() -> Result<Vec<AuthApiSecret>, Box<dyn std::error::Error>> {
    if let Some(json) = env_string("AUTH_API_SECRETS_JSON") {
        return parse_auth_api_secrets_json(&json);
    }

    Ok(env_string("AUTH_API_SECRET")
        .map(|secret| {
            vec![AuthApiSecret {
                id: env_string("AUTH_API_SECRET_ID")
                    .unwrap_or_else(|| DEFAULT_API_SECRET_ID.to_string()),
                secret,
            }]
        })
        .unwrap_or_default())
}
