//! Configuration validation

use std::collections::HashSet;

use super::{AuthApiSecret, MAX_TOKEN_TTL_SECONDS, RoutingConfig, TlsConfig};

pub(super) fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tls) = tls {
        if !tls.cert_path.exists() {
            return Err(format!(
                "TLS certificate file not found: {}",
                tls.cert_path.display()
            )
            .into());
        }
        if !tls.key_path.exists() {
            return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
        }
    }
    Ok(())
}

/// Every entry needs a non-empty id and secret, and ids must be unique
pub(super) fn validate_auth_api_secrets(
    secrets: &[AuthApiSecret],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut seen = HashSet::new();
    for entry in secrets {
        if entry.id.trim().is_empty() {
            return Err("API secret entries must have a non-empty id".into());
        }
        if entry.secret.is_empty() {
            return Err(format!("API secret '{}' is empty", entry.id).into());
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(format!("Duplicate API secret id: {}", entry.id).into());
        }
    }
    Ok(())
}

pub(super) fn validate_auth_required(
    auth_required: bool,
    secrets: &[AuthApiSecret],
) -> Result<(), Box<dyn std::error::Error>> {
    if auth_required && secrets.is_empty() {
        return Err(
            "AUTH_REQUIRED is enabled but no API secrets are configured \
             (set AUTH_API_SECRETS_JSON or AUTH_API_SECRET)"
                .into(),
        );
    }
    Ok(())
}

pub(super) fn validate_routing(routing: &RoutingConfig) -> Result<(), Box<dyn std::error::Error>> {
    if routing.client_prefix.is_empty() {
        return Err("routing.client_prefix must not be empty".into());
    }
    if routing.inbound_greeting.trim().is_empty() {
        return Err("routing.inbound_greeting must not be empty".into());
    }
    Ok(())
}

pub(super) fn validate_token(
    identity: &str,
    ttl_seconds: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    if identity.trim().is_empty() {
        return Err("token identity must not be empty".into());
    }
    if ttl_seconds == 0 {
        return Err("TOKEN_TTL_SECONDS must be greater than zero".into());
    }
    if ttl_seconds > MAX_TOKEN_TTL_SECONDS {
        return Err(format!(
            "TOKEN_TTL_SECONDS must not exceed {MAX_TOKEN_TTL_SECONDS} (got {ttl_seconds})"
        )
        .into());
    }
    Ok(())
}

pub(super) fn validate_rate_limit(
    requests_per_second: u32,
    burst_size: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if requests_per_second == 0 {
        return Err("RATE_LIMIT_REQUESTS_PER_SECOND must be greater than zero".into());
    }
    if burst_size == 0 {
        return Err("RATE_LIMIT_BURST_SIZE must be greater than zero".into());
    }
    Ok(())
}
