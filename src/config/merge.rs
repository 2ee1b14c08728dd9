//! Overlay YAML values on top of the environment configuration

use std::path::PathBuf;

use super::env::{DEFAULT_API_SECRET_ID, load_from_env};
use super::utils::non_empty;
use super::yaml::YamlConfig;
use super::{AuthApiSecret, ServerConfig, TlsConfig};

/// Build the final configuration: environment (with defaults) first, YAML on top
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;

    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = non_empty(server.host) {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                Some(true) => {
                    let cert_path = non_empty(tls.cert_path)
                        .ok_or("server.tls.enabled is true but cert_path is missing")?;
                    let key_path = non_empty(tls.key_path)
                        .ok_or("server.tls.enabled is true but key_path is missing")?;
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert_path),
                        key_path: PathBuf::from(key_path),
                    });
                }
                None => {}
            }
        }
    }

    if let Some(twilio) = yaml.twilio {
        let target = &mut config.twilio;
        if let Some(v) = non_empty(twilio.account_sid) {
            target.account_sid = Some(v);
        }
        if let Some(v) = non_empty(twilio.auth_token) {
            target.auth_token = Some(v);
        }
        if let Some(v) = non_empty(twilio.api_key) {
            target.api_key = Some(v);
        }
        if let Some(v) = non_empty(twilio.api_secret) {
            target.api_secret = Some(v);
        }
        if let Some(v) = non_empty(twilio.phone_number) {
            target.phone_number = Some(v);
        }
        if let Some(v) = non_empty(twilio.twiml_app_sid) {
            target.twiml_app_sid = Some(v);
        }
        if let Some(v) = non_empty(twilio.api_base_url) {
            target.api_base_url = v;
        }
    }

    if let Some(routing) = yaml.routing {
        // Kept even when empty so validation can reject it
        if let Some(prefix) = routing.client_prefix {
            config.routing.client_prefix = prefix;
        }
        if let Some(greeting) = non_empty(routing.inbound_greeting) {
            config.routing.inbound_greeting = greeting;
        }
        if let Some(forward_to) = non_empty(routing.inbound_forward_to) {
            config.routing.inbound_forward_to = Some(forward_to);
        }
    }

    if let Some(token) = yaml.token {
        if let Some(identity) = non_empty(token.identity) {
            config.token_identity = identity;
        }
        if let Some(ttl) = token.ttl_seconds {
            config.token_ttl_seconds = ttl;
        }
    }

    if let Some(auth) = yaml.auth {
        if let Some(required) = auth.required {
            config.auth_required = required;
        }
        if !auth.api_secrets.is_empty() {
            config.auth_api_secrets = auth
                .api_secrets
                .into_iter()
                .map(|entry| AuthApiSecret {
                    id: entry.id,
                    secret: entry.secret,
                })
                .collect();
        } else if let Some(secret) = non_empty(auth.api_secret) {
            config.auth_api_secrets = vec![AuthApiSecret {
                id: DEFAULT_API_SECRET_ID.to_string(),
                secret,
            }];
        }
    }

    if let Some(security) = yaml.security {
        if let Some(origins) = non_empty(security.cors_allowed_origins) {
            config.cors_allowed_origins = Some(origins);
        }
        if let Some(rps) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = rps;
        }
        if let Some(burst) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = burst;
        }
    }

    Ok(config)
}
