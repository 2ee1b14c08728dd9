//! Twilio REST client
//!
//! # API Reference
//!
//! - Calls: `POST {base}/2010-04-01/Accounts/{AccountSid}/Calls.json`
//!   (form `To`, `From`, `Twiml`), authenticated with an API key/secret pair
//! - Messages: `POST {base}/2010-04-01/Accounts/{AccountSid}/Messages.json`
//!   (form `To`, `From`, `Body`), authenticated with the account SID/auth token
//!
//! Each pair falls back to the other when only one is configured.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{OutboundCall, OutboundMessage, ProviderError, ProviderResult, TelephonyProvider};
use crate::config::TwilioConfig;

/// Production API endpoint
pub const TWILIO_API_BASE_URL: &str = "https://api.twilio.com";

const API_VERSION: &str = "2010-04-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ResourceResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

/// REST client for the Twilio voice and messaging APIs
#[derive(Clone)]
pub struct TwilioRestClient {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    api_key: Option<Credentials>,
    account_token: Option<Credentials>,
}

impl std::fmt::Debug for TwilioRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioRestClient")
            .field("base_url", &self.base_url)
            .field("account_sid", &self.account_sid)
            .field("api_key_configured", &self.api_key.is_some())
            .field("auth_token_configured", &self.account_token.is_some())
            .finish()
    }
}

impl TwilioRestClient {
    /// Build a client from the provider configuration
    ///
    /// Fails when the account SID is missing or when neither an API key pair
    /// nor an auth token is configured.
    pub fn from_config(config: &TwilioConfig) -> ProviderResult<Self> {
        let account_sid = config
            .account_sid
            .clone()
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("TWILIO_ACCOUNT_SID".to_string()))?;

        if !config.has_rest_credentials() {
            return Err(ProviderError::NotConfigured(
                "TWILIO_API_KEY/TWILIO_API_SECRET or TWILIO_AUTH_TOKEN".to_string(),
            ));
        }

        let api_key = match (&config.api_key, &config.api_secret) {
            (Some(key), Some(secret)) => Some(Credentials {
                username: key.clone(),
                password: secret.clone(),
            }),
            _ => None,
        };
        let account_token = config.auth_token.as_ref().map(|token| Credentials {
            username: account_sid.clone(),
            password: token.clone(),
        });

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_sid,
            api_key,
            account_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_url(&self, resource: &str) -> String {
        format!(
            "{}/{}/Accounts/{}/{}.json",
            self.base_url, API_VERSION, self.account_sid, resource
        )
    }

    fn call_credentials(&self) -> Option<&Credentials> {
        self.api_key.as_ref().or(self.account_token.as_ref())
    }

    fn message_credentials(&self) -> Option<&Credentials> {
        self.account_token.as_ref().or(self.api_key.as_ref())
    }

    async fn create_resource(
        &self,
        resource: &str,
        credentials: &Credentials,
        form: &[(&str, &str)],
    ) -> ProviderResult<String> {
        let url = self.resource_url(resource);
        debug!(url = %url, "Creating provider resource");

        let response = self
            .http
            .post(&url)
            .basic_auth(&credentials.username, Some(&credentials.password))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("Provider returned status {}", status.as_u16()));
            warn!(
                resource = resource,
                status = status.as_u16(),
                error = %message,
                "Provider rejected request"
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let created: ResourceResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(created.sid)
    }
}

#[async_trait]
impl TelephonyProvider for TwilioRestClient {
    fn name(&self) -> &'static str {
        "twilio"
    }

    async fn place_call(&self, call: &OutboundCall) -> ProviderResult<String> {
        let credentials = self
            .call_credentials()
            .ok_or_else(|| ProviderError::NotConfigured("call credentials".to_string()))?;

        let form = [
            ("To", call.to.as_str()),
            ("From", call.from.as_str()),
            ("Twiml", call.twiml.as_str()),
        ];
        self.create_resource("Calls", credentials, &form).await
    }

    async fn send_message(&self, message: &OutboundMessage) -> ProviderResult<String> {
        let credentials = self
            .message_credentials()
            .ok_or_else(|| ProviderError::NotConfigured("message credentials".to_string()))?;

        let form = [
            ("To", message.to.as_str()),
            ("From", message.from.as_str()),
            ("Body", message.body.as_str()),
        ];
        self.create_resource("Messages", credentials, &form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn twilio_config(base_url: &str) -> TwilioConfig {
        let mut config = TwilioConfig::default();
        config.account_sid = Some("AC123".to_string());
        config.api_key = Some("SK123".to_string());
        config.api_secret = Some("api-secret".to_string());
        config.auth_token = Some("auth-token".to_string());
        config.phone_number = Some("+15550001111".to_string());
        config.api_base_url = base_url.to_string();
        config
    }

    fn outbound_call() -> OutboundCall {
        OutboundCall {
            to: "+15551234567".to_string(),
            from: "+15550001111".to_string(),
            twiml: "<Response><Dial>+15551234567</Dial></Response>".to_string(),
        }
    }

    #[test]
    fn test_from_config_requires_account_sid() {
        let mut config = twilio_config(TWILIO_API_BASE_URL);
        config.account_sid = None;
        let err = TwilioRestClient::from_config(&config).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(ref v) if v == "TWILIO_ACCOUNT_SID"));
    }

    #[test]
    fn test_from_config_requires_some_credentials() {
        let mut config = twilio_config(TWILIO_API_BASE_URL);
        config.api_key = None;
        config.auth_token = None;
        assert!(matches!(
            TwilioRestClient::from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_resource_url_trims_trailing_slash() {
        let client = TwilioRestClient::from_config(&twilio_config("http://localhost:9999/")).unwrap();
        assert_eq!(
            client.resource_url("Calls"),
            "http://localhost:9999/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[tokio::test]
    async fn test_place_call_returns_sid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=%2B15551234567"))
            .and(body_string_contains("Twiml="))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sid": "CA42"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = TwilioRestClient::from_config(&twilio_config(&server.uri())).unwrap();
        let sid = client.place_call(&outbound_call()).await.unwrap();
        assert_eq!(sid, "CA42");
    }

    #[tokio::test]
    async fn test_place_call_surfaces_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 21211,
                "message": "The 'To' number is not a valid phone number.",
                "status": 400
            })))
            .mount(&server)
            .await;

        let client = TwilioRestClient::from_config(&twilio_config(&server.uri())).unwrap();
        let err = client.place_call(&outbound_call()).await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "The 'To' number is not a valid phone number.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_message_returns_sid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .and(body_string_contains("Body=hello"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sid": "SM7"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = TwilioRestClient::from_config(&twilio_config(&server.uri())).unwrap();
        let sid = client
            .send_message(&OutboundMessage {
                to: "+15551234567".to_string(),
                from: "+15550001111".to_string(),
                body: "hello".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(sid, "SM7");
    }

    #[tokio::test]
    async fn test_non_json_error_body_uses_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = TwilioRestClient::from_config(&twilio_config(&server.uri())).unwrap();
        let err = client.place_call(&outbound_call()).await.unwrap_err();
        assert_eq!(err.to_string(), "Provider returned status 503");
    }
}
