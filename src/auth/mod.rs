//! Request authentication context and API secret matching

use subtle::ConstantTimeEq;

use crate::config::AuthApiSecret;

/// Authentication context inserted into request extensions by the middleware
///
/// `id` is the identifier of the matched API secret, or `None` when
/// authentication is disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auth {
    pub id: Option<String>,
}

impl Auth {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

/// Find the id of the API secret matching `token`
///
/// Every entry is compared in constant time and the scan never exits early,
/// so timing does not reveal which entry (if any) matched.
pub fn match_api_secret_id<'a>(token: &str, secrets: &'a [AuthApiSecret]) -> Option<&'a str> {
    let mut matched = None;
    for entry in secrets {
        let equal: bool = token.as_bytes().ct_eq(entry.secret.as_bytes()).into();
        if equal && matched.is_none() {
            matched = Some(entry.id.as_str());
        }
    }
    matched
}
