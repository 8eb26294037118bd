//! NetBox API token authentication.

use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// A NetBox API token.
///
/// The [`Debug`] impl redacts the token to prevent accidental credential
/// exposure in log output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Apply authentication to a request builder.
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, format!("Token {}", self.0))
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ApiToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = ApiToken::new("0123456789abcdef");
        assert_eq!(format!("{token:?}"), "ApiToken(\"[REDACTED]\")");
    }

    #[test]
    fn test_apply_sets_token_header() {
        let request = ApiToken::new("abc")
            .apply(reqwest::Client::new().get("http://netbox.local/api/"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
            Some("Token abc")
        );
    }

    #[test]
    fn test_blank_token_is_empty() {
        assert!(ApiToken::new("  ").is_empty());
        assert!(!ApiToken::new("abc").is_empty());
    }
}
