//! Token providers.
//!
//! A [`TokenProvider`] supplies the current access and refresh tokens, decides
//! whether a response means the token expired, and renews it. The client
//! depends only on the trait; strategies are supplied by the application.

mod refresh;

pub use refresh::{RefreshSettings, RouteRefreshTokenProvider};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::client::RestApiClient;
use crate::templating::{has_value, set_value, DataBag};
use crate::transport::HttpResponse;

/// Authentication capability consulted by the smart dispatcher.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token.
    fn access_token(&self) -> Option<String>;

    /// Current refresh token.
    fn refresh_token(&self) -> Option<String>;

    /// Returns true if `response` indicates the access token expired.
    fn is_token_expired(&self, response: &HttpResponse, client: &RestApiClient) -> bool;

    /// Renews the access token. Returns true if the failed call should be
    /// retried.
    async fn renew_access_token(&self, route_name: Option<&str>, client: &RestApiClient) -> bool;
}

/// Adds the provider's tokens to `data` under the given field names.
///
/// Fields that already hold a value are left alone, so callers can override
/// the ambient token for a single call.
pub fn inject_tokens(
    provider: &dyn TokenProvider,
    access_field: &str,
    refresh_field: &str,
    data: &mut DataBag,
) {
    if !has_value(access_field, data) {
        if let Some(token) = provider.access_token() {
            set_value(access_field, Value::String(token), data);
        }
    }

    if !has_value(refresh_field, data) {
        if let Some(token) = provider.refresh_token() {
            set_value(refresh_field, Value::String(token), data);
        }
    }
}

/// Fixed tokens that never expire and are never renewed.
pub struct StaticTokenProvider {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
}

impl StaticTokenProvider {
    /// Creates a provider with an access token only.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            refresh_token: None,
        }
    }

    /// Sets the refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(SecretString::new(refresh_token.into()));
        self
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    fn access_token(&self) -> Option<String> {
        Some(self.access_token.expose_secret().clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh_token
            .as_ref()
            .map(|token| token.expose_secret().clone())
    }

    fn is_token_expired(&self, _response: &HttpResponse, _client: &RestApiClient) -> bool {
        false
    }

    async fn renew_access_token(&self, _route_name: Option<&str>, _client: &RestApiClient) -> bool {
        false
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inject_tokens_into_empty_bag() {
        let provider = StaticTokenProvider::new("access").with_refresh_token("refresh");
        let mut data = DataBag::new();

        inject_tokens(&provider, "authorization", "authorization-refresh", &mut data);

        assert_eq!(data["authorization"], json!("access"));
        assert_eq!(data["authorization-refresh"], json!("refresh"));
    }

    #[test]
    fn test_inject_tokens_keeps_caller_values() {
        let provider = StaticTokenProvider::new("access").with_refresh_token("refresh");
        let mut data = DataBag::new();
        data.insert("authorization".to_string(), json!("Bearer mine"));

        inject_tokens(&provider, "authorization", "authorization-refresh", &mut data);

        assert_eq!(data["authorization"], json!("Bearer mine"));
        assert_eq!(data["authorization-refresh"], json!("refresh"));
    }

    #[test]
    fn test_inject_tokens_without_refresh_token() {
        let provider = StaticTokenProvider::new("access");
        let mut data = DataBag::new();

        inject_tokens(&provider, "authorization", "authorization-refresh", &mut data);

        assert!(data.get("authorization-refresh").is_none());
    }

    #[test]
    fn test_static_provider_debug_redacts() {
        let provider = StaticTokenProvider::new("super-secret");
        let debug_str = format!("{:?}", provider);

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("super-secret"));
    }
}
