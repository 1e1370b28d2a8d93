//! Refresh-token renewal through a named route.

use async_trait::async_trait;
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::instrument;

use super::TokenProvider;
use crate::client::RestApiClient;
use crate::templating::{get_value, value_to_string, DataBag};
use crate::transport::HttpResponse;

/// Where the renewal request and response carry their tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Route that exchanges a refresh token for a new access token.
    pub route_name: String,
    /// Data field that receives the refresh token for the renewal request.
    pub request_field: String,
    /// Response JSON field holding the new access token.
    pub access_token_field: String,
    /// Response JSON field holding the rotated refresh token, if any.
    pub refresh_token_field: String,
}

impl RefreshSettings {
    /// Creates settings for a route using OAuth2 field names.
    pub fn new(route_name: impl Into<String>) -> Self {
        Self {
            route_name: route_name.into(),
            request_field: "refresh_token".to_string(),
            access_token_field: "access_token".to_string(),
            refresh_token_field: "refresh_token".to_string(),
        }
    }
}

/// Tokens renewed through a route of the client's own route map.
///
/// A `401` counts as expiry. Concurrent renewals are serialized: callers that
/// waited behind a renewal which already rotated the tokens retry without a
/// second exchange.
pub struct RouteRefreshTokenProvider {
    settings: RefreshSettings,
    access_token: RwLock<SecretString>,
    refresh_token: RwLock<Option<SecretString>>,
    renewal: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl RouteRefreshTokenProvider {
    /// Creates a provider with an initial token pair.
    pub fn new(
        settings: RefreshSettings,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            settings,
            access_token: RwLock::new(SecretString::new(access_token.into())),
            refresh_token: RwLock::new(refresh_token.map(SecretString::new)),
            renewal: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Replaces the stored tokens.
    pub fn set_tokens(&self, access_token: impl Into<String>, refresh_token: Option<String>) {
        *self.access_token.write() = SecretString::new(access_token.into());
        if let Some(refresh_token) = refresh_token {
            *self.refresh_token.write() = Some(SecretString::new(refresh_token));
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of times the tokens were replaced.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn apply_response(&self, response: &HttpResponse) -> bool {
        let Some(Value::Object(json)) = &response.json_data else {
            return false;
        };

        let Some(access_token) =
            get_value(&self.settings.access_token_field, json).and_then(value_to_string)
        else {
            return false;
        };
        // Keep the old refresh token when the server does not rotate it.
        let refresh_token =
            get_value(&self.settings.refresh_token_field, json).and_then(value_to_string);

        self.set_tokens(access_token, refresh_token);
        true
    }
}

#[async_trait]
impl TokenProvider for RouteRefreshTokenProvider {
    fn access_token(&self) -> Option<String> {
        Some(self.access_token.read().expose_secret().clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh_token
            .read()
            .as_ref()
            .map(|token| token.expose_secret().clone())
    }

    fn is_token_expired(&self, response: &HttpResponse, _client: &RestApiClient) -> bool {
        response.status == 401
    }

    #[instrument(skip(self, client), fields(refresh_route = %self.settings.route_name))]
    async fn renew_access_token(&self, route_name: Option<&str>, client: &RestApiClient) -> bool {
        let observed = self.generation();
        let _guard = self.renewal.lock().await;

        if self.generation() != observed {
            tracing::debug!("Tokens rotated while waiting; skipping renewal");
            return true;
        }

        let Some(refresh_token) = self.refresh_token() else {
            tracing::warn!("No refresh token available");
            return false;
        };

        let mut data = DataBag::new();
        data.insert(
            self.settings.request_field.clone(),
            Value::String(refresh_token),
        );

        let request = match client.prepare_request_options(&self.settings.route_name, Some(&data)) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build token renewal request");
                return false;
            }
        };

        let response = match client.send_request(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Token renewal request failed");
                return false;
            }
        };

        if !response.is_success() {
            tracing::warn!(status = response.status, "Token renewal rejected");
            return false;
        }

        let renewed = self.apply_response(&response);
        tracing::info!(
            renewed,
            failed_route = route_name.unwrap_or_default(),
            "Token renewal completed"
        );
        renewed
    }
}

impl std::fmt::Debug for RouteRefreshTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRefreshTokenProvider")
            .field("settings", &self.settings)
            .field("access_token", &"[REDACTED]")
            .field("generation", &self.generation())
            .finish()
    }
}
