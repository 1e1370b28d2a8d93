//! Route client.
//!
//! [`RestApiClient`] resolves named routes against its route map, injects
//! tokens from the attached [`TokenProvider`], dispatches through an
//! [`HttpTransport`] and reports every transition to its event listeners.

mod dispatch;
mod request;

pub use request::RequestOptions;

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::instrument;

use crate::auth::TokenProvider;
use crate::config::ClientOptions;
use crate::errors::{RestClientError, RestClientResult};
use crate::events::{EventListeners, ListenerId, RestClientEvent, RestClientEventArgs};
use crate::route_map::RouteMap;
use crate::templating::DataBag;
use crate::transport::{HttpRequestOptions, HttpResponse, HttpTransport, ReqwestTransport};

/// Declarative REST client.
///
/// # Example
///
/// ```rust,no_run
/// use route_rest_client::{RequestOptions, RestApiClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = RestApiClient::builder()
///         .host("https://api.example.com")
///         .route_map_path("/routes.json")
///         .build()
///         .await?;
///
///     let response = client
///         .send_smart_request(RequestOptions::new("getUser").with_field("id", 42))
///         .await?;
///     println!("{}", response.status);
///     Ok(())
/// }
/// ```
pub struct RestApiClient {
    options: RwLock<ClientOptions>,
    route_map: RwLock<Arc<RouteMap>>,
    token_provider: RwLock<Option<Arc<dyn TokenProvider>>>,
    transport: Arc<dyn HttpTransport>,
    events: EventListeners,
}

impl RestApiClient {
    /// Creates a new client builder.
    pub fn builder() -> RestApiClientBuilder {
        RestApiClientBuilder::new()
    }

    /// Returns the registry name.
    pub fn name(&self) -> String {
        self.options.read().name().to_string()
    }

    /// Returns a snapshot of the options. The route map is held separately,
    /// see [`route_map`](Self::route_map).
    pub fn options(&self) -> ClientOptions {
        self.options.read().clone()
    }

    /// Returns the configured route map URL.
    pub fn route_map_url(&self) -> Option<String> {
        self.options.read().route_map_url().map(str::to_string)
    }

    /// Sets the route map URL used by [`update_route_map`](Self::update_route_map).
    pub fn set_route_map_url(&self, route_map_url: Option<String>) {
        self.options.write().route_map_url = route_map_url;
    }

    /// Returns the current route map.
    pub fn route_map(&self) -> Arc<RouteMap> {
        Arc::clone(&self.route_map.read())
    }

    /// Replaces the route map.
    pub fn set_route_map(&self, route_map: RouteMap) {
        *self.route_map.write() = Arc::new(route_map);
    }

    /// Fetches the route map again and swaps it in.
    ///
    /// Does nothing when no route map URL is configured. On failure the
    /// current map is kept.
    #[instrument(skip(self))]
    pub async fn update_route_map(&self) -> RestClientResult<()> {
        let Some(url) = self.route_map_url() else {
            return Ok(());
        };

        let route_map = request_route_map(self.transport.as_ref(), &url).await?;
        tracing::info!(
            version = route_map.version.as_deref().unwrap_or_default(),
            routes = route_map.routes.len(),
            "Route map updated"
        );
        self.set_route_map(route_map);
        Ok(())
    }

    /// Returns the token provider.
    pub fn token_provider(&self) -> Option<Arc<dyn TokenProvider>> {
        self.token_provider.read().clone()
    }

    /// Attaches or detaches the token provider.
    pub fn set_token_provider(&self, token_provider: Option<Arc<dyn TokenProvider>>) {
        *self.token_provider.write() = token_provider;
    }

    /// Sets the route and data used to rebuild a request after token renewal.
    pub fn set_retry_route(&self, route_name: Option<String>, data: Option<DataBag>) {
        let mut options = self.options.write();
        options.route_name = route_name;
        options.data = data;
    }

    /// Registers an event listener.
    pub fn add_event_listener<F>(&self, kind: RestClientEvent, listener: F) -> ListenerId
    where
        F: Fn(&RestClientEventArgs) + Send + Sync + 'static,
    {
        self.events.add(kind, Arc::new(listener))
    }

    /// Removes an event listener.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.events.remove(id)
    }

    /// Returns the listener registry.
    pub fn events(&self) -> &EventListeners {
        &self.events
    }

    /// Sends a prepared request straight to the transport, without events or
    /// token renewal.
    pub async fn send_request(&self, request: HttpRequestOptions) -> RestClientResult<HttpResponse> {
        Ok(self.transport.send(request).await?)
    }
}

impl std::fmt::Debug for RestApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestApiClient")
            .field("name", &self.name())
            .field("routes", &self.route_map.read().routes.len())
            .field("has_token_provider", &self.token_provider.read().is_some())
            .field("events", &self.events)
            .finish()
    }
}

/// Fetches and decodes a route map document.
async fn request_route_map(transport: &dyn HttpTransport, url: &str) -> RestClientResult<RouteMap> {
    let response = transport
        .fetch(url)
        .await
        .map_err(|e| RestClientError::route_map_fetch(e.to_string()))?;

    if response.status != 200 {
        return Err(RestClientError::route_map_fetch(format!(
            "unexpected status {} from {}",
            response.status, url
        )));
    }

    let document = response
        .json_data
        .ok_or_else(|| RestClientError::route_map_fetch(format!("empty body from {}", url)))?;

    serde_json::from_value(document).map_err(|e| RestClientError::route_map_fetch(e.to_string()))
}

/// Builder for [`RestApiClient`].
#[derive(Default)]
pub struct RestApiClientBuilder {
    options: ClientOptions,
    transport: Option<Arc<dyn HttpTransport>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl RestApiClientBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from existing options.
    pub fn from_options(options: ClientOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Returns the options collected so far.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sets the registry name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = Some(host.into());
        self
    }

    /// Sets the base path.
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.options.base_path = Some(base_path.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = Some(base_url.into());
        self
    }

    /// Sets the route map path.
    pub fn route_map_path(mut self, route_map_path: impl Into<String>) -> Self {
        self.options.route_map_path = Some(route_map_path.into());
        self
    }

    /// Sets the route map URL.
    pub fn route_map_url(mut self, route_map_url: impl Into<String>) -> Self {
        self.options.route_map_url = Some(route_map_url.into());
        self
    }

    /// Sets an inline route map, skipping the fetch.
    pub fn route_map(mut self, route_map: RouteMap) -> Self {
        self.options.route_map = Some(route_map);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the token provider.
    pub fn token_provider(mut self, token_provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(token_provider);
        self
    }

    /// Builds the client, fetching the route map if none was given.
    pub async fn build(self) -> RestClientResult<RestApiClient> {
        let mut options = self.options;
        options.resolve_defaults();

        if !options.base_url().is_empty() {
            url::Url::parse(options.base_url())?;
        }

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                ReqwestTransport::new()
                    .map_err(|e| RestClientError::configuration(e.to_string()))?,
            ),
        };

        let route_map = match options.route_map.take() {
            Some(route_map) => route_map,
            None => {
                let url = options.route_map_url().ok_or_else(|| {
                    RestClientError::route_map_fetch("no route map or route map URL configured")
                })?;
                tracing::debug!(url, "Fetching route map");
                request_route_map(transport.as_ref(), url).await?
            }
        };

        Ok(RestApiClient {
            options: RwLock::new(options),
            route_map: RwLock::new(Arc::new(route_map)),
            token_provider: RwLock::new(self.token_provider),
            transport,
            events: EventListeners::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockResponse, MockTransport};
    use crate::route_map::{HttpMethod, Route};
    use serde_json::json;

    fn route_map_document() -> serde_json::Value {
        json!({
            "version": "2",
            "routes": {
                "getUser": { "method": "GET", "path": "/users/{id}" }
            }
        })
    }

    #[tokio::test]
    async fn test_build_fetches_route_map() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_json(&route_map_document());

        let client = RestApiClient::builder()
            .host("https://api.example.com")
            .route_map_path("/routes")
            .transport(transport.clone())
            .build()
            .await
            .unwrap();

        assert_eq!(client.route_map().version.as_deref(), Some("2"));
        assert_eq!(
            transport.last_request().unwrap().url,
            "https://api.example.com/routes"
        );
    }

    #[tokio::test]
    async fn test_build_fails_on_bad_route_map_status() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::error(404, "missing"));

        let result = RestApiClient::builder()
            .route_map_url("https://api.example.com/routes")
            .transport(transport)
            .build()
            .await;

        assert!(matches!(result, Err(RestClientError::RouteMapFetch { .. })));
    }

    #[tokio::test]
    async fn test_build_fails_on_malformed_route_map() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_json(&json!({"version": "1"}));

        let result = RestApiClient::builder()
            .route_map_url("https://api.example.com/routes")
            .transport(transport)
            .build()
            .await;

        assert!(matches!(result, Err(RestClientError::RouteMapFetch { .. })));
    }

    #[tokio::test]
    async fn test_build_without_any_route_map_source() {
        let result = RestApiClient::builder()
            .transport(Arc::new(MockTransport::new()))
            .build()
            .await;

        assert!(matches!(result, Err(RestClientError::RouteMapFetch { .. })));
    }

    #[tokio::test]
    async fn test_update_route_map_swaps_whole_map() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_json(&route_map_document());

        let client = RestApiClient::builder()
            .route_map(RouteMap::new().with_route("old", Route::new(HttpMethod::Get, "/old")))
            .route_map_url("https://api.example.com/routes")
            .transport(transport)
            .build()
            .await
            .unwrap();

        client.update_route_map().await.unwrap();

        let map = client.route_map();
        assert!(map.route("old").is_none());
        assert!(map.route("getUser").is_some());
    }

    #[tokio::test]
    async fn test_update_route_map_failure_keeps_current_map() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::error(500, "down"));

        let client = RestApiClient::builder()
            .route_map(RouteMap::new().with_route("old", Route::new(HttpMethod::Get, "/old")))
            .route_map_url("https://api.example.com/routes")
            .transport(transport)
            .build()
            .await
            .unwrap();
        let before = client.route_map();

        assert!(client.update_route_map().await.is_err());
        assert!(Arc::ptr_eq(&before, &client.route_map()));
    }

    #[tokio::test]
    async fn test_update_route_map_without_url_is_noop() {
        let transport = Arc::new(MockTransport::new());
        let client = RestApiClient::builder()
            .route_map(RouteMap::new().with_route("old", Route::new(HttpMethod::Get, "/old")))
            .transport(transport.clone())
            .build()
            .await
            .unwrap();
        let before = client.route_map();

        client.update_route_map().await.unwrap();

        assert!(Arc::ptr_eq(&before, &client.route_map()));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_base_url() {
        let result = RestApiClient::builder()
            .base_url("api.example.com")
            .route_map(RouteMap::new())
            .transport(Arc::new(MockTransport::new()))
            .build()
            .await;

        assert!(matches!(result, Err(RestClientError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_set_route_map_url() {
        let client = RestApiClient::builder()
            .route_map(RouteMap::new())
            .transport(Arc::new(MockTransport::new()))
            .build()
            .await
            .unwrap();

        assert_eq!(client.route_map_url(), None);
        client.set_route_map_url(Some("https://x/routes".to_string()));
        assert_eq!(client.route_map_url().as_deref(), Some("https://x/routes"));
    }
}
