//! Client configuration.
//!
//! [`ClientOptions`] carries the per-client settings. Unset values are filled
//! in by [`ClientOptions::resolve_defaults`] when the client is created.

use serde_json::Value;

use crate::errors::{RestClientError, RestClientResult};
use crate::route_map::RouteMap;
use crate::templating::{set_path_parameters, DataBag};

/// Registry key used when no name is given.
pub const DEFAULT_CLIENT_NAME: &str = "DEFAULT_REST_API_CLIENT";

/// Default data field carrying the access token.
pub const DEFAULT_AUTHORIZATION_HEADER: &str = "authorization";

/// Default data field carrying the refresh token.
pub const DEFAULT_AUTHORIZATION_REFRESH_HEADER: &str = "authorization-refresh";

/// Configuration for a route client.
#[derive(Clone, Default, PartialEq)]
pub struct ClientOptions {
    /// API version, available to the route map path as `{apiVersion}`.
    pub api_version: Option<String>,
    /// Registry key.
    pub name: Option<String>,
    /// Scheme and authority, e.g. `https://api.example.com`.
    pub host: Option<String>,
    /// Path prefix appended to the host.
    pub base_path: Option<String>,
    /// Prefix for relative route paths. Derived from host and base path.
    pub base_url: Option<String>,
    /// Path of the route map document relative to the base URL.
    pub route_map_path: Option<String>,
    /// Absolute route map URL. Derived from base URL and route map path.
    pub route_map_url: Option<String>,
    /// Inline route map. When absent it is fetched during creation.
    pub route_map: Option<RouteMap>,
    /// Attach a backtrace to synthesized error responses.
    pub include_error_stack_trace: bool,
    /// Browser credentials mode. Accepted for compatibility; native
    /// transports ignore it.
    pub allow_credentials_on_cross_site_requests: bool,
    /// Data field that receives the access token.
    pub authorization_header: Option<String>,
    /// Data field that receives the refresh token.
    pub authorization_refresh_header: Option<String>,
    /// Route used when rebuilding a request after token renewal.
    pub route_name: Option<String>,
    /// Data used when rebuilding a request after token renewal.
    pub data: Option<DataBag>,
}

impl ClientOptions {
    /// Creates a new options builder.
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::new()
    }

    /// Creates options from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REST_CLIENT_HOST`
    /// - `REST_CLIENT_BASE_PATH`
    /// - `REST_CLIENT_BASE_URL`
    /// - `REST_CLIENT_ROUTE_MAP_PATH`
    /// - `REST_CLIENT_ROUTE_MAP_URL`
    /// - `REST_CLIENT_API_VERSION`
    /// - `REST_CLIENT_NAME`
    ///
    /// At least one of the host, base URL or route map URL must be set.
    pub fn from_env() -> RestClientResult<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let options = ClientOptions {
            host: var("REST_CLIENT_HOST"),
            base_path: var("REST_CLIENT_BASE_PATH"),
            base_url: var("REST_CLIENT_BASE_URL"),
            route_map_path: var("REST_CLIENT_ROUTE_MAP_PATH"),
            route_map_url: var("REST_CLIENT_ROUTE_MAP_URL"),
            api_version: var("REST_CLIENT_API_VERSION"),
            name: var("REST_CLIENT_NAME"),
            ..Default::default()
        };

        if options.host.is_none() && options.base_url.is_none() && options.route_map_url.is_none()
        {
            return Err(RestClientError::configuration(
                "REST_CLIENT_HOST, REST_CLIENT_BASE_URL or REST_CLIENT_ROUTE_MAP_URL must be set",
            ));
        }

        Ok(options)
    }

    /// Fills unset values from their defaults.
    ///
    /// `base_url` becomes host + base path, and `route_map_url` becomes
    /// base URL + route map path with `{param}` placeholders filled from the
    /// options themselves.
    pub fn resolve_defaults(&mut self) {
        let host = self.host.get_or_insert_with(String::new).clone();
        let base_path = self.base_path.get_or_insert_with(String::new).clone();
        let base_url = self
            .base_url
            .get_or_insert_with(|| format!("{}{}", host, base_path))
            .clone();
        let route_map_path = self.route_map_path.get_or_insert_with(String::new).clone();

        if self.route_map_url.is_none() {
            let fields = self.template_fields();
            let path = set_path_parameters(&route_map_path, Some(&fields));
            self.route_map_url = Some(format!("{}{}", base_url, path));
        }

        self.authorization_header
            .get_or_insert_with(|| DEFAULT_AUTHORIZATION_HEADER.to_string());
        self.authorization_refresh_header
            .get_or_insert_with(|| DEFAULT_AUTHORIZATION_REFRESH_HEADER.to_string());
    }

    /// Returns the registry key.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_CLIENT_NAME)
    }

    /// Returns the base URL, or an empty prefix.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or_default()
    }

    /// Returns the route map URL if one is configured.
    pub fn route_map_url(&self) -> Option<&str> {
        self.route_map_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Returns the access token field name.
    pub fn authorization_header(&self) -> &str {
        self.authorization_header
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORIZATION_HEADER)
    }

    /// Returns the refresh token field name.
    pub fn authorization_refresh_header(&self) -> &str {
        self.authorization_refresh_header
            .as_deref()
            .unwrap_or(DEFAULT_AUTHORIZATION_REFRESH_HEADER)
    }

    fn template_fields(&self) -> DataBag {
        let mut fields = DataBag::new();
        let entries = [
            ("apiVersion", &self.api_version),
            ("name", &self.name),
            ("host", &self.host),
            ("basePath", &self.base_path),
            ("baseUrl", &self.base_url),
        ];

        for (key, value) in entries {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        fields
    }
}

impl std::fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Retry data may hold credentials; only its keys are shown.
        let data_keys: Option<Vec<&String>> = self.data.as_ref().map(|data| data.keys().collect());

        f.debug_struct("ClientOptions")
            .field("name", &self.name())
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("route_map_url", &self.route_map_url)
            .field("has_route_map", &self.route_map.is_some())
            .field("include_error_stack_trace", &self.include_error_stack_trace)
            .field("authorization_header", &self.authorization_header)
            .field("authorization_refresh_header", &self.authorization_refresh_header)
            .field("route_name", &self.route_name)
            .field("data_keys", &data_keys)
            .finish()
    }
}

/// Builder for [`ClientOptions`].
#[derive(Debug, Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API version.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.options.api_version = Some(api_version.into());
        self
    }

    /// Sets the registry key.
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

    /// Sets the base URL, overriding host + base path.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.options.base_url = Some(base_url.into());
        self
    }

    /// Sets the route map path.
    pub fn route_map_path(mut self, route_map_path: impl Into<String>) -> Self {
        self.options.route_map_path = Some(route_map_path.into());
        self
    }

    /// Sets the route map URL, overriding base URL + route map path.
    pub fn route_map_url(mut self, route_map_url: impl Into<String>) -> Self {
        self.options.route_map_url = Some(route_map_url.into());
        self
    }

    /// Sets an inline route map.
    pub fn route_map(mut self, route_map: RouteMap) -> Self {
        self.options.route_map = Some(route_map);
        self
    }

    /// Attaches backtraces to synthesized error responses.
    pub fn include_error_stack_trace(mut self, include: bool) -> Self {
        self.options.include_error_stack_trace = include;
        self
    }

    /// Sets the browser credentials mode.
    pub fn allow_credentials_on_cross_site_requests(mut self, allow: bool) -> Self {
        self.options.allow_credentials_on_cross_site_requests = allow;
        self
    }

    /// Sets the access token field name.
    pub fn authorization_header(mut self, header: impl Into<String>) -> Self {
        self.options.authorization_header = Some(header.into());
        self
    }

    /// Sets the refresh token field name.
    pub fn authorization_refresh_header(mut self, header: impl Into<String>) -> Self {
        self.options.authorization_refresh_header = Some(header.into());
        self
    }

    /// Sets the route and data used to rebuild a request after renewal.
    pub fn retry_route(mut self, route_name: impl Into<String>, data: Option<DataBag>) -> Self {
        self.options.route_name = Some(route_name.into());
        self.options.data = data;
        self
    }

    /// Builds the options.
    pub fn build(self) -> ClientOptions {
        self.options
    }
}
