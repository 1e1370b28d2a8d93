//! Per-call request options.

use serde_json::Value;
use std::time::Duration;

use crate::templating::DataBag;

/// A call against a named route.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// Route to resolve in the current route map.
    pub route_name: String,
    /// Values for path, query, header, body and form fields.
    pub data: Option<DataBag>,
    /// Caller data passed through to observers. The dispatcher adds
    /// `requestId`, `routeName` and `requestData`.
    pub additional_data: Option<DataBag>,
    /// Caller tags passed through to observers.
    pub request_tags: Vec<String>,
    /// Serialize JSON bodies before sending.
    pub automatic_json_request_body_parsing: bool,
    /// Parse response bodies as JSON when possible.
    pub automatic_json_response_body_parsing: bool,
    /// Browser credentials mode. Native transports ignore it.
    pub allow_credentials_on_cross_site_requests: bool,
    /// Request timeout. Zero means no timeout.
    pub timeout: Duration,
}

impl RequestOptions {
    /// Creates options for a route with no data.
    pub fn new(route_name: impl Into<String>) -> Self {
        Self {
            route_name: route_name.into(),
            data: None,
            additional_data: None,
            request_tags: Vec::new(),
            automatic_json_request_body_parsing: true,
            automatic_json_response_body_parsing: true,
            allow_credentials_on_cross_site_requests: false,
            timeout: Duration::ZERO,
        }
    }

    /// Sets the data bag.
    pub fn with_data(mut self, data: DataBag) -> Self {
        self.data = Some(data);
        self
    }

    /// Sets one data field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(DataBag::new)
            .insert(name.into(), value.into());
        self
    }

    /// Sets the additional data.
    pub fn with_additional_data(mut self, additional_data: DataBag) -> Self {
        self.additional_data = Some(additional_data);
        self
    }

    /// Adds a request tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.request_tags.push(tag.into());
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets automatic JSON handling for the request body.
    pub fn with_json_request_body(mut self, enabled: bool) -> Self {
        self.automatic_json_request_body_parsing = enabled;
        self
    }

    /// Sets automatic JSON handling for the response body.
    pub fn with_json_response_body(mut self, enabled: bool) -> Self {
        self.automatic_json_response_body_parsing = enabled;
        self
    }

    /// Returns an `additional_data` entry.
    pub fn additional(&self, key: &str) -> Option<&Value> {
        self.additional_data.as_ref().and_then(|data| data.get(key))
    }
}
