//! HTTP transport layer.
//!
//! The smart dispatcher talks to the network only through the
//! [`HttpTransport`] trait. Transport-level failures that never produced an
//! HTTP exchange are reported as a response whose status is
//! [`CONNECTION_ERROR_STATUS`], not as an error.

mod http;

pub use http::ReqwestTransport;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::route_map::HttpMethod;
use crate::templating::DataBag;

/// Status reported for requests that failed before any HTTP exchange.
pub const CONNECTION_ERROR_STATUS: i32 = -1;

/// A part of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    /// Text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON payload.
    Json(serde_json::Value),
    /// Multipart form payload.
    Form(Vec<MultipartPart>),
}

/// A fully resolved HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestOptions {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers.
    pub headers: Option<HashMap<String, String>>,
    /// Request body.
    pub body: Option<RequestBody>,
    /// Request timeout. `None` means no timeout.
    pub timeout: Option<Duration>,
    /// Caller data passed through to observers.
    pub additional_data: Option<DataBag>,
    /// Caller tags passed through to observers.
    pub request_tags: Vec<String>,
    /// Serialize JSON bodies before sending.
    pub automatic_json_request_body_parsing: bool,
    /// Parse response bodies as JSON when possible.
    pub automatic_json_response_body_parsing: bool,
}

impl HttpRequestOptions {
    /// Creates an empty request for the given method.
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            url: String::new(),
            headers: None,
            body: None,
            timeout: None,
            additional_data: None,
            request_tags: Vec::new(),
            automatic_json_request_body_parsing: true,
            automatic_json_response_body_parsing: true,
        }
    }

    /// Creates a GET request for a URL.
    pub fn get(url: impl Into<String>) -> Self {
        let mut request = Self::new(HttpMethod::Get);
        request.url = url.into();
        request
    }

    /// Returns a header value, if set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(String::as_str)
    }
}

/// HTTP response representation.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code, or [`CONNECTION_ERROR_STATUS`].
    pub status: i32,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Body parsed as JSON, when parsing was requested and succeeded.
    pub json_data: Option<serde_json::Value>,
}

impl HttpResponse {
    /// Creates a response with the given status and no body.
    pub fn with_status(status: i32) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
            json_data: None,
        }
    }

    /// Creates a connection failure response carrying the error text.
    pub fn connection_error(message: impl Into<String>) -> Self {
        let mut response = Self::with_status(CONNECTION_ERROR_STATUS);
        response.body = message.into().into_bytes();
        response
    }

    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the request never reached a real HTTP exchange.
    pub fn is_connection_error(&self) -> bool {
        self.status < 0
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// Transport faults outside the response contract.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be constructed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Error message.
        message: String,
    },

    /// The underlying HTTP client could not be created.
    #[error("Client initialization failed: {message}")]
    Initialization {
        /// Error message.
        message: String,
    },
}

/// HTTP transport trait.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request.
    ///
    /// Connectivity failures must be returned as `Ok` with a negative status.
    async fn send(&self, request: HttpRequestOptions) -> Result<HttpResponse, TransportError>;

    /// Sends a plain GET to a URL with JSON response parsing.
    async fn fetch(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequestOptions::get(url)).await
    }
}
