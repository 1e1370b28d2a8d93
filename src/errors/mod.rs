//! Error types for the route client.
//!
//! Failures that are part of normal operation (unknown route, unreachable
//! host, expired token) are reported as [`HttpResponse`] values by the smart
//! dispatcher. The types here cover the throwing paths: route-map fetch
//! failures, configuration problems, and transport faults.

use std::backtrace::Backtrace;
use std::collections::HashMap;
use thiserror::Error;

use crate::transport::{HttpResponse, TransportError};

/// Result type alias for route client operations.
pub type RestClientResult<T> = Result<T, RestClientError>;

/// Error type for route client operations.
#[derive(Debug, Error)]
pub enum RestClientError {
    /// The requested route does not exist in the current route map.
    #[error("Specified route, '{route_name}' was not found.")]
    RouteNotFound {
        /// Name that failed to resolve.
        route_name: String,
    },

    /// The route map could not be retrieved or decoded.
    #[error("An error occurred while requesting route map: {message}")]
    RouteMapFetch {
        /// Description of the underlying failure.
        message: String,
    },

    /// Invalid client configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// The transport failed outside of its response contract.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl RestClientError {
    /// Creates a route-not-found error.
    pub fn route_not_found(route_name: impl Into<String>) -> Self {
        RestClientError::RouteNotFound {
            route_name: route_name.into(),
        }
    }

    /// Creates a route map fetch error.
    pub fn route_map_fetch(message: impl Into<String>) -> Self {
        RestClientError::RouteMapFetch {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        RestClientError::Configuration {
            message: message.into(),
        }
    }

    /// Returns the HTTP-shaped view of this error, if it has one.
    ///
    /// Only validation failures map to an HTTP status; everything else is a
    /// setup or programmer error.
    pub fn as_http_error(&self) -> Option<HttpError> {
        match self {
            RestClientError::RouteNotFound { .. } => Some(HttpError::new(400, self.to_string())),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for RestClientError {
    fn from(err: serde_json::Error) -> Self {
        RestClientError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for RestClientError {
    fn from(err: url::ParseError) -> Self {
        RestClientError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}

/// An error that carries an HTTP status and can be rendered as a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status}: {message}")]
pub struct HttpError {
    /// HTTP status code.
    pub status: u16,
    /// Human readable message.
    pub message: String,
}

impl HttpError {
    /// Creates a new HTTP error.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Synthesizes a response describing this error.
    ///
    /// The body is `{"status": .., "message": ..}`; a captured backtrace is
    /// added under `stackTrace` when requested.
    pub fn to_response(&self, include_stack_trace: bool) -> HttpResponse {
        let mut payload = serde_json::Map::new();
        payload.insert("status".to_string(), serde_json::Value::from(self.status));
        payload.insert(
            "message".to_string(),
            serde_json::Value::from(self.message.clone()),
        );

        if include_stack_trace {
            payload.insert(
                "stackTrace".to_string(),
                serde_json::Value::from(Backtrace::force_capture().to_string()),
            );
        }

        let json = serde_json::Value::Object(payload);
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        HttpResponse {
            status: i32::from(self.status),
            headers,
            body: serde_json::to_vec(&json).unwrap_or_default(),
            json_data: Some(json),
        }
    }
}
