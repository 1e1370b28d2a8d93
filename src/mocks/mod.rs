//! Mock implementations for testing.
//!
//! Provides a scripted transport and token provider so the smart dispatcher
//! can be exercised without network access.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::auth::TokenProvider;
use crate::client::RestApiClient;
use crate::transport::{
    HttpRequestOptions, HttpResponse, HttpTransport, TransportError, CONNECTION_ERROR_STATUS,
};

/// A scripted response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: i32,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            status: 200,
            headers,
            body,
        }
    }

    /// Creates an error response.
    pub fn error(status: i32, message: &str) -> Self {
        let error = serde_json::json!({
            "error": {
                "message": message,
            }
        });

        Self::json(&error).with_status(status)
    }

    /// Creates a transport-level failure.
    pub fn connection_error() -> Self {
        Self {
            status: CONNECTION_ERROR_STATUS,
            headers: HashMap::new(),
            body: b"connection refused".to_vec(),
        }
    }

    /// Creates a response with custom status.
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    fn into_response(self, parse_json: bool) -> HttpResponse {
        let json_data = if parse_json {
            serde_json::from_slice(&self.body).ok()
        } else {
            None
        };

        HttpResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
            json_data,
        }
    }
}

enum Scripted {
    Response(MockResponse),
    Fault(String),
}

/// Mock HTTP transport for testing.
///
/// Queued responses are returned in FIFO order, then the default response.
#[derive(Default)]
pub struct MockTransport {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequestOptions>>,
    default_response: Mutex<Option<MockResponse>>,
    delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        self.queue.lock().push_back(Scripted::Response(response));
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::json(value));
    }

    /// Queues a transport fault returned as `Err`.
    pub fn queue_fault(&self, message: &str) {
        self.queue.lock().push_back(Scripted::Fault(message.to_string()));
    }

    /// Sets the default response.
    pub fn set_default(&self, response: MockResponse) {
        *self.default_response.lock() = Some(response);
    }

    /// Delays every response, yielding to other tasks.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<HttpRequestOptions> {
        self.requests.lock().clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<HttpRequestOptions> {
        self.requests.lock().last().cloned()
    }

    /// Clears recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next(&self) -> Option<Scripted> {
        let queued = self.queue.lock().pop_front();
        queued.or_else(|| self.default_response.lock().clone().map(Scripted::Response))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequestOptions) -> Result<HttpResponse, TransportError> {
        let parse_json = request.automatic_json_response_body_parsing;
        self.requests.lock().push(request);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next() {
            Some(Scripted::Response(response)) => Ok(response.into_response(parse_json)),
            Some(Scripted::Fault(message)) => Err(TransportError::InvalidRequest { message }),
            None => Ok(HttpResponse::connection_error("No mock response available")),
        }
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// Scripted token provider.
#[derive(Debug)]
pub struct MockTokenProvider {
    access_token: Mutex<Option<String>>,
    refresh_token: Mutex<Option<String>>,
    expired: bool,
    renew_result: bool,
    renewed_access_token: Option<String>,
    renew_calls: AtomicUsize,
    renew_routes: Mutex<Vec<Option<String>>>,
}

impl MockTokenProvider {
    /// Creates a provider reporting expiry on every 401 and renewing
    /// successfully.
    pub fn new(access_token: &str, refresh_token: &str) -> Self {
        Self {
            access_token: Mutex::new(Some(access_token.to_string())),
            refresh_token: Mutex::new(Some(refresh_token.to_string())),
            expired: true,
            renew_result: true,
            renewed_access_token: None,
            renew_calls: AtomicUsize::new(0),
            renew_routes: Mutex::new(Vec::new()),
        }
    }

    /// Sets what the expiry predicate returns.
    pub fn with_expired(mut self, expired: bool) -> Self {
        self.expired = expired;
        self
    }

    /// Sets what renewal returns.
    pub fn with_renew_result(mut self, renew_result: bool) -> Self {
        self.renew_result = renew_result;
        self
    }

    /// Access token installed by a successful renewal.
    pub fn with_renewed_access_token(mut self, token: &str) -> Self {
        self.renewed_access_token = Some(token.to_string());
        self
    }

    /// Number of renewal calls.
    pub fn renew_calls(&self) -> usize {
        self.renew_calls.load(Ordering::SeqCst)
    }

    /// Route names passed to renewal, in call order.
    pub fn renew_routes(&self) -> Vec<Option<String>> {
        self.renew_routes.lock().clone()
    }
}

#[async_trait]
impl TokenProvider for MockTokenProvider {
    fn access_token(&self) -> Option<String> {
        self.access_token.lock().clone()
    }

    fn refresh_token(&self) -> Option<String> {
        self.refresh_token.lock().clone()
    }

    fn is_token_expired(&self, response: &HttpResponse, _client: &RestApiClient) -> bool {
        self.expired && response.status == 401
    }

    async fn renew_access_token(&self, route_name: Option<&str>, _client: &RestApiClient) -> bool {
        self.renew_calls.fetch_add(1, Ordering::SeqCst);
        self.renew_routes.lock().push(route_name.map(str::to_string));

        if self.renew_result {
            if let Some(token) = &self.renewed_access_token {
                *self.access_token.lock() = Some(token.clone());
            }
        }

        self.renew_result
    }
}
