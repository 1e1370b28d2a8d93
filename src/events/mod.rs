//! Pipeline events.
//!
//! The smart dispatcher reports its transitions to registered listeners.
//! Listeners run synchronously on the dispatching task, in registration
//! order. A panicking listener is logged and skipped; it never aborts the
//! request that triggered it.

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::client::RequestOptions;
use crate::transport::{HttpRequestOptions, HttpResponse};

/// Kinds of pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RestClientEvent {
    /// Fired before a request is handed to the transport.
    BeforeRequestSend,
    /// Fired when the final response was received.
    ResponseReceive,
    /// Fired when the request could not be built from its route.
    DataValidationError,
    /// Fired when the transport reported a connection failure.
    ConnectionError,
}

impl RestClientEvent {
    /// Returns the event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeRequestSend => "BEFORE_REQUEST_SEND",
            Self::ResponseReceive => "RESPONSE_RECEIVE",
            Self::DataValidationError => "DATA_VALIDATION_ERROR",
            Self::ConnectionError => "CONNECTION_ERROR",
        }
    }
}

impl std::fmt::Display for RestClientEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload delivered to listeners.
#[derive(Debug, Clone)]
pub struct RestClientEventArgs {
    /// Event kind.
    pub kind: RestClientEvent,
    /// The caller's request, including the generated additional data.
    pub request_options: RequestOptions,
    /// The built HTTP request, for pre-send, response and connection events.
    pub http_request: Option<HttpRequestOptions>,
    /// The response, for response, connection and validation events.
    pub http_response: Option<HttpResponse>,
}

impl RestClientEventArgs {
    pub(crate) fn before_request_send(
        request_options: &RequestOptions,
        http_request: &HttpRequestOptions,
    ) -> Self {
        Self {
            kind: RestClientEvent::BeforeRequestSend,
            request_options: request_options.clone(),
            http_request: Some(http_request.clone()),
            http_response: None,
        }
    }

    pub(crate) fn data_validation_error(
        request_options: &RequestOptions,
        http_response: &HttpResponse,
    ) -> Self {
        Self {
            kind: RestClientEvent::DataValidationError,
            request_options: request_options.clone(),
            http_request: None,
            http_response: Some(http_response.clone()),
        }
    }

    pub(crate) fn completed(
        request_options: &RequestOptions,
        http_request: &HttpRequestOptions,
        http_response: &HttpResponse,
    ) -> Self {
        let kind = if http_response.is_connection_error() {
            RestClientEvent::ConnectionError
        } else {
            RestClientEvent::ResponseReceive
        };

        Self {
            kind,
            request_options: request_options.clone(),
            http_request: Some(http_request.clone()),
            http_response: Some(http_response.clone()),
        }
    }
}

/// Event listener callback.
pub type EventListener = Arc<dyn Fn(&RestClientEventArgs) + Send + Sync>;

/// Handle returned on registration, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registry keyed by event kind.
#[derive(Default)]
pub struct EventListeners {
    listeners: RwLock<Vec<(ListenerId, RestClientEvent, EventListener)>>,
    next_id: AtomicU64,
}

impl EventListeners {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event kind.
    pub fn add(&self, kind: RestClientEvent, listener: EventListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, kind, listener));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _, _)| *existing != id);
        listeners.len() != before
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Returns the number of listeners for a kind.
    pub fn count(&self, kind: RestClientEvent) -> usize {
        self.listeners
            .read()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    /// Delivers an event to its listeners.
    pub fn emit(&self, args: &RestClientEventArgs) {
        // Snapshot so listeners may register or remove listeners.
        let targets: Vec<EventListener> = self
            .listeners
            .read()
            .iter()
            .filter(|(_, kind, _)| *kind == args.kind)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();

        for listener in targets {
            if catch_unwind(AssertUnwindSafe(|| listener(args))).is_err() {
                tracing::warn!(event = %args.kind, "Event listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListeners")
            .field("count", &self.listeners.read().len())
            .finish()
    }
}
