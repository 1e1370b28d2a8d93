//! Route REST Client
//!
//! A declarative REST client. Endpoints are described once in a route map
//! (method, path template, and allow-lists of header, query, body and form
//! fields) and called by name with a flat data bag.
//!
//! # Features
//!
//! - **Route Maps**: Fetched from a URL at startup or supplied inline, and swappable at runtime
//! - **Templating**: `{param}` path substitution, encoded query strings, header and body allow-lists
//! - **Token Injection**: Access and refresh tokens added to headers without touching caller data
//! - **Smart Dispatch**: One token renewal and resend when a call fails with an expired token
//! - **Events**: Listeners for pre-send, response, validation and connection failures
//! - **Registry**: Named client instances owned by the application
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use route_rest_client::{ClientRegistry, ClientOptions, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = ClientRegistry::new();
//!     let client = registry
//!         .create_instance(
//!             ClientOptions::builder()
//!                 .host("https://api.example.com")
//!                 .base_path("/v1")
//!                 .route_map_path("/routes.json")
//!                 .build(),
//!         )
//!         .await?;
//!
//!     let response = client
//!         .send_smart_request(RequestOptions::new("getUser").with_field("id", 42))
//!         .await?;
//!     println!("{} {}", response.status, response.text());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod events;
pub mod observability;
pub mod registry;
pub mod route_map;
pub mod templating;
pub mod transport;

/// Mock implementations for testing.
pub mod mocks;

// Re-exports for convenience
pub use auth::{RefreshSettings, RouteRefreshTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::{RequestOptions, RestApiClient, RestApiClientBuilder};
pub use config::{ClientOptions, ClientOptionsBuilder};
pub use errors::{HttpError, RestClientError, RestClientResult};
pub use events::{ListenerId, RestClientEvent, RestClientEventArgs};
pub use registry::ClientRegistry;
pub use route_map::{HttpMethod, Route, RouteMap};
pub use templating::DataBag;
pub use transport::{
    HttpRequestOptions, HttpResponse, HttpTransport, RequestBody, ReqwestTransport,
    CONNECTION_ERROR_STATUS,
};
