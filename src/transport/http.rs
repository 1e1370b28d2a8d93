//! HTTP transport implementation.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method};
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

use super::{
    HttpRequestOptions, HttpResponse, HttpTransport, MultipartPart, RequestBody, TransportError,
};

/// HTTP transport implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a new transport.
    ///
    /// Timeouts are applied per request; the client itself has none.
    pub fn new() -> Result<Self, TransportError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(|e| TransportError::Initialization {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn method(request: &HttpRequestOptions) -> Result<Method, TransportError> {
        Method::from_bytes(request.method.as_str().as_bytes()).map_err(|e| {
            TransportError::InvalidRequest {
                message: e.to_string(),
            }
        })
    }

    fn form(parts: Vec<MultipartPart>) -> reqwest::multipart::Form {
        parts
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, part| match part {
                MultipartPart::Text { name, value } => form.text(name, value),
            })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequestOptions) -> Result<HttpResponse, TransportError> {
        let method = Self::method(&request)?;
        let mut req_builder = self.client.request(method, &request.url);

        // Add headers
        if let Some(headers) = &request.headers {
            for (name, value) in headers {
                req_builder = req_builder.header(name, value);
            }
        }

        // Add body if present
        match request.body {
            Some(RequestBody::Json(value)) if request.automatic_json_request_body_parsing => {
                req_builder = req_builder.json(&value);
            }
            Some(RequestBody::Json(serde_json::Value::String(raw))) => {
                req_builder = req_builder.body(raw);
            }
            Some(RequestBody::Json(value)) => {
                req_builder = req_builder.body(value.to_string());
            }
            Some(RequestBody::Form(parts)) => {
                req_builder = req_builder.multipart(Self::form(parts));
            }
            None => {}
        }

        if let Some(timeout) = request.timeout.filter(|t| !t.is_zero()) {
            req_builder = req_builder.timeout(timeout);
        }

        // Execute request
        let response = match req_builder.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Err(TransportError::InvalidRequest {
                    message: e.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Request failed before receiving a response");
                return Ok(HttpResponse::connection_error(e.to_string()));
            }
        };

        // Extract response
        let status = i32::from(response.status().as_u16());
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read response body");
                return Ok(HttpResponse::connection_error(e.to_string()));
            }
        };

        let json_data = if request.automatic_json_response_body_parsing && !body.is_empty() {
            serde_json::from_slice(&body).ok()
        } else {
            None
        };

        Ok(HttpResponse {
            status,
            headers,
            body,
            json_data,
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}
