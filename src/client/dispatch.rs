//! Request templating and the smart dispatcher.

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{RequestOptions, RestApiClient};
use crate::auth::inject_tokens;
use crate::errors::{RestClientError, RestClientResult};
use crate::events::RestClientEventArgs;
use crate::templating::{
    is_absolute_url, prepare_form_data, prepare_request_body, prepare_request_headers,
    set_path_parameters, set_query_parameters, DataBag,
};
use crate::transport::{HttpRequestOptions, HttpResponse, RequestBody};

impl RestApiClient {
    /// Builds the HTTP request for a named route.
    ///
    /// `data` is never modified. Tokens from the attached provider are
    /// injected into a private copy and only reach the headers; body and
    /// form fields come from the caller's data alone.
    ///
    /// # Errors
    ///
    /// Returns [`RestClientError::RouteNotFound`] if the route is not in the
    /// current route map.
    pub fn prepare_request_options(
        &self,
        route_name: &str,
        data: Option<&DataBag>,
    ) -> RestClientResult<HttpRequestOptions> {
        let route_map = self.route_map();
        let route = route_map
            .route(route_name)
            .ok_or_else(|| RestClientError::route_not_found(route_name))?;

        let path = set_path_parameters(&route.path, data);
        let path = set_query_parameters(&path, route.queries.as_deref(), data);

        let (access_field, refresh_field, base_url) = {
            let options = self.options.read();
            (
                options.authorization_header().to_string(),
                options.authorization_refresh_header().to_string(),
                options.base_url().to_string(),
            )
        };

        let mut header_data = data.cloned().unwrap_or_default();
        if let Some(provider) = self.token_provider() {
            inject_tokens(provider.as_ref(), &access_field, &refresh_field, &mut header_data);
        }

        let mut request = HttpRequestOptions::new(route.method);
        request.headers = prepare_request_headers(route.headers.as_deref(), Some(&header_data));

        if let Some(form) = prepare_form_data(route.form.as_deref(), data) {
            request.body = Some(RequestBody::Form(form));
        }
        if let Some(body) = prepare_request_body(route.body.as_deref(), data) {
            request.body = Some(RequestBody::Json(body));
        }

        request.url = if is_absolute_url(&path) {
            path
        } else {
            format!("{}{}", base_url, path)
        };

        Ok(request)
    }

    /// Resolves a named route, sends it and renews the token once on expiry.
    ///
    /// Unknown routes do not fail the call: a `400` response is synthesized
    /// and a `DataValidationError` event is emitted instead. A `401` that the
    /// token provider reports as expiry triggers one renewal and, if it
    /// succeeds, one resend. Connection failures come back as a response
    /// with a negative status.
    ///
    /// The resend is rebuilt from the client-level retry route and data
    /// (see [`set_retry_route`](Self::set_retry_route)), not from
    /// `request_options`. The call's timeout, tags, additional data and JSON
    /// flags are still applied to it.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport cannot build the request, or when
    /// the request rebuilt after renewal names an unknown route.
    #[instrument(skip(self, request_options), fields(route = %request_options.route_name, request_id = tracing::field::Empty))]
    pub async fn send_smart_request(
        &self,
        mut request_options: RequestOptions,
    ) -> RestClientResult<HttpResponse> {
        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());
        request_options.additional_data = Some(augment_additional_data(&request_options, request_id));

        let mut http_request = match self
            .prepare_request_options(&request_options.route_name, request_options.data.as_ref())
        {
            Ok(http_request) => http_request,
            Err(error) => {
                let Some(http_error) = error.as_http_error() else {
                    return Err(error);
                };
                warn!(error = %error, "Request validation failed");

                let include_stack_trace = self.options.read().include_error_stack_trace;
                let response = http_error.to_response(include_stack_trace);
                self.events.emit(&RestClientEventArgs::data_validation_error(
                    &request_options,
                    &response,
                ));
                return Ok(response);
            }
        };

        apply_call_options(&mut http_request, &request_options);
        let mut response = self.dispatch(&request_options, &http_request).await?;

        if response.status == 401 {
            if let Some(provider) = self.token_provider() {
                if provider.is_token_expired(&response, self) {
                    let (retry_route, retry_data) = {
                        let options = self.options.read();
                        (options.route_name.clone(), options.data.clone())
                    };

                    info!("Access token expired, renewing");
                    if provider
                        .renew_access_token(retry_route.as_deref(), self)
                        .await
                    {
                        http_request = self.prepare_request_options(
                            retry_route.as_deref().unwrap_or_default(),
                            retry_data.as_ref(),
                        )?;
                        apply_call_options(&mut http_request, &request_options);
                        response = self.dispatch(&request_options, &http_request).await?;
                    } else {
                        info!("Token renewal declined, returning original response");
                    }
                }
            }
        }

        if response.is_connection_error() {
            warn!(url = %http_request.url, response = %response.text(), "Connection failed");
        }
        self.events.emit(&RestClientEventArgs::completed(
            &request_options,
            &http_request,
            &response,
        ));

        Ok(response)
    }

    async fn dispatch(
        &self,
        request_options: &RequestOptions,
        http_request: &HttpRequestOptions,
    ) -> RestClientResult<HttpResponse> {
        self.events.emit(&RestClientEventArgs::before_request_send(
            request_options,
            http_request,
        ));
        debug!(method = %http_request.method, url = %http_request.url, "Sending request");

        let response = self.transport.send(http_request.clone()).await?;
        debug!(status = response.status, "Response received");
        Ok(response)
    }
}

fn augment_additional_data(request_options: &RequestOptions, request_id: String) -> DataBag {
    let mut additional_data = request_options.additional_data.clone().unwrap_or_default();
    additional_data.insert("requestId".to_string(), Value::String(request_id));
    additional_data.insert(
        "routeName".to_string(),
        Value::String(request_options.route_name.clone()),
    );
    additional_data.insert(
        "requestData".to_string(),
        request_options
            .data
            .clone()
            .map(Value::Object)
            .unwrap_or(Value::Null),
    );
    additional_data
}

fn apply_call_options(http_request: &mut HttpRequestOptions, request_options: &RequestOptions) {
    http_request.timeout = (!request_options.timeout.is_zero()).then_some(request_options.timeout);
    http_request.additional_data = request_options.additional_data.clone();
    http_request.request_tags = request_options.request_tags.clone();
    http_request.automatic_json_request_body_parsing =
        request_options.automatic_json_request_body_parsing;
    http_request.automatic_json_response_body_parsing =
        request_options.automatic_json_response_body_parsing;
}
