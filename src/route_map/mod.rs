//! Route map types.
//!
//! A route map is a versioned, named collection of [`Route`] templates. It is
//! treated as an immutable snapshot: a refresh replaces the whole map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// PUT request.
    Put,
    /// PATCH request.
    Patch,
    /// DELETE request.
    Delete,
    /// HEAD request.
    Head,
    /// OPTIONS request.
    Options,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named request template.
///
/// `headers`, `queries`, `body` and `form` are allow-lists of field names
/// pulled from the caller's data bag. An absent list contributes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// HTTP request method.
    pub method: HttpMethod,
    /// Path template with `{param}` placeholders, or an absolute URL.
    pub path: String,
    /// Fields sent as HTTP headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    /// Fields sent as query parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<String>>,
    /// Fields sent as a JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<String>>,
    /// Fields sent as a multipart form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Vec<String>>,
    /// Route description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Route {
    /// Creates a route with only a method and path.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: None,
            queries: None,
            body: None,
            form: None,
            description: None,
        }
    }

    /// Sets the header allow-list.
    pub fn with_headers<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the query allow-list.
    pub fn with_queries<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queries = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the JSON body allow-list.
    pub fn with_body<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the form allow-list.
    pub fn with_form<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.form = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Versioned collection of routes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMap {
    /// Route map version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Last modified date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    /// Routes keyed by name.
    pub routes: HashMap<String, Route>,
}

impl RouteMap {
    /// Creates an empty route map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route, replacing any existing route of the same name.
    pub fn with_route(mut self, name: impl Into<String>, route: Route) -> Self {
        self.routes.insert(name.into(), route);
        self
    }

    /// Sets the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Looks up a route by name.
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deserialize_document() {
        let document = r#"{
            "version": "1.2.0",
            "dateModified": "2024-01-01",
            "routes": {
                "getUser": { "method": "GET", "path": "/users/{id}" },
                "createUser": {
                    "method": "POST",
                    "path": "/users",
                    "headers": ["authorization"],
                    "body": ["name", "email"],
                    "description": "Creates a user."
                }
            }
        }"#;

        let map: RouteMap = serde_json::from_str(document).unwrap();

        assert_eq!(map.version.as_deref(), Some("1.2.0"));
        assert_eq!(map.date_modified.as_deref(), Some("2024-01-01"));
        assert_eq!(
            map.route("getUser"),
            Some(&Route::new(HttpMethod::Get, "/users/{id}"))
        );

        let create = map.route("createUser").unwrap();
        assert_eq!(create.method, HttpMethod::Post);
        assert_eq!(create.body.as_deref(), Some(&["name".to_string(), "email".to_string()][..]));
        assert!(create.form.is_none());
    }

    #[test]
    fn test_document_without_routes_is_rejected() {
        let result: Result<RouteMap, _> = serde_json::from_str(r#"{"version": "1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_route_missing_method_is_rejected() {
        let result: Result<RouteMap, _> =
            serde_json::from_str(r#"{"routes": {"a": {"path": "/a"}}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_http_method_display() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Get.as_str(), "GET");
    }
}
