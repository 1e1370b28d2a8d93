//! Request templating.
//!
//! Turns a [`Route`](crate::route_map::Route) plus a data bag into the parts of
//! an HTTP request. Every function here reads the bag and never mutates it.

mod data;

pub use data::{get_value, has_value, set_value, value_to_string, DataBag};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::collections::HashMap;

use crate::transport::MultipartPart;

/// Characters left unescaped in path and query components.
const COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_SET).to_string()
}

/// Replaces `{name}` placeholders with values from the bag.
///
/// Placeholders with no matching value are left untouched.
pub fn set_path_parameters(path: &str, data: Option<&DataBag>) -> String {
    let Some(data) = data else {
        return path.to_string();
    };

    let mut result = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };

        result.push_str(&rest[..open]);
        let name = &rest[open + 1..close];

        match get_value(name, data).and_then(value_to_string) {
            Some(value) => result.push_str(&encode_component(&value)),
            None => result.push_str(&rest[open..=close]),
        }

        rest = &rest[close + 1..];
    }

    result.push_str(rest);
    result
}

/// Appends the allow-listed fields present in the bag as a query string.
pub fn set_query_parameters(
    path: &str,
    queries: Option<&[String]>,
    data: Option<&DataBag>,
) -> String {
    let (Some(queries), Some(data)) = (queries, data) else {
        return path.to_string();
    };

    let pairs: Vec<String> = queries
        .iter()
        .filter_map(|name| {
            let value = get_value(name, data).and_then(value_to_string)?;
            Some(format!("{}={}", encode_component(name), encode_component(&value)))
        })
        .collect();

    if pairs.is_empty() {
        return path.to_string();
    }

    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}", path, separator, pairs.join("&"))
}

/// Selects the allow-listed fields present in the bag as headers.
pub fn prepare_request_headers(
    fields: Option<&[String]>,
    data: Option<&DataBag>,
) -> Option<HashMap<String, String>> {
    let fields = fields?;

    let headers = fields
        .iter()
        .filter_map(|name| {
            let value = data
                .and_then(|data| get_value(name, data))
                .and_then(value_to_string)?;
            Some((name.clone(), value))
        })
        .collect();

    Some(headers)
}

/// Builds a multipart form from the allow-listed fields.
pub fn prepare_form_data(
    fields: Option<&[String]>,
    data: Option<&DataBag>,
) -> Option<Vec<MultipartPart>> {
    let fields = fields?;

    let parts = fields
        .iter()
        .filter_map(|name| {
            let value = data
                .and_then(|data| get_value(name, data))
                .and_then(value_to_string)?;
            Some(MultipartPart::Text {
                name: name.clone(),
                value,
            })
        })
        .collect();

    Some(parts)
}

/// Builds a JSON object from the allow-listed fields.
///
/// Dotted field names produce nested objects.
pub fn prepare_request_body(fields: Option<&[String]>, data: Option<&DataBag>) -> Option<Value> {
    let fields = fields?;
    let mut body = DataBag::new();

    if let Some(data) = data {
        for name in fields {
            if let Some(value) = get_value(name, data) {
                set_value(name, value.clone(), &mut body);
            }
        }
    }

    Some(Value::Object(body))
}

/// Returns true for `http://` and `https://` URLs.
pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn bag(value: Value) -> DataBag {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn names(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_path_parameters() {
        let data = bag(json!({"id": 42, "slug": "a b/c"}));

        assert_eq!(set_path_parameters("/users/{id}", Some(&data)), "/users/42");
        assert_eq!(
            set_path_parameters("/posts/{slug}/comments", Some(&data)),
            "/posts/a%20b%2Fc/comments"
        );
    }

    #[test]
    fn test_path_parameters_missing_value_kept() {
        let data = bag(json!({}));

        assert_eq!(set_path_parameters("/users/{id}", Some(&data)), "/users/{id}");
        assert_eq!(set_path_parameters("/users/{id}", None), "/users/{id}");
        assert_eq!(set_path_parameters("/broken/{id", Some(&data)), "/broken/{id");
    }

    #[test]
    fn test_query_parameters() {
        let data = bag(json!({"page": 2, "q": "rust lang", "unused": 1}));
        let queries = names(&["page", "q", "absent"]);

        assert_eq!(
            set_query_parameters("/search", Some(&queries), Some(&data)),
            "/search?page=2&q=rust%20lang"
        );
        assert_eq!(
            set_query_parameters("/search?x=1", Some(&queries), Some(&data)),
            "/search?x=1&page=2&q=rust%20lang"
        );
        assert_eq!(set_query_parameters("/search", None, Some(&data)), "/search");
    }

    #[test]
    fn test_headers_only_include_present_fields() {
        let data = bag(json!({"authorization": "Bearer t", "x-trace": 5}));
        let fields = names(&["authorization", "x-trace", "x-missing"]);

        let headers = prepare_request_headers(Some(&fields), Some(&data)).unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["authorization"], "Bearer t");
        assert_eq!(headers["x-trace"], "5");
        assert!(prepare_request_headers(None, Some(&data)).is_none());
    }

    #[test]
    fn test_body_selects_allow_listed_fields() {
        let data = bag(json!({"name": "Ada", "email": "a@b.c", "password": "secret"}));
        let fields = names(&["name", "email"]);

        let body = prepare_request_body(Some(&fields), Some(&data)).unwrap();

        assert_eq!(body, json!({"name": "Ada", "email": "a@b.c"}));
        assert!(prepare_request_body(None, Some(&data)).is_none());
    }

    #[test]
    fn test_form_parts() {
        let data = bag(json!({"title": "Hi", "count": 3}));
        let fields = names(&["title", "count"]);

        let parts = prepare_form_data(Some(&fields), Some(&data)).unwrap();

        assert_eq!(
            parts,
            vec![
                MultipartPart::Text {
                    name: "title".to_string(),
                    value: "Hi".to_string()
                },
                MultipartPart::Text {
                    name: "count".to_string(),
                    value: "3".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_absolute_url_detection() {
        assert!(is_absolute_url("https://api.example.com/x"));
        assert!(is_absolute_url("http://localhost/x"));
        assert!(!is_absolute_url("/x"));
        assert!(!is_absolute_url("ftp://x"));
    }
}
