//! Data bag access.
//!
//! Field names may be dotted paths (`user.id`) addressing nested objects.

use serde_json::{Map, Value};

/// Field-name-to-value bag supplied by callers.
pub type DataBag = Map<String, Value>;

/// Reads the value at a dotted path.
pub fn get_value<'a>(path: &str, data: &'a DataBag) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = data.get(first)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

/// Returns true when the path holds a value worth keeping.
///
/// Missing, `null`, `false` and empty strings count as unset.
pub fn has_value(path: &str, data: &DataBag) -> bool {
    match get_value(path, data) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Writes a value at a dotted path, creating intermediate objects.
///
/// A non-object value standing in the way is replaced.
pub fn set_value(path: &str, value: Value, data: &mut DataBag) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };

    let mut current = data;
    for segment in segments {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }

    current.insert(last.to_string(), value);
}

/// Renders a scalar for use in a URL, header or form field.
///
/// Strings are used verbatim; `null` renders as nothing.
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
