//! Dynamic record values.
//!
//! Store records are heterogeneous maps, so fields, filters, properties and
//! property values are all JSON maps. This module holds the aliases and the
//! small pure conversions shared by models, queries and stores.

use serde_json::{Map, Value as JsonValue};

/// Store record identifier
pub type Id = i64;

/// Field name to value mapping of one record
pub type Fields = Map<String, JsonValue>;

/// Field name (optionally operator-prefixed) to constraint mapping
pub type Filter = Map<String, JsonValue>;

/// Property code to property metadata (`{"VALUE": v, ...}`)
pub type Properties = Map<String, JsonValue>;

/// Property code to plain value
pub type PropertyValues = Map<String, JsonValue>;

/// Key holding the full section membership of an element
pub const SECTIONS_FIELD: &str = "IBLOCK_SECTION";

/// Key holding the direct parent section id
pub const PARENT_SECTION_FIELD: &str = "IBLOCK_SECTION_ID";

/// Key holding the collection scope
pub const IBLOCK_ID_FIELD: &str = "IBLOCK_ID";

/// Convert a store value into an id.
///
/// Numbers and numeric strings convert; `null`, `false`, `0`, `""` and `"0"`
/// are falsy and yield `None`, as does anything non-numeric.
#[must_use]
pub fn as_id(value: &JsonValue) -> Option<Id> {
    let id = match value {
        JsonValue::Number(n) => n.as_i64()?,
        JsonValue::String(s) => s.trim().parse::<Id>().ok()?,
        _ => return None,
    };
    (id != 0).then_some(id)
}

/// Canonical string form of a value, used to key result collections.
///
/// Returns `None` for `null`.
#[must_use]
pub fn key_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(true) => Some("1".to_string()),
        JsonValue::Bool(false) => Some(String::new()),
        other => Some(other.to_string()),
    }
}

/// Flatten `{code: {"VALUE": v, ...}}` into `{code: v}`.
///
/// A property without a `VALUE` entry maps to `null`.
#[must_use]
pub fn derive_values(properties: &Properties) -> PropertyValues {
    properties
        .iter()
        .map(|(code, property)| {
            let value = property.get("VALUE").cloned().unwrap_or(JsonValue::Null);
            (code.clone(), value)
        })
        .collect()
}

/// Collect property values carried inline by a simple row.
///
/// Simple rows expose each selected property as `PROPERTY_<CODE>_VALUE`.
/// Returns `None` when the row carries no such key.
#[must_use]
pub fn values_from_inline(fields: &Fields) -> Option<PropertyValues> {
    let values: PropertyValues = fields
        .iter()
        .filter_map(|(key, value)| {
            let code = key.strip_prefix("PROPERTY_")?.strip_suffix("_VALUE")?;
            (!code.is_empty()).then(|| (code.to_string(), value.clone()))
        })
        .collect();
    (!values.is_empty()).then_some(values)
}

/// Read a list of section ids stored as a JSON array (or a single id).
#[must_use]
pub fn ids_from_value(value: &JsonValue) -> Vec<Id> {
    match value {
        JsonValue::Array(items) => items.iter().filter_map(as_id).collect(),
        other => as_id(other).into_iter().collect(),
    }
}
