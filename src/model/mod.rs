//! The typed canonical model.
//!
//! Once the document has been composed and validated, it is decoded into
//! the closed types in this module. Every enumerated vocabulary (operation
//! types, media types, content codings, JSON kinds, security schemes, QoP,
//! auth locations) is a Rust enum, so lowering matches exhaustively and an
//! out-of-vocabulary value fails right here with
//! [`WotError::UnsupportedFieldValue`] instead of producing a wrong table.
//!
//! Decoding is also where multilingual maps are resolved (singular values
//! promoted under the default language) and where the default language
//! itself is picked up from an `@language` context entry.

mod affordance;
mod form;
mod schema;
mod security;
mod thing;

pub use affordance::{ActionAffordance, EventAffordance, InteractionAffordance, PropertyAffordance};
pub use form::{ContentCoding, ContentType, ExpectedResponse, Form, FormOwner, MediaType, Operation};
pub use schema::{DataSchema, SchemaKind};
pub use security::{AuthLocation, DigestQop, NameAndLocation, SchemeDetail, SchemeType, SecurityDefinition, SecurityScheme};
pub use thing::{ContextEntry, Link, Thing};

use serde_json::{Map, Value};

use crate::error::{Result, WotError};

pub(crate) fn unsupported(field: &str, value: &str) -> WotError {
    WotError::UnsupportedFieldValue { field: field.to_string(), value: value.to_string() }
}

pub(crate) fn malformed(reason: String) -> WotError {
    WotError::MalformedInputDocument { location: None, reason }
}

/// Requires `value` to be a JSON object.
pub(crate) fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| malformed(format!("'{what}' must be an object")))
}

pub(crate) fn get_str(map: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(malformed(format!("'{field}' must be a string"))),
    }
}

pub(crate) fn get_bool(map: &Map<String, Value>, field: &str) -> Result<Option<bool>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(malformed(format!("'{field}' must be a boolean"))),
    }
}

/// Reads a string-or-list field into a list.
pub(crate) fn get_str_list(map: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
    match map.get(field) {
        None => Ok(Vec::new()),
        Some(raw) => crate::document::string_or_list(raw.clone(), None, field),
    }
}

pub(crate) fn get_map<'a>(map: &'a Map<String, Value>, field: &str) -> Result<Option<&'a Map<String, Value>>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(object)) => Ok(Some(object)),
        Some(_) => Err(malformed(format!("'{field}' must be an object"))),
    }
}

pub(crate) fn get_u64(map: &Map<String, Value>, field: &str) -> Result<Option<u64>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) if n.as_u64().is_some() => Ok(n.as_u64()),
        Some(_) => Err(malformed(format!("'{field}' must be a non-negative integer"))),
    }
}

pub(crate) fn get_i64(map: &Map<String, Value>, field: &str) -> Result<Option<i64>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) if n.as_i64().is_some() => Ok(n.as_i64()),
        Some(_) => Err(malformed(format!("'{field}' must be an integer"))),
    }
}

pub(crate) fn get_f64(map: &Map<String, Value>, field: &str) -> Result<Option<f64>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(_) => Err(malformed(format!("'{field}' must be a number"))),
    }
}

/// Resolves a multilingual field pair (e.g. `titles` + `title`).
pub(crate) fn multilang(
    map: &Map<String, Value>,
    plural: &str,
    singular: &str,
    default_lang: &str,
) -> Result<Option<Vec<(String, String)>>> {
    let empty = Map::new();
    let plural_map = get_map(map, plural)?.unwrap_or(&empty);
    let singular_value = get_str(map, singular)?;
    crate::resolver::resolve_multilang(plural, plural_map, singular_value.as_deref(), default_lang)
}
