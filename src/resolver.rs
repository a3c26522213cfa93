//! Scalar and placeholder resolution.
//!
//! The leaf utilities of the pipeline: `{{NAME}}` placeholder substitution
//! over a whole document, URI scheme splitting, ISO 8601 date-time
//! decomposition, and multilingual-map resolution with default-language
//! promotion. Everything here is a pure function; the only side effects are
//! `tracing` warnings for the two recoverable conditions (unparseable
//! date-times and default-language mismatches).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, WotError};

static PLACEHOLDER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Z0-9_]+$").expect("placeholder name pattern is valid"));

/// Largest permitted UTC offset in minutes (±14:00).
pub const MAX_UTC_OFFSET_MINUTES: i64 = 840;

/// Replaces every `{{NAME}}` token in the string leaves of `document`.
///
/// Substitution is textual over the serialized document, exactly like the
/// W3C Thing Model placeholder mechanism: the document is rendered to JSON
/// text, each `{{KEY}}` is replaced by its (plain string) value, and the
/// result is parsed back.
///
/// # Errors
///
/// - [`WotError::InvalidPlaceholderName`] if a key does not match `[A-Z0-9_]+`
/// - [`WotError::UnresolvedPlaceholder`] if any `{{` survives substitution
pub fn substitute_placeholders(document: &Value, placeholders: &BTreeMap<String, String>) -> Result<Value> {
    let mut text = document.to_string();

    for (name, value) in placeholders {
        if !PLACEHOLDER_NAME.is_match(name) {
            return Err(WotError::InvalidPlaceholderName { name: name.clone() });
        }
        // Values are substituted into JSON text, so they must be escaped as
        // JSON string content to keep the document parseable.
        let escaped = serde_json::to_string(value).expect("strings always serialize");
        let escaped = &escaped[1..escaped.len() - 1];
        text = text.replace(&format!("{{{{{name}}}}}"), escaped);
    }

    if let Some(position) = text.find("{{") {
        let context: String = text[position..].chars().take(40).collect();
        return Err(WotError::UnresolvedPlaceholder { context });
    }

    serde_json::from_str(&text).map_err(|e| WotError::MalformedInputDocument {
        location: None,
        reason: format!("document no longer parses after placeholder substitution: {e}"),
    })
}

/// Splits a URI into its scheme (separator included) and remainder.
///
/// Splits on the first `://`, else the first `:`, else returns the whole
/// value as remainder with no scheme.
///
/// ```
/// use wotc::resolver::split_uri;
/// assert_eq!(split_uri("coap://[::1]/temp"), (Some("coap://".into()), "[::1]/temp".into()));
/// assert_eq!(split_uri("urn:dev:ops:1234"), (Some("urn:".into()), "dev:ops:1234".into()));
/// assert_eq!(split_uri("/local/path"), (None, "/local/path".into()));
/// ```
pub fn split_uri(value: &str) -> (Option<String>, String) {
    for separator in ["://", ":"] {
        if let Some(position) = value.find(separator) {
            let scheme = &value[..position + separator.len()];
            let remainder = &value[position + separator.len()..];
            return (Some(scheme.to_string()), remainder.to_string());
        }
    }
    (None, value.to_string())
}

/// A decomposed calendar timestamp, ready for embedding as integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Offset from UTC in minutes, zero when the timestamp carried none.
    pub utc_offset_minutes: i32,
}

/// Decomposes an ISO 8601-like timestamp into its calendar fields.
///
/// Accepts RFC 3339 timestamps (upper- or lower-case `Z` as UTC marker) and
/// offset-less `YYYY-MM-DDTHH:MM:SS` values. An unparseable string is a
/// recoverable condition: a warning is logged and `Ok(None)` is returned so
/// the caller omits the field.
///
/// # Errors
///
/// [`WotError::InvalidTimezoneOffset`] when an explicit offset lies outside
/// ±840 minutes (±14:00). This one is fatal: an out-of-range offset means
/// the document is wrong, not merely odd.
pub fn decompose_datetime(field: &str, value: &str) -> Result<Option<DateTimeParts>> {
    let normalized = if value.ends_with(['z', 'Z']) {
        format!("{}+00:00", &value[..value.len() - 1])
    } else {
        value.to_string()
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(&normalized) {
        let offset_minutes = i64::from(parsed.offset().local_minus_utc()) / 60;
        if offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(WotError::InvalidTimezoneOffset { minutes: offset_minutes });
        }
        return Ok(Some(parts_of(parsed.naive_local(), offset_minutes as i32)));
    }

    if let Ok(parsed) = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(parts_of(parsed, 0)));
    }

    warn!(field, value, "date-time could not be parsed, omitting field");
    Ok(None)
}

fn parts_of(naive: NaiveDateTime, utc_offset_minutes: i32) -> DateTimeParts {
    DateTimeParts {
        year: naive.year(),
        month: naive.month(),
        day: naive.day(),
        hour: naive.hour(),
        minute: naive.minute(),
        second: naive.second(),
        utc_offset_minutes,
    }
}

/// Resolves a multilingual field into ordered `(language tag, text)` pairs.
///
/// The map's own iteration order is preserved. When the map lacks an entry
/// for `default_lang`, a supplied singular value is promoted under the
/// default language (with a warning); when the map's default entry and the
/// singular value disagree, the map wins and the mismatch is logged.
/// `Ok(None)` means the field is absent entirely.
///
/// # Errors
///
/// - [`WotError::MissingDefaultLanguage`] when the map is non-empty but has
///   no default-language entry and there is no singular value to promote
/// - [`WotError::MalformedInputDocument`] when a map entry is not a string
pub fn resolve_multilang(
    field: &str,
    map: &Map<String, Value>,
    singular: Option<&str>,
    default_lang: &str,
) -> Result<Option<Vec<(String, String)>>> {
    if map.is_empty() {
        return Ok(singular.map(|text| vec![(default_lang.to_string(), text.to_string())]));
    }

    let mut entries = Vec::with_capacity(map.len());
    for (tag, value) in map {
        let Value::String(text) = value else {
            return Err(WotError::MalformedInputDocument {
                location: None,
                reason: format!("'{field}' entry for language '{tag}' must be a string"),
            });
        };
        entries.push((tag.clone(), text.clone()));
    }

    match (entries.iter().find(|(tag, _)| tag == default_lang), singular) {
        (Some((_, text)), Some(single)) if text != single => {
            warn!(
                field,
                default_lang,
                map_value = %text,
                singular = %single,
                "multilingual entry disagrees with singular value, keeping the map entry"
            );
        }
        (Some(_), _) => {}
        (None, Some(single)) => {
            warn!(field, default_lang, "no entry for default language, promoting singular value");
            entries.push((default_lang.to_string(), single.to_string()));
        }
        (None, None) => {
            return Err(WotError::MissingDefaultLanguage {
                field: field.to_string(),
                language: default_lang.to_string(),
            });
        }
    }

    Ok(Some(entries))
}
