//! The canonical Thing Description document.
//!
//! [`Document`] is the raw-JSON-backed shape shared by every layer of the
//! composition pipeline: base Thing Models, extension templates, and the
//! fully composed Thing Description are all `Document`s. Affordance entries
//! and security definitions stay as raw JSON objects because template
//! merging works on their field sets; the typed model in [`crate::model`]
//! is only decoded once composition and validation are done.
//!
//! Ingest normalizes the shapes the W3C vocabulary allows to vary:
//! `@context`, `@type` and `security` may be given as a bare string and are
//! promoted to one-element lists, and the `required` pseudo-entry of each
//! affordance map is split out into [`AffordanceMap::required`].

use serde_json::{Map, Value};

use crate::error::{Result, WotError};

/// The three affordance map kinds, in document order.
pub const AFFORDANCE_KINDS: [&str; 3] = ["properties", "actions", "events"];

/// One of the three affordance maps plus its `required` list.
///
/// The `required` list arrives as a pseudo-entry of the map itself
/// (`"properties": {"required": [...], "temp": {...}}`) and is extracted on
/// ingest so that the validator never has to mutate the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffordanceMap {
    /// Affordance definitions keyed by their unique identifier.
    pub entries: Map<String, Value>,
    /// Identifiers that must exist as keys of `entries`.
    pub required: Vec<String>,
}

impl AffordanceMap {
    fn from_json(value: Value, location: Option<&str>, kind: &str) -> Result<Self> {
        let mut entries = as_object(value, location, kind)?;
        let required = match entries.shift_remove("required") {
            Some(raw) => string_or_list(raw, location, "required")?,
            None => Vec::new(),
        };
        Ok(Self { entries, required })
    }
}

/// A fully merged (or still-to-be-merged) Thing Description document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// JSON-LD `@context` entries: strings or single-pair objects.
    pub context: Vec<Value>,
    /// JSON-LD `@type` entries.
    pub types: Vec<String>,
    /// Thing identifier (usually a URN).
    pub id: Option<String>,
    /// Singular human-readable title.
    pub title: Option<String>,
    /// Multilingual titles keyed by language tag.
    pub titles: Map<String, Value>,
    /// Singular description.
    pub description: Option<String>,
    /// Multilingual descriptions keyed by language tag.
    pub descriptions: Map<String, Value>,
    /// Version block (`{"instance": ...}`).
    pub version: Map<String, Value>,
    /// Creation timestamp (ISO 8601 string, decomposed during lowering).
    pub created: Option<String>,
    /// Modification timestamp.
    pub modified: Option<String>,
    /// Support contact URI.
    pub support: Option<String>,
    /// Base URI for relative form hrefs.
    pub base: Option<String>,
    /// Property affordances.
    pub properties: AffordanceMap,
    /// Action affordances.
    pub actions: AffordanceMap,
    /// Event affordances.
    pub events: AffordanceMap,
    /// Document links (including the `extends` link before resolution).
    pub links: Vec<Value>,
    /// Thing-level forms.
    pub forms: Vec<Value>,
    /// Thing-level security references.
    pub security: Vec<String>,
    /// Security scheme definitions keyed by scheme name.
    pub security_definitions: Map<String, Value>,
}

impl Document {
    /// Builds a document from raw JSON, normalizing string-vs-list fields.
    ///
    /// `location` names the source (path or URL) for error messages.
    ///
    /// # Errors
    ///
    /// Returns [`WotError::MalformedInputDocument`] when the top level is
    /// not an object or any understood field has the wrong shape.
    pub fn from_json(value: Value, location: Option<&str>) -> Result<Self> {
        let mut root = as_object(value, location, "document")?;

        let mut doc = Self {
            context: list_field(&mut root, location, "@context")?,
            types: take_string_or_list(&mut root, location, "@type")?,
            id: take_string(&mut root, location, "id")?,
            title: take_string(&mut root, location, "title")?,
            titles: take_object(&mut root, location, "titles")?,
            description: take_string(&mut root, location, "description")?,
            descriptions: take_object(&mut root, location, "descriptions")?,
            version: take_object(&mut root, location, "version")?,
            created: take_string(&mut root, location, "created")?,
            modified: take_string(&mut root, location, "modified")?,
            support: take_string(&mut root, location, "support")?,
            base: take_string(&mut root, location, "base")?,
            links: take_array(&mut root, location, "links")?,
            forms: take_array(&mut root, location, "forms")?,
            security: take_string_or_list(&mut root, location, "security")?,
            security_definitions: take_object(&mut root, location, "securityDefinitions")?,
            ..Self::default()
        };

        for (kind, slot) in [
            ("properties", &mut doc.properties),
            ("actions", &mut doc.actions),
            ("events", &mut doc.events),
        ] {
            if let Some(raw) = root.shift_remove(kind) {
                *slot = AffordanceMap::from_json(raw, location, kind)?;
            }
        }

        Ok(doc)
    }

    /// The affordance map of the given kind.
    pub fn affordances(&self, kind: &str) -> &AffordanceMap {
        match kind {
            "properties" => &self.properties,
            "actions" => &self.actions,
            "events" => &self.events,
            other => unreachable!("unknown affordance kind {other}"),
        }
    }

    /// Mutable access to the affordance map of the given kind.
    pub fn affordances_mut(&mut self, kind: &str) -> &mut AffordanceMap {
        match kind {
            "properties" => &mut self.properties,
            "actions" => &mut self.actions,
            "events" => &mut self.events,
            other => unreachable!("unknown affordance kind {other}"),
        }
    }

    /// Serializes the document back into the raw JSON shape it was read
    /// from, with `required` lists folded back into their affordance maps.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        if !self.context.is_empty() {
            root.insert("@context".into(), Value::Array(self.context.clone()));
        }
        if !self.types.is_empty() {
            root.insert("@type".into(), string_list(&self.types));
        }
        for (key, value) in [
            ("id", &self.id),
            ("title", &self.title),
            ("description", &self.description),
            ("created", &self.created),
            ("modified", &self.modified),
            ("support", &self.support),
            ("base", &self.base),
        ] {
            if let Some(value) = value {
                root.insert(key.into(), Value::String(value.clone()));
            }
        }
        for (key, map) in [
            ("titles", &self.titles),
            ("descriptions", &self.descriptions),
            ("version", &self.version),
        ] {
            if !map.is_empty() {
                root.insert(key.into(), Value::Object(map.clone()));
            }
        }
        for (kind, map) in [
            ("properties", &self.properties),
            ("actions", &self.actions),
            ("events", &self.events),
        ] {
            if !map.entries.is_empty() || !map.required.is_empty() {
                let mut object = map.entries.clone();
                if !map.required.is_empty() {
                    object.insert("required".into(), string_list(&map.required));
                }
                root.insert(kind.into(), Value::Object(object));
            }
        }
        if !self.links.is_empty() {
            root.insert("links".into(), Value::Array(self.links.clone()));
        }
        if !self.forms.is_empty() {
            root.insert("forms".into(), Value::Array(self.forms.clone()));
        }
        if !self.security.is_empty() {
            root.insert("security".into(), string_list(&self.security));
        }
        if !self.security_definitions.is_empty() {
            root.insert("securityDefinitions".into(), Value::Object(self.security_definitions.clone()));
        }
        Value::Object(root)
    }
}

fn string_list(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn malformed(location: Option<&str>, reason: String) -> WotError {
    WotError::MalformedInputDocument { location: location.map(str::to_owned), reason }
}

fn as_object(value: Value, location: Option<&str>, field: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(malformed(location, format!("'{field}' must be an object, got {}", kind_of(&other)))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn take_string(root: &mut Map<String, Value>, location: Option<&str>, field: &str) -> Result<Option<String>> {
    match root.shift_remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(malformed(location, format!("'{field}' must be a string, got {}", kind_of(&other)))),
    }
}

fn take_object(root: &mut Map<String, Value>, location: Option<&str>, field: &str) -> Result<Map<String, Value>> {
    match root.shift_remove(field) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(value) => as_object(value, location, field),
    }
}

fn take_array(root: &mut Map<String, Value>, location: Option<&str>, field: &str) -> Result<Vec<Value>> {
    match root.shift_remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(malformed(location, format!("'{field}' must be an array, got {}", kind_of(&other)))),
    }
}

/// `@context` entries may be strings or term maps, so the list is kept raw;
/// a bare string still gets promoted to a one-element list.
fn list_field(root: &mut Map<String, Value>, location: Option<&str>, field: &str) -> Result<Vec<Value>> {
    match root.shift_remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![Value::String(s)]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => {
            Err(malformed(location, format!("'{field}' must be a string or an array, got {}", kind_of(&other))))
        }
    }
}

fn take_string_or_list(root: &mut Map<String, Value>, location: Option<&str>, field: &str) -> Result<Vec<String>> {
    match root.shift_remove(field) {
        None => Ok(Vec::new()),
        Some(raw) => string_or_list(raw, location, field),
    }
}

/// Promotes `"x"` to `["x"]` and checks that list entries are strings.
pub(crate) fn string_or_list(raw: Value, location: Option<&str>, field: &str) -> Result<Vec<String>> {
    match raw {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                other => {
                    Err(malformed(location, format!("'{field}' entries must be strings, got {}", kind_of(&other))))
                }
            })
            .collect(),
        other => {
            Err(malformed(location, format!("'{field}' must be a string or an array, got {}", kind_of(&other))))
        }
    }
}
