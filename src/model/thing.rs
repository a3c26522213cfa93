//! The top-level Thing and its decode from a validated document.

use serde_json::Value;
use tracing::debug;

use crate::compose::TD_CONTEXT;
use crate::document::Document;
use crate::error::Result;
use crate::model::{
    as_object, get_str, ActionAffordance, EventAffordance, Form, FormOwner, PropertyAffordance,
    SecurityDefinition,
};
use crate::resolver;

/// One `@context` entry: a plain IRI (`key` is `None`) or a term mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub key: Option<String>,
    pub value: String,
}

/// A Web link to a related resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Link {
    pub href: String,
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub anchor: Option<String>,
}

/// The fully decoded Thing, ready for lowering.
#[derive(Debug, Clone, PartialEq)]
pub struct Thing {
    /// Language used for singular text fields, from `@language` or the
    /// configured fallback.
    pub default_language: String,
    pub context: Vec<ContextEntry>,
    pub types: Vec<String>,
    pub id: Option<String>,
    pub titles: Option<Vec<(String, String)>>,
    pub descriptions: Option<Vec<(String, String)>>,
    /// The `instance` entry of `version`.
    pub version: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub support: Option<String>,
    pub security: Vec<String>,
    pub links: Vec<Link>,
    pub forms: Vec<Form>,
    pub properties: Vec<PropertyAffordance>,
    pub actions: Vec<ActionAffordance>,
    pub events: Vec<EventAffordance>,
    pub security_definitions: Vec<SecurityDefinition>,
}

impl Thing {
    /// Decodes a composed, validated document. `fallback_lang` is used when
    /// no `@context` entry declares an `@language`.
    pub fn from_document(document: &Document, fallback_lang: &str) -> Result<Thing> {
        let context = decode_context(&document.context)?;
        let default_language = context
            .iter()
            .find(|entry| entry.key.as_deref() == Some("@language"))
            .map(|entry| entry.value.clone())
            .unwrap_or_else(|| {
                debug!(fallback_lang, "no @language context entry, using fallback");
                fallback_lang.to_string()
            });

        let mut forms = Vec::new();
        for raw in &document.forms {
            forms.push(Form::from_value(raw, FormOwner::Thing, "thing")?);
        }

        let mut links = Vec::new();
        for raw in &document.links {
            links.push(decode_link(raw)?);
        }

        let mut properties = Vec::new();
        for (key, value) in &document.properties.entries {
            properties.push(PropertyAffordance::from_value(key, value, &default_language)?);
        }
        let mut actions = Vec::new();
        for (key, value) in &document.actions.entries {
            actions.push(ActionAffordance::from_value(key, value, &default_language)?);
        }
        let mut events = Vec::new();
        for (key, value) in &document.events.entries {
            events.push(EventAffordance::from_value(key, value, &default_language)?);
        }

        let mut security_definitions = Vec::new();
        for (key, value) in &document.security_definitions {
            security_definitions.push(SecurityDefinition::from_value(key, value, &default_language)?);
        }

        let titles = resolver::resolve_multilang(
            "titles",
            &document.titles,
            document.title.as_deref(),
            &default_language,
        )?;
        let descriptions = resolver::resolve_multilang(
            "descriptions",
            &document.descriptions,
            document.description.as_deref(),
            &default_language,
        )?;

        Ok(Thing {
            default_language,
            context,
            types: document.types.clone(),
            id: document.id.clone(),
            titles,
            descriptions,
            version: match document.version.get("instance") {
                Some(Value::String(instance)) => Some(instance.clone()),
                _ => None,
            },
            created: document.created.clone(),
            modified: document.modified.clone(),
            support: document.support.clone(),
            security: document.security.clone(),
            links,
            forms,
            properties,
            actions,
            events,
            security_definitions,
        })
    }
}

/// Flattens raw `@context` entries into key/value pairs, dropping the TD
/// core context IRI. Term maps contribute one entry per term.
fn decode_context(raw: &[Value]) -> Result<Vec<ContextEntry>> {
    let mut entries = Vec::new();
    for entry in raw {
        match entry {
            Value::String(iri) => {
                if iri != TD_CONTEXT {
                    entries.push(ContextEntry { key: None, value: iri.clone() });
                }
            }
            Value::Object(terms) => {
                for (key, value) in terms {
                    let Value::String(value) = value else {
                        return Err(crate::model::malformed(format!(
                            "context term '{key}' must map to a string"
                        )));
                    };
                    entries.push(ContextEntry { key: Some(key.clone()), value: value.clone() });
                }
            }
            _ => {
                return Err(crate::model::malformed(
                    "'@context' entries must be strings or objects".to_string(),
                ));
            }
        }
    }
    Ok(entries)
}

fn decode_link(raw: &Value) -> Result<Link> {
    let map = as_object(raw, "link")?;
    Ok(Link {
        href: get_str(map, "href")?
            .ok_or_else(|| crate::model::malformed("link has no href".to_string()))?,
        rel: get_str(map, "rel")?,
        media_type: get_str(map, "type")?,
        anchor: get_str(map, "anchor")?,
    })
}
