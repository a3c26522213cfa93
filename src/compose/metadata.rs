//! Instance-metadata overlay.
//!
//! Metadata describes the concrete device instance (its id, titles,
//! security setup, extra contexts and links) and therefore wins over the
//! template for every scalar identity field. List fields are unioned, and
//! security definitions are merged first-seen-wins.

use serde_json::Value;

use crate::document::Document;
use crate::error::Result;

use super::{TD_CONTEXT, TD_CONTEXT_LEGACY};

/// Applies an instance-metadata document onto the composed template.
///
/// # Errors
///
/// [`crate::error::WotError::MalformedInputDocument`] when the metadata
/// document itself does not have the canonical shape.
pub fn overlay_instance_metadata(document: &mut Document, meta: Value) -> Result<()> {
    let meta = Document::from_json(meta, Some("instance metadata"))?;

    // The TD core context is already guaranteed by the template layer.
    for context in meta.context {
        let is_core = matches!(context.as_str(), Some(TD_CONTEXT | TD_CONTEXT_LEGACY));
        if !is_core && !document.context.contains(&context) {
            document.context.push(context);
        }
    }
    for ty in meta.types {
        if ty != "ThingModel" && !document.types.contains(&ty) {
            document.types.push(ty);
        }
    }

    for (name, definition) in meta.security_definitions {
        document.security_definitions.entry(name).or_insert(definition);
    }
    for reference in meta.security {
        if !document.security.contains(&reference) {
            document.security.push(reference);
        }
    }

    for link in meta.links {
        if !document.links.contains(&link) {
            document.links.push(link);
        }
    }

    // Identity and metadata scalars: the instance always wins when present.
    overlay_scalar(&mut document.id, meta.id);
    overlay_scalar(&mut document.title, meta.title);
    overlay_scalar(&mut document.description, meta.description);
    overlay_scalar(&mut document.created, meta.created);
    overlay_scalar(&mut document.modified, meta.modified);
    overlay_scalar(&mut document.support, meta.support);
    if !meta.titles.is_empty() {
        document.titles = meta.titles;
    }
    if !meta.descriptions.is_empty() {
        document.descriptions = meta.descriptions;
    }
    if !meta.version.is_empty() {
        document.version = meta.version;
    }

    Ok(())
}

fn overlay_scalar(target: &mut Option<String>, meta: Option<String>) {
    if meta.is_some() {
        *target = meta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_json(value, None).unwrap()
    }

    #[test]
    fn metadata_scalars_override_the_template() {
        let mut document = doc(json!({"title": "Template", "id": "urn:template"}));
        overlay_instance_metadata(&mut document, json!({"id": "urn:device:1", "support": "mailto:ops@example.org"}))
            .unwrap();
        assert_eq!(document.id.as_deref(), Some("urn:device:1"));
        assert_eq!(document.title.as_deref(), Some("Template"));
        assert_eq!(document.support.as_deref(), Some("mailto:ops@example.org"));
    }

    #[test]
    fn core_contexts_and_thing_model_type_are_not_duplicated() {
        let mut document = doc(json!({"@context": [TD_CONTEXT], "@type": ["Thing"]}));
        overlay_instance_metadata(
            &mut document,
            json!({"@context": [TD_CONTEXT, "https://example.org/ctx"], "@type": ["ThingModel", "Sensor"]}),
        )
        .unwrap();
        assert_eq!(document.context, vec![json!(TD_CONTEXT), json!("https://example.org/ctx")]);
        assert_eq!(document.types, vec!["Thing", "Sensor"]);
    }

    #[test]
    fn existing_security_definitions_keep_their_first_seen_value() {
        let mut document = doc(json!({"securityDefinitions": {"basic_sc": {"scheme": "basic"}}}));
        overlay_instance_metadata(
            &mut document,
            json!({
                "securityDefinitions": {"basic_sc": {"scheme": "digest"}, "psk_sc": {"scheme": "psk"}},
                "security": ["psk_sc"]
            }),
        )
        .unwrap();
        assert_eq!(document.security_definitions["basic_sc"]["scheme"], json!("basic"));
        assert!(document.security_definitions.contains_key("psk_sc"));
        assert_eq!(document.security, vec!["psk_sc"]);
    }
}
