//! Document composition: from layered templates to one canonical document.
//!
//! A Thing Description arrives in layers: a base Thing Model, any templates
//! it `extends`, instance metadata, protocol bindings, and a placeholder
//! map. [`compose`] merges them in that order and finalizes the result:
//!
//! 1. placeholder substitution over the base model (and over metadata and
//!    bindings, which may use placeholders too),
//! 2. depth-first, eager resolution of the `extends` chain with cycle
//!    detection,
//! 3. instance-metadata overlay ([`metadata`]),
//! 4. protocol-bindings overlay ([`bindings`]),
//! 5. finalization: context/type normalization and the synthetic
//!    `nosec_sc` default when no security definition survived the merge.
//!
//! Composition must fully complete before validation starts; every stage
//! here assumes nothing about later ones. Template merging is
//! first-definition-wins throughout: a base template's value is never
//! overridden by something it extends.

mod bindings;
mod metadata;

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, info};

use crate::document::{Document, string_or_list};
use crate::error::{Result, WotError};
use crate::fetch::{Locator, TemplateLoader};

pub use bindings::overlay_bindings;
pub use metadata::overlay_instance_metadata;

/// The TD 1.0 core context URI.
pub const TD_CONTEXT: &str = "https://www.w3.org/2019/wot/td/v1";
/// Legacy spelling of the core context, normalized to [`TD_CONTEXT`].
pub const TD_CONTEXT_LEGACY: &str = "http://www.w3.org/ns/td";
/// Scheme name installed when a document ends up with no security at all.
pub const NOSEC_KEY: &str = "nosec_sc";

/// Instance-level inputs overlaid onto the merged template.
#[derive(Debug, Default)]
pub struct ComposeOptions {
    /// Instance metadata document (id, titles, security definitions, ...).
    pub meta: Option<Value>,
    /// Protocol-bindings document (per-affordance form lists).
    pub bindings: Option<Value>,
    /// Placeholder map applied to the model, metadata and bindings.
    pub placeholders: BTreeMap<String, String>,
}

/// Composes a raw Thing Model into the canonical document.
///
/// `origin` is the locator the model was loaded from and anchors relative
/// `extends` hrefs; pass `None` when the model was constructed in memory
/// (relative extension targets will then fail to load).
///
/// # Errors
///
/// Any input, placeholder, or extension failure aborts composition; see
/// [`crate::error::WotError`] for the full taxonomy.
pub fn compose(
    model: Value,
    origin: Option<Locator>,
    options: &ComposeOptions,
    loader: &dyn TemplateLoader,
) -> Result<Document> {
    compose_all(vec![(model, origin)], options, loader)
}

/// Composes several Thing Models at once. Models after the first are
/// resolved the same way (placeholders, extension chains) and then merged
/// into it, earlier models winning, before the instance overlays apply.
pub fn compose_all(
    models: Vec<(Value, Option<Locator>)>,
    options: &ComposeOptions,
    loader: &dyn TemplateLoader,
) -> Result<Document> {
    let mut resolved = Vec::with_capacity(models.len());
    for (model, origin) in models {
        let model = crate::resolver::substitute_placeholders(&model, &options.placeholders)?;
        let location = origin.as_ref().map(Locator::to_string);
        let mut document = Document::from_json(model, location.as_deref())?;

        let mut visited = HashSet::new();
        if let Some(origin) = &origin {
            visited.insert(origin.clone());
        }
        resolve_extension_chain(&mut document, origin.as_ref(), loader, &mut visited)?;
        resolved.push(document);
    }

    let mut resolved = resolved.into_iter();
    let mut document = resolved
        .next()
        .ok_or_else(|| WotError::MalformedInputDocument {
            location: None,
            reason: "at least one thing model is required".to_string(),
        })?;
    for extra in resolved {
        merge_template(&mut document, extra);
    }

    if let Some(meta) = &options.meta {
        let meta = crate::resolver::substitute_placeholders(meta, &options.placeholders)?;
        overlay_instance_metadata(&mut document, meta)?;
    }
    if let Some(bindings) = &options.bindings {
        let bindings = crate::resolver::substitute_placeholders(bindings, &options.placeholders)?;
        overlay_bindings(&mut document, bindings)?;
    }

    finalize(&mut document);
    Ok(document)
}

/// Follows the document's `extends` link, if any, and merges the target in.
///
/// The target template is itself resolved depth-first before merging, so a
/// whole chain collapses eagerly into the base document. `visited` carries
/// every locator on the current chain; revisiting one is a
/// [`WotError::CircularExtension`].
pub fn resolve_extension_chain(
    document: &mut Document,
    origin: Option<&Locator>,
    loader: &dyn TemplateLoader,
    visited: &mut HashSet<Locator>,
) -> Result<()> {
    let Some(link) = extension_link(document)? else {
        return Ok(());
    };

    let locator = match origin {
        Some(origin) => origin.join(&link),
        None => Locator::parse(&link, None),
    };
    if !visited.insert(locator.clone()) {
        return Err(WotError::CircularExtension { locator: locator.to_string() });
    }
    debug!(target = %locator, "resolving extension template");

    let raw = loader.load(&locator).map_err(|e| WotError::ExtensionFetchFailed {
        locator: locator.to_string(),
        reason: e.to_string(),
    })?;
    let mut extension = Document::from_json(raw, Some(&locator.to_string()))?;
    resolve_extension_chain(&mut extension, Some(&locator), loader, visited)?;

    merge_template(document, extension);
    Ok(())
}

/// Finds the href of the first link whose relation includes `extends`.
fn extension_link(document: &Document) -> Result<Option<String>> {
    for link in &document.links {
        let Some(link) = link.as_object() else { continue };
        let rels = match link.get("rel") {
            Some(rel) => string_or_list(rel.clone(), None, "rel")?,
            None => continue,
        };
        if !rels.iter().any(|rel| rel == "extends") {
            continue;
        }

        let media_type = link.get("type").and_then(Value::as_str).unwrap_or_default();
        if media_type != "application/td+json" {
            return Err(WotError::UnsupportedFieldValue {
                field: "links/type".into(),
                value: media_type.to_string(),
            });
        }
        return match link.get("href").and_then(Value::as_str) {
            Some(href) => Ok(Some(href.to_string())),
            None => Err(WotError::MissingExtensionTarget),
        };
    }
    Ok(None)
}

/// Merges an extension template into `base`, first-definition-wins.
///
/// Scalars already set in the base are kept; list fields are unioned
/// preserving base order; affordances present in both take the union of
/// their field sets with base values winning per field, and `required`
/// lists are unioned. The base's own `extends` links are dropped, since
/// they have served their purpose.
pub fn merge_template(base: &mut Document, extension: Document) {
    merge_scalar(&mut base.id, extension.id);
    merge_scalar(&mut base.title, extension.title);
    merge_scalar(&mut base.description, extension.description);
    merge_scalar(&mut base.created, extension.created);
    merge_scalar(&mut base.modified, extension.modified);
    merge_scalar(&mut base.support, extension.support);
    merge_scalar(&mut base.base, extension.base);
    if base.titles.is_empty() {
        base.titles = extension.titles;
    }
    if base.descriptions.is_empty() {
        base.descriptions = extension.descriptions;
    }

    union_values(&mut base.context, extension.context);
    union_strings(&mut base.types, extension.types);
    for (key, value) in extension.version {
        base.version.entry(key).or_insert(value);
    }

    base.links.retain(|link| !is_extends_link(link));
    union_values(&mut base.links, extension.links);
    union_values(&mut base.forms, extension.forms);

    union_strings(&mut base.security, extension.security);
    for (name, definition) in extension.security_definitions {
        match base.security_definitions.get_mut(&name) {
            None => {
                base.security_definitions.insert(name, definition);
            }
            Some(existing) => union_fields(existing, definition),
        }
    }

    for (kind, source) in [
        ("properties", extension.properties),
        ("actions", extension.actions),
        ("events", extension.events),
    ] {
        let target = base.affordances_mut(kind);
        for (name, definition) in source.entries {
            match target.entries.get_mut(&name) {
                None => {
                    target.entries.insert(name, definition);
                }
                Some(existing) => union_fields(existing, definition),
            }
        }
        for requirement in source.required {
            if !target.required.contains(&requirement) {
                target.required.push(requirement);
            }
        }
    }
}

/// Normalizes legacy context/type spellings and installs the no-security
/// default when the definition map is still empty.
fn finalize(document: &mut Document) {
    for entry in &mut document.context {
        if entry.as_str() == Some(TD_CONTEXT_LEGACY) {
            *entry = Value::String(TD_CONTEXT.to_string());
        }
    }
    for ty in &mut document.types {
        if ty == "ThingModel" {
            *ty = "Thing".to_string();
        }
    }

    if document.security_definitions.is_empty() {
        info!("no security definitions found, installing '{NOSEC_KEY}' as default");
        document
            .security_definitions
            .insert(NOSEC_KEY.to_string(), serde_json::json!({"scheme": "nosec"}));
        document.security = vec![NOSEC_KEY.to_string()];
    }
}

fn is_extends_link(link: &Value) -> bool {
    let Some(rel) = link.get("rel") else { return false };
    match rel {
        Value::String(rel) => rel == "extends",
        Value::Array(rels) => rels.iter().any(|rel| rel.as_str() == Some("extends")),
        _ => false,
    }
}

fn merge_scalar(base: &mut Option<String>, extension: Option<String>) {
    if base.is_none() {
        *base = extension;
    }
}

fn union_strings(base: &mut Vec<String>, extension: Vec<String>) {
    for entry in extension {
        if !base.contains(&entry) {
            base.push(entry);
        }
    }
}

fn union_values(base: &mut Vec<Value>, extension: Vec<Value>) {
    for entry in extension {
        if !base.contains(&entry) {
            base.push(entry);
        }
    }
}

/// Adds every field of `incoming` that `existing` does not already set.
fn union_fields(existing: &mut Value, incoming: Value) {
    let (Some(existing), Value::Object(incoming)) = (existing.as_object_mut(), incoming) else {
        return;
    };
    for (field, value) in incoming {
        existing.entry(field).or_insert(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EmptyLoader;

    impl TemplateLoader for EmptyLoader {
        fn load(&self, locator: &Locator) -> Result<Value> {
            Err(WotError::DocumentRead { locator: locator.to_string(), reason: "no loader".into() })
        }
    }

    struct MapLoader(std::collections::HashMap<String, Value>);

    impl TemplateLoader for MapLoader {
        fn load(&self, locator: &Locator) -> Result<Value> {
            self.0
                .get(&locator.to_string())
                .cloned()
                .ok_or_else(|| WotError::DocumentRead { locator: locator.to_string(), reason: "missing".into() })
        }
    }

    fn doc(value: Value) -> Document {
        Document::from_json(value, None).unwrap()
    }

    #[test]
    fn base_title_wins_and_extension_affordances_are_added() {
        let mut base = doc(json!({"title": "Base", "properties": {}}));
        let extension = doc(json!({"title": "Extended", "properties": {"temp": {"type": "number"}}}));
        merge_template(&mut base, extension);
        assert_eq!(base.title.as_deref(), Some("Base"));
        assert!(base.properties.entries.contains_key("temp"));
    }

    #[test]
    fn shared_affordance_fields_prefer_the_base() {
        let mut base = doc(json!({"properties": {"temp": {"type": "number", "unit": "celsius"}}}));
        let extension = doc(json!({
            "properties": {"required": ["temp"], "temp": {"unit": "kelvin", "readOnly": true}}
        }));
        merge_template(&mut base, extension);
        let temp = &base.properties.entries["temp"];
        assert_eq!(temp["unit"], json!("celsius"));
        assert_eq!(temp["readOnly"], json!(true));
        assert_eq!(base.properties.required, vec!["temp"]);
    }

    #[test]
    fn extends_links_are_dropped_after_merging() {
        let mut base = doc(json!({
            "links": [{"rel": "extends", "href": "base.tm.json", "type": "application/td+json"}]
        }));
        let extension = doc(json!({"links": [{"rel": "icon", "href": "/icon.png"}]}));
        merge_template(&mut base, extension);
        assert_eq!(base.links.len(), 1);
        assert_eq!(base.links[0]["rel"], json!("icon"));
    }

    #[test]
    fn composing_a_canonical_document_is_idempotent() {
        let canonical = json!({
            "@context": [TD_CONTEXT],
            "@type": ["Thing"],
            "title": "Sensor",
            "properties": {"temp": {"type": "number", "forms": [{"href": "/temp"}]}},
            "security": ["nosec_sc"],
            "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}}
        });
        let expected = doc(canonical.clone());
        let composed = compose(canonical, None, &ComposeOptions::default(), &EmptyLoader).unwrap();
        assert_eq!(composed, expected);
    }

    #[test]
    fn unresolved_placeholder_aborts_composition() {
        let model = json!({"id": "urn:{{DEVICE_ID}}"});
        let err = compose(model, None, &ComposeOptions::default(), &EmptyLoader).unwrap_err();
        assert!(matches!(err, WotError::UnresolvedPlaceholder { .. }));
    }

    #[test]
    fn nosec_default_is_installed_when_definitions_are_empty() {
        let composed =
            compose(json!({"title": "Sensor"}), None, &ComposeOptions::default(), &EmptyLoader).unwrap();
        assert!(composed.security_definitions.contains_key(NOSEC_KEY));
        assert_eq!(composed.security, vec![NOSEC_KEY]);
    }

    #[test]
    fn extension_chain_is_resolved_through_the_loader() {
        let loader = MapLoader(
            [(
                "/models/base.tm.json".to_string(),
                json!({"title": "Base", "properties": {"temp": {"type": "number"}}}),
            )]
            .into(),
        );
        let model = json!({
            "title": "Leaf",
            "links": [{"rel": "extends", "href": "base.tm.json", "type": "application/td+json"}]
        });
        let origin = Locator::parse("/models/leaf.tm.json", None);
        let composed = compose(model, Some(origin), &ComposeOptions::default(), &loader).unwrap();
        assert_eq!(composed.title.as_deref(), Some("Leaf"));
        assert!(composed.properties.entries.contains_key("temp"));
        assert!(composed.links.is_empty());
    }

    #[test]
    fn circular_extension_chains_are_detected() {
        let link = |href: &str| json!({"rel": "extends", "href": href, "type": "application/td+json"});
        let loader = MapLoader(
            [
                ("/a.json".to_string(), json!({"links": [link("b.json")]})),
                ("/b.json".to_string(), json!({"links": [link("a.json")]})),
            ]
            .into(),
        );
        let model = json!({"links": [link("b.json")]});
        let err = compose(model, Some(Locator::parse("/a.json", None)), &ComposeOptions::default(), &loader)
            .unwrap_err();
        assert!(matches!(err, WotError::CircularExtension { .. }));
    }

    #[test]
    fn extension_link_without_href_is_fatal() {
        let model = json!({"links": [{"rel": "extends", "type": "application/td+json"}]});
        let err = compose(model, None, &ComposeOptions::default(), &EmptyLoader).unwrap_err();
        assert!(matches!(err, WotError::MissingExtensionTarget));
    }

    #[test]
    fn legacy_context_and_thing_model_type_are_normalized() {
        let model = json!({"@context": [TD_CONTEXT_LEGACY], "@type": ["ThingModel"]});
        let composed = compose(model, None, &ComposeOptions::default(), &EmptyLoader).unwrap();
        assert_eq!(composed.context, vec![json!(TD_CONTEXT)]);
        assert_eq!(composed.types, vec!["Thing"]);
    }
}
