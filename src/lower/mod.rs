//! Lowering: from the typed [`Thing`](crate::model::Thing) to the
//! [`RecordGraph`](crate::graph::RecordGraph).
//!
//! Every list-valued field becomes a linked sequence (`next` pointers,
//! `NULL` terminated) and every nested object becomes a child record
//! referenced by pointer. Children are appended in the order the Thing
//! fields are visited; the emitter reverses that order, so the security
//! definitions built last come out first and each record only ever points
//! at records above it.

mod affordance;
mod schema;
mod security;

use crate::error::Result;
use crate::graph::{naming, FieldValue, Record, RecordGraph};
use crate::model::{ContextEntry, Link, MediaType, Thing};
use crate::resolver;
use tracing::debug;

pub(crate) use security::SecurityIndex;

/// Builds the record graph for a decoded Thing. `namespace` prefixes every
/// generated type and record name.
pub fn build(thing: &Thing, namespace: &str) -> Result<RecordGraph> {
    let mut root = Record::new(ty(namespace, "thing_t"), naming::child(namespace, "thing"));
    let index = SecurityIndex::new(&root.name, thing);

    lower_context(&mut root, thing)?;
    type_sequence(&mut root, namespace, &thing.types)?;
    if let Some(id) = &thing.id {
        uri_record(&mut root, "id", namespace, id);
    }
    multilang_sequence(&mut root, "titles", "title", namespace, thing.titles.as_deref())?;
    multilang_sequence(
        &mut root,
        "descriptions",
        "description",
        namespace,
        thing.descriptions.as_deref(),
    )?;
    if let Some(instance) = &thing.version {
        let mut version = Record::new(ty(namespace, "version_info_t"), naming::child(&root.name, "version"));
        version.add_string("instance", instance);
        root.add_ref("version", version.name.clone());
        root.add_child(version);
    }
    if let Some(created) = &thing.created {
        datetime_record(&mut root, "created", namespace, created)?;
    }
    if let Some(modified) = &thing.modified {
        datetime_record(&mut root, "modified", namespace, modified)?;
    }
    if let Some(support) = &thing.support {
        uri_record(&mut root, "support", namespace, support);
    }
    security::security_sequence(&mut root, "security", namespace, &thing.security, &index)?;
    lower_links(&mut root, namespace, &thing.links)?;
    affordance::form_sequence(&mut root, "forms", namespace, &thing.forms, &index)?;
    affordance::property_sequence(&mut root, namespace, &thing.properties, &index)?;
    affordance::action_sequence(&mut root, namespace, &thing.actions, &index)?;
    affordance::event_sequence(&mut root, namespace, &thing.events, &index)?;
    security::definition_sequence(&mut root, namespace, &thing.security_definitions, &index)?;

    Ok(RecordGraph { root, namespace: namespace.to_string() })
}

pub(crate) fn ty(namespace: &str, suffix: &str) -> String {
    format!("{namespace}_{suffix}")
}

/// Builds the linked sequence for `items` under `owner`. The first element
/// is installed on the owner as `ref_field`; every element points at its
/// successor and the last at `NULL`. An empty slice adds nothing.
pub(crate) fn linked_sequence<T>(
    owner: &mut Record,
    ref_field: &str,
    label: &str,
    type_name: &str,
    items: &[T],
    mut fill: impl FnMut(&T, &mut Record) -> Result<()>,
) -> Result<()> {
    if items.is_empty() {
        return Ok(());
    }
    let owner_name = owner.name.clone();
    owner.add_ref(ref_field, naming::element(&owner_name, label, 0));
    for (position, item) in items.iter().enumerate() {
        let mut record = Record::new(type_name, naming::element(&owner_name, label, position));
        fill(item, &mut record)?;
        if position + 1 < items.len() {
            record.add_ref("next", naming::element(&owner_name, label, position + 1));
        } else {
            record.add_symbol("next", "NULL");
        }
        owner.add_child(record);
    }
    Ok(())
}

/// Adds a URI child record split into scheme and remainder.
pub(crate) fn uri_record(owner: &mut Record, ref_field: &str, namespace: &str, value: &str) {
    let (scheme, remainder) = resolver::split_uri(value);
    let mut record = Record::new(ty(namespace, "uri_t"), naming::child(&owner.name, ref_field));
    record.add_opt_string("schema", scheme.as_deref());
    record.add_string("value", remainder);
    owner.add_ref(ref_field, record.name.clone());
    owner.add_child(record);
}

/// Adds a `@type` linked sequence.
pub(crate) fn type_sequence(owner: &mut Record, namespace: &str, types: &[String]) -> Result<()> {
    let type_name = ty(namespace, "type_t");
    linked_sequence(owner, "type", "type", &type_name, types, |value, record| {
        record.add_string("value", value);
        Ok(())
    })
}

/// Adds a multilingual text sequence of `(tag, value)` pairs.
pub(crate) fn multilang_sequence(
    owner: &mut Record,
    ref_field: &str,
    label: &str,
    namespace: &str,
    entries: Option<&[(String, String)]>,
) -> Result<()> {
    let Some(entries) = entries else { return Ok(()) };
    let type_name = ty(namespace, "multi_lang_t");
    linked_sequence(owner, ref_field, label, &type_name, entries, |(tag, value), record| {
        record.add_string("tag", tag);
        record.add_string("value", value);
        Ok(())
    })
}

/// Adds a calendar-decomposed date-time child. An unparseable value was
/// already logged by the resolver and is simply omitted.
fn datetime_record(owner: &mut Record, ref_field: &str, namespace: &str, value: &str) -> Result<()> {
    let Some(parts) = resolver::decompose_datetime(ref_field, value)? else {
        return Ok(());
    };
    let mut record = Record::new(ty(namespace, "date_time_t"), naming::child(&owner.name, ref_field));
    record.add_field("year", FieldValue::Int(i64::from(parts.year)));
    record.add_field("month", FieldValue::Int(i64::from(parts.month)));
    record.add_field("day", FieldValue::Int(i64::from(parts.day)));
    record.add_field("hour", FieldValue::Int(i64::from(parts.hour)));
    record.add_field("minute", FieldValue::Int(i64::from(parts.minute)));
    record.add_field("second", FieldValue::Int(i64::from(parts.second)));
    record.add_field("timezone_offset", FieldValue::Int(i64::from(parts.utc_offset_minutes)));
    owner.add_ref(ref_field, record.name.clone());
    owner.add_child(record);
    Ok(())
}

/// Lowers the filtered context entries, appending an `@language` entry when
/// the document declared none, and records the default language tag on the
/// thing itself.
fn lower_context(root: &mut Record, thing: &Thing) -> Result<()> {
    let mut entries: Vec<ContextEntry> = thing.context.clone();
    let has_language = entries.iter().any(|entry| entry.key.as_deref() == Some("@language"));
    if !has_language {
        entries.push(ContextEntry {
            key: Some("@language".to_string()),
            value: thing.default_language.clone(),
        });
    }
    linked_sequence(root, "context", "context", "json_ld_context_t", &entries, |entry, record| {
        if let Some(key) = &entry.key {
            record.add_string("key", key);
        }
        record.add_string("value", &entry.value);
        Ok(())
    })?;
    root.add_string("default_language_tag", &thing.default_language);
    Ok(())
}

fn lower_links(root: &mut Record, namespace: &str, links: &[Link]) -> Result<()> {
    let type_name = ty(namespace, "link_t");
    linked_sequence(root, "links", "link", &type_name, links, |link, record| {
        uri_record(record, "href", namespace, &link.href);
        record.add_opt_string("rel", link.rel.as_deref());
        if let Some(media_type) = &link.media_type {
            // Links may point at media the device never serves, so an
            // unknown link type is skipped rather than rejected.
            match MediaType::parse(media_type) {
                Ok(parsed) => record.add_symbol("type", parsed.c_value()),
                Err(_) => debug!(media_type, "link media type outside vocabulary, omitting"),
            }
        }
        if let Some(anchor) = &link.anchor {
            uri_record(record, "anchor", namespace, anchor);
        }
        Ok(())
    })
}
