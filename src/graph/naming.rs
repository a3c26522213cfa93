//! Deterministic record names.
//!
//! A record's name is its owner's name, the field label, and (for sequence
//! elements) the zero-based position, joined with underscores. The same
//! input documents therefore always produce the same identifiers, which is
//! what makes the generated file diffable.

/// Name of a singular child record, e.g. `wot_td_thing_id`.
pub fn child(owner: &str, label: &str) -> String {
    format!("{owner}_{label}")
}

/// Name of a sequence element, e.g. `wot_td_thing_property_2`.
pub fn element(owner: &str, label: &str, index: usize) -> String {
    format!("{owner}_{label}_{index}")
}
