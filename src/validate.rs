//! Structural validation of the composed document.
//!
//! Runs strictly between composition and lowering: every check assumes the
//! document is fully merged (including the synthetic no-security default)
//! and the record builder assumes every check passed. Validation never
//! mutates the document, and it keeps going after the first hit so one run
//! reports every violation at once.

use serde_json::Value;

use crate::document::{AFFORDANCE_KINDS, Document};
use crate::error::{Result, Violation, WotError};

/// Checks the composed document's structural invariants.
///
/// - every identifier in an affordance map's `required` list is a key of
///   that map,
/// - every security reference (thing level and per form) resolves to a
///   security definition,
/// - affordance identifiers are unique across all three maps, since they
///   are later projected into one transport resource namespace.
///
/// # Errors
///
/// [`WotError::ValidationFailed`] carrying every violation found.
pub fn validate(document: &Document) -> Result<()> {
    let mut violations = Vec::new();

    check_required_lists(document, &mut violations);
    check_security_references(document, &mut violations);
    check_unique_affordance_names(document, &mut violations);

    if violations.is_empty() { Ok(()) } else { Err(WotError::ValidationFailed { violations }) }
}

fn check_required_lists(document: &Document, violations: &mut Vec<Violation>) {
    for kind in AFFORDANCE_KINDS {
        let map = document.affordances(kind);
        for name in &map.required {
            if !map.entries.contains_key(name) {
                violations.push(Violation::MissingRequiredAffordance { kind, name: name.clone() });
            }
        }
    }
}

fn check_security_references(document: &Document, violations: &mut Vec<Violation>) {
    for reference in &document.security {
        check_reference(document, reference, "thing", violations);
    }
    check_form_references(document, &document.forms, "thing form", violations);

    for kind in AFFORDANCE_KINDS {
        for (name, affordance) in &document.affordances(kind).entries {
            let Some(forms) = affordance.get("forms").and_then(Value::as_array) else { continue };
            check_form_references(document, forms, &format!("form of '{name}'"), violations);
        }
    }
}

fn check_form_references(document: &Document, forms: &[Value], at: &str, violations: &mut Vec<Violation>) {
    for form in forms {
        let references = match form.get("security") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => {
                items.iter().filter_map(Value::as_str).map(str::to_owned).collect()
            }
            _ => continue,
        };
        for reference in references {
            check_reference(document, &reference, at, violations);
        }
    }
}

fn check_reference(document: &Document, reference: &str, at: &str, violations: &mut Vec<Violation>) {
    if !document.security_definitions.contains_key(reference) {
        violations.push(Violation::UnknownSecurityReference { name: reference.to_string(), at: at.to_string() });
    }
}

fn check_unique_affordance_names(document: &Document, violations: &mut Vec<Violation>) {
    let mut seen: Vec<(&str, &'static str)> = Vec::new();
    for kind in AFFORDANCE_KINDS {
        for name in document.affordances(kind).entries.keys() {
            match seen.iter().find(|(seen_name, _)| seen_name == name) {
                Some(&(_, first)) => {
                    violations.push(Violation::DuplicateAffordanceName {
                        name: name.clone(),
                        first,
                        second: kind,
                    });
                }
                None => seen.push((name, kind)),
            }
        }
    }
}
