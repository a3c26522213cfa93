//! Protocol-bindings overlay.
//!
//! A bindings document supplies transport-specific form lists per
//! affordance (hrefs, handler functions, CoAP method hints). Forms are
//! matched by href; a binding form only overrides a template form when
//! their operation sets match exactly, or merges additively (everything
//! but `op`) when the binding names a single operation and the template
//! carries a list.

use serde_json::Value;

use crate::document::{AFFORDANCE_KINDS, Document};
use crate::error::{Result, WotError};

/// Applies a protocol-bindings document onto the composed template.
///
/// Affordances named in the bindings but absent from the document are
/// ignored; affordances without any template forms adopt the binding's
/// form list wholesale.
///
/// # Errors
///
/// [`WotError::MalformedInputDocument`] when a bindings entry has no
/// `forms` list or the document is not an object per affordance kind.
pub fn overlay_bindings(document: &mut Document, bindings: Value) -> Result<()> {
    let Value::Object(mut bindings) = bindings else {
        return Err(malformed("bindings document must be an object"));
    };

    for kind in AFFORDANCE_KINDS {
        let Some(per_kind) = bindings.shift_remove(kind) else { continue };
        let Value::Object(per_kind) = per_kind else {
            return Err(malformed(&format!("bindings '{kind}' must be an object")));
        };

        for (name, binding) in per_kind {
            let Some(affordance) = document.affordances_mut(kind).entries.get_mut(&name) else {
                continue;
            };
            let Some(binding_forms) = binding.get("forms").and_then(Value::as_array) else {
                return Err(malformed(&format!("binding for '{name}' has no 'forms' list")));
            };

            let Some(affordance) = affordance.as_object_mut() else {
                return Err(malformed(&format!("affordance '{name}' is not an object")));
            };
            if !affordance.contains_key("forms") {
                affordance.insert("forms".into(), Value::Array(binding_forms.clone()));
                continue;
            }
            if let Some(template_forms) = affordance.get_mut("forms").and_then(Value::as_array_mut) {
                for binding_form in binding_forms {
                    merge_form_by_href(template_forms, binding_form);
                }
            }
        }
    }

    Ok(())
}

/// Merges one binding form into every template form sharing its href.
fn merge_form_by_href(template_forms: &mut [Value], binding_form: &Value) {
    let Some(binding) = binding_form.as_object() else { return };
    let Some(href) = binding.get("href") else { return };

    for template_form in template_forms {
        let Some(template) = template_form.as_object_mut() else { continue };
        if template.get("href") != Some(href) {
            continue;
        }
        let (Some(binding_op), Some(template_op)) = (binding.get("op"), template.get("op")) else {
            continue;
        };

        if binding_op == template_op {
            for (field, value) in binding {
                template.insert(field.clone(), value.clone());
            }
        } else if binding_op.is_string() && template_op.is_array() {
            for (field, value) in binding {
                if field != "op" {
                    template.insert(field.clone(), value.clone());
                }
            }
        }
    }
}

fn malformed(reason: &str) -> WotError {
    WotError::MalformedInputDocument { location: Some("protocol bindings".into()), reason: reason.into() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        Document::from_json(value, None).unwrap()
    }

    #[test]
    fn matching_op_sets_let_binding_fields_override() {
        let mut document = doc(json!({
            "properties": {"temp": {"forms": [{"href": "/temp", "op": ["readproperty"], "contentType": "text/plain"}]}}
        }));
        overlay_bindings(
            &mut document,
            json!({
                "properties": {"temp": {"forms": [
                    {"href": "/temp", "op": ["readproperty"], "contentType": "application/json",
                     "riot_os:handler_function": "wot_temp_handler"}
                ]}}
            }),
        )
        .unwrap();

        let form = &document.properties.entries["temp"]["forms"][0];
        assert_eq!(form["contentType"], json!("application/json"));
        assert_eq!(form["riot_os:handler_function"], json!("wot_temp_handler"));
    }

    #[test]
    fn scalar_op_merges_additively_into_a_list() {
        let mut document = doc(json!({
            "properties": {"temp": {"forms": [{"href": "/temp", "op": ["readproperty", "observeproperty"]}]}}
        }));
        overlay_bindings(
            &mut document,
            json!({
                "properties": {"temp": {"forms": [
                    {"href": "/temp", "op": "readproperty", "subprotocol": "longpoll"}
                ]}}
            }),
        )
        .unwrap();

        let form = &document.properties.entries["temp"]["forms"][0];
        assert_eq!(form["op"], json!(["readproperty", "observeproperty"]));
        assert_eq!(form["subprotocol"], json!("longpoll"));
    }

    #[test]
    fn affordances_without_forms_adopt_the_binding_forms() {
        let mut document = doc(json!({"actions": {"toggle": {"title": "Toggle"}}}));
        overlay_bindings(
            &mut document,
            json!({"actions": {"toggle": {"forms": [{"href": "/toggle", "op": "invokeaction"}]}}}),
        )
        .unwrap();
        assert_eq!(document.actions.entries["toggle"]["forms"][0]["href"], json!("/toggle"));
    }

    #[test]
    fn bindings_for_unknown_affordances_are_ignored() {
        let mut document = doc(json!({"properties": {}}));
        overlay_bindings(&mut document, json!({"properties": {"ghost": {"forms": [{"href": "/x"}]}}})).unwrap();
        assert!(document.properties.entries.is_empty());
    }

    #[test]
    fn binding_without_forms_is_malformed() {
        let mut document = doc(json!({"properties": {"temp": {}}}));
        let err = overlay_bindings(&mut document, json!({"properties": {"temp": {}}})).unwrap_err();
        assert!(matches!(err, WotError::MalformedInputDocument { .. }));
    }
}
