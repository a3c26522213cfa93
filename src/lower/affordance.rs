//! Affordance and form lowering.

use crate::error::Result;
use crate::graph::{naming, Record};
use crate::lower::schema::schema_child;
use crate::lower::security::{security_sequence, SecurityIndex};
use crate::lower::{linked_sequence, multilang_sequence, ty, type_sequence, uri_record};
use crate::model::{
    ActionAffordance, ContentType, EventAffordance, Form, InteractionAffordance,
    PropertyAffordance,
};

/// Lowers a list of forms into a chain installed as `ref_field`.
pub(crate) fn form_sequence(
    owner: &mut Record,
    ref_field: &str,
    namespace: &str,
    forms: &[Form],
    index: &SecurityIndex,
) -> Result<()> {
    let type_name = ty(namespace, "form_t");
    linked_sequence(owner, ref_field, "form", &type_name, forms, |form, record| {
        fill_form(record, namespace, form, index)
    })
}

fn fill_form(record: &mut Record, namespace: &str, form: &Form, index: &SecurityIndex) -> Result<()> {
    let op_type = ty(namespace, "form_op_t");
    linked_sequence(record, "op", "op", &op_type, &form.operations, |operation, element| {
        element.add_symbol("op_type", operation.c_value());
        Ok(())
    })?;
    uri_record(record, "href", namespace, &form.href);
    if let Some(content_type) = &form.content_type {
        content_type_record(record, "content_type", namespace, content_type)?;
    }
    if let Some(coding) = form.content_coding {
        record.add_symbol("content_encoding", coding.c_value());
    }
    record.add_opt_string("sub_protocol", form.subprotocol.as_deref());
    security_sequence(record, "security", namespace, &form.security, index)?;
    let scope_type = ty(namespace, "auth_scopes_t");
    linked_sequence(record, "scopes", "scope", &scope_type, &form.scopes, |value, element| {
        element.add_string("value", value);
        Ok(())
    })?;
    if let Some(response) = &form.response {
        let mut expected =
            Record::new(ty(namespace, "expected_res_t"), naming::child(&record.name, "expected_response"));
        if let Some(content_type) = &response.content_type {
            content_type_record(&mut expected, "content_type", namespace, content_type)?;
        }
        record.add_ref("expected_response", expected.name.clone());
        record.add_child(expected);
    }
    Ok(())
}

fn content_type_record(
    owner: &mut Record,
    ref_field: &str,
    namespace: &str,
    content_type: &ContentType,
) -> Result<()> {
    let mut record =
        Record::new(ty(namespace, "content_type_t"), naming::child(&owner.name, ref_field));
    record.add_symbol("media_type", content_type.media_type.c_value());
    let parameter_type = ty(namespace, "media_type_parameter_t");
    linked_sequence(
        &mut record,
        "media_type_parameter",
        "parameter",
        &parameter_type,
        &content_type.parameters,
        |(key, value), element| {
            element.add_string("key", key);
            element.add_string("value", value);
            Ok(())
        },
    )?;
    owner.add_ref(ref_field, record.name.clone());
    owner.add_child(record);
    Ok(())
}

/// Lowers the fields every affordance kind shares into a child record
/// installed as `int_affordance`.
fn interaction_child(
    owner: &mut Record,
    namespace: &str,
    interaction: &InteractionAffordance,
    index: &SecurityIndex,
) -> Result<()> {
    let mut record =
        Record::new(ty(namespace, "int_affordance_t"), naming::child(&owner.name, "int_affordance"));
    type_sequence(&mut record, namespace, &interaction.types)?;
    multilang_sequence(&mut record, "titles", "title", namespace, interaction.titles.as_deref())?;
    multilang_sequence(
        &mut record,
        "descriptions",
        "description",
        namespace,
        interaction.descriptions.as_deref(),
    )?;
    let map_type = ty(namespace, "data_schema_map_t");
    linked_sequence(
        &mut record,
        "uri_variables",
        "uri_variable",
        &map_type,
        &interaction.uri_variables,
        |(key, schema), element| {
            element.add_string("key", key);
            let nested = crate::lower::schema::schema_record(
                naming::child(&element.name, "value"),
                namespace,
                schema,
            )?;
            element.add_ref("value", nested.name.clone());
            element.add_child(nested);
            Ok(())
        },
    )?;
    form_sequence(&mut record, "forms", namespace, &interaction.forms, index)?;
    owner.add_ref("int_affordance", record.name.clone());
    owner.add_child(record);
    Ok(())
}

pub(crate) fn property_sequence(
    root: &mut Record,
    namespace: &str,
    properties: &[PropertyAffordance],
    index: &SecurityIndex,
) -> Result<()> {
    let type_name = ty(namespace, "prop_affordance_t");
    linked_sequence(root, "properties", "property", &type_name, properties, |property, record| {
        record.add_string("key", &property.key);
        record.add_opt_bool("observable", property.observable);
        schema_child(record, "data_schema", namespace, &property.data_schema)?;
        interaction_child(record, namespace, &property.interaction, index)
    })
}

pub(crate) fn action_sequence(
    root: &mut Record,
    namespace: &str,
    actions: &[ActionAffordance],
    index: &SecurityIndex,
) -> Result<()> {
    let type_name = ty(namespace, "action_affordance_t");
    linked_sequence(root, "actions", "action", &type_name, actions, |action, record| {
        record.add_string("key", &action.key);
        record.add_opt_bool("safe", action.safe);
        record.add_opt_bool("idempotent", action.idempotent);
        if let Some(input) = &action.input {
            schema_child(record, "input", namespace, input)?;
        }
        if let Some(output) = &action.output {
            schema_child(record, "output", namespace, output)?;
        }
        interaction_child(record, namespace, &action.interaction, index)
    })
}

pub(crate) fn event_sequence(
    root: &mut Record,
    namespace: &str,
    events: &[EventAffordance],
    index: &SecurityIndex,
) -> Result<()> {
    let type_name = ty(namespace, "event_affordance_t");
    linked_sequence(root, "events", "event", &type_name, events, |event, record| {
        record.add_string("key", &event.key);
        if let Some(subscription) = &event.subscription {
            schema_child(record, "subscription", namespace, subscription)?;
        }
        if let Some(data) = &event.data {
            schema_child(record, "data", namespace, data)?;
        }
        if let Some(cancellation) = &event.cancellation {
            schema_child(record, "cancellation", namespace, cancellation)?;
        }
        interaction_child(record, namespace, &event.interaction, index)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::Document;
    use crate::graph::{FieldValue, RecordGraph};
    use crate::model::Thing;

    fn lower(value: serde_json::Value) -> RecordGraph {
        let document = Document::from_json(value, None).unwrap();
        let thing = Thing::from_document(&document, "en").unwrap();
        crate::lower::build(&thing, "wot_td").unwrap()
    }

    fn find<'a>(graph: &'a RecordGraph, name: &str) -> &'a Record {
        graph
            .records()
            .into_iter()
            .find(|record| record.name == name)
            .unwrap_or_else(|| panic!("no record named {name}"))
    }

    #[test]
    fn property_lowers_schema_and_interaction() {
        let graph = lower(json!({
            "properties": {
                "temperature": {
                    "type": "number",
                    "observable": true,
                    "forms": [{
                        "op": "readproperty",
                        "href": "coap://[::1]/temp",
                        "contentType": "application/json"
                    }]
                }
            },
            "securityDefinitions": {}
        }));
        let property = find(&graph, "wot_td_thing_property_0");
        assert!(property.fields.iter().any(|f| f.value == FieldValue::String("temperature".into())));
        assert!(property.fields.iter().any(|f| f.name == "observable" && f.value == FieldValue::Bool(true)));

        let schema = find(&graph, "wot_td_thing_property_0_data_schema");
        assert!(schema.fields.iter().any(|f| f.value == FieldValue::Symbol("JSON_TYPE_NUMBER".into())));

        let form = find(&graph, "wot_td_thing_property_0_int_affordance_form_0");
        let op = find(&graph, "wot_td_thing_property_0_int_affordance_form_0_op_0");
        assert!(op.fields.iter().any(|f| f.value == FieldValue::Symbol("FORM_OP_READ_PROPERTY".into())));
        assert!(form.fields.iter().any(|f| {
            f.value == FieldValue::Ref("wot_td_thing_property_0_int_affordance_form_0_content_type".into())
        }));
    }

    #[test]
    fn form_href_is_split_into_uri_record() {
        let graph = lower(json!({
            "actions": {
                "toggle": {"forms": [{"op": "invokeaction", "href": "coap://[::1]/toggle"}]}
            },
            "securityDefinitions": {}
        }));
        let href = find(&graph, "wot_td_thing_action_0_int_affordance_form_0_href");
        assert!(href.fields.iter().any(|f| f.value == FieldValue::String("coap://".into())));
        assert!(href.fields.iter().any(|f| f.value == FieldValue::String("[::1]/toggle".into())));
    }

    #[test]
    fn expected_response_gets_its_own_content_type() {
        let graph = lower(json!({
            "events": {
                "overheat": {
                    "forms": [{
                        "op": "subscribeevent",
                        "href": "/overheat",
                        "response": {"contentType": "text/plain"}
                    }]
                }
            },
            "securityDefinitions": {}
        }));
        let response =
            find(&graph, "wot_td_thing_event_0_int_affordance_form_0_expected_response");
        assert!(response.fields.iter().any(|f| {
            f.value
                == FieldValue::Ref(
                    "wot_td_thing_event_0_int_affordance_form_0_expected_response_content_type".into(),
                )
        }));
        let content_type =
            find(&graph, "wot_td_thing_event_0_int_affordance_form_0_expected_response_content_type");
        assert!(content_type.fields.iter().any(|f| f.value == FieldValue::Symbol("MEDIA_TYPE_TEXT_PLAIN".into())));
    }

    #[test]
    fn form_security_references_resolve_within_the_thing() {
        let graph = lower(json!({
            "properties": {
                "status": {
                    "forms": [{
                        "op": "readproperty",
                        "href": "/status",
                        "security": "basic_sc"
                    }]
                }
            },
            "securityDefinitions": {"basic_sc": {"scheme": "basic"}},
            "security": "basic_sc"
        }));
        let reference = find(&graph, "wot_td_thing_property_0_int_affordance_form_0_security_0");
        assert!(reference.fields.iter().any(|f| {
            f.value == FieldValue::Ref("wot_td_thing_security_definition_0".into())
        }));
    }
}
