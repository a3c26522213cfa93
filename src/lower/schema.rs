//! Data schema lowering.

use crate::error::Result;
use crate::graph::{naming, FieldValue, Record};
use crate::lower::{linked_sequence, multilang_sequence, ty, type_sequence};
use crate::model::{DataSchema, SchemaKind};

/// Lowers `schema` into a child of `owner`, installed as `ref_field`.
pub(crate) fn schema_child(
    owner: &mut Record,
    ref_field: &str,
    namespace: &str,
    schema: &DataSchema,
) -> Result<()> {
    let record = schema_record(naming::child(&owner.name, ref_field), namespace, schema)?;
    owner.add_ref(ref_field, record.name.clone());
    owner.add_child(record);
    Ok(())
}

/// Builds one data schema record, recursing into nested schemas.
pub(crate) fn schema_record(name: String, namespace: &str, schema: &DataSchema) -> Result<Record> {
    let mut record = Record::new(ty(namespace, "data_schema_t"), name);

    type_sequence(&mut record, namespace, &schema.types)?;
    multilang_sequence(&mut record, "titles", "title", namespace, schema.titles.as_deref())?;
    multilang_sequence(
        &mut record,
        "descriptions",
        "description",
        namespace,
        schema.descriptions.as_deref(),
    )?;
    record.add_symbol("json_type", schema.kind.c_value());
    record.add_opt_string("constant", schema.constant.as_deref());
    record.add_opt_string("unit", schema.unit.as_deref());
    record.add_opt_string("format", schema.format.as_deref());
    record.add_opt_bool("read_only", schema.read_only);
    record.add_opt_bool("write_only", schema.write_only);

    let enum_type = ty(namespace, "data_enums_t");
    linked_sequence(&mut record, "enumeration", "enum", &enum_type, &schema.enumeration, |value, element| {
        element.add_string("value", value);
        Ok(())
    })?;

    nested_schema_sequence(&mut record, "one_of", "one_of", namespace, &schema.one_of)?;
    lower_kind(&mut record, namespace, &schema.kind)?;

    Ok(record)
}

/// A linked sequence whose elements each point at a nested full schema.
fn nested_schema_sequence(
    owner: &mut Record,
    ref_field: &str,
    label: &str,
    namespace: &str,
    schemas: &[DataSchema],
) -> Result<()> {
    let type_name = ty(namespace, "data_schemas_t");
    linked_sequence(owner, ref_field, label, &type_name, schemas, |schema, element| {
        let nested = schema_record(naming::child(&element.name, "value"), namespace, schema)?;
        element.add_ref("value", nested.name.clone());
        element.add_child(nested);
        Ok(())
    })
}

fn lower_kind(record: &mut Record, namespace: &str, kind: &SchemaKind) -> Result<()> {
    match kind {
        SchemaKind::None | SchemaKind::String | SchemaKind::Boolean | SchemaKind::Null => Ok(()),
        SchemaKind::Object { properties, required } => {
            let mut object =
                Record::new(ty(namespace, "object_schema_t"), naming::child(&record.name, "object"));
            let map_type = ty(namespace, "data_schema_map_t");
            linked_sequence(&mut object, "properties", "property", &map_type, properties, |(key, schema), element| {
                element.add_string("key", key);
                let nested = schema_record(naming::child(&element.name, "value"), namespace, schema)?;
                element.add_ref("value", nested.name.clone());
                element.add_child(nested);
                Ok(())
            })?;
            let required_type = ty(namespace, "object_required_t");
            linked_sequence(&mut object, "required", "required", &required_type, required, |value, element| {
                element.add_string("value", value);
                Ok(())
            })?;
            record.add_ref("schema", object.name.clone());
            record.add_child(object);
            Ok(())
        }
        SchemaKind::Array { items, min_items, max_items } => {
            let mut array =
                Record::new(ty(namespace, "array_schema_t"), naming::child(&record.name, "array"));
            nested_schema_sequence(&mut array, "items", "item", namespace, items)?;
            // Bounds live in const variables referenced by pointer, so an
            // absent bound stays a null pointer in the array schema.
            for (field, bound) in [("min_items", min_items), ("max_items", max_items)] {
                if let Some(bound) = bound {
                    let variable = Record::const_variable(
                        "uint32_t",
                        naming::child(&array.name, field),
                        *bound as i64,
                    );
                    array.add_ref(field, variable.name.clone());
                    array.add_child(variable);
                }
            }
            record.add_ref("schema", array.name.clone());
            record.add_child(array);
            Ok(())
        }
        SchemaKind::Number { minimum, maximum } => {
            let mut number =
                Record::new(ty(namespace, "number_schema_t"), naming::child(&record.name, "number"));
            if let Some(minimum) = minimum {
                number.add_field("minimum", FieldValue::Float(*minimum));
            }
            if let Some(maximum) = maximum {
                number.add_field("maximum", FieldValue::Float(*maximum));
            }
            record.add_ref("schema", number.name.clone());
            record.add_child(number);
            Ok(())
        }
        SchemaKind::Integer { minimum, maximum } => {
            let mut integer =
                Record::new(ty(namespace, "integer_schema_t"), naming::child(&record.name, "integer"));
            if let Some(minimum) = minimum {
                integer.add_field("minimum", FieldValue::Int(*minimum));
            }
            if let Some(maximum) = maximum {
                integer.add_field("maximum", FieldValue::Int(*maximum));
            }
            record.add_ref("schema", integer.name.clone());
            record.add_child(integer);
            Ok(())
        }
    }
}
