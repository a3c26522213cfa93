//! Data schemas: the recursive value-description type.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::{
    as_object, get_bool, get_f64, get_i64, get_map, get_str, get_str_list, get_u64, multilang,
    unsupported,
};

/// The type-specific half of a data schema.
///
/// `None` is a real state, not an error: a schema without a `type` keyword
/// lowers with `JSON_TYPE_NONE` and no subtype record.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaKind {
    #[default]
    None,
    Object {
        properties: Vec<(String, DataSchema)>,
        required: Vec<String>,
    },
    Array {
        items: Vec<DataSchema>,
        min_items: Option<u64>,
        max_items: Option<u64>,
    },
    String,
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Boolean,
    Null,
}

impl SchemaKind {
    pub fn c_value(&self) -> &'static str {
        match self {
            SchemaKind::None => "JSON_TYPE_NONE",
            SchemaKind::Object { .. } => "JSON_TYPE_OBJECT",
            SchemaKind::Array { .. } => "JSON_TYPE_ARRAY",
            SchemaKind::String => "JSON_TYPE_STRING",
            SchemaKind::Number { .. } => "JSON_TYPE_NUMBER",
            SchemaKind::Integer { .. } => "JSON_TYPE_INTEGER",
            SchemaKind::Boolean => "JSON_TYPE_BOOLEAN",
            SchemaKind::Null => "JSON_TYPE_NULL",
        }
    }
}

/// A decoded data schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataSchema {
    pub types: Vec<String>,
    pub titles: Option<Vec<(String, String)>>,
    pub descriptions: Option<Vec<(String, String)>>,
    pub constant: Option<String>,
    pub unit: Option<String>,
    pub format: Option<String>,
    pub enumeration: Vec<String>,
    pub read_only: Option<bool>,
    pub write_only: Option<bool>,
    pub one_of: Vec<DataSchema>,
    pub kind: SchemaKind,
}

impl DataSchema {
    pub fn from_value(value: &Value, default_lang: &str) -> Result<DataSchema> {
        DataSchema::from_map(as_object(value, "data schema")?, default_lang)
    }

    pub fn from_map(map: &Map<String, Value>, default_lang: &str) -> Result<DataSchema> {
        let mut one_of = Vec::new();
        if let Some(alternatives) = map.get("oneOf") {
            let alternatives = alternatives
                .as_array()
                .ok_or_else(|| crate::model::malformed("'oneOf' must be a list".to_string()))?;
            for alternative in alternatives {
                one_of.push(DataSchema::from_value(alternative, default_lang)?);
            }
        }

        Ok(DataSchema {
            types: get_str_list(map, "@type")?,
            titles: multilang(map, "titles", "title", default_lang)?,
            descriptions: multilang(map, "descriptions", "description", default_lang)?,
            constant: get_str(map, "const")?,
            unit: get_str(map, "unit")?,
            format: get_str(map, "format")?,
            enumeration: get_str_list(map, "enum")?,
            read_only: get_bool(map, "readOnly")?,
            write_only: get_bool(map, "writeOnly")?,
            one_of,
            kind: SchemaKind::from_map(map, default_lang)?,
        })
    }
}

impl SchemaKind {
    fn from_map(map: &Map<String, Value>, default_lang: &str) -> Result<SchemaKind> {
        let Some(type_name) = get_str(map, "type")? else {
            return Ok(SchemaKind::None);
        };
        Ok(match type_name.as_str() {
            "object" => {
                let mut properties = Vec::new();
                if let Some(entries) = get_map(map, "properties")? {
                    for (key, value) in entries {
                        properties.push((key.clone(), DataSchema::from_value(value, default_lang)?));
                    }
                }
                SchemaKind::Object { properties, required: get_str_list(map, "required")? }
            }
            "array" => {
                let mut items = Vec::new();
                match map.get("items") {
                    None | Some(Value::Null) => {}
                    Some(Value::Array(list)) => {
                        for item in list {
                            items.push(DataSchema::from_value(item, default_lang)?);
                        }
                    }
                    Some(single) => items.push(DataSchema::from_value(single, default_lang)?),
                }
                SchemaKind::Array {
                    items,
                    min_items: get_u64(map, "minItems")?,
                    max_items: get_u64(map, "maxItems")?,
                }
            }
            "string" => SchemaKind::String,
            "number" => SchemaKind::Number {
                minimum: get_f64(map, "minimum")?,
                maximum: get_f64(map, "maximum")?,
            },
            "integer" => SchemaKind::Integer {
                minimum: get_i64(map, "minimum")?,
                maximum: get_i64(map, "maximum")?,
            },
            "boolean" => SchemaKind::Boolean,
            "null" => SchemaKind::Null,
            other => return Err(unsupported("type", other)),
        })
    }
}
