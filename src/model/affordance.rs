//! Interaction affordances.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::model::{get_bool, get_map, get_str_list, multilang, DataSchema, Form, FormOwner};

/// Fields shared by every affordance kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InteractionAffordance {
    pub types: Vec<String>,
    pub titles: Option<Vec<(String, String)>>,
    pub descriptions: Option<Vec<(String, String)>>,
    pub forms: Vec<Form>,
    pub uri_variables: Vec<(String, DataSchema)>,
}

impl InteractionAffordance {
    fn from_map(
        map: &Map<String, Value>,
        owner: FormOwner,
        name: &str,
        default_lang: &str,
    ) -> Result<InteractionAffordance> {
        let raw_forms = match map.get("forms") {
            Some(Value::Array(forms)) => forms.as_slice(),
            Some(_) => {
                return Err(crate::model::malformed(format!("'forms' of '{name}' must be a list")));
            }
            None => &[],
        };
        if raw_forms.is_empty() {
            return Err(crate::model::malformed(format!(
                "affordance '{name}' has no forms"
            )));
        }
        let mut forms = Vec::with_capacity(raw_forms.len());
        for raw in raw_forms {
            forms.push(Form::from_value(raw, owner, name)?);
        }

        let mut uri_variables = Vec::new();
        if let Some(variables) = get_map(map, "uriVariables")? {
            for (key, value) in variables {
                uri_variables.push((key.clone(), DataSchema::from_value(value, default_lang)?));
            }
        }

        Ok(InteractionAffordance {
            types: get_str_list(map, "@type")?,
            titles: multilang(map, "titles", "title", default_lang)?,
            descriptions: multilang(map, "descriptions", "description", default_lang)?,
            forms,
            uri_variables,
        })
    }
}

/// A named property affordance. The affordance map doubles as the
/// property's data schema, so the whole map is decoded a second time as a
/// [`DataSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAffordance {
    pub key: String,
    pub observable: Option<bool>,
    pub data_schema: DataSchema,
    pub interaction: InteractionAffordance,
}

impl PropertyAffordance {
    pub fn from_value(key: &str, value: &Value, default_lang: &str) -> Result<PropertyAffordance> {
        let map = crate::model::as_object(value, key)?;
        Ok(PropertyAffordance {
            key: key.to_string(),
            observable: get_bool(map, "observable")?,
            data_schema: DataSchema::from_map(map, default_lang)?,
            interaction: InteractionAffordance::from_map(map, FormOwner::Property, key, default_lang)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionAffordance {
    pub key: String,
    pub safe: Option<bool>,
    pub idempotent: Option<bool>,
    pub input: Option<DataSchema>,
    pub output: Option<DataSchema>,
    pub interaction: InteractionAffordance,
}

impl ActionAffordance {
    pub fn from_value(key: &str, value: &Value, default_lang: &str) -> Result<ActionAffordance> {
        let map = crate::model::as_object(value, key)?;
        Ok(ActionAffordance {
            key: key.to_string(),
            safe: get_bool(map, "safe")?,
            idempotent: get_bool(map, "idempotent")?,
            input: optional_schema(map, "input", default_lang)?,
            output: optional_schema(map, "output", default_lang)?,
            interaction: InteractionAffordance::from_map(map, FormOwner::Action, key, default_lang)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventAffordance {
    pub key: String,
    pub subscription: Option<DataSchema>,
    pub data: Option<DataSchema>,
    pub cancellation: Option<DataSchema>,
    pub interaction: InteractionAffordance,
}

impl EventAffordance {
    pub fn from_value(key: &str, value: &Value, default_lang: &str) -> Result<EventAffordance> {
        let map = crate::model::as_object(value, key)?;
        Ok(EventAffordance {
            key: key.to_string(),
            subscription: optional_schema(map, "subscription", default_lang)?,
            data: optional_schema(map, "data", default_lang)?,
            cancellation: optional_schema(map, "cancellation", default_lang)?,
            interaction: InteractionAffordance::from_map(map, FormOwner::Event, key, default_lang)?,
        })
    }
}

fn optional_schema(
    map: &Map<String, Value>,
    field: &str,
    default_lang: &str,
) -> Result<Option<DataSchema>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => Ok(Some(DataSchema::from_value(raw, default_lang)?)),
    }
}
