//! Forms and the enumerated vocabularies they reference.

use serde_json::Value;

use crate::error::Result;
use crate::model::{as_object, get_str, get_str_list, unsupported};

/// What owns a form. Decides which operation types the form may carry and
/// which operations are assumed when none are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOwner {
    Thing,
    Property,
    Action,
    Event,
}

impl FormOwner {
    pub fn describe(self) -> &'static str {
        match self {
            FormOwner::Thing => "thing",
            FormOwner::Property => "property",
            FormOwner::Action => "action",
            FormOwner::Event => "event",
        }
    }

    /// Operations a form of this owner may declare.
    pub fn allowed_operations(self) -> &'static [Operation] {
        match self {
            FormOwner::Thing => &[
                Operation::ReadAllProperties,
                Operation::WriteAllProperties,
                Operation::ReadMultipleProperties,
                Operation::WriteMultipleProperties,
            ],
            FormOwner::Property => &[
                Operation::ReadProperty,
                Operation::WriteProperty,
                Operation::ObserveProperty,
                Operation::UnobserveProperty,
            ],
            FormOwner::Action => &[Operation::InvokeAction],
            FormOwner::Event => &[Operation::SubscribeEvent, Operation::UnsubscribeEvent],
        }
    }

    /// Operations assumed for a form that declares none. Thing-level forms
    /// have no default and must be explicit.
    pub fn default_operations(self) -> &'static [Operation] {
        match self {
            FormOwner::Thing => &[],
            FormOwner::Property => &[Operation::ReadProperty, Operation::WriteProperty],
            FormOwner::Action => &[Operation::InvokeAction],
            FormOwner::Event => &[Operation::SubscribeEvent],
        }
    }
}

/// WoT interaction operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadProperty,
    WriteProperty,
    ObserveProperty,
    UnobserveProperty,
    InvokeAction,
    SubscribeEvent,
    UnsubscribeEvent,
    ReadAllProperties,
    WriteAllProperties,
    ReadMultipleProperties,
    WriteMultipleProperties,
}

impl Operation {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "readproperty" => Operation::ReadProperty,
            "writeproperty" => Operation::WriteProperty,
            "observeproperty" => Operation::ObserveProperty,
            "unobserveproperty" => Operation::UnobserveProperty,
            "invokeaction" => Operation::InvokeAction,
            "subscribeevent" => Operation::SubscribeEvent,
            "unsubscribeevent" => Operation::UnsubscribeEvent,
            "readallproperties" => Operation::ReadAllProperties,
            "writeallproperties" => Operation::WriteAllProperties,
            "readmultipleproperties" => Operation::ReadMultipleProperties,
            "writemultipleproperties" => Operation::WriteMultipleProperties,
            other => return Err(unsupported("op", other)),
        })
    }

    pub fn c_value(self) -> &'static str {
        match self {
            Operation::ReadProperty => "FORM_OP_READ_PROPERTY",
            Operation::WriteProperty => "FORM_OP_WRITE_PROPERTY",
            Operation::ObserveProperty => "FORM_OP_OBSERVE_PROPERTY",
            Operation::UnobserveProperty => "FORM_OP_UNOBSERVE_PROPERTY",
            Operation::InvokeAction => "FORM_OP_INVOKE_ACTION",
            Operation::SubscribeEvent => "FORM_OP_SUBSCRIBE_EVENT",
            Operation::UnsubscribeEvent => "FORM_OP_UNSUBSCRIBE_EVENT",
            Operation::ReadAllProperties => "FORM_OP_READ_ALL_PROPERTIES",
            Operation::WriteAllProperties => "FORM_OP_WRITE_ALL_PROPERTIES",
            Operation::ReadMultipleProperties => "FORM_OP_READ_MULTIPLE_PROPERTIES",
            Operation::WriteMultipleProperties => "FORM_OP_WRITE_MULTIPLE_PROPERTIES",
        }
    }

    /// CoAP request method serving this operation.
    pub fn coap_method(self) -> &'static str {
        match self {
            Operation::WriteProperty
            | Operation::WriteAllProperties
            | Operation::WriteMultipleProperties => "COAP_PUT",
            Operation::InvokeAction => "COAP_POST",
            _ => "COAP_GET",
        }
    }
}

/// Media types with a C constant. Anything else in a form's `contentType`
/// is rejected while lowering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    TextPlain,
    JsonLd,
    Csv,
}

impl MediaType {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "application/json" => MediaType::Json,
            "text/plain" => MediaType::TextPlain,
            "application/ld+json" => MediaType::JsonLd,
            "text/comma-separated-values" => MediaType::Csv,
            other => return Err(unsupported("contentType", other)),
        })
    }

    pub fn c_value(self) -> &'static str {
        match self {
            MediaType::Json => "MEDIA_TYPE_JSON",
            MediaType::TextPlain => "MEDIA_TYPE_TEXT_PLAIN",
            MediaType::JsonLd => "MEDIA_TYPE_JSON_LD",
            MediaType::Csv => "MEDIA_TYPE_CSV",
        }
    }
}

/// HTTP-style content codings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Gzip,
    Compress,
    Deflate,
    Identity,
    Brotli,
}

impl ContentCoding {
    pub fn parse(value: &str) -> Result<Self> {
        Ok(match value {
            "gzip" => ContentCoding::Gzip,
            "compress" => ContentCoding::Compress,
            "deflate" => ContentCoding::Deflate,
            "identity" => ContentCoding::Identity,
            "br" => ContentCoding::Brotli,
            other => return Err(unsupported("contentCoding", other)),
        })
    }

    pub fn c_value(self) -> &'static str {
        match self {
            ContentCoding::Gzip => "CONTENT_ENCODING_GZIP",
            ContentCoding::Compress => "CONTENT_ENCODING_COMPRESS",
            ContentCoding::Deflate => "CONTENT_ENCODING_DEFLATE",
            ContentCoding::Identity => "CONTENT_ENCODING_IDENTITY",
            ContentCoding::Brotli => "CONTENT_ENCODING_BROTLI",
        }
    }
}

/// A parsed `contentType` value: media type plus `key=value` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    pub media_type: MediaType,
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    pub fn parse(value: &str) -> Result<Self> {
        let mut segments = value.split(';').map(str::trim);
        let media_type = MediaType::parse(segments.next().unwrap_or_default())?;
        let mut parameters = Vec::new();
        for segment in segments {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                crate::model::malformed(format!("content type parameter '{segment}' has no value"))
            })?;
            parameters.push((key.to_string(), value.to_string()));
        }
        Ok(ContentType { media_type, parameters })
    }
}

/// The response a consumer should expect after an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedResponse {
    pub content_type: Option<ContentType>,
}

/// An interaction form.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub operations: Vec<Operation>,
    pub href: String,
    pub content_type: Option<ContentType>,
    pub content_coding: Option<ContentCoding>,
    pub subprotocol: Option<String>,
    pub security: Vec<String>,
    pub scopes: Vec<String>,
    pub response: Option<ExpectedResponse>,
    /// Name of the resource handler, from `riot_os:handler_function`.
    pub handler_function: Option<String>,
    /// Header declaring the handler, from `riot_os:header_file`.
    pub header_file: Option<String>,
}

impl Form {
    /// Decodes a form, enforcing the mandatory `href` and the operation
    /// vocabulary permitted for its owner.
    pub fn from_value(value: &Value, owner: FormOwner, owner_name: &str) -> Result<Form> {
        let map = as_object(value, "form")?;

        let href = get_str(map, "href")?
            .ok_or_else(|| crate::error::WotError::MissingFormHref { owner: owner_name.to_string() })?;

        let mut operations = Vec::new();
        for op in get_str_list(map, "op")? {
            let operation = Operation::parse(&op)?;
            if !owner.allowed_operations().contains(&operation) {
                return Err(unsupported(&format!("op ({} form)", owner.describe()), &op));
            }
            operations.push(operation);
        }

        let content_type = match get_str(map, "contentType")? {
            Some(raw) => Some(ContentType::parse(&raw)?),
            None => None,
        };
        let content_coding = match get_str(map, "contentCoding")? {
            Some(raw) => Some(ContentCoding::parse(&raw)?),
            None => None,
        };

        let response = match map.get("response") {
            None | Some(Value::Null) => None,
            Some(raw) => {
                let response_map = as_object(raw, "response")?;
                let content_type = match get_str(response_map, "contentType")? {
                    Some(raw) => Some(ContentType::parse(&raw)?),
                    None => None,
                };
                Some(ExpectedResponse { content_type })
            }
        };

        Ok(Form {
            operations,
            href,
            content_type,
            content_coding,
            subprotocol: get_str(map, "subprotocol")?,
            security: get_str_list(map, "security")?,
            scopes: get_str_list(map, "scopes")?,
            response,
            handler_function: get_str(map, "riot_os:handler_function")?,
            header_file: get_str(map, "riot_os:header_file")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_a_full_form() {
        let form = Form::from_value(
            &json!({
                "op": ["readproperty", "observeproperty"],
                "href": "coap://[::1]/temp",
                "contentType": "application/json; charset=utf-8",
                "contentCoding": "br",
                "subprotocol": "longpoll",
                "response": {"contentType": "text/plain"},
                "riot_os:handler_function": "temp_handler"
            }),
            FormOwner::Property,
            "temperature",
        )
        .unwrap();

        assert_eq!(form.operations, vec![Operation::ReadProperty, Operation::ObserveProperty]);
        assert_eq!(form.content_type.as_ref().unwrap().media_type, MediaType::Json);
        assert_eq!(
            form.content_type.unwrap().parameters,
            vec![("charset".to_string(), "utf-8".to_string())]
        );
        assert_eq!(form.content_coding, Some(ContentCoding::Brotli));
        assert_eq!(form.response.unwrap().content_type.unwrap().media_type, MediaType::TextPlain);
        assert_eq!(form.handler_function.as_deref(), Some("temp_handler"));
    }

    #[test]
    fn missing_href_is_fatal() {
        let err = Form::from_value(&json!({"op": "invokeaction"}), FormOwner::Action, "toggle")
            .unwrap_err();
        assert!(matches!(err, crate::error::WotError::MissingFormHref { owner } if owner == "toggle"));
    }

    #[test]
    fn operation_must_match_owner() {
        let err = Form::from_value(
            &json!({"op": "invokeaction", "href": "/temp"}),
            FormOwner::Property,
            "temperature",
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::WotError::UnsupportedFieldValue { .. }));
    }

    #[test]
    fn unknown_media_type_is_rejected() {
        let err = ContentType::parse("application/cbor").unwrap_err();
        assert!(matches!(err, crate::error::WotError::UnsupportedFieldValue { value, .. } if value == "application/cbor"));
    }

    #[test]
    fn write_operations_map_to_put() {
        assert_eq!(Operation::WriteProperty.coap_method(), "COAP_PUT");
        assert_eq!(Operation::InvokeAction.coap_method(), "COAP_POST");
        assert_eq!(Operation::SubscribeEvent.coap_method(), "COAP_GET");
    }
}
