//! Security lowering: reference chains and definition records.

use crate::error::Result;
use crate::graph::{naming, Record};
use crate::lower::{linked_sequence, multilang_sequence, ty, type_sequence, uri_record};
use crate::model::{NameAndLocation, SchemeDetail, SecurityDefinition, SecurityScheme, Thing};

/// Maps security definition keys to the record names of their lowered
/// definitions, so reference chains can point at them.
pub(crate) struct SecurityIndex {
    owner: String,
    keys: Vec<String>,
}

impl SecurityIndex {
    pub(crate) fn new(owner: &str, thing: &Thing) -> SecurityIndex {
        SecurityIndex {
            owner: owner.to_string(),
            keys: thing.security_definitions.iter().map(|d| d.key.clone()).collect(),
        }
    }

    /// Record name of the definition registered under `key`. The validator
    /// has already rejected dangling references.
    pub(crate) fn definition_record(&self, key: &str) -> Result<String> {
        let position = self
            .keys
            .iter()
            .position(|k| k == key)
            .ok_or_else(|| crate::model::malformed(format!("no security definition named '{key}'")))?;
        Ok(naming::element(&self.owner, "security_definition", position))
    }
}

/// Lowers a list of security references into a chain of records pointing at
/// their definitions.
pub(crate) fn security_sequence(
    owner: &mut Record,
    ref_field: &str,
    namespace: &str,
    references: &[String],
    index: &SecurityIndex,
) -> Result<()> {
    let type_name = ty(namespace, "security_t");
    linked_sequence(owner, ref_field, "security", &type_name, references, |key, record| {
        record.add_string("key", key);
        record.add_ref("definition", index.definition_record(key)?);
        Ok(())
    })
}

/// Lowers `securityDefinitions` into the chain the thing's `security_def`
/// field points at. Called last while building the thing, so the reversed
/// emission puts these records first.
pub(crate) fn definition_sequence(
    root: &mut Record,
    namespace: &str,
    definitions: &[SecurityDefinition],
    index: &SecurityIndex,
) -> Result<()> {
    if definitions.is_empty() {
        return Ok(());
    }
    let owner_name = root.name.clone();
    root.add_ref("security_def", index.definition_record(&definitions[0].key)?);
    for (position, definition) in definitions.iter().enumerate() {
        let mut record = Record::new(
            ty(namespace, "security_definition_t"),
            naming::element(&owner_name, "security_definition", position),
        );
        record.add_string("key", &definition.key);
        scheme_child(&mut record, namespace, &definition.scheme)?;
        if position + 1 < definitions.len() {
            record.add_ref("next", naming::element(&owner_name, "security_definition", position + 1));
        } else {
            record.add_symbol("next", "NULL");
        }
        root.add_child(record);
    }
    Ok(())
}

fn scheme_child(owner: &mut Record, namespace: &str, scheme: &SecurityScheme) -> Result<()> {
    let mut record =
        Record::new(ty(namespace, "sec_scheme_t"), naming::child(&owner.name, "value"));
    record.add_symbol("scheme_type", scheme.scheme_type.c_value());
    type_sequence(&mut record, namespace, &scheme.types)?;
    multilang_sequence(
        &mut record,
        "descriptions",
        "description",
        namespace,
        scheme.descriptions.as_deref(),
    )?;
    if let Some(proxy) = &scheme.proxy {
        uri_record(&mut record, "proxy", namespace, proxy);
    }
    detail_child(&mut record, namespace, scheme)?;
    owner.add_ref("value", record.name.clone());
    owner.add_child(record);
    Ok(())
}

/// Lowers the scheme-specific parameters into a subtype record referenced
/// through the generic scheme's `scheme` field. `nosec` carries none.
fn detail_child(owner: &mut Record, namespace: &str, scheme: &SecurityScheme) -> Result<()> {
    if scheme.detail == SchemeDetail::NoSec {
        return Ok(());
    }
    let specifier = scheme.scheme_type.specifier();
    let mut record = Record::new(
        ty(namespace, &format!("{specifier}_sec_scheme_t")),
        naming::child(&owner.name, "scheme"),
    );

    match &scheme.detail {
        SchemeDetail::NoSec => unreachable!("handled above"),
        SchemeDetail::Basic(base) | SchemeDetail::ApiKey(base) => {
            name_and_location(&mut record, base);
        }
        SchemeDetail::Digest { base, qop } => {
            if let Some(qop) = qop {
                record.add_symbol("qop", qop.c_value());
            }
            name_and_location(&mut record, base);
        }
        SchemeDetail::Bearer { base, authorization, alg, format } => {
            if let Some(authorization) = authorization {
                uri_record(&mut record, "authorization", namespace, authorization);
            }
            record.add_opt_string("alg", alg.as_deref());
            record.add_opt_string("format", format.as_deref());
            name_and_location(&mut record, base);
        }
        SchemeDetail::Psk { identity } => {
            record.add_opt_string("identity", identity.as_deref());
        }
        SchemeDetail::OAuth2 { authorization, token, refresh, scopes, flow } => {
            if let Some(authorization) = authorization {
                uri_record(&mut record, "authorization", namespace, authorization);
            }
            if let Some(token) = token {
                uri_record(&mut record, "token", namespace, token);
            }
            if let Some(refresh) = refresh {
                uri_record(&mut record, "refresh", namespace, refresh);
            }
            let scope_type = ty(namespace, "auth_scopes_t");
            linked_sequence(&mut record, "scopes", "scope", &scope_type, scopes, |value, element| {
                element.add_string("value", value);
                Ok(())
            })?;
            record.add_opt_string("flow", flow.as_deref());
        }
    }

    owner.add_ref("scheme", record.name.clone());
    owner.add_child(record);
    Ok(())
}

fn name_and_location(record: &mut Record, base: &NameAndLocation) {
    record.add_opt_string("name", base.name.as_deref());
    record.add_symbol("in", base.location.c_value());
}
