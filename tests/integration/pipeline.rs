//! Composition pipeline tests driven through the public `compile` API.

use std::collections::BTreeMap;
use std::fs;

use serde_json::json;
use tempfile::TempDir;
use wotc::error::{Violation, WotError};
use wotc::fetch::{DefaultLoader, Locator};
use wotc::{compile, Compilation, CompileSettings, ComposeOptions};

fn compile_in_memory(model: serde_json::Value, options: &ComposeOptions) -> wotc::Result<Compilation> {
    compile(vec![(model, None)], options, &DefaultLoader::new(), &CompileSettings::default())
}

#[test]
fn extension_chain_resolves_across_files() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("base.json"),
        json!({
            "title": "Base Template",
            "links": [{"rel": "extends", "type": "application/td+json", "href": "sensor.json"}],
            "properties": {
                "temperature": {"forms": [{"op": "readproperty", "href": "/temp"}]}
            },
            "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
            "security": "nosec_sc"
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        dir.path().join("sensor.json"),
        json!({
            "description": "Inherited description",
            "properties": {
                "temperature": {"observable": true, "forms": [{"op": "readproperty", "href": "/temp"}]},
                "humidity": {"forms": [{"op": "readproperty", "href": "/hum"}]}
            }
        })
        .to_string(),
    )
    .unwrap();

    let locator = Locator::parse(dir.path().join("base.json").to_str().unwrap(), None);
    let loader = DefaultLoader::new();
    let model = wotc::TemplateLoader::load(&loader, &locator).unwrap();

    let compilation = compile(
        vec![(model, Some(locator))],
        &ComposeOptions::default(),
        &loader,
        &CompileSettings::default(),
    )
    .unwrap();

    // Base affordance adopted the extension's extra field, and the
    // extension's new affordance was appended after the base's.
    let keys: Vec<_> = compilation.thing.properties.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["temperature", "humidity"]);
    assert_eq!(compilation.thing.properties[0].observable, Some(true));
    assert!(compilation.document.links.is_empty(), "extends link must not survive");
}

#[test]
fn circular_extension_is_detected() {
    let dir = TempDir::new().unwrap();
    for (name, target) in [("a.json", "b.json"), ("b.json", "a.json")] {
        fs::write(
            dir.path().join(name),
            json!({
                "links": [{"rel": "extends", "type": "application/td+json", "href": target}],
                "securityDefinitions": {}
            })
            .to_string(),
        )
        .unwrap();
    }

    let locator = Locator::parse(dir.path().join("a.json").to_str().unwrap(), None);
    let loader = DefaultLoader::new();
    let model = wotc::TemplateLoader::load(&loader, &locator).unwrap();
    let err = compile(
        vec![(model, Some(locator))],
        &ComposeOptions::default(),
        &loader,
        &CompileSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, WotError::CircularExtension { .. }));
}

#[test]
fn placeholders_apply_to_model_and_metadata() {
    let options = ComposeOptions {
        meta: Some(json!({"id": "urn:dev:{{DEVICE_ID}}"})),
        bindings: None,
        placeholders: BTreeMap::from([
            ("THING_NAME".to_string(), "Kitchen Sensor".to_string()),
            ("DEVICE_ID".to_string(), "ops/32473".to_string()),
        ]),
    };
    let compilation = compile_in_memory(
        json!({
            "title": "{{THING_NAME}}",
            "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
            "security": "nosec_sc"
        }),
        &options,
    )
    .unwrap();
    assert_eq!(
        compilation.thing.titles,
        Some(vec![("en".to_string(), "Kitchen Sensor".to_string())])
    );
    assert_eq!(compilation.thing.id.as_deref(), Some("urn:dev:ops/32473"));
}

#[test]
fn unresolved_placeholder_aborts() {
    let err = compile_in_memory(
        json!({"title": "{{THING_NAME}}", "securityDefinitions": {}}),
        &ComposeOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, WotError::UnresolvedPlaceholder { .. }));
}

#[test]
fn bindings_attach_forms_to_affordances() {
    let options = ComposeOptions {
        meta: None,
        bindings: Some(json!({
            "properties": {
                "temperature": {
                    "forms": [{
                        "op": "readproperty",
                        "href": "/temp",
                        "contentType": "application/json",
                        "riot_os:handler_function": "temp_handler"
                    }]
                }
            }
        })),
        placeholders: BTreeMap::new(),
    };
    let compilation = compile_in_memory(
        json!({
            "properties": {"temperature": {"type": "number"}},
            "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
            "security": "nosec_sc"
        }),
        &options,
    )
    .unwrap();
    let form = &compilation.thing.properties[0].interaction.forms[0];
    assert_eq!(form.href, "/temp");
    assert_eq!(form.handler_function.as_deref(), Some("temp_handler"));
}

#[test]
fn missing_security_definitions_default_to_nosec() {
    let compilation = compile_in_memory(
        json!({
            "title": "Bare Thing",
            "security": "will_be_replaced",
            "securityDefinitions": {}
        }),
        &ComposeOptions::default(),
    )
    .unwrap();
    assert_eq!(compilation.thing.security, vec!["nosec_sc".to_string()]);
    assert_eq!(compilation.thing.security_definitions[0].key, "nosec_sc");
}

#[test]
fn validation_reports_every_violation_at_once() {
    let err = compile_in_memory(
        json!({
            "properties": {
                "temperature": {"forms": [{"op": "readproperty", "href": "/t", "security": "ghost"}]}
            },
            "actions": {
                "temperature": {"forms": [{"op": "invokeaction", "href": "/t2"}]}
            },
            "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
            "security": ["nosec_sc", "also_ghost"]
        }),
        &ComposeOptions::default(),
    )
    .unwrap_err();

    let WotError::ValidationFailed { violations } = err else {
        panic!("expected validation failure, got {err}");
    };
    assert!(violations.iter().any(|v| matches!(v, Violation::UnknownSecurityReference { name, .. } if name == "ghost")));
    assert!(violations.iter().any(|v| matches!(v, Violation::UnknownSecurityReference { name, .. } if name == "also_ghost")));
    assert!(violations.iter().any(|v| matches!(v, Violation::DuplicateAffordanceName { name, .. } if name == "temperature")));
}

#[test]
fn multiple_models_merge_first_wins() {
    let compilation = compile(
        vec![
            (
                json!({
                    "title": "Primary",
                    "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
                    "security": "nosec_sc"
                }),
                None,
            ),
            (
                json!({
                    "title": "Secondary",
                    "support": "mailto:ops@example.org",
                    "securityDefinitions": {}
                }),
                None,
            ),
        ],
        &ComposeOptions::default(),
        &DefaultLoader::new(),
        &CompileSettings::default(),
    )
    .unwrap();
    assert_eq!(compilation.thing.titles, Some(vec![("en".to_string(), "Primary".to_string())]));
    assert_eq!(compilation.thing.support.as_deref(), Some("mailto:ops@example.org"));
}
