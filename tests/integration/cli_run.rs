//! Smoke tests for the installed binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn write_model(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("model.json");
    fs::write(
        &path,
        json!({
            "title": "{{THING_NAME}}",
            "properties": {
                "temperature": {
                    "type": "number",
                    "forms": [{
                        "op": "readproperty",
                        "href": "/temp",
                        "riot_os:handler_function": "temp_handler"
                    }]
                }
            },
            "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
            "security": "nosec_sc"
        })
        .to_string(),
    )
    .unwrap();
    path
}

#[test]
fn generates_a_c_file_from_a_model() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir);
    let placeholders = dir.path().join("placeholders.json");
    fs::write(&placeholders, json!({"THING_NAME": "Kitchen Sensor"}).to_string()).unwrap();
    let output = dir.path().join("wot_coap_config.c");

    Command::cargo_bin("wotc")
        .unwrap()
        .arg(&model)
        .arg("--placeholders")
        .arg(&placeholders)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let generated = fs::read_to_string(&output).unwrap();
    assert!(generated.contains("\"Kitchen Sensor\""));
    assert!(generated.contains("int wot_td_coap_config_init(wot_td_thing_t *thing)"));
}

#[test]
fn unresolved_placeholder_fails_with_its_name_in_context() {
    let dir = TempDir::new().unwrap();
    let model = write_model(&dir);

    Command::cargo_bin("wotc")
        .unwrap()
        .arg(&model)
        .arg("--output")
        .arg(dir.path().join("out.c"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unresolved placeholder"));
}

#[test]
fn missing_model_argument_is_a_usage_error() {
    Command::cargo_bin("wotc").unwrap().assert().failure().stderr(predicate::str::contains("Usage"));
}
