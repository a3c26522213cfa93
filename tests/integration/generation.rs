//! Generated-output tests: record naming, emission ordering, and the
//! assembled C file.

use regex::Regex;
use serde_json::json;
use wotc::fetch::DefaultLoader;
use wotc::{coap, compile, emit, Compilation, CompileSettings, ComposeOptions};

fn sensor() -> serde_json::Value {
    json!({
        "@context": ["https://www.w3.org/2019/wot/td/v1", {"@language": "en"}],
        "@type": "saref:TemperatureSensor",
        "id": "urn:dev:ops/32473-WoTLamp-1234",
        "title": "Temperature Sensor",
        "created": "2021-04-03T12:30:01Z",
        "version": {"instance": "1.0.0"},
        "properties": {
            "temperature": {
                "title": "Room temperature",
                "type": "number",
                "minimum": -40.0,
                "maximum": 85.5,
                "unit": "celsius",
                "observable": true,
                "forms": [{
                    "op": "readproperty",
                    "href": "/temp",
                    "contentType": "application/json",
                    "riot_os:handler_function": "temp_handler"
                }]
            }
        },
        "actions": {
            "reset": {
                "idempotent": true,
                "input": {"type": "object", "properties": {"delay": {"type": "integer"}}},
                "forms": [{
                    "op": "invokeaction",
                    "href": "/reset",
                    "riot_os:handler_function": "reset_handler"
                }]
            }
        },
        "securityDefinitions": {"nosec_sc": {"scheme": "nosec"}},
        "security": "nosec_sc"
    })
}

fn compile_sensor() -> Compilation {
    compile(
        vec![(sensor(), None)],
        &ComposeOptions::default(),
        &DefaultLoader::new(),
        &CompileSettings::default(),
    )
    .unwrap()
}

#[test]
fn record_names_are_owner_qualified_and_deterministic() {
    let first = compile_sensor();
    let second = compile_sensor();
    let names = |c: &Compilation| -> Vec<String> {
        c.graph.records().iter().map(|r| r.name.clone()).collect()
    };
    assert_eq!(names(&first), names(&second));
    assert!(names(&first).contains(&"wot_td_thing_property_0_int_affordance_form_0_href".to_string()));
    assert!(names(&first).contains(&"wot_td_thing_action_0_input_object_property_0".to_string()));
}

#[test]
fn every_reference_points_at_an_earlier_static() {
    let compilation = compile_sensor();
    let output = emit::render(&compilation.graph);

    let definition = Regex::new(r"(?m)^(?:const )?\w+ (\w+) = ").unwrap();
    let reference = Regex::new(r"&(\w+)").unwrap();

    let mut defined = Vec::new();
    for line in output.lines() {
        for captures in reference.captures_iter(line) {
            let target = &captures[1];
            assert!(
                defined.iter().any(|name| name == target),
                "forward reference to {target}"
            );
        }
        if let Some(captures) = definition.captures(line) {
            defined.push(captures[1].to_string());
        }
    }
}

#[test]
fn init_function_closes_the_file() {
    let compilation = compile_sensor();
    let output = emit::render(&compilation.graph);
    let tail = output.rsplit("\n\n").next().unwrap();
    assert!(tail.starts_with("int wot_td_config_init(wot_td_thing_t *thing)"));
    assert!(tail.contains("thing->security_def = &wot_td_thing_security_definition_0;"));
    assert!(tail.trim_end().ends_with('}'));
}

#[test]
fn number_bounds_render_as_doubles() {
    let compilation = compile_sensor();
    let output = emit::render(&compilation.graph);
    assert!(output.contains(".minimum = -40.0,"));
    assert!(output.contains(".maximum = 85.5,"));
}

#[test]
fn coap_file_contains_handler_plumbing_for_each_resource() {
    let compilation = compile_sensor();
    let output = coap::generate(&compilation.thing, &compilation.graph).unwrap();

    assert!(output.contains("{\"/reset\", COAP_POST, wot_reset_handler, NULL},"));
    assert!(output.contains("{\"/temp\", COAP_GET, wot_temp_handler, NULL},"));
    // Sorted resource table: /reset before /temp.
    assert!(output.find("/reset").unwrap() < output.find("\"/temp\"").unwrap());
    assert!(output.contains("return temp_handler(pdu, buf, len, ctx);"));
    assert!(output.contains("gcoap_register_listener(&_wot_coap_listener);"));
    assert!(output.ends_with("}\n"));
}

#[test]
fn custom_namespace_prefixes_all_identifiers() {
    let compilation = compile(
        vec![(sensor(), None)],
        &ComposeOptions::default(),
        &DefaultLoader::new(),
        &CompileSettings { namespace: "app".to_string(), default_language: "en".to_string() },
    )
    .unwrap();
    let output = emit::render(&compilation.graph);
    assert!(output.contains("int app_config_init(app_thing_t *thing)"));
    assert!(output.contains("app_prop_affordance_t app_thing_property_0 = {"));
    assert!(!output.contains("wot_td_"));
}
