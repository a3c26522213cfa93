//! CoAP backend: turns affordance forms into a gcoap resource table and
//! assembles the complete generated C file around the lowered statics.

use std::collections::BTreeMap;

use tracing::debug;

use crate::emit;
use crate::error::{Result, WotError};
use crate::graph::RecordGraph;
use crate::model::{Form, FormOwner, Thing};

/// Headers every generated file pulls in, before any handler headers.
const DEFAULT_DEPENDENCIES: [&str; 10] = [
    "<stdint.h>",
    "<stdio.h>",
    "<stdlib.h>",
    "<string.h>",
    "\"net/gcoap.h\"",
    "\"od.h\"",
    "\"fmt.h\"",
    "\"net/wot.h\"",
    "\"net/wot/coap.h\"",
    "\"net/wot/coap/config.h\"",
];

const SEPARATOR: &str = "\n\n";

/// One entry of the generated resource table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoapResource {
    pub href: String,
    /// The application handler named by `riot_os:handler_function`.
    pub handler: String,
    /// Header declaring the handler, when the form names one.
    pub header_file: Option<String>,
    /// CoAP method constants, in the order the operations appeared.
    pub methods: Vec<&'static str>,
}

impl CoapResource {
    /// Name of the generated wrapper that delegates to the handler.
    pub fn wrapper_name(&self) -> String {
        let path: String = self
            .href
            .chars()
            .map(|c| if c == '/' || c == '-' { '_' } else { c })
            .collect();
        format!("wot{path}_handler")
    }
}

/// Collects the resource table from every affordance form and every
/// thing-level form, sorted by href.
///
/// An affordance form without operations contributes its owner's default
/// operations; thing-level forms must spell theirs out. Two forms may share
/// an href only when they agree on the handler and claim distinct methods.
pub fn collect_resources(thing: &Thing) -> Result<Vec<CoapResource>> {
    let mut by_href: BTreeMap<String, CoapResource> = BTreeMap::new();

    let foreach = |by_href: &mut BTreeMap<String, CoapResource>,
                   owner: FormOwner,
                   key: &str,
                   forms: &[Form]|
     -> Result<()> {
        for form in forms {
            add_form(by_href, owner, key, form)?;
        }
        Ok(())
    };

    for property in &thing.properties {
        foreach(&mut by_href, FormOwner::Property, &property.key, &property.interaction.forms)?;
    }
    for action in &thing.actions {
        foreach(&mut by_href, FormOwner::Action, &action.key, &action.interaction.forms)?;
    }
    for event in &thing.events {
        foreach(&mut by_href, FormOwner::Event, &event.key, &event.interaction.forms)?;
    }
    foreach(&mut by_href, FormOwner::Thing, "thing", &thing.forms)?;

    Ok(by_href.into_values().collect())
}

fn add_form(
    by_href: &mut BTreeMap<String, CoapResource>,
    owner: FormOwner,
    key: &str,
    form: &Form,
) -> Result<()> {
    let handler = form.handler_function.clone().ok_or_else(|| {
        crate::model::malformed(format!(
            "form '{}' of {} '{key}' names no riot_os:handler_function",
            form.href,
            owner.describe()
        ))
    })?;

    let operations: &[_] =
        if form.operations.is_empty() { owner.default_operations() } else { &form.operations };
    // Thing-level forms have no default operations to fall back on.
    if operations.is_empty() {
        return Err(crate::model::malformed(format!(
            "form '{}' of {} declares no op",
            form.href,
            owner.describe()
        )));
    }

    let resource = by_href.entry(form.href.clone()).or_insert_with(|| CoapResource {
        href: form.href.clone(),
        handler: handler.clone(),
        header_file: form.header_file.clone(),
        methods: Vec::new(),
    });
    if resource.handler != handler {
        return Err(WotError::ResourceConflict {
            href: form.href.clone(),
            reason: format!("handlers '{}' and '{handler}' both claim it", resource.handler),
        });
    }
    for operation in operations {
        let method = operation.coap_method();
        if resource.methods.contains(&method) {
            return Err(WotError::ResourceConflict {
                href: form.href.clone(),
                reason: format!("method {method} is mapped twice"),
            });
        }
        resource.methods.push(method);
    }
    Ok(())
}

/// Renders the complete C configuration file: includes, handler plumbing,
/// the gcoap listener, the lowered statics, and the CoAP init function.
pub fn generate(thing: &Thing, graph: &RecordGraph) -> Result<String> {
    let resources = collect_resources(thing)?;
    debug!(resources = resources.len(), "assembling CoAP configuration");

    let mut sections = vec![render_includes(&resources)];
    if let Some(externs) = render_externs(&resources) {
        sections.push(externs);
    }
    for resource in &resources {
        sections.push(render_wrapper(resource));
    }
    sections.push(render_resource_table(&resources));
    sections.push(render_link_params(&resources));
    sections.push(LINK_ENCODER.to_string());
    sections.push(LISTENER.to_string());
    sections.push(emit::render(graph));
    sections.push(render_init_function(graph));

    let mut out = sections.join(SEPARATOR);
    out.push('\n');
    Ok(out)
}

fn render_includes(resources: &[CoapResource]) -> String {
    let mut lines: Vec<String> =
        DEFAULT_DEPENDENCIES.iter().map(|header| format!("#include {header}")).collect();
    let mut seen = Vec::new();
    for resource in resources {
        if let Some(header) = &resource.header_file {
            if !seen.contains(header) {
                lines.push(format!("#include \"{header}\""));
                seen.push(header.clone());
            }
        }
    }
    lines.join("\n")
}

/// Forward declarations for handlers no included header declares.
fn render_externs(resources: &[CoapResource]) -> Option<String> {
    let mut lines = Vec::new();
    for resource in resources {
        if resource.header_file.is_none() {
            let line = format!(
                "extern ssize_t {}(coap_pkt_t *pdu, uint8_t *buf, size_t len, void *ctx);",
                resource.handler
            );
            if !lines.contains(&line) {
                lines.push(line);
            }
        }
    }
    if lines.is_empty() { None } else { Some(lines.join("\n")) }
}

fn render_wrapper(resource: &CoapResource) -> String {
    format!(
        "static ssize_t {}(coap_pkt_t *pdu, uint8_t *buf, size_t len, void *ctx)\n{{\n    return {}(pdu, buf, len, ctx);\n}}",
        resource.wrapper_name(),
        resource.handler
    )
}

fn render_resource_table(resources: &[CoapResource]) -> String {
    let mut lines = vec!["const coap_resource_t _wot_coap_resources[] = {".to_string()];
    for resource in resources {
        lines.push(format!(
            "    {{\"{}\", {}, {}, NULL}},",
            resource.href,
            resource.methods.join(" | "),
            resource.wrapper_name()
        ));
    }
    lines.push("};".to_string());
    lines.join("\n")
}

fn render_link_params(resources: &[CoapResource]) -> String {
    let mut lines = vec!["static const char *_wot_link_params[] = {".to_string()];
    for _ in resources {
        lines.push("    NULL,".to_string());
    }
    lines.push("};".to_string());
    lines.join("\n")
}

const LINK_ENCODER: &str = "\
static ssize_t _wot_encode_link(const coap_resource_t *resource, char *buf,
                                size_t maxlen, coap_link_encoder_ctx_t *context)
{
    ssize_t res = gcoap_encode_link(resource, buf, maxlen, context);
    if (res > 0) {
        if (_wot_link_params[context->link_pos] &&
            (strlen(_wot_link_params[context->link_pos]) < (maxlen - res))) {
            if (buf) {
                memcpy(buf + res, _wot_link_params[context->link_pos],
                       strlen(_wot_link_params[context->link_pos]));
            }
            res += strlen(_wot_link_params[context->link_pos]);
        }
    }

    return res;
}";

const LISTENER: &str = "\
static gcoap_listener_t _wot_coap_listener = {
    &_wot_coap_resources[0],
    ARRAY_SIZE(_wot_coap_resources),
    _wot_encode_link,
    NULL,
    NULL
};";

fn render_init_function(graph: &RecordGraph) -> String {
    format!(
        "int {}_coap_config_init({} *thing)\n{{\n    (void)thing;\n    gcoap_register_listener(&_wot_coap_listener);\n    return 0;\n}}",
        graph.namespace, graph.root.type_name
    )
}
