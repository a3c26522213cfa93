//! Renders a record graph as C source.
//!
//! Each record becomes one static with a designated initializer, emitted in
//! the graph's emission order so every `&name` reference points at a static
//! defined earlier in the file. The root Thing record is rendered last, as
//! an init function that assigns its fields into a caller-provided struct.

use crate::graph::{FieldValue, Record, RecordGraph, RecordKind};

const SEPARATOR: &str = "\n\n";
const INDENT: &str = "    ";

/// Renders the whole graph: every record as a static, then the init
/// function for the root.
pub fn render(graph: &RecordGraph) -> String {
    let mut sections = Vec::new();
    let records = graph.records();
    for record in &records[..records.len() - 1] {
        sections.push(render_record(record));
    }
    sections.push(render_init_function(graph));
    sections.join(SEPARATOR)
}

/// Renders a single non-root record.
pub fn render_record(record: &Record) -> String {
    match record.kind {
        RecordKind::ConstVariable => {
            let value = record
                .fields
                .first()
                .map(|field| render_value(&field.value))
                .unwrap_or_else(|| "0".to_string());
            format!("const {} {} = {};", record.type_name, record.name, value)
        }
        RecordKind::Struct => {
            let mut lines = Vec::with_capacity(record.fields.len() + 2);
            lines.push(format!("{} {} = {{", record.type_name, record.name));
            for field in &record.fields {
                lines.push(format!("{INDENT}.{} = {},", field.name, render_value(&field.value)));
            }
            lines.push("};".to_string());
            lines.join("\n")
        }
    }
}

/// The init function filling a caller-provided thing struct from the
/// lowered statics.
fn render_init_function(graph: &RecordGraph) -> String {
    let root = &graph.root;
    let mut lines = Vec::with_capacity(root.fields.len() + 4);
    lines.push(format!("int {}_config_init({} *thing)", graph.namespace, root.type_name));
    lines.push("{".to_string());
    for field in &root.fields {
        lines.push(format!("{INDENT}thing->{} = {};", field.name, render_value(&field.value)));
    }
    lines.push(format!("{INDENT}return 0;"));
    lines.push("}".to_string());
    lines.join("\n")
}

fn render_value(value: &FieldValue) -> String {
    match value {
        FieldValue::String(text) => format!("\"{}\"", escape(text)),
        FieldValue::Symbol(token) => token.clone(),
        FieldValue::Bool(true) => "true".to_string(),
        FieldValue::Bool(false) => "false".to_string(),
        FieldValue::Int(number) => number.to_string(),
        // Debug formatting keeps a trailing ".0" on whole numbers, so the
        // literal stays a C double.
        FieldValue::Float(number) => format!("{number:?}"),
        FieldValue::Ref(target) => format!("&{target}"),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}
