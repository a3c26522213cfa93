//! The record graph: the compiler's output representation.
//!
//! Every construct of the composed document becomes one [`Record`], an
//! immutable named static in the generated file. Repeated fields become
//! singly linked sequences of records, each element pointing at the next
//! through a `next` field and the last at `NULL`.
//!
//! A record owns the child records created while building it. The emitter
//! walks children in *reverse* creation order, depth first, so that every
//! record is emitted after the records it references. The root Thing record
//! comes out last.

pub mod naming;

/// A single field of a record initializer.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

/// The value assigned to a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A quoted C string literal.
    String(String),
    /// A bare token: an enum constant or `NULL`.
    Symbol(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A pointer to another record, rendered as `&name`.
    Ref(String),
}

/// How a record is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// A designated-initializer struct.
    Struct,
    /// A plain `const` scalar variable holding its value directly.
    ConstVariable,
}

/// One named static in the generated output.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    /// C type, e.g. `wot_td_form_t` or `uint32_t`.
    pub type_name: String,
    pub name: String,
    pub fields: Vec<Field>,
    /// Records created while building this one, in creation order.
    pub children: Vec<Record>,
}

impl Record {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Record {
        Record {
            kind: RecordKind::Struct,
            type_name: type_name.into(),
            name: name.into(),
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A `const` scalar, used for bounds referenced by pointer.
    pub fn const_variable(type_name: impl Into<String>, name: impl Into<String>, value: i64) -> Record {
        Record {
            kind: RecordKind::ConstVariable,
            type_name: type_name.into(),
            name: name.into(),
            fields: vec![Field { name: "value".into(), value: FieldValue::Int(value) }],
            children: Vec::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push(Field { name: name.into(), value });
    }

    pub fn add_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.add_field(name, FieldValue::String(value.into()));
    }

    /// Adds a string field only when a value is present.
    pub fn add_opt_string(&mut self, name: impl Into<String>, value: Option<&str>) {
        if let Some(value) = value {
            self.add_field(name, FieldValue::String(value.to_string()));
        }
    }

    pub fn add_symbol(&mut self, name: impl Into<String>, token: impl Into<String>) {
        self.add_field(name, FieldValue::Symbol(token.into()));
    }

    pub fn add_opt_bool(&mut self, name: impl Into<String>, value: Option<bool>) {
        if let Some(value) = value {
            self.add_field(name, FieldValue::Bool(value));
        }
    }

    pub fn add_ref(&mut self, name: impl Into<String>, target: impl Into<String>) {
        self.add_field(name, FieldValue::Ref(target.into()));
    }

    pub fn add_child(&mut self, child: Record) {
        self.children.push(child);
    }

    /// All records of this subtree in emission order: children before their
    /// parent, and among siblings the most recently created first.
    pub fn emission_order(&self) -> Vec<&Record> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Record>) {
        for child in self.children.iter().rev() {
            child.collect(out);
        }
        out.push(self);
    }
}

/// The compiled output: one root Thing record owning everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGraph {
    pub root: Record,
    /// Identifier prefix shared by all generated types and names.
    pub namespace: String,
}

impl RecordGraph {
    /// Records in emission order. The root is always last.
    pub fn records(&self) -> Vec<&Record> {
        self.root.emission_order()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_emit_reversed_and_before_parent() {
        let mut root = Record::new("wot_td_thing_t", "thing");
        let mut first = Record::new("wot_td_form_t", "thing_form_0");
        first.add_child(Record::new("wot_td_uri_t", "thing_form_0_href"));
        root.add_child(first);
        root.add_child(Record::new("wot_td_form_t", "thing_form_1"));

        let names: Vec<_> = root.emission_order().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["thing_form_1", "thing_form_0_href", "thing_form_0", "thing"]);
    }

    #[test]
    fn const_variable_holds_its_value() {
        let record = Record::const_variable("uint32_t", "schema_max_items", 8);
        assert_eq!(record.kind, RecordKind::ConstVariable);
        assert_eq!(record.fields[0].value, FieldValue::Int(8));
    }
}
