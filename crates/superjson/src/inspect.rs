//! One-line, human-readable rendering in the style of Node's `util.inspect`.

use std::fmt::Write as _;

use crate::types::to_iso_string;
use crate::value::{Document, Node, NodeId, Value};

impl Document {
    /// Renders the root, e.g. `{ at: 2023-01-01T00:00:00.000Z, tags: Set(1) { 'a' } }`.
    ///
    /// A node that contains itself is shown as `[Circular]` at the point of
    /// recursion. Shared, non-cyclic nodes are printed at each occurrence.
    pub fn inspect(&self) -> String {
        self.inspect_value(self.root())
    }

    /// Renders any value of this document.
    pub fn inspect_value(&self, value: &Value) -> String {
        let mut out = String::new();
        let mut stack = Vec::new();
        self.write_value(&mut out, value, &mut stack);
        out
    }

    fn write_value(&self, out: &mut String, value: &Value, stack: &mut Vec<NodeId>) {
        match value {
            Value::Undefined => out.push_str("undefined"),
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => write_number(out, *n),
            Value::String(s) => write_quoted(out, s),
            Value::BigInt(b) => {
                let _ = write!(out, "{b}n");
            }
            Value::Ref(id) => match self.node_by_id(*id) {
                None => out.push_str("<dangling>"),
                Some(_) if stack.contains(id) => out.push_str("[Circular]"),
                Some(node) => {
                    stack.push(*id);
                    self.write_node(out, node, stack);
                    stack.pop();
                }
            },
        }
    }

    fn write_node(&self, out: &mut String, node: &Node, stack: &mut Vec<NodeId>) {
        match node {
            Node::Object(fields) => {
                self.write_braced(out, "", fields, stack, |doc, out, (key, value), stack| {
                    write_key(out, key);
                    out.push_str(": ");
                    doc.write_value(out, value, stack);
                });
            }
            Node::Array(items) => {
                if items.is_empty() {
                    out.push_str("[]");
                    return;
                }
                out.push_str("[ ");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_value(out, item, stack);
                }
                out.push_str(" ]");
            }
            Node::Map(entries) => {
                let prefix = format!("Map({}) ", entries.len());
                self.write_braced(out, &prefix, entries, stack, |doc, out, (key, value), stack| {
                    doc.write_value(out, key, stack);
                    out.push_str(" => ");
                    doc.write_value(out, value, stack);
                });
            }
            Node::Set(members) => {
                let prefix = format!("Set({}) ", members.len());
                self.write_braced(out, &prefix, members, stack, |doc, out, member, stack| {
                    doc.write_value(out, member, stack);
                });
            }
            Node::Date(d) => out.push_str(&to_iso_string(d)),
            Node::RegExp(r) => {
                let _ = write!(out, "{r}");
            }
            Node::Error(e) => {
                let _ = write!(out, "[{e}]");
                if !e.props.is_empty() {
                    out.push_str(" { ");
                    for (i, (key, value)) in e.props.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        write_key(out, key);
                        let _ = write!(out, ": {value}");
                    }
                    out.push_str(" }");
                }
            }
            Node::Url(u) => {
                out.push_str("URL { href: ");
                write_quoted(out, u.as_str());
                out.push_str(" }");
            }
        }
    }

    fn write_braced<T>(
        &self,
        out: &mut String,
        prefix: &str,
        items: &[T],
        stack: &mut Vec<NodeId>,
        write_item: impl Fn(&Self, &mut String, &T, &mut Vec<NodeId>),
    ) {
        out.push_str(prefix);
        if items.is_empty() {
            out.push_str("{}");
            return;
        }
        out.push_str("{ ");
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            write_item(self, out, item, stack);
        }
        out.push_str(" }");
    }
}

fn write_number(out: &mut String, n: f64) {
    if n.is_nan() {
        out.push_str("NaN");
    } else if n.is_infinite() {
        out.push_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    } else if n == 0.0 && n.is_sign_negative() {
        out.push_str("-0");
    } else {
        out.push_str(&crate::plain::js_number_text(n));
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('\'');
}

/// Identifier-like keys are printed bare, others quoted.
fn write_key(out: &mut String, key: &str) {
    let mut chars = key.chars();
    let identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier {
        out.push_str(key);
    } else {
        write_quoted(out, key);
    }
}
