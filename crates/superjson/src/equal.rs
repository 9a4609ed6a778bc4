use std::collections::HashSet;

use crate::value::{Document, Node, NodeId, Value};

impl Document {
    /// Performs a deep equality check between `a` in this document and `b`
    /// in `other`.
    ///
    /// - Numbers compare like `Object.is`: `NaN` equals `NaN`, `0` and `-0`
    ///   differ.
    /// - Object fields compare regardless of order; arrays, map entries and
    ///   set members compare in order.
    /// - `undefined` fields count: `{a: undefined}` differs from `{}`.
    /// - Cycles are followed once; a pair of nodes already being compared is
    ///   assumed equal.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use superjson::Document;
    ///
    /// let a = Document::from_json(&json!({"foo": [1, 2, 3]}));
    /// let b = Document::from_json(&json!({"foo": [1, 2, 3]}));
    /// let c = Document::from_json(&json!({"foo": [1, 2, 4]}));
    ///
    /// assert_eq!(a, b);
    /// assert_ne!(a, c);
    /// ```
    pub fn deep_equal(&self, a: &Value, other: &Document, b: &Value) -> bool {
        let mut assumed = HashSet::new();
        equal(self, a, other, b, &mut assumed)
    }
}

fn equal(da: &Document, a: &Value, db: &Document, b: &Value, assumed: &mut HashSet<(NodeId, NodeId)>) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => {
            (a.is_nan() && b.is_nan()) || (a == b && a.is_sign_negative() == b.is_sign_negative())
        }
        (Value::String(a), Value::String(b)) => a == b,
        (Value::BigInt(a), Value::BigInt(b)) => a == b,
        (Value::Ref(ia), Value::Ref(ib)) => {
            if !assumed.insert((*ia, *ib)) {
                return true;
            }
            match (da.node_by_id(*ia), db.node_by_id(*ib)) {
                (Some(na), Some(nb)) => equal_nodes(da, na, db, nb, assumed),
                _ => false,
            }
        }

        // Different types are never equal
        _ => false,
    }
}

fn equal_nodes(da: &Document, a: &Node, db: &Document, b: &Node, assumed: &mut HashSet<(NodeId, NodeId)>) -> bool {
    match (a, b) {
        (Node::Object(fa), Node::Object(fb)) => {
            fa.len() == fb.len()
                && fa.iter().all(|(key, va)| match fb.iter().find(|(k, _)| k == key) {
                    Some((_, vb)) => equal(da, va, db, vb, assumed),
                    None => false,
                })
        }
        (Node::Array(xa), Node::Array(xb)) | (Node::Set(xa), Node::Set(xb)) => {
            xa.len() == xb.len() && xa.iter().zip(xb).all(|(va, vb)| equal(da, va, db, vb, assumed))
        }
        (Node::Map(ea), Node::Map(eb)) => {
            ea.len() == eb.len()
                && ea.iter().zip(eb).all(|((ka, va), (kb, vb))| {
                    equal(da, ka, db, kb, assumed) && equal(da, va, db, vb, assumed)
                })
        }
        (Node::Date(a), Node::Date(b)) => a == b,
        (Node::RegExp(a), Node::RegExp(b)) => a == b,
        (Node::Error(a), Node::Error(b)) => a == b,
        (Node::Url(a), Node::Url(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorObject;

    #[test]
    fn numbers_compare_like_object_is() {
        let mut a = Document::new();
        a.set_root(f64::NAN);
        let mut b = Document::new();
        b.set_root(f64::NAN);
        assert_eq!(a, b);

        a.set_root(0.0);
        b.set_root(-0.0);
        assert_ne!(a, b);
    }

    #[test]
    fn field_order_is_ignored_but_undefined_counts() {
        let mut a = Document::new();
        let root = a.new_object([("x", 1), ("y", 2)]);
        a.set_root(root);
        let mut b = Document::new();
        let root = b.new_object([("y", 2), ("x", 1)]);
        b.set_root(root);
        assert_eq!(a, b);

        let mut c = Document::new();
        let root = c.new_object([("x", Value::from(1)), ("y", Value::from(2)), ("z", Value::Undefined)]);
        c.set_root(root);
        assert_ne!(a, c);
    }

    #[test]
    fn cycles_terminate() {
        let build = |name: &str| {
            let mut doc = Document::new();
            let root = doc.new_object([("name", name)]);
            doc.set_field(&root, "self", root.clone());
            doc.set_root(root);
            doc
        };
        assert_eq!(build("a"), build("a"));
        assert_ne!(build("a"), build("b"));
    }

    #[test]
    fn leaves_compare_by_content() {
        let mut a = Document::new();
        let e = a.new_error(ErrorObject::with_name("TypeError", "x"));
        a.set_root(e);
        let mut b = Document::new();
        let e = b.new_error(ErrorObject::new("x"));
        b.set_root(e);
        assert_ne!(a, b);
    }
}
