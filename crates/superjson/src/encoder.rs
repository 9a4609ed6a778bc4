//! Document → envelope.
//!
//! The encoder walks the graph depth-first. Containers (objects, arrays,
//! maps, sets) are descended into; maps are walked as arrays of `[key, value]`
//! pairs and sets as arrays of members. Every other node and every special
//! scalar is replaced by its JSON payload and gets a type tag at its path.
//!
//! Identity is tracked per [`NodeId`]: each path a node is reached from is
//! recorded, and nodes reached from more than one path become referential
//! equalities. Big integers and `NaN` are not primitives to superjson either;
//! they are tracked by value, so repeats of an equal value are equalities
//! too. A node that is already on the current descent path (a cycle) is
//! written as `null`.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::codec::SuperJsonOptions;
use crate::error::EncodeError;
use crate::meta::{Children, Envelope, EqualityPaths, Meta, ReferentialEqualities, TypeTag, TypeTree, FORMAT_VERSION};
use crate::path::{escape_key, stringify_path};
use crate::plain::js_number;
use crate::types::{to_iso_string, BigInt};
use crate::value::{Document, Node, NodeId, Value};

/// Keys that would reach `Object.prototype` on a JavaScript client.
pub(crate) const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// What referential equality is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Node(NodeId),
    BigInt(BigInt),
    NaN,
}

/// Result of walking one value.
#[derive(Debug, Clone)]
struct Walked {
    /// `None` for `undefined`, which is dropped from objects.
    json: Option<Json>,
    annotations: Option<TypeTree>,
}

impl Walked {
    fn plain(json: Json) -> Self {
        Self { json: Some(json), annotations: None }
    }

    fn tagged(json: Option<Json>, tag: TypeTag) -> Self {
        Self { json, annotations: Some(TypeTree::leaf(tag)) }
    }

    fn null() -> Self {
        Self::plain(Json::Null)
    }
}

/// Single-use encoder over one document.
pub struct Encoder<'a> {
    doc: &'a Document,
    options: &'a SuperJsonOptions,
    /// Every path each identity was reached from, in first-seen order.
    identities: IndexMap<Identity, Vec<Vec<String>>>,
    seen: HashMap<Identity, Walked>,
    /// Containers currently being descended into.
    ancestors: Vec<NodeId>,
}

impl<'a> Encoder<'a> {
    pub fn new(doc: &'a Document, options: &'a SuperJsonOptions) -> Self {
        Self {
            doc,
            options,
            identities: IndexMap::new(),
            seen: HashMap::new(),
            ancestors: Vec::new(),
        }
    }

    pub fn encode(mut self) -> Result<Envelope, EncodeError> {
        let doc = self.doc;
        let mut path = Vec::new();
        let walked = self.walk(doc.root(), &mut path, 0)?;

        let values = walked.annotations;
        let referential_equalities = self.equalities();
        let meta = (values.is_some() || referential_equalities.is_some()).then_some(Meta {
            values,
            referential_equalities,
            v: Some(FORMAT_VERSION),
        });
        Ok(Envelope { json: walked.json, meta })
    }

    // ----------------------------------------------------------------
    // Walk

    fn walk(&mut self, value: &'a Value, path: &mut Vec<String>, depth: usize) -> Result<Walked, EncodeError> {
        Ok(match value {
            Value::Undefined => Walked::tagged(None, TypeTag::Undefined),
            Value::Null => Walked::null(),
            Value::Bool(b) => Walked::plain(Json::Bool(*b)),
            Value::Number(n) if n.is_nan() => self.walk_by_value(Identity::NaN, path, || {
                Walked::tagged(Some(Json::String("NaN".to_string())), TypeTag::Number)
            }),
            Value::Number(n) => match special_number(*n) {
                Some(text) => Walked::tagged(Some(Json::String(text.to_string())), TypeTag::Number),
                None => Walked::plain(js_number(*n)),
            },
            Value::String(s) => Walked::plain(Json::String(s.clone())),
            Value::BigInt(b) => self.walk_by_value(Identity::BigInt(b.clone()), path, || {
                Walked::tagged(Some(Json::String(b.to_string())), TypeTag::BigInt)
            }),
            Value::Ref(id) => self.walk_node(*id, path, depth)?,
        })
    }

    /// Records `path` for `identity`; returns the earlier result if it was
    /// already walked (`null` under dedupe).
    fn revisit(&mut self, identity: &Identity, path: &[String]) -> Option<Walked> {
        self.identities.entry(identity.clone()).or_default().push(path.to_vec());
        let seen = self.seen.get(identity)?;
        Some(if self.options.dedupe { Walked::null() } else { seen.clone() })
    }

    fn walk_by_value(&mut self, identity: Identity, path: &[String], leaf: impl FnOnce() -> Walked) -> Walked {
        if let Some(walked) = self.revisit(&identity, path) {
            return walked;
        }
        let walked = leaf();
        self.seen.insert(identity, walked.clone());
        walked
    }

    fn walk_node(&mut self, id: NodeId, path: &mut Vec<String>, depth: usize) -> Result<Walked, EncodeError> {
        let identity = Identity::Node(id);
        if let Some(walked) = self.revisit(&identity, path) {
            return Ok(walked);
        }
        let doc = self.doc;
        let node = doc.node_by_id(id).ok_or(EncodeError::DanglingRef(id.index()))?;
        if !node.is_container() {
            let walked = self.leaf(node);
            self.seen.insert(identity, walked.clone());
            return Ok(walked);
        }
        if self.ancestors.contains(&id) {
            return Ok(Walked::null());
        }
        if depth >= self.options.max_depth {
            return Err(EncodeError::DepthExceeded(self.options.max_depth));
        }

        self.ancestors.push(id);
        let mut inner = Children::new();
        let (tag, json) = match node {
            Node::Object(fields) => {
                let mut out = serde_json::Map::new();
                for (key, v) in fields {
                    if FORBIDDEN_KEYS.contains(&key.as_str()) {
                        return Err(EncodeError::ForbiddenKey(key.clone()));
                    }
                    path.push(key.clone());
                    let walked = self.walk(v, path, depth + 1)?;
                    path.pop();
                    if let Some(json) = walked.json {
                        out.insert(key.clone(), json);
                    }
                    nest(&mut inner, key, walked.annotations);
                }
                (None, Json::Object(out))
            }
            Node::Array(items) => (None, self.walk_items(items, path, depth, &mut inner)?),
            Node::Set(members) => (Some(TypeTag::Set), self.walk_items(members, path, depth, &mut inner)?),
            Node::Map(entries) => {
                let mut out = Vec::with_capacity(entries.len());
                for (i, (k, v)) in entries.iter().enumerate() {
                    let index = i.to_string();
                    path.push(index.clone());
                    let walked = self.walk_entry(k, v, path, depth + 1)?;
                    path.pop();
                    out.push(walked.json.unwrap_or(Json::Null));
                    nest(&mut inner, &index, walked.annotations);
                }
                (Some(TypeTag::Map), Json::Array(out))
            }
            _ => unreachable!("leaf nodes are handled above"),
        };
        self.ancestors.pop();

        let annotations = match (tag, inner.is_empty()) {
            (tag, true) => tag.map(TypeTree::leaf),
            (Some(tag), false) => Some(TypeTree::Node { tag, children: Some(inner) }),
            (None, false) => Some(TypeTree::Paths(inner)),
        };
        let walked = Walked { json: Some(json), annotations };
        self.seen.insert(identity, walked.clone());
        Ok(walked)
    }

    fn walk_items(
        &mut self,
        items: &'a [Value],
        path: &mut Vec<String>,
        depth: usize,
        inner: &mut Children,
    ) -> Result<Json, EncodeError> {
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let index = i.to_string();
            path.push(index.clone());
            let walked = self.walk(item, path, depth + 1)?;
            path.pop();
            out.push(walked.json.unwrap_or(Json::Null));
            nest(inner, &index, walked.annotations);
        }
        Ok(Json::Array(out))
    }

    /// A map entry is written as the fresh pair array `[key, value]`.
    fn walk_entry(
        &mut self,
        key: &'a Value,
        value: &'a Value,
        path: &mut Vec<String>,
        depth: usize,
    ) -> Result<Walked, EncodeError> {
        let mut inner = Children::new();
        let mut pair = Vec::with_capacity(2);
        for (slot, v) in [("0", key), ("1", value)] {
            path.push(slot.to_string());
            let walked = self.walk(v, path, depth + 1)?;
            path.pop();
            pair.push(walked.json.unwrap_or(Json::Null));
            nest(&mut inner, slot, walked.annotations);
        }
        let annotations = (!inner.is_empty()).then_some(TypeTree::Paths(inner));
        Ok(Walked { json: Some(Json::Array(pair)), annotations })
    }

    fn leaf(&self, node: &Node) -> Walked {
        let (tag, json) = match node {
            Node::Date(d) => (TypeTag::Date, Json::String(to_iso_string(d))),
            Node::RegExp(r) => (TypeTag::RegExp, Json::String(r.to_string())),
            Node::Url(u) => (TypeTag::Url, Json::String(u.as_str().to_string())),
            Node::Error(e) => {
                let mut out = serde_json::Map::new();
                out.insert("name".to_string(), Json::String(e.name.clone()));
                out.insert("message".to_string(), Json::String(e.message.clone()));
                for prop in &self.options.allowed_error_props {
                    if let Some(v) = e.props.get(prop) {
                        out.insert(prop.clone(), v.clone());
                    }
                }
                (TypeTag::Error, Json::Object(out))
            }
            Node::Object(_) | Node::Array(_) | Node::Map(_) | Node::Set(_) => {
                unreachable!("containers are walked")
            }
        };
        Walked::tagged(Some(json), tag)
    }

    // ----------------------------------------------------------------
    // Referential equalities

    fn equalities(&mut self) -> Option<ReferentialEqualities> {
        let mut root = None;
        let mut others = EqualityPaths::new();
        for (_, mut paths) in self.identities.drain(..) {
            if paths.len() <= 1 {
                continue;
            }
            if !self.options.dedupe {
                // Stable: among equally short paths the first seen stays first.
                paths.sort_by_key(Vec::len);
            }
            let representative = paths.remove(0);
            let identical: Vec<String> = paths.iter().map(|p| stringify_path(p)).collect();
            if representative.is_empty() {
                root = Some(identical);
            } else {
                others.insert(stringify_path(&representative), identical);
            }
        }
        match root {
            Some(root) => Some(ReferentialEqualities::Rooted {
                root,
                others: (!others.is_empty()).then_some(others),
            }),
            None => (!others.is_empty()).then_some(ReferentialEqualities::Paths(others)),
        }
    }
}

/// Hoists a child's annotations into its parent's children map.
fn nest(inner: &mut Children, key: &str, annotations: Option<TypeTree>) {
    match annotations {
        Some(node @ TypeTree::Node { .. }) => {
            inner.insert(escape_key(key), node);
        }
        Some(TypeTree::Paths(children)) => {
            let prefix = escape_key(key);
            for (sub, tree) in children {
                inner.insert(format!("{prefix}.{sub}"), tree);
            }
        }
        None => {}
    }
}

/// Wire text for numbers JSON cannot carry.
fn special_number(n: f64) -> Option<&'static str> {
    if n.is_nan() {
        Some("NaN")
    } else if n == f64::INFINITY {
        Some("Infinity")
    } else if n == f64::NEG_INFINITY {
        Some("-Infinity")
    } else if n == 0.0 && n.is_sign_negative() {
        Some("-0")
    } else {
        None
    }
}
