//! Envelope → document.
//!
//! Decoding runs in three passes:
//!
//! 1. `json` is imported as a plain tree, one fresh node per object/array;
//! 2. `meta.values` is applied, children before parents, so a map's pair
//!    entries are revived while the map is still a plain array of pairs;
//! 3. `meta.referentialEqualities` re-links shared and cyclic references.

use serde_json::Value as Json;
use url::Url;

use crate::codec::DEFAULT_MAX_DEPTH;
use crate::encoder::FORBIDDEN_KEYS;
use crate::error::DecodeError;
use crate::meta::{Envelope, EqualityPaths, ReferentialEqualities, TypeTag, TypeTree};
use crate::path::{parse_path, stringify_path};
use crate::types::{parse_iso_string, ErrorObject, RegExp};
use crate::value::{insert_entry, insert_member, Document, Node, NodeId, Value};

/// A writable location in the document.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Root,
    Field(NodeId, String),
    Index(NodeId, usize),
    SetMember(NodeId, usize),
    MapKey(NodeId, usize),
    MapValue(NodeId, usize),
}

/// Single-use decoder over one envelope.
pub struct Decoder<'a> {
    envelope: &'a Envelope,
    legacy: bool,
    max_depth: usize,
    doc: Document,
}

impl<'a> Decoder<'a> {
    pub fn new(envelope: &'a Envelope) -> Self {
        let legacy = envelope.meta.as_ref().is_some_and(|m| m.legacy_paths());
        Self {
            envelope,
            legacy,
            max_depth: DEFAULT_MAX_DEPTH,
            doc: Document::new(),
        }
    }

    /// Limits container nesting in `json`, as the encoder does.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn decode(mut self) -> Result<Document, DecodeError> {
        let envelope = self.envelope;
        let root = match &envelope.json {
            Some(json) if nested_deeper(json, self.max_depth) => {
                return Err(DecodeError::DepthExceeded(self.max_depth));
            }
            Some(json) => self.doc.import_json(json),
            None => Value::Undefined,
        };
        self.doc.set_root(root);

        if let Some(meta) = &envelope.meta {
            if let Some(values) = &meta.values {
                self.apply_tree(values, &[])?;
            }
            if let Some(equalities) = &meta.referential_equalities {
                self.apply_equalities(equalities)?;
            }
        }
        Ok(self.doc)
    }

    // ----------------------------------------------------------------
    // Value annotations

    fn apply_tree(&mut self, tree: &TypeTree, origin: &[String]) -> Result<(), DecodeError> {
        let (tag, children) = match tree {
            TypeTree::Node { tag, children } => (Some(tag), children.as_ref()),
            TypeTree::Paths(children) => (None, Some(children)),
        };
        for (key, child) in children.into_iter().flatten() {
            let mut path = origin.to_vec();
            path.extend(parse_path(key, self.legacy)?);
            self.apply_tree(child, &path)?;
        }
        if let Some(tag) = tag {
            let slot = self.resolve(origin)?;
            let current = self.read(&slot)?;
            let revived = self.revive(tag, current, origin)?;
            self.write(&slot, revived)?;
        }
        Ok(())
    }

    fn revive(&mut self, tag: &TypeTag, current: Value, path: &[String]) -> Result<Value, DecodeError> {
        let invalid = || DecodeError::InvalidPayload {
            tag: tag.to_string(),
            path: stringify_path(path),
        };
        match tag {
            TypeTag::Undefined => Ok(Value::Undefined),
            TypeTag::BigInt => {
                let text = current.as_str().ok_or_else(invalid)?;
                Ok(Value::BigInt(text.parse()?))
            }
            TypeTag::Number => {
                let text = current.as_str().ok_or_else(invalid)?;
                revive_number(text).map(Value::Number).ok_or_else(invalid)
            }
            TypeTag::Date => {
                let text = current.as_str().ok_or_else(invalid)?;
                let date = parse_iso_string(text)?;
                Ok(self.doc.new_date(date))
            }
            TypeTag::RegExp => {
                let regexp: RegExp = current.as_str().ok_or_else(invalid)?.parse()?;
                Ok(self.doc.new_regexp(regexp))
            }
            TypeTag::Url => {
                let text = current.as_str().ok_or_else(invalid)?;
                let url = Url::parse(text).map_err(|source| DecodeError::InvalidUrl {
                    input: text.to_string(),
                    source,
                })?;
                Ok(self.doc.new_url(url))
            }
            TypeTag::Error => {
                let id = current.node_id().ok_or_else(invalid)?;
                let Some(Node::Object(fields)) = self.doc.node_by_id(id) else {
                    return Err(invalid());
                };
                let mut error = ErrorObject::new("");
                for (key, value) in fields {
                    match (key.as_str(), value) {
                        ("name", Value::String(name)) => error.name = name.clone(),
                        ("message", Value::String(message)) => error.message = message.clone(),
                        (key, value) => {
                            let json = self.doc.plain(value, &mut Vec::new()).map_err(|_| invalid())?;
                            error.props.insert(key.to_string(), json.unwrap_or(Json::Null));
                        }
                    }
                }
                self.replace(id, Node::Error(error));
                Ok(current)
            }
            TypeTag::Set => {
                let id = current.node_id().ok_or_else(invalid)?;
                let Some(Node::Array(items)) = self.doc.node_by_id(id) else {
                    return Err(invalid());
                };
                let mut members = Vec::with_capacity(items.len());
                for item in items {
                    insert_member(&mut members, item.clone());
                }
                self.replace(id, Node::Set(members));
                Ok(current)
            }
            TypeTag::Map => {
                let id = current.node_id().ok_or_else(invalid)?;
                let Some(Node::Array(rows)) = self.doc.node_by_id(id) else {
                    return Err(invalid());
                };
                let mut entries = Vec::with_capacity(rows.len());
                for row in rows {
                    let Some(Node::Array(pair)) = self.doc.node(row) else {
                        return Err(invalid());
                    };
                    let key = pair.first().cloned().unwrap_or_default();
                    let value = pair.get(1).cloned().unwrap_or_default();
                    insert_entry(&mut entries, key, value);
                }
                self.replace(id, Node::Map(entries));
                Ok(current)
            }
            TypeTag::Class(_) | TypeTag::Symbol(_) | TypeTag::Custom(_) => {
                Err(DecodeError::UnsupportedType(tag.to_json().to_string()))
            }
        }
    }

    fn replace(&mut self, id: NodeId, node: Node) {
        if let Some(slot) = self.doc.node_by_id_mut(id) {
            *slot = node;
        }
    }

    // ----------------------------------------------------------------
    // Referential equalities

    fn apply_equalities(&mut self, equalities: &ReferentialEqualities) -> Result<(), DecodeError> {
        match equalities {
            ReferentialEqualities::Paths(paths) => self.apply_equality_paths(paths),
            ReferentialEqualities::Rooted { root, others } => {
                for path in root {
                    let slot = self.resolve(&parse_path(path, self.legacy)?)?;
                    let root = self.doc.root().clone();
                    self.write(&slot, root)?;
                }
                match others {
                    Some(paths) => self.apply_equality_paths(paths),
                    None => Ok(()),
                }
            }
        }
    }

    fn apply_equality_paths(&mut self, paths: &EqualityPaths) -> Result<(), DecodeError> {
        for (representative, identical) in paths {
            let slot = self.resolve(&parse_path(representative, self.legacy)?)?;
            let object = self.read(&slot)?;
            for path in identical {
                let slot = self.resolve(&parse_path(path, self.legacy)?)?;
                self.write(&slot, object.clone())?;
            }
        }
        Ok(())
    }

    // ----------------------------------------------------------------
    // Path navigation

    fn resolve(&self, path: &[String]) -> Result<Slot, DecodeError> {
        if let Some(key) = path.iter().find(|k| FORBIDDEN_KEYS.contains(&k.as_str())) {
            return Err(DecodeError::ForbiddenKey(key.clone()));
        }
        let not_found = || DecodeError::PathNotFound(stringify_path(path));
        let index = |segment: &str| segment.parse::<usize>().map_err(|_| not_found());

        let mut current = self.doc.root();
        let mut i = 0;
        while i < path.len() {
            let id = current.node_id().ok_or_else(not_found)?;
            let node = self.doc.node_by_id(id).ok_or_else(not_found)?;
            let segment = path[i].as_str();
            let last = i + 1 == path.len();
            current = match node {
                Node::Object(fields) => {
                    if last {
                        return Ok(Slot::Field(id, segment.to_string()));
                    }
                    fields.iter().find(|(k, _)| k == segment).map(|(_, v)| v).ok_or_else(not_found)?
                }
                Node::Array(items) => {
                    let n = index(segment)?;
                    let item = items.get(n).ok_or_else(not_found)?;
                    if last {
                        return Ok(Slot::Index(id, n));
                    }
                    item
                }
                Node::Set(members) => {
                    let n = index(segment)?;
                    let member = members.get(n).ok_or_else(not_found)?;
                    if last {
                        return Ok(Slot::SetMember(id, n));
                    }
                    member
                }
                Node::Map(entries) => {
                    // A row is addressed as `row.0` (key) or `row.1` (value).
                    let row = index(segment)?;
                    let (key, value) = entries.get(row).ok_or_else(not_found)?;
                    let side = path.get(i + 1).ok_or_else(not_found)?;
                    i += 1;
                    let last = i + 1 == path.len();
                    match (side.as_str(), last) {
                        ("0", true) => return Ok(Slot::MapKey(id, row)),
                        ("1", true) => return Ok(Slot::MapValue(id, row)),
                        ("0", false) => key,
                        ("1", false) => value,
                        _ => return Err(not_found()),
                    }
                }
                _ => return Err(not_found()),
            };
            i += 1;
        }
        Ok(Slot::Root)
    }

    fn read(&self, slot: &Slot) -> Result<Value, DecodeError> {
        let missing = || DecodeError::PathNotFound(format!("{slot:?}"));
        let value = match slot {
            Slot::Root => return Ok(self.doc.root().clone()),
            Slot::Field(id, key) => {
                return match self.doc.node_by_id(*id) {
                    // An absent field reads as `undefined`.
                    Some(Node::Object(fields)) => Ok(fields
                        .iter()
                        .find(|(k, _)| k == key)
                        .map_or(Value::Undefined, |(_, v)| v.clone())),
                    _ => Err(missing()),
                };
            }
            Slot::Index(id, n) | Slot::SetMember(id, n) => match self.doc.node_by_id(*id) {
                Some(Node::Array(items) | Node::Set(items)) => items.get(*n),
                _ => None,
            },
            Slot::MapKey(id, n) => match self.doc.node_by_id(*id) {
                Some(Node::Map(entries)) => entries.get(*n).map(|(k, _)| k),
                _ => None,
            },
            Slot::MapValue(id, n) => match self.doc.node_by_id(*id) {
                Some(Node::Map(entries)) => entries.get(*n).map(|(_, v)| v),
                _ => None,
            },
        };
        value.cloned().ok_or_else(missing)
    }

    fn write(&mut self, slot: &Slot, value: Value) -> Result<(), DecodeError> {
        let missing = || DecodeError::PathNotFound(format!("{slot:?}"));
        let id = match slot {
            Slot::Root => {
                self.doc.set_root(value);
                return Ok(());
            }
            Slot::Field(id, _)
            | Slot::Index(id, _)
            | Slot::SetMember(id, _)
            | Slot::MapKey(id, _)
            | Slot::MapValue(id, _) => *id,
        };
        let node = self.doc.node_by_id_mut(id).ok_or_else(missing)?;
        let target = match (slot, node) {
            (Slot::Field(_, key), Node::Object(fields)) => match fields.iter().position(|(k, _)| k == key) {
                Some(n) => &mut fields[n].1,
                None => {
                    fields.push((key.clone(), value));
                    return Ok(());
                }
            },
            (Slot::Index(_, n), Node::Array(items)) | (Slot::SetMember(_, n), Node::Set(items)) => {
                items.get_mut(*n).ok_or_else(missing)?
            }
            (Slot::MapKey(_, n), Node::Map(entries)) => &mut entries.get_mut(*n).ok_or_else(missing)?.0,
            (Slot::MapValue(_, n), Node::Map(entries)) => &mut entries.get_mut(*n).ok_or_else(missing)?.1,
            _ => return Err(missing()),
        };
        *target = value;
        Ok(())
    }
}

/// Whether `json` holds more than `remaining` levels of nested containers.
fn nested_deeper(json: &Json, remaining: usize) -> bool {
    match json {
        Json::Array(items) => remaining == 0 || items.iter().any(|item| nested_deeper(item, remaining - 1)),
        Json::Object(fields) => remaining == 0 || fields.values().any(|v| nested_deeper(v, remaining - 1)),
        _ => false,
    }
}

/// Numbers JSON cannot carry travel as strings.
fn revive_number(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        "-0" => Some(-0.0),
        other => other.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    }
}
