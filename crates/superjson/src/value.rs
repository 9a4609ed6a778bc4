//! The value graph the codec encodes and decodes.
//!
//! A [`Document`] is an arena of [`Node`]s plus a root [`Value`]. Scalars are
//! stored inline; everything that has identity in a JavaScript heap (objects,
//! arrays, maps, sets, dates, regexps, errors, URLs) lives in the arena and is
//! referenced through [`Value::Ref`]. Two refs with the same [`NodeId`] are the
//! same object, which is how shared sub-trees and cycles are expressed.

use std::fmt;

use chrono::{DateTime, Utc};
use url::Url;

use crate::types::{BigInt, ErrorObject, RegExp};

/// Index of a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An inline value. Anything with identity is a [`Value::Ref`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    BigInt(BigInt),
    Ref(NodeId),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(b) => Some(b),
            _ => None,
        }
    }

    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Value::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// `SameValueZero`: the equality `Map` keys and `Set` members use.
    /// NaN equals NaN, `+0` equals `-0`, refs compare by identity.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<BigInt> for Value {
    fn from(b: BigInt) -> Self {
        Value::BigInt(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A value with identity, owned by the document arena.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain object; fields keep insertion order.
    Object(Vec<(String, Value)>),
    Array(Vec<Value>),
    /// Insertion-ordered entries with unique keys.
    Map(Vec<(Value, Value)>),
    /// Insertion-ordered unique members.
    Set(Vec<Value>),
    Date(DateTime<Utc>),
    RegExp(RegExp),
    Error(ErrorObject),
    Url(Url),
}

impl Node {
    pub fn kind(&self) -> Kind {
        match self {
            Node::Object(_) => Kind::Object,
            Node::Array(_) => Kind::Array,
            Node::Map(_) => Kind::Map,
            Node::Set(_) => Kind::Set,
            Node::Date(_) => Kind::Date,
            Node::RegExp(_) => Kind::RegExp,
            Node::Error(_) => Kind::Error,
            Node::Url(_) => Kind::Url,
        }
    }

    /// Whether the encoder descends into this node's children.
    pub(crate) fn is_container(&self) -> bool {
        matches!(self, Node::Object(_) | Node::Array(_) | Node::Map(_) | Node::Set(_))
    }
}

/// Runtime type of a value, the equivalent of `typeof` / `instanceof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    BigInt,
    Object,
    Array,
    Map,
    Set,
    Date,
    RegExp,
    Error,
    Url,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Undefined => "undefined",
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::BigInt => "bigint",
            Kind::Object => "Object",
            Kind::Array => "Array",
            Kind::Map => "Map",
            Kind::Set => "Set",
            Kind::Date => "Date",
            Kind::RegExp => "RegExp",
            Kind::Error => "Error",
            Kind::Url => "URL",
        };
        f.write_str(name)
    }
}

/// A value graph: node arena plus root.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    root: Value,
}

impl Document {
    /// An empty document whose root is `undefined`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn set_root(&mut self, root: impl Into<Value>) {
        self.root = root.into();
    }

    /// Number of nodes in the arena, including unreachable ones.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Moves `node` into the arena and returns a reference to it.
    pub fn insert(&mut self, node: Node) -> Value {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        Value::Ref(id)
    }

    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_by_id_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// The node a value refers to, if it is a ref.
    pub fn node(&self, value: &Value) -> Option<&Node> {
        value.node_id().and_then(|id| self.node_by_id(id))
    }

    /// Runtime type of `value`. A dangling ref reports `Undefined`.
    pub fn kind(&self, value: &Value) -> Kind {
        match value {
            Value::Undefined => Kind::Undefined,
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::BigInt(_) => Kind::BigInt,
            Value::Ref(id) => self.node_by_id(*id).map_or(Kind::Undefined, Node::kind),
        }
    }

    // ----------------------------------------------------------------
    // Constructors

    pub fn new_object<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut out: Vec<(String, Value)> = Vec::new();
        for (k, v) in fields {
            let (k, v) = (k.into(), v.into());
            match out.iter_mut().find(|(key, _)| *key == k) {
                Some(slot) => slot.1 = v,
                None => out.push((k, v)),
            }
        }
        self.insert(Node::Object(out))
    }

    pub fn new_array<V: Into<Value>>(&mut self, items: impl IntoIterator<Item = V>) -> Value {
        let items = items.into_iter().map(Into::into).collect();
        self.insert(Node::Array(items))
    }

    /// A `Map`; a repeated key keeps its first position and takes the last value.
    pub fn new_map<K, V>(&mut self, entries: impl IntoIterator<Item = (K, V)>) -> Value
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut out: Vec<(Value, Value)> = Vec::new();
        for (k, v) in entries {
            insert_entry(&mut out, k.into(), v.into());
        }
        self.insert(Node::Map(out))
    }

    /// A `Set`; repeated members are dropped.
    pub fn new_set<V: Into<Value>>(&mut self, members: impl IntoIterator<Item = V>) -> Value {
        let mut out: Vec<Value> = Vec::new();
        for v in members {
            insert_member(&mut out, v.into());
        }
        self.insert(Node::Set(out))
    }

    pub fn new_date(&mut self, date: DateTime<Utc>) -> Value {
        self.insert(Node::Date(date))
    }

    pub fn new_regexp(&mut self, regexp: RegExp) -> Value {
        self.insert(Node::RegExp(regexp))
    }

    pub fn new_error(&mut self, error: ErrorObject) -> Value {
        self.insert(Node::Error(error))
    }

    pub fn new_url(&mut self, url: Url) -> Value {
        self.insert(Node::Url(url))
    }

    // ----------------------------------------------------------------
    // Mutation

    /// Sets `key` on an object. Returns `false` if `object` is not one.
    pub fn set_field(&mut self, object: &Value, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let Some(Node::Object(fields)) = object.node_id().and_then(|id| self.node_by_id_mut(id)) else {
            return false;
        };
        let (key, value) = (key.into(), value.into());
        match fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => fields.push((key, value)),
        }
        true
    }

    /// Appends to an array. Returns `false` if `array` is not one.
    pub fn push(&mut self, array: &Value, value: impl Into<Value>) -> bool {
        match array.node_id().and_then(|id| self.node_by_id_mut(id)) {
            Some(Node::Array(items)) => {
                items.push(value.into());
                true
            }
            _ => false,
        }
    }

    pub fn map_insert(&mut self, map: &Value, key: impl Into<Value>, value: impl Into<Value>) -> bool {
        match map.node_id().and_then(|id| self.node_by_id_mut(id)) {
            Some(Node::Map(entries)) => {
                insert_entry(entries, key.into(), value.into());
                true
            }
            _ => false,
        }
    }

    pub fn set_add(&mut self, set: &Value, member: impl Into<Value>) -> bool {
        match set.node_id().and_then(|id| self.node_by_id_mut(id)) {
            Some(Node::Set(members)) => {
                insert_member(members, member.into());
                true
            }
            _ => false,
        }
    }

    // ----------------------------------------------------------------
    // Lookup

    /// Object field by name, or array element by decimal index.
    pub fn get(&self, container: &Value, key: &str) -> Option<&Value> {
        match self.node(container)? {
            Node::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Node::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Follows `path` from the root with [`Document::get`].
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let mut cur = &self.root;
        for key in path {
            cur = self.get(cur, key)?;
        }
        Some(cur)
    }

    /// Whether an object has `key`, even when its value is `undefined`.
    pub fn has_field(&self, object: &Value, key: &str) -> bool {
        matches!(self.node(object), Some(Node::Object(fields)) if fields.iter().any(|(k, _)| k == key))
    }

    pub fn map_get(&self, map: &Value, key: &Value) -> Option<&Value> {
        match self.node(map)? {
            Node::Map(entries) => entries.iter().find(|(k, _)| k.same_value_zero(key)).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn set_has(&self, set: &Value, member: &Value) -> bool {
        matches!(self.node(set), Some(Node::Set(members)) if members.iter().any(|m| m.same_value_zero(member)))
    }

    pub fn date(&self, value: &Value) -> Option<&DateTime<Utc>> {
        match self.node(value)? {
            Node::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn regexp(&self, value: &Value) -> Option<&RegExp> {
        match self.node(value)? {
            Node::RegExp(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self, value: &Value) -> Option<&ErrorObject> {
        match self.node(value)? {
            Node::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn url(&self, value: &Value) -> Option<&Url> {
        match self.node(value)? {
            Node::Url(u) => Some(u),
            _ => None,
        }
    }

    // ----------------------------------------------------------------
    // Plain JSON in

    /// Builds a document holding a plain JSON value. Every object and array
    /// becomes its own node.
    pub fn from_json(json: &serde_json::Value) -> Self {
        let mut doc = Document::new();
        let root = doc.import_json(json);
        doc.root = root;
        doc
    }

    /// Adds a plain JSON value to this document and returns it.
    pub fn import_json(&mut self, json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                let items = items.iter().map(|item| self.import_json(item)).collect();
                self.insert(Node::Array(items))
            }
            serde_json::Value::Object(fields) => {
                let fields = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), self.import_json(v)))
                    .collect();
                self.insert(Node::Object(fields))
            }
        }
    }
}

impl From<serde_json::Value> for Document {
    fn from(json: serde_json::Value) -> Self {
        Document::from_json(&json)
    }
}

/// Documents compare by deep structural equality of their roots.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.deep_equal(&self.root, other, &other.root)
    }
}

pub(crate) fn insert_entry(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match entries.iter_mut().find(|(k, _)| k.same_value_zero(&key)) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

pub(crate) fn insert_member(members: &mut Vec<Value>, member: Value) {
    if !members.iter().any(|m| m.same_value_zero(&member)) {
        members.push(member);
    }
}
