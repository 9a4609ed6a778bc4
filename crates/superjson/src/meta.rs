//! Wire types: the envelope and its `meta` annotations.
//!
//! ```text
//! {"json": <plain JSON>,
//!  "meta": {"values": <type tree>, "referentialEqualities": <equalities>, "v": 1}}
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::DecodeError;

/// Current wire format version written to `meta.v`.
pub const FORMAT_VERSION: u32 = 1;

// ----------------------------------------------------------------
// Type tags

/// The type of one annotated location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Undefined,
    BigInt,
    Date,
    RegExp,
    Error,
    Set,
    Map,
    /// `NaN`, `Infinity`, `-Infinity` or `-0`.
    Number,
    Url,
    /// `["class", name]`, produced for registered classes.
    Class(String),
    /// `["symbol", name]`, produced for registered symbols.
    Symbol(String),
    /// `["custom", name]`, produced for custom transformers.
    Custom(String),
}

impl TypeTag {
    pub fn to_json(&self) -> Json {
        match self {
            TypeTag::Class(name) => Json::Array(vec!["class".into(), name.as_str().into()]),
            TypeTag::Symbol(name) => Json::Array(vec!["symbol".into(), name.as_str().into()]),
            TypeTag::Custom(name) => Json::Array(vec!["custom".into(), name.as_str().into()]),
            simple => Json::String(simple.to_string()),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidAnnotation(json.to_string());
        match json {
            Json::String(s) => match s.as_str() {
                "undefined" => Ok(TypeTag::Undefined),
                "bigint" => Ok(TypeTag::BigInt),
                "Date" => Ok(TypeTag::Date),
                "regexp" => Ok(TypeTag::RegExp),
                "Error" => Ok(TypeTag::Error),
                "set" => Ok(TypeTag::Set),
                "map" => Ok(TypeTag::Map),
                "number" => Ok(TypeTag::Number),
                "URL" => Ok(TypeTag::Url),
                _ => Err(invalid()),
            },
            Json::Array(parts) => match parts.as_slice() {
                [Json::String(kind), Json::String(name)] => match kind.as_str() {
                    "class" => Ok(TypeTag::Class(name.clone())),
                    "symbol" => Ok(TypeTag::Symbol(name.clone())),
                    "custom" => Ok(TypeTag::Custom(name.clone())),
                    _ => Err(invalid()),
                },
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Undefined => f.write_str("undefined"),
            TypeTag::BigInt => f.write_str("bigint"),
            TypeTag::Date => f.write_str("Date"),
            TypeTag::RegExp => f.write_str("regexp"),
            TypeTag::Error => f.write_str("Error"),
            TypeTag::Set => f.write_str("set"),
            TypeTag::Map => f.write_str("map"),
            TypeTag::Number => f.write_str("number"),
            TypeTag::Url => f.write_str("URL"),
            TypeTag::Class(name) => write!(f, "class {name}"),
            TypeTag::Symbol(name) => write!(f, "symbol {name}"),
            TypeTag::Custom(name) => write!(f, "custom {name}"),
        }
    }
}

// ----------------------------------------------------------------
// Type tree (meta.values)

/// Annotations for a sub-tree, keyed by escaped relative paths.
pub type Children = IndexMap<String, TypeTree>;

/// The `meta.values` structure.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeTree {
    /// `[tag]` or `[tag, {path: tree}]`: the location itself has a type,
    /// and possibly annotated descendants.
    Node { tag: TypeTag, children: Option<Children> },
    /// `{path: tree}`: the location is untyped, only descendants are.
    Paths(Children),
}

impl TypeTree {
    pub fn leaf(tag: TypeTag) -> Self {
        TypeTree::Node { tag, children: None }
    }

    pub fn to_json(&self) -> Json {
        match self {
            TypeTree::Node { tag, children } => {
                let mut out = vec![tag.to_json()];
                if let Some(children) = children {
                    out.push(children_to_json(children));
                }
                Json::Array(out)
            }
            TypeTree::Paths(children) => children_to_json(children),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self, DecodeError> {
        match json {
            Json::Array(parts) => {
                let tag = parts
                    .first()
                    .ok_or_else(|| DecodeError::InvalidAnnotation(json.to_string()))
                    .and_then(TypeTag::from_json)?;
                let children = match parts.get(1) {
                    None => None,
                    Some(Json::Object(map)) => Some(children_from_json(map)?),
                    Some(other) => return Err(DecodeError::InvalidAnnotation(other.to_string())),
                };
                if parts.len() > 2 {
                    return Err(DecodeError::InvalidAnnotation(json.to_string()));
                }
                Ok(TypeTree::Node { tag, children })
            }
            Json::Object(map) => Ok(TypeTree::Paths(children_from_json(map)?)),
            other => Err(DecodeError::InvalidAnnotation(other.to_string())),
        }
    }
}

fn children_to_json(children: &Children) -> Json {
    Json::Object(children.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

fn children_from_json(map: &serde_json::Map<String, Json>) -> Result<Children, DecodeError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), TypeTree::from_json(v)?)))
        .collect()
}

// ----------------------------------------------------------------
// Referential equalities (meta.referentialEqualities)

/// Representative path mapped to the paths that hold the same object.
pub type EqualityPaths = IndexMap<String, Vec<String>>;

/// The `meta.referentialEqualities` structure.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferentialEqualities {
    /// `{path: [identical paths]}`.
    Paths(EqualityPaths),
    /// `[[paths identical to the root]]` or `[[...], {path: [...]}]`.
    Rooted {
        root: Vec<String>,
        others: Option<EqualityPaths>,
    },
}

impl ReferentialEqualities {
    pub fn to_json(&self) -> Json {
        match self {
            ReferentialEqualities::Paths(paths) => equality_paths_to_json(paths),
            ReferentialEqualities::Rooted { root, others } => {
                let mut out = vec![Json::Array(root.iter().map(|p| p.as_str().into()).collect())];
                if let Some(others) = others {
                    out.push(equality_paths_to_json(others));
                }
                Json::Array(out)
            }
        }
    }

    pub fn from_json(json: &Json) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidAnnotation(json.to_string());
        match json {
            Json::Object(map) => Ok(ReferentialEqualities::Paths(equality_paths_from_json(map)?)),
            Json::Array(parts) => {
                let root = parts.first().ok_or_else(invalid).and_then(string_list)?;
                let others = match parts.get(1) {
                    None => None,
                    Some(Json::Object(map)) => Some(equality_paths_from_json(map)?),
                    Some(_) => return Err(invalid()),
                };
                Ok(ReferentialEqualities::Rooted { root, others })
            }
            _ => Err(invalid()),
        }
    }
}

fn equality_paths_to_json(paths: &EqualityPaths) -> Json {
    Json::Object(
        paths
            .iter()
            .map(|(k, v)| (k.clone(), Json::Array(v.iter().map(|p| p.as_str().into()).collect())))
            .collect(),
    )
}

fn equality_paths_from_json(map: &serde_json::Map<String, Json>) -> Result<EqualityPaths, DecodeError> {
    map.iter().map(|(k, v)| Ok((k.clone(), string_list(v)?))).collect()
}

fn string_list(json: &Json) -> Result<Vec<String>, DecodeError> {
    let invalid = || DecodeError::InvalidAnnotation(json.to_string());
    json.as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|p| p.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

macro_rules! serde_via_json {
    ($($t:ty),*) => {
        $(
            impl Serialize for $t {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    self.to_json().serialize(serializer)
                }
            }

            impl<'de> Deserialize<'de> for $t {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let json = Json::deserialize(deserializer)?;
                    <$t>::from_json(&json).map_err(D::Error::custom)
                }
            }
        )*
    };
}

serde_via_json!(TypeTag, TypeTree, ReferentialEqualities);

// ----------------------------------------------------------------
// Envelope

/// Side-channel metadata of an envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<TypeTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referential_equalities: Option<ReferentialEqualities>,
    /// Format version; absent on envelopes from before path escaping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<u32>,
}

impl Meta {
    /// Whether paths in this meta use the pre-escaping syntax.
    pub fn legacy_paths(&self) -> bool {
        self.v.unwrap_or(0) < 1
    }
}

/// The plain-JSON-safe structure the encoder produces.
///
/// `json` is `None` only when the encoded root was `undefined`; a JSON
/// `null` root is `Some(Json::Null)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub json: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    /// The envelope as a JSON value, in wire key order.
    pub fn to_json(&self) -> Json {
        let mut out = serde_json::Map::new();
        if let Some(json) = &self.json {
            out.insert("json".to_string(), json.clone());
        }
        if let Some(meta) = &self.meta {
            let mut m = serde_json::Map::new();
            if let Some(values) = &meta.values {
                m.insert("values".to_string(), values.to_json());
            }
            if let Some(eq) = &meta.referential_equalities {
                m.insert("referentialEqualities".to_string(), eq.to_json());
            }
            if let Some(v) = meta.v {
                m.insert("v".to_string(), v.into());
            }
            out.insert("meta".to_string(), Json::Object(m));
        }
        Json::Object(out)
    }

    pub fn from_json(json: &Json) -> Result<Self, DecodeError> {
        Ok(Envelope::deserialize(json)?)
    }
}

/// Keeps an explicit `null` as `Some(Null)` rather than folding it into `None`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Json>, D::Error> {
    Json::deserialize(deserializer).map(Some)
}
