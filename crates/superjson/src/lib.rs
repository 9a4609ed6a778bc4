//! Superjson codec: JSON plus the types JSON drops.
//!
//! A [`Document`] (a value graph that may contain dates, maps, sets, big
//! integers, regexps, errors, URLs, `undefined`, non-finite numbers, shared
//! references and cycles) is encoded into an [`Envelope`]: a plain JSON tree
//! plus a `meta` side channel that records the type of every special
//! location and which locations hold the same object. Decoding reverses it.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use superjson::{Document, Kind};
//!
//! let mut doc = Document::new();
//! let date = doc.new_date(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
//! let root = doc.new_object([("createdAt", date)]);
//! doc.set_root(root);
//!
//! let text = superjson::stringify(&doc).unwrap();
//! assert_eq!(
//!     text,
//!     r#"{"json":{"createdAt":"2023-01-01T00:00:00.000Z"},"meta":{"values":{"createdAt":["Date"]},"v":1}}"#
//! );
//!
//! let back = superjson::parse(&text).unwrap();
//! assert_eq!(back.kind(back.get(back.root(), "createdAt").unwrap()), Kind::Date);
//! assert_eq!(back, doc);
//! ```

mod codec;
mod decoder;
mod encoder;
mod equal;
mod error;
mod inspect;
mod plain;
mod value;

pub mod meta;
pub mod path;
pub mod types;

pub use codec::{SuperJson, SuperJsonOptions, DEFAULT_MAX_DEPTH};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{DecodeError, EncodeError, PlainJsonError};
pub use plain::to_js_string;
pub use meta::{Envelope, Meta, ReferentialEqualities, TypeTag, TypeTree, FORMAT_VERSION};
pub use types::{BigInt, ErrorObject, RegExp};
pub use value::{Document, Kind, Node, NodeId, Value};

// ── Default-instance shortcuts ─────────────────────────────────────────────

/// Encodes `doc` with default options.
pub fn serialize(doc: &Document) -> Result<Envelope, EncodeError> {
    SuperJson::new().serialize(doc)
}

/// Decodes an envelope.
pub fn deserialize(envelope: &Envelope) -> Result<Document, DecodeError> {
    SuperJson::new().deserialize(envelope)
}

/// Encodes `doc` with default options straight to envelope text.
pub fn stringify(doc: &Document) -> Result<String, EncodeError> {
    SuperJson::new().stringify(doc)
}

/// Decodes envelope text.
pub fn parse(text: &str) -> Result<Document, DecodeError> {
    SuperJson::new().parse(text)
}
