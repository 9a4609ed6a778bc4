//! Error types for superjson encoding, decoding and the plain JSON projection.

use thiserror::Error;

/// Errors that can occur while encoding a document into an envelope.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// An object carries a key that would pollute prototypes on a JavaScript
    /// client (`__proto__`, `constructor` or `prototype`).
    #[error("Detected property {0}. This is a prototype pollution risk, please remove it from your object.")]
    ForbiddenKey(String),
    /// Nesting is deeper than the configured `max_depth`.
    #[error("maximum nesting depth of {0} exceeded")]
    DepthExceeded(usize),
    /// A `Ref` points outside the document's arena.
    #[error("dangling reference to node {0}")]
    DanglingRef(usize),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while decoding an envelope back into a document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// `meta` does not have the shape of a superjson annotation.
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),
    /// A path string uses an escape other than `\\` or `\.`.
    #[error("invalid path: {0}")]
    InvalidPath(String),
    /// An annotation refers to a location that does not exist in `json`.
    #[error("path not found: {0}")]
    PathNotFound(String),
    /// The payload at a path does not fit its type tag.
    #[error("invalid {tag} payload at {path}")]
    InvalidPayload { tag: String, path: String },
    /// A tag this codec does not reconstruct (`class`, `symbol`, `custom`).
    #[error("unsupported type annotation: {0}")]
    UnsupportedType(String),
    #[error("Detected property {0}. This is a prototype pollution risk, please remove it from your object.")]
    ForbiddenKey(String),
    /// The envelope nests deeper than the configured `max_depth`.
    #[error("maximum nesting depth of {0} exceeded")]
    DepthExceeded(usize),
    #[error("invalid bigint: {0}")]
    InvalidBigInt(String),
    #[error("Invalid Date: {0}")]
    InvalidDate(String),
    #[error("Invalid regular expression: {0}")]
    InvalidRegExp(String),
    #[error("Invalid URL {input}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors from projecting a document onto plain JSON the way
/// `JSON.stringify` would.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlainJsonError {
    #[error("Do not know how to serialize a BigInt")]
    BigInt,
    #[error("Converting circular structure to JSON")]
    Circular,
    #[error("dangling reference to node {0}")]
    DanglingRef(usize),
}
