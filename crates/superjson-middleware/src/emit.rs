//! The JSON emission capability.
//!
//! Every request carries a [`JsonEmitter`] in its extensions. Handlers reach
//! it through [`Reply`](crate::Reply); middleware may replace it for the
//! request with a wrapper around the one it found.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use superjson::{Document, SuperJson};

use crate::error::EmitError;

/// Status and headers chosen by the handler before emitting.
#[derive(Debug, Clone, Default)]
pub struct ReplyHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Turns a body into a response.
pub trait EmitJson: Send + Sync {
    fn emit(&self, head: ReplyHead, body: &Document) -> Result<Response, EmitError>;
}

/// Shared handle to the request's current emitter.
#[derive(Clone)]
pub struct JsonEmitter(Arc<dyn EmitJson>);

impl JsonEmitter {
    pub fn new(emitter: impl EmitJson + 'static) -> Self {
        Self(Arc::new(emitter))
    }

    pub fn emit(&self, head: ReplyHead, body: &Document) -> Result<Response, EmitError> {
        self.0.emit(head, body)
    }
}

/// The framework default: [`PlainJson`].
impl Default for JsonEmitter {
    fn default() -> Self {
        Self::new(PlainJson)
    }
}

impl fmt::Debug for JsonEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonEmitter(..)")
    }
}

// ----------------------------------------------------------------
// Plain JSON

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Writes the body the way `JSON.stringify` would render it.
///
/// `content-type` is set unless the handler already chose one. An
/// `undefined` body gives an empty response body.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJson;

impl EmitJson for PlainJson {
    fn emit(&self, head: ReplyHead, body: &Document) -> Result<Response, EmitError> {
        let bytes = match body.to_plain_json()? {
            Some(json) => superjson::to_js_string(&json)?.into_bytes(),
            None => Vec::new(),
        };
        let mut builder = Response::builder().status(head.status);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(head.headers);
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
            }
        }
        Ok(builder.body(Body::from(bytes))?)
    }
}

// ----------------------------------------------------------------
// Superjson

/// Encodes the body to a superjson envelope and hands the envelope to the
/// emitter it wraps. Status, headers and the wrapped emitter's result pass
/// through untouched.
pub struct SuperJsonEmitter {
    codec: Arc<SuperJson>,
    inner: JsonEmitter,
}

impl SuperJsonEmitter {
    pub fn new(codec: Arc<SuperJson>, inner: JsonEmitter) -> Self {
        Self { codec, inner }
    }
}

impl EmitJson for SuperJsonEmitter {
    fn emit(&self, head: ReplyHead, body: &Document) -> Result<Response, EmitError> {
        let envelope = self.codec.serialize(body)?;
        let wrapped = Document::from_json(&envelope.to_json());
        self.inner.emit(head, &wrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use superjson::BigInt;

    #[test]
    fn plain_keeps_chosen_content_type() {
        let mut head = ReplyHead::default();
        head.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/vnd.api+json"));
        let resp = PlainJson.emit(head, &Document::from_json(&json!({"a": 1}))).unwrap();
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/vnd.api+json");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn plain_fails_on_bigint() {
        let mut doc = Document::new();
        doc.set_root(BigInt::from(1));
        let err = PlainJson.emit(ReplyHead::default(), &doc).unwrap_err();
        assert!(matches!(err, EmitError::Plain(superjson::PlainJsonError::BigInt)));

        let wrapped = SuperJsonEmitter::new(Arc::new(SuperJson::new()), JsonEmitter::default());
        assert!(wrapped.emit(ReplyHead::default(), &doc).is_ok());
    }
}
