use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;
use superjson::Document;

use crate::emit::{JsonEmitter, ReplyHead};
use crate::error::EmitError;

/// Per-request reply: status, headers and the request's JSON emitter.
///
/// ```ignore
/// async fn handler(reply: Reply) -> Result<Response, EmitError> {
///     reply.status(StatusCode::CREATED).json(&doc)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Reply {
    head: ReplyHead,
    emitter: JsonEmitter,
}

impl Reply {
    pub fn new(emitter: JsonEmitter) -> Self {
        Self {
            head: ReplyHead::default(),
            emitter,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.head.status = status;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.head.headers.insert(name, value);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Emits `body` through the request's emitter.
    pub fn json(self, body: &Document) -> Result<Response, EmitError> {
        self.emitter.emit(self.head, body)
    }

    /// Emits any serializable value as plain JSON data.
    pub fn json_value<T: Serialize + ?Sized>(self, body: &T) -> Result<Response, EmitError> {
        let doc = Document::from_json(&serde_json::to_value(body)?);
        self.json(&doc)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Reply {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let emitter = parts.extensions.get::<JsonEmitter>().cloned().unwrap_or_default();
        Ok(Reply::new(emitter))
    }
}
