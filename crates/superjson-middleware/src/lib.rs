//! axum middleware that encodes every JSON response with superjson.
//!
//! The middleware swaps the request's JSON emitter for one that first
//! encodes the body into a superjson envelope. Handlers keep emitting
//! through [`Reply`] and never know whether the middleware is installed.
//!
//! # Example
//!
//! ```no_run
//! use axum::{middleware::from_fn, response::Response, routing::get, Router};
//! use superjson::Document;
//! use superjson_middleware::{superjson_middleware, EmitError, MiddlewareConfig, Reply};
//!
//! async fn now(reply: Reply) -> Result<Response, EmitError> {
//!     let mut doc = Document::new();
//!     let date = doc.new_date(chrono::Utc::now());
//!     let root = doc.new_object([("now", date)]);
//!     doc.set_root(root);
//!     reply.json(&doc)
//! }
//!
//! let app: Router = Router::new()
//!     .route("/now", get(now))
//!     .layer(from_fn(superjson_middleware(MiddlewareConfig::default())));
//! ```

mod config;
mod emit;
mod error;
mod reply;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use superjson::SuperJson;

pub use config::MiddlewareConfig;
pub use emit::{EmitJson, JsonEmitter, PlainJson, ReplyHead, SuperJsonEmitter};
pub use error::EmitError;
pub use reply::Reply;

/// Future returned by the middleware function.
pub type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Builds the middleware with the default codec.
///
/// Install it with `Router::layer(axum::middleware::from_fn(...))`. Installing
/// it twice encodes every body twice.
pub fn superjson_middleware(
    config: MiddlewareConfig,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone + Send + Sync + 'static {
    superjson_middleware_with_codec(config, SuperJson::new())
}

/// Builds the middleware around a configured codec.
pub fn superjson_middleware_with_codec(
    config: MiddlewareConfig,
    codec: SuperJson,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone + Send + Sync + 'static {
    let MiddlewareConfig {} = config;
    let codec = Arc::new(codec);
    move |mut req: Request, next: Next| -> MiddlewareFuture {
        wrap_emitter(&mut req, codec.clone());
        Box::pin(next.run(req))
    }
}

/// Replaces the request's emitter with a superjson wrapper around it.
fn wrap_emitter(req: &mut Request, codec: Arc<SuperJson>) {
    let inner = req.extensions().get::<JsonEmitter>().cloned().unwrap_or_default();
    tracing::trace!(uri = %req.uri(), "wrapping JSON emitter with superjson");
    req.extensions_mut()
        .insert(JsonEmitter::new(SuperJsonEmitter::new(codec, inner)));
}
