use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use superjson::{EncodeError, PlainJsonError};
use thiserror::Error;

/// Errors raised while emitting a JSON response.
#[derive(Debug, Error)]
pub enum EmitError {
    /// The superjson encoder rejected the body.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The plain emitter could not project the body onto JSON.
    #[error(transparent)]
    Plain(#[from] PlainJsonError),
    #[error("failed to write response body: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

/// An emission failure that reaches the framework is a generic 500.
impl IntoResponse for EmitError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "failed to emit JSON response");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}
