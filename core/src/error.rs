//! Error types for the Check_MK web API client.
//!
//! # Design
//! `ApiError` is the single root error kind. Each variant corresponds to one
//! stage of a call: transport, HTTP status, the out-of-band authentication
//! marker, envelope decoding, and the backend's own result code. Lookup
//! misses from the fetch-then-index operations get a dedicated `NotFound`
//! variant. Nothing in the crate retries on any of them.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by `WebApi` calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an HTTP status other than 200.
    #[error("HTTP {status}: {body}")]
    Response { status: u16, body: String },

    /// The response body started with `Authentication error:`.
    #[error("{0}")]
    Authentication(String),

    /// The body could not be decoded into a `result`/`result_code` envelope.
    #[error("malformed response ({reason}): {body}")]
    MalformedResponse { body: String, reason: String },

    /// The envelope carried a nonzero `result_code`.
    #[error("result code {code}: {body}")]
    Result { code: i64, body: Value },

    /// A get-one lookup did not find the requested key in the collection.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// The request never produced an HTTP status (connection refused, DNS,
    /// broken body stream).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be encoded.
    #[error("encoding failed: {0}")]
    Encode(String),
}

impl ApiError {
    pub(crate) fn malformed(body: &str, reason: impl Into<String>) -> Self {
        ApiError::MalformedResponse {
            body: body.to_string(),
            reason: reason.into(),
        }
    }
}
