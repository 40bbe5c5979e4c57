//! Error types for request preparation and the Petstore client.
//!
//! # Design
//! Transport failures are not errors of `execute`: they come back inside a
//! `ResponseOutcome`. `ApiError` is what a `parse_*` method turns such an
//! outcome into once the caller asks for a typed result. `NotFound` gets a
//! dedicated variant because callers frequently branch on it.

use thiserror::Error;

use crate::http::NetworkError;

/// Reasons an `HttpRequestInput` cannot be turned into a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request URL is empty")]
    EmptyUrl,

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("invalid MIME type {mime_type:?} for attachment {variable:?}")]
    InvalidMimeType { variable: String, mime_type: String },
}

/// Errors returned by `PetstoreClient` parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The exchange never produced a response.
    #[error("transport failure ({kind}): {message}")]
    Transport { kind: NetworkError, message: String },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}
