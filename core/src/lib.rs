//! Client core for the Petstore API.
//!
//! # Overview
//! Two generic pieces carry everything else:
//! - the request executor: an `HttpRequestInput` describes one exchange
//!   (URL, method, variable layout, headers, attachments, raw body);
//!   `HttpRequestExecutor::execute` performs it and resolves to exactly one
//!   `ResponseOutcome`, whether the network cooperated or not;
//! - the presence-aware model mapper: records whose fields are all optional,
//!   serialized with only the fields that were set and deserialized without
//!   letting one bad field spoil the rest.
//!
//! # Design
//! - `PetstoreClient` is stateless. Each operation is split into `build_*`
//!   (produces a descriptor) and `parse_*` (consumes an outcome), so the I/O
//!   boundary stays explicit and both halves test without a network.
//! - Transport failures are data, never panics. Status codes are interpreted
//!   by `parse_*`, not by the executor.

pub mod client;
pub mod encoding;
pub mod error;
pub mod executor;
pub mod http;
pub mod model;
pub mod request;
pub mod types;

pub use client::PetstoreClient;
pub use error::{ApiError, RequestError};
pub use executor::{Execution, ExecutorConfig, HttpRequestExecutor};
pub use http::{
    FileElement, HttpMethod, HttpRequestInput, NetworkError, ParseMethodError, ResponseOutcome,
    VarLayout,
};
pub use model::{EmptyPolicy, Model};
pub use request::{prepare, PreparedRequest};
pub use types::{ApiResponse, Category, Order, OrderStatus, Pet, PetStatus, Tag, User};
