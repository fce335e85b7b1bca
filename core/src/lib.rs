//! Synchronous client for the Check_MK web API (`webapi.py`).
//!
//! # Overview
//! Every operation is one HTTP round trip: the action name and flags go in
//! the query string next to the automation credentials, the payload goes in
//! a `request=` form body, and the answer is a `result`/`result_code`
//! envelope in JSON or in Python literal form.
//!
//! # Design
//! - `WebApi` is immutable after construction; it holds the resolved
//!   endpoint, the credentials and a `Transport`.
//! - `build_request` and `parse_response` are pure and tested without a
//!   network. `call` runs the transport between them exactly once.
//! - The operation catalog lives in `catalog`, one module per remote
//!   resource, each an `impl WebApi` block.
//! - Fan-out operations (delete-all, discover-all) are sequential loops
//!   that stop at the first failure without undoing earlier calls.

mod catalog;
pub mod client;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod format;
pub mod http;
pub mod params;
pub mod pyliteral;
pub mod types;

pub use catalog::HostTagConfig;
pub use client::{ApiCall, WebApi};
pub use endpoint::resolve_endpoint;
pub use error::ApiError;
pub use format::{Codec, Format, JsonCodec, PythonCodec};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use params::{shape, Params};
pub use types::{
    ActivateMode, Attributes, DiscoverMode, DiscoveryCounters, GroupKind, HostDiscovery, NewHost,
};
