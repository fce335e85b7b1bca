//! The operation catalog: one method per remote action, grouped by the
//! resource it touches.
//!
//! Every method builds an `ApiCall` and runs it through `WebApi::call`. The
//! composite operations (`delete_all_hosts`, `delete_all_groups`,
//! `discover_services_for_all_hosts`) list first and then loop one call per
//! item in listing order. They stop at the first failure and leave earlier
//! items applied; there is no rollback.

mod changes;
mod folders;
mod groups;
mod hosts;
mod hosttags;
mod rulesets;
mod sites;
mod users;

pub use hosttags::HostTagConfig;

use serde_json::Value;

use crate::error::ApiError;
use crate::params::Params;

/// Convert a `json!` object literal into `Params`.
pub(crate) fn params(value: Value) -> Params {
    match value {
        Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// The result of a listing action, which must be a mapping.
pub(crate) fn expect_mapping(value: Value, action: &str) -> Result<Params, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::malformed(
            &other.to_string(),
            format!("{action} did not return a mapping"),
        )),
    }
}
