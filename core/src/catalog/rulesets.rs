//! Rule set commands. The server only speaks the Python literal form for
//! these actions.

use serde_json::{json, Value};

use super::params;
use crate::client::{ApiCall, WebApi};
use crate::error::ApiError;
use crate::format::Format;
use crate::http::Transport;
use crate::params::Params;

impl<T: Transport> WebApi<T> {
    pub fn get_ruleset(&self, ruleset_name: &str) -> Result<Value, ApiError> {
        self.call(
            ApiCall::new("get_ruleset")
                .output_format_as(Format::Python)
                .data(params(json!({ "ruleset_name": ruleset_name }))),
        )
    }

    /// Title, ID and help text of every rule set.
    pub fn get_rulesets_info(&self) -> Result<Value, ApiError> {
        self.call(ApiCall::new("get_rulesets_info").output_format_as(Format::Python))
    }

    /// Replace a whole rule set; `ruleset` has the shape `get_ruleset`
    /// returns.
    pub fn set_ruleset(&self, ruleset_name: &str, ruleset: &Params) -> Result<Value, ApiError> {
        self.call(
            ApiCall::new("set_ruleset")
                .request_format(Format::Python)
                .data(params(json!({
                    "ruleset_name": ruleset_name,
                    "ruleset": ruleset,
                }))),
        )
    }
}
