//! Distributed monitoring site commands.

use serde_json::{json, Value};

use super::params;
use crate::client::{ApiCall, WebApi};
use crate::error::ApiError;
use crate::format::Format;
use crate::http::Transport;
use crate::params::Params;

impl<T: Transport> WebApi<T> {
    pub fn get_site(&self, site_id: &str) -> Result<Value, ApiError> {
        self.call(
            ApiCall::new("get_site")
                .output_format_as(Format::Python)
                .data(params(json!({ "site_id": site_id }))),
        )
    }

    /// Replace the connection settings of a site; `site_config` has the
    /// shape `get_site` returns.
    pub fn set_site(&self, site_id: &str, site_config: &Params) -> Result<Value, ApiError> {
        self.call(
            ApiCall::new("set_site")
                .request_format(Format::Python)
                .data(params(json!({
                    "site_id": site_id,
                    "site_config": site_config,
                }))),
        )
    }

    pub fn delete_site(&self, site_id: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new("delete_site").data(params(json!({ "site_id": site_id }))))
    }

    pub fn login_site(&self, site_id: &str, username: &str, password: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new("login_site").data(params(json!({
            "site_id": site_id,
            "username": username,
            "password": password,
        }))))
    }

    pub fn logout_site(&self, site_id: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new("logout_site").data(params(json!({ "site_id": site_id }))))
    }
}
