//! Change activation and the agent bakery.

use serde_json::{json, Value};

use super::params;
use crate::client::{ApiCall, WebApi};
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::ActivateMode;

impl<T: Transport> WebApi<T> {
    /// Activate pending changes. `sites` only matters for
    /// `ActivateMode::Specific`.
    pub fn activate_changes(
        &self,
        mode: ActivateMode,
        sites: Option<&[String]>,
        allow_foreign_changes: bool,
    ) -> Result<Value, ApiError> {
        self.call(
            ApiCall::new("activate_changes")
                .query("mode", mode.as_str())
                .query("allow_foreign_changes", allow_foreign_changes)
                .data(params(json!({ "sites": sites }))),
        )
    }

    /// Bake all agents. Enterprise edition only.
    pub fn bake_agents(&self) -> Result<Value, ApiError> {
        self.call(ApiCall::new("bake_agents"))
    }
}
