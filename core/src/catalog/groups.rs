//! Contact, host and service group commands.
//!
//! The three families share one set of actions that differ only in the
//! name stem (`add_hostgroup`, `add_servicegroup`, ...), so every method
//! takes a `GroupKind`.

use serde_json::{json, Value};
use tracing::warn;

use super::{expect_mapping, params};
use crate::client::{ApiCall, WebApi};
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::GroupKind;

fn action(verb: &str, kind: GroupKind) -> String {
    format!("{verb}_{}", kind.stem())
}

fn list_action(kind: GroupKind) -> String {
    format!("get_all_{}s", kind.stem())
}

impl<T: Transport> WebApi<T> {
    /// Fetch all groups of `kind` and pick `name` out of them.
    pub fn get_group(&self, kind: GroupKind, name: &str) -> Result<Value, ApiError> {
        let mut groups = expect_mapping(self.get_all_groups(kind)?, &list_action(kind))?;
        groups.remove(name).ok_or_else(|| ApiError::NotFound {
            kind: kind.label(),
            key: name.to_string(),
        })
    }

    pub fn get_all_groups(&self, kind: GroupKind) -> Result<Value, ApiError> {
        self.call(ApiCall::new(list_action(kind)))
    }

    pub fn add_group(&self, kind: GroupKind, name: &str, alias: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new(action("add", kind)).data(params(json!({
            "groupname": name,
            "alias": alias,
        }))))
    }

    pub fn edit_group(&self, kind: GroupKind, name: &str, alias: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new(action("edit", kind)).data(params(json!({
            "groupname": name,
            "alias": alias,
        }))))
    }

    pub fn delete_group(&self, kind: GroupKind, name: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new(action("delete", kind)).data(params(json!({ "groupname": name }))))
    }

    /// Delete every group of `kind` one call at a time. Stops at the first
    /// failure; groups already deleted stay deleted.
    pub fn delete_all_groups(&self, kind: GroupKind) -> Result<Vec<String>, ApiError> {
        let groups = expect_mapping(self.get_all_groups(kind)?, &list_action(kind))?;
        let mut deleted = Vec::with_capacity(groups.len());
        for name in groups.keys() {
            if let Err(err) = self.delete_group(kind, name) {
                warn!(group = %name, kind = kind.label(), deleted = deleted.len(), "delete_all_groups aborted");
                return Err(err);
            }
            deleted.push(name.clone());
        }
        Ok(deleted)
    }
}
