//! Folder commands.

use serde_json::{json, Value};

use super::params;
use crate::client::{ApiCall, WebApi};
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::Attributes;

impl<T: Transport> WebApi<T> {
    pub fn get_folder(&self, folder: &str, effective_attributes: bool) -> Result<Value, ApiError> {
        self.call(
            ApiCall::new("get_folder")
                .query("effective_attributes", effective_attributes)
                .data(params(json!({ "folder": folder }))),
        )
    }

    pub fn get_all_folders(&self) -> Result<Value, ApiError> {
        self.call(ApiCall::new("get_all_folders"))
    }

    /// With `create_parent_folders` off, every folder on the path but the
    /// last must already exist.
    pub fn add_folder(
        &self,
        folder: &str,
        create_parent_folders: bool,
        attributes: &Attributes,
    ) -> Result<Value, ApiError> {
        self.call(ApiCall::new("add_folder").data(params(json!({
            "folder": folder,
            "create_parent_folders": create_parent_folders,
            "attributes": attributes,
        }))))
    }

    pub fn edit_folder(&self, folder: &str, attributes: &Attributes) -> Result<Value, ApiError> {
        self.call(ApiCall::new("edit_folder").data(params(json!({
            "folder": folder,
            "attributes": attributes,
        }))))
    }

    pub fn delete_folder(&self, folder: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new("delete_folder").data(params(json!({ "folder": folder }))))
    }
}
