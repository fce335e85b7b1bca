//! User commands.

use serde_json::{json, Value};

use super::{expect_mapping, params};
use crate::client::{ApiCall, WebApi};
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::Attributes;

impl<T: Transport> WebApi<T> {
    /// Fetch all users and pick `user_id` out of them.
    pub fn get_user(&self, user_id: &str) -> Result<Value, ApiError> {
        let mut users = expect_mapping(self.get_all_users()?, "get_all_users")?;
        users.remove(user_id).ok_or_else(|| ApiError::NotFound {
            kind: "user",
            key: user_id.to_string(),
        })
    }

    pub fn get_all_users(&self) -> Result<Value, ApiError> {
        self.call(ApiCall::new("get_all_users"))
    }

    /// Add a user who logs in with `password`. `extra` attributes are
    /// overridden by `alias` and `password`.
    pub fn add_user(
        &self,
        user_id: &str,
        alias: &str,
        password: &str,
        extra: &Attributes,
    ) -> Result<Value, ApiError> {
        self.add_users_entry(user_id, extra, [("alias", alias), ("password", password)])
    }

    /// Add an automation user who authenticates with `automation_secret`.
    pub fn add_automation_user(
        &self,
        user_id: &str,
        alias: &str,
        automation_secret: &str,
        extra: &Attributes,
    ) -> Result<Value, ApiError> {
        self.add_users_entry(
            user_id,
            extra,
            [("alias", alias), ("automation_secret", automation_secret)],
        )
    }

    fn add_users_entry(
        &self,
        user_id: &str,
        extra: &Attributes,
        named: [(&str, &str); 2],
    ) -> Result<Value, ApiError> {
        let mut user = extra.clone();
        for (key, value) in named {
            user.insert(key.to_string(), value.into());
        }
        self.call(ApiCall::new("add_users").data(params(json!({
            "users": { user_id: user },
        }))))
    }

    pub fn edit_user(
        &self,
        user_id: &str,
        attributes: &Attributes,
        unset_attributes: &[String],
    ) -> Result<Value, ApiError> {
        self.call(ApiCall::new("edit_users").data(params(json!({
            "users": {
                user_id: {
                    "set_attributes": attributes,
                    "unset_attributes": unset_attributes,
                }
            },
        }))))
    }

    pub fn delete_user(&self, user_id: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new("delete_users").data(params(json!({ "users": [user_id] }))))
    }
}
