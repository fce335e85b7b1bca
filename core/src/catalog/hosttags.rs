//! Host tag commands.
//!
//! The server only accepts the complete tag configuration. Callers read it
//! with `get_hosttags`, change it, and write it back; the
//! `configuration_hash` from the read lets the server reject the write if
//! someone else changed the tags in between. The hash is passed through
//! untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::{ApiCall, WebApi};
use crate::error::ApiError;
use crate::http::Transport;

/// The complete host tag configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostTagConfig {
    pub aux_tags: Vec<Value>,
    pub tag_groups: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_hash: Option<String>,
    /// Keys the server sends that this struct does not model.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl HostTagConfig {
    pub fn from_value(value: Value) -> Result<Self, ApiError> {
        let text = value.to_string();
        serde_json::from_value(value).map_err(|e| ApiError::malformed(&text, e.to_string()))
    }
}

impl<T: Transport> WebApi<T> {
    pub fn get_hosttags(&self) -> Result<Value, ApiError> {
        self.call(ApiCall::new("get_hosttags"))
    }

    /// Replace the whole host tag configuration.
    pub fn set_hosttags(&self, hosttags: &HostTagConfig) -> Result<Value, ApiError> {
        let data = match serde_json::to_value(hosttags) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(ApiError::Encode("host tags did not serialize to a mapping".into())),
            Err(e) => return Err(ApiError::Encode(e.to_string())),
        };
        self.call(ApiCall::new("set_hosttags").data(data))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::scripted::{api, Scripted};

    fn current() -> Value {
        json!({
            "aux_tags": [{"id": "snmp", "title": "SNMP"}],
            "tag_groups": [{"id": "agent", "tags": [{"id": "cmk-agent"}]}],
            "configuration_hash": "f31ea758a59473d15f378b692110996c",
        })
    }

    #[test]
    fn read_modify_write_keeps_configuration_hash() {
        let api = api(Scripted::default().ok(current()).ok(Value::Null));
        let mut config = HostTagConfig::from_value(api.get_hosttags().unwrap()).unwrap();
        config.aux_tags.push(json!({"id": "ping", "title": "Ping"}));
        api.set_hosttags(&config).unwrap();

        let payload = api.transport().payload(1);
        assert_eq!(payload["configuration_hash"], "f31ea758a59473d15f378b692110996c");
        assert_eq!(payload["aux_tags"].as_array().unwrap().len(), 2);
        assert_eq!(api.transport().actions(), ["get_hosttags", "set_hosttags"]);
    }

    #[test]
    fn missing_mandatory_keys_are_rejected() {
        let err = HostTagConfig::from_value(json!({"aux_tags": []})).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { .. }));
    }

    #[test]
    fn unknown_keys_survive_the_round_trip() {
        let mut value = current();
        value["builtin"] = json!({"tag_groups": []});
        let config = HostTagConfig::from_value(value).unwrap();
        assert!(config.other.contains_key("builtin"));
        assert!(serde_json::to_value(&config).unwrap().get("builtin").is_some());
    }

    #[test]
    fn empty_config_still_sends_both_lists() {
        let api = api(Scripted::default().ok(Value::Null));
        api.set_hosttags(&HostTagConfig::default()).unwrap();
        assert_eq!(api.transport().payload(0), json!({"aux_tags": [], "tag_groups": []}));
    }
}
