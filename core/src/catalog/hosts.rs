//! Host commands and service discovery.

use serde_json::{json, Value};
use tracing::warn;

use super::{expect_mapping, params};
use crate::client::{ApiCall, WebApi};
use crate::discovery::parse_counters;
use crate::error::ApiError;
use crate::http::Transport;
use crate::params::Params;
use crate::types::{Attributes, DiscoverMode, DiscoveryCounters, HostDiscovery, NewHost};

const TAG_PREFIX: &str = "tag_";

impl<T: Transport> WebApi<T> {
    /// Add a host that does not exist yet.
    pub fn add_host(&self, host: &NewHost) -> Result<Value, ApiError> {
        let mut attributes = host.extra.clone();
        if let Some(ipaddress) = &host.ipaddress {
            attributes.insert("ipaddress".into(), ipaddress.clone().into());
        }
        if let Some(alias) = &host.alias {
            attributes.insert("alias".into(), alias.clone().into());
        }
        for (tag, value) in &host.tags {
            let key = if tag.starts_with(TAG_PREFIX) {
                tag.clone()
            } else {
                format!("{TAG_PREFIX}{tag}")
            };
            attributes.insert(key, value.clone());
        }

        self.call(ApiCall::new("add_host").data(params(json!({
            "hostname": host.hostname,
            "folder": host.folder,
            "attributes": attributes,
        }))))
    }

    /// Set `attributes` on an existing host and unset the listed ones.
    pub fn edit_host(
        &self,
        hostname: &str,
        attributes: &Attributes,
        unset_attributes: Option<&[String]>,
    ) -> Result<Value, ApiError> {
        self.call(ApiCall::new("edit_host").data(params(json!({
            "hostname": hostname,
            "unset_attributes": unset_attributes,
            "attributes": attributes,
        }))))
    }

    pub fn delete_host(&self, hostname: &str) -> Result<Value, ApiError> {
        self.call(ApiCall::new("delete_host").data(params(json!({ "hostname": hostname }))))
    }

    /// Batch form of `delete_host`; backends before 1.5.0 only accept the
    /// single-name form.
    pub fn delete_hosts(&self, hostnames: &[String]) -> Result<Value, ApiError> {
        self.call(ApiCall::new("delete_host").data(params(json!({ "hostnames": hostnames }))))
    }

    /// Delete every host, one `delete_host` call each, and return the names
    /// deleted. A failure aborts the loop; hosts already deleted stay deleted.
    pub fn delete_all_hosts(&self) -> Result<Vec<String>, ApiError> {
        let hosts = expect_mapping(self.get_all_hosts(false)?, "get_all_hosts")?;
        let mut deleted = Vec::with_capacity(hosts.len());
        for hostname in hosts.keys() {
            if let Err(err) = self.delete_host(hostname) {
                warn!(%hostname, deleted = deleted.len(), "delete_all_hosts aborted");
                return Err(err);
            }
            deleted.push(hostname.clone());
        }
        Ok(deleted)
    }

    pub fn get_host(&self, hostname: &str, effective_attributes: bool) -> Result<Value, ApiError> {
        self.call(
            ApiCall::new("get_host")
                .query("effective_attributes", effective_attributes)
                .data(params(json!({ "hostname": hostname }))),
        )
    }

    pub fn get_all_hosts(&self, effective_attributes: bool) -> Result<Value, ApiError> {
        self.call(ApiCall::new("get_all_hosts").query("effective_attributes", effective_attributes))
    }

    /// Hosts whose `path` is exactly `folder`. Filters the full host list
    /// client-side.
    pub fn get_hosts_by_folder(
        &self,
        folder: &str,
        effective_attributes: bool,
    ) -> Result<Params, ApiError> {
        let hosts = expect_mapping(self.get_all_hosts(effective_attributes)?, "get_all_hosts")?;
        Ok(hosts
            .into_iter()
            .filter(|(_, host)| host.get("path").and_then(Value::as_str) == Some(folder))
            .collect())
    }

    pub fn discover_services(
        &self,
        hostname: &str,
        mode: DiscoverMode,
    ) -> Result<DiscoveryCounters, ApiError> {
        let result = self.call(
            ApiCall::new("discover_services")
                .query("mode", mode.as_str())
                .data(params(json!({ "hostname": hostname }))),
        )?;
        match result.as_str() {
            Some(message) => Ok(parse_counters(message)),
            None => Err(ApiError::malformed(
                &result.to_string(),
                "discover_services did not return a message",
            )),
        }
    }

    /// Run discovery host by host in listing order. Stops at the first
    /// failure.
    pub fn discover_services_for_all_hosts(
        &self,
        mode: DiscoverMode,
    ) -> Result<Vec<HostDiscovery>, ApiError> {
        let hosts = expect_mapping(self.get_all_hosts(false)?, "get_all_hosts")?;
        let mut results = Vec::with_capacity(hosts.len());
        for hostname in hosts.keys() {
            match self.discover_services(hostname, mode) {
                Ok(counters) => results.push(HostDiscovery {
                    hostname: hostname.clone(),
                    counters,
                }),
                Err(err) => {
                    warn!(%hostname, done = results.len(), "discover_services_for_all_hosts aborted");
                    return Err(err);
                }
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::scripted::{api, query_param, Scripted};

    fn five_hosts() -> Value {
        json!({
            "h1": {"path": "/"}, "h2": {"path": "/lab"}, "h3": {"path": "/lab"},
            "h4": {"path": "/lab/sub"}, "h5": {"path": "/"},
        })
    }

    #[test]
    fn add_host_prefixes_bare_tag_keys_once() {
        let api = api(Scripted::default().ok(Value::Null));
        let host = NewHost::new("web01")
            .folder("/lab")
            .ipaddress("10.0.0.1")
            .tag("os", "linux")
            .tag("tag_env", "prod");
        api.add_host(&host).unwrap();

        let payload = api.transport().payload(0);
        assert_eq!(
            payload,
            json!({
                "hostname": "web01",
                "folder": "/lab",
                "attributes": {"ipaddress": "10.0.0.1", "tag_os": "linux", "tag_env": "prod"},
            })
        );
        assert_eq!(api.transport().actions(), ["add_host"]);
    }

    #[test]
    fn named_fields_override_extra_attributes() {
        let api = api(Scripted::default().ok(Value::Null));
        let host = NewHost::new("web01")
            .attribute("alias", "from-extra")
            .attribute("site", "prod")
            .alias("named");
        api.add_host(&host).unwrap();
        let payload = api.transport().payload(0);
        let attributes = &payload["attributes"];
        assert_eq!(attributes["alias"], "named");
        assert_eq!(attributes["site"], "prod");
    }

    #[test]
    fn edit_host_omits_absent_unset_list() {
        let api = api(Scripted::default().ok(Value::Null).ok(Value::Null));
        let mut attributes = Attributes::new();
        attributes.insert("alias".into(), "new".into());
        api.edit_host("web01", &attributes, None).unwrap();
        api.edit_host("web01", &Attributes::new(), Some(&["alias".to_string()][..])).unwrap();

        assert_eq!(
            api.transport().payload(0),
            json!({"hostname": "web01", "attributes": {"alias": "new"}})
        );
        assert_eq!(
            api.transport().payload(1),
            json!({"hostname": "web01", "unset_attributes": ["alias"], "attributes": {}})
        );
    }

    #[test]
    fn single_and_batch_delete_use_different_keys() {
        let api = api(Scripted::default().ok(Value::Null).ok(Value::Null));
        api.delete_host("a").unwrap();
        api.delete_hosts(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(api.transport().actions(), ["delete_host", "delete_host"]);
        assert_eq!(api.transport().payload(0), json!({"hostname": "a"}));
        assert_eq!(api.transport().payload(1), json!({"hostnames": ["a", "b"]}));
    }

    #[test]
    fn get_host_sends_effective_attributes_flag() {
        let api = api(Scripted::default().ok(json!({"attributes": {}})));
        api.get_host("web01", true).unwrap();
        let url = api.transport().url(0);
        assert_eq!(query_param(&url, "effective_attributes").as_deref(), Some("1"));
    }

    #[test]
    fn delete_all_hosts_stops_at_first_failure() {
        let api = api(Scripted::default()
            .ok(five_hosts())
            .ok(Value::Null)
            .ok(Value::Null)
            .fail(1, "host is locked"));

        let err = api.delete_all_hosts().unwrap_err();
        assert!(matches!(err, ApiError::Result { code: 1, .. }));

        let transport = api.transport();
        assert_eq!(
            transport.actions(),
            ["get_all_hosts", "delete_host", "delete_host", "delete_host"]
        );
        assert_eq!(transport.payload(1), json!({"hostname": "h1"}));
        assert_eq!(transport.payload(2), json!({"hostname": "h2"}));
        assert_eq!(transport.payload(3), json!({"hostname": "h3"}));
    }

    #[test]
    fn delete_all_hosts_reports_deleted_names_in_order() {
        let api = api(Scripted::default()
            .ok(json!({"b": {}, "a": {}}))
            .ok(Value::Null)
            .ok(Value::Null));
        assert_eq!(api.delete_all_hosts().unwrap(), ["b", "a"]);
    }

    #[test]
    fn hosts_by_folder_filters_locally() {
        let api = api(Scripted::default().ok(five_hosts()));
        let hosts = api.get_hosts_by_folder("/lab", false).unwrap();
        assert_eq!(hosts.keys().collect::<Vec<_>>(), ["h2", "h3"]);
        assert_eq!(api.transport().actions(), ["get_all_hosts"]);
    }

    #[test]
    fn hosts_by_folder_rejects_non_mapping_listing() {
        let api = api(Scripted::default().ok(json!(["h1"])));
        let err = api.get_hosts_by_folder("/", false).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { .. }));
    }

    #[test]
    fn discover_services_parses_counters_and_sends_mode() {
        let api = api(Scripted::default().ok(json!("Service discovery successful. Added 3, Removed 0, Kept 5, New Count 8")));
        let counters = api.discover_services("web01", DiscoverMode::FixAll).unwrap();
        assert_eq!(
            counters,
            DiscoveryCounters {
                added: Some(3),
                removed: Some(0),
                kept: Some(5),
                new_count: Some(8),
            }
        );
        let url = api.transport().url(0);
        assert_eq!(query_param(&url, "mode").as_deref(), Some("fixall"));
    }

    #[test]
    fn discover_services_rejects_non_message_result() {
        let api = api(Scripted::default()
            .ok(json!({"added": 3}))
            .ok(json!(3))
            .ok(Value::Null));
        for _ in 0..3 {
            let err = api.discover_services("web01", DiscoverMode::New).unwrap_err();
            assert!(matches!(
                err,
                ApiError::MalformedResponse { ref reason, .. } if reason.contains("did not return a message")
            ));
        }
    }

    #[test]
    fn discovery_for_all_hosts_runs_in_listing_order() {
        let api = api(Scripted::default()
            .ok(json!({"b": {}, "a": {}}))
            .ok(json!("1 new"))
            .ok(json!("Added 2, removed 0, kept 1, 2 new")));
        let results = api.discover_services_for_all_hosts(DiscoverMode::New).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].hostname, "b");
        assert_eq!(results[0].counters.new_count, Some(1));
        assert_eq!(results[1].hostname, "a");
        assert_eq!(results[1].counters.added, Some(2));
    }

    #[test]
    fn discovery_for_all_hosts_aborts_on_error() {
        let api = api(Scripted::default()
            .ok(json!({"a": {}, "b": {}, "c": {}}))
            .ok(json!("1 new"))
            .fail(1, "no such host"));
        assert!(api.discover_services_for_all_hosts(DiscoverMode::Refresh).is_err());
        assert_eq!(api.transport().requests.borrow().len(), 3);
    }
}
