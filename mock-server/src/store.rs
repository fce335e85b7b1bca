//! In-memory configuration behind the fake `webapi.py`.
//!
//! `Store::dispatch` takes the action name, the query parameters and the
//! decoded `request` payload and returns either the `result` value or the
//! message that the envelope reports with `result_code` 1.

use std::collections::BTreeMap;

use cmk_core::Params;
use serde::Serialize;
use serde_json::{json, Value};

pub type ActionResult = Result<Value, String>;

const GROUP_STEMS: [&str; 3] = ["contactgroup", "hostgroup", "servicegroup"];
const KNOWN_RULESETS: [&str; 3] = [
    "ignored_services",
    "host_groups",
    "extra_host_conf:notification_options",
];
/// Services a host reports on its first discovery.
const DISCOVERED_SERVICES: u64 = 3;

#[derive(Debug, Clone, Serialize)]
struct Host {
    hostname: String,
    path: String,
    attributes: Params,
}

#[derive(Debug)]
pub struct Store {
    hosts: BTreeMap<String, Host>,
    services: BTreeMap<String, u64>,
    folders: BTreeMap<String, Params>,
    groups: BTreeMap<&'static str, BTreeMap<String, String>>,
    users: BTreeMap<String, Params>,
    rulesets: BTreeMap<String, Params>,
    hosttags: Params,
    sites: BTreeMap<String, Params>,
    revision: u64,
    pending_changes: u64,
}

impl Default for Store {
    fn default() -> Self {
        let mut local = Params::new();
        local.insert("alias".into(), "Local site".into());
        local.insert("disabled".into(), false.into());

        let mut hosttags = Params::new();
        hosttags.insert("tag_groups".into(), json!([]));
        hosttags.insert("aux_tags".into(), json!([]));

        Self {
            hosts: BTreeMap::new(),
            services: BTreeMap::new(),
            folders: BTreeMap::from([(String::new(), Params::new())]),
            groups: GROUP_STEMS.iter().map(|&stem| (stem, BTreeMap::new())).collect(),
            users: BTreeMap::new(),
            rulesets: KNOWN_RULESETS
                .iter()
                .map(|&name| (name.to_string(), Params::new()))
                .collect(),
            hosttags,
            sites: BTreeMap::from([("local".to_string(), local)]),
            revision: 1,
            pending_changes: 0,
        }
    }
}

fn text<'a>(params: &'a Params, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("Missing required key: {key}"))
}

fn mapping(params: &Params, key: &str) -> Params {
    params
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn names<'a>(params: &'a Params, key: &str) -> impl Iterator<Item = &'a str> {
    params
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

/// Flags arrive as `"1"`/`"0"` after client-side shaping.
fn flag(params: &Params, key: &str) -> bool {
    match params.get(key) {
        Some(Value::String(s)) => s == "1",
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

fn folder_key(path: &str) -> String {
    path.trim_matches('/').to_string()
}

fn parent_folder(key: &str) -> &str {
    key.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// `key` and every folder above it, root first.
fn folder_chain(key: &str) -> Vec<String> {
    let mut chain = vec![String::new()];
    let mut current = String::new();
    for part in key.split('/').filter(|part| !part.is_empty()) {
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(part);
        chain.push(current.clone());
    }
    chain
}

fn group_action(action: &str) -> Option<(&str, &'static str)> {
    GROUP_STEMS.iter().find_map(|&stem| {
        if action.strip_prefix("get_all_").and_then(|rest| rest.strip_suffix('s')) == Some(stem) {
            return Some(("get_all", stem));
        }
        let verb = action.strip_suffix(stem)?.strip_suffix('_')?;
        matches!(verb, "add" | "edit" | "delete").then_some((verb, stem))
    })
}

impl Store {
    pub fn dispatch(&mut self, action: &str, query: &Params, request: &Params) -> ActionResult {
        if let Some((verb, stem)) = group_action(action) {
            return self.group(verb, stem, request);
        }
        match action {
            "add_host" => self.add_host(request),
            "edit_host" => self.edit_host(request),
            "delete_host" => self.delete_host(request),
            "get_host" => self.get_host(request, flag(query, "effective_attributes")),
            "get_all_hosts" => Ok(self.all_hosts(flag(query, "effective_attributes"))),
            "discover_services" => self.discover_services(query, request),
            "get_folder" => self.get_folder(request, flag(query, "effective_attributes")),
            "get_all_folders" => Ok(self.all_folders(flag(query, "effective_attributes"))),
            "add_folder" => self.add_folder(request),
            "edit_folder" => self.edit_folder(request),
            "delete_folder" => self.delete_folder(request),
            "get_all_users" => Ok(self.all_users()),
            "add_users" => self.add_users(request),
            "edit_users" => self.edit_users(request),
            "delete_users" => self.delete_users(request),
            "get_ruleset" => self.get_ruleset(request),
            "set_ruleset" => self.set_ruleset(request),
            "get_rulesets_info" => Ok(self.rulesets_info()),
            "get_hosttags" => Ok(self.get_hosttags()),
            "set_hosttags" => self.set_hosttags(request),
            "get_site" => self.get_site(request),
            "set_site" => self.set_site(request),
            "delete_site" => self.delete_site(request),
            "login_site" => self.login_site(request, true),
            "logout_site" => self.login_site(request, false),
            "activate_changes" => self.activate_changes(query, request),
            "bake_agents" => Ok(Value::Null),
            other => Err(format!("Unknown API action {other}")),
        }
    }

    fn changed(&mut self) -> ActionResult {
        self.revision += 1;
        self.pending_changes += 1;
        Ok(Value::Null)
    }

    fn configuration_hash(&self) -> String {
        format!("{:032x}", self.revision)
    }

    fn check_hash(&self, request: &Params) -> Result<(), String> {
        match request.get("configuration_hash").and_then(Value::as_str) {
            Some(hash) if hash != self.configuration_hash() => Err(
                "The configuration has changed in the meantime. You need to load it again."
                    .to_string(),
            ),
            _ => Ok(()),
        }
    }

    // Hosts

    fn effective_attributes(&self, path: &str, own: &Params) -> Params {
        let mut merged = Params::new();
        for key in folder_chain(path) {
            if let Some(attributes) = self.folders.get(&key) {
                merged.extend(attributes.clone());
            }
        }
        merged.extend(own.clone());
        merged
    }

    fn render_host(&self, host: &Host, effective: bool) -> Value {
        let mut rendered = host.clone();
        if effective {
            rendered.attributes = self.effective_attributes(&host.path, &host.attributes);
        }
        serde_json::to_value(rendered).unwrap_or_default()
    }

    fn host(&self, hostname: &str) -> Result<&Host, String> {
        self.hosts
            .get(hostname)
            .ok_or_else(|| format!("No such host: {hostname}"))
    }

    fn add_host(&mut self, request: &Params) -> ActionResult {
        let hostname = text(request, "hostname")?;
        let path = folder_key(request.get("folder").and_then(Value::as_str).unwrap_or(""));
        if let Some(existing) = self.hosts.get(hostname) {
            return Err(format!(
                "Host {hostname} already exists in the folder '{}'",
                existing.path
            ));
        }
        if !self.folders.contains_key(&path) {
            return Err(format!("Folder '{path}' does not exist"));
        }
        self.hosts.insert(
            hostname.to_string(),
            Host {
                hostname: hostname.to_string(),
                path,
                attributes: mapping(request, "attributes"),
            },
        );
        self.changed()
    }

    fn edit_host(&mut self, request: &Params) -> ActionResult {
        let hostname = text(request, "hostname")?;
        let host = self
            .hosts
            .get_mut(hostname)
            .ok_or_else(|| format!("No such host: {hostname}"))?;
        host.attributes.extend(mapping(request, "attributes"));
        for key in names(request, "unset_attributes") {
            host.attributes.remove(key);
        }
        self.changed()
    }

    fn delete_host(&mut self, request: &Params) -> ActionResult {
        let hostnames: Vec<&str> = match request.get("hostnames") {
            Some(_) => names(request, "hostnames").collect(),
            None => vec![text(request, "hostname")?],
        };
        for hostname in &hostnames {
            self.host(hostname)?;
        }
        for hostname in hostnames {
            self.hosts.remove(hostname);
            self.services.remove(hostname);
        }
        self.changed()
    }

    fn get_host(&self, request: &Params, effective: bool) -> ActionResult {
        let host = self.host(text(request, "hostname")?)?;
        Ok(self.render_host(host, effective))
    }

    fn all_hosts(&self, effective: bool) -> Value {
        Value::Object(
            self.hosts
                .iter()
                .map(|(name, host)| (name.clone(), self.render_host(host, effective)))
                .collect(),
        )
    }

    fn discover_services(&mut self, query: &Params, request: &Params) -> ActionResult {
        let hostname = text(request, "hostname")?;
        self.host(hostname)?;
        let known = self.services.get(hostname).copied().unwrap_or(0);
        let mode = query.get("mode").and_then(Value::as_str).unwrap_or("new");
        let (added, removed, kept) = match mode {
            "new" | "fixall" if known == 0 => (DISCOVERED_SERVICES, 0, 0),
            "new" | "fixall" | "remove" => (0, 0, known),
            "refresh" => (DISCOVERED_SERVICES, known, 0),
            other => return Err(format!("Invalid discovery mode: {other}")),
        };
        let total = kept + added;
        self.services.insert(hostname.to_string(), total);
        if added + removed > 0 {
            self.changed()?;
        }
        Ok(format!(
            "Service discovery successful. Added {added}, Removed {removed}, Kept {kept}, New Count {total}"
        )
        .into())
    }

    // Folders

    fn folder_attributes(&self, key: &str, effective: bool) -> Params {
        let own = self.folders.get(key).cloned().unwrap_or_default();
        if effective {
            self.effective_attributes(parent_folder(key), &own)
        } else {
            own
        }
    }

    fn existing_folder(&self, request: &Params) -> Result<String, String> {
        let key = folder_key(text(request, "folder")?);
        if self.folders.contains_key(&key) {
            Ok(key)
        } else {
            Err(format!("Folder '{key}' does not exist"))
        }
    }

    fn get_folder(&self, request: &Params, effective: bool) -> ActionResult {
        let key = self.existing_folder(request)?;
        Ok(json!({
            "attributes": self.folder_attributes(&key, effective),
            "configuration_hash": self.configuration_hash(),
        }))
    }

    fn all_folders(&self, effective: bool) -> Value {
        Value::Object(
            self.folders
                .keys()
                .map(|key| (key.clone(), Value::Object(self.folder_attributes(key, effective))))
                .collect(),
        )
    }

    fn add_folder(&mut self, request: &Params) -> ActionResult {
        let key = folder_key(text(request, "folder")?);
        if self.folders.contains_key(&key) {
            return Err(format!("Folder '{key}' already exists"));
        }
        let parent = parent_folder(&key);
        if !self.folders.contains_key(parent) {
            if !flag(request, "create_parent_folders") {
                return Err(format!("Parent folder '{parent}' does not exist"));
            }
            for ancestor in folder_chain(parent) {
                self.folders.entry(ancestor).or_default();
            }
        }
        self.folders.insert(key, mapping(request, "attributes"));
        self.changed()
    }

    fn edit_folder(&mut self, request: &Params) -> ActionResult {
        let key = self.existing_folder(request)?;
        self.check_hash(request)?;
        self.folders.insert(key, mapping(request, "attributes"));
        self.changed()
    }

    /// Removes the folder, its subfolders and every host inside them.
    fn delete_folder(&mut self, request: &Params) -> ActionResult {
        let key = self.existing_folder(request)?;
        if key.is_empty() {
            return Err("The root folder cannot be deleted".to_string());
        }
        let inside = |path: &str| path == key || path.starts_with(&format!("{key}/"));
        self.folders.retain(|path, _| !inside(path.as_str()));
        self.hosts.retain(|_, host| !inside(host.path.as_str()));
        self.changed()
    }

    // Groups

    fn group(&mut self, verb: &str, stem: &'static str, request: &Params) -> ActionResult {
        let groups = self.groups.entry(stem).or_default();
        if verb == "get_all" {
            return Ok(Value::Object(
                groups
                    .iter()
                    .map(|(name, alias)| (name.clone(), json!({ "alias": alias })))
                    .collect(),
            ));
        }

        let name = text(request, "groupname")?;
        match verb {
            "add" => {
                if groups.contains_key(name) {
                    return Err(format!("Group name {name} already exists"));
                }
                groups.insert(name.to_string(), text(request, "alias")?.to_string());
            }
            "edit" => {
                let alias = groups
                    .get_mut(name)
                    .ok_or_else(|| format!("Unknown {stem}: {name}"))?;
                *alias = text(request, "alias")?.to_string();
            }
            _ => {
                groups
                    .remove(name)
                    .ok_or_else(|| format!("Unknown {stem}: {name}"))?;
            }
        }
        self.changed()
    }

    // Users

    fn all_users(&self) -> Value {
        Value::Object(
            self.users
                .iter()
                .map(|(id, attributes)| {
                    let mut visible = attributes.clone();
                    visible.remove("password");
                    (id.clone(), Value::Object(visible))
                })
                .collect(),
        )
    }

    fn add_users(&mut self, request: &Params) -> ActionResult {
        let users = mapping(request, "users");
        if let Some(id) = users.keys().find(|id| self.users.contains_key(*id)) {
            return Err(format!("User {id} already exists"));
        }
        for (id, attributes) in users {
            self.users
                .insert(id, attributes.as_object().cloned().unwrap_or_default());
        }
        self.changed()
    }

    fn edit_users(&mut self, request: &Params) -> ActionResult {
        let changes = mapping(request, "users");
        if let Some(id) = changes.keys().find(|id| !self.users.contains_key(*id)) {
            return Err(format!("Unknown user: {id}"));
        }
        for (id, change) in changes {
            let Some(change) = change.as_object() else {
                continue;
            };
            if let Some(user) = self.users.get_mut(&id) {
                user.extend(mapping(change, "set_attributes"));
                for key in names(change, "unset_attributes") {
                    user.remove(key);
                }
            }
        }
        self.changed()
    }

    fn delete_users(&mut self, request: &Params) -> ActionResult {
        let ids: Vec<&str> = names(request, "users").collect();
        if let Some(id) = ids.iter().find(|id| !self.users.contains_key(**id)) {
            return Err(format!("Unknown user: {id}"));
        }
        for id in ids {
            self.users.remove(id);
        }
        self.changed()
    }

    // Rulesets

    fn get_ruleset(&self, request: &Params) -> ActionResult {
        let name = text(request, "ruleset_name")?;
        let ruleset = self
            .rulesets
            .get(name)
            .ok_or_else(|| format!("Unknown ruleset: {name}"))?;
        Ok(json!({
            "ruleset": ruleset,
            "configuration_hash": self.configuration_hash(),
        }))
    }

    fn set_ruleset(&mut self, request: &Params) -> ActionResult {
        let name = text(request, "ruleset_name")?;
        if !self.rulesets.contains_key(name) {
            return Err(format!("Unknown ruleset: {name}"));
        }
        self.check_hash(request)?;
        self.rulesets
            .insert(name.to_string(), mapping(request, "ruleset"));
        self.changed()
    }

    fn rulesets_info(&self) -> Value {
        Value::Object(
            self.rulesets
                .iter()
                .map(|(name, ruleset)| {
                    let rules: usize = ruleset
                        .values()
                        .filter_map(Value::as_array)
                        .map(Vec::len)
                        .sum();
                    (
                        name.clone(),
                        json!({ "title": name, "help": null, "number_of_rules": rules }),
                    )
                })
                .collect(),
        )
    }

    // Host tags

    fn get_hosttags(&self) -> Value {
        let mut config = self.hosttags.clone();
        config.insert("configuration_hash".into(), self.configuration_hash().into());
        config.into()
    }

    fn set_hosttags(&mut self, request: &Params) -> ActionResult {
        for key in ["tag_groups", "aux_tags"] {
            if !request.get(key).is_some_and(Value::is_array) {
                return Err(format!("Missing required key: {key}"));
            }
        }
        self.check_hash(request)?;
        let mut config = request.clone();
        config.remove("configuration_hash");
        self.hosttags = config;
        self.changed()
    }

    // Sites

    fn site(&self, request: &Params) -> Result<&Params, String> {
        let site_id = text(request, "site_id")?;
        self.sites
            .get(site_id)
            .ok_or_else(|| format!("Site {site_id} does not exist"))
    }

    fn get_site(&self, request: &Params) -> ActionResult {
        Ok(json!({
            "site_id": text(request, "site_id")?,
            "site_config": self.site(request)?,
            "configuration_hash": self.configuration_hash(),
        }))
    }

    fn set_site(&mut self, request: &Params) -> ActionResult {
        let site_id = text(request, "site_id")?;
        self.check_hash(request)?;
        self.sites
            .insert(site_id.to_string(), mapping(request, "site_config"));
        self.changed()
    }

    fn delete_site(&mut self, request: &Params) -> ActionResult {
        let site_id = text(request, "site_id")?;
        self.sites
            .remove(site_id)
            .ok_or_else(|| format!("Site {site_id} does not exist"))?;
        self.changed()
    }

    /// Session handling is not modelled; only the arguments are checked.
    fn login_site(&self, request: &Params, login: bool) -> ActionResult {
        if login {
            text(request, "username")?;
            text(request, "password")?;
        }
        self.site(request)?;
        Ok(Value::Null)
    }

    // Activation

    fn activate_changes(&mut self, query: &Params, request: &Params) -> ActionResult {
        let mode = query.get("mode").and_then(Value::as_str).unwrap_or("dirty");
        let targets: Vec<String> = match mode {
            "specific" => {
                let requested: Vec<String> = names(request, "sites").map(str::to_string).collect();
                if requested.is_empty() {
                    return Err("Mode specific needs at least one site".to_string());
                }
                if let Some(unknown) = requested.iter().find(|id| !self.sites.contains_key(*id)) {
                    return Err(format!("Site {unknown} does not exist"));
                }
                requested
            }
            "dirty" | "all" => self.sites.keys().cloned().collect(),
            other => return Err(format!("Invalid activation mode: {other}")),
        };
        if mode == "dirty" && self.pending_changes == 0 {
            return Err("Currently there are no changes to activate.".to_string());
        }
        self.pending_changes = 0;
        Ok(json!({
            "sites": targets
                .into_iter()
                .map(|id| (id, json!({"_state": "success", "_status_text": "Success"})))
                .collect::<Params>(),
        }))
    }
}
