//! Typed arguments and results for the operation catalog.
//!
//! # Design
//! Mode selectors are closed enums with a fixed wire-name table so a match
//! over them is checked for exhaustiveness. Free-form attribute mappings stay
//! `serde_json` maps: the set of host, folder and user attributes is defined
//! by the remote configuration, not by this crate.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form attribute mapping (host, folder, user, site attributes).
pub type Attributes = Map<String, Value>;

/// Service discovery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverMode {
    /// Only discover new services.
    #[default]
    New,
    /// Remove vanished services.
    Remove,
    /// Remove vanished and add new services (tabula rasa).
    FixAll,
    /// Throw away all services and discover from scratch.
    Refresh,
}

impl DiscoverMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscoverMode::New => "new",
            DiscoverMode::Remove => "remove",
            DiscoverMode::FixAll => "fixall",
            DiscoverMode::Refresh => "refresh",
        }
    }
}

impl fmt::Display for DiscoverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which sites a change activation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivateMode {
    /// Sites with pending changes.
    #[default]
    Dirty,
    /// All sites.
    All,
    /// Only the sites listed in the call.
    Specific,
}

impl ActivateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivateMode::Dirty => "dirty",
            ActivateMode::All => "all",
            ActivateMode::Specific => "specific",
        }
    }
}

impl fmt::Display for ActivateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three independent group families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Contact,
    Host,
    Service,
}

impl GroupKind {
    /// Action-name stem, e.g. `hostgroup` in `add_hostgroup`.
    pub fn stem(self) -> &'static str {
        match self {
            GroupKind::Contact => "contactgroup",
            GroupKind::Host => "hostgroup",
            GroupKind::Service => "servicegroup",
        }
    }

    /// Human-readable name used in lookup errors.
    pub fn label(self) -> &'static str {
        match self {
            GroupKind::Contact => "contact group",
            GroupKind::Host => "host group",
            GroupKind::Service => "service group",
        }
    }
}

/// A host to create with `WebApi::add_host`.
///
/// `extra` attributes are laid down first; `ipaddress` and `alias`, when
/// set, overwrite same-named extras; `tags` are applied last. Tag keys
/// without a `tag_` prefix get one.
#[derive(Debug, Clone, Default)]
pub struct NewHost {
    pub hostname: String,
    pub folder: String,
    pub ipaddress: Option<String>,
    pub alias: Option<String>,
    pub tags: Map<String, Value>,
    pub extra: Attributes,
}

impl NewHost {
    /// A host in the root folder with no attributes.
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            folder: "/".to_string(),
            ..Self::default()
        }
    }

    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    pub fn ipaddress(mut self, ipaddress: impl Into<String>) -> Self {
        self.ipaddress = Some(ipaddress.into());
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Service counts scraped from a discovery result message. A counter the
/// message does not mention is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryCounters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kept: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_count: Option<u64>,
}

/// Discovery outcome for one host of a fan-out run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDiscovery {
    pub hostname: String,
    pub counters: DiscoveryCounters,
}
