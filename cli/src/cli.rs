//! Command-line argument parsing with clap.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use cmk_core::{ActivateMode, DiscoverMode, Format, Params};
use serde_json::Value;

/// Manage a Check_MK site through its web API.
#[derive(Parser, Debug, Clone)]
#[command(name = "cmkclient")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Site URL: the site root, its check_mk directory or webapi.py itself.
    /// Falls back to CHECK_MK_URL.
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Automation user name. Falls back to CHECK_MK_USER.
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Automation secret. Falls back to CHECK_MK_SECRET.
    #[arg(long, global = true)]
    pub secret: Option<String>,

    /// Print results as single-line JSON.
    #[arg(long, global = true)]
    pub compact: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Parse a `KEY=VALUE` pair. The value is kept as a string.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Parse a JSON object given on the command line.
pub fn parse_json_object(s: &str) -> Result<Params, String> {
    match serde_json::from_str(s) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

/// Repeated `--attr KEY=VALUE` flags.
#[derive(Args, Debug, Clone, Default)]
pub struct AttributeArgs {
    /// Attribute to set (KEY=VALUE), repeatable.
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub attributes: Vec<(String, String)>,
}

/// Service discovery mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DiscoverModeArg {
    /// Only add new services.
    #[default]
    New,
    /// Only remove vanished services.
    Remove,
    /// Add new and remove vanished services.
    #[value(name = "fixall")]
    FixAll,
    /// Drop all services and discover from scratch.
    Refresh,
}

impl From<DiscoverModeArg> for DiscoverMode {
    fn from(arg: DiscoverModeArg) -> Self {
        match arg {
            DiscoverModeArg::New => Self::New,
            DiscoverModeArg::Remove => Self::Remove,
            DiscoverModeArg::FixAll => Self::FixAll,
            DiscoverModeArg::Refresh => Self::Refresh,
        }
    }
}

/// Which sites to activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ActivateModeArg {
    /// Sites with pending changes.
    #[default]
    Dirty,
    /// Every site.
    All,
    /// The sites given with --site.
    Specific,
}

impl From<ActivateModeArg> for ActivateMode {
    fn from(arg: ActivateModeArg) -> Self {
        match arg {
            ActivateModeArg::Dirty => Self::Dirty,
            ActivateModeArg::All => Self::All,
            ActivateModeArg::Specific => Self::Specific,
        }
    }
}

/// Wire encoding for `call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FormatArg {
    #[default]
    Json,
    Python,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Self::Json,
            FormatArg::Python => Self::Python,
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Activate pending changes.
    ActivateChanges {
        #[arg(long, value_enum, default_value_t = ActivateModeArg::Dirty)]
        mode: ActivateModeArg,

        /// Site to activate with --mode specific, repeatable.
        #[arg(long = "site")]
        sites: Vec<String>,

        /// Also activate changes made by other users.
        #[arg(long)]
        allow_foreign_changes: bool,
    },

    /// Add a host.
    AddHost {
        hostname: String,

        /// Folder path to create the host in.
        #[arg(long, default_value = "/")]
        folder: String,

        #[arg(long)]
        ipaddress: Option<String>,

        #[arg(long)]
        alias: Option<String>,

        /// Host tag (TAG=VALUE), repeatable; `tag_` is prepended when missing.
        #[arg(long = "tag", value_name = "TAG=VALUE", value_parser = parse_key_value)]
        tags: Vec<(String, String)>,

        #[command(flatten)]
        attributes: AttributeArgs,
    },

    /// Change attributes of a host.
    EditHost {
        hostname: String,

        #[command(flatten)]
        attributes: AttributeArgs,

        /// Attribute to unset, repeatable.
        #[arg(long = "unset", value_name = "KEY")]
        unset: Vec<String>,
    },

    /// Delete one host.
    DeleteHost { hostname: String },

    /// Delete several hosts in one call.
    DeleteHosts {
        #[arg(required = true)]
        hostnames: Vec<String>,
    },

    /// Delete every host, one call each.
    DeleteAllHosts,

    /// Show a host.
    GetHost {
        hostname: String,

        /// Include attributes inherited from folders.
        #[arg(long)]
        effective_attributes: bool,
    },

    /// List all hosts.
    GetAllHosts {
        #[arg(long)]
        effective_attributes: bool,
    },

    /// List the hosts directly in a folder.
    GetHostsByFolder {
        folder: String,

        #[arg(long)]
        effective_attributes: bool,
    },

    /// Run service discovery on a host.
    DiscoverServices {
        hostname: String,

        #[arg(long, value_enum, default_value_t = DiscoverModeArg::New)]
        mode: DiscoverModeArg,
    },

    /// Run service discovery on every host, one call each.
    DiscoverServicesForAllHosts {
        #[arg(long, value_enum, default_value_t = DiscoverModeArg::New)]
        mode: DiscoverModeArg,
    },

    /// Show a folder.
    GetFolder {
        folder: String,

        #[arg(long)]
        effective_attributes: bool,
    },

    /// List all folders.
    GetAllFolders,

    /// Create a folder.
    AddFolder {
        folder: String,

        /// Create missing parent folders too. Pass `false` to require them.
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        create_parent_folders: bool,

        #[command(flatten)]
        attributes: AttributeArgs,
    },

    /// Replace the attributes of a folder.
    EditFolder {
        folder: String,

        #[command(flatten)]
        attributes: AttributeArgs,
    },

    /// Delete a folder with everything in it.
    DeleteFolder { folder: String },

    /// Contact group commands.
    Contactgroup {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Host group commands.
    Hostgroup {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Service group commands.
    Servicegroup {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// Show a user.
    GetUser { user_id: String },

    /// List all users.
    GetAllUsers,

    /// Add a user who logs in with a password.
    AddUser {
        user_id: String,

        #[arg(long)]
        alias: String,

        #[arg(long)]
        password: String,

        #[command(flatten)]
        attributes: AttributeArgs,
    },

    /// Add an automation user.
    AddAutomationUser {
        user_id: String,

        #[arg(long)]
        alias: String,

        #[arg(long)]
        automation_secret: String,

        #[command(flatten)]
        attributes: AttributeArgs,
    },

    /// Change attributes of a user.
    EditUser {
        user_id: String,

        #[command(flatten)]
        attributes: AttributeArgs,

        /// Attribute to unset, repeatable.
        #[arg(long = "unset", value_name = "KEY")]
        unset: Vec<String>,
    },

    /// Delete a user.
    DeleteUser { user_id: String },

    /// Show a rule set.
    GetRuleset { ruleset_name: String },

    /// List all rule sets.
    GetRulesetsInfo,

    /// Replace a rule set with a JSON document.
    SetRuleset {
        ruleset_name: String,

        #[arg(value_name = "JSON", value_parser = parse_json_object)]
        ruleset: Params,
    },

    /// Show the host tag configuration.
    GetHosttags,

    /// Replace the host tag configuration with a JSON document.
    SetHosttags {
        #[arg(value_name = "JSON", value_parser = parse_json_object)]
        hosttags: Params,
    },

    /// Show a site's connection settings.
    GetSite { site_id: String },

    /// Replace a site's connection settings with a JSON document.
    SetSite {
        site_id: String,

        #[arg(value_name = "JSON", value_parser = parse_json_object)]
        site_config: Params,
    },

    /// Delete a site.
    DeleteSite { site_id: String },

    /// Log in to a remote site.
    LoginSite {
        site_id: String,

        #[arg(value_name = "USER")]
        site_username: String,

        #[arg(value_name = "PASSWORD")]
        site_password: String,
    },

    /// Log out of a remote site.
    LogoutSite { site_id: String },

    /// Bake all agents.
    BakeAgents,

    /// Call any web API action.
    Call {
        action: String,

        /// Query parameter (KEY=VALUE), repeatable.
        #[arg(long = "query", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        query: Vec<(String, String)>,

        /// Request payload as a JSON object.
        #[arg(long, value_name = "JSON", value_parser = parse_json_object)]
        data: Option<Params>,

        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        request_format: FormatArg,

        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        output_format: FormatArg,
    },
}

/// Subcommands shared by the three group families.
#[derive(Subcommand, Debug, Clone)]
pub enum GroupCommands {
    /// Show one group.
    Get { name: String },
    /// List all groups.
    GetAll,
    /// Add a group.
    Add { name: String, alias: String },
    /// Change the alias of a group.
    Edit { name: String, alias: String },
    /// Delete a group.
    Delete { name: String },
    /// Delete every group, one call each.
    DeleteAll,
}
