//! Maps parsed subcommands onto `WebApi` operations.
//!
//! Every command produces one JSON value for the output writer. Composite
//! operations report what they did: names deleted, or per-host discovery
//! counters.

use cmk_core::{ApiCall, Attributes, GroupKind, HostTagConfig, NewHost, Transport, WebApi};
use serde_json::Value;
use tracing::info;

use crate::cli::{AttributeArgs, Commands, GroupCommands};
use crate::error::CliError;

fn attributes(args: AttributeArgs) -> Attributes {
    args.attributes
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect()
}

fn to_json<S: serde::Serialize>(value: &S) -> Result<Value, CliError> {
    serde_json::to_value(value).map_err(|e| CliError::Format(e.to_string()))
}

fn names(names: Vec<String>) -> Value {
    Value::Array(names.into_iter().map(Value::String).collect())
}

fn group<T: Transport>(
    api: &WebApi<T>,
    kind: GroupKind,
    command: GroupCommands,
) -> Result<Value, CliError> {
    let result = match command {
        GroupCommands::Get { name } => api.get_group(kind, &name)?,
        GroupCommands::GetAll => api.get_all_groups(kind)?,
        GroupCommands::Add { name, alias } => api.add_group(kind, &name, &alias)?,
        GroupCommands::Edit { name, alias } => api.edit_group(kind, &name, &alias)?,
        GroupCommands::Delete { name } => api.delete_group(kind, &name)?,
        GroupCommands::DeleteAll => {
            let deleted = api.delete_all_groups(kind)?;
            info!(kind = kind.label(), count = deleted.len(), "deleted all groups");
            names(deleted)
        }
    };
    Ok(result)
}

/// Run `command` against `api` and return its result.
///
/// # Errors
///
/// Returns the API error of the first failing call, or an argument error.
pub fn execute<T: Transport>(api: &WebApi<T>, command: Commands) -> Result<Value, CliError> {
    let result = match command {
        Commands::ActivateChanges {
            mode,
            sites,
            allow_foreign_changes,
        } => {
            let sites = (!sites.is_empty()).then_some(sites);
            api.activate_changes(mode.into(), sites.as_deref(), allow_foreign_changes)?
        }
        Commands::AddHost {
            hostname,
            folder,
            ipaddress,
            alias,
            tags,
            attributes: extra,
        } => {
            let mut host = NewHost::new(hostname).folder(folder);
            for (key, value) in attributes(extra) {
                host = host.attribute(key, value);
            }
            if let Some(ipaddress) = ipaddress {
                host = host.ipaddress(ipaddress);
            }
            if let Some(alias) = alias {
                host = host.alias(alias);
            }
            for (tag, value) in tags {
                host = host.tag(tag, value);
            }
            api.add_host(&host)?
        }
        Commands::EditHost {
            hostname,
            attributes: set,
            unset,
        } => {
            let unset = (!unset.is_empty()).then_some(unset);
            api.edit_host(&hostname, &attributes(set), unset.as_deref())?
        }
        Commands::DeleteHost { hostname } => api.delete_host(&hostname)?,
        Commands::DeleteHosts { hostnames } => api.delete_hosts(&hostnames)?,
        Commands::DeleteAllHosts => {
            let deleted = api.delete_all_hosts()?;
            info!(count = deleted.len(), "deleted all hosts");
            names(deleted)
        }
        Commands::GetHost {
            hostname,
            effective_attributes,
        } => api.get_host(&hostname, effective_attributes)?,
        Commands::GetAllHosts {
            effective_attributes,
        } => api.get_all_hosts(effective_attributes)?,
        Commands::GetHostsByFolder {
            folder,
            effective_attributes,
        } => Value::Object(api.get_hosts_by_folder(&folder, effective_attributes)?),
        Commands::DiscoverServices { hostname, mode } => {
            to_json(&api.discover_services(&hostname, mode.into())?)?
        }
        Commands::DiscoverServicesForAllHosts { mode } => {
            to_json(&api.discover_services_for_all_hosts(mode.into())?)?
        }
        Commands::GetFolder {
            folder,
            effective_attributes,
        } => api.get_folder(&folder, effective_attributes)?,
        Commands::GetAllFolders => api.get_all_folders()?,
        Commands::AddFolder {
            folder,
            create_parent_folders,
            attributes: set,
        } => api.add_folder(&folder, create_parent_folders, &attributes(set))?,
        Commands::EditFolder {
            folder,
            attributes: set,
        } => api.edit_folder(&folder, &attributes(set))?,
        Commands::DeleteFolder { folder } => api.delete_folder(&folder)?,
        Commands::Contactgroup { command } => group(api, GroupKind::Contact, command)?,
        Commands::Hostgroup { command } => group(api, GroupKind::Host, command)?,
        Commands::Servicegroup { command } => group(api, GroupKind::Service, command)?,
        Commands::GetUser { user_id } => api.get_user(&user_id)?,
        Commands::GetAllUsers => api.get_all_users()?,
        Commands::AddUser {
            user_id,
            alias,
            password,
            attributes: extra,
        } => api.add_user(&user_id, &alias, &password, &attributes(extra))?,
        Commands::AddAutomationUser {
            user_id,
            alias,
            automation_secret,
            attributes: extra,
        } => api.add_automation_user(&user_id, &alias, &automation_secret, &attributes(extra))?,
        Commands::EditUser {
            user_id,
            attributes: set,
            unset,
        } => api.edit_user(&user_id, &attributes(set), &unset)?,
        Commands::DeleteUser { user_id } => api.delete_user(&user_id)?,
        Commands::GetRuleset { ruleset_name } => api.get_ruleset(&ruleset_name)?,
        Commands::GetRulesetsInfo => api.get_rulesets_info()?,
        Commands::SetRuleset {
            ruleset_name,
            ruleset,
        } => api.set_ruleset(&ruleset_name, &ruleset)?,
        Commands::GetHosttags => api.get_hosttags()?,
        Commands::SetHosttags { hosttags } => {
            let config = HostTagConfig::from_value(Value::Object(hosttags))
                .map_err(|e| CliError::InvalidArgument(format!("host tag configuration: {e}")))?;
            api.set_hosttags(&config)?
        }
        Commands::GetSite { site_id } => api.get_site(&site_id)?,
        Commands::SetSite {
            site_id,
            site_config,
        } => api.set_site(&site_id, &site_config)?,
        Commands::DeleteSite { site_id } => api.delete_site(&site_id)?,
        Commands::LoginSite {
            site_id,
            site_username,
            site_password,
        } => api.login_site(&site_id, &site_username, &site_password)?,
        Commands::LogoutSite { site_id } => api.logout_site(&site_id)?,
        Commands::BakeAgents => api.bake_agents()?,
        Commands::Call {
            action,
            query,
            data,
            request_format,
            output_format,
        } => {
            let mut call = ApiCall::new(action)
                .request_format(request_format.into())
                .output_format_as(output_format.into());
            for (key, value) in query {
                call = call.query(key, value);
            }
            if let Some(data) = data {
                call = call.data(data);
            }
            api.call(call)?
        }
    };
    Ok(result)
}
