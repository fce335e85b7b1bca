//! Endpoint and credential resolution.
//!
//! Each setting comes from its command-line flag, or failing that from its
//! environment variable. Empty values count as unset.

use crate::error::CliError;

pub const URL_VAR: &str = "CHECK_MK_URL";
pub const USER_VAR: &str = "CHECK_MK_USER";
pub const SECRET_VAR: &str = "CHECK_MK_SECRET";

/// Resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub username: String,
    pub secret: String,
}

fn require(
    flag_value: Option<&str>,
    lookup: &impl Fn(&str) -> Option<String>,
    what: &str,
    flag: &str,
    var: &str,
) -> Result<String, CliError> {
    flag_value
        .map(str::to_string)
        .filter(|value| !value.is_empty())
        .or_else(|| lookup(var).filter(|value| !value.is_empty()))
        .ok_or_else(|| {
            CliError::Config(format!(
                "Need to set {what}, either via command-line option `{flag}=...`, or via environment variable `{var}`."
            ))
        })
}

impl Settings {
    /// Resolve from flag values, falling back to `lookup` for the
    /// environment. The URL is checked first, then the user, then the secret.
    pub fn resolve(
        url: Option<&str>,
        username: Option<&str>,
        secret: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CliError> {
        Ok(Self {
            url: require(url, &lookup, "CheckMK API URL", "--url", URL_VAR)?,
            username: require(
                username,
                &lookup,
                "CheckMK automation user name",
                "--username",
                USER_VAR,
            )?,
            secret: require(
                secret,
                &lookup,
                "CheckMK automation secret",
                "--secret",
                SECRET_VAR,
            )?,
        })
    }

    /// Resolve against the process environment.
    pub fn from_env(
        url: Option<&str>,
        username: Option<&str>,
        secret: Option<&str>,
    ) -> Result<Self, CliError> {
        Self::resolve(url, username, secret, |name| std::env::var(name).ok())
    }
}
