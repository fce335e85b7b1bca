//! `cmkclient`: command-line front end for the Check_MK web API.
//!
//! Parsing lives in [`cli`], credential lookup in [`config`], and
//! [`commands::execute`] maps each subcommand onto one `WebApi` operation.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use error::CliError;
