//! `cmkclient` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use cmk_core::WebApi;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cmk_cli::cli::Cli;
use cmk_cli::commands;
use cmk_cli::config::Settings;
use cmk_cli::output::Output;
use cmk_cli::CliError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::from_env(
        cli.url.as_deref(),
        cli.username.as_deref(),
        cli.secret.as_deref(),
    )?;
    let api = WebApi::new(&settings.url, &settings.username, &settings.secret);
    debug!(endpoint = api.endpoint(), user = api.username(), "resolved settings");

    let result = commands::execute(&api, cli.command)?;
    Output::new(cli.compact).write(&mut io::stdout().lock(), &result)
}
