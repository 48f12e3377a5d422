use std::process::ExitCode;

use tracing::{error, info};

use ap_app::ViewScope;

use super::config::resolve_config;
use super::paths::AppPaths;
use super::tracing::init_tracing_subscriber;
use super::wiring::wire_portal;
use crate::cli::Cli;
use crate::commands::{self, EXIT_FAILURE};

/// Load `.env`, configure logging, wire the adapters and run one command.
pub async fn run(cli: Cli) -> ExitCode {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Failed to load .env: {err}");
        }
    }

    let paths = match AppPaths::system() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    if let Err(err) = init_tracing_subscriber(&paths, cli.verbose) {
        eprintln!("Failed to initialize tracing: {err:#}");
    }

    let config = match resolve_config(cli.config.clone(), &paths, |key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %format!("{err:#}"), "Configuration failed");
            eprintln!("{err:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    info!(api = %config.api_base_url, authority = %config.authority_base_url, "Configuration loaded");

    let portal = match wire_portal(config).await {
        Ok(portal) => portal,
        Err(err) => {
            error!(error = %err, "Wiring failed");
            eprintln!("{err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let scope = ViewScope::new();
    let interrupt = {
        let scope = scope.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                scope.dismiss();
            }
        })
    };

    let outcome = commands::dispatch(&portal, cli.command, &scope).await;
    interrupt.abort();
    portal.session().teardown().await;

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, code = err.exit_code(), "Command failed");
            if !matches!(err, commands::CommandError::Interrupted) {
                eprintln!("{err}");
            }
            ExitCode::from(err.exit_code())
        }
    }
}
