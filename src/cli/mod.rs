//! Command-line front end.

pub mod commands;
pub mod output;
pub mod types;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::github::{GitHubClient, GitHubClientConfig};
use crate::infrastructure::logging::{LogConfig, LoggerImpl};
use crate::services::OrganizationCache;

pub use types::{Cli, Commands};

/// Load configuration, set up logging and the cache, then run the command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))
        .context("Failed to initialize logging")?;

    let cache = build_cache(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight queries");
            on_interrupt.cancel();
        }
    });

    let dispatch = async {
        match cli.command {
            Commands::Repo { name } => commands::repo::execute(&cache, &name, cli.json).await,
            Commands::Env {
                repository,
                environment,
            } => {
                commands::environment::execute(&cache, &repository, &environment, cli.json).await
            }
            Commands::Secret {
                repository,
                environment,
                name,
            } => {
                commands::secret::execute(&cache, &repository, &environment, &name, cli.json)
                    .await
            }
            Commands::TeamRepo {
                team_id,
                repository,
            } => commands::team_repo::execute(&cache, team_id, &repository, cli.json).await,
            Commands::Warm => commands::warm::execute(&cache, &cancel, cli.json).await,
        }
    };

    // Lookups other than `warm` do not take the token; stop waiting on them here.
    tokio::select! {
        result = dispatch => result,
        () = cancel.cancelled() => Err(anyhow!("Interrupted")),
    }
}

/// Build the organization cache over a REST client for `config`.
pub fn build_cache(config: &Config) -> Result<OrganizationCache> {
    let client = GitHubClient::new(GitHubClientConfig::from_config(config))
        .context("Failed to create GitHub client")?;
    Ok(OrganizationCache::new(
        Arc::new(client),
        &config.cache.eviction,
    ))
}

/// Print `err` with its cause chain and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        eprintln!(
            "{}",
            json!({ "error": err.to_string(), "causes": causes })
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
