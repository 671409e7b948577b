//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "octocache")]
#[command(about = "Read-through metadata cache for a GitHub organization", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .octocache/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a repository
    Repo {
        /// Repository name
        name: String,
    },

    /// Show a deployment environment
    Env {
        /// Repository name
        repository: String,

        /// Environment name
        environment: String,
    },

    /// Show an environment secret's metadata
    Secret {
        /// Repository name
        repository: String,

        /// Environment name
        environment: String,

        /// Secret name
        name: String,
    },

    /// Show a team's access to a repository
    TeamRepo {
        /// Numeric team id
        team_id: i64,

        /// Repository name
        repository: String,
    },

    /// Load every repository of the organization and print cache counters
    Warm,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_team_repo() {
        let cli = Cli::try_parse_from(["octocache", "--json", "team-repo", "42", "api"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::TeamRepo {
                team_id,
                repository,
            } => {
                assert_eq!(team_id, 42);
                assert_eq!(repository, "api");
            }
            _ => panic!("Expected team-repo command"),
        }
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli =
            Cli::try_parse_from(["octocache", "env", "api", "prod", "--config", "ci.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("ci.yaml")));
    }

    #[test]
    fn test_team_id_must_be_numeric() {
        assert!(Cli::try_parse_from(["octocache", "team-repo", "core", "api"]).is_err());
    }
}
