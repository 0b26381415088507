//! cloudsync CLI library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Dispatch surface for the cloudsync engine: `cloudsync <TASK>`.
//!
//! # Overview
//!
//! - **Configuration**: runtime settings from the environment plus a YAML file
//!   naming accounts, regions and resources ([`config`])
//! - **Dispatch**: the `fetch` task fans syncs out across resources and
//!   partitions with per-sync error isolation ([`dispatch`])

pub mod config;
pub mod dispatch;
pub mod error;

pub use config::{AppConfig, FetchConfig};
pub use dispatch::{execute_task, TaskOptions, TaskSummary};
pub use error::{CliError, Result};

use clap::Parser;
use std::path::PathBuf;

/// cloudsync - mirror cloud resource inventories into PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "cloudsync")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Task to run (e.g. "fetch")
    pub task: String,

    /// Fetch configuration file
    #[arg(short, long, env = "CLOUDSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep records in memory instead of writing to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch_with_flags() {
        let cli = Cli::try_parse_from(["cloudsync", "fetch", "--config", "prod.yml", "--dry-run", "-v"])
            .unwrap();
        assert_eq!(cli.task, "fetch");
        assert_eq!(cli.config, Some(PathBuf::from("prod.yml")));
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn test_task_is_required() {
        assert!(Cli::try_parse_from(["cloudsync"]).is_err());
    }
}
