//! cloudsync - main entry point

use anyhow::Context;
use clap::Parser;
use cloudsync_cli::{execute_task, AppConfig, Cli, TaskOptions, TaskSummary};
use cloudsync_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .output(LogOutput::Console)
        .log_file_prefix("cloudsync")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current page");
            on_signal.cancel();
        }
    });

    match run(&cli, cancel).await {
        Ok(summary) => {
            println!("{}", summary.message());
            if summary.failed() > 0 {
                eprintln!(
                    "{} sync(s) succeeded, {} failed",
                    summary.succeeded,
                    summary.failed()
                );
                process::exit(1);
            }
        }
        Err(e) => {
            error!(error = %e, "Task failed");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli, cancel: CancellationToken) -> anyhow::Result<TaskSummary> {
    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(path) = &cli.config {
        config.config_path = path.clone();
    }

    let options = TaskOptions {
        dry_run: cli.dry_run,
        cancel,
    };

    execute_task(&cli.task, &config, &options)
        .await
        .with_context(|| format!("Task '{}' failed", cli.task))
}
