//! bulkchange-rs engine binary
//!
//! Runs one engine invocation for one job and reports the outcome through
//! the exit code, so the hosting runtime can decide between acknowledging
//! the triggering message and scheduling a retry.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bulkchange_rs::queue::{ContinuationMessage, LogSink};
use bulkchange_rs::{Config, Engine, RetryPolicies, RunOutcome, SeaOrmStore};

#[derive(Parser, Debug)]
#[command(name = "engine", about = "Bulk device change processing engine")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config/engine.yaml")]
    config: PathBuf,

    /// Bulk change job to process
    #[arg(long)]
    job_id: i64,

    /// Retry count carried over from the triggering message
    #[arg(long, default_value_t = 0)]
    retry_count: u32,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    match run(cli).await {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> bulkchange_rs::Result<RunOutcome> {
    let config = Config::from_file(&cli.config).await?;

    let store = Arc::new(SeaOrmStore::new(config.database()).await?);
    store.migrate().await?;

    let engine = Engine::new(
        store,
        config.carriers().build_registry()?,
        Arc::new(LogSink),
        Arc::new(LogSink),
        config.worker().clone(),
        RetryPolicies::new(config.retry().network.clone(), config.retry().store.clone()),
    );

    let mut message = ContinuationMessage::new(cli.job_id);
    message.retry_count = cli.retry_count;
    engine.run(&message).await
}
