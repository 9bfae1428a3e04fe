use std::process::ExitCode;

use clap::Parser;
use index_sync::commands::{self, Command};
use index_sync::{telemetry, Dependencies, IndexingError, Settings};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "index-sync")]
#[command(about = "Synchronize application records into a search index", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init_tracing(cli.settings.log_format);

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, requests already sent stay applied");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), IndexingError> {
    let dependencies = Dependencies::new(&cli.settings).await?;
    info!(cluster = %cli.settings.cluster_id, "Running command");
    commands::run(cli.command, &dependencies.transport).await
}
