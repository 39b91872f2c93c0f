use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use todo_api::config::Cli;
use todo_api::database::open_db;
use todo_api::server::{build_app, serve};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let store = open_db(&cli.database)
        .with_context(|| format!("cannot initialize store at {}", cli.database.display()))?;
    info!(database = %cli.database.display(), "store ready");

    let app = build_app(Arc::new(store), &cli.static_dir);
    serve(app, cli.socket_addr()).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
