//! weekender service entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use weekender_core::init_tracing;
use weekender_providers::CalendarProvider;
use weekender_server::cli::Cli;
use weekender_server::ServerResult;

#[tokio::main]
async fn main() -> ExitCode {
    // A .env file fills in variables not already set in the environment
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "weekender stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ServerResult<()> {
    let config = cli.server_config()?;
    let provider = build_provider(&cli)?;
    weekender_server::run(config, provider).await
}

#[cfg(feature = "graph")]
fn build_provider(cli: &Cli) -> ServerResult<Arc<dyn CalendarProvider>> {
    use weekender_providers::graph::GraphProvider;
    use weekender_server::ServerError;

    let provider = GraphProvider::new(cli.graph_config())
        .map_err(|e| ServerError::config(e.to_string()))?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "graph"))]
fn build_provider(_cli: &Cli) -> ServerResult<Arc<dyn CalendarProvider>> {
    use weekender_providers::StaticProvider;

    tracing::warn!("built without a calendar provider, every venue will show as free");
    Ok(Arc::new(StaticProvider::new()))
}
