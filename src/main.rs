//! drugcache - Fetch and cache drug, target and disease data
//!
//! Parses the command line, installs the tracing subscriber and runs one
//! subcommand against the public APIs.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drugcache::app::App;
use drugcache::cache::CacheStatus;
use drugcache::cli::{Cli, StartupConfig};

/// Installs a stderr subscriber; `RUST_LOG` overrides the level chosen by `-v`
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StartupConfig::from_cli(&cli)?;
    let app = App::new(config)?;

    let outcomes = app.run(&cli.command).await?;

    let fetched = outcomes
        .iter()
        .filter(|o| o.status == CacheStatus::Fetched)
        .count();
    info!(
        "Done: {} fetched, {} already cached in {}",
        fetched,
        outcomes.len() - fetched,
        app.config().results_dir.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
