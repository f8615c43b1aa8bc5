//! Vegapunk - persona chat web application
//!
//! Main entry point: loads configuration, then serves the chat page.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vegapunk::cli::Cli;
use vegapunk::config::{Config, DEFAULT_CONFIG_PATH};
use vegapunk::web;

#[tokio::main]
async fn main() -> Result<()> {
    // Pull in a .env file before anything reads the environment.
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    tracing::info!(
        "Starting Vegapunk with model {}",
        config.provider.gemini.model
    );

    web::serve(config).await
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "vegapunk=debug"
    } else {
        "vegapunk=info"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
