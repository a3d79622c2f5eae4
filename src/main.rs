//! Shopkeeper - declare data marketplace metadata from a TOML program
//!
//! Loads configuration from the environment, builds the backend registry,
//! runs the program named by `SHOPKEEPER_PROGRAM_FILE` and prints the
//! resulting outputs as JSON.

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shopkeeper::config::Config;
use shopkeeper::program::Program;
use shopkeeper::{default_registry, metrics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment and optional config file
    let config = Config::from_env()?;

    // Initialize tracing with JSON output for structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    metrics::init_metrics()?;

    info!("Starting Shopkeeper");
    info!(?config, "Configuration loaded");

    let program_file = config
        .program_file
        .clone()
        .context("SHOPKEEPER_PROGRAM_FILE is not set")?;
    let program = Program::from_file(&program_file)
        .with_context(|| format!("Failed to load program {}", program_file.display()))?;

    let registry = default_registry(&config).await?;
    info!(backends = ?registry.backend_types(), "Backend registry initialized");

    let outputs = match program.run(&registry).await {
        Ok(outputs) => outputs,
        Err(e) => {
            error!(error = %e, "Program failed");
            return Err(e.into());
        }
    };
    println!("{}", serde_json::to_string_pretty(&outputs)?);

    if let Some(path) = &config.metrics_file {
        std::fs::write(path, metrics::render()?)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    info!("Shopkeeper run complete");
    Ok(())
}
