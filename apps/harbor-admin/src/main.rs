//! # Harbor Admin Entry Point
//!
//! ## Startup Sequence
//! 1. Load `.env` if present
//! 2. Initialize tracing (stderr)
//! 3. Parse the command line
//! 4. Load configuration, apply flag overrides
//! 5. Run the command against stdout

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use harbor_admin::{commands, AdminConfig, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = AdminConfig::load()
        .context("loading configuration")?
        .with_database_url(cli.database_url);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    commands::run(cli.command, &config, cli.json, &mut out).await?;

    Ok(())
}

/// Initializes the tracing subscriber.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: INFO, with sqlx at WARN
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
