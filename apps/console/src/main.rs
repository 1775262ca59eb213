mod cli;
mod config;
mod dispatcher;
mod errors;
mod models;
mod render;
mod session;
mod stub;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env()?.with_overrides(cli.api_base.clone(), cli.timeout)?;

    // -v raises the level for this crate only; RUST_LOG still wins when set.
    let level = match cli.verbose {
        0 => config.rust_log.as_str(),
        1 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so --json output stays clean.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Pipeline console v{} ({:?})", env!("CARGO_PKG_VERSION"), config);

    cli::run(cli, config).await
}
