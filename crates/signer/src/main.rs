use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use simple_signer::{AppState, ServerConfig, run};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
struct Args {
    #[clap(long, env = "SIGNER_HOST", default_value = "127.0.0.1")]
    host: String,
    #[clap(long, env = "SIGNER_PORT", default_value = "3000")]
    port: u16,
    #[clap(long, env = "SIGNER_CONFIG", default_value = "signer.toml")]
    config: PathBuf,
    /// Log filter directive, e.g. `info` or `simple_signer=debug,audit=info`.
    #[clap(long, env = "SIGNER_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log_level).context("parsing log filter")?)
        .with_target(true)
        .init();

    let config = ServerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let state = AppState::from_config(&config);

    run(args.host, args.port, state).await
}
