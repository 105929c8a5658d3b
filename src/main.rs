use anyhow::Result;
use clap::Parser;
use hikarin_blocks_core::cli::Args;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_env("HIKARIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    hikarin_blocks_core::run_cli(&args)
}
