mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    setup_logging();
    let args = cli::Args::parse();
    cli::run(args)
}

/// Log to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides the default `warn` level.
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
