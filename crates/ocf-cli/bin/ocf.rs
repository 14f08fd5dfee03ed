//! `ocf` binary entry point.
//!
//! This is a thin wrapper around the ocf-cli library that:
//! 1. Parses command-line arguments
//! 2. Initializes logging (to stderr, so stdout stays machine-readable)
//! 3. Runs the selected command

use anyhow::Result;
use ocf_cli::CliConfig;

fn main() -> Result<()> {
    let config = CliConfig::from_args();

    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Configuration loaded: {:?}", config);

    let stdout = std::io::stdout();
    ocf_cli::run(&config, &mut stdout.lock())
}
