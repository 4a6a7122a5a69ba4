//! # rebtest
//!
//! Command-line entry point for prioritized test generation.
//!
//! Logs go to stderr so that generated test cases on stdout can be piped.
//! Set `RUST_LOG` to adjust verbosity.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rebtest::cli::Cli;
use rebtest::commands::execute_command;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    execute_command(cli.command)
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
