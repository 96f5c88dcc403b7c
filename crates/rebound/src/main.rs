//! Rebound CLI - retrying HTTP calls from the command line
//!
//! This is the main entry point for the Rebound command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config_dir = cli.config_dir.as_deref();
    match cli.command {
        Commands::Fetch(args) => commands::fetch::run(args, config_dir).await,
        Commands::Schedule(args) => commands::schedule::run(args, config_dir),
        Commands::Config(cmd) => commands::config::run(cmd, config_dir),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    // Retry warnings are the interesting output, so info is the default
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
