// Path: crates/marionette-cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Marionette CLI
//!
//! Drives a single operator from the command line: capture a frame, execute
//! one parsed action, release a leased sandbox, or scaffold a config file.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::*;

#[derive(Parser, Debug)]
#[clap(
    name = "marionette",
    version,
    about = "Drive GUI operators (local desktop, leased sandbox, subscription VM)."
)]
struct Cli {
    /// Print Prometheus metrics to stderr when the command finishes.
    #[clap(long, global = true)]
    metrics: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture one frame from the configured backend.
    Screenshot(screenshot::ScreenshotArgs),

    /// Execute one parsed action against a fresh screenshot's geometry.
    Exec(exec::ExecArgs),

    /// Release a leased sandbox resource.
    Release(release::ReleaseArgs),

    /// Generate operator configuration files.
    Config(config::ConfigCmdArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    marionette_telemetry::init::init_tracing()?;
    if cli.metrics {
        marionette_telemetry::prometheus::install()?;
    }

    let result = match cli.command {
        Commands::Screenshot(args) => screenshot::run(args).await,
        Commands::Exec(args) => exec::run(args).await,
        Commands::Release(args) => release::run(args).await,
        Commands::Config(args) => config::run(args),
    };

    if cli.metrics {
        eprint!("{}", marionette_telemetry::prometheus::render());
    }
    result
}
