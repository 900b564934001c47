//! Command-line interface.
//!
//! Offline tooling for inspecting routing metadata and endpoint selection.

pub mod commands;

use clap::{Parser, Subcommand};

/// docroute - partition routing and regional endpoint selection.
#[derive(Parser, Debug)]
#[command(name = "docroute")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration operations.
    Config(commands::ConfigArgs),
    /// Routing map operations.
    Routing(commands::RoutingArgs),
    /// Regional endpoint operations.
    Location(commands::LocationArgs),
}

/// Initialize the tracing subscriber if the telemetry feature is enabled.
#[cfg(feature = "telemetry")]
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_log_level: &str) {}
