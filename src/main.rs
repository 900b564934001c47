//! docroute - unified CLI entrypoint.
//!
//! Usage:
//!   docroute config validate --config config/docroute.toml
//!   docroute routing list --ranges ranges.json
//!   docroute routing lookup --ranges ranges.json --key 0000000042
//!   docroute routing overlap --ranges ranges.json --min 00 --max 80
//!   docroute location endpoints --account account.json --preferred "West US,East US"

use anyhow::Result;
use clap::Parser;
use docroute::cli::commands::{run_config, run_location, run_routing};
use docroute::cli::{init_tracing, Cli, Commands};
use docroute::config::{Config, ConfigOverrides};
use std::path::PathBuf;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Missing default config is fine, an explicitly named one is not
    let mut config = match cli.config.as_deref().map(PathBuf::from) {
        Some(path) => Config::from_file(&path)?,
        None => {
            let default_path = PathBuf::from("config/docroute.toml");
            if default_path.exists() {
                Config::from_file(&default_path)?
            } else {
                Config::default()
            }
        }
    };
    config.apply_overrides(&ConfigOverrides {
        log_level: cli.log_level.clone(),
        ..ConfigOverrides::default()
    });
    config.validate()?;

    init_tracing(&config.telemetry.log_level);

    match cli.command {
        Commands::Config(args) => run_config(args),
        Commands::Routing(args) => run_routing(args),
        Commands::Location(args) => run_location(args, &config),
    }
}
