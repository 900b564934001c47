//! Config command implementation.

use crate::core::config::Config;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate configuration file.
    Validate {
        /// Config file path.
        #[arg(short, long, default_value = "config/docroute.toml")]
        config: PathBuf,
    },
    /// Print configuration with defaults filled in.
    Show {
        /// Config file path.
        #[arg(short, long, default_value = "config/docroute.toml")]
        config: PathBuf,
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Print a configuration template.
    Generate,
}

/// Run the config command.
pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate { config } => validate_config(&config),
        ConfigCommand::Show { config, format } => show_config(&config, &format),
        ConfigCommand::Generate => {
            print!("{}", generate_template());
            Ok(())
        }
    }
}

fn validate_config(path: &Path) -> Result<()> {
    let config = Config::from_file(path)?;
    println!("✓ Configuration is valid");
    if config.location.preferred_locations.is_empty() {
        println!("  ⚠ Warning: no preferred locations, account order will be used");
    }
    if !config.location.enable_endpoint_discovery {
        println!(
            "  ⚠ Warning: endpoint discovery disabled, all traffic goes to {}",
            config.location.default_endpoint
        );
    }
    Ok(())
}

fn show_config(path: &Path, format: &str) -> Result<()> {
    let config = Config::from_file(path)?;
    println!("{}", render_config(&config, format)?);
    Ok(())
}

fn render_config(config: &Config, format: &str) -> Result<String> {
    match format {
        "json" => serde_json::to_string_pretty(config).context("failed to render config as JSON"),
        "toml" => toml::to_string_pretty(config).context("failed to render config as TOML"),
        other => anyhow::bail!("unknown format: {} (expected toml or json)", other),
    }
}

fn generate_template() -> String {
    r#"[location]
default_endpoint = "https://myaccount.documents.example.net/"
preferred_locations = ["West US", "East US"]
enable_endpoint_discovery = true
use_multiple_write_locations = false
unavailable_ttl_seconds = 300

[routing]
max_exclusive_key = "FF"

[telemetry]
log_level = "info"
"#
    .to_string()
}
