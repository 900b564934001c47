//! Location command implementation.

use crate::core::config::Config;
use crate::core::error::RoutingError;
use crate::location::{DatabaseAccount, LocationCache, LocationCacheOptions};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use url::Url;

/// Regional endpoint operations.
#[derive(Args, Debug)]
pub struct LocationArgs {
    #[command(subcommand)]
    pub command: LocationCommand,
}

/// Location subcommands.
#[derive(Subcommand, Debug)]
pub enum LocationCommand {
    /// Show read and write endpoints in selection order for an account topology.
    Endpoints {
        /// JSON file with the account topology.
        #[arg(short, long)]
        account: PathBuf,
        /// Preferred regions, overriding the configuration.
        #[arg(short, long, value_delimiter = ',')]
        preferred: Vec<String>,
        /// Endpoints to treat as unavailable for both reads and writes.
        #[arg(long, value_delimiter = ',')]
        unavailable: Vec<Url>,
    },
}

/// Run the location command.
pub fn run_location(args: LocationArgs, config: &Config) -> Result<()> {
    match args.command {
        LocationCommand::Endpoints {
            account,
            preferred,
            unavailable,
        } => {
            let account = load_account(&account)?;
            let mut options = LocationCacheOptions::from_config(&config.location)?;
            if !preferred.is_empty() {
                options.preferred_locations = preferred;
            }
            for line in describe_endpoints(options, account, &unavailable)? {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

fn load_account(path: &Path) -> Result<DatabaseAccount> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read account file: {}", path.display()))?;
    DatabaseAccount::from_json(&content).context("failed to parse account file")
}

fn describe_endpoints(
    options: LocationCacheOptions,
    account: DatabaseAccount,
    unavailable: &[Url],
) -> Result<Vec<String>> {
    let cache = LocationCache::new(options);
    cache.on_database_account_read(account);
    for endpoint in unavailable {
        if cache.location_of(endpoint).is_none() {
            return Err(RoutingError::unknown_endpoint(endpoint).into());
        }
        cache.mark_endpoint_unavailable_for_read(endpoint);
        cache.mark_endpoint_unavailable_for_write(endpoint);
    }

    let mut lines = Vec::new();
    for (label, endpoints) in [
        ("write", cache.write_endpoints()),
        ("read", cache.read_endpoints()),
    ] {
        for (i, endpoint) in endpoints.iter().enumerate() {
            let location = cache.location_of(endpoint).unwrap_or_else(|| "-".to_string());
            lines.push(format!("{} {} {} {}", label, i, location, endpoint));
        }
    }

    let decision = cache.should_refresh_endpoints();
    lines.push(format!(
        "refresh={} background={}",
        decision.should_refresh, decision.can_refresh_in_background
    ));
    Ok(lines)
}
