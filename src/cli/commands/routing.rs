//! Routing command implementation.
//!
//! Reads a JSON array of partition key ranges and answers lookups against
//! the routing map built from it. Each entry may carry an `owner`; the range
//! id is used when it does not.

use crate::routing::{PartitionKeyRange, Range, RoutingMap};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Routing map operations.
#[derive(Args, Debug)]
pub struct RoutingArgs {
    #[command(subcommand)]
    pub command: RoutingCommand,
}

/// Routing subcommands.
#[derive(Subcommand, Debug)]
pub enum RoutingCommand {
    /// List every range with its owner, in key order.
    List {
        /// JSON file with partition key ranges.
        #[arg(short, long)]
        ranges: PathBuf,
    },
    /// Find the range owning an effective partition key.
    Lookup {
        /// JSON file with partition key ranges.
        #[arg(short, long)]
        ranges: PathBuf,
        /// Effective partition key.
        #[arg(short, long)]
        key: String,
    },
    /// List ranges overlapping a key range.
    Overlap {
        /// JSON file with partition key ranges.
        #[arg(short, long)]
        ranges: PathBuf,
        /// Lower bound (inclusive).
        #[arg(long, default_value = "")]
        min: String,
        /// Upper bound (exclusive unless --max-inclusive).
        #[arg(long, default_value = "FF")]
        max: String,
        /// Treat the upper bound as inclusive.
        #[arg(long)]
        max_inclusive: bool,
    },
}

#[derive(Debug, Deserialize)]
struct RangeEntry {
    #[serde(flatten)]
    range: PartitionKeyRange,
    #[serde(default)]
    owner: Option<String>,
}

/// Run the routing command.
pub fn run_routing(args: RoutingArgs) -> Result<()> {
    match args.command {
        RoutingCommand::List { ranges } => {
            let map = load_map(&ranges)?;
            for line in describe_ranges(&map) {
                println!("{}", line);
            }
        }
        RoutingCommand::Lookup { ranges, key } => {
            let map = load_map(&ranges)?;
            println!("{}", describe_lookup(&map, &key));
        }
        RoutingCommand::Overlap {
            ranges,
            min,
            max,
            max_inclusive,
        } => {
            let map = load_map(&ranges)?;
            let query = Range::try_new(min, max, true, max_inclusive)?;
            for line in describe_overlap(&map, &query) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn load_map(path: &Path) -> Result<RoutingMap<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ranges file: {}", path.display()))?;
    let collection = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    build_map(&content, &collection)
}

fn build_map(content: &str, collection: &str) -> Result<RoutingMap<String>> {
    let entries: Vec<RangeEntry> =
        serde_json::from_str(content).context("failed to parse ranges file")?;
    let pairs: Vec<(PartitionKeyRange, String)> = entries
        .into_iter()
        .map(|entry| {
            let owner = entry.owner.unwrap_or_else(|| entry.range.id.clone());
            (entry.range, owner)
        })
        .collect();

    RoutingMap::try_create_complete(&pairs, collection, None)?
        .with_context(|| format!("ranges in {} do not cover the key space", collection))
}

fn describe_ranges(map: &RoutingMap<String>) -> Vec<String> {
    map.ordered_entries()
        .map(|(range, owner)| format!("{} owner={}", range, owner))
        .collect()
}

fn describe_lookup(map: &RoutingMap<String>, key: &str) -> String {
    match map.get_range_by_effective_partition_key(key) {
        Some(range) => {
            let owner = map.get_owner_by_id(&range.id).map_or("", String::as_str);
            format!("{} owner={}", range, owner)
        }
        None => format!("no range owns key {:?}", key),
    }
}

fn describe_overlap(map: &RoutingMap<String>, query: &Range) -> Vec<String> {
    map.get_overlapping_range(query)
        .into_iter()
        .map(|range| range.to_string())
        .collect()
}
