//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use docroute::core::time::ManualClock;
use docroute::location::{AccountRegion, DatabaseAccount, LocationCache, LocationCacheOptions};
use docroute::routing::{PartitionKeyRange, RoutingMap};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use url::Url;

/// Write a TOML configuration to a temporary file.
pub fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Shorthand for a range without lineage.
pub fn pkr(id: &str, min: &str, max: &str) -> PartitionKeyRange {
    PartitionKeyRange::new(id, min, max)
}

/// Pair ranges with their ids as owners.
pub fn owned_by_id(ranges: Vec<PartitionKeyRange>) -> Vec<(PartitionKeyRange, String)> {
    ranges
        .into_iter()
        .map(|r| {
            let owner = format!("server-{}", r.id);
            (r, owner)
        })
        .collect()
}

/// Four ranges covering the whole key space, deliberately unsorted.
pub fn four_range_map() -> RoutingMap<String> {
    let ranges = owned_by_id(vec![
        pkr("2", "0000000050", "0000000070"),
        pkr("0", "", "0000000030"),
        pkr("1", "0000000030", "0000000050"),
        pkr("3", "0000000070", "FF"),
    ]);
    RoutingMap::try_create_complete(&ranges, "coll1", None)
        .expect("valid ranges")
        .expect("complete ranges")
}

/// Endpoint URL for a region name.
pub fn endpoint(location: &str) -> Url {
    Url::parse(&format!("https://{}.example.net/", location.to_lowercase()))
        .expect("valid url")
}

/// Account region for a name.
pub fn region(location: &str) -> AccountRegion {
    AccountRegion::new(location, endpoint(location))
}

/// Account topology with the given write and read regions.
pub fn account(writes: &[&str], reads: &[&str], multi_write: bool) -> DatabaseAccount {
    DatabaseAccount {
        writable_locations: writes.iter().map(|l| region(l)).collect(),
        readable_locations: reads.iter().map(|l| region(l)).collect(),
        enable_multiple_write_locations: multi_write,
    }
}

/// Default endpoint used by test caches.
pub fn default_endpoint() -> Url {
    Url::parse("https://account.example.net/").expect("valid url")
}

/// Options with the given preferences and a 60 second unavailability TTL.
pub fn options(preferred: &[&str], multi_write: bool) -> LocationCacheOptions {
    let mut options = LocationCacheOptions::new(default_endpoint());
    options.preferred_locations = preferred.iter().map(|s| s.to_string()).collect();
    options.use_multiple_write_locations = multi_write;
    options.unavailable_ttl = Duration::from_secs(60);
    options
}

/// Location cache driven by a manual clock.
pub fn cache_with_clock(options: LocationCacheOptions) -> (LocationCache, ManualClock) {
    let clock = ManualClock::new();
    let cache = LocationCache::with_clock(options, Arc::new(clock.clone()));
    (cache, clock)
}
