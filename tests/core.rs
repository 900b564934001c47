//! Core infrastructure tests.

mod common;

use common::write_config;
use docroute::core::config::Config;
use docroute::core::error::RoutingError;
use docroute::core::time::{Clock, ManualClock, Tick};
use docroute::location::LocationCache;
use std::time::Duration;

// ============================================================================
// Config tests
// ============================================================================

#[test]
fn parse_full_config() {
    let file = write_config(
        r#"
[location]
default_endpoint = "https://myaccount.example.net/"
preferred_locations = ["West US", "East US"]
enable_endpoint_discovery = true
use_multiple_write_locations = true
unavailable_ttl_seconds = 30

[telemetry]
log_level = "debug"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.location.preferred_locations, vec!["West US", "East US"]);
    assert!(config.location.use_multiple_write_locations);
    assert_eq!(config.location.unavailable_ttl(), Duration::from_secs(30));
    assert_eq!(config.telemetry.log_level, "debug");
}

#[test]
fn validate_zero_ttl() {
    let file = write_config(
        r#"
[location]
unavailable_ttl_seconds = 0
"#,
    );

    let result = Config::from_file(file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("unavailable_ttl_seconds"));
}

#[test]
fn validate_duplicate_preferred_locations() {
    let file = write_config(
        r#"
[location]
preferred_locations = ["West US", "West US"]
"#,
    );

    let result = Config::from_file(file.path());
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("duplicate"));
}

#[test]
fn validate_log_level() {
    let result = Config::from_toml(
        r#"
[telemetry]
log_level = "verbose"
"#,
    );
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("log_level"));
}

#[test]
fn validate_max_key_sentinel() {
    let result = Config::from_toml(
        r#"
[routing]
max_exclusive_key = "FFFF"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn missing_config_file_is_error() {
    let result = Config::from_file(std::path::Path::new("/nonexistent/docroute.toml"));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("failed to read"));
}

#[test]
fn location_cache_from_config() {
    let config = Config::from_toml(
        r#"
[location]
default_endpoint = "https://myaccount.example.net/"
enable_endpoint_discovery = false
"#,
    )
    .unwrap();

    let cache = LocationCache::from_config(&config.location).unwrap();
    assert_eq!(cache.default_endpoint().as_str(), "https://myaccount.example.net/");
    assert_eq!(cache.read_endpoints(), vec![cache.default_endpoint().clone()]);
}

// ============================================================================
// Error tests
// ============================================================================

#[test]
fn routing_error_classification() {
    let corrupt = RoutingError::invalid_routing_map("coll", "overlap");
    assert!(corrupt.is_data_corruption());
    assert!(!corrupt.is_retriable());

    let bad_range = RoutingError::invalid_range("min > max");
    assert!(!bad_range.is_data_corruption());
    assert!(bad_range.to_string().contains("min > max"));
}

// ============================================================================
// Time tests
// ============================================================================

#[test]
fn manual_clock_advances() {
    let clock = ManualClock::new();
    assert_eq!(clock.now(), Tick::zero());
    clock.advance(Duration::from_secs(2));
    assert_eq!(clock.now(), Tick::new(2_000));
}
