//! docroute - partition routing and regional endpoint selection for a
//! partitioned, multi-region document database client.
//!
//! Two structures sit at the core:
//!
//! - the **routing map**, which assigns every effective partition key to
//!   exactly one partition key range and follows ranges through splits and
//!   merges
//! - the **location cache**, which orders regional endpoints by preference
//!   and demotes endpoints that recently failed
//!
//! Neither performs I/O. Metadata and topology are fetched elsewhere and fed
//! in; this crate only decides where requests go.
//!
//! ```text
//!   partition metadata ──► RoutingMap::try_create_complete / try_combine
//!                                     │
//!                                     ▼
//!                           RoutingMapCache (Arc swap) ──► key → range → owner
//!
//!   account topology ───► LocationCache::on_database_account_read
//!   request failures ───► LocationCache::mark_endpoint_unavailable_for_*
//!                                     │
//!                                     ▼
//!                      LocationCache::resolve_service_endpoint ──► URL
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::error`] - Error types
//! - [`core::time`] - Clocks for unavailability expiry
//!
//! ## Routing
//! - [`routing::range`] - Partition key ranges and query ranges
//! - [`routing::map`] - Routing map lookups
//! - [`routing::builder`] - Map construction and combination
//! - [`routing::cache`] - Per-collection map handles
//!
//! ## Location
//! - [`location::topology`] - Account regions
//! - [`location::request`] - Request classification
//! - [`location::cache`] - Endpoint ordering and resolution
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations

// Core infrastructure
pub mod core;

// Partition routing
pub mod routing;

// Regional endpoint selection
pub mod location;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, error, time};
pub use location::{LocationCache, LocationCacheOptions, ServiceRequest};
pub use routing::{PartitionKeyRange, Range, RoutingMap, RoutingMapCache};
