//! Partition routing.
//!
//! Maps effective partition keys to the physical partitions that own them:
//! - [`range`] - Partition key ranges and query ranges
//! - [`map`] - Immutable routing map and lookups
//! - [`builder`] - Map construction and split/merge combination
//! - [`cache`] - Per-collection map handles with snapshot swapping

pub mod builder;
pub mod cache;
pub mod map;
pub mod range;

pub use builder::{check_coverage, try_create_complete_routing_map, Coverage};
pub use cache::{RoutingCacheStats, RoutingMapCache};
pub use map::RoutingMap;
pub use range::{
    is_sorted_and_non_overlapping, PartitionKeyRange, Range,
    MAX_EXCLUSIVE_EFFECTIVE_PARTITION_KEY, MIN_INCLUSIVE_EFFECTIVE_PARTITION_KEY,
};
