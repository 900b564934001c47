//! Regional endpoint selection.
//!
//! - [`topology`] - Account regions as reported by the account endpoint
//! - [`request`] - Request classification used for routing
//! - [`cache`] - Endpoint ordering, failure demotion and resolution

pub mod cache;
pub mod request;
pub mod topology;

pub use cache::{LocationCache, LocationCacheOptions, RefreshDecision, DEFAULT_UNAVAILABLE_TTL};
pub use request::{OperationKind, OperationType, ResourceType, ServiceRequest};
pub use topology::{AccountRegion, DatabaseAccount};
