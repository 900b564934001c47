//! Error types for routing and endpoint selection.
//!
//! Only malformed partition metadata is an error here. An incomplete routing
//! map or a rejected combine is reported as an absent value so the caller can
//! re-fetch, and endpoint resolution always falls back to the default endpoint.

use thiserror::Error;

/// Common routing error conditions.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Partition metadata contains overlapping, out-of-order or duplicated ranges.
    ///
    /// This indicates corrupted metadata and is never retried internally.
    #[error("invalid routing map for collection {collection}: {reason}")]
    InvalidRoutingMap { collection: String, reason: String },

    /// A query range or key range was malformed.
    #[error("invalid range: {message}")]
    InvalidRange { message: String },

    /// An endpoint is not part of the current account topology.
    ///
    /// The topology may not have been refreshed yet.
    #[error("unknown endpoint: {endpoint}")]
    UnknownEndpoint { endpoint: String },
}

impl RoutingError {
    /// Create an InvalidRoutingMap error.
    pub fn invalid_routing_map(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRoutingMap {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(message: impl Into<String>) -> Self {
        Self::InvalidRange {
            message: message.into(),
        }
    }

    /// Create an UnknownEndpoint error.
    pub fn unknown_endpoint(endpoint: impl std::fmt::Display) -> Self {
        Self::UnknownEndpoint {
            endpoint: endpoint.to_string(),
        }
    }

    /// Check if this error indicates the operation may succeed on retry.
    ///
    /// Corrupted metadata will not heal by itself, so routing map errors are
    /// never retriable.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::UnknownEndpoint { .. })
    }

    /// Check if this error signals corrupted partition metadata.
    pub fn is_data_corruption(&self) -> bool {
        matches!(self, Self::InvalidRoutingMap { .. })
    }
}

/// Result type using RoutingError.
pub type RoutingResult<T> = Result<T, RoutingError>;
