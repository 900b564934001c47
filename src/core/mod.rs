//! Core infrastructure.
//!
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Error types
//! - [`time`] - Clocks for unavailability expiry

pub mod config;
pub mod error;
pub mod time;
