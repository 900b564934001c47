//! CLI command implementations.

mod config;
mod location;
mod routing;

pub use config::{run_config, ConfigArgs};
pub use location::{run_location, LocationArgs};
pub use routing::{run_routing, RoutingArgs};
