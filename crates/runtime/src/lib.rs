//! Framework facade over bundle wiring and hook coordination.
//!
//! [`Framework`] owns the generation registry, both hook coordinators, the
//! listener registries and the event dispatcher, and fires bundle events for
//! the lifecycle operations it performs.

pub mod config;
mod dispatch;
mod error;
mod framework;
pub mod logging;

pub use config::{ConfigError, EventsConfig, FrameworkConfig, LoggingConfig};
pub use error::FrameworkError;
pub use framework::{Framework, Resolution};
