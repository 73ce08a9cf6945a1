//! Global `tracing` subscriber setup.

use crate::config::{ConfigError, LoggingConfig};

/// Installs a fmt subscriber at the configured max level.
///
/// Returns `Ok(false)` without changing anything when a global subscriber is
/// already set, so repeated calls are harmless.
pub fn init(config: &LoggingConfig) -> Result<bool, ConfigError> {
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(config.max_level()?)
		.with_target(true)
		.finish();

	match tracing::subscriber::set_global_default(subscriber) {
		Ok(()) => {
			tracing::debug!(level = %config.level, "logging initialized");
			Ok(true)
		}
		Err(_) => Ok(false),
	}
}
