//! Framework configuration, read from TOML.
//!
//! Every section and field is optional:
//!
//! ```toml
//! [hooks]
//! begin_failure = "blacklist"   # or "propagate"
//!
//! [logging]
//! level = "info"
//!
//! [events]
//! async_delivery = true
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use modwire_hooks::HooksConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::Level;

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse config: {0}")]
	Parse(#[from] toml::de::Error),
	#[error("invalid logging config: {0}")]
	Logging(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameworkConfig {
	pub hooks: HooksConfig,
	pub logging: LoggingConfig,
	pub events: EventsConfig,
}

impl FrameworkConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(raw)?;
		config.logging.max_level()?;
		Ok(config)
	}

	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		let config = Self::from_toml_str(&raw)?;
		tracing::debug!(path = %path.display(), "loaded framework config");
		Ok(config)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
	/// One of `trace`, `debug`, `info`, `warn`, `error`.
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

impl LoggingConfig {
	pub fn max_level(&self) -> Result<Level, ConfigError> {
		Level::from_str(&self.level)
			.map_err(|_| ConfigError::Logging(format!("unknown level {:?}", self.level)))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
	/// Deliver to asynchronous listeners on the dispatcher thread. When off
	/// they are called inline after the synchronous ones.
	pub async_delivery: bool,
}

impl Default for EventsConfig {
	fn default() -> Self {
		Self { async_delivery: true }
	}
}
