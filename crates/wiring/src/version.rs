use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Bundle or package version: `major.minor.micro[.qualifier]`.
///
/// Missing numeric parts default to zero, so `1` and `1.0.0` are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Version {
	pub major: u32,
	pub minor: u32,
	pub micro: u32,
	pub qualifier: String,
}

impl Version {
	pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
		Self {
			major,
			minor,
			micro,
			qualifier: String::new(),
		}
	}

	pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
		self.qualifier = qualifier.into();
		self
	}

	/// Parses a version string.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::InvalidVersion`] for empty input, non-numeric
	/// components or more than four dot-separated parts.
	pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
		let trimmed = raw.trim();
		let invalid = || ConfigurationError::InvalidVersion(raw.to_string());
		if trimmed.is_empty() {
			return Err(invalid());
		}

		let mut parts = trimmed.splitn(4, '.');
		let mut numeric = [0u32; 3];
		for slot in &mut numeric {
			let Some(part) = parts.next() else {
				break;
			};
			if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
				return Err(invalid());
			}
			*slot = part.parse().map_err(|_| invalid())?;
		}

		let qualifier = parts.next().unwrap_or_default();
		if !qualifier
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
		{
			return Err(invalid());
		}

		Ok(Self {
			major: numeric[0],
			minor: numeric[1],
			micro: numeric[2],
			qualifier: qualifier.to_string(),
		})
	}
}

impl Ord for Version {
	fn cmp(&self, other: &Self) -> Ordering {
		self.major
			.cmp(&other.major)
			.then(self.minor.cmp(&other.minor))
			.then(self.micro.cmp(&other.micro))
			.then_with(|| self.qualifier.cmp(&other.qualifier))
	}
}

impl PartialOrd for Version {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl FromStr for Version {
	type Err = ConfigurationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.micro)?;
		if !self.qualifier.is_empty() {
			write!(f, ".{}", self.qualifier)?;
		}
		Ok(())
	}
}
