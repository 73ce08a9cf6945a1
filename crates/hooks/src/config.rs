use serde::Deserialize;

/// What happens when a resolver hook factory fails to begin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeginFailurePolicy {
	/// Report the failure, blacklist the factory for good, keep going.
	#[default]
	Blacklist,
	/// End the hooks already begun and fail the resolve.
	Propagate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HooksConfig {
	pub begin_failure: BeginFailurePolicy,
}
