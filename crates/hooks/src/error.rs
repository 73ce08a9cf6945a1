use thiserror::Error;

use crate::source::ServiceId;

/// Failure raised by a hook callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
	#[error("hook failed: {0}")]
	Failed(String),
	/// The callback panicked; holds the panic message when it was a string.
	#[error("hook panicked: {0}")]
	Panicked(String),
}

impl HookError {
	pub fn failed(message: impl Into<String>) -> Self {
		Self::Failed(message.into())
	}
}

/// A resolve-hook protocol step was attempted in the wrong state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolStateError {
	#[error("a resolve operation is already in progress")]
	ResolveInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveHookError {
	#[error(transparent)]
	Protocol(#[from] ProtocolStateError),

	/// A resolver hook factory failed to begin under the propagate policy.
	#[error("resolver hook factory {service} failed to begin: {source}")]
	HookFailed {
		service: ServiceId,
		#[source]
		source: HookError,
	},
}

/// Remove-only candidate views refuse additions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CandidateError {
	#[error("candidate collections do not accept additions")]
	AddRejected,
}
