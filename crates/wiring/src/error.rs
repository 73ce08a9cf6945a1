use thiserror::Error;

use crate::ids::{BundleId, GenerationId};

/// Invalid capability or requirement declaration.
///
/// Aborts installation of the generation the declaration belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	/// The namespace is reserved for synthesized identity capabilities.
	#[error("namespace {0:?} is reserved for identity capabilities")]
	ReservedNamespace(String),
	/// The `filter` directive of a requirement does not parse.
	#[error("invalid filter {filter:?} at offset {offset}: {reason}")]
	InvalidFilter {
		filter: String,
		offset: usize,
		reason: &'static str,
	},
	/// A version string does not parse.
	#[error("invalid version: {0:?}")]
	InvalidVersion(String),
}

/// Errors raised by [`GenerationRegistry`](crate::GenerationRegistry) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	#[error("unknown bundle: {0}")]
	UnknownBundle(BundleId),

	#[error("unknown generation: {0}")]
	UnknownGeneration(GenerationId),

	#[error("bundle {0} is uninstalled")]
	BundleUninstalled(BundleId),

	/// A wire's requirement is not declared by the generation being wired.
	#[error("requirement belongs to {owner}, not {generation}")]
	ForeignRequirement {
		generation: GenerationId,
		owner: GenerationId,
	},

	#[error("requirement namespace {requirement:?} does not match capability namespace {capability:?}")]
	NamespaceMismatch {
		requirement: String,
		capability: String,
	},
}
