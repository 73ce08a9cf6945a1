//! Contracts implemented by hook services.
//!
//! Every callback receives a [`RemoveOnly`] view: hooks can narrow what the
//! framework shows or wires, never widen it. Errors and panics are isolated
//! by the coordinator that invokes the hook.

use modwire_wiring::{BundleId, Capability, GenerationId, Requirement};

use crate::error::HookError;
use crate::listeners::{BundleEvent, ContextId};
use crate::view::RemoveOnly;

/// Narrows the bundles a context may discover.
pub trait FindHook: Send + Sync {
	fn find(&self, caller: ContextId, candidates: &mut RemoveOnly<'_, BundleId>) -> Result<(), HookError>;
}

/// Narrows the contexts whose listeners receive a bundle event.
pub trait EventHook: Send + Sync {
	fn event(&self, event: &BundleEvent, contexts: &mut RemoveOnly<'_, ContextId>) -> Result<(), HookError>;
}

/// Creates one [`ResolverHook`] per resolve operation.
pub trait ResolverHookFactory: Send + Sync {
	/// Starts a resolve triggered by `triggers`. `Ok(None)` opts out of this
	/// operation.
	fn begin(&self, triggers: &[GenerationId]) -> Result<Option<Box<dyn ResolverHook>>, HookError>;
}

/// Per-operation resolver hook. Every filter defaults to keeping all
/// candidates.
pub trait ResolverHook: Send + Sync {
	fn filter_resolvable(&self, candidates: &mut RemoveOnly<'_, GenerationId>) -> Result<(), HookError> {
		let _ = candidates;
		Ok(())
	}

	/// `collisions` holds the capabilities that clash with `singleton`.
	fn filter_singleton_collisions(
		&self,
		singleton: &Capability,
		collisions: &mut RemoveOnly<'_, Capability>,
	) -> Result<(), HookError> {
		let _ = (singleton, collisions);
		Ok(())
	}

	fn filter_matches(
		&self,
		requirement: &Requirement,
		candidates: &mut RemoveOnly<'_, Capability>,
	) -> Result<(), HookError> {
		let _ = (requirement, candidates);
		Ok(())
	}

	/// Called once when the resolve operation finishes.
	fn end(&self) -> Result<(), HookError> {
		Ok(())
	}
}
