//! Find and event hook dispatch.

use std::sync::Arc;

use modwire_wiring::BundleId;

use crate::hook::{EventHook, FindHook};
use crate::invoke::guarded;
use crate::listeners::{BundleEvent, ContextId, ListenerEntry, ListenerRegistry};
use crate::report::{ErrorReporter, HookFailure};
use crate::source::{Hook, HookKind, HookSource, ServiceRef};
use crate::view::RemoveOnly;


/// Applies find hooks to bundle lookups and event hooks to event delivery.
///
/// Registrations are read from the source on every call, in ranked order, and
/// each live instance is looked up right before it runs. A hook that fails
/// is reported and skipped; the candidates it already removed stay removed.
pub struct VisibilityHookCoordinator {
	source: Arc<dyn HookSource>,
	reporter: Arc<dyn ErrorReporter>,
}

impl VisibilityHookCoordinator {
	pub fn new(source: Arc<dyn HookSource>, reporter: Arc<dyn ErrorReporter>) -> Self {
		Self { source, reporter }
	}

	/// The live find hook behind `reference`, if it is still available.
	fn find_hook(&self, reference: &ServiceRef) -> Option<Arc<dyn FindHook>> {
		match self.source.hook(reference)? {
			Hook::Find(hook) => Some(hook),
			other => {
				tracing::warn!(service = %reference.id(), kind = ?other.kind(), "find hook reference resolved to another kind");
				None
			}
		}
	}

	fn event_hook(&self, reference: &ServiceRef) -> Option<Arc<dyn EventHook>> {
		match self.source.hook(reference)? {
			Hook::Event(hook) => Some(hook),
			other => {
				tracing::warn!(service = %reference.id(), kind = ?other.kind(), "event hook reference resolved to another kind");
				None
			}
		}
	}

	fn report(&self, kind: HookKind, reference: &ServiceRef, error: crate::HookError) {
		self.reporter.report(&HookFailure {
			kind,
			service: reference.id(),
			error,
		});
	}

	/// Returns `bundle` when `caller` may still see it after the find hooks ran.
	pub fn filter_bundle(&self, caller: ContextId, bundle: BundleId) -> Option<BundleId> {
		if self.source.references(HookKind::Find).is_empty() {
			return Some(bundle);
		}
		let mut candidates = vec![bundle];
		self.filter_bundles(caller, &mut candidates);
		candidates.contains(&bundle).then_some(bundle)
	}

	/// Runs every find hook over `bundles`, leaving only what all of them kept.
	pub fn filter_bundles(&self, caller: ContextId, bundles: &mut Vec<BundleId>) {
		for reference in self.source.references(HookKind::Find) {
			let Some(hook) = self.find_hook(&reference) else {
				continue;
			};
			let mut view = RemoveOnly::new(bundles);
			if let Err(error) = guarded(|| hook.find(caller, &mut view)) {
				self.report(HookKind::Find, &reference, error);
			}
		}
	}

	/// Copies the listeners of `sync` and `async_` into the output vectors and
	/// drops those whose context an event hook excluded from `event`.
	pub fn filter_bundle_event_receivers(
		&self,
		event: &BundleEvent,
		sync: &ListenerRegistry,
		async_: &ListenerRegistry,
		sync_out: &mut Vec<ListenerEntry>,
		async_out: &mut Vec<ListenerEntry>,
	) {
		sync.copy_into(sync_out);
		async_.copy_into(async_out);

		let references = self.source.references(HookKind::Event);
		if references.is_empty() {
			return;
		}

		let mut contexts: Vec<ContextId> = Vec::new();
		for entry in sync_out.iter().chain(async_out.iter()) {
			if !contexts.contains(&entry.context) {
				contexts.push(entry.context);
			}
		}
		let before = contexts.len();

		for reference in references {
			let Some(hook) = self.event_hook(&reference) else {
				continue;
			};
			let mut view = RemoveOnly::new(&mut contexts);
			if let Err(error) = guarded(|| hook.event(event, &mut view)) {
				self.report(HookKind::Event, &reference, error);
			}
		}

		if contexts.len() < before {
			tracing::debug!(
				event = ?event.kind,
				bundle = %event.bundle,
				excluded = before - contexts.len(),
				"event hooks excluded contexts"
			);
			sync_out.retain(|entry| contexts.contains(&entry.context));
			async_out.retain(|entry| contexts.contains(&entry.context));
		}
	}
}
