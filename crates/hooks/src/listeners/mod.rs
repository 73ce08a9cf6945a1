//! Bundle events and the listener registries they are delivered to.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use modwire_wiring::BundleId;
use parking_lot::Mutex;

#[cfg(test)]
mod tests;

/// The bundle context a listener or lookup belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(pub BundleId);

impl fmt::Display for ContextId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "context({})", self.0)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleEventKind {
	Installed,
	Resolved,
	Started,
	Stopped,
	Updated,
	Unresolved,
	Uninstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleEvent {
	pub kind: BundleEventKind,
	pub bundle: BundleId,
	/// Bundle whose action caused the event.
	pub origin: BundleId,
}

impl BundleEvent {
	pub fn new(kind: BundleEventKind, bundle: BundleId, origin: BundleId) -> Self {
		Self { kind, bundle, origin }
	}
}

pub trait BundleListener: Send + Sync {
	fn bundle_changed(&self, event: &BundleEvent);
}

impl<F> BundleListener for F
where
	F: Fn(&BundleEvent) + Send + Sync,
{
	fn bundle_changed(&self, event: &BundleEvent) {
		self(event)
	}
}

#[derive(Clone)]
pub struct ListenerEntry {
	pub id: ListenerId,
	pub context: ContextId,
	pub listener: Arc<dyn BundleListener>,
}

impl fmt::Debug for ListenerEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ListenerEntry")
			.field("id", &self.id)
			.field("context", &self.context)
			.finish_non_exhaustive()
	}
}

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(1);

/// Listeners keyed by owning context.
///
/// Reads copy the entries out under the lock; nothing is ever invoked while
/// it is held.
#[derive(Default)]
pub struct ListenerRegistry {
	entries: Mutex<Vec<ListenerEntry>>,
}

impl ListenerRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&self, context: ContextId, listener: Arc<dyn BundleListener>) -> ListenerId {
		let id = ListenerId(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed));
		self.entries.lock().push(ListenerEntry { id, context, listener });
		id
	}

	pub fn remove(&self, id: ListenerId) -> bool {
		let mut entries = self.entries.lock();
		let before = entries.len();
		entries.retain(|e| e.id != id);
		entries.len() != before
	}

	/// Drops every listener owned by `context`. Returns how many were removed.
	pub fn remove_context(&self, context: ContextId) -> usize {
		let mut entries = self.entries.lock();
		let before = entries.len();
		entries.retain(|e| e.context != context);
		before - entries.len()
	}

	/// Appends a copy of every entry to `out`, in registration order.
	pub fn copy_into(&self, out: &mut Vec<ListenerEntry>) {
		out.extend(self.entries.lock().iter().cloned());
	}

	pub fn snapshot(&self) -> Vec<ListenerEntry> {
		self.entries.lock().clone()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}
