//! Where hooks come from: ranked service references and a directory of them.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use modwire_wiring::{AttrValue, Attributes};
use parking_lot::Mutex;

use crate::hook::{EventHook, FindHook, ResolverHookFactory};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceId(pub u64);

impl fmt::Display for ServiceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "service#{}", self.0)
	}
}

/// Handle to one registered hook service.
///
/// Ordered by ranking (highest first), then by service ID (lowest first).
#[derive(Debug, Clone)]
pub struct ServiceRef {
	id: ServiceId,
	ranking: i32,
	properties: Arc<Attributes>,
}

impl ServiceRef {
	pub fn new(id: ServiceId, ranking: i32, properties: Attributes) -> Self {
		Self {
			id,
			ranking,
			properties: Arc::new(properties),
		}
	}

	pub fn id(&self) -> ServiceId {
		self.id
	}

	pub fn ranking(&self) -> i32 {
		self.ranking
	}

	pub fn property(&self, name: &str) -> Option<&AttrValue> {
		self.properties.get(name)
	}

	pub fn properties(&self) -> &Attributes {
		&self.properties
	}
}

impl PartialEq for ServiceRef {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for ServiceRef {}

impl Ord for ServiceRef {
	fn cmp(&self, other: &Self) -> Ordering {
		other.ranking.cmp(&self.ranking).then(self.id.cmp(&other.id))
	}
}

impl PartialOrd for ServiceRef {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
	Find,
	Event,
	Resolver,
}

/// A hook instance of one of the closed set of kinds.
#[derive(Clone)]
pub enum Hook {
	Find(Arc<dyn FindHook>),
	Event(Arc<dyn EventHook>),
	ResolverFactory(Arc<dyn ResolverHookFactory>),
}

impl Hook {
	pub fn kind(&self) -> HookKind {
		match self {
			Self::Find(_) => HookKind::Find,
			Self::Event(_) => HookKind::Event,
			Self::ResolverFactory(_) => HookKind::Resolver,
		}
	}
}

impl fmt::Debug for Hook {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Hook").field(&self.kind()).finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
	Registered(ServiceRef),
	Unregistered(ServiceRef),
}

impl RegistrationEvent {
	pub fn reference(&self) -> &ServiceRef {
		match self {
			Self::Registered(reference) | Self::Unregistered(reference) => reference,
		}
	}
}

/// Callback for hook registrations of one kind.
pub type RegistrationListener = Arc<dyn Fn(&RegistrationEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Service directory the coordinators read hooks from.
pub trait HookSource: Send + Sync {
	/// References registered for `kind`, in ranked order.
	fn references(&self, kind: HookKind) -> Vec<ServiceRef>;

	/// The live hook behind `reference`, or `None` when it is unregistered or
	/// currently unavailable.
	fn hook(&self, reference: &ServiceRef) -> Option<Hook>;

	/// Notifies `listener` of later registrations and unregistrations of `kind`.
	fn subscribe(&self, kind: HookKind, listener: RegistrationListener) -> SubscriptionId;

	fn unsubscribe(&self, id: SubscriptionId);
}

struct Entry {
	reference: ServiceRef,
	hook: Hook,
	available: bool,
}

struct Subscriber {
	id: SubscriptionId,
	kind: HookKind,
	listener: RegistrationListener,
}

#[derive(Default)]
struct DirectoryState {
	next_service: u64,
	next_subscription: u64,
	entries: Vec<Entry>,
	subscribers: Vec<Subscriber>,
}

impl DirectoryState {
	fn listeners_for(&self, kind: HookKind) -> Vec<RegistrationListener> {
		self.subscribers
			.iter()
			.filter(|s| s.kind == kind)
			.map(|s| s.listener.clone())
			.collect()
	}
}

/// In-memory ranked hook directory.
///
/// Registration listeners are called after the directory lock is released.
#[derive(Default)]
pub struct HookDirectory {
	state: Mutex<DirectoryState>,
}

impl HookDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, hook: Hook, ranking: i32) -> ServiceRef {
		self.register_with(hook, ranking, Attributes::default())
	}

	pub fn register_with(&self, hook: Hook, ranking: i32, properties: Attributes) -> ServiceRef {
		let kind = hook.kind();
		let (reference, listeners) = {
			let mut state = self.state.lock();
			state.next_service += 1;
			let reference = ServiceRef::new(ServiceId(state.next_service), ranking, properties);
			state.entries.push(Entry {
				reference: reference.clone(),
				hook,
				available: true,
			});
			(reference, state.listeners_for(kind))
		};
		tracing::debug!(service = %reference.id(), ?kind, ranking, "hook registered");

		let event = RegistrationEvent::Registered(reference.clone());
		for listener in listeners {
			listener(&event);
		}
		reference
	}

	/// Returns false when `id` was not registered.
	pub fn unregister(&self, id: ServiceId) -> bool {
		let (entry, listeners) = {
			let mut state = self.state.lock();
			let Some(pos) = state.entries.iter().position(|e| e.reference.id() == id) else {
				return false;
			};
			let entry = state.entries.remove(pos);
			let listeners = state.listeners_for(entry.hook.kind());
			(entry, listeners)
		};
		tracing::debug!(service = %id, kind = ?entry.hook.kind(), "hook unregistered");

		let event = RegistrationEvent::Unregistered(entry.reference);
		for listener in listeners {
			listener(&event);
		}
		true
	}

	/// Toggles whether [`HookSource::hook`] hands out the instance. The
	/// registration itself stays listed.
	pub fn set_available(&self, id: ServiceId, available: bool) -> bool {
		let mut state = self.state.lock();
		match state.entries.iter_mut().find(|e| e.reference.id() == id) {
			Some(entry) => {
				entry.available = available;
				true
			}
			None => false,
		}
	}
}

impl HookSource for HookDirectory {
	fn references(&self, kind: HookKind) -> Vec<ServiceRef> {
		let mut refs: Vec<_> = self
			.state
			.lock()
			.entries
			.iter()
			.filter(|e| e.hook.kind() == kind)
			.map(|e| e.reference.clone())
			.collect();
		refs.sort();
		refs
	}

	fn hook(&self, reference: &ServiceRef) -> Option<Hook> {
		self.state
			.lock()
			.entries
			.iter()
			.find(|e| e.reference.id() == reference.id() && e.available)
			.map(|e| e.hook.clone())
	}

	fn subscribe(&self, kind: HookKind, listener: RegistrationListener) -> SubscriptionId {
		let mut state = self.state.lock();
		state.next_subscription += 1;
		let id = SubscriptionId(state.next_subscription);
		state.subscribers.push(Subscriber { id, kind, listener });
		id
	}

	fn unsubscribe(&self, id: SubscriptionId) {
		self.state.lock().subscribers.retain(|s| s.id != id);
	}
}
