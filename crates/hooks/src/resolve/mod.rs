//! Resolver hook lifecycle.
//!
//! # State machine
//!
//! ```text
//! Closed -- open --> Idle -- begin_resolve --> Active -- end_resolve --> Idle
//!    ^                 |
//!    +----- close -----+
//! ```
//!
//! `begin_resolve` moves to `Beginning` under the state lock, runs factory
//! callbacks with the lock released, then publishes `Active`. Any second
//! `begin_resolve` in the meantime fails with
//! [`ProtocolStateError::ResolveInProgress`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use modwire_wiring::{Capability, GenerationId, Requirement};
use parking_lot::Mutex;

use crate::config::{BeginFailurePolicy, HooksConfig};
use crate::error::{HookError, ProtocolStateError, ResolveHookError};
use crate::hook::ResolverHook;
use crate::invoke::guarded;
use crate::report::{ErrorReporter, HookFailure};
use crate::source::{
	Hook, HookKind, HookSource, RegistrationEvent, RegistrationListener, ServiceId, ServiceRef,
	SubscriptionId,
};
use crate::view::RemoveOnly;


/// One tracked resolver hook factory registration.
struct Tracked {
	reference: ServiceRef,
	blacklisted: AtomicBool,
}

type TrackedList = ArcSwap<Vec<Arc<Tracked>>>;

/// Inserts `reference` in ranked order unless it is already tracked.
fn track(list: &TrackedList, reference: &ServiceRef) {
	loop {
		let cur = list.load_full();
		if cur.iter().any(|t| t.reference.id() == reference.id()) {
			return;
		}
		let mut next = (*cur).clone();
		let pos = next
			.binary_search_by(|t| t.reference.cmp(reference))
			.unwrap_or_else(|p| p);
		next.insert(
			pos,
			Arc::new(Tracked {
				reference: reference.clone(),
				blacklisted: AtomicBool::new(false),
			}),
		);
		let prev = list.compare_and_swap(&cur, Arc::new(next));
		if Arc::ptr_eq(&prev, &cur) {
			return;
		}
	}
}

fn untrack(list: &TrackedList, id: ServiceId) {
	loop {
		let cur = list.load_full();
		if !cur.iter().any(|t| t.reference.id() == id) {
			return;
		}
		let next: Vec<_> = cur.iter().filter(|t| t.reference.id() != id).cloned().collect();
		let prev = list.compare_and_swap(&cur, Arc::new(next));
		if Arc::ptr_eq(&prev, &cur) {
			return;
		}
	}
}

struct ActiveHook {
	reference: ServiceRef,
	hook: Box<dyn ResolverHook>,
}

fn end_all(hooks: &[ActiveHook], reporter: &dyn ErrorReporter) {
	for active in hooks {
		if let Err(error) = guarded(|| active.hook.end()) {
			reporter.report(&HookFailure {
				kind: HookKind::Resolver,
				service: active.reference.id(),
				error,
			});
		}
	}
}

enum Phase {
	Idle,
	Beginning,
	Active(Arc<[ActiveHook]>),
	Ending,
}

struct State {
	subscription: Option<SubscriptionId>,
	phase: Phase,
}

/// Puts the coordinator back to `Idle` when dropped while armed, so a panic
/// escaping a reporter or hook source cannot leave a resolve stuck open.
struct IdleOnDrop<'a> {
	state: &'a Mutex<State>,
	armed: bool,
}

impl<'a> IdleOnDrop<'a> {
	fn new(state: &'a Mutex<State>) -> Self {
		Self { state, armed: true }
	}

	fn disarm(mut self) {
		self.armed = false;
	}
}

impl Drop for IdleOnDrop<'_> {
	fn drop(&mut self) {
		if self.armed {
			self.state.lock().phase = Phase::Idle;
		}
	}
}

/// Tracks resolver hook factories and runs the begin/end protocol around
/// each resolve operation.
pub struct ResolveHookCoordinator {
	source: Arc<dyn HookSource>,
	reporter: Arc<dyn ErrorReporter>,
	config: HooksConfig,
	state: Mutex<State>,
	tracked: Arc<TrackedList>,
}

impl ResolveHookCoordinator {
	pub fn new(source: Arc<dyn HookSource>, reporter: Arc<dyn ErrorReporter>, config: HooksConfig) -> Self {
		Self {
			source,
			reporter,
			config,
			state: Mutex::new(State {
				subscription: None,
				phase: Phase::Idle,
			}),
			tracked: Arc::new(ArcSwap::from_pointee(Vec::new())),
		}
	}

	pub fn is_open(&self) -> bool {
		self.state.lock().subscription.is_some()
	}

	pub fn is_resolving(&self) -> bool {
		!matches!(self.state.lock().phase, Phase::Idle)
	}

	/// Subscribes to factory registrations and seeds the tracked set.
	///
	/// Subscribing happens before the seed snapshot so no registration is
	/// missed; duplicates are dropped by service ID.
	pub fn open(&self) {
		let mut state = self.state.lock();
		if state.subscription.is_some() {
			return;
		}
		self.tracked.store(Arc::new(Vec::new()));

		let tracked = self.tracked.clone();
		let listener: RegistrationListener = Arc::new(move |event: &RegistrationEvent| match event {
			RegistrationEvent::Registered(reference) => track(&tracked, reference),
			RegistrationEvent::Unregistered(reference) => untrack(&tracked, reference.id()),
		});
		state.subscription = Some(self.source.subscribe(HookKind::Resolver, listener));
		for reference in self.source.references(HookKind::Resolver) {
			track(&self.tracked, &reference);
		}
		tracing::debug!(factories = self.tracked.load().len(), "resolve hooks opened");
	}

	/// Stops tracking. Later `begin_resolve` calls get an unavailable hook set.
	pub fn close(&self) {
		let mut state = self.state.lock();
		if let Some(id) = state.subscription.take() {
			self.source.unsubscribe(id);
			tracing::debug!("resolve hooks closed");
		}
	}

	/// Tracked factory services in ranked order.
	pub fn tracked_services(&self) -> Vec<ServiceId> {
		self.tracked.load().iter().map(|t| t.reference.id()).collect()
	}

	pub fn blacklisted_services(&self) -> Vec<ServiceId> {
		self.tracked
			.load()
			.iter()
			.filter(|t| t.blacklisted.load(Ordering::Acquire))
			.map(|t| t.reference.id())
			.collect()
	}

	/// Begins a resolve operation triggered by `triggers`.
	///
	/// # Errors
	///
	/// - [`ProtocolStateError::ResolveInProgress`] when another resolve is active.
	/// - [`ResolveHookError::HookFailed`] when a factory fails under
	///   [`BeginFailurePolicy::Propagate`].
	pub fn begin_resolve(&self, triggers: &[GenerationId]) -> Result<ResolveHooks, ResolveHookError> {
		let snapshot = {
			let mut state = self.state.lock();
			if state.subscription.is_none() {
				tracing::debug!("resolve hooks unavailable");
				return Ok(ResolveHooks::unavailable(self.reporter.clone()));
			}
			if !matches!(state.phase, Phase::Idle) {
				return Err(ProtocolStateError::ResolveInProgress.into());
			}
			state.phase = Phase::Beginning;
			self.tracked.load_full()
		};
		let reset = IdleOnDrop::new(&self.state);

		let mut begun = Vec::new();
		for tracked in snapshot.iter() {
			if tracked.blacklisted.load(Ordering::Acquire) {
				continue;
			}
			let Some(Hook::ResolverFactory(factory)) = self.source.hook(&tracked.reference) else {
				continue;
			};
			let error = match guarded(|| factory.begin(triggers)) {
				Ok(Some(hook)) => {
					begun.push(ActiveHook {
						reference: tracked.reference.clone(),
						hook,
					});
					continue;
				}
				Ok(None) => continue,
				Err(error) => error,
			};

			let service = tracked.reference.id();
			self.reporter.report(&HookFailure {
				kind: HookKind::Resolver,
				service,
				error: error.clone(),
			});
			match self.config.begin_failure {
				BeginFailurePolicy::Blacklist => {
					tracked.blacklisted.store(true, Ordering::Release);
					tracing::warn!(%service, "resolver hook factory blacklisted");
				}
				BeginFailurePolicy::Propagate => {
					end_all(&begun, self.reporter.as_ref());
					return Err(ResolveHookError::HookFailed { service, source: error });
				}
			}
		}

		let hooks: Arc<[ActiveHook]> = begun.into();
		tracing::debug!(hooks = hooks.len(), triggers = triggers.len(), "resolve began");
		self.state.lock().phase = Phase::Active(hooks.clone());
		reset.disarm();
		Ok(ResolveHooks {
			hooks,
			reporter: self.reporter.clone(),
			available: true,
		})
	}

	/// Ends the active resolve, calling `end` on every hook in order.
	pub fn end_resolve(&self) {
		let hooks = {
			let mut state = self.state.lock();
			match std::mem::replace(&mut state.phase, Phase::Ending) {
				Phase::Active(hooks) => hooks,
				other => {
					state.phase = other;
					tracing::warn!("end_resolve without an active resolve");
					return;
				}
			}
		};
		let _reset = IdleOnDrop::new(&self.state);
		end_all(&hooks, self.reporter.as_ref());
		tracing::debug!(hooks = hooks.len(), "resolve ended");
	}
}

/// Hook set fixed for one resolve operation.
///
/// Every filter consults the hooks in ranked order over the same remove-only
/// view; a failing hook is reported and the next one still runs.
pub struct ResolveHooks {
	hooks: Arc<[ActiveHook]>,
	reporter: Arc<dyn ErrorReporter>,
	available: bool,
}

impl ResolveHooks {
	fn unavailable(reporter: Arc<dyn ErrorReporter>) -> Self {
		Self {
			hooks: Arc::from(Vec::new()),
			reporter,
			available: false,
		}
	}

	/// False when the coordinator was closed and nothing intercepts this
	/// resolve.
	pub fn is_available(&self) -> bool {
		self.available
	}

	pub fn len(&self) -> usize {
		self.hooks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hooks.is_empty()
	}

	pub fn services(&self) -> Vec<ServiceId> {
		self.hooks.iter().map(|h| h.reference.id()).collect()
	}

	fn each(&self, mut call: impl FnMut(&dyn ResolverHook) -> Result<(), HookError>) {
		for active in self.hooks.iter() {
			if let Err(error) = guarded(|| call(active.hook.as_ref())) {
				self.reporter.report(&HookFailure {
					kind: HookKind::Resolver,
					service: active.reference.id(),
					error,
				});
			}
		}
	}

	pub fn filter_resolvable(&self, candidates: &mut Vec<GenerationId>) {
		self.each(|hook| hook.filter_resolvable(&mut RemoveOnly::new(&mut *candidates)));
	}

	pub fn filter_singleton_collisions(&self, singleton: &Capability, collisions: &mut Vec<Capability>) {
		self.each(|hook| hook.filter_singleton_collisions(singleton, &mut RemoveOnly::new(&mut *collisions)));
	}

	pub fn filter_matches(&self, requirement: &Requirement, candidates: &mut Vec<Capability>) {
		self.each(|hook| hook.filter_matches(requirement, &mut RemoveOnly::new(&mut *candidates)));
	}
}

impl fmt::Debug for ResolveHooks {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolveHooks")
			.field("services", &self.services())
			.field("available", &self.available)
			.finish()
	}
}
