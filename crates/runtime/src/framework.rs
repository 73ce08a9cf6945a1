//! The framework facade: registry, hook coordinators, listeners and event
//! delivery behind one handle.

use std::sync::Arc;

use modwire_hooks::{
	BundleEvent, BundleEventKind, BundleListener, ContextId, ErrorReporter, HookSource, ListenerId,
	ListenerRegistry, ResolveHookCoordinator, ResolveHooks, TracingReporter, VisibilityHookCoordinator,
};
use modwire_wiring::{
	BundleId, Capability, Generation, GenerationDecl, GenerationId, GenerationRegistry, PackageAdmin,
	Requirement, Wiring,
};

use crate::config::FrameworkConfig;
use crate::dispatch::EventDispatcher;
use crate::error::FrameworkError;

/// Wires chosen by a resolver for one generation.
#[derive(Debug, Clone)]
pub struct Resolution {
	pub generation: GenerationId,
	pub wires: Vec<(Requirement, Capability)>,
}

impl Resolution {
	pub fn new(generation: GenerationId) -> Self {
		Self {
			generation,
			wires: Vec::new(),
		}
	}

	pub fn wire(mut self, requirement: Requirement, capability: Capability) -> Self {
		self.wires.push((requirement, capability));
		self
	}
}

pub struct Framework {
	config: FrameworkConfig,
	registry: GenerationRegistry,
	package_admin: PackageAdmin,
	resolve_hooks: ResolveHookCoordinator,
	visibility: VisibilityHookCoordinator,
	sync_listeners: ListenerRegistry,
	async_listeners: ListenerRegistry,
	dispatcher: EventDispatcher,
}

impl Framework {
	/// Builds a framework reporting hook failures through `tracing`.
	pub fn new(config: FrameworkConfig, source: Arc<dyn HookSource>) -> Result<Self, FrameworkError> {
		Self::with_reporter(config, source, Arc::new(TracingReporter))
	}

	pub fn with_reporter(
		config: FrameworkConfig,
		source: Arc<dyn HookSource>,
		reporter: Arc<dyn ErrorReporter>,
	) -> Result<Self, FrameworkError> {
		let registry = GenerationRegistry::new();
		let dispatcher =
			EventDispatcher::new(config.events.async_delivery).map_err(FrameworkError::Dispatcher)?;
		Ok(Self {
			package_admin: PackageAdmin::new(registry.clone()),
			resolve_hooks: ResolveHookCoordinator::new(source.clone(), reporter.clone(), config.hooks.clone()),
			visibility: VisibilityHookCoordinator::new(source, reporter),
			sync_listeners: ListenerRegistry::new(),
			async_listeners: ListenerRegistry::new(),
			registry,
			dispatcher,
			config,
		})
	}

	/// Opens resolver hook tracking.
	pub fn start(&self) {
		self.resolve_hooks.open();
		tracing::info!("framework started");
	}

	/// Closes resolver hook tracking and drains the event dispatcher.
	pub fn stop(&self) {
		self.resolve_hooks.close();
		self.dispatcher.shutdown();
		tracing::info!("framework stopped");
	}

	pub fn config(&self) -> &FrameworkConfig {
		&self.config
	}

	pub fn registry(&self) -> &GenerationRegistry {
		&self.registry
	}

	pub fn package_admin(&self) -> &PackageAdmin {
		&self.package_admin
	}

	pub fn resolve_hooks(&self) -> &ResolveHookCoordinator {
		&self.resolve_hooks
	}

	pub fn visibility(&self) -> &VisibilityHookCoordinator {
		&self.visibility
	}

	pub fn sync_listeners(&self) -> &ListenerRegistry {
		&self.sync_listeners
	}

	pub fn async_listeners(&self) -> &ListenerRegistry {
		&self.async_listeners
	}

	/// Registers a bundle listener for `context`.
	pub fn add_listener(&self, context: ContextId, listener: Arc<dyn BundleListener>, synchronous: bool) -> ListenerId {
		if synchronous {
			self.sync_listeners.add(context, listener)
		} else {
			self.async_listeners.add(context, listener)
		}
	}

	/// Delivers `event` to every listener the event hooks let through.
	pub fn publish(&self, event: BundleEvent) {
		let (mut sync, mut async_) = (Vec::new(), Vec::new());
		self.visibility.filter_bundle_event_receivers(
			&event,
			&self.sync_listeners,
			&self.async_listeners,
			&mut sync,
			&mut async_,
		);
		self.dispatcher.deliver_sync(&event, &sync);
		self.dispatcher.deliver_async(event, async_);
	}

	/// Waits until every asynchronous delivery queued so far has run.
	pub fn flush_events(&self) {
		self.dispatcher.flush();
	}

	fn fire(&self, kind: BundleEventKind, bundle: BundleId, origin: BundleId) {
		self.publish(BundleEvent::new(kind, bundle, origin));
	}

	pub fn install(&self, origin: BundleId, decl: GenerationDecl) -> Result<Arc<Generation>, FrameworkError> {
		let generation = self.registry.install(decl)?;
		self.fire(BundleEventKind::Installed, generation.bundle(), origin);
		Ok(generation)
	}

	pub fn update(
		&self,
		origin: BundleId,
		bundle: BundleId,
		decl: GenerationDecl,
	) -> Result<Arc<Generation>, FrameworkError> {
		let generation = self.registry.update(bundle, decl)?;
		self.fire(BundleEventKind::Updated, bundle, origin);
		Ok(generation)
	}

	/// Uninstalls `bundle` and drops the listeners its context registered.
	pub fn uninstall(&self, origin: BundleId, bundle: BundleId) -> Result<(), FrameworkError> {
		self.registry.uninstall(bundle)?;
		self.fire(BundleEventKind::Uninstalled, bundle, origin);
		let context = ContextId(bundle);
		self.sync_listeners.remove_context(context);
		self.async_listeners.remove_context(context);
		Ok(())
	}

	/// Attaches the wirings a resolver chose and fires `resolved` for each
	/// wired bundle.
	///
	/// Events fire only once every wiring is attached. On error the wirings
	/// attached so far stay attached and no event fires.
	pub fn apply_resolution(
		&self,
		origin: BundleId,
		resolutions: Vec<Resolution>,
	) -> Result<Vec<Arc<Wiring>>, FrameworkError> {
		let mut wirings = Vec::with_capacity(resolutions.len());
		for resolution in resolutions {
			wirings.push(
				self.registry
					.attach_wiring(resolution.generation, resolution.wires)?,
			);
		}
		for wiring in &wirings {
			if let Some(generation) = wiring.generation().get() {
				self.fire(BundleEventKind::Resolved, generation.bundle(), origin);
			}
		}
		Ok(wirings)
	}

	/// Refreshes `bundles` and their dependents, firing `unresolved` for each
	/// affected bundle that is still installed.
	pub fn refresh(&self, origin: BundleId, bundles: &[BundleId]) -> Vec<BundleId> {
		let affected = self.registry.refresh(bundles);
		for bundle in &affected {
			if self.registry.current(*bundle).is_some() {
				self.fire(BundleEventKind::Unresolved, *bundle, origin);
			}
		}
		affected
	}

	/// Begins a resolve operation through the resolver hooks.
	///
	/// # Errors
	///
	/// Fails with [`FrameworkError::Resolve`] when a resolve is already in
	/// progress or a hook factory fails under the propagate policy.
	pub fn begin_resolve(&self, triggers: &[GenerationId]) -> Result<ResolveHooks, FrameworkError> {
		Ok(self.resolve_hooks.begin_resolve(triggers)?)
	}

	pub fn end_resolve(&self) {
		self.resolve_hooks.end_resolve();
	}

	/// `bundle` if it is installed and visible to `caller`.
	pub fn find_bundle(&self, caller: ContextId, bundle: BundleId) -> Option<BundleId> {
		self.registry.current(bundle)?;
		self.visibility.filter_bundle(caller, bundle)
	}

	/// Installed bundles visible to `caller`, in ID order.
	pub fn find_bundles(&self, caller: ContextId) -> Vec<BundleId> {
		let mut bundles = self.registry.bundles();
		self.visibility.filter_bundles(caller, &mut bundles);
		bundles
	}

	/// Capabilities of current generations that satisfy `requirement`,
	/// narrowed by the resolver hooks of the running resolve.
	pub fn find_providers(&self, requirement: &Requirement, hooks: &ResolveHooks) -> Vec<Capability> {
		let mut candidates: Vec<Capability> = self
			.registry
			.bundles()
			.into_iter()
			.filter_map(|bundle| self.registry.current(bundle))
			.flat_map(|generation| generation.capabilities(Some(requirement.namespace())))
			.filter(|capability| capability.is_effective_for_resolve() && requirement.matches(capability))
			.collect();
		hooks.filter_matches(requirement, &mut candidates);
		candidates
	}
}
