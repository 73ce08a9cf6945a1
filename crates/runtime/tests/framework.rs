use std::sync::Arc;
use std::thread;

use modwire_hooks::{
	BundleEvent, BundleEventKind, BundleListener, ContextId, EventHook, FindHook, Hook, HookDirectory, HookError,
	ProtocolStateError, RemoveOnly, ResolveHookError, ResolverHook, ResolverHookFactory,
};
use modwire_runtime::{Framework, FrameworkConfig, FrameworkError, Resolution};
use modwire_wiring::{
	BundleId, Capability, CapabilityDecl, GenerationDecl, GenerationId, Requirement, RequirementDecl, Version,
	namespace,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

const SYSTEM: BundleId = BundleId(0);

type Events = Arc<Mutex<Vec<(BundleEventKind, BundleId)>>>;

fn recorder(events: &Events) -> Arc<dyn BundleListener> {
	let events = events.clone();
	Arc::new(move |event: &BundleEvent| events.lock().push((event.kind, event.bundle)))
}

fn framework(config: FrameworkConfig) -> (Framework, Arc<HookDirectory>) {
	let directory = Arc::new(HookDirectory::new());
	let framework = Framework::new(config, directory.clone()).unwrap();
	framework.start();
	(framework, directory)
}

fn plain(name: &str) -> GenerationDecl {
	GenerationDecl::new(name, Version::new(1, 0, 0))
}

fn exporter(name: &str, minor: u32) -> GenerationDecl {
	GenerationDecl::new(name, Version::new(1, minor, 0)).capability(
		CapabilityDecl::new(namespace::PACKAGE)
			.attr(namespace::PACKAGE, "org.acme.api")
			.attr("version", Version::new(1, minor, 0)),
	)
}

fn importer(name: &str) -> GenerationDecl {
	plain(name).requirement(RequirementDecl::new(namespace::PACKAGE).filter("(osgi.wiring.package=org.acme.api)"))
}

struct ExcludeContext(ContextId);

impl EventHook for ExcludeContext {
	fn event(&self, _event: &BundleEvent, contexts: &mut RemoveOnly<'_, ContextId>) -> Result<(), HookError> {
		contexts.remove(&self.0);
		Ok(())
	}
}

#[test]
fn event_hook_hides_a_context_from_both_listener_kinds() {
	let (framework, directory) = framework(FrameworkConfig::default());
	let c1 = framework.install(SYSTEM, plain("c1")).unwrap().bundle();
	let c2 = framework.install(SYSTEM, plain("c2")).unwrap().bundle();

	let (c1_events, c2_events) = (Events::default(), Events::default());
	framework.add_listener(ContextId(c1), recorder(&c1_events), true);
	framework.add_listener(ContextId(c1), recorder(&c1_events), false);
	framework.add_listener(ContextId(c2), recorder(&c2_events), true);
	framework.add_listener(ContextId(c2), recorder(&c2_events), false);
	directory.register(Hook::Event(Arc::new(ExcludeContext(ContextId(c2)))), 0);

	let c3 = framework.install(SYSTEM, plain("c3")).unwrap().bundle();
	framework.flush_events();

	assert_eq!(
		c1_events.lock().clone(),
		vec![(BundleEventKind::Installed, c3), (BundleEventKind::Installed, c3)]
	);
	assert!(c2_events.lock().is_empty());
	framework.stop();
}

#[test]
fn async_listeners_see_events_in_order_off_thread() {
	let (framework, _) = framework(FrameworkConfig::default());
	let events = Events::default();
	let threads = Arc::new(Mutex::new(Vec::new()));
	let seen_threads = threads.clone();
	framework.add_listener(ContextId(SYSTEM), recorder(&events), false);
	framework.add_listener(
		ContextId(SYSTEM),
		Arc::new(move |_: &BundleEvent| {
			seen_threads
				.lock()
				.push(thread::current().name().map(str::to_string));
		}),
		false,
	);

	let bundle = framework.install(SYSTEM, plain("a")).unwrap().bundle();
	framework.update(SYSTEM, bundle, plain("a")).unwrap();
	framework.uninstall(SYSTEM, bundle).unwrap();
	framework.flush_events();

	assert_eq!(
		events.lock().clone(),
		vec![
			(BundleEventKind::Installed, bundle),
			(BundleEventKind::Updated, bundle),
			(BundleEventKind::Uninstalled, bundle),
		]
	);
	assert!(
		threads
			.lock()
			.iter()
			.all(|name| name.as_deref() == Some("modwire-events"))
	);
	framework.stop();
}

#[test]
fn inline_delivery_when_async_is_disabled() {
	let mut config = FrameworkConfig::default();
	config.events.async_delivery = false;
	let (framework, _) = framework(config);
	let events = Events::default();
	framework.add_listener(ContextId(SYSTEM), recorder(&events), false);

	let bundle = framework.install(SYSTEM, plain("a")).unwrap().bundle();
	assert_eq!(events.lock().clone(), vec![(BundleEventKind::Installed, bundle)]);
}

fn explode(_: &BundleEvent) {
	panic!("listener bug");
}

#[test]
fn panicking_listener_does_not_block_others() {
	let (framework, _) = framework(FrameworkConfig::default());
	let events = Events::default();
	framework.add_listener(ContextId(SYSTEM), Arc::new(explode), true);
	framework.add_listener(ContextId(SYSTEM), recorder(&events), true);

	let bundle = framework.install(SYSTEM, plain("a")).unwrap().bundle();
	assert_eq!(events.lock().clone(), vec![(BundleEventKind::Installed, bundle)]);
}

struct HideFrom {
	caller: ContextId,
	hidden: BundleId,
}

impl FindHook for HideFrom {
	fn find(&self, caller: ContextId, candidates: &mut RemoveOnly<'_, BundleId>) -> Result<(), HookError> {
		if caller == self.caller {
			candidates.remove(&self.hidden);
		}
		Ok(())
	}
}

#[test]
fn find_hooks_scope_bundle_lookup_per_caller() {
	let (framework, directory) = framework(FrameworkConfig::default());
	let a = framework.install(SYSTEM, plain("a")).unwrap().bundle();
	let b = framework.install(SYSTEM, plain("b")).unwrap().bundle();
	directory.register(
		Hook::Find(Arc::new(HideFrom {
			caller: ContextId(a),
			hidden: b,
		})),
		0,
	);

	assert_eq!(framework.find_bundles(ContextId(a)), vec![a]);
	assert_eq!(framework.find_bundles(ContextId(b)), vec![a, b]);
	assert_eq!(framework.find_bundle(ContextId(a), b), None);
	assert_eq!(framework.find_bundle(ContextId(b), b), Some(b));
	assert_eq!(framework.find_bundle(ContextId(b), BundleId(77)), None);
}

/// Resolver hook factory whose hooks drop every candidate owned by `banned`.
struct Ban {
	banned: GenerationId,
}

struct BanHook {
	banned: GenerationId,
}

impl ResolverHookFactory for Ban {
	fn begin(&self, _triggers: &[GenerationId]) -> Result<Option<Box<dyn ResolverHook>>, HookError> {
		Ok(Some(Box::new(BanHook { banned: self.banned })))
	}
}

impl ResolverHook for BanHook {
	fn filter_matches(
		&self,
		_requirement: &Requirement,
		candidates: &mut RemoveOnly<'_, Capability>,
	) -> Result<(), HookError> {
		candidates.retain(|cap| cap.generation().id() != self.banned);
		Ok(())
	}
}

#[test]
fn resolve_round_trip_with_hooks() {
	let (framework, directory) = framework(FrameworkConfig::default());
	let events = Events::default();
	framework.add_listener(ContextId(SYSTEM), recorder(&events), true);

	let old = framework.install(SYSTEM, exporter("api.old", 0)).unwrap();
	let new = framework.install(SYSTEM, exporter("api.new", 4)).unwrap();
	let app = framework.install(SYSTEM, importer("app")).unwrap();
	directory.register(Hook::ResolverFactory(Arc::new(Ban { banned: old.id() })), 0);

	let hooks = framework.begin_resolve(&[app.id()]).unwrap();
	assert_eq!(hooks.len(), 1);
	assert!(matches!(
		framework.begin_resolve(&[]),
		Err(FrameworkError::Resolve(ResolveHookError::Protocol(
			ProtocolStateError::ResolveInProgress
		)))
	));
	let requirement = app.declared_requirements()[0].clone();
	let providers = framework.find_providers(&requirement, &hooks);
	assert_eq!(providers.len(), 1);
	assert_eq!(providers[0].generation().id(), new.id());

	framework
		.apply_resolution(
			SYSTEM,
			vec![
				Resolution::new(new.id()),
				Resolution::new(app.id()).wire(requirement, providers[0].clone()),
			],
		)
		.unwrap();
	framework.end_resolve();
	assert!(!framework.resolve_hooks().is_resolving());

	let export = framework.package_admin().exported_package("org.acme.api").unwrap();
	assert_eq!(export.exporting_bundle(), Some(new.bundle()));
	assert_eq!(export.importing_bundles(), Some(vec![app.bundle()]));

	framework.update(SYSTEM, new.bundle(), exporter("api.new", 5)).unwrap();
	assert!(export.removal_pending());
	assert_eq!(export.importing_bundles(), None);
	let affected = framework.refresh(SYSTEM, &[new.bundle()]);
	assert_eq!(affected, vec![new.bundle(), app.bundle()]);

	let tail: Vec<_> = events.lock().iter().skip(3).copied().collect();
	assert_eq!(
		tail,
		vec![
			(BundleEventKind::Resolved, new.bundle()),
			(BundleEventKind::Resolved, app.bundle()),
			(BundleEventKind::Updated, new.bundle()),
			(BundleEventKind::Unresolved, new.bundle()),
			(BundleEventKind::Unresolved, app.bundle()),
		]
	);
	framework.stop();
}

#[test]
fn stopped_framework_hands_out_unavailable_hooks() {
	let (framework, directory) = framework(FrameworkConfig::default());
	directory.register(Hook::ResolverFactory(Arc::new(Ban { banned: GenerationId(1) })), 0);
	framework.stop();

	let hooks = framework.resolve_hooks().begin_resolve(&[]).unwrap();
	assert!(!hooks.is_available());

	let events = Events::default();
	framework.add_listener(ContextId(SYSTEM), recorder(&events), false);
	let bundle = framework.install(SYSTEM, plain("late")).unwrap().bundle();
	assert_eq!(
		events.lock().clone(),
		vec![(BundleEventKind::Installed, bundle)],
		"async listeners fall back to inline delivery after stop"
	);
}
