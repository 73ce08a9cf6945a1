use pretty_assertions::assert_eq;

use super::*;
use crate::error::HookError;
use crate::listeners::ContextId;
use crate::view::RemoveOnly;

struct KeepAll;

impl FindHook for KeepAll {
	fn find(
		&self,
		_caller: ContextId,
		_candidates: &mut RemoveOnly<'_, modwire_wiring::BundleId>,
	) -> Result<(), HookError> {
		Ok(())
	}
}

fn find() -> Hook {
	Hook::Find(Arc::new(KeepAll))
}

#[test]
fn references_are_ranked() {
	let directory = HookDirectory::new();
	let a = directory.register(find(), 0);
	let b = directory.register(find(), 10);
	let c = directory.register(find(), 0);
	let d = directory.register(find(), -3);

	let ids: Vec<_> = directory.references(HookKind::Find).iter().map(ServiceRef::id).collect();
	assert_eq!(ids, vec![b.id(), a.id(), c.id(), d.id()]);
	assert!(directory.references(HookKind::Event).is_empty());
}

#[test]
fn unavailable_hooks_stay_listed() {
	let directory = HookDirectory::new();
	let reference = directory.register(find(), 0);
	assert!(directory.hook(&reference).is_some());

	assert!(directory.set_available(reference.id(), false));
	assert!(directory.hook(&reference).is_none());
	assert_eq!(directory.references(HookKind::Find).len(), 1);

	assert!(directory.unregister(reference.id()));
	assert!(!directory.unregister(reference.id()));
	assert!(!directory.set_available(reference.id(), true));
}

#[test]
fn listeners_run_outside_the_directory_lock() {
	let directory = Arc::new(HookDirectory::new());
	let seen = Arc::new(Mutex::new(Vec::new()));

	let inner = directory.clone();
	let log = seen.clone();
	let id = directory.subscribe(
		HookKind::Find,
		Arc::new(move |event: &RegistrationEvent| {
			let listed = inner.references(HookKind::Find).len();
			log.lock().push((event.clone(), listed));
		}),
	);

	let reference = directory.register(find(), 0);
	directory.unregister(reference.id());
	directory.unsubscribe(id);
	directory.register(find(), 0);

	assert_eq!(
		seen.lock().clone(),
		vec![
			(RegistrationEvent::Registered(reference.clone()), 1),
			(RegistrationEvent::Unregistered(reference), 0),
		]
	);
}

#[test]
fn service_properties() {
	let directory = HookDirectory::new();
	let mut properties = modwire_wiring::Attributes::default();
	properties.insert("name".into(), "audit".into());
	let reference = directory.register_with(find(), 0, properties);
	assert_eq!(reference.property("name").and_then(AttrValue::as_str), Some("audit"));
	assert_eq!(reference.ranking(), 0);
	assert_eq!(find().kind(), HookKind::Find);
}
