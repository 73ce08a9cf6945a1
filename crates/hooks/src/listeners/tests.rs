use std::sync::atomic::AtomicUsize;

use pretty_assertions::assert_eq;

use super::*;

fn ctx(id: u64) -> ContextId {
	ContextId(BundleId(id))
}

#[test]
fn add_remove_and_copy() {
	let registry = ListenerRegistry::new();
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let a = registry.add(
		ctx(1),
		Arc::new(move |_: &BundleEvent| {
			counter.fetch_add(1, Ordering::Relaxed);
		}),
	);
	let b = registry.add(ctx(2), Arc::new(|_: &BundleEvent| {}));
	registry.add(ctx(2), Arc::new(|_: &BundleEvent| {}));
	assert_eq!(registry.len(), 3);

	let mut out = Vec::new();
	registry.copy_into(&mut out);
	assert_eq!(out.iter().map(|e| e.context).collect::<Vec<_>>(), vec![ctx(1), ctx(2), ctx(2)]);
	out[0]
		.listener
		.bundle_changed(&BundleEvent::new(BundleEventKind::Started, BundleId(1), BundleId(1)));
	assert_eq!(calls.load(Ordering::Relaxed), 1);

	assert!(registry.remove(b));
	assert!(!registry.remove(b));
	assert_eq!(registry.remove_context(ctx(2)), 1);
	assert_eq!(registry.snapshot().iter().map(|e| e.id).collect::<Vec<_>>(), vec![a]);
	assert_eq!(out.len(), 3, "copies are independent of the registry");
}

#[test]
fn listener_may_mutate_registry_it_was_copied_from() {
	let registry = Arc::new(ListenerRegistry::new());
	let inner = registry.clone();
	registry.add(
		ctx(1),
		Arc::new(move |_: &BundleEvent| {
			inner.remove_context(ctx(1));
		}),
	);

	let mut out = Vec::new();
	registry.copy_into(&mut out);
	for entry in &out {
		entry
			.listener
			.bundle_changed(&BundleEvent::new(BundleEventKind::Stopped, BundleId(1), BundleId(1)));
	}
	assert!(registry.is_empty());
}
