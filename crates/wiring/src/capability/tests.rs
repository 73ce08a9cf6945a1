use pretty_assertions::assert_eq;

use super::*;
use crate::ids::GenerationId;

fn owner() -> GenerationRef {
	GenerationRef::detached(GenerationId(1))
}

#[test]
fn reserved_namespaces_are_rejected() {
	for ns in namespace::RESERVED {
		let err = Capability::from_declaration(owner(), 3, &CapabilityDecl::new(ns)).unwrap_err();
		assert_eq!(err, ConfigurationError::ReservedNamespace(ns.to_string()));
	}

	let cap = Capability::from_declaration(owner(), 3, &CapabilityDecl::new(namespace::PACKAGE))
		.expect("package namespace is not reserved");
	assert_eq!(cap.namespace(), namespace::PACKAGE);
	assert_eq!(cap.ordinal(), 3);
	assert_eq!(cap.generation().id(), GenerationId(1));
}

#[test]
fn effective_directive() {
	let cases = [
		(None, true),
		(Some("resolve"), true),
		(Some("active"), false),
		(Some("Resolve"), false),
		(Some(""), false),
	];
	for (effective, expected) in cases {
		let mut decl = CapabilityDecl::new("acme.service");
		let mut req = RequirementDecl::new("acme.service");
		if let Some(value) = effective {
			decl = decl.directive(directive::EFFECTIVE, value);
			req = req.directive(directive::EFFECTIVE, value);
		}
		let cap = Capability::from_declaration(owner(), 3, &decl).unwrap();
		let req = Requirement::from_declaration(owner(), 0, &req).unwrap();
		assert_eq!(cap.is_effective_for_resolve(), expected, "capability effective={effective:?}");
		assert_eq!(req.is_effective_for_resolve(), expected, "requirement effective={effective:?}");
	}
}

#[test]
fn requirement_matches_by_namespace_and_filter() {
	let cap = Capability::from_declaration(
		GenerationRef::detached(GenerationId(2)),
		3,
		&CapabilityDecl::new(namespace::PACKAGE)
			.attr(namespace::PACKAGE, "org.acme.api")
			.attr("version", crate::Version::new(1, 4, 0)),
	)
	.unwrap();

	let wants = |filter: &str| {
		Requirement::from_declaration(owner(), 0, &RequirementDecl::new(namespace::PACKAGE).filter(filter))
			.unwrap()
	};
	assert!(wants("(&(osgi.wiring.package=org.acme.api)(version>=1.0.0))").matches(&cap));
	assert!(!wants("(&(osgi.wiring.package=org.acme.api)(version>=2.0.0))").matches(&cap));
	assert!(!wants("(osgi.wiring.package=org.acme.impl)").matches(&cap));

	let unfiltered = Requirement::from_declaration(owner(), 0, &RequirementDecl::new(namespace::PACKAGE)).unwrap();
	assert!(unfiltered.matches(&cap));

	let other_ns = Requirement::from_declaration(owner(), 0, &RequirementDecl::new("acme.service")).unwrap();
	assert!(!other_ns.matches(&cap));
}

#[test]
fn optional_resolution() {
	let plain = Requirement::from_declaration(owner(), 0, &RequirementDecl::new("x")).unwrap();
	let optional = Requirement::from_declaration(
		owner(),
		1,
		&RequirementDecl::new("x").directive(directive::RESOLUTION, directive::RESOLUTION_OPTIONAL),
	)
	.unwrap();
	assert!(!plain.is_optional());
	assert!(optional.is_optional());
}

#[test]
fn invalid_filter_fails_construction() {
	let err = Requirement::from_declaration(owner(), 0, &RequirementDecl::new("x").filter("(a=b")).unwrap_err();
	assert!(matches!(err, ConfigurationError::InvalidFilter { offset: 4, .. }), "{err:?}");
}

#[test]
fn equality_follows_owner_and_ordinal() {
	let decl = CapabilityDecl::new("acme.service").attr("name", "cache");
	let a = Capability::from_declaration(owner(), 3, &decl).unwrap();
	let b = Capability::from_declaration(owner(), 3, &decl).unwrap();
	let c = Capability::from_declaration(owner(), 4, &decl).unwrap();
	assert_eq!(a, a.clone());
	assert_eq!(a, b);
	assert_ne!(a, c);
}
