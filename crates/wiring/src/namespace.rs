//! Well-known namespaces, attribute and directive names.

/// Identity of a generation (symbolic name, version, type).
pub const IDENTITY: &str = "osgi.identity";
/// Bundle-level requirement target (require-bundle).
pub const BUNDLE: &str = "osgi.wiring.bundle";
/// Fragment attachment target.
pub const HOST: &str = "osgi.wiring.host";
/// Exported/imported packages.
pub const PACKAGE: &str = "osgi.wiring.package";

/// Namespaces whose capabilities are synthesized from generation identity and
/// may not be declared through the generic capability mechanism.
pub const RESERVED: [&str; 3] = [IDENTITY, BUNDLE, HOST];

pub fn is_reserved(namespace: &str) -> bool {
	RESERVED.contains(&namespace)
}

pub mod attr {
	pub const VERSION: &str = "version";
	pub const BUNDLE_VERSION: &str = "bundle-version";
	pub const TYPE: &str = "type";
	pub const TYPE_BUNDLE: &str = "osgi.bundle";
	pub const TYPE_FRAGMENT: &str = "osgi.fragment";
}

pub mod directive {
	pub const EFFECTIVE: &str = "effective";
	pub const EFFECTIVE_RESOLVE: &str = "resolve";
	pub const FILTER: &str = "filter";
	pub const RESOLUTION: &str = "resolution";
	pub const RESOLUTION_OPTIONAL: &str = "optional";
}

/// Coarse namespace classification used to partition wiring queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceBucket {
	/// Bundle-identity wires (`osgi.wiring.bundle`).
	Identity,
	Host,
	Package,
	Other,
}

impl NamespaceBucket {
	pub fn of(namespace: &str) -> Self {
		match namespace {
			BUNDLE => Self::Identity,
			HOST => Self::Host,
			PACKAGE => Self::Package,
			_ => Self::Other,
		}
	}
}

/// Returns true when a wire in `namespace` is selected by a query for `query`.
///
/// `None` selects everything. Queries classify into buckets first; within the
/// catch-all bucket the namespace must match exactly.
pub(crate) fn selects(query: Option<&str>, namespace: &str) -> bool {
	let Some(query) = query else {
		return true;
	};
	match NamespaceBucket::of(query) {
		NamespaceBucket::Other => query == namespace,
		bucket => bucket == NamespaceBucket::of(namespace),
	}
}
