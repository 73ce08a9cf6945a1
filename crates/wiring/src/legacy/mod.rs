//! Read-only package-admin style views over the wiring graph.
//!
//! The views hold generation handles rather than wirings, so once the
//! provider generation stops being current their liveness accessors answer
//! `None` while the identifying fields keep their last values.

use std::sync::Arc;

use crate::attrs::AttrValue;
use crate::capability::Capability;
use crate::generation::{Generation, GenerationRef};
use crate::ids::BundleId;
use crate::namespace::{self, attr};
use crate::registry::GenerationRegistry;
use crate::version::Version;
use crate::wire::Wire;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleType {
	Bundle,
	Fragment,
}

/// Legacy query surface built from a [`GenerationRegistry`].
#[derive(Clone)]
pub struct PackageAdmin {
	registry: GenerationRegistry,
}

impl PackageAdmin {
	pub fn new(registry: GenerationRegistry) -> Self {
		Self { registry }
	}

	/// Packages exported by any installed generation of `bundle`.
	pub fn exported_packages(&self, bundle: BundleId) -> Vec<ExportedPackage> {
		self.registry
			.revisions_of(bundle)
			.iter()
			.flat_map(|generation| exports_of(generation))
			.collect()
	}

	/// Every installed export of the package `name`.
	pub fn exported_packages_named(&self, name: &str) -> Vec<ExportedPackage> {
		self.registry
			.generations()
			.iter()
			.flat_map(|generation| exports_of(generation))
			.filter(|export| export.name() == name)
			.collect()
	}

	/// The live export of `name` with the highest version. Ties go to the
	/// lowest bundle ID.
	pub fn exported_package(&self, name: &str) -> Option<ExportedPackage> {
		let mut live: Vec<(BundleId, ExportedPackage)> = self
			.exported_packages_named(name)
			.into_iter()
			.filter_map(|export| export.exporting_bundle().map(|bundle| (bundle, export)))
			.collect();
		live.sort_by(|(a_bundle, a), (b_bundle, b)| b.version().cmp(a.version()).then(a_bundle.cmp(b_bundle)));
		live.into_iter().next().map(|(_, export)| export)
	}

	/// Installed non-fragment generations, optionally only those named
	/// `symbolic_name`.
	pub fn required_bundles(&self, symbolic_name: Option<&str>) -> Vec<RequiredBundle> {
		self.registry
			.generations()
			.into_iter()
			.filter(|generation| !generation.is_fragment())
			.filter(|generation| symbolic_name.is_none_or(|name| name == generation.symbolic_name()))
			.map(|generation| RequiredBundle::new(&generation))
			.collect()
	}

	/// Fragment bundles attached to the current generation of a host bundle,
	/// in ID order.
	pub fn fragments(&self, bundle: BundleId) -> Vec<BundleId> {
		let Some(wiring) = self
			.registry
			.current(bundle)
			.and_then(|generation| self.registry.wiring(generation.id()))
		else {
			return Vec::new();
		};
		let mut bundles: Vec<_> = wiring.fragments().iter().map(|g| g.bundle()).collect();
		bundles.sort_unstable();
		bundles.dedup();
		bundles
	}

	/// Hosts the current generation of a fragment bundle is attached to.
	pub fn hosts(&self, bundle: BundleId) -> Vec<BundleId> {
		let Some(wiring) = self
			.registry
			.current(bundle)
			.filter(|generation| generation.is_fragment())
			.and_then(|generation| self.registry.wiring(generation.id()))
		else {
			return Vec::new();
		};
		bundles_of(&self.registry, wiring.required_wires(Some(namespace::HOST)).iter().map(Wire::provider))
	}

	pub fn bundle_type(&self, bundle: BundleId) -> Option<BundleType> {
		let generation = self.registry.current(bundle)?;
		Some(if generation.is_fragment() {
			BundleType::Fragment
		} else {
			BundleType::Bundle
		})
	}
}

fn exports_of(generation: &Generation) -> Vec<ExportedPackage> {
	generation
		.capabilities(Some(namespace::PACKAGE))
		.into_iter()
		.filter_map(ExportedPackage::new)
		.collect()
}

/// Sorted, deduplicated owning bundles of the given generation handles.
fn bundles_of<'a>(registry: &GenerationRegistry, handles: impl Iterator<Item = &'a GenerationRef>) -> Vec<BundleId> {
	let mut bundles: Vec<_> = handles
		.filter_map(|handle| registry.generation(handle.id()))
		.map(|generation| generation.bundle())
		.collect();
	bundles.sort_unstable();
	bundles.dedup();
	bundles
}

/// One exported package of one generation.
#[derive(Debug, Clone)]
pub struct ExportedPackage {
	capability: Capability,
	name: String,
	version: Version,
}

impl ExportedPackage {
	/// `None` when the capability carries no package name.
	fn new(capability: Capability) -> Option<Self> {
		let name = capability.attribute(namespace::PACKAGE)?.as_str()?.to_string();
		let version = capability
			.attribute(attr::VERSION)
			.and_then(AttrValue::as_version)
			.cloned()
			.unwrap_or_default();
		Some(Self {
			capability,
			name,
			version,
		})
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn version(&self) -> &Version {
		&self.version
	}

	fn provider(&self) -> Option<(GenerationRegistry, Arc<Generation>)> {
		let handle = self.capability.generation();
		let registry = handle.registry()?;
		if !registry.is_current(handle.id()) {
			return None;
		}
		let generation = registry.generation(handle.id())?;
		Some((registry, generation))
	}

	/// The exporting bundle, or `None` once the provider is no longer current.
	pub fn exporting_bundle(&self) -> Option<BundleId> {
		self.provider().map(|(_, generation)| generation.bundle())
	}

	/// Bundles wired to this export, plus bundles requiring the exporter.
	///
	/// `None` once the provider is no longer current.
	pub fn importing_bundles(&self) -> Option<Vec<BundleId>> {
		let (registry, generation) = self.provider()?;
		let Some(wiring) = registry.wiring(generation.id()) else {
			return Some(Vec::new());
		};
		let package = wiring.provided_wires(Some(namespace::PACKAGE));
		let requiring = wiring.provided_wires(Some(namespace::BUNDLE));
		let requirers = package
			.iter()
			.filter(|wire| *wire.capability() == self.capability)
			.chain(requiring.iter())
			.map(Wire::requirer);
		Some(bundles_of(&registry, requirers))
	}

	/// True once the exporting generation is no longer current.
	pub fn removal_pending(&self) -> bool {
		self.provider().is_none()
	}
}

/// A bundle generation as the target of require-bundle wires.
#[derive(Debug, Clone)]
pub struct RequiredBundle {
	generation: GenerationRef,
	symbolic_name: String,
	version: Version,
}

impl RequiredBundle {
	fn new(generation: &Generation) -> Self {
		Self {
			generation: generation.handle().clone(),
			symbolic_name: generation.symbolic_name().to_string(),
			version: generation.version().clone(),
		}
	}

	pub fn symbolic_name(&self) -> &str {
		&self.symbolic_name
	}

	pub fn version(&self) -> &Version {
		&self.version
	}

	fn live(&self) -> Option<(GenerationRegistry, Arc<Generation>)> {
		let registry = self.generation.registry()?;
		let generation = registry
			.generation(self.generation.id())
			.filter(|generation| !generation.is_uninstalled())?;
		Some((registry, generation))
	}

	/// `None` once the generation is uninstalled.
	pub fn bundle(&self) -> Option<BundleId> {
		self.live().map(|(_, generation)| generation.bundle())
	}

	/// Bundles with a require-bundle wire to this generation.
	pub fn requiring_bundles(&self) -> Option<Vec<BundleId>> {
		let (registry, generation) = self.live()?;
		let Some(wiring) = registry.wiring(generation.id()) else {
			return Some(Vec::new());
		};
		let wires = wiring.provided_wires(Some(namespace::BUNDLE));
		Some(bundles_of(&registry, wires.iter().map(Wire::requirer)))
	}

	/// True once the generation is no longer its bundle's current generation.
	pub fn removal_pending(&self) -> bool {
		self.generation
			.registry()
			.is_none_or(|registry| !registry.is_current(self.generation.id()))
	}
}
