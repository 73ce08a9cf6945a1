//! Wires and the per-generation wiring view.

use std::sync::Arc;

use globset::Glob;
use rustc_hash::FxHashSet as HashSet;

use crate::capability::{Capability, Requirement};
use crate::generation::{Generation, GenerationRef};
use crate::loader::ResourceBytes;
use crate::namespace::{self, selects};
use crate::registry::GenerationRegistry;


/// A resolved link from one requirement to the capability chosen for it.
///
/// Wires hold generation handles, never wiring objects; the wiring on either
/// end is looked up again on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
	capability: Capability,
	requirement: Requirement,
	provider: GenerationRef,
	requirer: GenerationRef,
}

impl Wire {
	pub(crate) fn new(
		capability: Capability,
		requirement: Requirement,
		provider: GenerationRef,
		requirer: GenerationRef,
	) -> Self {
		Self {
			capability,
			requirement,
			provider,
			requirer,
		}
	}

	pub fn capability(&self) -> &Capability {
		&self.capability
	}

	pub fn requirement(&self) -> &Requirement {
		&self.requirement
	}

	pub fn provider(&self) -> &GenerationRef {
		&self.provider
	}

	pub fn requirer(&self) -> &GenerationRef {
		&self.requirer
	}

	pub fn namespace(&self) -> &str {
		self.capability.namespace()
	}

	/// The wiring currently attached to the provider generation.
	pub fn provider_wiring(&self) -> Option<Arc<Wiring>> {
		self.provider.registry()?.wiring(self.provider.id())
	}

	/// The wiring currently attached to the requirer generation.
	pub fn requirer_wiring(&self) -> Option<Arc<Wiring>> {
		self.requirer.registry()?.wiring(self.requirer.id())
	}
}

/// Options for [`Wiring::list_resources`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
	/// Search subdirectories of the starting path as well.
	pub recurse: bool,
}

/// The resolved state of one generation.
///
/// Required wires are fixed when the wiring is attached; provided wires are
/// derived from the other attached wirings on every call. Once the wiring is
/// no longer in use every query answers empty.
#[derive(Debug)]
pub struct Wiring {
	generation: GenerationRef,
	required: Vec<Wire>,
}

impl Wiring {
	pub(crate) fn new(generation: GenerationRef, required: Vec<Wire>) -> Self {
		Self { generation, required }
	}

	pub fn generation(&self) -> &GenerationRef {
		&self.generation
	}

	pub(crate) fn wire_count(&self) -> usize {
		self.required.len()
	}

	/// Required wires regardless of liveness.
	pub(crate) fn all_required(&self) -> &[Wire] {
		&self.required
	}

	fn live(&self) -> Option<(GenerationRegistry, Arc<Generation>)> {
		let registry = self.generation.registry()?;
		let generation = registry.generation(self.generation.id())?;
		let in_use = !generation.is_uninstalled()
			&& registry.is_attached(self)
			&& registry.live_generations().contains(&self.generation.id());
		in_use.then_some((registry, generation))
	}

	/// Head of its bundle, installed, and still the attached wiring.
	pub fn is_current(&self) -> bool {
		self.generation
			.registry()
			.is_some_and(|registry| registry.is_current(self.generation.id()) && registry.is_attached(self))
	}

	/// Still attached and reachable from some current generation.
	pub fn is_in_use(&self) -> bool {
		self.live().is_some()
	}

	/// Required wires in the namespace bucket of `ns`, in requirement
	/// declaration order.
	pub fn required_wires(&self, ns: Option<&str>) -> Vec<Wire> {
		if self.live().is_none() {
			return Vec::new();
		}
		self.required
			.iter()
			.filter(|wire| selects(ns, wire.namespace()))
			.cloned()
			.collect()
	}

	/// Wires other wirings hold to this generation's capabilities, ordered by
	/// capability ordinal then requirer.
	pub fn provided_wires(&self, ns: Option<&str>) -> Vec<Wire> {
		let Some((registry, _)) = self.live() else {
			return Vec::new();
		};
		self.provided_from(&registry, ns)
	}

	fn provided_from(&self, registry: &GenerationRegistry, ns: Option<&str>) -> Vec<Wire> {
		let id = self.generation.id();
		let mut wires: Vec<Wire> = registry
			.attached_wirings()
			.iter()
			.flat_map(|wiring| wiring.all_required().iter())
			.filter(|wire| wire.provider().id() == id && selects(ns, wire.namespace()))
			.cloned()
			.collect();
		wires.sort_by_key(|wire| (wire.capability().ordinal(), wire.requirer().id()));
		wires
	}

	/// Effective-for-resolve capabilities of the generation.
	pub fn capabilities(&self, ns: Option<&str>) -> Vec<Capability> {
		let Some((_, generation)) = self.live() else {
			return Vec::new();
		};
		generation
			.capabilities(ns)
			.into_iter()
			.filter(Capability::is_effective_for_resolve)
			.collect()
	}

	/// Effective-for-resolve requirements of the generation.
	pub fn requirements(&self, ns: Option<&str>) -> Vec<Requirement> {
		let Some((_, generation)) = self.live() else {
			return Vec::new();
		};
		generation
			.requirements(ns)
			.into_iter()
			.filter(Requirement::is_effective_for_resolve)
			.collect()
	}

	/// Generations attached to this one as fragments, via host wires.
	pub fn fragments(&self) -> Vec<Arc<Generation>> {
		let Some((registry, _)) = self.live() else {
			return Vec::new();
		};
		self.fragments_in(&registry)
	}

	fn fragments_in(&self, registry: &GenerationRegistry) -> Vec<Arc<Generation>> {
		self.provided_from(registry, Some(namespace::HOST))
			.iter()
			.filter_map(|wire| registry.generation(wire.requirer().id()))
			.collect()
	}

	/// The generation itself followed by its attached fragments.
	fn search_path(&self) -> Vec<Arc<Generation>> {
		let Some((registry, generation)) = self.live() else {
			return Vec::new();
		};
		let mut path = vec![generation];
		path.extend(self.fragments_in(&registry));
		path
	}

	/// First entry at `path` in the generation or its fragments.
	pub fn resource(&self, path: &str) -> Option<ResourceBytes> {
		self.search_path()
			.iter()
			.find_map(|generation| generation.loader().resource(path))
	}

	pub fn load_class(&self, name: &str) -> Option<ResourceBytes> {
		self.search_path()
			.iter()
			.find_map(|generation| generation.loader().class(name))
	}

	/// Entry paths under `path` whose file name matches the glob `pattern`.
	///
	/// Paths are deduplicated across the generation and its fragments, host
	/// entries first. An invalid pattern matches nothing.
	pub fn list_resources(&self, path: &str, pattern: &str, options: ListOptions) -> Vec<String> {
		let matcher = match Glob::new(pattern) {
			Ok(glob) => glob.compile_matcher(),
			Err(error) => {
				tracing::warn!(pattern, %error, "invalid resource pattern");
				return Vec::new();
			}
		};

		let mut seen = HashSet::default();
		let mut found = Vec::new();
		for generation in self.search_path() {
			for entry in generation.loader().list(path, options.recurse) {
				let name = entry.rsplit('/').next().unwrap_or(entry.as_str());
				if matcher.is_match(name) && seen.insert(entry.clone()) {
					found.push(entry);
				}
			}
		}
		found
	}
}
