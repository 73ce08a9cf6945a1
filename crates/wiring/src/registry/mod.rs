//! Generation history and wiring state for every installed bundle.
//!
//! # Locking
//!
//! Each lock below is taken on its own and released before the next one is
//! acquired. No method holds two of them at once.
//!
//! - `bundles`: bundle table.
//! - per-bundle `history`: append-only generation list.
//! - `generations`: ID index of live generations.
//! - `wirings`: attached wiring per generation.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::capability::{Capability, Requirement};
use crate::error::RegistryError;
use crate::generation::{Generation, GenerationDecl, GenerationRef};
use crate::ids::{BundleId, GenerationId, IdClock};
use crate::wire::{Wire, Wiring};


pub(crate) struct BundleHistory {
	history: Mutex<Vec<Arc<Generation>>>,
	removed: AtomicBool,
}

impl BundleHistory {
	fn new(first: Arc<Generation>) -> Self {
		Self {
			history: Mutex::new(vec![first]),
			removed: AtomicBool::new(false),
		}
	}

	fn is_removed(&self) -> bool {
		self.removed.load(Ordering::Acquire)
	}

	fn head(&self) -> Option<Arc<Generation>> {
		if self.is_removed() {
			return None;
		}
		self.history
			.lock()
			.last()
			.filter(|generation| !generation.is_uninstalled())
			.cloned()
	}

	fn all(&self) -> Vec<Arc<Generation>> {
		self.history.lock().clone()
	}
}

#[derive(Default)]
pub(crate) struct Shared {
	bundle_ids: IdClock,
	generation_ids: IdClock,
	bundles: RwLock<HashMap<BundleId, Arc<BundleHistory>>>,
	generations: RwLock<HashMap<GenerationId, Arc<Generation>>>,
	wirings: RwLock<HashMap<GenerationId, Arc<Wiring>>>,
}

/// Identity and lifecycle of installed generations, plus the wiring graph
/// attached to them.
///
/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct GenerationRegistry {
	shared: Arc<Shared>,
}

impl GenerationRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
		Self { shared }
	}

	fn build(&self, bundle: BundleId, decl: GenerationDecl) -> Result<Arc<Generation>, RegistryError> {
		let id = GenerationId(self.shared.generation_ids.next());
		let handle = GenerationRef::new(Arc::downgrade(&self.shared), id);
		Ok(Arc::new(Generation::build(handle, bundle, decl)?))
	}

	/// Installs a new bundle with `decl` as its first generation.
	///
	/// # Errors
	///
	/// Fails with [`RegistryError::Configuration`] when a declaration is invalid;
	/// nothing is recorded in that case.
	pub fn install(&self, decl: GenerationDecl) -> Result<Arc<Generation>, RegistryError> {
		let bundle = BundleId(self.shared.bundle_ids.next());
		let generation = self.build(bundle, decl)?;
		self.shared
			.generations
			.write()
			.insert(generation.id(), generation.clone());
		self.shared
			.bundles
			.write()
			.insert(bundle, Arc::new(BundleHistory::new(generation.clone())));
		tracing::debug!(
			%bundle,
			generation = %generation.id(),
			name = generation.symbolic_name(),
			"bundle installed"
		);
		Ok(generation)
	}

	/// Appends a new head generation to `bundle`.
	///
	/// The previous head stays installed as a zombie for as long as wirings
	/// still reach it.
	pub fn update(&self, bundle: BundleId, decl: GenerationDecl) -> Result<Arc<Generation>, RegistryError> {
		let history = self.history(bundle)?;
		if history.is_removed() {
			return Err(RegistryError::BundleUninstalled(bundle));
		}
		let generation = self.build(bundle, decl)?;
		self.shared
			.generations
			.write()
			.insert(generation.id(), generation.clone());
		history.history.lock().push(generation.clone());
		tracing::debug!(%bundle, generation = %generation.id(), "bundle updated");
		Ok(generation)
	}

	/// Marks `bundle` removed. Its generations stay until the next refresh.
	pub fn uninstall(&self, bundle: BundleId) -> Result<(), RegistryError> {
		let history = self.history(bundle)?;
		if history.removed.swap(true, Ordering::AcqRel) {
			return Err(RegistryError::BundleUninstalled(bundle));
		}
		tracing::debug!(%bundle, "bundle uninstalled");
		Ok(())
	}

	/// Marks one generation uninstalled. Returns false if it already was.
	pub fn uninstall_generation(&self, generation: GenerationId) -> Result<bool, RegistryError> {
		let generation = self
			.generation(generation)
			.ok_or(RegistryError::UnknownGeneration(generation))?;
		Ok(generation.mark_uninstalled())
	}

	fn history(&self, bundle: BundleId) -> Result<Arc<BundleHistory>, RegistryError> {
		self.shared
			.bundles
			.read()
			.get(&bundle)
			.cloned()
			.ok_or(RegistryError::UnknownBundle(bundle))
	}

	/// Snapshot of the non-uninstalled generations of `bundle`, in install order.
	///
	/// The list is copied under the history lock; later installs do not show up
	/// in it.
	pub fn revisions_of(&self, bundle: BundleId) -> Vec<Arc<Generation>> {
		let Ok(history) = self.history(bundle) else {
			return Vec::new();
		};
		let guard = history.history.lock();
		guard
			.iter()
			.filter(|generation| !generation.is_uninstalled())
			.cloned()
			.collect()
	}

	/// The head generation of `bundle`, unless the bundle is removed.
	pub fn current(&self, bundle: BundleId) -> Option<Arc<Generation>> {
		self.history(bundle).ok()?.head()
	}

	pub fn generation(&self, id: GenerationId) -> Option<Arc<Generation>> {
		self.shared.generations.read().get(&id).cloned()
	}

	/// Installed, non-removed bundles in ID order.
	pub fn bundles(&self) -> Vec<BundleId> {
		let mut ids: Vec<_> = self
			.shared
			.bundles
			.read()
			.iter()
			.filter(|(_, history)| !history.is_removed())
			.map(|(id, _)| *id)
			.collect();
		ids.sort_unstable();
		ids
	}

	/// Every known, non-uninstalled generation in ID order.
	pub fn generations(&self) -> Vec<Arc<Generation>> {
		let mut all: Vec<_> = self
			.shared
			.generations
			.read()
			.values()
			.filter(|generation| !generation.is_uninstalled())
			.cloned()
			.collect();
		all.sort_unstable_by_key(|generation| generation.id());
		all
	}

	/// True when `id` is the head of its bundle and still installed.
	pub fn is_current(&self, id: GenerationId) -> bool {
		let Some(generation) = self.generation(id) else {
			return false;
		};
		self.current(generation.bundle())
			.is_some_and(|head| head.id() == id)
	}

	/// Records the resolver's chosen `(requirement, capability)` pairs as the
	/// wiring of `generation`, replacing any previous wiring.
	///
	/// Wires are stored in requirement declaration order.
	pub fn attach_wiring(
		&self,
		generation: GenerationId,
		wires: impl IntoIterator<Item = (Requirement, Capability)>,
	) -> Result<Arc<Wiring>, RegistryError> {
		let requirer = self
			.generation(generation)
			.filter(|g| !g.is_uninstalled())
			.ok_or(RegistryError::UnknownGeneration(generation))?;

		let mut built = Vec::new();
		for (requirement, capability) in wires {
			let owner = requirement.generation().id();
			if owner != generation {
				return Err(RegistryError::ForeignRequirement { generation, owner });
			}
			if requirement.namespace() != capability.namespace() {
				return Err(RegistryError::NamespaceMismatch {
					requirement: requirement.namespace().to_string(),
					capability: capability.namespace().to_string(),
				});
			}
			let provider = self
				.generation(capability.generation().id())
				.ok_or(RegistryError::UnknownGeneration(capability.generation().id()))?;
			built.push(Wire::new(
				capability,
				requirement,
				provider.handle().clone(),
				requirer.handle().clone(),
			));
		}
		built.sort_by_key(|wire| (wire.requirement().ordinal(), wire.provider().id()));

		let wiring = Arc::new(Wiring::new(requirer.handle().clone(), built));
		self.shared
			.wirings
			.write()
			.insert(generation, wiring.clone());
		tracing::debug!(%generation, wires = wiring.wire_count(), "wiring attached");
		Ok(wiring)
	}

	/// The wiring currently attached to `generation`.
	pub fn wiring(&self, generation: GenerationId) -> Option<Arc<Wiring>> {
		self.shared.wirings.read().get(&generation).cloned()
	}

	pub(crate) fn is_attached(&self, wiring: &Wiring) -> bool {
		self.wiring(wiring.generation().id())
			.is_some_and(|attached| std::ptr::eq(Arc::as_ptr(&attached), wiring))
	}

	pub(crate) fn attached_wirings(&self) -> Vec<Arc<Wiring>> {
		let mut all: Vec<_> = self.shared.wirings.read().values().cloned().collect();
		all.sort_unstable_by_key(|wiring| wiring.generation().id());
		all
	}

	/// Generations reachable from any current generation through required
	/// wires. Uninstalled generations are never live.
	pub fn live_generations(&self) -> HashSet<GenerationId> {
		let roots: Vec<GenerationId> = {
			let bundles: Vec<_> = self.shared.bundles.read().values().cloned().collect();
			bundles
				.iter()
				.filter_map(|history| history.head())
				.map(|generation| generation.id())
				.collect()
		};
		let wirings = self.shared.wirings.read().clone();

		let mut live = HashSet::default();
		let mut queue: VecDeque<GenerationId> = roots.into();
		while let Some(id) = queue.pop_front() {
			let installed = self.generation(id).is_some_and(|g| !g.is_uninstalled());
			if !installed || !live.insert(id) {
				continue;
			}
			if let Some(wiring) = wirings.get(&id) {
				queue.extend(wiring.all_required().iter().map(|wire| wire.provider().id()));
			}
		}
		live
	}

	/// Bundles that still have zombie generations: superseded or removed
	/// generations kept installed until the next refresh.
	pub fn removal_pending(&self) -> Vec<BundleId> {
		let bundles: Vec<_> = {
			let guard = self.shared.bundles.read();
			guard.iter().map(|(id, h)| (*id, h.clone())).collect()
		};
		let mut pending: Vec<_> = bundles
			.into_iter()
			.filter(|(_, history)| {
				let head = history.head().map(|g| g.id());
				history
					.all()
					.iter()
					.any(|g| !g.is_uninstalled() && Some(g.id()) != head)
			})
			.map(|(id, _)| id)
			.collect();
		pending.sort_unstable();
		pending
	}

	/// Refreshes `bundles` and every bundle wired to them, transitively.
	///
	/// All wirings in the affected set are detached, every generation that is
	/// not its bundle's head is uninstalled, and removed bundles are dropped.
	/// Returns the affected bundles in ID order.
	pub fn refresh(&self, bundles: &[BundleId]) -> Vec<BundleId> {
		let mut closure: BTreeSet<BundleId> = bundles.iter().copied().collect();
		let wirings = self.attached_wirings();
		let bundle_of = |id: GenerationId| self.generation(id).map(|g| g.bundle());

		loop {
			let mut grew = false;
			for wiring in &wirings {
				let Some(requirer) = bundle_of(wiring.generation().id()) else {
					continue;
				};
				if closure.contains(&requirer) {
					continue;
				}
				let depends = wiring
					.all_required()
					.iter()
					.filter_map(|wire| bundle_of(wire.provider().id()))
					.any(|provider| closure.contains(&provider));
				if depends {
					closure.insert(requirer);
					grew = true;
				}
			}
			if !grew {
				break;
			}
		}

		let histories: Vec<(BundleId, Arc<BundleHistory>)> = {
			let guard = self.shared.bundles.read();
			closure
				.iter()
				.filter_map(|id| guard.get(id).map(|h| (*id, h.clone())))
				.collect()
		};

		let mut detached = Vec::new();
		let mut retired = Vec::new();
		for (_, history) in &histories {
			let head = history.head().map(|g| g.id());
			for generation in history.all() {
				detached.push(generation.id());
				if Some(generation.id()) != head {
					generation.mark_uninstalled();
					retired.push(generation.id());
				}
			}
		}

		{
			let mut guard = self.shared.wirings.write();
			for id in &detached {
				guard.remove(id);
			}
		}
		{
			let mut guard = self.shared.generations.write();
			for id in &retired {
				guard.remove(id);
			}
		}
		{
			let mut guard = self.shared.bundles.write();
			for (id, history) in &histories {
				if history.is_removed() {
					guard.remove(id);
				}
			}
		}

		tracing::debug!(
			affected = closure.len(),
			retired = retired.len(),
			"refresh completed"
		);
		closure.into_iter().collect()
	}
}
