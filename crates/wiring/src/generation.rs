//! Installed code generations and non-owning handles to them.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::attrs::{AttrValue, Attributes};
use crate::capability::{Capability, CapabilityDecl, Requirement, RequirementDecl};
use crate::ids::{BundleId, GenerationId};
use crate::loader::{CodeLoader, EmptyLoader};
use crate::namespace::{self, attr};
use crate::registry::{GenerationRegistry, Shared};
use crate::version::Version;

/// Ordinals `0..IDENTITY_SLOTS` belong to synthesized identity capabilities;
/// declared capabilities follow in declaration order.
pub(crate) const IDENTITY_SLOTS: usize = 3;

/// Pre-parsed description of one generation, as produced by the manifest
/// parser.
#[derive(Clone)]
pub struct GenerationDecl {
	pub symbolic_name: String,
	pub version: Version,
	pub fragment: bool,
	/// Extra attributes attached to every identity capability.
	pub identity_attributes: Attributes,
	pub capabilities: Vec<CapabilityDecl>,
	pub requirements: Vec<RequirementDecl>,
	pub loader: Arc<dyn CodeLoader>,
}

impl GenerationDecl {
	pub fn new(symbolic_name: impl Into<String>, version: Version) -> Self {
		Self {
			symbolic_name: symbolic_name.into(),
			version,
			fragment: false,
			identity_attributes: Attributes::default(),
			capabilities: Vec::new(),
			requirements: Vec::new(),
			loader: Arc::new(EmptyLoader),
		}
	}

	pub fn fragment(mut self, fragment: bool) -> Self {
		self.fragment = fragment;
		self
	}

	pub fn identity_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.identity_attributes.insert(name.into(), value.into());
		self
	}

	pub fn capability(mut self, decl: CapabilityDecl) -> Self {
		self.capabilities.push(decl);
		self
	}

	pub fn requirement(mut self, decl: RequirementDecl) -> Self {
		self.requirements.push(decl);
		self
	}

	pub fn loader(mut self, loader: impl CodeLoader + 'static) -> Self {
		self.loader = Arc::new(loader);
		self
	}
}

impl fmt::Debug for GenerationDecl {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("GenerationDecl")
			.field("symbolic_name", &self.symbolic_name)
			.field("version", &self.version)
			.field("fragment", &self.fragment)
			.field("capabilities", &self.capabilities.len())
			.field("requirements", &self.requirements.len())
			.finish_non_exhaustive()
	}
}

/// Non-owning reference to a generation.
///
/// Holds the generation ID plus a weak handle to the registry; every lookup
/// goes through the registry so a removed generation or a dropped registry
/// resolves to `None` instead of dangling.
#[derive(Clone)]
pub struct GenerationRef {
	registry: Weak<Shared>,
	id: GenerationId,
}

impl GenerationRef {
	pub(crate) fn new(registry: Weak<Shared>, id: GenerationId) -> Self {
		Self { registry, id }
	}

	/// A handle that never resolves. Used for capabilities built outside a
	/// registry.
	pub fn detached(id: GenerationId) -> Self {
		Self {
			registry: Weak::new(),
			id,
		}
	}

	pub fn id(&self) -> GenerationId {
		self.id
	}

	/// Looks up the generation; `None` once it has been removed.
	pub fn get(&self) -> Option<Arc<Generation>> {
		self.registry()?.generation(self.id)
	}

	pub fn registry(&self) -> Option<GenerationRegistry> {
		self.registry.upgrade().map(GenerationRegistry::from_shared)
	}
}

impl PartialEq for GenerationRef {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && self.registry.ptr_eq(&other.registry)
	}
}

impl Eq for GenerationRef {}

impl fmt::Debug for GenerationRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "GenerationRef({})", self.id)
	}
}

/// One immutable installed version of a bundle.
///
/// Only the uninstalled flag changes after construction.
pub struct Generation {
	id: GenerationId,
	bundle: BundleId,
	symbolic_name: String,
	version: Version,
	fragment: bool,
	identity_attributes: Attributes,
	capabilities: Vec<Capability>,
	requirements: Vec<Requirement>,
	loader: Arc<dyn CodeLoader>,
	uninstalled: AtomicBool,
	handle: GenerationRef,
}

impl Generation {
	/// Builds a generation, constructing its capabilities and requirements.
	pub(crate) fn build(
		handle: GenerationRef,
		bundle: BundleId,
		decl: GenerationDecl,
	) -> Result<Self, crate::ConfigurationError> {
		let capabilities = decl
			.capabilities
			.iter()
			.enumerate()
			.map(|(i, cap)| Capability::from_declaration(handle.clone(), IDENTITY_SLOTS + i, cap))
			.collect::<Result<Vec<_>, _>>()?;
		let requirements = decl
			.requirements
			.iter()
			.enumerate()
			.map(|(i, req)| Requirement::from_declaration(handle.clone(), i, req))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			id: handle.id(),
			bundle,
			symbolic_name: decl.symbolic_name,
			version: decl.version,
			fragment: decl.fragment,
			identity_attributes: decl.identity_attributes,
			capabilities,
			requirements,
			loader: decl.loader,
			uninstalled: AtomicBool::new(false),
			handle,
		})
	}

	pub fn id(&self) -> GenerationId {
		self.id
	}

	pub fn bundle(&self) -> BundleId {
		self.bundle
	}

	pub fn symbolic_name(&self) -> &str {
		&self.symbolic_name
	}

	pub fn version(&self) -> &Version {
		&self.version
	}

	pub fn is_fragment(&self) -> bool {
		self.fragment
	}

	pub fn identity_attributes(&self) -> &Attributes {
		&self.identity_attributes
	}

	pub fn handle(&self) -> &GenerationRef {
		&self.handle
	}

	pub fn loader(&self) -> &Arc<dyn CodeLoader> {
		&self.loader
	}

	pub fn is_uninstalled(&self) -> bool {
		self.uninstalled.load(Ordering::Acquire)
	}

	/// Returns false if the generation was already uninstalled.
	pub(crate) fn mark_uninstalled(&self) -> bool {
		!self.uninstalled.swap(true, Ordering::AcqRel)
	}

	/// Capabilities declared through the generic mechanism, in declaration order.
	pub fn declared_capabilities(&self) -> &[Capability] {
		&self.capabilities
	}

	/// Requirements in declaration order.
	pub fn declared_requirements(&self) -> &[Requirement] {
		&self.requirements
	}

	/// Synthesizes the identity capability for `ns`.
	///
	/// Built fresh on every call. Returns `None` for namespaces that are not
	/// identity-reserved, and for the bundle and host namespaces of fragments,
	/// which cannot be required or hosted.
	pub fn identity_capability(&self, ns: &str) -> Option<Capability> {
		let ordinal = namespace::RESERVED.iter().position(|r| *r == ns)?;
		if self.fragment && ns != namespace::IDENTITY {
			return None;
		}

		let mut attributes = self.identity_attributes.clone();
		attributes.insert(ns.to_string(), AttrValue::String(self.symbolic_name.clone()));
		attributes.insert(
			attr::BUNDLE_VERSION.to_string(),
			AttrValue::Version(self.version.clone()),
		);
		if ns == namespace::IDENTITY {
			attributes.insert(attr::VERSION.to_string(), AttrValue::Version(self.version.clone()));
			let kind = if self.fragment {
				attr::TYPE_FRAGMENT
			} else {
				attr::TYPE_BUNDLE
			};
			attributes.insert(attr::TYPE.to_string(), kind.into());
		}

		Some(Capability::new_unchecked(
			self.handle.clone(),
			ordinal,
			ns.to_string(),
			attributes,
			Default::default(),
		))
	}

	/// All capabilities: synthesized identity capabilities first, then declared
	/// ones. `None` selects every namespace.
	pub fn capabilities(&self, ns: Option<&str>) -> Vec<Capability> {
		namespace::RESERVED
			.iter()
			.filter(|reserved| ns.is_none_or(|ns| ns == **reserved))
			.filter_map(|reserved| self.identity_capability(reserved))
			.chain(
				self.capabilities
					.iter()
					.filter(|cap| ns.is_none_or(|ns| ns == cap.namespace()))
					.cloned(),
			)
			.collect()
	}

	pub fn requirements(&self, ns: Option<&str>) -> Vec<Requirement> {
		self.requirements
			.iter()
			.filter(|req| ns.is_none_or(|ns| ns == req.namespace()))
			.cloned()
			.collect()
	}
}

impl fmt::Debug for Generation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Generation")
			.field("id", &self.id)
			.field("bundle", &self.bundle)
			.field("symbolic_name", &self.symbolic_name)
			.field("version", &self.version)
			.field("fragment", &self.fragment)
			.field("uninstalled", &self.is_uninstalled())
			.finish()
	}
}
