//! Bundle generations, their capabilities and requirements, and the wiring
//! graph a resolver produces over them.
//!
//! # Liveness
//!
//! Capabilities, wires and wirings never own a generation. They hold a
//! [`GenerationRef`] and ask the [`GenerationRegistry`] at call time whether
//! the generation is still current or in use, so objects handed out before an
//! update or refresh degrade to empty answers instead of dangling.

/// Typed attribute values and directive maps.
pub mod attrs;
/// Capabilities and requirements.
pub mod capability;
mod error;
/// RFC 1960 style requirement filters.
pub mod filter;
/// Generations and their declarations.
pub mod generation;
mod ids;
/// Package-admin style read-only views.
pub mod legacy;
/// Code-loading context behind a generation.
pub mod loader;
/// Well-known namespaces, attributes and directives.
pub mod namespace;
mod registry;
mod version;
/// Wires and wirings.
pub mod wire;

pub use attrs::{AttrValue, Attributes, Directives};
pub use capability::{Capability, CapabilityDecl, Requirement, RequirementDecl};
pub use error::{ConfigurationError, RegistryError};
pub use filter::Filter;
pub use generation::{Generation, GenerationDecl, GenerationRef};
pub use ids::{BundleId, GenerationId};
pub use legacy::{BundleType, ExportedPackage, PackageAdmin, RequiredBundle};
pub use loader::{CodeLoader, EmptyLoader, MemoryLoader, ResourceBytes};
pub use namespace::NamespaceBucket;
pub use registry::GenerationRegistry;
pub use version::Version;
pub use wire::{ListOptions, Wire, Wiring};
