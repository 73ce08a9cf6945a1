//! Capabilities and requirements declared by generations.

use std::fmt;
use std::sync::Arc;

use crate::attrs::{AttrValue, Attributes, Directives};
use crate::error::ConfigurationError;
use crate::filter::Filter;
use crate::generation::GenerationRef;
use crate::namespace::{self, directive};

#[cfg(test)]
mod tests;

/// Pre-parsed capability declaration, as produced by the manifest parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityDecl {
	pub namespace: String,
	pub attributes: Attributes,
	pub directives: Directives,
}

impl CapabilityDecl {
	pub fn new(namespace: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			..Self::default()
		}
	}

	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	pub fn directive(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.directives.insert(name.into(), value.into());
		self
	}
}

/// Pre-parsed requirement declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementDecl {
	pub namespace: String,
	pub attributes: Attributes,
	pub directives: Directives,
}

impl RequirementDecl {
	pub fn new(namespace: impl Into<String>) -> Self {
		Self {
			namespace: namespace.into(),
			..Self::default()
		}
	}

	/// Shorthand for setting the `filter` directive.
	pub fn filter(self, filter: impl Into<String>) -> Self {
		self.directive(directive::FILTER, filter)
	}

	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	pub fn directive(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.directives.insert(name.into(), value.into());
		self
	}
}

struct CapabilityData {
	namespace: String,
	attributes: Attributes,
	directives: Directives,
	owner: GenerationRef,
	ordinal: usize,
}

/// A named, attributed fact offered by one generation.
///
/// Immutable; clones share the same payload.
#[derive(Clone)]
pub struct Capability(Arc<CapabilityData>);

impl Capability {
	/// Builds a capability from a generic declaration.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::ReservedNamespace`] when the namespace is one
	/// of [`namespace::RESERVED`]; those capabilities are synthesized from the
	/// generation's identity instead.
	pub fn from_declaration(
		owner: GenerationRef,
		ordinal: usize,
		decl: &CapabilityDecl,
	) -> Result<Self, ConfigurationError> {
		if namespace::is_reserved(&decl.namespace) {
			return Err(ConfigurationError::ReservedNamespace(decl.namespace.clone()));
		}
		Ok(Self::new_unchecked(
			owner,
			ordinal,
			decl.namespace.clone(),
			decl.attributes.clone(),
			decl.directives.clone(),
		))
	}

	pub(crate) fn new_unchecked(
		owner: GenerationRef,
		ordinal: usize,
		namespace: String,
		attributes: Attributes,
		directives: Directives,
	) -> Self {
		Self(Arc::new(CapabilityData {
			namespace,
			attributes,
			directives,
			owner,
			ordinal,
		}))
	}

	pub fn namespace(&self) -> &str {
		&self.0.namespace
	}

	pub fn attributes(&self) -> &Attributes {
		&self.0.attributes
	}

	pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
		self.0.attributes.get(name)
	}

	pub fn directives(&self) -> &Directives {
		&self.0.directives
	}

	pub fn directive(&self, name: &str) -> Option<&str> {
		self.0.directives.get(name).map(String::as_str)
	}

	/// Non-owning handle to the declaring generation.
	pub fn generation(&self) -> &GenerationRef {
		&self.0.owner
	}

	/// Position in the owning generation's capability list.
	pub fn ordinal(&self) -> usize {
		self.0.ordinal
	}

	/// True unless the `effective` directive names a phase other than resolve.
	///
	/// Capabilities with another `effective` value are informational and are
	/// skipped by default resolution.
	pub fn is_effective_for_resolve(&self) -> bool {
		is_effective(&self.0.directives)
	}
}

impl PartialEq for Capability {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
			|| (self.0.owner.id() == other.0.owner.id()
				&& self.0.ordinal == other.0.ordinal
				&& self.0.namespace == other.0.namespace
				&& self.0.attributes == other.0.attributes
				&& self.0.directives == other.0.directives)
	}
}

impl fmt::Debug for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Capability")
			.field("namespace", &self.0.namespace)
			.field("attributes", &self.0.attributes)
			.field("directives", &self.0.directives)
			.field("generation", &self.0.owner.id())
			.finish()
	}
}

struct RequirementData {
	namespace: String,
	attributes: Attributes,
	directives: Directives,
	filter: Option<Filter>,
	owner: GenerationRef,
	ordinal: usize,
}

/// A named, filtered need declared by one generation.
#[derive(Clone)]
pub struct Requirement(Arc<RequirementData>);

impl Requirement {
	/// Builds a requirement, parsing its `filter` directive.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::InvalidFilter`] when the filter does not parse.
	pub fn from_declaration(
		owner: GenerationRef,
		ordinal: usize,
		decl: &RequirementDecl,
	) -> Result<Self, ConfigurationError> {
		let filter = decl
			.directives
			.get(directive::FILTER)
			.map(|raw| Filter::parse(raw))
			.transpose()?;
		Ok(Self(Arc::new(RequirementData {
			namespace: decl.namespace.clone(),
			attributes: decl.attributes.clone(),
			directives: decl.directives.clone(),
			filter,
			owner,
			ordinal,
		})))
	}

	pub fn namespace(&self) -> &str {
		&self.0.namespace
	}

	pub fn attributes(&self) -> &Attributes {
		&self.0.attributes
	}

	pub fn directives(&self) -> &Directives {
		&self.0.directives
	}

	pub fn directive(&self, name: &str) -> Option<&str> {
		self.0.directives.get(name).map(String::as_str)
	}

	pub fn filter(&self) -> Option<&Filter> {
		self.0.filter.as_ref()
	}

	pub fn generation(&self) -> &GenerationRef {
		&self.0.owner
	}

	/// Position in the owning generation's requirement list.
	pub fn ordinal(&self) -> usize {
		self.0.ordinal
	}

	pub fn is_optional(&self) -> bool {
		self.directive(directive::RESOLUTION) == Some(directive::RESOLUTION_OPTIONAL)
	}

	pub fn is_effective_for_resolve(&self) -> bool {
		is_effective(&self.0.directives)
	}

	/// Returns true when `capability` is in the same namespace and satisfies
	/// this requirement's filter. A requirement without filter matches every
	/// capability of its namespace.
	pub fn matches(&self, capability: &Capability) -> bool {
		self.0.namespace == capability.namespace()
			&& self
				.0
				.filter
				.as_ref()
				.is_none_or(|filter| filter.matches(capability.attributes()))
	}
}

impl PartialEq for Requirement {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
			|| (self.0.owner.id() == other.0.owner.id() && self.0.ordinal == other.0.ordinal)
	}
}

impl fmt::Debug for Requirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Requirement")
			.field("namespace", &self.0.namespace)
			.field("filter", &self.0.filter.as_ref().map(ToString::to_string))
			.field("generation", &self.0.owner.id())
			.finish()
	}
}

fn is_effective(directives: &Directives) -> bool {
	directives
		.get(directive::EFFECTIVE)
		.is_none_or(|value| value == directive::EFFECTIVE_RESOLVE)
}
