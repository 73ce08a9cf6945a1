use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identifier of an installed bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BundleId(pub u64);

/// Identifier of one installed code generation of a bundle.
///
/// Generation IDs are never reused, including across bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenerationId(pub u64);

impl fmt::Display for BundleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "bundle#{}", self.0)
	}
}

impl fmt::Display for GenerationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "gen#{}", self.0)
	}
}

/// Monotonic ID allocator.
#[derive(Debug, Default)]
pub(crate) struct IdClock {
	next: AtomicU64,
}

impl IdClock {
	/// Returns the next ID, starting at 1.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}
}
