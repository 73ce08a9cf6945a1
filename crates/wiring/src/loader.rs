//! Code-loading context behind a generation.
//!
//! Actual class/resource loading lives outside this crate; a generation only
//! holds an `Arc<dyn CodeLoader>` and its [`Wiring`](crate::Wiring) forwards
//! queries to it.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw bytes of one resource entry.
pub type ResourceBytes = Arc<[u8]>;

/// Resource and class lookup for one generation.
pub trait CodeLoader: Send + Sync {
	/// Returns the contents of the entry at `path`.
	fn resource(&self, path: &str) -> Option<ResourceBytes>;

	/// Lists entry paths below directory `dir` (`""` is the root).
	///
	/// With `recurse` unset only direct children are returned.
	fn list(&self, dir: &str, recurse: bool) -> Vec<String>;

	/// Loads the class named `name` (dot separated).
	fn class(&self, name: &str) -> Option<ResourceBytes> {
		self.resource(&format!("{}.class", name.replace('.', "/")))
	}
}

/// Loader for generations that carry no code, such as pure fragments.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyLoader;

impl CodeLoader for EmptyLoader {
	fn resource(&self, _path: &str) -> Option<ResourceBytes> {
		None
	}

	fn list(&self, _dir: &str, _recurse: bool) -> Vec<String> {
		Vec::new()
	}
}

/// In-memory loader keyed by `/`-separated entry path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
	entries: BTreeMap<String, ResourceBytes>,
}

impl MemoryLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_entry(mut self, path: impl Into<String>, bytes: impl AsRef<[u8]>) -> Self {
		self.insert(path, bytes);
		self
	}

	pub fn insert(&mut self, path: impl Into<String>, bytes: impl AsRef<[u8]>) {
		let path = path.into().trim_start_matches('/').to_string();
		self.entries.insert(path, Arc::from(bytes.as_ref()));
	}
}

impl CodeLoader for MemoryLoader {
	fn resource(&self, path: &str) -> Option<ResourceBytes> {
		self.entries.get(path.trim_start_matches('/')).cloned()
	}

	fn list(&self, dir: &str, recurse: bool) -> Vec<String> {
		let dir = dir.trim_matches('/');
		let prefix = if dir.is_empty() {
			String::new()
		} else {
			format!("{dir}/")
		};
		self.entries
			.keys()
			.filter_map(|path| {
				let rest = path.strip_prefix(prefix.as_str())?;
				(recurse || !rest.contains('/')).then(|| path.clone())
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn loader() -> MemoryLoader {
		MemoryLoader::new()
			.with_entry("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0")
			.with_entry("org/acme/Api.class", b"api")
			.with_entry("org/acme/impl/Impl.class", b"impl")
	}

	#[test]
	fn list_honours_recurse() {
		let loader = loader();
		assert_eq!(loader.list("org/acme", false), vec!["org/acme/Api.class"]);
		assert_eq!(
			loader.list("/org/acme/", true),
			vec!["org/acme/Api.class", "org/acme/impl/Impl.class"]
		);
		assert_eq!(loader.list("", false), Vec::<String>::new());
	}

	#[test]
	fn class_lookup_maps_dots_to_paths() {
		let loader = loader();
		assert_eq!(loader.class("org.acme.impl.Impl").as_deref(), Some(&b"impl"[..]));
		assert!(loader.class("org.acme.Missing").is_none());
	}
}
