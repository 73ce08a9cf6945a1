//! Remove-only views over candidate collections handed to hooks.

use std::slice;

use crate::error::CandidateError;


/// Mutable view over a caller-owned collection that permits only removal.
///
/// Removals write straight through to the backing vector, so whatever a hook
/// drops is gone for every later hook and for the caller.
#[derive(Debug)]
pub struct RemoveOnly<'a, T> {
	items: &'a mut Vec<T>,
}

impl<'a, T: PartialEq> RemoveOnly<'a, T> {
	pub fn new(items: &'a mut Vec<T>) -> Self {
		Self { items }
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn contains(&self, item: &T) -> bool {
		self.items.contains(item)
	}

	pub fn iter(&self) -> slice::Iter<'_, T> {
		self.items.iter()
	}

	/// Removes every occurrence of `item`. Returns whether anything was removed.
	pub fn remove(&mut self, item: &T) -> bool {
		let before = self.items.len();
		self.items.retain(|candidate| candidate != item);
		self.items.len() != before
	}

	/// Keeps only the candidates for which `keep` returns true.
	pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
		self.items.retain(keep);
	}

	/// Always fails; candidates can only be removed.
	pub fn insert(&mut self, _item: T) -> Result<(), CandidateError> {
		Err(CandidateError::AddRejected)
	}

	/// Always fails, even for an empty iterator.
	pub fn extend(&mut self, _items: impl IntoIterator<Item = T>) -> Result<(), CandidateError> {
		Err(CandidateError::AddRejected)
	}
}

impl<'b, T: PartialEq> IntoIterator for &'b RemoveOnly<'_, T> {
	type Item = &'b T;
	type IntoIter = slice::Iter<'b, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}
