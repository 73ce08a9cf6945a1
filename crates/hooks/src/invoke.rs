//! Panic isolation around hook callbacks.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::error::HookError;

/// Runs one hook callback, converting a panic into [`HookError::Panicked`].
pub(crate) fn guarded<R>(call: impl FnOnce() -> Result<R, HookError>) -> Result<R, HookError> {
	match catch_unwind(AssertUnwindSafe(call)) {
		Ok(result) => result,
		Err(payload) => Err(HookError::Panicked(panic_message(payload.as_ref()))),
	}
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"non-string panic payload".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn panics_become_errors() {
		let result: Result<(), _> = guarded(|| panic!("boom"));
		assert_eq!(result, Err(HookError::Panicked("boom".into())));

		let result: Result<(), _> = guarded(|| panic!("code {}", 7));
		assert_eq!(result, Err(HookError::Panicked("code 7".into())));

		assert_eq!(guarded(|| Ok(3)), Ok(3));
		assert_eq!(
			guarded::<()>(|| Err(HookError::failed("nope"))),
			Err(HookError::Failed("nope".into()))
		);
	}
}
