//! Reporting of isolated hook failures.

use crate::error::HookError;
use crate::source::{HookKind, ServiceId};

/// One hook callback that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
	pub kind: HookKind,
	pub service: ServiceId,
	pub error: HookError,
}

/// Sink for non-fatal hook failures.
pub trait ErrorReporter: Send + Sync {
	fn report(&self, failure: &HookFailure);
}

/// Logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
	fn report(&self, failure: &HookFailure) {
		tracing::error!(
			kind = ?failure.kind,
			service = %failure.service,
			error = %failure.error,
			"hook failed"
		);
	}
}

impl<F> ErrorReporter for F
where
	F: Fn(&HookFailure) + Send + Sync,
{
	fn report(&self, failure: &HookFailure) {
		self(failure)
	}
}
