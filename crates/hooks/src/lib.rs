//! Hook contracts and the coordinators that apply them.
//!
//! Hooks come from a [`HookSource`] in ranked order and only ever see
//! [`RemoveOnly`] views, so the combined effect of any number of hooks is the
//! intersection of what each one kept.

mod config;
mod error;
/// Hook traits implemented by hook services.
pub mod hook;
mod invoke;
/// Bundle events and listener registries.
pub mod listeners;
mod report;
/// Resolver hook begin/end protocol.
pub mod resolve;
/// Hook services and the in-memory directory.
pub mod source;
/// Remove-only candidate views.
pub mod view;
/// Find and event hook dispatch.
pub mod visibility;

pub use config::{BeginFailurePolicy, HooksConfig};
pub use error::{CandidateError, HookError, ProtocolStateError, ResolveHookError};
pub use hook::{EventHook, FindHook, ResolverHook, ResolverHookFactory};
pub use listeners::{
	BundleEvent, BundleEventKind, BundleListener, ContextId, ListenerEntry, ListenerId, ListenerRegistry,
};
pub use report::{ErrorReporter, HookFailure, TracingReporter};
pub use resolve::{ResolveHookCoordinator, ResolveHooks};
pub use source::{
	Hook, HookDirectory, HookKind, HookSource, RegistrationEvent, RegistrationListener, ServiceId, ServiceRef,
	SubscriptionId,
};
pub use view::RemoveOnly;
pub use visibility::VisibilityHookCoordinator;
