use modwire_hooks::ResolveHookError;
use modwire_wiring::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameworkError {
	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	Resolve(#[from] ResolveHookError),

	#[error("failed to spawn event dispatcher: {0}")]
	Dispatcher(#[source] std::io::Error),
}
