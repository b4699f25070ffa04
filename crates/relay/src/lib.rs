//! relay: runs an external `bootstrap` executable once per invocation.
//!
//! The event is serialized to JSON and passed as the child's only argument.
//! The child's exit status, or the first uncaught error in the process,
//! becomes the invocation's single outcome.

mod adapter;
mod completion;
mod config;
mod error;
mod exit;
mod hooks;
mod logging;
mod spawner;

pub use adapter::InvocationAdapter;
pub use completion::{Completion, CompletionReceiver, InvocationResult};
pub use config::{ConfigError, DEFAULT_BOOTSTRAP, ENV_BOOTSTRAP, ENV_WORKDIR, RelayConfig};
pub use error::InvocationError;
pub use exit::ExitOutcome;
pub use hooks::{HookGuard, HookRegistry, UncaughtError, install_panic_hook};
pub use logging::init_tracing;
pub use spawner::{BootstrapCommand, InheritStdioSpawner, ProcessSpawner, SpawnError};
