use thiserror::Error;

use crate::hooks::UncaughtError;
use crate::spawner::SpawnError;

/// Terminal failure of a single invocation.
///
/// Every variant is delivered through the invocation's completion signal;
/// none of them tear down the host process.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: SpawnError,
    },

    #[error("failed to wait for bootstrap process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Process exited with non-zero status code: {code}")]
    NonZeroExit { code: i32 },

    #[error("Process terminated by signal {name} ({signal})")]
    Signaled { signal: i32, name: String },

    #[error("Process exited without a status code")]
    UnknownExit,

    #[error("uncaught error: {0}")]
    Uncaught(UncaughtError),

    #[error("invocation completed without reporting an outcome")]
    Abandoned,
}

impl InvocationError {
    /// Exit code of the child, if the failure came from a non-zero exit.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code } => Some(*code),
            _ => None,
        }
    }
}
