//! Process spawning for the bootstrap executable.
//!
//! The adapter never builds a `Command` itself; it hands a [`BootstrapCommand`]
//! to a [`ProcessSpawner`]. Production uses [`InheritStdioSpawner`], tests swap
//! in spawners that run shell snippets instead of a real binary.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

/// Everything needed to launch the bootstrap executable for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapCommand {
    pub program: PathBuf,
    /// Serialized event, passed as the only positional argument.
    pub payload: String,
    pub working_dir: Option<PathBuf>,
}

impl BootstrapCommand {
    pub fn new(program: impl Into<PathBuf>, payload: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            payload: payload.into(),
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn program_display(&self) -> String {
        self.program.display().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("failed to spawn process: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("spawn failed: {0}")]
    Other(String),
}

/// Extension point for different spawn strategies.
pub trait ProcessSpawner: Send + Sync {
    fn spawn(&self, command: &BootstrapCommand) -> Result<Child, SpawnError>;
}

/// Spawns the program directly with stdin, stdout and stderr inherited.
///
/// Child output is intentionally not captured: it goes straight to the
/// host's streams, where the host runtime collects it.
pub struct InheritStdioSpawner;

impl ProcessSpawner for InheritStdioSpawner {
    fn spawn(&self, command: &BootstrapCommand) -> Result<Child, SpawnError> {
        let mut cmd = Command::new(&command.program);
        cmd.arg(&command.payload)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(ref dir) = command.working_dir {
            cmd.current_dir(dir);
        }

        Ok(cmd.spawn()?)
    }
}
