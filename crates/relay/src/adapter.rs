//! Invocation adapter - one event in, one bootstrap process, one outcome out.
//!
//! Flow per invocation:
//! 1. Serialize the event to JSON
//! 2. Register an uncaught-error hook
//! 3. Spawn the bootstrap executable with the JSON as its only argument
//! 4. Race child exit against the hook; the first terminal event completes
//!    the invocation
//!
//! No timeout and no retries: the host runtime owns both.

use std::sync::Arc;

use serde::Serialize;
use tokio::process::Child;
use tracing::Instrument;
use uuid::Uuid;

use crate::completion::{Completion, InvocationResult};
use crate::config::RelayConfig;
use crate::error::InvocationError;
use crate::exit::ExitOutcome;
use crate::hooks::{HookRegistry, UncaughtError};
use crate::spawner::{InheritStdioSpawner, ProcessSpawner};

enum Terminal {
    Uncaught(UncaughtError),
    Exited(std::io::Result<std::process::ExitStatus>),
}

pub struct InvocationAdapter {
    config: RelayConfig,
    spawner: Arc<dyn ProcessSpawner>,
    hooks: Arc<HookRegistry>,
}

impl InvocationAdapter {
    /// Adapter with the inherit-stdio spawner, reporting into the global
    /// hook registry.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            spawner: Arc::new(InheritStdioSpawner),
            hooks: HookRegistry::global(),
        }
    }

    pub fn with_spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Run one invocation and await its outcome.
    pub async fn invoke<E>(&self, event: &E) -> InvocationResult
    where
        E: Serialize + ?Sized,
    {
        let (completion, rx) = Completion::channel();
        self.handle(event, completion).await;
        rx.wait().await
    }

    /// Run one invocation, reporting through `completion` exactly once.
    ///
    /// Returns once the invocation has a terminal outcome. If an uncaught
    /// error wins the race, the child is left running and reaped in the
    /// background.
    pub async fn handle<E>(&self, event: &E, completion: Completion)
    where
        E: Serialize + ?Sized,
    {
        let invocation_id = Uuid::new_v4();
        let span = tracing::info_span!("invocation", %invocation_id);

        let payload = match serde_json::to_string(event) {
            Ok(p) => p,
            Err(e) => {
                let _enter = span.enter();
                tracing::error!(error = %e, "Failed to serialize event");
                completion.fail(InvocationError::Serialize(e));
                return;
            }
        };

        self.run(payload, completion).instrument(span).await;
    }

    async fn run(&self, payload: String, completion: Completion) {
        let command = self.config.command(payload);
        let program = command.program_display();

        let (hook_guard, mut hook_rx) = self.hooks.register();

        tracing::debug!(%program, payload_len = command.payload.len(), "Spawning bootstrap");
        let mut child = match self.spawner.spawn(&command) {
            Ok(child) => child,
            Err(e) => {
                drop(hook_guard);
                tracing::error!(%program, error = %e, "Failed to spawn bootstrap");
                completion.fail(InvocationError::Spawn { program, source: e });
                return;
            }
        };
        tracing::info!(%program, pid = ?child.id(), "Bootstrap started");

        let terminal = tokio::select! {
            Ok(error) = &mut hook_rx => Terminal::Uncaught(error),
            status = child.wait() => Terminal::Exited(status),
        };
        drop(hook_guard);

        match terminal {
            Terminal::Uncaught(error) => {
                tracing::warn!(error = %error, pid = ?child.id(), "Uncaught error, not waiting for bootstrap");
                completion.fail(InvocationError::Uncaught(error));
                reap_in_background(child);
            }
            Terminal::Exited(Ok(status)) => {
                let outcome = ExitOutcome::from_status(status);
                match outcome.into_result() {
                    Ok(()) => {
                        tracing::info!("Bootstrap exited successfully");
                        completion.succeed();
                    }
                    Err(e) => {
                        tracing::warn!(?outcome, error = %e, "Bootstrap failed");
                        completion.fail(e);
                    }
                }
            }
            Terminal::Exited(Err(e)) => {
                tracing::error!(error = %e, "Failed to wait for bootstrap");
                completion.fail(InvocationError::Wait(e));
            }
        }
    }
}

/// Wait on a child whose invocation already completed, so it does not
/// linger as a zombie. Its exit never reaches the completion.
fn reap_in_background(mut child: Child) {
    let span = tracing::Span::current();
    tokio::spawn(
        async move {
            match child.wait().await {
                Ok(status) => tracing::debug!(
                    outcome = ?ExitOutcome::from_status(status),
                    "Bootstrap exited after invocation completed"
                ),
                Err(e) => tracing::warn!(error = %e, "Failed to reap bootstrap"),
            }
        }
        .instrument(span),
    );
}
