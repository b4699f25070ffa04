//! Uncaught-error hooks.
//!
//! An invocation registers a hook for its lifetime. Anything in the process
//! that hits an otherwise-unhandled error (a panic on another task, or code
//! calling [`HookRegistry::raise`]) fails every in-flight invocation at once.
//!
//! Hooks are one-shot: a hook is removed from the registry the moment it
//! fires, and its [`HookGuard`] removes it when the invocation ends, so a
//! long-lived host never accumulates stale hooks.

use std::fmt;
use std::sync::{Arc, Once, OnceLock};

use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

/// An asynchronous error nobody else handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncaughtError {
    message: String,
}

impl UncaughtError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for UncaughtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for UncaughtError {}

/// Registry of per-invocation uncaught-error hooks.
pub struct HookRegistry {
    hooks: DashMap<Uuid, oneshot::Sender<UncaughtError>>,
}

static GLOBAL: OnceLock<Arc<HookRegistry>> = OnceLock::new();

impl HookRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The process-wide registry the panic hook reports into.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(HookRegistry::new))
    }

    /// Register a hook. The hook stays live until the guard is dropped or
    /// the hook fires, whichever comes first.
    pub fn register(self: &Arc<Self>) -> (HookGuard, oneshot::Receiver<UncaughtError>) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.hooks.insert(id, tx);
        tracing::trace!(hook_id = %id, "Registered uncaught-error hook");

        let guard = HookGuard {
            id,
            registry: Arc::clone(self),
        };
        (guard, rx)
    }

    /// Deliver `error` to every registered hook, consuming them.
    ///
    /// Returns the number of invocations that were notified.
    pub fn raise(&self, error: impl Into<UncaughtError>) -> usize {
        let error = error.into();
        let ids: Vec<Uuid> = self.hooks.iter().map(|entry| *entry.key()).collect();

        let mut notified = 0;
        for id in ids {
            if let Some((_, tx)) = self.hooks.remove(&id)
                && tx.send(error.clone()).is_ok()
            {
                notified += 1;
            }
        }

        if notified == 0 {
            tracing::debug!(error = %error, "Uncaught error with no invocation in flight");
        } else {
            tracing::warn!(error = %error, notified, "Uncaught error delivered to invocations");
        }
        notified
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    fn deregister(&self, id: &Uuid) {
        if self.hooks.remove(id).is_some() {
            tracing::trace!(hook_id = %id, "Deregistered uncaught-error hook");
        }
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self {
            hooks: DashMap::new(),
        }
    }
}

impl From<String> for UncaughtError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for UncaughtError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Deregisters its hook on drop.
pub struct HookGuard {
    id: Uuid,
    registry: Arc<HookRegistry>,
}

impl Drop for HookGuard {
    fn drop(&mut self) {
        self.registry.deregister(&self.id);
    }
}

/// Forward panics to the global registry.
///
/// The hook runs for every panic in the process, including panics that are
/// later caught by `catch_unwind` or observed through an awaited tokio
/// `JoinHandle`. Any panic while invocations are in flight fails them, even
/// if some other code recovers from it afterwards.
///
/// Installed at most once per process; the previous hook still runs, so the
/// usual panic message keeps reaching stderr.
pub fn install_panic_hook() {
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let payload = info.payload();
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "panic with non-string payload".to_string()
            };
            let message = match info.location() {
                Some(loc) => format!("panicked at {}:{}: {}", loc.file(), loc.line(), message),
                None => format!("panicked: {}", message),
            };

            HookRegistry::global().raise(message);
            previous(info);
        }));
    });
}
