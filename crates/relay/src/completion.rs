//! One-shot completion signal for an invocation.
//!
//! Several sources can race to finish an invocation (the child exiting, an
//! uncaught error). All of them hold a clone of the same [`Completion`]; the
//! first to call [`Completion::succeed`] or [`Completion::fail`] wins and
//! every later call is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::error::InvocationError;

/// Outcome delivered to the host: `Ok(())` on success.
pub type InvocationResult = Result<(), InvocationError>;

type Callback = Box<dyn FnOnce(InvocationResult) + Send>;

struct Inner {
    fired: AtomicBool,
    callback: Mutex<Option<Callback>>,
}

#[derive(Clone)]
pub struct Completion {
    inner: Arc<Inner>,
}

impl Completion {
    /// Wrap a host callback. The callback runs at most once.
    pub fn new(callback: impl FnOnce(InvocationResult) + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                fired: AtomicBool::new(false),
                callback: Mutex::new(Some(Box::new(callback))),
            }),
        }
    }

    /// Completion backed by a oneshot channel, for hosts that want to await
    /// the outcome.
    pub fn channel() -> (Self, CompletionReceiver) {
        let (tx, rx) = oneshot::channel();
        let completion = Self::new(move |result| {
            // Receiver gone means the host stopped waiting; nothing to do.
            let _ = tx.send(result);
        });
        (completion, CompletionReceiver { rx })
    }

    /// Report success. Returns `false` if an outcome was already reported.
    pub fn succeed(&self) -> bool {
        self.fire(Ok(()))
    }

    /// Report failure. Returns `false` if an outcome was already reported.
    pub fn fail(&self, error: InvocationError) -> bool {
        self.fire(Err(error))
    }

    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    fn fire(&self, result: InvocationResult) -> bool {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            match result {
                Ok(()) => tracing::debug!("Ignoring success, invocation already completed"),
                Err(ref e) => {
                    tracing::debug!(error = %e, "Ignoring failure, invocation already completed")
                }
            }
            return false;
        }

        let callback = match self.inner.callback.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => {
                tracing::error!("Completion mutex poisoned - recovering callback");
                poisoned.into_inner().take()
            }
        };

        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("fired", &self.is_fired())
            .finish()
    }
}

/// Receiving half of [`Completion::channel`].
pub struct CompletionReceiver {
    rx: oneshot::Receiver<InvocationResult>,
}

impl CompletionReceiver {
    /// Wait for the outcome. If every [`Completion`] clone is dropped without
    /// firing, resolves to [`InvocationError::Abandoned`].
    pub async fn wait(self) -> InvocationResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(InvocationError::Abandoned),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting() -> (Completion, Arc<AtomicUsize>, Arc<Mutex<Option<InvocationResult>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(None));
        let completion = {
            let calls = Arc::clone(&calls);
            let last = Arc::clone(&last);
            Completion::new(move |result| {
                calls.fetch_add(1, Ordering::SeqCst);
                *last.lock().unwrap() = Some(result);
            })
        };
        (completion, calls, last)
    }

    #[test]
    fn succeed_fires_once() {
        let (completion, calls, last) = counting();

        assert!(!completion.is_fired());
        assert!(completion.succeed());
        assert!(completion.is_fired());
        assert!(!completion.succeed());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(*last.lock().unwrap(), Some(Ok(()))));
    }

    #[test]
    fn first_outcome_wins() {
        let (completion, calls, last) = counting();
        let other = completion.clone();

        assert!(completion.fail(InvocationError::NonZeroExit { code: 2 }));
        assert!(!other.succeed());
        assert!(!other.fail(InvocationError::Abandoned));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let last = last.lock().unwrap();
        match last.as_ref() {
            Some(Err(e)) => assert_eq!(e.exit_code(), Some(2)),
            _ => panic!("expected non-zero exit failure"),
        }
    }

    #[test]
    fn concurrent_fire_delivers_once() {
        let (completion, calls, _last) = counting();

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let completion = completion.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        completion.succeed()
                    } else {
                        completion.fail(InvocationError::Abandoned)
                    }
                })
            })
            .collect();

        let winners = threads
            .into_iter()
            .map(|t| t.join().unwrap())
            .filter(|fired| *fired)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn channel_delivers_outcome() {
        let (completion, rx) = Completion::channel();
        completion.fail(InvocationError::NonZeroExit { code: 137 });

        let err = rx.wait().await.unwrap_err();
        assert!(err.to_string().contains("137"));
    }

    #[tokio::test]
    async fn dropped_completion_is_abandoned() {
        let (completion, rx) = Completion::channel();
        drop(completion);

        let err = rx.wait().await.unwrap_err();
        assert!(matches!(err, InvocationError::Abandoned));
    }

    #[test]
    fn debug_shows_fired_state() {
        let (completion, _rx) = Completion::channel();
        completion.succeed();
        assert_eq!(format!("{:?}", completion), "Completion { fired: true }");
    }
}
