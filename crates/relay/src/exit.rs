//! Exit status classification.

use std::process::ExitStatus;

use crate::error::InvocationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit code.
    Code(i32),
    /// Terminated by a signal (Unix only).
    Signal(i32),
    Unknown,
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return Self::Success;
        }
        if let Some(code) = status.code() {
            return Self::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }

        Self::Unknown
    }

    /// Map to the invocation outcome reported through the completion.
    pub fn into_result(self) -> Result<(), InvocationError> {
        match self {
            Self::Success => Ok(()),
            Self::Code(code) => Err(InvocationError::NonZeroExit { code }),
            Self::Signal(signal) => Err(InvocationError::Signaled {
                signal,
                name: signal_name(signal),
            }),
            Self::Unknown => Err(InvocationError::UnknownExit),
        }
    }
}

#[cfg(unix)]
fn signal_name(signal: i32) -> String {
    match nix::sys::signal::Signal::try_from(signal) {
        Ok(sig) => sig.as_str().to_string(),
        Err(_) => format!("signal {}", signal),
    }
}

#[cfg(not(unix))]
fn signal_name(signal: i32) -> String {
    format!("signal {}", signal)
}
