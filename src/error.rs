//! Error Taxonomy
//!
//! Recoverable per-stage conditions (non-zero exits, handler failures) are
//! folded into the final [`ExecResult`]; an `Error` is raised out of a wait
//! only for parse failures, spawn failures, timeouts, interrupts, or a
//! non-zero exit while errexit is set.

use thiserror::Error;

use crate::runner::types::ExecResult;

#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed command string.
    #[error("parse error: {0}")]
    ParseFailed(String),

    /// The OS could not start the program.
    #[error("failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    /// The configured timeout elapsed. Carries whatever was captured
    /// before the run was terminated.
    #[error("command timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64, result: ExecResult },

    /// Killed by a forwarded interrupt.
    #[error("command interrupted")]
    Interrupted { result: ExecResult },

    /// A virtual handler failed internally.
    #[error("virtual command '{name}' failed: {message}")]
    VirtualFailed { name: String, message: String },

    /// Non-zero exit, surfaced only while errexit is set.
    #[error("command exited with status {code}")]
    ExitNonZero { code: i32, result: ExecResult },

    /// A blocking wait was requested after async consumption began.
    #[error("runner already started")]
    AlreadyStarted,
}

impl Error {
    /// The result attached to errors that carry one.
    pub fn result(&self) -> Option<&ExecResult> {
        match self {
            Error::Timeout { result, .. }
            | Error::Interrupted { result }
            | Error::ExitNonZero { result, .. } => Some(result),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
