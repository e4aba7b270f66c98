//! Error types for worker threads.

use std::fmt;
use std::io;

/// The part of a worker's job that panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// The target closure panicked.
    Target,
    /// The completion callback panicked.
    Callback,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Target => f.write_str("target"),
            FailureStage::Callback => f.write_str("callback"),
        }
    }
}

/// A panic captured on a worker thread.
///
/// Workers never let a panic escape their thread. It is converted into a
/// `TargetFailure`, reported to the configured
/// [`ErrorSink`](crate::ErrorSink), and kept until the owner observes it
/// through `join` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} panicked on thread '{}': {message}", .thread.as_deref().unwrap_or("<unnamed>"))]
pub struct TargetFailure {
    /// Name of the worker thread, if it was given one.
    pub thread: Option<String>,
    /// The panic message, or `"unknown panic"` for non-string payloads.
    pub message: String,
    /// Whether the target or the callback panicked.
    pub stage: FailureStage,
}

/// Errors that can occur when starting or joining a worker thread.
#[derive(Debug, thiserror::Error)]
pub enum ThreadError {
    /// The operating system refused to create the thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),

    /// `start` was called on a thread that is already running or finished.
    #[error("thread has already been started")]
    AlreadyStarted,

    /// `join` was called before `start`.
    #[error("thread has not been started")]
    NotStarted,

    /// The thread's result was already taken by an earlier join.
    #[error("thread result has already been taken")]
    AlreadyJoined,

    /// The worker's target or callback panicked.
    #[error(transparent)]
    Panicked(#[from] TargetFailure),
}

impl ThreadError {
    /// Returns the captured panic, if this error is one.
    pub fn failure(&self) -> Option<&TargetFailure> {
        match self {
            ThreadError::Panicked(failure) => Some(failure),
            _ => None,
        }
    }
}
