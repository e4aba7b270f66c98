//! Worker thread configuration.
//!
//! This module provides the options applied when a worker thread is spawned:
//! its OS name, its stack size, and the hook that receives captured panics.

use std::fmt;
use std::sync::Arc;
use std::thread;

use crate::error::TargetFailure;

/// Hook invoked on the worker thread whenever a target or callback panics.
///
/// The failure is also stored for the owner. For a worker whose owner never
/// joins or polls, the sink is the only place the failure shows up. The
/// default sink logs with `tracing::error!`.
///
/// # Example
///
/// ```
/// use threadkit_thread::{ErrorSink, TargetFailure};
///
/// let sink = ErrorSink::new(|failure: &TargetFailure| {
///     eprintln!("worker failed: {}", failure);
/// });
/// ```
#[derive(Clone)]
pub struct ErrorSink(Arc<dyn Fn(&TargetFailure) + Send + Sync>);

impl ErrorSink {
    /// Creates a sink from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&TargetFailure) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Creates a sink that discards every failure.
    pub fn ignore() -> Self {
        Self::new(|_| {})
    }

    /// Hands a failure to the sink.
    pub fn report(&self, failure: &TargetFailure) {
        (self.0)(failure)
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        Self::new(|failure| {
            tracing::error!(
                thread = failure.thread.as_deref().unwrap_or("<unnamed>"),
                stage = %failure.stage,
                message = %failure.message,
                "worker thread panicked"
            );
        })
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorSink(..)")
    }
}

/// Configuration applied to every worker thread a handle spawns.
#[derive(Debug, Clone, Default)]
pub struct ThreadConfig {
    /// OS thread name. Unnamed if `None`.
    pub name: Option<String>,
    /// Stack size in bytes. The platform default if `None`.
    pub stack_size: Option<usize>,
    /// Receives panics captured on the worker thread.
    pub error_sink: ErrorSink,
}

impl ThreadConfig {
    /// Creates a config that names the worker thread.
    ///
    /// # Example
    ///
    /// ```
    /// use threadkit_thread::ThreadConfig;
    ///
    /// let config = ThreadConfig::named("ingest");
    /// assert_eq!(config.name.as_deref(), Some("ingest"));
    /// ```
    pub fn named(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }

    /// Sets the OS thread name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stack size in bytes.
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Replaces the error sink.
    pub fn with_error_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&TargetFailure) + Send + Sync + 'static,
    {
        self.error_sink = ErrorSink::new(sink);
        self
    }

    /// Returns the name used in log fields.
    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Builds the `std` thread builder for this config.
    pub(crate) fn builder(&self) -> thread::Builder {
        let mut builder = thread::Builder::new();
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        builder
    }
}
