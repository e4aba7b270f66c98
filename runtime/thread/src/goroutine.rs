//! Goroutine-style workers: a dedicated thread paired with a channel.
//!
//! [`go`] starts a closure on its own thread and returns a [`GoRoutine`]
//! holding the thread and a [`Channel`]. Whether the closure receives the
//! channel is decided by its signature at compile time:
//!
//! - `|chan: Channel<T>| { ... }` is called with the routine's channel.
//! - `|| { ... }` is called with no arguments.
//!
//! Either way the closure is invoked exactly once.
//!
//! # Examples
//!
//! ```
//! use threadkit_sync::Channel;
//! use threadkit_thread::go;
//!
//! let mut routine = go(|chan: Channel<u32>| {
//!     for i in 1..=3 {
//!         chan.put(i * i);
//!     }
//! })
//! .unwrap();
//!
//! assert_eq!(routine.poll(), Some(1));
//! assert_eq!(routine.poll(), Some(4));
//! assert_eq!(routine.poll(), Some(9));
//! assert!(routine.stop(None));
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use threadkit_sync::Channel;

use crate::config::ThreadConfig;
use crate::error::{FailureStage, TargetFailure, ThreadError};
use crate::panic::catch_panic;
use crate::worker::Worker;

/// Marker for targets that take the routine's channel as their argument.
pub struct WithChannel<R>(PhantomData<fn() -> R>);

/// Marker for targets that take no arguments.
pub struct WithoutChannel<R>(PhantomData<fn() -> R>);

/// A closure that can be run by [`go`].
///
/// Implemented for `FnOnce(Channel<T>) -> R` and `FnOnce() -> R`. The
/// `Marker` parameter keeps the two impls apart and is inferred; callers never
/// name it. The closure's return value is discarded.
pub trait GoTarget<T, Marker>: Send + 'static {
    /// Runs the target, passing `channel` if the target accepts it.
    fn run(self, channel: Channel<T>);
}

impl<T, R, F> GoTarget<T, WithChannel<R>> for F
where
    F: FnOnce(Channel<T>) -> R + Send + 'static,
{
    fn run(self, channel: Channel<T>) {
        self(channel);
    }
}

impl<T, R, F> GoTarget<T, WithoutChannel<R>> for F
where
    F: FnOnce() -> R + Send + 'static,
{
    fn run(self, _channel: Channel<T>) {
        self();
    }
}

/// Builder for spawning a [`GoRoutine`] with custom settings.
///
/// # Examples
///
/// ```
/// use threadkit_sync::Channel;
/// use threadkit_thread::Spawn;
///
/// let shared = Channel::new();
/// let mut routine = Spawn::new()
///     .name("squares")
///     .channel(shared.clone())
///     .go(|chan: Channel<i32>| {
///         chan.put(16);
///     })
///     .unwrap();
///
/// assert_eq!(shared.poll(), Some(16));
/// assert!(routine.stop(None));
/// assert!(shared.is_closed());
/// ```
pub struct Spawn<T> {
    config: ThreadConfig,
    channel: Option<Channel<T>>,
}

impl<T: Send + 'static> Spawn<T> {
    /// Creates a builder with the default configuration and a fresh channel.
    pub fn new() -> Self {
        Self {
            config: ThreadConfig::default(),
            channel: None,
        }
    }

    /// Names the worker thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Sets the worker thread's stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Replaces the whole thread configuration.
    pub fn config(mut self, config: ThreadConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses an existing channel instead of creating one.
    pub fn channel(mut self, channel: Channel<T>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Starts `target` on a new worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::Spawn`] if the OS could not create the thread.
    pub fn go<M, F>(self, target: F) -> Result<GoRoutine<T>, ThreadError>
    where
        F: GoTarget<T, M>,
    {
        let channel = self.channel.unwrap_or_default();
        let injected = channel.clone();
        let worker = Worker::spawn(&self.config, move || {
            catch_panic(FailureStage::Target, move || target.run(injected))
        })?;

        Ok(GoRoutine {
            channel,
            worker,
            name: self.config.name,
        })
    }
}

impl<T: Send + 'static> Default for Spawn<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Starts `target` on a new worker thread with a fresh channel.
///
/// # Errors
///
/// Returns [`ThreadError::Spawn`] if the OS could not create the thread.
pub fn go<T, M, F>(target: F) -> Result<GoRoutine<T>, ThreadError>
where
    T: Send + 'static,
    F: GoTarget<T, M>,
{
    Spawn::new().go(target)
}

/// Starts `target` on a new worker thread that shares `channel`.
///
/// # Errors
///
/// Returns [`ThreadError::Spawn`] if the OS could not create the thread.
pub fn go_with<T, M, F>(channel: Channel<T>, target: F) -> Result<GoRoutine<T>, ThreadError>
where
    T: Send + 'static,
    F: GoTarget<T, M>,
{
    Spawn::new().channel(channel).go(target)
}

/// Handle to a running goroutine: its worker thread plus its channel.
///
/// Dropping the handle does not stop the thread; call
/// [`stop`](GoRoutine::stop) to close the channel and join it.
pub struct GoRoutine<T> {
    channel: Channel<T>,
    worker: Worker<()>,
    name: Option<String>,
}

impl<T> GoRoutine<T> {
    /// Removes the oldest value from the channel, blocking while it is empty
    /// and open. Returns `None` once the channel is closed and empty.
    pub fn poll(&self) -> Option<T> {
        self.channel.poll()
    }

    /// Removes the oldest value from the channel without blocking.
    pub fn try_poll(&self) -> Option<T> {
        self.channel.try_poll()
    }

    /// Like [`poll`](GoRoutine::poll), but gives up after `timeout`.
    pub fn poll_timeout(&self, timeout: Duration) -> Option<T> {
        self.channel.poll_timeout(timeout)
    }

    /// Returns the channel shared with the worker.
    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    /// Returns `true` once the target has returned or panicked.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Returns the captured panic, if the target panicked.
    pub fn error(&self) -> Option<TargetFailure> {
        self.worker.failure()
    }

    /// Closes the channel and joins the worker thread.
    ///
    /// With `None` this waits for the target to return. With a timeout it
    /// gives up after that long. The running target is never interrupted;
    /// it only sees its channel closed. A producer that has not put yet
    /// will find the channel closed, so its later safe puts are dropped.
    ///
    /// Returns `true` if the worker thread has stopped.
    pub fn stop(&mut self, timeout: Option<Duration>) -> bool {
        self.channel.close();
        let stopped = self.worker.wait(timeout);
        tracing::debug!(
            thread = self.name.as_deref().unwrap_or("<unnamed>"),
            stopped,
            "goroutine stop"
        );
        stopped
    }
}

impl<T> fmt::Debug for GoRoutine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoRoutine")
            .field("name", &self.name)
            .field("channel", &self.channel)
            .field("finished", &self.is_finished())
            .finish()
    }
}
