//! threadkit - Dedicated-thread concurrency toolkit
//!
//! This crate combines the worker threads of `threadkit-thread` with the
//! channels and wait groups of `threadkit-sync`. It re-exports both and
//! provides the top-level entry points.
//!
//! # Architecture
//!
//! - **Workers**: one OS thread per [`ResultThread`], [`CallbackThread`] or
//!   [`GoRoutine`]. No pooling, no work stealing.
//! - **Channels**: unbounded, closable FIFO buffers guarded by a mutex and a
//!   condition variable.
//! - **Wait groups**: counters of outstanding work with a blocking `wait`.
//!
//! # Usage
//!
//! ```
//! use threadkit::{go, new_wait_group, spawn_result, Channel};
//!
//! let wg = new_wait_group(0);
//! let answer = spawn_result(|| 6 * 7).unwrap();
//!
//! wg.add(1).unwrap();
//! let done = wg.clone();
//! let mut routine = go(move |chan: Channel<&str>| {
//!     chan.put("hello");
//!     done.done().unwrap();
//! })
//! .unwrap();
//!
//! wg.wait();
//! assert_eq!(routine.poll(), Some("hello"));
//! assert_eq!(answer.join().unwrap(), 42);
//! assert!(routine.stop(None));
//! ```
//!
//! # Failures
//!
//! Panics inside workers are captured and surfaced at the next
//! synchronization point. Callers that never join, poll or check `error`
//! only see them through the [`ErrorSink`] configured in [`ThreadConfig`],
//! which logs with `tracing` by default.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub use threadkit_sync as sync;
pub use threadkit_thread as thread;

pub use threadkit_sync::{Channel, ChannelClosed, Drain, WaitGroup, WaitGroupError};
pub use threadkit_thread::{
    go, go_with, CallbackThread, ErrorSink, FailureStage, GoRoutine, GoTarget, ResultThread,
    Spawn, TargetFailure, ThreadConfig, ThreadError, WithChannel, WithoutChannel,
};

/// Creates and starts a [`ResultThread`] running `target`.
///
/// # Errors
///
/// Returns [`ThreadError::Spawn`] if the OS could not create the thread.
///
/// # Example
///
/// ```
/// use threadkit::spawn_result;
///
/// let thread = spawn_result(|| "done").unwrap();
/// assert_eq!(thread.join().unwrap(), "done");
/// ```
pub fn spawn_result<T, F>(target: F) -> Result<ResultThread<T>, ThreadError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let mut thread = ResultThread::new(target);
    thread.start()?;
    Ok(thread)
}

/// Creates and starts a [`CallbackThread`] running `target` then `callback`.
///
/// # Errors
///
/// Returns [`ThreadError::Spawn`] if the OS could not create the thread.
///
/// # Example
///
/// ```
/// use threadkit::spawn_callback;
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// let mut thread = spawn_callback(|| 2 + 2, move |v: i32| tx.send(v).unwrap()).unwrap();
/// thread.join().unwrap();
/// assert_eq!(rx.recv().unwrap(), 4);
/// ```
pub fn spawn_callback<T, F, C>(target: F, callback: C) -> Result<CallbackThread, ThreadError>
where
    T: 'static,
    F: FnOnce() -> T + Send + 'static,
    C: FnOnce(T) + Send + 'static,
{
    let mut thread = CallbackThread::new(target, callback);
    thread.start()?;
    Ok(thread)
}

/// Creates an open, empty [`Channel`].
pub fn new_channel<T>() -> Channel<T> {
    Channel::new()
}

/// Creates a [`WaitGroup`] with `initial` units of outstanding work.
pub fn new_wait_group(initial: usize) -> WaitGroup {
    WaitGroup::with_count(initial)
}
