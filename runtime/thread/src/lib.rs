//! threadkit thread - Dedicated worker threads with result, callback and
//! channel hand-off.
//!
//! Each handle in this crate owns exactly one OS thread. There is no pool and
//! no scheduler: bounding concurrency is left to the caller.
//!
//! # Worker Kinds
//!
//! - **[`ResultThread`]**: `join` returns the target's value.
//! - **[`CallbackThread`]**: the worker passes the target's value to a
//!   callback, on the worker thread.
//! - **[`GoRoutine`]**: started with [`go`]; the worker and its owner talk
//!   through a shared [`Channel`](threadkit_sync::Channel).
//!
//! # Failures
//!
//! A panic in a target or callback never escapes the worker thread. It is
//! captured as a [`TargetFailure`], reported to the configured
//! [`ErrorSink`], and kept for the owner to observe at the next
//! synchronization point (`join`, `error`). Owners that never synchronize
//! only see failures through the sink.
//!
//! # Example
//!
//! ```
//! use threadkit_sync::Channel;
//! use threadkit_thread::{go, ResultThread};
//!
//! let mut sum = ResultThread::new(|| (1..=10).sum::<u32>());
//! sum.start().unwrap();
//! assert_eq!(sum.join().unwrap(), 55);
//!
//! let mut routine = go(|chan: Channel<&str>| {
//!     chan.put("ping");
//! })
//! .unwrap();
//! assert_eq!(routine.poll(), Some("ping"));
//! routine.stop(None);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod callback_thread;
mod config;
mod error;
mod goroutine;
mod panic;
mod result_thread;
mod worker;

pub use callback_thread::CallbackThread;
pub use config::{ErrorSink, ThreadConfig};
pub use error::{FailureStage, TargetFailure, ThreadError};
pub use goroutine::{go, go_with, GoRoutine, GoTarget, Spawn, WithChannel, WithoutChannel};
pub use result_thread::ResultThread;
