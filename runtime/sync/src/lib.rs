//! threadkit sync - Channels and wait groups for dedicated worker threads.
//!
//! This crate provides the shared-state primitives that worker threads use to
//! talk to the thread that spawned them.
//!
//! # Quick Start
//!
//! ```
//! use threadkit_sync::{Channel, WaitGroup};
//! use std::thread;
//!
//! let chan = Channel::new();
//! let wg = WaitGroup::with_count(1);
//!
//! let producer = chan.clone();
//! let done = wg.clone();
//! thread::spawn(move || {
//!     producer.put(42);
//!     done.done().unwrap();
//! });
//!
//! wg.wait();
//! assert_eq!(chan.poll(), Some(42));
//! ```
//!
//! # Primitives
//!
//! - **[`Channel`]**: Unbounded FIFO buffer with an explicit, idempotent
//!   close. Blocking polls park on a condition variable and are released by
//!   either a put or a close.
//!
//! - **[`WaitGroup`]**: Counter of outstanding work. `wait` blocks until the
//!   counter drains to zero. Decrementing past zero is reported as an error.

#![warn(missing_docs)]

pub mod channel;
pub mod error;
pub mod wait_group;

pub use channel::{Channel, Drain};
pub use error::{ChannelClosed, WaitGroupError};
pub use wait_group::WaitGroup;
