//! Error types for channel and wait group operations.
//!
//! This module defines the errors returned when a strict channel put hits a
//! closed channel or a wait group is decremented past zero.

use std::fmt;

/// Error returned by [`Channel::put_strict`](crate::Channel::put_strict) when
/// the channel is closed.
///
/// The rejected value is returned so it can be recovered.
#[derive(Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("sending on a closed channel")]
pub struct ChannelClosed<T>(pub T);

impl<T> ChannelClosed<T> {
    /// Returns the value that was being sent.
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual impl so `T` does not need to be `Debug` for `?` and `unwrap_err`.
impl<T> fmt::Debug for ChannelClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChannelClosed(..)")
    }
}

/// Errors returned by [`WaitGroup`](crate::WaitGroup) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitGroupError {
    /// `done` was called more times than `add` registered work.
    ///
    /// The counter is left unchanged.
    #[error("wait group counter underflow: count is {count}, tried to subtract {delta}")]
    Underflow {
        /// The counter value at the time of the call.
        count: usize,
        /// The amount the caller tried to subtract.
        delta: usize,
    },

    /// `add` would push the counter past `usize::MAX`.
    ///
    /// The counter is left unchanged.
    #[error("wait group counter overflow: count is {count}, tried to add {delta}")]
    Overflow {
        /// The counter value at the time of the call.
        count: usize,
        /// The amount the caller tried to add.
        delta: usize,
    },
}
