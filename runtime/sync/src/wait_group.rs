//! Wait group for joining an arbitrary number of concurrent units of work.
//!
//! # Examples
//!
//! ```
//! use threadkit_sync::WaitGroup;
//! use std::thread;
//!
//! let wg = WaitGroup::new();
//!
//! for _ in 0..4 {
//!     wg.add(1).unwrap();
//!     let wg = wg.clone();
//!     thread::spawn(move || {
//!         // ... do work ...
//!         wg.done().unwrap();
//!     });
//! }
//!
//! wg.wait();
//! assert_eq!(wg.count(), 0);
//! ```

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::WaitGroupError;

/// A counter of outstanding work that threads can block on until it drains.
///
/// Cloning a `WaitGroup` produces another handle to the same counter, so it
/// can be moved into worker threads.
pub struct WaitGroup {
    inner: Arc<WaitGroupInner>,
}

struct WaitGroupInner {
    count: Mutex<usize>,
    /// Signalled whenever the count drops to zero.
    drained: Condvar,
}

impl WaitGroupInner {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WaitGroup {
    /// Creates a wait group with a count of zero.
    pub fn new() -> Self {
        Self::with_count(0)
    }

    /// Creates a wait group with `initial` units of work already registered.
    pub fn with_count(initial: usize) -> Self {
        Self {
            inner: Arc::new(WaitGroupInner {
                count: Mutex::new(initial),
                drained: Condvar::new(),
            }),
        }
    }

    /// Registers `delta` more units of outstanding work.
    ///
    /// # Errors
    ///
    /// Returns [`WaitGroupError::Overflow`] if the counter would exceed
    /// `usize::MAX`. The counter is left unchanged in that case.
    pub fn add(&self, delta: usize) -> Result<(), WaitGroupError> {
        let mut count = self.inner.lock();
        let Some(total) = count.checked_add(delta) else {
            let err = WaitGroupError::Overflow {
                count: *count,
                delta,
            };
            drop(count);
            tracing::warn!(error = %err, "wait group add() overflowed");
            return Err(err);
        };
        *count = total;
        Ok(())
    }

    /// Marks one unit of work as finished.
    ///
    /// # Errors
    ///
    /// Returns [`WaitGroupError::Underflow`] if the counter is already zero.
    pub fn done(&self) -> Result<(), WaitGroupError> {
        self.done_n(1)
    }

    /// Marks `delta` units of work as finished.
    ///
    /// May be called from any thread. Waiters are released when the counter
    /// reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`WaitGroupError::Underflow`] if `delta` exceeds the current
    /// count. The counter is left unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use threadkit_sync::{WaitGroup, WaitGroupError};
    ///
    /// let wg = WaitGroup::with_count(1);
    /// assert_eq!(
    ///     wg.done_n(2),
    ///     Err(WaitGroupError::Underflow { count: 1, delta: 2 })
    /// );
    /// assert_eq!(wg.count(), 1);
    /// ```
    pub fn done_n(&self, delta: usize) -> Result<(), WaitGroupError> {
        let mut count = self.inner.lock();
        let Some(remaining) = count.checked_sub(delta) else {
            let err = WaitGroupError::Underflow {
                count: *count,
                delta,
            };
            drop(count);
            tracing::warn!(error = %err, "wait group done() without matching add()");
            return Err(err);
        };
        *count = remaining;
        drop(count);

        if remaining == 0 {
            self.inner.drained.notify_all();
        }
        Ok(())
    }

    /// Blocks until the counter reaches zero.
    ///
    /// Returns immediately if no work is outstanding.
    pub fn wait(&self) {
        let count = self.inner.lock();
        let _count = self
            .inner
            .drained
            .wait_while(count, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until the counter reaches zero or `timeout` elapses.
    ///
    /// Returns `true` if the counter reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let count = self.inner.lock();
        let (count, _) = self
            .inner
            .drained
            .wait_timeout_while(count, timeout, |count| *count > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *count == 0
    }

    /// Returns the number of outstanding units of work.
    pub fn count(&self) -> usize {
        *self.inner.lock()
    }
}

impl Clone for WaitGroup {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitGroup")
            .field("count", &self.count())
            .finish()
    }
}
