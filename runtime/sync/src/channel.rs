//! Unbounded, closable channel shared between worker threads.
//!
//! A [`Channel`] is a mutex-guarded FIFO buffer with an explicit close
//! transition. Every handle cloned from a channel refers to the same buffer,
//! so a worker thread and any number of consumers can hold their own copy.
//!
//! # Examples
//!
//! ```
//! use threadkit_sync::Channel;
//!
//! let chan = Channel::new();
//! chan.put(1);
//! chan.put(2);
//!
//! assert_eq!(chan.size(), 2);
//! assert_eq!(chan.poll(), Some(1));
//! assert_eq!(chan.try_poll(), Some(2));
//! assert_eq!(chan.try_poll(), None);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::ChannelClosed;

/// A thread-safe FIFO channel with an explicit close transition.
///
/// The channel starts open. [`close`](Channel::close) moves it to the closed
/// state, which is terminal. A closed channel rejects new values but can still
/// be drained of whatever it holds.
///
/// Cloning a `Channel` produces another handle to the same buffer.
///
/// # Examples
///
/// ```
/// use threadkit_sync::Channel;
/// use std::thread;
///
/// let chan = Channel::new();
/// let producer = chan.clone();
///
/// let handle = thread::spawn(move || {
///     for i in 0..3 {
///         producer.put(i);
///     }
///     producer.close();
/// });
///
/// let mut received = Vec::new();
/// while let Some(value) = chan.poll() {
///     received.push(value);
/// }
///
/// handle.join().unwrap();
/// assert_eq!(received, vec![0, 1, 2]);
/// ```
pub struct Channel<T> {
    inner: Arc<ChannelInner<T>>,
}

/// State shared by every handle of a channel.
struct ChannelInner<T> {
    /// Buffer and closed flag, guarded together.
    state: Mutex<ChannelState<T>>,
    /// Signalled by `put` (one waiter) and `close` (all waiters).
    available: Condvar,
}

struct ChannelState<T> {
    buffer: VecDeque<T>,
    closed: bool,
}

impl<T> ChannelInner<T> {
    fn lock(&self) -> MutexGuard<'_, ChannelState<T>> {
        // No user code runs under this lock, so a poisoned guard still holds
        // consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Channel<T> {
    /// Creates a new, open, empty channel.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                state: Mutex::new(ChannelState {
                    buffer: VecDeque::new(),
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    /// Appends a value to the channel.
    ///
    /// If the channel is closed the value is dropped and nothing else happens.
    /// Returns `true` if the value was enqueued.
    ///
    /// # Examples
    ///
    /// ```
    /// use threadkit_sync::Channel;
    ///
    /// let chan = Channel::new();
    /// assert!(chan.put(1));
    ///
    /// chan.close();
    /// assert!(!chan.put(2));
    /// assert_eq!(chan.size(), 1);
    /// ```
    pub fn put(&self, value: T) -> bool {
        self.put_strict(value).is_ok()
    }

    /// Appends a value to the channel, failing if it is closed.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClosed`] carrying the value if the channel has been
    /// closed.
    ///
    /// # Examples
    ///
    /// ```
    /// use threadkit_sync::Channel;
    ///
    /// let chan = Channel::new();
    /// chan.close();
    ///
    /// let err = chan.put_strict(7).unwrap_err();
    /// assert_eq!(err.into_inner(), 7);
    /// ```
    pub fn put_strict(&self, value: T) -> Result<(), ChannelClosed<T>> {
        let mut state = self.inner.lock();
        if state.closed {
            return Err(ChannelClosed(value));
        }
        state.buffer.push_back(value);
        drop(state);

        self.inner.available.notify_one();
        Ok(())
    }

    /// Returns the number of values waiting in the buffer.
    pub fn size(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    /// Returns `true` if no values are waiting in the buffer.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().buffer.is_empty()
    }

    /// Removes and returns the oldest value, blocking while the channel is
    /// empty and open.
    ///
    /// Returns `None` once the channel is both closed and empty. A thread
    /// blocked here is woken by the next `put` or by `close`.
    pub fn poll(&self) -> Option<T> {
        let mut state = self.inner.lock();
        loop {
            if let Some(value) = state.buffer.pop_front() {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            state = self
                .inner
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes and returns the oldest value without blocking.
    ///
    /// Returns `None` if the buffer is empty, whether or not the channel is
    /// closed.
    pub fn try_poll(&self) -> Option<T> {
        self.inner.lock().buffer.pop_front()
    }

    /// Like [`poll`](Channel::poll), but gives up after `timeout`.
    ///
    /// Returns `None` if the timeout elapsed, or if the channel is closed and
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use threadkit_sync::Channel;
    /// use std::time::Duration;
    ///
    /// let chan = Channel::<i32>::new();
    /// assert_eq!(chan.poll_timeout(Duration::from_millis(10)), None);
    /// ```
    pub fn poll_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.inner.lock();
        loop {
            if let Some(value) = state.buffer.pop_front() {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                // Timeout too large to represent as an instant: wait unbounded.
                None => {
                    state = self
                        .inner
                        .available
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                    continue;
                }
            };
            if remaining.is_zero() {
                return None;
            }
            state = self
                .inner
                .available
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Returns an iterator that drains the values currently in the buffer.
    ///
    /// The iterator yields [`try_poll`](Channel::try_poll) results until it
    /// first observes an empty buffer, then stays exhausted. Values put after
    /// that point are left for later polls.
    ///
    /// # Examples
    ///
    /// ```
    /// use threadkit_sync::Channel;
    ///
    /// let chan = Channel::new();
    /// chan.put("a");
    /// chan.put("b");
    ///
    /// let drained: Vec<_> = chan.iter().collect();
    /// assert_eq!(drained, vec!["a", "b"]);
    /// ```
    pub fn iter(&self) -> Drain<'_, T> {
        Drain {
            channel: self,
            exhausted: false,
        }
    }

    /// Closes the channel and wakes every thread blocked in `poll`.
    ///
    /// Closing an already closed channel does nothing.
    pub fn close(&self) {
        let mut state = self.inner.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let remaining = state.buffer.len();
        drop(state);

        tracing::debug!(remaining, "channel closed");
        self.inner.available.notify_all();
    }

    /// Returns `true` once [`close`](Channel::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Returns `true` if both handles refer to the same channel.
    ///
    /// # Examples
    ///
    /// ```
    /// use threadkit_sync::Channel;
    ///
    /// let a = Channel::<u8>::new();
    /// let b = a.clone();
    /// assert!(a.same_channel(&b));
    /// assert!(!a.same_channel(&Channel::new()));
    /// ```
    pub fn same_channel(&self, other: &Channel<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Channel")
            .field("size", &state.buffer.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl<'a, T> IntoIterator for &'a Channel<T> {
    type Item = T;
    type IntoIter = Drain<'a, T>;

    fn into_iter(self) -> Drain<'a, T> {
        self.iter()
    }
}

/// Snapshot-drain iterator returned by [`Channel::iter`].
///
/// Each step is one non-blocking poll. Two `Drain`s consuming the same
/// channel concurrently each see an atomic sequence of pops, but no ordering
/// is guaranteed between them.
pub struct Drain<'a, T> {
    channel: &'a Channel<T>,
    exhausted: bool,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.exhausted {
            return None;
        }
        let value = self.channel.try_poll();
        if value.is_none() {
            self.exhausted = true;
        }
        value
    }
}

impl<T> FusedIterator for Drain<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_put_poll_fifo() {
        let chan = Channel::new();
        for i in 0..5 {
            chan.put(i);
        }
        for i in 0..5 {
            assert_eq!(chan.poll(), Some(i));
        }
    }

    #[test]
    fn test_size_tracks_buffer() {
        let chan = Channel::new();
        assert_eq!(chan.size(), 0);
        assert!(chan.is_empty());

        chan.put('x');
        chan.put('y');
        assert_eq!(chan.size(), 2);

        chan.try_poll();
        assert_eq!(chan.size(), 1);
    }

    #[test]
    fn test_try_poll_empty() {
        let chan = Channel::<i32>::new();
        assert_eq!(chan.try_poll(), None);
    }

    #[test]
    fn test_safe_put_after_close_is_noop() {
        let chan = Channel::new();
        chan.put(1);
        chan.close();

        assert!(!chan.put(2));
        assert_eq!(chan.size(), 1);
    }

    #[test]
    fn test_strict_put_after_close_fails() {
        let chan = Channel::new();
        chan.close();

        let err = chan.put_strict(5).unwrap_err();
        assert_eq!(err.into_inner(), 5);
        assert_eq!(chan.size(), 0);
    }

    #[test]
    fn test_closed_channel_still_drains() {
        let chan = Channel::new();
        chan.put(1);
        chan.put(2);
        chan.close();

        assert_eq!(chan.poll(), Some(1));
        assert_eq!(chan.try_poll(), Some(2));
        assert_eq!(chan.poll(), None);
    }

    #[test]
    fn test_close_is_idempotent() {
        let chan = Channel::<i32>::new();
        chan.close();
        assert!(chan.is_closed());
        chan.close();
        assert!(chan.is_closed());
    }

    #[test]
    fn test_blocking_poll_woken_by_put() {
        let chan = Channel::new();
        let producer = chan.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            producer.put(99);
        });

        assert_eq!(chan.poll(), Some(99));
        handle.join().unwrap();
    }

    #[test]
    fn test_blocking_poll_woken_by_close() {
        let chan = Channel::<i32>::new();
        let closer = chan.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.close();
        });

        assert_eq!(chan.poll(), None);
        handle.join().unwrap();
    }

    #[test]
    fn test_poll_timeout_elapses() {
        let chan = Channel::<i32>::new();
        let start = Instant::now();
        assert_eq!(chan.poll_timeout(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_poll_timeout_returns_value() {
        let chan = Channel::new();
        chan.put(3);
        assert_eq!(chan.poll_timeout(Duration::from_secs(1)), Some(3));
    }

    #[test]
    fn test_iter_drains_snapshot() {
        let chan = Channel::new();
        chan.put(1);
        chan.put(2);
        chan.put(3);

        let drained: Vec<_> = chan.iter().collect();
        assert_eq!(drained, vec![1, 2, 3]);
        assert!(chan.is_empty());
    }

    #[test]
    fn test_iter_is_fused_after_empty() {
        let chan = Channel::new();
        chan.put(1);

        let mut drain = chan.iter();
        assert_eq!(drain.next(), Some(1));
        assert_eq!(drain.next(), None);

        chan.put(2);
        assert_eq!(drain.next(), None);
        assert_eq!(chan.try_poll(), Some(2));
    }

    #[test]
    fn test_for_loop_over_reference() {
        let chan = Channel::new();
        chan.put(10);
        chan.put(20);

        let mut sum = 0;
        for value in &chan {
            sum += value;
        }
        assert_eq!(sum, 30);
    }

    #[test]
    fn test_clones_share_buffer() {
        let a = Channel::new();
        let b = a.clone();

        a.put(1);
        assert_eq!(b.try_poll(), Some(1));
        assert!(a.same_channel(&b));

        b.close();
        assert!(a.is_closed());
    }

    #[test]
    fn test_debug_output() {
        let chan = Channel::new();
        chan.put(1u8);
        assert_eq!(format!("{:?}", chan), "Channel { size: 1, closed: false }");
    }
}
