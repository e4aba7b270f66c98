//! A worker thread whose join returns the target's value.
//!
//! # Examples
//!
//! ```
//! use threadkit_thread::ResultThread;
//!
//! let x = 10;
//! let mut thread = ResultThread::new(move || x + 1);
//! thread.start().unwrap();
//! assert_eq!(thread.join().unwrap(), 11);
//! ```

use std::fmt;
use std::time::Duration;

use crate::config::ThreadConfig;
use crate::error::{FailureStage, ThreadError};
use crate::panic::catch_panic;
use crate::worker::Worker;

type Target<T> = Box<dyn FnOnce() -> T + Send + 'static>;

/// A thread that runs one closure and hands its return value to `join`.
///
/// The closure's captured arguments are moved to the worker thread and
/// dropped there as soon as the closure returns.
///
/// If the closure panics, the panic is captured and returned from `join` as
/// [`ThreadError::Panicked`]. It is also reported to the config's
/// [`ErrorSink`](crate::ErrorSink) when it happens, so a thread that is never
/// joined still leaves a trace.
pub struct ResultThread<T> {
    config: ThreadConfig,
    target: Option<Target<T>>,
    worker: Option<Worker<T>>,
}

impl<T: Send + 'static> ResultThread<T> {
    /// Creates an unstarted thread that will run `target`.
    pub fn new<F>(target: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::with_config(ThreadConfig::default(), target)
    }

    /// Creates an unstarted thread with an explicit configuration.
    pub fn with_config<F>(config: ThreadConfig, target: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            config,
            target: Some(Box::new(target)),
            worker: None,
        }
    }

    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::AlreadyStarted`] on a second call, or
    /// [`ThreadError::Spawn`] if the OS could not create the thread.
    pub fn start(&mut self) -> Result<(), ThreadError> {
        let target = self.target.take().ok_or(ThreadError::AlreadyStarted)?;
        let worker = Worker::spawn(&self.config, move || {
            catch_panic(FailureStage::Target, target)
        })?;
        self.worker = Some(worker);
        Ok(())
    }
}

impl<T> ResultThread<T> {
    /// Blocks until the target returns, then yields its value.
    ///
    /// # Errors
    ///
    /// - [`ThreadError::NotStarted`] if `start` was never called.
    /// - [`ThreadError::Panicked`] if the target panicked.
    /// - [`ThreadError::AlreadyJoined`] if `join_timeout` already took the
    ///   value.
    pub fn join(mut self) -> Result<T, ThreadError> {
        let worker = self.worker.as_mut().ok_or(ThreadError::NotStarted)?;
        worker.wait(None);
        Self::take_value(worker)
    }

    /// Waits up to `timeout` for the target to return.
    ///
    /// Returns `Ok(None)` if the timeout elapsed first; the thread keeps
    /// running and can be joined again later.
    ///
    /// # Errors
    ///
    /// Same as [`join`](ResultThread::join).
    ///
    /// # Examples
    ///
    /// ```
    /// use threadkit_thread::ResultThread;
    /// use std::time::Duration;
    ///
    /// let mut thread = ResultThread::new(|| {
    ///     std::thread::sleep(Duration::from_millis(200));
    ///     "late"
    /// });
    /// thread.start().unwrap();
    ///
    /// assert_eq!(thread.join_timeout(Duration::from_millis(1)).unwrap(), None);
    /// assert!(!thread.is_finished());
    /// assert_eq!(thread.join().unwrap(), "late");
    /// ```
    pub fn join_timeout(&mut self, timeout: Duration) -> Result<Option<T>, ThreadError> {
        let worker = self.worker.as_mut().ok_or(ThreadError::NotStarted)?;
        if !worker.wait(Some(timeout)) {
            return Ok(None);
        }
        Self::take_value(worker).map(Some)
    }

    /// Returns `true` once the target has returned or panicked.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_some_and(Worker::is_finished)
    }

    /// Returns `true` once `start` has succeeded.
    pub fn is_started(&self) -> bool {
        self.worker.is_some()
    }

    fn take_value(worker: &Worker<T>) -> Result<T, ThreadError> {
        match worker.take() {
            Some(Ok(value)) => Ok(value),
            Some(Err(failure)) => Err(ThreadError::Panicked(failure)),
            None => Err(ThreadError::AlreadyJoined),
        }
    }
}

impl<T> fmt::Debug for ResultThread<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultThread")
            .field("name", &self.config.name)
            .field("started", &self.is_started())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_join_returns_value() {
        let mut t = ResultThread::new(|| 10 + 1);
        t.start().unwrap();
        assert_eq!(t.join().unwrap(), 11);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut t = ResultThread::new(|| ());
        t.start().unwrap();
        assert!(matches!(t.start(), Err(ThreadError::AlreadyStarted)));
        t.join().unwrap();
    }

    #[test]
    fn test_join_before_start() {
        let t = ResultThread::new(|| 1);
        assert!(matches!(t.join(), Err(ThreadError::NotStarted)));
    }

    #[test]
    fn test_join_timeout_before_start() {
        let mut t = ResultThread::new(|| 1);
        assert!(matches!(
            t.join_timeout(Duration::from_millis(1)),
            Err(ThreadError::NotStarted)
        ));
    }

    #[test]
    fn test_join_timeout_then_join() {
        let mut t = ResultThread::new(|| {
            thread::sleep(Duration::from_millis(100));
            7
        });
        t.start().unwrap();

        assert_eq!(t.join_timeout(Duration::from_millis(5)).unwrap(), None);
        assert!(!t.is_finished());
        assert_eq!(t.join().unwrap(), 7);
    }

    #[test]
    fn test_join_after_value_taken() {
        let mut t = ResultThread::new(|| 3);
        t.start().unwrap();

        assert_eq!(t.join_timeout(Duration::from_secs(5)).unwrap(), Some(3));
        assert!(t.is_finished());
        assert!(matches!(t.join(), Err(ThreadError::AlreadyJoined)));
    }

    #[test]
    fn test_panic_propagates_to_join() {
        let reported = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&reported);
        let config = ThreadConfig::named("failing").with_error_sink(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut t = ResultThread::with_config(config, || -> i32 { panic!("target blew up") });
        t.start().unwrap();

        let err = t.join().unwrap_err();
        let failure = err.failure().unwrap();
        assert_eq!(failure.message, "target blew up");
        assert_eq!(failure.thread.as_deref(), Some("failing"));
        assert_eq!(failure.stage, FailureStage::Target);
        assert_eq!(reported.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_target_dropped_after_run() {
        struct DropFlag(Arc<AtomicUsize>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let flag = DropFlag(Arc::clone(&drops));

        let mut t = ResultThread::new(move || {
            let _keep = &flag;
            "done"
        });
        t.start().unwrap();
        assert!(t.join_timeout(Duration::from_secs(5)).unwrap().is_some());
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_output() {
        let t = ResultThread::with_config(ThreadConfig::named("dbg"), || 0);
        assert_eq!(
            format!("{:?}", t),
            "ResultThread { name: Some(\"dbg\"), started: false, finished: false }"
        );
    }
}
