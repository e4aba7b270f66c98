//! A worker thread that hands its target's value to a callback.
//!
//! The callback runs on the worker thread right after the target returns.
//! Extra callback arguments are whatever the callback closure captures.
//!
//! # Examples
//!
//! ```
//! use threadkit_thread::CallbackThread;
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel();
//! let y = 7;
//!
//! let mut thread = CallbackThread::new(|| 10 + 1, move |x: i32| {
//!     tx.send((x, y)).unwrap();
//! });
//! thread.start().unwrap();
//! thread.join().unwrap();
//!
//! assert_eq!(rx.recv().unwrap(), (11, 7));
//! ```

use std::fmt;
use std::time::Duration;

use crate::config::ThreadConfig;
use crate::error::{FailureStage, TargetFailure, ThreadError};
use crate::panic::catch_panic;
use crate::worker::{Outcome, Worker};

type Job = Box<dyn FnOnce() -> Outcome<()> + Send + 'static>;

/// A thread that runs a target and then a callback on the target's value.
///
/// If the target panics the callback is skipped. A panic in either stage is
/// captured, reported to the config's [`ErrorSink`](crate::ErrorSink), and
/// exposed through [`error`](CallbackThread::error) and `join`.
pub struct CallbackThread {
    config: ThreadConfig,
    job: Option<Job>,
    worker: Option<Worker<()>>,
}

impl CallbackThread {
    /// Creates an unstarted thread running `target` then `callback`.
    pub fn new<T, F, C>(target: F, callback: C) -> Self
    where
        T: 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        Self::with_config(ThreadConfig::default(), target, callback)
    }

    /// Creates an unstarted thread with an explicit configuration.
    pub fn with_config<T, F, C>(config: ThreadConfig, target: F, callback: C) -> Self
    where
        T: 'static,
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let job: Job = Box::new(move || -> Outcome<()> {
            let value = catch_panic(FailureStage::Target, target)?;
            catch_panic(FailureStage::Callback, move || callback(value))
        });
        Self {
            config,
            job: Some(job),
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
        let job = self.job.take().ok_or(ThreadError::AlreadyStarted)?;
        self.worker = Some(Worker::spawn(&self.config, job)?);
        Ok(())
    }

    /// Blocks until the target and callback have both run.
    ///
    /// # Errors
    ///
    /// Returns [`ThreadError::NotStarted`] if `start` was never called, or
    /// [`ThreadError::Panicked`] if either stage panicked.
    pub fn join(&mut self) -> Result<(), ThreadError> {
        let worker = self.worker.as_mut().ok_or(ThreadError::NotStarted)?;
        worker.wait(None);
        Self::check(worker)
    }

    /// Waits up to `timeout` for the worker to finish.
    ///
    /// Returns `Ok(false)` if the timeout elapsed first.
    ///
    /// # Errors
    ///
    /// Same as [`join`](CallbackThread::join).
    pub fn join_timeout(&mut self, timeout: Duration) -> Result<bool, ThreadError> {
        let worker = self.worker.as_mut().ok_or(ThreadError::NotStarted)?;
        if !worker.wait(Some(timeout)) {
            return Ok(false);
        }
        Self::check(worker).map(|()| true)
    }

    /// Returns `true` once the worker has finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_some_and(Worker::is_finished)
    }

    /// Returns the captured panic, if the target or callback panicked.
    pub fn error(&self) -> Option<TargetFailure> {
        self.worker.as_ref().and_then(Worker::failure)
    }

    fn check(worker: &Worker<()>) -> Result<(), ThreadError> {
        match worker.failure() {
            Some(failure) => Err(ThreadError::Panicked(failure)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CallbackThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackThread")
            .field("name", &self.config.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}
