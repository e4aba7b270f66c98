//! Dedicated worker thread with a waitable completion slot.
//!
//! Every handle in this crate is built on [`Worker`]: it spawns one OS thread,
//! runs a body that has already been wrapped in panic capture, and publishes
//! the outcome through a mutex/condvar pair so that joins can be bounded by a
//! timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::ThreadConfig;
use crate::error::{TargetFailure, ThreadError};
use crate::panic::catch_panic;

/// What a worker body produces.
pub(crate) type Outcome<T> = Result<T, TargetFailure>;

/// Outcome slot shared between a worker thread and its handle.
struct Completion<T> {
    outcome: Mutex<Option<Outcome<T>>>,
    done: Condvar,
    /// Set exactly once, under the `outcome` lock.
    finished: AtomicBool,
}

impl<T> Completion<T> {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
            finished: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Outcome<T>>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn complete(&self, outcome: Outcome<T>) {
        let mut slot = self.lock();
        *slot = Some(outcome);
        self.finished.store(true, Ordering::Release);
        drop(slot);
        self.done.notify_all();
    }

    fn wait(&self, timeout: Option<Duration>) -> bool {
        let slot = self.lock();
        let unfinished = |_: &mut Option<Outcome<T>>| !self.finished.load(Ordering::Acquire);
        match timeout {
            None => {
                let _slot = self
                    .done
                    .wait_while(slot, unfinished)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            Some(timeout) => {
                let _slot = self
                    .done
                    .wait_timeout_while(slot, timeout, unfinished)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        self.finished.load(Ordering::Acquire)
    }
}

/// A running (or finished) worker thread.
pub(crate) struct Worker<T> {
    completion: Arc<Completion<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Worker<T> {
    /// Spawns a thread running `body`.
    ///
    /// A failed outcome is handed to the config's error sink on the worker
    /// thread before it is published.
    pub(crate) fn spawn<F>(config: &ThreadConfig, body: F) -> Result<Self, ThreadError>
    where
        F: FnOnce() -> Outcome<T> + Send + 'static,
    {
        let completion = Arc::new(Completion::new());
        let shared = Arc::clone(&completion);
        let sink = config.error_sink.clone();

        let handle = config.builder().spawn(move || {
            let outcome = body();
            if let Err(failure) = &outcome {
                // A panicking sink must not keep the outcome from being published.
                if catch_panic(failure.stage, || sink.report(failure)).is_err() {
                    tracing::warn!("error sink panicked while reporting a worker failure");
                }
            }
            tracing::trace!(ok = outcome.is_ok(), "worker finished");
            shared.complete(outcome);
        })?;

        tracing::debug!(thread = config.display_name(), "worker spawned");

        Ok(Self {
            completion,
            handle: Some(handle),
        })
    }
}

impl<T> Worker<T> {
    /// Returns `true` once the body has returned or panicked.
    pub(crate) fn is_finished(&self) -> bool {
        self.completion.finished.load(Ordering::Acquire)
    }

    /// Waits for the worker to finish, up to `timeout` if one is given.
    ///
    /// Returns `true` if the worker finished. The OS thread is reaped the
    /// first time this observes completion.
    pub(crate) fn wait(&mut self, timeout: Option<Duration>) -> bool {
        if !self.completion.wait(timeout) {
            return false;
        }
        if let Some(handle) = self.handle.take() {
            // The body never unwinds, so the thread cannot have panicked.
            let _ = handle.join();
        }
        true
    }

    /// Takes the outcome, leaving `None` behind for later callers.
    pub(crate) fn take(&self) -> Option<Outcome<T>> {
        self.completion.lock().take()
    }

    /// Returns a copy of the captured failure, if the worker failed.
    pub(crate) fn failure(&self) -> Option<TargetFailure> {
        match &*self.completion.lock() {
            Some(Err(failure)) => Some(failure.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureStage;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_worker_publishes_value() {
        let mut worker = Worker::spawn(&ThreadConfig::default(), || Ok(5)).unwrap();
        assert!(worker.wait(None));
        assert!(worker.is_finished());
        assert_eq!(worker.take(), Some(Ok(5)));
        assert_eq!(worker.take(), None);
    }

    #[test]
    fn test_worker_wait_timeout() {
        let mut worker = Worker::spawn(&ThreadConfig::default(), || {
            thread::sleep(Duration::from_millis(200));
            Ok(())
        })
        .unwrap();

        assert!(!worker.wait(Some(Duration::from_millis(10))));
        assert!(!worker.is_finished());
        assert!(worker.wait(None));
    }

    #[test]
    fn test_worker_reports_failure_to_sink() {
        let reported = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&reported);
        let config = ThreadConfig::default().with_error_sink(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut worker = Worker::<()>::spawn(&config, || {
            catch_panic(FailureStage::Target, || panic!("worker failure"))
        })
        .unwrap();

        assert!(worker.wait(None));
        assert_eq!(reported.load(Ordering::SeqCst), 1);
        let failure = worker.failure().unwrap();
        assert_eq!(failure.message, "worker failure");
        // Peeking leaves the failure in place.
        assert!(worker.failure().is_some());
    }

    #[test]
    fn test_panicking_sink_still_publishes_failure() {
        let config = ThreadConfig::named("sink-panics").with_error_sink(|_| panic!("sink failure"));

        let mut worker = Worker::<()>::spawn(&config, || {
            catch_panic(FailureStage::Target, || panic!("target failure"))
        })
        .unwrap();

        assert!(worker.wait(Some(Duration::from_secs(5))));
        assert!(worker.is_finished());
        let failure = worker.failure().unwrap();
        assert_eq!(failure.message, "target failure");
        assert_eq!(failure.stage, FailureStage::Target);
        assert_eq!(failure.thread.as_deref(), Some("sink-panics"));
    }

    #[test]
    fn test_worker_uses_configured_name() {
        let mut worker = Worker::spawn(&ThreadConfig::named("slot-worker"), || {
            Ok(thread::current().name().map(str::to_owned))
        })
        .unwrap();

        worker.wait(None);
        assert_eq!(
            worker.take(),
            Some(Ok(Some("slot-worker".to_string())))
        );
    }
}
