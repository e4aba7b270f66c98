//! Panic capture for worker threads.
//!
//! Targets and callbacks run inside [`catch_panic`], which turns an unwinding
//! panic into a [`TargetFailure`] tagged with the current thread's name.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crate::error::{FailureStage, TargetFailure};

/// Runs `f`, converting a panic into a [`TargetFailure`].
///
/// The closure is consumed by the call, so nothing it captured can be
/// observed in a broken state afterwards.
pub(crate) fn catch_panic<F, R>(stage: FailureStage, f: F) -> Result<R, TargetFailure>
where
    F: FnOnce() -> R,
{
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| TargetFailure {
        thread: thread::current().name().map(str::to_owned),
        message: payload_message(payload.as_ref()),
        stage,
    })
}

/// Extracts the message from a panic payload.
pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_panic_success() {
        let result = catch_panic(FailureStage::Target, || 42);
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn test_catch_panic_str_payload() {
        let err = catch_panic(FailureStage::Target, || -> i32 { panic!("static message") })
            .unwrap_err();
        assert_eq!(err.message, "static message");
        assert_eq!(err.stage, FailureStage::Target);
    }

    #[test]
    fn test_catch_panic_string_payload() {
        let code = 7;
        let err = catch_panic(FailureStage::Callback, || -> u8 { panic!("failed with {}", code) })
            .unwrap_err();
        assert_eq!(err.message, "failed with 7");
        assert_eq!(err.stage, FailureStage::Callback);
    }

    #[test]
    fn test_catch_panic_opaque_payload() {
        let err = catch_panic(FailureStage::Target, || -> u8 {
            std::panic::panic_any(12_u32)
        })
        .unwrap_err();
        assert_eq!(err.message, "unknown panic");
    }

    #[test]
    fn test_catch_panic_records_thread_name() {
        let handle = thread::Builder::new()
            .name("named-worker".to_string())
            .spawn(|| catch_panic(FailureStage::Target, || -> u8 { panic!("x") }))
            .unwrap();

        let err = handle.join().unwrap().unwrap_err();
        assert_eq!(err.thread.as_deref(), Some("named-worker"));
    }
}
