//! Thread-safe callback delivery with post-teardown suppression
//!
//! Worker threads post results back to the host event loop through
//! `napi::threadsafe_function::ThreadsafeFunction`, which is itself safe to
//! call from any thread. What it does *not* guarantee is that calling it
//! after the host has started tearing down (the `VideoEncoder` JS object was
//! GC'd, `Env` is being destroyed) is harmless — NAPI explicitly documents
//! that invoking a threadsafe function after its `Env` is gone is undefined
//! behavior. `SafeCallbackGateway` closes that window: `close()` flips a
//! shared flag before the worker's outstanding queue is drained, and every
//! `call()` after that is silently dropped instead of reaching into a torn
//! down environment.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use napi::threadsafe_function::{ThreadsafeFunction, ThreadsafeFunctionCallMode};
use napi::Result;

/// Guard shared between a gateway and every clone handed to a worker thread.
#[derive(Clone, Default)]
struct TeardownGuard(Arc<AtomicBool>);

impl TeardownGuard {
    fn is_torn_down(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Wraps one `ThreadsafeFunction` with the shared teardown guard.
///
/// Mirrors the teacher's existing callback type (`ThreadsafeFunction<T>`,
/// called with `Result<T>`), so either a successful value or a JS-visible
/// error travels through the same channel.
pub struct SafeCallbackGateway<T: 'static> {
    callback: ThreadsafeFunction<T>,
    guard: TeardownGuard,
}

impl<T: 'static> Clone for SafeCallbackGateway<T> {
    fn clone(&self) -> Self {
        Self {
            callback: self.callback.clone(),
            guard: self.guard.clone(),
        }
    }
}

impl<T: 'static> SafeCallbackGateway<T> {
    pub fn new(callback: ThreadsafeFunction<T>) -> Self {
        Self {
            callback,
            guard: TeardownGuard::default(),
        }
    }

    /// Deliver a value to the host callback, unless this gateway has been
    /// closed. Never blocks the worker thread.
    pub fn call(&self, value: Result<T>) {
        if self.guard.is_torn_down() {
            return;
        }
        self.callback.call(value, ThreadsafeFunctionCallMode::NonBlocking);
    }

    /// Permanently suppress further deliveries. Idempotent; safe to call
    /// from the host thread while the worker thread may still be racing to
    /// post a final result.
    pub fn close(&self) {
        self.guard.close();
    }

    pub fn is_closed(&self) -> bool {
        self.guard.is_torn_down()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_idempotent_and_visible_across_clones() {
        let guard = TeardownGuard::default();
        let clone = guard.clone();
        assert!(!guard.is_torn_down());
        clone.close();
        assert!(guard.is_torn_down());
        // Closing again must not panic or change observable state.
        guard.close();
        assert!(clone.is_torn_down());
    }
}
