//! Per-gesture in-flight guard
//!
//! A second attempt at the same user action while the first is still running
//! is refused with `ErrorCode::Busy`. This is not an idempotency key.

use std::sync::atomic::{AtomicBool, Ordering};

use shared::{AppError, AppResult};

#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gesture until the returned guard is dropped
    pub fn try_begin(&self, action: &'static str) -> AppResult<InFlightGuard<'_>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(action, "Gesture already in flight");
            return Err(AppError::busy(action));
        }
        Ok(InFlightGuard { busy: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

pub struct InFlightGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
