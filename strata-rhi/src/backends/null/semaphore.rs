use super::RhiDeviceContextNull;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use std::sync::atomic::{AtomicBool, Ordering};

/// Binary semaphore. The timeline is in order, so a signal is visible to every later wait as
/// soon as the signaling operation is queued.
#[derive(Debug)]
pub struct RhiSemaphoreNull {
    signaled: AtomicBool,
    _count_guard: RhiObjectCountGuard,
}

impl RhiSemaphoreNull {
    pub(super) fn new(device_context: &RhiDeviceContextNull) -> RhiResult<Self> {
        Ok(RhiSemaphoreNull {
            signaled: AtomicBool::new(false),
            _count_guard: device_context.counters().track(RhiObjectKind::Semaphore),
        })
    }

    /// True if a signal is pending that no wait has consumed
    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }

    pub(super) fn check_signalable(&self) -> RhiResult<()> {
        if self.is_signaled() {
            return Err("semaphore is signaled again before anything waited on it")?;
        }
        Ok(())
    }

    pub(super) fn signal(&self) -> RhiResult<()> {
        self.check_signalable()?;
        self.signaled.store(true, Ordering::Release);
        Ok(())
    }

    /// Consume the pending signal. Returns false if there is none, a wait that would never end.
    pub(super) fn consume(&self) -> bool {
        self.signaled.swap(false, Ordering::AcqRel)
    }
}
