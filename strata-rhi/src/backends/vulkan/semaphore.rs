use super::RhiDeviceContextVulkan;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct RhiSemaphoreVulkan {
    device_context: RhiDeviceContextVulkan,
    semaphore: vk::Semaphore,
    // Set when a queue operation will signal the semaphore and cleared when one waits on it.
    // Waiting on a semaphore nothing signals would hang the queue, so such waits are skipped.
    signal_available: AtomicBool,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiSemaphoreVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiSemaphoreVulkan")
            .field("semaphore", &self.semaphore)
            .field("signal_available", &self.signal_available())
            .finish()
    }
}

impl Drop for RhiSemaphoreVulkan {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_semaphore(self.semaphore, None);
        }
    }
}

impl RhiSemaphoreVulkan {
    pub(super) fn new(device_context: &RhiDeviceContextVulkan) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe {
            device_context
                .device()
                .create_semaphore(&create_info, None)?
        };

        Ok(RhiSemaphoreVulkan {
            device_context: device_context.clone(),
            semaphore,
            signal_available: AtomicBool::new(false),
            _count_guard: device_context.counters().track(RhiObjectKind::Semaphore),
        })
    }

    pub fn vk_semaphore(&self) -> vk::Semaphore {
        self.semaphore
    }

    pub(super) fn signal_available(&self) -> bool {
        self.signal_available.load(Ordering::Acquire)
    }

    pub(super) fn set_signal_available(
        &self,
        available: bool,
    ) {
        self.signal_available.store(available, Ordering::Release);
    }
}
