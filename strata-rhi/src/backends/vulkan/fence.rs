use super::RhiDeviceContextVulkan;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct RhiFenceVulkan {
    device_context: RhiDeviceContextVulkan,
    fence: vk::Fence,
    submitted: AtomicBool,
    // Retired once the fence is observed signaled
    tokens: Mutex<Vec<RhiSubmissionToken>>,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiFenceVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiFenceVulkan")
            .field("fence", &self.fence)
            .field("submitted", &self.is_submitted())
            .finish()
    }
}

impl Drop for RhiFenceVulkan {
    fn drop(&mut self) {
        unsafe {
            self.device_context.device().destroy_fence(self.fence, None);
        }
    }
}

impl RhiFenceVulkan {
    pub(super) fn new(device_context: &RhiDeviceContextVulkan) -> RhiResult<Self> {
        let create_info = vk::FenceCreateInfo::builder();
        let fence = unsafe { device_context.device().create_fence(&create_info, None)? };

        Ok(RhiFenceVulkan {
            device_context: device_context.clone(),
            fence,
            submitted: AtomicBool::new(false),
            tokens: Mutex::new(Vec::default()),
            _count_guard: device_context.counters().track(RhiObjectKind::Fence),
        })
    }

    pub fn vk_fence(&self) -> vk::Fence {
        self.fence
    }

    pub(super) fn is_submitted(&self) -> bool {
        self.submitted.load(Ordering::Acquire)
    }

    /// A fence can only guard one submission at a time
    pub(super) fn check_submittable(&self) -> RhiResult<()> {
        if self.is_submitted() {
            return Err("fence is still guarding a submission, wait on it before submitting it again")?;
        }
        Ok(())
    }

    pub(super) fn mark_submitted(
        &self,
        tokens: Vec<RhiSubmissionToken>,
    ) {
        *self.tokens.lock() = tokens;
        self.submitted.store(true, Ordering::Release);
    }

    /// The fence was observed signaled. Reset it so it can be submitted again.
    pub(super) fn mark_complete(&self) -> RhiResult<()> {
        unsafe {
            self.device_context.device().reset_fences(&[self.fence])?;
        }

        for token in self.tokens.lock().drain(..) {
            token.retire();
        }
        self.submitted.store(false, Ordering::Release);
        Ok(())
    }

    pub fn get_fence_status(&self) -> RhiResult<RhiFenceStatus> {
        if !self.is_submitted() {
            return Ok(RhiFenceStatus::Unsubmitted);
        }

        let signaled = unsafe { self.device_context.device().get_fence_status(self.fence) };
        match signaled {
            Ok(true) => {
                self.mark_complete()?;
                Ok(RhiFenceStatus::Complete)
            }
            Ok(false) => Ok(RhiFenceStatus::Incomplete),
            Err(vk::Result::ERROR_DEVICE_LOST) => Err(RhiError::DeviceLost(
                "lost while querying a fence".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub fn wait(&self) -> RhiResult<()> {
        self.device_context.wait_for_fences(&[self])
    }

    pub fn wait_timeout(
        &self,
        timeout: Duration,
    ) -> RhiResult<()> {
        if !self.is_submitted() {
            return Ok(());
        }

        let result = unsafe {
            self.device_context.device().wait_for_fences(
                &[self.fence],
                true,
                timeout.as_nanos() as u64,
            )
        };

        match result {
            Ok(()) => self.mark_complete(),
            Err(vk::Result::TIMEOUT) => Err(RhiError::FenceTimeout(timeout.as_millis() as u64)),
            Err(vk::Result::ERROR_DEVICE_LOST) => Err(RhiError::DeviceLost(
                "lost while waiting on a fence".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
