use crate::backends::null::RhiFenceNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiFenceVulkan;
use crate::{RhiFenceStatus, RhiResult};
use std::time::Duration;

/// A GPU -> CPU synchronization mechanism.
///
/// A fence can be in the following states:
///  * Unsubmitted - Initial state when created
///  * Incomplete - Once a command buffer is submitted, the fence is marked as incomplete
///  * Complete - The GPU marks the fence complete when the work submitted with it has finished
///
/// The status of the fence returns to Unsubmitted when get_fence_status() is called while in a
/// completed state. In other words, the Complete status can only be returned one time unless the
/// fence is submitted again.
///
/// A fence may be dropped while in use, the submission keeps what it needs alive.
pub enum RhiFence {
    Null(RhiFenceNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiFenceVulkan),
}

impl RhiFence {
    /// Get the status of the fence. See `RhiFenceStatus`
    pub fn get_fence_status(&self) -> RhiResult<RhiFenceStatus> {
        match self {
            RhiFence::Null(inner) => inner.get_fence_status(),
            #[cfg(feature = "rhi-vulkan")]
            RhiFence::Vk(inner) => inner.get_fence_status(),
        }
    }

    /// Wait for the fence to be signaled as complete by the GPU. The wait is bounded by the
    /// device's configured fence timeout, a fence that does not signal in time is reported as
    /// `RhiError::FenceTimeout`, which is fatal.
    pub fn wait(&self) -> RhiResult<()> {
        match self {
            RhiFence::Null(inner) => inner.wait(),
            #[cfg(feature = "rhi-vulkan")]
            RhiFence::Vk(inner) => inner.wait(),
        }
    }

    /// Same as `wait`, with an explicit bound
    pub fn wait_timeout(
        &self,
        timeout: Duration,
    ) -> RhiResult<()> {
        match self {
            RhiFence::Null(inner) => inner.wait_timeout(timeout),
            #[cfg(feature = "rhi-vulkan")]
            RhiFence::Vk(inner) => inner.wait_timeout(timeout),
        }
    }

    pub fn null_fence(&self) -> Option<&RhiFenceNull> {
        match self {
            RhiFence::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiFence::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_fence(&self) -> Option<&RhiFenceVulkan> {
        match self {
            RhiFence::Null(_) => None,
            RhiFence::Vk(inner) => Some(inner),
        }
    }
}
