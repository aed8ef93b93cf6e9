use crate::backends::null::RhiSemaphoreNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiSemaphoreVulkan;

/// A GPU -> GPU synchronization mechanism.
///
/// A semaphore is either "signalled" or "unsignalled". Only the GPU can read or write this status.
///
/// Semaphores can be used to queue multiple dependent units of work to the GPU where one unit of
/// work cannot start until another unit of work completes. The frame loop chains acquire ->
/// submit -> present this way.
///
/// Waiting on a semaphore that nothing signals is a programming error, it would hang a real GPU.
pub enum RhiSemaphore {
    Null(RhiSemaphoreNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiSemaphoreVulkan),
}

impl RhiSemaphore {
    pub fn null_semaphore(&self) -> Option<&RhiSemaphoreNull> {
        match self {
            RhiSemaphore::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiSemaphore::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_semaphore(&self) -> Option<&RhiSemaphoreVulkan> {
        match self {
            RhiSemaphore::Null(_) => None,
            RhiSemaphore::Vk(inner) => Some(inner),
        }
    }
}
