use crate::backends::null::RhiQueueNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiQueueVulkan;
use crate::device_context::backend_mismatch;
use crate::{
    RhiCommandBuffer, RhiCommandPool, RhiCommandPoolDef, RhiDeviceContext, RhiFence,
    RhiPresentSuccessResult, RhiQueueType, RhiResult, RhiSemaphore, RhiSwapchain,
};

/// A queue allows work to be submitted to the GPU
///
/// Work that has been submitted to the same queue executes in submission order.
///
/// Resources may only be accessed from one queue type at a time. If a resource is to be used by
/// a different queue, a barrier on both the "sending" and "receiving" queue is required.
///
/// A mutex protects against multiple threads submitting work to the queue at the same time.
#[derive(Clone, Debug)]
pub enum RhiQueue {
    Null(RhiQueueNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiQueueVulkan),
}

impl RhiQueue {
    pub fn device_context(&self) -> RhiDeviceContext {
        match self {
            RhiQueue::Null(inner) => RhiDeviceContext::Null(inner.device_context().clone()),
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(inner) => RhiDeviceContext::Vk(inner.device_context().clone()),
        }
    }

    /// Returns an opaque ID associated with this queue. It may be used to hash which queue a
    /// command pool is associated with
    pub fn queue_id(&self) -> u32 {
        match self {
            RhiQueue::Null(inner) => inner.queue_id(),
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(inner) => inner.queue_id(),
        }
    }

    /// Get the type of queue that this is
    pub fn queue_type(&self) -> RhiQueueType {
        match self {
            RhiQueue::Null(inner) => inner.queue_type(),
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(inner) => inner.queue_type(),
        }
    }

    /// Create a command pool for use with this queue
    pub fn create_command_pool(
        &self,
        command_pool_def: &RhiCommandPoolDef,
    ) -> RhiResult<RhiCommandPool> {
        Ok(match self {
            RhiQueue::Null(inner) => {
                RhiCommandPool::Null(inner.create_command_pool(command_pool_def)?)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(inner) => RhiCommandPool::Vk(inner.create_command_pool(command_pool_def)?),
        })
    }

    /// Submit command buffers for processing by the GPU.
    ///
    /// Every command buffer must have been ended (or be re-submittable). If any of them cannot be
    /// submitted, nothing is submitted. A command buffer with a render pass that was begun and
    /// never ended fails with `RhiError::OpenRenderPassAtSubmit`.
    ///
    /// Execution will not begin until all `wait_semaphores` are signaled.
    ///
    /// After execution, the given `signal_semaphores` and `signal_fence` are signaled as completed.
    #[profiling::function]
    pub fn submit(
        &self,
        command_buffers: &[&RhiCommandBuffer],
        wait_semaphores: &[&RhiSemaphore],
        signal_semaphores: &[&RhiSemaphore],
        signal_fence: Option<&RhiFence>,
    ) -> RhiResult<()> {
        match self {
            RhiQueue::Null(inner) => {
                let command_buffers = command_buffers
                    .iter()
                    .map(|x| {
                        x.null_command_buffer()
                            .ok_or_else(|| backend_mismatch("command buffer"))
                    })
                    .collect::<RhiResult<Vec<_>>>()?;
                let wait_semaphores = wait_semaphores
                    .iter()
                    .map(|x| x.null_semaphore().ok_or_else(|| backend_mismatch("semaphore")))
                    .collect::<RhiResult<Vec<_>>>()?;
                let signal_semaphores = signal_semaphores
                    .iter()
                    .map(|x| x.null_semaphore().ok_or_else(|| backend_mismatch("semaphore")))
                    .collect::<RhiResult<Vec<_>>>()?;
                let signal_fence = signal_fence
                    .map(|x| x.null_fence().ok_or_else(|| backend_mismatch("fence")))
                    .transpose()?;
                inner.submit(
                    &command_buffers,
                    &wait_semaphores,
                    &signal_semaphores,
                    signal_fence,
                )
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(inner) => {
                let command_buffers = command_buffers
                    .iter()
                    .map(|x| {
                        x.vk_command_buffer()
                            .ok_or_else(|| backend_mismatch("command buffer"))
                    })
                    .collect::<RhiResult<Vec<_>>>()?;
                let wait_semaphores = wait_semaphores
                    .iter()
                    .map(|x| x.vk_semaphore().ok_or_else(|| backend_mismatch("semaphore")))
                    .collect::<RhiResult<Vec<_>>>()?;
                let signal_semaphores = signal_semaphores
                    .iter()
                    .map(|x| x.vk_semaphore().ok_or_else(|| backend_mismatch("semaphore")))
                    .collect::<RhiResult<Vec<_>>>()?;
                let signal_fence = signal_fence
                    .map(|x| x.vk_fence().ok_or_else(|| backend_mismatch("fence")))
                    .transpose()?;
                inner.submit(
                    &command_buffers,
                    &wait_semaphores,
                    &signal_semaphores,
                    signal_fence,
                )
            }
        }
    }

    /// Presents an image in the swapchain.
    ///
    /// Execution will not begin until all `wait_semaphores` are signaled. An out-of-date
    /// swapchain is reported as `RhiPresentSuccessResult::OutOfDate`, not as an error.
    #[profiling::function]
    pub fn present(
        &self,
        swapchain: &RhiSwapchain,
        wait_semaphores: &[&RhiSemaphore],
        image_index: u32,
    ) -> RhiResult<RhiPresentSuccessResult> {
        match self {
            RhiQueue::Null(inner) => {
                let wait_semaphores = wait_semaphores
                    .iter()
                    .map(|x| x.null_semaphore().ok_or_else(|| backend_mismatch("semaphore")))
                    .collect::<RhiResult<Vec<_>>>()?;
                inner.present(
                    swapchain
                        .null_swapchain()
                        .ok_or_else(|| backend_mismatch("swapchain"))?,
                    &wait_semaphores,
                    image_index,
                )
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(inner) => {
                let wait_semaphores = wait_semaphores
                    .iter()
                    .map(|x| x.vk_semaphore().ok_or_else(|| backend_mismatch("semaphore")))
                    .collect::<RhiResult<Vec<_>>>()?;
                inner.present(
                    swapchain
                        .vk_swapchain()
                        .ok_or_else(|| backend_mismatch("swapchain"))?,
                    &wait_semaphores,
                    image_index,
                )
            }
        }
    }

    /// Wait until all work submitted to this queue is completed
    pub fn wait_for_queue_idle(&self) -> RhiResult<()> {
        match self {
            RhiQueue::Null(inner) => inner.wait_for_queue_idle(),
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(inner) => inner.wait_for_queue_idle(),
        }
    }

    pub fn null_queue(&self) -> Option<&RhiQueueNull> {
        match self {
            RhiQueue::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiQueue::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_queue(&self) -> Option<&RhiQueueVulkan> {
        match self {
            RhiQueue::Null(_) => None,
            RhiQueue::Vk(inner) => Some(inner),
        }
    }
}
