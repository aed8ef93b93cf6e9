use crate::backends::null::RhiCommandPoolNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiCommandPoolVulkan;
use crate::device_context::backend_mismatch;
use crate::{RhiCommandBuffer, RhiCommandBufferDef, RhiDeviceContext, RhiResult};

/// A pool of command buffers. All command buffers must be dropped or freed before the pool is
/// dropped.
///
/// A command pool is necessary to create a command buffer. A command pool cannot be modified
/// (including allocating from it) by one thread while another thread is allocating from it or
/// using a command buffer allocated from it. Mutation goes through `&mut self` for this reason.
///
/// Dropping the pool frees every command buffer it allocated. Handles that outlive the pool
/// report `RhiCommandBufferState::Invalid`.
pub enum RhiCommandPool {
    Null(RhiCommandPoolNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiCommandPoolVulkan),
}

impl RhiCommandPool {
    pub fn device_context(&self) -> RhiDeviceContext {
        match self {
            RhiCommandPool::Null(inner) => RhiDeviceContext::Null(inner.device_context().clone()),
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandPool::Vk(inner) => RhiDeviceContext::Vk(inner.device_context().clone()),
        }
    }

    /// Allocate a command buffer. It starts Closed, ready for `begin`.
    pub fn create_command_buffer(
        &mut self,
        command_buffer_def: &RhiCommandBufferDef,
    ) -> RhiResult<RhiCommandBuffer> {
        Ok(match self {
            RhiCommandPool::Null(inner) => {
                RhiCommandBuffer::Null(inner.create_command_buffer(command_buffer_def)?)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandPool::Vk(inner) => {
                RhiCommandBuffer::Vk(inner.create_command_buffer(command_buffer_def)?)
            }
        })
    }

    /// Return a command buffer to the pool. It moves to Invalid and can no longer be used.
    pub fn free_command_buffer(
        &mut self,
        command_buffer: RhiCommandBuffer,
    ) -> RhiResult<()> {
        match self {
            RhiCommandPool::Null(inner) => inner.free_command_buffer(
                command_buffer
                    .null_command_buffer()
                    .ok_or_else(|| backend_mismatch("command buffer"))?,
            ),
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandPool::Vk(inner) => inner.free_command_buffer(
                command_buffer
                    .vk_command_buffer()
                    .ok_or_else(|| backend_mismatch("command buffer"))?,
            ),
        }
    }

    /// Resets all command buffers to Closed. Fails, changing nothing, if any of them is still
    /// executing.
    pub fn reset_command_pool(&mut self) -> RhiResult<()> {
        match self {
            RhiCommandPool::Null(inner) => inner.reset_command_pool(),
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandPool::Vk(inner) => inner.reset_command_pool(),
        }
    }

    pub fn null_command_pool(&self) -> Option<&RhiCommandPoolNull> {
        match self {
            RhiCommandPool::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandPool::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_command_pool(&self) -> Option<&RhiCommandPoolVulkan> {
        match self {
            RhiCommandPool::Null(_) => None,
            RhiCommandPool::Vk(inner) => Some(inner),
        }
    }
}
