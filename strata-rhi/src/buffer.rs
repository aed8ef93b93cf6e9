use crate::backends::null::RhiBufferNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiBufferVulkan;
use crate::{RhiBufferDef, RhiResult};

/// A buffer is a piece of memory that can be accessed by the GPU. It may reside in CPU or GPU
/// memory depending on how it is created.
///
/// Buffers are cheap to clone, every clone refers to the same GPU allocation. The allocation is
/// released when the last clone is dropped. Command buffers that reference a buffer hold a clone
/// until they are re-begun after their submission completed, so a buffer can be dropped as soon
/// as the caller is done with it.
#[derive(Clone, Debug)]
pub enum RhiBuffer {
    Null(RhiBufferNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiBufferVulkan),
}

impl RhiBuffer {
    /// Copy all the data in the given slice into the buffer. This function will fail if the buffer
    /// is not writable by the CPU or is too small to hold the data.
    pub fn copy_to_host_visible_buffer<T: bytemuck::Pod>(
        &self,
        data: &[T],
    ) -> RhiResult<()> {
        match self {
            RhiBuffer::Null(inner) => inner.copy_to_host_visible_buffer(data),
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.copy_to_host_visible_buffer(data),
        }
    }

    /// Copy all the data in the given slice into the buffer with a given offset. The offset is in
    /// bytes. Fails if the buffer is not writable by the CPU or the data does not fit.
    pub fn copy_to_host_visible_buffer_with_offset<T: bytemuck::Pod>(
        &self,
        data: &[T],
        buffer_byte_offset: u64,
    ) -> RhiResult<()> {
        match self {
            RhiBuffer::Null(inner) => {
                inner.copy_to_host_visible_buffer_with_offset(data, buffer_byte_offset)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => {
                inner.copy_to_host_visible_buffer_with_offset(data, buffer_byte_offset)
            }
        }
    }

    /// Read bytes back from a buffer the CPU can map. Make sure the GPU work writing it has
    /// completed (wait on the fence of that submission) first.
    pub fn read_host_visible_buffer(
        &self,
        buffer_byte_offset: u64,
        size: u64,
    ) -> RhiResult<Vec<u8>> {
        match self {
            RhiBuffer::Null(inner) => inner.read_host_visible_buffer(buffer_byte_offset, size),
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.read_host_visible_buffer(buffer_byte_offset, size),
        }
    }

    /// Return the definition used to create the buffer
    pub fn buffer_def(&self) -> &RhiBufferDef {
        match self {
            RhiBuffer::Null(inner) => inner.buffer_def(),
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.buffer_def(),
        }
    }

    /// Sets a name for this buffer. This is useful for debugging, graphics debuggers/profilers such
    /// as nsight graphics or renderdoc will display this buffer with the given name in the list of
    /// resources.
    pub fn set_debug_name(
        &self,
        name: impl AsRef<str>,
    ) {
        match self {
            RhiBuffer::Null(inner) => inner.set_debug_name(name),
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(inner) => inner.set_debug_name(name),
        }
    }

    pub fn null_buffer(&self) -> Option<&RhiBufferNull> {
        match self {
            RhiBuffer::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiBuffer::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_buffer(&self) -> Option<&RhiBufferVulkan> {
        match self {
            RhiBuffer::Null(_) => None,
            RhiBuffer::Vk(inner) => Some(inner),
        }
    }
}
