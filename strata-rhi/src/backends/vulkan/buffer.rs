use super::RhiDeviceContextVulkan;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use parking_lot::Mutex;
use std::sync::Arc;

fn resource_type_buffer_usage_flags(resource_type: RhiResourceType) -> vk::BufferUsageFlags {
    // Every buffer can be a copy source or destination, for staging, readback and in-stream updates
    let mut usage_flags = vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST;

    if resource_type.intersects(RhiResourceType::UNIFORM_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::BUFFER | RhiResourceType::BUFFER_READ_WRITE) {
        usage_flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::VERTEX_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::INDEX_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }

    if resource_type.intersects(RhiResourceType::INDIRECT_BUFFER) {
        usage_flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }

    usage_flags
}

struct RhiBufferVulkanInner {
    device_context: RhiDeviceContextVulkan,
    buffer_def: RhiBufferDef,
    buffer: vk::Buffer,
    allocation_size: u64,
    allocation: Mutex<Option<Allocation>>,
    _count_guard: RhiObjectCountGuard,
}

impl Drop for RhiBufferVulkanInner {
    fn drop(&mut self) {
        log::trace!("destroying buffer {:?}", self.buffer);
        unsafe {
            self.device_context.device().destroy_buffer(self.buffer, None);
        }

        if let Some(allocation) = self.allocation.lock().take() {
            self.device_context.free_memory(allocation);
        }
    }
}

#[derive(Clone)]
pub struct RhiBufferVulkan {
    inner: Arc<RhiBufferVulkanInner>,
}

impl std::fmt::Debug for RhiBufferVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiBufferVulkan")
            .field("buffer", &self.inner.buffer)
            .field("buffer_def", &self.inner.buffer_def)
            .finish()
    }
}

impl RhiBufferVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<Self> {
        buffer_def.verify()?;

        let mut allocation_size = buffer_def.size;
        if buffer_def
            .resource_type
            .intersects(RhiResourceType::UNIFORM_BUFFER)
        {
            allocation_size = strata_base::memory::round_size_up_to_alignment_u64(
                buffer_def.size,
                device_context
                    .device_info()
                    .min_uniform_buffer_offset_alignment as u64,
            );
        }

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(allocation_size)
            .usage(resource_type_buffer_usage_flags(buffer_def.resource_type))
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let device = device_context.device();
        let buffer = unsafe { device.create_buffer(&buffer_info, None)? };
        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let allocation = device_context.allocate_memory(&AllocationCreateDesc {
            name: "buffer",
            requirements,
            location: buffer_def.memory_usage.into(),
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        });

        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(RhiError::AllocationFailed(format!(
                    "{} byte buffer: {}",
                    allocation_size, e
                )));
            }
        };

        if let Err(e) =
            unsafe { device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) }
        {
            unsafe { device.destroy_buffer(buffer, None) };
            device_context.free_memory(allocation);
            return Err(e.into());
        }

        log::trace!(
            "Buffer {:?} created with size {} (always mapped: {:?})",
            buffer,
            allocation_size,
            buffer_def.always_mapped
        );

        Ok(RhiBufferVulkan {
            inner: Arc::new(RhiBufferVulkanInner {
                device_context: device_context.clone(),
                buffer_def: buffer_def.clone(),
                buffer,
                allocation_size,
                allocation: Mutex::new(Some(allocation)),
                _count_guard: device_context.counters().track(RhiObjectKind::Buffer),
            }),
        })
    }

    pub fn vk_buffer(&self) -> vk::Buffer {
        self.inner.buffer
    }

    pub fn buffer_def(&self) -> &RhiBufferDef {
        &self.inner.buffer_def
    }

    pub fn set_debug_name(
        &self,
        name: impl AsRef<str>,
    ) {
        self.inner
            .device_context
            .set_debug_name(self.inner.buffer, name.as_ref());
    }

    /// Runs `f` over the mapped bytes of the buffer
    fn with_mapped_bytes<R>(
        &self,
        offset: u64,
        size: u64,
        f: impl FnOnce(*mut u8) -> R,
    ) -> RhiResult<R> {
        if !self.inner.buffer_def.memory_usage.is_host_visible() {
            return Err("Tried to map a buffer that is not CPU-visible")?;
        }

        offset
            .checked_add(size)
            .filter(|end| *end <= self.inner.allocation_size)
            .ok_or_else(|| {
                format!(
                    "access of {} bytes at offset {} overruns a buffer of {} bytes",
                    size, offset, self.inner.allocation_size
                )
            })?;

        let allocation = self.inner.allocation.lock();
        let mapped_ptr = allocation
            .as_ref()
            .and_then(|x| x.mapped_ptr())
            .ok_or("host-visible buffer memory is not mapped")?;

        let ptr = unsafe { (mapped_ptr.as_ptr() as *mut u8).add(offset as usize) };
        Ok(f(ptr))
    }

    pub fn copy_to_host_visible_buffer<T: bytemuck::Pod>(
        &self,
        data: &[T],
    ) -> RhiResult<()> {
        self.copy_to_host_visible_buffer_with_offset(data, 0)
    }

    pub fn copy_to_host_visible_buffer_with_offset<T: bytemuck::Pod>(
        &self,
        data: &[T],
        buffer_byte_offset: u64,
    ) -> RhiResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.with_mapped_bytes(buffer_byte_offset, bytes.len() as u64, |dst| unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), dst, bytes.len());
        })
    }

    pub fn read_host_visible_buffer(
        &self,
        buffer_byte_offset: u64,
        size: u64,
    ) -> RhiResult<Vec<u8>> {
        let mut data = vec![0u8; size as usize];
        self.with_mapped_bytes(buffer_byte_offset, size, |src| unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, data.as_mut_ptr(), size as usize);
        })?;
        Ok(data)
    }
}
