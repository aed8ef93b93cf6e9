use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use super::RhiDeviceContextNull;
use crate::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct RhiBufferNullInner {
    buffer_def: RhiBufferDef,
    data: Mutex<Vec<u8>>,
    debug_name: Mutex<Option<String>>,
    _count_guard: RhiObjectCountGuard,
}

/// A buffer backed by host memory. Every memory usage is readable from the CPU on this device,
/// but the public API only allows host access to buffers a real device could map.
#[derive(Clone, Debug)]
pub struct RhiBufferNull {
    inner: Arc<RhiBufferNullInner>,
}

impl RhiBufferNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
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

        log::trace!(
            "Buffer created with size {} (always mapped: {:?})",
            allocation_size,
            buffer_def.always_mapped
        );

        Ok(RhiBufferNull {
            inner: Arc::new(RhiBufferNullInner {
                buffer_def: buffer_def.clone(),
                data: Mutex::new(vec![0; allocation_size as usize]),
                debug_name: Mutex::new(None),
                _count_guard: device_context.counters().track(RhiObjectKind::Buffer),
            }),
        })
    }

    pub fn buffer_def(&self) -> &RhiBufferDef {
        &self.inner.buffer_def
    }

    pub fn set_debug_name(
        &self,
        name: impl AsRef<str>,
    ) {
        *self.inner.debug_name.lock() = Some(name.as_ref().to_string());
    }

    pub fn debug_name(&self) -> Option<String> {
        self.inner.debug_name.lock().clone()
    }

    fn check_host_visible(&self) -> RhiResult<()> {
        if !self.inner.buffer_def.memory_usage.is_host_visible() {
            return Err("Tried to map a buffer that is not CPU-visible")?;
        }
        Ok(())
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
        self.check_host_visible()?;
        self.write_bytes(buffer_byte_offset, bytemuck::cast_slice(data))
    }

    pub fn read_host_visible_buffer(
        &self,
        buffer_byte_offset: u64,
        size: u64,
    ) -> RhiResult<Vec<u8>> {
        self.check_host_visible()?;
        self.read_bytes(buffer_byte_offset, size)
    }

    /// Size of the backing allocation, which may be larger than requested
    pub(super) fn allocation_size(&self) -> u64 {
        self.inner.data.lock().len() as u64
    }

    pub(super) fn write_bytes(
        &self,
        offset: u64,
        bytes: &[u8],
    ) -> RhiResult<()> {
        let mut data = self.inner.data.lock();
        let end = offset
            .checked_add(bytes.len() as u64)
            .filter(|end| *end <= data.len() as u64)
            .ok_or_else(|| {
                format!(
                    "write of {} bytes at offset {} overruns a buffer of {} bytes",
                    bytes.len(),
                    offset,
                    data.len()
                )
            })?;
        data[offset as usize..end as usize].copy_from_slice(bytes);
        Ok(())
    }

    pub(super) fn read_bytes(
        &self,
        offset: u64,
        size: u64,
    ) -> RhiResult<Vec<u8>> {
        let data = self.inner.data.lock();
        let end = offset
            .checked_add(size)
            .filter(|end| *end <= data.len() as u64)
            .ok_or_else(|| {
                format!(
                    "read of {} bytes at offset {} overruns a buffer of {} bytes",
                    size,
                    offset,
                    data.len()
                )
            })?;
        Ok(data[offset as usize..end as usize].to_vec())
    }
}
