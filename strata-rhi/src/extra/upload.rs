use crate::{
    RhiBuffer, RhiBufferBarrier, RhiBufferDef, RhiCmdCopyBufferToTextureParams, RhiCommandBuffer,
    RhiCommandBufferDef, RhiCommandPool, RhiCommandPoolDef, RhiDeviceContext, RhiError, RhiFence,
    RhiFenceStatus, RhiQueue, RhiResourceState, RhiResourceType, RhiResult, RhiTexture,
    RhiTextureBarrier, RhiTextureDef,
};
use crossbeam_channel::{Receiver, Sender};

// Based on UploadHeap in cauldron
// (https://github.com/GPUOpen-LibrariesAndSDKs/Cauldron/blob/5acc12602c55e469cc1f9181967dbcb122f8e6c7/src/VK/base/UploadHeap.h)

/// A staging buffer borrowed from a `RhiUploadBufferPool`. Returns itself to the pool on drop.
pub struct RhiUploadBuffer {
    buffer: RhiBuffer,
    upload_buffer_released_tx: Sender<RhiBuffer>,
}

impl Drop for RhiUploadBuffer {
    fn drop(&mut self) {
        // A closed channel means the pool is gone and the buffer can just be freed
        let _ = self.upload_buffer_released_tx.send(self.buffer.clone());
    }
}

/// A fixed number of equally sized staging buffers, reused across uploads
pub struct RhiUploadBufferPool {
    _device_context: RhiDeviceContext,
    buffer_count: u32,
    buffer_size: u64,
    unused_buffers: Vec<RhiBuffer>,
    upload_buffer_released_tx: Sender<RhiBuffer>,
    upload_buffer_released_rx: Receiver<RhiBuffer>,
}

impl Drop for RhiUploadBufferPool {
    fn drop(&mut self) {
        self.handle_dropped_buffers();
        if self.unused_buffers.len() != self.buffer_count as usize {
            log::error!(
                "RhiUploadBufferPool dropped while {} of its buffers were in use",
                self.buffer_count as usize - self.unused_buffers.len()
            );
        }
    }
}

impl RhiUploadBufferPool {
    pub fn new(
        device_context: &RhiDeviceContext,
        buffer_count: u32,
        buffer_size: u64,
    ) -> RhiResult<Self> {
        let (upload_buffer_released_tx, upload_buffer_released_rx) = crossbeam_channel::unbounded();
        let mut unused_buffers = Vec::with_capacity(buffer_count as usize);

        for _ in 0..buffer_count {
            let buffer = device_context.create_buffer(&RhiBufferDef::for_staging_buffer(
                buffer_size as usize,
                RhiResourceType::BUFFER,
            ))?;
            unused_buffers.push(buffer);
        }

        Ok(RhiUploadBufferPool {
            _device_context: device_context.clone(),
            buffer_count,
            buffer_size,
            unused_buffers,
            upload_buffer_released_tx,
            upload_buffer_released_rx,
        })
    }

    pub fn buffer_size(&self) -> u64 {
        self.buffer_size
    }

    /// Buffers not currently lent to an upload
    pub fn available_buffer_count(&mut self) -> usize {
        self.handle_dropped_buffers();
        self.unused_buffers.len()
    }

    fn take(
        &mut self,
        required_size_bytes: u64,
    ) -> RhiResult<RhiUploadBuffer> {
        if self.buffer_size < required_size_bytes {
            return Err(format!(
                "Buffer of size {} requested but the pool's buffers are only {} in size",
                required_size_bytes, self.buffer_size
            ))?;
        }

        self.handle_dropped_buffers();

        if let Some(buffer) = self.unused_buffers.pop() {
            Ok(RhiUploadBuffer {
                buffer,
                upload_buffer_released_tx: self.upload_buffer_released_tx.clone(),
            })
        } else {
            Err("RhiUploadBufferPool has no more available buffers")?
        }
    }

    // Move any released buffers back into the unused list
    fn handle_dropped_buffers(&mut self) {
        for buffer in self.upload_buffer_released_rx.try_iter() {
            self.unused_buffers.push(buffer);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RhiUploadError {
    #[error("upload buffer is full")]
    BufferFull,

    #[error(transparent)]
    Other(#[from] RhiError),
}

impl RhiUploadError {
    // Helpful for when types are not being inferred as expected
    pub fn into_rhi_error(self) -> RhiError {
        self.into()
    }
}

impl From<RhiUploadError> for RhiError {
    fn from(error: RhiUploadError) -> Self {
        match error {
            RhiUploadError::BufferFull => {
                RhiError::StringError("Upload buffer is full".to_string())
            }
            RhiUploadError::Other(e) => e,
        }
    }
}

impl From<&str> for RhiUploadError {
    fn from(str: &str) -> Self {
        RhiError::StringError(str.to_string()).into()
    }
}

impl From<String> for RhiUploadError {
    fn from(string: String) -> Self {
        RhiError::StringError(string).into()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RhiUploadState {
    /// The upload is not submitted yet and data may be appended to it
    Writable,

    /// The buffer has been sent to the GPU and is no longer writable
    SentToGpu,

    /// The upload is finished and the resources may be used
    Complete,
}

enum UploadBuffer {
    Pooled(RhiUploadBuffer),
    NonPooled(RhiBuffer),
}

impl UploadBuffer {
    fn buffer(&self) -> &RhiBuffer {
        match self {
            UploadBuffer::Pooled(buffer) => &buffer.buffer,
            UploadBuffer::NonPooled(buffer) => buffer,
        }
    }
}

fn align_up(
    value: u64,
    alignment: u64,
) -> u64 {
    let alignment = alignment.max(1);
    ((value + alignment - 1) / alignment) * alignment
}

/// Accumulates writes into a staging buffer and the commands that copy them to their
/// destinations, so several resources can be uploaded with one submission.
pub struct RhiUpload {
    queue: RhiQueue,
    command_pool: RhiCommandPool,
    command_buffer: RhiCommandBuffer,
    buffer: UploadBuffer,
    buffer_size: u64,
    write_offset: u64,
    writable: bool,
    submitted: bool,
    fence: RhiFence,
}

impl RhiUpload {
    pub fn new(
        device_context: &RhiDeviceContext,
        queue: &RhiQueue,
        buffer_size: u64,
        buffer_pool: Option<&mut RhiUploadBufferPool>,
    ) -> RhiResult<Self> {
        let mut command_pool = queue.create_command_pool(&RhiCommandPoolDef { transient: true })?;
        let command_buffer = command_pool.create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })?;
        command_buffer.begin()?;

        let buffer = if let Some(buffer_pool) = buffer_pool {
            UploadBuffer::Pooled(buffer_pool.take(buffer_size)?)
        } else {
            UploadBuffer::NonPooled(device_context.create_buffer(
                &RhiBufferDef::for_staging_buffer(buffer_size as usize, RhiResourceType::BUFFER),
            )?)
        };

        let fence = device_context.create_fence()?;

        Ok(RhiUpload {
            queue: queue.clone(),
            command_pool,
            command_buffer,
            buffer_size: buffer.buffer().buffer_def().size,
            buffer,
            write_offset: 0,
            writable: true,
            submitted: false,
            fence,
        })
    }

    pub fn has_space_available(
        &self,
        bytes_to_write: usize,
        required_alignment: usize,
        number_of_writes: usize,
    ) -> bool {
        let mut write_end = self.write_offset;
        for _ in 0..number_of_writes {
            write_end = align_up(write_end, required_alignment as u64) + bytes_to_write as u64;
        }

        write_end <= self.buffer_size
    }

    /// Copy `data` into the staging buffer. Returns the offset it was written at.
    pub fn push(
        &mut self,
        data: &[u8],
        required_alignment: usize,
    ) -> Result<u64, RhiUploadError> {
        log::trace!("Pushing {} bytes into upload", data.len());

        if !self.writable {
            Err("Upload buffer is not writable")?;
        }

        let write_begin = align_up(self.write_offset, required_alignment as u64);
        let write_end = write_begin + data.len() as u64;
        if write_end > self.buffer_size {
            Err(RhiUploadError::BufferFull)?;
        }

        self.buffer
            .buffer()
            .copy_to_host_visible_buffer_with_offset(data, write_begin)?;
        self.write_offset = write_end;
        Ok(write_begin)
    }

    pub fn buffer_size(&self) -> u64 {
        self.buffer_size
    }

    pub fn bytes_written(&self) -> u64 {
        self.write_offset
    }

    pub fn bytes_free(&self) -> u64 {
        self.buffer_size - self.write_offset
    }

    pub fn command_pool(&self) -> &RhiCommandPool {
        &self.command_pool
    }

    pub fn command_buffer(&self) -> &RhiCommandBuffer {
        &self.command_buffer
    }

    pub fn staging_buffer(&self) -> &RhiBuffer {
        self.buffer.buffer()
    }

    pub fn queue(&self) -> &RhiQueue {
        &self.queue
    }

    pub fn submit(&mut self) -> RhiResult<()> {
        if self.writable {
            self.command_buffer.end()?;
            self.queue
                .submit(&[&self.command_buffer], &[], &[], Some(&self.fence))?;
            self.writable = false;
            self.submitted = true;
        }

        Ok(())
    }

    pub fn state(&self) -> RhiResult<RhiUploadState> {
        let state = if self.writable {
            RhiUploadState::Writable
        } else if !self.submitted || self.fence.get_fence_status()? != RhiFenceStatus::Incomplete {
            RhiUploadState::Complete
        } else {
            RhiUploadState::SentToGpu
        };

        Ok(state)
    }

    /// Submit if that has not happened yet, then block until the copies have executed
    pub fn block_until_upload_complete(&mut self) -> RhiResult<()> {
        self.submit()?;
        self.wait_for_idle()
    }

    fn wait_for_idle(&mut self) -> RhiResult<()> {
        if self.submitted {
            self.fence.wait()?;
            self.submitted = false;
        }
        Ok(())
    }
}

impl Drop for RhiUpload {
    fn drop(&mut self) {
        log::trace!("destroying RhiUpload");

        // If the transfer is in flight, wait for it to complete
        if let Err(e) = self.wait_for_idle() {
            log::error!("Error waiting for an upload to finish: {}", e);
        }

        log::trace!("destroyed RhiUpload");
    }
}

/// Bytes one subresource of the texture holds, tightly packed
pub fn texture_subresource_size(
    texture_def: &RhiTextureDef,
    mip_level: u32,
) -> u64 {
    let extents = texture_def.extents.mip_extents(mip_level);
    extents.width as u64
        * extents.height as u64
        * extents.depth as u64
        * texture_def.format.block_or_pixel_size_in_bytes() as u64
}

/// Bytes of every layer and mip of the texture, tightly packed, layer major
pub fn texture_data_size(texture_def: &RhiTextureDef) -> u64 {
    let per_layer: u64 = (0..texture_def.mip_count)
        .map(|mip| texture_subresource_size(texture_def, mip))
        .sum();
    per_layer * texture_def.array_length as u64
}

/// Enqueue a copy of `data` into a device-local buffer
pub fn upload_buffer_data<T: bytemuck::Pod>(
    upload: &mut RhiUpload,
    dst_buffer: &RhiBuffer,
    dst_offset: u64,
    data: &[T],
) -> Result<(), RhiUploadError> {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    let alignment = std::mem::align_of::<T>().max(4);
    let src_offset = upload.push(bytes, alignment)?;

    upload.command_buffer().cmd_copy_buffer_to_buffer(
        upload.staging_buffer(),
        dst_buffer,
        src_offset,
        dst_offset,
        bytes.len() as u64,
    )?;

    upload.command_buffer().cmd_resource_barrier(
        &[RhiBufferBarrier::state_transition(
            dst_buffer,
            RhiResourceState::COPY_DST,
            RhiResourceState::GENERIC_READ,
        )],
        &[],
    )?;

    log::trace!("Enqueued upload of {} bytes into a buffer", bytes.len());
    Ok(())
}

/// Enqueue a copy of `data` into every layer and mip of the texture. `data` is tightly packed,
/// layer major, mips in order within a layer. Leaves the texture ready for sampling.
pub fn upload_texture_data(
    device_context: &RhiDeviceContext,
    upload: &mut RhiUpload,
    texture: &RhiTexture,
    data: &[u8],
) -> Result<(), RhiUploadError> {
    let texture_def = texture.texture_def();
    let expected_size = texture_data_size(texture_def);
    if data.len() as u64 != expected_size {
        Err(format!(
            "texture data is {} bytes but a {:?} {:?} texture with {} layers and {} mips needs {}",
            data.len(),
            texture_def.extents,
            texture_def.format,
            texture_def.array_length,
            texture_def.mip_count,
            expected_size
        ))?;
    }

    let alignment = device_context.device_info().upload_buffer_texture_alignment as usize;
    let mut required_end = upload.bytes_written();
    for _ in 0..texture_def.array_length {
        for mip in 0..texture_def.mip_count {
            required_end = align_up(required_end, alignment as u64)
                + texture_subresource_size(texture_def, mip);
        }
    }
    if required_end > upload.buffer_size() {
        Err(RhiUploadError::BufferFull)?;
    }

    let mut subresources = Vec::default();
    let mut read_offset = 0usize;
    for layer in 0..texture_def.array_length {
        for mip in 0..texture_def.mip_count {
            let size = texture_subresource_size(texture_def, mip) as usize;
            let buffer_offset = upload.push(&data[read_offset..read_offset + size], alignment)?;
            subresources.push((layer, mip, buffer_offset));
            read_offset += size;
        }
    }

    upload.command_buffer().cmd_resource_barrier(
        &[],
        &[RhiTextureBarrier::state_transition(
            texture,
            RhiResourceState::UNDEFINED,
            RhiResourceState::COPY_DST,
        )],
    )?;

    for (layer, mip, buffer_offset) in subresources {
        upload.command_buffer().cmd_copy_buffer_to_texture(
            upload.staging_buffer(),
            texture,
            &RhiCmdCopyBufferToTextureParams {
                buffer_offset,
                array_layer: layer as u16,
                mip_level: mip as u8,
            },
        )?;
    }

    upload.command_buffer().cmd_resource_barrier(
        &[],
        &[RhiTextureBarrier::state_transition(
            texture,
            RhiResourceState::COPY_DST,
            RhiResourceState::SHADER_RESOURCE,
        )],
    )?;

    log::debug!(
        "upload texture {}x{} format {:?} layers: {} levels: {}",
        texture_def.extents.width,
        texture_def.extents.height,
        texture_def.format,
        texture_def.array_length,
        texture_def.mip_count
    );

    Ok(())
}

/// Create a texture and fill it, blocking until the data is on the device
pub fn create_texture_with_data(
    device_context: &RhiDeviceContext,
    queue: &RhiQueue,
    texture_def: &RhiTextureDef,
    data: &[u8],
) -> RhiResult<RhiTexture> {
    let texture = device_context.create_texture(texture_def)?;

    let alignment = device_context.device_info().upload_buffer_texture_alignment as u64;
    let subresource_count = (texture_def.array_length * texture_def.mip_count) as u64;
    let upload_size = texture_data_size(texture_def) + alignment * subresource_count;

    let mut upload = RhiUpload::new(device_context, queue, upload_size, None)?;
    upload_texture_data(device_context, &mut upload, &texture, data)?;
    upload.block_until_upload_complete()?;

    Ok(texture)
}

/// Copy one subresource of a texture back to the CPU, blocking until the copy has executed.
/// `current_state` is the state the texture is in, and is restored afterwards.
pub fn read_texture_data(
    device_context: &RhiDeviceContext,
    queue: &RhiQueue,
    texture: &RhiTexture,
    current_state: RhiResourceState,
    array_layer: u32,
    mip_level: u32,
) -> RhiResult<Vec<u8>> {
    let texture_def = texture.texture_def();
    if array_layer >= texture_def.array_length || mip_level >= texture_def.mip_count {
        return Err(format!(
            "cannot read layer {} mip {} of a texture with {} layers and {} mips",
            array_layer, mip_level, texture_def.array_length, texture_def.mip_count
        ))?;
    }

    let size = texture_subresource_size(texture_def, mip_level);
    let readback_buffer = device_context.create_buffer(&RhiBufferDef::for_readback_buffer(size))?;

    let mut command_pool = queue.create_command_pool(&RhiCommandPoolDef { transient: true })?;
    let command_buffer = command_pool.create_command_buffer(&RhiCommandBufferDef {
        is_secondary: false,
    })?;

    command_buffer.begin()?;
    command_buffer.cmd_resource_barrier(
        &[],
        &[RhiTextureBarrier::state_transition(
            texture,
            current_state,
            RhiResourceState::COPY_SRC,
        )],
    )?;
    command_buffer.cmd_copy_texture_to_buffer(
        texture,
        &readback_buffer,
        &RhiCmdCopyBufferToTextureParams {
            buffer_offset: 0,
            array_layer: array_layer as u16,
            mip_level: mip_level as u8,
        },
    )?;
    command_buffer.cmd_resource_barrier(
        &[],
        &[RhiTextureBarrier::state_transition(
            texture,
            RhiResourceState::COPY_SRC,
            current_state,
        )],
    )?;
    command_buffer.end()?;

    let fence = device_context.create_fence()?;
    queue.submit(&[&command_buffer], &[], &[], Some(&fence))?;
    fence.wait()?;

    readback_buffer.read_host_visible_buffer(0, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RhiApi, RhiApiDef, RhiFormat, RhiQueueType};

    #[test]
    fn upload_pool_reuses_released_buffers() {
        let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
        let device_context = api.device_context();
        let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();
        let mut pool = RhiUploadBufferPool::new(&device_context, 1, 1024).unwrap();

        {
            let _upload = RhiUpload::new(&device_context, &queue, 1024, Some(&mut pool)).unwrap();
            assert_eq!(pool.available_buffer_count(), 0);
            assert!(RhiUpload::new(&device_context, &queue, 1024, Some(&mut pool)).is_err());
        }

        assert_eq!(pool.available_buffer_count(), 1);
    }

    #[test]
    fn push_respects_alignment_and_capacity() {
        let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
        let device_context = api.device_context();
        let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();
        let mut upload = RhiUpload::new(&device_context, &queue, 64, None).unwrap();

        assert_eq!(upload.push(&[1, 2, 3], 1).unwrap(), 0);
        assert_eq!(upload.push(&[4], 16).unwrap(), 16);
        assert!(!upload.has_space_available(48, 16, 1));
        assert!(matches!(
            upload.push(&[0; 48], 16),
            Err(RhiUploadError::BufferFull)
        ));
    }

    #[test]
    fn texture_data_round_trips() {
        let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
        let device_context = api.device_context();
        let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();

        let texture_def = RhiTextureDef::for_sampled_2d(4, 4, RhiFormat::R8G8B8A8_UNORM);
        let data: Vec<u8> = (0..64).collect();
        let texture =
            create_texture_with_data(&device_context, &queue, &texture_def, &data).unwrap();

        let read_back = read_texture_data(
            &device_context,
            &queue,
            &texture,
            RhiResourceState::SHADER_RESOURCE,
            0,
            0,
        )
        .unwrap();
        assert_eq!(read_back, data);
    }
}
