use super::*;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use std::sync::Arc;

struct VkPooledCommandBuffer {
    recorder: Arc<RhiCommandRecorder>,
    command_buffer: Option<vk::CommandBuffer>,
}

pub struct RhiCommandPoolVulkan {
    device_context: RhiDeviceContextVulkan,
    command_pool_def: RhiCommandPoolDef,
    queue_type: RhiQueueType,
    command_pool: vk::CommandPool,
    command_buffers: Vec<VkPooledCommandBuffer>,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiCommandPoolVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiCommandPoolVulkan")
            .field("command_pool", &self.command_pool)
            .field("queue_type", &self.queue_type)
            .field("transient", &self.command_pool_def.transient)
            .field("command_buffer_count", &self.command_buffers.len())
            .finish()
    }
}

impl RhiCommandPoolVulkan {
    pub(super) fn new(
        queue: &RhiQueueVulkan,
        command_pool_def: &RhiCommandPoolDef,
    ) -> RhiResult<Self> {
        let device_context = queue.device_context().clone();

        let mut flags = vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER;
        if command_pool_def.transient {
            flags |= vk::CommandPoolCreateFlags::TRANSIENT;
        }

        // Every queue type is served by the graphics family
        let create_info = vk::CommandPoolCreateInfo::builder()
            .flags(flags)
            .queue_family_index(device_context.queue_family_indices().graphics);

        let command_pool = unsafe {
            device_context
                .device()
                .create_command_pool(&create_info, None)?
        };

        log::trace!(
            "Created command pool {:?} for {:?} queue {}",
            command_pool,
            queue.queue_type(),
            queue.queue_id()
        );

        let count_guard = device_context
            .counters()
            .track(RhiObjectKind::CommandPool);
        Ok(RhiCommandPoolVulkan {
            device_context,
            command_pool_def: command_pool_def.clone(),
            queue_type: queue.queue_type(),
            command_pool,
            command_buffers: Vec::default(),
            _count_guard: count_guard,
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextVulkan {
        &self.device_context
    }

    pub fn queue_type(&self) -> RhiQueueType {
        self.queue_type
    }

    pub fn vk_command_pool(&self) -> vk::CommandPool {
        self.command_pool
    }

    pub fn create_command_buffer(
        &mut self,
        command_buffer_def: &RhiCommandBufferDef,
    ) -> RhiResult<RhiCommandBufferVulkan> {
        let command_buffer = if command_buffer_def.is_secondary {
            None
        } else {
            let allocate_info = vk::CommandBufferAllocateInfo::builder()
                .command_pool(self.command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffers = unsafe {
                self.device_context
                    .device()
                    .allocate_command_buffers(&allocate_info)?
            };
            Some(
                command_buffers
                    .into_iter()
                    .next()
                    .ok_or("command buffer allocation returned nothing")?,
            )
        };

        let recorder = Arc::new(RhiCommandRecorder::new(command_buffer_def.is_secondary));
        self.command_buffers.push(VkPooledCommandBuffer {
            recorder: recorder.clone(),
            command_buffer,
        });
        Ok(RhiCommandBufferVulkan::new(
            &self.device_context,
            recorder,
            command_buffer,
        ))
    }

    pub fn free_command_buffer(
        &mut self,
        command_buffer: &RhiCommandBufferVulkan,
    ) -> RhiResult<()> {
        let position = self
            .command_buffers
            .iter()
            .position(|x| Arc::ptr_eq(&x.recorder, command_buffer.recorder_arc()))
            .ok_or("command buffer was not allocated from this pool")?;

        if self.command_buffers[position].recorder.is_in_flight() {
            return Err(RhiError::InvalidCommandBufferState {
                expected: "retired",
                actual: "still executing",
            });
        }

        let pooled = self.command_buffers.swap_remove(position);
        pooled.recorder.free();
        if let Some(vk_command_buffer) = pooled.command_buffer {
            unsafe {
                self.device_context
                    .device()
                    .free_command_buffers(self.command_pool, &[vk_command_buffer]);
            }
        }
        Ok(())
    }

    pub fn reset_command_pool(&mut self) -> RhiResult<()> {
        if self.command_buffers.iter().any(|x| x.recorder.is_in_flight()) {
            return Err(RhiError::InvalidCommandBufferState {
                expected: "retired",
                actual: "still executing",
            });
        }

        for pooled in &self.command_buffers {
            pooled.recorder.reset()?;
        }

        // Native buffers are re-encoded from scratch the next time they are submitted
        unsafe {
            self.device_context
                .device()
                .reset_command_pool(self.command_pool, vk::CommandPoolResetFlags::empty())?;
        }
        Ok(())
    }
}

impl Drop for RhiCommandPoolVulkan {
    fn drop(&mut self) {
        for pooled in self.command_buffers.drain(..) {
            if pooled.recorder.is_in_flight() {
                log::warn!("Command pool dropped while one of its command buffers is executing");
            }
            pooled.recorder.free();
        }

        unsafe {
            self.device_context
                .device()
                .destroy_command_pool(self.command_pool, None);
        }
    }
}
