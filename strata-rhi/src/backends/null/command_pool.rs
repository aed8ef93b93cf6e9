use super::*;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use std::sync::Arc;

pub struct RhiCommandPoolNull {
    device_context: RhiDeviceContextNull,
    command_pool_def: RhiCommandPoolDef,
    queue_type: RhiQueueType,
    command_buffers: Vec<Arc<RhiCommandRecorder>>,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiCommandPoolNull {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiCommandPoolNull")
            .field("queue_type", &self.queue_type)
            .field("transient", &self.command_pool_def.transient)
            .field("command_buffer_count", &self.command_buffers.len())
            .finish()
    }
}

impl RhiCommandPoolNull {
    pub(super) fn new(
        queue: &RhiQueueNull,
        command_pool_def: &RhiCommandPoolDef,
    ) -> RhiResult<Self> {
        let device_context = queue.device_context().clone();
        let count_guard = device_context
            .counters()
            .track(RhiObjectKind::CommandPool);
        Ok(RhiCommandPoolNull {
            device_context,
            command_pool_def: command_pool_def.clone(),
            queue_type: queue.queue_type(),
            command_buffers: Vec::default(),
            _count_guard: count_guard,
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextNull {
        &self.device_context
    }

    pub fn queue_type(&self) -> RhiQueueType {
        self.queue_type
    }

    pub fn create_command_buffer(
        &mut self,
        command_buffer_def: &RhiCommandBufferDef,
    ) -> RhiResult<RhiCommandBufferNull> {
        let recorder = Arc::new(RhiCommandRecorder::new(command_buffer_def.is_secondary));
        self.command_buffers.push(recorder.clone());
        Ok(RhiCommandBufferNull::new(&self.device_context, recorder))
    }

    pub fn free_command_buffer(
        &mut self,
        command_buffer: &RhiCommandBufferNull,
    ) -> RhiResult<()> {
        let position = self
            .command_buffers
            .iter()
            .position(|x| Arc::ptr_eq(x, command_buffer.recorder_arc()))
            .ok_or("command buffer was not allocated from this pool")?;

        if self.command_buffers[position].is_in_flight() {
            return Err(RhiError::InvalidCommandBufferState {
                expected: "retired",
                actual: "still executing",
            });
        }

        let recorder = self.command_buffers.swap_remove(position);
        recorder.free();
        Ok(())
    }

    pub fn reset_command_pool(&mut self) -> RhiResult<()> {
        if self.command_buffers.iter().any(|x| x.is_in_flight()) {
            return Err(RhiError::InvalidCommandBufferState {
                expected: "retired",
                actual: "still executing",
            });
        }

        for command_buffer in &self.command_buffers {
            command_buffer.reset()?;
        }
        Ok(())
    }
}

impl Drop for RhiCommandPoolNull {
    fn drop(&mut self) {
        for command_buffer in self.command_buffers.drain(..) {
            command_buffer.free();
        }
    }
}
