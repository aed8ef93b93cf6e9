use super::internal::VkCommandEncoder;
use super::RhiDeviceContextVulkan;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Records like every other backend. Primary buffers own a native command buffer that the
/// recorded list is encoded into when it is submitted.
pub struct RhiCommandBufferVulkan {
    device_context: RhiDeviceContextVulkan,
    recorder: Arc<RhiCommandRecorder>,
    // None for secondary buffers, their commands are inlined into the primary that executes them
    command_buffer: Option<vk::CommandBuffer>,
    // 0 means nothing encoded yet, recording ids start at 1
    encoded_recording_id: AtomicU64,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiCommandBufferVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiCommandBufferVulkan")
            .field("command_buffer", &self.command_buffer)
            .field("recorder", &self.recorder)
            .finish()
    }
}

impl RhiCommandBufferVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        recorder: Arc<RhiCommandRecorder>,
        command_buffer: Option<vk::CommandBuffer>,
    ) -> Self {
        RhiCommandBufferVulkan {
            device_context: device_context.clone(),
            recorder,
            command_buffer,
            encoded_recording_id: AtomicU64::new(0),
            _count_guard: device_context
                .counters()
                .track(RhiObjectKind::CommandBuffer),
        }
    }

    pub fn recorder(&self) -> &RhiCommandRecorder {
        &self.recorder
    }

    pub(super) fn recorder_arc(&self) -> &Arc<RhiCommandRecorder> {
        &self.recorder
    }

    pub fn vk_command_buffer(&self) -> Option<vk::CommandBuffer> {
        self.command_buffer
    }

    /// Make the native command buffer hold `submission`'s commands. A list that is already
    /// encoded is left alone, so resubmitting without re-recording costs nothing.
    pub(super) fn encode(
        &self,
        submission: &RhiSubmission,
        queue_type: RhiQueueType,
    ) -> RhiResult<vk::CommandBuffer> {
        let command_buffer = self
            .command_buffer
            .ok_or("secondary command buffers cannot be submitted")?;

        if self.encoded_recording_id.load(Ordering::Acquire) == submission.recording_id {
            return Ok(command_buffer);
        }

        let device = self.device_context.device();
        // Forget the old encoding first, a failure below must not leave it marked valid
        self.encoded_recording_id.store(0, Ordering::Release);
        unsafe {
            device.reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())?;

            // Resubmitting while a previous submission still runs is allowed by the recorder
            // for SIMULTANEOUS_USE buffers
            let begin_info = vk::CommandBufferBeginInfo::builder()
                .flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);
            device.begin_command_buffer(command_buffer, &begin_info)?;
        }

        let mut encoder = VkCommandEncoder::new(device, command_buffer, queue_type);
        let encode_result = encoder.encode(&submission.commands);

        unsafe {
            device.end_command_buffer(command_buffer)?;
        }
        encode_result?;

        log::trace!(
            "Encoded {} commands into {:?}",
            submission.commands.len(),
            command_buffer
        );
        self.encoded_recording_id
            .store(submission.recording_id, Ordering::Release);
        Ok(command_buffer)
    }
}
