use super::*;
use crate::*;
use ash::vk;
use std::sync::Arc;

#[derive(Debug)]
struct RhiQueueVulkanInner {
    device_context: RhiDeviceContextVulkan,
    queue_id: u32,
    queue_type: RhiQueueType,
}

/// Every queue type submits to the device's graphics queue. Submissions from all `RhiQueueVulkan`
/// instances are serialized on the native queue's lock.
#[derive(Clone, Debug)]
pub struct RhiQueueVulkan {
    inner: Arc<RhiQueueVulkanInner>,
}

impl RhiQueueVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        queue_type: RhiQueueType,
    ) -> RhiResult<Self> {
        let queue_id = device_context.next_queue_id();
        log::trace!(
            "Created {:?} queue {} on family {}",
            queue_type,
            queue_id,
            device_context.queue_family_indices().graphics
        );
        Ok(RhiQueueVulkan {
            inner: Arc::new(RhiQueueVulkanInner {
                device_context: device_context.clone(),
                queue_id,
                queue_type,
            }),
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextVulkan {
        &self.inner.device_context
    }

    pub fn queue_id(&self) -> u32 {
        self.inner.queue_id
    }

    pub fn queue_type(&self) -> RhiQueueType {
        self.inner.queue_type
    }

    pub fn create_command_pool(
        &self,
        command_pool_def: &RhiCommandPoolDef,
    ) -> RhiResult<RhiCommandPoolVulkan> {
        RhiCommandPoolVulkan::new(self, command_pool_def)
    }

    pub fn submit(
        &self,
        command_buffers: &[&RhiCommandBufferVulkan],
        wait_semaphores: &[&RhiSemaphoreVulkan],
        signal_semaphores: &[&RhiSemaphoreVulkan],
        signal_fence: Option<&RhiFenceVulkan>,
    ) -> RhiResult<()> {
        let device_context = &self.inner.device_context;

        // Check everything before committing anything
        for command_buffer in command_buffers {
            command_buffer.recorder().check_submittable()?;
        }

        if let Some(signal_fence) = signal_fence {
            signal_fence.check_submittable()?;
        }

        let mut submissions = Vec::with_capacity(command_buffers.len());
        for command_buffer in command_buffers {
            match command_buffer.recorder().take_submission() {
                Ok(submission) => submissions.push(submission),
                Err(e) => {
                    for submission in &submissions {
                        submission.token.retire();
                    }
                    return Err(e);
                }
            }
        }
        let tokens: Vec<_> = submissions.iter().map(|x| x.token.clone()).collect();
        let retire_all = |e: RhiError| {
            for token in &tokens {
                token.retire();
            }
            e
        };

        let mut vk_command_buffers = Vec::with_capacity(command_buffers.len());
        for (command_buffer, submission) in command_buffers.iter().zip(&submissions) {
            let vk_command_buffer = command_buffer
                .encode(submission, self.inner.queue_type)
                .map_err(retire_all)?;
            vk_command_buffers.push(vk_command_buffer);
        }

        // Waiting on a semaphore nothing signals would hang the queue
        let mut vk_wait_semaphores = Vec::with_capacity(wait_semaphores.len());
        let mut wait_dst_stage_mask = Vec::with_capacity(wait_semaphores.len());
        for semaphore in wait_semaphores {
            if semaphore.signal_available() {
                vk_wait_semaphores.push(semaphore.vk_semaphore());
                wait_dst_stage_mask.push(vk::PipelineStageFlags::ALL_COMMANDS);
            }
        }

        let vk_signal_semaphores: Vec<_> = signal_semaphores
            .iter()
            .map(|x| x.vk_semaphore())
            .collect();

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&vk_wait_semaphores)
            .wait_dst_stage_mask(&wait_dst_stage_mask)
            .signal_semaphores(&vk_signal_semaphores)
            .command_buffers(&vk_command_buffers);

        let fence = signal_fence
            .map(|x| x.vk_fence())
            .unwrap_or_else(vk::Fence::null);

        let result = {
            let queue = device_context.graphics_queue().lock();
            unsafe {
                device_context
                    .device()
                    .queue_submit(*queue, &[*submit_info], fence)
            }
        };

        match result {
            Ok(()) => {}
            Err(vk::Result::ERROR_DEVICE_LOST) => {
                return Err(retire_all(RhiError::DeviceLost(
                    "lost during queue submit".to_string(),
                )))
            }
            Err(e) => return Err(retire_all(e.into())),
        }

        for semaphore in wait_semaphores {
            semaphore.set_signal_available(false);
        }

        for semaphore in signal_semaphores {
            semaphore.set_signal_available(true);
        }

        match signal_fence {
            Some(signal_fence) => signal_fence.mark_submitted(tokens),
            None => {
                for token in tokens {
                    device_context.track_in_flight(token);
                }
            }
        }

        Ok(())
    }

    pub fn present(
        &self,
        swapchain: &RhiSwapchainVulkan,
        wait_semaphores: &[&RhiSemaphoreVulkan],
        image_index: u32,
    ) -> RhiResult<RhiPresentSuccessResult> {
        let device_context = &self.inner.device_context;

        let mut vk_wait_semaphores = Vec::with_capacity(wait_semaphores.len());
        for semaphore in wait_semaphores {
            if semaphore.signal_available() {
                vk_wait_semaphores.push(semaphore.vk_semaphore());
                semaphore.set_signal_available(false);
            }
        }

        let swapchains = [swapchain.vk_swapchain()];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&vk_wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = {
            let queue = device_context.present_queue().lock();
            unsafe {
                device_context
                    .swapchain_loader()?
                    .queue_present(*queue, &present_info)
            }
        };

        match result {
            Ok(false) => Ok(RhiPresentSuccessResult::Success),
            Ok(true) => Ok(RhiPresentSuccessResult::SuccessSuboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                swapchain.invalidate();
                Ok(RhiPresentSuccessResult::OutOfDate)
            }
            Err(vk::Result::ERROR_DEVICE_LOST) => {
                Err(RhiError::DeviceLost("lost during present".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn wait_for_queue_idle(&self) -> RhiResult<()> {
        let device_context = &self.inner.device_context;
        {
            let queue = device_context.graphics_queue().lock();
            unsafe {
                device_context.device().queue_wait_idle(*queue)?;
            }
        }
        device_context.retire_all_in_flight();
        Ok(())
    }
}
