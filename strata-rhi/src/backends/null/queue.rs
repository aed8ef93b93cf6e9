use super::*;
use crate::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct RhiQueueNullInner {
    device_context: RhiDeviceContextNull,
    queue_id: u32,
    queue_type: RhiQueueType,
    submit_lock: Mutex<()>,
}

/// Every queue feeds the device's single in-order timeline
#[derive(Clone, Debug)]
pub struct RhiQueueNull {
    inner: Arc<RhiQueueNullInner>,
}

impl RhiQueueNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
        queue_type: RhiQueueType,
    ) -> RhiResult<Self> {
        let queue_id = device_context.next_queue_id();
        log::trace!("Created {:?} queue {}", queue_type, queue_id);
        Ok(RhiQueueNull {
            inner: Arc::new(RhiQueueNullInner {
                device_context: device_context.clone(),
                queue_id,
                queue_type,
                submit_lock: Mutex::new(()),
            }),
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextNull {
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
    ) -> RhiResult<RhiCommandPoolNull> {
        RhiCommandPoolNull::new(self, command_pool_def)
    }

    pub fn submit(
        &self,
        command_buffers: &[&RhiCommandBufferNull],
        wait_semaphores: &[&RhiSemaphoreNull],
        signal_semaphores: &[&RhiSemaphoreNull],
        signal_fence: Option<&RhiFenceNull>,
    ) -> RhiResult<()> {
        let _submit_lock = self.inner.submit_lock.lock();
        let device_context = &self.inner.device_context;
        device_context.check_device_lost()?;

        // Check everything before committing anything
        for command_buffer in command_buffers {
            command_buffer.recorder().check_submittable()?;
        }

        for semaphore in signal_semaphores {
            semaphore.check_signalable()?;
        }

        if let Some(signal_fence) = signal_fence {
            signal_fence.check_submittable()?;
        }

        for semaphore in wait_semaphores {
            if !semaphore.consume() {
                return Err(device_context.mark_device_lost(
                    "submission waits on a semaphore that nothing will signal".to_string(),
                ));
            }
        }

        let command_lists = command_buffers
            .iter()
            .map(|x| x.recorder().take_submission())
            .collect::<RhiResult<Vec<_>>>()?;

        for semaphore in signal_semaphores {
            semaphore.signal()?;
        }

        device_context.enqueue(
            self.inner.queue_type,
            command_lists,
            signal_fence.map(|x| x.signal()),
        );
        Ok(())
    }

    /// The image is shown once everything queued before it has executed
    pub fn present(
        &self,
        swapchain: &RhiSwapchainNull,
        wait_semaphores: &[&RhiSemaphoreNull],
        image_index: u32,
    ) -> RhiResult<RhiPresentSuccessResult> {
        let _submit_lock = self.inner.submit_lock.lock();
        let device_context = &self.inner.device_context;
        device_context.check_device_lost()?;

        for semaphore in wait_semaphores {
            if !semaphore.consume() {
                return Err(device_context.mark_device_lost(
                    "present waits on a semaphore that nothing will signal".to_string(),
                ));
            }
        }

        device_context.execute_all()?;
        let result = swapchain.present(image_index)?;
        device_context.record_present();
        Ok(result)
    }

    pub fn wait_for_queue_idle(&self) -> RhiResult<()> {
        self.inner.device_context.execute_all()
    }
}
