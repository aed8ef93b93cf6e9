use super::executor::{NullExecutionSummary, NullExecutor};
use super::*;
use crate::device_context::RhiObjectCounters;
use crate::sampler::RhiSamplerCache;
use crate::*;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// One queue submission waiting on the timeline
pub(super) struct NullPendingSubmission {
    pub(super) id: u64,
    pub(super) queue_type: RhiQueueType,
    pub(super) command_lists: Vec<RhiSubmission>,
    pub(super) signal_fence: Option<NullFenceSignal>,
}

#[derive(Default)]
struct NullTimeline {
    next_submission_id: u64,
    pending: VecDeque<NullPendingSubmission>,
}

struct RhiDeviceContextNullInner {
    api_def: RhiApiDef,
    device_info: RhiDeviceInfo,
    counters: Arc<RhiObjectCounters>,
    sampler_cache: RhiSamplerCache,
    timeline: Mutex<NullTimeline>,
    stats: Mutex<RhiNullDeviceStats>,
    device_lost: AtomicBool,
    next_queue_id: AtomicU32,
}

/// The headless device. Cheap to clone, every clone refers to the same timeline.
#[derive(Clone)]
pub struct RhiDeviceContextNull {
    inner: Arc<RhiDeviceContextNullInner>,
}

impl std::fmt::Debug for RhiDeviceContextNull {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDeviceContextNull")
            .field("pending_submissions", &self.pending_submission_count())
            .field("device_lost", &self.is_device_lost())
            .finish()
    }
}

impl RhiDeviceContextNull {
    pub(super) fn new(api_def: &RhiApiDef) -> RhiResult<Self> {
        let device_info = RhiDeviceInfo {
            adapter_name: "strata headless device".to_string(),
            vendor_id: 0,
            is_discrete_gpu: false,
            min_uniform_buffer_offset_alignment: 256,
            min_storage_buffer_offset_alignment: 64,
            upload_buffer_texture_alignment: 16,
            upload_buffer_texture_row_alignment: 1,
            max_vertex_attribute_count: 16,
            max_push_constant_size: 128,
            supports_extended_dynamic_state: true,
            supports_dynamic_blend_state: true,
        };

        log::info!("Created headless device \"{}\"", device_info.adapter_name);

        Ok(RhiDeviceContextNull {
            inner: Arc::new(RhiDeviceContextNullInner {
                api_def: api_def.clone(),
                device_info,
                counters: Arc::new(RhiObjectCounters::default()),
                sampler_cache: RhiSamplerCache::default(),
                timeline: Mutex::new(NullTimeline::default()),
                stats: Mutex::new(RhiNullDeviceStats::default()),
                device_lost: AtomicBool::new(false),
                next_queue_id: AtomicU32::new(0),
            }),
        })
    }

    pub fn device_info(&self) -> &RhiDeviceInfo {
        &self.inner.device_info
    }

    pub fn api_def(&self) -> &RhiApiDef {
        &self.inner.api_def
    }

    pub fn object_counts(&self) -> RhiObjectCounts {
        self.inner.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> &Arc<RhiObjectCounters> {
        &self.inner.counters
    }

    pub(crate) fn sampler_cache(&self) -> &RhiSamplerCache {
        &self.inner.sampler_cache
    }

    /// What the timeline has executed so far
    pub fn stats(&self) -> RhiNullDeviceStats {
        self.inner.stats.lock().clone()
    }

    /// The most recent draw the timeline executed, with the state it was issued with
    pub fn last_draw(&self) -> Option<RhiNullDrawRecord> {
        self.inner.stats.lock().last_draw.clone()
    }

    /// Submissions queued and not yet executed
    pub fn pending_submission_count(&self) -> usize {
        self.inner.timeline.lock().pending.len()
    }

    pub fn is_device_lost(&self) -> bool {
        self.inner.device_lost.load(Ordering::Acquire)
    }

    pub(super) fn check_device_lost(&self) -> RhiResult<()> {
        if self.is_device_lost() {
            return Err(RhiError::DeviceLost(
                "the device was lost by an earlier submission".to_string(),
            ));
        }
        Ok(())
    }

    /// Flag the device lost and build the error to return
    pub(super) fn mark_device_lost(
        &self,
        reason: String,
    ) -> RhiError {
        log::error!("Device lost: {}", reason);
        self.inner.device_lost.store(true, Ordering::Release);
        RhiError::DeviceLost(reason)
    }

    pub(super) fn next_queue_id(&self) -> u32 {
        self.inner.next_queue_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Queue a submission at the end of the timeline. Returns its id, which fences wait on.
    pub(super) fn enqueue(
        &self,
        queue_type: RhiQueueType,
        command_lists: Vec<RhiSubmission>,
        signal_fence: Option<NullFenceSignal>,
    ) -> u64 {
        let mut timeline = self.inner.timeline.lock();
        timeline.next_submission_id += 1;
        let id = timeline.next_submission_id;
        if let Some(signal_fence) = &signal_fence {
            *signal_fence.lock() = NullFenceState::Incomplete(id);
        }

        log::trace!(
            "Submission {} queued on {:?} with {} command buffers",
            id,
            queue_type,
            command_lists.len()
        );

        timeline.pending.push_back(NullPendingSubmission {
            id,
            queue_type,
            command_lists,
            signal_fence,
        });
        id
    }

    /// Execute every pending submission up to and including `submission_id`
    #[profiling::function]
    pub(super) fn execute_through(
        &self,
        submission_id: u64,
    ) -> RhiResult<()> {
        self.check_device_lost()?;

        let mut timeline = self.inner.timeline.lock();
        while timeline
            .pending
            .front()
            .map(|x| x.id <= submission_id)
            .unwrap_or(false)
        {
            if let Some(submission) = timeline.pending.pop_front() {
                self.execute_submission(submission)?;
            }
        }

        Ok(())
    }

    /// Execute everything on the timeline
    pub(super) fn execute_all(&self) -> RhiResult<()> {
        self.execute_through(u64::MAX)
    }

    fn execute_submission(
        &self,
        submission: NullPendingSubmission,
    ) -> RhiResult<()> {
        log::trace!(
            "Executing submission {} on {:?}",
            submission.id,
            submission.queue_type
        );

        let mut summary = NullExecutionSummary::default();
        let mut result = Ok(());
        for command_list in &submission.command_lists {
            let mut executor = NullExecutor::new(self.device_info());
            result = executor.execute(&command_list.commands);
            summary.merge(executor.finish());
            if result.is_err() {
                break;
            }
        }

        // Nothing in this submission runs again either way
        for command_list in &submission.command_lists {
            command_list.token.retire();
        }

        {
            let mut stats = self.inner.stats.lock();
            stats.submissions += 1;
            stats.command_buffers_executed += submission.command_lists.len() as u64;
            summary.apply_to(&mut stats);
        }

        if let Err(e) = result {
            return Err(self.mark_device_lost(format!(
                "submission {} failed to execute: {}",
                submission.id, e
            )));
        }

        if let Some(signal_fence) = &submission.signal_fence {
            *signal_fence.lock() = NullFenceState::Complete;
        }

        Ok(())
    }

    pub(super) fn record_present(&self) {
        self.inner.stats.lock().presents += 1;
    }

    pub fn create_queue(
        &self,
        queue_type: RhiQueueType,
    ) -> RhiResult<RhiQueueNull> {
        RhiQueueNull::new(self, queue_type)
    }

    pub fn create_fence(&self) -> RhiResult<RhiFenceNull> {
        RhiFenceNull::new(self)
    }

    pub fn create_semaphore(&self) -> RhiResult<RhiSemaphoreNull> {
        RhiSemaphoreNull::new(self)
    }

    pub fn create_swapchain(
        &self,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<RhiSwapchainNull> {
        RhiSwapchainNull::new(self, swapchain_def)
    }

    pub fn wait_for_fences(
        &self,
        fences: &[&RhiFenceNull],
    ) -> RhiResult<()> {
        let last_submission = fences.iter().filter_map(|x| x.submission_id()).max();
        if let Some(last_submission) = last_submission {
            self.execute_through(last_submission)?;
        }

        for fence in fences {
            fence.reset_after_wait();
        }

        Ok(())
    }

    pub fn wait_for_device_idle(&self) -> RhiResult<()> {
        self.execute_all()
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerNull> {
        RhiSamplerNull::new(self, sampler_def)
    }

    pub fn create_texture(
        &self,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureNull> {
        RhiTextureNull::new(self, texture_def)
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<RhiBufferNull> {
        RhiBufferNull::new(self, buffer_def)
    }

    pub fn create_shader(
        &self,
        program: RhiShaderProgram,
    ) -> RhiResult<RhiShaderNull> {
        RhiShaderNull::new(self, program)
    }

    pub fn create_graphics_pipeline(
        &self,
        graphics_pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<RhiPipelineNull> {
        RhiPipelineNull::new_graphics_pipeline(self, graphics_pipeline_def)
    }

    pub fn create_compute_pipeline(
        &self,
        compute_pipeline_def: &RhiComputePipelineDef,
    ) -> RhiResult<RhiPipelineNull> {
        RhiPipelineNull::new_compute_pipeline(self, compute_pipeline_def)
    }

    pub fn create_descriptor_pool(
        &self,
        descriptor_pool_def: &RhiDescriptorPoolDef,
    ) -> RhiResult<RhiDescriptorPoolNull> {
        RhiDescriptorPoolNull::new(self, descriptor_pool_def)
    }

    /// Clones of the device context that are alive, this one included
    pub(super) fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
