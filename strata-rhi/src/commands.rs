//! Command recording shared by every backend.
//!
//! A command buffer records `RhiCommand`s between `begin` and `end`. The list is frozen at `end`
//! and replayed in order against the device when the buffer is submitted. Recorded commands own
//! clones of every resource they reference, so a resource stays alive until the command buffer is
//! re-begun (or reset) after its submission retired.

use crate::types::*;
use crate::{RhiBuffer, RhiDescriptorSet, RhiError, RhiPipeline, RhiResult, RhiTexture};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Parameters for copying texture data into a buffer. Same shape as a buffer to texture copy.
pub type RhiCmdCopyTextureToBufferParams = RhiCmdCopyBufferToTextureParams;

/// A color attachment held by a recorded render pass
#[derive(Clone, Debug)]
pub struct RhiColorTarget {
    pub texture: RhiTexture,
    pub load_op: RhiLoadOp,
    pub store_op: RhiStoreOp,
    pub clear_value: RhiColorClearValue,
}

/// A depth/stencil attachment held by a recorded render pass
#[derive(Clone, Debug)]
pub struct RhiDepthStencilTarget {
    pub texture: RhiTexture,
    pub depth_load_op: RhiLoadOp,
    pub stencil_load_op: RhiLoadOp,
    pub depth_store_op: RhiStoreOp,
    pub stencil_store_op: RhiStoreOp,
    pub clear_value: RhiDepthStencilClearValue,
}

#[derive(Clone, Debug)]
pub struct RhiRecordedBufferBarrier {
    pub buffer: RhiBuffer,
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
}

#[derive(Clone, Debug)]
pub struct RhiRecordedTextureBarrier {
    pub texture: RhiTexture,
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
    pub array_slice: Option<u16>,
    pub mip_slice: Option<u8>,
}

/// One recorded GPU operation
#[derive(Clone, Debug)]
pub enum RhiCommand {
    BeginRenderPass {
        color_targets: Vec<RhiColorTarget>,
        depth_target: Option<RhiDepthStencilTarget>,
    },
    EndRenderPass,
    /// Clears every color attachment of the current render pass
    ClearColor(RhiColorClearValue),
    /// Clears the depth/stencil attachment of the current render pass
    ClearDepthStencil(RhiDepthStencilClearValue),
    BindPipeline(RhiPipeline),
    BindVertexBuffers {
        first_binding: u32,
        bindings: Vec<(RhiBuffer, u64)>,
    },
    BindIndexBuffer {
        buffer: RhiBuffer,
        byte_offset: u64,
        index_type: RhiIndexType,
    },
    BindDescriptorSet {
        set_index: u32,
        descriptor_set: RhiDescriptorSet,
    },
    PushConstants {
        offset: u32,
        data: Vec<u8>,
    },
    SetViewport(RhiViewport),
    SetScissor(RhiScissor),
    SetCullMode(RhiCullMode),
    SetDepthCompareOp(RhiCompareOp),
    SetBlendEnable(bool),
    SetBlendEquation(RhiBlendEquation),
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    DrawIndirect {
        buffer: RhiBuffer,
        byte_offset: u64,
        draw_count: u32,
    },
    DrawIndexedIndirect {
        buffer: RhiBuffer,
        byte_offset: u64,
        draw_count: u32,
    },
    Dispatch {
        group_count: [u32; 3],
    },
    DispatchIndirect {
        buffer: RhiBuffer,
        byte_offset: u64,
    },
    ResourceBarrier {
        buffer_barriers: Vec<RhiRecordedBufferBarrier>,
        texture_barriers: Vec<RhiRecordedTextureBarrier>,
    },
    CopyBufferToBuffer {
        src: RhiBuffer,
        dst: RhiBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    },
    CopyBufferToTexture {
        src: RhiBuffer,
        dst: RhiTexture,
        params: RhiCmdCopyBufferToTextureParams,
    },
    CopyTextureToBuffer {
        src: RhiTexture,
        dst: RhiBuffer,
        params: RhiCmdCopyTextureToBufferParams,
    },
    UpdateBuffer {
        buffer: RhiBuffer,
        offset: u64,
        data: Vec<u8>,
    },
    Blit {
        src: RhiTexture,
        dst: RhiTexture,
        params: RhiCmdBlitParams,
    },
    /// The frozen command lists of secondary command buffers, inlined on replay
    ExecuteCommandBuffers(Vec<Arc<Vec<RhiCommand>>>),
}

impl RhiCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RhiCommand::BeginRenderPass { .. } => "BeginRenderPass",
            RhiCommand::EndRenderPass => "EndRenderPass",
            RhiCommand::ClearColor(_) => "ClearColor",
            RhiCommand::ClearDepthStencil(_) => "ClearDepthStencil",
            RhiCommand::BindPipeline(_) => "BindPipeline",
            RhiCommand::BindVertexBuffers { .. } => "BindVertexBuffers",
            RhiCommand::BindIndexBuffer { .. } => "BindIndexBuffer",
            RhiCommand::BindDescriptorSet { .. } => "BindDescriptorSet",
            RhiCommand::PushConstants { .. } => "PushConstants",
            RhiCommand::SetViewport(_) => "SetViewport",
            RhiCommand::SetScissor(_) => "SetScissor",
            RhiCommand::SetCullMode(_) => "SetCullMode",
            RhiCommand::SetDepthCompareOp(_) => "SetDepthCompareOp",
            RhiCommand::SetBlendEnable(_) => "SetBlendEnable",
            RhiCommand::SetBlendEquation(_) => "SetBlendEquation",
            RhiCommand::Draw { .. } => "Draw",
            RhiCommand::DrawIndexed { .. } => "DrawIndexed",
            RhiCommand::DrawIndirect { .. } => "DrawIndirect",
            RhiCommand::DrawIndexedIndirect { .. } => "DrawIndexedIndirect",
            RhiCommand::Dispatch { .. } => "Dispatch",
            RhiCommand::DispatchIndirect { .. } => "DispatchIndirect",
            RhiCommand::ResourceBarrier { .. } => "ResourceBarrier",
            RhiCommand::CopyBufferToBuffer { .. } => "CopyBufferToBuffer",
            RhiCommand::CopyBufferToTexture { .. } => "CopyBufferToTexture",
            RhiCommand::CopyTextureToBuffer { .. } => "CopyTextureToBuffer",
            RhiCommand::UpdateBuffer { .. } => "UpdateBuffer",
            RhiCommand::Blit { .. } => "Blit",
            RhiCommand::ExecuteCommandBuffers(_) => "ExecuteCommandBuffers",
        }
    }
}

/// Where a command buffer is in its lifecycle.
///
/// Invalid -allocate-> Closed -begin-> Opened -end-> Pending -submit/reset-> Closed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RhiCommandBufferState {
    /// Freed, or never allocated
    Invalid,
    /// Ready to begin. May still be executing a previous submission.
    Closed,
    /// Recording
    Opened,
    /// Recorded and waiting to be submitted
    Pending,
}

impl RhiCommandBufferState {
    pub fn name(self) -> &'static str {
        match self {
            RhiCommandBufferState::Invalid => "Invalid",
            RhiCommandBufferState::Closed => "Closed",
            RhiCommandBufferState::Opened => "Opened",
            RhiCommandBufferState::Pending => "Pending",
        }
    }
}

/// Retires when the GPU finished the submission it was handed out for. The backend retires it
/// once the submission's fence has been observed signaled, or the queue went idle.
#[derive(Clone, Debug, Default)]
pub struct RhiSubmissionToken(Arc<AtomicBool>);

impl RhiSubmissionToken {
    pub fn is_retired(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn retire(&self) {
        self.0.store(true, Ordering::Release)
    }
}

/// A frozen command list, ready to hand to a queue
pub struct RhiSubmission {
    pub commands: Arc<Vec<RhiCommand>>,
    pub token: RhiSubmissionToken,
    /// Changes every time the command buffer is re-begun. Lets a backend skip re-encoding a
    /// list it already encoded.
    pub recording_id: u64,
}

struct RecorderState {
    state: RhiCommandBufferState,
    begin_flags: RhiCommandBufferBeginFlags,
    inheritance: Option<RhiCommandBufferInheritance>,
    commands: Vec<RhiCommand>,
    recorded: Option<Arc<Vec<RhiCommand>>>,
    recording_id: u64,
    render_pass_open: bool,
    bound_pipeline: Option<RhiPipeline>,
    in_flight: Vec<RhiSubmissionToken>,
    submit_count: u32,
}

static NEXT_RECORDING_ID: AtomicU64 = AtomicU64::new(1);

/// The recording state machine and command list behind every `RhiCommandBuffer`
pub struct RhiCommandRecorder {
    is_secondary: bool,
    state: Mutex<RecorderState>,
}

impl std::fmt::Debug for RhiCommandRecorder {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RhiCommandRecorder")
            .field("is_secondary", &self.is_secondary)
            .field("state", &state.state)
            .field("command_count", &state.commands.len())
            .finish()
    }
}

fn wrong_state(
    expected: RhiCommandBufferState,
    actual: RhiCommandBufferState,
) -> RhiError {
    RhiError::InvalidCommandBufferState {
        expected: expected.name(),
        actual: actual.name(),
    }
}

impl RhiCommandRecorder {
    /// A newly allocated command buffer is Closed
    pub fn new(is_secondary: bool) -> Self {
        RhiCommandRecorder {
            is_secondary,
            state: Mutex::new(RecorderState {
                state: RhiCommandBufferState::Closed,
                begin_flags: RhiCommandBufferBeginFlags::NONE,
                inheritance: None,
                commands: Vec::default(),
                recorded: None,
                recording_id: 0,
                render_pass_open: false,
                bound_pipeline: None,
                in_flight: Vec::default(),
                submit_count: 0,
            }),
        }
    }

    pub fn is_secondary(&self) -> bool {
        self.is_secondary
    }

    pub fn state(&self) -> RhiCommandBufferState {
        self.state.lock().state
    }

    /// True while a submission of this command buffer has not retired
    pub fn is_in_flight(&self) -> bool {
        let mut state = self.state.lock();
        state.in_flight.retain(|token| !token.is_retired());
        !state.in_flight.is_empty()
    }

    /// Closed -> Opened. Drops the previous recording, which releases the resources it retained.
    pub fn begin(
        &self,
        flags: RhiCommandBufferBeginFlags,
        inheritance: Option<RhiCommandBufferInheritance>,
    ) -> RhiResult<()> {
        if flags.contains(RhiCommandBufferBeginFlags::RENDER_PASS_CONTINUE) && !self.is_secondary {
            return Err("RENDER_PASS_CONTINUE is only valid for secondary command buffers")?;
        }

        if inheritance.is_some() && !self.is_secondary {
            return Err("only secondary command buffers carry inheritance info")?;
        }

        let mut state = self.state.lock();
        if state.state != RhiCommandBufferState::Closed {
            return Err(wrong_state(RhiCommandBufferState::Closed, state.state));
        }

        state.in_flight.retain(|token| !token.is_retired());
        if !state.in_flight.is_empty() {
            log::error!("Command buffer re-begun while its previous submission is still executing");
            return Err(RhiError::InvalidCommandBufferState {
                expected: "Closed and retired",
                actual: "Closed and still executing",
            });
        }

        state.commands.clear();
        state.recorded = None;
        state.begin_flags = flags;
        state.inheritance = inheritance;
        state.render_pass_open = false;
        state.bound_pipeline = None;
        state.submit_count = 0;
        state.recording_id = NEXT_RECORDING_ID.fetch_add(1, Ordering::Relaxed);
        state.state = RhiCommandBufferState::Opened;
        Ok(())
    }

    /// Opened -> Pending. A render pass left open is not an error here, it is reported when the
    /// buffer is submitted.
    pub fn end(&self) -> RhiResult<()> {
        let mut state = self.state.lock();
        if state.state != RhiCommandBufferState::Opened {
            return Err(wrong_state(RhiCommandBufferState::Opened, state.state));
        }

        let commands = std::mem::take(&mut state.commands);
        log::trace!("Command buffer ended with {} commands", commands.len());
        state.recorded = Some(Arc::new(commands));
        state.bound_pipeline = None;
        state.state = RhiCommandBufferState::Pending;
        Ok(())
    }

    /// Back to Closed from any recording state. Not allowed while a submission is executing.
    pub fn reset(&self) -> RhiResult<()> {
        let mut state = self.state.lock();
        if state.state == RhiCommandBufferState::Invalid {
            return Err(wrong_state(RhiCommandBufferState::Closed, state.state));
        }

        state.in_flight.retain(|token| !token.is_retired());
        if !state.in_flight.is_empty() {
            return Err(RhiError::InvalidCommandBufferState {
                expected: "retired",
                actual: "still executing",
            });
        }

        state.commands.clear();
        state.recorded = None;
        state.render_pass_open = false;
        state.bound_pipeline = None;
        state.state = RhiCommandBufferState::Closed;
        Ok(())
    }

    /// Any state -> Invalid
    pub fn free(&self) {
        let mut state = self.state.lock();
        state.commands.clear();
        state.recorded = None;
        state.bound_pipeline = None;
        state.state = RhiCommandBufferState::Invalid;
    }

    /// Checks the buffer may be submitted, without changing anything. A queue checks every
    /// buffer of a submit before committing any of them.
    pub fn check_submittable(&self) -> RhiResult<()> {
        if self.is_secondary {
            return Err("secondary command buffers are executed by a primary, not submitted")?;
        }

        let mut state = self.state.lock();
        if state.render_pass_open {
            log::error!("Submitting a command buffer with a render pass that was never ended");
            return Err(RhiError::OpenRenderPassAtSubmit);
        }

        match state.state {
            RhiCommandBufferState::Pending => Ok(()),
            RhiCommandBufferState::Closed
                if state.recorded.is_some()
                    && !state
                        .begin_flags
                        .contains(RhiCommandBufferBeginFlags::ONE_TIME_SUBMIT) =>
            {
                state.in_flight.retain(|token| !token.is_retired());
                if !state.in_flight.is_empty()
                    && !state
                        .begin_flags
                        .contains(RhiCommandBufferBeginFlags::SIMULTANEOUS_USE)
                {
                    return Err(RhiError::InvalidCommandBufferState {
                        expected: "retired or SIMULTANEOUS_USE",
                        actual: "still executing",
                    });
                }
                Ok(())
            }
            other => Err(wrong_state(RhiCommandBufferState::Pending, other)),
        }
    }

    /// Pending -> Closed. Hands the frozen command list to the queue along with a token the
    /// backend retires when the GPU finishes with it.
    pub fn take_submission(&self) -> RhiResult<RhiSubmission> {
        self.check_submittable()?;

        let mut state = self.state.lock();
        let commands = match &state.recorded {
            Some(commands) => commands.clone(),
            None => return Err(wrong_state(RhiCommandBufferState::Pending, state.state)),
        };

        let token = RhiSubmissionToken::default();
        state.in_flight.push(token.clone());
        state.submit_count += 1;
        state.state = RhiCommandBufferState::Closed;
        Ok(RhiSubmission {
            commands,
            token,
            recording_id: state.recording_id,
        })
    }

    /// Pending -> Closed, for a secondary buffer being executed by a primary. The primary keeps
    /// the command list (and everything it references) alive.
    // Checks the buffer can be executed and returns its list without changing its state
    fn peek_for_execute(&self) -> RhiResult<Arc<Vec<RhiCommand>>> {
        if !self.is_secondary {
            return Err("only secondary command buffers can be executed by another buffer")?;
        }

        let state = self.state.lock();
        if state.state != RhiCommandBufferState::Pending {
            return Err(wrong_state(RhiCommandBufferState::Pending, state.state));
        }

        if state.render_pass_open {
            return Err(RhiError::OpenRenderPassAtSubmit);
        }

        state
            .recorded
            .clone()
            .ok_or_else(|| wrong_state(RhiCommandBufferState::Pending, state.state))
    }

    fn mark_executed(&self) {
        self.state.lock().state = RhiCommandBufferState::Closed;
    }

    /// The most recent frozen command list, if the buffer has ended since it was last begun
    pub fn recorded_commands(&self) -> Option<Arc<Vec<RhiCommand>>> {
        self.state.lock().recorded.clone()
    }

    /// Append a command after checking it is legal in the current recording state
    pub fn record(
        &self,
        command: RhiCommand,
    ) -> RhiResult<()> {
        let mut state = self.state.lock();
        if state.state != RhiCommandBufferState::Opened {
            log::error!(
                "Recording {} into a command buffer that is {}",
                command.name(),
                state.state.name()
            );
            return Err(wrong_state(RhiCommandBufferState::Opened, state.state));
        }

        let in_render_pass = state.render_pass_open
            || state
                .begin_flags
                .contains(RhiCommandBufferBeginFlags::RENDER_PASS_CONTINUE);

        match &command {
            RhiCommand::BeginRenderPass {
                color_targets,
                depth_target,
            } => {
                if in_render_pass {
                    return Err("render passes cannot be nested")?;
                }
                if color_targets.is_empty() && depth_target.is_none() {
                    return Err("a render pass needs at least one attachment")?;
                }
                state.render_pass_open = true;
            }
            RhiCommand::EndRenderPass => {
                if !state.render_pass_open {
                    return Err("EndRenderPass without a matching BeginRenderPass")?;
                }
                state.render_pass_open = false;
            }
            RhiCommand::ClearColor(_) | RhiCommand::ClearDepthStencil(_) => {
                if !in_render_pass {
                    return Err(format!("{} is only valid inside a render pass", command.name()))?;
                }
            }
            RhiCommand::BindPipeline(pipeline) => {
                state.bound_pipeline = Some(pipeline.clone());
            }
            RhiCommand::BindVertexBuffers { bindings, .. } => {
                for (buffer, _) in bindings {
                    if !buffer
                        .buffer_def()
                        .resource_type
                        .contains(RhiResourceType::VERTEX_BUFFER)
                    {
                        return Err("buffer bound as vertex buffer lacks VERTEX_BUFFER usage")?;
                    }
                }
            }
            RhiCommand::BindIndexBuffer { buffer, .. } => {
                if !buffer
                    .buffer_def()
                    .resource_type
                    .contains(RhiResourceType::INDEX_BUFFER)
                {
                    return Err("buffer bound as index buffer lacks INDEX_BUFFER usage")?;
                }
            }
            RhiCommand::BindDescriptorSet { set_index, .. } => {
                let pipeline = state
                    .bound_pipeline
                    .as_ref()
                    .ok_or("BindDescriptorSet needs a bound pipeline")?;
                if pipeline.binding_layout().set(*set_index).is_none() {
                    return Err(format!(
                        "bound pipeline has no descriptor set {}",
                        set_index
                    ))?;
                }
            }
            RhiCommand::PushConstants { offset, data } => {
                let pipeline = state
                    .bound_pipeline
                    .as_ref()
                    .ok_or("PushConstants needs a bound pipeline")?;
                let available = pipeline.binding_layout().push_constant_size();
                if *offset as u64 + data.len() as u64 > available as u64 {
                    return Err(format!(
                        "push constants [{}, {}) exceed the {} bytes the pipeline declares",
                        offset,
                        *offset as usize + data.len(),
                        available
                    ))?;
                }
            }
            RhiCommand::Draw { .. }
            | RhiCommand::DrawIndexed { .. }
            | RhiCommand::DrawIndirect { .. }
            | RhiCommand::DrawIndexedIndirect { .. } => {
                if !in_render_pass {
                    return Err(format!("{} is only valid inside a render pass", command.name()))?;
                }
                match &state.bound_pipeline {
                    Some(pipeline) if pipeline.pipeline_type() == RhiPipelineType::Graphics => {}
                    _ => {
                        return Err(format!("{} needs a bound graphics pipeline", command.name()))?
                    }
                }
            }
            RhiCommand::Dispatch { .. } | RhiCommand::DispatchIndirect { .. } => {
                if in_render_pass {
                    return Err(format!("{} is not valid inside a render pass", command.name()))?;
                }
                match &state.bound_pipeline {
                    Some(pipeline) if pipeline.pipeline_type() == RhiPipelineType::Compute => {}
                    _ => {
                        return Err(format!("{} needs a bound compute pipeline", command.name()))?
                    }
                }
            }
            RhiCommand::ResourceBarrier { .. }
            | RhiCommand::CopyBufferToBuffer { .. }
            | RhiCommand::CopyBufferToTexture { .. }
            | RhiCommand::CopyTextureToBuffer { .. }
            | RhiCommand::UpdateBuffer { .. }
            | RhiCommand::Blit { .. } => {
                if in_render_pass {
                    return Err(format!("{} is not valid inside a render pass", command.name()))?;
                }
            }
            RhiCommand::ExecuteCommandBuffers(_) => {
                if self.is_secondary {
                    return Err("secondary command buffers cannot execute other buffers")?;
                }
            }
            RhiCommand::SetViewport(_)
            | RhiCommand::SetScissor(_)
            | RhiCommand::SetCullMode(_)
            | RhiCommand::SetDepthCompareOp(_)
            | RhiCommand::SetBlendEnable(_)
            | RhiCommand::SetBlendEquation(_) => {}
        }

        state.commands.push(command);
        Ok(())
    }

    /// Inline the command lists of secondary buffers. Each secondary moves to Closed, but only once
    /// the execute has been recorded. A failed call leaves every buffer as it was.
    pub fn record_execute(
        &self,
        secondaries: &[&RhiCommandRecorder],
    ) -> RhiResult<()> {
        {
            let state = self.state.lock();
            if state.state != RhiCommandBufferState::Opened {
                return Err(wrong_state(RhiCommandBufferState::Opened, state.state));
            }
        }
        if self.is_secondary {
            return Err("secondary command buffers cannot execute other buffers")?;
        }

        let mut lists = Vec::with_capacity(secondaries.len());
        for (index, secondary) in secondaries.iter().enumerate() {
            if std::ptr::eq(*secondary, self) {
                return Err("a command buffer cannot execute itself")?;
            }
            if secondaries[..index].iter().any(|x| std::ptr::eq(*x, *secondary)) {
                return Err("a secondary command buffer can only be executed once per call")?;
            }
            lists.push(secondary.peek_for_execute()?);
        }

        self.record(RhiCommand::ExecuteCommandBuffers(lists))?;
        for secondary in secondaries {
            secondary.mark_executed();
        }
        Ok(())
    }
}

impl Drop for RhiCommandRecorder {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.in_flight.retain(|token| !token.is_retired());
        if !state.in_flight.is_empty() {
            log::warn!("Command buffer dropped while a submission of it is still executing");
        }
    }
}
