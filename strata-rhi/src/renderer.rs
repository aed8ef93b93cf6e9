use crate::extra::drop_sink::RhiResourceDropSink;
use crate::*;

/// Everything the renderer needs to bring up a device and a swapchain
#[derive(Clone, Debug)]
pub struct RhiRendererDef {
    pub api_def: RhiApiDef,
    /// The window to present into. The headless backend renders into offscreen images and accepts
    /// `None`.
    pub window_handles: Option<RhiWindowHandles>,
    pub width: u32,
    pub height: u32,
    /// Format of a depth target created alongside the swapchain, none if not set
    pub depth_format: Option<RhiFormat>,
    /// What every frame is cleared to before the first draw
    pub clear_color: RhiColorClearValue,
    pub clear_depth: f32,
}

impl RhiRendererDef {
    pub fn new(
        api_def: RhiApiDef,
        width: u32,
        height: u32,
    ) -> Self {
        RhiRendererDef {
            api_def,
            window_handles: None,
            width,
            height,
            depth_format: None,
            clear_color: RhiColorClearValue([0.0, 0.0, 0.0, 1.0]),
            clear_depth: 1.0,
        }
    }
}

/// Per in-flight frame sync objects and the command buffer recorded for that slot. The command
/// buffer is not begun again until the fence has been observed signaled.
pub struct RhiFrame {
    command_buffer: RhiCommandBuffer,
    acquire_semaphore: RhiSemaphore,
    submit_semaphore: RhiSemaphore,
    fence: RhiFence,
    swapchain_image: Option<RhiSwapchainImage>,
    // Fence was submitted and has not been waited on since
    fence_pending: bool,
}

impl RhiFrame {
    fn new(
        device_context: &RhiDeviceContext,
        command_pool: &mut RhiCommandPool,
    ) -> RhiResult<Self> {
        Ok(RhiFrame {
            command_buffer: command_pool.create_command_buffer(&RhiCommandBufferDef {
                is_secondary: false,
            })?,
            acquire_semaphore: device_context.create_semaphore()?,
            submit_semaphore: device_context.create_semaphore()?,
            fence: device_context.create_fence()?,
            swapchain_image: None,
            fence_pending: false,
        })
    }

    pub fn command_buffer(&self) -> &RhiCommandBuffer {
        &self.command_buffer
    }

    pub fn fence(&self) -> &RhiFence {
        &self.fence
    }

    /// The swapchain image this frame renders into, once `begin_frame` has acquired one
    pub fn swapchain_image(&self) -> Option<&RhiSwapchainImage> {
        self.swapchain_image.as_ref()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum RhiFramePhase {
    Idle,
    Recording,
    Submitted,
}

// Device objects the renderer owns. Dropped as a unit before the API is destroyed.
struct RhiRendererResources {
    device_context: RhiDeviceContext,
    graphics_queue: RhiQueue,
    swapchain: RhiSwapchain,
    command_pool: RhiCommandPool,
    descriptor_pool: RhiDescriptorPool,
    frames: Vec<RhiFrame>,
    depth_target: Option<RhiTexture>,
    drop_sink: RhiResourceDropSink<RhiRetiredResource>,
}

/// A resource released while frames that may use it are still in flight
#[derive(Debug)]
pub enum RhiRetiredResource {
    Buffer(RhiBuffer),
    Texture(RhiTexture),
    Pipeline(RhiPipeline),
    DescriptorSet(RhiDescriptorSet),
    Shader(RhiShader),
}

/// Owns a device, its swapchain and a ring of in-flight frames, and drives the
/// `begin_frame`/`end_frame`/`present` loop:
///
/// ```ignore
/// if renderer.begin_frame()? {
///     renderer.bind_pipeline(&pipeline)?;
///     renderer.bind_vertex_buffer(&vertex_buffer, 0)?;
///     renderer.bind_index_buffer(&index_buffer, RhiIndexType::Uint16)?;
///     renderer.draw_indexed(3, 0)?;
///     renderer.end_frame()?;
///     renderer.present()?;
/// }
/// ```
///
/// Recording calls go into the current frame's command buffer. A render pass over the acquired
/// swapchain image is opened on the first call that needs one and closed when the frame ends or
/// when a transfer has to be recorded outside of it.
pub struct RhiRenderer {
    // Declared before the API so an early drop releases them first
    resources: Option<RhiRendererResources>,
    api: Option<RhiApi>,
    window_handles: Option<RhiWindowHandles>,
    swapchain_def: RhiSwapchainDef,
    depth_format: Option<RhiFormat>,
    clear_color: RhiColorClearValue,
    clear_depth: f32,
    frame_index: usize,
    frame_phase: RhiFramePhase,
    render_pass_open: bool,
    // The first render pass of a frame clears, later ones load what is already there
    cleared_this_frame: bool,
    minimized: bool,
    // Set by resize, consumed by the next begin_frame
    pending_swapchain_def: Option<RhiSwapchainDef>,
}

impl RhiRenderer {
    /// Bring up the device named by the definition's api_def, a swapchain of the given size and
    /// one frame slot per buffered frame. Any failure here is fatal.
    ///
    /// # Safety
    ///
    /// The window handles, if any, must stay valid for the lifetime of the renderer.
    pub unsafe fn new(renderer_def: &RhiRendererDef) -> RhiResult<Self> {
        let api = RhiApi::new(renderer_def.window_handles.as_ref(), &renderer_def.api_def)
            .map_err(|e| {
                log::error!("Failed to create the device: {}", e);
                e
            })?;

        let swapchain_def = RhiSwapchainDef {
            width: renderer_def.width,
            height: renderer_def.height,
            enable_vsync: renderer_def.api_def.enable_vsync,
            image_count: renderer_def.api_def.buffering.frame_count() as u32,
        };

        let resources = Self::create_resources(
            &api,
            renderer_def.window_handles.as_ref(),
            &swapchain_def,
            renderer_def.depth_format,
        )
        .map_err(|e| {
            log::error!("Failed to create renderer resources: {}", e);
            e
        })?;

        log::info!(
            "Renderer created: {}x{}, {} frames in flight, {:?} swapchain images",
            swapchain_def.width,
            swapchain_def.height,
            resources.frames.len(),
            resources.swapchain.image_count()
        );

        Ok(RhiRenderer {
            resources: Some(resources),
            api: Some(api),
            window_handles: renderer_def.window_handles,
            swapchain_def,
            depth_format: renderer_def.depth_format,
            clear_color: renderer_def.clear_color,
            clear_depth: renderer_def.clear_depth,
            frame_index: 0,
            frame_phase: RhiFramePhase::Idle,
            render_pass_open: false,
            cleared_this_frame: false,
            minimized: false,
            pending_swapchain_def: None,
        })
    }

    fn create_resources(
        api: &RhiApi,
        window_handles: Option<&RhiWindowHandles>,
        swapchain_def: &RhiSwapchainDef,
        depth_format: Option<RhiFormat>,
    ) -> RhiResult<RhiRendererResources> {
        let device_context = api.device_context();
        let api_def = device_context.api_def().clone();

        let graphics_queue = device_context.create_queue(RhiQueueType::Graphics)?;
        let swapchain = device_context.create_swapchain(window_handles, swapchain_def)?;
        let mut command_pool =
            graphics_queue.create_command_pool(&RhiCommandPoolDef { transient: false })?;
        let descriptor_pool = device_context
            .create_descriptor_pool(&RhiDescriptorPoolDef::from(&api_def.descriptor_pool))?;

        let frame_count = api_def.buffering.frame_count();
        let frames = (0..frame_count)
            .map(|_| RhiFrame::new(&device_context, &mut command_pool))
            .collect::<RhiResult<Vec<_>>>()?;

        let depth_target = depth_format
            .map(|format| Self::create_depth_target(&device_context, swapchain.extents(), format))
            .transpose()?;

        Ok(RhiRendererResources {
            device_context,
            graphics_queue,
            swapchain,
            command_pool,
            descriptor_pool,
            frames,
            depth_target,
            drop_sink: RhiResourceDropSink::new(frame_count as u32),
        })
    }

    fn create_depth_target(
        device_context: &RhiDeviceContext,
        extents: RhiExtents2D,
        format: RhiFormat,
    ) -> RhiResult<RhiTexture> {
        if !format.has_depth() {
            return Err(format!("{:?} is not a depth format", format))?;
        }

        let texture =
            device_context.create_texture(&RhiTextureDef::for_render_target(extents, format))?;
        texture.set_debug_name("renderer depth target");
        Ok(texture)
    }

    fn resources(&self) -> RhiResult<&RhiRendererResources> {
        self.resources
            .as_ref()
            .ok_or_else(|| RhiError::StringError("the renderer was destroyed".to_string()))
    }

    fn resources_mut(&mut self) -> RhiResult<&mut RhiRendererResources> {
        self.resources
            .as_mut()
            .ok_or_else(|| RhiError::StringError("the renderer was destroyed".to_string()))
    }

    pub fn device_context(&self) -> RhiResult<&RhiDeviceContext> {
        Ok(&self.resources()?.device_context)
    }

    pub fn graphics_queue(&self) -> RhiResult<&RhiQueue> {
        Ok(&self.resources()?.graphics_queue)
    }

    pub fn swapchain(&self) -> RhiResult<&RhiSwapchain> {
        Ok(&self.resources()?.swapchain)
    }

    /// The frame slot being recorded, or the one the next `begin_frame` will use
    pub fn current_frame(&self) -> RhiResult<&RhiFrame> {
        Ok(&self.resources()?.frames[self.frame_index])
    }

    /// Index of the current frame slot, in `0..frame_count()`
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_count(&self) -> usize {
        self.resources
            .as_ref()
            .map(|x| x.frames.len())
            .unwrap_or(0)
    }

    pub fn extents(&self) -> RhiExtents2D {
        self.swapchain_def.extents()
    }

    pub fn depth_target(&self) -> Option<&RhiTexture> {
        self.resources.as_ref()?.depth_target.as_ref()
    }

    /// True between `begin_frame` returning true and `end_frame`
    pub fn is_recording(&self) -> bool {
        self.frame_phase == RhiFramePhase::Recording
    }

    /// Allocate a descriptor set for `set_index` of the shader from the renderer's pool. Fails with
    /// `RhiError::DescriptorPoolExhausted` once the configured capacity is used up.
    pub fn allocate_descriptor_set(
        &mut self,
        shader: &RhiShader,
        set_index: u32,
    ) -> RhiResult<RhiDescriptorSet> {
        self.resources_mut()?
            .descriptor_pool
            .allocate_descriptor_set(shader, set_index)
    }

    /// Release a resource once every frame that may still reference it has completed
    pub fn retire(
        &mut self,
        resource: RhiRetiredResource,
    ) -> RhiResult<()> {
        self.resources_mut()?.drop_sink.retire(resource);
        Ok(())
    }

    /// Resources retired and not yet released
    pub fn retired_resource_count(&self) -> usize {
        self.resources
            .as_ref()
            .map(|x| x.drop_sink.len())
            .unwrap_or(0)
    }

    /// While minimized, `begin_frame` skips rendering and changes nothing
    pub fn set_minimized(
        &mut self,
        minimized: bool,
    ) {
        if minimized != self.minimized {
            log::debug!("Renderer minimized: {}", minimized);
        }
        self.minimized = minimized;
    }

    /// Schedule a swapchain rebuild at the new size. The rebuild happens in the next `begin_frame`,
    /// which drops that frame. Resizing to the current size does nothing.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        let current_def = self
            .pending_swapchain_def
            .as_ref()
            .unwrap_or(&self.swapchain_def);
        if current_def.width == width && current_def.height == height {
            return Ok(());
        }

        log::info!("Renderer resized to {}x{}", width, height);
        self.pending_swapchain_def = Some(RhiSwapchainDef {
            width,
            height,
            ..self.swapchain_def.clone()
        });

        // A zero-sized window cannot have a swapchain, it is treated like a minimized one
        if width == 0 || height == 0 {
            self.set_minimized(true);
        } else {
            self.set_minimized(false);
            self.resources()?.swapchain.invalidate();
        }

        Ok(())
    }

    #[profiling::function]
    fn rebuild_swapchain(&mut self) -> RhiResult<()> {
        let swapchain_def = self
            .pending_swapchain_def
            .take()
            .unwrap_or_else(|| self.swapchain_def.clone());
        let depth_format = self.depth_format;

        let resources = self.resources_mut()?;

        // Nothing in flight may still use the old images
        resources.device_context.wait_for_device_idle()?;
        for frame in &mut resources.frames {
            frame.swapchain_image = None;
            frame.fence_pending = false;
        }

        resources.swapchain.rebuild(&swapchain_def)?;
        if let Some(depth_format) = depth_format {
            resources.depth_target = Some(Self::create_depth_target(
                &resources.device_context,
                resources.swapchain.extents(),
                depth_format,
            )?);
        }

        log::info!(
            "Swapchain rebuilt at {}x{}",
            swapchain_def.width,
            swapchain_def.height
        );
        self.swapchain_def = swapchain_def;
        Ok(())
    }

    /// Start a frame. Returns false if nothing should be rendered this iteration: the window is
    /// minimized, or the swapchain was out of date and has just been rebuilt. When it returns true,
    /// recording calls may be made until `end_frame`.
    ///
    /// Blocks until the GPU has finished the last use of this frame slot. A fence that does not
    /// signal within the configured timeout is a fatal device loss.
    #[profiling::function]
    pub fn begin_frame(&mut self) -> RhiResult<bool> {
        match self.frame_phase {
            RhiFramePhase::Idle => {}
            RhiFramePhase::Recording => {
                return Err("begin_frame called while a frame is being recorded")?
            }
            RhiFramePhase::Submitted => {
                return Err("begin_frame called before the previous frame was presented")?
            }
        }

        if self.minimized {
            return Ok(false);
        }

        // A zero-sized swapchain can't be built, keep skipping frames until a real size arrives
        if let Some(pending) = &self.pending_swapchain_def {
            if pending.width == 0 || pending.height == 0 {
                return Ok(false);
            }
        }

        if self.pending_swapchain_def.is_some() || self.resources()?.swapchain.is_out_of_date() {
            self.rebuild_swapchain()?;
            return Ok(false);
        }

        let frame_index = self.frame_index;
        let resources = self.resources_mut()?;
        let frame = &mut resources.frames[frame_index];

        if frame.fence_pending {
            frame.fence.wait().map_err(|e| {
                log::error!("Waiting for frame {} failed: {}", frame_index, e);
                e
            })?;
            frame.fence_pending = false;
            resources.drop_sink.on_frame_complete();
        }

        let frame = &mut resources.frames[frame_index];
        let swapchain_image = match resources
            .swapchain
            .acquire_next_image_semaphore(&frame.acquire_semaphore)
        {
            Ok(swapchain_image) => swapchain_image,
            Err(e) if e.is_out_of_date() => {
                log::debug!("Swapchain out of date on acquire, dropping the frame");
                resources.swapchain.invalidate();
                self.rebuild_swapchain()?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        frame.command_buffer.begin()?;
        frame.command_buffer.cmd_resource_barrier(
            &[],
            &[RhiTextureBarrier::state_transition(
                &swapchain_image.texture,
                RhiResourceState::UNDEFINED,
                RhiResourceState::RENDER_TARGET,
            )],
        )?;
        if let Some(depth_target) = &resources.depth_target {
            frame.command_buffer.cmd_resource_barrier(
                &[],
                &[RhiTextureBarrier::state_transition(
                    depth_target,
                    RhiResourceState::UNDEFINED,
                    RhiResourceState::DEPTH_WRITE,
                )],
            )?;
        }

        let extents = swapchain_image.texture.extents().to_2d();
        frame
            .command_buffer
            .cmd_set_viewport(&RhiViewport::from_extents(extents))?;
        frame
            .command_buffer
            .cmd_set_scissor(&RhiScissor::from_extents(extents))?;

        frame.swapchain_image = Some(swapchain_image);
        self.frame_phase = RhiFramePhase::Recording;
        self.render_pass_open = false;
        self.cleared_this_frame = false;
        Ok(true)
    }

    /// Close the frame's command buffer and submit it. The submission waits on the image acquire
    /// and signals the frame's fence. A submission failure is fatal.
    #[profiling::function]
    pub fn end_frame(&mut self) -> RhiResult<()> {
        if self.frame_phase != RhiFramePhase::Recording {
            return Err("end_frame called without a frame being recorded")?;
        }

        // Make sure the image has been cleared even if nothing was drawn
        self.ensure_render_pass()?;
        self.close_render_pass()?;

        let frame_index = self.frame_index;
        let resources = self.resources_mut()?;
        let frame = &mut resources.frames[frame_index];
        let swapchain_image = frame
            .swapchain_image
            .as_ref()
            .ok_or("the frame has no swapchain image")?;

        frame.command_buffer.cmd_resource_barrier(
            &[],
            &[RhiTextureBarrier::state_transition(
                &swapchain_image.texture,
                RhiResourceState::RENDER_TARGET,
                RhiResourceState::PRESENT,
            )],
        )?;
        frame.command_buffer.end()?;

        let result = resources.graphics_queue.submit(
            &[&frame.command_buffer],
            &[&frame.acquire_semaphore],
            &[&frame.submit_semaphore],
            Some(&frame.fence),
        );
        if let Err(e) = result {
            log::error!("Frame {} submission failed: {}", frame_index, e);
            return Err(e);
        }

        frame.fence_pending = true;
        self.frame_phase = RhiFramePhase::Submitted;
        Ok(())
    }

    /// Present the image the submitted frame rendered into, then advance to the next frame slot.
    /// An out-of-date or suboptimal swapchain is rebuilt by the next `begin_frame`. A present
    /// failure is fatal.
    #[profiling::function]
    pub fn present(&mut self) -> RhiResult<RhiPresentSuccessResult> {
        if self.frame_phase != RhiFramePhase::Submitted {
            return Err("present called without a submitted frame")?;
        }

        let frame_index = self.frame_index;
        let resources = self.resources_mut()?;
        let frame = &mut resources.frames[frame_index];
        let image_index = frame
            .swapchain_image
            .as_ref()
            .map(|x| x.swapchain_image_index)
            .ok_or("the frame has no swapchain image")?;

        let result = resources.graphics_queue.present(
            &resources.swapchain,
            &[&frame.submit_semaphore],
            image_index,
        );

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                log::error!("Presenting frame {} failed: {}", frame_index, e);
                return Err(e);
            }
        };

        match result {
            RhiPresentSuccessResult::Success => {}
            RhiPresentSuccessResult::SuccessSuboptimal => {
                log::warn!("Swapchain is suboptimal, rebuilding it next frame");
                resources.swapchain.invalidate();
            }
            RhiPresentSuccessResult::OutOfDate => {
                log::debug!("Swapchain out of date on present, rebuilding it next frame");
                resources.swapchain.invalidate();
            }
        }

        let frame_count = resources.frames.len();
        self.frame_index = (frame_index + 1) % frame_count;
        self.frame_phase = RhiFramePhase::Idle;
        Ok(result)
    }

    fn recording_command_buffer(&self) -> RhiResult<&RhiCommandBuffer> {
        if self.frame_phase != RhiFramePhase::Recording {
            return Err("no frame is being recorded, call begin_frame first")?;
        }

        Ok(&self.resources()?.frames[self.frame_index].command_buffer)
    }

    fn ensure_render_pass(&mut self) -> RhiResult<()> {
        if self.render_pass_open {
            return Ok(());
        }

        let load_op = if self.cleared_this_frame {
            RhiLoadOp::Load
        } else {
            RhiLoadOp::Clear
        };

        let command_buffer = self.recording_command_buffer()?;
        let resources = self.resources()?;
        let frame = &resources.frames[self.frame_index];
        let swapchain_image = frame
            .swapchain_image
            .as_ref()
            .ok_or("the frame has no swapchain image")?;

        command_buffer.cmd_begin_render_pass(
            &[RhiColorRenderTargetBinding {
                texture: &swapchain_image.texture,
                load_op,
                store_op: RhiStoreOp::Store,
                clear_value: self.clear_color,
            }],
            resources
                .depth_target
                .as_ref()
                .map(|texture| RhiDepthStencilRenderTargetBinding {
                    texture,
                    depth_load_op: load_op,
                    stencil_load_op: RhiLoadOp::DontCare,
                    depth_store_op: RhiStoreOp::Store,
                    stencil_store_op: RhiStoreOp::DontCare,
                    clear_value: RhiDepthStencilClearValue {
                        depth: self.clear_depth,
                        stencil: 0,
                    },
                }),
        )?;

        self.render_pass_open = true;
        self.cleared_this_frame = true;
        Ok(())
    }

    fn close_render_pass(&mut self) -> RhiResult<()> {
        if self.render_pass_open {
            self.recording_command_buffer()?.cmd_end_render_pass()?;
            self.render_pass_open = false;
        }
        Ok(())
    }

    /// Clear the color target of the current frame. Also becomes the clear color of later frames.
    pub fn clear_color(
        &mut self,
        color: RhiColorClearValue,
    ) -> RhiResult<()> {
        self.clear_color = color;
        self.ensure_render_pass()?;
        self.recording_command_buffer()?.cmd_clear_color(color)
    }

    /// Clear the depth target of the current frame. Fails if the renderer has no depth target.
    pub fn clear_depth(
        &mut self,
        depth: f32,
    ) -> RhiResult<()> {
        if self.depth_target().is_none() {
            return Err("clear_depth needs a renderer created with a depth format")?;
        }

        self.clear_depth = depth;
        self.ensure_render_pass()?;
        self.recording_command_buffer()?
            .cmd_clear_depth_stencil(RhiDepthStencilClearValue { depth, stencil: 0 })
    }

    pub fn set_viewport(
        &mut self,
        viewport: &RhiViewport,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?.cmd_set_viewport(viewport)
    }

    pub fn set_scissor(
        &mut self,
        scissor: &RhiScissor,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?.cmd_set_scissor(scissor)
    }

    /// Overrides the bound pipeline's cull mode until the next `bind_pipeline`
    pub fn set_cull_mode(
        &mut self,
        cull_mode: RhiCullMode,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?.cmd_set_cull_mode(cull_mode)
    }

    /// Overrides the bound pipeline's depth compare op until the next `bind_pipeline`
    pub fn set_depth_compare_op(
        &mut self,
        compare_op: RhiCompareOp,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?
            .cmd_set_depth_compare_op(compare_op)
    }

    /// Same factors and operator for color and alpha
    pub fn set_blend_function(
        &mut self,
        src_factor: RhiBlendFactor,
        dst_factor: RhiBlendFactor,
        blend_op: RhiBlendOp,
    ) -> RhiResult<()> {
        self.set_blend_function_separate(&RhiBlendEquation::uniform(
            src_factor, dst_factor, blend_op,
        ))
    }

    pub fn set_blend_function_separate(
        &mut self,
        equation: &RhiBlendEquation,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?
            .cmd_set_blend_equation(equation)
    }

    pub fn set_blending(
        &mut self,
        enabled: bool,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?
            .cmd_set_blend_enable(enabled)
    }

    /// Bind a pipeline, re-applying all of its baked state
    pub fn bind_pipeline(
        &mut self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        if pipeline.pipeline_type() != RhiPipelineType::Graphics {
            return Err("the renderer only binds graphics pipelines")?;
        }

        self.recording_command_buffer()?.cmd_bind_pipeline(pipeline)
    }

    pub fn bind_vertex_buffer(
        &mut self,
        buffer: &RhiBuffer,
        byte_offset: u64,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?.cmd_bind_vertex_buffers(
            0,
            &[RhiVertexBufferBinding {
                buffer,
                byte_offset,
            }],
        )
    }

    pub fn bind_index_buffer(
        &mut self,
        buffer: &RhiBuffer,
        index_type: RhiIndexType,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?
            .cmd_bind_index_buffer(&RhiIndexBufferBinding {
                buffer,
                byte_offset: 0,
                index_type,
            })
    }

    pub fn bind_descriptor_set(
        &mut self,
        descriptor_set: &RhiDescriptorSet,
    ) -> RhiResult<()> {
        self.recording_command_buffer()?
            .cmd_bind_descriptor_set(descriptor_set)
    }

    pub fn draw(
        &mut self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RhiResult<()> {
        self.ensure_render_pass()?;
        self.recording_command_buffer()?
            .cmd_draw(vertex_count, first_vertex)
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        first_index: u32,
    ) -> RhiResult<()> {
        self.ensure_render_pass()?;
        self.recording_command_buffer()?
            .cmd_draw_indexed(index_count, first_index, 0)
    }

    /// Write `data` into a uniform buffer at `offset`, ordered with the draws around it: draws
    /// recorded before see the old contents, draws recorded after see the new ones.
    ///
    /// Outside of a frame the buffer must be host visible and is written immediately. That is only
    /// safe while no submitted frame reads it.
    pub fn update_uniform_buffer<T: bytemuck::Pod>(
        &mut self,
        buffer: &RhiBuffer,
        offset: u64,
        data: &[T],
    ) -> RhiResult<()> {
        if !buffer
            .buffer_def()
            .resource_type
            .contains(RhiResourceType::UNIFORM_BUFFER)
        {
            return Err("update_uniform_buffer needs a buffer created with UNIFORM_BUFFER usage")?;
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);
        if self.frame_phase != RhiFramePhase::Recording {
            return buffer.copy_to_host_visible_buffer_with_offset(bytes, offset);
        }

        // Transfers are not allowed inside a render pass
        self.close_render_pass()?;
        let command_buffer = self.recording_command_buffer()?;
        command_buffer.cmd_resource_barrier(
            &[RhiBufferBarrier::state_transition(
                buffer,
                RhiResourceState::VERTEX_AND_CONSTANT_BUFFER,
                RhiResourceState::COPY_DST,
            )],
            &[],
        )?;
        command_buffer.cmd_update_buffer(buffer, offset, bytes)?;
        command_buffer.cmd_resource_barrier(
            &[RhiBufferBarrier::state_transition(
                buffer,
                RhiResourceState::COPY_DST,
                RhiResourceState::VERTEX_AND_CONSTANT_BUFFER,
            )],
            &[],
        )
    }

    /// Wait for the GPU to go idle, release everything the renderer owns, then destroy the device.
    /// Every other object created through the device must have been dropped already.
    pub fn destroy(&mut self) -> RhiResult<()> {
        if let Some(mut resources) = self.resources.take() {
            log::info!("Destroying renderer");
            if let Err(e) = resources.device_context.wait_for_device_idle() {
                log::error!("Device idle wait during renderer teardown failed: {}", e);
            }
            resources.drop_sink.destroy(&resources.device_context)?;
            // Frames hold command buffers allocated from the pool, drop them first
            resources.frames.clear();
            drop(resources);
        }

        self.frame_phase = RhiFramePhase::Idle;
        self.render_pass_open = false;

        if let Some(mut api) = self.api.take() {
            api.destroy()?;
        }

        Ok(())
    }
}

impl Drop for RhiRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            log::error!("Error destroying renderer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_renderer() -> RhiRenderer {
        let _ = env_logger::builder().is_test(true).try_init();
        let renderer_def = RhiRendererDef::new(RhiApiDef::default(), 64, 32);
        unsafe { RhiRenderer::new(&renderer_def) }.unwrap()
    }

    #[test]
    fn empty_frames_clear_and_present() {
        let mut renderer = create_renderer();
        for _ in 0..5 {
            assert!(renderer.begin_frame().unwrap());
            renderer
                .clear_color(RhiColorClearValue([1.0, 0.0, 0.0, 1.0]))
                .unwrap();
            renderer.end_frame().unwrap();
            assert_eq!(renderer.present().unwrap(), RhiPresentSuccessResult::Success);
        }

        assert_eq!(renderer.frame_index(), 5 % renderer.frame_count());
        renderer.destroy().unwrap();
    }

    #[test]
    fn frame_calls_must_be_ordered() {
        let mut renderer = create_renderer();
        assert!(renderer.end_frame().is_err());
        assert!(renderer.present().is_err());
        assert!(renderer.draw(3, 0).is_err());

        assert!(renderer.begin_frame().unwrap());
        assert!(renderer.begin_frame().is_err());
        renderer.end_frame().unwrap();
        assert!(renderer.end_frame().is_err());
        renderer.present().unwrap();
    }

    #[test]
    fn minimized_renderer_skips_frames() {
        let mut renderer = create_renderer();
        renderer.set_minimized(true);
        assert!(!renderer.begin_frame().unwrap());
        assert!(!renderer.is_recording());
        assert_eq!(renderer.frame_index(), 0);

        renderer.set_minimized(false);
        assert!(renderer.begin_frame().unwrap());
    }

    #[test]
    fn resize_drops_one_frame_and_rebuilds() {
        let mut renderer = create_renderer();
        renderer.resize(64, 32).unwrap();
        assert!(renderer.begin_frame().unwrap());
        renderer.end_frame().unwrap();
        renderer.present().unwrap();

        renderer.resize(128, 96).unwrap();
        assert!(!renderer.begin_frame().unwrap());
        assert_eq!(
            renderer.swapchain().unwrap().extents(),
            RhiExtents2D::new(128, 96)
        );
        assert!(renderer.begin_frame().unwrap());
    }

    #[test]
    fn zero_sized_resize_acts_as_minimize() {
        let mut renderer = create_renderer();
        renderer.resize(0, 0).unwrap();
        assert!(!renderer.begin_frame().unwrap());
        renderer.resize(32, 32).unwrap();
        assert!(!renderer.begin_frame().unwrap());
        assert!(renderer.begin_frame().unwrap());
    }

    #[test]
    fn restoring_a_zero_sized_window_waits_for_a_real_size() {
        let mut renderer = create_renderer();
        renderer.resize(0, 0).unwrap();
        renderer.set_minimized(false);
        assert!(!renderer.begin_frame().unwrap());
        assert!(!renderer.begin_frame().unwrap());
        assert_eq!(
            renderer.swapchain().unwrap().extents(),
            RhiExtents2D::new(64, 32)
        );

        renderer.resize(32, 32).unwrap();
        assert!(!renderer.begin_frame().unwrap());
        assert!(renderer.begin_frame().unwrap());
        assert_eq!(
            renderer.swapchain().unwrap().extents(),
            RhiExtents2D::new(32, 32)
        );
    }

    #[test]
    fn retired_resources_release_after_frames_complete() {
        let mut renderer = create_renderer();
        let buffer = renderer
            .device_context()
            .unwrap()
            .create_buffer(&RhiBufferDef::for_uniform_buffer(
                256,
                RhiBufferUpdateFrequency::PerFrame,
            ))
            .unwrap();
        renderer.retire(RhiRetiredResource::Buffer(buffer)).unwrap();
        assert_eq!(renderer.retired_resource_count(), 1);

        for _ in 0..6 {
            assert!(renderer.begin_frame().unwrap());
            renderer.end_frame().unwrap();
            renderer.present().unwrap();
        }

        assert_eq!(renderer.retired_resource_count(), 0);
        assert_eq!(
            renderer
                .device_context()
                .unwrap()
                .object_counts()
                .buffers,
            0
        );
    }

    #[test]
    fn uniform_updates_record_outside_the_render_pass() {
        let mut renderer = create_renderer();
        let buffer = renderer
            .device_context()
            .unwrap()
            .create_buffer(&RhiBufferDef::for_uniform_buffer(
                64,
                RhiBufferUpdateFrequency::PerFrame,
            ))
            .unwrap();

        renderer
            .update_uniform_buffer(&buffer, 0, &[1.0f32; 4])
            .unwrap();

        assert!(renderer.begin_frame().unwrap());
        renderer
            .clear_color(RhiColorClearValue([0.0, 0.0, 1.0, 1.0]))
            .unwrap();
        renderer
            .update_uniform_buffer(&buffer, 16, &[2.0f32; 4])
            .unwrap();
        renderer.end_frame().unwrap();
        renderer.present().unwrap();
        renderer.device_context().unwrap().wait_for_device_idle().unwrap();

        let bytes = buffer.read_host_visible_buffer(0, 32).unwrap();
        let expected = [1.0f32, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0];
        assert_eq!(&bytes[..], bytemuck::cast_slice::<f32, u8>(&expected));

        let vertex_buffer = renderer
            .device_context()
            .unwrap()
            .create_buffer(&RhiBufferDef::for_vertex_buffer(64, RhiBufferUpdateFrequency::PerFrame))
            .unwrap();
        assert!(renderer
            .update_uniform_buffer(&vertex_buffer, 0, &[0u32; 4])
            .is_err());
    }
}
