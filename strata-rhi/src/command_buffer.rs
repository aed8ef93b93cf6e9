use crate::backends::null::RhiCommandBufferNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiCommandBufferVulkan;
use crate::*;

/// A list of commands recorded by the CPU and submitted to the GPU.
///
/// It cannot be created directly. It must be allocated out of a pool.
///
/// The command pool and all command buffers allocated from it share memory. The standard rust
/// rules about mutability apply but are not enforced at compile time or runtime.
///  * Do not modify two command buffers from the same pool concurrently
///  * Do not allocate from a command pool while modifying one of its command buffers
///  * Once a command buffer is submitted to the GPU, do not modify its pool, or any command buffers
///    created from it, until the GPU completes its work.
///
/// The buffer moves through `Closed -begin-> Opened -end-> Pending -submit-> Closed`. Every `cmd_`
/// call is legal only while Opened and is checked before it is recorded, so a bad call fails at
/// the call site instead of at submit.
///
/// Commands are recorded into a list and replayed in order when the buffer is submitted. The list
/// holds clones of every resource it references until the buffer is begun again.
pub enum RhiCommandBuffer {
    Null(RhiCommandBufferNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiCommandBufferVulkan),
}

impl std::fmt::Debug for RhiCommandBuffer {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.recorder().fmt(f)
    }
}

impl RhiCommandBuffer {
    /// The recording state shared by every backend
    pub fn recorder(&self) -> &RhiCommandRecorder {
        match self {
            RhiCommandBuffer::Null(inner) => inner.recorder(),
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandBuffer::Vk(inner) => inner.recorder(),
        }
    }

    pub fn state(&self) -> RhiCommandBufferState {
        self.recorder().state()
    }

    pub fn is_secondary(&self) -> bool {
        self.recorder().is_secondary()
    }

    /// Begins writing a primary command buffer. Fails if the buffer is not Closed, or if a
    /// previous submission of it has not retired yet.
    pub fn begin(&self) -> RhiResult<()> {
        self.begin_with_flags(RhiCommandBufferBeginFlags::NONE)
    }

    pub fn begin_with_flags(
        &self,
        flags: RhiCommandBufferBeginFlags,
    ) -> RhiResult<()> {
        self.recorder().begin(flags, None)
    }

    /// Begins writing a secondary command buffer. With `RENDER_PASS_CONTINUE` the buffer records
    /// draws for the render pass of the primary that executes it, described by `inheritance`.
    pub fn begin_secondary(
        &self,
        flags: RhiCommandBufferBeginFlags,
        inheritance: RhiCommandBufferInheritance,
    ) -> RhiResult<()> {
        self.recorder().begin(flags, Some(inheritance))
    }

    /// End writing the command buffer, must be called before it is submitted to a queue
    pub fn end(&self) -> RhiResult<()> {
        self.recorder().end()
    }

    /// Discard whatever was recorded and return to Closed. Not allowed while a submission of the
    /// buffer is executing.
    pub fn reset(&self) -> RhiResult<()> {
        self.recorder().reset()
    }

    /// The list recorded by the last `begin`/`end` pair
    pub fn recorded_commands(&self) -> Option<std::sync::Arc<Vec<RhiCommand>>> {
        self.recorder().recorded_commands()
    }

    /// Begin a render pass. Color and depth/stencil targets are loaded according to their load
    /// ops, then draws may be recorded until `cmd_end_render_pass`.
    pub fn cmd_begin_render_pass(
        &self,
        color_targets: &[RhiColorRenderTargetBinding],
        depth_target: Option<RhiDepthStencilRenderTargetBinding>,
    ) -> RhiResult<()> {
        for color_target in color_targets {
            if !color_target
                .texture
                .texture_def()
                .resource_type
                .contains(RhiResourceType::RENDER_TARGET_COLOR)
            {
                return Err("color target texture lacks RENDER_TARGET_COLOR usage")?;
            }
        }

        if let Some(depth_target) = &depth_target {
            if !depth_target
                .texture
                .texture_def()
                .resource_type
                .contains(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL)
            {
                return Err("depth target texture lacks RENDER_TARGET_DEPTH_STENCIL usage")?;
            }
        }

        self.recorder().record(RhiCommand::BeginRenderPass {
            color_targets: color_targets
                .iter()
                .map(|x| RhiColorTarget {
                    texture: x.texture.clone(),
                    load_op: x.load_op,
                    store_op: x.store_op,
                    clear_value: x.clear_value,
                })
                .collect(),
            depth_target: depth_target.map(|x| RhiDepthStencilTarget {
                texture: x.texture.clone(),
                depth_load_op: x.depth_load_op,
                stencil_load_op: x.stencil_load_op,
                depth_store_op: x.depth_store_op,
                stencil_store_op: x.stencil_store_op,
                clear_value: x.clear_value,
            }),
        })
    }

    /// Finish a render pass. This is required before starting a new one or submitting the command
    /// buffer.
    pub fn cmd_end_render_pass(&self) -> RhiResult<()> {
        self.recorder().record(RhiCommand::EndRenderPass)
    }

    /// Clear every color attachment of the current render pass
    pub fn cmd_clear_color(
        &self,
        clear_value: RhiColorClearValue,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::ClearColor(clear_value))
    }

    /// Clear the depth/stencil attachment of the current render pass
    pub fn cmd_clear_depth_stencil(
        &self,
        clear_value: RhiDepthStencilClearValue,
    ) -> RhiResult<()> {
        self.recorder()
            .record(RhiCommand::ClearDepthStencil(clear_value))
    }

    /// Set the viewport state. This may be called inside or outside of a render pass.
    pub fn cmd_set_viewport(
        &self,
        viewport: &RhiViewport,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::SetViewport(*viewport))
    }

    /// Set the scissor state. This may be called inside or outside of a render pass.
    pub fn cmd_set_scissor(
        &self,
        scissor: &RhiScissor,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::SetScissor(*scissor))
    }

    /// Override the bound pipeline's cull mode until the next `cmd_bind_pipeline`
    pub fn cmd_set_cull_mode(
        &self,
        cull_mode: RhiCullMode,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::SetCullMode(cull_mode))
    }

    /// Override the bound pipeline's depth compare op until the next `cmd_bind_pipeline`
    pub fn cmd_set_depth_compare_op(
        &self,
        compare_op: RhiCompareOp,
    ) -> RhiResult<()> {
        self.recorder()
            .record(RhiCommand::SetDepthCompareOp(compare_op))
    }

    /// Override whether the bound pipeline blends, until the next `cmd_bind_pipeline`
    pub fn cmd_set_blend_enable(
        &self,
        blend_enable: bool,
    ) -> RhiResult<()> {
        self.recorder()
            .record(RhiCommand::SetBlendEnable(blend_enable))
    }

    /// Override the bound pipeline's blend factors and operators, until the next
    /// `cmd_bind_pipeline`
    pub fn cmd_set_blend_equation(
        &self,
        equation: &RhiBlendEquation,
    ) -> RhiResult<()> {
        self.recorder()
            .record(RhiCommand::SetBlendEquation(*equation))
    }

    /// Bind a pipeline. Re-applies every piece of fixed-function state the pipeline was created
    /// with, discarding dynamic overrides set since the last bind.
    pub fn cmd_bind_pipeline(
        &self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        self.recorder()
            .record(RhiCommand::BindPipeline(pipeline.clone()))
    }

    /// Bind buffers to vertex buffer slots starting at `first_binding`
    pub fn cmd_bind_vertex_buffers(
        &self,
        first_binding: u32,
        bindings: &[RhiVertexBufferBinding],
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::BindVertexBuffers {
            first_binding,
            bindings: bindings
                .iter()
                .map(|x| (x.buffer.clone(), x.byte_offset))
                .collect(),
        })
    }

    /// Bind a buffer as the index buffer
    pub fn cmd_bind_index_buffer(
        &self,
        binding: &RhiIndexBufferBinding,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::BindIndexBuffer {
            buffer: binding.buffer.clone(),
            byte_offset: binding.byte_offset,
            index_type: binding.index_type,
        })
    }

    /// Bind a descriptor set at the set index its layout was reflected for. A pipeline must be
    /// bound first.
    pub fn cmd_bind_descriptor_set(
        &self,
        descriptor_set: &RhiDescriptorSet,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::BindDescriptorSet {
            set_index: descriptor_set.set_index(),
            descriptor_set: descriptor_set.clone(),
        })
    }

    /// Write push constants. The range must fit in the push constant block of the bound pipeline.
    pub fn cmd_push_constants<T: bytemuck::Pod>(
        &self,
        offset: u32,
        data: &T,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::PushConstants {
            offset,
            data: bytemuck::bytes_of(data).to_vec(),
        })
    }

    /// Draw primitives using the currently bound pipeline and vertex buffer
    pub fn cmd_draw(
        &self,
        vertex_count: u32,
        first_vertex: u32,
    ) -> RhiResult<()> {
        self.cmd_draw_instanced(vertex_count, first_vertex, 1, 0)
    }

    /// Draw instanced primitives using the currently bound pipeline and vertex buffer
    pub fn cmd_draw_instanced(
        &self,
        vertex_count: u32,
        first_vertex: u32,
        instance_count: u32,
        first_instance: u32,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        })
    }

    /// Draw primitives using the currently bound pipeline, vertex, and index buffer
    ///
    /// `vertex_offset` is added to every index before it is used to read a vertex
    pub fn cmd_draw_indexed(
        &self,
        index_count: u32,
        first_index: u32,
        vertex_offset: i32,
    ) -> RhiResult<()> {
        self.cmd_draw_indexed_instanced(index_count, first_index, 1, 0, vertex_offset)
    }

    /// Draw instanced primitives using the currently bound pipeline, vertex, and index buffer
    pub fn cmd_draw_indexed_instanced(
        &self,
        index_count: u32,
        first_index: u32,
        instance_count: u32,
        first_instance: u32,
        vertex_offset: i32,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        })
    }

    /// Draw with arguments read from `indirect_buffer`, laid out as `RhiDrawIndirectCommand`
    pub fn cmd_draw_indirect(
        &self,
        indirect_buffer: &RhiBuffer,
        indirect_buffer_offset_in_bytes: u64,
        draw_count: u32,
    ) -> RhiResult<()> {
        Self::verify_indirect_buffer(indirect_buffer)?;
        self.recorder().record(RhiCommand::DrawIndirect {
            buffer: indirect_buffer.clone(),
            byte_offset: indirect_buffer_offset_in_bytes,
            draw_count,
        })
    }

    /// Draw with arguments read from `indirect_buffer`, laid out as
    /// `RhiDrawIndexedIndirectCommand`
    pub fn cmd_draw_indexed_indirect(
        &self,
        indirect_buffer: &RhiBuffer,
        indirect_buffer_offset_in_bytes: u64,
        draw_count: u32,
    ) -> RhiResult<()> {
        Self::verify_indirect_buffer(indirect_buffer)?;
        self.recorder().record(RhiCommand::DrawIndexedIndirect {
            buffer: indirect_buffer.clone(),
            byte_offset: indirect_buffer_offset_in_bytes,
            draw_count,
        })
    }

    /// Dispatch the current pipeline. Only usable with compute pipelines.
    pub fn cmd_dispatch(
        &self,
        group_count_x: u32,
        group_count_y: u32,
        group_count_z: u32,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::Dispatch {
            group_count: [group_count_x, group_count_y, group_count_z],
        })
    }

    /// Dispatch with group counts read from `indirect_buffer`, laid out as
    /// `RhiDispatchIndirectCommand`
    pub fn cmd_dispatch_indirect(
        &self,
        indirect_buffer: &RhiBuffer,
        indirect_buffer_offset_in_bytes: u64,
    ) -> RhiResult<()> {
        Self::verify_indirect_buffer(indirect_buffer)?;
        self.recorder().record(RhiCommand::DispatchIndirect {
            buffer: indirect_buffer.clone(),
            byte_offset: indirect_buffer_offset_in_bytes,
        })
    }

    fn verify_indirect_buffer(buffer: &RhiBuffer) -> RhiResult<()> {
        if !buffer
            .buffer_def()
            .resource_type
            .contains(RhiResourceType::INDIRECT_BUFFER)
        {
            return Err("indirect argument buffer lacks INDIRECT_BUFFER usage")?;
        }
        Ok(())
    }

    /// Add a memory barrier for one or more resources. This must occur OUTSIDE of a render pass.
    pub fn cmd_resource_barrier(
        &self,
        buffer_barriers: &[RhiBufferBarrier],
        texture_barriers: &[RhiTextureBarrier],
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::ResourceBarrier {
            buffer_barriers: buffer_barriers
                .iter()
                .map(|x| RhiRecordedBufferBarrier {
                    buffer: x.buffer.clone(),
                    src_state: x.src_state,
                    dst_state: x.dst_state,
                })
                .collect(),
            texture_barriers: texture_barriers
                .iter()
                .map(|x| RhiRecordedTextureBarrier {
                    texture: x.texture.clone(),
                    src_state: x.src_state,
                    dst_state: x.dst_state,
                    array_slice: x.array_slice,
                    mip_slice: x.mip_slice,
                })
                .collect(),
        })
    }

    /// Copy the contents of one buffer into another. This occurs on the GPU and allows modifying
    /// resources that are not accessible to the CPU.
    pub fn cmd_copy_buffer_to_buffer(
        &self,
        src_buffer: &RhiBuffer,
        dst_buffer: &RhiBuffer,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    ) -> RhiResult<()> {
        let fits = |offset: u64, buffer: &RhiBuffer| {
            offset
                .checked_add(size)
                .map_or(false, |end| end <= buffer.buffer_def().size)
        };
        if !fits(src_offset, src_buffer) || !fits(dst_offset, dst_buffer) {
            return Err(format!(
                "copy of {} bytes from offset {} to offset {} overruns a buffer",
                size, src_offset, dst_offset
            ))?;
        }

        self.recorder().record(RhiCommand::CopyBufferToBuffer {
            src: src_buffer.clone(),
            dst: dst_buffer.clone(),
            src_offset,
            dst_offset,
            size,
        })
    }

    /// Copy the contents of a buffer into a texture. This occurs on the GPU and allows modifying
    /// resources that are not accessible to the CPU. The texture must be in COPY_DST state.
    pub fn cmd_copy_buffer_to_texture(
        &self,
        src_buffer: &RhiBuffer,
        dst_texture: &RhiTexture,
        params: &RhiCmdCopyBufferToTextureParams,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::CopyBufferToTexture {
            src: src_buffer.clone(),
            dst: dst_texture.clone(),
            params: *params,
        })
    }

    /// Copy one subresource of a texture into a buffer, tightly packed. The texture must be in
    /// COPY_SRC state.
    pub fn cmd_copy_texture_to_buffer(
        &self,
        src_texture: &RhiTexture,
        dst_buffer: &RhiBuffer,
        params: &RhiCmdCopyTextureToBufferParams,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::CopyTextureToBuffer {
            src: src_texture.clone(),
            dst: dst_buffer.clone(),
            params: *params,
        })
    }

    /// Write a small amount of data into a buffer in stream. Intended for per-draw constants,
    /// larger writes should go through a staging buffer.
    pub fn cmd_update_buffer(
        &self,
        buffer: &RhiBuffer,
        offset: u64,
        data: &[u8],
    ) -> RhiResult<()> {
        const MAX_UPDATE_SIZE: usize = 65536;
        if data.len() > MAX_UPDATE_SIZE || data.len() % 4 != 0 || offset % 4 != 0 {
            return Err(format!(
                "in-stream buffer updates must be 4-byte aligned and at most {} bytes",
                MAX_UPDATE_SIZE
            ))?;
        }

        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > buffer.buffer_def().size) {
            return Err("in-stream buffer update overruns the buffer")?;
        }

        self.recorder().record(RhiCommand::UpdateBuffer {
            buffer: buffer.clone(),
            offset,
            data: data.to_vec(),
        })
    }

    /// Scale a region of one texture into a region of another. Used to copy a render target into
    /// an image owned by someone else, an editor viewport for example.
    pub fn cmd_blit(
        &self,
        src_texture: &RhiTexture,
        dst_texture: &RhiTexture,
        params: &RhiCmdBlitParams,
    ) -> RhiResult<()> {
        self.recorder().record(RhiCommand::Blit {
            src: src_texture.clone(),
            dst: dst_texture.clone(),
            params: *params,
        })
    }

    /// Execute ended secondary command buffers as part of this one. Each secondary moves back to
    /// Closed, its commands are kept alive by this buffer.
    pub fn cmd_execute_command_buffers(
        &self,
        secondaries: &[&RhiCommandBuffer],
    ) -> RhiResult<()> {
        let recorders: Vec<_> = secondaries.iter().map(|x| x.recorder()).collect();
        self.recorder().record_execute(&recorders)
    }

    pub fn null_command_buffer(&self) -> Option<&RhiCommandBufferNull> {
        match self {
            RhiCommandBuffer::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiCommandBuffer::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_command_buffer(&self) -> Option<&RhiCommandBufferVulkan> {
        match self {
            RhiCommandBuffer::Null(_) => None,
            RhiCommandBuffer::Vk(inner) => Some(inner),
        }
    }
}
