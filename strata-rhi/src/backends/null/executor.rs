//! Replays frozen command lists against host memory.
//!
//! The executor keeps the same state a GPU command processor would (bound pipeline, vertex and
//! index buffers, descriptor sets, dynamic state) and validates every draw against it. A command
//! that a driver would reject fails the list.

use super::{texel, RhiBufferNull, RhiTextureNull};
use crate::commands::{RhiColorTarget, RhiCommand, RhiDepthStencilTarget};
use crate::*;
use fnv::FnvHashMap;

/// The state a draw was issued with
#[derive(Clone, Debug, PartialEq)]
pub struct RhiNullDrawRecord {
    pub indexed: bool,
    /// Vertices, or indices for an indexed draw
    pub element_count: u32,
    pub instance_count: u32,
    pub blend_enable: bool,
    pub blend_equation: RhiBlendEquation,
    pub cull_mode: RhiCullMode,
    pub depth_compare_op: RhiCompareOp,
    pub viewport: Option<RhiViewport>,
    pub scissor: Option<RhiScissor>,
    pub render_target_extents: RhiExtents2D,
}

/// Totals of everything the headless device has executed
#[derive(Clone, Debug, Default)]
pub struct RhiNullDeviceStats {
    pub submissions: u64,
    pub command_buffers_executed: u64,
    pub commands_executed: u64,
    pub draws: u64,
    pub dispatches: u64,
    pub presents: u64,
    pub last_draw: Option<RhiNullDrawRecord>,
}

#[derive(Default)]
pub(super) struct NullExecutionSummary {
    commands_executed: u64,
    draws: u64,
    dispatches: u64,
    last_draw: Option<RhiNullDrawRecord>,
}

impl NullExecutionSummary {
    pub(super) fn merge(
        &mut self,
        other: NullExecutionSummary,
    ) {
        self.commands_executed += other.commands_executed;
        self.draws += other.draws;
        self.dispatches += other.dispatches;
        if other.last_draw.is_some() {
            self.last_draw = other.last_draw;
        }
    }

    pub(super) fn apply_to(
        self,
        stats: &mut RhiNullDeviceStats,
    ) {
        stats.commands_executed += self.commands_executed;
        stats.draws += self.draws;
        stats.dispatches += self.dispatches;
        if self.last_draw.is_some() {
            stats.last_draw = self.last_draw;
        }
    }
}

struct NullRenderPass {
    color_targets: Vec<RhiColorTarget>,
    depth_target: Option<RhiDepthStencilTarget>,
    extents: RhiExtents2D,
}

// State that BindPipeline resets to the pipeline's baked values
#[derive(Clone)]
struct NullDynamicState {
    viewport: Option<RhiViewport>,
    scissor: Option<RhiScissor>,
    cull_mode: RhiCullMode,
    depth_compare_op: RhiCompareOp,
    blend_enable: bool,
    blend_equation: RhiBlendEquation,
}

impl Default for NullDynamicState {
    fn default() -> Self {
        NullDynamicState {
            viewport: None,
            scissor: None,
            cull_mode: RhiCullMode::None,
            depth_compare_op: RhiCompareOp::Always,
            blend_enable: false,
            blend_equation: RhiBlendEquation::default(),
        }
    }
}

struct NullDrawParams {
    indexed: bool,
    element_count: u32,
    instance_count: u32,
    first_element: u32,
    vertex_offset: i32,
    first_instance: u32,
}

pub(super) struct NullExecutor<'a> {
    device_info: &'a RhiDeviceInfo,
    render_pass: Option<NullRenderPass>,
    pipeline: Option<RhiPipeline>,
    vertex_buffers: FnvHashMap<u32, (RhiBuffer, u64)>,
    index_buffer: Option<(RhiBuffer, u64, RhiIndexType)>,
    descriptor_sets: FnvHashMap<u32, RhiDescriptorSet>,
    push_constants: Vec<u8>,
    dynamic_state: NullDynamicState,
    summary: NullExecutionSummary,
}

fn null_buffer(buffer: &RhiBuffer) -> RhiResult<&RhiBufferNull> {
    buffer
        .null_buffer()
        .ok_or_else(|| crate::device_context::backend_mismatch("buffer"))
}

fn null_texture(texture: &RhiTexture) -> RhiResult<&RhiTextureNull> {
    texture
        .null_texture()
        .ok_or_else(|| crate::device_context::backend_mismatch("texture"))
}

fn subresource_size(
    texture: &RhiTexture,
    mip_level: u32,
) -> u64 {
    let extents = texture.extents().mip_extents(mip_level);
    extents.width as u64
        * extents.height as u64
        * extents.depth as u64
        * texture.format().block_or_pixel_size_in_bytes() as u64
}

fn layouts_compatible(
    expected: &RhiDescriptorSetLayoutDesc,
    actual: &RhiDescriptorSetLayoutDesc,
) -> bool {
    expected.bindings.len() == actual.bindings.len()
        && expected.bindings.iter().zip(&actual.bindings).all(|(a, b)| {
            a.binding == b.binding
                && a.binding_type == b.binding_type
                && a.element_count_normalized() == b.element_count_normalized()
        })
}

impl<'a> NullExecutor<'a> {
    pub(super) fn new(device_info: &'a RhiDeviceInfo) -> Self {
        NullExecutor {
            device_info,
            render_pass: None,
            pipeline: None,
            vertex_buffers: Default::default(),
            index_buffer: None,
            descriptor_sets: Default::default(),
            push_constants: vec![0; device_info.max_push_constant_size as usize],
            dynamic_state: Default::default(),
            summary: Default::default(),
        }
    }

    pub(super) fn finish(self) -> NullExecutionSummary {
        self.summary
    }

    pub(super) fn execute(
        &mut self,
        commands: &[RhiCommand],
    ) -> RhiResult<()> {
        for (index, command) in commands.iter().enumerate() {
            self.execute_command(command).map_err(|e| {
                RhiError::StringError(format!(
                    "{} (command {} of {}) failed: {}",
                    command.name(),
                    index,
                    commands.len(),
                    e
                ))
            })?;
            self.summary.commands_executed += 1;
        }

        Ok(())
    }

    fn execute_command(
        &mut self,
        command: &RhiCommand,
    ) -> RhiResult<()> {
        match command {
            RhiCommand::BeginRenderPass {
                color_targets,
                depth_target,
            } => self.begin_render_pass(color_targets, depth_target.as_ref()),
            RhiCommand::EndRenderPass => {
                if self.render_pass.take().is_none() {
                    return Err("no render pass is open")?;
                }
                Ok(())
            }
            RhiCommand::ClearColor(clear_value) => {
                let render_pass = self.current_render_pass()?;
                for color_target in &render_pass.color_targets {
                    Self::clear_color_target(&color_target.texture, *clear_value)?;
                }
                Ok(())
            }
            RhiCommand::ClearDepthStencil(clear_value) => {
                let render_pass = self.current_render_pass()?;
                let depth_target = render_pass
                    .depth_target
                    .as_ref()
                    .ok_or("the render pass has no depth attachment")?;
                Self::clear_depth_target(&depth_target.texture, *clear_value)
            }
            RhiCommand::BindPipeline(pipeline) => {
                self.bind_pipeline(pipeline);
                Ok(())
            }
            RhiCommand::BindVertexBuffers {
                first_binding,
                bindings,
            } => {
                for (i, (buffer, byte_offset)) in bindings.iter().enumerate() {
                    null_buffer(buffer)?;
                    self.vertex_buffers
                        .insert(first_binding + i as u32, (buffer.clone(), *byte_offset));
                }
                Ok(())
            }
            RhiCommand::BindIndexBuffer {
                buffer,
                byte_offset,
                index_type,
            } => {
                null_buffer(buffer)?;
                self.index_buffer = Some((buffer.clone(), *byte_offset, *index_type));
                Ok(())
            }
            RhiCommand::BindDescriptorSet {
                set_index,
                descriptor_set,
            } => {
                if descriptor_set.null_descriptor_set().is_none() {
                    return Err(crate::device_context::backend_mismatch("descriptor set"));
                }
                self.descriptor_sets
                    .insert(*set_index, descriptor_set.clone());
                Ok(())
            }
            RhiCommand::PushConstants { offset, data } => {
                let end = *offset as usize + data.len();
                if end > self.push_constants.len() {
                    return Err(format!(
                        "push constants {}..{} exceed the {} byte limit",
                        offset,
                        end,
                        self.push_constants.len()
                    ))?;
                }
                self.push_constants[*offset as usize..end].copy_from_slice(data);
                Ok(())
            }
            RhiCommand::SetViewport(viewport) => {
                self.dynamic_state.viewport = Some(*viewport);
                Ok(())
            }
            RhiCommand::SetScissor(scissor) => {
                self.dynamic_state.scissor = Some(*scissor);
                Ok(())
            }
            RhiCommand::SetCullMode(cull_mode) => {
                self.dynamic_state.cull_mode = *cull_mode;
                Ok(())
            }
            RhiCommand::SetDepthCompareOp(compare_op) => {
                self.dynamic_state.depth_compare_op = *compare_op;
                Ok(())
            }
            RhiCommand::SetBlendEnable(blend_enable) => {
                self.dynamic_state.blend_enable = *blend_enable;
                Ok(())
            }
            RhiCommand::SetBlendEquation(blend_equation) => {
                self.dynamic_state.blend_equation = *blend_equation;
                Ok(())
            }
            RhiCommand::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => self.draw(NullDrawParams {
                indexed: false,
                element_count: *vertex_count,
                instance_count: *instance_count,
                first_element: *first_vertex,
                vertex_offset: 0,
                first_instance: *first_instance,
            }),
            RhiCommand::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => self.draw(NullDrawParams {
                indexed: true,
                element_count: *index_count,
                instance_count: *instance_count,
                first_element: *first_index,
                vertex_offset: *vertex_offset,
                first_instance: *first_instance,
            }),
            RhiCommand::DrawIndirect {
                buffer,
                byte_offset,
                draw_count,
            } => {
                let args: Vec<RhiDrawIndirectCommand> =
                    Self::read_indirect_args(buffer, *byte_offset, *draw_count)?;
                for arg in args {
                    self.draw(NullDrawParams {
                        indexed: false,
                        element_count: arg.vertex_count,
                        instance_count: arg.instance_count,
                        first_element: arg.first_vertex,
                        vertex_offset: 0,
                        first_instance: arg.first_instance,
                    })?;
                }
                Ok(())
            }
            RhiCommand::DrawIndexedIndirect {
                buffer,
                byte_offset,
                draw_count,
            } => {
                let args: Vec<RhiDrawIndexedIndirectCommand> =
                    Self::read_indirect_args(buffer, *byte_offset, *draw_count)?;
                for arg in args {
                    self.draw(NullDrawParams {
                        indexed: true,
                        element_count: arg.index_count,
                        instance_count: arg.instance_count,
                        first_element: arg.first_index,
                        vertex_offset: arg.vertex_offset,
                        first_instance: arg.first_instance,
                    })?;
                }
                Ok(())
            }
            RhiCommand::Dispatch { group_count } => self.dispatch(*group_count),
            RhiCommand::DispatchIndirect {
                buffer,
                byte_offset,
            } => {
                let args: Vec<RhiDispatchIndirectCommand> =
                    Self::read_indirect_args(buffer, *byte_offset, 1)?;
                for arg in args {
                    self.dispatch([arg.group_count_x, arg.group_count_y, arg.group_count_z])?;
                }
                Ok(())
            }
            RhiCommand::ResourceBarrier {
                buffer_barriers,
                texture_barriers,
            } => {
                // Host memory is always coherent, only texture states are tracked
                for barrier in buffer_barriers {
                    null_buffer(&barrier.buffer)?;
                }
                for barrier in texture_barriers {
                    null_texture(&barrier.texture)?
                        .transition(barrier.src_state, barrier.dst_state);
                }
                Ok(())
            }
            RhiCommand::CopyBufferToBuffer {
                src,
                dst,
                src_offset,
                dst_offset,
                size,
            } => {
                let data = null_buffer(src)?.read_bytes(*src_offset, *size)?;
                null_buffer(dst)?.write_bytes(*dst_offset, &data)
            }
            RhiCommand::CopyBufferToTexture { src, dst, params } => {
                self.check_texture_copy_offset(params.buffer_offset)?;
                let size = subresource_size(dst, params.mip_level as u32);
                let data = null_buffer(src)?.read_bytes(params.buffer_offset, size)?;
                null_texture(dst)?.with_subresource(
                    params.array_layer as u32,
                    params.mip_level as u32,
                    |texels| texels.copy_from_slice(&data),
                )
            }
            RhiCommand::CopyTextureToBuffer { src, dst, params } => {
                self.check_texture_copy_offset(params.buffer_offset)?;
                let data = null_texture(src)?.with_subresource(
                    params.array_layer as u32,
                    params.mip_level as u32,
                    |texels| texels.clone(),
                )?;
                null_buffer(dst)?.write_bytes(params.buffer_offset, &data)
            }
            RhiCommand::UpdateBuffer {
                buffer,
                offset,
                data,
            } => null_buffer(buffer)?.write_bytes(*offset, data),
            RhiCommand::Blit { src, dst, params } => Self::blit(src, dst, params),
            RhiCommand::ExecuteCommandBuffers(command_lists) => {
                for commands in command_lists {
                    self.execute(commands)?;
                }
                Ok(())
            }
        }
    }

    fn current_render_pass(&self) -> RhiResult<&NullRenderPass> {
        self.render_pass
            .as_ref()
            .ok_or_else(|| RhiError::StringError("no render pass is open".to_string()))
    }

    fn begin_render_pass(
        &mut self,
        color_targets: &[RhiColorTarget],
        depth_target: Option<&RhiDepthStencilTarget>,
    ) -> RhiResult<()> {
        if self.render_pass.is_some() {
            return Err("a render pass is already open")?;
        }

        let extents = color_targets
            .first()
            .map(|x| x.texture.extents().to_2d())
            .or_else(|| depth_target.map(|x| x.texture.extents().to_2d()))
            .ok_or("a render pass needs at least one attachment")?;

        let all_extents = color_targets
            .iter()
            .map(|x| &x.texture)
            .chain(depth_target.map(|x| &x.texture));
        for texture in all_extents {
            null_texture(texture)?;
            if texture.extents().to_2d() != extents {
                return Err(format!(
                    "render pass attachments differ in size: {:?} and {:?}",
                    extents,
                    texture.extents().to_2d()
                ))?;
            }
        }

        for color_target in color_targets {
            if color_target.load_op == RhiLoadOp::Clear {
                Self::clear_color_target(&color_target.texture, color_target.clear_value)?;
            }
        }

        if let Some(depth_target) = depth_target {
            if depth_target.depth_load_op == RhiLoadOp::Clear
                || depth_target.stencil_load_op == RhiLoadOp::Clear
            {
                Self::clear_depth_target(&depth_target.texture, depth_target.clear_value)?;
            }
        }

        self.render_pass = Some(NullRenderPass {
            color_targets: color_targets.to_vec(),
            depth_target: depth_target.cloned(),
            extents,
        });
        Ok(())
    }

    fn clear_color_target(
        texture: &RhiTexture,
        clear_value: RhiColorClearValue,
    ) -> RhiResult<()> {
        let texel = texel::encode_color(texture.format(), clear_value.0)?;
        null_texture(texture)?.with_subresource(0, 0, |texels| texel::fill(texels, &texel))
    }

    fn clear_depth_target(
        texture: &RhiTexture,
        clear_value: RhiDepthStencilClearValue,
    ) -> RhiResult<()> {
        let texel =
            texel::encode_depth_stencil(texture.format(), clear_value.depth, clear_value.stencil)?;
        null_texture(texture)?.with_subresource(0, 0, |texels| texel::fill(texels, &texel))
    }

    fn bind_pipeline(
        &mut self,
        pipeline: &RhiPipeline,
    ) {
        if let Some(graphics_state) = pipeline.graphics_state() {
            self.dynamic_state = NullDynamicState {
                viewport: self.dynamic_state.viewport,
                scissor: self.dynamic_state.scissor,
                cull_mode: graphics_state.rasterizer_state.cull_mode,
                depth_compare_op: graphics_state.depth_state.depth_compare_op,
                blend_enable: graphics_state.blend_state.blend_enable,
                blend_equation: graphics_state.blend_state.equation,
            };
        }

        self.pipeline = Some(pipeline.clone());
    }

    fn check_texture_copy_offset(
        &self,
        buffer_offset: u64,
    ) -> RhiResult<()> {
        let alignment = self.device_info.upload_buffer_texture_alignment as u64;
        if alignment > 1 && buffer_offset % alignment != 0 {
            return Err(format!(
                "texture copy buffer offset {} is not aligned to {}",
                buffer_offset, alignment
            ))?;
        }
        Ok(())
    }

    fn read_indirect_args<T: bytemuck::Pod>(
        buffer: &RhiBuffer,
        byte_offset: u64,
        draw_count: u32,
    ) -> RhiResult<Vec<T>> {
        let stride = std::mem::size_of::<T>();
        let size = (stride * draw_count as usize) as u64;
        let data = null_buffer(buffer)?.read_bytes(byte_offset, size)?;
        Ok(data
            .chunks_exact(stride)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    fn check_descriptor_sets(
        &self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        for expected in &pipeline.binding_layout().sets {
            let descriptor_set = self
                .descriptor_sets
                .get(&expected.set_index)
                .ok_or_else(|| format!("descriptor set {} is not bound", expected.set_index))?;

            if !layouts_compatible(expected, descriptor_set.layout()) {
                return Err(format!(
                    "descriptor set {} does not match the layout of shader {}",
                    expected.set_index,
                    pipeline.shader().program().name()
                ))?;
            }

            let unwritten = descriptor_set.unwritten_bindings();
            if !unwritten.is_empty() {
                return Err(format!(
                    "descriptor set {} has bindings that were never written: {:?}",
                    expected.set_index, unwritten
                ))?;
            }
        }

        Ok(())
    }

    /// Highest vertex index an indexed draw reads
    fn max_indexed_vertex(
        &self,
        params: &NullDrawParams,
    ) -> RhiResult<Option<u64>> {
        let (buffer, byte_offset, index_type) = self
            .index_buffer
            .as_ref()
            .ok_or("indexed draw with no index buffer bound")?;

        let index_size = index_type.size_in_bytes();
        let data = null_buffer(buffer)?.read_bytes(
            byte_offset + params.first_element as u64 * index_size,
            params.element_count as u64 * index_size,
        )?;

        let max_index = match index_type {
            RhiIndexType::Uint16 => data
                .chunks_exact(2)
                .map(|x| u16::from_le_bytes([x[0], x[1]]) as i64)
                .max(),
            RhiIndexType::Uint32 => data
                .chunks_exact(4)
                .map(|x| u32::from_le_bytes([x[0], x[1], x[2], x[3]]) as i64)
                .max(),
        };

        match max_index {
            Some(max_index) => {
                let vertex = max_index + params.vertex_offset as i64;
                if vertex < 0 {
                    return Err(format!(
                        "vertex offset {} moves an index below zero",
                        params.vertex_offset
                    ))?;
                }
                Ok(Some(vertex as u64))
            }
            None => Ok(None),
        }
    }

    fn check_vertex_buffers(
        &self,
        graphics_state: &RhiGraphicsPipelineState,
        max_vertex: Option<u64>,
        params: &NullDrawParams,
    ) -> RhiResult<()> {
        let vertex_input = &graphics_state.vertex_input;
        for binding in &vertex_input.bindings {
            let (buffer, byte_offset) = self
                .vertex_buffers
                .get(&binding.binding)
                .ok_or_else(|| format!("vertex buffer binding {} is not bound", binding.binding))?;

            let last_element = match binding.rate {
                RhiVertexAttributeRate::Vertex => max_vertex,
                RhiVertexAttributeRate::Instance => {
                    if params.instance_count == 0 {
                        None
                    } else {
                        Some(params.first_instance as u64 + params.instance_count as u64 - 1)
                    }
                }
            };

            let last_element = match last_element {
                Some(x) => x,
                None => continue,
            };

            let attribute_end = vertex_input
                .attributes
                .iter()
                .filter(|x| x.binding == binding.binding)
                .map(|x| x.byte_offset as u64 + x.format.block_or_pixel_size_in_bytes() as u64)
                .max()
                .unwrap_or(0);

            let required = byte_offset + last_element * binding.stride as u64 + attribute_end;
            let available = buffer.buffer_def().size;
            if required > available {
                return Err(format!(
                    "draw reads {} bytes of vertex buffer binding {}, which holds {}",
                    required, binding.binding, available
                ))?;
            }
        }

        Ok(())
    }

    fn draw(
        &mut self,
        params: NullDrawParams,
    ) -> RhiResult<()> {
        let render_pass = self
            .render_pass
            .as_ref()
            .ok_or("draw outside of a render pass")?;
        let pipeline = self.pipeline.as_ref().ok_or("draw with no pipeline bound")?;
        let graphics_state = pipeline
            .graphics_state()
            .ok_or("draw with a compute pipeline bound")?;

        let pass_formats: Vec<RhiFormat> = render_pass
            .color_targets
            .iter()
            .map(|x| x.texture.format())
            .collect();
        if pass_formats != graphics_state.color_formats {
            return Err(format!(
                "pipeline renders to {:?} but the render pass has {:?}",
                graphics_state.color_formats, pass_formats
            ))?;
        }

        let pass_depth_format = render_pass.depth_target.as_ref().map(|x| x.texture.format());
        if graphics_state.depth_stencil_format.is_some()
            && graphics_state.depth_stencil_format != pass_depth_format
        {
            return Err(format!(
                "pipeline expects depth format {:?} but the render pass has {:?}",
                graphics_state.depth_stencil_format, pass_depth_format
            ))?;
        }

        self.check_descriptor_sets(pipeline)?;

        let max_vertex = if params.indexed {
            self.max_indexed_vertex(&params)?
        } else if params.element_count == 0 {
            None
        } else {
            Some(params.first_element as u64 + params.element_count as u64 - 1)
        };
        self.check_vertex_buffers(graphics_state, max_vertex, &params)?;

        let record = RhiNullDrawRecord {
            indexed: params.indexed,
            element_count: params.element_count,
            instance_count: params.instance_count,
            blend_enable: self.dynamic_state.blend_enable,
            blend_equation: self.dynamic_state.blend_equation,
            cull_mode: self.dynamic_state.cull_mode,
            depth_compare_op: self.dynamic_state.depth_compare_op,
            viewport: self.dynamic_state.viewport,
            scissor: self.dynamic_state.scissor,
            render_target_extents: render_pass.extents,
        };

        log::trace!("Executed draw {:?}", record);
        self.summary.draws += 1;
        self.summary.last_draw = Some(record);
        Ok(())
    }

    fn dispatch(
        &mut self,
        group_count: [u32; 3],
    ) -> RhiResult<()> {
        if self.render_pass.is_some() {
            return Err("dispatch inside a render pass")?;
        }

        let pipeline = self.pipeline.as_ref().ok_or("dispatch with no pipeline bound")?;
        if pipeline.pipeline_type() != RhiPipelineType::Compute {
            return Err("dispatch with a graphics pipeline bound")?;
        }

        self.check_descriptor_sets(pipeline)?;

        log::trace!("Executed dispatch {:?}", group_count);
        self.summary.dispatches += 1;
        Ok(())
    }

    fn blit(
        src: &RhiTexture,
        dst: &RhiTexture,
        params: &RhiCmdBlitParams,
    ) -> RhiResult<()> {
        if src.format() != dst.format() {
            return Err(format!(
                "blit between different formats {:?} and {:?}",
                src.format(),
                dst.format()
            ))?;
        }

        let bytes_per_texel = src.format().block_or_pixel_size_in_bytes() as usize;
        let src_mip_extents = src.extents().mip_extents(params.src_mip_level as u32);
        let dst_mip_extents = dst.extents().mip_extents(params.dst_mip_level as u32);
        let [src_min, src_max] = params.src_extents;
        let [dst_min, dst_max] = params.dst_extents;

        if src_max.width > src_mip_extents.width
            || src_max.height > src_mip_extents.height
            || dst_max.width > dst_mip_extents.width
            || dst_max.height > dst_mip_extents.height
            || src_min.width >= src_max.width
            || src_min.height >= src_max.height
            || dst_min.width >= dst_max.width
            || dst_min.height >= dst_max.height
        {
            return Err("blit region is empty or outside the texture")?;
        }

        // Copy the source out first, the source and destination may be mips of one texture
        let src_texels = null_texture(src)?.with_subresource(
            0,
            params.src_mip_level as u32,
            |x| x.clone(),
        )?;

        let src_width = (src_max.width - src_min.width) as u64;
        let src_height = (src_max.height - src_min.height) as u64;
        let dst_width = (dst_max.width - dst_min.width) as u64;
        let dst_height = (dst_max.height - dst_min.height) as u64;
        let src_row_pitch = src_mip_extents.width as usize * bytes_per_texel;
        let dst_row_pitch = dst_mip_extents.width as usize * bytes_per_texel;

        null_texture(dst)?.with_subresource(0, params.dst_mip_level as u32, |dst_texels| {
            for y in 0..dst_height {
                // Nearest sample at the texel center
                let src_y = src_min.height as u64 + ((2 * y + 1) * src_height) / (2 * dst_height);
                for x in 0..dst_width {
                    let src_x = src_min.width as u64 + ((2 * x + 1) * src_width) / (2 * dst_width);
                    let src_start =
                        src_y as usize * src_row_pitch + src_x as usize * bytes_per_texel;
                    let dst_start = (dst_min.height as usize + y as usize) * dst_row_pitch
                        + (dst_min.width as usize + x as usize) * bytes_per_texel;
                    dst_texels[dst_start..dst_start + bytes_per_texel]
                        .copy_from_slice(&src_texels[src_start..src_start + bytes_per_texel]);
                }
            }
        })
    }
}
