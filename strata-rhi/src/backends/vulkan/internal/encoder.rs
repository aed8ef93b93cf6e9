//! Translates frozen command lists into a native command buffer.
//!
//! Recording happens against `RhiCommandRecorder`, which validates every command. Encoding runs at
//! submit time, so by now a list is known to be well formed and only native handles can be missing.

use super::image_aspect_mask;
use crate::backends::vulkan::{RhiBufferVulkan, RhiPipelineVulkan, RhiTextureVulkan};
use crate::commands::{RhiColorTarget, RhiCommand, RhiDepthStencilTarget};
use crate::convert::vulkan::{
    determine_pipeline_stage_flags, resource_state_to_access_flags, resource_state_to_image_layout,
};
use crate::device_context::backend_mismatch;
use crate::*;
use ash::vk;

fn vk_buffer(buffer: &RhiBuffer) -> RhiResult<&RhiBufferVulkan> {
    buffer.vk_buffer().ok_or_else(|| backend_mismatch("buffer"))
}

fn vk_texture(texture: &RhiTexture) -> RhiResult<&RhiTextureVulkan> {
    texture
        .vk_texture()
        .ok_or_else(|| backend_mismatch("texture"))
}

fn image_layout(state: RhiResourceState) -> RhiResult<vk::ImageLayout> {
    resource_state_to_image_layout(state).ok_or_else(|| {
        RhiError::StringError(format!("no single image layout satisfies state {:?}", state))
    })
}

fn to_offset_3d(extents: RhiExtents3D) -> vk::Offset3D {
    vk::Offset3D {
        x: extents.width as i32,
        y: extents.height as i32,
        z: extents.depth as i32,
    }
}

struct VkBoundPipeline {
    pipeline: RhiPipeline,
    // The blend state draws should use, starts as the pipeline's baked state
    blend_state: Option<RhiBlendState>,
    bound_native: vk::Pipeline,
}

pub(in crate::backends::vulkan) struct VkCommandEncoder<'a> {
    device: &'a ash::Device,
    command_buffer: vk::CommandBuffer,
    queue_type: RhiQueueType,
    render_area: Option<vk::Rect2D>,
    color_attachment_count: u32,
    depth_aspect: vk::ImageAspectFlags,
    bound: Option<VkBoundPipeline>,
}

impl<'a> VkCommandEncoder<'a> {
    pub(in crate::backends::vulkan) fn new(
        device: &'a ash::Device,
        command_buffer: vk::CommandBuffer,
        queue_type: RhiQueueType,
    ) -> Self {
        VkCommandEncoder {
            device,
            command_buffer,
            queue_type,
            render_area: None,
            color_attachment_count: 0,
            depth_aspect: vk::ImageAspectFlags::empty(),
            bound: None,
        }
    }

    pub(in crate::backends::vulkan) fn encode(
        &mut self,
        commands: &[RhiCommand],
    ) -> RhiResult<()> {
        for (index, command) in commands.iter().enumerate() {
            self.encode_command(command).map_err(|e| {
                RhiError::StringError(format!(
                    "encoding {} (command {} of {}) failed: {}",
                    command.name(),
                    index,
                    commands.len(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    fn bound_vk_pipeline(&self) -> RhiResult<&RhiPipelineVulkan> {
        let bound = self.bound.as_ref().ok_or("no pipeline is bound")?;
        bound
            .pipeline
            .vk_pipeline()
            .ok_or_else(|| backend_mismatch("pipeline"))
    }

    fn encode_command(
        &mut self,
        command: &RhiCommand,
    ) -> RhiResult<()> {
        let device = self.device;
        let command_buffer = self.command_buffer;

        match command {
            RhiCommand::BeginRenderPass {
                color_targets,
                depth_target,
            } => self.begin_render_pass(color_targets, depth_target.as_ref()),
            RhiCommand::EndRenderPass => {
                unsafe {
                    device.cmd_end_rendering(command_buffer);
                }
                self.render_area = None;
                Ok(())
            }
            RhiCommand::ClearColor(clear_value) => {
                let rect = self.clear_rect()?;
                let attachments: Vec<_> = (0..self.color_attachment_count)
                    .map(|color_attachment| vk::ClearAttachment {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        color_attachment,
                        clear_value: (*clear_value).into(),
                    })
                    .collect();
                unsafe {
                    device.cmd_clear_attachments(command_buffer, &attachments, &[rect]);
                }
                Ok(())
            }
            RhiCommand::ClearDepthStencil(clear_value) => {
                let rect = self.clear_rect()?;
                if self.depth_aspect.is_empty() {
                    return Err("the render pass has no depth attachment")?;
                }
                let attachment = vk::ClearAttachment {
                    aspect_mask: self.depth_aspect,
                    color_attachment: 0,
                    clear_value: (*clear_value).into(),
                };
                unsafe {
                    device.cmd_clear_attachments(command_buffer, &[attachment], &[rect]);
                }
                Ok(())
            }
            RhiCommand::BindPipeline(pipeline) => self.bind_pipeline(pipeline),
            RhiCommand::BindVertexBuffers {
                first_binding,
                bindings,
            } => {
                let mut buffers = Vec::with_capacity(bindings.len());
                let mut offsets = Vec::with_capacity(bindings.len());
                for (buffer, byte_offset) in bindings {
                    buffers.push(vk_buffer(buffer)?.vk_buffer());
                    offsets.push(*byte_offset);
                }
                unsafe {
                    device.cmd_bind_vertex_buffers(
                        command_buffer,
                        *first_binding,
                        &buffers,
                        &offsets,
                    );
                }
                Ok(())
            }
            RhiCommand::BindIndexBuffer {
                buffer,
                byte_offset,
                index_type,
            } => {
                unsafe {
                    device.cmd_bind_index_buffer(
                        command_buffer,
                        vk_buffer(buffer)?.vk_buffer(),
                        *byte_offset,
                        (*index_type).into(),
                    );
                }
                Ok(())
            }
            RhiCommand::BindDescriptorSet {
                set_index,
                descriptor_set,
            } => {
                let descriptor_set = descriptor_set
                    .vk_descriptor_set()
                    .ok_or_else(|| backend_mismatch("descriptor set"))?;
                let pipeline = self.bound_vk_pipeline()?;
                let layout = pipeline.vk_shader()?.vk_pipeline_layout();
                unsafe {
                    device.cmd_bind_descriptor_sets(
                        command_buffer,
                        pipeline.vk_bind_point(),
                        layout,
                        *set_index,
                        &[descriptor_set.vk_descriptor_set()],
                        &[],
                    );
                }
                Ok(())
            }
            RhiCommand::PushConstants { offset, data } => {
                let shader = self.bound_vk_pipeline()?.vk_shader()?;
                let stages = shader.push_constant_stages(*offset, data.len() as u32);
                unsafe {
                    device.cmd_push_constants(
                        command_buffer,
                        shader.vk_pipeline_layout(),
                        stages,
                        *offset,
                        data,
                    );
                }
                Ok(())
            }
            RhiCommand::SetViewport(viewport) => {
                // Flipped so that +y is up in clip space, matching the other backends
                let viewport = vk::Viewport {
                    x: viewport.x,
                    y: viewport.y + viewport.height,
                    width: viewport.width,
                    height: -viewport.height,
                    min_depth: viewport.depth_min,
                    max_depth: viewport.depth_max,
                };
                unsafe {
                    device.cmd_set_viewport(command_buffer, 0, &[viewport]);
                }
                Ok(())
            }
            RhiCommand::SetScissor(scissor) => {
                let scissor = vk::Rect2D {
                    offset: vk::Offset2D {
                        x: scissor.x as i32,
                        y: scissor.y as i32,
                    },
                    extent: vk::Extent2D {
                        width: scissor.width,
                        height: scissor.height,
                    },
                };
                unsafe {
                    device.cmd_set_scissor(command_buffer, 0, &[scissor]);
                }
                Ok(())
            }
            RhiCommand::SetCullMode(cull_mode) => {
                unsafe {
                    device.cmd_set_cull_mode(command_buffer, (*cull_mode).into());
                }
                Ok(())
            }
            RhiCommand::SetDepthCompareOp(compare_op) => {
                unsafe {
                    device.cmd_set_depth_compare_op(command_buffer, (*compare_op).into());
                }
                Ok(())
            }
            RhiCommand::SetBlendEnable(blend_enable) => {
                let bound_blend_state = self.bound.as_mut().and_then(|x| x.blend_state.as_mut());
                if let Some(blend_state) = bound_blend_state {
                    blend_state.blend_enable = *blend_enable;
                }
                Ok(())
            }
            RhiCommand::SetBlendEquation(equation) => {
                let bound_blend_state = self.bound.as_mut().and_then(|x| x.blend_state.as_mut());
                if let Some(blend_state) = bound_blend_state {
                    blend_state.equation = *equation;
                }
                Ok(())
            }
            RhiCommand::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                self.flush_blend_state()?;
                unsafe {
                    device.cmd_draw(
                        command_buffer,
                        *vertex_count,
                        *instance_count,
                        *first_vertex,
                        *first_instance,
                    );
                }
                Ok(())
            }
            RhiCommand::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => {
                self.flush_blend_state()?;
                unsafe {
                    device.cmd_draw_indexed(
                        command_buffer,
                        *index_count,
                        *instance_count,
                        *first_index,
                        *vertex_offset,
                        *first_instance,
                    );
                }
                Ok(())
            }
            RhiCommand::DrawIndirect {
                buffer,
                byte_offset,
                draw_count,
            } => {
                self.flush_blend_state()?;
                unsafe {
                    device.cmd_draw_indirect(
                        command_buffer,
                        vk_buffer(buffer)?.vk_buffer(),
                        *byte_offset,
                        *draw_count,
                        std::mem::size_of::<RhiDrawIndirectCommand>() as u32,
                    );
                }
                Ok(())
            }
            RhiCommand::DrawIndexedIndirect {
                buffer,
                byte_offset,
                draw_count,
            } => {
                self.flush_blend_state()?;
                unsafe {
                    device.cmd_draw_indexed_indirect(
                        command_buffer,
                        vk_buffer(buffer)?.vk_buffer(),
                        *byte_offset,
                        *draw_count,
                        std::mem::size_of::<RhiDrawIndexedIndirectCommand>() as u32,
                    );
                }
                Ok(())
            }
            RhiCommand::Dispatch { group_count } => {
                unsafe {
                    device.cmd_dispatch(
                        command_buffer,
                        group_count[0],
                        group_count[1],
                        group_count[2],
                    );
                }
                Ok(())
            }
            RhiCommand::DispatchIndirect {
                buffer,
                byte_offset,
            } => {
                unsafe {
                    device.cmd_dispatch_indirect(
                        command_buffer,
                        vk_buffer(buffer)?.vk_buffer(),
                        *byte_offset,
                    );
                }
                Ok(())
            }
            RhiCommand::ResourceBarrier {
                buffer_barriers,
                texture_barriers,
            } => self.resource_barrier(buffer_barriers, texture_barriers),
            RhiCommand::CopyBufferToBuffer {
                src,
                dst,
                src_offset,
                dst_offset,
                size,
            } => {
                let region = vk::BufferCopy {
                    src_offset: *src_offset,
                    dst_offset: *dst_offset,
                    size: *size,
                };
                unsafe {
                    device.cmd_copy_buffer(
                        command_buffer,
                        vk_buffer(src)?.vk_buffer(),
                        vk_buffer(dst)?.vk_buffer(),
                        &[region],
                    );
                }
                Ok(())
            }
            RhiCommand::CopyBufferToTexture { src, dst, params } => {
                let region = Self::buffer_image_copy(dst, params);
                unsafe {
                    device.cmd_copy_buffer_to_image(
                        command_buffer,
                        vk_buffer(src)?.vk_buffer(),
                        vk_texture(dst)?.vk_image(),
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &[region],
                    );
                }
                Ok(())
            }
            RhiCommand::CopyTextureToBuffer { src, dst, params } => {
                let region = Self::buffer_image_copy(src, params);
                unsafe {
                    device.cmd_copy_image_to_buffer(
                        command_buffer,
                        vk_texture(src)?.vk_image(),
                        vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                        vk_buffer(dst)?.vk_buffer(),
                        &[region],
                    );
                }
                Ok(())
            }
            RhiCommand::UpdateBuffer {
                buffer,
                offset,
                data,
            } => {
                // vkCmdUpdateBuffer limits
                if offset % 4 != 0 || data.len() % 4 != 0 || data.len() > 65536 {
                    return Err(format!(
                        "inline buffer updates need 4 byte aligned offset and size up to 65536 bytes, got offset {} size {}",
                        offset,
                        data.len()
                    ))?;
                }
                unsafe {
                    device.cmd_update_buffer(
                        command_buffer,
                        vk_buffer(buffer)?.vk_buffer(),
                        *offset,
                        data,
                    );
                }
                Ok(())
            }
            RhiCommand::Blit { src, dst, params } => self.blit(src, dst, params),
            RhiCommand::ExecuteCommandBuffers(command_lists) => {
                for commands in command_lists {
                    self.encode(commands)?;
                }
                Ok(())
            }
        }
    }

    fn clear_rect(&self) -> RhiResult<vk::ClearRect> {
        let rect = self.render_area.ok_or("no render pass is open")?;
        Ok(vk::ClearRect {
            rect,
            base_array_layer: 0,
            layer_count: 1,
        })
    }

    fn begin_render_pass(
        &mut self,
        color_targets: &[RhiColorTarget],
        depth_target: Option<&RhiDepthStencilTarget>,
    ) -> RhiResult<()> {
        let extents = color_targets
            .first()
            .map(|x| x.texture.extents().to_2d())
            .or_else(|| depth_target.map(|x| x.texture.extents().to_2d()))
            .ok_or("a render pass needs at least one attachment")?;

        let mut color_attachments = Vec::with_capacity(color_targets.len());
        for color_target in color_targets {
            let image_view = vk_texture(&color_target.texture)?
                .vk_render_target_view()
                .ok_or("color attachment was not created as a render target")?;
            color_attachments.push(
                vk::RenderingAttachmentInfo::builder()
                    .image_view(image_view)
                    .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                    .load_op(color_target.load_op.into())
                    .store_op(color_target.store_op.into())
                    .clear_value(color_target.clear_value.into())
                    .build(),
            );
        }

        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D {
                width: extents.width,
                height: extents.height,
            },
        };

        let mut depth_attachment = None;
        let mut stencil_attachment = None;
        let mut depth_aspect = vk::ImageAspectFlags::empty();
        if let Some(depth_target) = depth_target {
            let format = depth_target.texture.format();
            let image_view = vk_texture(&depth_target.texture)?
                .vk_render_target_view()
                .ok_or("depth attachment was not created as a render target")?;
            depth_aspect = image_aspect_mask(format);

            if format.has_depth() {
                depth_attachment = Some(
                    vk::RenderingAttachmentInfo::builder()
                        .image_view(image_view)
                        .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                        .load_op(depth_target.depth_load_op.into())
                        .store_op(depth_target.depth_store_op.into())
                        .clear_value(depth_target.clear_value.into())
                        .build(),
                );
            }

            if format.has_stencil() {
                stencil_attachment = Some(
                    vk::RenderingAttachmentInfo::builder()
                        .image_view(image_view)
                        .image_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                        .load_op(depth_target.stencil_load_op.into())
                        .store_op(depth_target.stencil_store_op.into())
                        .clear_value(depth_target.clear_value.into())
                        .build(),
                );
            }
        }

        let mut rendering_info = vk::RenderingInfo::builder()
            .render_area(render_area)
            .layer_count(1)
            .color_attachments(&color_attachments);
        if let Some(depth_attachment) = depth_attachment.as_ref() {
            rendering_info = rendering_info.depth_attachment(depth_attachment);
        }
        if let Some(stencil_attachment) = stencil_attachment.as_ref() {
            rendering_info = rendering_info.stencil_attachment(stencil_attachment);
        }

        let viewport = vk::Viewport {
            x: 0.0,
            y: extents.height as f32,
            width: extents.width as f32,
            height: -(extents.height as f32),
            min_depth: 0.0,
            max_depth: 1.0,
        };

        unsafe {
            self.device
                .cmd_begin_rendering(self.command_buffer, &rendering_info);
            // Viewport and scissor are dynamic, start each pass covering the whole target
            self.device
                .cmd_set_viewport(self.command_buffer, 0, &[viewport]);
            self.device
                .cmd_set_scissor(self.command_buffer, 0, &[render_area]);
        }

        self.render_area = Some(render_area);
        self.color_attachment_count = color_targets.len() as u32;
        self.depth_aspect = depth_aspect;
        Ok(())
    }

    fn bind_pipeline(
        &mut self,
        pipeline: &RhiPipeline,
    ) -> RhiResult<()> {
        let vk_pipeline = pipeline
            .vk_pipeline()
            .ok_or_else(|| backend_mismatch("pipeline"))?;
        let native = vk_pipeline.vk_pipeline();

        unsafe {
            self.device
                .cmd_bind_pipeline(self.command_buffer, vk_pipeline.vk_bind_point(), native);

            // Dynamic state is not reset by a bind, put back what the pipeline was built with
            if let Some(graphics_state) = vk_pipeline.graphics_state() {
                self.device.cmd_set_cull_mode(
                    self.command_buffer,
                    graphics_state.rasterizer_state.cull_mode.into(),
                );
                self.device.cmd_set_depth_compare_op(
                    self.command_buffer,
                    graphics_state.depth_state.depth_compare_op.into(),
                );
            }
        }

        self.bound = Some(VkBoundPipeline {
            pipeline: pipeline.clone(),
            blend_state: vk_pipeline.graphics_state().map(|x| x.blend_state.clone()),
            bound_native: native,
        });
        Ok(())
    }

    // Blend overrides are emulated with pipeline variants, bind the right one before drawing
    fn flush_blend_state(&mut self) -> RhiResult<()> {
        let bound = self.bound.as_ref().ok_or("no pipeline is bound")?;
        let blend_state = match &bound.blend_state {
            Some(blend_state) => blend_state,
            None => return Ok(()),
        };

        let vk_pipeline = bound
            .pipeline
            .vk_pipeline()
            .ok_or_else(|| backend_mismatch("pipeline"))?;
        let native = vk_pipeline.blend_variant(blend_state)?;
        if native != bound.bound_native {
            unsafe {
                self.device.cmd_bind_pipeline(
                    self.command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    native,
                );
            }
            if let Some(bound) = self.bound.as_mut() {
                bound.bound_native = native;
            }
        }
        Ok(())
    }

    fn resource_barrier(
        &self,
        buffer_barriers: &[crate::commands::RhiRecordedBufferBarrier],
        texture_barriers: &[crate::commands::RhiRecordedTextureBarrier],
    ) -> RhiResult<()> {
        let mut src_access_flags = vk::AccessFlags::empty();
        let mut dst_access_flags = vk::AccessFlags::empty();

        let mut vk_buffer_barriers = Vec::with_capacity(buffer_barriers.len());
        for barrier in buffer_barriers {
            let src_access_mask = resource_state_to_access_flags(barrier.src_state);
            let dst_access_mask = resource_state_to_access_flags(barrier.dst_state);
            src_access_flags |= src_access_mask;
            dst_access_flags |= dst_access_mask;

            vk_buffer_barriers.push(
                vk::BufferMemoryBarrier::builder()
                    .src_access_mask(src_access_mask)
                    .dst_access_mask(dst_access_mask)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .buffer(vk_buffer(&barrier.buffer)?.vk_buffer())
                    .offset(0)
                    .size(vk::WHOLE_SIZE)
                    .build(),
            );
        }

        let mut vk_image_barriers = Vec::with_capacity(texture_barriers.len());
        for barrier in texture_barriers {
            let src_access_mask = resource_state_to_access_flags(barrier.src_state);
            let dst_access_mask = resource_state_to_access_flags(barrier.dst_state);
            src_access_flags |= src_access_mask;
            dst_access_flags |= dst_access_mask;

            let subresource_range = vk::ImageSubresourceRange {
                aspect_mask: image_aspect_mask(barrier.texture.format()),
                base_mip_level: barrier.mip_slice.map(|x| x as u32).unwrap_or(0),
                level_count: barrier
                    .mip_slice
                    .map(|_| 1)
                    .unwrap_or(vk::REMAINING_MIP_LEVELS),
                base_array_layer: barrier.array_slice.map(|x| x as u32).unwrap_or(0),
                layer_count: barrier
                    .array_slice
                    .map(|_| 1)
                    .unwrap_or(vk::REMAINING_ARRAY_LAYERS),
            };

            vk_image_barriers.push(
                vk::ImageMemoryBarrier::builder()
                    .src_access_mask(src_access_mask)
                    .dst_access_mask(dst_access_mask)
                    .old_layout(image_layout(barrier.src_state)?)
                    .new_layout(image_layout(barrier.dst_state)?)
                    .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                    .image(vk_texture(&barrier.texture)?.vk_image())
                    .subresource_range(subresource_range)
                    .build(),
            );
        }

        let mut src_stage_mask = determine_pipeline_stage_flags(self.queue_type, src_access_flags);
        let mut dst_stage_mask = determine_pipeline_stage_flags(self.queue_type, dst_access_flags);
        if src_stage_mask.is_empty() {
            src_stage_mask = vk::PipelineStageFlags::TOP_OF_PIPE;
        }
        if dst_stage_mask.is_empty() {
            dst_stage_mask = vk::PipelineStageFlags::BOTTOM_OF_PIPE;
        }

        unsafe {
            self.device.cmd_pipeline_barrier(
                self.command_buffer,
                src_stage_mask,
                dst_stage_mask,
                vk::DependencyFlags::empty(),
                &[],
                &vk_buffer_barriers,
                &vk_image_barriers,
            );
        }
        Ok(())
    }

    // Rows are tightly packed
    fn buffer_image_copy(
        texture: &RhiTexture,
        params: &RhiCmdCopyBufferToTextureParams,
    ) -> vk::BufferImageCopy {
        let extents = texture.extents().mip_extents(params.mip_level as u32);
        vk::BufferImageCopy {
            buffer_offset: params.buffer_offset,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: image_aspect_mask(texture.format()),
                mip_level: params.mip_level as u32,
                base_array_layer: params.array_layer as u32,
                layer_count: 1,
            },
            image_offset: vk::Offset3D { x: 0, y: 0, z: 0 },
            image_extent: vk::Extent3D {
                width: extents.width,
                height: extents.height,
                depth: extents.depth,
            },
        }
    }

    fn blit(
        &self,
        src: &RhiTexture,
        dst: &RhiTexture,
        params: &RhiCmdBlitParams,
    ) -> RhiResult<()> {
        let region = vk::ImageBlit {
            src_subresource: vk::ImageSubresourceLayers {
                aspect_mask: image_aspect_mask(src.format()),
                mip_level: params.src_mip_level as u32,
                base_array_layer: 0,
                layer_count: 1,
            },
            src_offsets: [
                to_offset_3d(params.src_extents[0]),
                to_offset_3d(params.src_extents[1]),
            ],
            dst_subresource: vk::ImageSubresourceLayers {
                aspect_mask: image_aspect_mask(dst.format()),
                mip_level: params.dst_mip_level as u32,
                base_array_layer: 0,
                layer_count: 1,
            },
            dst_offsets: [
                to_offset_3d(params.dst_extents[0]),
                to_offset_3d(params.dst_extents[1]),
            ],
        };

        unsafe {
            self.device.cmd_blit_image(
                self.command_buffer,
                vk_texture(src)?.vk_image(),
                image_layout(params.src_state)?,
                vk_texture(dst)?.vk_image(),
                image_layout(params.dst_state)?,
                &[region],
                params.filter.into(),
            );
        }
        Ok(())
    }
}
