use super::{RhiDeviceContextVulkan, RhiShaderVulkan};
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use fnv::FnvHashMap;
use parking_lot::Mutex;
use std::sync::Arc;

// Cull mode and depth compare op are changed by the renderer between draws without a rebind
const DYNAMIC_STATES: [vk::DynamicState; 4] = [
    vk::DynamicState::VIEWPORT,
    vk::DynamicState::SCISSOR,
    vk::DynamicState::CULL_MODE,
    vk::DynamicState::DEPTH_COMPARE_OP,
];

fn stencil_op_state(
    fail_op: RhiStencilOp,
    pass_op: RhiStencilOp,
    depth_fail_op: RhiStencilOp,
    compare_op: RhiCompareOp,
    depth_state: &RhiDepthState,
) -> vk::StencilOpState {
    vk::StencilOpState {
        fail_op: fail_op.into(),
        pass_op: pass_op.into(),
        depth_fail_op: depth_fail_op.into(),
        compare_op: compare_op.into(),
        compare_mask: depth_state.stencil_read_mask as u32,
        write_mask: depth_state.stencil_write_mask as u32,
        reference: 0,
    }
}

fn create_graphics_vk_pipeline(
    device_context: &RhiDeviceContextVulkan,
    shader: &RhiShaderVulkan,
    state: &RhiGraphicsPipelineState,
    blend_state: &RhiBlendState,
) -> RhiResult<vk::Pipeline> {
    let stages: Vec<_> = shader
        .stages()
        .iter()
        .map(|stage| {
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(stage.stage.into())
                .module(stage.module)
                .name(&stage.entry_point)
                .build()
        })
        .collect();

    let binding_descriptions: Vec<_> = state
        .vertex_input
        .bindings
        .iter()
        .map(|binding| vk::VertexInputBindingDescription {
            binding: binding.binding,
            stride: binding.stride,
            input_rate: binding.rate.into(),
        })
        .collect();

    let attribute_descriptions: Vec<_> = state
        .vertex_input
        .attributes
        .iter()
        .map(|attribute| vk::VertexInputAttributeDescription {
            location: attribute.location,
            binding: attribute.binding,
            format: attribute.format.into(),
            offset: attribute.byte_offset,
        })
        .collect();

    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder()
        .vertex_binding_descriptions(&binding_descriptions)
        .vertex_attribute_descriptions(&attribute_descriptions);

    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
        .topology(state.primitive_topology.into());

    let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
        .viewport_count(1)
        .scissor_count(1);

    let rasterizer_state = &state.rasterizer_state;
    let rasterization_state = vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(rasterizer_state.depth_clamp_enable)
        .rasterizer_discard_enable(false)
        .polygon_mode(rasterizer_state.fill_mode.into())
        .cull_mode(rasterizer_state.cull_mode.into())
        .front_face(rasterizer_state.front_face.into())
        .depth_bias_enable(
            rasterizer_state.depth_bias != 0 || rasterizer_state.depth_bias_slope_scaled != 0.0,
        )
        .depth_bias_constant_factor(rasterizer_state.depth_bias as f32)
        .depth_bias_clamp(0.0)
        .depth_bias_slope_factor(rasterizer_state.depth_bias_slope_scaled)
        .line_width(1.0);

    let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
        .rasterization_samples(state.sample_count.into())
        .sample_shading_enable(false);

    let depth_state = &state.depth_state;
    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::builder()
        .depth_test_enable(depth_state.depth_test_enable)
        .depth_write_enable(depth_state.depth_write_enable)
        .depth_compare_op(depth_state.depth_compare_op.into())
        .depth_bounds_test_enable(false)
        .stencil_test_enable(depth_state.stencil_test_enable)
        .front(stencil_op_state(
            depth_state.front_stencil_fail_op,
            depth_state.front_stencil_pass_op,
            depth_state.front_depth_fail_op,
            depth_state.front_stencil_compare_op,
            depth_state,
        ))
        .back(stencil_op_state(
            depth_state.back_stencil_fail_op,
            depth_state.back_stencil_pass_op,
            depth_state.back_depth_fail_op,
            depth_state.back_stencil_compare_op,
            depth_state,
        ));

    let equation = &blend_state.equation;
    let attachment_blend_state = vk::PipelineColorBlendAttachmentState::builder()
        .blend_enable(blend_state.blend_enable)
        .src_color_blend_factor(equation.src_factor.into())
        .dst_color_blend_factor(equation.dst_factor.into())
        .color_blend_op(equation.blend_op.into())
        .src_alpha_blend_factor(equation.src_factor_alpha.into())
        .dst_alpha_blend_factor(equation.dst_factor_alpha.into())
        .alpha_blend_op(equation.blend_op_alpha.into())
        .color_write_mask(blend_state.masks.into())
        .build();
    let attachment_blend_states = vec![attachment_blend_state; state.color_formats.len()];
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
        .logic_op_enable(false)
        .attachments(&attachment_blend_states);

    let dynamic_state =
        vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&DYNAMIC_STATES);

    let color_formats: Vec<vk::Format> = state.color_formats.iter().map(|x| (*x).into()).collect();
    let (depth_format, stencil_format) = match state.depth_stencil_format {
        Some(format) => (
            if format.has_depth() { format.into() } else { vk::Format::UNDEFINED },
            if format.has_stencil() { format.into() } else { vk::Format::UNDEFINED },
        ),
        None => (vk::Format::UNDEFINED, vk::Format::UNDEFINED),
    };
    let mut rendering_info = vk::PipelineRenderingCreateInfo::builder()
        .color_attachment_formats(&color_formats)
        .depth_attachment_format(depth_format)
        .stencil_attachment_format(stencil_format);

    let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
        .stages(&stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .multisample_state(&multisample_state)
        .depth_stencil_state(&depth_stencil_state)
        .color_blend_state(&color_blend_state)
        .dynamic_state(&dynamic_state)
        .layout(shader.vk_pipeline_layout())
        .push_next(&mut rendering_info)
        .build();

    let pipelines = unsafe {
        device_context.device().create_graphics_pipelines(
            vk::PipelineCache::null(),
            &[pipeline_info],
            None,
        )
    }
    .map_err(|(_, e)| e)?;

    pipelines
        .into_iter()
        .next()
        .ok_or_else(|| "graphics pipeline creation returned no pipeline".into())
}

struct RhiPipelineVulkanInner {
    device_context: RhiDeviceContextVulkan,
    pipeline_type: RhiPipelineType,
    shader: RhiShader,
    graphics_state: Option<RhiGraphicsPipelineState>,
    pipeline: vk::Pipeline,
    // The same pipeline with a different blend state, built the first time a draw needs it
    blend_variants: Mutex<FnvHashMap<RhiBlendState, vk::Pipeline>>,
    _count_guard: RhiObjectCountGuard,
}

impl Drop for RhiPipelineVulkanInner {
    fn drop(&mut self) {
        let device = self.device_context.device();
        unsafe {
            for (_, variant) in self.blend_variants.lock().drain() {
                device.destroy_pipeline(variant, None);
            }
            device.destroy_pipeline(self.pipeline, None);
        }
    }
}

#[derive(Clone)]
pub struct RhiPipelineVulkan {
    inner: Arc<RhiPipelineVulkanInner>,
}

impl std::fmt::Debug for RhiPipelineVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiPipelineVulkan")
            .field("pipeline_type", &self.inner.pipeline_type)
            .field("pipeline", &self.inner.pipeline)
            .finish()
    }
}

impl RhiPipelineVulkan {
    pub(super) fn new_graphics_pipeline(
        device_context: &RhiDeviceContextVulkan,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<Self> {
        let shader = pipeline_def
            .shader
            .vk_shader()
            .ok_or("graphics pipeline shader was created by a different backend")?;

        let graphics_state = RhiGraphicsPipelineState::from_def(pipeline_def)?;
        let pipeline = create_graphics_vk_pipeline(
            device_context,
            shader,
            &graphics_state,
            &graphics_state.blend_state,
        )?;

        log::trace!(
            "Graphics pipeline {:?} created for shader {}",
            pipeline,
            shader.program().name()
        );

        Ok(RhiPipelineVulkan {
            inner: Arc::new(RhiPipelineVulkanInner {
                device_context: device_context.clone(),
                pipeline_type: RhiPipelineType::Graphics,
                shader: pipeline_def.shader.clone(),
                graphics_state: Some(graphics_state),
                pipeline,
                blend_variants: Mutex::new(FnvHashMap::default()),
                _count_guard: device_context.counters().track(RhiObjectKind::Pipeline),
            }),
        })
    }

    pub(super) fn new_compute_pipeline(
        device_context: &RhiDeviceContextVulkan,
        pipeline_def: &RhiComputePipelineDef,
    ) -> RhiResult<Self> {
        let shader = pipeline_def
            .shader
            .vk_shader()
            .ok_or("compute pipeline shader was created by a different backend")?;

        let compute_stage = shader
            .stages()
            .iter()
            .find(|x| x.stage.contains(RhiShaderStageFlags::COMPUTE))
            .ok_or_else(|| format!("shader {} has no compute stage", shader.program().name()))?;

        let stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(compute_stage.module)
            .name(&compute_stage.entry_point);

        let pipeline_info = vk::ComputePipelineCreateInfo::builder()
            .stage(*stage)
            .layout(shader.vk_pipeline_layout())
            .build();

        let pipelines = unsafe {
            device_context.device().create_compute_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_info],
                None,
            )
        }
        .map_err(|(_, e)| e)?;
        let pipeline = pipelines
            .into_iter()
            .next()
            .ok_or("compute pipeline creation returned no pipeline")?;

        log::trace!(
            "Compute pipeline {:?} created for shader {}",
            pipeline,
            shader.program().name()
        );

        Ok(RhiPipelineVulkan {
            inner: Arc::new(RhiPipelineVulkanInner {
                device_context: device_context.clone(),
                pipeline_type: RhiPipelineType::Compute,
                shader: pipeline_def.shader.clone(),
                graphics_state: None,
                pipeline,
                blend_variants: Mutex::new(FnvHashMap::default()),
                _count_guard: device_context.counters().track(RhiObjectKind::Pipeline),
            }),
        })
    }

    pub fn pipeline_type(&self) -> RhiPipelineType {
        self.inner.pipeline_type
    }

    pub fn shader(&self) -> &RhiShader {
        &self.inner.shader
    }

    pub fn graphics_state(&self) -> Option<&RhiGraphicsPipelineState> {
        self.inner.graphics_state.as_ref()
    }

    pub fn vk_pipeline(&self) -> vk::Pipeline {
        self.inner.pipeline
    }

    pub fn vk_bind_point(&self) -> vk::PipelineBindPoint {
        match self.inner.pipeline_type {
            RhiPipelineType::Graphics => vk::PipelineBindPoint::GRAPHICS,
            RhiPipelineType::Compute => vk::PipelineBindPoint::COMPUTE,
        }
    }

    pub(super) fn vk_shader(&self) -> RhiResult<&RhiShaderVulkan> {
        self.inner
            .shader
            .vk_shader()
            .ok_or_else(|| crate::device_context::backend_mismatch("shader"))
    }

    /// The native pipeline to bind for this blend state. The baked state maps to the pipeline
    /// itself, anything else to a variant.
    pub(super) fn blend_variant(
        &self,
        blend_state: &RhiBlendState,
    ) -> RhiResult<vk::Pipeline> {
        let graphics_state = self
            .inner
            .graphics_state
            .as_ref()
            .ok_or("compute pipelines have no blend state")?;

        if *blend_state == graphics_state.blend_state {
            return Ok(self.inner.pipeline);
        }

        let mut blend_variants = self.inner.blend_variants.lock();
        if let Some(variant) = blend_variants.get(blend_state) {
            return Ok(*variant);
        }

        let variant = create_graphics_vk_pipeline(
            &self.inner.device_context,
            self.vk_shader()?,
            graphics_state,
            blend_state,
        )?;
        log::debug!(
            "Created blend variant {:?} of pipeline {:?}",
            variant,
            self.inner.pipeline
        );
        blend_variants.insert(blend_state.clone(), variant);
        Ok(variant)
    }
}
