use crate::backends::null::RhiPipelineNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiPipelineVulkan;
use crate::*;

/// Fixed-function state of a graphics pipeline, captured when it is created. Binding the
/// pipeline re-applies all of it, overriding any dynamic state set since the previous bind.
#[derive(Clone, Debug, PartialEq)]
pub struct RhiGraphicsPipelineState {
    pub vertex_input: RhiVertexInput,
    pub blend_state: RhiBlendState,
    pub depth_state: RhiDepthState,
    pub rasterizer_state: RhiRasterizerState,
    pub primitive_topology: RhiPrimitiveTopology,
    pub color_formats: Vec<RhiFormat>,
    pub depth_stencil_format: Option<RhiFormat>,
    pub sample_count: RhiSampleCount,
}

impl RhiGraphicsPipelineState {
    /// Capture the state a definition describes. The shader must be a graphics program.
    pub fn from_def(pipeline_def: &RhiGraphicsPipelineDef) -> RhiResult<Self> {
        let program = pipeline_def.shader.program();
        if program.is_compute() {
            return Err(format!(
                "shader {} is a compute program and cannot back a graphics pipeline",
                program.name()
            ))?;
        }

        if !program
            .shader_stages()
            .contains(RhiShaderStageFlags::VERTEX)
        {
            return Err(format!("shader {} has no vertex stage", program.name()))?;
        }

        Ok(RhiGraphicsPipelineState {
            vertex_input: pipeline_def.vertex_layout.vertex_input(),
            blend_state: pipeline_def.blend_state.clone(),
            depth_state: pipeline_def.depth_state.clone(),
            rasterizer_state: pipeline_def.rasterizer_state.clone(),
            primitive_topology: pipeline_def.primitive_topology,
            color_formats: pipeline_def.color_formats.to_vec(),
            depth_stencil_format: pipeline_def.depth_stencil_format,
            sample_count: pipeline_def.sample_count,
        })
    }
}

/// Represents a complete GPU configuration for executing work.
///
/// There are two kinds of pipelines: graphics and compute. A pipeline is immutable, changing any
/// of its state means creating a new one. Cheap to clone.
#[derive(Clone, Debug)]
pub enum RhiPipeline {
    Null(RhiPipelineNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiPipelineVulkan),
}

impl RhiPipeline {
    /// Returns the type of pipeline that this is
    pub fn pipeline_type(&self) -> RhiPipelineType {
        match self {
            RhiPipeline::Null(inner) => inner.pipeline_type(),
            #[cfg(feature = "rhi-vulkan")]
            RhiPipeline::Vk(inner) => inner.pipeline_type(),
        }
    }

    /// The shader the pipeline was created with
    pub fn shader(&self) -> &RhiShader {
        match self {
            RhiPipeline::Null(inner) => inner.shader(),
            #[cfg(feature = "rhi-vulkan")]
            RhiPipeline::Vk(inner) => inner.shader(),
        }
    }

    pub fn binding_layout(&self) -> &RhiBindingLayout {
        self.shader().binding_layout()
    }

    /// Baked fixed-function state, for graphics pipelines
    pub fn graphics_state(&self) -> Option<&RhiGraphicsPipelineState> {
        match self {
            RhiPipeline::Null(inner) => inner.graphics_state(),
            #[cfg(feature = "rhi-vulkan")]
            RhiPipeline::Vk(inner) => inner.graphics_state(),
        }
    }

    pub fn null_pipeline(&self) -> Option<&RhiPipelineNull> {
        match self {
            RhiPipeline::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiPipeline::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_pipeline(&self) -> Option<&RhiPipelineVulkan> {
        match self {
            RhiPipeline::Null(_) => None,
            RhiPipeline::Vk(inner) => Some(inner),
        }
    }
}
