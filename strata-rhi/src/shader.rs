use crate::backends::null::RhiShaderNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiShaderVulkan;
use crate::{RhiBindingLayout, RhiPipelineType, RhiShaderProgram, RhiShaderStageFlags};

/// A linked shader program on a device: one native module per stage plus the binding layout they
/// share. Pipelines are created from a shader.
///
/// Cheap to clone. A shader replaced by `RhiShaderCompiler::reload` stays alive for as long as
/// pipelines created from it do.
#[derive(Clone, Debug)]
pub enum RhiShader {
    Null(RhiShaderNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiShaderVulkan),
}

impl RhiShader {
    pub fn program(&self) -> &RhiShaderProgram {
        match self {
            RhiShader::Null(inner) => inner.program(),
            #[cfg(feature = "rhi-vulkan")]
            RhiShader::Vk(inner) => inner.program(),
        }
    }

    pub fn binding_layout(&self) -> &RhiBindingLayout {
        self.program().binding_layout()
    }

    pub fn shader_stages(&self) -> RhiShaderStageFlags {
        self.program().shader_stages()
    }

    pub fn pipeline_type(&self) -> RhiPipelineType {
        if self.program().is_compute() {
            RhiPipelineType::Compute
        } else {
            RhiPipelineType::Graphics
        }
    }

    pub fn null_shader(&self) -> Option<&RhiShaderNull> {
        match self {
            RhiShader::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiShader::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_shader(&self) -> Option<&RhiShaderVulkan> {
        match self {
            RhiShader::Null(_) => None,
            RhiShader::Vk(inner) => Some(inner),
        }
    }
}
