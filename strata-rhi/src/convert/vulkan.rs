use crate::{
    RhiAddressMode, RhiBindingType, RhiBlendFactor, RhiBlendOp, RhiColorClearValue,
    RhiColorFlags, RhiCompareOp, RhiCullMode, RhiDepthStencilClearValue, RhiFillMode,
    RhiFilterType, RhiFormat, RhiFrontFace, RhiIndexType, RhiLoadOp, RhiMemoryUsage,
    RhiMipMapMode, RhiPresentMode, RhiPrimitiveTopology, RhiQueueType, RhiResourceState,
    RhiSampleCount, RhiShaderStageFlags, RhiStencilOp, RhiStoreOp, RhiVertexAttributeRate,
};
use ash::vk;

impl From<RhiSampleCount> for vk::SampleCountFlags {
    fn from(sample_count: RhiSampleCount) -> Self {
        match sample_count {
            RhiSampleCount::SampleCount1 => vk::SampleCountFlags::TYPE_1,
            RhiSampleCount::SampleCount2 => vk::SampleCountFlags::TYPE_2,
            RhiSampleCount::SampleCount4 => vk::SampleCountFlags::TYPE_4,
            RhiSampleCount::SampleCount8 => vk::SampleCountFlags::TYPE_8,
            RhiSampleCount::SampleCount16 => vk::SampleCountFlags::TYPE_16,
        }
    }
}

impl From<RhiColorFlags> for vk::ColorComponentFlags {
    fn from(color_flags: RhiColorFlags) -> Self {
        let mut flags = vk::ColorComponentFlags::empty();
        if color_flags.intersects(RhiColorFlags::RED) {
            flags |= vk::ColorComponentFlags::R
        }
        if color_flags.intersects(RhiColorFlags::GREEN) {
            flags |= vk::ColorComponentFlags::G
        }
        if color_flags.intersects(RhiColorFlags::BLUE) {
            flags |= vk::ColorComponentFlags::B
        }
        if color_flags.intersects(RhiColorFlags::ALPHA) {
            flags |= vk::ColorComponentFlags::A
        }
        flags
    }
}

impl From<RhiMemoryUsage> for gpu_allocator::MemoryLocation {
    fn from(memory_usage: RhiMemoryUsage) -> Self {
        use gpu_allocator::MemoryLocation;
        match memory_usage {
            RhiMemoryUsage::Unknown => MemoryLocation::Unknown,
            RhiMemoryUsage::GpuOnly => MemoryLocation::GpuOnly,
            RhiMemoryUsage::CpuOnly => MemoryLocation::CpuToGpu,
            RhiMemoryUsage::CpuToGpu => MemoryLocation::CpuToGpu,
            RhiMemoryUsage::GpuToCpu => MemoryLocation::GpuToCpu,
        }
    }
}

impl From<RhiShaderStageFlags> for vk::ShaderStageFlags {
    fn from(stages: RhiShaderStageFlags) -> Self {
        if stages.contains(RhiShaderStageFlags::ALL) {
            return vk::ShaderStageFlags::ALL;
        }
        if stages.contains(RhiShaderStageFlags::ALL_GRAPHICS)
            && !stages.intersects(!RhiShaderStageFlags::ALL_GRAPHICS)
        {
            return vk::ShaderStageFlags::ALL_GRAPHICS;
        }

        let mapping = [
            (RhiShaderStageFlags::VERTEX, vk::ShaderStageFlags::VERTEX),
            (
                RhiShaderStageFlags::TESSELLATION_CONTROL,
                vk::ShaderStageFlags::TESSELLATION_CONTROL,
            ),
            (
                RhiShaderStageFlags::TESSELLATION_EVALUATION,
                vk::ShaderStageFlags::TESSELLATION_EVALUATION,
            ),
            (RhiShaderStageFlags::GEOMETRY, vk::ShaderStageFlags::GEOMETRY),
            (RhiShaderStageFlags::FRAGMENT, vk::ShaderStageFlags::FRAGMENT),
            (RhiShaderStageFlags::COMPUTE, vk::ShaderStageFlags::COMPUTE),
            (RhiShaderStageFlags::RAYGEN, vk::ShaderStageFlags::RAYGEN_KHR),
            (RhiShaderStageFlags::TASK, vk::ShaderStageFlags::TASK_EXT),
            (RhiShaderStageFlags::MESH, vk::ShaderStageFlags::MESH_EXT),
        ];

        let mut result = vk::ShaderStageFlags::empty();
        for (stage, vk_stage) in mapping {
            if stages.intersects(stage) {
                result |= vk_stage;
            }
        }
        result
    }
}

impl From<RhiVertexAttributeRate> for vk::VertexInputRate {
    fn from(rate: RhiVertexAttributeRate) -> Self {
        match rate {
            RhiVertexAttributeRate::Vertex => vk::VertexInputRate::VERTEX,
            RhiVertexAttributeRate::Instance => vk::VertexInputRate::INSTANCE,
        }
    }
}

impl From<RhiLoadOp> for vk::AttachmentLoadOp {
    fn from(load_op: RhiLoadOp) -> Self {
        match load_op {
            RhiLoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
            RhiLoadOp::Load => vk::AttachmentLoadOp::LOAD,
            RhiLoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        }
    }
}

impl From<RhiStoreOp> for vk::AttachmentStoreOp {
    fn from(store_op: RhiStoreOp) -> Self {
        match store_op {
            RhiStoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
            RhiStoreOp::Store => vk::AttachmentStoreOp::STORE,
        }
    }
}

impl From<RhiPrimitiveTopology> for vk::PrimitiveTopology {
    fn from(primitive_topology: RhiPrimitiveTopology) -> Self {
        match primitive_topology {
            RhiPrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
            RhiPrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
            RhiPrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
            RhiPrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            RhiPrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
            RhiPrimitiveTopology::PatchList => vk::PrimitiveTopology::PATCH_LIST,
        }
    }
}

impl From<RhiIndexType> for vk::IndexType {
    fn from(index_type: RhiIndexType) -> Self {
        match index_type {
            RhiIndexType::Uint32 => vk::IndexType::UINT32,
            RhiIndexType::Uint16 => vk::IndexType::UINT16,
        }
    }
}

impl From<RhiBlendFactor> for vk::BlendFactor {
    fn from(blend_factor: RhiBlendFactor) -> Self {
        match blend_factor {
            RhiBlendFactor::Zero => vk::BlendFactor::ZERO,
            RhiBlendFactor::One => vk::BlendFactor::ONE,
            RhiBlendFactor::SrcColor => vk::BlendFactor::SRC_COLOR,
            RhiBlendFactor::OneMinusSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
            RhiBlendFactor::DstColor => vk::BlendFactor::DST_COLOR,
            RhiBlendFactor::OneMinusDstColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
            RhiBlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
            RhiBlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
            RhiBlendFactor::DstAlpha => vk::BlendFactor::DST_ALPHA,
            RhiBlendFactor::OneMinusDstAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
            RhiBlendFactor::SrcAlphaSaturate => vk::BlendFactor::SRC_ALPHA_SATURATE,
            RhiBlendFactor::ConstantColor => vk::BlendFactor::CONSTANT_COLOR,
            RhiBlendFactor::OneMinusConstantColor => vk::BlendFactor::ONE_MINUS_CONSTANT_COLOR,
        }
    }
}

impl From<RhiBlendOp> for vk::BlendOp {
    fn from(blend_op: RhiBlendOp) -> Self {
        match blend_op {
            RhiBlendOp::Add => vk::BlendOp::ADD,
            RhiBlendOp::Subtract => vk::BlendOp::SUBTRACT,
            RhiBlendOp::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
            RhiBlendOp::Min => vk::BlendOp::MIN,
            RhiBlendOp::Max => vk::BlendOp::MAX,
        }
    }
}

impl From<RhiCompareOp> for vk::CompareOp {
    fn from(compare_op: RhiCompareOp) -> Self {
        match compare_op {
            RhiCompareOp::Never => vk::CompareOp::NEVER,
            RhiCompareOp::Less => vk::CompareOp::LESS,
            RhiCompareOp::Equal => vk::CompareOp::EQUAL,
            RhiCompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
            RhiCompareOp::Greater => vk::CompareOp::GREATER,
            RhiCompareOp::NotEqual => vk::CompareOp::NOT_EQUAL,
            RhiCompareOp::GreaterOrEqual => vk::CompareOp::GREATER_OR_EQUAL,
            RhiCompareOp::Always => vk::CompareOp::ALWAYS,
        }
    }
}

impl From<RhiStencilOp> for vk::StencilOp {
    fn from(stencil_op: RhiStencilOp) -> Self {
        match stencil_op {
            RhiStencilOp::Keep => vk::StencilOp::KEEP,
            RhiStencilOp::Zero => vk::StencilOp::ZERO,
            RhiStencilOp::Replace => vk::StencilOp::REPLACE,
            RhiStencilOp::IncrementAndClamp => vk::StencilOp::INCREMENT_AND_CLAMP,
            RhiStencilOp::DecrementAndClamp => vk::StencilOp::DECREMENT_AND_CLAMP,
            RhiStencilOp::Invert => vk::StencilOp::INVERT,
            RhiStencilOp::IncrementAndWrap => vk::StencilOp::INCREMENT_AND_WRAP,
            RhiStencilOp::DecrementAndWrap => vk::StencilOp::DECREMENT_AND_WRAP,
        }
    }
}

impl From<RhiCullMode> for vk::CullModeFlags {
    fn from(cull_mode: RhiCullMode) -> Self {
        match cull_mode {
            RhiCullMode::None => vk::CullModeFlags::NONE,
            RhiCullMode::Back => vk::CullModeFlags::BACK,
            RhiCullMode::Front => vk::CullModeFlags::FRONT,
            RhiCullMode::FrontAndBack => vk::CullModeFlags::FRONT_AND_BACK,
        }
    }
}

impl From<RhiFrontFace> for vk::FrontFace {
    fn from(front_face: RhiFrontFace) -> Self {
        match front_face {
            RhiFrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            RhiFrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        }
    }
}

impl From<RhiFillMode> for vk::PolygonMode {
    fn from(fill_mode: RhiFillMode) -> Self {
        match fill_mode {
            RhiFillMode::Solid => vk::PolygonMode::FILL,
            RhiFillMode::Wireframe => vk::PolygonMode::LINE,
        }
    }
}

impl From<RhiFilterType> for vk::Filter {
    fn from(filter_type: RhiFilterType) -> Self {
        match filter_type {
            RhiFilterType::Nearest => vk::Filter::NEAREST,
            RhiFilterType::Linear => vk::Filter::LINEAR,
        }
    }
}

impl From<RhiAddressMode> for vk::SamplerAddressMode {
    fn from(address_mode: RhiAddressMode) -> Self {
        match address_mode {
            RhiAddressMode::Mirror => vk::SamplerAddressMode::MIRRORED_REPEAT,
            RhiAddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
            RhiAddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
            RhiAddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
        }
    }
}

impl From<RhiMipMapMode> for vk::SamplerMipmapMode {
    fn from(mip_map_mode: RhiMipMapMode) -> Self {
        match mip_map_mode {
            RhiMipMapMode::Nearest => vk::SamplerMipmapMode::NEAREST,
            RhiMipMapMode::Linear => vk::SamplerMipmapMode::LINEAR,
        }
    }
}

impl From<RhiPresentMode> for vk::PresentModeKHR {
    fn from(present_mode: RhiPresentMode) -> Self {
        match present_mode {
            RhiPresentMode::Fifo => vk::PresentModeKHR::FIFO,
            RhiPresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
            RhiPresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
            RhiPresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        }
    }
}

impl From<RhiFormat> for vk::Format {
    fn from(format: RhiFormat) -> Self {
        match format {
            RhiFormat::UNDEFINED => vk::Format::UNDEFINED,
            RhiFormat::R8_UNORM => vk::Format::R8_UNORM,
            RhiFormat::R8G8_UNORM => vk::Format::R8G8_UNORM,
            RhiFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
            RhiFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
            RhiFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
            RhiFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
            RhiFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
            RhiFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
            RhiFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
            RhiFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
            RhiFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
            RhiFormat::R16_UINT => vk::Format::R16_UINT,
            RhiFormat::R32_UINT => vk::Format::R32_UINT,
            RhiFormat::R32G32_UINT => vk::Format::R32G32_UINT,
            RhiFormat::R32G32B32A32_UINT => vk::Format::R32G32B32A32_UINT,
            RhiFormat::D16_UNORM => vk::Format::D16_UNORM,
            RhiFormat::D32_SFLOAT => vk::Format::D32_SFLOAT,
            RhiFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
            RhiFormat::D32_SFLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
        }
    }
}

/// The inverse of the format table, for surface formats reported by the driver
pub fn format_from_vk(format: vk::Format) -> Option<RhiFormat> {
    Some(match format {
        vk::Format::R8_UNORM => RhiFormat::R8_UNORM,
        vk::Format::R8G8_UNORM => RhiFormat::R8G8_UNORM,
        vk::Format::R8G8B8A8_UNORM => RhiFormat::R8G8B8A8_UNORM,
        vk::Format::R8G8B8A8_SRGB => RhiFormat::R8G8B8A8_SRGB,
        vk::Format::B8G8R8A8_UNORM => RhiFormat::B8G8R8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB => RhiFormat::B8G8R8A8_SRGB,
        vk::Format::R16G16B16A16_SFLOAT => RhiFormat::R16G16B16A16_SFLOAT,
        _ => return None,
    })
}

impl From<RhiColorClearValue> for vk::ClearValue {
    fn from(clear_value: RhiColorClearValue) -> Self {
        vk::ClearValue {
            color: vk::ClearColorValue {
                float32: clear_value.0,
            },
        }
    }
}

impl From<RhiDepthStencilClearValue> for vk::ClearValue {
    fn from(clear_value: RhiDepthStencilClearValue) -> Self {
        vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: clear_value.depth,
                stencil: clear_value.stencil,
            },
        }
    }
}

impl From<RhiBindingType> for vk::DescriptorType {
    fn from(binding_type: RhiBindingType) -> Self {
        match binding_type {
            RhiBindingType::Sampler => vk::DescriptorType::SAMPLER,
            RhiBindingType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            RhiBindingType::SampledTexture => vk::DescriptorType::SAMPLED_IMAGE,
            RhiBindingType::StorageTexture => vk::DescriptorType::STORAGE_IMAGE,
            RhiBindingType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
            RhiBindingType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
            RhiBindingType::AccelerationStructure => {
                vk::DescriptorType::ACCELERATION_STRUCTURE_KHR
            }
        }
    }
}

pub fn resource_state_to_access_flags(state: RhiResourceState) -> vk::AccessFlags {
    let mut flags = vk::AccessFlags::empty();
    if state.intersects(RhiResourceState::COPY_SRC) {
        flags |= vk::AccessFlags::TRANSFER_READ;
    }

    if state.intersects(RhiResourceState::COPY_DST) {
        flags |= vk::AccessFlags::TRANSFER_WRITE;
    }

    if state.intersects(RhiResourceState::VERTEX_AND_CONSTANT_BUFFER) {
        flags |= vk::AccessFlags::UNIFORM_READ | vk::AccessFlags::VERTEX_ATTRIBUTE_READ;
    }

    if state.intersects(RhiResourceState::INDEX_BUFFER) {
        flags |= vk::AccessFlags::INDEX_READ;
    }

    if state.intersects(RhiResourceState::UNORDERED_ACCESS) {
        flags |= vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE;
    }

    if state.intersects(RhiResourceState::INDIRECT_ARGUMENT) {
        flags |= vk::AccessFlags::INDIRECT_COMMAND_READ;
    }

    if state.intersects(RhiResourceState::RENDER_TARGET) {
        flags |= vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE;
    }

    if state.intersects(RhiResourceState::DEPTH_WRITE) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;
    }

    if state.intersects(RhiResourceState::DEPTH_READ) {
        flags |= vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ;
    }

    if state.intersects(RhiResourceState::SHADER_RESOURCE) {
        flags |= vk::AccessFlags::SHADER_READ;
    }

    if state.intersects(RhiResourceState::PRESENT) {
        flags |= vk::AccessFlags::MEMORY_READ;
    }

    flags
}

/// `None` when the state combines flags no single layout satisfies
pub fn resource_state_to_image_layout(state: RhiResourceState) -> Option<vk::ImageLayout> {
    if state.intersects(RhiResourceState::COPY_SRC) {
        Some(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
    } else if state.intersects(RhiResourceState::COPY_DST) {
        Some(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
    } else if state.intersects(RhiResourceState::RENDER_TARGET) {
        Some(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
    } else if state.intersects(RhiResourceState::DEPTH_WRITE) {
        Some(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
    } else if state.intersects(RhiResourceState::DEPTH_READ) {
        Some(vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL)
    } else if state.intersects(RhiResourceState::UNORDERED_ACCESS) {
        Some(vk::ImageLayout::GENERAL)
    } else if state.intersects(RhiResourceState::SHADER_RESOURCE) {
        Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    } else if state.intersects(RhiResourceState::PRESENT) {
        Some(vk::ImageLayout::PRESENT_SRC_KHR)
    } else if state.intersects(RhiResourceState::COMMON) {
        Some(vk::ImageLayout::GENERAL)
    } else if state == RhiResourceState::UNDEFINED {
        Some(vk::ImageLayout::UNDEFINED)
    } else {
        None
    }
}

/// Pipeline stages that touch memory accessed with `access_flags` on a queue of this type
pub fn determine_pipeline_stage_flags(
    queue_type: RhiQueueType,
    access_flags: vk::AccessFlags,
) -> vk::PipelineStageFlags {
    let mut flags = vk::PipelineStageFlags::empty();

    match queue_type {
        RhiQueueType::Graphics => {
            if access_flags
                .intersects(vk::AccessFlags::INDEX_READ | vk::AccessFlags::VERTEX_ATTRIBUTE_READ)
            {
                flags |= vk::PipelineStageFlags::VERTEX_INPUT;
            }

            if access_flags.intersects(
                vk::AccessFlags::UNIFORM_READ
                    | vk::AccessFlags::SHADER_READ
                    | vk::AccessFlags::SHADER_WRITE,
            ) {
                flags |= vk::PipelineStageFlags::VERTEX_SHADER
                    | vk::PipelineStageFlags::FRAGMENT_SHADER
                    | vk::PipelineStageFlags::COMPUTE_SHADER;
            }

            if access_flags.intersects(vk::AccessFlags::INPUT_ATTACHMENT_READ) {
                flags |= vk::PipelineStageFlags::FRAGMENT_SHADER;
            }

            if access_flags.intersects(
                vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            ) {
                flags |= vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
            }

            if access_flags.intersects(
                vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ) {
                flags |= vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS
                    | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS;
            }
        }
        RhiQueueType::Compute => {
            if access_flags.intersects(
                vk::AccessFlags::INDEX_READ
                    | vk::AccessFlags::VERTEX_ATTRIBUTE_READ
                    | vk::AccessFlags::INPUT_ATTACHMENT_READ
                    | vk::AccessFlags::COLOR_ATTACHMENT_READ
                    | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            ) {
                return vk::PipelineStageFlags::ALL_COMMANDS;
            }

            if access_flags.intersects(
                vk::AccessFlags::UNIFORM_READ
                    | vk::AccessFlags::SHADER_READ
                    | vk::AccessFlags::SHADER_WRITE,
            ) {
                flags |= vk::PipelineStageFlags::COMPUTE_SHADER;
            }
        }
        RhiQueueType::Transfer => return vk::PipelineStageFlags::ALL_COMMANDS,
    }

    if access_flags.intersects(vk::AccessFlags::INDIRECT_COMMAND_READ) {
        flags |= vk::PipelineStageFlags::DRAW_INDIRECT;
    }

    if access_flags.intersects(vk::AccessFlags::TRANSFER_READ | vk::AccessFlags::TRANSFER_WRITE) {
        flags |= vk::PipelineStageFlags::TRANSFER;
    }

    if access_flags.intersects(vk::AccessFlags::HOST_READ | vk::AccessFlags::HOST_WRITE) {
        flags |= vk::PipelineStageFlags::HOST;
    }

    if flags.is_empty() {
        flags = vk::PipelineStageFlags::TOP_OF_PIPE;
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_stage_combinations() {
        let vs_fs: vk::ShaderStageFlags =
            (RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT).into();
        assert_eq!(
            vs_fs,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
        );
        let all_graphics: vk::ShaderStageFlags = RhiShaderStageFlags::ALL_GRAPHICS.into();
        assert_eq!(all_graphics, vk::ShaderStageFlags::ALL_GRAPHICS);
    }

    #[test]
    fn layouts_follow_most_specific_state() {
        assert_eq!(
            resource_state_to_image_layout(RhiResourceState::COPY_DST),
            Some(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
        );
        assert_eq!(
            resource_state_to_image_layout(RhiResourceState::UNDEFINED),
            Some(vk::ImageLayout::UNDEFINED)
        );
        assert_eq!(
            resource_state_to_image_layout(RhiResourceState::SHADER_RESOURCE),
            Some(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        );
    }

    #[test]
    fn transfer_queue_waits_on_all_commands() {
        assert_eq!(
            determine_pipeline_stage_flags(
                RhiQueueType::Transfer,
                vk::AccessFlags::TRANSFER_WRITE
            ),
            vk::PipelineStageFlags::ALL_COMMANDS
        );
        assert_eq!(
            determine_pipeline_stage_flags(RhiQueueType::Graphics, vk::AccessFlags::empty()),
            vk::PipelineStageFlags::TOP_OF_PIPE
        );
    }

    #[test]
    fn format_table_round_trips_surface_formats() {
        for format in [RhiFormat::B8G8R8A8_SRGB, RhiFormat::R8G8B8A8_UNORM] {
            let vk_format: vk::Format = format.into();
            assert_eq!(format_from_vk(vk_format), Some(format));
        }
    }
}
