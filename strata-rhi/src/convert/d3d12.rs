use crate::{
    RhiAddressMode, RhiBindingType, RhiBlendFactor, RhiBlendOp, RhiColorFlags, RhiCompareOp,
    RhiCullMode, RhiFillMode, RhiFilterType, RhiFormat, RhiMipMapMode, RhiPresentMode,
    RhiPrimitiveTopology, RhiResourceState, RhiShaderStageFlags, RhiStencilOp,
};

#[allow(non_camel_case_types)]
pub type D3D12_ENUM = i32;
#[allow(non_camel_case_types)]
pub type DXGI_FORMAT = u32;

#[allow(missing_docs)]
pub mod consts {
    use super::{D3D12_ENUM, DXGI_FORMAT};

    pub const D3D12_TEXTURE_ADDRESS_MODE_WRAP: D3D12_ENUM = 1;
    pub const D3D12_TEXTURE_ADDRESS_MODE_MIRROR: D3D12_ENUM = 2;
    pub const D3D12_TEXTURE_ADDRESS_MODE_CLAMP: D3D12_ENUM = 3;
    pub const D3D12_TEXTURE_ADDRESS_MODE_BORDER: D3D12_ENUM = 4;

    pub const D3D12_SHADER_VISIBILITY_ALL: D3D12_ENUM = 0;
    pub const D3D12_SHADER_VISIBILITY_VERTEX: D3D12_ENUM = 1;
    pub const D3D12_SHADER_VISIBILITY_HULL: D3D12_ENUM = 2;
    pub const D3D12_SHADER_VISIBILITY_DOMAIN: D3D12_ENUM = 3;
    pub const D3D12_SHADER_VISIBILITY_GEOMETRY: D3D12_ENUM = 4;
    pub const D3D12_SHADER_VISIBILITY_PIXEL: D3D12_ENUM = 5;
    pub const D3D12_SHADER_VISIBILITY_AMPLIFICATION: D3D12_ENUM = 6;
    pub const D3D12_SHADER_VISIBILITY_MESH: D3D12_ENUM = 7;

    pub const D3D12_DESCRIPTOR_RANGE_TYPE_SRV: D3D12_ENUM = 0;
    pub const D3D12_DESCRIPTOR_RANGE_TYPE_UAV: D3D12_ENUM = 1;
    pub const D3D12_DESCRIPTOR_RANGE_TYPE_CBV: D3D12_ENUM = 2;
    pub const D3D12_DESCRIPTOR_RANGE_TYPE_SAMPLER: D3D12_ENUM = 3;

    pub const D3D12_RESOURCE_STATE_COMMON: D3D12_ENUM = 0;
    pub const D3D12_RESOURCE_STATE_VERTEX_AND_CONSTANT_BUFFER: D3D12_ENUM = 0x1;
    pub const D3D12_RESOURCE_STATE_INDEX_BUFFER: D3D12_ENUM = 0x2;
    pub const D3D12_RESOURCE_STATE_RENDER_TARGET: D3D12_ENUM = 0x4;
    pub const D3D12_RESOURCE_STATE_UNORDERED_ACCESS: D3D12_ENUM = 0x8;
    pub const D3D12_RESOURCE_STATE_DEPTH_WRITE: D3D12_ENUM = 0x10;
    pub const D3D12_RESOURCE_STATE_DEPTH_READ: D3D12_ENUM = 0x20;
    pub const D3D12_RESOURCE_STATE_NON_PIXEL_SHADER_RESOURCE: D3D12_ENUM = 0x40;
    pub const D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE: D3D12_ENUM = 0x80;
    pub const D3D12_RESOURCE_STATE_INDIRECT_ARGUMENT: D3D12_ENUM = 0x200;
    pub const D3D12_RESOURCE_STATE_COPY_DEST: D3D12_ENUM = 0x400;
    pub const D3D12_RESOURCE_STATE_COPY_SOURCE: D3D12_ENUM = 0x800;
    pub const D3D12_RESOURCE_STATE_GENERIC_READ: D3D12_ENUM = 0xAC3;
    pub const D3D12_RESOURCE_STATE_PRESENT: D3D12_ENUM = 0;

    pub const D3D_PRIMITIVE_TOPOLOGY_POINTLIST: D3D12_ENUM = 1;
    pub const D3D_PRIMITIVE_TOPOLOGY_LINELIST: D3D12_ENUM = 2;
    pub const D3D_PRIMITIVE_TOPOLOGY_LINESTRIP: D3D12_ENUM = 3;
    pub const D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST: D3D12_ENUM = 4;
    pub const D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP: D3D12_ENUM = 5;
    pub const D3D_PRIMITIVE_TOPOLOGY_1_CONTROL_POINT_PATCHLIST: D3D12_ENUM = 33;

    pub const D3D12_PRIMITIVE_TOPOLOGY_TYPE_POINT: D3D12_ENUM = 1;
    pub const D3D12_PRIMITIVE_TOPOLOGY_TYPE_LINE: D3D12_ENUM = 2;
    pub const D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE: D3D12_ENUM = 3;
    pub const D3D12_PRIMITIVE_TOPOLOGY_TYPE_PATCH: D3D12_ENUM = 4;

    pub const D3D12_FILL_MODE_WIREFRAME: D3D12_ENUM = 2;
    pub const D3D12_FILL_MODE_SOLID: D3D12_ENUM = 3;

    pub const D3D12_CULL_MODE_NONE: D3D12_ENUM = 1;
    pub const D3D12_CULL_MODE_FRONT: D3D12_ENUM = 2;
    pub const D3D12_CULL_MODE_BACK: D3D12_ENUM = 3;

    pub const D3D12_STENCIL_OP_KEEP: D3D12_ENUM = 1;
    pub const D3D12_STENCIL_OP_ZERO: D3D12_ENUM = 2;
    pub const D3D12_STENCIL_OP_REPLACE: D3D12_ENUM = 3;
    pub const D3D12_STENCIL_OP_INCR_SAT: D3D12_ENUM = 4;
    pub const D3D12_STENCIL_OP_DECR_SAT: D3D12_ENUM = 5;
    pub const D3D12_STENCIL_OP_INVERT: D3D12_ENUM = 6;
    pub const D3D12_STENCIL_OP_INCR: D3D12_ENUM = 7;
    pub const D3D12_STENCIL_OP_DECR: D3D12_ENUM = 8;

    pub const D3D12_COMPARISON_FUNC_NEVER: D3D12_ENUM = 1;
    pub const D3D12_COMPARISON_FUNC_LESS: D3D12_ENUM = 2;
    pub const D3D12_COMPARISON_FUNC_EQUAL: D3D12_ENUM = 3;
    pub const D3D12_COMPARISON_FUNC_LESS_EQUAL: D3D12_ENUM = 4;
    pub const D3D12_COMPARISON_FUNC_GREATER: D3D12_ENUM = 5;
    pub const D3D12_COMPARISON_FUNC_NOT_EQUAL: D3D12_ENUM = 6;
    pub const D3D12_COMPARISON_FUNC_GREATER_EQUAL: D3D12_ENUM = 7;
    pub const D3D12_COMPARISON_FUNC_ALWAYS: D3D12_ENUM = 8;

    pub const D3D12_BLEND_OP_ADD: D3D12_ENUM = 1;
    pub const D3D12_BLEND_OP_SUBTRACT: D3D12_ENUM = 2;
    pub const D3D12_BLEND_OP_REV_SUBTRACT: D3D12_ENUM = 3;
    pub const D3D12_BLEND_OP_MIN: D3D12_ENUM = 4;
    pub const D3D12_BLEND_OP_MAX: D3D12_ENUM = 5;

    pub const D3D12_BLEND_ZERO: D3D12_ENUM = 1;
    pub const D3D12_BLEND_ONE: D3D12_ENUM = 2;
    pub const D3D12_BLEND_SRC_COLOR: D3D12_ENUM = 3;
    pub const D3D12_BLEND_INV_SRC_COLOR: D3D12_ENUM = 4;
    pub const D3D12_BLEND_SRC_ALPHA: D3D12_ENUM = 5;
    pub const D3D12_BLEND_INV_SRC_ALPHA: D3D12_ENUM = 6;
    pub const D3D12_BLEND_DEST_ALPHA: D3D12_ENUM = 7;
    pub const D3D12_BLEND_INV_DEST_ALPHA: D3D12_ENUM = 8;
    pub const D3D12_BLEND_DEST_COLOR: D3D12_ENUM = 9;
    pub const D3D12_BLEND_INV_DEST_COLOR: D3D12_ENUM = 10;
    pub const D3D12_BLEND_SRC_ALPHA_SAT: D3D12_ENUM = 11;
    pub const D3D12_BLEND_BLEND_FACTOR: D3D12_ENUM = 14;
    pub const D3D12_BLEND_INV_BLEND_FACTOR: D3D12_ENUM = 15;

    // Filters are bitfields: mip in bit 0, mag in bit 2, min in bit 4
    pub const D3D12_FILTER_MIP_LINEAR: D3D12_ENUM = 0x1;
    pub const D3D12_FILTER_MAG_LINEAR: D3D12_ENUM = 0x4;
    pub const D3D12_FILTER_MIN_LINEAR: D3D12_ENUM = 0x10;
    pub const D3D12_FILTER_ANISOTROPIC: D3D12_ENUM = 0x55;
    pub const D3D12_FILTER_COMPARISON: D3D12_ENUM = 0x80;

    pub const DXGI_FORMAT_UNKNOWN: DXGI_FORMAT = 0;
    pub const DXGI_FORMAT_R32G32B32A32_FLOAT: DXGI_FORMAT = 2;
    pub const DXGI_FORMAT_R32G32B32A32_UINT: DXGI_FORMAT = 3;
    pub const DXGI_FORMAT_R32G32B32_FLOAT: DXGI_FORMAT = 6;
    pub const DXGI_FORMAT_R16G16B16A16_FLOAT: DXGI_FORMAT = 10;
    pub const DXGI_FORMAT_R32G32_FLOAT: DXGI_FORMAT = 16;
    pub const DXGI_FORMAT_R32G32_UINT: DXGI_FORMAT = 17;
    pub const DXGI_FORMAT_D32_FLOAT_S8X24_UINT: DXGI_FORMAT = 20;
    pub const DXGI_FORMAT_R8G8B8A8_UNORM: DXGI_FORMAT = 28;
    pub const DXGI_FORMAT_R8G8B8A8_UNORM_SRGB: DXGI_FORMAT = 29;
    pub const DXGI_FORMAT_D32_FLOAT: DXGI_FORMAT = 40;
    pub const DXGI_FORMAT_R32_FLOAT: DXGI_FORMAT = 41;
    pub const DXGI_FORMAT_R32_UINT: DXGI_FORMAT = 42;
    pub const DXGI_FORMAT_D24_UNORM_S8_UINT: DXGI_FORMAT = 45;
    pub const DXGI_FORMAT_R8G8_UNORM: DXGI_FORMAT = 49;
    pub const DXGI_FORMAT_D16_UNORM: DXGI_FORMAT = 55;
    pub const DXGI_FORMAT_R16_UINT: DXGI_FORMAT = 57;
    pub const DXGI_FORMAT_R8_UNORM: DXGI_FORMAT = 61;
    pub const DXGI_FORMAT_B8G8R8A8_UNORM: DXGI_FORMAT = 87;
    pub const DXGI_FORMAT_B8G8R8A8_UNORM_SRGB: DXGI_FORMAT = 91;

    pub const DXGI_PRESENT_ALLOW_TEARING: u32 = 0x200;
}

use consts::*;

pub fn address_mode(address_mode: RhiAddressMode) -> D3D12_ENUM {
    match address_mode {
        RhiAddressMode::Mirror => D3D12_TEXTURE_ADDRESS_MODE_MIRROR,
        RhiAddressMode::Repeat => D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        RhiAddressMode::ClampToEdge => D3D12_TEXTURE_ADDRESS_MODE_CLAMP,
        RhiAddressMode::ClampToBorder => D3D12_TEXTURE_ADDRESS_MODE_BORDER,
    }
}

/// Root signature parameters are visible to exactly one stage or to all of them. Anything used by
/// more than one graphics stage, or by compute, is visible to all.
pub fn shader_visibility(stages: RhiShaderStageFlags) -> D3D12_ENUM {
    if stages.intersects(RhiShaderStageFlags::COMPUTE | RhiShaderStageFlags::RAYGEN) {
        return D3D12_SHADER_VISIBILITY_ALL;
    }

    let single_stage_visibility = [
        (RhiShaderStageFlags::VERTEX, D3D12_SHADER_VISIBILITY_VERTEX),
        (
            RhiShaderStageFlags::TESSELLATION_CONTROL,
            D3D12_SHADER_VISIBILITY_HULL,
        ),
        (
            RhiShaderStageFlags::TESSELLATION_EVALUATION,
            D3D12_SHADER_VISIBILITY_DOMAIN,
        ),
        (
            RhiShaderStageFlags::GEOMETRY,
            D3D12_SHADER_VISIBILITY_GEOMETRY,
        ),
        (RhiShaderStageFlags::FRAGMENT, D3D12_SHADER_VISIBILITY_PIXEL),
        (
            RhiShaderStageFlags::TASK,
            D3D12_SHADER_VISIBILITY_AMPLIFICATION,
        ),
        (RhiShaderStageFlags::MESH, D3D12_SHADER_VISIBILITY_MESH),
    ];

    let mut stage_count = 0;
    let mut visibility = D3D12_SHADER_VISIBILITY_ALL;
    for (stage, stage_visibility) in single_stage_visibility {
        if stages.intersects(stage) {
            stage_count += 1;
            visibility = stage_visibility;
        }
    }

    if stage_count == 1 {
        visibility
    } else {
        D3D12_SHADER_VISIBILITY_ALL
    }
}

/// The descriptor table range a binding lives in. Combined image samplers take an SRV here; the
/// sampler half goes into a separate sampler table.
pub fn descriptor_range_type(binding_type: RhiBindingType) -> D3D12_ENUM {
    match binding_type {
        RhiBindingType::UniformBuffer => D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
        RhiBindingType::StorageBuffer | RhiBindingType::StorageTexture => {
            D3D12_DESCRIPTOR_RANGE_TYPE_UAV
        }
        RhiBindingType::Sampler => D3D12_DESCRIPTOR_RANGE_TYPE_SAMPLER,
        RhiBindingType::SampledTexture
        | RhiBindingType::CombinedImageSampler
        | RhiBindingType::AccelerationStructure => D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
    }
}

pub fn resource_state(resource_state: RhiResourceState) -> D3D12_ENUM {
    if resource_state == RhiResourceState::GENERIC_READ {
        return D3D12_RESOURCE_STATE_GENERIC_READ;
    }
    if resource_state == RhiResourceState::COMMON {
        return D3D12_RESOURCE_STATE_COMMON;
    }
    if resource_state == RhiResourceState::PRESENT {
        return D3D12_RESOURCE_STATE_PRESENT;
    }

    let mapping = [
        (
            RhiResourceState::VERTEX_AND_CONSTANT_BUFFER,
            D3D12_RESOURCE_STATE_VERTEX_AND_CONSTANT_BUFFER,
        ),
        (
            RhiResourceState::INDEX_BUFFER,
            D3D12_RESOURCE_STATE_INDEX_BUFFER,
        ),
        (
            RhiResourceState::RENDER_TARGET,
            D3D12_RESOURCE_STATE_RENDER_TARGET,
        ),
        (
            RhiResourceState::UNORDERED_ACCESS,
            D3D12_RESOURCE_STATE_UNORDERED_ACCESS,
        ),
        (
            RhiResourceState::DEPTH_WRITE,
            D3D12_RESOURCE_STATE_DEPTH_WRITE,
        ),
        (RhiResourceState::DEPTH_READ, D3D12_RESOURCE_STATE_DEPTH_READ),
        (
            RhiResourceState::INDIRECT_ARGUMENT,
            D3D12_RESOURCE_STATE_INDIRECT_ARGUMENT,
        ),
        (RhiResourceState::COPY_DST, D3D12_RESOURCE_STATE_COPY_DEST),
        (RhiResourceState::COPY_SRC, D3D12_RESOURCE_STATE_COPY_SOURCE),
        (
            RhiResourceState::NON_PIXEL_SHADER_RESOURCE,
            D3D12_RESOURCE_STATE_NON_PIXEL_SHADER_RESOURCE,
        ),
        (
            RhiResourceState::PIXEL_SHADER_RESOURCE,
            D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
        ),
    ];

    let mut state = D3D12_RESOURCE_STATE_COMMON;
    for (flag, d3d12_state) in mapping {
        if resource_state.intersects(flag) {
            state |= d3d12_state;
        }
    }
    state
}

pub fn primitive_topology(primitive_topology: RhiPrimitiveTopology) -> D3D12_ENUM {
    match primitive_topology {
        RhiPrimitiveTopology::PointList => D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
        RhiPrimitiveTopology::LineList => D3D_PRIMITIVE_TOPOLOGY_LINELIST,
        RhiPrimitiveTopology::LineStrip => D3D_PRIMITIVE_TOPOLOGY_LINESTRIP,
        RhiPrimitiveTopology::TriangleList => D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        RhiPrimitiveTopology::TriangleStrip => D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
        // Control point count comes from the hull shader, this assumes one
        RhiPrimitiveTopology::PatchList => D3D_PRIMITIVE_TOPOLOGY_1_CONTROL_POINT_PATCHLIST,
    }
}

pub fn primitive_topology_type(primitive_topology: RhiPrimitiveTopology) -> D3D12_ENUM {
    match primitive_topology {
        RhiPrimitiveTopology::PointList => D3D12_PRIMITIVE_TOPOLOGY_TYPE_POINT,
        RhiPrimitiveTopology::LineList | RhiPrimitiveTopology::LineStrip => {
            D3D12_PRIMITIVE_TOPOLOGY_TYPE_LINE
        }
        RhiPrimitiveTopology::TriangleList | RhiPrimitiveTopology::TriangleStrip => {
            D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE
        }
        RhiPrimitiveTopology::PatchList => D3D12_PRIMITIVE_TOPOLOGY_TYPE_PATCH,
    }
}

pub fn fill_mode(fill_mode: RhiFillMode) -> D3D12_ENUM {
    match fill_mode {
        RhiFillMode::Solid => D3D12_FILL_MODE_SOLID,
        RhiFillMode::Wireframe => D3D12_FILL_MODE_WIREFRAME,
    }
}

/// D3D12 cannot cull both faces. `None` for `FrontAndBack`, callers skip the draw instead.
pub fn cull_mode(cull_mode: RhiCullMode) -> Option<D3D12_ENUM> {
    match cull_mode {
        RhiCullMode::None => Some(D3D12_CULL_MODE_NONE),
        RhiCullMode::Back => Some(D3D12_CULL_MODE_BACK),
        RhiCullMode::Front => Some(D3D12_CULL_MODE_FRONT),
        RhiCullMode::FrontAndBack => None,
    }
}

pub fn stencil_op(stencil_op: RhiStencilOp) -> D3D12_ENUM {
    match stencil_op {
        RhiStencilOp::Keep => D3D12_STENCIL_OP_KEEP,
        RhiStencilOp::Zero => D3D12_STENCIL_OP_ZERO,
        RhiStencilOp::Replace => D3D12_STENCIL_OP_REPLACE,
        RhiStencilOp::IncrementAndClamp => D3D12_STENCIL_OP_INCR_SAT,
        RhiStencilOp::DecrementAndClamp => D3D12_STENCIL_OP_DECR_SAT,
        RhiStencilOp::Invert => D3D12_STENCIL_OP_INVERT,
        RhiStencilOp::IncrementAndWrap => D3D12_STENCIL_OP_INCR,
        RhiStencilOp::DecrementAndWrap => D3D12_STENCIL_OP_DECR,
    }
}

pub fn compare_op(compare_op: RhiCompareOp) -> D3D12_ENUM {
    match compare_op {
        RhiCompareOp::Never => D3D12_COMPARISON_FUNC_NEVER,
        RhiCompareOp::Less => D3D12_COMPARISON_FUNC_LESS,
        RhiCompareOp::Equal => D3D12_COMPARISON_FUNC_EQUAL,
        RhiCompareOp::LessOrEqual => D3D12_COMPARISON_FUNC_LESS_EQUAL,
        RhiCompareOp::Greater => D3D12_COMPARISON_FUNC_GREATER,
        RhiCompareOp::NotEqual => D3D12_COMPARISON_FUNC_NOT_EQUAL,
        RhiCompareOp::GreaterOrEqual => D3D12_COMPARISON_FUNC_GREATER_EQUAL,
        RhiCompareOp::Always => D3D12_COMPARISON_FUNC_ALWAYS,
    }
}

pub fn blend_op(blend_op: RhiBlendOp) -> D3D12_ENUM {
    match blend_op {
        RhiBlendOp::Add => D3D12_BLEND_OP_ADD,
        RhiBlendOp::Subtract => D3D12_BLEND_OP_SUBTRACT,
        RhiBlendOp::ReverseSubtract => D3D12_BLEND_OP_REV_SUBTRACT,
        RhiBlendOp::Min => D3D12_BLEND_OP_MIN,
        RhiBlendOp::Max => D3D12_BLEND_OP_MAX,
    }
}

pub fn blend_factor(blend_factor: RhiBlendFactor) -> D3D12_ENUM {
    match blend_factor {
        RhiBlendFactor::Zero => D3D12_BLEND_ZERO,
        RhiBlendFactor::One => D3D12_BLEND_ONE,
        RhiBlendFactor::SrcColor => D3D12_BLEND_SRC_COLOR,
        RhiBlendFactor::OneMinusSrcColor => D3D12_BLEND_INV_SRC_COLOR,
        RhiBlendFactor::DstColor => D3D12_BLEND_DEST_COLOR,
        RhiBlendFactor::OneMinusDstColor => D3D12_BLEND_INV_DEST_COLOR,
        RhiBlendFactor::SrcAlpha => D3D12_BLEND_SRC_ALPHA,
        RhiBlendFactor::OneMinusSrcAlpha => D3D12_BLEND_INV_SRC_ALPHA,
        RhiBlendFactor::DstAlpha => D3D12_BLEND_DEST_ALPHA,
        RhiBlendFactor::OneMinusDstAlpha => D3D12_BLEND_INV_DEST_ALPHA,
        RhiBlendFactor::SrcAlphaSaturate => D3D12_BLEND_SRC_ALPHA_SAT,
        RhiBlendFactor::ConstantColor => D3D12_BLEND_BLEND_FACTOR,
        RhiBlendFactor::OneMinusConstantColor => D3D12_BLEND_INV_BLEND_FACTOR,
    }
}

/// `D3D12_COLOR_WRITE_ENABLE` uses the same bit per channel
pub fn color_write_mask(color_flags: RhiColorFlags) -> u8 {
    color_flags.bits()
}

pub fn filter(
    min_filter: RhiFilterType,
    mag_filter: RhiFilterType,
    mip_map_mode: RhiMipMapMode,
    max_anisotropy: f32,
    compare_enable: bool,
) -> D3D12_ENUM {
    let mut filter = if max_anisotropy > 1.0 {
        D3D12_FILTER_ANISOTROPIC
    } else {
        let mut filter = 0;
        if min_filter == RhiFilterType::Linear {
            filter |= D3D12_FILTER_MIN_LINEAR;
        }
        if mag_filter == RhiFilterType::Linear {
            filter |= D3D12_FILTER_MAG_LINEAR;
        }
        if mip_map_mode == RhiMipMapMode::Linear {
            filter |= D3D12_FILTER_MIP_LINEAR;
        }
        filter
    };

    if compare_enable {
        filter |= D3D12_FILTER_COMPARISON;
    }

    filter
}

pub fn format(format: RhiFormat) -> DXGI_FORMAT {
    match format {
        RhiFormat::UNDEFINED => DXGI_FORMAT_UNKNOWN,
        RhiFormat::R8_UNORM => DXGI_FORMAT_R8_UNORM,
        RhiFormat::R8G8_UNORM => DXGI_FORMAT_R8G8_UNORM,
        RhiFormat::R8G8B8A8_UNORM => DXGI_FORMAT_R8G8B8A8_UNORM,
        RhiFormat::R8G8B8A8_SRGB => DXGI_FORMAT_R8G8B8A8_UNORM_SRGB,
        RhiFormat::B8G8R8A8_UNORM => DXGI_FORMAT_B8G8R8A8_UNORM,
        RhiFormat::B8G8R8A8_SRGB => DXGI_FORMAT_B8G8R8A8_UNORM_SRGB,
        RhiFormat::R16G16B16A16_SFLOAT => DXGI_FORMAT_R16G16B16A16_FLOAT,
        RhiFormat::R32_SFLOAT => DXGI_FORMAT_R32_FLOAT,
        RhiFormat::R32G32_SFLOAT => DXGI_FORMAT_R32G32_FLOAT,
        RhiFormat::R32G32B32_SFLOAT => DXGI_FORMAT_R32G32B32_FLOAT,
        RhiFormat::R32G32B32A32_SFLOAT => DXGI_FORMAT_R32G32B32A32_FLOAT,
        RhiFormat::R16_UINT => DXGI_FORMAT_R16_UINT,
        RhiFormat::R32_UINT => DXGI_FORMAT_R32_UINT,
        RhiFormat::R32G32_UINT => DXGI_FORMAT_R32G32_UINT,
        RhiFormat::R32G32B32A32_UINT => DXGI_FORMAT_R32G32B32A32_UINT,
        RhiFormat::D16_UNORM => DXGI_FORMAT_D16_UNORM,
        RhiFormat::D32_SFLOAT => DXGI_FORMAT_D32_FLOAT,
        RhiFormat::D24_UNORM_S8_UINT => DXGI_FORMAT_D24_UNORM_S8_UINT,
        RhiFormat::D32_SFLOAT_S8_UINT => DXGI_FORMAT_D32_FLOAT_S8X24_UINT,
    }
}

/// Sync interval and present flags passed to `IDXGISwapChain::Present`
pub fn present_parameters(present_mode: RhiPresentMode) -> (u32, u32) {
    match present_mode {
        RhiPresentMode::Fifo | RhiPresentMode::FifoRelaxed => (1, 0),
        RhiPresentMode::Mailbox => (0, 0),
        RhiPresentMode::Immediate => (0, DXGI_PRESENT_ALLOW_TEARING),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_is_all_unless_single_graphics_stage() {
        assert_eq!(
            shader_visibility(RhiShaderStageFlags::FRAGMENT),
            D3D12_SHADER_VISIBILITY_PIXEL
        );
        assert_eq!(
            shader_visibility(RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT),
            D3D12_SHADER_VISIBILITY_ALL
        );
        assert_eq!(
            shader_visibility(RhiShaderStageFlags::COMPUTE),
            D3D12_SHADER_VISIBILITY_ALL
        );
    }

    #[test]
    fn resource_state_combines_flags() {
        assert_eq!(
            resource_state(RhiResourceState::GENERIC_READ),
            D3D12_RESOURCE_STATE_GENERIC_READ
        );
        assert_eq!(
            resource_state(RhiResourceState::COPY_DST | RhiResourceState::RENDER_TARGET),
            0x404
        );
    }

    #[test]
    fn filter_bits() {
        let trilinear = filter(
            RhiFilterType::Linear,
            RhiFilterType::Linear,
            RhiMipMapMode::Linear,
            1.0,
            false,
        );
        assert_eq!(trilinear, 0x15);
        let anisotropic_compare = filter(
            RhiFilterType::Nearest,
            RhiFilterType::Nearest,
            RhiMipMapMode::Nearest,
            16.0,
            true,
        );
        assert_eq!(anisotropic_compare, 0xD5);
    }

    #[test]
    fn front_and_back_culling_is_unsupported() {
        assert_eq!(cull_mode(RhiCullMode::FrontAndBack), None);
        assert_eq!(cull_mode(RhiCullMode::None), Some(D3D12_CULL_MODE_NONE));
    }
}
