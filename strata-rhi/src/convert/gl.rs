use crate::{
    RhiAddressMode, RhiBlendFactor, RhiBlendOp, RhiCompareOp, RhiCullMode, RhiFilterType,
    RhiFormat, RhiFrontFace, RhiIndexType, RhiMemoryUsage, RhiMipMapMode, RhiPresentMode,
    RhiPrimitiveTopology, RhiShaderStageFlags, RhiStencilOp,
};

#[allow(non_camel_case_types)]
pub type GLenum = u32;

#[allow(missing_docs)]
pub mod consts {
    use super::GLenum;

    pub const NONE: GLenum = 0;
    pub const ZERO: GLenum = 0;
    pub const ONE: GLenum = 1;

    pub const POINTS: GLenum = 0x0000;
    pub const LINES: GLenum = 0x0001;
    pub const LINE_STRIP: GLenum = 0x0003;
    pub const TRIANGLES: GLenum = 0x0004;
    pub const TRIANGLE_STRIP: GLenum = 0x0005;
    pub const PATCHES: GLenum = 0x000E;

    pub const NEVER: GLenum = 0x0200;
    pub const LESS: GLenum = 0x0201;
    pub const EQUAL: GLenum = 0x0202;
    pub const LEQUAL: GLenum = 0x0203;
    pub const GREATER: GLenum = 0x0204;
    pub const NOTEQUAL: GLenum = 0x0205;
    pub const GEQUAL: GLenum = 0x0206;
    pub const ALWAYS: GLenum = 0x0207;

    pub const SRC_COLOR: GLenum = 0x0300;
    pub const ONE_MINUS_SRC_COLOR: GLenum = 0x0301;
    pub const SRC_ALPHA: GLenum = 0x0302;
    pub const ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
    pub const DST_ALPHA: GLenum = 0x0304;
    pub const ONE_MINUS_DST_ALPHA: GLenum = 0x0305;
    pub const DST_COLOR: GLenum = 0x0306;
    pub const ONE_MINUS_DST_COLOR: GLenum = 0x0307;
    pub const SRC_ALPHA_SATURATE: GLenum = 0x0308;
    pub const CONSTANT_COLOR: GLenum = 0x8001;
    pub const ONE_MINUS_CONSTANT_COLOR: GLenum = 0x8002;

    pub const FUNC_ADD: GLenum = 0x8006;
    pub const MIN: GLenum = 0x8007;
    pub const MAX: GLenum = 0x8008;
    pub const FUNC_SUBTRACT: GLenum = 0x800A;
    pub const FUNC_REVERSE_SUBTRACT: GLenum = 0x800B;

    pub const FRONT: GLenum = 0x0404;
    pub const BACK: GLenum = 0x0405;
    pub const FRONT_AND_BACK: GLenum = 0x0408;
    pub const CW: GLenum = 0x0900;
    pub const CCW: GLenum = 0x0901;

    pub const KEEP: GLenum = 0x1E00;
    pub const REPLACE: GLenum = 0x1E01;
    pub const INCR: GLenum = 0x1E02;
    pub const DECR: GLenum = 0x1E03;
    pub const INVERT: GLenum = 0x150A;
    pub const INCR_WRAP: GLenum = 0x8507;
    pub const DECR_WRAP: GLenum = 0x8508;

    pub const NEAREST: GLenum = 0x2600;
    pub const LINEAR: GLenum = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: GLenum = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: GLenum = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: GLenum = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: GLenum = 0x2703;

    pub const REPEAT: GLenum = 0x2901;
    pub const CLAMP_TO_BORDER: GLenum = 0x812D;
    pub const CLAMP_TO_EDGE: GLenum = 0x812F;
    pub const MIRRORED_REPEAT: GLenum = 0x8370;

    pub const UNSIGNED_BYTE: GLenum = 0x1401;
    pub const UNSIGNED_SHORT: GLenum = 0x1403;
    pub const UNSIGNED_INT: GLenum = 0x1405;
    pub const FLOAT: GLenum = 0x1406;
    pub const HALF_FLOAT: GLenum = 0x140B;
    pub const UNSIGNED_INT_24_8: GLenum = 0x84FA;
    pub const FLOAT_32_UNSIGNED_INT_24_8_REV: GLenum = 0x8DAD;

    pub const RED: GLenum = 0x1903;
    pub const RG: GLenum = 0x8227;
    pub const RGB: GLenum = 0x1907;
    pub const RGBA: GLenum = 0x1908;
    pub const BGRA: GLenum = 0x80E1;
    pub const RED_INTEGER: GLenum = 0x8D94;
    pub const RG_INTEGER: GLenum = 0x8228;
    pub const RGBA_INTEGER: GLenum = 0x8D99;
    pub const DEPTH_COMPONENT: GLenum = 0x1902;
    pub const DEPTH_STENCIL: GLenum = 0x84F9;

    pub const R8: GLenum = 0x8229;
    pub const RG8: GLenum = 0x822B;
    pub const RGBA8: GLenum = 0x8058;
    pub const SRGB8_ALPHA8: GLenum = 0x8C43;
    pub const RGBA16F: GLenum = 0x881A;
    pub const R32F: GLenum = 0x822E;
    pub const RG32F: GLenum = 0x8230;
    pub const RGB32F: GLenum = 0x8815;
    pub const RGBA32F: GLenum = 0x8814;
    pub const R16UI: GLenum = 0x8234;
    pub const R32UI: GLenum = 0x8236;
    pub const RG32UI: GLenum = 0x823C;
    pub const RGBA32UI: GLenum = 0x8D70;
    pub const DEPTH_COMPONENT16: GLenum = 0x81A5;
    pub const DEPTH_COMPONENT32F: GLenum = 0x8CAC;
    pub const DEPTH24_STENCIL8: GLenum = 0x88F0;
    pub const DEPTH32F_STENCIL8: GLenum = 0x8CAD;

    pub const STREAM_DRAW: GLenum = 0x88E0;
    pub const STREAM_READ: GLenum = 0x88E1;
    pub const STATIC_DRAW: GLenum = 0x88E4;
    pub const DYNAMIC_DRAW: GLenum = 0x88E8;

    pub const FRAGMENT_SHADER: GLenum = 0x8B30;
    pub const VERTEX_SHADER: GLenum = 0x8B31;
    pub const GEOMETRY_SHADER: GLenum = 0x8DD9;
    pub const TESS_EVALUATION_SHADER: GLenum = 0x8E87;
    pub const TESS_CONTROL_SHADER: GLenum = 0x8E88;
    pub const COMPUTE_SHADER: GLenum = 0x91B9;
}

use consts::*;

/// The internal format, pixel format and component type a texture of this format is allocated and
/// uploaded with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GlFormatInfo {
    pub internal_format: GLenum,
    pub format: GLenum,
    pub gl_type: GLenum,
}

pub fn format(format: RhiFormat) -> Option<GlFormatInfo> {
    let (internal_format, format, gl_type) = match format {
        RhiFormat::UNDEFINED => return None,
        RhiFormat::R8_UNORM => (R8, RED, UNSIGNED_BYTE),
        RhiFormat::R8G8_UNORM => (RG8, RG, UNSIGNED_BYTE),
        RhiFormat::R8G8B8A8_UNORM => (RGBA8, RGBA, UNSIGNED_BYTE),
        RhiFormat::R8G8B8A8_SRGB => (SRGB8_ALPHA8, RGBA, UNSIGNED_BYTE),
        RhiFormat::B8G8R8A8_UNORM => (RGBA8, BGRA, UNSIGNED_BYTE),
        RhiFormat::B8G8R8A8_SRGB => (SRGB8_ALPHA8, BGRA, UNSIGNED_BYTE),
        RhiFormat::R16G16B16A16_SFLOAT => (RGBA16F, RGBA, HALF_FLOAT),
        RhiFormat::R32_SFLOAT => (R32F, RED, FLOAT),
        RhiFormat::R32G32_SFLOAT => (RG32F, RG, FLOAT),
        RhiFormat::R32G32B32_SFLOAT => (RGB32F, RGB, FLOAT),
        RhiFormat::R32G32B32A32_SFLOAT => (RGBA32F, RGBA, FLOAT),
        RhiFormat::R16_UINT => (R16UI, RED_INTEGER, UNSIGNED_SHORT),
        RhiFormat::R32_UINT => (R32UI, RED_INTEGER, UNSIGNED_INT),
        RhiFormat::R32G32_UINT => (RG32UI, RG_INTEGER, UNSIGNED_INT),
        RhiFormat::R32G32B32A32_UINT => (RGBA32UI, RGBA_INTEGER, UNSIGNED_INT),
        RhiFormat::D16_UNORM => (DEPTH_COMPONENT16, DEPTH_COMPONENT, UNSIGNED_SHORT),
        RhiFormat::D32_SFLOAT => (DEPTH_COMPONENT32F, DEPTH_COMPONENT, FLOAT),
        RhiFormat::D24_UNORM_S8_UINT => (DEPTH24_STENCIL8, DEPTH_STENCIL, UNSIGNED_INT_24_8),
        RhiFormat::D32_SFLOAT_S8_UINT => (
            DEPTH32F_STENCIL8,
            DEPTH_STENCIL,
            FLOAT_32_UNSIGNED_INT_24_8_REV,
        ),
    };

    Some(GlFormatInfo {
        internal_format,
        format,
        gl_type,
    })
}

/// Component count, component type and normalization of a vertex attribute of this format
pub fn vertex_attribute(format: RhiFormat) -> Option<(i32, GLenum, bool)> {
    Some(match format {
        RhiFormat::R8G8B8A8_UNORM => (4, UNSIGNED_BYTE, true),
        RhiFormat::R32_SFLOAT => (1, FLOAT, false),
        RhiFormat::R32G32_SFLOAT => (2, FLOAT, false),
        RhiFormat::R32G32B32_SFLOAT => (3, FLOAT, false),
        RhiFormat::R32G32B32A32_SFLOAT => (4, FLOAT, false),
        RhiFormat::R32_UINT => (1, UNSIGNED_INT, false),
        RhiFormat::R32G32_UINT => (2, UNSIGNED_INT, false),
        RhiFormat::R32G32B32A32_UINT => (4, UNSIGNED_INT, false),
        _ => return None,
    })
}

pub fn buffer_usage(memory_usage: RhiMemoryUsage) -> Option<GLenum> {
    match memory_usage {
        RhiMemoryUsage::Unknown => None,
        RhiMemoryUsage::GpuOnly => Some(STATIC_DRAW),
        RhiMemoryUsage::CpuOnly => Some(STREAM_READ),
        RhiMemoryUsage::CpuToGpu => Some(DYNAMIC_DRAW),
        RhiMemoryUsage::GpuToCpu => Some(STREAM_DRAW),
    }
}

/// `None` means face culling is disabled rather than a `glCullFace` value
pub fn cull_mode(cull_mode: RhiCullMode) -> Option<GLenum> {
    match cull_mode {
        RhiCullMode::None => None,
        RhiCullMode::Back => Some(BACK),
        RhiCullMode::Front => Some(FRONT),
        RhiCullMode::FrontAndBack => Some(FRONT_AND_BACK),
    }
}

pub fn front_face(front_face: RhiFrontFace) -> GLenum {
    match front_face {
        RhiFrontFace::CounterClockwise => CCW,
        RhiFrontFace::Clockwise => CW,
    }
}

pub fn compare_op(compare_op: RhiCompareOp) -> GLenum {
    match compare_op {
        RhiCompareOp::Never => NEVER,
        RhiCompareOp::Less => LESS,
        RhiCompareOp::Equal => EQUAL,
        RhiCompareOp::LessOrEqual => LEQUAL,
        RhiCompareOp::Greater => GREATER,
        RhiCompareOp::NotEqual => NOTEQUAL,
        RhiCompareOp::GreaterOrEqual => GEQUAL,
        RhiCompareOp::Always => ALWAYS,
    }
}

pub fn stencil_op(stencil_op: RhiStencilOp) -> GLenum {
    match stencil_op {
        RhiStencilOp::Keep => KEEP,
        RhiStencilOp::Zero => ZERO,
        RhiStencilOp::Replace => REPLACE,
        RhiStencilOp::IncrementAndClamp => INCR,
        RhiStencilOp::DecrementAndClamp => DECR,
        RhiStencilOp::Invert => INVERT,
        RhiStencilOp::IncrementAndWrap => INCR_WRAP,
        RhiStencilOp::DecrementAndWrap => DECR_WRAP,
    }
}

pub fn blend_factor(blend_factor: RhiBlendFactor) -> GLenum {
    match blend_factor {
        RhiBlendFactor::Zero => ZERO,
        RhiBlendFactor::One => ONE,
        RhiBlendFactor::SrcColor => SRC_COLOR,
        RhiBlendFactor::OneMinusSrcColor => ONE_MINUS_SRC_COLOR,
        RhiBlendFactor::DstColor => DST_COLOR,
        RhiBlendFactor::OneMinusDstColor => ONE_MINUS_DST_COLOR,
        RhiBlendFactor::SrcAlpha => SRC_ALPHA,
        RhiBlendFactor::OneMinusSrcAlpha => ONE_MINUS_SRC_ALPHA,
        RhiBlendFactor::DstAlpha => DST_ALPHA,
        RhiBlendFactor::OneMinusDstAlpha => ONE_MINUS_DST_ALPHA,
        RhiBlendFactor::SrcAlphaSaturate => SRC_ALPHA_SATURATE,
        RhiBlendFactor::ConstantColor => CONSTANT_COLOR,
        RhiBlendFactor::OneMinusConstantColor => ONE_MINUS_CONSTANT_COLOR,
    }
}

pub fn blend_op(blend_op: RhiBlendOp) -> GLenum {
    match blend_op {
        RhiBlendOp::Add => FUNC_ADD,
        RhiBlendOp::Subtract => FUNC_SUBTRACT,
        RhiBlendOp::ReverseSubtract => FUNC_REVERSE_SUBTRACT,
        RhiBlendOp::Min => MIN,
        RhiBlendOp::Max => MAX,
    }
}

pub fn primitive_topology(primitive_topology: RhiPrimitiveTopology) -> GLenum {
    match primitive_topology {
        RhiPrimitiveTopology::PointList => POINTS,
        RhiPrimitiveTopology::LineList => LINES,
        RhiPrimitiveTopology::LineStrip => LINE_STRIP,
        RhiPrimitiveTopology::TriangleList => TRIANGLES,
        RhiPrimitiveTopology::TriangleStrip => TRIANGLE_STRIP,
        RhiPrimitiveTopology::PatchList => PATCHES,
    }
}

pub fn index_type(index_type: RhiIndexType) -> GLenum {
    match index_type {
        RhiIndexType::Uint16 => UNSIGNED_SHORT,
        RhiIndexType::Uint32 => UNSIGNED_INT,
    }
}

pub fn mag_filter(filter: RhiFilterType) -> GLenum {
    match filter {
        RhiFilterType::Nearest => NEAREST,
        RhiFilterType::Linear => LINEAR,
    }
}

/// GL folds the mipmap mode into the minification filter
pub fn min_filter(
    filter: RhiFilterType,
    mip_map_mode: Option<RhiMipMapMode>,
) -> GLenum {
    match (filter, mip_map_mode) {
        (RhiFilterType::Nearest, None) => NEAREST,
        (RhiFilterType::Linear, None) => LINEAR,
        (RhiFilterType::Nearest, Some(RhiMipMapMode::Nearest)) => NEAREST_MIPMAP_NEAREST,
        (RhiFilterType::Nearest, Some(RhiMipMapMode::Linear)) => NEAREST_MIPMAP_LINEAR,
        (RhiFilterType::Linear, Some(RhiMipMapMode::Nearest)) => LINEAR_MIPMAP_NEAREST,
        (RhiFilterType::Linear, Some(RhiMipMapMode::Linear)) => LINEAR_MIPMAP_LINEAR,
    }
}

pub fn address_mode(address_mode: RhiAddressMode) -> GLenum {
    match address_mode {
        RhiAddressMode::Mirror => MIRRORED_REPEAT,
        RhiAddressMode::Repeat => REPEAT,
        RhiAddressMode::ClampToEdge => CLAMP_TO_EDGE,
        RhiAddressMode::ClampToBorder => CLAMP_TO_BORDER,
    }
}

/// The swap interval passed to the context's `SwapInterval`
pub fn swap_interval(present_mode: RhiPresentMode) -> i32 {
    match present_mode {
        RhiPresentMode::Fifo => 1,
        RhiPresentMode::FifoRelaxed => -1,
        RhiPresentMode::Mailbox | RhiPresentMode::Immediate => 0,
    }
}

/// The shader object type of a single stage. GL has no shader objects for ray tracing or mesh
/// stages.
pub fn shader_stage(stage: RhiShaderStageFlags) -> Option<GLenum> {
    Some(if stage == RhiShaderStageFlags::VERTEX {
        VERTEX_SHADER
    } else if stage == RhiShaderStageFlags::FRAGMENT {
        FRAGMENT_SHADER
    } else if stage == RhiShaderStageFlags::GEOMETRY {
        GEOMETRY_SHADER
    } else if stage == RhiShaderStageFlags::TESSELLATION_CONTROL {
        TESS_CONTROL_SHADER
    } else if stage == RhiShaderStageFlags::TESSELLATION_EVALUATION {
        TESS_EVALUATION_SHADER
    } else if stage == RhiShaderStageFlags::COMPUTE {
        COMPUTE_SHADER
    } else {
        return None;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swizzled_formats_keep_internal_format() {
        let bgra = format(RhiFormat::B8G8R8A8_UNORM).unwrap();
        assert_eq!(bgra.internal_format, RGBA8);
        assert_eq!(bgra.format, BGRA);
        assert!(format(RhiFormat::UNDEFINED).is_none());
    }

    #[test]
    fn culling_none_disables_culling() {
        assert_eq!(cull_mode(RhiCullMode::None), None);
        assert_eq!(cull_mode(RhiCullMode::Back), Some(0x0405));
    }

    #[test]
    fn min_filter_folds_mip_mode() {
        assert_eq!(
            min_filter(RhiFilterType::Linear, Some(RhiMipMapMode::Linear)),
            0x2703
        );
        assert_eq!(min_filter(RhiFilterType::Nearest, None), 0x2600);
    }

    #[test]
    fn multi_stage_flags_have_no_shader_type() {
        assert_eq!(shader_stage(RhiShaderStageFlags::VERTEX), Some(VERTEX_SHADER));
        assert_eq!(shader_stage(RhiShaderStageFlags::ALL_GRAPHICS), None);
    }
}
