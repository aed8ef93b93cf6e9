use serde::{Deserialize, Serialize};

/// Texel and vertex formats understood by every backend. The set is deliberately the intersection
/// of what Vulkan, D3D12 and OpenGL can all express natively.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiFormat {
    UNDEFINED,

    R8_UNORM,
    R8G8_UNORM,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,

    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,

    R16_UINT,
    R32_UINT,
    R32G32_UINT,
    R32G32B32A32_UINT,

    D16_UNORM,
    D32_SFLOAT,
    D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT,
}

impl Default for RhiFormat {
    fn default() -> Self {
        RhiFormat::UNDEFINED
    }
}

impl RhiFormat {
    /// Size of one texel/element. Depth/stencil formats report the size a readback of the
    /// depth aspect would use.
    pub fn block_or_pixel_size_in_bytes(self) -> u32 {
        match self {
            RhiFormat::UNDEFINED => 0,
            RhiFormat::R8_UNORM => 1,
            RhiFormat::R8G8_UNORM => 2,
            RhiFormat::R8G8B8A8_UNORM
            | RhiFormat::R8G8B8A8_SRGB
            | RhiFormat::B8G8R8A8_UNORM
            | RhiFormat::B8G8R8A8_SRGB => 4,
            RhiFormat::R16G16B16A16_SFLOAT => 8,
            RhiFormat::R32_SFLOAT => 4,
            RhiFormat::R32G32_SFLOAT => 8,
            RhiFormat::R32G32B32_SFLOAT => 12,
            RhiFormat::R32G32B32A32_SFLOAT => 16,
            RhiFormat::R16_UINT => 2,
            RhiFormat::R32_UINT => 4,
            RhiFormat::R32G32_UINT => 8,
            RhiFormat::R32G32B32A32_UINT => 16,
            RhiFormat::D16_UNORM => 2,
            RhiFormat::D32_SFLOAT => 4,
            RhiFormat::D24_UNORM_S8_UINT => 4,
            RhiFormat::D32_SFLOAT_S8_UINT => 8,
        }
    }

    pub fn has_depth(self) -> bool {
        match self {
            RhiFormat::D16_UNORM
            | RhiFormat::D32_SFLOAT
            | RhiFormat::D24_UNORM_S8_UINT
            | RhiFormat::D32_SFLOAT_S8_UINT => true,
            _ => false,
        }
    }

    pub fn has_stencil(self) -> bool {
        match self {
            RhiFormat::D24_UNORM_S8_UINT | RhiFormat::D32_SFLOAT_S8_UINT => true,
            _ => false,
        }
    }

    pub fn has_depth_or_stencil(self) -> bool {
        self.has_depth() || self.has_stencil()
    }

    pub fn is_srgb(self) -> bool {
        match self {
            RhiFormat::R8G8B8A8_SRGB | RhiFormat::B8G8R8A8_SRGB => true,
            _ => false,
        }
    }

    /// Number of channels, used when validating vertex attributes
    pub fn channel_count(self) -> u32 {
        match self {
            RhiFormat::UNDEFINED => 0,
            RhiFormat::R8_UNORM
            | RhiFormat::R32_SFLOAT
            | RhiFormat::R16_UINT
            | RhiFormat::R32_UINT
            | RhiFormat::D16_UNORM
            | RhiFormat::D32_SFLOAT => 1,
            RhiFormat::R8G8_UNORM
            | RhiFormat::R32G32_SFLOAT
            | RhiFormat::R32G32_UINT
            | RhiFormat::D24_UNORM_S8_UINT
            | RhiFormat::D32_SFLOAT_S8_UINT => 2,
            RhiFormat::R32G32B32_SFLOAT => 3,
            RhiFormat::R8G8B8A8_UNORM
            | RhiFormat::R8G8B8A8_SRGB
            | RhiFormat::B8G8R8A8_UNORM
            | RhiFormat::B8G8R8A8_SRGB
            | RhiFormat::R16G16B16A16_SFLOAT
            | RhiFormat::R32G32B32A32_SFLOAT
            | RhiFormat::R32G32B32A32_UINT => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_and_stencil_aspects() {
        assert!(RhiFormat::D32_SFLOAT.has_depth());
        assert!(!RhiFormat::D32_SFLOAT.has_stencil());
        assert!(RhiFormat::D24_UNORM_S8_UINT.has_stencil());
        assert!(!RhiFormat::R8G8B8A8_UNORM.has_depth_or_stencil());
    }

    #[test]
    fn texel_sizes() {
        assert_eq!(RhiFormat::R8G8B8A8_UNORM.block_or_pixel_size_in_bytes(), 4);
        assert_eq!(RhiFormat::R32G32B32_SFLOAT.block_or_pixel_size_in_bytes(), 12);
        assert_eq!(RhiFormat::R16_UINT.block_or_pixel_size_in_bytes(), 2);
    }
}
