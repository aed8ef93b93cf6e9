use crate::backends::null::RhiTextureNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiTextureVulkan;
use crate::{RhiExtents3D, RhiFormat, RhiTextureDef};

/// An image that can be used by the GPU.
///
/// Textures are cheap to clone, every clone refers to the same image. Render targets are textures
/// created with `RENDER_TARGET_COLOR` or `RENDER_TARGET_DEPTH_STENCIL`, there is no separate
/// render target type.
#[derive(Clone, Debug)]
pub enum RhiTexture {
    Null(RhiTextureNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiTextureVulkan),
}

impl RhiTexture {
    /// Return the definition used to create the texture
    pub fn texture_def(&self) -> &RhiTextureDef {
        match self {
            RhiTexture::Null(inner) => inner.texture_def(),
            #[cfg(feature = "rhi-vulkan")]
            RhiTexture::Vk(inner) => inner.texture_def(),
        }
    }

    pub fn extents(&self) -> RhiExtents3D {
        self.texture_def().extents
    }

    pub fn width(&self) -> u32 {
        self.texture_def().extents.width
    }

    pub fn height(&self) -> u32 {
        self.texture_def().extents.height
    }

    pub fn format(&self) -> RhiFormat {
        self.texture_def().format
    }

    /// Sets a name for this texture. This is useful for debugging, graphics debuggers/profilers
    /// such as nsight graphics or renderdoc will display this texture with the given name in the
    /// list of resources.
    pub fn set_debug_name(
        &self,
        name: impl AsRef<str>,
    ) {
        match self {
            RhiTexture::Null(inner) => inner.set_debug_name(name),
            #[cfg(feature = "rhi-vulkan")]
            RhiTexture::Vk(inner) => inner.set_debug_name(name),
        }
    }

    pub fn null_texture(&self) -> Option<&RhiTextureNull> {
        match self {
            RhiTexture::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiTexture::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_texture(&self) -> Option<&RhiTextureVulkan> {
        match self {
            RhiTexture::Null(_) => None,
            RhiTexture::Vk(inner) => Some(inner),
        }
    }
}
