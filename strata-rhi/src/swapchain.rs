use crate::backends::null::RhiSwapchainNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiSwapchainVulkan;
use crate::device_context::backend_mismatch;
use crate::*;

/// A set of images that act as a "backbuffer" of a window.
///
/// The swapchain is rebuilt whole when the window changes size or the surface reports it out of
/// date. Rebuilding to the size it already has does nothing.
pub enum RhiSwapchain {
    Null(RhiSwapchainNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiSwapchainVulkan),
}

impl RhiSwapchain {
    /// Get the number of images in the swapchain. This is important to know because it indicates
    /// how many frames may be "in-flight" at a time - which affects how long a resource may be
    /// "in-use" after a command buffer referencing it has been submitted
    pub fn image_count(&self) -> usize {
        match self {
            RhiSwapchain::Null(inner) => inner.image_count(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.image_count(),
        }
    }

    /// Get the format of the images used in the swapchain
    pub fn format(&self) -> RhiFormat {
        match self {
            RhiSwapchain::Null(inner) => inner.format(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.format(),
        }
    }

    /// The present mode negotiated with the surface
    pub fn present_mode(&self) -> RhiPresentMode {
        match self {
            RhiSwapchain::Null(inner) => inner.present_mode(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.present_mode(),
        }
    }

    /// Return the metadata used to create the swapchain
    pub fn swapchain_def(&self) -> &RhiSwapchainDef {
        match self {
            RhiSwapchain::Null(inner) => inner.swapchain_def(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.swapchain_def(),
        }
    }

    /// Size of the swapchain images. May differ from the requested size if the surface dictates
    /// its own extents.
    pub fn extents(&self) -> RhiExtents2D {
        match self {
            RhiSwapchain::Null(inner) => inner.extents(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.extents(),
        }
    }

    /// Acquire the next image. The given semaphore will be signaled when it is available.
    ///
    /// Fails with `RhiError::SwapchainOutOfDate` if the swapchain must be rebuilt first.
    pub fn acquire_next_image_semaphore(
        &mut self,
        semaphore: &RhiSemaphore,
    ) -> RhiResult<RhiSwapchainImage> {
        match self {
            RhiSwapchain::Null(inner) => inner.acquire_next_image_semaphore(
                semaphore
                    .null_semaphore()
                    .ok_or_else(|| backend_mismatch("semaphore"))?,
            ),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.acquire_next_image_semaphore(
                semaphore
                    .vk_semaphore()
                    .ok_or_else(|| backend_mismatch("semaphore"))?,
            ),
        }
    }

    /// Acquire the next image. The given fence will be signaled when it is available.
    pub fn acquire_next_image_fence(
        &mut self,
        fence: &RhiFence,
    ) -> RhiResult<RhiSwapchainImage> {
        match self {
            RhiSwapchain::Null(inner) => inner.acquire_next_image_fence(
                fence.null_fence().ok_or_else(|| backend_mismatch("fence"))?,
            ),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.acquire_next_image_fence(
                fence.vk_fence().ok_or_else(|| backend_mismatch("fence"))?,
            ),
        }
    }

    /// Rebuild the swapchain. This is most commonly called when a window is resized. A rebuild to
    /// the current size of a swapchain that is not out of date does nothing and succeeds.
    ///
    /// The caller must ensure no submitted work still uses the old images, usually with a device
    /// idle wait.
    pub fn rebuild(
        &mut self,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<()> {
        match self {
            RhiSwapchain::Null(inner) => inner.rebuild(swapchain_def),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.rebuild(swapchain_def),
        }
    }

    /// Flag the swapchain out of date, as a window system would after a resize. The next acquire
    /// fails until the swapchain is rebuilt.
    pub fn invalidate(&self) {
        match self {
            RhiSwapchain::Null(inner) => inner.invalidate(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.invalidate(),
        }
    }

    pub fn is_out_of_date(&self) -> bool {
        match self {
            RhiSwapchain::Null(inner) => inner.is_out_of_date(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(inner) => inner.is_out_of_date(),
        }
    }

    pub fn null_swapchain(&self) -> Option<&RhiSwapchainNull> {
        match self {
            RhiSwapchain::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiSwapchain::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_swapchain(&self) -> Option<&RhiSwapchainVulkan> {
        match self {
            RhiSwapchain::Null(_) => None,
            RhiSwapchain::Vk(inner) => Some(inner),
        }
    }
}
