use super::*;
use crate::convert::vulkan::format_from_vk;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use std::sync::atomic::{AtomicBool, Ordering};

const PREFERRED_SURFACE_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;

struct VkSwapchainResources {
    swapchain: vk::SwapchainKHR,
    images: Vec<RhiTexture>,
    format: RhiFormat,
    present_mode: RhiPresentMode,
    extents: RhiExtents2D,
}

fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
) -> RhiResult<(vk::SurfaceFormatKHR, RhiFormat)> {
    let preferred = formats.iter().find(|x| {
        x.format == PREFERRED_SURFACE_FORMAT && x.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    preferred
        .or_else(|| formats.iter().find(|x| format_from_vk(x.format).is_some()))
        .and_then(|x| format_from_vk(x.format).map(|format| (*x, format)))
        .ok_or_else(|| {
            RhiError::StringError(format!(
                "the surface offers no supported format, available: {:?}",
                formats.iter().map(|x| x.format).collect::<Vec<_>>()
            ))
        })
}

fn choose_present_mode(
    enable_vsync: bool,
    supported: &[vk::PresentModeKHR],
) -> RhiPresentMode {
    RhiPresentMode::preference_order(enable_vsync)
        .iter()
        .copied()
        .find(|mode| supported.contains(&vk::PresentModeKHR::from(*mode)))
        .unwrap_or(RhiPresentMode::Fifo)
}

fn choose_extents(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    swapchain_def: &RhiSwapchainDef,
) -> vk::Extent2D {
    // u32::MAX means the surface size follows the swapchain
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: swapchain_def.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: swapchain_def.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

fn create_swapchain_resources(
    device_context: &RhiDeviceContextVulkan,
    surface: vk::SurfaceKHR,
    swapchain_def: &RhiSwapchainDef,
    old_swapchain: vk::SwapchainKHR,
) -> RhiResult<VkSwapchainResources> {
    if swapchain_def.extents().is_empty() {
        return Err(format!(
            "cannot create a {}x{} swapchain",
            swapchain_def.width, swapchain_def.height
        ))?;
    }

    let surface_loader = device_context.surface_loader()?;
    let swapchain_loader = device_context.swapchain_loader()?;
    let physical_device = device_context.physical_device();

    let (capabilities, formats, present_modes) = unsafe {
        (
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?,
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?,
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?,
        )
    };

    let (surface_format, format) = choose_surface_format(&formats)?;
    let present_mode = choose_present_mode(swapchain_def.enable_vsync, &present_modes);
    let extent = choose_extents(&capabilities, swapchain_def);
    if extent.width == 0 || extent.height == 0 {
        return Err("the surface has no area, it is probably minimized")?;
    }

    let mut image_count = swapchain_def.image_count.max(capabilities.min_image_count);
    if capabilities.max_image_count > 0 {
        image_count = image_count.min(capabilities.max_image_count);
    }

    let queue_family_indices = device_context.queue_family_indices();
    let concurrent_families;
    let mut create_info = vk::SwapchainCreateInfoKHR::builder()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(
            vk::ImageUsageFlags::COLOR_ATTACHMENT
                | vk::ImageUsageFlags::SAMPLED
                | vk::ImageUsageFlags::TRANSFER_SRC
                | vk::ImageUsageFlags::TRANSFER_DST,
        )
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode.into())
        .clipped(true)
        .old_swapchain(old_swapchain);

    match queue_family_indices.present {
        Some(present) if present != queue_family_indices.graphics => {
            concurrent_families = [queue_family_indices.graphics, present];
            create_info = create_info
                .image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&concurrent_families);
        }
        _ => {
            create_info = create_info.image_sharing_mode(vk::SharingMode::EXCLUSIVE);
        }
    }

    let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

    let vk_images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
        Ok(images) => images,
        Err(e) => {
            unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
            return Err(e.into());
        }
    };

    let extents = RhiExtents2D::new(extent.width, extent.height);
    let texture_def = RhiTextureDef {
        resource_type: RhiResourceType::RENDER_TARGET_COLOR | RhiResourceType::TEXTURE,
        ..RhiTextureDef::for_render_target(extents, format)
    };

    let mut images = Vec::with_capacity(vk_images.len());
    for vk_image in vk_images {
        match RhiTextureVulkan::from_existing(device_context, &texture_def, vk_image) {
            Ok(texture) => images.push(RhiTexture::Vk(texture)),
            Err(e) => {
                images.clear();
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(e);
            }
        }
    }

    Ok(VkSwapchainResources {
        swapchain,
        images,
        format,
        present_mode,
        extents,
    })
}

pub struct RhiSwapchainVulkan {
    device_context: RhiDeviceContextVulkan,
    swapchain_def: RhiSwapchainDef,
    surface: vk::SurfaceKHR,
    resources: VkSwapchainResources,
    out_of_date: AtomicBool,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiSwapchainVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiSwapchainVulkan")
            .field("swapchain", &self.resources.swapchain)
            .field("swapchain_def", &self.swapchain_def)
            .field("present_mode", &self.resources.present_mode)
            .field("image_count", &self.resources.images.len())
            .finish()
    }
}

impl Drop for RhiSwapchainVulkan {
    fn drop(&mut self) {
        // Views of the images go before the swapchain that owns them
        self.resources.images.clear();
        unsafe {
            if let Ok(swapchain_loader) = self.device_context.swapchain_loader() {
                swapchain_loader.destroy_swapchain(self.resources.swapchain, None);
            }
            if let Ok(surface_loader) = self.device_context.surface_loader() {
                surface_loader.destroy_surface(self.surface, None);
            }
        }
    }
}

impl RhiSwapchainVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        window_handles: &RhiWindowHandles,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<Self> {
        let surface_loader = device_context.surface_loader()?;
        let surface = unsafe {
            ash_window::create_surface(
                device_context.entry(),
                device_context.instance(),
                window_handles.display,
                window_handles.window,
                None,
            )?
        };

        let resources = match create_swapchain_resources(
            device_context,
            surface,
            swapchain_def,
            vk::SwapchainKHR::null(),
        ) {
            Ok(resources) => resources,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        log::info!(
            "Swapchain created {}x{} with {} images, format {:?}, present mode {:?}",
            resources.extents.width,
            resources.extents.height,
            resources.images.len(),
            resources.format,
            resources.present_mode
        );

        Ok(RhiSwapchainVulkan {
            device_context: device_context.clone(),
            swapchain_def: swapchain_def.clone(),
            surface,
            resources,
            out_of_date: AtomicBool::new(false),
            _count_guard: device_context.counters().track(RhiObjectKind::Swapchain),
        })
    }

    pub fn vk_swapchain(&self) -> vk::SwapchainKHR {
        self.resources.swapchain
    }

    pub fn image_count(&self) -> usize {
        self.resources.images.len()
    }

    pub fn format(&self) -> RhiFormat {
        self.resources.format
    }

    pub fn present_mode(&self) -> RhiPresentMode {
        self.resources.present_mode
    }

    pub fn swapchain_def(&self) -> &RhiSwapchainDef {
        &self.swapchain_def
    }

    /// May differ from the requested size when the surface dictates its own
    pub fn extents(&self) -> RhiExtents2D {
        self.resources.extents
    }

    pub fn invalidate(&self) {
        self.out_of_date.store(true, Ordering::Release);
    }

    pub fn is_out_of_date(&self) -> bool {
        self.out_of_date.load(Ordering::Acquire)
    }

    fn acquire_next_image(
        &mut self,
        semaphore: vk::Semaphore,
        fence: vk::Fence,
    ) -> RhiResult<RhiSwapchainImage> {
        if self.is_out_of_date() {
            return Err(RhiError::SwapchainOutOfDate);
        }

        let result = unsafe {
            self.device_context.swapchain_loader()?.acquire_next_image(
                self.resources.swapchain,
                u64::MAX,
                semaphore,
                fence,
            )
        };

        let image_index = match result {
            Ok((image_index, suboptimal)) => {
                if suboptimal {
                    log::debug!("Acquired image {} from a suboptimal swapchain", image_index);
                }
                image_index
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.invalidate();
                return Err(RhiError::SwapchainOutOfDate);
            }
            Err(vk::Result::ERROR_DEVICE_LOST) => {
                return Err(RhiError::DeviceLost(
                    "lost while acquiring a swapchain image".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let texture = self
            .resources
            .images
            .get(image_index as usize)
            .ok_or_else(|| format!("swapchain returned unknown image index {}", image_index))?
            .clone();

        Ok(RhiSwapchainImage {
            texture,
            swapchain_image_index: image_index,
        })
    }

    pub fn acquire_next_image_semaphore(
        &mut self,
        semaphore: &RhiSemaphoreVulkan,
    ) -> RhiResult<RhiSwapchainImage> {
        if semaphore.signal_available() {
            return Err("semaphore already has a pending signal that nothing waited on")?;
        }

        let image = self.acquire_next_image(semaphore.vk_semaphore(), vk::Fence::null())?;
        semaphore.set_signal_available(true);
        Ok(image)
    }

    pub fn acquire_next_image_fence(
        &mut self,
        fence: &RhiFenceVulkan,
    ) -> RhiResult<RhiSwapchainImage> {
        fence.check_submittable()?;
        let image = self.acquire_next_image(vk::Semaphore::null(), fence.vk_fence())?;
        fence.mark_submitted(Vec::default());
        Ok(image)
    }

    pub fn rebuild(
        &mut self,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<()> {
        if *swapchain_def == self.swapchain_def && !self.is_out_of_date() {
            log::debug!(
                "Swapchain is already {}x{}, nothing to rebuild",
                swapchain_def.width,
                swapchain_def.height
            );
            return Ok(());
        }

        // The old swapchain stays valid if creating the new one fails
        let resources = create_swapchain_resources(
            &self.device_context,
            self.surface,
            swapchain_def,
            self.resources.swapchain,
        )?;

        let mut old_resources = std::mem::replace(&mut self.resources, resources);
        old_resources.images.clear();
        unsafe {
            self.device_context
                .swapchain_loader()?
                .destroy_swapchain(old_resources.swapchain, None);
        }

        self.swapchain_def = swapchain_def.clone();
        self.out_of_date.store(false, Ordering::Release);

        log::info!(
            "Swapchain rebuilt {}x{} with {} images",
            self.resources.extents.width,
            self.resources.extents.height,
            self.resources.images.len()
        );
        Ok(())
    }
}
