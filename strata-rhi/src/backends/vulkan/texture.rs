use super::internal::image_aspect_mask;
use super::RhiDeviceContextVulkan;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use parking_lot::Mutex;
use std::sync::Arc;

fn resource_type_image_usage_flags(resource_type: RhiResourceType) -> vk::ImageUsageFlags {
    let mut usage_flags = vk::ImageUsageFlags::TRANSFER_SRC | vk::ImageUsageFlags::TRANSFER_DST;

    if resource_type.intersects(RhiResourceType::TEXTURE) {
        usage_flags |= vk::ImageUsageFlags::SAMPLED;
    }

    if resource_type.intersects(RhiResourceType::TEXTURE_READ_WRITE) {
        usage_flags |= vk::ImageUsageFlags::STORAGE;
    }

    if resource_type.intersects(RhiResourceType::RENDER_TARGET_COLOR) {
        usage_flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }

    if resource_type.intersects(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL) {
        usage_flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }

    usage_flags
}

struct RhiTextureVulkanInner {
    device_context: RhiDeviceContextVulkan,
    texture_def: RhiTextureDef,
    image: vk::Image,
    // None for images owned by a swapchain
    allocation: Mutex<Option<Allocation>>,
    owns_image: bool,
    srv_view: vk::ImageView,
    render_target_view: Option<vk::ImageView>,
    _count_guard: RhiObjectCountGuard,
}

impl Drop for RhiTextureVulkanInner {
    fn drop(&mut self) {
        log::trace!("destroying texture {:?}", self.image);
        let device = self.device_context.device();
        unsafe {
            if let Some(render_target_view) = self.render_target_view {
                device.destroy_image_view(render_target_view, None);
            }
            device.destroy_image_view(self.srv_view, None);

            if self.owns_image {
                device.destroy_image(self.image, None);
            }
        }

        if let Some(allocation) = self.allocation.lock().take() {
            self.device_context.free_memory(allocation);
        }
    }
}

#[derive(Clone)]
pub struct RhiTextureVulkan {
    inner: Arc<RhiTextureVulkanInner>,
}

impl PartialEq for RhiTextureVulkan {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for RhiTextureVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiTextureVulkan")
            .field("image", &self.inner.image)
            .field("texture_def", &self.inner.texture_def)
            .finish()
    }
}

impl RhiTextureVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<Self> {
        texture_def.verify()?;

        let is_cube = texture_def
            .resource_type
            .contains(RhiResourceType::TEXTURE_CUBE);
        let image_type = if texture_def.extents.depth > 1 {
            vk::ImageType::TYPE_3D
        } else {
            vk::ImageType::TYPE_2D
        };

        let mut create_flags = vk::ImageCreateFlags::empty();
        if is_cube {
            create_flags |= vk::ImageCreateFlags::CUBE_COMPATIBLE;
        }

        let image_create_info = vk::ImageCreateInfo::builder()
            .image_type(image_type)
            .extent(vk::Extent3D {
                width: texture_def.extents.width,
                height: texture_def.extents.height,
                depth: texture_def.extents.depth,
            })
            .mip_levels(texture_def.mip_count)
            .array_layers(texture_def.array_length)
            .format(texture_def.format.into())
            .tiling(vk::ImageTiling::OPTIMAL)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .usage(resource_type_image_usage_flags(texture_def.resource_type))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .samples(texture_def.sample_count.into())
            .flags(create_flags);

        let device = device_context.device();
        let image = unsafe { device.create_image(&image_create_info, None)? };
        let requirements = unsafe { device.get_image_memory_requirements(image) };

        let allocation = device_context.allocate_memory(&AllocationCreateDesc {
            name: "texture",
            requirements,
            location: gpu_allocator::MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        });

        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(RhiError::AllocationFailed(format!(
                    "{:?} {:?} texture: {}",
                    texture_def.extents, texture_def.format, e
                )));
            }
        };

        if let Err(e) =
            unsafe { device.bind_image_memory(image, allocation.memory(), allocation.offset()) }
        {
            unsafe { device.destroy_image(image, None) };
            device_context.free_memory(allocation);
            return Err(e.into());
        }

        log::trace!(
            "Texture {:?} created {:?} {:?} layers: {} mips: {}",
            image,
            texture_def.extents,
            texture_def.format,
            texture_def.array_length,
            texture_def.mip_count
        );

        Self::from_image(device_context, texture_def, image, Some(allocation))
    }

    /// Wrap an image someone else owns, like a swapchain image
    pub(super) fn from_existing(
        device_context: &RhiDeviceContextVulkan,
        texture_def: &RhiTextureDef,
        image: vk::Image,
    ) -> RhiResult<Self> {
        Self::from_image(device_context, texture_def, image, None)
    }

    fn from_image(
        device_context: &RhiDeviceContextVulkan,
        texture_def: &RhiTextureDef,
        image: vk::Image,
        allocation: Option<Allocation>,
    ) -> RhiResult<Self> {
        let owns_image = allocation.is_some();
        let views = Self::create_views(device_context, texture_def, image);
        let (srv_view, render_target_view) = match views {
            Ok(views) => views,
            Err(e) => {
                if let Some(allocation) = allocation {
                    unsafe { device_context.device().destroy_image(image, None) };
                    device_context.free_memory(allocation);
                }
                return Err(e);
            }
        };

        Ok(RhiTextureVulkan {
            inner: Arc::new(RhiTextureVulkanInner {
                device_context: device_context.clone(),
                texture_def: texture_def.clone(),
                image,
                allocation: Mutex::new(allocation),
                owns_image,
                srv_view,
                render_target_view,
                _count_guard: device_context.counters().track(RhiObjectKind::Texture),
            }),
        })
    }

    fn create_views(
        device_context: &RhiDeviceContextVulkan,
        texture_def: &RhiTextureDef,
        image: vk::Image,
    ) -> RhiResult<(vk::ImageView, Option<vk::ImageView>)> {
        let is_cube = texture_def
            .resource_type
            .contains(RhiResourceType::TEXTURE_CUBE);
        let view_type = if texture_def.extents.depth > 1 {
            vk::ImageViewType::TYPE_3D
        } else if is_cube && texture_def.array_length == 6 {
            vk::ImageViewType::CUBE
        } else if is_cube {
            vk::ImageViewType::CUBE_ARRAY
        } else if texture_def.array_length > 1 {
            vk::ImageViewType::TYPE_2D_ARRAY
        } else {
            vk::ImageViewType::TYPE_2D
        };

        let aspect_mask = image_aspect_mask(texture_def.format);
        let device = device_context.device();

        // Sampling reads depth only
        let srv_aspect_mask = if aspect_mask.contains(vk::ImageAspectFlags::DEPTH) {
            vk::ImageAspectFlags::DEPTH
        } else {
            aspect_mask
        };

        let srv_view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(view_type)
            .format(texture_def.format.into())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: srv_aspect_mask,
                base_mip_level: 0,
                level_count: texture_def.mip_count,
                base_array_layer: 0,
                layer_count: texture_def.array_length,
            });
        let srv_view = unsafe { device.create_image_view(&srv_view_info, None)? };

        if !texture_def.resource_type.is_render_target() {
            return Ok((srv_view, None));
        }

        let render_target_view_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(texture_def.format.into())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        match unsafe { device.create_image_view(&render_target_view_info, None) } {
            Ok(render_target_view) => Ok((srv_view, Some(render_target_view))),
            Err(e) => {
                unsafe { device.destroy_image_view(srv_view, None) };
                Err(e.into())
            }
        }
    }

    pub fn vk_image(&self) -> vk::Image {
        self.inner.image
    }

    /// Covers every mip and layer
    pub fn vk_srv_view(&self) -> vk::ImageView {
        self.inner.srv_view
    }

    /// Mip 0 of layer 0, only for render targets
    pub fn vk_render_target_view(&self) -> Option<vk::ImageView> {
        self.inner.render_target_view
    }

    pub fn texture_def(&self) -> &RhiTextureDef {
        &self.inner.texture_def
    }

    pub fn set_debug_name(
        &self,
        name: impl AsRef<str>,
    ) {
        self.inner
            .device_context
            .set_debug_name(self.inner.image, name.as_ref());
    }
}
