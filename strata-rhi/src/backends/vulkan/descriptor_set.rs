use super::RhiDeviceContextVulkan;
use crate::descriptor_set::{
    RhiDescriptorBudget, RhiDescriptorReservation, RhiDescriptorSetContents,
};
use crate::device_context::{backend_mismatch, RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use parking_lot::Mutex;
use std::sync::Arc;

const POOLED_BINDING_TYPES: [RhiBindingType; 7] = [
    RhiBindingType::Sampler,
    RhiBindingType::CombinedImageSampler,
    RhiBindingType::SampledTexture,
    RhiBindingType::StorageTexture,
    RhiBindingType::UniformBuffer,
    RhiBindingType::StorageBuffer,
    RhiBindingType::AccelerationStructure,
];

struct VkDescriptorPoolHandle {
    device_context: RhiDeviceContextVulkan,
    descriptor_pool: vk::DescriptorPool,
}

impl Drop for VkDescriptorPoolHandle {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_descriptor_pool(self.descriptor_pool, None);
        }
    }
}

/// The native pool is sized exactly like the budget, so the budget check is what reports
/// exhaustion. The driver is never asked for more than it was told to hold.
pub struct RhiDescriptorPoolVulkan {
    pool: Arc<VkDescriptorPoolHandle>,
    budget: Arc<RhiDescriptorBudget>,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiDescriptorPoolVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDescriptorPoolVulkan")
            .field("descriptor_pool", &self.pool.descriptor_pool)
            .field("pool_def", self.budget.pool_def())
            .field("available_sets", &self.budget.available_sets())
            .finish()
    }
}

impl RhiDescriptorPoolVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        descriptor_pool_def: &RhiDescriptorPoolDef,
    ) -> RhiResult<Self> {
        descriptor_pool_def.verify()?;

        let pool_sizes: Vec<_> = POOLED_BINDING_TYPES
            .iter()
            .filter_map(|&binding_type| {
                let descriptor_count = descriptor_pool_def.capacity(binding_type);
                if descriptor_count == 0 {
                    None
                } else {
                    Some(vk::DescriptorPoolSize {
                        ty: binding_type.into(),
                        descriptor_count,
                    })
                }
            })
            .collect();

        let create_info = vk::DescriptorPoolCreateInfo::builder()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(descriptor_pool_def.max_sets)
            .pool_sizes(&pool_sizes);

        let descriptor_pool = unsafe {
            device_context
                .device()
                .create_descriptor_pool(&create_info, None)?
        };

        Ok(RhiDescriptorPoolVulkan {
            pool: Arc::new(VkDescriptorPoolHandle {
                device_context: device_context.clone(),
                descriptor_pool,
            }),
            budget: RhiDescriptorBudget::new(descriptor_pool_def),
            _count_guard: device_context
                .counters()
                .track(RhiObjectKind::DescriptorPool),
        })
    }

    pub fn vk_descriptor_pool(&self) -> vk::DescriptorPool {
        self.pool.descriptor_pool
    }

    pub fn allocate_descriptor_set(
        &mut self,
        shader: &RhiShader,
        layout: RhiDescriptorSetLayoutDesc,
    ) -> RhiResult<RhiDescriptorSetVulkan> {
        let shader = shader
            .vk_shader()
            .ok_or_else(|| backend_mismatch("shader"))?;
        let set_layout = shader
            .vk_descriptor_set_layout(layout.set_index)
            .ok_or_else(|| {
                format!(
                    "shader {} has no descriptor set layout for set {}",
                    shader.program().name(),
                    layout.set_index
                )
            })?;

        let reservation = self.budget.reserve(&layout)?;

        let set_layouts = [set_layout];
        let allocate_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool.descriptor_pool)
            .set_layouts(&set_layouts);
        let descriptor_set = unsafe {
            self.pool
                .device_context
                .device()
                .allocate_descriptor_sets(&allocate_info)
        }
        .map_err(|e| match e {
            vk::Result::ERROR_OUT_OF_POOL_MEMORY | vk::Result::ERROR_FRAGMENTED_POOL => {
                RhiError::DescriptorPoolExhausted {
                    binding_type: format!("descriptor sets ({:?})", e),
                    requested: 1,
                    available: 0,
                }
            }
            e => e.into(),
        })?
        .into_iter()
        .next()
        .ok_or("descriptor set allocation returned no set")?;

        log::trace!(
            "Descriptor set {:?} (set {}) allocated with {} bindings",
            descriptor_set,
            layout.set_index,
            layout.bindings.len()
        );

        let count_guard = self
            .pool
            .device_context
            .counters()
            .track(RhiObjectKind::DescriptorSet);
        Ok(RhiDescriptorSetVulkan {
            inner: Arc::new(RhiDescriptorSetVulkanInner {
                pool: self.pool.clone(),
                descriptor_set,
                contents: Mutex::new(RhiDescriptorSetContents::new(&layout)),
                layout,
                _reservation: reservation,
                _count_guard: count_guard,
            }),
        })
    }

    pub(crate) fn budget(&self) -> &RhiDescriptorBudget {
        &self.budget
    }
}

struct RhiDescriptorSetVulkanInner {
    // Keeps the native pool alive until its last set is freed
    pool: Arc<VkDescriptorPoolHandle>,
    descriptor_set: vk::DescriptorSet,
    layout: RhiDescriptorSetLayoutDesc,
    contents: Mutex<RhiDescriptorSetContents>,
    _reservation: RhiDescriptorReservation,
    _count_guard: RhiObjectCountGuard,
}

impl Drop for RhiDescriptorSetVulkanInner {
    fn drop(&mut self) {
        let result = unsafe {
            self.pool.device_context.device().free_descriptor_sets(
                self.pool.descriptor_pool,
                &[self.descriptor_set],
            )
        };
        if let Err(e) = result {
            log::warn!("Failed to free descriptor set {:?}: {:?}", self.descriptor_set, e);
        }
    }
}

#[derive(Clone)]
pub struct RhiDescriptorSetVulkan {
    inner: Arc<RhiDescriptorSetVulkanInner>,
}

impl std::fmt::Debug for RhiDescriptorSetVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDescriptorSetVulkan")
            .field("descriptor_set", &self.inner.descriptor_set)
            .field("set_index", &self.inner.layout.set_index)
            .finish()
    }
}

impl PartialEq for RhiDescriptorSetVulkan {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn vk_image_view(texture: &RhiTexture) -> RhiResult<vk::ImageView> {
    Ok(texture
        .vk_texture()
        .ok_or_else(|| backend_mismatch("texture"))?
        .vk_srv_view())
}

fn vk_sampler(sampler: &RhiSampler) -> RhiResult<vk::Sampler> {
    Ok(sampler
        .vk_sampler()
        .ok_or_else(|| backend_mismatch("sampler"))?
        .vk_sampler())
}

impl RhiDescriptorSetVulkan {
    pub fn vk_descriptor_set(&self) -> vk::DescriptorSet {
        self.inner.descriptor_set
    }

    pub fn layout(&self) -> &RhiDescriptorSetLayoutDesc {
        &self.inner.layout
    }

    pub fn write(
        &self,
        binding: u32,
        array_index: u32,
        resource: RhiDescriptorResource,
    ) -> RhiResult<()> {
        let layout_binding = self
            .inner
            .layout
            .binding(binding)
            .ok_or_else(|| {
                format!(
                    "descriptor set {} has no binding {}",
                    self.inner.layout.set_index, binding
                )
            })?
            .clone();

        // Resolve native handles before touching the contents, a mismatch must change nothing
        let mut buffer_info = None;
        let mut image_info = None;
        match &resource {
            RhiDescriptorResource::Buffer(buffer) => {
                let buffer = buffer
                    .vk_buffer()
                    .ok_or_else(|| backend_mismatch("buffer"))?;
                buffer_info = Some(vk::DescriptorBufferInfo {
                    buffer: buffer.vk_buffer(),
                    offset: 0,
                    range: vk::WHOLE_SIZE,
                });
            }
            RhiDescriptorResource::Texture(texture) => {
                let is_storage = layout_binding.binding_type == RhiBindingType::StorageTexture;
                let image_layout = if is_storage {
                    vk::ImageLayout::GENERAL
                } else {
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
                };
                image_info = Some(vk::DescriptorImageInfo {
                    sampler: vk::Sampler::null(),
                    image_view: vk_image_view(texture)?,
                    image_layout,
                });
            }
            RhiDescriptorResource::Sampler(sampler) => {
                image_info = Some(vk::DescriptorImageInfo {
                    sampler: vk_sampler(sampler)?,
                    image_view: vk::ImageView::null(),
                    image_layout: vk::ImageLayout::UNDEFINED,
                });
            }
            RhiDescriptorResource::CombinedTextureSampler(texture, sampler) => {
                image_info = Some(vk::DescriptorImageInfo {
                    sampler: vk_sampler(sampler)?,
                    image_view: vk_image_view(texture)?,
                    image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                });
            }
        }

        let mut contents = self.inner.contents.lock();
        contents.write(&self.inner.layout, binding, array_index, resource)?;

        let buffer_infos: Vec<_> = buffer_info.into_iter().collect();
        let image_infos: Vec<_> = image_info.into_iter().collect();
        let mut descriptor_write = vk::WriteDescriptorSet::builder()
            .dst_set(self.inner.descriptor_set)
            .dst_binding(binding)
            .dst_array_element(array_index)
            .descriptor_type(layout_binding.binding_type.into());
        if !buffer_infos.is_empty() {
            descriptor_write = descriptor_write.buffer_info(&buffer_infos);
        } else {
            descriptor_write = descriptor_write.image_info(&image_infos);
        }

        unsafe {
            self.inner
                .pool
                .device_context
                .device()
                .update_descriptor_sets(&[descriptor_write.build()], &[]);
        }
        Ok(())
    }

    pub fn unwritten_bindings(&self) -> Vec<u32> {
        self.inner
            .contents
            .lock()
            .unwritten_bindings(&self.inner.layout)
    }
}
