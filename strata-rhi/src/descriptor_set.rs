use crate::backends::null::{RhiDescriptorPoolNull, RhiDescriptorSetNull};
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::{RhiDescriptorPoolVulkan, RhiDescriptorSetVulkan};
use crate::*;
use fnv::FnvHashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// A resource written into one descriptor
#[derive(Clone, Debug)]
pub enum RhiDescriptorResource {
    Buffer(RhiBuffer),
    Texture(RhiTexture),
    Sampler(RhiSampler),
    CombinedTextureSampler(RhiTexture, RhiSampler),
}

impl RhiDescriptorResource {
    fn kind(&self) -> &'static str {
        match self {
            RhiDescriptorResource::Buffer(_) => "buffer",
            RhiDescriptorResource::Texture(_) => "texture",
            RhiDescriptorResource::Sampler(_) => "sampler",
            RhiDescriptorResource::CombinedTextureSampler(_, _) => "texture/sampler pair",
        }
    }
}

/// Check that `resource` may be written into the binding `layout_binding` describes
pub(crate) fn verify_descriptor_write(
    layout_binding: &RhiShaderResource,
    array_index: u32,
    resource: &RhiDescriptorResource,
) -> RhiResult<()> {
    if array_index >= layout_binding.element_count_normalized() {
        return Err(format!(
            "array index {} is out of range for binding {} with {} elements",
            array_index,
            layout_binding.binding,
            layout_binding.element_count_normalized()
        ))?;
    }

    let type_mismatch = || {
        Err(RhiError::StringError(format!(
            "cannot write a {} into binding {} ({:?}) of set {}",
            resource.kind(),
            layout_binding.binding,
            layout_binding.binding_type,
            layout_binding.set_index
        )))
    };

    match (layout_binding.binding_type, resource) {
        (RhiBindingType::UniformBuffer, RhiDescriptorResource::Buffer(buffer)) => {
            let buffer_def = buffer.buffer_def();
            if !buffer_def.resource_type.is_uniform_buffer() {
                return Err("buffer bound as a uniform buffer lacks UNIFORM_BUFFER usage")?;
            }
            if buffer_def.size < layout_binding.size_in_bytes as u64 {
                return Err(format!(
                    "uniform buffer of {} bytes is smaller than the {} bytes binding {} reads",
                    buffer_def.size, layout_binding.size_in_bytes, layout_binding.binding
                ))?;
            }
            Ok(())
        }
        (RhiBindingType::StorageBuffer, RhiDescriptorResource::Buffer(buffer)) => {
            if !buffer.buffer_def().resource_type.is_storage_buffer() {
                return Err("buffer bound as a storage buffer lacks BUFFER or BUFFER_READ_WRITE usage")?;
            }
            Ok(())
        }
        (RhiBindingType::SampledTexture, RhiDescriptorResource::Texture(texture)) => {
            if !texture
                .texture_def()
                .resource_type
                .contains(RhiResourceType::TEXTURE)
            {
                return Err("texture bound for sampling lacks TEXTURE usage")?;
            }
            Ok(())
        }
        (RhiBindingType::StorageTexture, RhiDescriptorResource::Texture(texture)) => {
            if !texture
                .texture_def()
                .resource_type
                .contains(RhiResourceType::TEXTURE_READ_WRITE)
            {
                return Err("texture bound for storage lacks TEXTURE_READ_WRITE usage")?;
            }
            Ok(())
        }
        (RhiBindingType::Sampler, RhiDescriptorResource::Sampler(_)) => Ok(()),
        (
            RhiBindingType::CombinedImageSampler,
            RhiDescriptorResource::CombinedTextureSampler(texture, _),
        ) => {
            if !texture
                .texture_def()
                .resource_type
                .contains(RhiResourceType::TEXTURE)
            {
                return Err("texture bound for sampling lacks TEXTURE usage")?;
            }
            Ok(())
        }
        _ => type_mismatch(),
    }
}

/// What has been written into a descriptor set. Holding the resources keeps them alive for as
/// long as the set is.
#[derive(Debug)]
pub(crate) struct RhiDescriptorSetContents {
    // Parallel to the layout's bindings, one entry per array element
    resources: Vec<Vec<Option<RhiDescriptorResource>>>,
}

impl RhiDescriptorSetContents {
    pub(crate) fn new(layout: &RhiDescriptorSetLayoutDesc) -> Self {
        RhiDescriptorSetContents {
            resources: layout
                .bindings
                .iter()
                .map(|x| vec![None; x.element_count_normalized() as usize])
                .collect(),
        }
    }

    fn binding_position(
        layout: &RhiDescriptorSetLayoutDesc,
        binding: u32,
    ) -> RhiResult<usize> {
        layout
            .bindings
            .iter()
            .position(|x| x.binding == binding)
            .ok_or_else(|| {
                RhiError::StringError(format!(
                    "descriptor set {} has no binding {}",
                    layout.set_index, binding
                ))
            })
    }

    pub(crate) fn write(
        &mut self,
        layout: &RhiDescriptorSetLayoutDesc,
        binding: u32,
        array_index: u32,
        resource: RhiDescriptorResource,
    ) -> RhiResult<()> {
        let position = Self::binding_position(layout, binding)?;
        verify_descriptor_write(&layout.bindings[position], array_index, &resource)?;
        self.resources[position][array_index as usize] = Some(resource);
        Ok(())
    }

    pub(crate) fn resource(
        &self,
        layout: &RhiDescriptorSetLayoutDesc,
        binding: u32,
        array_index: u32,
    ) -> Option<&RhiDescriptorResource> {
        let position = Self::binding_position(layout, binding).ok()?;
        self.resources[position]
            .get(array_index as usize)
            .and_then(|x| x.as_ref())
    }

    /// Bindings with at least one element never written
    pub(crate) fn unwritten_bindings(
        &self,
        layout: &RhiDescriptorSetLayoutDesc,
    ) -> Vec<u32> {
        layout
            .bindings
            .iter()
            .zip(&self.resources)
            .filter(|(_, elements)| elements.iter().any(|x| x.is_none()))
            .map(|(binding, _)| binding.binding)
            .collect()
    }
}

#[derive(Debug, Default)]
struct RhiDescriptorUsage {
    sets: u32,
    descriptors: FnvHashMap<RhiBindingType, u32>,
}

/// Tracks how much of a descriptor pool's fixed capacity is in use. The pool is never grown,
/// allocation past capacity fails.
#[derive(Debug)]
pub(crate) struct RhiDescriptorBudget {
    pool_def: RhiDescriptorPoolDef,
    usage: Mutex<RhiDescriptorUsage>,
}

impl RhiDescriptorBudget {
    pub(crate) fn new(pool_def: &RhiDescriptorPoolDef) -> Arc<Self> {
        Arc::new(RhiDescriptorBudget {
            pool_def: pool_def.clone(),
            usage: Mutex::new(RhiDescriptorUsage::default()),
        })
    }

    pub(crate) fn pool_def(&self) -> &RhiDescriptorPoolDef {
        &self.pool_def
    }

    pub(crate) fn available_sets(&self) -> u32 {
        self.pool_def.max_sets - self.usage.lock().sets
    }

    pub(crate) fn available_descriptors(
        &self,
        binding_type: RhiBindingType,
    ) -> u32 {
        let used = self
            .usage
            .lock()
            .descriptors
            .get(&binding_type)
            .copied()
            .unwrap_or(0);
        self.pool_def.capacity(binding_type) - used
    }

    /// Claim capacity for one set with this layout. Released when the reservation is dropped.
    pub(crate) fn reserve(
        self: &Arc<Self>,
        layout: &RhiDescriptorSetLayoutDesc,
    ) -> RhiResult<RhiDescriptorReservation> {
        let pool_sizes = layout.pool_sizes();
        let mut usage = self.usage.lock();

        if usage.sets >= self.pool_def.max_sets {
            let error = RhiError::DescriptorPoolExhausted {
                binding_type: "descriptor sets".to_string(),
                requested: 1,
                available: 0,
            };
            log::error!("{}", error);
            return Err(error);
        }

        for &(binding_type, count) in &pool_sizes {
            let used = usage.descriptors.get(&binding_type).copied().unwrap_or(0);
            let available = self.pool_def.capacity(binding_type) - used;
            if count > available {
                let error = RhiError::DescriptorPoolExhausted {
                    binding_type: format!("{:?}", binding_type),
                    requested: count,
                    available,
                };
                log::error!("{}", error);
                return Err(error);
            }
        }

        usage.sets += 1;
        for &(binding_type, count) in &pool_sizes {
            *usage.descriptors.entry(binding_type).or_default() += count;
        }

        Ok(RhiDescriptorReservation {
            budget: self.clone(),
            pool_sizes,
        })
    }
}

/// Capacity held by one live descriptor set
#[derive(Debug)]
pub(crate) struct RhiDescriptorReservation {
    budget: Arc<RhiDescriptorBudget>,
    pool_sizes: Vec<(RhiBindingType, u32)>,
}

impl Drop for RhiDescriptorReservation {
    fn drop(&mut self) {
        let mut usage = self.budget.usage.lock();
        usage.sets -= 1;
        for &(binding_type, count) in &self.pool_sizes {
            if let Some(used) = usage.descriptors.get_mut(&binding_type) {
                *used -= count;
            }
        }
    }
}

/// Allocates descriptor sets shaped like a shader's reflected layout, up to a fixed capacity per
/// binding type. A set returns its capacity to the pool when its last clone is dropped.
pub enum RhiDescriptorPool {
    Null(RhiDescriptorPoolNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiDescriptorPoolVulkan),
}

impl RhiDescriptorPool {
    /// Allocate a set matching `set_index` of the shader's binding layout. Fails with
    /// `RhiError::DescriptorPoolExhausted` if the pool lacks capacity.
    pub fn allocate_descriptor_set(
        &mut self,
        shader: &RhiShader,
        set_index: u32,
    ) -> RhiResult<RhiDescriptorSet> {
        let layout = shader
            .binding_layout()
            .set(set_index)
            .ok_or_else(|| {
                RhiError::StringError(format!(
                    "shader {} has no descriptor set {}",
                    shader.program().name(),
                    set_index
                ))
            })?
            .clone();

        Ok(match self {
            RhiDescriptorPool::Null(inner) => {
                RhiDescriptorSet::Null(inner.allocate_descriptor_set(layout)?)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiDescriptorPool::Vk(inner) => {
                RhiDescriptorSet::Vk(inner.allocate_descriptor_set(shader, layout)?)
            }
        })
    }

    pub fn pool_def(&self) -> &RhiDescriptorPoolDef {
        self.budget().pool_def()
    }

    /// Sets that can still be allocated
    pub fn available_sets(&self) -> u32 {
        self.budget().available_sets()
    }

    /// Descriptors of one type that can still be allocated
    pub fn available_descriptors(
        &self,
        binding_type: RhiBindingType,
    ) -> u32 {
        self.budget().available_descriptors(binding_type)
    }

    fn budget(&self) -> &RhiDescriptorBudget {
        match self {
            RhiDescriptorPool::Null(inner) => inner.budget(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDescriptorPool::Vk(inner) => inner.budget(),
        }
    }
}

/// A set of descriptors shaped like one descriptor set of a shader's binding layout. Cheap to
/// clone. The GPU reads the set's contents when a draw or dispatch using it executes, so do not
/// write a set that a submitted command buffer still uses.
#[derive(Clone, Debug)]
pub enum RhiDescriptorSet {
    Null(RhiDescriptorSetNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiDescriptorSetVulkan),
}

impl RhiDescriptorSet {
    pub fn set_index(&self) -> u32 {
        self.layout().set_index
    }

    pub fn layout(&self) -> &RhiDescriptorSetLayoutDesc {
        match self {
            RhiDescriptorSet::Null(inner) => inner.layout(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDescriptorSet::Vk(inner) => inner.layout(),
        }
    }

    /// Write one element of a binding. The resource kind must match the binding's reflected type.
    pub fn write(
        &self,
        binding: u32,
        array_index: u32,
        resource: RhiDescriptorResource,
    ) -> RhiResult<()> {
        match self {
            RhiDescriptorSet::Null(inner) => inner.write(binding, array_index, resource),
            #[cfg(feature = "rhi-vulkan")]
            RhiDescriptorSet::Vk(inner) => inner.write(binding, array_index, resource),
        }
    }

    pub fn set_buffer(
        &self,
        binding: u32,
        buffer: &RhiBuffer,
    ) -> RhiResult<()> {
        self.write(binding, 0, RhiDescriptorResource::Buffer(buffer.clone()))
    }

    pub fn set_texture(
        &self,
        binding: u32,
        texture: &RhiTexture,
    ) -> RhiResult<()> {
        self.write(binding, 0, RhiDescriptorResource::Texture(texture.clone()))
    }

    pub fn set_sampler(
        &self,
        binding: u32,
        sampler: &RhiSampler,
    ) -> RhiResult<()> {
        self.write(binding, 0, RhiDescriptorResource::Sampler(sampler.clone()))
    }

    pub fn set_combined_texture_sampler(
        &self,
        binding: u32,
        texture: &RhiTexture,
        sampler: &RhiSampler,
    ) -> RhiResult<()> {
        self.write(
            binding,
            0,
            RhiDescriptorResource::CombinedTextureSampler(texture.clone(), sampler.clone()),
        )
    }

    /// Bindings of the set with elements that were never written
    pub fn unwritten_bindings(&self) -> Vec<u32> {
        match self {
            RhiDescriptorSet::Null(inner) => inner.unwritten_bindings(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDescriptorSet::Vk(inner) => inner.unwritten_bindings(),
        }
    }

    pub fn null_descriptor_set(&self) -> Option<&RhiDescriptorSetNull> {
        match self {
            RhiDescriptorSet::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiDescriptorSet::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_descriptor_set(&self) -> Option<&RhiDescriptorSetVulkan> {
        match self {
            RhiDescriptorSet::Null(_) => None,
            RhiDescriptorSet::Vk(inner) => Some(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RhiDescriptorSetLayoutDesc {
        RhiDescriptorSetLayoutDesc {
            set_index: 0,
            bindings: vec![RhiShaderResource {
                binding_type: RhiBindingType::UniformBuffer,
                set_index: 0,
                binding: 0,
                element_count: 0,
                size_in_bytes: 64,
                used_in_shader_stages: RhiShaderStageFlags::VERTEX,
                name: Some("view".to_string()),
            }],
        }
    }

    #[test]
    fn budget_is_released_on_drop() {
        let budget = RhiDescriptorBudget::new(&RhiDescriptorPoolDef {
            max_sets: 4,
            uniform_buffers: 1,
            ..Default::default()
        });

        let reservation = budget.reserve(&layout()).unwrap();
        assert_eq!(budget.available_sets(), 3);
        assert_eq!(budget.available_descriptors(RhiBindingType::UniformBuffer), 0);

        match budget.reserve(&layout()) {
            Err(RhiError::DescriptorPoolExhausted {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }

        drop(reservation);
        assert_eq!(budget.available_sets(), 4);
        assert!(budget.reserve(&layout()).is_ok());
    }

    #[test]
    fn max_sets_is_enforced() {
        let budget = RhiDescriptorBudget::new(&RhiDescriptorPoolDef {
            max_sets: 1,
            ..Default::default()
        });
        let empty = RhiDescriptorSetLayoutDesc::default();
        let _first = budget.reserve(&empty).unwrap();
        assert!(matches!(
            budget.reserve(&empty),
            Err(RhiError::DescriptorPoolExhausted { .. })
        ));
    }

    #[test]
    fn contents_track_unwritten_bindings() {
        let layout = layout();
        let contents = RhiDescriptorSetContents::new(&layout);
        assert_eq!(contents.unwritten_bindings(&layout), vec![0]);
        assert!(contents.resource(&layout, 0, 0).is_none());
        assert!(contents.resource(&layout, 7, 0).is_none());
    }
}
