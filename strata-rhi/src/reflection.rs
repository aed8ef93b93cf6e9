//! The binding layout of a shader program as plain data. Produced from per-stage reflection and
//! consumed by descriptor set and pipeline layout creation. Nothing in here touches a device.

use crate::types::RhiShaderStageFlags;
use crate::RhiResult;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

/// Kind of resource bound at a descriptor slot
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiBindingType {
    Sampler,
    CombinedImageSampler,
    SampledTexture,
    StorageTexture,
    UniformBuffer,
    StorageBuffer,
    AccelerationStructure,
}

/// Every binding type, in the order pool sizes are reported
pub const ALL_BINDING_TYPES: [RhiBindingType; 7] = [
    RhiBindingType::Sampler,
    RhiBindingType::CombinedImageSampler,
    RhiBindingType::SampledTexture,
    RhiBindingType::StorageTexture,
    RhiBindingType::UniformBuffer,
    RhiBindingType::StorageBuffer,
    RhiBindingType::AccelerationStructure,
];

impl RhiBindingType {
    pub fn is_buffer(self) -> bool {
        match self {
            RhiBindingType::UniformBuffer | RhiBindingType::StorageBuffer => true,
            _ => false,
        }
    }

    pub fn is_texture(self) -> bool {
        match self {
            RhiBindingType::SampledTexture
            | RhiBindingType::StorageTexture
            | RhiBindingType::CombinedImageSampler => true,
            _ => false,
        }
    }
}

#[derive(PartialEq, Eq, Hash)]
struct RhiShaderResourceBindingKey {
    set: u32,
    binding: u32,
}

/// One descriptor binding a shader stage reads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhiShaderResource {
    pub binding_type: RhiBindingType,
    pub set_index: u32,
    pub binding: u32,
    /// Number of array elements. 0 and 1 both mean "not an array".
    pub element_count: u32,
    /// Size of the buffer block for buffer bindings, 0 if unsized or not a buffer
    pub size_in_bytes: u32,
    pub used_in_shader_stages: RhiShaderStageFlags,
    pub name: Option<String>,
}

impl RhiShaderResource {
    pub fn element_count_normalized(&self) -> u32 {
        // Assume 0 = default of 1
        self.element_count.max(1)
    }

    fn binding_key(&self) -> RhiShaderResourceBindingKey {
        RhiShaderResourceBindingKey {
            set: self.set_index,
            binding: self.binding,
        }
    }

    fn verify_compatible_across_stages(
        &self,
        other: &Self,
    ) -> RhiResult<()> {
        if self.binding_type != other.binding_type {
            Err(format!(
                "shader stages disagree on the type of (set={} binding={}): {:?} and {:?}",
                self.set_index, self.binding, self.binding_type, other.binding_type
            ))?;
        }

        if self.element_count_normalized() != other.element_count_normalized() {
            Err(format!(
                "shader stages disagree on the element count of (set={} binding={}): {} and {}",
                self.set_index,
                self.binding,
                self.element_count_normalized(),
                other.element_count_normalized()
            ))?;
        }

        if self.size_in_bytes != other.size_in_bytes {
            Err(format!(
                "shader stages disagree on the size of (set={} binding={}): {} and {}",
                self.set_index, self.binding, self.size_in_bytes, other.size_in_bytes
            ))?;
        }

        Ok(())
    }
}

/// A block of push constants visible to some stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhiPushConstantRange {
    pub used_in_shader_stages: RhiShaderStageFlags,
    pub offset: u32,
    pub size: u32,
}

/// What one compiled entry point needs bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhiShaderStageReflection {
    pub shader_stage: RhiShaderStageFlags,
    pub entry_point_name: String,
    pub resources: Vec<RhiShaderResource>,
    /// Size of the push constant block, 0 if the stage uses none
    pub push_constant_size: u32,
    /// Workgroup size, only meaningful for compute
    pub thread_count: [u32; 3],
}

/// The bindings of one descriptor set, sorted by binding index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RhiDescriptorSetLayoutDesc {
    pub set_index: u32,
    pub bindings: Vec<RhiShaderResource>,
}

impl RhiDescriptorSetLayoutDesc {
    pub fn binding(
        &self,
        binding: u32,
    ) -> Option<&RhiShaderResource> {
        self.bindings.iter().find(|x| x.binding == binding)
    }

    pub fn find_by_name(
        &self,
        name: &str,
    ) -> Option<&RhiShaderResource> {
        self.bindings
            .iter()
            .find(|x| x.name.as_deref() == Some(name))
    }

    /// Number of descriptors of each type a set with this layout consumes
    pub fn pool_sizes(&self) -> Vec<(RhiBindingType, u32)> {
        count_descriptors(self.bindings.iter())
    }
}

/// The aggregate binding layout of a linked program: every descriptor set the program reads plus
/// its push constant ranges. This is the data a pipeline layout is built from.
///
/// `sets` is dense, `sets[i].set_index == i`, so a set that no stage uses shows up with no
/// bindings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RhiBindingLayout {
    pub shader_stages: RhiShaderStageFlags,
    pub sets: Vec<RhiDescriptorSetLayoutDesc>,
    pub push_constant_ranges: Vec<RhiPushConstantRange>,
}

impl RhiBindingLayout {
    /// Merge the reflection of each stage into one layout. A binding used by several stages must
    /// agree on type, count and size; it is reported once with the union of its stages.
    pub fn from_stages(stages: &[RhiShaderStageReflection]) -> RhiResult<RhiBindingLayout> {
        log::trace!("Create RhiBindingLayout from {} stages", stages.len());

        let mut all_shader_stages = RhiShaderStageFlags::empty();
        for stage in stages {
            if stage.shader_stage.is_empty() || stage.shader_stage.bits().count_ones() != 1 {
                Err(format!(
                    "entry point {} must belong to exactly one stage, has {:?}",
                    stage.entry_point_name, stage.shader_stage
                ))?;
            }

            if all_shader_stages.intersects(stage.shader_stage) {
                Err(format!(
                    "duplicate shader stage {:?} found when creating RhiBindingLayout",
                    stage.shader_stage
                ))?;
            }

            all_shader_stages |= stage.shader_stage;
        }

        let mut merged_resources =
            FnvHashMap::<RhiShaderResourceBindingKey, RhiShaderResource>::default();

        for stage in stages {
            for resource in &stage.resources {
                // A resource may come in with its stage already set, or with no stages at all
                if !(resource.used_in_shader_stages - stage.shader_stage).is_empty() {
                    let message = format!(
                        "a resource in shader stage {:?} has other stages {:?} set",
                        stage.shader_stage,
                        resource.used_in_shader_stages - stage.shader_stage
                    );
                    log::error!("{}", message);
                    Err(message)?;
                }

                let mut resource = resource.clone();
                resource.used_in_shader_stages |= stage.shader_stage;

                let key = resource.binding_key();
                if let Some(existing_resource) = merged_resources.get_mut(&key) {
                    existing_resource.verify_compatible_across_stages(&resource)?;
                    log::trace!(
                        "    {:?} already used in {:?}, adding {:?}",
                        resource.name,
                        existing_resource.used_in_shader_stages,
                        resource.used_in_shader_stages
                    );
                    existing_resource.used_in_shader_stages |= resource.used_in_shader_stages;
                    if existing_resource.name.is_none() {
                        existing_resource.name = resource.name;
                    }
                } else {
                    log::trace!(
                        "    {:?} first used in {:?}",
                        resource.name,
                        resource.used_in_shader_stages
                    );
                    merged_resources.insert(key, resource);
                }
            }
        }

        let set_count = merged_resources
            .values()
            .map(|resource| resource.set_index + 1)
            .max()
            .unwrap_or(0);

        let mut sets: Vec<_> = (0..set_count)
            .map(|set_index| RhiDescriptorSetLayoutDesc {
                set_index,
                bindings: Vec::default(),
            })
            .collect();

        for (_, resource) in merged_resources {
            sets[resource.set_index as usize].bindings.push(resource);
        }

        for set in &mut sets {
            set.bindings.sort_by_key(|x| x.binding);
        }

        // All stages share one range at offset 0, sized for the largest block
        let mut push_constant_ranges = Vec::default();
        let push_constant_stages = stages
            .iter()
            .filter(|stage| stage.push_constant_size > 0)
            .fold(RhiShaderStageFlags::empty(), |used, stage| {
                used | stage.shader_stage
            });
        if !push_constant_stages.is_empty() {
            let size = stages
                .iter()
                .map(|stage| stage.push_constant_size)
                .max()
                .unwrap_or(0);
            push_constant_ranges.push(RhiPushConstantRange {
                used_in_shader_stages: push_constant_stages,
                offset: 0,
                size,
            });
        }

        Ok(RhiBindingLayout {
            shader_stages: all_shader_stages,
            sets,
            push_constant_ranges,
        })
    }

    pub fn set(
        &self,
        set_index: u32,
    ) -> Option<&RhiDescriptorSetLayoutDesc> {
        self.sets.get(set_index as usize)
    }

    /// Total number of descriptors of each type across all sets
    pub fn pool_sizes(&self) -> Vec<(RhiBindingType, u32)> {
        count_descriptors(self.sets.iter().flat_map(|set| set.bindings.iter()))
    }

    pub fn push_constant_size(&self) -> u32 {
        self.push_constant_ranges
            .iter()
            .map(|range| range.offset + range.size)
            .max()
            .unwrap_or(0)
    }

    pub fn find_resource_by_name(
        &self,
        name: &str,
    ) -> Option<&RhiShaderResource> {
        self.sets.iter().find_map(|set| set.find_by_name(name))
    }
}

fn count_descriptors<'a, I: Iterator<Item = &'a RhiShaderResource>>(
    resources: I
) -> Vec<(RhiBindingType, u32)> {
    let mut counts = FnvHashMap::<RhiBindingType, u32>::default();
    for resource in resources {
        *counts.entry(resource.binding_type).or_default() += resource.element_count_normalized();
    }

    ALL_BINDING_TYPES
        .iter()
        .filter_map(|binding_type| {
            counts
                .get(binding_type)
                .map(|&count| (*binding_type, count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(
        set_index: u32,
        binding: u32,
        binding_type: RhiBindingType,
    ) -> RhiShaderResource {
        RhiShaderResource {
            binding_type,
            set_index,
            binding,
            element_count: 1,
            size_in_bytes: 0,
            used_in_shader_stages: RhiShaderStageFlags::empty(),
            name: None,
        }
    }

    fn stage(
        shader_stage: RhiShaderStageFlags,
        resources: Vec<RhiShaderResource>,
        push_constant_size: u32,
    ) -> RhiShaderStageReflection {
        RhiShaderStageReflection {
            shader_stage,
            entry_point_name: "main".to_string(),
            resources,
            push_constant_size,
            thread_count: [0; 3],
        }
    }

    #[test]
    fn merges_shared_bindings() {
        let mut uniforms = resource(0, 0, RhiBindingType::UniformBuffer);
        uniforms.size_in_bytes = 64;
        uniforms.name = Some("view".to_string());

        let vertex = stage(RhiShaderStageFlags::VERTEX, vec![uniforms.clone()], 16);
        let fragment = stage(
            RhiShaderStageFlags::FRAGMENT,
            vec![
                uniforms,
                resource(1, 0, RhiBindingType::SampledTexture),
                resource(1, 1, RhiBindingType::Sampler),
            ],
            0,
        );

        let layout = RhiBindingLayout::from_stages(&[vertex, fragment]).unwrap();
        assert_eq!(
            layout.shader_stages,
            RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT
        );
        assert_eq!(layout.sets.len(), 2);
        assert_eq!(layout.sets[0].bindings.len(), 1);
        assert_eq!(
            layout.sets[0].bindings[0].used_in_shader_stages,
            RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT
        );
        assert_eq!(
            layout.sets[1]
                .bindings
                .iter()
                .map(|x| x.binding)
                .collect::<Vec<_>>(),
            vec![0, 1]
        );

        assert_eq!(layout.push_constant_ranges.len(), 1);
        assert_eq!(
            layout.push_constant_ranges[0].used_in_shader_stages,
            RhiShaderStageFlags::VERTEX
        );
        assert_eq!(layout.push_constant_size(), 16);
        assert!(layout.find_resource_by_name("view").is_some());
    }

    #[test]
    fn rejects_conflicting_bindings() {
        let vertex = stage(
            RhiShaderStageFlags::VERTEX,
            vec![resource(0, 0, RhiBindingType::UniformBuffer)],
            0,
        );
        let fragment = stage(
            RhiShaderStageFlags::FRAGMENT,
            vec![resource(0, 0, RhiBindingType::StorageBuffer)],
            0,
        );
        assert!(RhiBindingLayout::from_stages(&[vertex, fragment]).is_err());
    }

    #[test]
    fn rejects_duplicate_stages() {
        let a = stage(RhiShaderStageFlags::FRAGMENT, vec![], 0);
        let b = stage(RhiShaderStageFlags::FRAGMENT, vec![], 0);
        assert!(RhiBindingLayout::from_stages(&[a, b]).is_err());
    }

    #[test]
    fn sets_are_dense_and_pool_sizes_count_arrays() {
        let mut textures = resource(2, 3, RhiBindingType::SampledTexture);
        textures.element_count = 4;
        let compute = stage(
            RhiShaderStageFlags::COMPUTE,
            vec![textures, resource(2, 0, RhiBindingType::StorageBuffer)],
            0,
        );

        let layout = RhiBindingLayout::from_stages(&[compute]).unwrap();
        assert_eq!(layout.sets.len(), 3);
        assert!(layout.set(0).unwrap().bindings.is_empty());
        assert!(layout.set(1).unwrap().bindings.is_empty());
        assert_eq!(layout.set(2).unwrap().set_index, 2);
        assert!(layout.set(3).is_none());

        assert_eq!(
            layout.pool_sizes(),
            vec![
                (RhiBindingType::SampledTexture, 4),
                (RhiBindingType::StorageBuffer, 1)
            ]
        );
        assert!(layout.push_constant_ranges.is_empty());
    }
}
