use super::RhiDeviceContextVulkan;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use std::ffi::CString;
use std::sync::Arc;

/// One compiled stage of the program
pub(super) struct VkShaderStage {
    pub stage: RhiShaderStageFlags,
    pub module: vk::ShaderModule,
    pub entry_point: CString,
}

struct RhiShaderVulkanInner {
    device_context: RhiDeviceContextVulkan,
    program: RhiShaderProgram,
    stages: Vec<VkShaderStage>,
    // Indexed by set index. Sets the program does not use get an empty layout.
    descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
    pipeline_layout: vk::PipelineLayout,
    _count_guard: RhiObjectCountGuard,
}

impl Drop for RhiShaderVulkanInner {
    fn drop(&mut self) {
        let device = self.device_context.device();
        unsafe {
            device.destroy_pipeline_layout(self.pipeline_layout, None);
            for layout in &self.descriptor_set_layouts {
                device.destroy_descriptor_set_layout(*layout, None);
            }
            for stage in &self.stages {
                device.destroy_shader_module(stage.module, None);
            }
        }
    }
}

/// A linked program with its shader modules and the pipeline layout its reflection describes.
/// Every pipeline created from it shares the layout, so descriptor sets are compatible across them.
#[derive(Clone)]
pub struct RhiShaderVulkan {
    inner: Arc<RhiShaderVulkanInner>,
}

impl std::fmt::Debug for RhiShaderVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiShaderVulkan")
            .field("name", &self.inner.program.name())
            .field("pipeline_layout", &self.inner.pipeline_layout)
            .finish()
    }
}

/// Destroys what was created so far if shader creation fails part way
struct PartialShader<'a> {
    device: &'a ash::Device,
    modules: Vec<vk::ShaderModule>,
    layouts: Vec<vk::DescriptorSetLayout>,
}

impl<'a> Drop for PartialShader<'a> {
    fn drop(&mut self) {
        unsafe {
            for layout in self.layouts.drain(..) {
                self.device.destroy_descriptor_set_layout(layout, None);
            }
            for module in self.modules.drain(..) {
                self.device.destroy_shader_module(module, None);
            }
        }
    }
}

impl RhiShaderVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        program: RhiShaderProgram,
    ) -> RhiResult<Self> {
        let device = device_context.device();
        let mut partial = PartialShader {
            device,
            modules: vec![],
            layouts: vec![],
        };

        let mut stages = Vec::with_capacity(program.stages().len());
        for stage_module in program.stages() {
            let spirv = stage_module.bytecode.spirv().ok_or_else(|| {
                format!(
                    "shader {} stage {:?} was not compiled to SPIR-V",
                    program.name(),
                    stage_module.stage
                )
            })?;

            let create_info = vk::ShaderModuleCreateInfo::builder().code(spirv);
            let module = unsafe { device.create_shader_module(&create_info, None)? };
            partial.modules.push(module);

            let entry_point = CString::new(stage_module.entry_point.as_str())
                .map_err(|_| "entry point name cannot contain a nul byte")?;
            stages.push(VkShaderStage {
                stage: stage_module.stage,
                module,
                entry_point,
            });
        }

        let binding_layout = program.binding_layout();
        let set_count = binding_layout
            .sets
            .iter()
            .map(|x| x.set_index + 1)
            .max()
            .unwrap_or(0);

        for set_index in 0..set_count {
            let bindings: Vec<_> = binding_layout
                .set(set_index)
                .map(|set| {
                    set.bindings
                        .iter()
                        .map(|resource| {
                            vk::DescriptorSetLayoutBinding::builder()
                                .binding(resource.binding)
                                .descriptor_type(resource.binding_type.into())
                                .descriptor_count(resource.element_count_normalized())
                                .stage_flags(resource.used_in_shader_stages.into())
                                .build()
                        })
                        .collect()
                })
                .unwrap_or_default();

            let create_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&bindings);
            let layout = unsafe { device.create_descriptor_set_layout(&create_info, None)? };
            partial.layouts.push(layout);
        }

        let push_constant_ranges: Vec<_> = binding_layout
            .push_constant_ranges
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: range.used_in_shader_stages.into(),
                offset: range.offset,
                size: range.size,
            })
            .collect();

        let pipeline_layout_create_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&partial.layouts)
            .push_constant_ranges(&push_constant_ranges);
        let pipeline_layout =
            unsafe { device.create_pipeline_layout(&pipeline_layout_create_info, None)? };

        let descriptor_set_layouts = std::mem::take(&mut partial.layouts);
        partial.modules.clear();

        log::trace!(
            "Shader {} created with stages {:?} and {} descriptor set layouts",
            program.name(),
            program.shader_stages(),
            descriptor_set_layouts.len()
        );

        Ok(RhiShaderVulkan {
            inner: Arc::new(RhiShaderVulkanInner {
                device_context: device_context.clone(),
                program,
                stages,
                descriptor_set_layouts,
                pipeline_layout,
                _count_guard: device_context.counters().track(RhiObjectKind::Shader),
            }),
        })
    }

    pub fn program(&self) -> &RhiShaderProgram {
        &self.inner.program
    }

    pub fn vk_pipeline_layout(&self) -> vk::PipelineLayout {
        self.inner.pipeline_layout
    }

    pub fn vk_descriptor_set_layout(
        &self,
        set_index: u32,
    ) -> Option<vk::DescriptorSetLayout> {
        self.inner
            .descriptor_set_layouts
            .get(set_index as usize)
            .copied()
    }

    pub(super) fn stages(&self) -> &[VkShaderStage] {
        &self.inner.stages
    }

    /// Stages that can see the push constant range overlapping `offset`
    pub(super) fn push_constant_stages(
        &self,
        offset: u32,
        size: u32,
    ) -> vk::ShaderStageFlags {
        let mut stages = RhiShaderStageFlags::NONE;
        for range in &self.inner.program.binding_layout().push_constant_ranges {
            if offset < range.offset + range.size && range.offset < offset + size {
                stages |= range.used_in_shader_stages;
            }
        }
        stages.into()
    }
}
