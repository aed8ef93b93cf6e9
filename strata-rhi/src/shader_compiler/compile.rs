//! Everything that talks to naga: parsing, validation, per-entry-point reflection and bytecode
//! emission.

use super::program::{RhiShaderBytecode, RhiShaderStageModule};
use super::{RhiShaderEntryPoint, RhiShaderTarget};
use crate::reflection::{RhiBindingType, RhiShaderResource, RhiShaderStageReflection};
use crate::{RhiError, RhiResult, RhiShaderStageFlags};
use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

/// A parsed and validated module. Entry points are looked up in it by name and stage.
pub(super) struct ValidatedModule {
    pub module: naga::Module,
    pub info: ModuleInfo,
}

pub(super) fn parse_and_validate(
    name: &str,
    source: &str,
) -> RhiResult<ValidatedModule> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| RhiError::ShaderCompile {
        name: name.to_string(),
        diagnostic: e.emit_to_string(source),
    })?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| RhiError::ShaderCompile {
            name: name.to_string(),
            diagnostic: e.emit_to_string(source),
        })?;

    Ok(ValidatedModule { module, info })
}

pub(super) fn naga_stage(stage: RhiShaderStageFlags) -> Option<naga::ShaderStage> {
    if stage == RhiShaderStageFlags::VERTEX {
        Some(naga::ShaderStage::Vertex)
    } else if stage == RhiShaderStageFlags::FRAGMENT {
        Some(naga::ShaderStage::Fragment)
    } else if stage == RhiShaderStageFlags::COMPUTE {
        Some(naga::ShaderStage::Compute)
    } else {
        None
    }
}

pub(super) fn stage_flags(stage: naga::ShaderStage) -> RhiShaderStageFlags {
    match stage {
        naga::ShaderStage::Vertex => RhiShaderStageFlags::VERTEX,
        naga::ShaderStage::Fragment => RhiShaderStageFlags::FRAGMENT,
        naga::ShaderStage::Compute => RhiShaderStageFlags::COMPUTE,
    }
}

/// Every entry point the module defines, in source order
pub(super) fn module_entry_points(validated: &ValidatedModule) -> Vec<RhiShaderEntryPoint> {
    validated
        .module
        .entry_points
        .iter()
        .map(|x| RhiShaderEntryPoint::new(stage_flags(x.stage), x.name.clone()))
        .collect()
}

/// Index of the entry point with this name and stage, if the module has one
pub(super) fn find_entry_point(
    validated: &ValidatedModule,
    entry_point: &RhiShaderEntryPoint,
) -> Option<usize> {
    let stage = naga_stage(entry_point.stage)?;
    validated
        .module
        .entry_points
        .iter()
        .position(|x| x.stage == stage && x.name == entry_point.name)
}

/// Compile one entry point for the target. Fails only if the backend writer rejects the module.
pub(super) fn compile_entry_point(
    name: &str,
    validated: &ValidatedModule,
    entry_point_index: usize,
    target: RhiShaderTarget,
) -> RhiResult<RhiShaderStageModule> {
    let entry_point = &validated.module.entry_points[entry_point_index];
    let reflection = reflect_entry_point(validated, entry_point_index)?;

    let bytecode = match target {
        RhiShaderTarget::SpirV => {
            let pipeline_options = naga::back::spv::PipelineOptions {
                shader_stage: entry_point.stage,
                entry_point: entry_point.name.clone(),
            };
            let words = naga::back::spv::write_vec(
                &validated.module,
                &validated.info,
                &naga::back::spv::Options::default(),
                Some(&pipeline_options),
            )
            .map_err(|e| RhiError::ShaderCompile {
                name: name.to_string(),
                diagnostic: format!("SPIR-V emission for {} failed: {}", entry_point.name, e),
            })?;
            RhiShaderBytecode::SpirV(words)
        }
        RhiShaderTarget::Hlsl => {
            let options = naga::back::hlsl::Options {
                shader_model: naga::back::hlsl::ShaderModel::V6_0,
                ..Default::default()
            };
            let mut source = String::default();
            let reflection_info = naga::back::hlsl::Writer::new(&mut source, &options)
                .write(&validated.module, &validated.info)
                .map_err(|e| RhiError::ShaderCompile {
                    name: name.to_string(),
                    diagnostic: format!("HLSL emission failed: {}", e),
                })?;

            // The writer may rename entry points that collide with HLSL keywords
            let hlsl_entry_point = match reflection_info.entry_point_names.get(entry_point_index) {
                Some(Ok(renamed)) => renamed.clone(),
                Some(Err(e)) => Err(RhiError::ShaderCompile {
                    name: name.to_string(),
                    diagnostic: format!("HLSL entry point {} failed: {}", entry_point.name, e),
                })?,
                None => entry_point.name.clone(),
            };

            RhiShaderBytecode::Hlsl {
                source,
                entry_point: hlsl_entry_point,
                shader_model: "6_0".to_string(),
            }
        }
    };

    Ok(RhiShaderStageModule {
        stage: stage_flags(entry_point.stage),
        entry_point: entry_point.name.clone(),
        bytecode,
        reflection,
    })
}

/// The resources one entry point reads or writes. Globals the entry point never touches are not
/// reported for its stage.
pub(super) fn reflect_entry_point(
    validated: &ValidatedModule,
    entry_point_index: usize,
) -> RhiResult<RhiShaderStageReflection> {
    let module = &validated.module;
    let entry_point = &module.entry_points[entry_point_index];
    let function_info = validated.info.get_entry_point(entry_point_index);
    let shader_stage = stage_flags(entry_point.stage);

    let mut resources = Vec::default();
    let mut push_constant_size = 0;
    for (handle, global) in module.global_variables.iter() {
        if function_info[handle].is_empty() {
            continue;
        }

        if global.space == naga::AddressSpace::PushConstant {
            push_constant_size = module.types[global.ty].inner.size(module.to_ctx());
            continue;
        }

        let binding = match &global.binding {
            Some(binding) => binding,
            None => continue,
        };

        let (binding_type, element_count, size_in_bytes) =
            match describe_binding(module, global.space, global.ty) {
                Some(described) => described,
                None => {
                    return Err(format!(
                        "global {:?} at (group={} binding={}) has a type that cannot be bound",
                        global.name, binding.group, binding.binding
                    ))?
                }
            };

        resources.push(RhiShaderResource {
            binding_type,
            set_index: binding.group,
            binding: binding.binding,
            element_count,
            size_in_bytes,
            used_in_shader_stages: shader_stage,
            name: global.name.clone(),
        });
    }

    resources.sort_by_key(|x| (x.set_index, x.binding));

    Ok(RhiShaderStageReflection {
        shader_stage,
        entry_point_name: entry_point.name.clone(),
        resources,
        push_constant_size,
        thread_count: entry_point.workgroup_size,
    })
}

fn describe_binding(
    module: &naga::Module,
    space: naga::AddressSpace,
    ty: naga::Handle<naga::Type>,
) -> Option<(RhiBindingType, u32, u32)> {
    let inner = &module.types[ty].inner;
    match space {
        naga::AddressSpace::Uniform => Some((
            RhiBindingType::UniformBuffer,
            1,
            inner.size(module.to_ctx()),
        )),
        naga::AddressSpace::Storage { .. } => Some((
            RhiBindingType::StorageBuffer,
            1,
            inner.size(module.to_ctx()),
        )),
        naga::AddressSpace::Handle => match inner {
            naga::TypeInner::BindingArray { base, size } => {
                let (binding_type, _, size_in_bytes) = describe_binding(module, space, *base)?;
                let element_count = match size {
                    naga::ArraySize::Constant(count) => count.get(),
                    naga::ArraySize::Dynamic => 0,
                };
                Some((binding_type, element_count, size_in_bytes))
            }
            naga::TypeInner::Image { class, .. } => match class {
                naga::ImageClass::Storage { .. } => Some((RhiBindingType::StorageTexture, 1, 0)),
                _ => Some((RhiBindingType::SampledTexture, 1, 0)),
            },
            naga::TypeInner::Sampler { .. } => Some((RhiBindingType::Sampler, 1, 0)),
            naga::TypeInner::AccelerationStructure => {
                Some((RhiBindingType::AccelerationStructure, 1, 0))
            }
            _ => None,
        },
        _ => None,
    }
}
