//! Turns shader source into a linked `RhiShaderProgram`.
//!
//! Source is WGSL with a few preprocessor directives on top (`#include`, `#define`,
//! `#pragma <stage> <entry point>`). The steps are: preprocess, parse and validate the module,
//! resolve each requested entry point by name and stage, emit bytecode per stage for the device's
//! target, reflect each stage, then link the stages into a program with one binding layout.
//!
//! Any failure along the way is returned with the compiler's diagnostic text. Nothing partially
//! compiled is ever handed out.

mod compile;
mod preprocess;
mod program;

pub use preprocess::{
    parse_stage_name, RhiPreprocessedShader, RhiShaderEntryPoint, RhiShaderPreprocessor,
};
pub use program::{RhiShaderBytecode, RhiShaderModuleSet, RhiShaderProgram, RhiShaderStageModule};

use crate::{RhiApiDef, RhiBackendType, RhiDeviceContext, RhiResult, RhiShader};
use std::path::Path;

/// Which bytecode a device consumes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiShaderTarget {
    /// Vulkan, OpenGL (as a binary shader), and the headless device
    SpirV,
    /// D3D12
    Hlsl,
}

impl RhiShaderTarget {
    pub fn for_backend(backend: RhiBackendType) -> Self {
        match backend {
            RhiBackendType::D3d12 => RhiShaderTarget::Hlsl,
            RhiBackendType::None | RhiBackendType::OpenGl | RhiBackendType::Vulkan => {
                RhiShaderTarget::SpirV
            }
        }
    }
}

/// Compiles shaders for one target. Cheap to create, get one from
/// `RhiDeviceContext::shader_compiler()` so include directories and defines come from the
/// device's configuration.
#[derive(Debug, Clone)]
pub struct RhiShaderCompiler {
    preprocessor: RhiShaderPreprocessor,
    target: RhiShaderTarget,
}

impl RhiShaderCompiler {
    pub fn new(
        preprocessor: RhiShaderPreprocessor,
        target: RhiShaderTarget,
    ) -> Self {
        RhiShaderCompiler {
            preprocessor,
            target,
        }
    }

    pub fn from_api_def(api_def: &RhiApiDef) -> Self {
        let preprocessor = RhiShaderPreprocessor::new(
            api_def.shader_include_dirs.clone(),
            api_def.shader_defines.clone(),
        );
        Self::new(preprocessor, RhiShaderTarget::for_backend(api_def.backend))
    }

    pub fn target(&self) -> RhiShaderTarget {
        self.target
    }

    pub fn preprocessor(&self) -> &RhiShaderPreprocessor {
        &self.preprocessor
    }

    pub fn preprocessor_mut(&mut self) -> &mut RhiShaderPreprocessor {
        &mut self.preprocessor
    }

    /// Compile and link a shader file. Entry points come from the file's pragmas, or are every
    /// entry point the module defines if it declares none.
    #[profiling::function]
    pub fn compile_file(
        &self,
        path: &Path,
    ) -> RhiResult<RhiShaderProgram> {
        let preprocessed = self.preprocessor.preprocess_file(path)?;
        self.compile_preprocessed(&preprocessed)
    }

    /// Compile and link source that is not on disk. Includes resolve against the include
    /// directories only.
    pub fn compile_str(
        &self,
        name: &str,
        source: &str,
    ) -> RhiResult<RhiShaderProgram> {
        let preprocessed = self.preprocessor.preprocess_str(name, source, None)?;
        self.compile_preprocessed(&preprocessed)
    }

    fn compile_preprocessed(
        &self,
        preprocessed: &RhiPreprocessedShader,
    ) -> RhiResult<RhiShaderProgram> {
        let module_set = if preprocessed.entry_points.is_empty() {
            self.compile_all_stages(preprocessed)?
        } else {
            self.compile_stages(preprocessed, &preprocessed.entry_points)?
        };

        let program = module_set.link()?;
        log::debug!(
            "Linked shader {} with stages {:?}, {} descriptor sets, {} bytes of push constants",
            program.name(),
            program.shader_stages(),
            program.binding_layout().sets.len(),
            program.binding_layout().push_constant_size()
        );
        Ok(program)
    }

    /// Compile the requested entry points. An entry point the module does not define (for the
    /// requested stage) produces no stage module and is reported in `missing_entry_points`.
    pub fn compile_stages(
        &self,
        preprocessed: &RhiPreprocessedShader,
        entry_points: &[RhiShaderEntryPoint],
    ) -> RhiResult<RhiShaderModuleSet> {
        let validated = self.parse(preprocessed)?;

        let mut stage_modules = Vec::with_capacity(entry_points.len());
        let mut missing_entry_points = Vec::default();
        for entry_point in entry_points {
            match compile::find_entry_point(&validated, entry_point) {
                Some(index) => {
                    stage_modules.push(self.compile_entry_point(
                        preprocessed,
                        &validated,
                        index,
                    )?);
                }
                None => {
                    if compile::naga_stage(entry_point.stage).is_none() {
                        log::warn!(
                            "Shader {}: stage {:?} of entry point {} cannot be expressed in WGSL",
                            preprocessed.name,
                            entry_point.stage,
                            entry_point.name
                        );
                    } else {
                        log::warn!(
                            "Shader {}: entry point {} ({:?}) not found",
                            preprocessed.name,
                            entry_point.name,
                            entry_point.stage
                        );
                    }
                    missing_entry_points.push(entry_point.clone());
                }
            }
        }

        Ok(RhiShaderModuleSet {
            name: preprocessed.name.clone(),
            target: self.target,
            stage_modules,
            missing_entry_points,
            source_files: preprocessed.files.clone(),
        })
    }

    fn compile_all_stages(
        &self,
        preprocessed: &RhiPreprocessedShader,
    ) -> RhiResult<RhiShaderModuleSet> {
        let validated = self.parse(preprocessed)?;
        let entry_points = compile::module_entry_points(&validated);
        log::trace!(
            "Shader {} declares no entry points, using {:?}",
            preprocessed.name,
            entry_points
        );

        let mut stage_modules = Vec::with_capacity(entry_points.len());
        for index in 0..entry_points.len() {
            stage_modules.push(self.compile_entry_point(preprocessed, &validated, index)?);
        }

        Ok(RhiShaderModuleSet {
            name: preprocessed.name.clone(),
            target: self.target,
            stage_modules,
            missing_entry_points: Vec::default(),
            source_files: preprocessed.files.clone(),
        })
    }

    fn parse(
        &self,
        preprocessed: &RhiPreprocessedShader,
    ) -> RhiResult<compile::ValidatedModule> {
        compile::parse_and_validate(&preprocessed.name, &preprocessed.source).map_err(|e| {
            log::error!("{}", e);
            e
        })
    }

    fn compile_entry_point(
        &self,
        preprocessed: &RhiPreprocessedShader,
        validated: &compile::ValidatedModule,
        index: usize,
    ) -> RhiResult<RhiShaderStageModule> {
        compile::compile_entry_point(&preprocessed.name, validated, index, self.target).map_err(
            |e| {
                log::error!("{}", e);
                e
            },
        )
    }

    /// Recompile a shader from disk and swap it in. If anything fails, `shader` is left as it
    /// was and the error is returned. Pipelines and recorded commands that hold the old shader
    /// keep using it until they are dropped.
    pub fn reload(
        &self,
        device_context: &RhiDeviceContext,
        path: &Path,
        shader: &mut RhiShader,
    ) -> RhiResult<()> {
        log::info!("Reloading shader {:?}", path);
        let program = self.compile_file(path)?;
        let new_shader = device_context.create_shader(program)?;
        *shader = new_shader;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::RhiBindingType;
    use crate::{RhiError, RhiShaderStageFlags};

    const TRIANGLE: &str = r#"
#pragma vertex vs_main
#pragma fragment fs_main

struct ViewUniforms {
    transform: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> view: ViewUniforms;
@group(1) @binding(0) var albedo: texture_2d<f32>;
@group(1) @binding(1) var albedo_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = view.transform * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(albedo, albedo_sampler, input.uv);
}
"#;

    fn compiler(target: RhiShaderTarget) -> RhiShaderCompiler {
        RhiShaderCompiler::new(Default::default(), target)
    }

    #[test]
    fn compiles_and_reflects_pragma_entry_points() {
        let program = compiler(RhiShaderTarget::SpirV)
            .compile_str("triangle", TRIANGLE)
            .unwrap();

        assert_eq!(
            program.shader_stages(),
            RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT
        );
        let vertex = program.stage(RhiShaderStageFlags::VERTEX).unwrap();
        assert_eq!(vertex.entry_point, "vs_main");
        // SPIR-V magic number
        assert_eq!(vertex.bytecode.spirv().unwrap()[0], 0x0723_0203);

        let layout = program.binding_layout();
        assert_eq!(layout.sets.len(), 2);
        let view = &layout.sets[0].bindings[0];
        assert_eq!(view.binding_type, RhiBindingType::UniformBuffer);
        assert_eq!(view.size_in_bytes, 64);
        assert_eq!(view.used_in_shader_stages, RhiShaderStageFlags::VERTEX);

        let albedo = layout.find_resource_by_name("albedo").unwrap();
        assert_eq!(albedo.binding_type, RhiBindingType::SampledTexture);
        assert_eq!(albedo.used_in_shader_stages, RhiShaderStageFlags::FRAGMENT);
        let sampler = layout.find_resource_by_name("albedo_sampler").unwrap();
        assert_eq!(sampler.binding_type, RhiBindingType::Sampler);
    }

    #[test]
    fn missing_entry_point_produces_no_stage_module() {
        let compiler = compiler(RhiShaderTarget::SpirV);
        let preprocessed = compiler
            .preprocessor()
            .preprocess_str("triangle", TRIANGLE, None)
            .unwrap();

        let requested = [
            RhiShaderEntryPoint::new(RhiShaderStageFlags::VERTEX, "vs_main"),
            RhiShaderEntryPoint::new(RhiShaderStageFlags::FRAGMENT, "fs_missing"),
        ];
        let module_set = compiler.compile_stages(&preprocessed, &requested).unwrap();
        assert_eq!(module_set.stage_modules.len(), 1);
        assert!(module_set
            .stage_module(RhiShaderStageFlags::FRAGMENT)
            .is_none());
        assert_eq!(module_set.missing_entry_points, vec![requested[1].clone()]);
        assert!(module_set.link().is_err());
    }

    #[test]
    fn entry_point_must_match_stage() {
        let compiler = compiler(RhiShaderTarget::SpirV);
        let preprocessed = compiler
            .preprocessor()
            .preprocess_str("triangle", TRIANGLE, None)
            .unwrap();

        // vs_main exists, but not as a fragment entry point
        let requested = [RhiShaderEntryPoint::new(
            RhiShaderStageFlags::FRAGMENT,
            "vs_main",
        )];
        let module_set = compiler.compile_stages(&preprocessed, &requested).unwrap();
        assert!(module_set.stage_modules.is_empty());
    }

    #[test]
    fn no_pragmas_uses_every_entry_point() {
        let source = TRIANGLE
            .replace("#pragma vertex vs_main", "")
            .replace("#pragma fragment fs_main", "");
        let program = compiler(RhiShaderTarget::SpirV)
            .compile_str("triangle", &source)
            .unwrap();
        assert_eq!(program.stages().len(), 2);
    }

    #[test]
    fn syntax_error_surfaces_diagnostic() {
        let result = compiler(RhiShaderTarget::SpirV)
            .compile_str("broken", "@vertex fn vs_main( -> vec4<f32> {}");
        match result {
            Err(RhiError::ShaderCompile { name, diagnostic }) => {
                assert_eq!(name, "broken");
                assert!(!diagnostic.is_empty());
            }
            other => panic!("unexpected {:?}", other.map(|x| x.name().to_string())),
        }
    }

    #[test]
    fn compute_reflection_includes_workgroup_and_push_constants() {
        let source = r#"
struct Params {
    scale: f32,
    count: u32,
};
var<push_constant> params: Params;
@group(0) @binding(0) var<storage, read_write> values: array<f32>;
@group(0) @binding(1) var output: texture_storage_2d<rgba8unorm, write>;

@compute @workgroup_size(64, 1, 1)
fn cs_main(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x < params.count) {
        values[id.x] = values[id.x] * params.scale;
    }
    textureStore(output, vec2<i32>(0, 0), vec4<f32>(1.0));
}
"#;
        let program = compiler(RhiShaderTarget::SpirV)
            .compile_str("scale", source)
            .unwrap();
        assert!(program.is_compute());

        let stage = program.stage(RhiShaderStageFlags::COMPUTE).unwrap();
        assert_eq!(stage.reflection.thread_count, [64, 1, 1]);
        assert_eq!(stage.reflection.push_constant_size, 8);

        let layout = program.binding_layout();
        assert_eq!(layout.push_constant_size(), 8);
        assert_eq!(
            layout.sets[0].bindings[0].binding_type,
            RhiBindingType::StorageBuffer
        );
        assert_eq!(
            layout.sets[0].bindings[1].binding_type,
            RhiBindingType::StorageTexture
        );
    }

    #[test]
    fn emits_hlsl_for_d3d12() {
        assert_eq!(
            RhiShaderTarget::for_backend(RhiBackendType::D3d12),
            RhiShaderTarget::Hlsl
        );
        let program = compiler(RhiShaderTarget::Hlsl)
            .compile_str("triangle", TRIANGLE)
            .unwrap();
        match &program.stage(RhiShaderStageFlags::VERTEX).unwrap().bytecode {
            RhiShaderBytecode::Hlsl {
                source,
                entry_point,
                ..
            } => {
                assert!(source.contains(entry_point.as_str()));
            }
            other => panic!("expected HLSL, got {:?}", other),
        }
    }
}
