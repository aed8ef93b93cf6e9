mod common;

use common::init_logging;
use std::path::Path;
use strata_rhi::*;

const COMMON_WGSL: &str = r#"
struct ViewUniforms {
    view_proj: mat4x4<f32>,
    tint: vec4<f32>,
};
"#;

const MESH_WGSL: &str = r#"
#include "common.wgsl"
#pragma vertex vs_main
#pragma fragment fs_main

@group(0) @binding(0) var<uniform> view: ViewUniforms;
@group(1) @binding(0) var albedo: texture_2d<f32>;
@group(1) @binding(1) var albedo_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) normal: vec3<f32>,
    @location(3) color: vec4<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.position = view.view_proj * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(albedo, albedo_sampler, input.uv) * view.tint;
}
"#;

fn write_shaders(dir: &Path) {
    std::fs::create_dir_all(dir.join("include")).unwrap();
    std::fs::write(dir.join("include").join("common.wgsl"), COMMON_WGSL).unwrap();
    std::fs::write(dir.join("mesh.wgsl"), MESH_WGSL).unwrap();
}

fn api_def_with_includes(dir: &Path) -> RhiApiDef {
    RhiApiDef {
        shader_include_dirs: vec![dir.join("include")],
        ..Default::default()
    }
}

#[test]
fn compiles_files_with_includes_and_reflects_bindings() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_shaders(dir.path());

    let api_def = api_def_with_includes(dir.path());
    let compiler = RhiShaderCompiler::from_api_def(&api_def);
    let program = compiler.compile_file(&dir.path().join("mesh.wgsl")).unwrap();

    assert_eq!(
        program.shader_stages(),
        RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT
    );
    assert_eq!(program.source_files().len(), 2);

    let layout = program.binding_layout();
    assert_eq!(layout.sets.len(), 2);
    let view = layout.find_resource_by_name("view").unwrap();
    assert_eq!(view.binding_type, RhiBindingType::UniformBuffer);
    assert_eq!(view.size_in_bytes, 80);
    assert_eq!(
        view.used_in_shader_stages,
        RhiShaderStageFlags::VERTEX | RhiShaderStageFlags::FRAGMENT
    );
    assert_eq!(layout.sets[1].bindings.len(), 2);
    assert_eq!(
        layout.sets[1].binding(1).unwrap().binding_type,
        RhiBindingType::Sampler
    );
}

#[test]
fn vertex_layout_matches_the_shader_inputs() {
    let layout = RhiVertexLayout::new()
        .with_attribute(RhiVertexSemantic::Position, RhiVertexElementType::Float3)
        .with_attribute(RhiVertexSemantic::TexCoord, RhiVertexElementType::Float2)
        .with_attribute(RhiVertexSemantic::Normal, RhiVertexElementType::Float3)
        .with_attribute(RhiVertexSemantic::Color, RhiVertexElementType::Float4);

    let vertex_input = layout.vertex_input();
    let offsets: Vec<u32> = vertex_input
        .attributes
        .iter()
        .map(|x| x.byte_offset)
        .collect();
    assert_eq!(offsets, vec![0, 12, 20, 32]);
    assert_eq!(vertex_input.bindings[0].stride, 48);

    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_shaders(dir.path());
    let api_def = api_def_with_includes(dir.path());
    let api = RhiApi::new_null(&api_def).unwrap();
    let device_context = api.device_context();

    let program = device_context
        .shader_compiler()
        .compile_file(&dir.path().join("mesh.wgsl"))
        .unwrap();
    let shader = device_context.create_shader(program).unwrap();
    let pipeline = device_context
        .create_graphics_pipeline(&RhiGraphicsPipelineDef {
            shader: &shader,
            vertex_layout: &layout,
            blend_state: &RhiBlendState::default_alpha_disabled(),
            depth_state: &RhiDepthState::depth_test_and_write(),
            rasterizer_state: &RhiRasterizerState::default(),
            primitive_topology: RhiPrimitiveTopology::TriangleList,
            color_formats: &[RhiFormat::B8G8R8A8_UNORM],
            depth_stencil_format: Some(RhiFormat::D32_SFLOAT),
            sample_count: RhiSampleCount::SampleCount1,
        })
        .unwrap();
    assert_eq!(
        pipeline.graphics_state().unwrap().vertex_input,
        vertex_input
    );
}

#[test]
fn missing_entry_point_leaves_nothing_to_link() {
    init_logging();
    let compiler = RhiShaderCompiler::from_api_def(&RhiApiDef::default());
    let preprocessed = compiler
        .preprocessor()
        .preprocess_str(
            "only_compute",
            "@compute @workgroup_size(1) fn cs_main() {}",
            None,
        )
        .unwrap();

    let module_set = compiler
        .compile_stages(
            &preprocessed,
            &[RhiShaderEntryPoint::new(
                RhiShaderStageFlags::VERTEX,
                "vs_main",
            )],
        )
        .unwrap();
    assert!(module_set.stage_modules.is_empty());
    assert_eq!(module_set.missing_entry_points.len(), 1);

    let empty = RhiShaderModuleSet {
        missing_entry_points: Vec::default(),
        ..module_set
    };
    assert!(matches!(empty.link(), Err(RhiError::ShaderLink { .. })));
}

#[test]
fn reload_swaps_the_shader_only_on_success() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_shaders(dir.path());
    let api_def = api_def_with_includes(dir.path());
    let api = RhiApi::new_null(&api_def).unwrap();
    let device_context = api.device_context();
    let compiler = device_context.shader_compiler();
    let path = dir.path().join("mesh.wgsl");

    let mut shader = device_context
        .create_shader(compiler.compile_file(&path).unwrap())
        .unwrap();

    // Drop the texture binding and reload
    let edited = MESH_WGSL
        .replace(
            "@group(1) @binding(0) var albedo: texture_2d<f32>;\n@group(1) @binding(1) var albedo_sampler: sampler;\n",
            "",
        )
        .replace(
            "textureSample(albedo, albedo_sampler, input.uv) * view.tint",
            "view.tint",
        );
    std::fs::write(&path, edited).unwrap();
    compiler.reload(&device_context, &path, &mut shader).unwrap();
    assert_eq!(shader.binding_layout().sets.len(), 1);

    // A broken edit keeps the last good shader
    std::fs::write(&path, "@vertex fn vs_main( -> {").unwrap();
    assert!(compiler.reload(&device_context, &path, &mut shader).is_err());
    assert_eq!(shader.binding_layout().sets.len(), 1);
}

#[test]
fn programs_must_target_the_device() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();

    let hlsl_compiler = RhiShaderCompiler::new(Default::default(), RhiShaderTarget::Hlsl);
    let program = hlsl_compiler
        .compile_str("pass_through", common::PASS_THROUGH)
        .unwrap();
    assert!(matches!(
        device_context.create_shader(program),
        Err(RhiError::ShaderLink { .. })
    ));
}
