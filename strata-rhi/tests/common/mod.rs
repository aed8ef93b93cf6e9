#![allow(dead_code)]

use strata_rhi::*;

pub const PASS_THROUGH: &str = r#"
#pragma vertex vs_main
#pragma fragment fs_main

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return input.color;
}
"#;

pub const TINTED: &str = r#"
#pragma vertex vs_main
#pragma fragment fs_main

struct Tint {
    color: vec4<f32>,
};

@group(0) @binding(0) var<uniform> tint: Tint;

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec4<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return tint.color;
}
"#;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: [1.0, 0.0, 0.0, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0, 1.0],
    },
];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn create_renderer(
    width: u32,
    height: u32,
) -> RhiRenderer {
    init_logging();
    let renderer_def = RhiRendererDef::new(RhiApiDef::default(), width, height);
    unsafe { RhiRenderer::new(&renderer_def) }.unwrap()
}

pub fn vertex_layout() -> RhiVertexLayout {
    RhiVertexLayout::new()
        .with_attribute(RhiVertexSemantic::Position, RhiVertexElementType::Float3)
        .with_attribute(RhiVertexSemantic::Color, RhiVertexElementType::Float4)
}

pub fn create_shader(
    device_context: &RhiDeviceContext,
    name: &str,
    source: &str,
) -> RhiShader {
    let program = device_context
        .shader_compiler()
        .compile_str(name, source)
        .unwrap();
    device_context.create_shader(program).unwrap()
}

pub fn create_pipeline(
    device_context: &RhiDeviceContext,
    shader: &RhiShader,
    color_format: RhiFormat,
    blend_state: &RhiBlendState,
) -> RhiPipeline {
    device_context
        .create_graphics_pipeline(&RhiGraphicsPipelineDef {
            shader,
            vertex_layout: &vertex_layout(),
            blend_state,
            depth_state: &RhiDepthState::default(),
            rasterizer_state: &RhiRasterizerState::default(),
            primitive_topology: RhiPrimitiveTopology::TriangleList,
            color_formats: &[color_format],
            depth_stencil_format: None,
            sample_count: RhiSampleCount::SampleCount1,
        })
        .unwrap()
}

pub fn create_triangle_buffers(device_context: &RhiDeviceContext) -> (RhiBuffer, RhiBuffer) {
    let vertex_buffer = device_context
        .create_buffer(&RhiBufferDef::for_vertex_buffer(
            std::mem::size_of_val(&TRIANGLE) as u64,
            RhiBufferUpdateFrequency::PerFrame,
        ))
        .unwrap();
    vertex_buffer.copy_to_host_visible_buffer(&TRIANGLE).unwrap();

    let index_buffer = device_context
        .create_buffer(&RhiBufferDef::for_index_buffer(
            8,
            RhiBufferUpdateFrequency::PerFrame,
        ))
        .unwrap();
    index_buffer
        .copy_to_host_visible_buffer(&[0u16, 1, 2, 0])
        .unwrap();

    (vertex_buffer, index_buffer)
}
