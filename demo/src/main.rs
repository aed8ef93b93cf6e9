use std::path::{Path, PathBuf};
use strata_rhi::*;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "demo", about = "Draws a tinted triangle on a headless renderer")]
pub struct DemoArgs {
    /// TOML file holding the RHI configuration
    #[structopt(long, parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Shader to draw the triangle with
    #[structopt(long, parse(from_os_str))]
    pub shader: Option<PathBuf>,

    /// Number of frames to present before exiting
    #[structopt(long, default_value = "300")]
    pub frames: u32,

    #[structopt(long, default_value = "900")]
    pub width: u32,

    #[structopt(long, default_value = "600")]
    pub height: u32,

    /// Resize the swapchain to half size after this many frames
    #[structopt(long)]
    pub resize_after: Option<u32>,
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    color: [f32; 4],
}

#[rustfmt::skip]
const VERTICES: [Vertex; 3] = [
    Vertex { position: [0.0, 0.5, 0.0], color: [1.0, 0.0, 0.0, 1.0] },
    Vertex { position: [0.5, -0.5, 0.0], color: [0.0, 1.0, 0.0, 1.0] },
    Vertex { position: [-0.5, -0.5, 0.0], color: [0.0, 0.0, 1.0, 1.0] },
];

// Index buffers are padded to four bytes
const INDICES: [u16; 4] = [0, 1, 2, 0];

pub fn logging_init() {
    #[cfg(not(debug_assertions))]
    let log_level = log::LevelFilter::Info;
    #[cfg(debug_assertions)]
    let log_level = log::LevelFilter::Debug;

    env_logger::Builder::from_default_env()
        .format_timestamp_nanos()
        .filter_module("strata_rhi::backends::null::executor", log::LevelFilter::Info)
        .filter_module("strata_rhi::descriptor_set", log::LevelFilter::Info)
        .filter_module("strata_rhi::shader_compiler", log::LevelFilter::Debug)
        .filter_module("strata_rhi", log::LevelFilter::Debug)
        .filter_level(log_level)
        .init();
}

fn main() {
    logging_init();

    let args = DemoArgs::from_args();
    if let Err(e) = run(&args) {
        log::error!("Demo failed: {} (severity {:?})", e, e.severity());
        std::process::exit(1);
    }
}

fn manifest_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

// Relative include directories are relative to the config file
fn load_api_def(config_path: &Path) -> RhiResult<RhiApiDef> {
    let mut api_def = RhiApiDef::load(config_path)?;
    if let Some(config_dir) = config_path.parent() {
        for include_dir in &mut api_def.shader_include_dirs {
            if include_dir.is_relative() {
                *include_dir = config_dir.join(&*include_dir);
            }
        }
    }
    Ok(api_def)
}

fn run(args: &DemoArgs) -> RhiResult<()> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| manifest_path("demo.toml"));
    let api_def = load_api_def(&config_path)?;
    log::info!("Using backend {:?}", api_def.backend);

    let renderer_def = RhiRendererDef {
        clear_color: RhiColorClearValue([0.1, 0.1, 0.12, 1.0]),
        ..RhiRendererDef::new(api_def, args.width, args.height)
    };
    // Headless, there is no window that could outlive the renderer
    let mut renderer = unsafe { RhiRenderer::new(&renderer_def)? };

    let result = draw_frames(&mut renderer, args);
    renderer.destroy()?;
    result
}

fn draw_frames(
    renderer: &mut RhiRenderer,
    args: &DemoArgs,
) -> RhiResult<()> {
    let device_context = renderer.device_context()?.clone();
    let color_format = renderer.swapchain()?.format();

    let shader_path = args
        .shader
        .clone()
        .unwrap_or_else(|| manifest_path("shaders/triangle.wgsl"));
    let program = device_context.shader_compiler().compile_file(&shader_path)?;
    let shader = device_context.create_shader(program)?;

    let vertex_layout = RhiVertexLayout::new()
        .with_attribute(RhiVertexSemantic::Position, RhiVertexElementType::Float3)
        .with_attribute(RhiVertexSemantic::Color, RhiVertexElementType::Float4);

    let pipeline = device_context.create_graphics_pipeline(&RhiGraphicsPipelineDef {
        shader: &shader,
        vertex_layout: &vertex_layout,
        blend_state: &RhiBlendState::default_alpha_enabled(),
        depth_state: &RhiDepthState::default(),
        rasterizer_state: &RhiRasterizerState::default(),
        primitive_topology: RhiPrimitiveTopology::TriangleList,
        color_formats: &[color_format],
        depth_stencil_format: None,
        sample_count: RhiSampleCount::SampleCount1,
    })?;

    let vertex_buffer = device_context.create_buffer(&RhiBufferDef::for_vertex_buffer(
        std::mem::size_of_val(&VERTICES) as u64,
        RhiBufferUpdateFrequency::PerFrame,
    ))?;
    vertex_buffer.copy_to_host_visible_buffer(&VERTICES)?;

    let index_buffer = device_context.create_buffer(&RhiBufferDef::for_index_buffer(
        std::mem::size_of_val(&INDICES) as u64,
        RhiBufferUpdateFrequency::PerFrame,
    ))?;
    index_buffer.copy_to_host_visible_buffer(&INDICES)?;

    let tint_buffer = device_context.create_buffer(&RhiBufferDef::for_uniform_buffer(
        16,
        RhiBufferUpdateFrequency::PerFrame,
    ))?;
    renderer.update_uniform_buffer(&tint_buffer, 0, &[1.0f32; 4])?;

    let descriptor_set = renderer.allocate_descriptor_set(&shader, 0)?;
    descriptor_set.set_buffer(0, &tint_buffer)?;

    let mut frames_presented = 0;
    let mut frames_skipped = 0;
    let start = std::time::Instant::now();
    while frames_presented < args.frames {
        profiling::scope!("frame");

        if Some(frames_presented) == args.resize_after {
            renderer.resize((args.width / 2).max(1), (args.height / 2).max(1))?;
        }

        if !renderer.begin_frame()? {
            frames_skipped += 1;
            continue;
        }

        let t = frames_presented as f32 / 60.0;
        let tint = [t.sin() * 0.5 + 0.5, t.cos() * 0.5 + 0.5, 1.0, 1.0];
        renderer.update_uniform_buffer(&tint_buffer, 0, &tint)?;

        renderer.bind_pipeline(&pipeline)?;
        renderer.bind_descriptor_set(&descriptor_set)?;
        renderer.bind_vertex_buffer(&vertex_buffer, 0)?;
        renderer.bind_index_buffer(&index_buffer, RhiIndexType::Uint16)?;
        renderer.draw_indexed(3, 0)?;
        renderer.end_frame()?;

        if renderer.present()? == RhiPresentSuccessResult::OutOfDate {
            log::warn!("Swapchain out of date after frame {}", frames_presented);
        }

        frames_presented += 1;
        profiling::finish_frame!();
    }

    device_context.wait_for_device_idle()?;
    let elapsed = start.elapsed();
    log::info!(
        "Presented {} frames ({} skipped) in {:.2?}, {:.1} fps",
        frames_presented,
        frames_skipped,
        elapsed,
        frames_presented as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    if let Some(null_device_context) = device_context.null_device_context() {
        let stats = null_device_context.stats();
        log::info!(
            "Headless device executed {} submissions, {} commands, {} draws",
            stats.submissions,
            stats.commands_executed,
            stats.draws
        );
    }
    log::debug!("Live objects at exit: {:?}", device_context.object_counts());

    Ok(())
}
