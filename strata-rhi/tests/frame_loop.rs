mod common;

use common::*;
use strata_rhi::*;

fn null_device(renderer: &RhiRenderer) -> &backends::null::RhiDeviceContextNull {
    renderer
        .device_context()
        .unwrap()
        .null_device_context()
        .unwrap()
}

#[test]
fn indexed_triangle_for_a_hundred_frames() {
    let mut renderer = create_renderer(320, 240);
    let device_context = renderer.device_context().unwrap().clone();
    let object_count_tracker = device_context.object_count_tracker();
    let color_format = renderer.swapchain().unwrap().format();

    let shader = create_shader(&device_context, "pass_through", PASS_THROUGH);
    let pipeline = create_pipeline(
        &device_context,
        &shader,
        color_format,
        &RhiBlendState::default_alpha_disabled(),
    );
    let (vertex_buffer, index_buffer) = create_triangle_buffers(&device_context);

    let mut baseline = None;
    for frame in 0..100 {
        assert!(renderer.begin_frame().unwrap());
        renderer.bind_pipeline(&pipeline).unwrap();
        renderer.bind_vertex_buffer(&vertex_buffer, 0).unwrap();
        renderer
            .bind_index_buffer(&index_buffer, RhiIndexType::Uint16)
            .unwrap();
        renderer.draw_indexed(3, 0).unwrap();
        renderer.end_frame().unwrap();
        let result = renderer.present().unwrap();
        assert_ne!(result, RhiPresentSuccessResult::OutOfDate);

        // Once every frame slot has been used the number of live objects must stay flat
        if frame == renderer.frame_count() {
            baseline = Some(device_context.object_counts());
        }
    }

    device_context.wait_for_device_idle().unwrap();
    let counts = device_context.object_counts();
    let baseline = baseline.unwrap();
    assert_eq!(counts.fences, baseline.fences);
    assert_eq!(counts.semaphores, baseline.semaphores);
    assert_eq!(counts.command_buffers, baseline.command_buffers);

    let stats = null_device(&renderer).stats();
    assert_eq!(stats.draws, 100);
    assert_eq!(stats.presents, 100);
    assert!(!null_device(&renderer).is_device_lost());

    let draw = stats.last_draw.unwrap();
    assert!(draw.indexed);
    assert_eq!(draw.element_count, 3);
    assert_eq!(draw.render_target_extents, RhiExtents2D::new(320, 240));

    drop(device_context);
    drop(pipeline);
    drop(shader);
    drop(vertex_buffer);
    drop(index_buffer);
    renderer.destroy().unwrap();

    // Every per-frame fence and semaphore went away with the renderer
    let counts = object_count_tracker.counts();
    assert_eq!(counts.fences, 0);
    assert_eq!(counts.semaphores, 0);
    assert_eq!(counts.total(), 0);
}

#[test]
fn pipeline_without_blending_draws_without_blending() {
    let mut renderer = create_renderer(64, 64);
    let device_context = renderer.device_context().unwrap().clone();
    let color_format = renderer.swapchain().unwrap().format();

    let shader = create_shader(&device_context, "pass_through", PASS_THROUGH);
    let opaque = create_pipeline(
        &device_context,
        &shader,
        color_format,
        &RhiBlendState::default_alpha_disabled(),
    );
    let blended = create_pipeline(
        &device_context,
        &shader,
        color_format,
        &RhiBlendState::default_alpha_enabled(),
    );
    let (vertex_buffer, _) = create_triangle_buffers(&device_context);

    assert!(renderer.begin_frame().unwrap());
    renderer.bind_vertex_buffer(&vertex_buffer, 0).unwrap();
    renderer.bind_pipeline(&blended).unwrap();
    renderer.draw(3, 0).unwrap();
    renderer.bind_pipeline(&opaque).unwrap();
    renderer.draw(3, 0).unwrap();
    renderer.end_frame().unwrap();
    renderer.present().unwrap();
    device_context.wait_for_device_idle().unwrap();

    let draw = null_device(&renderer).last_draw().unwrap();
    assert!(!draw.blend_enable);
    assert_eq!(null_device(&renderer).stats().draws, 2);
}

#[test]
fn dynamic_state_lasts_until_the_next_bind() {
    let mut renderer = create_renderer(64, 64);
    let device_context = renderer.device_context().unwrap().clone();
    let color_format = renderer.swapchain().unwrap().format();

    let shader = create_shader(&device_context, "pass_through", PASS_THROUGH);
    let pipeline = create_pipeline(
        &device_context,
        &shader,
        color_format,
        &RhiBlendState::default_alpha_disabled(),
    );
    let (vertex_buffer, _) = create_triangle_buffers(&device_context);

    assert!(renderer.begin_frame().unwrap());
    renderer.bind_vertex_buffer(&vertex_buffer, 0).unwrap();
    renderer.bind_pipeline(&pipeline).unwrap();
    renderer.set_cull_mode(RhiCullMode::Front).unwrap();
    renderer.set_depth_compare_op(RhiCompareOp::Always).unwrap();
    renderer.set_blending(true).unwrap();
    renderer
        .set_blend_function(
            RhiBlendFactor::One,
            RhiBlendFactor::One,
            RhiBlendOp::Add,
        )
        .unwrap();
    renderer.draw(3, 0).unwrap();
    renderer.end_frame().unwrap();
    renderer.present().unwrap();
    device_context.wait_for_device_idle().unwrap();

    let draw = null_device(&renderer).last_draw().unwrap();
    assert_eq!(draw.cull_mode, RhiCullMode::Front);
    assert_eq!(draw.depth_compare_op, RhiCompareOp::Always);
    assert!(draw.blend_enable);
    assert_eq!(
        draw.blend_equation,
        RhiBlendEquation::uniform(RhiBlendFactor::One, RhiBlendFactor::One, RhiBlendOp::Add)
    );

    // Rebinding restores the pipeline's baked state
    assert!(renderer.begin_frame().unwrap());
    renderer.bind_vertex_buffer(&vertex_buffer, 0).unwrap();
    renderer.bind_pipeline(&pipeline).unwrap();
    renderer.draw(3, 0).unwrap();
    renderer.end_frame().unwrap();
    renderer.present().unwrap();
    device_context.wait_for_device_idle().unwrap();

    let draw = null_device(&renderer).last_draw().unwrap();
    let graphics_state = pipeline.graphics_state().unwrap();
    assert_eq!(draw.cull_mode, graphics_state.rasterizer_state.cull_mode);
    assert!(!draw.blend_enable);
}

#[test]
fn descriptor_sets_feed_uniforms_to_draws() {
    let mut renderer = create_renderer(64, 64);
    let device_context = renderer.device_context().unwrap().clone();
    let color_format = renderer.swapchain().unwrap().format();

    let shader = create_shader(&device_context, "tinted", TINTED);
    let pipeline = create_pipeline(
        &device_context,
        &shader,
        color_format,
        &RhiBlendState::default_alpha_disabled(),
    );
    let (vertex_buffer, _) = create_triangle_buffers(&device_context);
    let tint_buffer = device_context
        .create_buffer(&RhiBufferDef::for_uniform_buffer(
            16,
            RhiBufferUpdateFrequency::PerFrame,
        ))
        .unwrap();
    renderer
        .update_uniform_buffer(&tint_buffer, 0, &[1.0f32, 0.5, 0.25, 1.0])
        .unwrap();

    let descriptor_set = renderer.allocate_descriptor_set(&shader, 0).unwrap();
    assert_eq!(descriptor_set.unwritten_bindings(), vec![0]);
    // Writing a texture into a uniform buffer binding is rejected
    let texture = device_context
        .create_texture(&RhiTextureDef::for_sampled_2d(4, 4, RhiFormat::R8G8B8A8_UNORM))
        .unwrap();
    assert!(descriptor_set.set_texture(0, &texture).is_err());
    descriptor_set.set_buffer(0, &tint_buffer).unwrap();
    assert!(descriptor_set.unwritten_bindings().is_empty());

    assert!(renderer.begin_frame().unwrap());
    renderer.bind_vertex_buffer(&vertex_buffer, 0).unwrap();
    renderer.bind_pipeline(&pipeline).unwrap();
    renderer.bind_descriptor_set(&descriptor_set).unwrap();
    renderer.draw(3, 0).unwrap();
    renderer.end_frame().unwrap();
    renderer.present().unwrap();
    device_context.wait_for_device_idle().unwrap();
    assert_eq!(null_device(&renderer).stats().draws, 1);
}
