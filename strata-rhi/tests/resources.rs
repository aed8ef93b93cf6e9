mod common;

use common::*;
use strata_rhi::extra::upload::*;
use strata_rhi::*;

fn checkerboard(
    width: u32,
    height: u32,
) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let value = if (x / 16 + y / 16) % 2 == 0 { 255 } else { 0 };
            data.extend_from_slice(&[value, x as u8, y as u8, 255]);
        }
    }
    data
}

#[test]
fn texture_upload_reads_back_the_same_texels() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();

    let texture_def = RhiTextureDef::for_sampled_2d(256, 256, RhiFormat::R8G8B8A8_UNORM);
    let data = checkerboard(256, 256);
    let texture = create_texture_with_data(&device_context, &queue, &texture_def, &data).unwrap();
    assert_eq!(texture.width(), 256);
    assert_eq!(texture.height(), 256);

    let read_back = read_texture_data(
        &device_context,
        &queue,
        &texture,
        RhiResourceState::SHADER_RESOURCE,
        0,
        0,
    )
    .unwrap();
    assert_eq!(read_back.len(), data.len());

    let pixel = |x: usize, y: usize| {
        let offset = (y * 256 + x) * 4;
        read_back[offset..offset + 4].to_vec()
    };
    assert_eq!(pixel(0, 0), vec![255, 0, 0, 255]);
    assert_eq!(pixel(17, 3), vec![0, 17, 3, 255]);
    assert_eq!(pixel(200, 100), vec![0, 200, 100, 255]);
    assert_eq!(read_back, data);

    // A short upload fails and leaves no texture behind
    let textures_before = device_context.object_counts().textures;
    assert!(
        create_texture_with_data(&device_context, &queue, &texture_def, &data[..1024]).is_err()
    );
    assert_eq!(device_context.object_counts().textures, textures_before);
}

#[test]
fn staged_upload_fills_a_device_local_buffer() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();

    let vertex_buffer = device_context
        .create_buffer(&RhiBufferDef::for_vertex_buffer(
            std::mem::size_of_val(&TRIANGLE) as u64,
            RhiBufferUpdateFrequency::Static,
        ))
        .unwrap();
    // Device-local memory cannot be written from the CPU
    assert!(vertex_buffer.copy_to_host_visible_buffer(&TRIANGLE).is_err());

    let mut upload = RhiUpload::new(&device_context, &queue, 1024, None).unwrap();
    upload_buffer_data(&mut upload, &vertex_buffer, 0, &TRIANGLE).unwrap();
    upload.block_until_upload_complete().unwrap();

    let readback = device_context
        .create_buffer(&RhiBufferDef::for_readback_buffer(
            std::mem::size_of_val(&TRIANGLE) as u64,
        ))
        .unwrap();
    let mut command_pool = queue
        .create_command_pool(&RhiCommandPoolDef { transient: true })
        .unwrap();
    let command_buffer = command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    command_buffer.begin().unwrap();
    command_buffer
        .cmd_copy_buffer_to_buffer(
            &vertex_buffer,
            &readback,
            0,
            0,
            std::mem::size_of_val(&TRIANGLE) as u64,
        )
        .unwrap();
    command_buffer.end().unwrap();
    let fence = device_context.create_fence().unwrap();
    queue
        .submit(&[&command_buffer], &[], &[], Some(&fence))
        .unwrap();
    fence.wait().unwrap();

    let bytes = readback
        .read_host_visible_buffer(0, std::mem::size_of_val(&TRIANGLE) as u64)
        .unwrap();
    assert_eq!(&bytes[..], bytemuck::cast_slice::<Vertex, u8>(&TRIANGLE));
}

#[test]
fn descriptor_pool_capacity_is_fixed() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let shader = create_shader(&device_context, "tinted", TINTED);

    let mut descriptor_pool = device_context
        .create_descriptor_pool(&RhiDescriptorPoolDef {
            max_sets: 4,
            uniform_buffers: 2,
            ..Default::default()
        })
        .unwrap();

    let first = descriptor_pool.allocate_descriptor_set(&shader, 0).unwrap();
    let second = descriptor_pool.allocate_descriptor_set(&shader, 0).unwrap();
    assert_eq!(
        descriptor_pool.available_descriptors(RhiBindingType::UniformBuffer),
        0
    );
    assert_eq!(descriptor_pool.available_sets(), 2);

    match descriptor_pool.allocate_descriptor_set(&shader, 0) {
        Err(RhiError::DescriptorPoolExhausted {
            requested,
            available,
            ..
        }) => {
            assert_eq!(requested, 1);
            assert_eq!(available, 0);
        }
        other => panic!("expected the pool to be exhausted, got {:?}", other),
    }

    // A set that does not exist in the shader is an error of its own
    assert!(descriptor_pool.allocate_descriptor_set(&shader, 3).is_err());

    // Capacity comes back once every clone of a set is gone
    let first_clone = first.clone();
    drop(first);
    assert!(descriptor_pool.allocate_descriptor_set(&shader, 0).is_err());
    drop(first_clone);
    let third = descriptor_pool.allocate_descriptor_set(&shader, 0).unwrap();
    assert_eq!(third.set_index(), 0);
    drop(second);
}

#[test]
fn renderer_pool_reports_exhaustion_from_config() {
    init_logging();
    let mut api_def = RhiApiDef::default();
    api_def.descriptor_pool.max_sets = 1;
    let renderer_def = RhiRendererDef::new(api_def, 32, 32);
    let mut renderer = unsafe { RhiRenderer::new(&renderer_def) }.unwrap();
    let shader = create_shader(renderer.device_context().unwrap(), "tinted", TINTED);

    let _set = renderer.allocate_descriptor_set(&shader, 0).unwrap();
    let error = renderer.allocate_descriptor_set(&shader, 0).unwrap_err();
    assert!(matches!(error, RhiError::DescriptorPoolExhausted { .. }));
    assert_eq!(error.severity(), RhiErrorSeverity::Resource);
}

#[test]
fn samplers_are_cached_by_definition() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();

    let nearest = RhiSamplerDef {
        min_filter: RhiFilterType::Nearest,
        mag_filter: RhiFilterType::Nearest,
        ..Default::default()
    };
    let _a = device_context.get_or_create_sampler(&nearest).unwrap();
    let _b = device_context.get_or_create_sampler(&nearest).unwrap();
    assert_eq!(device_context.object_counts().samplers, 1);

    let _c = device_context
        .get_or_create_sampler(&RhiSamplerDef::default())
        .unwrap();
    assert_eq!(device_context.object_counts().samplers, 2);
}

#[test]
fn blit_scales_a_render_target_into_another_texture() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();

    let src = device_context
        .create_texture(&RhiTextureDef::for_render_target(
            RhiExtents2D::new(8, 8),
            RhiFormat::R8G8B8A8_UNORM,
        ))
        .unwrap();
    let dst = device_context
        .create_texture(&RhiTextureDef::for_render_target(
            RhiExtents2D::new(4, 4),
            RhiFormat::R8G8B8A8_UNORM,
        ))
        .unwrap();

    let mut command_pool = queue
        .create_command_pool(&RhiCommandPoolDef { transient: true })
        .unwrap();
    let command_buffer = command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    command_buffer.begin().unwrap();
    command_buffer
        .cmd_begin_render_pass(
            &[RhiColorRenderTargetBinding {
                texture: &src,
                load_op: RhiLoadOp::Clear,
                store_op: RhiStoreOp::Store,
                clear_value: RhiColorClearValue([1.0, 0.0, 0.0, 1.0]),
            }],
            None,
        )
        .unwrap();
    command_buffer.cmd_end_render_pass().unwrap();
    command_buffer
        .cmd_blit(
            &src,
            &dst,
            &RhiCmdBlitParams {
                src_state: RhiResourceState::RENDER_TARGET,
                dst_state: RhiResourceState::UNDEFINED,
                src_extents: [RhiExtents3D::default(), RhiExtents2D::new(8, 8).to_3d()],
                dst_extents: [RhiExtents3D::default(), RhiExtents2D::new(4, 4).to_3d()],
                src_mip_level: 0,
                dst_mip_level: 0,
                filter: RhiFilterType::Linear,
            },
        )
        .unwrap();
    command_buffer.end().unwrap();

    let fence = device_context.create_fence().unwrap();
    queue
        .submit(&[&command_buffer], &[], &[], Some(&fence))
        .unwrap();
    fence.wait().unwrap();

    let texels = read_texture_data(
        &device_context,
        &queue,
        &dst,
        RhiResourceState::COPY_DST,
        0,
        0,
    )
    .unwrap();
    assert_eq!(texels.len(), 4 * 4 * 4);
    for texel in texels.chunks(4) {
        assert_eq!(texel, &[255, 0, 0, 255]);
    }
}
