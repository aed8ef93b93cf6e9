mod common;

use common::*;
use strata_rhi::*;

fn swapchain_def(
    width: u32,
    height: u32,
) -> RhiSwapchainDef {
    RhiSwapchainDef {
        width,
        height,
        enable_vsync: true,
        image_count: 3,
    }
}

#[test]
fn acquire_and_present_cycle_through_the_images() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();
    let mut swapchain = device_context
        .create_swapchain(None, &swapchain_def(200, 100))
        .unwrap();
    assert_eq!(swapchain.image_count(), 3);
    assert_eq!(swapchain.extents(), RhiExtents2D::new(200, 100));

    let semaphore = device_context.create_semaphore().unwrap();
    let mut indices = Vec::default();
    for _ in 0..6 {
        let image = swapchain.acquire_next_image_semaphore(&semaphore).unwrap();
        assert_eq!(image.texture.width(), 200);
        assert_eq!(image.texture.height(), 100);
        indices.push(image.swapchain_image_index);
        let result = queue
            .present(&swapchain, &[&semaphore], image.swapchain_image_index)
            .unwrap();
        assert_eq!(result, RhiPresentSuccessResult::Success);
    }
    assert_eq!(indices, vec![0, 1, 2, 0, 1, 2]);
}

#[test]
fn every_image_acquired_blocks_further_acquires() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let mut swapchain = device_context
        .create_swapchain(None, &swapchain_def(64, 64))
        .unwrap();

    let fence = device_context.create_fence().unwrap();
    for _ in 0..swapchain.image_count() {
        swapchain.acquire_next_image_fence(&fence).unwrap();
        fence.wait().unwrap();
    }
    assert!(swapchain.acquire_next_image_fence(&fence).is_err());
}

#[test]
fn invalidated_swapchain_must_be_rebuilt() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let mut swapchain = device_context
        .create_swapchain(None, &swapchain_def(64, 64))
        .unwrap();
    let semaphore = device_context.create_semaphore().unwrap();

    swapchain.invalidate();
    assert!(swapchain.is_out_of_date());
    assert!(matches!(
        swapchain.acquire_next_image_semaphore(&semaphore),
        Err(RhiError::SwapchainOutOfDate)
    ));

    // Same size, but out of date, so the images are replaced
    swapchain.rebuild(&swapchain_def(64, 64)).unwrap();
    assert!(!swapchain.is_out_of_date());
    swapchain.acquire_next_image_semaphore(&semaphore).unwrap();
}

#[test]
fn rebuild_to_the_current_size_keeps_the_images() {
    init_logging();
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let device_context = api.device_context();
    let mut swapchain = device_context
        .create_swapchain(None, &swapchain_def(64, 64))
        .unwrap();
    let textures = device_context.object_counts().textures;

    swapchain.rebuild(&swapchain_def(64, 64)).unwrap();
    assert_eq!(device_context.object_counts().textures, textures);

    swapchain.rebuild(&swapchain_def(96, 48)).unwrap();
    assert_eq!(swapchain.extents(), RhiExtents2D::new(96, 48));
    assert_eq!(device_context.object_counts().textures, textures);

    // A zero-sized swapchain cannot exist, the old one stays usable
    assert!(swapchain.rebuild(&swapchain_def(0, 48)).is_err());
    assert_eq!(swapchain.extents(), RhiExtents2D::new(96, 48));
}

#[test]
fn renderer_resize_rebuilds_before_the_next_frame() {
    let mut renderer = create_renderer(320, 240);
    let frame_count = renderer.frame_count();

    renderer.resize(320, 240).unwrap();
    assert!(renderer.begin_frame().unwrap());
    renderer.end_frame().unwrap();
    renderer.present().unwrap();

    renderer.resize(640, 360).unwrap();
    assert!(!renderer.begin_frame().unwrap());
    assert!(!renderer.is_recording());
    assert_eq!(
        renderer.swapchain().unwrap().extents(),
        RhiExtents2D::new(640, 360)
    );

    assert!(renderer.begin_frame().unwrap());
    let image = renderer.current_frame().unwrap().swapchain_image().unwrap();
    assert_eq!(image.texture.width(), 640);
    assert_eq!(image.texture.height(), 360);
    renderer.end_frame().unwrap();
    renderer.present().unwrap();

    assert_eq!(renderer.frame_count(), frame_count);
    renderer.destroy().unwrap();
}
