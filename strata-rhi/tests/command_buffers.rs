mod common;

use common::init_logging;
use strata_rhi::*;

struct Harness {
    device_context: RhiDeviceContext,
    queue: RhiQueue,
    command_pool: RhiCommandPool,
}

fn harness(api: &RhiApi) -> Harness {
    init_logging();
    let device_context = api.device_context();
    let queue = device_context.create_queue(RhiQueueType::Graphics).unwrap();
    let command_pool = queue
        .create_command_pool(&RhiCommandPoolDef { transient: false })
        .unwrap();
    Harness {
        device_context,
        queue,
        command_pool,
    }
}

fn uniform_buffer(device_context: &RhiDeviceContext) -> RhiBuffer {
    device_context
        .create_buffer(&RhiBufferDef::for_uniform_buffer(
            64,
            RhiBufferUpdateFrequency::PerFrame,
        ))
        .unwrap()
}

#[test]
fn state_machine_rejects_out_of_order_calls() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let buffer = uniform_buffer(&harness.device_context);
    let command_buffer = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();

    assert_eq!(command_buffer.state(), RhiCommandBufferState::Closed);
    assert!(command_buffer.end().is_err());
    assert!(command_buffer
        .cmd_update_buffer(&buffer, 0, &[0; 4])
        .is_err());

    command_buffer.begin().unwrap();
    assert_eq!(command_buffer.state(), RhiCommandBufferState::Opened);
    assert!(matches!(
        command_buffer.begin(),
        Err(RhiError::InvalidCommandBufferState { .. })
    ));

    command_buffer.cmd_update_buffer(&buffer, 0, &[7; 4]).unwrap();
    command_buffer.end().unwrap();
    assert_eq!(command_buffer.state(), RhiCommandBufferState::Pending);
    assert!(command_buffer
        .cmd_update_buffer(&buffer, 0, &[0; 4])
        .is_err());

    let fence = harness.device_context.create_fence().unwrap();
    harness
        .queue
        .submit(&[&command_buffer], &[], &[], Some(&fence))
        .unwrap();
    assert_eq!(command_buffer.state(), RhiCommandBufferState::Closed);

    // Still executing until the fence has been waited on
    assert!(command_buffer.begin().is_err());
    assert!(command_buffer.reset().is_err());
    fence.wait().unwrap();
    assert_eq!(buffer.read_host_visible_buffer(0, 4).unwrap(), vec![7; 4]);

    command_buffer.begin().unwrap();
    command_buffer.reset().unwrap();
    assert_eq!(command_buffer.state(), RhiCommandBufferState::Closed);
}

#[test]
fn one_time_submit_buffers_cannot_be_resubmitted() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let buffer = uniform_buffer(&harness.device_context);
    let fence = harness.device_context.create_fence().unwrap();

    let reusable = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    reusable.begin().unwrap();
    reusable.cmd_update_buffer(&buffer, 0, &[1; 4]).unwrap();
    reusable.end().unwrap();
    for _ in 0..3 {
        harness
            .queue
            .submit(&[&reusable], &[], &[], Some(&fence))
            .unwrap();
        fence.wait().unwrap();
    }

    let one_time = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    one_time
        .begin_with_flags(RhiCommandBufferBeginFlags::ONE_TIME_SUBMIT)
        .unwrap();
    one_time.cmd_update_buffer(&buffer, 0, &[2; 4]).unwrap();
    one_time.end().unwrap();
    harness
        .queue
        .submit(&[&one_time], &[], &[], Some(&fence))
        .unwrap();
    fence.wait().unwrap();
    assert!(harness
        .queue
        .submit(&[&one_time], &[], &[], Some(&fence))
        .is_err());
    assert_eq!(buffer.read_host_visible_buffer(0, 4).unwrap(), vec![2; 4]);
}

#[test]
fn open_render_pass_is_reported_at_submit() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let render_target = harness
        .device_context
        .create_texture(&RhiTextureDef::for_render_target(
            RhiExtents2D::new(16, 16),
            RhiFormat::R8G8B8A8_UNORM,
        ))
        .unwrap();

    let command_buffer = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    command_buffer.begin().unwrap();
    command_buffer
        .cmd_begin_render_pass(
            &[RhiColorRenderTargetBinding {
                texture: &render_target,
                load_op: RhiLoadOp::Clear,
                store_op: RhiStoreOp::Store,
                clear_value: RhiColorClearValue([0.0, 0.0, 0.0, 1.0]),
            }],
            None,
        )
        .unwrap();
    command_buffer.end().unwrap();

    assert!(matches!(
        harness.queue.submit(&[&command_buffer], &[], &[], None),
        Err(RhiError::OpenRenderPassAtSubmit)
    ));
    // Nothing was taken, the buffer is still waiting to be submitted
    assert_eq!(command_buffer.state(), RhiCommandBufferState::Pending);
}

#[test]
fn secondary_buffers_execute_inside_a_primary() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let buffer = uniform_buffer(&harness.device_context);

    let secondary = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef { is_secondary: true })
        .unwrap();
    let primary = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();

    secondary
        .begin_secondary(
            RhiCommandBufferBeginFlags::NONE,
            RhiCommandBufferInheritance::default(),
        )
        .unwrap();
    secondary
        .cmd_update_buffer(&buffer, 16, &[9; 16])
        .unwrap();
    secondary.end().unwrap();

    // Secondaries are never submitted directly
    assert!(harness.queue.submit(&[&secondary], &[], &[], None).is_err());

    primary.begin().unwrap();
    primary.cmd_update_buffer(&buffer, 0, &[3; 16]).unwrap();
    primary.cmd_execute_command_buffers(&[&secondary]).unwrap();
    primary.end().unwrap();
    assert_eq!(secondary.state(), RhiCommandBufferState::Closed);

    let fence = harness.device_context.create_fence().unwrap();
    harness
        .queue
        .submit(&[&primary], &[], &[], Some(&fence))
        .unwrap();
    fence.wait().unwrap();

    let contents = buffer.read_host_visible_buffer(0, 32).unwrap();
    assert_eq!(&contents[..16], &[3; 16]);
    assert_eq!(&contents[16..], &[9; 16]);
}

#[test]
fn fence_status_follows_submission() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let fence = harness.device_context.create_fence().unwrap();
    assert_eq!(fence.get_fence_status().unwrap(), RhiFenceStatus::Unsubmitted);

    let command_buffer = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    command_buffer.begin().unwrap();
    command_buffer.end().unwrap();
    harness
        .queue
        .submit(&[&command_buffer], &[], &[], Some(&fence))
        .unwrap();
    assert_eq!(fence.get_fence_status().unwrap(), RhiFenceStatus::Incomplete);

    harness.queue.wait_for_queue_idle().unwrap();
    assert_eq!(fence.get_fence_status().unwrap(), RhiFenceStatus::Complete);
    assert_eq!(fence.get_fence_status().unwrap(), RhiFenceStatus::Unsubmitted);
}

#[test]
fn freeing_returns_the_buffer_to_its_pool() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let mut other_pool = harness
        .queue
        .create_command_pool(&RhiCommandPoolDef { transient: true })
        .unwrap();

    let command_buffer = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    let foreign = other_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    assert_eq!(harness.device_context.object_counts().command_buffers, 2);

    assert!(harness.command_pool.free_command_buffer(foreign).is_err());
    harness
        .command_pool
        .free_command_buffer(command_buffer)
        .unwrap();
    assert_eq!(harness.device_context.object_counts().command_buffers, 0);
}

#[test]
fn pools_with_buffers_in_flight_cannot_be_reset() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let fence = harness.device_context.create_fence().unwrap();

    let command_buffer = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    command_buffer.begin().unwrap();
    command_buffer.end().unwrap();
    harness
        .queue
        .submit(&[&command_buffer], &[], &[], Some(&fence))
        .unwrap();

    assert!(matches!(
        harness.command_pool.reset_command_pool(),
        Err(RhiError::InvalidCommandBufferState { .. })
    ));
    fence.wait().unwrap();
    harness.command_pool.reset_command_pool().unwrap();
    harness
        .command_pool
        .free_command_buffer(command_buffer)
        .unwrap();
}

#[test]
fn rejected_execute_leaves_secondaries_pending() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let buffer = uniform_buffer(&harness.device_context);

    let secondary = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef { is_secondary: true })
        .unwrap();
    let primary = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();

    secondary
        .begin_secondary(
            RhiCommandBufferBeginFlags::NONE,
            RhiCommandBufferInheritance::default(),
        )
        .unwrap();
    secondary.cmd_update_buffer(&buffer, 0, &[5; 16]).unwrap();
    secondary.end().unwrap();

    // The primary was never begun
    assert!(matches!(
        primary.cmd_execute_command_buffers(&[&secondary]),
        Err(RhiError::InvalidCommandBufferState { .. })
    ));
    assert_eq!(secondary.state(), RhiCommandBufferState::Pending);

    primary.begin().unwrap();
    assert!(primary
        .cmd_execute_command_buffers(&[&secondary, &secondary])
        .is_err());
    assert_eq!(secondary.state(), RhiCommandBufferState::Pending);

    primary.cmd_execute_command_buffers(&[&secondary]).unwrap();
    primary.end().unwrap();
    assert_eq!(secondary.state(), RhiCommandBufferState::Closed);

    let fence = harness.device_context.create_fence().unwrap();
    harness
        .queue
        .submit(&[&primary], &[], &[], Some(&fence))
        .unwrap();
    fence.wait().unwrap();
    assert_eq!(buffer.read_host_visible_buffer(0, 16).unwrap(), vec![5; 16]);
}

#[test]
fn out_of_range_offsets_are_rejected_without_overflow() {
    let api = RhiApi::new_null(&RhiApiDef::default()).unwrap();
    let mut harness = harness(&api);
    let src = uniform_buffer(&harness.device_context);
    let dst = uniform_buffer(&harness.device_context);

    let command_buffer = harness
        .command_pool
        .create_command_buffer(&RhiCommandBufferDef {
            is_secondary: false,
        })
        .unwrap();
    command_buffer.begin().unwrap();

    assert!(command_buffer
        .cmd_copy_buffer_to_buffer(&src, &dst, u64::MAX, 0, 16)
        .is_err());
    assert!(command_buffer
        .cmd_copy_buffer_to_buffer(&src, &dst, 0, u64::MAX - 7, 16)
        .is_err());
    assert!(command_buffer
        .cmd_update_buffer(&dst, u64::MAX - 3, &[0; 4])
        .is_err());

    // In-range versions of the same calls still record
    command_buffer
        .cmd_copy_buffer_to_buffer(&src, &dst, 48, 0, 16)
        .unwrap();
    command_buffer.cmd_update_buffer(&dst, 60, &[0; 4]).unwrap();
    command_buffer.end().unwrap();
}
