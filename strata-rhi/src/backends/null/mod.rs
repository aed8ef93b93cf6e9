//! A headless device. Buffers and textures live in host memory, and submitted command lists are
//! replayed against that memory on an in-order timeline.
//!
//! Execution is lazy: a submission runs when a fence it signals is waited on, when an image is
//! presented, or when a queue or the device is idled. Everything a real driver or validation
//! layer would reject (waiting on a semaphore nothing signals, drawing without vertex data,
//! indices past the end of a vertex buffer) fails the submission and marks the device lost.

mod api;
pub use api::*;

mod device_context;
pub use device_context::*;

mod executor;
pub use executor::{RhiNullDeviceStats, RhiNullDrawRecord};

mod texel;

mod buffer;
pub use buffer::*;

mod texture;
pub use texture::*;

mod sampler;
pub use sampler::*;

mod shader;
pub use shader::*;

mod pipeline;
pub use pipeline::*;

mod descriptor_set;
pub use descriptor_set::*;

mod fence;
pub use fence::*;

mod semaphore;
pub use semaphore::*;

mod queue;
pub use queue::*;

mod command_pool;
pub use command_pool::*;

mod command_buffer;
pub use command_buffer::*;

mod swapchain;
pub use swapchain::*;
