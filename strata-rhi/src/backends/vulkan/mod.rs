//! Vulkan 1.3 device. Rendering uses dynamic rendering, so there are no render pass or
//! framebuffer objects, and cull mode and depth compare op are dynamic state.
//!
//! Command buffers record the shared `RhiCommand` list and are encoded into a native command
//! buffer when they are submitted. A list that is submitted again without being re-recorded is
//! not re-encoded.

mod internal;

mod api;
pub use api::*;

mod device_context;
pub use device_context::*;

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
