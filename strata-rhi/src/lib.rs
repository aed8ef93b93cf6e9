//! A render hardware interface: one API for recording and submitting GPU work, whichever graphics
//! API the device runs on.
//!
//! Every object kind is an enum with one variant per compiled-in backend (`RhiBuffer::Null`,
//! `RhiBuffer::Vk`, ...). The variant is picked once, when `RhiApi::new` resolves the configured
//! `RhiBackendType`, and never inspected by calling code.
//!
//! Command buffers on every backend record `RhiCommand`s and replay them against the device when
//! they are submitted. Recorded commands own clones of the resources they reference, so nothing a
//! submission uses is freed before the fence guarding it has been observed signaled.
//!
//! `RhiRenderer` wraps a device, a swapchain and a ring of in-flight frames into the
//! `begin_frame`/`end_frame`/`present` loop most callers want.

#[cfg(feature = "rhi-vulkan")]
pub use ash;
pub use raw_window_handle;

pub use api::*;
pub use buffer::*;
pub use command_buffer::*;
pub use command_pool::*;
pub use commands::*;
pub use config::*;
pub use descriptor_set::*;
pub use device_context::*;
pub use error::*;
pub use fence::*;
pub use pipeline::*;
pub use queue::*;
pub use reflection::*;
pub use renderer::*;
pub use sampler::*;
pub use semaphore::*;
pub use shader::*;
pub use shader_compiler::{
    RhiShaderBytecode, RhiShaderCompiler, RhiShaderEntryPoint, RhiShaderModuleSet,
    RhiShaderPreprocessor, RhiShaderProgram, RhiShaderStageModule, RhiShaderTarget,
};
pub use swapchain::*;
pub use texture::*;
pub use types::*;

pub mod backends;
pub mod convert;
pub mod extra;
pub mod shader_compiler;

mod api;
mod buffer;
mod command_buffer;
mod command_pool;
mod commands;
mod config;
mod descriptor_set;
mod device_context;
mod error;
mod fence;
mod pipeline;
mod queue;
mod reflection;
mod renderer;
mod sampler;
mod semaphore;
mod shader;
mod swapchain;
mod texture;
mod types;
