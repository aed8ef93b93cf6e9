//! Mapping tables from the engine-neutral enums to each graphics API's native values.
//!
//! Everything here is a pure function of its input. The OpenGL and D3D12 tables produce the raw
//! values those APIs define (`GLenum`, `D3D12_*`/`DXGI_*` enum values) so they can be handed to
//! whichever binding crate a device implementation uses. The Vulkan table produces `ash` types
//! and is only compiled with the `rhi-vulkan` feature.

pub mod d3d12;
pub mod gl;
#[cfg(feature = "rhi-vulkan")]
pub mod vulkan;
