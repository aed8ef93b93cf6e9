pub mod null;

#[cfg(feature = "rhi-vulkan")]
pub mod vulkan;
