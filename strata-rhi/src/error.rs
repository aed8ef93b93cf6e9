use crate::RhiBackendType;
#[cfg(feature = "rhi-vulkan")]
use ash::vk;
use std::sync::Arc;

pub type RhiResult<T> = Result<T, RhiError>;

/// How bad an error is. The frame loop uses this to decide between dropping a frame, handing a
/// failure back to the caller, or shutting down.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RhiErrorSeverity {
    /// The device can no longer be trusted. Log and exit with a non-zero code.
    Fatal,
    /// A resource could not be created. The caller receives no handle and decides what to do.
    Resource,
    /// The current frame is dropped. The next frame is expected to succeed.
    Recoverable,
}

/// Generic error that contains all the different kinds of errors that may occur when using the API
#[derive(Debug, Clone, thiserror::Error)]
pub enum RhiError {
    #[error("{0}")]
    StringError(String),

    #[error("{0}")]
    IoError(Arc<std::io::Error>),

    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("shader {name} failed to compile:\n{diagnostic}")]
    ShaderCompile { name: String, diagnostic: String },

    #[error("shader {name} failed to link: {diagnostic}")]
    ShaderLink { name: String, diagnostic: String },

    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    #[error("descriptor pool exhausted: {requested} {binding_type} requested, {available} available")]
    DescriptorPoolExhausted {
        binding_type: String,
        requested: u32,
        available: u32,
    },

    #[error("command buffer is {actual}, expected {expected}")]
    InvalidCommandBufferState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("a render pass was begun and never ended before the command buffer was submitted")]
    OpenRenderPassAtSubmit,

    #[error("swapchain is out of date")]
    SwapchainOutOfDate,

    #[error("timed out after {0} ms waiting for a fence")]
    FenceTimeout(u64),

    #[error("device lost: {0}")]
    DeviceLost(String),

    #[error("the {0:?} backend is not available in this build")]
    BackendUnavailable(RhiBackendType),

    #[cfg(feature = "rhi-vulkan")]
    #[error("{0}")]
    VkError(vk::Result),

    #[cfg(feature = "rhi-vulkan")]
    #[error("{0}")]
    VkLoadingError(Arc<ash::LoadingError>),

    #[cfg(feature = "rhi-vulkan")]
    #[error("{0}")]
    GpuAllocatorError(Arc<gpu_allocator::AllocationError>),
}

impl RhiError {
    pub fn severity(&self) -> RhiErrorSeverity {
        match self {
            RhiError::SwapchainOutOfDate => RhiErrorSeverity::Recoverable,

            RhiError::ShaderCompile { .. }
            | RhiError::ShaderLink { .. }
            | RhiError::AllocationFailed(_)
            | RhiError::DescriptorPoolExhausted { .. }
            | RhiError::InvalidCommandBufferState { .. }
            | RhiError::ConfigError(_)
            | RhiError::IoError(_)
            | RhiError::StringError(_) => RhiErrorSeverity::Resource,

            RhiError::OpenRenderPassAtSubmit
            | RhiError::FenceTimeout(_)
            | RhiError::DeviceLost(_)
            | RhiError::BackendUnavailable(_) => RhiErrorSeverity::Fatal,

            #[cfg(feature = "rhi-vulkan")]
            RhiError::VkError(result) => match *result {
                vk::Result::ERROR_OUT_OF_DATE_KHR => RhiErrorSeverity::Recoverable,
                vk::Result::ERROR_OUT_OF_HOST_MEMORY
                | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY
                | vk::Result::ERROR_FRAGMENTED_POOL
                | vk::Result::ERROR_OUT_OF_POOL_MEMORY => RhiErrorSeverity::Resource,
                _ => RhiErrorSeverity::Fatal,
            },
            #[cfg(feature = "rhi-vulkan")]
            RhiError::VkLoadingError(_) => RhiErrorSeverity::Fatal,
            #[cfg(feature = "rhi-vulkan")]
            RhiError::GpuAllocatorError(_) => RhiErrorSeverity::Resource,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == RhiErrorSeverity::Fatal
    }

    pub fn is_out_of_date(&self) -> bool {
        match self {
            RhiError::SwapchainOutOfDate => true,
            #[cfg(feature = "rhi-vulkan")]
            RhiError::VkError(vk::Result::ERROR_OUT_OF_DATE_KHR) => true,
            _ => false,
        }
    }
}

impl From<&str> for RhiError {
    fn from(str: &str) -> Self {
        RhiError::StringError(str.to_string())
    }
}

impl From<String> for RhiError {
    fn from(string: String) -> Self {
        RhiError::StringError(string)
    }
}

impl From<std::io::Error> for RhiError {
    fn from(error: std::io::Error) -> Self {
        RhiError::IoError(Arc::new(error))
    }
}

impl From<toml::de::Error> for RhiError {
    fn from(error: toml::de::Error) -> Self {
        RhiError::ConfigError(error.to_string())
    }
}

#[cfg(feature = "rhi-vulkan")]
impl From<vk::Result> for RhiError {
    fn from(result: vk::Result) -> Self {
        RhiError::VkError(result)
    }
}

#[cfg(feature = "rhi-vulkan")]
impl From<ash::LoadingError> for RhiError {
    fn from(result: ash::LoadingError) -> Self {
        RhiError::VkLoadingError(Arc::new(result))
    }
}

#[cfg(feature = "rhi-vulkan")]
impl From<gpu_allocator::AllocationError> for RhiError {
    fn from(error: gpu_allocator::AllocationError) -> Self {
        RhiError::GpuAllocatorError(Arc::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_tiers() {
        assert_eq!(
            RhiError::SwapchainOutOfDate.severity(),
            RhiErrorSeverity::Recoverable
        );
        assert!(RhiError::SwapchainOutOfDate.is_out_of_date());
        assert_eq!(
            RhiError::ShaderCompile {
                name: "a".to_string(),
                diagnostic: "b".to_string()
            }
            .severity(),
            RhiErrorSeverity::Resource
        );
        assert!(RhiError::DeviceLost("x".to_string()).is_fatal());
        assert!(RhiError::BackendUnavailable(RhiBackendType::D3d12).is_fatal());
    }

    #[test]
    fn string_conversion() {
        fn fails() -> RhiResult<()> {
            Err("nope")?;
            Ok(())
        }

        let error = fails().unwrap_err();
        assert_eq!(error.to_string(), "nope");
    }
}
