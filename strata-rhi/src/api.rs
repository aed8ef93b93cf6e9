use crate::backends::null::RhiApiNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiApiVulkan;
use crate::*;

/// Primary entry point to using the API. `new` resolves the configured `RhiBackendType` and
/// creates the device once; nothing after that inspects the backend.
///
/// **This API object must persist for the lifetime of all objects created through it.** This
/// is verified at runtime when the API object is destroyed - either explicitly via `destroy()` or
/// by dropping the object.
///
/// Once the API object is created, use `device_context()` to obtain a cloneable handle to the
/// device. The `RhiDeviceContext` is the primary way of interacting with the API once it has been
/// initialized. These contexts and all other objects created through them must be dropped before
/// dropping `RhiApi` or calling `RhiApi::destroy()`.
pub enum RhiApi {
    Null(RhiApiNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiApiVulkan),
}

impl RhiApi {
    /// Create a device for the backend named in `api_def`. A window is only needed by backends
    /// that present to the screen and may be omitted for offscreen use.
    ///
    /// A backend that is not compiled into this build fails with
    /// `RhiError::BackendUnavailable`.
    ///
    /// # Safety
    ///
    /// GPU programming is fundamentally unsafe, so all strata APIs that interact with the GPU should
    /// be considered unsafe. However, strata APIs are only gated by unsafe if they can cause
    /// undefined behavior on the CPU for reasons other than interacting with the GPU.
    #[allow(unused_variables)]
    pub unsafe fn new(
        window_handles: Option<&RhiWindowHandles>,
        api_def: &RhiApiDef,
    ) -> RhiResult<Self> {
        api_def.validate()?;
        log::info!("Initializing RHI with the {:?} backend", api_def.backend);

        match api_def.backend {
            RhiBackendType::None => RhiApi::new_null(api_def),
            #[cfg(feature = "rhi-vulkan")]
            RhiBackendType::Vulkan => RhiApi::new_vulkan(window_handles, api_def),
            backend => {
                let error = RhiError::BackendUnavailable(backend);
                log::error!("{}", error);
                Err(error)
            }
        }
    }

    /// Initialize the headless device. Work executes against host memory.
    pub fn new_null(api_def: &RhiApiDef) -> RhiResult<Self> {
        Ok(RhiApi::Null(RhiApiNull::new(api_def)?))
    }

    /// Initialize a device using vulkan
    ///
    /// # Safety
    ///
    /// GPU programming is fundamentally unsafe, so all strata APIs that interact with the GPU should
    /// be considered unsafe. However, strata APIs are only gated by unsafe if they can cause
    /// undefined behavior on the CPU for reasons other than interacting with the GPU.
    #[cfg(feature = "rhi-vulkan")]
    pub unsafe fn new_vulkan(
        window_handles: Option<&RhiWindowHandles>,
        api_def: &RhiApiDef,
    ) -> RhiResult<Self> {
        Ok(RhiApi::Vk(RhiApiVulkan::new(window_handles, api_def)?))
    }

    pub fn backend_type(&self) -> RhiBackendType {
        match self {
            RhiApi::Null(_) => RhiBackendType::None,
            #[cfg(feature = "rhi-vulkan")]
            RhiApi::Vk(_) => RhiBackendType::Vulkan,
        }
    }

    /// Create a cloneable handle to the device. Most of the interaction with the graphics backend
    /// is done through this handle.
    ///
    /// The `RhiDeviceContext` does not need to be kept in scope. As long as the `RhiApi` remains
    /// in scope, dropping the device context does not do anything, and it can be obtained again
    /// by calling this function.
    ///
    /// This context is intended to be safely shared across threads. This function is thread-safe,
    /// and generally all APIs on the device context itself are thread-safe.
    pub fn device_context(&self) -> RhiDeviceContext {
        match self {
            RhiApi::Null(inner) => RhiDeviceContext::Null(inner.device_context().clone()),
            #[cfg(feature = "rhi-vulkan")]
            RhiApi::Vk(inner) => RhiDeviceContext::Vk(inner.device_context().clone()),
        }
    }

    /// Destroys the graphics API instance. Any `RhiDeviceContext` created through this API, and
    /// any object created through those device contexts, must be dropped before calling destroy()
    ///
    /// `destroy()` is automatically called if RhiApi is dropped and it has not yet been called, so
    /// it is not necessary to call this function explicitly.
    pub fn destroy(&mut self) -> RhiResult<()> {
        match self {
            RhiApi::Null(inner) => inner.destroy(),
            #[cfg(feature = "rhi-vulkan")]
            RhiApi::Vk(inner) => inner.destroy(),
        }
    }

    pub fn null_api(&self) -> Option<&RhiApiNull> {
        match self {
            RhiApi::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiApi::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_api(&self) -> Option<&RhiApiVulkan> {
        match self {
            RhiApi::Null(_) => None,
            RhiApi::Vk(inner) => Some(inner),
        }
    }
}
