use super::internal::VkInstance;
use super::RhiDeviceContextVulkan;
use crate::*;
use std::ffi::CString;

/// Owns the vulkan instance and device
pub struct RhiApiVulkan {
    // Dropping the last clone destroys the device, then the instance
    device_context: RhiDeviceContextVulkan,
    destroyed: bool,
}

impl Drop for RhiApiVulkan {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            log::error!("Error destroying the vulkan device: {}", e);
        }
    }
}

impl RhiApiVulkan {
    /// # Safety
    ///
    /// The window handles, if given, must stay valid until every swapchain created from this
    /// device is destroyed.
    pub unsafe fn new(
        window_handles: Option<&RhiWindowHandles>,
        api_def: &RhiApiDef,
    ) -> RhiResult<Self> {
        api_def.validate()?;

        log::info!("Loading vulkan");
        let entry = ash::Entry::load()?;
        let app_name = CString::new(api_def.application_name.as_str())
            .map_err(|_| "application name cannot contain a nul byte")?;

        let instance = VkInstance::new(
            entry,
            window_handles.map(|x| x.display),
            &app_name,
            api_def.validation_mode,
        )?;

        let device_context = RhiDeviceContextVulkan::new(instance, window_handles, api_def)?;
        Ok(RhiApiVulkan {
            device_context,
            destroyed: false,
        })
    }

    pub fn device_context(&self) -> &RhiDeviceContextVulkan {
        &self.device_context
    }

    pub(crate) fn destroy(&mut self) -> RhiResult<()> {
        if self.destroyed {
            return Ok(());
        }

        let device_context = &self.device_context;
        device_context.wait_for_device_idle()?;

        // Clear internal caches that hold objects created by the device
        device_context.sampler_cache().clear();

        let object_counts = device_context.object_counts();
        if object_counts.total() > 0 {
            log::warn!(
                "Destroying the vulkan device with live objects: {:?}",
                object_counts
            );
        }

        let strong_count = device_context.reference_count();
        if strong_count > 1 {
            Err(format!(
                "Could not destroy device, {} references to it exist",
                strong_count - 1
            ))?;
        }

        self.destroyed = true;
        log::info!("Destroyed vulkan device");
        Ok(())
    }
}
