use super::VkDebugReporter;
use crate::*;
use ash::extensions::ext::DebugUtils;
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

const KHRONOS_VALIDATION_LAYER_NAME: &[u8] = b"VK_LAYER_KHRONOS_validation\0";
const LUNARG_VALIDATION_LAYER_NAME: &[u8] = b"VK_LAYER_LUNARG_standard_validation\0";

/// Created once at startup and destroyed after the device
pub(in crate::backends::vulkan) struct VkInstance {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub debug_reporter: Option<VkDebugReporter>,
    pub debug_utils: Option<DebugUtils>,
}

fn has_extension(
    extensions: &[vk::ExtensionProperties],
    name: &CStr,
) -> bool {
    extensions
        .iter()
        .any(|extension| unsafe { CStr::from_ptr(extension.extension_name.as_ptr()) } == name)
}

impl VkInstance {
    /// Creates a vulkan instance. Without a display the instance can only be used headless, no
    /// surface extensions are enabled.
    pub fn new(
        entry: ash::Entry,
        display: Option<RawDisplayHandle>,
        app_name: &CString,
        validation_mode: RhiValidationMode,
    ) -> RhiResult<VkInstance> {
        let vulkan_version = match entry.try_enumerate_instance_version()? {
            Some(version) => version,
            None => vk::make_api_version(0, 1, 0, 0),
        };

        log::info!(
            "Found Vulkan version: {}.{}.{}",
            vk::api_version_major(vulkan_version),
            vk::api_version_minor(vulkan_version),
            vk::api_version_patch(vulkan_version)
        );

        // Dynamic rendering and extended dynamic state are core in 1.3
        let minimum_version = vk::make_api_version(0, 1, 3, 0);
        if vulkan_version < minimum_version {
            log::error!("Vulkan 1.3 is required");
            return Err(RhiError::VkError(vk::Result::ERROR_INCOMPATIBLE_DRIVER));
        }

        let layers = entry.enumerate_instance_layer_properties()?;
        log::debug!("Available layers: {}", layers.len());
        let extensions = entry.enumerate_instance_extension_properties(None)?;
        log::debug!("Available instance extensions: {}", extensions.len());

        let appinfo = vk::ApplicationInfo::builder()
            .application_name(app_name)
            .application_version(0)
            .engine_name(app_name)
            .engine_version(0)
            .api_version(minimum_version);

        let mut layer_names: Vec<&'static CStr> = vec![];
        let mut extension_names: Vec<*const c_char> = match display {
            Some(display) => ash_window::enumerate_required_extensions(display)?.to_vec(),
            None => vec![],
        };

        let debug_utils_available = has_extension(&extensions, DebugUtils::name());
        let validation_requested = validation_mode != RhiValidationMode::Disabled;
        let validation_required = validation_mode == RhiValidationMode::Enabled;

        if validation_requested {
            let best_validation_layer = Self::find_best_validation_layer(&layers);
            match best_validation_layer {
                Some(layer) if debug_utils_available => layer_names.push(layer),
                _ if validation_required => {
                    log::error!("Could not find a validation layer with DebugUtils. Check that the vulkan SDK has been installed or disable validation.");
                    return Err(RhiError::VkError(vk::Result::ERROR_LAYER_NOT_PRESENT));
                }
                _ => {
                    log::warn!("Could not find a validation layer with DebugUtils. Check that the vulkan SDK has been installed or disable validation.");
                }
            }
        }

        // Debug names are applied whenever the extension is there, validation or not
        if debug_utils_available {
            extension_names.push(DebugUtils::name().as_ptr());
        }

        if has_extension(&extensions, vk::ExtSwapchainColorspaceFn::name()) && display.is_some() {
            extension_names.push(vk::ExtSwapchainColorspaceFn::name().as_ptr());
        }

        log::debug!("Using layers: {:?}", layer_names);

        let layer_name_ptrs: Vec<_> = layer_names.iter().map(|x| x.as_ptr()).collect();
        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&appinfo)
            .enabled_layer_names(&layer_name_ptrs)
            .enabled_extension_names(&extension_names);

        log::info!("Creating vulkan instance");
        let instance: ash::Instance = unsafe { entry.create_instance(&create_info, None)? };

        let debug_utils = if debug_utils_available {
            Some(DebugUtils::new(&entry, &instance))
        } else {
            None
        };

        let debug_reporter = match (&debug_utils, layer_names.is_empty()) {
            (Some(debug_utils), false) => Some(VkDebugReporter::new(debug_utils.clone())?),
            _ => None,
        };

        Ok(VkInstance {
            entry,
            instance,
            debug_reporter,
            debug_utils,
        })
    }

    fn find_best_validation_layer(layers: &[vk::LayerProperties]) -> Option<&'static CStr> {
        let khronos = CStr::from_bytes_with_nul(KHRONOS_VALIDATION_LAYER_NAME).ok()?;
        let lunarg = CStr::from_bytes_with_nul(LUNARG_VALIDATION_LAYER_NAME).ok()?;

        let mut best_available_layer = None;
        for layer in layers {
            let layer_name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
            if layer_name == khronos {
                best_available_layer = Some(khronos);
                break;
            }

            if layer_name == lunarg {
                best_available_layer = Some(lunarg);
            }
        }

        best_available_layer
    }
}

impl Drop for VkInstance {
    fn drop(&mut self) {
        log::trace!("destroying VkInstance");
        // The messenger must go before the instance it was created from
        self.debug_reporter.take();

        unsafe {
            self.instance.destroy_instance(None);
        }

        log::trace!("destroyed VkInstance");
    }
}
