use ash::extensions::ext::DebugUtils;
use ash::prelude::VkResult;
use ash::vk;
use std::ffi::CStr;
use std::os::raw::c_void;

const ERRORS_TO_IGNORE: [&str; 1] = [
    // Some drivers report a 0x0 max surface extent while the window is minimized, the renderer
    // skips frames then anyway
    "VUID-VkSwapchainCreateInfoKHR-imageExtent-01274",
];

/// Callback for vulkan validation layer logging
unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }

    let msg = CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();
    if message_severity.intersects(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        if !ERRORS_TO_IGNORE.iter().any(|x| msg.contains(x)) {
            log::error!("{:?} {}", message_type, msg);
        }
    } else if message_severity.intersects(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::warn!("{:?} {}", message_type, msg);
    } else if message_severity.intersects(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::debug!("{:?} {}", message_type, msg);
    } else {
        log::trace!("{:?} {}", message_type, msg);
    }

    vk::FALSE
}

/// Routes validation messages into `log`, and unregisters on drop
pub(in crate::backends::vulkan) struct VkDebugReporter {
    debug_utils: DebugUtils,
    debug_messenger: vk::DebugUtilsMessengerEXT,
}

impl VkDebugReporter {
    pub fn new(debug_utils: DebugUtils) -> VkResult<Self> {
        log::info!("Setting up vulkan debug callback");
        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let debug_messenger =
            unsafe { debug_utils.create_debug_utils_messenger(&debug_info, None)? };

        Ok(VkDebugReporter {
            debug_utils,
            debug_messenger,
        })
    }
}

impl Drop for VkDebugReporter {
    fn drop(&mut self) {
        log::trace!("destroying VkDebugReporter");
        unsafe {
            self.debug_utils
                .destroy_debug_utils_messenger(self.debug_messenger, None);
        }
    }
}
