mod instance;
pub(super) use instance::*;

mod debug_reporter;
pub(super) use debug_reporter::*;

mod physical_device;
pub(super) use physical_device::*;

mod encoder;
pub(super) use encoder::*;

/// The aspects of an image with this format that a view or barrier covers
pub(super) fn image_aspect_mask(format: crate::RhiFormat) -> ash::vk::ImageAspectFlags {
    use ash::vk::ImageAspectFlags;
    if format.has_depth() && format.has_stencil() {
        ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL
    } else if format.has_depth() {
        ImageAspectFlags::DEPTH
    } else if format.has_stencil() {
        ImageAspectFlags::STENCIL
    } else {
        ImageAspectFlags::COLOR
    }
}
