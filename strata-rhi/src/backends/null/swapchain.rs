use super::*;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

const SWAPCHAIN_FORMAT: RhiFormat = RhiFormat::B8G8R8A8_UNORM;

/// A ring of offscreen images standing in for a window's backbuffer
pub struct RhiSwapchainNull {
    device_context: RhiDeviceContextNull,
    swapchain_def: RhiSwapchainDef,
    present_mode: RhiPresentMode,
    images: Vec<RhiTexture>,
    next_image_index: u32,
    // Images handed out by acquire and not presented yet
    acquired: Mutex<Vec<u32>>,
    out_of_date: AtomicBool,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiSwapchainNull {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiSwapchainNull")
            .field("swapchain_def", &self.swapchain_def)
            .field("present_mode", &self.present_mode)
            .field("image_count", &self.images.len())
            .finish()
    }
}

fn create_images(
    device_context: &RhiDeviceContextNull,
    swapchain_def: &RhiSwapchainDef,
) -> RhiResult<Vec<RhiTexture>> {
    if swapchain_def.extents().is_empty() {
        return Err(format!(
            "cannot create a {}x{} swapchain",
            swapchain_def.width, swapchain_def.height
        ))?;
    }

    let image_count = swapchain_def.image_count.max(2);
    let texture_def = RhiTextureDef {
        resource_type: RhiResourceType::RENDER_TARGET_COLOR | RhiResourceType::TEXTURE,
        ..RhiTextureDef::for_render_target(swapchain_def.extents(), SWAPCHAIN_FORMAT)
    };

    (0..image_count)
        .map(|_| Ok(RhiTexture::Null(device_context.create_texture(&texture_def)?)))
        .collect()
}

impl RhiSwapchainNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<Self> {
        let images = create_images(device_context, swapchain_def)?;
        let present_mode = RhiPresentMode::preference_order(swapchain_def.enable_vsync)[0];

        log::info!(
            "Swapchain created {}x{} with {} images, present mode {:?}",
            swapchain_def.width,
            swapchain_def.height,
            images.len(),
            present_mode
        );

        Ok(RhiSwapchainNull {
            device_context: device_context.clone(),
            swapchain_def: swapchain_def.clone(),
            present_mode,
            images,
            next_image_index: 0,
            acquired: Mutex::new(Vec::default()),
            out_of_date: AtomicBool::new(false),
            _count_guard: device_context.counters().track(RhiObjectKind::Swapchain),
        })
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn format(&self) -> RhiFormat {
        SWAPCHAIN_FORMAT
    }

    pub fn present_mode(&self) -> RhiPresentMode {
        self.present_mode
    }

    pub fn swapchain_def(&self) -> &RhiSwapchainDef {
        &self.swapchain_def
    }

    pub fn extents(&self) -> RhiExtents2D {
        self.swapchain_def.extents()
    }

    pub fn invalidate(&self) {
        self.out_of_date.store(true, Ordering::Release);
    }

    pub fn is_out_of_date(&self) -> bool {
        self.out_of_date.load(Ordering::Acquire)
    }

    fn acquire_next_image(&mut self) -> RhiResult<RhiSwapchainImage> {
        self.device_context.check_device_lost()?;
        if self.is_out_of_date() {
            return Err(RhiError::SwapchainOutOfDate);
        }

        let mut acquired = self.acquired.lock();
        if acquired.len() >= self.images.len() {
            return Err("every swapchain image is acquired, present one before acquiring again")?;
        }

        let image_index = self.next_image_index;
        self.next_image_index = (self.next_image_index + 1) % self.images.len() as u32;
        acquired.push(image_index);

        Ok(RhiSwapchainImage {
            texture: self.images[image_index as usize].clone(),
            swapchain_image_index: image_index,
        })
    }

    pub fn acquire_next_image_semaphore(
        &mut self,
        semaphore: &RhiSemaphoreNull,
    ) -> RhiResult<RhiSwapchainImage> {
        semaphore.check_signalable()?;
        let image = self.acquire_next_image()?;
        semaphore.signal()?;
        Ok(image)
    }

    pub fn acquire_next_image_fence(
        &mut self,
        fence: &RhiFenceNull,
    ) -> RhiResult<RhiSwapchainImage> {
        fence.check_submittable()?;
        let image = self.acquire_next_image()?;
        fence.signal_now()?;
        Ok(image)
    }

    /// Hands an acquired image back for display
    pub(super) fn present(
        &self,
        image_index: u32,
    ) -> RhiResult<RhiPresentSuccessResult> {
        let mut acquired = self.acquired.lock();
        let position = acquired
            .iter()
            .position(|x| *x == image_index)
            .ok_or_else(|| {
                format!(
                    "swapchain image {} was presented without being acquired",
                    image_index
                )
            })?;
        acquired.remove(position);

        if self.is_out_of_date() {
            return Ok(RhiPresentSuccessResult::OutOfDate);
        }

        Ok(RhiPresentSuccessResult::Success)
    }

    pub fn rebuild(
        &mut self,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<()> {
        if *swapchain_def == self.swapchain_def && !self.is_out_of_date() {
            log::debug!(
                "Swapchain is already {}x{}, nothing to rebuild",
                swapchain_def.width,
                swapchain_def.height
            );
            return Ok(());
        }

        // Build the new ring first so a failure leaves the old swapchain usable
        let images = create_images(&self.device_context, swapchain_def)?;
        self.images = images;
        self.swapchain_def = swapchain_def.clone();
        self.present_mode = RhiPresentMode::preference_order(swapchain_def.enable_vsync)[0];
        self.next_image_index = 0;
        self.acquired.lock().clear();
        self.out_of_date.store(false, Ordering::Release);

        log::info!(
            "Swapchain rebuilt {}x{} with {} images",
            swapchain_def.width,
            swapchain_def.height,
            self.images.len()
        );
        Ok(())
    }
}
