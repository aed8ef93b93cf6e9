use super::internal::*;
use super::*;
use crate::device_context::RhiObjectCounters;
use crate::sampler::RhiSamplerCache;
use crate::*;
use ash::extensions::khr;
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, Allocator, AllocatorCreateDesc};
use parking_lot::Mutex;
use std::ffi::CString;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

struct RhiDeviceContextVulkanInner {
    api_def: RhiApiDef,
    device_info: RhiDeviceInfo,
    counters: Arc<RhiObjectCounters>,
    sampler_cache: RhiSamplerCache,
    supports_sampler_anisotropy: bool,

    // Submissions not yet known to be finished, retired when the device goes idle
    in_flight: Mutex<Vec<RhiSubmissionToken>>,
    next_queue_id: AtomicU32,

    allocator: Mutex<Option<Allocator>>,
    graphics_queue: Mutex<vk::Queue>,
    // None if the graphics queue presents
    present_queue: Option<Mutex<vk::Queue>>,
    queue_family_indices: VkQueueFamilyIndices,
    surface_loader: Option<khr::Surface>,
    swapchain_loader: Option<khr::Swapchain>,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,

    // Dropped last
    instance: VkInstance,
}

impl Drop for RhiDeviceContextVulkanInner {
    fn drop(&mut self) {
        log::trace!("destroying device");
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                log::error!("Error waiting for the device to idle before destroying it: {}", e);
            }

            // Every allocation has been freed by now, the allocator only holds memory blocks
            self.allocator.lock().take();
            self.device.destroy_device(None);
        }
        log::trace!("destroyed device");
    }
}

/// A vulkan device. Cheap to clone, every clone refers to the same device.
#[derive(Clone)]
pub struct RhiDeviceContextVulkan {
    inner: Arc<RhiDeviceContextVulkanInner>,
}

impl std::fmt::Debug for RhiDeviceContextVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDeviceContextVulkan")
            .field("adapter_name", &self.inner.device_info.adapter_name)
            .field("handle", &self.inner.device.handle())
            .finish()
    }
}

impl RhiDeviceContextVulkan {
    pub(super) fn new(
        instance: VkInstance,
        window_handles: Option<&RhiWindowHandles>,
        api_def: &RhiApiDef,
    ) -> RhiResult<Self> {
        let surface_loader = window_handles
            .map(|_| khr::Surface::new(&instance.entry, &instance.instance));

        // A surface is only needed here to find a queue family that can present to it. The
        // swapchain creates its own.
        let choice = match (window_handles, &surface_loader) {
            (Some(window_handles), Some(surface_loader)) => {
                let surface = unsafe {
                    ash_window::create_surface(
                        &instance.entry,
                        &instance.instance,
                        window_handles.display,
                        window_handles.window,
                        None,
                    )?
                };
                let probe = VkSurfaceProbe {
                    surface_loader,
                    surface,
                };
                let choice = choose_physical_device(&instance.instance, Some(&probe));
                unsafe { surface_loader.destroy_surface(surface, None) };
                choice?
            }
            _ => choose_physical_device(&instance.instance, None)?,
        };

        let queue_family_indices = choice.queue_family_indices;
        let priorities = [1.0];
        let mut queue_families = vec![queue_family_indices.graphics];
        if let Some(present) = queue_family_indices.present {
            if present != queue_family_indices.graphics {
                queue_families.push(present);
            }
        }

        let queue_create_infos: Vec<_> = queue_families
            .iter()
            .map(|family_index| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(*family_index)
                    .queue_priorities(&priorities)
                    .build()
            })
            .collect();

        let mut extension_names = vec![];
        if window_handles.is_some() {
            extension_names.push(khr::Swapchain::name().as_ptr());
        }

        let features = vk::PhysicalDeviceFeatures::builder()
            .sampler_anisotropy(choice.supports_sampler_anisotropy)
            .build();
        let mut features13 = vk::PhysicalDeviceVulkan13Features {
            dynamic_rendering: vk::TRUE,
            ..Default::default()
        };

        let device_create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features)
            .push_next(&mut features13);

        let device = unsafe {
            instance
                .instance
                .create_device(choice.physical_device, &device_create_info, None)?
        };

        let graphics_queue = unsafe { device.get_device_queue(queue_family_indices.graphics, 0) };
        let present_queue = match queue_family_indices.present {
            Some(present) if present != queue_family_indices.graphics => {
                Some(Mutex::new(unsafe { device.get_device_queue(present, 0) }))
            }
            _ => None,
        };

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance.clone(),
            device: device.clone(),
            physical_device: choice.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        let swapchain_loader =
            window_handles.map(|_| khr::Swapchain::new(&instance.instance, &device));

        let limits = &choice.properties.limits;
        let device_info = RhiDeviceInfo {
            adapter_name: device_name(&choice.properties),
            vendor_id: choice.properties.vendor_id,
            is_discrete_gpu: choice.properties.device_type
                == vk::PhysicalDeviceType::DISCRETE_GPU,
            min_uniform_buffer_offset_alignment: limits.min_uniform_buffer_offset_alignment as u32,
            min_storage_buffer_offset_alignment: limits.min_storage_buffer_offset_alignment as u32,
            upload_buffer_texture_alignment: limits.optimal_buffer_copy_offset_alignment as u32,
            upload_buffer_texture_row_alignment: limits.optimal_buffer_copy_row_pitch_alignment
                as u32,
            max_vertex_attribute_count: limits.max_vertex_input_attributes,
            max_push_constant_size: limits.max_push_constants_size,
            supports_extended_dynamic_state: true,
            // Blend overrides bind a pipeline variant instead
            supports_dynamic_blend_state: false,
        };

        log::info!(
            "Created vulkan device \"{}\" (vendor 0x{:x})",
            device_info.adapter_name,
            device_info.vendor_id
        );

        Ok(RhiDeviceContextVulkan {
            inner: Arc::new(RhiDeviceContextVulkanInner {
                api_def: api_def.clone(),
                device_info,
                counters: Arc::new(RhiObjectCounters::default()),
                sampler_cache: RhiSamplerCache::default(),
                supports_sampler_anisotropy: choice.supports_sampler_anisotropy,
                in_flight: Mutex::new(Vec::default()),
                next_queue_id: AtomicU32::new(0),
                allocator: Mutex::new(Some(allocator)),
                graphics_queue: Mutex::new(graphics_queue),
                present_queue,
                queue_family_indices,
                surface_loader,
                swapchain_loader,
                physical_device: choice.physical_device,
                device,
                instance,
            }),
        })
    }

    pub fn device_info(&self) -> &RhiDeviceInfo {
        &self.inner.device_info
    }

    pub fn api_def(&self) -> &RhiApiDef {
        &self.inner.api_def
    }

    pub fn object_counts(&self) -> RhiObjectCounts {
        self.inner.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> &Arc<RhiObjectCounters> {
        &self.inner.counters
    }

    pub(crate) fn sampler_cache(&self) -> &RhiSamplerCache {
        &self.inner.sampler_cache
    }

    pub fn device(&self) -> &ash::Device {
        &self.inner.device
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.inner.instance.instance
    }

    pub fn entry(&self) -> &ash::Entry {
        &self.inner.instance.entry
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.inner.physical_device
    }

    pub(super) fn queue_family_indices(&self) -> VkQueueFamilyIndices {
        self.inner.queue_family_indices
    }

    pub(super) fn supports_sampler_anisotropy(&self) -> bool {
        self.inner.supports_sampler_anisotropy
    }

    pub(super) fn graphics_queue(&self) -> &Mutex<vk::Queue> {
        &self.inner.graphics_queue
    }

    pub(super) fn present_queue(&self) -> &Mutex<vk::Queue> {
        self.inner
            .present_queue
            .as_ref()
            .unwrap_or(&self.inner.graphics_queue)
    }

    pub(super) fn surface_loader(&self) -> RhiResult<&khr::Surface> {
        self.inner
            .surface_loader
            .as_ref()
            .ok_or_else(|| "the device was created without a window and cannot present".into())
    }

    pub(super) fn swapchain_loader(&self) -> RhiResult<&khr::Swapchain> {
        self.inner
            .swapchain_loader
            .as_ref()
            .ok_or_else(|| "the device was created without a window and cannot present".into())
    }

    pub(super) fn next_queue_id(&self) -> u32 {
        self.inner.next_queue_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn allocate_memory(
        &self,
        desc: &AllocationCreateDesc,
    ) -> RhiResult<Allocation> {
        let mut allocator = self.inner.allocator.lock();
        let allocator = allocator
            .as_mut()
            .ok_or("the device is being destroyed")?;
        Ok(allocator.allocate(desc)?)
    }

    pub(super) fn free_memory(
        &self,
        allocation: Allocation,
    ) {
        if let Some(allocator) = self.inner.allocator.lock().as_mut() {
            if let Err(e) = allocator.free(allocation) {
                log::error!("Error freeing device memory: {}", e);
            }
        }
    }

    /// Names show up in validation messages and graphics debuggers
    pub(super) fn set_debug_name<T: vk::Handle>(
        &self,
        handle: T,
        name: &str,
    ) {
        let debug_utils = match &self.inner.instance.debug_utils {
            Some(debug_utils) => debug_utils,
            None => return,
        };

        let name = match CString::new(name) {
            Ok(name) => name,
            Err(_) => return,
        };

        let name_info = vk::DebugUtilsObjectNameInfoEXT::builder()
            .object_type(T::TYPE)
            .object_handle(handle.as_raw())
            .object_name(&name);
        let result = unsafe {
            debug_utils.set_debug_utils_object_name(self.inner.device.handle(), &name_info)
        };
        if let Err(e) = result {
            log::warn!("Could not set debug name {:?}: {}", name, e);
        }
    }

    pub(super) fn track_in_flight(
        &self,
        token: RhiSubmissionToken,
    ) {
        let mut in_flight = self.inner.in_flight.lock();
        in_flight.retain(|x| !x.is_retired());
        in_flight.push(token);
    }

    /// Everything submitted so far has finished
    pub(super) fn retire_all_in_flight(&self) {
        for token in self.inner.in_flight.lock().drain(..) {
            token.retire();
        }
    }

    pub fn create_queue(
        &self,
        queue_type: RhiQueueType,
    ) -> RhiResult<RhiQueueVulkan> {
        RhiQueueVulkan::new(self, queue_type)
    }

    pub fn create_fence(&self) -> RhiResult<RhiFenceVulkan> {
        RhiFenceVulkan::new(self)
    }

    pub fn create_semaphore(&self) -> RhiResult<RhiSemaphoreVulkan> {
        RhiSemaphoreVulkan::new(self)
    }

    pub fn create_swapchain(
        &self,
        window_handles: &RhiWindowHandles,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<RhiSwapchainVulkan> {
        RhiSwapchainVulkan::new(self, window_handles, swapchain_def)
    }

    /// Fences that were never submitted are skipped
    pub fn wait_for_fences(
        &self,
        fences: &[&RhiFenceVulkan],
    ) -> RhiResult<()> {
        let submitted: Vec<_> = fences.iter().filter(|x| x.is_submitted()).collect();
        if submitted.is_empty() {
            return Ok(());
        }

        let handles: Vec<_> = submitted.iter().map(|x| x.vk_fence()).collect();
        let timeout = self.inner.api_def.fence_timeout();
        let result = unsafe {
            self.inner
                .device
                .wait_for_fences(&handles, true, timeout.as_nanos() as u64)
        };

        match result {
            Ok(()) => {}
            Err(vk::Result::TIMEOUT) => {
                log::error!("Timed out waiting on {} fences", handles.len());
                return Err(RhiError::FenceTimeout(timeout.as_millis() as u64));
            }
            Err(vk::Result::ERROR_DEVICE_LOST) => {
                return Err(RhiError::DeviceLost(
                    "lost while waiting on a fence".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        }

        for fence in submitted {
            fence.mark_complete()?;
        }

        Ok(())
    }

    pub fn wait_for_device_idle(&self) -> RhiResult<()> {
        unsafe { self.inner.device.device_wait_idle()? };
        self.retire_all_in_flight();
        Ok(())
    }

    pub fn create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSamplerVulkan> {
        RhiSamplerVulkan::new(self, sampler_def)
    }

    pub fn create_texture(
        &self,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTextureVulkan> {
        RhiTextureVulkan::new(self, texture_def)
    }

    pub fn create_buffer(
        &self,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<RhiBufferVulkan> {
        RhiBufferVulkan::new(self, buffer_def)
    }

    pub fn create_shader(
        &self,
        program: RhiShaderProgram,
    ) -> RhiResult<RhiShaderVulkan> {
        RhiShaderVulkan::new(self, program)
    }

    pub fn create_graphics_pipeline(
        &self,
        graphics_pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<RhiPipelineVulkan> {
        RhiPipelineVulkan::new_graphics_pipeline(self, graphics_pipeline_def)
    }

    pub fn create_compute_pipeline(
        &self,
        compute_pipeline_def: &RhiComputePipelineDef,
    ) -> RhiResult<RhiPipelineVulkan> {
        RhiPipelineVulkan::new_compute_pipeline(self, compute_pipeline_def)
    }

    pub fn create_descriptor_pool(
        &self,
        descriptor_pool_def: &RhiDescriptorPoolDef,
    ) -> RhiResult<RhiDescriptorPoolVulkan> {
        RhiDescriptorPoolVulkan::new(self, descriptor_pool_def)
    }

    /// Clones of the device context that are alive, this one included
    pub(super) fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}
