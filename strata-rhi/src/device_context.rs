use crate::backends::null::RhiDeviceContextNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiDeviceContextVulkan;
use crate::*;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The native window a swapchain presents into
#[derive(Copy, Clone, Debug)]
pub struct RhiWindowHandles {
    pub window: RawWindowHandle,
    pub display: RawDisplayHandle,
}

impl RhiWindowHandles {
    pub fn from_window<W: HasRawWindowHandle + HasRawDisplayHandle>(window: &W) -> Self {
        RhiWindowHandles {
            window: window.raw_window_handle(),
            display: window.raw_display_handle(),
        }
    }
}

/// Kinds of device objects that are counted for leak checks
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum RhiObjectKind {
    Buffer,
    Texture,
    Sampler,
    Shader,
    Pipeline,
    DescriptorPool,
    DescriptorSet,
    CommandPool,
    CommandBuffer,
    Fence,
    Semaphore,
    Swapchain,
}

const RHI_OBJECT_KIND_COUNT: usize = 12;

/// Live object counts of one device, shared by every object it created
#[derive(Debug, Default)]
pub(crate) struct RhiObjectCounters {
    counts: [AtomicU32; RHI_OBJECT_KIND_COUNT],
}

impl RhiObjectCounters {
    pub(crate) fn track(
        self: &Arc<Self>,
        kind: RhiObjectKind,
    ) -> RhiObjectCountGuard {
        self.counts[kind as usize].fetch_add(1, Ordering::Relaxed);
        RhiObjectCountGuard {
            counters: self.clone(),
            kind,
        }
    }

    pub(crate) fn snapshot(&self) -> RhiObjectCounts {
        let count = |kind: RhiObjectKind| self.counts[kind as usize].load(Ordering::Relaxed);
        RhiObjectCounts {
            buffers: count(RhiObjectKind::Buffer),
            textures: count(RhiObjectKind::Texture),
            samplers: count(RhiObjectKind::Sampler),
            shaders: count(RhiObjectKind::Shader),
            pipelines: count(RhiObjectKind::Pipeline),
            descriptor_pools: count(RhiObjectKind::DescriptorPool),
            descriptor_sets: count(RhiObjectKind::DescriptorSet),
            command_pools: count(RhiObjectKind::CommandPool),
            command_buffers: count(RhiObjectKind::CommandBuffer),
            fences: count(RhiObjectKind::Fence),
            semaphores: count(RhiObjectKind::Semaphore),
            swapchains: count(RhiObjectKind::Swapchain),
        }
    }
}

/// Held by a device object for as long as it lives
#[derive(Debug)]
pub(crate) struct RhiObjectCountGuard {
    counters: Arc<RhiObjectCounters>,
    kind: RhiObjectKind,
}

impl Drop for RhiObjectCountGuard {
    fn drop(&mut self) {
        self.counters.counts[self.kind as usize].fetch_sub(1, Ordering::Relaxed);
    }
}

/// Reads the live object counts of a device without keeping the device alive, so leaks can
/// still be checked after the device is destroyed
#[derive(Clone, Debug)]
pub struct RhiObjectCountTracker {
    counters: Arc<RhiObjectCounters>,
}

impl RhiObjectCountTracker {
    pub(crate) fn new(counters: &Arc<RhiObjectCounters>) -> Self {
        RhiObjectCountTracker {
            counters: counters.clone(),
        }
    }

    pub fn counts(&self) -> RhiObjectCounts {
        self.counters.snapshot()
    }
}

/// How many objects of each kind a device currently has alive
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RhiObjectCounts {
    pub buffers: u32,
    pub textures: u32,
    pub samplers: u32,
    pub shaders: u32,
    pub pipelines: u32,
    pub descriptor_pools: u32,
    pub descriptor_sets: u32,
    pub command_pools: u32,
    pub command_buffers: u32,
    pub fences: u32,
    pub semaphores: u32,
    pub swapchains: u32,
}

impl RhiObjectCounts {
    /// Objects of every kind added together
    pub fn total(&self) -> u32 {
        self.buffers
            + self.textures
            + self.samplers
            + self.shaders
            + self.pipelines
            + self.descriptor_pools
            + self.descriptor_sets
            + self.command_pools
            + self.command_buffers
            + self.fences
            + self.semaphores
            + self.swapchains
    }
}

/// A cloneable, thread-safe handle used to create graphics resources.
///
/// All device contexts, and resources created from them, must be dropped before the `RhiApi`
/// object that they came from is destroyed.
#[derive(Clone)]
pub enum RhiDeviceContext {
    Null(RhiDeviceContextNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiDeviceContextVulkan),
}

impl std::fmt::Debug for RhiDeviceContext {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDeviceContext")
            .field("backend", &self.backend_type())
            .field("adapter", &self.device_info().adapter_name)
            .finish()
    }
}

pub(crate) fn backend_mismatch(object: &str) -> RhiError {
    RhiError::StringError(format!(
        "{} was created by a device of a different backend",
        object
    ))
}

impl RhiDeviceContext {
    pub fn backend_type(&self) -> RhiBackendType {
        match self {
            RhiDeviceContext::Null(_) => RhiBackendType::None,
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(_) => RhiBackendType::Vulkan,
        }
    }

    /// Get metadata about the device
    pub fn device_info(&self) -> &RhiDeviceInfo {
        match self {
            RhiDeviceContext::Null(inner) => inner.device_info(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.device_info(),
        }
    }

    /// The configuration the device was created with
    pub fn api_def(&self) -> &RhiApiDef {
        match self {
            RhiDeviceContext::Null(inner) => inner.api_def(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.api_def(),
        }
    }

    /// A shader compiler targeting this device, with the configured include directories and
    /// defines
    pub fn shader_compiler(&self) -> RhiShaderCompiler {
        let mut compiler = RhiShaderCompiler::from_api_def(self.api_def());
        if compiler.target() != RhiShaderTarget::for_backend(self.backend_type()) {
            compiler = RhiShaderCompiler::new(
                compiler.preprocessor().clone(),
                RhiShaderTarget::for_backend(self.backend_type()),
            );
        }
        compiler
    }

    /// Objects created by this device that are still alive
    pub fn object_counts(&self) -> RhiObjectCounts {
        match self {
            RhiDeviceContext::Null(inner) => inner.object_counts(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.object_counts(),
        }
    }

    pub fn object_count_tracker(&self) -> RhiObjectCountTracker {
        match self {
            RhiDeviceContext::Null(inner) => RhiObjectCountTracker::new(inner.counters()),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiObjectCountTracker::new(inner.counters()),
        }
    }

    /// Create a queue
    pub fn create_queue(
        &self,
        queue_type: RhiQueueType,
    ) -> RhiResult<RhiQueue> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => RhiQueue::Null(inner.create_queue(queue_type)?),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiQueue::Vk(inner.create_queue(queue_type)?),
        })
    }

    /// Create a fence
    pub fn create_fence(&self) -> RhiResult<RhiFence> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => RhiFence::Null(inner.create_fence()?),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiFence::Vk(inner.create_fence()?),
        })
    }

    /// Create a semaphore
    pub fn create_semaphore(&self) -> RhiResult<RhiSemaphore> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => RhiSemaphore::Null(inner.create_semaphore()?),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiSemaphore::Vk(inner.create_semaphore()?),
        })
    }

    /// Create a swapchain. The headless device ignores the window handles and may be given none.
    pub fn create_swapchain(
        &self,
        window_handles: Option<&RhiWindowHandles>,
        swapchain_def: &RhiSwapchainDef,
    ) -> RhiResult<RhiSwapchain> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => {
                RhiSwapchain::Null(inner.create_swapchain(swapchain_def)?)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => {
                let window_handles =
                    window_handles.ok_or("a Vulkan swapchain needs a window to present into")?;
                RhiSwapchain::Vk(inner.create_swapchain(window_handles, swapchain_def)?)
            }
        })
    }

    /// Wait for the given fences to complete. If a fence is in an unsubmitted state, the fence is
    /// ignored.
    pub fn wait_for_fences(
        &self,
        fences: &[&RhiFence],
    ) -> RhiResult<()> {
        match self {
            RhiDeviceContext::Null(inner) => {
                let fences = fences
                    .iter()
                    .map(|x| x.null_fence().ok_or_else(|| backend_mismatch("fence")))
                    .collect::<RhiResult<Vec<_>>>()?;
                inner.wait_for_fences(&fences)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => {
                let fences = fences
                    .iter()
                    .map(|x| x.vk_fence().ok_or_else(|| backend_mismatch("fence")))
                    .collect::<RhiResult<Vec<_>>>()?;
                inner.wait_for_fences(&fences)
            }
        }
    }

    /// Wait for the device (all queues) to be idle
    pub fn wait_for_device_idle(&self) -> RhiResult<()> {
        match self {
            RhiDeviceContext::Null(inner) => inner.wait_for_device_idle(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.wait_for_device_idle(),
        }
    }

    /// Create a sampler
    pub fn create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSampler> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => RhiSampler::Null(inner.create_sampler(sampler_def)?),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiSampler::Vk(inner.create_sampler(sampler_def)?),
        })
    }

    /// Return a sampler with this definition, creating it the first time it is asked for.
    /// Samplers are small immutable objects, so identical definitions share one.
    pub fn get_or_create_sampler(
        &self,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<RhiSampler> {
        let sampler_cache = match self {
            RhiDeviceContext::Null(inner) => inner.sampler_cache(),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => inner.sampler_cache(),
        };

        sampler_cache.get_or_create(sampler_def, || self.create_sampler(sampler_def))
    }

    /// Create a texture
    pub fn create_texture(
        &self,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<RhiTexture> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => RhiTexture::Null(inner.create_texture(texture_def)?),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiTexture::Vk(inner.create_texture(texture_def)?),
        })
    }

    /// Create a buffer
    pub fn create_buffer(
        &self,
        buffer_def: &RhiBufferDef,
    ) -> RhiResult<RhiBuffer> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => RhiBuffer::Null(inner.create_buffer(buffer_def)?),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiBuffer::Vk(inner.create_buffer(buffer_def)?),
        })
    }

    /// Create a shader from a linked program. The program must have been compiled for this
    /// device's shader target.
    pub fn create_shader(
        &self,
        program: RhiShaderProgram,
    ) -> RhiResult<RhiShader> {
        program.validate()?;
        let expected_target = RhiShaderTarget::for_backend(self.backend_type());
        if program.target() != expected_target {
            return Err(RhiError::ShaderLink {
                name: program.name().to_string(),
                diagnostic: format!(
                    "compiled for {:?}, the device consumes {:?}",
                    program.target(),
                    expected_target
                ),
            });
        }

        Ok(match self {
            RhiDeviceContext::Null(inner) => RhiShader::Null(inner.create_shader(program)?),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => RhiShader::Vk(inner.create_shader(program)?),
        })
    }

    /// Create a graphics pipeline
    pub fn create_graphics_pipeline(
        &self,
        graphics_pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<RhiPipeline> {
        graphics_pipeline_def.verify(self.device_info())?;
        Ok(match self {
            RhiDeviceContext::Null(inner) => {
                RhiPipeline::Null(inner.create_graphics_pipeline(graphics_pipeline_def)?)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => {
                RhiPipeline::Vk(inner.create_graphics_pipeline(graphics_pipeline_def)?)
            }
        })
    }

    /// Create a compute pipeline
    pub fn create_compute_pipeline(
        &self,
        compute_pipeline_def: &RhiComputePipelineDef,
    ) -> RhiResult<RhiPipeline> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => {
                RhiPipeline::Null(inner.create_compute_pipeline(compute_pipeline_def)?)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => {
                RhiPipeline::Vk(inner.create_compute_pipeline(compute_pipeline_def)?)
            }
        })
    }

    /// Create a descriptor pool with fixed capacity
    pub fn create_descriptor_pool(
        &self,
        descriptor_pool_def: &RhiDescriptorPoolDef,
    ) -> RhiResult<RhiDescriptorPool> {
        Ok(match self {
            RhiDeviceContext::Null(inner) => {
                RhiDescriptorPool::Null(inner.create_descriptor_pool(descriptor_pool_def)?)
            }
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(inner) => {
                RhiDescriptorPool::Vk(inner.create_descriptor_pool(descriptor_pool_def)?)
            }
        })
    }

    /// Get the underlying headless device. This provides access to its execution statistics.
    pub fn null_device_context(&self) -> Option<&RhiDeviceContextNull> {
        match self {
            RhiDeviceContext::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiDeviceContext::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_device_context(&self) -> Option<&RhiDeviceContextVulkan> {
        match self {
            RhiDeviceContext::Null(_) => None,
            RhiDeviceContext::Vk(inner) => Some(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_guards() {
        let counters = Arc::new(RhiObjectCounters::default());
        let fence = counters.track(RhiObjectKind::Fence);
        let semaphore_a = counters.track(RhiObjectKind::Semaphore);
        let semaphore_b = counters.track(RhiObjectKind::Semaphore);
        assert_eq!(counters.snapshot().fences, 1);
        assert_eq!(counters.snapshot().semaphores, 2);

        drop(semaphore_a);
        drop(fence);
        let counts = counters.snapshot();
        assert_eq!(counts.fences, 0);
        assert_eq!(counts.semaphores, 1);

        drop(semaphore_b);
        assert_eq!(counters.snapshot(), RhiObjectCounts::default());
    }

    #[test]
    fn tracker_outlives_the_counters_owner() {
        let counters = Arc::new(RhiObjectCounters::default());
        let tracker = RhiObjectCountTracker::new(&counters);
        let buffer = counters.track(RhiObjectKind::Buffer);
        drop(counters);
        assert_eq!(tracker.counts().buffers, 1);
        drop(buffer);
        assert_eq!(tracker.counts().total(), 0);
    }
}
