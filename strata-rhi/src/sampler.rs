use crate::backends::null::RhiSamplerNull;
#[cfg(feature = "rhi-vulkan")]
use crate::backends::vulkan::RhiSamplerVulkan;
use crate::{RhiResult, RhiSamplerDef};
use fnv::FnvHashMap;
use parking_lot::Mutex;

/// Configures how images will be sampled by the GPU
#[derive(Clone, Debug)]
pub enum RhiSampler {
    Null(RhiSamplerNull),
    #[cfg(feature = "rhi-vulkan")]
    Vk(RhiSamplerVulkan),
}

impl RhiSampler {
    pub fn sampler_def(&self) -> &RhiSamplerDef {
        match self {
            RhiSampler::Null(inner) => inner.sampler_def(),
            #[cfg(feature = "rhi-vulkan")]
            RhiSampler::Vk(inner) => inner.sampler_def(),
        }
    }

    pub fn null_sampler(&self) -> Option<&RhiSamplerNull> {
        match self {
            RhiSampler::Null(inner) => Some(inner),
            #[cfg(feature = "rhi-vulkan")]
            RhiSampler::Vk(_) => None,
        }
    }

    /// Get the underlying vulkan API object. This provides access to any internally created
    /// vulkan objects.
    #[cfg(feature = "rhi-vulkan")]
    pub fn vk_sampler(&self) -> Option<&RhiSamplerVulkan> {
        match self {
            RhiSampler::Null(_) => None,
            RhiSampler::Vk(inner) => Some(inner),
        }
    }
}

/// Samplers a device has handed out, keyed by definition
#[derive(Default)]
pub(crate) struct RhiSamplerCache {
    samplers: Mutex<FnvHashMap<RhiSamplerDef, RhiSampler>>,
}

impl RhiSamplerCache {
    pub(crate) fn get_or_create(
        &self,
        sampler_def: &RhiSamplerDef,
        create: impl FnOnce() -> RhiResult<RhiSampler>,
    ) -> RhiResult<RhiSampler> {
        let mut samplers = self.samplers.lock();
        if let Some(sampler) = samplers.get(sampler_def) {
            return Ok(sampler.clone());
        }

        let sampler = create()?;
        samplers.insert(sampler_def.clone(), sampler.clone());
        Ok(sampler)
    }

    pub(crate) fn len(&self) -> usize {
        self.samplers.lock().len()
    }

    /// Drop every cached sampler. Callers that still hold one keep it alive.
    pub(crate) fn clear(&self) {
        self.samplers.lock().clear();
    }
}
