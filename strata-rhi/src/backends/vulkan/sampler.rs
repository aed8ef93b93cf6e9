use super::RhiDeviceContextVulkan;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use ash::vk;
use std::sync::Arc;

struct RhiSamplerVulkanInner {
    device_context: RhiDeviceContextVulkan,
    sampler_def: RhiSamplerDef,
    sampler: vk::Sampler,
    _count_guard: RhiObjectCountGuard,
}

impl Drop for RhiSamplerVulkanInner {
    fn drop(&mut self) {
        unsafe {
            self.device_context
                .device()
                .destroy_sampler(self.sampler, None);
        }
    }
}

#[derive(Clone)]
pub struct RhiSamplerVulkan {
    inner: Arc<RhiSamplerVulkanInner>,
}

impl std::fmt::Debug for RhiSamplerVulkan {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiSamplerVulkan")
            .field("sampler", &self.inner.sampler)
            .field("sampler_def", &self.inner.sampler_def)
            .finish()
    }
}

impl RhiSamplerVulkan {
    pub(super) fn new(
        device_context: &RhiDeviceContextVulkan,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<Self> {
        if sampler_def.max_anisotropy < 0.0 {
            return Err("sampler max_anisotropy cannot be negative")?;
        }

        let anisotropy_enable =
            sampler_def.max_anisotropy > 0.0 && device_context.supports_sampler_anisotropy();
        let compare_enable = sampler_def.compare_op != RhiCompareOp::Never;

        let sampler_create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(sampler_def.mag_filter.into())
            .min_filter(sampler_def.min_filter.into())
            .address_mode_u(sampler_def.address_mode_u.into())
            .address_mode_v(sampler_def.address_mode_v.into())
            .address_mode_w(sampler_def.address_mode_w.into())
            .anisotropy_enable(anisotropy_enable)
            .max_anisotropy(sampler_def.max_anisotropy)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(compare_enable)
            .compare_op(sampler_def.compare_op.into())
            .mipmap_mode(sampler_def.mip_map_mode.into())
            .mip_lod_bias(sampler_def.mip_lod_bias)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE);

        let sampler = unsafe {
            device_context
                .device()
                .create_sampler(&sampler_create_info, None)?
        };

        log::trace!("Sampler {:?} created {:?}", sampler, sampler_def);
        Ok(RhiSamplerVulkan {
            inner: Arc::new(RhiSamplerVulkanInner {
                device_context: device_context.clone(),
                sampler_def: sampler_def.clone(),
                sampler,
                _count_guard: device_context.counters().track(RhiObjectKind::Sampler),
            }),
        })
    }

    pub fn vk_sampler(&self) -> vk::Sampler {
        self.inner.sampler
    }

    pub fn sampler_def(&self) -> &RhiSamplerDef {
        &self.inner.sampler_def
    }
}
