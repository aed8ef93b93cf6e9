use super::RhiDeviceContextNull;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use std::sync::Arc;

#[derive(Debug)]
struct RhiSamplerNullInner {
    sampler_def: RhiSamplerDef,
    _count_guard: RhiObjectCountGuard,
}

#[derive(Clone, Debug)]
pub struct RhiSamplerNull {
    inner: Arc<RhiSamplerNullInner>,
}

impl RhiSamplerNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
        sampler_def: &RhiSamplerDef,
    ) -> RhiResult<Self> {
        if sampler_def.max_anisotropy < 0.0 {
            return Err("sampler max_anisotropy cannot be negative")?;
        }

        log::trace!("Sampler created {:?}", sampler_def);
        Ok(RhiSamplerNull {
            inner: Arc::new(RhiSamplerNullInner {
                sampler_def: sampler_def.clone(),
                _count_guard: device_context.counters().track(RhiObjectKind::Sampler),
            }),
        })
    }

    pub fn sampler_def(&self) -> &RhiSamplerDef {
        &self.inner.sampler_def
    }
}
