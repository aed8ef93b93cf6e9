use super::RhiDeviceContextNull;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use std::sync::Arc;

#[derive(Debug)]
struct RhiShaderNullInner {
    program: RhiShaderProgram,
    _count_guard: RhiObjectCountGuard,
}

/// A linked program. The headless device keeps the SPIR-V but never runs it.
#[derive(Clone, Debug)]
pub struct RhiShaderNull {
    inner: Arc<RhiShaderNullInner>,
}

impl RhiShaderNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
        program: RhiShaderProgram,
    ) -> RhiResult<Self> {
        for stage in program.stages() {
            if stage.bytecode.spirv().map(|x| x.is_empty()).unwrap_or(true) {
                log::warn!(
                    "Shader {} stage {:?} has no SPIR-V, it could not run on a real device",
                    program.name(),
                    stage.stage
                );
            }
        }

        log::trace!(
            "Shader {} created with stages {:?}",
            program.name(),
            program.shader_stages()
        );

        Ok(RhiShaderNull {
            inner: Arc::new(RhiShaderNullInner {
                program,
                _count_guard: device_context.counters().track(RhiObjectKind::Shader),
            }),
        })
    }

    pub fn program(&self) -> &RhiShaderProgram {
        &self.inner.program
    }
}
