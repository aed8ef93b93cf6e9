use super::RhiDeviceContextNull;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use std::sync::Arc;

#[derive(Debug)]
struct RhiPipelineNullInner {
    pipeline_type: RhiPipelineType,
    shader: RhiShader,
    graphics_state: Option<RhiGraphicsPipelineState>,
    _count_guard: RhiObjectCountGuard,
}

/// Baked pipeline state. The executor applies it on every bind.
#[derive(Clone, Debug)]
pub struct RhiPipelineNull {
    inner: Arc<RhiPipelineNullInner>,
}

impl RhiPipelineNull {
    pub(super) fn new_graphics_pipeline(
        device_context: &RhiDeviceContextNull,
        pipeline_def: &RhiGraphicsPipelineDef,
    ) -> RhiResult<Self> {
        if pipeline_def.shader.null_shader().is_none() {
            return Err("graphics pipeline shader was created by a different backend")?;
        }

        let graphics_state = RhiGraphicsPipelineState::from_def(pipeline_def)?;
        log::trace!(
            "Graphics pipeline created for shader {}",
            pipeline_def.shader.program().name()
        );

        Ok(RhiPipelineNull {
            inner: Arc::new(RhiPipelineNullInner {
                pipeline_type: RhiPipelineType::Graphics,
                shader: pipeline_def.shader.clone(),
                graphics_state: Some(graphics_state),
                _count_guard: device_context.counters().track(RhiObjectKind::Pipeline),
            }),
        })
    }

    pub(super) fn new_compute_pipeline(
        device_context: &RhiDeviceContextNull,
        pipeline_def: &RhiComputePipelineDef,
    ) -> RhiResult<Self> {
        if pipeline_def.shader.null_shader().is_none() {
            return Err("compute pipeline shader was created by a different backend")?;
        }

        if !pipeline_def.shader.program().is_compute() {
            return Err(format!(
                "shader {} has no compute stage",
                pipeline_def.shader.program().name()
            ))?;
        }

        log::trace!(
            "Compute pipeline created for shader {}",
            pipeline_def.shader.program().name()
        );

        Ok(RhiPipelineNull {
            inner: Arc::new(RhiPipelineNullInner {
                pipeline_type: RhiPipelineType::Compute,
                shader: pipeline_def.shader.clone(),
                graphics_state: None,
                _count_guard: device_context.counters().track(RhiObjectKind::Pipeline),
            }),
        })
    }

    pub fn pipeline_type(&self) -> RhiPipelineType {
        self.inner.pipeline_type
    }

    pub fn shader(&self) -> &RhiShader {
        &self.inner.shader
    }

    pub fn graphics_state(&self) -> Option<&RhiGraphicsPipelineState> {
        self.inner.graphics_state.as_ref()
    }
}
