use super::RhiDeviceContextNull;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use std::sync::Arc;

/// Recording only. The command list is executed by the device timeline after submission.
#[derive(Debug)]
pub struct RhiCommandBufferNull {
    recorder: Arc<RhiCommandRecorder>,
    _count_guard: RhiObjectCountGuard,
}

impl RhiCommandBufferNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
        recorder: Arc<RhiCommandRecorder>,
    ) -> Self {
        RhiCommandBufferNull {
            recorder,
            _count_guard: device_context
                .counters()
                .track(RhiObjectKind::CommandBuffer),
        }
    }

    pub fn recorder(&self) -> &RhiCommandRecorder {
        &self.recorder
    }

    pub(super) fn recorder_arc(&self) -> &Arc<RhiCommandRecorder> {
        &self.recorder
    }
}
