use super::RhiDeviceContextNull;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum NullFenceState {
    Unsubmitted,
    /// Signaled when the timeline executes the submission with this id
    Incomplete(u64),
    Complete,
}

/// Shared between a fence and the submission that signals it
pub(super) type NullFenceSignal = Arc<Mutex<NullFenceState>>;

pub struct RhiFenceNull {
    device_context: RhiDeviceContextNull,
    state: NullFenceSignal,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiFenceNull {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiFenceNull")
            .field("state", &*self.state.lock())
            .finish()
    }
}

impl RhiFenceNull {
    pub(super) fn new(device_context: &RhiDeviceContextNull) -> RhiResult<Self> {
        Ok(RhiFenceNull {
            device_context: device_context.clone(),
            state: Arc::new(Mutex::new(NullFenceState::Unsubmitted)),
            _count_guard: device_context.counters().track(RhiObjectKind::Fence),
        })
    }

    /// Does not execute anything. A submission that has not been waited on reports Incomplete.
    pub fn get_fence_status(&self) -> RhiResult<RhiFenceStatus> {
        self.device_context.check_device_lost()?;
        let mut state = self.state.lock();
        Ok(match *state {
            NullFenceState::Unsubmitted => RhiFenceStatus::Unsubmitted,
            NullFenceState::Incomplete(_) => RhiFenceStatus::Incomplete,
            NullFenceState::Complete => {
                *state = NullFenceState::Unsubmitted;
                RhiFenceStatus::Complete
            }
        })
    }

    pub fn wait(&self) -> RhiResult<()> {
        self.wait_timeout(self.device_context.api_def().fence_timeout())
    }

    /// Executes the timeline through the fence's submission. Execution is synchronous here, so the
    /// timeout can never elapse.
    pub fn wait_timeout(
        &self,
        _timeout: Duration,
    ) -> RhiResult<()> {
        self.device_context.wait_for_fences(&[self])
    }

    pub(super) fn submission_id(&self) -> Option<u64> {
        match *self.state.lock() {
            NullFenceState::Incomplete(id) => Some(id),
            _ => None,
        }
    }

    pub(super) fn reset_after_wait(&self) {
        let mut state = self.state.lock();
        if *state == NullFenceState::Complete {
            *state = NullFenceState::Unsubmitted;
        }
    }

    /// A fence can only guard one submission at a time
    pub(super) fn check_submittable(&self) -> RhiResult<()> {
        if let NullFenceState::Incomplete(id) = *self.state.lock() {
            return Err(format!(
                "fence is still guarding submission {}, wait on it before submitting it again",
                id
            ))?;
        }
        Ok(())
    }

    pub(super) fn signal(&self) -> NullFenceSignal {
        self.state.clone()
    }

    /// Complete right away, for operations that finish on the CPU
    pub(super) fn signal_now(&self) -> RhiResult<()> {
        self.check_submittable()?;
        *self.state.lock() = NullFenceState::Complete;
        Ok(())
    }
}
