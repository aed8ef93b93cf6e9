use crate::{RhiDeviceContext, RhiResult};
use std::collections::VecDeque;
use std::num::Wrapping;

struct RhiResourceInFlight<T> {
    resource: T,
    live_until_frame: Wrapping<u32>,
}

/// Holds resources retired during a frame until every frame that may still reference them has
/// had its fence observed signaled. Dropping a handle frees it, so releasing a resource here just
/// means dropping the last clone the sink holds.
///
/// Keep in mind that if you retire one resource per frame, up to N+1 resources will exist in the
/// sink: one retired this frame and not submitted yet, plus one per frame in flight.
pub struct RhiResourceDropSink<T> {
    // Every resource lives for the same number of frames, so the front always drains first
    resources_in_flight: VecDeque<RhiResourceInFlight<T>>,
    max_in_flight_frames: Wrapping<u32>,
    // Incremented by on_frame_complete
    frame_index: Wrapping<u32>,
}

impl<T> RhiResourceDropSink<T> {
    pub fn new(max_in_flight_frames: u32) -> Self {
        RhiResourceDropSink {
            resources_in_flight: Default::default(),
            max_in_flight_frames: Wrapping(max_in_flight_frames),
            frame_index: Wrapping(0),
        }
    }

    /// Schedule the resource to drop once the frames now in flight have completed
    pub fn retire(
        &mut self,
        resource: T,
    ) {
        self.resources_in_flight.push_back(RhiResourceInFlight {
            resource,
            live_until_frame: self.frame_index + self.max_in_flight_frames + Wrapping(1),
        });
    }

    /// Resources waiting to drop
    pub fn len(&self) -> usize {
        self.resources_in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources_in_flight.is_empty()
    }

    /// Call after a frame's fence has been observed signaled
    pub fn on_frame_complete(&mut self) {
        self.frame_index += Wrapping(1);

        let mut resources_to_drop = 0;
        for resource_in_flight in &self.resources_in_flight {
            // Once frame_index reaches live_until_frame the difference wraps to a huge value
            if resource_in_flight.live_until_frame - self.frame_index > Wrapping(u32::MAX / 2)
                || resource_in_flight.live_until_frame == self.frame_index
            {
                resources_to_drop += 1;
            } else {
                break;
            }
        }

        if resources_to_drop > 0 {
            log::trace!("Drop sink releasing {} resources", resources_to_drop);
            self.resources_in_flight.drain(0..resources_to_drop);
        }
    }

    /// Wait for the device to go idle, then drop everything
    pub fn destroy(
        &mut self,
        device_context: &RhiDeviceContext,
    ) -> RhiResult<()> {
        device_context.wait_for_device_idle()?;
        self.resources_in_flight.clear();
        Ok(())
    }
}

impl<T> Drop for RhiResourceDropSink<T> {
    fn drop(&mut self) {
        if !self.resources_in_flight.is_empty() {
            log::warn!(
                "Drop sink dropped with {} resources still waiting on in-flight frames",
                self.resources_in_flight.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn resources_live_for_in_flight_frames() {
        let mut sink = RhiResourceDropSink::new(2);
        let resource = Arc::new(5);
        sink.retire(resource.clone());
        assert_eq!(Arc::strong_count(&resource), 2);

        sink.on_frame_complete();
        sink.on_frame_complete();
        assert_eq!(Arc::strong_count(&resource), 2);

        sink.on_frame_complete();
        assert_eq!(Arc::strong_count(&resource), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn later_retirements_outlive_earlier_ones() {
        let mut sink = RhiResourceDropSink::new(1);
        let first = Arc::new(1);
        let second = Arc::new(2);
        sink.retire(first.clone());
        sink.on_frame_complete();
        sink.retire(second.clone());

        sink.on_frame_complete();
        assert_eq!(Arc::strong_count(&first), 1);
        assert_eq!(Arc::strong_count(&second), 2);
        assert_eq!(sink.len(), 1);

        sink.on_frame_complete();
        assert_eq!(Arc::strong_count(&second), 1);
    }
}
