use super::RhiDeviceContextNull;
use crate::descriptor_set::{
    RhiDescriptorBudget, RhiDescriptorReservation, RhiDescriptorSetContents,
};
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct RhiDescriptorPoolNull {
    device_context: RhiDeviceContextNull,
    budget: Arc<RhiDescriptorBudget>,
    _count_guard: RhiObjectCountGuard,
}

impl std::fmt::Debug for RhiDescriptorPoolNull {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RhiDescriptorPoolNull")
            .field("pool_def", self.budget.pool_def())
            .field("available_sets", &self.budget.available_sets())
            .finish()
    }
}

impl RhiDescriptorPoolNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
        descriptor_pool_def: &RhiDescriptorPoolDef,
    ) -> RhiResult<Self> {
        descriptor_pool_def.verify()?;

        Ok(RhiDescriptorPoolNull {
            device_context: device_context.clone(),
            budget: RhiDescriptorBudget::new(descriptor_pool_def),
            _count_guard: device_context
                .counters()
                .track(RhiObjectKind::DescriptorPool),
        })
    }

    pub fn allocate_descriptor_set(
        &mut self,
        layout: RhiDescriptorSetLayoutDesc,
    ) -> RhiResult<RhiDescriptorSetNull> {
        self.device_context.check_device_lost()?;
        let reservation = self.budget.reserve(&layout)?;

        log::trace!(
            "Descriptor set {} allocated with {} bindings",
            layout.set_index,
            layout.bindings.len()
        );

        Ok(RhiDescriptorSetNull {
            inner: Arc::new(RhiDescriptorSetNullInner {
                contents: Mutex::new(RhiDescriptorSetContents::new(&layout)),
                layout,
                _reservation: reservation,
                _count_guard: self
                    .device_context
                    .counters()
                    .track(RhiObjectKind::DescriptorSet),
            }),
        })
    }

    pub(crate) fn budget(&self) -> &RhiDescriptorBudget {
        &self.budget
    }
}

#[derive(Debug)]
struct RhiDescriptorSetNullInner {
    layout: RhiDescriptorSetLayoutDesc,
    contents: Mutex<RhiDescriptorSetContents>,
    _reservation: RhiDescriptorReservation,
    _count_guard: RhiObjectCountGuard,
}

/// Descriptor writes land immediately, the executor reads them when a draw or dispatch runs
#[derive(Clone, Debug)]
pub struct RhiDescriptorSetNull {
    inner: Arc<RhiDescriptorSetNullInner>,
}

impl PartialEq for RhiDescriptorSetNull {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl RhiDescriptorSetNull {
    pub fn layout(&self) -> &RhiDescriptorSetLayoutDesc {
        &self.inner.layout
    }

    pub fn write(
        &self,
        binding: u32,
        array_index: u32,
        resource: RhiDescriptorResource,
    ) -> RhiResult<()> {
        self.inner
            .contents
            .lock()
            .write(&self.inner.layout, binding, array_index, resource)
    }

    pub fn unwritten_bindings(&self) -> Vec<u32> {
        self.inner
            .contents
            .lock()
            .unwritten_bindings(&self.inner.layout)
    }

    pub(super) fn resource(
        &self,
        binding: u32,
        array_index: u32,
    ) -> Option<RhiDescriptorResource> {
        self.inner
            .contents
            .lock()
            .resource(&self.inner.layout, binding, array_index)
            .cloned()
    }
}
