use super::RhiDeviceContextNull;
use crate::device_context::{RhiObjectCountGuard, RhiObjectKind};
use crate::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct RhiTextureNullInner {
    texture_def: RhiTextureDef,
    // One tightly packed allocation per (layer, mip), layer major
    subresources: Mutex<Vec<Vec<u8>>>,
    state: Mutex<RhiResourceState>,
    debug_name: Mutex<Option<String>>,
    _count_guard: RhiObjectCountGuard,
}

/// A texture backed by host memory
#[derive(Clone, Debug)]
pub struct RhiTextureNull {
    inner: Arc<RhiTextureNullInner>,
}

impl PartialEq for RhiTextureNull {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl RhiTextureNull {
    pub(super) fn new(
        device_context: &RhiDeviceContextNull,
        texture_def: &RhiTextureDef,
    ) -> RhiResult<Self> {
        texture_def.verify()?;

        let bytes_per_texel = texture_def.format.block_or_pixel_size_in_bytes() as u64;
        let mut subresources =
            Vec::with_capacity((texture_def.array_length * texture_def.mip_count) as usize);
        for _ in 0..texture_def.array_length {
            for mip in 0..texture_def.mip_count {
                let extents = texture_def.extents.mip_extents(mip);
                let size = extents.width as u64
                    * extents.height as u64
                    * extents.depth as u64
                    * bytes_per_texel;
                subresources.push(vec![0u8; size as usize]);
            }
        }

        log::trace!(
            "Texture created {:?} {:?} layers: {} mips: {}",
            texture_def.extents,
            texture_def.format,
            texture_def.array_length,
            texture_def.mip_count
        );

        Ok(RhiTextureNull {
            inner: Arc::new(RhiTextureNullInner {
                texture_def: texture_def.clone(),
                subresources: Mutex::new(subresources),
                state: Mutex::new(RhiResourceState::UNDEFINED),
                debug_name: Mutex::new(None),
                _count_guard: device_context.counters().track(RhiObjectKind::Texture),
            }),
        })
    }

    pub fn texture_def(&self) -> &RhiTextureDef {
        &self.inner.texture_def
    }

    pub fn set_debug_name(
        &self,
        name: impl AsRef<str>,
    ) {
        *self.inner.debug_name.lock() = Some(name.as_ref().to_string());
    }

    /// The state the last executed barrier left the texture in
    pub fn resource_state(&self) -> RhiResourceState {
        *self.inner.state.lock()
    }

    fn subresource_index(
        &self,
        array_layer: u32,
        mip_level: u32,
    ) -> RhiResult<usize> {
        let texture_def = &self.inner.texture_def;
        if array_layer >= texture_def.array_length || mip_level >= texture_def.mip_count {
            return Err(format!(
                "subresource (layer {}, mip {}) is outside a texture with {} layers and {} mips",
                array_layer, mip_level, texture_def.array_length, texture_def.mip_count
            ))?;
        }

        Ok((array_layer * texture_def.mip_count + mip_level) as usize)
    }

    /// Run `f` over the texels of one subresource
    pub(super) fn with_subresource<R>(
        &self,
        array_layer: u32,
        mip_level: u32,
        f: impl FnOnce(&mut Vec<u8>) -> R,
    ) -> RhiResult<R> {
        let index = self.subresource_index(array_layer, mip_level)?;
        let mut subresources = self.inner.subresources.lock();
        Ok(f(&mut subresources[index]))
    }

    /// Run `f` over every subresource
    pub(super) fn with_all_subresources(
        &self,
        mut f: impl FnMut(&mut Vec<u8>),
    ) {
        for subresource in self.inner.subresources.lock().iter_mut() {
            f(subresource);
        }
    }

    pub(super) fn transition(
        &self,
        src_state: RhiResourceState,
        dst_state: RhiResourceState,
    ) {
        let mut state = self.inner.state.lock();
        if src_state != RhiResourceState::UNDEFINED && src_state != *state {
            log::warn!(
                "Texture barrier from {:?} but the texture is in {:?}",
                src_state,
                *state
            );
        }
        *state = dst_state;
    }
}
