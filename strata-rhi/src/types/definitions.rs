use super::*;
use crate::{RhiResult, RhiShader};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use strata_base::DecimalF32;

/// How often the contents of a buffer change. Decides where its memory lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiBufferUpdateFrequency {
    /// Written once (through a staging copy), read many times. Device-local memory.
    Static,
    /// Rewritten by the CPU every frame. Host-visible, coherent memory.
    PerFrame,
}

impl RhiBufferUpdateFrequency {
    pub fn memory_usage(self) -> RhiMemoryUsage {
        match self {
            RhiBufferUpdateFrequency::Static => RhiMemoryUsage::GpuOnly,
            RhiBufferUpdateFrequency::PerFrame => RhiMemoryUsage::CpuToGpu,
        }
    }
}

/// Used to create a `RhiBuffer`
#[derive(Clone, Debug, PartialEq)]
pub struct RhiBufferDef {
    pub size: u64,
    pub memory_usage: RhiMemoryUsage,
    pub queue_type: RhiQueueType,
    pub resource_type: RhiResourceType,
    /// Keep the buffer mapped for its whole lifetime. Only meaningful for host-visible memory.
    pub always_mapped: bool,
}

impl Default for RhiBufferDef {
    fn default() -> Self {
        RhiBufferDef {
            size: 0,
            memory_usage: RhiMemoryUsage::Unknown,
            queue_type: RhiQueueType::Graphics,
            resource_type: RhiResourceType::UNDEFINED,
            always_mapped: false,
        }
    }
}

impl RhiBufferDef {
    pub fn verify(&self) -> RhiResult<()> {
        if self.size == 0 {
            return Err("buffer size must be greater than zero")?;
        }

        if self.memory_usage == RhiMemoryUsage::Unknown {
            return Err("buffer memory usage must be specified")?;
        }

        if self.always_mapped && !self.memory_usage.is_host_visible() {
            return Err(format!(
                "buffer with memory usage {:?} cannot be persistently mapped",
                self.memory_usage
            ))?;
        }

        Ok(())
    }

    /// A buffer with the given usage whose memory placement follows from how often it changes
    pub fn for_usage(
        size: u64,
        resource_type: RhiResourceType,
        update_frequency: RhiBufferUpdateFrequency,
    ) -> RhiBufferDef {
        RhiBufferDef {
            size,
            memory_usage: update_frequency.memory_usage(),
            queue_type: RhiQueueType::Graphics,
            resource_type,
            always_mapped: update_frequency == RhiBufferUpdateFrequency::PerFrame,
        }
    }

    pub fn for_vertex_buffer(
        size: u64,
        update_frequency: RhiBufferUpdateFrequency,
    ) -> RhiBufferDef {
        Self::for_usage(size, RhiResourceType::VERTEX_BUFFER, update_frequency)
    }

    pub fn for_index_buffer(
        size: u64,
        update_frequency: RhiBufferUpdateFrequency,
    ) -> RhiBufferDef {
        Self::for_usage(size, RhiResourceType::INDEX_BUFFER, update_frequency)
    }

    pub fn for_uniform_buffer(
        size: u64,
        update_frequency: RhiBufferUpdateFrequency,
    ) -> RhiBufferDef {
        Self::for_usage(size, RhiResourceType::UNIFORM_BUFFER, update_frequency)
    }

    pub fn for_staging_buffer(
        size: usize,
        resource_type: RhiResourceType,
    ) -> RhiBufferDef {
        RhiBufferDef {
            size: size as u64,
            memory_usage: RhiMemoryUsage::CpuToGpu,
            queue_type: RhiQueueType::Graphics,
            resource_type,
            always_mapped: false,
        }
    }

    pub fn for_staging_buffer_data<T: Copy>(
        data: &[T],
        resource_type: RhiResourceType,
    ) -> RhiBufferDef {
        Self::for_staging_buffer(strata_base::memory::slice_size_in_bytes(data), resource_type)
    }

    /// A buffer the GPU writes into and the CPU reads afterwards
    pub fn for_readback_buffer(size: u64) -> RhiBufferDef {
        RhiBufferDef {
            size,
            memory_usage: RhiMemoryUsage::GpuToCpu,
            queue_type: RhiQueueType::Graphics,
            resource_type: RhiResourceType::UNDEFINED,
            always_mapped: false,
        }
    }
}

/// Used to create a `RhiTexture`
#[derive(Clone, Debug, PartialEq)]
pub struct RhiTextureDef {
    pub extents: RhiExtents3D,
    /// Number of layers. 6 for cubemaps, usually 1 otherwise.
    pub array_length: u32,
    pub mip_count: u32,
    pub sample_count: RhiSampleCount,
    pub format: RhiFormat,
    pub resource_type: RhiResourceType,
}

impl Default for RhiTextureDef {
    fn default() -> Self {
        RhiTextureDef {
            extents: RhiExtents3D {
                width: 0,
                height: 0,
                depth: 0,
            },
            array_length: 1,
            mip_count: 1,
            sample_count: RhiSampleCount::SampleCount1,
            format: RhiFormat::UNDEFINED,
            resource_type: RhiResourceType::TEXTURE,
        }
    }
}

impl RhiTextureDef {
    /// A sampled 2d texture that is filled through an upload
    pub fn for_sampled_2d(
        width: u32,
        height: u32,
        format: RhiFormat,
    ) -> RhiTextureDef {
        RhiTextureDef {
            extents: RhiExtents3D {
                width,
                height,
                depth: 1,
            },
            format,
            resource_type: RhiResourceType::TEXTURE,
            ..Default::default()
        }
    }

    /// A 2d texture rendered into and then sampled or blitted
    pub fn for_render_target(
        extents: RhiExtents2D,
        format: RhiFormat,
    ) -> RhiTextureDef {
        let resource_type = if format.has_depth_or_stencil() {
            RhiResourceType::RENDER_TARGET_DEPTH_STENCIL
        } else {
            RhiResourceType::RENDER_TARGET_COLOR | RhiResourceType::TEXTURE
        };

        RhiTextureDef {
            extents: extents.to_3d(),
            format,
            resource_type,
            ..Default::default()
        }
    }

    pub fn verify(&self) -> RhiResult<()> {
        if self.extents.width == 0 || self.extents.height == 0 || self.extents.depth == 0 {
            return Err(format!(
                "texture extents must be non-zero, got {:?}",
                self.extents
            ))?;
        }

        if self.array_length == 0 || self.mip_count == 0 {
            return Err("texture array length and mip count must be non-zero")?;
        }

        if self.format == RhiFormat::UNDEFINED {
            return Err("texture format must be specified")?;
        }

        if self.mip_count > 1 && self.sample_count != RhiSampleCount::SampleCount1 {
            return Err("multisampled textures cannot have mips")?;
        }

        if self.resource_type.contains(RhiResourceType::TEXTURE_CUBE) && self.array_length % 6 != 0
        {
            return Err("cube textures need a multiple of 6 layers")?;
        }

        if self.format.has_depth()
            && self
                .resource_type
                .intersects(RhiResourceType::TEXTURE_READ_WRITE)
        {
            return Err("cannot use depth stencil as a storage image")?;
        }

        Ok(())
    }

    /// Bytes needed to hold mip 0 of one layer, tightly packed
    pub fn mip0_size_in_bytes(&self) -> u64 {
        self.extents.width as u64
            * self.extents.height as u64
            * self.extents.depth as u64
            * self.format.block_or_pixel_size_in_bytes() as u64
    }
}

/// Used to create a `RhiCommandPool`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RhiCommandPoolDef {
    /// Set to true if the command buffers allocated from the pool are expected to have very short
    /// lifetimes
    pub transient: bool,
}

/// Used to create a `RhiCommandBuffer`
#[derive(Debug, Clone, PartialEq)]
pub struct RhiCommandBufferDef {
    /// Secondary command buffers are recorded separately and executed from a primary one
    pub is_secondary: bool,
}

/// Used to create a `RhiSwapchain`
#[derive(Clone, Debug, PartialEq)]
pub struct RhiSwapchainDef {
    pub width: u32,
    pub height: u32,
    pub enable_vsync: bool,
    /// Number of images requested. The backend may create more if the surface requires it.
    pub image_count: u32,
}

impl RhiSwapchainDef {
    pub fn extents(&self) -> RhiExtents2D {
        RhiExtents2D::new(self.width, self.height)
    }
}

/// Used to create a `RhiSampler`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RhiSamplerDef {
    #[serde(default)]
    pub min_filter: RhiFilterType,
    #[serde(default)]
    pub mag_filter: RhiFilterType,
    #[serde(default)]
    pub mip_map_mode: RhiMipMapMode,
    #[serde(default)]
    pub address_mode_u: RhiAddressMode,
    #[serde(default)]
    pub address_mode_v: RhiAddressMode,
    #[serde(default)]
    pub address_mode_w: RhiAddressMode,
    #[serde(default)]
    pub mip_lod_bias: f32,
    #[serde(default)]
    pub max_anisotropy: f32,
    #[serde(default)]
    pub compare_op: RhiCompareOp,
    //NOTE: Custom hash impl, don't forget to add changes there too!
}

impl Eq for RhiSamplerDef {}

impl Hash for RhiSamplerDef {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        self.min_filter.hash(&mut state);
        self.mag_filter.hash(&mut state);
        self.mip_map_mode.hash(&mut state);
        self.address_mode_u.hash(&mut state);
        self.address_mode_v.hash(&mut state);
        self.address_mode_w.hash(&mut state);
        DecimalF32(self.mip_lod_bias).hash(&mut state);
        DecimalF32(self.max_anisotropy).hash(&mut state);
        self.compare_op.hash(&mut state);
    }
}

/// Depth testing and stencil usage. Commonly used to enable "Z-buffering".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhiDepthState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: RhiCompareOp,
    pub stencil_test_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
    pub front_depth_fail_op: RhiStencilOp,
    pub front_stencil_compare_op: RhiCompareOp,
    pub front_stencil_fail_op: RhiStencilOp,
    pub front_stencil_pass_op: RhiStencilOp,
    pub back_depth_fail_op: RhiStencilOp,
    pub back_stencil_compare_op: RhiCompareOp,
    pub back_stencil_fail_op: RhiStencilOp,
    pub back_stencil_pass_op: RhiStencilOp,
}

impl Default for RhiDepthState {
    fn default() -> Self {
        RhiDepthState {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: RhiCompareOp::LessOrEqual,
            stencil_test_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
            front_depth_fail_op: Default::default(),
            front_stencil_compare_op: RhiCompareOp::Always,
            front_stencil_fail_op: Default::default(),
            front_stencil_pass_op: Default::default(),
            back_depth_fail_op: Default::default(),
            back_stencil_compare_op: RhiCompareOp::Always,
            back_stencil_fail_op: Default::default(),
            back_stencil_pass_op: Default::default(),
        }
    }
}

impl RhiDepthState {
    /// Standard Z-buffering: test and write, nearer fragments win
    pub fn depth_test_and_write() -> Self {
        RhiDepthState {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: RhiCompareOp::Less,
            ..Default::default()
        }
    }
}

/// Rasterization, commonly used to enable backface culling or wireframe rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhiRasterizerState {
    pub cull_mode: RhiCullMode,
    pub front_face: RhiFrontFace,
    pub fill_mode: RhiFillMode,
    pub depth_bias: i32,
    pub depth_bias_slope_scaled: f32,
    pub depth_clamp_enable: bool,
    // Hash implemented manually below, don't forget to update it!
}

impl Eq for RhiRasterizerState {}

impl Hash for RhiRasterizerState {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        self.cull_mode.hash(&mut state);
        self.front_face.hash(&mut state);
        self.fill_mode.hash(&mut state);
        self.depth_bias.hash(&mut state);
        DecimalF32(self.depth_bias_slope_scaled).hash(&mut state);
        self.depth_clamp_enable.hash(&mut state);
    }
}

impl Default for RhiRasterizerState {
    fn default() -> Self {
        RhiRasterizerState {
            cull_mode: RhiCullMode::None,
            front_face: Default::default(),
            fill_mode: Default::default(),
            depth_bias: 0,
            depth_bias_slope_scaled: 0.0,
            depth_clamp_enable: false,
        }
    }
}

/// How a pixel shader's output is combined with the value it overwrites. One state applies to
/// every color attachment.
///
/// Blending is on only when `blend_enable` is set. The equation is kept either way so that a
/// later `set_blending(true)` has something to apply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhiBlendState {
    pub blend_enable: bool,
    pub equation: RhiBlendEquation,
    pub masks: RhiColorFlags,
}

impl Default for RhiBlendState {
    fn default() -> Self {
        Self::default_alpha_disabled()
    }
}

impl RhiBlendState {
    pub fn default_alpha_disabled() -> Self {
        RhiBlendState {
            blend_enable: false,
            equation: RhiBlendEquation::replace(),
            masks: RhiColorFlags::ALL,
        }
    }

    pub fn default_alpha_enabled() -> Self {
        RhiBlendState {
            blend_enable: true,
            equation: RhiBlendEquation::alpha_blend(),
            masks: RhiColorFlags::ALL,
        }
    }
}

/// Used to create a `RhiPipeline` for graphics operations
#[derive(Debug)]
pub struct RhiGraphicsPipelineDef<'a> {
    pub shader: &'a RhiShader,
    pub vertex_layout: &'a RhiVertexLayout,
    pub blend_state: &'a RhiBlendState,
    pub depth_state: &'a RhiDepthState,
    pub rasterizer_state: &'a RhiRasterizerState,
    pub primitive_topology: RhiPrimitiveTopology,
    pub color_formats: &'a [RhiFormat],
    pub depth_stencil_format: Option<RhiFormat>,
    pub sample_count: RhiSampleCount,
}

impl<'a> RhiGraphicsPipelineDef<'a> {
    pub fn verify(
        &self,
        device_info: &RhiDeviceInfo,
    ) -> RhiResult<()> {
        if self.color_formats.is_empty() && self.depth_stencil_format.is_none() {
            return Err("a graphics pipeline needs at least one color or depth attachment")?;
        }

        if let Some(depth_format) = self.depth_stencil_format {
            if !depth_format.has_depth_or_stencil() {
                return Err(format!(
                    "{:?} is not a depth/stencil format",
                    depth_format
                ))?;
            }
        }

        let attribute_count = self.vertex_layout.attributes().len() as u32;
        if attribute_count > device_info.max_vertex_attribute_count {
            return Err(format!(
                "vertex layout has {} attributes, device supports {}",
                attribute_count, device_info.max_vertex_attribute_count
            ))?;
        }

        Ok(())
    }
}

/// Used to create a `RhiPipeline` for compute operations
#[derive(Debug)]
pub struct RhiComputePipelineDef<'a> {
    pub shader: &'a RhiShader,
}

/// Capacity of a `RhiDescriptorPool`, per binding type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RhiDescriptorPoolDef {
    pub max_sets: u32,
    pub uniform_buffers: u32,
    pub storage_buffers: u32,
    pub sampled_textures: u32,
    pub storage_textures: u32,
    pub samplers: u32,
    pub combined_texture_samplers: u32,
    pub acceleration_structures: u32,
}

impl From<&crate::RhiDescriptorPoolConfig> for RhiDescriptorPoolDef {
    fn from(config: &crate::RhiDescriptorPoolConfig) -> Self {
        RhiDescriptorPoolDef {
            max_sets: config.max_sets,
            uniform_buffers: config.uniform_buffers,
            storage_buffers: config.storage_buffers,
            sampled_textures: config.sampled_textures,
            storage_textures: config.storage_textures,
            samplers: config.samplers,
            combined_texture_samplers: config.combined_texture_samplers,
            acceleration_structures: config.acceleration_structures,
        }
    }
}

impl RhiDescriptorPoolDef {
    pub fn verify(&self) -> RhiResult<()> {
        if self.max_sets == 0 {
            return Err("a descriptor pool must allow at least one set")?;
        }
        Ok(())
    }

    /// Capacity for one binding type
    pub fn capacity(
        &self,
        binding_type: crate::RhiBindingType,
    ) -> u32 {
        use crate::RhiBindingType;
        match binding_type {
            RhiBindingType::UniformBuffer => self.uniform_buffers,
            RhiBindingType::StorageBuffer => self.storage_buffers,
            RhiBindingType::SampledTexture => self.sampled_textures,
            RhiBindingType::StorageTexture => self.storage_textures,
            RhiBindingType::Sampler => self.samplers,
            RhiBindingType::CombinedImageSampler => self.combined_texture_samplers,
            RhiBindingType::AccelerationStructure => self.acceleration_structures,
        }
    }
}

bitflags::bitflags! {
    /// Semantics selected when a command buffer begins recording
    pub struct RhiCommandBufferBeginFlags: u32 {
        const NONE = 0;
        /// Submitted once, then re-begun before the next submit
        const ONE_TIME_SUBMIT = 1;
        /// The buffer is entirely inside a render pass begun by the primary that executes it.
        /// Only valid for secondary buffers.
        const RENDER_PASS_CONTINUE = 2;
        /// May be submitted again while a previous submission is still executing
        const SIMULTANEOUS_USE = 4;
    }
}

impl Default for RhiCommandBufferBeginFlags {
    fn default() -> Self {
        RhiCommandBufferBeginFlags::NONE
    }
}

/// What a secondary command buffer inherits from the render pass of the primary that executes it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RhiCommandBufferInheritance {
    pub color_formats: Vec<RhiFormat>,
    pub depth_stencil_format: Option<RhiFormat>,
    pub sample_count: RhiSampleCount,
}

/// Argument layout for `cmd_draw_indirect`, matches every backend's native struct
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RhiDrawIndirectCommand {
    pub vertex_count: u32,
    pub instance_count: u32,
    pub first_vertex: u32,
    pub first_instance: u32,
}

/// Argument layout for `cmd_draw_indexed_indirect`
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RhiDrawIndexedIndirectCommand {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub vertex_offset: i32,
    pub first_instance: u32,
}

/// Argument layout for `cmd_dispatch_indirect`
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RhiDispatchIndirectCommand {
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_frequency_decides_memory() {
        let def = RhiBufferDef::for_uniform_buffer(256, RhiBufferUpdateFrequency::PerFrame);
        assert_eq!(def.memory_usage, RhiMemoryUsage::CpuToGpu);
        assert!(def.always_mapped);
        assert!(def.verify().is_ok());

        let def = RhiBufferDef::for_vertex_buffer(36, RhiBufferUpdateFrequency::Static);
        assert_eq!(def.memory_usage, RhiMemoryUsage::GpuOnly);
        assert!(!def.always_mapped);
    }

    #[test]
    fn buffer_def_rejects_bad_values() {
        assert!(RhiBufferDef::default().verify().is_err());

        let mut def = RhiBufferDef::for_vertex_buffer(16, RhiBufferUpdateFrequency::Static);
        def.always_mapped = true;
        assert!(def.verify().is_err());
    }

    #[test]
    fn texture_def_rejects_bad_values() {
        assert!(RhiTextureDef::default().verify().is_err());
        assert!(RhiTextureDef::for_sampled_2d(256, 256, RhiFormat::R8G8B8A8_UNORM)
            .verify()
            .is_ok());

        let mut def = RhiTextureDef::for_render_target(
            RhiExtents2D::new(8, 8),
            RhiFormat::D32_SFLOAT,
        );
        assert!(def
            .resource_type
            .contains(RhiResourceType::RENDER_TARGET_DEPTH_STENCIL));
        def.resource_type |= RhiResourceType::TEXTURE_READ_WRITE;
        assert!(def.verify().is_err());
    }

    #[test]
    fn sampler_def_hash_matches_eq() {
        use std::collections::hash_map::DefaultHasher;

        let a = RhiSamplerDef {
            max_anisotropy: 16.0,
            ..Default::default()
        };
        let b = a.clone();

        let mut hasher_a = DefaultHasher::new();
        a.hash(&mut hasher_a);
        let mut hasher_b = DefaultHasher::new();
        b.hash(&mut hasher_b);
        assert_eq!(a, b);
        assert_eq!(hasher_a.finish(), hasher_b.finish());
    }
}
