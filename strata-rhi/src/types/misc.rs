use crate::{RhiBuffer, RhiTexture};
use serde::{Deserialize, Serialize};
use strata_base::DecimalF32;
use std::hash::{Hash, Hasher};

/// Limits and optional capabilities of the device the backend selected
#[derive(Clone, Debug)]
pub struct RhiDeviceInfo {
    pub adapter_name: String,
    pub vendor_id: u32,
    pub is_discrete_gpu: bool,

    pub min_uniform_buffer_offset_alignment: u32,
    pub min_storage_buffer_offset_alignment: u32,
    pub upload_buffer_texture_alignment: u32,
    pub upload_buffer_texture_row_alignment: u32,
    pub max_vertex_attribute_count: u32,
    pub max_push_constant_size: u32,

    /// Cull mode and depth compare op can be changed without rebinding a pipeline
    pub supports_extended_dynamic_state: bool,
    /// Blend enable and blend equation can be changed without rebinding a pipeline
    pub supports_dynamic_blend_state: bool,
}

/// Which kind of queue to use. Work on the same queue executes in submission order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RhiQueueType {
    Graphics,
    Compute,
    Transfer,
}

bitflags::bitflags! {
    /// The state a resource must be in for an operation to read or write it. Resources are moved
    /// between states with barriers.
    pub struct RhiResourceState: u32 {
        const UNDEFINED = 0;
        const VERTEX_AND_CONSTANT_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
        /// COLOR_ATTACHMENT_OPTIMAL in vulkan terms
        const RENDER_TARGET = 0x4;
        const UNORDERED_ACCESS = 0x8;
        const DEPTH_WRITE = 0x10;
        const DEPTH_READ = 0x20;
        const NON_PIXEL_SHADER_RESOURCE = 0x40;
        const PIXEL_SHADER_RESOURCE = 0x80;
        /// SHADER_READ_ONLY_OPTIMAL in vulkan terms
        const SHADER_RESOURCE = 0x40 | 0x80;
        const INDIRECT_ARGUMENT = 0x200;
        /// TRANSFER_DST_OPTIMAL in vulkan terms
        const COPY_DST = 0x400;
        /// TRANSFER_SRC_OPTIMAL in vulkan terms
        const COPY_SRC = 0x800;
        const GENERIC_READ = 0x1 | 0x2 | 0x40 | 0x80 | 0x200 | 0x800;
        /// PRESENT_SRC_KHR in vulkan terms
        const PRESENT = 0x1000;
        const COMMON = 0x2000;
    }
}

/// A 2d size for windows, textures, etc.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhiExtents2D {
    pub width: u32,
    pub height: u32,
}

impl RhiExtents2D {
    pub fn new(
        width: u32,
        height: u32,
    ) -> Self {
        RhiExtents2D { width, height }
    }

    /// A window with no area (usually minimized) can't be presented to
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn to_3d(self) -> RhiExtents3D {
        RhiExtents3D {
            width: self.width,
            height: self.height,
            depth: 1,
        }
    }
}

/// A 3d size for textures
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RhiExtents3D {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl RhiExtents3D {
    pub fn to_2d(self) -> RhiExtents2D {
        RhiExtents2D {
            width: self.width,
            height: self.height,
        }
    }

    /// Extents of the given mip level, never smaller than 1 texel in any dimension
    pub fn mip_extents(
        self,
        mip_level: u32,
    ) -> RhiExtents3D {
        RhiExtents3D {
            width: (self.width >> mip_level).max(1),
            height: (self.height >> mip_level).max(1),
            depth: (self.depth >> mip_level).max(1),
        }
    }
}

/// Number of MSAA samples
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiSampleCount {
    SampleCount1,
    SampleCount2,
    SampleCount4,
    SampleCount8,
    SampleCount16,
}

impl Default for RhiSampleCount {
    fn default() -> Self {
        RhiSampleCount::SampleCount1
    }
}

bitflags::bitflags! {
    /// How a buffer or texture will be used. Several flags may be combined.
    #[derive(Default, Serialize, Deserialize)]
    pub struct RhiResourceType: u32 {
        const UNDEFINED = 0;
        /// Sampled image
        const TEXTURE = 1<<1;
        /// Storage image
        const TEXTURE_READ_WRITE = 1<<2;
        /// Read-only storage buffer
        const BUFFER = 1<<3;
        const BUFFER_READ_WRITE = 1<<5;
        const UNIFORM_BUFFER = 1<<7;
        const VERTEX_BUFFER = 1<<9;
        const INDEX_BUFFER = 1<<10;
        const INDIRECT_BUFFER = 1<<11;
        const TEXTURE_CUBE = 1<<12 | RhiResourceType::TEXTURE.bits;
        /// May be used as a color attachment in a render pass
        const RENDER_TARGET_COLOR = 1<<23;
        /// May be used as a depth/stencil attachment in a render pass
        const RENDER_TARGET_DEPTH_STENCIL = 1<<24;
    }
}

impl RhiResourceType {
    pub fn is_uniform_buffer(self) -> bool {
        self.intersects(RhiResourceType::UNIFORM_BUFFER)
    }

    pub fn is_storage_buffer(self) -> bool {
        self.intersects(RhiResourceType::BUFFER | RhiResourceType::BUFFER_READ_WRITE)
    }

    pub fn is_render_target(self) -> bool {
        self.intersects(
            RhiResourceType::RENDER_TARGET_COLOR | RhiResourceType::RENDER_TARGET_DEPTH_STENCIL,
        )
    }

    pub fn is_texture(self) -> bool {
        self.intersects(RhiResourceType::TEXTURE | RhiResourceType::TEXTURE_READ_WRITE)
    }
}

bitflags::bitflags! {
    /// Color channels written by a blend target
    #[derive(Serialize, Deserialize)]
    pub struct RhiColorFlags: u8 {
        const RED = 1;
        const GREEN = 2;
        const BLUE = 4;
        const ALPHA = 8;
        const ALL = 0x0F;
    }
}

impl Default for RhiColorFlags {
    fn default() -> Self {
        RhiColorFlags::ALL
    }
}

/// Where memory for a resource lives and who touches it
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RhiMemoryUsage {
    Unknown,

    /// Device-local, only the GPU reads and writes it. Filled through a staging copy.
    GpuOnly,

    /// Host-visible, the CPU only
    CpuOnly,

    /// Host-visible and coherent. Written by the CPU every frame, read by the GPU.
    CpuToGpu,

    /// Written by the GPU, read back by the CPU
    GpuToCpu,
}

impl RhiMemoryUsage {
    pub fn is_host_visible(self) -> bool {
        match self {
            RhiMemoryUsage::CpuOnly | RhiMemoryUsage::CpuToGpu | RhiMemoryUsage::GpuToCpu => true,
            RhiMemoryUsage::Unknown | RhiMemoryUsage::GpuOnly => false,
        }
    }
}

/// How a swapchain hands finished images to the display
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RhiPresentMode {
    /// Waits for vertical blank, never tears. Always supported.
    Fifo,
    /// Waits for vertical blank unless the frame is late
    FifoRelaxed,
    /// Replaces the queued image, never tears, lowest latency without tearing
    Mailbox,
    /// No waiting, may tear
    Immediate,
}

impl RhiPresentMode {
    /// Present modes to try in order. The first one supported by the surface wins and FIFO is
    /// always the last resort.
    pub fn preference_order(enable_vsync: bool) -> &'static [RhiPresentMode] {
        if enable_vsync {
            &[RhiPresentMode::Fifo]
        } else {
            &[
                RhiPresentMode::Mailbox,
                RhiPresentMode::Immediate,
                RhiPresentMode::FifoRelaxed,
                RhiPresentMode::Fifo,
            ]
        }
    }
}

/// The result of presenting a swapchain image, for the outcomes that are not errors
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RhiPresentSuccessResult {
    /// The image was shown and the swapchain can continue to be used.
    Success,

    /// The image was shown, but the swapchain no longer matches the surface exactly and should be
    /// rebuilt when convenient
    SuccessSuboptimal,

    // An "error" returned as success: it is expected and recoverable, unlike the errors that `?`
    // should bail out on
    /// The swapchain can no longer be used and must be rebuilt
    OutOfDate,
}

/// Indicates the current state of a fence.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RhiFenceStatus {
    /// The GPU finished the work the fence was submitted with
    Complete,
    /// Submitted and not finished yet
    Incomplete,
    /// Never submitted, or already reported `Complete` once since its last submission
    Unsubmitted,
}

bitflags::bitflags! {
    /// One stage of a shader, or a set of stages
    #[derive(Default, Serialize, Deserialize)]
    pub struct RhiShaderStageFlags : u32 {
        const NONE = 0;
        const VERTEX = 1;
        const TESSELLATION_CONTROL = 2;
        const TESSELLATION_EVALUATION = 4;
        const GEOMETRY = 8;
        const FRAGMENT = 16;
        const COMPUTE = 32;
        const RAYGEN = 64;
        const TASK = 128;
        const MESH = 256;
        const ALL_GRAPHICS = 0x1F;
        const ALL = 0x1FF;
    }
}

/// Every individual stage, in pipeline order
pub const ALL_SHADER_STAGE_FLAGS: [RhiShaderStageFlags; 9] = [
    RhiShaderStageFlags::VERTEX,
    RhiShaderStageFlags::TESSELLATION_CONTROL,
    RhiShaderStageFlags::TESSELLATION_EVALUATION,
    RhiShaderStageFlags::GEOMETRY,
    RhiShaderStageFlags::FRAGMENT,
    RhiShaderStageFlags::COMPUTE,
    RhiShaderStageFlags::RAYGEN,
    RhiShaderStageFlags::TASK,
    RhiShaderStageFlags::MESH,
];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum RhiPipelineType {
    Graphics = 0,
    Compute = 1,
}

/// Whether a vertex buffer advances per vertex or per instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RhiVertexAttributeRate {
    Vertex,
    Instance,
}

impl Default for RhiVertexAttributeRate {
    fn default() -> Self {
        RhiVertexAttributeRate::Vertex
    }
}

/// What an attachment contains when a render pass begins
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum RhiLoadOp {
    DontCare,
    Load,
    Clear,
}

impl Default for RhiLoadOp {
    fn default() -> Self {
        RhiLoadOp::DontCare
    }
}

/// Whether an attachment keeps what was rendered into it after the render pass
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum RhiStoreOp {
    DontCare,
    Store,
}

impl Default for RhiStoreOp {
    fn default() -> Self {
        RhiStoreOp::Store
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiPrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    PatchList,
}

impl Default for RhiPrimitiveTopology {
    fn default() -> Self {
        RhiPrimitiveTopology::TriangleList
    }
}

/// The size of index buffer elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RhiIndexType {
    Uint32,
    Uint16,
}

impl Default for RhiIndexType {
    fn default() -> Self {
        RhiIndexType::Uint32
    }
}

impl RhiIndexType {
    pub fn size_in_bytes(self) -> u64 {
        match self {
            RhiIndexType::Uint32 => 4,
            RhiIndexType::Uint16 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiBlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcAlphaSaturate,
    ConstantColor,
    OneMinusConstantColor,
}

impl Default for RhiBlendFactor {
    fn default() -> Self {
        RhiBlendFactor::Zero
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiBlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl Default for RhiBlendOp {
    fn default() -> Self {
        RhiBlendOp::Add
    }
}

/// Factors and operators for color and alpha. Applied only while blending is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhiBlendEquation {
    pub src_factor: RhiBlendFactor,
    pub dst_factor: RhiBlendFactor,
    pub blend_op: RhiBlendOp,
    pub src_factor_alpha: RhiBlendFactor,
    pub dst_factor_alpha: RhiBlendFactor,
    pub blend_op_alpha: RhiBlendOp,
}

impl Default for RhiBlendEquation {
    fn default() -> Self {
        RhiBlendEquation::replace()
    }
}

impl RhiBlendEquation {
    /// Source overwrites destination
    pub fn replace() -> Self {
        RhiBlendEquation {
            src_factor: RhiBlendFactor::One,
            dst_factor: RhiBlendFactor::Zero,
            blend_op: RhiBlendOp::Add,
            src_factor_alpha: RhiBlendFactor::One,
            dst_factor_alpha: RhiBlendFactor::Zero,
            blend_op_alpha: RhiBlendOp::Add,
        }
    }

    /// Classic "over" alpha blending
    pub fn alpha_blend() -> Self {
        RhiBlendEquation {
            src_factor: RhiBlendFactor::SrcAlpha,
            dst_factor: RhiBlendFactor::OneMinusSrcAlpha,
            blend_op: RhiBlendOp::Add,
            src_factor_alpha: RhiBlendFactor::One,
            dst_factor_alpha: RhiBlendFactor::OneMinusSrcAlpha,
            blend_op_alpha: RhiBlendOp::Add,
        }
    }

    /// Same factors and operator for color and alpha
    pub fn uniform(
        src_factor: RhiBlendFactor,
        dst_factor: RhiBlendFactor,
        blend_op: RhiBlendOp,
    ) -> Self {
        RhiBlendEquation {
            src_factor,
            dst_factor,
            blend_op,
            src_factor_alpha: src_factor,
            dst_factor_alpha: dst_factor,
            blend_op_alpha: blend_op,
        }
    }
}

/// Used for depth testing and sampler comparison
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiCompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

impl Default for RhiCompareOp {
    fn default() -> Self {
        RhiCompareOp::Never
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiStencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

impl Default for RhiStencilOp {
    fn default() -> Self {
        RhiStencilOp::Keep
    }
}

/// Which facing of polygons to discard. Facing is decided by `RhiFrontFace`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiCullMode {
    None,
    Back,
    Front,
    FrontAndBack,
}

impl Default for RhiCullMode {
    fn default() -> Self {
        RhiCullMode::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiFrontFace {
    CounterClockwise,
    Clockwise,
}

impl Default for RhiFrontFace {
    fn default() -> Self {
        RhiFrontFace::CounterClockwise
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiFillMode {
    Solid,
    Wireframe,
}

impl Default for RhiFillMode {
    fn default() -> Self {
        RhiFillMode::Solid
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiFilterType {
    Nearest,
    Linear,
}

impl Default for RhiFilterType {
    fn default() -> Self {
        RhiFilterType::Linear
    }
}

/// Sampling behavior for coordinates outside [0, 1]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiAddressMode {
    Mirror,
    Repeat,
    ClampToEdge,
    ClampToBorder,
}

impl Default for RhiAddressMode {
    fn default() -> Self {
        RhiAddressMode::Repeat
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiMipMapMode {
    Nearest,
    Linear,
}

impl Default for RhiMipMapMode {
    fn default() -> Self {
        RhiMipMapMode::Linear
    }
}

/// A clear value for color attachments
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RhiColorClearValue(pub [f32; 4]);

impl Hash for RhiColorClearValue {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        for &value in &self.0 {
            DecimalF32(value).hash(&mut state);
        }
    }
}

/// Clear values for depth/stencil attachments. Which ones are used depends on the format.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RhiDepthStencilClearValue {
    pub depth: f32,
    pub stencil: u32,
}

impl Default for RhiDepthStencilClearValue {
    fn default() -> Self {
        RhiDepthStencilClearValue {
            depth: 1.0,
            stencil: 0,
        }
    }
}

impl Hash for RhiDepthStencilClearValue {
    fn hash<H: Hasher>(
        &self,
        mut state: &mut H,
    ) {
        DecimalF32(self.depth).hash(&mut state);
        self.stencil.hash(&mut state);
    }
}

/// Moves a buffer from one resource state to another
pub struct RhiBufferBarrier<'a> {
    pub buffer: &'a RhiBuffer,
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
}

/// Moves a texture (or one subresource of it) from one resource state to another
pub struct RhiTextureBarrier<'a> {
    pub texture: &'a RhiTexture,
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
    /// If set, only the specified array element is included
    pub array_slice: Option<u16>,
    /// If set, only the specified mip level is included
    pub mip_slice: Option<u8>,
}

impl<'a> RhiTextureBarrier<'a> {
    /// Creates a simple state transition
    pub fn state_transition(
        texture: &'a RhiTexture,
        src_state: RhiResourceState,
        dst_state: RhiResourceState,
    ) -> RhiTextureBarrier<'a> {
        RhiTextureBarrier {
            texture,
            src_state,
            dst_state,
            array_slice: None,
            mip_slice: None,
        }
    }
}

impl<'a> RhiBufferBarrier<'a> {
    pub fn state_transition(
        buffer: &'a RhiBuffer,
        src_state: RhiResourceState,
        dst_state: RhiResourceState,
    ) -> RhiBufferBarrier<'a> {
        RhiBufferBarrier {
            buffer,
            src_state,
            dst_state,
        }
    }
}

/// An image owned by the swapchain, returned by acquire
#[derive(Clone, Debug)]
pub struct RhiSwapchainImage {
    pub texture: RhiTexture,
    pub swapchain_image_index: u32,
}

/// A color attachment bound for the duration of a render pass
#[derive(Debug)]
pub struct RhiColorRenderTargetBinding<'a> {
    pub texture: &'a RhiTexture,
    pub load_op: RhiLoadOp,
    pub store_op: RhiStoreOp,
    pub clear_value: RhiColorClearValue,
}

/// A depth/stencil attachment bound for the duration of a render pass
#[derive(Debug)]
pub struct RhiDepthStencilRenderTargetBinding<'a> {
    pub texture: &'a RhiTexture,
    pub depth_load_op: RhiLoadOp,
    pub stencil_load_op: RhiLoadOp,
    pub depth_store_op: RhiStoreOp,
    pub stencil_store_op: RhiStoreOp,
    pub clear_value: RhiDepthStencilClearValue,
}

pub struct RhiVertexBufferBinding<'a> {
    pub buffer: &'a RhiBuffer,
    pub byte_offset: u64,
}

pub struct RhiIndexBufferBinding<'a> {
    pub buffer: &'a RhiBuffer,
    pub byte_offset: u64,
    pub index_type: RhiIndexType,
}

/// Where in a buffer texel data begins and which subresource it belongs to
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RhiCmdCopyBufferToTextureParams {
    pub buffer_offset: u64,
    pub array_layer: u16,
    pub mip_level: u8,
}

/// Regions and states for scaling one texture into another. Used to copy a render target into an
/// image owned by someone else (an editor viewport, a thumbnail).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RhiCmdBlitParams {
    pub src_state: RhiResourceState,
    pub dst_state: RhiResourceState,
    pub src_extents: [RhiExtents3D; 2],
    pub dst_extents: [RhiExtents3D; 2],
    pub src_mip_level: u8,
    pub dst_mip_level: u8,
    pub filter: RhiFilterType,
}

/// Viewport rectangle and depth range
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RhiViewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub depth_min: f32,
    pub depth_max: f32,
}

impl RhiViewport {
    pub fn from_extents(extents: RhiExtents2D) -> Self {
        RhiViewport {
            x: 0.0,
            y: 0.0,
            width: extents.width as f32,
            height: extents.height as f32,
            depth_min: 0.0,
            depth_max: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RhiScissor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RhiScissor {
    pub fn from_extents(extents: RhiExtents2D) -> Self {
        RhiScissor {
            x: 0,
            y: 0,
            width: extents.width,
            height: extents.height,
        }
    }
}
