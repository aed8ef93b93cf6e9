use super::{RhiFormat, RhiVertexAttributeRate};
use serde::{Deserialize, Serialize};

/// What a vertex attribute means. Only used for naming and debugging, the shader matches
/// attributes by location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiVertexSemantic {
    Position,
    Normal,
    Tangent,
    Bitangent,
    TexCoord,
    Color,
    BoneIndices,
    BoneWeights,
    Custom(String),
}

impl RhiVertexSemantic {
    pub fn name(&self) -> &str {
        match self {
            RhiVertexSemantic::Position => "POSITION",
            RhiVertexSemantic::Normal => "NORMAL",
            RhiVertexSemantic::Tangent => "TANGENT",
            RhiVertexSemantic::Bitangent => "BITANGENT",
            RhiVertexSemantic::TexCoord => "TEXCOORD",
            RhiVertexSemantic::Color => "COLOR",
            RhiVertexSemantic::BoneIndices => "BLENDINDICES",
            RhiVertexSemantic::BoneWeights => "BLENDWEIGHT",
            RhiVertexSemantic::Custom(name) => name,
        }
    }
}

/// Shader-side type of one vertex attribute
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiVertexElementType {
    Float,
    Float2,
    Float3,
    Float4,
    UInt,
    UInt2,
    UInt4,
    /// Four normalized bytes, read as a vec4 in the shader
    UNorm4x8,
}

impl RhiVertexElementType {
    pub fn size_in_bytes(self) -> u32 {
        self.format().block_or_pixel_size_in_bytes()
    }

    pub fn format(self) -> RhiFormat {
        match self {
            RhiVertexElementType::Float => RhiFormat::R32_SFLOAT,
            RhiVertexElementType::Float2 => RhiFormat::R32G32_SFLOAT,
            RhiVertexElementType::Float3 => RhiFormat::R32G32B32_SFLOAT,
            RhiVertexElementType::Float4 => RhiFormat::R32G32B32A32_SFLOAT,
            RhiVertexElementType::UInt => RhiFormat::R32_UINT,
            RhiVertexElementType::UInt2 => RhiFormat::R32G32_UINT,
            RhiVertexElementType::UInt4 => RhiFormat::R32G32B32A32_UINT,
            RhiVertexElementType::UNorm4x8 => RhiFormat::R8G8B8A8_UNORM,
        }
    }
}

/// One entry in a `RhiVertexLayout`, as declared by the user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RhiVertexLayoutElement {
    pub semantic: RhiVertexSemantic,
    pub element_type: RhiVertexElementType,
}

/// An attribute as it is handed to the backend: where it lives in the vertex and which shader
/// input it feeds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RhiVertexInputAttribute {
    pub semantic: RhiVertexSemantic,
    pub format: RhiFormat,
    /// Which buffer the attribute is read from
    pub binding: u32,
    /// Shader input location
    pub location: u32,
    /// The byte offset of the attribute within one vertex
    pub byte_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RhiVertexInputBinding {
    pub binding: u32,
    pub stride: u32,
    pub rate: RhiVertexAttributeRate,
}

/// The vertex input description a pipeline is built with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RhiVertexInput {
    pub bindings: Vec<RhiVertexInputBinding>,
    pub attributes: Vec<RhiVertexInputAttribute>,
}

/// An ordered list of vertex attributes packed into a single interleaved buffer.
///
/// Offsets and stride are derived from the order of the attributes, so the layout is the only
/// place that decides where an attribute lives:
///
/// ```
/// use strata_rhi::{RhiVertexLayout, RhiVertexSemantic, RhiVertexElementType};
/// let layout = RhiVertexLayout::new()
///     .with_attribute(RhiVertexSemantic::Position, RhiVertexElementType::Float3)
///     .with_attribute(RhiVertexSemantic::TexCoord, RhiVertexElementType::Float2);
/// assert_eq!(layout.stride(), 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RhiVertexLayout {
    elements: Vec<RhiVertexLayoutElement>,
}

impl RhiVertexLayout {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_attribute(
        mut self,
        semantic: RhiVertexSemantic,
        element_type: RhiVertexElementType,
    ) -> Self {
        self.push_attribute(semantic, element_type);
        self
    }

    pub fn push_attribute(
        &mut self,
        semantic: RhiVertexSemantic,
        element_type: RhiVertexElementType,
    ) {
        self.elements.push(RhiVertexLayoutElement {
            semantic,
            element_type,
        });
    }

    pub fn attributes(&self) -> &[RhiVertexLayoutElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Size of one vertex, the sum of every attribute's size
    pub fn stride(&self) -> u32 {
        self.elements
            .iter()
            .map(|element| element.element_type.size_in_bytes())
            .sum()
    }

    /// Binding 0 with the computed stride, and one attribute per element with location equal to
    /// its index. A layout with no attributes produces no bindings (vertices generated in the
    /// shader).
    pub fn vertex_input(&self) -> RhiVertexInput {
        if self.elements.is_empty() {
            return RhiVertexInput::default();
        }

        let mut attributes = Vec::with_capacity(self.elements.len());
        let mut byte_offset = 0;
        for (location, element) in self.elements.iter().enumerate() {
            attributes.push(RhiVertexInputAttribute {
                semantic: element.semantic.clone(),
                format: element.element_type.format(),
                binding: 0,
                location: location as u32,
                byte_offset,
            });
            byte_offset += element.element_type.size_in_bytes();
        }

        RhiVertexInput {
            bindings: vec![RhiVertexInputBinding {
                binding: 0,
                stride: byte_offset,
                rate: RhiVertexAttributeRate::Vertex,
            }],
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_attribute_order() {
        let layout = RhiVertexLayout::new()
            .with_attribute(RhiVertexSemantic::Position, RhiVertexElementType::Float3)
            .with_attribute(RhiVertexSemantic::TexCoord, RhiVertexElementType::Float2)
            .with_attribute(RhiVertexSemantic::Normal, RhiVertexElementType::Float3)
            .with_attribute(RhiVertexSemantic::Color, RhiVertexElementType::Float4);

        let input = layout.vertex_input();
        assert_eq!(input.attributes.len(), 4);
        let offsets: Vec<_> = input.attributes.iter().map(|a| a.byte_offset).collect();
        assert_eq!(offsets, vec![0, 12, 20, 32]);
        let locations: Vec<_> = input.attributes.iter().map(|a| a.location).collect();
        assert_eq!(locations, vec![0, 1, 2, 3]);
        assert!(input.attributes.iter().all(|a| a.binding == 0));

        assert_eq!(input.bindings.len(), 1);
        assert_eq!(input.bindings[0].stride, 48);
        assert_eq!(layout.stride(), 48);
    }

    #[test]
    fn reordering_moves_offsets() {
        let layout = RhiVertexLayout::new()
            .with_attribute(RhiVertexSemantic::Color, RhiVertexElementType::UNorm4x8)
            .with_attribute(RhiVertexSemantic::Position, RhiVertexElementType::Float3);

        let input = layout.vertex_input();
        assert_eq!(input.attributes[1].semantic, RhiVertexSemantic::Position);
        assert_eq!(input.attributes[1].byte_offset, 4);
        assert_eq!(input.attributes[0].format, RhiFormat::R8G8B8A8_UNORM);
    }

    #[test]
    fn empty_layout_has_no_bindings() {
        let input = RhiVertexLayout::new().vertex_input();
        assert!(input.bindings.is_empty());
        assert!(input.attributes.is_empty());
    }
}
