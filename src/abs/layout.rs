//! Vertex attribute layouts.
//!
//! A [`VertexLayout`] describes how the bytes of one interleaved vertex buffer
//! map onto shader inputs. Attributes are appended in the order they appear in
//! the buffer; each one lands at the current stride, and the stride grows by its
//! size. There is no reordering and no padding.

use super::buffer::VertexArray;

/// Component types an attribute can be made of, with their size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    Float,
}

impl ComponentType {
    /// Size of a single component in bytes.
    pub const fn size(self) -> i32 {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort | ComponentType::HalfFloat => 2,
            ComponentType::Int | ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }

    pub const fn gl_enum(self) -> u32 {
        match self {
            ComponentType::Byte => glow::BYTE,
            ComponentType::UnsignedByte => glow::UNSIGNED_BYTE,
            ComponentType::Short => glow::SHORT,
            ComponentType::UnsignedShort => glow::UNSIGNED_SHORT,
            ComponentType::Int => glow::INT,
            ComponentType::UnsignedInt => glow::UNSIGNED_INT,
            ComponentType::HalfFloat => glow::HALF_FLOAT,
            ComponentType::Float => glow::FLOAT,
        }
    }
}

/// One shader input inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub count: i32,
    pub ty: ComponentType,
    pub normalized: bool,
    /// Byte offset from the start of the vertex.
    pub offset: i32,
}

impl VertexAttribute {
    pub const fn size(&self) -> i32 {
        self.count * self.ty.size()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: i32,
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute at the current stride.
    pub fn add_attribute(&mut self, count: i32, ty: ComponentType, normalized: bool) -> &mut Self {
        self.attributes.push(VertexAttribute {
            count,
            ty,
            normalized,
            offset: self.stride,
        });
        self.stride += count * ty.size();
        self
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Size of one whole vertex in bytes.
    pub fn stride(&self) -> i32 {
        self.stride
    }

    /// Binds `vertex_array` and points input slot `i` at attribute `i`.
    ///
    /// The attribute pointers capture whatever buffer is bound to
    /// `ARRAY_BUFFER` at this moment, so bind the vertex buffer first (or go
    /// through [`super::VertexBuffer::set_layout`]).
    pub fn apply(&self, vertex_array: &VertexArray) {
        vertex_array.bind();
        let gpu = vertex_array.gpu();
        for (index, attribute) in self.attributes.iter().enumerate() {
            gpu.enable_vertex_attrib_array(index as u32);
            gpu.vertex_attrib_pointer(
                index as u32,
                attribute.count,
                attribute.ty.gl_enum(),
                attribute.normalized,
                self.stride,
                attribute.offset,
            );
        }
    }
}
