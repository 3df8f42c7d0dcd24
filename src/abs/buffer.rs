//! GPU buffers and vertex arrays.
//!
//! [`VertexBuffer`] and [`IndexBuffer`] upload their data once on creation and
//! are never modified afterwards. [`VertexArray`] records the attribute setup
//! and the element buffer binding. [`Model`] bundles the three.
//!
//! Every type here deletes its GL object when dropped.

use std::sync::Arc;

use bytemuck::Pod;

use super::gpu::{GlName, Gpu};
use super::layout::VertexLayout;
use crate::error::{RenderError, Result};

/// Interleaved vertex data stored on the GPU side.
pub struct VertexBuffer {
    gpu: Arc<dyn Gpu>,
    id: GlName,
    size: usize,
}

impl VertexBuffer {
    /// Creates the buffer, binds it to `ARRAY_BUFFER` and uploads `data`.
    ///
    /// `T` is plain data, e.g. `f32`, `[f32; 5]` or a `#[derive(Pod)]` vertex
    /// struct. The buffer stays bound afterwards.
    pub fn new<T: Pod>(gpu: &Arc<dyn Gpu>, data: &[T], usage: u32) -> Result<Self> {
        let id = gpu.create_buffer().map_err(RenderError::Gpu)?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let size = bytes.len();
        gpu.bind_buffer(glow::ARRAY_BUFFER, Some(id));
        gpu.buffer_data(glow::ARRAY_BUFFER, bytes, usage);

        Ok(Self {
            gpu: Arc::clone(gpu),
            id,
            size,
        })
    }

    pub fn bind(&self) {
        self.gpu.bind_buffer(glow::ARRAY_BUFFER, Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_buffer(glow::ARRAY_BUFFER, None);
    }

    /// Binds this buffer and applies `layout` to `vertex_array`.
    pub fn set_layout(&self, layout: &VertexLayout, vertex_array: &VertexArray) {
        self.bind();
        layout.apply(vertex_array);
    }

    /// Size of the uploaded data in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn name(&self) -> GlName {
        self.id
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        self.gpu.delete_buffer(self.id);
    }
}

/// Element indices stored on the GPU side. Always `UNSIGNED_INT`.
pub struct IndexBuffer {
    gpu: Arc<dyn Gpu>,
    id: GlName,
    count: i32,
}

impl IndexBuffer {
    /// Creates the buffer, binds it to `ELEMENT_ARRAY_BUFFER` and uploads
    /// `indices`. If a vertex array is bound, it records this buffer.
    ///
    /// Fails without touching the GPU if there are more indices than a draw call can address.
    pub fn new(gpu: &Arc<dyn Gpu>, indices: &[u32], usage: u32) -> Result<Self> {
        let count = index_count(indices.len())?;
        let id = gpu.create_buffer().map_err(RenderError::Gpu)?;
        gpu.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(id));
        gpu.buffer_data(glow::ELEMENT_ARRAY_BUFFER, bytemuck::cast_slice(indices), usage);

        Ok(Self {
            gpu: Arc::clone(gpu),
            id,
            count,
        })
    }

    pub fn bind(&self) {
        self.gpu.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
    }

    /// Binds itself and draws every stored index with `mode`.
    ///
    /// The vertex array and program must already be bound.
    pub fn draw(&self, mode: u32) {
        self.bind();
        self.gpu
            .draw_elements(mode, self.count, glow::UNSIGNED_INT, 0);
    }

    /// Number of indices, fixed at creation.
    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn name(&self) -> GlName {
        self.id
    }
}

/// Converts an index count to the `GLsizei` a draw call takes.
fn index_count(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| RenderError::Gpu(format!("{len} indices exceed the draw call limit")))
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        self.gpu.delete_buffer(self.id);
    }
}

pub struct VertexArray {
    gpu: Arc<dyn Gpu>,
    id: GlName,
}

impl VertexArray {
    /// Creates a vertex array and binds it.
    pub fn new(gpu: &Arc<dyn Gpu>) -> Result<Self> {
        let id = gpu.create_vertex_array().map_err(RenderError::Gpu)?;
        gpu.bind_vertex_array(Some(id));
        Ok(Self {
            gpu: Arc::clone(gpu),
            id,
        })
    }

    pub fn bind(&self) {
        self.gpu.bind_vertex_array(Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.bind_vertex_array(None);
    }

    pub fn name(&self) -> GlName {
        self.id
    }

    pub(super) fn gpu(&self) -> &dyn Gpu {
        self.gpu.as_ref()
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.gpu.delete_vertex_array(self.id);
    }
}

/// Geometry ready to draw: a vertex array with its vertex and index buffers.
///
/// Fields drop in declaration order, so teardown releases the index buffer,
/// then the vertex buffer, then the vertex array.
pub struct Model {
    index_buffer: IndexBuffer,
    vertex_buffer: VertexBuffer,
    vertex_array: VertexArray,
}

impl Model {
    /// Uploads `vertices` and `indices` as static data and records `layout`.
    ///
    /// Nothing is left bound when this returns.
    pub fn new<T: Pod>(
        gpu: &Arc<dyn Gpu>,
        vertices: &[T],
        layout: &VertexLayout,
        indices: &[u32],
    ) -> Result<Self> {
        let vertex_array = VertexArray::new(gpu)?;
        let vertex_buffer = VertexBuffer::new(gpu, vertices, glow::STATIC_DRAW)?;
        vertex_buffer.set_layout(layout, &vertex_array);
        let index_buffer = IndexBuffer::new(gpu, indices, glow::STATIC_DRAW)?;

        vertex_array.unbind();
        vertex_buffer.unbind();
        index_buffer.unbind();

        Ok(Self {
            index_buffer,
            vertex_buffer,
            vertex_array,
        })
    }

    pub fn index_buffer(&self) -> &IndexBuffer {
        &self.index_buffer
    }

    pub fn vertex_buffer(&self) -> &VertexBuffer {
        &self.vertex_buffer
    }

    pub fn vertex_array(&self) -> &VertexArray {
        &self.vertex_array
    }
}
