//! This module contains the thin OpenGL layer of the harness: window and
//! context setup, buffers and vertex layouts, shader programs and textures.

pub mod app;
pub mod buffer;
pub mod gpu;
pub mod layout;
pub mod shader;
pub mod texture;

#[cfg(test)]
pub(crate) mod mock;

pub use app::*;
pub use buffer::*;
pub use gpu::*;
pub use layout::*;
pub use shader::*;
pub use texture::*;
