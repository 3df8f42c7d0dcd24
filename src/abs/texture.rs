//! Structs and functions for handling textures.
//!
//! The module provides the [`Texture`] struct which is a CPU representation of a GPU texture.
//! Images are decoded with the `image` crate, converted to RGBA8 and uploaded once; the decoded
//! pixels are released right after the upload.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, Rgba, RgbaImage};

use super::gpu::{GlName, Gpu};
use crate::error::{RenderError, Result};

/// How to allocate and upload a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub target: u32,
    /// Mip level the image is uploaded to.
    pub level: i32,
    pub border: i32,
    /// Flip rows on load. PNGs need this to come out the right way up in GL.
    pub flip_vertically: bool,
}

impl Default for TextureDesc {
    fn default() -> Self {
        Self {
            target: glow::TEXTURE_2D,
            level: 0,
            border: 0,
            flip_vertically: false,
        }
    }
}

/// Filter hints applied to every new texture before upload.
pub const DEFAULT_HINTS: [(u32, i32); 2] = [
    (glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32),
    (glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32),
];

/// Nearest-neighbour filtering, for pixel art that should not blur.
pub const NEAREST_HINTS: [(u32, i32); 2] = [
    (glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32),
    (glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32),
];

/// Represents a texture stored on the GPU side.
pub struct Texture {
    gpu: Arc<dyn Gpu>,
    id: GlName,
    target: u32,
    path: Option<PathBuf>,
    width: u32,
    height: u32,
    slot: Cell<u32>,
    has_mipmaps: bool,
}

impl Texture {
    /// Decodes the image at `path` and uploads it.
    pub fn from_file(gpu: &Arc<dyn Gpu>, path: impl AsRef<Path>, desc: TextureDesc) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| RenderError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let mut texture = Self::from_image(gpu, &image, desc)?;
        texture.path = Some(path.to_path_buf());
        log::info!(
            "Loaded texture {} ({}x{})",
            path.display(),
            texture.width,
            texture.height
        );
        Ok(texture)
    }

    /// Creates a new texture from the given [`image::DynamicImage`].
    ///
    /// The texture is left bound to unit 0 with linear filtering.
    pub fn from_image(gpu: &Arc<dyn Gpu>, image: &DynamicImage, desc: TextureDesc) -> Result<Self> {
        let pixels = rgba_pixels(image, desc.flip_vertically);
        let (width, height) = pixels.dimensions();
        let id = gpu.create_texture().map_err(RenderError::Gpu)?;

        let mut texture = Self {
            gpu: Arc::clone(gpu),
            id,
            target: desc.target,
            path: None,
            width,
            height,
            slot: Cell::new(0),
            has_mipmaps: false,
        };
        texture.bind(0);
        texture.set_render_hints(&DEFAULT_HINTS);

        gpu.tex_image_2d(
            desc.target,
            desc.level,
            glow::RGBA8 as i32,
            width as i32,
            height as i32,
            desc.border,
            glow::RGBA,
            glow::UNSIGNED_BYTE,
            Some(pixels.as_raw()),
        );
        drop(pixels);

        Ok(texture)
    }

    /// Overrides texture parameters such as filtering and wrapping.
    pub fn set_render_hints(&mut self, hints: &[(u32, i32)]) {
        self.bind(self.slot.get());
        for (parameter, value) in hints {
            self.gpu.tex_parameter_i32(self.target, *parameter, *value);
        }
    }

    /// Generates the mip chain from the uploaded base level.
    pub fn gen_mipmaps(&mut self) {
        self.bind(self.slot.get());
        self.gpu.generate_mipmap(self.target);
        self.has_mipmaps = true;
    }

    /// Activates texture unit `slot` and binds this texture to it.
    pub fn bind(&self, slot: u32) {
        self.gpu.active_texture(glow::TEXTURE0 + slot);
        self.gpu.bind_texture(self.target, Some(self.id));
        self.slot.set(slot);
    }

    /// Clears the binding on the unit this texture was last bound to.
    pub fn unbind(&self) {
        self.gpu.active_texture(glow::TEXTURE0 + self.slot.get());
        self.gpu.bind_texture(self.target, None);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Unit the texture was last bound to.
    pub fn slot(&self) -> u32 {
        self.slot.get()
    }

    pub fn has_mipmaps(&self) -> bool {
        self.has_mipmaps
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn name(&self) -> GlName {
        self.id
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.gpu.delete_texture(self.id);
    }
}

/// Converts to interleaved RGBA8, flipping rows if asked.
pub(crate) fn rgba_pixels(image: &DynamicImage, flip_vertically: bool) -> RgbaImage {
    let mut pixels = image.to_rgba8();
    if flip_vertically {
        image::imageops::flip_vertical_in_place(&mut pixels);
    }
    pixels
}

/// A `size`×`size` checkerboard of `cells`×`cells` squares alternating `a` and `b`.
pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> DynamicImage {
    let cell = (size / cells.max(1)).max(1);
    let image = RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgba(a)
        } else {
            Rgba(b)
        }
    });
    DynamicImage::ImageRgba8(image)
}
