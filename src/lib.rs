//! A small real-time 3D rendering harness on OpenGL 3.3.
//!
//! [`abs`] wraps the GL objects (buffers, vertex layouts, shader programs,
//! textures) with RAII types, [`Renderer`] keeps the named objects of a scene
//! and draws them, and [`Camera`] produces the view and projection matrices.

pub mod abs;
pub mod camera;
pub mod config;
pub mod error;
pub mod logging;
pub mod overlay;
pub mod renderer;

pub use camera::Camera;
pub use config::HarnessConfig;
pub use error::{RenderError, Result};
pub use overlay::{FrameStats, NullOverlay, Overlay};
pub use renderer::{GameObject, Renderer, Surface};
