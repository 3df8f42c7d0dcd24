//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2 context,
//! and [`GlWindow`], the window plus OpenGL context the renderer presents to.

use std::sync::Arc;

use sdl2::video::{FullscreenType, GLContext, GLProfile, SwapInterval, Window};

use super::gpu::Gpu;
use crate::config::WindowConfig;
use crate::error::{RenderError, Result};
use crate::renderer::Surface;

/// The [`App`] struct encapsulates the SDL2 context and the GPU handle.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub gpu: Arc<dyn Gpu>,
    pub event_pump: sdl2::EventPump,
}

/// A window with its OpenGL 3.3 core context made current.
pub struct GlWindow {
    // Dropped before the window it belongs to.
    _context: GLContext,
    window: Window,
}

impl App {
    /// Opens a window as described by `config` and loads OpenGL through it.
    ///
    /// The width and height options are ignored if `fullscreen` is set to `true`.
    pub fn new(config: &WindowConfig) -> Result<(Self, GlWindow)> {
        let sdl = sdl2::init().map_err(RenderError::Window)?;
        let video_subsystem = sdl.video().map_err(RenderError::Window)?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(GLProfile::Core);
        gl_attr.set_context_version(3, 3);

        let (width, height) = if config.fullscreen {
            let display_mode = video_subsystem
                .current_display_mode(0)
                .map_err(RenderError::Window)?;
            (display_mode.w as u32, display_mode.h as u32)
        } else {
            (config.width, config.height)
        };

        let mut window = video_subsystem
            .window(&config.title, width, height)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| RenderError::Window(e.to_string()))?;
        window
            .set_fullscreen(if config.fullscreen {
                FullscreenType::Desktop
            } else {
                FullscreenType::Off
            })
            .map_err(RenderError::Window)?;

        let context = window.gl_create_context().map_err(RenderError::Window)?;
        window.gl_make_current(&context).map_err(RenderError::Window)?;

        if config.vsync
            && let Err(e) = video_subsystem.gl_set_swap_interval(SwapInterval::VSync)
        {
            log::warn!("Could not enable vsync: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let gpu: Arc<dyn Gpu> = Arc::new(gl);
        let event_pump = sdl.event_pump().map_err(RenderError::Window)?;

        log::info!("Opened {width}x{height} window \"{}\"", config.title);

        Ok((
            Self {
                sdl,
                video_subsystem,
                gpu,
                event_pump,
            },
            GlWindow {
                _context: context,
                window,
            },
        ))
    }

    /// Hides the cursor and reports relative motion while `grab` is set.
    pub fn set_mouse_grab(&self, grab: bool) {
        self.sdl.mouse().set_relative_mouse_mode(grab);
    }

    pub fn mouse_grabbed(&self) -> bool {
        self.sdl.mouse().relative_mouse_mode()
    }
}

impl GlWindow {
    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl Surface for GlWindow {
    fn size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }

    fn swap_buffers(&self) {
        self.window.gl_swap_window();
    }
}
