//! Harness settings.
//!
//! Settings are read from a JSON file. Every field has a default, so a config
//! file only needs the keys it wants to change:
//!
//! ```json
//! { "window": { "width": 1920, "height": 1080 }, "camera": { "fov": 90.0 } }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{RenderError, Result};

/// Directory name used under the platform config dir.
pub const APP_DIR: &str = "harness3d";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Ignores `width` and `height` and covers the desktop.
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "harness3d".to_string(),
            width: 960,
            height: 540,
            fullscreen: false,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Units per second.
    pub speed: f32,
    /// Radians per second for keyboard look.
    pub sensitivity: f32,
    /// Radians per pixel of mouse motion while the mouse is grabbed.
    pub mouse_sensitivity: f32,
    pub start_position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 70.0,
            speed: 3.0,
            sensitivity: 3.0,
            mouse_sensitivity: 0.0025,
            start_position: [0.0, 0.0, -3.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    pub path: PathBuf,
    pub flip_vertically: bool,
    /// Nearest-neighbour filtering instead of linear.
    pub nearest: bool,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            flip_vertically: true,
            nearest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub clear_color: [f32; 4],
    /// Written to `u_Tint` every frame. The alpha channel is the blend amount.
    pub tint: [f32; 4],
    /// Directory holding `shaders.meta`.
    pub shader_dir: PathBuf,
    /// Texture of the sky cube around the camera.
    pub sky_texture: TextureConfig,
    /// Texture of the cube at the origin.
    pub cube_texture: TextureConfig,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            clear_color: [0.25, 0.25, 1.0, 1.0],
            tint: [0.0; 4],
            shader_dir: PathBuf::from("res/shaders/default"),
            sky_texture: TextureConfig {
                path: PathBuf::from("res/textures/tex0.png"),
                ..TextureConfig::default()
            },
            cube_texture: TextureConfig {
                path: PathBuf::from("res/textures/tex1.png"),
                ..TextureConfig::default()
            },
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl HarnessConfig {
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| RenderError::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Loads the config.
    ///
    /// An explicit path must exist and parse. Without one, the user config dir is tried, and
    /// the defaults are used when there is nothing there.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match default_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }
}

/// `<config dir>/harness3d/config.json`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}
