//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing OpenGL shaders,
//! and the loader for shader directories described by a `shaders.meta` manifest:
//!
//! ```text
//! # comment lines start with '#'
//! vertex-shader: vert.glsl
//! fragment-shader: frag.glsl
//! ```
//!
//! Each entry names a stage and a file relative to the manifest's directory. Loading is
//! best-effort: stages that are unknown, unreadable or fail to compile are logged and left out,
//! and the program is linked from whatever remains.
//!
//! This module also provides the [`Uniform`] trait for setting uniform variables in shader
//! programs. Uniform locations are looked up once per name and cached, misses included.

use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;

use fxhash::FxHashMap;
use glam::{Mat4, Vec2, Vec3, Vec4};

use super::gpu::{GlName, Gpu};
use crate::error::{RenderError, Result};

/// File name of the manifest inside a shader directory.
pub const MANIFEST_FILE: &str = "shaders.meta";

/// The stages a manifest can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
}

const STAGE_NAMES: [(&str, ShaderStage); 3] = [
    ("vertex-shader", ShaderStage::Vertex),
    ("fragment-shader", ShaderStage::Fragment),
    ("geometry-shader", ShaderStage::Geometry),
];

impl ShaderStage {
    /// Looks up a manifest stage name such as `"vertex-shader"`.
    pub fn from_name(name: &str) -> Option<Self> {
        STAGE_NAMES
            .iter()
            .find(|(stage_name, _)| *stage_name == name)
            .map(|(_, stage)| *stage)
    }

    pub fn name(self) -> &'static str {
        STAGE_NAMES
            .iter()
            .find(|(_, stage)| *stage == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown-shader")
    }

    pub const fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
        }
    }
}

/// One `<stage-name>: <file>` line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub stage: String,
    pub file: String,
}

/// Parses a single manifest line.
///
/// Comment lines (leading `#`) and lines without `": "` yield `None`. The line is split at the
/// first `": "`.
pub fn parse_manifest_line(line: &str) -> Option<ManifestEntry> {
    let line = line.trim_end();
    if line.starts_with('#') {
        return None;
    }
    let (stage, file) = line.split_once(": ")?;
    Some(ManifestEntry {
        stage: stage.to_string(),
        file: file.to_string(),
    })
}

/// Parses a whole manifest, keeping entries in file order.
pub fn parse_manifest(text: &str) -> Vec<ManifestEntry> {
    text.lines().filter_map(parse_manifest_line).collect()
}

/// Represents an individual compiled OpenGL shader.
pub struct Shader {
    gpu: Arc<dyn Gpu>,
    id: GlName,
    stage: ShaderStage,
}

impl Shader {
    /// Compiles a new shader from the given source code.
    ///
    /// On failure the compiler log is returned verbatim and the shader object is deleted.
    pub fn new(gpu: &Arc<dyn Gpu>, stage: ShaderStage, source: &str) -> std::result::Result<Self, String> {
        let shader = gpu.create_shader(stage.gl_enum())?;
        gpu.shader_source(shader, source);
        gpu.compile_shader(shader);

        if !gpu.shader_compile_status(shader) {
            let log = gpu.shader_info_log(shader);
            gpu.delete_shader(shader);
            return Err(log);
        }

        Ok(Self {
            gpu: Arc::clone(gpu),
            id: shader,
            stage,
        })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        self.gpu.delete_shader(self.id);
    }
}

/// Represents a uniform variable in a shader program.
pub trait Uniform {
    /// Writes the value to `location` of the currently bound program.
    fn write(&self, gpu: &dyn Gpu, location: u32);
}

impl Uniform for bool {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        gpu.uniform_1_i32(location, *self as i32);
    }
}

impl Uniform for i32 {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        gpu.uniform_1_i32(location, *self);
    }
}

impl Uniform for f32 {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        gpu.uniform_1_f32(location, *self);
    }
}

impl Uniform for Vec2 {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        gpu.uniform_2_f32(location, self.x, self.y);
    }
}

impl Uniform for Vec3 {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        gpu.uniform_3_f32(location, self.x, self.y, self.z);
    }
}

impl Uniform for Vec4 {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        gpu.uniform_4_f32(location, self.x, self.y, self.z, self.w);
    }
}

impl Uniform for Mat4 {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        gpu.uniform_matrix_4_f32(location, false, &self.to_cols_array());
    }
}

impl<T: Uniform> Uniform for &T {
    fn write(&self, gpu: &dyn Gpu, location: u32) {
        (*self).write(gpu, location);
    }
}

/// Represents an OpenGL shader program composed of multiple shaders.
pub struct ShaderProgram {
    gpu: Arc<dyn Gpu>,
    id: GlName,
    origin: String,
    uniforms: RefCell<FxHashMap<String, Option<u32>>>,
}

impl ShaderProgram {
    /// Loads every stage listed in `<dir>/shaders.meta` and links them into one program.
    pub fn from_manifest(gpu: &Arc<dyn Gpu>, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = std::fs::read_to_string(&manifest_path).map_err(|source| {
            log::error!(
                "Failed to load shaders: cannot read {}",
                manifest_path.display()
            );
            RenderError::ManifestUnreadable {
                path: manifest_path.clone(),
                source,
            }
        })?;

        let mut shaders = Vec::new();
        for entry in parse_manifest(&manifest) {
            let Some(stage) = ShaderStage::from_name(&entry.stage) else {
                log::warn!(
                    "Invalid shader type: {} in {} // Skipping..",
                    entry.stage,
                    manifest_path.display()
                );
                continue;
            };

            let full_path = dir.join(&entry.file);
            let source = match std::fs::read_to_string(&full_path) {
                Ok(source) => source,
                Err(e) => {
                    log::warn!(
                        "Failed to load {}: cannot read {}: {e} // Skipping..",
                        entry.stage,
                        full_path.display()
                    );
                    continue;
                }
            };

            match Shader::new(gpu, stage, &source) {
                Ok(shader) => {
                    log::info!("Loaded {} from {}", entry.stage, full_path.display());
                    shaders.push(shader);
                }
                Err(diagnostic) => {
                    log::error!(
                        "Error compiling {} from {}:\n{}",
                        entry.stage,
                        full_path.display(),
                        diagnostic.trim_end()
                    );
                }
            }
        }

        Self::link(gpu, manifest_path.display().to_string(), shaders)
    }

    /// Compiles and links a program from in-memory sources, e.g. `include_str!` shaders.
    ///
    /// Follows the same best-effort rules as [`ShaderProgram::from_manifest`].
    pub fn from_sources(gpu: &Arc<dyn Gpu>, sources: &[(ShaderStage, &str)]) -> Result<Self> {
        let mut shaders = Vec::new();
        for (stage, source) in sources {
            match Shader::new(gpu, *stage, source) {
                Ok(shader) => shaders.push(shader),
                Err(diagnostic) => log::error!(
                    "Error compiling embedded {}:\n{}",
                    stage.name(),
                    diagnostic.trim_end()
                ),
            }
        }
        Self::link(gpu, "<embedded sources>".to_string(), shaders)
    }

    fn link(gpu: &Arc<dyn Gpu>, origin: String, shaders: Vec<Shader>) -> Result<Self> {
        if shaders.is_empty() {
            log::error!("No shader stage could be compiled for {origin}");
            return Err(RenderError::NoStages { origin });
        }

        let program = gpu.create_program().map_err(RenderError::Gpu)?;
        for shader in &shaders {
            gpu.attach_shader(program, shader.id);
        }
        gpu.link_program(program);
        gpu.validate_program(program);

        // Stage objects are not needed once the program is linked, whatever the outcome.
        drop(shaders);

        if !gpu.program_link_status(program) {
            let log = gpu.program_info_log(program);
            log::error!("Error linking shader program from {origin}:\n{}", log.trim_end());
            gpu.delete_program(program);
            return Err(RenderError::Link { origin, log });
        }
        if !gpu.program_validate_status(program) {
            log::warn!(
                "Shader program from {origin} did not validate:\n{}",
                gpu.program_info_log(program).trim_end()
            );
        }

        log::info!("Successfully loaded shader program from {origin}");
        Ok(Self {
            gpu: Arc::clone(gpu),
            id: program,
            origin,
            uniforms: RefCell::new(FxHashMap::default()),
        })
    }

    /// Binds the shader program for use.
    pub fn bind(&self) {
        self.gpu.use_program(Some(self.id));
    }

    pub fn unbind(&self) {
        self.gpu.use_program(None);
    }

    /// Location of uniform `name`, or `None` if the linked program has no such uniform.
    ///
    /// The GPU is asked at most once per name; the answer is cached either way and a miss is
    /// logged the first time only.
    pub fn uniform_location(&self, name: &str) -> Option<u32> {
        let cached = self.uniforms.borrow().get(name).copied();
        if let Some(location) = cached {
            return location;
        }

        let location = self.gpu.uniform_location(self.id, name);
        if location.is_none() {
            log::warn!("Uniform {name} doesn't exist in {}!", self.origin);
        }
        self.uniforms.borrow_mut().insert(name.to_string(), location);
        location
    }

    /// Sets a uniform variable in the shader program. The program must be bound.
    ///
    /// Unknown uniforms are ignored.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) {
        if let Some(location) = self.uniform_location(name) {
            value.write(self.gpu.as_ref(), location);
        }
    }

    pub fn set_uniform_1i(&self, name: &str, value: i32) {
        self.set_uniform(name, value);
    }

    pub fn set_uniform_4f(&self, name: &str, f0: f32, f1: f32, f2: f32, f3: f32) {
        self.set_uniform(name, Vec4::new(f0, f1, f2, f3));
    }

    pub fn set_uniform_mat4f(&self, name: &str, matrix: &Mat4, transpose: bool) {
        if let Some(location) = self.uniform_location(name) {
            self.gpu
                .uniform_matrix_4_f32(location, transpose, &matrix.to_cols_array());
        }
    }

    /// Where the program was loaded from, for log messages.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn name(&self) -> GlName {
        self.id
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.gpu.delete_program(self.id);
    }
}
