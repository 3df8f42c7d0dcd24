//! Error types shared by the renderer layer.
//!
//! Most failures here are not fatal: shader stages and uniforms degrade with a
//! log line instead of an error. [`RenderError`] is reserved for the cases where
//! there is nothing sensible left to hand back to the caller.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Reading a file from disk failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The `shaders.meta` manifest of a shader directory could not be opened.
    #[error("failed to load shaders: cannot read {path}: {source}")]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every stage listed for a program was skipped or failed to compile.
    #[error("no shader stage could be compiled for {origin}")]
    NoStages { origin: String },

    /// The program failed to link. Carries the linker log verbatim.
    #[error("failed to link shader program from {origin}:\n{log}")]
    Link { origin: String, log: String },

    /// The driver refused to create a GL object.
    #[error("GPU object creation failed: {0}")]
    Gpu(String),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Window or GL context creation failed.
    #[error("window system error: {0}")]
    Window(String),

    #[error("failed to initialise logging: {0}")]
    Logger(#[from] fern::InitError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
