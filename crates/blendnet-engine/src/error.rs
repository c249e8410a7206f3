//! Error types for render engine backends.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by render engine backends.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Blender executable not found.
    #[error("Blender executable not found. Ensure Blender is installed and in PATH, or set BLENDER_PATH")]
    BlenderNotFound,

    /// Render entrypoint script not found.
    #[error("render entrypoint script not found at {path}")]
    EntrypointNotFound { path: PathBuf },

    /// Failed to spawn the render process.
    #[error("failed to spawn render process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// Render process exited with a non-zero status.
    #[error("render process exited with status {exit_code}: {detail}")]
    ProcessFailed { exit_code: i32, detail: String },

    /// Neither integrator sampling field is active on the loaded scene.
    /// Unrecoverable: the worker aborts with its configuration exit code.
    #[error("unable to determine the sampling integrator for the scene")]
    SamplingIndeterminate,

    /// No framebuffer has been produced yet.
    #[error("no framebuffer has been produced yet")]
    NoFrame,

    /// Failed to encode an EXR artifact.
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: exr::error::Error,
    },

    /// Failed to decode an EXR framebuffer.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: exr::error::Error,
    },

    /// Failed to serialize the render job file.
    #[error("failed to serialize render job: {0}")]
    Job(#[from] serde_json::Error),

    /// IO error during scratch or artifact file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, detail: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            detail: detail.into(),
        }
    }
}
