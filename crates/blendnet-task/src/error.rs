//! Error types for task loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a task descriptor.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task file could not be read.
    #[error("failed to read task file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Task file is not valid JSON or is missing required fields.
    #[error("failed to parse task file: {0}")]
    Parse(#[source] serde_json::Error),

    /// Task has an empty project path.
    #[error("task project path is empty")]
    EmptyProject,

    /// Sample count below the minimum of 1.
    #[error("task sample count must be at least 1")]
    ZeroSamples,
}
