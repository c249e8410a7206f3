//! The per-worker render task descriptor.

use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;

/// Exclusive upper bound for derived render seeds (`2^31 - 1`).
pub const MAX_SEED: u32 = 2_147_483_647;

/// One render job handed to a worker process.
///
/// Loaded once per process from the JSON file given as the worker's final
/// argument, and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Path to the project file to render.
    pub project: PathBuf,

    /// Per-frame sample count for the active integrator.
    pub samples: u32,

    /// Render seed; a random one is derived when absent so concurrent
    /// workers do not share a sampling pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,

    /// Frame override; the scene's current frame is kept when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<i32>,
}

impl TaskDescriptor {
    /// Reads and validates a task descriptor from `path`.
    pub fn load(path: &Path) -> Result<Self, TaskError> {
        let content = fs::read_to_string(path).map_err(|source| TaskError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let task: TaskDescriptor = serde_json::from_str(&content).map_err(TaskError::Parse)?;
        task.validate()?;
        Ok(task)
    }

    /// Checks the descriptor's field invariants.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.project.as_os_str().is_empty() {
            return Err(TaskError::EmptyProject);
        }
        if self.samples == 0 {
            return Err(TaskError::ZeroSamples);
        }
        Ok(())
    }

    /// Returns the task seed, deriving a uniform random one in
    /// `[0, MAX_SEED)` when unset.
    pub fn resolved_seed(&self) -> u32 {
        match self.seed {
            Some(seed) => seed,
            None => rand::thread_rng().gen_range(0..MAX_SEED),
        }
    }
}
