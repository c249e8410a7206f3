//! Deterministic scene configuration derived from a task.

use std::path::PathBuf;

use blendnet_task::TaskDescriptor;
use serde::{Deserialize, Serialize};

/// Thread allocation mode for the render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadsMode {
    /// Use every thread the worker machine has.
    Auto,
    /// Honor the thread count stored in the scene.
    Fixed,
}

/// Compute device class the render is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeDevice {
    /// The only device class every worker is guaranteed to have.
    Cpu,
}

/// Scene configuration applied before the render starts.
///
/// Serialized as the job file the engine entrypoint consumes; field names
/// are part of that wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Project file to open.
    pub project: PathBuf,
    /// Sample count for whichever integrator sampling field is active.
    pub samples: u32,
    /// Resolved render seed.
    pub seed: u32,
    /// Frame override, if any.
    pub frame: Option<i32>,
    pub use_overwrite: bool,
    pub use_compositing: bool,
    pub use_sequencer: bool,
    pub threads_mode: ThreadsMode,
    pub device: ComputeDevice,
    pub use_denoising: bool,
    pub use_progressive_refine: bool,
}

impl RenderSettings {
    /// Derives the fixed render configuration for `task`.
    ///
    /// Composite and sequencer passes cannot be merged across workers, so
    /// both stay off. Progressive refinement stays on so the in-flight
    /// buffer is inspectable mid-render; denoising is applied after
    /// merging, not per worker.
    pub fn for_task(task: &TaskDescriptor) -> Self {
        Self {
            project: task.project.clone(),
            samples: task.samples,
            seed: task.resolved_seed(),
            frame: task.frame,
            use_overwrite: true,
            use_compositing: false,
            use_sequencer: false,
            threads_mode: ThreadsMode::Auto,
            device: ComputeDevice::Cpu,
            use_denoising: false,
            use_progressive_refine: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn task() -> TaskDescriptor {
        TaskDescriptor {
            project: PathBuf::from("a.blend"),
            samples: 64,
            seed: Some(7),
            frame: Some(3),
        }
    }

    #[test]
    fn for_task_pins_the_deterministic_flags() {
        let settings = RenderSettings::for_task(&task());
        assert_eq!(settings.samples, 64);
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.frame, Some(3));
        assert!(settings.use_overwrite);
        assert!(!settings.use_compositing);
        assert!(!settings.use_sequencer);
        assert_eq!(settings.threads_mode, ThreadsMode::Auto);
        assert_eq!(settings.device, ComputeDevice::Cpu);
        assert!(!settings.use_denoising);
        assert!(settings.use_progressive_refine);
    }

    #[test]
    fn job_file_uses_snake_case_tokens() {
        let json = serde_json::to_value(RenderSettings::for_task(&task())).unwrap();
        assert_eq!(json["threads_mode"], "auto");
        assert_eq!(json["device"], "cpu");
        assert_eq!(json["frame"], 3);
    }

    #[test]
    fn absent_frame_serializes_as_null() {
        let mut task = task();
        task.frame = None;
        let json = serde_json::to_value(RenderSettings::for_task(&task)).unwrap();
        assert!(json["frame"].is_null());
    }
}
