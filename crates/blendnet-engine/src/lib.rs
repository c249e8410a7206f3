//! Render engine seam for BlendNet workers.
//!
//! The worker process never talks to a renderer directly; it drives a
//! [`RenderSession`] obtained from a [`RenderEngine`]. The production
//! engine ([`blender::BlenderEngine`]) runs headless Blender as a
//! subprocess; [`testing::ScriptedEngine`] is a deterministic in-process
//! double for tests.
//!
//! The split matches how a worker actually behaves: one blocking render on
//! the main execution path, while a concurrent control channel takes
//! best-effort snapshots of the in-flight result buffer and encodes them
//! as EXR artifacts ([`artifact`]).

pub mod artifact;
pub mod blender;
pub mod error;
pub mod frame;
pub mod settings;
pub mod testing;

pub use artifact::{save_preview, save_render, PREVIEW_FILENAME, RENDER_FILENAME};
pub use error::{EngineError, EngineResult};
pub use frame::FrameSnapshot;
pub use settings::{ComputeDevice, RenderSettings, ThreadsMode};

use std::path::Path;

use blendnet_task::TaskDescriptor;

/// A rendering backend able to prepare one session per task.
pub trait RenderEngine {
    type Session: RenderSession;

    /// Prepares a render session for `task`, using `workdir` for scratch
    /// state.
    fn open(&self, task: &TaskDescriptor, workdir: &Path) -> EngineResult<Self::Session>;
}

/// One prepared render.
pub trait RenderSession {
    /// Runs the full-frame render.
    ///
    /// Blocks until the frame completes or the engine fails; there is no
    /// internal timeout. Kill policy belongs to whatever supervises the
    /// worker process.
    fn render(&self) -> EngineResult<()>;

    /// Best-effort snapshot of the in-flight result buffer.
    ///
    /// The render keeps refining the buffer while this reads it: the
    /// returned frame may be stale by one refinement pass. Callers that
    /// need a settled frame must wait for [`render`](Self::render) to
    /// return first. Fails with [`EngineError::NoFrame`] before the first
    /// refinement lands.
    fn snapshot(&self) -> EngineResult<FrameSnapshot>;
}
