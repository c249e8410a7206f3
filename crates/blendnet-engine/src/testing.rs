//! Deterministic engine doubles for worker and channel tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use blendnet_task::TaskDescriptor;

use crate::error::{EngineError, EngineResult};
use crate::frame::FrameSnapshot;
use crate::settings::RenderSettings;
use crate::{RenderEngine, RenderSession};

/// Outcome a [`ScriptedEngine`] render produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Render completes normally.
    Complete,
    /// The scene's sampling integrator cannot be determined.
    SamplingIndeterminate,
    /// The engine dies mid-render.
    Crash,
}

/// In-process engine whose behavior is fixed up front.
pub struct ScriptedEngine {
    outcome: ScriptedOutcome,
    frame: FrameSnapshot,
}

impl ScriptedEngine {
    /// Engine whose renders complete and whose buffer is a small constant
    /// frame.
    pub fn completing() -> Self {
        Self::with_outcome(ScriptedOutcome::Complete)
    }

    /// Engine producing the given outcome.
    pub fn with_outcome(outcome: ScriptedOutcome) -> Self {
        Self {
            outcome,
            frame: FrameSnapshot::filled(4, 2, [0.25, 0.5, 0.75, 1.0]),
        }
    }
}

impl RenderEngine for ScriptedEngine {
    type Session = ScriptedSession;

    fn open(&self, task: &TaskDescriptor, _workdir: &Path) -> EngineResult<ScriptedSession> {
        Ok(ScriptedSession {
            settings: RenderSettings::for_task(task),
            outcome: self.outcome,
            frame: self.frame.clone(),
            renders: AtomicUsize::new(0),
            snapshots: AtomicUsize::new(0),
        })
    }
}

/// Session produced by [`ScriptedEngine`]; records how it was driven.
pub struct ScriptedSession {
    /// Settings the engine was opened with, for assertions.
    pub settings: RenderSettings,
    outcome: ScriptedOutcome,
    frame: FrameSnapshot,
    /// Number of [`RenderSession::render`] calls.
    pub renders: AtomicUsize,
    /// Number of [`RenderSession::snapshot`] calls.
    pub snapshots: AtomicUsize,
}

impl RenderSession for ScriptedSession {
    fn render(&self) -> EngineResult<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            ScriptedOutcome::Complete => Ok(()),
            ScriptedOutcome::SamplingIndeterminate => Err(EngineError::SamplingIndeterminate),
            ScriptedOutcome::Crash => Err(EngineError::process_failed(11, "scripted crash")),
        }
    }

    fn snapshot(&self) -> EngineResult<FrameSnapshot> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        Ok(self.frame.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn scripted_session_records_settings_and_calls() {
        let task = TaskDescriptor {
            project: PathBuf::from("a.blend"),
            samples: 64,
            seed: Some(7),
            frame: Some(3),
        };
        let session = ScriptedEngine::completing()
            .open(&task, Path::new("unused"))
            .unwrap();

        assert_eq!(session.settings.seed, 7);
        session.render().unwrap();
        session.snapshot().unwrap();
        assert_eq!(session.renders.load(Ordering::SeqCst), 1);
        assert_eq!(session.snapshots.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn scripted_outcomes_map_to_engine_errors() {
        let task = TaskDescriptor {
            project: PathBuf::from("a.blend"),
            samples: 1,
            seed: None,
            frame: None,
        };
        let session = ScriptedEngine::with_outcome(ScriptedOutcome::SamplingIndeterminate)
            .open(&task, Path::new("unused"))
            .unwrap();
        assert!(matches!(
            session.render(),
            Err(EngineError::SamplingIndeterminate)
        ));
    }
}
