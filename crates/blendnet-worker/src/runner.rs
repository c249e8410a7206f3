//! Worker lifecycle: one task, one blocking render, one command channel.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use blendnet_engine::{artifact, EngineError, RenderEngine, RenderSession};
use blendnet_task::{TaskDescriptor, TaskError};
use thiserror::Error;
use tracing::{info, warn};

/// Exit status for a completed render.
pub const EXIT_OK: u8 = 0;
/// Exit status for an unrecoverable scene configuration error
/// (unresolvable sampling mode).
pub const EXIT_CONFIG: u8 = 1;
/// Exit status for an unreadable or invalid task descriptor.
pub const EXIT_TASK: u8 = 2;
/// Exit status for an engine failure during the render.
pub const EXIT_RENDER: u8 = 3;

/// Errors that abort a worker run.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("render task panicked")]
    RenderPanicked,
}

impl WorkerError {
    /// Maps the failure onto the worker's exit-code table.
    pub fn exit_code(&self) -> u8 {
        match self {
            WorkerError::Task(_) => EXIT_TASK,
            WorkerError::Engine(EngineError::SamplingIndeterminate) => EXIT_CONFIG,
            _ => EXIT_RENDER,
        }
    }
}

/// Installs the terminate-signal interceptor.
///
/// The host orchestrator may send terminate signals for reasons unrelated
/// to this task's lifecycle; the worker's only sanctioned shutdown paths
/// are the `end` command and natural completion, so each delivery is
/// logged and dropped. Must be called from within the runtime, before any
/// other phase.
#[cfg(unix)]
pub fn spawn_signal_dodge() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::spawn(async move {
        loop {
            terminate.recv().await;
            warn!("dodged terminate signal; render continues");
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn spawn_signal_dodge() -> std::io::Result<()> {
    warn!("terminate-signal interception is unavailable on this platform");
    Ok(())
}

/// Runs one task to completion.
///
/// The command channel starts reading `commands` before the render begins
/// and lives for the whole process; the render blocks on a dedicated
/// blocking task. When the render returns, the final result is saved
/// unconditionally - a `saveRender` issued mid-flight may have captured a
/// partial frame, and the finalize overwrite is what guarantees the
/// artifact holds the settled buffer.
pub async fn run_task<E, R>(
    engine: &E,
    task: &TaskDescriptor,
    workdir: &Path,
    artifact_dir: &Path,
    commands: R,
) -> Result<(), WorkerError>
where
    E: RenderEngine,
    E::Session: Send + Sync + 'static,
    R: BufRead + Send + 'static,
{
    let session = Arc::new(engine.open(task, workdir)?);

    let channel_session = Arc::clone(&session);
    let channel_dir = artifact_dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        crate::channel::run_channel(commands, channel_session.as_ref(), &channel_dir)
    });

    info!("starting render");
    let render_session = Arc::clone(&session);
    let render_result = tokio::task::spawn_blocking(move || render_session.render())
        .await
        .map_err(|_| WorkerError::RenderPanicked)?;
    render_result?;
    info!("render completed");

    let frame = session.snapshot()?;
    let path = artifact::save_render(&frame, artifact_dir)?;
    info!(artifact = %path.display(), "final render saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blendnet_engine::testing::{ScriptedEngine, ScriptedOutcome};
    use blendnet_engine::RENDER_FILENAME;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn task() -> TaskDescriptor {
        TaskDescriptor {
            project: PathBuf::from("a.blend"),
            samples: 64,
            seed: Some(7),
            frame: Some(3),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn completed_render_always_writes_the_final_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::completing();

        run_task(
            &engine,
            &task(),
            &dir.path().join("work"),
            dir.path(),
            Cursor::new(""),
        )
        .await
        .unwrap();

        assert!(dir.path().join(RENDER_FILENAME).is_file());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sampling_indeterminate_maps_to_the_config_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::with_outcome(ScriptedOutcome::SamplingIndeterminate);

        let err = run_task(
            &engine,
            &task(),
            &dir.path().join("work"),
            dir.path(),
            Cursor::new(""),
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), EXIT_CONFIG);
        // no artifact for an aborted configuration
        assert!(!dir.path().join(RENDER_FILENAME).exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn engine_crash_maps_to_the_render_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::with_outcome(ScriptedOutcome::Crash);

        let err = run_task(
            &engine,
            &task(),
            &dir.path().join("work"),
            dir.path(),
            Cursor::new(""),
        )
        .await
        .unwrap_err();

        assert_eq!(err.exit_code(), EXIT_RENDER);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn end_command_does_not_terminate_the_render_path() {
        let dir = tempfile::tempdir().unwrap();
        let engine = ScriptedEngine::completing();

        run_task(
            &engine,
            &task(),
            &dir.path().join("work"),
            dir.path(),
            Cursor::new("end\n"),
        )
        .await
        .unwrap();

        assert!(dir.path().join(RENDER_FILENAME).is_file());
    }

    #[test]
    fn task_errors_map_to_the_task_exit_code() {
        let err = WorkerError::from(TaskError::ZeroSamples);
        assert_eq!(err.exit_code(), EXIT_TASK);
    }
}
