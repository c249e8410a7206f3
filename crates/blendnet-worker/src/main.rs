//! BlendNet render worker binary.
//!
//! Runs exactly one render task: loads the task descriptor given as the
//! final argument, drives the blocking Blender render, and serves the
//! stdin command channel until `end` or process exit. Logs go to stderr;
//! stdout stays reserved (the channel carries no acknowledgements).

use std::path::PathBuf;
use std::process::ExitCode;

use blendnet_engine::blender::BlenderEngine;
use blendnet_task::TaskDescriptor;
use blendnet_worker::runner::{self, EXIT_OK, EXIT_RENDER, EXIT_TASK};
use clap::Parser;
use tracing::{error, info};

/// BlendNet render worker - one task per process, controlled over stdin
#[derive(Parser)]
#[command(name = "blendnet-render")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for scratch state (default: a per-process temp dir)
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Directory artifacts are written to (default: current directory)
    #[arg(long)]
    artifact_dir: Option<PathBuf>,

    /// Path to the task descriptor JSON (always the last argument)
    task: PathBuf,
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(%error, "failed to start worker runtime");
            return ExitCode::from(EXIT_RENDER);
        }
    };

    let code = runtime.block_on(async {
        // Signal interception comes first: nothing after this point may be
        // cut short by an external terminate request.
        if let Err(error) = runner::spawn_signal_dodge() {
            error!(%error, "failed to install terminate-signal interceptor");
            return ExitCode::from(EXIT_RENDER);
        }

        let task = match TaskDescriptor::load(&cli.task) {
            Ok(task) => task,
            Err(error) => {
                error!(%error, task = %cli.task.display(), "failed to load task");
                return ExitCode::from(EXIT_TASK);
            }
        };
        info!(project = %task.project.display(), samples = task.samples, "task loaded");

        let workdir = cli.workdir.unwrap_or_else(|| {
            std::env::temp_dir().join(format!("blendnet-render-{}", std::process::id()))
        });
        let artifact_dir = cli.artifact_dir.unwrap_or_else(|| PathBuf::from("."));

        let engine = BlenderEngine::new();
        let commands = std::io::BufReader::new(std::io::stdin());
        match runner::run_task(&engine, &task, &workdir, &artifact_dir, commands).await {
            Ok(()) => ExitCode::from(EXIT_OK),
            Err(error) => {
                error!(%error, "worker failed");
                ExitCode::from(error.exit_code())
            }
        }
    });

    // The command channel may still be parked on a stdin read; don't let
    // runtime teardown wait for it.
    runtime.shutdown_background();
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_task_as_last_argument() {
        let cli = Cli::try_parse_from(["blendnet-render", "/tmp/task.json"]).unwrap();
        assert_eq!(cli.task, PathBuf::from("/tmp/task.json"));
        assert!(cli.workdir.is_none());
        assert!(cli.artifact_dir.is_none());
    }

    #[test]
    fn cli_parses_directories() {
        let cli = Cli::try_parse_from([
            "blendnet-render",
            "--workdir",
            "/tmp/work",
            "--artifact-dir",
            "/tmp/out",
            "task.json",
        ])
        .unwrap();
        assert_eq!(cli.workdir.as_deref(), Some(std::path::Path::new("/tmp/work")));
        assert_eq!(
            cli.artifact_dir.as_deref(),
            Some(std::path::Path::new("/tmp/out"))
        );
        assert_eq!(cli.task, PathBuf::from("task.json"));
    }

    #[test]
    fn cli_requires_a_task() {
        assert!(Cli::try_parse_from(["blendnet-render"]).is_err());
    }
}
