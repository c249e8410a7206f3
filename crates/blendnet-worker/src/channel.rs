//! The stdin-driven control channel.

use std::io::BufRead;
use std::path::Path;

use blendnet_engine::{artifact, RenderSession};
use tracing::{error, info};

use crate::commands::Command;

/// Reads newline-delimited commands from `reader` until `end` or EOF.
///
/// Runs concurrently with the render for the whole process lifetime.
/// Fault isolation per line: unknown names are logged and ignored, and a
/// recognized command that fails is logged without terminating the loop.
/// `end` terminates only this loop, never the render.
pub fn run_channel<S: RenderSession>(reader: impl BufRead, session: &S, artifact_dir: &Path) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                error!(%error, "control channel read failed");
                break;
            }
        };
        let name = line.trim();
        if name.is_empty() {
            continue;
        }
        let command = match name.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                error!(%error, "ignoring unrecognized control command");
                continue;
            }
        };
        let result = match command {
            Command::End => {
                info!("control channel closed by end command");
                break;
            }
            Command::SavePreview => session
                .snapshot()
                .and_then(|frame| artifact::save_preview(&frame, artifact_dir)),
            Command::SaveRender => session
                .snapshot()
                .and_then(|frame| artifact::save_render(&frame, artifact_dir)),
        };
        match result {
            Ok(path) => info!(command = %command, artifact = %path.display(), "command completed"),
            Err(error) => error!(command = %command, %error, "command failed"),
        }
    }
}
