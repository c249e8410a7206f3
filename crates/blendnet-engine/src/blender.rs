//! Blender subprocess engine.
//!
//! One render session is one headless Blender invocation: the session
//! writes the job file, spawns
//! `blender --background --factory-startup --python entrypoint.py`, and
//! blocks on the child. While the render runs, the entrypoint keeps
//! replacing a scratch framebuffer dump, which is what snapshots decode.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use blendnet_task::TaskDescriptor;
use tracing::{debug, info, warn};

use crate::artifact;
use crate::error::{EngineError, EngineResult};
use crate::frame::FrameSnapshot;
use crate::settings::RenderSettings;
use crate::{RenderEngine, RenderSession};

const EMBEDDED_ENTRYPOINT_PY: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../blender/entrypoint.py"
));

/// Exit status the entrypoint uses when neither integrator sampling field
/// is active on the loaded scene. Must match `blender/entrypoint.py`.
const EXIT_SAMPLING_INDETERMINATE: i32 = 3;

/// Scratch file the entrypoint keeps replacing with the latest
/// progressive result.
const FRAMEBUFFER_FILENAME: &str = "framebuffer.exr";

/// Configuration for the Blender engine.
#[derive(Debug, Clone, Default)]
pub struct BlenderConfig {
    /// Explicit Blender executable; discovery applies when unset.
    pub blender_path: Option<PathBuf>,
    /// Entrypoint script override; the embedded copy is used when unset.
    pub entrypoint_path: Option<PathBuf>,
}

/// Engine that renders through a headless Blender subprocess.
pub struct BlenderEngine {
    config: BlenderConfig,
}

struct ResolvedEntrypoint {
    path: PathBuf,
    _tempfile: Option<tempfile::NamedTempFile>,
}

impl BlenderEngine {
    /// Creates an engine with default configuration.
    pub fn new() -> Self {
        Self {
            config: BlenderConfig::default(),
        }
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: BlenderConfig) -> Self {
        Self { config }
    }

    /// Finds the Blender executable.
    ///
    /// Order: config override, `BLENDER_PATH`, `PATH`, then common
    /// installation locations.
    pub fn locate(&self) -> EngineResult<PathBuf> {
        if let Some(ref path) = self.config.blender_path {
            if path.exists() {
                return Ok(path.clone());
            }
        }

        if let Ok(path) = std::env::var("BLENDER_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        let names: &[&str] = if cfg!(windows) {
            &["blender.exe", "blender"]
        } else {
            &["blender"]
        };
        for name in names {
            if let Ok(path) = which::which(name) {
                return Ok(path);
            }
        }

        let common: &[&str] = if cfg!(windows) {
            &[
                "C:\\Program Files\\Blender Foundation\\Blender 4.0\\blender.exe",
                "C:\\Program Files\\Blender Foundation\\Blender\\blender.exe",
            ]
        } else if cfg!(target_os = "macos") {
            &[
                "/Applications/Blender.app/Contents/MacOS/Blender",
                "/Applications/Blender.app/Contents/MacOS/blender",
            ]
        } else {
            &[
                "/usr/bin/blender",
                "/usr/local/bin/blender",
                "/snap/bin/blender",
            ]
        };
        for candidate in common {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Ok(path);
            }
        }

        Err(EngineError::BlenderNotFound)
    }

    fn resolve_entrypoint(&self) -> EngineResult<ResolvedEntrypoint> {
        // Config override first.
        if let Some(ref path) = self.config.entrypoint_path {
            if path.exists() {
                return Ok(ResolvedEntrypoint {
                    path: path.clone(),
                    _tempfile: None,
                });
            }
            return Err(EngineError::EntrypointNotFound { path: path.clone() });
        }

        // Environment override.
        if let Ok(path) = std::env::var("BLENDNET_ENTRYPOINT") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(ResolvedEntrypoint {
                    path,
                    _tempfile: None,
                });
            }
            return Err(EngineError::EntrypointNotFound { path });
        }

        // Last resort: write the embedded entrypoint to a temp file.
        let mut file = tempfile::Builder::new()
            .prefix("blendnet_entrypoint_")
            .suffix(".py")
            .tempfile()?;
        file.write_all(EMBEDDED_ENTRYPOINT_PY.as_bytes())?;
        file.flush()?;

        Ok(ResolvedEntrypoint {
            path: file.path().to_path_buf(),
            _tempfile: Some(file),
        })
    }
}

impl Default for BlenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine for BlenderEngine {
    type Session = BlenderSession;

    fn open(&self, task: &TaskDescriptor, workdir: &Path) -> EngineResult<BlenderSession> {
        let blender_path = self.locate()?;
        let entrypoint = self.resolve_entrypoint()?;

        std::fs::create_dir_all(workdir)?;
        let settings = RenderSettings::for_task(task);
        let job_path = workdir.join("job.json");
        std::fs::write(&job_path, serde_json::to_vec_pretty(&settings)?)?;

        info!(
            project = %settings.project.display(),
            samples = settings.samples,
            seed = settings.seed,
            "prepared render session"
        );
        Ok(BlenderSession {
            blender_path,
            entrypoint,
            job_path,
            framebuffer: workdir.join(FRAMEBUFFER_FILENAME),
        })
    }
}

/// One prepared Blender render.
pub struct BlenderSession {
    blender_path: PathBuf,
    entrypoint: ResolvedEntrypoint,
    job_path: PathBuf,
    framebuffer: PathBuf,
}

impl RenderSession for BlenderSession {
    fn render(&self) -> EngineResult<()> {
        // blender --background --factory-startup --python entrypoint.py -- \
        //     --job job.json --framebuffer framebuffer.exr
        let mut cmd = Command::new(&self.blender_path);
        cmd.arg("--background")
            .arg("--factory-startup")
            .arg("--python")
            .arg(&self.entrypoint.path)
            .arg("--")
            .arg("--job")
            .arg(&self.job_path)
            .arg("--framebuffer")
            .arg(&self.framebuffer);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(EngineError::SpawnFailed)?;

        // Forward engine output; unresolved asset dependencies surface
        // here as warnings and do not abort the run.
        let forwarder = child.stdout.take().map(|stdout| {
            std::thread::spawn(move || {
                for line in BufReader::new(stdout).lines().map_while(Result::ok) {
                    match line.strip_prefix("DEP MISSING ") {
                        Some(asset) => warn!(asset, "unresolved external dependency"),
                        None => debug!("{line}"),
                    }
                }
            })
        });

        // No deadline here on purpose: the worker's sanctioned shutdown
        // paths are its `end` command and natural completion; kill policy
        // belongs to the supervisor.
        let output = child.wait_with_output().map_err(EngineError::SpawnFailed)?;
        if let Some(handle) = forwarder {
            let _ = handle.join();
        }

        if output.status.success() {
            return Ok(());
        }
        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code == EXIT_SAMPLING_INDETERMINATE {
            return Err(EngineError::SamplingIndeterminate);
        }
        Err(EngineError::process_failed(
            exit_code,
            String::from_utf8_lossy(&output.stderr),
        ))
    }

    fn snapshot(&self) -> EngineResult<FrameSnapshot> {
        // The entrypoint replaces the dump atomically, so this decodes a
        // complete (possibly one pass stale) frame.
        if !self.framebuffer.exists() {
            return Err(EngineError::NoFrame);
        }
        artifact::read_frame(&self.framebuffer)
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
    fn locate_honors_the_config_override() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("blender");
        std::fs::write(&fake, b"#!/bin/sh\n").unwrap();

        let engine = BlenderEngine::with_config(BlenderConfig {
            blender_path: Some(fake.clone()),
            entrypoint_path: None,
        });
        assert_eq!(engine.locate().unwrap(), fake);
    }

    #[test]
    fn resolve_entrypoint_rejects_a_missing_override() {
        let engine = BlenderEngine::with_config(BlenderConfig {
            blender_path: None,
            entrypoint_path: Some(PathBuf::from("this/does/not/exist.py")),
        });
        assert!(matches!(
            engine.resolve_entrypoint(),
            Err(EngineError::EntrypointNotFound { .. })
        ));
    }

    #[test]
    fn resolve_entrypoint_falls_back_to_embedded() {
        // If the user has configured an environment override, don't stomp it.
        if std::env::var_os("BLENDNET_ENTRYPOINT").is_some() {
            eprintln!("BLENDNET_ENTRYPOINT is set; skipping embedded entrypoint test");
            return;
        }

        let engine = BlenderEngine::new();
        let entrypoint = engine.resolve_entrypoint().unwrap();
        assert!(entrypoint.path.exists());

        let content = std::fs::read_to_string(&entrypoint.path).unwrap();
        assert!(content.contains("BlendNet render entrypoint"));
    }

    #[test]
    fn open_writes_the_job_file() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("blender");
        std::fs::write(&fake, b"#!/bin/sh\n").unwrap();

        let engine = BlenderEngine::with_config(BlenderConfig {
            blender_path: Some(fake),
            entrypoint_path: None,
        });
        let workdir = dir.path().join("work");
        let session = engine.open(&task(), &workdir).unwrap();

        let job: RenderSettings =
            serde_json::from_slice(&std::fs::read(workdir.join("job.json")).unwrap()).unwrap();
        assert_eq!(job, RenderSettings::for_task(&task()));
        assert!(matches!(session.snapshot(), Err(EngineError::NoFrame)));
    }

    #[test]
    fn snapshot_decodes_the_framebuffer_dump() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("blender");
        std::fs::write(&fake, b"#!/bin/sh\n").unwrap();

        let engine = BlenderEngine::with_config(BlenderConfig {
            blender_path: Some(fake),
            entrypoint_path: None,
        });
        let workdir = dir.path().join("work");
        let session = engine.open(&task(), &workdir).unwrap();

        let frame = FrameSnapshot::filled(2, 2, [0.5, 0.25, 0.125, 1.0]);
        let written = crate::artifact::save_render(&frame, &workdir).unwrap();
        std::fs::rename(written, workdir.join(FRAMEBUFFER_FILENAME)).unwrap();

        assert_eq!(session.snapshot().unwrap(), frame);
    }
}
