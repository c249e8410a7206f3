//! BlendNet render worker.
//!
//! One worker process runs exactly one render task. The render itself is a
//! single blocking engine call; everything else happens around it:
//!
//! - a command channel on stdin accepts `savePreview`, `saveRender` and
//!   `end` for the whole process lifetime, snapshotting the in-flight
//!   result buffer on demand ([`channel`]);
//! - the platform's terminate signal is absorbed, not obeyed - the host
//!   orchestrator recycles instances for reasons unrelated to this task,
//!   and the only sanctioned shutdown paths are the `end` command and
//!   natural completion ([`runner`]);
//! - when the render returns, the final result is saved unconditionally
//!   and the process exits through a small fixed exit-code table.

pub mod channel;
pub mod commands;
pub mod runner;

pub use commands::{Command, UnknownCommand};
pub use runner::{
    run_task, WorkerError, EXIT_CONFIG, EXIT_OK, EXIT_RENDER, EXIT_TASK,
};
