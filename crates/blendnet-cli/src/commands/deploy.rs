//! Deploy command implementation.
//!
//! Publishes the deployment payload and manager configuration to a bucket
//! through the selected provider.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use blendnet_providers::publish;
use blendnet_task::ManagerConfig;
use colored::Colorize;

use super::facade_for;

/// Run the deploy command.
///
/// # Arguments
/// * `bucket` - bucket receiving the payload
/// * `config_path` - manager config JSON file
/// * `root` - install root to package (default: current directory)
/// * `provider` - explicit provider id; auto-selection when `None`
///
/// # Returns
/// Exit code: 0 on success, 1 when the publish fails.
pub fn run(
    bucket: &str,
    config_path: &Path,
    root: Option<&Path>,
    provider: Option<&str>,
) -> Result<ExitCode> {
    let facade = facade_for(provider)?;

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read manager config {}", config_path.display()))?;
    let config: ManagerConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse manager config {}", config_path.display()))?;

    let cwd;
    let install_root = match root {
        Some(root) => root,
        None => {
            cwd = std::env::current_dir().context("failed to determine current directory")?;
            cwd.as_path()
        }
    };

    println!(
        "Publishing {} to bucket {} via provider {}",
        install_root.display(),
        bucket.bold(),
        facade.active().bold()
    );
    let summary = publish(&facade, bucket, install_root, &config)
        .with_context(|| format!("failed to publish to bucket {bucket}"))?;

    println!(
        "{} uploaded {} files ({} skipped), config for session {}",
        "SUCCESS".green().bold(),
        summary.uploaded,
        summary.skipped,
        config.session_id.bold()
    );
    Ok(ExitCode::SUCCESS)
}
