//! Doctor command implementation.
//!
//! Checks system dependencies and configuration.

use std::env;
use std::process::{Command, ExitCode};

use anyhow::Result;
use blendnet_engine::blender::BlenderEngine;
use blendnet_providers::ProviderRegistry;
use colored::Colorize;

/// Run the doctor command.
///
/// Checks:
/// - Blender installation and version
/// - working directory permissions
/// - provider readiness
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run() -> Result<ExitCode> {
    println!("{}", "BlendNet Doctor".cyan().bold());
    println!("{}", "===============".cyan());
    println!();

    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!(
        "  {} blendnet-cli v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("{}", "Dependencies:".bold());
    match check_blender() {
        BlenderStatus::Found(version) => {
            println!("  {} Blender {}", "ok".green(), version);
        }
        BlenderStatus::NotFound => {
            println!("  {} Blender not found", "!!".yellow());
            println!(
                "     {}",
                "Workers need Blender to render; install it or set BLENDER_PATH.".dimmed()
            );
            // not a hard failure: the control plane runs without Blender
        }
        BlenderStatus::Error(e) => {
            println!("  {} Blender check failed: {}", "!!".red(), e);
            all_ok = false;
        }
    }
    println!();

    println!("{}", "Permissions:".bold());
    match env::current_dir() {
        Ok(dir) => {
            let probe = dir.join(".blendnet_write_test");
            match std::fs::write(&probe, "test") {
                Ok(_) => {
                    let _ = std::fs::remove_file(&probe);
                    println!(
                        "  {} Current directory is writable ({})",
                        "ok".green(),
                        dir.display()
                    );
                }
                Err(e) => {
                    println!("  {} Cannot write to current directory: {}", "!!".red(), e);
                    all_ok = false;
                }
            }
        }
        Err(e) => {
            println!("  {} Cannot determine current directory: {}", "!!".red(), e);
            all_ok = false;
        }
    }
    println!();

    println!("{}", "Providers:".bold());
    let registry = ProviderRegistry::builtin();
    let ready = registry.ready();
    for (id, doc) in registry.docs() {
        if ready.contains(&id) {
            println!("  {} {} ({})", "ok".green(), id, doc.name.dimmed());
        } else {
            println!("  {} {} (dependencies missing)", "!!".yellow(), id);
        }
    }
    println!();

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

/// Status of the Blender installation check.
enum BlenderStatus {
    Found(String),
    NotFound,
    Error(String),
}

fn parse_blender_version(output: &str) -> Option<String> {
    output
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Blender "))
        .map(|v| v.trim().to_string())
}

/// Locates Blender the way the worker engine does, then probes its version.
fn check_blender() -> BlenderStatus {
    let blender = match BlenderEngine::new().locate() {
        Ok(path) => path,
        Err(_) => return BlenderStatus::NotFound,
    };

    match Command::new(&blender).arg("--version").output() {
        Ok(output) => {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let version =
                    parse_blender_version(&stdout).unwrap_or_else(|| "unknown".to_string());
                BlenderStatus::Found(version)
            } else {
                BlenderStatus::Error(format!("Blender exited with status: {}", output.status))
            }
        }
        Err(e) => BlenderStatus::Error(e.to_string()),
    }
}
