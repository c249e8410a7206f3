//! Info command implementation.
//!
//! Shows the active provider and the session's resource naming.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use super::facade_for;

/// Run the info command.
///
/// # Returns
/// Exit code: always 0.
pub fn run(session: &str, provider: Option<&str>, json_output: bool) -> Result<ExitCode> {
    let facade = facade_for(provider)?;

    let info = facade.provider_info();
    let instance_types = facade.instance_types();
    let resources = facade.resources(session);

    if json_output {
        let payload = json!({
            "provider": facade.active(),
            "info": info,
            "instance_types": instance_types,
            "session": {
                "id": session,
                "bucket": facade.bucket_name(session),
                "manager": facade.manager_name(session),
                "agent_prefix": facade.agent_name_prefix(session),
                "resources": resources,
            },
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{} {}", "Active provider:".bold(), facade.active());
    for (key, value) in &info {
        println!("  {} {}", format!("{key}:").dimmed(), value);
    }
    println!();
    println!("{} {}", "Session:".bold(), session);
    println!(
        "  {} {}",
        "bucket:".dimmed(),
        facade
            .bucket_name(session)
            .unwrap_or_else(|| "(provider has no bucket naming)".to_string())
    );
    println!("  {} {}", "manager:".dimmed(), facade.manager_name(session));
    println!(
        "  {} {}",
        "agents:".dimmed(),
        format!("{}*", facade.agent_name_prefix(session))
    );
    if !instance_types.is_empty() {
        println!();
        println!("{}", "Instance types:".bold());
        for (name, detail) in &instance_types {
            println!("  {} {}", name, detail.to_string().dimmed());
        }
    }
    Ok(ExitCode::SUCCESS)
}
