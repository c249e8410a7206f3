//! Providers command implementation.
//!
//! Lists registered providers with their documentation and readiness.

use std::process::ExitCode;

use anyhow::Result;
use blendnet_providers::ProviderRegistry;
use colored::Colorize;
use serde_json::json;

/// Run the providers command.
///
/// # Returns
/// Exit code: always 0; readiness is informational.
pub fn run(json_output: bool) -> Result<ExitCode> {
    let registry = ProviderRegistry::builtin();
    let docs = registry.docs();
    let ready = registry.ready();

    if json_output {
        let entries: Vec<_> = docs
            .iter()
            .map(|(id, doc)| {
                json!({
                    "id": id,
                    "name": doc.name,
                    "description": doc.description,
                    "ready": ready.contains(id),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json!(entries))?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Registered providers".cyan().bold());
    println!();
    for (id, doc) in &docs {
        let marker = if ready.contains(id) {
            "ok".green()
        } else {
            "!!".yellow()
        };
        println!("  {} {} - {}", marker, id.bold(), doc.name);
        if !doc.description.is_empty() {
            println!("     {}", doc.description.dimmed());
        }
    }
    println!();
    println!(
        "{} of {} providers ready",
        ready.len().to_string().green(),
        docs.len()
    );
    Ok(ExitCode::SUCCESS)
}
