//! Deployment publishing.
//!
//! Packages the system's own install tree and a manager configuration into
//! the active provider's bucket so a freshly booted instance can retrieve
//! both code and configuration from the bucket alone.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::facade::Facade;

/// Namespace prefix every uploaded payload file lives under.
pub const BUCKET_NAMESPACE: &str = "blendnet";

/// Well-known key a booting manager reads its configuration from.
pub const MANAGER_CONFIG_KEY: &str = "blendnet/work_manager/manager.json";

/// Errors raised by a publish run.
///
/// Provider-side upload failures are absorbed by the dispatch facade and
/// only counted; what can fail here is assembling the payload itself, plus
/// the one upload a deployment cannot function without.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize manager config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to walk install root {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("manager config upload was not accepted by the provider")]
    ConfigRejected,
}

/// Outcome of a publish run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishSummary {
    /// Payload files the provider accepted.
    pub uploaded: usize,
    /// Payload files the provider dropped (missing capability or failure).
    pub skipped: usize,
}

/// Publishes the install tree under `install_root` and `config` to
/// `bucket` via the facade's active provider.
///
/// Files are uploaded one by one under `blendnet/<relative path>`, then
/// the serialized config lands at the well-known
/// [`MANAGER_CONFIG_KEY`]. Returns how many payload uploads the provider
/// accepted.
pub fn publish<C: Serialize>(
    facade: &Facade,
    bucket: &str,
    install_root: &Path,
    config: &C,
) -> Result<PublishSummary, PublishError> {
    info!(bucket, provider = facade.active(), "publishing deployment payload");
    facade.create_bucket(bucket);

    let files = collect_payload(install_root)?;
    let mut summary = PublishSummary::default();
    // TODO: upload in parallel once providers expose thread-safe clients
    for (dest, path) in &files {
        match facade.upload_file(path, bucket, Some(dest)) {
            Some(_) => summary.uploaded += 1,
            None => {
                warn!(file = %path.display(), dest = %dest, "payload upload skipped");
                summary.skipped += 1;
            }
        }
    }

    let blob = serde_json::to_vec(config)?;
    if facade.upload_data(&blob, bucket, MANAGER_CONFIG_KEY).is_none() {
        return Err(PublishError::ConfigRejected);
    }
    info!(
        uploaded = summary.uploaded,
        skipped = summary.skipped,
        "deployment published"
    );
    Ok(summary)
}

/// Maps every payload file under `root` to its bucket destination.
///
/// Hidden entries and build output are not part of the deployment payload.
/// The map is keyed by destination, so upload order is deterministic.
fn collect_payload(root: &Path) -> Result<BTreeMap<String, PathBuf>, PublishError> {
    let mut files = BTreeMap::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        !(entry.depth() > 0 && name.starts_with('.')) && name != "target"
    });
    for entry in walker {
        let entry = entry.map_err(|source| PublishError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .expect("walked path stays under its root");
        let mut dest = String::from(BUCKET_NAMESPACE);
        for component in rel.components() {
            dest.push('/');
            dest.push_str(&component.as_os_str().to_string_lossy());
        }
        files.insert(dest, entry.path().to_path_buf());
    }
    Ok(files)
}
