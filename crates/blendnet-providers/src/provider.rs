//! The provider capability contract.

use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

/// JSON object carrying provider-reported information.
pub type InfoMap = Map<String, Value>;

/// Result of invoking one provider capability.
pub type ProviderCall<T> = Result<T, ProviderError>;

/// Errors surfaced by provider capability implementations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider does not implement this capability. Not a failure:
    /// the dispatch layer substitutes the caller's default.
    #[error("capability not implemented by this provider")]
    Unsupported,

    /// The backing service rejected or failed the operation.
    #[error("provider backend failure: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Creates a backend failure from any message.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Short failure-class label for log lines.
    pub fn class(&self) -> &'static str {
        match self {
            ProviderError::Unsupported => "unsupported",
            ProviderError::Backend(_) => "backend",
            ProviderError::Io(_) => "io",
            ProviderError::Json(_) => "json",
        }
    }
}

fn unsupported<T>() -> ProviderCall<T> {
    Err(ProviderError::Unsupported)
}

/// A pluggable infrastructure backend.
///
/// Every capability below is optional: the default body reports
/// [`ProviderError::Unsupported`], which [`Facade`](crate::Facade)
/// dispatch converts into the caller's default value. Implementations
/// override only what their backend actually supports; absence is not an
/// error anywhere in the framework.
pub trait Provider: Send + Sync {
    /// Stable identifier this provider registers under.
    fn id(&self) -> &'static str;

    /// Two-line documentation: short display name, newline, description.
    fn doc(&self) -> &'static str;

    /// Whether this process is currently running inside the provider's
    /// environment.
    fn check_location(&self) -> ProviderCall<bool> {
        unsupported()
    }

    /// Whether the local tooling and credentials this provider depends on
    /// are present.
    fn check_dependencies(&self) -> ProviderCall<bool> {
        unsupported()
    }

    /// Information about the provider itself.
    fn provider_info(&self) -> ProviderCall<InfoMap> {
        unsupported()
    }

    /// Available instance types, keyed by type name.
    fn instance_types(&self) -> ProviderCall<InfoMap> {
        unsupported()
    }

    /// Ensures `bucket` exists in the provider's object store.
    fn create_bucket(&self, _bucket: &str) -> ProviderCall<()> {
        unsupported()
    }

    /// Uploads a file to `bucket`, under `dest` when given, otherwise
    /// under the source file name.
    fn upload_file(&self, _path: &Path, _bucket: &str, _dest: Option<&str>) -> ProviderCall<Value> {
        unsupported()
    }

    /// Uploads raw bytes to `bucket` under `dest`.
    fn upload_data(&self, _data: &[u8], _bucket: &str, _dest: &str) -> ProviderCall<Value> {
        unsupported()
    }

    /// Downloads the object at `path` from `bucket`.
    fn download_data(&self, _bucket: &str, _path: &str) -> ProviderCall<Vec<u8>> {
        unsupported()
    }

    /// Allocated manager and agent resources for a session.
    fn resources(&self, _session_id: &str) -> ProviderCall<InfoMap> {
        unsupported()
    }

    /// Bucket name this provider uses for a session.
    fn bucket_name(&self, _session_id: &str) -> ProviderCall<String> {
        unsupported()
    }

    /// Manager instance name for a session.
    fn manager_name(&self, _session_id: &str) -> ProviderCall<String> {
        unsupported()
    }

    /// Name prefix shared by all agent instances of a session.
    fn agent_name_prefix(&self, _session_id: &str) -> ProviderCall<String> {
        unsupported()
    }

    /// Default instance size for managers.
    fn manager_size_default(&self) -> ProviderCall<String> {
        unsupported()
    }

    /// Default instance size for agents.
    fn agent_size_default(&self) -> ProviderCall<String> {
        unsupported()
    }

    /// Creates a manager instance and returns its name.
    fn create_manager_instance(
        &self,
        _instance_type: &str,
        _session_id: &str,
        _name: &str,
    ) -> ProviderCall<String> {
        unsupported()
    }

    /// Creates an agent instance and returns its name.
    fn create_agent_instance(
        &self,
        _instance_type: &str,
        _session_id: &str,
        _name: &str,
    ) -> ProviderCall<String> {
        unsupported()
    }

    /// Starts a stopped instance.
    fn start_instance(&self, _name: &str) -> ProviderCall<String> {
        unsupported()
    }

    /// Stops a running instance.
    fn stop_instance(&self, _name: &str) -> ProviderCall<String> {
        unsupported()
    }

    /// Opens `port` for instances carrying `target_tag`.
    fn create_firewall(&self, _target_tag: &str, _port: u16) -> ProviderCall<Value> {
        unsupported()
    }
}
