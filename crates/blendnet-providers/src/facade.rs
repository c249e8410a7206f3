//! Provider selection and safe dispatch.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::provider::{InfoMap, Provider, ProviderCall, ProviderError};
use crate::registry::{ProviderRegistry, LOCAL_PROVIDER};

/// Raised by [`Facade::select`] for identifiers that are not registered.
///
/// The one plugin-framework failure that is not swallowed: an unknown
/// selection is a programming or configuration mistake, not a runtime
/// capability gap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider \"{0}\"")]
pub struct UnknownProviderError(pub String);

/// Dispatch context over the registry and the active provider selection.
///
/// This is the only entry point orchestration code uses to talk to a
/// provider. Every named operation resolves the active provider, invokes
/// the capability, and substitutes the operation's default when the
/// capability is missing or fails; failures surface only as warning logs.
///
/// The facade carries no locking: orchestration-side use is
/// single-threaded with respect to selection. Thread it through call
/// sites or put it behind external synchronization.
pub struct Facade {
    registry: ProviderRegistry,
    active: String,
}

impl std::fmt::Debug for Facade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Facade")
            .field("registry", &self.registry)
            .field("active", &self.active)
            .finish()
    }
}

impl Facade {
    /// Creates a facade over `registry` with `local` active.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            active: LOCAL_PROVIDER.to_string(),
        }
    }

    /// The registry this facade dispatches over.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Identifier of the active provider.
    pub fn active(&self) -> &str {
        &self.active
    }

    /// Explicitly overrides the active provider.
    ///
    /// Unknown identifiers leave the selection unchanged. Selection is
    /// idempotent and may be called again to switch providers within the
    /// same process, which tooling uses to target providers other than
    /// the ambient one.
    pub fn select(&mut self, id: &str) -> Result<(), UnknownProviderError> {
        if !self.registry.contains(id) {
            return Err(UnknownProviderError(id.to_string()));
        }
        self.active = id.to_string();
        Ok(())
    }

    /// Picks the provider whose environment this process runs inside.
    ///
    /// Non-local providers are probed in registry order; the first
    /// positive location check wins. A probe that is unsupported, answers
    /// no, or fails counts as "not here", so `local` is the guaranteed
    /// fallback. Returns the selected identifier.
    pub fn auto_select(&mut self) -> &str {
        let located = self
            .registry
            .iter()
            .filter(|(id, _)| *id != LOCAL_PROVIDER)
            .find_map(|(id, provider)| match provider.check_location() {
                Ok(true) => Some(id.to_string()),
                Ok(false) | Err(ProviderError::Unsupported) => None,
                Err(error) => {
                    warn!(provider = %id, error = %error, "location check failed");
                    None
                }
            });
        self.active = located.unwrap_or_else(|| LOCAL_PROVIDER.to_string());
        &self.active
    }

    fn active_provider(&self) -> &Arc<dyn Provider> {
        // `select` validates identifiers and the registry has no removal,
        // so the active identifier is always resolvable.
        self.registry
            .get(&self.active)
            .expect("active provider is registered")
    }

    /// Uniform dispatch envelope: unsupported capabilities yield the
    /// default silently; any other failure is logged once and downgraded
    /// to the default. Nothing propagates to the caller.
    fn dispatch<T>(
        &self,
        operation: &'static str,
        default: T,
        call: impl FnOnce(&dyn Provider) -> ProviderCall<T>,
    ) -> T {
        match call(self.active_provider().as_ref()) {
            Ok(value) => value,
            Err(ProviderError::Unsupported) => default,
            Err(error) => {
                warn!(
                    provider = %self.active,
                    operation,
                    class = error.class(),
                    error = %error,
                    "provider call failed; using default",
                );
                default
            }
        }
    }

    fn dispatch_opt<T>(
        &self,
        operation: &'static str,
        call: impl FnOnce(&dyn Provider) -> ProviderCall<T>,
    ) -> Option<T> {
        self.dispatch(operation, None, |provider| call(provider).map(Some))
    }

    /// Information map describing the active provider.
    pub fn provider_info(&self) -> InfoMap {
        self.dispatch("provider_info", InfoMap::new(), |p| p.provider_info())
    }

    /// Available instance types of the active provider.
    pub fn instance_types(&self) -> InfoMap {
        self.dispatch("instance_types", InfoMap::new(), |p| p.instance_types())
    }

    /// Ensures `bucket` exists; a no-op for providers without storage.
    pub fn create_bucket(&self, bucket: &str) {
        self.dispatch("create_bucket", (), |p| p.create_bucket(bucket))
    }

    /// Uploads a file to the provider's object store.
    pub fn upload_file(&self, path: &Path, bucket: &str, dest: Option<&str>) -> Option<Value> {
        self.dispatch_opt("upload_file", |p| p.upload_file(path, bucket, dest))
    }

    /// Uploads raw bytes to the provider's object store.
    pub fn upload_data(&self, data: &[u8], bucket: &str, dest: &str) -> Option<Value> {
        self.dispatch_opt("upload_data", |p| p.upload_data(data, bucket, dest))
    }

    /// Downloads an object from the provider's object store.
    pub fn download_data(&self, bucket: &str, path: &str) -> Option<Vec<u8>> {
        self.dispatch_opt("download_data", |p| p.download_data(bucket, path))
    }

    /// Allocated manager and agent resources for `session_id`.
    pub fn resources(&self, session_id: &str) -> InfoMap {
        self.dispatch("resources", InfoMap::new(), |p| p.resources(session_id))
    }

    /// Bucket name for `session_id`, when the provider defines one.
    pub fn bucket_name(&self, session_id: &str) -> Option<String> {
        self.dispatch_opt("bucket_name", |p| p.bucket_name(session_id))
    }

    /// Manager instance name for `session_id`;
    /// `blendnet-{session}-manager` unless the provider overrides it.
    pub fn manager_name(&self, session_id: &str) -> String {
        self.dispatch(
            "manager_name",
            format!("blendnet-{session_id}-manager"),
            |p| p.manager_name(session_id),
        )
    }

    /// Agent name prefix for `session_id`;
    /// `blendnet-{session}-agent-` unless the provider overrides it.
    pub fn agent_name_prefix(&self, session_id: &str) -> String {
        self.dispatch(
            "agent_name_prefix",
            format!("blendnet-{session_id}-agent-"),
            |p| p.agent_name_prefix(session_id),
        )
    }

    /// Default manager instance size; empty when the provider has none.
    pub fn manager_size_default(&self) -> String {
        self.dispatch("manager_size_default", String::new(), |p| {
            p.manager_size_default()
        })
    }

    /// Default agent instance size; empty when the provider has none.
    pub fn agent_size_default(&self) -> String {
        self.dispatch("agent_size_default", String::new(), |p| {
            p.agent_size_default()
        })
    }

    /// Creates a manager instance; returns its name, or empty on no-op.
    pub fn create_manager_instance(
        &self,
        instance_type: &str,
        session_id: &str,
        name: &str,
    ) -> String {
        self.dispatch("create_manager_instance", String::new(), |p| {
            p.create_manager_instance(instance_type, session_id, name)
        })
    }

    /// Creates an agent instance; returns its name, or empty on no-op.
    pub fn create_agent_instance(
        &self,
        instance_type: &str,
        session_id: &str,
        name: &str,
    ) -> String {
        self.dispatch("create_agent_instance", String::new(), |p| {
            p.create_agent_instance(instance_type, session_id, name)
        })
    }

    /// Starts a stopped instance.
    pub fn start_instance(&self, name: &str) -> String {
        self.dispatch("start_instance", String::new(), |p| p.start_instance(name))
    }

    /// Stops a running instance.
    pub fn stop_instance(&self, name: &str) -> String {
        self.dispatch("stop_instance", String::new(), |p| p.stop_instance(name))
    }

    /// Opens `port` for instances carrying `target_tag`.
    pub fn create_firewall(&self, target_tag: &str, port: u16) -> Option<Value> {
        self.dispatch_opt("create_firewall", |p| p.create_firewall(target_tag, port))
    }
}
