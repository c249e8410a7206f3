//! Provider registration and discovery queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::local::LocalProvider;
use crate::provider::{Provider, ProviderError};

/// Identifier of the built-in fallback provider.
pub const LOCAL_PROVIDER: &str = "local";

/// Short name and description extracted from a provider's documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDoc {
    pub name: String,
    pub description: String,
}

/// Errors raised while registering providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A provider with this identifier is already registered.
    #[error("provider already registered: {0}")]
    AlreadyRegistered(String),

    /// Identifiers with a leading underscore are reserved.
    #[error("provider identifier is reserved: {0}")]
    ReservedIdentifier(String),

    /// The provider reported an empty identifier.
    #[error("provider identifier is empty")]
    EmptyIdentifier,
}

/// The set of providers known to this process.
///
/// Populated once at startup through [`ProviderRegistry::register`] calls
/// and read-only afterwards. Iteration follows identifier order, which
/// keeps auto-selection deterministic.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn Provider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates a registry holding only the built-in `local` provider.
    pub fn builtin() -> Self {
        Self::with_local(LocalProvider::default())
    }

    /// Creates a registry whose `local` fallback uses a custom storage
    /// root. Mostly useful for tooling and tests.
    pub fn with_local(local: LocalProvider) -> Self {
        let mut providers: BTreeMap<String, Arc<dyn Provider>> = BTreeMap::new();
        providers.insert(LOCAL_PROVIDER.to_string(), Arc::new(local));
        Self { providers }
    }

    /// Registers a provider under its own identifier.
    ///
    /// `local` is installed by construction and cannot be replaced, and
    /// there is no unregister: the fallback stays available for the whole
    /// process lifetime.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let id = provider.id();
        if id.is_empty() {
            return Err(RegistryError::EmptyIdentifier);
        }
        if id.starts_with('_') {
            return Err(RegistryError::ReservedIdentifier(id.to_string()));
        }
        if self.providers.contains_key(id) {
            return Err(RegistryError::AlreadyRegistered(id.to_string()));
        }
        self.providers.insert(id.to_string(), provider);
        Ok(())
    }

    /// Looks up a provider by identifier.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }

    /// Registered identifiers in iteration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Registered providers in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Provider>)> {
        self.providers.iter().map(|(id, p)| (id.as_str(), p))
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always false: `local` is registered by construction.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Extracts `(name, description)` documentation for every provider.
    ///
    /// The first documentation line is the short name, the remainder the
    /// description. Malformed documentation fails soft: a missing
    /// description becomes empty, an empty doc string falls back to the
    /// identifier.
    pub fn docs(&self) -> BTreeMap<String, ProviderDoc> {
        self.providers
            .iter()
            .map(|(id, provider)| {
                let doc = provider.doc().trim();
                let (name, description) = match doc.split_once('\n') {
                    Some((first, rest)) => (first.trim().to_string(), rest.trim().to_string()),
                    None if doc.is_empty() => (id.clone(), String::new()),
                    None => (doc.to_string(), String::new()),
                };
                (id.clone(), ProviderDoc { name, description })
            })
            .collect()
    }

    /// Identifiers of providers whose external dependencies are satisfied.
    ///
    /// A provider without a dependency check counts as not ready. `local`
    /// needs nothing and is always appended last.
    pub fn ready(&self) -> Vec<String> {
        let mut ready: Vec<String> = self
            .providers
            .iter()
            .filter(|(id, _)| id.as_str() != LOCAL_PROVIDER)
            .filter(|(id, provider)| match provider.check_dependencies() {
                Ok(satisfied) => satisfied,
                Err(ProviderError::Unsupported) => false,
                Err(error) => {
                    warn!(provider = %id, error = %error, "dependency check failed");
                    false
                }
            })
            .map(|(id, _)| id.clone())
            .collect();
        ready.push(LOCAL_PROVIDER.to_string());
        ready
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderCall;
    use pretty_assertions::assert_eq;

    struct Fake {
        id: &'static str,
        doc: &'static str,
        deps: Option<ProviderCall<bool>>,
    }

    impl Fake {
        fn new(id: &'static str, doc: &'static str) -> Self {
            Self {
                id,
                doc,
                deps: None,
            }
        }

        fn with_deps(id: &'static str, ready: bool) -> Self {
            Self {
                id,
                doc: "Fake\nTest provider",
                deps: Some(Ok(ready)),
            }
        }
    }

    impl Provider for Fake {
        fn id(&self) -> &'static str {
            self.id
        }
        fn doc(&self) -> &'static str {
            self.doc
        }
        fn check_dependencies(&self) -> ProviderCall<bool> {
            match &self.deps {
                Some(Ok(ready)) => Ok(*ready),
                Some(Err(_)) => Err(ProviderError::backend("dependency probe broke")),
                None => Err(ProviderError::Unsupported),
            }
        }
    }

    #[test]
    fn builtin_registers_local() {
        let registry = ProviderRegistry::builtin();
        assert!(registry.contains(LOCAL_PROVIDER));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_rejects_duplicates() {
        let mut registry = ProviderRegistry::builtin();
        registry
            .register(Arc::new(Fake::new("gcp", "GCP\nGoogle Cloud")))
            .unwrap();

        let err = registry
            .register(Arc::new(Fake::new("gcp", "GCP\nGoogle Cloud")))
            .unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered("gcp".to_string()));
    }

    #[test]
    fn register_rejects_local_replacement() {
        let mut registry = ProviderRegistry::builtin();
        let err = registry
            .register(Arc::new(Fake::new("local", "Impostor\nNot the fallback")))
            .unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered("local".to_string()));
    }

    #[test]
    fn register_rejects_reserved_identifiers() {
        let mut registry = ProviderRegistry::builtin();
        let err = registry
            .register(Arc::new(Fake::new("_private", "Private\nHidden")))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::ReservedIdentifier("_private".to_string())
        );
    }

    #[test]
    fn docs_split_name_and_description() {
        let mut registry = ProviderRegistry::builtin();
        registry
            .register(Arc::new(Fake::new(
                "gcp",
                "Google Cloud\nRenders on Compute Engine instances",
            )))
            .unwrap();

        let docs = registry.docs();
        let gcp = &docs["gcp"];
        assert_eq!(gcp.name, "Google Cloud");
        assert_eq!(gcp.description, "Renders on Compute Engine instances");
    }

    #[test]
    fn docs_fail_soft_on_malformed_documentation() {
        let mut registry = ProviderRegistry::builtin();
        registry
            .register(Arc::new(Fake::new("oneline", "Just a name")))
            .unwrap();
        registry.register(Arc::new(Fake::new("blank", ""))).unwrap();

        let docs = registry.docs();
        assert_eq!(docs["oneline"].name, "Just a name");
        assert_eq!(docs["oneline"].description, "");
        assert_eq!(docs["blank"].name, "blank");
    }

    #[test]
    fn ready_always_includes_local() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.ready(), vec![LOCAL_PROVIDER.to_string()]);
    }

    #[test]
    fn ready_gates_on_dependency_check() {
        let mut registry = ProviderRegistry::builtin();
        registry
            .register(Arc::new(Fake::with_deps("ready", true)))
            .unwrap();
        registry
            .register(Arc::new(Fake::with_deps("unready", false)))
            .unwrap();
        registry
            .register(Arc::new(Fake::new("unchecked", "Unchecked\nNo deps probe")))
            .unwrap();

        let ready = registry.ready();
        assert!(ready.contains(&"ready".to_string()));
        assert!(!ready.contains(&"unready".to_string()));
        assert!(!ready.contains(&"unchecked".to_string()));
        assert_eq!(ready.last().map(String::as_str), Some(LOCAL_PROVIDER));
    }
}
