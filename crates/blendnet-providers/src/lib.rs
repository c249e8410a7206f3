//! BlendNet provider plugin framework.
//!
//! A *provider* is a pluggable backend for one infrastructure environment:
//! it creates and supervises instances, owns a bucket-style object store,
//! and knows how to answer "am I running inside this environment?". The
//! framework in this crate keeps the rest of the system completely
//! provider-agnostic:
//!
//! 1. **Contract** ([`Provider`]): every capability is optional. A backend
//!    implements what it supports; everything else reports
//!    [`ProviderError::Unsupported`].
//! 2. **Registry** ([`ProviderRegistry`]): identifier-keyed set of
//!    providers, populated once at startup. The built-in `local` provider
//!    is always present and is the universal fallback.
//! 3. **Selection & dispatch** ([`Facade`]): picks the active provider
//!    (explicitly or by probing location checks) and forwards named
//!    operations to it. Missing capabilities and provider-side failures
//!    are absorbed into caller-supplied defaults; callers never see a
//!    partial-implementation error.
//! 4. **Publishing** ([`publish`]): seeds a bucket with the system's own
//!    payload plus a configuration blob so fresh instances can bootstrap
//!    from the bucket alone.

pub mod facade;
pub mod local;
pub mod provider;
pub mod publish;
pub mod registry;

pub use facade::{Facade, UnknownProviderError};
pub use local::LocalProvider;
pub use provider::{InfoMap, Provider, ProviderCall, ProviderError};
pub use publish::{publish, PublishError, PublishSummary, BUCKET_NAMESPACE, MANAGER_CONFIG_KEY};
pub use registry::{ProviderDoc, ProviderRegistry, RegistryError, LOCAL_PROVIDER};
