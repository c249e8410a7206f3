//! Command implementations for the `blendnet` binary.
//!
//! Each command follows the same shape: a `run` function returning
//! `anyhow::Result<ExitCode>`, human output on stdout, machine output
//! behind a `--json` flag where it makes sense.

pub mod deploy;
pub mod doctor;
pub mod info;
pub mod providers;

use blendnet_providers::{Facade, ProviderRegistry, UnknownProviderError};

/// Builds the facade every command dispatches through.
///
/// With an explicit identifier the selection must succeed; otherwise the
/// facade probes provider location checks and falls back to `local`.
pub(crate) fn facade_for(provider: Option<&str>) -> Result<Facade, UnknownProviderError> {
    let mut facade = Facade::new(ProviderRegistry::builtin());
    match provider {
        Some(id) => facade.select(id)?,
        None => {
            facade.auto_select();
        }
    }
    Ok(facade)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_for_defaults_to_auto_selection() {
        let facade = facade_for(None).unwrap();
        assert_eq!(facade.active(), blendnet_providers::LOCAL_PROVIDER);
    }

    #[test]
    fn facade_for_rejects_unknown_providers() {
        let err = facade_for(Some("ec2")).unwrap_err();
        assert_eq!(err, UnknownProviderError("ec2".to_string()));
    }
}
