//! Manager configuration published alongside the deployment payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration blob a freshly booted manager instance retrieves from the
/// deployment bucket.
///
/// The typed fields cover what the bootstrap itself needs; everything else
/// an operator puts into the file is carried in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Session identifier shared by every resource of one deployment.
    pub session_id: String,

    /// Port the manager's API listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Bucket the deployment was published to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    /// Provider identifier the deployment targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Provider-specific settings, forwarded untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn default_listen_port() -> u16 {
    8443
}

impl ManagerConfig {
    /// Creates a config for `session_id` with default settings.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            listen_port: default_listen_port(),
            bucket: None,
            provider: None,
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn listen_port_defaults_when_absent() {
        let config: ManagerConfig =
            serde_json::from_value(json!({"session_id": "test-1"})).unwrap();
        assert_eq!(config.listen_port, 8443);
        assert_eq!(config.session_id, "test-1");
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let config: ManagerConfig = serde_json::from_value(json!({
            "session_id": "test-1",
            "listen_port": 9000,
            "zone": "europe-west1-b"
        }))
        .unwrap();
        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.extra.get("zone"), Some(&json!("europe-west1-b")));
    }

    #[test]
    fn extra_keys_survive_a_roundtrip() {
        let mut config = ManagerConfig::new("test-1");
        config
            .extra
            .insert("machine_type".to_string(), json!("e2-standard-8"));

        let blob = serde_json::to_vec(&config).unwrap();
        let back: ManagerConfig = serde_json::from_slice(&blob).unwrap();
        assert_eq!(back, config);
    }
}
