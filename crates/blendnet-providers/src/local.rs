//! The built-in `local` provider.
//!
//! Keeps everything on the machine itself: a bucket is a directory under a
//! storage root, and instance management is left to the operator. This
//! provider has no external dependencies, which is what makes it the
//! universal fallback - it is registered unconditionally and exempt from
//! location and dependency checks.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};

use crate::provider::{InfoMap, Provider, ProviderCall, ProviderError};

/// Filesystem-backed fallback provider, always registered.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    /// Creates a provider storing buckets under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default storage root under the user's local data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("blendnet")
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// Resolves an object key inside a bucket, dropping empty and parent
    /// components so a key can never escape the bucket directory.
    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        let mut path = self.bucket_dir(bucket);
        for part in key.split('/').filter(|p| !p.is_empty() && *p != "..") {
            path.push(part);
        }
        path
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new(Self::default_root())
    }
}

impl Provider for LocalProvider {
    fn id(&self) -> &'static str {
        "local"
    }

    fn doc(&self) -> &'static str {
        "Local\nKeeps rendering on this machine; bucket storage is a plain directory and no cloud resources are created"
    }

    fn provider_info(&self) -> ProviderCall<InfoMap> {
        let mut info = InfoMap::new();
        info.insert("name".to_string(), json!("local"));
        info.insert(
            "storage_root".to_string(),
            json!(self.root.display().to_string()),
        );
        Ok(info)
    }

    fn create_bucket(&self, bucket: &str) -> ProviderCall<()> {
        fs::create_dir_all(self.bucket_dir(bucket))?;
        Ok(())
    }

    fn upload_file(&self, path: &Path, bucket: &str, dest: Option<&str>) -> ProviderCall<Value> {
        let key = match dest {
            Some(dest) => dest.to_string(),
            None => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .ok_or_else(|| ProviderError::backend("upload source has no file name"))?,
        };
        let target = self.object_path(bucket, &key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target)?;
        Ok(json!(target.display().to_string()))
    }

    fn upload_data(&self, data: &[u8], bucket: &str, dest: &str) -> ProviderCall<Value> {
        let target = self.object_path(bucket, dest);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, data)?;
        Ok(json!(target.display().to_string()))
    }

    fn download_data(&self, bucket: &str, path: &str) -> ProviderCall<Vec<u8>> {
        Ok(fs::read(self.object_path(bucket, path))?)
    }

    fn resources(&self, _session_id: &str) -> ProviderCall<InfoMap> {
        // nothing is provisioned locally; the operator runs processes
        let mut resources = InfoMap::new();
        resources.insert("manager".to_string(), Value::Null);
        resources.insert("agents".to_string(), json!({}));
        Ok(resources)
    }

    fn bucket_name(&self, session_id: &str) -> ProviderCall<String> {
        Ok(format!("blendnet-{session_id}-local"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn provider() -> (tempfile::TempDir, LocalProvider) {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new(dir.path().join("storage"));
        (dir, provider)
    }

    #[test]
    fn create_bucket_is_idempotent() {
        let (_dir, provider) = provider();
        provider.create_bucket("b").unwrap();
        provider.create_bucket("b").unwrap();
    }

    #[test]
    fn upload_data_then_download_roundtrips() {
        let (_dir, provider) = provider();
        provider.create_bucket("b").unwrap();
        provider
            .upload_data(b"payload", "b", "work_manager/manager.json")
            .unwrap();
        assert_eq!(
            provider.download_data("b", "work_manager/manager.json").unwrap(),
            b"payload".to_vec()
        );
    }

    #[test]
    fn upload_file_defaults_to_source_name() {
        let (dir, provider) = provider();
        let source = dir.path().join("scene.blend");
        fs::write(&source, b"blend").unwrap();

        provider.create_bucket("b").unwrap();
        provider.upload_file(&source, "b", None).unwrap();
        assert_eq!(provider.download_data("b", "scene.blend").unwrap(), b"blend");
    }

    #[test]
    fn object_keys_cannot_escape_the_bucket() {
        let (_dir, provider) = provider();
        let path = provider.object_path("b", "../../etc/passwd");
        assert!(path.starts_with(provider.bucket_dir("b")));
    }

    #[test]
    fn download_missing_object_is_an_io_error() {
        let (_dir, provider) = provider();
        provider.create_bucket("b").unwrap();
        assert!(matches!(
            provider.download_data("b", "absent"),
            Err(ProviderError::Io(_))
        ));
    }

    #[test]
    fn bucket_name_is_deterministic() {
        let (_dir, provider) = provider();
        assert_eq!(provider.bucket_name("s1").unwrap(), "blendnet-s1-local");
    }
}
