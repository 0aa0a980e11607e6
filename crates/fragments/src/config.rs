//! Configuration for a single file-backed store.
//!
//! Service-level settings (data directory, read-only mode) live in
//! `fragconf`; the server maps them onto a `StoreConfig` per namespace.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a file-backed [`FileStore`](crate::file_store::FileStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one subdirectory per owner.
    pub base_path: PathBuf,

    /// Read-only mode - rejects put and delete.
    #[serde(default)]
    pub read_only: bool,
}

impl StoreConfig {
    pub fn with_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            read_only: false,
        }
    }

    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            read_only: true,
        }
    }

    /// A config rooted at `{base_path}/{namespace}`.
    ///
    /// Metadata and data stores share a base path but never a namespace.
    pub fn for_namespace(&self, namespace: &str) -> Self {
        Self {
            base_path: self.base_path.join(namespace),
            read_only: self.read_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaces_are_disjoint() {
        let config = StoreConfig::with_base_path("/srv/fragments");
        let meta = config.for_namespace("metadata");
        let data = config.for_namespace("data");
        assert_eq!(meta.base_path, PathBuf::from("/srv/fragments/metadata"));
        assert_eq!(data.base_path, PathBuf::from("/srv/fragments/data"));
        assert_ne!(meta.base_path, data.base_path);
    }

    #[test]
    fn test_read_only_propagates_to_namespace() {
        let config = StoreConfig::read_only("/srv/fragments");
        assert!(config.for_namespace("data").read_only);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = StoreConfig::read_only("/custom/store");
        let json = serde_json::to_string(&config).unwrap();
        let restored: StoreConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.base_path, restored.base_path);
        assert_eq!(config.read_only, restored.read_only);
    }
}
