//! FileStore: filesystem-backed [`KeyValueStore`].
//!
//! Layout:
//! ```text
//! {base_path}/
//! ├── 6f776e657231/          # hex(owner key)
//! │   ├── 3a2b...            # hex(item key)
//! │   └── 9c1d...
//! └── 6f776e657232/
//!     └── ...
//! ```
//!
//! Keys are hex-encoded so any non-empty string is a safe path component.
//! A hex name longer than [`SEGMENT_LEN`] is split across nested
//! directories; every component but the last ends in `+`, which keeps
//! filenames under the 255-byte limit and keeps a long key's directories
//! apart from a shorter key's file. Writes land in a dot-prefixed temp file
//! next to the target and are renamed into place.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::{validate_keys, KeyValueStore};

/// Longest run of hex placed in a single path component.
const SEGMENT_LEN: usize = 240;

/// Suffix marking a component that continues into a nested directory.
const CONTINUED: char = '+';

/// Relative path for a key: `hex(key)`, split every [`SEGMENT_LEN`] chars.
fn key_path(key: &str) -> PathBuf {
    let encoded = hex::encode(key);
    let mut path = PathBuf::new();
    let mut rest = encoded.as_str();
    while rest.len() > SEGMENT_LEN {
        let (head, tail) = rest.split_at(SEGMENT_LEN);
        path.push(format!("{head}{CONTINUED}"));
        rest = tail;
    }
    path.push(rest);
    path
}

/// Filesystem-based key-value store.
#[derive(Debug, Clone)]
pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    /// Open a store, creating its base directory unless read-only.
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        if !config.read_only {
            fs::create_dir_all(&config.base_path)
                .await
                .map_err(|source| StoreError::Io {
                    operation: "open",
                    owner: String::new(),
                    item: String::new(),
                    source,
                })?;
        }
        tracing::debug!(path = %config.base_path.display(), read_only = config.read_only, "opened file store");
        Ok(Self { config })
    }

    /// Open a store at a specific path.
    pub async fn at_path(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open(StoreConfig::with_base_path(path)).await
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn owner_dir(&self, owner: &str) -> PathBuf {
        self.config.base_path.join(key_path(owner))
    }

    fn item_path(&self, owner: &str, item: &str) -> PathBuf {
        self.owner_dir(owner).join(key_path(item))
    }

    fn io_error(operation: &'static str, owner: &str, item: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            operation,
            owner: owner.to_string(),
            item: item.to_string(),
            source,
        }
    }

    async fn read_owner_dir(&self, owner: &str) -> Result<Vec<(String, PathBuf)>, StoreError> {
        if owner.is_empty() {
            return Err(StoreError::InvalidKey {
                owner: String::new(),
                item: String::new(),
            });
        }

        let mut items = Vec::new();
        let mut pending = vec![(self.owner_dir(owner), String::new())];
        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Self::io_error("list", owner, "", e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Self::io_error("list", owner, "", e))?
            {
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };

                if let Some(head) = name.strip_suffix(CONTINUED) {
                    let is_dir = entry
                        .file_type()
                        .await
                        .map_err(|e| Self::io_error("list", owner, "", e))?
                        .is_dir();
                    if is_dir && head.bytes().all(|b| b.is_ascii_hexdigit()) {
                        pending.push((entry.path(), format!("{prefix}{head}")));
                    }
                    continue;
                }

                // Skip in-flight temp files and anything we didn't write
                let Ok(raw) = hex::decode(format!("{prefix}{name}")) else { continue };
                let Ok(item) = String::from_utf8(raw) else { continue };
                items.push((item, entry.path()));
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn put(&self, owner: &str, item: &str, value: Bytes) -> Result<(), StoreError> {
        validate_keys(owner, item)?;
        if self.config.read_only {
            return Err(StoreError::ReadOnly);
        }

        let path = self.item_path(owner, item);
        let dir = path.parent().map(PathBuf::from).unwrap_or_else(|| self.owner_dir(owner));
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Self::io_error("create owner directory", owner, item, e))?;

        let temp_path = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&temp_path, value)
            .await
            .map_err(|e| Self::io_error("write", owner, item, e))?;
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(Self::io_error("rename", owner, item, e));
        }
        Ok(())
    }

    async fn get(&self, owner: &str, item: &str) -> Result<Option<Bytes>, StoreError> {
        validate_keys(owner, item)?;
        match fs::read(self.item_path(owner, item)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error("read", owner, item, e)),
        }
    }

    async fn query(&self, owner: &str) -> Result<Vec<Bytes>, StoreError> {
        let mut values = Vec::new();
        for (item, path) in self.read_owner_dir(owner).await? {
            match fs::read(&path).await {
                Ok(data) => values.push(Bytes::from(data)),
                // deleted between listing and reading
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Self::io_error("read", owner, &item, e)),
            }
        }
        Ok(values)
    }

    async fn keys(&self, owner: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read_owner_dir(owner)
            .await?
            .into_iter()
            .map(|(item, _)| item)
            .collect())
    }

    async fn delete(&self, owner: &str, item: &str) -> Result<(), StoreError> {
        validate_keys(owner, item)?;
        if self.config.read_only {
            return Err(StoreError::ReadOnly);
        }
        match fs::remove_file(self.item_path(owner, item)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error("delete", owner, item, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_and_get() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path()).await?;

        store.put("owner1", "frag1", Bytes::from_static(b"Hello, World!")).await?;
        let data = store.get("owner1", "frag1").await?.expect("should exist");
        assert_eq!(&data[..], b"Hello, World!");
        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_is_none() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path()).await?;
        assert!(store.get("nobody", "nothing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_keys_with_path_characters_are_safe() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path()).await?;

        store.put("../evil", "a/b/../c", Bytes::from_static(b"contained")).await?;
        let keys = store.keys("../evil").await?;
        assert_eq!(keys, vec!["a/b/../c".to_string()]);

        // only the hex-named owner directory exists under the base path
        let mut entries = std::fs::read_dir(temp_dir.path())?;
        let entry = entries.next().expect("one owner dir")?;
        assert_eq!(entry.file_name().to_string_lossy(), hex::encode("../evil"));
        assert!(entries.next().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_long_keys_fit_filename_limits() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path()).await?;

        let owner = "o".repeat(200);
        let item = "i".repeat(200);
        store.put(&owner, &item, Bytes::from_static(b"long")).await?;
        store.put(&owner, "short", Bytes::from_static(b"short")).await?;

        assert_eq!(store.get(&owner, &item).await?, Some(Bytes::from_static(b"long")));
        let mut keys = store.keys(&owner).await?;
        keys.sort();
        assert_eq!(keys, vec![item.clone(), "short".to_string()]);
        assert_eq!(store.query(&owner).await?.len(), 2);

        let mut dirs = vec![temp_dir.path().to_path_buf()];
        while let Some(dir) = dirs.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                assert!(entry.file_name().len() <= 255, "{:?}", entry.file_name());
                if entry.file_type()?.is_dir() {
                    dirs.push(entry.path());
                }
            }
        }

        store.delete(&owner, &item).await?;
        assert_eq!(store.get(&owner, &item).await?, None);
        assert_eq!(store.keys(&owner).await?, vec!["short".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_long_owner_does_not_shadow_its_prefix() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path()).await?;

        // hex of the short owner is exactly one full segment of the long one
        let short_owner = "a".repeat(SEGMENT_LEN / 2);
        let long_owner = "a".repeat(200);
        store.put(&short_owner, "x", Bytes::from_static(b"short")).await?;
        store.put(&long_owner, "y", Bytes::from_static(b"long")).await?;

        assert_eq!(store.keys(&short_owner).await?, vec!["x".to_string()]);
        assert_eq!(store.keys(&long_owner).await?, vec!["y".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_and_delete() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path()).await?;

        store.put("owner1", "a", Bytes::from_static(b"one")).await?;
        store.put("owner1", "b", Bytes::from_static(b"two")).await?;
        store.put("owner2", "a", Bytes::from_static(b"other")).await?;

        let mut values = store.query("owner1").await?;
        values.sort();
        assert_eq!(values, vec![Bytes::from_static(b"one"), Bytes::from_static(b"two")]);

        store.delete("owner1", "a").await?;
        assert_eq!(store.query("owner1").await?.len(), 1);
        assert_eq!(store.get("owner2", "a").await?, Some(Bytes::from_static(b"other")));

        // missing delete is fine
        store.delete("owner1", "a").await?;
        assert!(store.query("ghost").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reopen_sees_previous_writes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        {
            let store = FileStore::at_path(temp_dir.path()).await?;
            store.put("owner1", "persisted", Bytes::from_static(b"durable")).await?;
        }

        let store = FileStore::at_path(temp_dir.path()).await?;
        assert_eq!(
            store.get("owner1", "persisted").await?,
            Some(Bytes::from_static(b"durable"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_read_only_rejects_writes() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let writable = FileStore::at_path(temp_dir.path()).await?;
        writable.put("owner1", "x", Bytes::from_static(b"readable")).await?;

        let readonly = FileStore::open(StoreConfig::read_only(temp_dir.path())).await?;
        assert!(matches!(
            readonly.put("owner1", "y", Bytes::new()).await,
            Err(StoreError::ReadOnly)
        ));
        assert!(matches!(readonly.delete("owner1", "x").await, Err(StoreError::ReadOnly)));
        assert_eq!(readonly.get("owner1", "x").await?, Some(Bytes::from_static(b"readable")));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_keys_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = FileStore::at_path(temp_dir.path()).await?;
        assert!(matches!(
            store.put("", "x", Bytes::new()).await,
            Err(StoreError::InvalidKey { .. })
        ));
        assert!(matches!(store.keys("").await, Err(StoreError::InvalidKey { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_writes_same_key() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = Arc::new(FileStore::at_path(temp_dir.path()).await?);

        let mut handles = Vec::new();
        for i in 0..10u8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put("owner1", "shared", Bytes::from(vec![i; 64])).await
            }));
        }
        for handle in handles {
            handle.await??;
        }

        // last writer wins, but the value is always one complete write
        let data = store.get("owner1", "shared").await?.expect("should exist");
        assert_eq!(data.len(), 64);
        assert!(data.iter().all(|b| *b == data[0]));
        assert_eq!(store.keys("owner1").await?, vec!["shared".to_string()]);
        Ok(())
    }
}
