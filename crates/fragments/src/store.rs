//! Two-level key-value storage: `(owner, item) -> bytes`.
//!
//! The repository holds two independent instances, one for serialized
//! metadata records and one for raw data blobs. Backends only need to
//! implement [`KeyValueStore`]; [`MemoryStore`] is the reference backend
//! and [`FileStore`](crate::file_store::FileStore) the persistent one.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// Trait for key-value storage backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `(owner, item)`, replacing any previous value.
    async fn put(&self, owner: &str, item: &str, value: Bytes) -> Result<(), StoreError>;

    /// Fetch the value under `(owner, item)`.
    ///
    /// Returns `Ok(None)` when either key is absent.
    async fn get(&self, owner: &str, item: &str) -> Result<Option<Bytes>, StoreError>;

    /// All values stored under `owner`, in no particular order.
    async fn query(&self, owner: &str) -> Result<Vec<Bytes>, StoreError>;

    /// All item keys stored under `owner`, in no particular order.
    async fn keys(&self, owner: &str) -> Result<Vec<String>, StoreError>;

    /// Remove `(owner, item)`. Removing a missing entry is not an error.
    async fn delete(&self, owner: &str, item: &str) -> Result<(), StoreError>;
}

/// Reject empty keys before touching any state.
pub fn validate_keys(owner: &str, item: &str) -> Result<(), StoreError> {
    if owner.is_empty() || item.is_empty() {
        return Err(StoreError::InvalidKey {
            owner: owner.to_string(),
            item: item.to_string(),
        });
    }
    Ok(())
}

fn validate_owner(owner: &str) -> Result<(), StoreError> {
    if owner.is_empty() {
        return Err(StoreError::InvalidKey {
            owner: String::new(),
            item: String::new(),
        });
    }
    Ok(())
}

/// In-memory store (HashMap-backed).
///
/// A single lock guards the whole map, so concurrent writers to the same
/// key are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    owners: RwLock<HashMap<String, HashMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of owners with at least one item.
    pub async fn owner_count(&self) -> usize {
        self.owners.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, owner: &str, item: &str, value: Bytes) -> Result<(), StoreError> {
        validate_keys(owner, item)?;
        let mut owners = self.owners.write().await;
        owners
            .entry(owner.to_string())
            .or_default()
            .insert(item.to_string(), value);
        Ok(())
    }

    async fn get(&self, owner: &str, item: &str) -> Result<Option<Bytes>, StoreError> {
        validate_keys(owner, item)?;
        let owners = self.owners.read().await;
        Ok(owners.get(owner).and_then(|items| items.get(item)).cloned())
    }

    async fn query(&self, owner: &str) -> Result<Vec<Bytes>, StoreError> {
        validate_owner(owner)?;
        let owners = self.owners.read().await;
        Ok(owners
            .get(owner)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn keys(&self, owner: &str) -> Result<Vec<String>, StoreError> {
        validate_owner(owner)?;
        let owners = self.owners.read().await;
        Ok(owners
            .get(owner)
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, owner: &str, item: &str) -> Result<(), StoreError> {
        validate_keys(owner, item)?;
        let mut owners = self.owners.write().await;
        if let Some(items) = owners.get_mut(owner) {
            items.remove(item);
            if items.is_empty() {
                owners.remove(owner);
            }
        }
        Ok(())
    }
}
