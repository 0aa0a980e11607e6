//! FragmentRepository: fragment records on top of two key-value stores.
//!
//! Metadata records are JSON-serialized into one store and data blobs are
//! written raw into another, both keyed by `(ownerId, id)`. Metadata is the
//! source of truth: a fragment exists iff its metadata record exists.

use std::sync::Arc;

use bytes::Bytes;

use crate::catalog::ContentKind;
use crate::convert;
use crate::error::{FragmentError, Result};
use crate::fragment::Fragment;
use crate::media_type::MediaType;
use crate::store::{KeyValueStore, MemoryStore};

/// Result of [`FragmentRepository::list_for_owner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentListing {
    Ids(Vec<String>),
    Expanded(Vec<Fragment>),
}

impl FragmentListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Expanded(fragments) => fragments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<&str> {
        match self {
            Self::Ids(ids) => ids.iter().map(String::as_str).collect(),
            Self::Expanded(fragments) => fragments.iter().map(|f| f.id.as_str()).collect(),
        }
    }
}

/// Creates, reads, lists, updates and deletes fragments.
#[derive(Clone)]
pub struct FragmentRepository {
    metadata: Arc<dyn KeyValueStore>,
    data: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for FragmentRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentRepository").finish_non_exhaustive()
    }
}

impl FragmentRepository {
    pub fn new(metadata: Arc<dyn KeyValueStore>, data: Arc<dyn KeyValueStore>) -> Self {
        Self { metadata, data }
    }

    /// A repository over two fresh [`MemoryStore`]s.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Build a new fragment. Nothing is persisted until [`save`](Self::save).
    pub fn create(&self, owner_id: &str, content_type: &str, size: u64) -> Result<Fragment> {
        Fragment::new(owner_id, None, content_type, size)
    }

    /// Like [`create`](Self::create), with a caller-chosen id.
    pub fn create_with_id(
        &self,
        owner_id: &str,
        id: &str,
        content_type: &str,
        size: u64,
    ) -> Result<Fragment> {
        Fragment::new(owner_id, Some(id), content_type, size)
    }

    /// Refresh `updated` and write the full metadata record.
    #[tracing::instrument(skip(self, fragment), fields(owner = %fragment.owner_id, id = %fragment.id))]
    pub async fn save(&self, fragment: &mut Fragment) -> Result<()> {
        fragment.touch();
        self.write_metadata(fragment).await
    }

    async fn write_metadata(&self, fragment: &Fragment) -> Result<()> {
        let record = serde_json::to_vec(fragment).map_err(|source| FragmentError::Serialization {
            owner: fragment.owner_id.clone(),
            id: fragment.id.clone(),
            source,
        })?;
        self.metadata
            .put(&fragment.owner_id, &fragment.id, Bytes::from(record))
            .await
            .map_err(|e| FragmentError::store("save metadata", &fragment.owner_id, &fragment.id, e))
    }

    fn decode(owner_id: &str, id: &str, record: &[u8]) -> Result<Fragment> {
        let fragment: Fragment =
            serde_json::from_slice(record).map_err(|source| FragmentError::Serialization {
                owner: owner_id.to_string(),
                id: id.to_string(),
                source,
            })?;
        if fragment.kind().is_none() {
            tracing::warn!(owner = owner_id, id, content_type = %fragment.content_type, "stored record has an uncatalogued type");
            return Err(FragmentError::UnsupportedType(fragment.mime_type().to_string()));
        }
        Ok(fragment)
    }

    /// Load a fragment's metadata.
    pub async fn get_by_id(&self, owner_id: &str, id: &str) -> Result<Fragment> {
        let record = self
            .metadata
            .get(owner_id, id)
            .await
            .map_err(|e| FragmentError::store("read metadata", owner_id, id, e))?
            .ok_or_else(|| FragmentError::not_found(owner_id, id))?;
        Self::decode(owner_id, id, &record)
    }

    /// All fragments for an owner, as ids or full records.
    pub async fn list_for_owner(&self, owner_id: &str, expand: bool) -> Result<FragmentListing> {
        let records = self
            .metadata
            .query(owner_id)
            .await
            .map_err(|e| FragmentError::store("query metadata", owner_id, "*", e))?;

        let fragments = records
            .iter()
            .map(|record| Self::decode(owner_id, "*", record))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(owner = owner_id, count = fragments.len(), expand, "listed fragments");
        Ok(if expand {
            FragmentListing::Expanded(fragments)
        } else {
            FragmentListing::Ids(fragments.into_iter().map(|f| f.id).collect())
        })
    }

    /// Read a fragment's data blob.
    ///
    /// A fragment saved but never given data reads as empty when its size
    /// is zero. Any other missing blob is `NotFound`.
    pub async fn get_data(&self, fragment: &Fragment) -> Result<Bytes> {
        let data = self
            .data
            .get(&fragment.owner_id, &fragment.id)
            .await
            .map_err(|e| FragmentError::store("read data", &fragment.owner_id, &fragment.id, e))?;
        match data {
            Some(bytes) => Ok(bytes),
            None if fragment.size == 0 => Ok(Bytes::new()),
            None => Err(FragmentError::not_found(&fragment.owner_id, &fragment.id)),
        }
    }

    /// Replace the data blob, then re-save metadata with the new size.
    ///
    /// The blob is written first; metadata is only updated once the blob is
    /// durable, so a reader never sees a size that doesn't match the data.
    #[tracing::instrument(skip(self, fragment, data), fields(owner = %fragment.owner_id, id = %fragment.id, bytes = data.len()))]
    pub async fn set_data(&self, fragment: &mut Fragment, data: Bytes) -> Result<()> {
        let size = data.len() as u64;
        self.data
            .put(&fragment.owner_id, &fragment.id, data)
            .await
            .map_err(|e| FragmentError::store("write data", &fragment.owner_id, &fragment.id, e))?;

        fragment.size = size;
        self.save(fragment).await
    }

    /// Remove metadata and data for `(owner_id, id)`.
    ///
    /// Deleting an unknown id succeeds; call [`get_by_id`](Self::get_by_id)
    /// first when absence matters.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<()> {
        let (meta, data) = tokio::join!(
            self.metadata.delete(owner_id, id),
            self.data.delete(owner_id, id)
        );
        meta.map_err(|e| FragmentError::store("delete metadata", owner_id, id, e))?;
        data.map_err(|e| FragmentError::store("delete data", owner_id, id, e))?;
        tracing::info!(owner = owner_id, id, "deleted fragment");
        Ok(())
    }

    /// Create, save and attach data in one call.
    pub async fn insert(&self, owner_id: &str, content_type: &str, data: Bytes) -> Result<Fragment> {
        let mut fragment = self.create(owner_id, content_type, data.len() as u64)?;
        self.save(&mut fragment).await?;
        self.set_data(&mut fragment, data).await?;
        tracing::info!(
            owner = owner_id,
            id = %fragment.id,
            content_type = %fragment.content_type,
            size = fragment.size,
            "created fragment"
        );
        Ok(fragment)
    }

    /// Replace an existing fragment's data.
    ///
    /// The content type may differ only in parameters; changing the base
    /// MIME type is rejected.
    pub async fn replace_data(
        &self,
        owner_id: &str,
        id: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<Fragment> {
        let mut fragment = self.get_by_id(owner_id, id).await?;
        let requested = MediaType::parse(content_type)?;
        if requested.essence() != fragment.mime_type() {
            return Err(FragmentError::InvalidArgument(format!(
                "content type cannot be changed from {} to {}",
                fragment.mime_type(),
                requested.essence()
            )));
        }

        self.set_data(&mut fragment, data).await?;
        tracing::info!(owner = owner_id, id, size = fragment.size, "updated fragment");
        Ok(fragment)
    }

    /// Load a fragment and its data, converted to `target` when it differs
    /// from the stored type.
    pub async fn read_as(
        &self,
        owner_id: &str,
        id: &str,
        target: Option<ContentKind>,
    ) -> Result<(Fragment, Bytes)> {
        let fragment = self.get_by_id(owner_id, id).await?;
        let data = self.get_data(&fragment).await?;

        let Some(target) = target else {
            return Ok((fragment, data));
        };
        if fragment.kind() == Some(target) {
            return Ok((fragment, data));
        }

        let converted = convert::convert(data, &fragment.content_type, &MediaType::parse(target.mime())?)?;
        Ok((fragment, converted))
    }

    /// Delete data blobs for `owner_id` that have no metadata record.
    ///
    /// Returns the ids of the blobs removed.
    pub async fn sweep_orphaned_data(&self, owner_id: &str) -> Result<Vec<String>> {
        let data_keys = self
            .data
            .keys(owner_id)
            .await
            .map_err(|e| FragmentError::store("list data", owner_id, "*", e))?;

        let mut removed = Vec::new();
        for id in data_keys {
            let has_metadata = self
                .metadata
                .get(owner_id, &id)
                .await
                .map_err(|e| FragmentError::store("read metadata", owner_id, &id, e))?
                .is_some();
            if has_metadata {
                continue;
            }
            self.data
                .delete(owner_id, &id)
                .await
                .map_err(|e| FragmentError::store("delete data", owner_id, &id, e))?;
            removed.push(id);
        }

        if !removed.is_empty() {
            tracing::warn!(owner = owner_id, count = removed.len(), "removed orphaned data blobs");
        }
        Ok(removed)
    }
}
