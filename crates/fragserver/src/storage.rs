//! Builds the fragment repository from service configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use fragconf::{FragmentsConfig, StorageBackend};
use fragments::{FileStore, FragmentRepository, StoreConfig};

/// Open the metadata and data stores selected by `config.storage.backend`.
///
/// The file backend keeps metadata and data in sibling namespaces under
/// `paths.data_dir`.
pub async fn open_repository(config: &FragmentsConfig) -> Result<FragmentRepository> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory fragment storage");
            Ok(FragmentRepository::in_memory())
        }
        StorageBackend::File => {
            let base = StoreConfig {
                base_path: config.paths.data_dir.clone(),
                read_only: config.storage.read_only,
            };
            let metadata = FileStore::open(base.for_namespace("metadata"))
                .await
                .context("Failed to open metadata store")?;
            let data = FileStore::open(base.for_namespace("data"))
                .await
                .context("Failed to open data store")?;

            tracing::info!(
                path = %config.paths.data_dir.display(),
                read_only = config.storage.read_only,
                "Using file-backed fragment storage"
            );
            Ok(FragmentRepository::new(Arc::new(metadata), Arc::new(data)))
        }
    }
}
