//! Owner-scoped fragment storage with content-type conversion.
//!
//! A fragment is an opaque blob tagged with a MIME type and owned by one
//! principal. Its metadata and its data live in two separate
//! [`KeyValueStore`]s, co-addressed by `(ownerId, id)`. On read, a fragment
//! can be re-expressed as any type its catalog entry lists.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use fragments::{ContentKind, FragmentRepository};
//!
//! # async fn demo() -> fragments::Result<()> {
//! let repo = FragmentRepository::in_memory();
//!
//! // Create, save metadata, then attach data
//! let mut fragment = repo.create("owner-hash", "text/markdown", 0)?;
//! repo.save(&mut fragment).await?;
//! repo.set_data(&mut fragment, Bytes::from("# Hello")).await?;
//!
//! // Read it back as HTML
//! let (_, html) = repo
//!     .read_as("owner-hash", &fragment.id, Some(ContentKind::TextHtml))
//!     .await?;
//! println!("{}", String::from_utf8_lossy(&html));
//! # Ok(())
//! # }
//! ```
//!
//! # Storage backends
//!
//! - [`MemoryStore`]: process-lifetime only, the default for tests.
//! - [`FileStore`]: one directory per owner under the base path of a
//!   [`StoreConfig`].

pub mod catalog;
pub mod config;
pub mod convert;
pub mod error;
pub mod file_store;
pub mod fragment;
pub mod media_type;
pub mod repository;
pub mod store;

// Re-exports for convenience
pub use catalog::{conversions_for, is_supported, ContentKind};
pub use config::StoreConfig;
pub use convert::convert;
pub use error::{ErrorKind, FragmentError, Result, StoreError};
pub use file_store::FileStore;
pub use fragment::{Fragment, FragmentInfo};
pub use media_type::MediaType;
pub use repository::{FragmentListing, FragmentRepository};
pub use store::{KeyValueStore, MemoryStore};
