//! Error types for the fragment core.
//!
//! Every failure a caller can observe maps onto one [`ErrorKind`], so an
//! adapter can pick a response without matching on message text.

use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::store::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("owner and item keys must be non-empty (owner={owner:?}, item={item:?})")]
    InvalidKey { owner: String, item: String },

    #[error("store is in read-only mode")]
    ReadOnly,

    #[error("{operation} failed for {owner}/{item}: {source}")]
    Io {
        operation: &'static str,
        owner: String,
        item: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`FragmentError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    UnsupportedType,
    UnsupportedConversion,
    StoreFailure,
}

/// Errors surfaced by the fragment repository and conversion engine.
#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("fragment {id} does not exist for owner {owner}")]
    NotFound { owner: String, id: String },

    #[error("type {0} is not supported")]
    UnsupportedType(String),

    #[error("unsupported conversion from {from} to {to}: {reason}")]
    UnsupportedConversion {
        from: String,
        to: String,
        reason: String,
    },

    #[error("store {operation} failed for fragment {owner}/{id}")]
    Store {
        operation: &'static str,
        owner: String,
        id: String,
        #[source]
        source: StoreError,
    },

    #[error("stored record for fragment {owner}/{id} is unreadable")]
    Serialization {
        owner: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FragmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedType(_) => ErrorKind::UnsupportedType,
            Self::UnsupportedConversion { .. } => ErrorKind::UnsupportedConversion,
            Self::Store {
                source: StoreError::InvalidKey { .. },
                ..
            } => ErrorKind::InvalidArgument,
            Self::Store { .. } | Self::Serialization { .. } => ErrorKind::StoreFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn not_found(owner: &str, id: &str) -> Self {
        Self::NotFound {
            owner: owner.to_string(),
            id: id.to_string(),
        }
    }

    pub(crate) fn conversion(from: &str, to: &str, reason: impl ToString) -> Self {
        Self::UnsupportedConversion {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn store(operation: &'static str, owner: &str, id: &str, source: StoreError) -> Self {
        Self::Store {
            operation,
            owner: owner.to_string(),
            id: id.to_string(),
            source,
        }
    }
}

pub type Result<T, E = FragmentError> = std::result::Result<T, E>;
