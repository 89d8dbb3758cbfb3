//! Domain errors

use thiserror::Error;

/// Classification of a storage failure, decided by the repository that saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// The database could not be reached or no connection was available
    Unavailable,
    /// An insert was rejected or did not complete
    WriteFailed,
    /// A query failed
    ReadFailed,
    /// Stored data could not be decoded
    Corrupt,
}

impl StorageErrorKind {
    /// Operator-facing hint returned to clients alongside the raw detail.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::Unavailable => {
                "Could not connect to the database. Check that this host is allowed to reach it and that the credentials are correct"
            }
            Self::WriteFailed => "Error saving timesheet",
            Self::ReadFailed => "Error fetching data",
            Self::Corrupt => "Stored timesheet data is corrupt",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind:?}: {detail}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub detail: String,
}

impl StorageError {
    pub fn new(kind: StorageErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Storage: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
