use std::io;

/// Errors from record, index, and blob storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A record with the same type and id is already stored.
    #[error("record already exists: {record_type}/{id}")]
    Conflict { record_type: String, id: String },

    /// A record type bucket or record id is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any filesystem failure while reading, parsing, or writing storage
    /// files. Parse failures are carried as `io::ErrorKind::InvalidData`.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A stored binary stream does not exist.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// A record type or data divider can not be used as a storage file name.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// Storage configuration could not be loaded or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StorageError {
    /// Wrap an I/O error with a human-readable context message.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a JSON (de)serialization failure as an I/O error.
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Io {
            context: context.into(),
            source: io::Error::from(source),
        }
    }

    /// Convenience constructor for a missing record.
    pub fn record_not_found(record_type: &str, id: &str) -> Self {
        Self::NotFound(format!("no record exists with type: {record_type} and id: {id}"))
    }

    /// Returns `true` for [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
