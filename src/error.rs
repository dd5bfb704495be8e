use thiserror::Error;

/// Failures of the durable persistence medium itself.
#[derive(Debug, Error)]
pub enum MediumError {
    /// The medium refused the write because it is out of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures of local-data operations. These propagate to the caller: an edit
/// that did not reach durable storage must not look like it succeeded.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("local snapshot exceeds the storage quota")]
    QuotaExceeded,
    #[error("failed to persist local snapshot")]
    Io(#[from] std::io::Error),
    #[error("failed to encode local snapshot")]
    Serialize(#[from] serde_json::Error),
}

impl From<MediumError> for StoreError {
    fn from(err: MediumError) -> Self {
        match err {
            MediumError::QuotaExceeded => StoreError::QuotaExceeded,
            MediumError::Io(e) => StoreError::Io(e),
        }
    }
}

/// Failures of a local import. A rejected payload never mutates state.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload is unparseable or carries an unrecognized schema version.
    #[error("import payload is not a recognized snapshot")]
    InvalidFormat,
    #[error(transparent)]
    Storage(#[from] StoreError),
}
