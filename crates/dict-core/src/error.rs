//! Extraction errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading auxiliary extraction inputs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The concept list could not be read.
    #[error("failed to read concept list {path}: {source}")]
    ConceptRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, CoreError>;
