//! Error types for submission ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing submission files.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Directory not found or not readable.
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Required file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Text Decoding Errors ===
    /// The configured encoding label is not known.
    #[error("unknown encoding label '{label}'")]
    UnknownEncoding { label: String },

    /// The input is not valid in the configured encoding.
    #[error("invalid {encoding} input at byte {offset}")]
    Decode { encoding: String, offset: usize },

    // === SFM Errors ===
    /// Line without a marker in strict mode.
    #[error("line {line}: expected a marker, found {text:?}")]
    MalformedLine { line: usize, text: String },

    /// Record holds a marker that cannot be written back.
    #[error("cannot write record: {source}")]
    InvalidRecord {
        #[source]
        source: dict_model::ModelError,
    },

    // === Metadata Errors ===
    /// Failed to parse a JSON document.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // === Gloss Document Errors ===
    /// XML syntax error.
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// XML document does not have the expected shape.
    #[error("unexpected document structure: {reason}")]
    Structure { reason: String },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/db.sfm"),
        };
        assert_eq!(err.to_string(), "file not found: /path/to/db.sfm");
    }

    #[test]
    fn test_malformed_line_display() {
        let err = IngestError::MalformedLine {
            line: 3,
            text: "stray".to_string(),
        };
        assert_eq!(err.to_string(), "line 3: expected a marker, found \"stray\"");
    }
}
