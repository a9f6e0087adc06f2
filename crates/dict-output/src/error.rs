//! Error types for dataset output.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while declaring or writing a dataset.
#[derive(Debug, Error)]
pub enum OutputError {
    // === Schema Errors ===
    /// The column is already declared on the table.
    #[error("{table}: duplicate column '{column}'")]
    DuplicateColumn { table: String, column: String },

    /// A table with this url or component already exists.
    #[error("duplicate table '{table}'")]
    DuplicateTable { table: String },

    /// No table with this url or component.
    #[error("unknown table '{table}'")]
    UnknownTable { table: String },

    // === Write Errors ===
    /// Failed to create the output directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a table.
    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write the metadata document.
    #[error("failed to write JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write a file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_column_names_table() {
        let err = OutputError::DuplicateColumn {
            table: "EntryTable".to_string(),
            column: "Headword".to_string(),
        };
        assert_eq!(err.to_string(), "EntryTable: duplicate column 'Headword'");
    }
}
