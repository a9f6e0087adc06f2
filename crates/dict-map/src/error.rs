//! Specification errors.

use thiserror::Error;

/// Errors raised while deriving a specification from submission properties.
///
/// These are configuration problems and are surfaced to the operator.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Two markers of one table map to the same column.
    #[error("{table}: column '{column}' is the target of both \\{first} and \\{second}")]
    DuplicateColumn {
        table: &'static str,
        column: String,
        first: String,
        second: String,
    },

    /// A configured cross-reference marker is not part of any table.
    #[error("cross-reference marker \\{marker} is not mapped to any table")]
    UnmappedCrossReference { marker: String },

    /// Link processing was requested without a link regex.
    #[error("Missing property: {property}")]
    MissingProperty { property: &'static str },

    /// A configured regular expression does not compile.
    #[error("invalid regular expression for {property}: {source}")]
    InvalidRegex {
        property: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Result type for specification operations.
pub type Result<T> = std::result::Result<T, SpecError>;
