//! Data model for dictionary submissions.
//!
//! - [`MarkerRecord`]: one SFM block as ordered `(marker, value)` pairs
//! - [`ExtractedEntry`], [`ExtractedSense`], [`ExtractedExample`]: stage outputs
//! - [`Diagnostics`]: the per-submission report every stage writes into
//! - [`Metadata`] and [`Properties`]: what `md.json` configures

pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod metadata;
pub mod record;
pub mod stage;

pub use diagnostics::{Category, Diagnostic, Diagnostics, Severity};
pub use error::ModelError;
pub use ids::{ENTRY_ID_PREFIX, EXAMPLE_ID_PREFIX, IdGenerator, SENSE_ID_PREFIX};
pub use metadata::{
    Author, FallbackScope, Language, MarkerFallbackRule, MergeMarkersRule, Metadata, Properties,
};
pub use record::{HEADWORD_MARKER, HOMONYM_MARKER, MarkerRecord, split_ids, validate_marker};
pub use stage::{
    EntryRemainder, ExtractedEntry, ExtractedExample, ExtractedRecord, ExtractedSense,
};
