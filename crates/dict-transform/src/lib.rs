//! Record-level transformations of a dictionary database.
//!
//! - [`visit`]: the [`Visitor`] trait, [`Database`] and [`VisitorChain`]
//! - [`normalize`], [`rearrange`], [`repair`]: record rewrites
//! - [`stats`]: marker statistics
//! - [`example`], [`corpus`], [`extract`]: examples and their extraction
//! - [`media`]: media reference resolution

pub mod corpus;
pub mod example;
pub mod extract;
pub mod media;
pub mod normalize;
pub mod rearrange;
pub mod repair;
pub mod stats;
pub mod visit;

pub use corpus::{CORPUS_ENTRY_SEP, CORPUS_MARKER_MAP, Corpus, EXAMPLES_ENTRY_SEP, Examples};
pub use example::{
    EXAMPLE_MARKERS, Example, MULTILINE_MARKERS, concat_multilines, hash_id, normalize_aligned,
    slug,
};
pub use extract::{
    EXAMPLE_MARKER_MAP, ExampleExtractionStateMachine, ExampleExtractor, ExampleSink,
    ExampleStore, MergeConflict, XREF_MARKER, merge,
};
pub use media::{
    MediaMode, MediaResolver, MissingFile, file_checksum, media_types, register_local_media,
    transliterate,
};
pub use normalize::{
    MarkerFallback, MergeMarkers, MergePartsOfSpeech, Normalize, PartOfSpeechFilter,
    collapse_whitespace, marker_fallback_entry, marker_fallback_sense, merge_caption,
    merge_markers, merge_pos, normalize,
};
pub use rearrange::{Rearrange, move_marker, rearrange};
pub use repair::RepairHomonyms;
pub use stats::{MarkerStats, Stats};
pub use visit::{Database, Outcome, VisitReport, Visitor, VisitorChain};
