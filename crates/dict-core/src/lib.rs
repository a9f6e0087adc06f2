//! Extraction of entries, senses and examples from normalized records.
//!
//! - [`entries`], [`senses`], [`examples`]: the three extractors
//! - [`xrefs`], [`links`]: rewriting references between entries
//! - [`media`]: media ids, the media table and captions
//! - [`glosses`]: attaching interlinear glosses to examples
//! - [`concepts`]: curated Concepticon ids for senses

use std::collections::BTreeSet;

pub mod concepts;
pub mod entries;
pub mod error;
pub mod examples;
pub mod glosses;
pub mod links;
pub mod media;
pub mod senses;
pub mod xrefs;

pub use concepts::ConceptMap;
pub use entries::{EntryExtractor, sanitize_entry_id};
pub use error::{CoreError, Result};
pub use examples::{
    ExampleReferencer, PreparedExamples, prepare_examples, prune_uncited, read_examples_file,
};
pub use glosses::{
    GlossToExMapping, Glosses, check_for_missing_glosses, prepare_glosses, split_gloss_ref,
};
pub use links::{LinkIndex, LinkProcessor, process_links};
pub use media::{CaptionFinder, Captions, MediaExtractor, MediaFile};
pub use senses::SenseExtractor;
pub use xrefs::CrossRefIndex;

/// `'a', 'b'` rendering of a set, as used in log messages.
pub(crate) fn quoted_list(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .map(|value| format!("'{value}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
