//! Submission ingestion.
//!
//! - [`sfm`]: reading and writing SFM record files
//! - [`metadata`]: `md.json`
//! - [`catalog`]: the shared media catalog
//! - [`submission`]: submission directory layout and discovery
//! - [`flextext`]: interlinear gloss documents

pub mod catalog;
pub mod encoding;
pub mod error;
pub mod flextext;
pub mod metadata;
pub mod sfm;
pub mod submission;

pub use catalog::{CATALOG_FILE, CatalogGuard, CatalogItem, MediaCatalog};
pub use encoding::{DEFAULT_ENCODING, decode, resolve_encoding};
pub use error::{IngestError, Result};
pub use flextext::{
    GlossRecord, PhraseContext, XmlElement, XmlNode, get_item, get_languages, gloss_records,
    parse_document, read_glosses, separate_examples,
};
pub use metadata::load_metadata;
pub use sfm::{
    DEFAULT_ENTRY_SEP, DEFAULT_MARKER_MAP, LineMode, ReadOptions, read_sfm, read_sfm_file,
    write_records, write_sfm_file,
};
pub use submission::{MEDIA_DIRS, Submission, list_submissions};
