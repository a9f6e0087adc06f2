//! Per-submission specification: which markers become which columns.

pub mod error;
pub mod links;
pub mod spec;

pub use error::{Result, SpecError};
pub use links::{DEFAULT_LINK_DISPLAY_LABEL, LINKS_WITH_NO_LABEL, LinkSettings, link_settings};
pub use spec::{
    DEFAULT_CAPTION_MARKER, DEFAULT_CROSS_REFERENCES, DEFAULT_ENTRY_ID, DEFAULT_ENTRY_MAP,
    DEFAULT_EXAMPLE_ID, DEFAULT_EXAMPLE_MAP, DEFAULT_SENSE_MAP, DEFAULT_SENSE_SEP,
    DEFAULT_SEPARATOR, ENTRY_MEDIA_MARKER, EXAMPLE_MEDIA_MARKER, EXAMPLE_REF_MARKER,
    SENSE_MEDIA_MARKER, Spec, TableKind, TableSpec, local_mapping, make_spec,
};
