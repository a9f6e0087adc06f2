//! Dataset output for dictionary submissions.
//!
//! - [`schema`]: tables, columns and the CSVW metadata document
//! - [`dataset`]: declaring the dataset of one submission
//! - [`row`]: rows built from extracted records
//! - [`sink`]: writing tables and metadata

pub mod dataset;
pub mod error;
pub mod row;
pub mod schema;
pub mod sink;

pub use dataset::{
    MEDIA_COLUMNS, SEPARATOR_COLUMNS, add_columns, add_gloss_columns, attach_column_titles,
    make_dataset,
};
pub use error::{OutputError, Result};
pub use row::{
    CellValue, ENTRY_LIST_COLUMNS, EXAMPLE_LIST_COLUMNS, Row, build_row, media_row, merge_gloss,
    single_spaces,
};
pub use schema::{
    Column, DICTIONARY_MODULE, Dataset, ForeignKey, MEDIA_TABLE, Reference, TAB_SEPARATOR, Table,
    TableSchema,
};
pub use sink::{CsvSink, DatasetSink, METADATA_FILE, TableRows, WriteSummary, ensure_output_dir};
