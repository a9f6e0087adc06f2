use std::path::PathBuf;

use dict_model::Diagnostics;

/// Outcome of processing one submission.
#[derive(Debug)]
pub struct ProcessResult {
    pub submission_id: String,
    pub output_dir: PathBuf,
    pub tables: Vec<TableSummary>,
    pub media_files: usize,
    /// `cldf.log`, when anything was worth reporting.
    pub log_file: Option<PathBuf>,
    pub metadata_file: Option<PathBuf>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug)]
pub struct TableSummary {
    pub name: String,
    /// Rows built from extracted records.
    pub built: usize,
    /// Rows left after the row filters.
    pub written: usize,
    pub path: Option<PathBuf>,
}

impl TableSummary {
    pub fn dropped(&self) -> usize {
        self.built.saturating_sub(self.written)
    }
}

/// One line of `dictionaria ls`.
#[derive(Debug)]
pub struct SubmissionListing {
    pub id: String,
    pub language: String,
    pub glottocode: Option<String>,
    pub authors: String,
    pub published: Option<chrono::NaiveDate>,
    /// Last modification of `db.sfm`.
    pub modified: Option<chrono::DateTime<chrono::Local>>,
    /// Set when `md.json` is missing or unreadable.
    pub problem: Option<String>,
}
