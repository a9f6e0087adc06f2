//! Checks for dictionary submissions.
//!
//! - [`checks`]: record and media checks behind the `check` command
//! - [`rows`]: filters applied to output rows before they are written
//! - [`issue`]: findings and their severities

pub mod checks;
pub mod issue;
pub mod rows;

pub use checks::records::{ILLEGAL_MARKERS, REFERENCE_MARKERS, RecordChecker};
pub use issue::{Finding, Issue, record_findings};
pub use rows::{RowFilter, remove_senseless_entries};

use dict_model::MarkerRecord;
use dict_transform::MediaResolver;

/// All findings for a database: media first, then record checks.
pub fn check_submission(resolver: &MediaResolver, records: &[MarkerRecord]) -> Vec<Finding> {
    let mut findings = checks::media::check(resolver, records);
    findings.extend(checks::records::check(records));
    findings
}
