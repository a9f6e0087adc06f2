//! Media reference checks.

use dict_model::MarkerRecord;
use dict_transform::{MediaMode, MediaResolver};

use crate::issue::{Finding, Issue};

/// Findings for every media reference `resolver` cannot resolve.
///
/// The resolver is switched to check mode, so `records` are only read.
pub fn check(resolver: &MediaResolver, records: &[MarkerRecord]) -> Vec<Finding> {
    let mut resolver = resolver.clone().with_mode(MediaMode::Check);
    for record in records {
        resolver.resolve_record(record);
    }
    resolver
        .missing_files()
        .iter()
        .map(|missing| {
            Finding::new(
                missing.entry.clone(),
                Issue::MissingFile {
                    marker: missing.marker.clone(),
                    file: missing.file.clone(),
                },
            )
        })
        .collect()
}
