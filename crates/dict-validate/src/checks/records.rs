//! Per-record dictionary checks.
//!
//! Headword identity is `"{lx} {hm}"`. A headword that occurs more than once
//! is reported on every occurrence after the first.

use std::collections::BTreeSet;

use dict_model::{MarkerRecord, split_ids};

use crate::issue::{Finding, Issue};

/// Markers whose values name other headwords.
pub const REFERENCE_MARKERS: &[&str] = &["cf", "mn", "an", "sy"];

/// Markers that must not occur in a submission.
pub const ILLEGAL_MARKERS: &[&str] = &["se"];

/// Checks records against the headwords of the whole database.
#[derive(Debug, Clone, Default)]
pub struct RecordChecker {
    lexemes: BTreeSet<String>,
    duplicates: Vec<Finding>,
}

impl RecordChecker {
    /// Index the headwords of `records`, noting duplicates on the way.
    pub fn new(records: &[MarkerRecord]) -> Self {
        let mut lexemes = BTreeSet::new();
        let mut duplicates = Vec::new();
        for record in records {
            let id = record.headword_id();
            if !lexemes.insert(id.clone()) {
                duplicates.push(Finding::new(id, Issue::DuplicateLemma));
            }
        }
        Self {
            lexemes,
            duplicates,
        }
    }

    pub fn contains(&self, lexeme: &str) -> bool {
        self.lexemes.contains(lexeme)
    }

    /// Findings for one record, in marker order.
    pub fn check_record(&self, record: &MarkerRecord) -> Vec<Finding> {
        let entry = record.headword_id();
        let mut issues = Vec::new();

        if record.get_non_empty("de").is_none() {
            issues.push(Issue::NoDescription);
        }
        let descriptions = record.count("de");
        let senses = record.count("sn");
        if descriptions > 1 && descriptions != senses {
            issues.push(Issue::DescriptionSenseMismatch {
                descriptions,
                senses,
            });
        }
        let pos = record.get_all("ps");
        if pos.len() > 1 {
            let distinct: BTreeSet<&str> = pos.iter().copied().collect();
            issues.push(if distinct.len() > 1 {
                Issue::MultipleDifferentPartsOfSpeech
            } else {
                Issue::MultiplePartsOfSpeech
            });
        }

        for (marker, value) in record.iter() {
            if REFERENCE_MARKERS.contains(&marker) {
                for target in split_ids(value) {
                    if !self.contains(&target) {
                        issues.push(Issue::InvalidRef {
                            marker: marker.to_string(),
                            target,
                        });
                    }
                }
            } else if ILLEGAL_MARKERS.contains(&marker) {
                issues.push(Issue::IllegalMarker {
                    marker: marker.to_string(),
                });
            }
        }

        issues
            .into_iter()
            .map(|issue| Finding::new(entry.clone(), issue))
            .collect()
    }
}

/// Run the record checks over the whole database.
///
/// Duplicate headwords come first, followed by per-record findings in record
/// order.
pub fn check(records: &[MarkerRecord]) -> Vec<Finding> {
    let checker = RecordChecker::new(records);
    let mut findings = checker.duplicates.clone();
    for record in records {
        findings.extend(checker.check_record(record));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> MarkerRecord {
        pairs.iter().copied().collect()
    }

    fn messages(findings: &[Finding]) -> Vec<String> {
        findings.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn clean_record_has_no_findings() {
        let records = vec![
            record(&[("lx", "cat"), ("ps", "n"), ("de", "feline"), ("cf", "dog")]),
            record(&[("lx", "dog"), ("ps", "n"), ("de", "canine")]),
        ];
        assert!(check(&records).is_empty());
    }

    #[test]
    fn duplicate_lemma_reported_after_first() {
        let records = vec![
            record(&[("lx", "cat"), ("de", "feline")]),
            record(&[("lx", "cat"), ("de", "feline")]),
            record(&[("lx", "cat"), ("hm", "2"), ("de", "feline")]),
        ];
        assert_eq!(messages(&check(&records)), vec!["\\lx cat: duplicate lemma"]);
    }

    #[test]
    fn description_and_part_of_speech_checks() {
        let records = vec![
            record(&[("lx", "a"), ("ps", "n"), ("ps", "n")]),
            record(&[
                ("lx", "b"),
                ("ps", "n"),
                ("ps", "v"),
                ("sn", "1"),
                ("de", "one"),
                ("de", "two"),
            ]),
        ];
        assert_eq!(
            messages(&check(&records)),
            vec![
                "\\lx a: no \\de field",
                "\\lx a: multiple \\ps",
                "\\lx b: multiple \\de but not matching \\sn",
                "\\lx b: multiple different \\ps",
            ]
        );
    }

    #[test]
    fn invalid_refs_are_warnings() {
        let records = vec![
            record(&[("lx", "cat"), ("de", "feline"), ("sy", "dog; cat"), ("se", "cats")]),
        ];
        let findings = check(&records);
        assert_eq!(
            messages(&findings),
            vec!["\\lx cat: invalid ref \\sy dog", "\\lx cat: illegal marker \\se"]
        );
        assert_eq!(findings[0].severity(), dict_model::Severity::Warning);
        assert_eq!(findings[1].severity(), dict_model::Severity::Error);
    }
}
