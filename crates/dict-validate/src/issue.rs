//! Check findings.
//!
//! Each [`Issue`] variant carries only the data its message needs.

use std::fmt;

use dict_model::{Category, Diagnostics, Severity};
use serde::Serialize;

/// Problem found in one dictionary record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Issue {
    // Identity
    /// Another record has the same headword and homonym number.
    DuplicateLemma,

    // Presence
    /// No non-empty `\de`.
    NoDescription,

    // Consistency
    /// More than one `\de` but a different number of `\sn`.
    DescriptionSenseMismatch { descriptions: usize, senses: usize },
    /// Repeated `\ps` with the same value.
    MultiplePartsOfSpeech,
    /// Repeated `\ps` with different values.
    MultipleDifferentPartsOfSpeech,

    // References
    /// A reference marker names no known headword.
    InvalidRef { marker: String, target: String },
    /// A media reference names no known file.
    MissingFile { marker: String, file: String },

    // Structure
    /// Marker that must not occur in a submission.
    IllegalMarker { marker: String },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::InvalidRef { .. } | Issue::MissingFile { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateLemma => f.write_str("duplicate lemma"),
            Issue::NoDescription => f.write_str("no \\de field"),
            Issue::DescriptionSenseMismatch { .. } => {
                f.write_str("multiple \\de but not matching \\sn")
            }
            Issue::MultiplePartsOfSpeech => f.write_str("multiple \\ps"),
            Issue::MultipleDifferentPartsOfSpeech => f.write_str("multiple different \\ps"),
            Issue::InvalidRef { marker, target } => write!(f, "invalid ref \\{marker} {target}"),
            Issue::MissingFile { marker, file } => write!(f, "missing file \\{marker} {file}"),
            Issue::IllegalMarker { marker } => write!(f, "illegal marker \\{marker}"),
        }
    }
}

/// An issue and the headword of the record it was found in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Finding {
    pub entry: String,
    pub issue: Issue,
}

impl Finding {
    pub fn new(entry: impl Into<String>, issue: Issue) -> Self {
        Self {
            entry: entry.into(),
            issue,
        }
    }

    pub fn severity(&self) -> Severity {
        self.issue.severity()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\\lx {}: {}", self.entry, self.issue)
    }
}

/// Add findings to the report as check diagnostics.
pub fn record_findings(findings: &[Finding], diagnostics: &mut Diagnostics) {
    for finding in findings {
        diagnostics.record(
            finding.severity(),
            Category::Check,
            Some(&format!("\\lx {}", finding.entry)),
            finding.issue.to_string(),
        );
    }
}
