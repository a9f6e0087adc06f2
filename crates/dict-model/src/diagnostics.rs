//! Per-submission diagnostics report.
//!
//! Every stage records what it dropped, could not resolve, or found suspicious
//! into a [`Diagnostics`] value that is passed down the pipeline. Recording a
//! diagnostic also emits a `tracing` event, so the operator sees the same
//! findings live that end up in the submission's log file.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }
}

/// Which part of the pipeline a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Parse,
    Structure,
    Example,
    Media,
    CrossReference,
    Gloss,
    Row,
    Config,
    Check,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Parse => "parse",
            Category::Structure => "structure",
            Category::Example => "example",
            Category::Media => "media",
            Category::CrossReference => "cross_reference",
            Category::Gloss => "gloss",
            Category::Row => "row",
            Category::Config => "config",
            Category::Check => "check",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    /// Identifying value of the affected record (usually its headword).
    pub context: Option<String>,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(
                f,
                "{} {}: {}",
                self.severity.as_str(),
                context,
                self.message
            ),
            None => write!(f, "{} {}", self.severity.as_str(), self.message),
        }
    }
}

/// Diagnostics collected while processing one submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub submission: String,
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(submission: impl Into<String>) -> Self {
        Self {
            submission: submission.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        let context = diagnostic.context.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Error => error!(
                submission = %self.submission,
                category = %diagnostic.category,
                context,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => warn!(
                submission = %self.submission,
                category = %diagnostic.category,
                context,
                "{}",
                diagnostic.message
            ),
            Severity::Info => info!(
                submission = %self.submission,
                category = %diagnostic.category,
                context,
                "{}",
                diagnostic.message
            ),
        }
        self.entries.push(diagnostic);
    }

    pub fn record(
        &mut self,
        severity: Severity,
        category: Category,
        context: Option<&str>,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic {
            severity,
            category,
            context: context.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn error(&mut self, category: Category, context: Option<&str>, message: impl Into<String>) {
        self.record(Severity::Error, category, context, message);
    }

    pub fn warning(
        &mut self,
        category: Category,
        context: Option<&str>,
        message: impl Into<String>,
    ) {
        self.record(Severity::Warning, category, context, message);
    }

    pub fn info(&mut self, category: Category, context: Option<&str>, message: impl Into<String>) {
        self.record(Severity::Info, category, context, message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_severity(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count_severity(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }

    /// Diagnostics per category, errors and warnings only.
    pub fn counts_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for diagnostic in &self.entries {
            if diagnostic.severity != Severity::Info {
                *counts.entry(diagnostic.category).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(move |diagnostic| diagnostic.category == category)
    }

    /// Plain-text body of the per-submission log file.
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        for diagnostic in &self.entries {
            out.push_str(&diagnostic.to_string());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_severity_and_category() {
        let mut diagnostics = Diagnostics::new("teop");
        diagnostics.error(Category::Row, Some("cat"), "no senses found for entry cat");
        diagnostics.warning(Category::Media, None, "Unknown media files: 'x.wav'");
        diagnostics.info(Category::Example, None, "pruning 1 uncited examples from 3");
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(diagnostics.has_errors());
        let counts = diagnostics.counts_by_category();
        assert_eq!(counts.get(&Category::Row), Some(&1));
        assert_eq!(counts.get(&Category::Example), None);
    }

    #[test]
    fn renders_log_lines() {
        let mut diagnostics = Diagnostics::new("teop");
        diagnostics.error(Category::Row, Some("\\lx cat"), "\\ps marker missing");
        diagnostics.warning(Category::CrossReference, None, "2 unresolved cross-references");
        insta::assert_snapshot!(diagnostics.render_log(), @r"
        ERROR \lx cat: \ps marker missing
        WARNING 2 unresolved cross-references
        ");
    }

    #[test]
    fn serializes_lowercase_severity() {
        let mut diagnostics = Diagnostics::new("teop");
        diagnostics.warning(Category::CrossReference, Some("a"), "m");
        let json = serde_json::to_value(&diagnostics).expect("serialize diagnostics");
        assert_eq!(json["entries"][0]["severity"], "warning");
        assert_eq!(json["entries"][0]["category"], "cross_reference");
    }
}
