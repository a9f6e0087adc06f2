//! Record visitors and the visit driver.
//!
//! A [`Visitor`] looks at one record at a time and answers with an
//! [`Outcome`]. [`Database::visit`] applies a visitor to every record in a
//! single in-order pass and builds the resulting collection: kept records
//! stay, replaced records are swapped in place, dropped records disappear.
//! No record is visited twice by the same visitor.
//!
//! # Standard Normalization Order
//!
//! 1. **Normalize** - collapse whitespace in `\ps` and `\sd`
//! 2. **Rearrange** - move bracketed `\rf` and `\xsf`/`\xo`/`\xr` next to their example
//! 3. **MarkerFallback** / **MergeMarkers** - submission-configured rewrites
//! 4. **MergePartsOfSpeech** or **PartOfSpeechFilter**

use std::time::Instant;

use dict_model::{Diagnostics, MarkerRecord};
use tracing::{debug, info_span};

/// What a visitor decided for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Keep the record unchanged.
    Keep,
    /// Replace the record.
    Replace(MarkerRecord),
    /// Remove the record from the collection.
    Drop,
}

/// A transformation applied to each record of a collection.
pub trait Visitor {
    /// Decide what happens to `record`.
    fn visit(&mut self, record: &MarkerRecord, diagnostics: &mut Diagnostics) -> Outcome;

    /// Human-readable name for logging.
    fn visitor_name(&self) -> &str;

    /// Whether this visitor should be skipped.
    ///
    /// Default implementation always runs the visitor.
    fn should_skip(&self) -> bool {
        false
    }
}

/// Counts of one visit pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitReport {
    pub kept: usize,
    pub replaced: usize,
    pub dropped: usize,
}

/// An ordered collection of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Database {
    records: Vec<MarkerRecord>,
}

impl Database {
    pub fn new(records: Vec<MarkerRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MarkerRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MarkerRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<MarkerRecord> {
        self.records
    }

    /// Apply `visitor` to every record in order.
    pub fn visit(
        &mut self,
        visitor: &mut dyn Visitor,
        diagnostics: &mut Diagnostics,
    ) -> VisitReport {
        let mut report = VisitReport::default();
        let records = std::mem::take(&mut self.records);
        let mut visited = Vec::with_capacity(records.len());
        for record in records {
            match visitor.visit(&record, diagnostics) {
                Outcome::Keep => {
                    report.kept += 1;
                    visited.push(record);
                }
                Outcome::Replace(replacement) => {
                    report.replaced += 1;
                    visited.push(replacement);
                }
                Outcome::Drop => report.dropped += 1,
            }
        }
        self.records = visited;
        report
    }
}

impl From<Vec<MarkerRecord>> for Database {
    fn from(records: Vec<MarkerRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a Database {
    type Item = &'a MarkerRecord;
    type IntoIter = std::slice::Iter<'a, MarkerRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// An ordered chain of visitors.
///
/// Visitors run one after the other, each over the complete collection.
#[derive(Default)]
pub struct VisitorChain {
    visitors: Vec<Box<dyn Visitor>>,
}

impl VisitorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            visitors: Vec::new(),
        }
    }

    /// Add a visitor to the end of the chain.
    #[must_use]
    pub fn add_visitor(mut self, visitor: Box<dyn Visitor>) -> Self {
        self.visitors.push(visitor);
        self
    }

    /// Run every visitor over `database`.
    pub fn run(
        &mut self,
        database: &mut Database,
        diagnostics: &mut Diagnostics,
    ) -> Vec<(String, VisitReport)> {
        let mut reports = Vec::with_capacity(self.visitors.len());
        for visitor in &mut self.visitors {
            if visitor.should_skip() {
                continue;
            }
            let name = visitor.visitor_name().to_string();
            let span = info_span!("visitor", name = %name, records = database.len());
            let _guard = span.enter();
            let start = Instant::now();
            let report = database.visit(visitor.as_mut(), diagnostics);
            debug!(
                kept = report.kept,
                replaced = report.replaced,
                dropped = report.dropped,
                duration_ms = start.elapsed().as_millis(),
                "visitor complete"
            );
            reports.push((name, report));
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drops `b`, uppercases `c` and remembers what it saw.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    impl Visitor for Recorder {
        fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
            self.seen.push(record.get("lx").unwrap_or_default().to_string());
            match record.get("lx") {
                Some("b") => Outcome::Drop,
                Some("c") => Outcome::Replace(MarkerRecord::from_iter([("lx", "C")])),
                _ => Outcome::Keep,
            }
        }

        fn visitor_name(&self) -> &str {
            "recorder"
        }
    }

    fn database() -> Database {
        Database::new(vec![
            MarkerRecord::from_iter([("lx", "a")]),
            MarkerRecord::from_iter([("lx", "b")]),
            MarkerRecord::from_iter([("lx", "c")]),
        ])
    }

    #[test]
    fn visit_keeps_order_and_removes_dropped() {
        let mut db = database();
        let mut diagnostics = Diagnostics::new("test");
        let mut visitor = Recorder::default();
        let report = db.visit(&mut visitor, &mut diagnostics);
        let headwords: Vec<_> = db.iter().filter_map(|r| r.get("lx")).collect();
        assert_eq!(headwords, vec!["a", "C"]);
        assert_eq!(
            report,
            VisitReport {
                kept: 1,
                replaced: 1,
                dropped: 1
            }
        );
        assert_eq!(visitor.seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn chain_runs_each_visitor_over_the_result_of_the_previous() {
        let mut db = database();
        let mut diagnostics = Diagnostics::new("test");
        let mut chain = VisitorChain::new()
            .add_visitor(Box::new(Recorder::default()))
            .add_visitor(Box::new(Recorder::default()));
        let reports = chain.run(&mut db, &mut diagnostics);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].1.kept, 2);
        assert_eq!(db.len(), 2);
    }
}
