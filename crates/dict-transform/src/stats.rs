//! Marker usage statistics.

use std::collections::{BTreeMap, BTreeSet};

use dict_model::{Diagnostics, HEADWORD_MARKER, MarkerRecord};
use serde::Serialize;

use crate::visit::{Outcome, Visitor};

/// Characters that suggest a value holds several items.
const IMPLICIT_SEPARATORS: [char; 2] = [',', ';'];

/// Usage of one marker across a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerStats {
    pub marker: String,
    /// Number of entries using the marker.
    pub entries: usize,
    /// Total number of occurrences.
    pub total: usize,
    /// Highest number of occurrences within one entry.
    pub max_per_entry: usize,
    /// Whether any value contains `,` or `;`.
    pub implicit_multiple: bool,
}

/// Collects [`MarkerStats`]. Entries without `\lx` are ignored.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    count: BTreeMap<String, usize>,
    total: BTreeMap<String, usize>,
    max_per_entry: BTreeMap<String, usize>,
    implicit_multiple: BTreeSet<String>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &MarkerRecord) {
        if record.get_non_empty(HEADWORD_MARKER).is_none() {
            return;
        }
        for (marker, occurrences) in record.markers() {
            *self.count.entry(marker.to_string()).or_insert(0) += 1;
            *self.total.entry(marker.to_string()).or_insert(0) += occurrences;
            let max = self.max_per_entry.entry(marker.to_string()).or_insert(0);
            *max = (*max).max(occurrences);
        }
        for (marker, value) in record.iter() {
            if value.contains(IMPLICIT_SEPARATORS) {
                self.implicit_multiple.insert(marker.to_string());
            }
        }
    }

    /// Per-marker results, most frequently used first.
    pub fn markers(&self) -> Vec<MarkerStats> {
        let mut rows: Vec<MarkerStats> = self
            .count
            .iter()
            .map(|(marker, entries)| MarkerStats {
                marker: marker.clone(),
                entries: *entries,
                total: self.total.get(marker).copied().unwrap_or(0),
                max_per_entry: self.max_per_entry.get(marker).copied().unwrap_or(0),
                implicit_multiple: self.implicit_multiple.contains(marker),
            })
            .collect();
        rows.sort_by(|a, b| b.entries.cmp(&a.entries).then_with(|| a.marker.cmp(&b.marker)));
        rows
    }
}

impl Visitor for Stats {
    fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
        self.add(record);
        Outcome::Keep
    }

    fn visitor_name(&self) -> &str {
        "stats"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_entries_totals_and_maxima() {
        let mut stats = Stats::new();
        stats.add(&MarkerRecord::from_iter([
            ("lx", "a"),
            ("de", "one, two"),
            ("de", "three"),
        ]));
        stats.add(&MarkerRecord::from_iter([("lx", "b"), ("de", "x")]));
        stats.add(&MarkerRecord::from_iter([("de", "no headword")]));

        insta::assert_json_snapshot!(stats.markers(), @r#"
        [
          {
            "marker": "de",
            "entries": 2,
            "total": 3,
            "max_per_entry": 2,
            "implicit_multiple": true
          },
          {
            "marker": "lx",
            "entries": 2,
            "total": 2,
            "max_per_entry": 1,
            "implicit_multiple": false
          }
        ]
        "#);
    }
}
