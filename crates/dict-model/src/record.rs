//! Ordered marker records.
//!
//! A [`MarkerRecord`] is the unit every stage of the pipeline works on: one
//! SFM block, kept as an ordered list of `(marker, value)` pairs. Markers may
//! repeat and the order of pairs is significant.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Marker holding the headword of an entry.
pub const HEADWORD_MARKER: &str = "lx";
/// Marker holding the homonym number of an entry.
pub const HOMONYM_MARKER: &str = "hm";

/// One SFM record: an ordered sequence of `(marker, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerRecord {
    pairs: Vec<(String, String)>,
}

impl MarkerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pairs: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over `(marker, value)` pairs in record order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> + '_ {
        self.pairs
            .iter()
            .map(|(marker, value)| (marker.as_str(), value.as_str()))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Pair at `index`, if any.
    pub fn pair(&self, index: usize) -> Option<(&str, &str)> {
        self.pairs
            .get(index)
            .map(|(marker, value)| (marker.as_str(), value.as_str()))
    }

    /// Marker name at `index`, if any.
    pub fn marker_at(&self, index: usize) -> Option<&str> {
        self.pairs.get(index).map(|(marker, _)| marker.as_str())
    }

    /// First value recorded for `marker`.
    pub fn get(&self, marker: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == marker)
            .map(|(_, value)| value.as_str())
    }

    /// First value recorded for `marker`, unless it is blank.
    pub fn get_non_empty(&self, marker: &str) -> Option<&str> {
        self.get(marker).filter(|value| !value.trim().is_empty())
    }

    /// All values recorded for `marker`, in record order.
    pub fn get_all(&self, marker: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(name, _)| name == marker)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.pairs.iter().any(|(name, _)| name == marker)
    }

    /// Number of occurrences of `marker`.
    pub fn count(&self, marker: &str) -> usize {
        self.pairs.iter().filter(|(name, _)| name == marker).count()
    }

    pub fn push(&mut self, marker: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((marker.into(), value.into()));
    }

    /// Insert a pair at `index`, clamped to the record length.
    pub fn insert(&mut self, index: usize, marker: impl Into<String>, value: impl Into<String>) {
        let index = index.min(self.pairs.len());
        self.pairs.insert(index, (marker.into(), value.into()));
    }

    pub fn remove(&mut self, index: usize) -> Option<(String, String)> {
        if index < self.pairs.len() {
            Some(self.pairs.remove(index))
        } else {
            None
        }
    }

    /// Replace the value of the pair at `index`.
    pub fn replace_at(&mut self, index: usize, value: impl Into<String>) {
        if let Some(pair) = self.pairs.get_mut(index) {
            pair.1 = value.into();
        }
    }

    /// Replace the first value of `marker`, or append a new pair.
    pub fn set(&mut self, marker: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(name, _)| name == marker) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((marker.to_string(), value)),
        }
    }

    /// Replace the first value of `marker`, or insert a new pair at `index`
    /// (append when `index` is `None`).
    pub fn upsert(&mut self, marker: &str, value: impl Into<String>, index: Option<usize>) {
        let value = value.into();
        if let Some(pair) = self.pairs.iter_mut().find(|(name, _)| name == marker) {
            pair.1 = value;
            return;
        }
        match index {
            Some(index) => self.insert(index, marker, value),
            None => self.pairs.push((marker.to_string(), value)),
        }
    }

    pub fn extend<I, M, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (M, V)>,
        M: Into<String>,
        V: Into<String>,
    {
        self.pairs.extend(
            pairs
                .into_iter()
                .map(|(marker, value)| (marker.into(), value.into())),
        );
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.pairs.retain(|(marker, value)| keep(marker, value));
    }

    /// Split the record into pairs whose marker satisfies `pred` and the rest,
    /// preserving order within both halves.
    pub fn partition(&self, mut pred: impl FnMut(&str) -> bool) -> (MarkerRecord, MarkerRecord) {
        let mut matched = MarkerRecord::new();
        let mut rest = MarkerRecord::new();
        for (marker, value) in &self.pairs {
            if pred(marker) {
                matched.pairs.push((marker.clone(), value.clone()));
            } else {
                rest.pairs.push((marker.clone(), value.clone()));
            }
        }
        (matched, rest)
    }

    /// Occurrence count per marker.
    pub fn markers(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for (marker, _) in &self.pairs {
            *counts.entry(marker.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Headword-based identity: `"{lx} {hm}"`, trimmed.
    pub fn headword_id(&self) -> String {
        format!(
            "{} {}",
            self.get(HEADWORD_MARKER).unwrap_or_default(),
            self.get(HOMONYM_MARKER).unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Check that every marker can be written back to SFM text.
    pub fn validate_markers(&self) -> Result<(), ModelError> {
        for (marker, _) in &self.pairs {
            validate_marker(marker)?;
        }
        Ok(())
    }
}

/// A marker name must be non-empty and free of whitespace and backslashes.
pub fn validate_marker(marker: &str) -> Result<(), ModelError> {
    if marker.is_empty() {
        return Err(ModelError::EmptyMarker);
    }
    if marker
        .chars()
        .any(|ch| ch.is_whitespace() || ch == '\\')
    {
        return Err(ModelError::InvalidMarker {
            marker: marker.to_string(),
        });
    }
    Ok(())
}

impl fmt::Display for MarkerRecord {
    /// Renders `\marker value` lines; empty values render as a bare `\marker`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (marker, value)) in self.pairs.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            if value.is_empty() {
                write!(f, "\\{marker}")?;
            } else {
                write!(f, "\\{marker} {value}")?;
            }
        }
        Ok(())
    }
}

impl<M, V> FromIterator<(M, V)> for MarkerRecord
where
    M: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (M, V)>>(iter: I) -> Self {
        let mut record = MarkerRecord::new();
        record.extend(iter);
        record
    }
}

impl From<Vec<(String, String)>> for MarkerRecord {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

/// Split a multi-value field on `,` or `;`, returning sorted unique tokens.
pub fn split_ids(value: &str) -> Vec<String> {
    let mut ids: Vec<String> = value
        .split([',', ';'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> MarkerRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn headword_id_includes_homonym() {
        let entry = record(&[("lx", "lexeme"), ("hm", "1"), ("marker", "value")]);
        assert_eq!(entry.headword_id(), "lexeme 1");
        let entry = record(&[("lx", "lexeme")]);
        assert_eq!(entry.headword_id(), "lexeme");
    }

    #[test]
    fn upsert_replaces_or_inserts() {
        let mut entry = record(&[("lx", "lexeme"), ("marker", "value")]);
        entry.upsert("marker", "new value", None);
        assert_eq!(entry.get("marker"), Some("new value"));
        entry.upsert("hm", "2", Some(1));
        assert_eq!(entry.marker_at(1), Some("hm"));
        entry.upsert("new_marker", "value", None);
        assert_eq!(entry.marker_at(3), Some("new_marker"));
    }

    #[test]
    fn get_all_keeps_order() {
        let entry = record(&[("cf", "a"), ("de", "x"), ("cf", "b")]);
        assert_eq!(entry.get_all("cf"), vec!["a", "b"]);
        assert_eq!(entry.count("cf"), 2);
        assert_eq!(entry.markers().get("cf"), Some(&2));
    }

    #[test]
    fn partition_preserves_order() {
        let entry = record(&[("lx", "a"), ("de", "b"), ("ps", "n"), ("sn", "1")]);
        let (head, rest) = entry.partition(|marker| marker == "lx" || marker == "ps");
        assert_eq!(head, record(&[("lx", "a"), ("ps", "n")]));
        assert_eq!(rest, record(&[("de", "b"), ("sn", "1")]));
    }

    #[test]
    fn display_renders_sfm_lines() {
        let entry = record(&[("lx", "cat"), ("lemma", ""), ("de", "a pet")]);
        assert_eq!(entry.to_string(), "\\lx cat\n\\lemma\n\\de a pet");
    }

    #[test]
    fn split_ids_sorts_and_dedups() {
        assert_eq!(split_ids("b; a,b ;; c"), vec!["a", "b", "c"]);
        assert!(split_ids(" ; ").is_empty());
    }

    #[test]
    fn rejects_unwritable_markers() {
        assert!(validate_marker("lx").is_ok());
        assert!(matches!(validate_marker(""), Err(ModelError::EmptyMarker)));
        assert!(validate_marker("l x").is_err());
        let entry = record(&[("lx", "a"), ("bad marker", "b")]);
        assert!(entry.validate_markers().is_err());
    }
}
