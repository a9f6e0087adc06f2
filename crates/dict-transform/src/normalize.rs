//! Value normalization visitors.

use dict_model::{
    Category, Diagnostics, FallbackScope, MarkerFallbackRule, MarkerRecord, MergeMarkersRule,
};

use crate::visit::{Outcome, Visitor};

/// Markers whose values get whitespace and underscores collapsed.
pub const COLLAPSED_MARKERS: &[&str] = &["ps", "sd"];

/// Replace underscores with spaces and collapse runs of whitespace.
pub fn collapse_whitespace(value: &str) -> String {
    value
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace and underscores in `\ps` and `\sd`.
pub fn normalize(record: &MarkerRecord) -> MarkerRecord {
    record
        .iter()
        .map(|(marker, value)| {
            if COLLAPSED_MARKERS.contains(&marker) {
                (marker, collapse_whitespace(value))
            } else {
                (marker, value.to_string())
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

impl Visitor for Normalize {
    fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
        let normalized = normalize(record);
        if normalized == *record {
            Outcome::Keep
        } else {
            Outcome::Replace(normalized)
        }
    }

    fn visitor_name(&self) -> &str {
        "normalize"
    }
}

// =============================================================================
// Parts of speech
// =============================================================================

/// Merge all distinct non-empty `\ps` values into one marker at the position
/// of the first `\ps`.
pub fn merge_pos(record: &MarkerRecord) -> Option<MarkerRecord> {
    let mut values: Vec<&str> = record
        .get_all("ps")
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .collect();
    if values.len() < 2 {
        return None;
    }
    values.sort_unstable();
    values.dedup();
    let merged = values.join(" ; ");

    let mut out = MarkerRecord::with_capacity(record.len());
    let mut pending = Some(merged);
    for (marker, value) in record.iter() {
        if marker == "ps" {
            if let Some(merged) = pending.take() {
                out.push("ps", merged);
            }
        } else {
            out.push(marker, value);
        }
    }
    Some(out)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MergePartsOfSpeech;

impl Visitor for MergePartsOfSpeech {
    fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
        match merge_pos(record) {
            Some(merged) => Outcome::Replace(merged),
            None => Outcome::Keep,
        }
    }

    fn visitor_name(&self) -> &str {
        "merge_pos"
    }
}

/// Drops entries with a missing, empty or conflicting `\ps`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartOfSpeechFilter {
    enabled: bool,
}

impl PartOfSpeechFilter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Visitor for PartOfSpeechFilter {
    fn visit(&mut self, record: &MarkerRecord, diagnostics: &mut Diagnostics) -> Outcome {
        let context = format!("\\lx {}", record.get("lx").unwrap_or_default());
        let all = record.get_all("ps");
        if all.is_empty() {
            diagnostics.error(Category::Structure, Some(&context), "\\ps marker missing");
            return Outcome::Drop;
        }
        let values: Vec<&str> = all.into_iter().filter(|v| !v.trim().is_empty()).collect();
        if values.is_empty() {
            diagnostics.error(Category::Structure, Some(&context), "\\ps marker empty");
            return Outcome::Drop;
        }
        let first = values[0];
        if values.iter().any(|value| *value != first) {
            let listed = values
                .iter()
                .map(|value| format!("'{value}'"))
                .collect::<Vec<_>>()
                .join(", ");
            diagnostics.error(
                Category::Structure,
                Some(&context),
                format!("conflicting \\ps markers: {listed}"),
            );
            return Outcome::Drop;
        }
        Outcome::Keep
    }

    fn visitor_name(&self) -> &str {
        "part_of_speech_filter"
    }

    fn should_skip(&self) -> bool {
        !self.enabled
    }
}

// =============================================================================
// Marker fallbacks
// =============================================================================

/// Split a record into sense groups, each starting with `\sn`.
fn split_senses(record: &MarkerRecord) -> Vec<MarkerRecord> {
    let mut groups = Vec::new();
    let mut current = MarkerRecord::new();
    for (marker, value) in record.iter() {
        if marker == "sn" && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
        current.push(marker, value);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// When `target` is empty or missing, fill it from the first non-empty
/// `source`, placed right before that source marker.
pub fn marker_fallback_entry(record: &MarkerRecord, target: &str, source: &str) -> MarkerRecord {
    if record.get_non_empty(target).is_some() {
        return record.clone();
    }
    let mut out = MarkerRecord::with_capacity(record.len() + 1);
    let mut filled = false;
    for (marker, value) in record.iter() {
        if marker == target && !filled {
            continue;
        }
        if marker == source && !value.is_empty() && !filled {
            out.push(target, value.replace('_', " "));
            filled = true;
        }
        out.push(marker, value);
    }
    out
}

/// [`marker_fallback_entry`] applied to every sense group separately.
pub fn marker_fallback_sense(record: &MarkerRecord, target: &str, source: &str) -> MarkerRecord {
    split_senses(record)
        .iter()
        .flat_map(|sense| marker_fallback_entry(sense, target, source).into_pairs())
        .collect()
}

/// Applies the submission's `marker_fallbacks`.
#[derive(Debug, Clone, Default)]
pub struct MarkerFallback {
    rules: Vec<MarkerFallbackRule>,
}

impl MarkerFallback {
    pub fn new(rules: Vec<MarkerFallbackRule>) -> Self {
        Self { rules }
    }
}

impl Visitor for MarkerFallback {
    fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
        let mut current = record.clone();
        for rule in &self.rules {
            current = match rule.scope {
                FallbackScope::Entry => marker_fallback_entry(&current, &rule.target, &rule.source),
                FallbackScope::Sense => marker_fallback_sense(&current, &rule.target, &rule.source),
            };
        }
        if current == *record {
            Outcome::Keep
        } else {
            Outcome::Replace(current)
        }
    }

    fn visitor_name(&self) -> &str {
        "marker_fallback"
    }

    fn should_skip(&self) -> bool {
        self.rules.is_empty()
    }
}

// =============================================================================
// Marker merging
// =============================================================================

/// First value as a caption to the rest: `"first: rest..."`.
pub fn merge_caption(values: &[(String, String)]) -> String {
    match values {
        [] => String::new(),
        [(_, only)] => only.clone(),
        [(_, first), rest @ ..] => {
            let rest: Vec<&str> = rest.iter().map(|(_, value)| value.as_str()).collect();
            format!("{first}: {}", rest.join(" "))
        }
    }
}

/// Merge runs of adjacent `old_markers` into one `new_marker`.
///
/// A run ends at the first marker outside the set, or when a marker repeats
/// within the run.
pub fn merge_markers(record: &MarkerRecord, old_markers: &[String], new_marker: &str) -> MarkerRecord {
    let mut out = MarkerRecord::with_capacity(record.len());
    let mut run: Vec<(String, String)> = Vec::new();
    for (marker, value) in record.iter() {
        if old_markers.iter().any(|old| old == marker) {
            if run.iter().any(|(seen, _)| seen == marker) {
                out.push(new_marker, merge_caption(&run));
                run.clear();
            }
            run.push((marker.to_string(), value.to_string()));
        } else {
            if !run.is_empty() {
                out.push(new_marker, merge_caption(&run));
                run.clear();
            }
            out.push(marker, value);
        }
    }
    if !run.is_empty() {
        out.push(new_marker, merge_caption(&run));
    }
    out
}

/// Applies the submission's `merge_markers` rules.
#[derive(Debug, Clone, Default)]
pub struct MergeMarkers {
    rules: Vec<MergeMarkersRule>,
}

impl MergeMarkers {
    pub fn new(rules: Vec<MergeMarkersRule>) -> Self {
        Self { rules }
    }
}

impl Visitor for MergeMarkers {
    fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
        let mut current = record.clone();
        for rule in &self.rules {
            current = merge_markers(&current, &rule.markers, &rule.into);
        }
        if current == *record {
            Outcome::Keep
        } else {
            Outcome::Replace(current)
        }
    }

    fn visitor_name(&self) -> &str {
        "merge_markers"
    }

    fn should_skip(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> MarkerRecord {
        pairs.iter().copied().collect()
    }

    #[test]
    fn normalizes_part_of_speech_and_domains() {
        let out = normalize(&record(&[("lx", "a  b"), ("ps", " noun_phrase  x"), ("sd", "a__b")]));
        assert_eq!(out.get("lx"), Some("a  b"));
        assert_eq!(out.get("ps"), Some("noun phrase x"));
        assert_eq!(out.get("sd"), Some("a b"));
    }

    #[test]
    fn merges_distinct_parts_of_speech() {
        let merged = merge_pos(&record(&[("lx", "a"), ("ps", "v"), ("de", "x"), ("ps", "n"), ("ps", "v")]))
            .expect("merged");
        assert_eq!(merged, record(&[("lx", "a"), ("ps", "n ; v"), ("de", "x")]));
        assert!(merge_pos(&record(&[("lx", "a"), ("ps", "v")])).is_none());
    }

    #[test]
    fn filter_reports_missing_and_conflicting_pos() {
        let mut filter = PartOfSpeechFilter::new(true);
        let mut diagnostics = Diagnostics::new("test");
        assert_eq!(
            filter.visit(&record(&[("lx", "a")]), &mut diagnostics),
            Outcome::Drop
        );
        assert_eq!(
            filter.visit(&record(&[("lx", "b"), ("ps", "n"), ("ps", "v")]), &mut diagnostics),
            Outcome::Drop
        );
        assert_eq!(
            filter.visit(&record(&[("lx", "c"), ("ps", "n"), ("ps", "n")]), &mut diagnostics),
            Outcome::Keep
        );
        insta::assert_snapshot!(diagnostics.render_log(), @r"
        ERROR \lx a: \ps marker missing
        ERROR \lx b: conflicting \ps markers: 'n', 'v'
        ");
    }

    #[test]
    fn disabled_filter_is_skipped() {
        assert!(PartOfSpeechFilter::default().should_skip());
    }

    #[test]
    fn entry_fallback_fills_before_source() {
        let out = marker_fallback_entry(
            &record(&[("lx", "a"), ("de", ""), ("ge", "big_dog")]),
            "de",
            "ge",
        );
        assert_eq!(out, record(&[("lx", "a"), ("de", "big dog"), ("ge", "big_dog")]));
    }

    #[test]
    fn sense_fallback_works_per_sense() {
        let out = marker_fallback_sense(
            &record(&[
                ("lx", "a"),
                ("sn", "1"),
                ("de", "one"),
                ("ge", "x"),
                ("sn", "2"),
                ("ge", "two"),
            ]),
            "de",
            "ge",
        );
        assert_eq!(
            out,
            record(&[
                ("lx", "a"),
                ("sn", "1"),
                ("de", "one"),
                ("ge", "x"),
                ("sn", "2"),
                ("de", "two"),
                ("ge", "two"),
            ])
        );
    }

    #[test]
    fn merges_adjacent_markers_into_caption() {
        let markers = vec!["pc".to_string(), "cap".to_string()];
        let out = merge_markers(
            &record(&[("pc", "photo.jpg"), ("cap", "a dog"), ("de", "x"), ("pc", "b.jpg")]),
            &markers,
            "pc",
        );
        assert_eq!(
            out,
            record(&[("pc", "photo.jpg: a dog"), ("de", "x"), ("pc", "b.jpg")])
        );
    }

    #[test]
    fn repeated_marker_starts_new_run() {
        let markers = vec!["a".to_string(), "b".to_string()];
        let out = merge_markers(&record(&[("a", "1"), ("b", "2"), ("a", "3")]), &markers, "m");
        assert_eq!(out, record(&[("m", "1: 2"), ("m", "3")]));
    }
}
