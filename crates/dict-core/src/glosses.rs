//! Interlinear glosses attached to examples.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use dict_ingest::GlossRecord;
use dict_model::{Category, Diagnostics, ExtractedExample};
use regex::Regex;
use tracing::debug;

static GLOSS_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*) (\d+)$").expect("Invalid gloss reference regex"));

/// Split a gloss reference like `Text7 3` into text id and segment number.
///
/// Without a trailing number the segment defaults to `"1"`.
pub fn split_gloss_ref(value: &str) -> (String, String) {
    let value = value.trim();
    match GLOSS_REF.captures(value) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (value.to_string(), "1".to_string()),
    }
}

/// Looks up example ids by `(text id, segment number)`.
#[derive(Debug, Clone)]
pub struct GlossToExMapping {
    marker: String,
    ids: BTreeMap<String, BTreeMap<String, String>>,
}

impl GlossToExMapping {
    pub fn new(gloss_ref_marker: impl Into<String>) -> Self {
        Self {
            marker: gloss_ref_marker.into(),
            ids: BTreeMap::new(),
        }
    }

    pub fn add_example(&mut self, example: &ExtractedExample) {
        let gloss_ref = example.record.get(&self.marker).unwrap_or_default();
        let (text_id, segnum) = split_gloss_ref(gloss_ref);
        if text_id.is_empty() {
            return;
        }
        self.ids
            .entry(text_id)
            .or_default()
            .insert(segnum, example.id.clone());
    }

    pub fn add_examples(&mut self, examples: &[ExtractedExample]) {
        for example in examples {
            self.add_example(example);
        }
    }

    pub fn get_example_id(&self, text_id: &str, segnum: &str) -> Option<&str> {
        self.ids.get(text_id)?.get(segnum).map(String::as_str)
    }
}

/// Gloss records keyed by the id of the example they belong to.
#[derive(Debug, Clone, Default)]
pub struct Glosses {
    by_example: BTreeMap<String, GlossRecord>,
}

impl Glosses {
    pub fn get(&self, example_id: &str) -> Option<&GlossRecord> {
        self.by_example.get(example_id)
    }

    pub fn contains(&self, example_id: &str) -> bool {
        self.by_example.contains_key(example_id)
    }

    pub fn len(&self) -> usize {
        self.by_example.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_example.is_empty()
    }

    /// Every column some gloss provides, sorted.
    pub fn columns(&self) -> BTreeSet<&str> {
        self.by_example
            .values()
            .flat_map(|gloss| gloss.example.keys())
            .map(String::as_str)
            .collect()
    }
}

/// Assign each gloss record to the example that references it.
pub fn prepare_glosses(
    records: Vec<GlossRecord>,
    gloss_ref_marker: &str,
    examples: &[ExtractedExample],
) -> Glosses {
    let mut mapping = GlossToExMapping::new(gloss_ref_marker);
    mapping.add_examples(examples);
    let total = records.len();
    let mut glosses = Glosses::default();
    for record in records {
        if let Some(id) = mapping.get_example_id(&record.text_id, &record.segnum) {
            glosses.by_example.insert(id.to_string(), record);
        }
    }
    debug!(records = total, matched = glosses.len(), "assigned glosses");
    glosses
}

/// Log an error for every example whose gloss reference matched nothing.
pub fn check_for_missing_glosses(
    gloss_ref_marker: &str,
    glosses: &Glosses,
    examples: &[ExtractedExample],
    diagnostics: &mut Diagnostics,
) {
    for example in examples {
        let Some(gloss_ref) = example.record.get_non_empty(gloss_ref_marker) else {
            continue;
        };
        if !glosses.contains(&example.id) {
            diagnostics.error(
                Category::Gloss,
                None,
                format!(
                    "Gloss '\\{gloss_ref_marker} {gloss_ref}' not found (ex. {})",
                    example.id
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dict_model::MarkerRecord;

    fn example(id: &str, gloss_ref: &str) -> ExtractedExample {
        ExtractedExample::new(id, id, MarkerRecord::from_iter([("tx", "text"), ("gr", gloss_ref)]))
    }

    fn gloss(text_id: &str, segnum: &str) -> GlossRecord {
        GlossRecord {
            text_id: text_id.to_string(),
            segnum: segnum.to_string(),
            example: BTreeMap::from([("Gloss".to_string(), vec!["cat".to_string()])]),
        }
    }

    #[test]
    fn gloss_refs_split_into_text_and_segment() {
        assert_eq!(split_gloss_ref("Text7 3"), ("Text7".to_string(), "3".to_string()));
        assert_eq!(split_gloss_ref("Text7"), ("Text7".to_string(), "1".to_string()));
        assert_eq!(split_gloss_ref(" My text 12 "), ("My text".to_string(), "12".to_string()));
    }

    #[test]
    fn glosses_are_matched_to_examples() {
        let examples = vec![example("XV000001", "Text7 3"), example("XV000002", "Text7")];
        let glosses = prepare_glosses(
            vec![gloss("Text7", "1"), gloss("Text7", "3"), gloss("Other", "1")],
            "gr",
            &examples,
        );
        assert_eq!(glosses.len(), 2);
        assert_eq!(glosses.get("XV000001").unwrap().segnum, "3");
        assert_eq!(glosses.get("XV000002").unwrap().segnum, "1");
        assert_eq!(glosses.columns().into_iter().collect::<Vec<_>>(), vec!["Gloss"]);
    }

    #[test]
    fn missing_glosses_are_errors() {
        let examples = vec![example("XV000001", "Text9 2"), example("XV000002", "")];
        let glosses = prepare_glosses(Vec::new(), "gr", &examples);
        let mut diagnostics = Diagnostics::new("test");
        check_for_missing_glosses("gr", &glosses, &examples, &mut diagnostics);
        insta::assert_snapshot!(
            diagnostics.render_log(),
            @r"ERROR Gloss '\gr Text9 2' not found (ex. XV000001)"
        );
    }
}
