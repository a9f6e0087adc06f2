//! Example preparation and sense back-references.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use dict_ingest::ReadOptions;
use dict_model::{
    Category, Diagnostics, EXAMPLE_ID_PREFIX, ExtractedExample, ExtractedSense, IdGenerator,
    MarkerRecord,
};
use dict_map::EXAMPLE_REF_MARKER;
use dict_transform::{EXAMPLES_ENTRY_SEP, Examples};
use tracing::info;

use crate::quoted_list;

/// Read a standalone examples file, joining multi-line values.
pub fn read_examples_file(
    path: &Path,
    options: &ReadOptions,
    diagnostics: &mut Diagnostics,
) -> dict_ingest::Result<Examples> {
    let options = options.clone().with_entry_sep(EXAMPLES_ENTRY_SEP);
    let mut raw = Examples::new();
    raw.read(path, &options, diagnostics)?;
    Ok(raw
        .iter()
        .cloned()
        .map(|mut example| {
            example.concat_multilines();
            example
        })
        .collect())
}

/// Keep only the examples some record cites with `\xref`.
///
/// Returns the number of pruned examples.
pub fn prune_uncited(
    examples: &mut Examples,
    records: &[MarkerRecord],
    diagnostics: &mut Diagnostics,
) -> usize {
    let cited: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| record.get_all(EXAMPLE_REF_MARKER))
        .collect();
    let total = examples.len();
    examples.retain(|example| cited.contains(example.id().as_str()));
    let pruned = total - examples.len();
    diagnostics.info(
        Category::Example,
        None,
        format!("pruning {pruned} uncited examples from {total}"),
    );
    pruned
}

/// Examples ready for output, indexed by the key senses cite them with.
#[derive(Debug, Clone, Default)]
pub struct PreparedExamples {
    examples: Vec<ExtractedExample>,
    index: BTreeMap<String, usize>,
    /// Markers found in examples that belong to no example column.
    pub unexpected_markers: BTreeSet<String>,
}

impl PreparedExamples {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[ExtractedExample] {
        &self.examples
    }

    pub fn examples_mut(&mut self) -> &mut [ExtractedExample] {
        &mut self.examples
    }

    pub fn into_examples(self) -> Vec<ExtractedExample> {
        self.examples
    }

    /// Example cited as `key`.
    pub fn get(&self, key: &str) -> Option<&ExtractedExample> {
        self.index.get(key).map(|&i| &self.examples[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ExtractedExample> {
        self.index.get(key).map(|&i| &mut self.examples[i])
    }
}

/// Reduce examples to their example markers and give them output ids.
pub fn prepare_examples(markers: &BTreeSet<String>, examples: &Examples) -> PreparedExamples {
    let mut ids = IdGenerator::new(EXAMPLE_ID_PREFIX);
    let mut prepared = PreparedExamples::default();
    for example in examples {
        let (kept, rest) = example.record().partition(|marker| markers.contains(marker));
        prepared
            .unexpected_markers
            .extend(rest.iter().map(|(marker, _)| marker.to_string()));

        let key = example.id();
        let extracted = ExtractedExample::new(ids.next_id(), key.clone(), kept);
        match prepared.index.get(&key) {
            Some(&i) => prepared.examples[i] = extracted,
            None => {
                prepared.index.insert(key, prepared.examples.len());
                prepared.examples.push(extracted);
            }
        }
    }
    prepared
}

/// Links senses to the examples they cite.
#[derive(Debug, Clone, Default)]
pub struct ExampleReferencer {
    invalid: BTreeSet<String>,
}

impl ExampleReferencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add each sense's id to the examples it cites with `\xref`.
    pub fn reference(&mut self, senses: &[ExtractedSense], examples: &mut PreparedExamples) {
        for sense in senses {
            for key in sense.record.get_all(EXAMPLE_REF_MARKER) {
                match examples.get_mut(key) {
                    Some(example) => example.sense_ids.push(sense.id.clone()),
                    None => {
                        self.invalid.insert(key.to_string());
                    }
                }
            }
        }
    }

    /// Cited keys without an example.
    pub fn invalid_example_ids(&self) -> &BTreeSet<String> {
        &self.invalid
    }

    pub fn report(&self, diagnostics: &mut Diagnostics) {
        if self.invalid.is_empty() {
            return;
        }
        info!(count = self.invalid.len(), "senses cite unknown examples");
        diagnostics.warning(
            Category::CrossReference,
            None,
            format!(
                "Unknown examples references by senses: {}",
                quoted_list(&self.invalid)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dict_transform::Example;

    fn examples() -> Examples {
        [
            MarkerRecord::from_iter([("ref", "a"), ("tx", "one"), ("ft", "1"), ("zz", "?")]),
            MarkerRecord::from_iter([("ref", "b"), ("tx", "two"), ("ft", "2")]),
        ]
        .into_iter()
        .map(Example::from)
        .collect()
    }

    fn markers() -> BTreeSet<String> {
        ["ref", "tx", "ft"].into_iter().map(String::from).collect()
    }

    #[test]
    fn prepared_examples_get_new_ids_and_lose_unknown_markers() {
        let prepared = prepare_examples(&markers(), &examples());
        assert_eq!(prepared.len(), 2);
        let a = prepared.get("a").unwrap();
        assert_eq!(a.id, "XV000001");
        assert_eq!(a.original_id, "a");
        assert!(!a.record.contains("zz"));
        assert_eq!(prepared.get("b").unwrap().id, "XV000002");
        assert_eq!(
            prepared.unexpected_markers.iter().collect::<Vec<_>>(),
            vec!["zz"]
        );
    }

    #[test]
    fn senses_are_attached_to_cited_examples() {
        let mut prepared = prepare_examples(&markers(), &examples());
        let mut sense = ExtractedSense::new("SN000001", "cat", MarkerRecord::new());
        sense.record.push("xref", "a");
        sense.record.push("xref", "missing");
        let mut referencer = ExampleReferencer::new();
        referencer.reference(&[sense], &mut prepared);

        assert_eq!(prepared.get("a").unwrap().sense_ids, vec!["SN000001"]);
        assert!(prepared.get("b").unwrap().sense_ids.is_empty());

        let mut diagnostics = Diagnostics::new("test");
        referencer.report(&mut diagnostics);
        insta::assert_snapshot!(
            diagnostics.render_log(),
            @"WARNING Unknown examples references by senses: 'missing'"
        );
    }

    #[test]
    fn uncited_examples_are_pruned() {
        let mut examples = examples();
        let records = vec![MarkerRecord::from_iter([("lx", "cat"), ("xref", "b")])];
        let mut diagnostics = Diagnostics::new("test");
        assert_eq!(prune_uncited(&mut examples, &records, &mut diagnostics), 1);
        assert!(examples.get("a").is_none());
        insta::assert_snapshot!(
            diagnostics.render_log(),
            @"INFO pruning 1 uncited examples from 2"
        );
    }

    #[test]
    fn examples_file_values_are_joined() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("examples.sfm");
        std::fs::write(&path, "\\ref a\n\\tx one\n\\ft 1\n\\tx two\n\n\\ref b\n\\tx three\n").unwrap();
        let mut diagnostics = Diagnostics::new("test");
        let examples =
            read_examples_file(&path, &ReadOptions::default(), &mut diagnostics).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples.get("a").and_then(Example::text), Some("one two"));
    }
}
