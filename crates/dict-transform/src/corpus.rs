//! Example collections and the ELAN corpus.

use std::collections::BTreeMap;
use std::path::Path;

use dict_ingest::{ReadOptions, Result, read_sfm_file};
use dict_model::{Diagnostics, MarkerRecord};
use tracing::debug;

use crate::example::Example;

/// Separator of ELAN Toolbox exports.
pub const CORPUS_ENTRY_SEP: &str = "\\utterance_id";

/// Marker renames of ELAN Toolbox exports.
pub const CORPUS_MARKER_MAP: &[(&str, &str)] = &[
    ("utterance_id", "ref"),
    ("utterance", "tx"),
    ("gramm_units", "mb"),
    ("rp_gloss", "gl"),
];

/// Separator of a standalone `examples.sfm` file.
pub const EXAMPLES_ENTRY_SEP: &str = "\\ref";

/// Ordered examples with lookup by id.
///
/// Adding an example under an id that is already present replaces the stored
/// example in place.
#[derive(Debug, Clone, Default)]
pub struct Examples {
    items: Vec<Example>,
    index: BTreeMap<String, usize>,
}

impl Examples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Example> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Example> {
        self.index.get(id).map(|&i| &mut self.items[i])
    }

    /// Store `example` under its id.
    pub fn insert(&mut self, example: Example) {
        let id = example.id();
        match self.index.get(&id) {
            Some(&i) => self.items[i] = example,
            None => {
                self.index.insert(id, self.items.len());
                self.items.push(example);
            }
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Example> {
        self.items.iter()
    }

    /// Keep only examples for which `keep` holds.
    pub fn retain(&mut self, mut keep: impl FnMut(&Example) -> bool) {
        self.items.retain(|example| keep(example));
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(i, example)| (example.id(), i))
            .collect();
    }

    pub fn into_records(self) -> Vec<MarkerRecord> {
        self.items.into_iter().map(Example::into_record).collect()
    }

    /// Read examples from an SFM file.
    pub fn read(
        &mut self,
        path: &Path,
        options: &ReadOptions,
        diagnostics: &mut Diagnostics,
    ) -> Result<usize> {
        let records = read_sfm_file(path, options, diagnostics)?;
        let count = records.len();
        for record in records {
            self.insert(Example::from(record));
        }
        Ok(count)
    }
}

impl FromIterator<Example> for Examples {
    fn from_iter<I: IntoIterator<Item = Example>>(iter: I) -> Self {
        let mut examples = Examples::new();
        for example in iter {
            examples.insert(example);
        }
        examples
    }
}

impl<'a> IntoIterator for &'a Examples {
    type Item = &'a Example;
    type IntoIter = std::slice::Iter<'a, Example>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Examples exported from ELAN, looked up by utterance id.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    examples: Examples,
}

impl Corpus {
    pub fn new(examples: Examples) -> Self {
        Self { examples }
    }

    /// Read every `*.eaf.sfm` file in `files`.
    pub fn from_files(files: &[impl AsRef<Path>], diagnostics: &mut Diagnostics) -> Result<Self> {
        let options = ReadOptions::default()
            .with_entry_sep(CORPUS_ENTRY_SEP)
            .with_marker_map(CORPUS_MARKER_MAP.iter().copied());
        let mut examples = Examples::new();
        for path in files {
            let count = examples.read(path.as_ref(), &options, diagnostics)?;
            debug!(path = %path.as_ref().display(), examples = count, "read corpus file");
        }
        Ok(Self { examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Look up `key`, retrying `Abc.34` as `Abc.034`.
    pub fn get(&self, key: &str) -> Option<&Example> {
        if let Some(example) = self.examples.get(key) {
            return Some(example);
        }
        let (prefix, number) = key.split_once('.')?;
        let number: u64 = number.trim().parse().ok()?;
        self.examples.get(&format!("{prefix}.{number:03}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_elan_export_and_pads_lookup_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.eaf.sfm");
        std::fs::write(
            &path,
            "\\_sh v3.0\n\n\\utterance_id Abc.034\n\\utterance The cat sat.\n\\gramm_units the cat sat\n\\rp_gloss DET cat sit\n",
        )
        .unwrap();
        let mut diagnostics = Diagnostics::new("test");
        let corpus = Corpus::from_files(&[path], &mut diagnostics).unwrap();

        assert_eq!(corpus.len(), 1);
        let example = corpus.get("Abc.34").unwrap();
        assert_eq!(example.text(), Some("The cat sat."));
        assert_eq!(example.get("gl"), Some("DET cat sit"));
        assert!(corpus.get("Abc.35").is_none());
        assert!(corpus.get("nodot").is_none());
    }

    #[test]
    fn insert_replaces_by_id() {
        let mut examples = Examples::new();
        examples.insert(Example::from(MarkerRecord::from_iter([("ref", "a"), ("tx", "1")])));
        examples.insert(Example::from(MarkerRecord::from_iter([("ref", "b"), ("tx", "2")])));
        examples.insert(Example::from(MarkerRecord::from_iter([("ref", "a"), ("tx", "3")])));
        assert_eq!(examples.len(), 2);
        assert_eq!(examples.get("a").and_then(Example::text), Some("3"));

        examples.retain(|example| example.id() != "a");
        assert!(examples.get("a").is_none());
        assert_eq!(examples.get("b").and_then(Example::text), Some("2"));
    }
}
