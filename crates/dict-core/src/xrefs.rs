//! Cross-references between entries.

use std::collections::{BTreeMap, BTreeSet};

use dict_model::{
    Category, Diagnostics, ExtractedEntry, ExtractedRecord, HEADWORD_MARKER, HOMONYM_MARKER,
};
use tracing::debug;

use crate::quoted_list;

const CITATION_MARKER: &str = "lc";

/// Maps every name an entry was known by to its final id.
#[derive(Debug, Clone, Default)]
pub struct CrossRefIndex {
    ids: BTreeMap<String, String>,
    unresolved: BTreeSet<String>,
}

impl CrossRefIndex {
    /// Index the original id, `"{lx} {hm}"`, `"{lx}{hm}"` and the same two
    /// variants of the citation form. Later entries do not displace earlier
    /// ones.
    pub fn new(entries: &[ExtractedEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.add(&entry.original_id, &entry.id);
            let hm = entry.record.get_non_empty(HOMONYM_MARKER).unwrap_or_default();
            for marker in [HEADWORD_MARKER, CITATION_MARKER] {
                let Some(form) = entry.record.get_non_empty(marker) else {
                    continue;
                };
                let form = form.trim();
                index.add(form, &entry.id);
                if !hm.is_empty() {
                    index.add(&format!("{form} {hm}"), &entry.id);
                    index.add(&format!("{form}{hm}"), &entry.id);
                }
            }
        }
        debug!(keys = index.ids.len(), "indexed entry names");
        index
    }

    fn add(&mut self, key: &str, id: &str) {
        if !key.is_empty() {
            self.ids
                .entry(key.to_string())
                .or_insert_with(|| id.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.ids.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Rewrite one cross-reference value.
    ///
    /// Tokens separated by `;` or `,` are replaced by the id they name;
    /// unknown tokens stay as written, and a value without any known token
    /// is returned unchanged.
    pub fn resolve_value(&mut self, value: &str) -> String {
        let mut tokens = Vec::new();
        let mut changed = false;
        for token in value.split([';', ',']) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match self.ids.get(token) {
                Some(id) => {
                    changed |= id != token;
                    tokens.push(id.clone());
                }
                None => {
                    self.unresolved.insert(token.to_string());
                    tokens.push(token.to_string());
                }
            }
        }
        if changed {
            tokens.join(" ; ")
        } else {
            value.to_string()
        }
    }

    /// Rewrite the values of `markers` in every record.
    pub fn resolve<R: ExtractedRecord>(&mut self, markers: &BTreeSet<String>, records: &mut [R]) {
        for record in records.iter_mut() {
            let record = record.record_mut();
            for index in 0..record.len() {
                let Some((marker, value)) = record.pair(index) else {
                    continue;
                };
                if !markers.contains(marker) {
                    continue;
                }
                let resolved = self.resolve_value(value);
                if resolved != value {
                    record.replace_at(index, resolved);
                }
            }
        }
    }

    /// Tokens that matched no entry.
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    pub fn report(&self, diagnostics: &mut Diagnostics) {
        if !self.unresolved.is_empty() {
            diagnostics.warning(
                Category::CrossReference,
                None,
                format!(
                    "Unresolved cross-references: {}",
                    quoted_list(&self.unresolved)
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dict_model::MarkerRecord;

    fn entries() -> Vec<ExtractedEntry> {
        vec![
            ExtractedEntry::new(
                "cat_1",
                "cat",
                MarkerRecord::from_iter([("lx", "cat"), ("hm", "1"), ("lc", "Cat")]),
            ),
            ExtractedEntry::new(
                "LX000001",
                "dog?",
                MarkerRecord::from_iter([("lx", "dog?"), ("cf", "cat 1; mouse")]),
            ),
        ]
    }

    #[test]
    fn indexes_name_variants() {
        let index = CrossRefIndex::new(&entries());
        for key in ["cat", "cat 1", "cat1", "Cat 1", "Cat1", "dog?"] {
            assert!(index.get(key).is_some(), "{key}");
        }
        assert_eq!(index.get("cat1"), Some("cat_1"));
        assert_eq!(index.get("dog?"), Some("LX000001"));
    }

    #[test]
    fn rewrites_known_tokens_and_keeps_the_rest() {
        let mut entries = entries();
        let mut index = CrossRefIndex::new(&entries);
        let markers = ["cf".to_string()].into_iter().collect();
        index.resolve(&markers, &mut entries);
        assert_eq!(entries[1].record.get("cf"), Some("cat_1 ; mouse"));

        let mut diagnostics = Diagnostics::new("test");
        index.report(&mut diagnostics);
        insta::assert_snapshot!(
            diagnostics.render_log(),
            @"WARNING Unresolved cross-references: 'mouse'"
        );
    }
}
