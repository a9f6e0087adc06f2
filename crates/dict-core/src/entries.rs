//! Entry extraction.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use dict_model::{
    ENTRY_ID_PREFIX, EntryRemainder, ExtractedEntry, HEADWORD_MARKER, HOMONYM_MARKER, IdGenerator,
    MarkerRecord,
};
use regex::Regex;
use tracing::debug;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

static VALID_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-]+$").expect("Invalid entry id regex"));

/// Sanitized identifier for a record: the id marker's value with whitespace
/// runs replaced by `_`, plus `_{hm}` when the id marker is the headword.
pub fn sanitize_entry_id(record: &MarkerRecord, id_marker: &str) -> String {
    let original = record.get(id_marker).unwrap_or_default();
    let mut id = WHITESPACE.replace_all(original.trim(), "_").into_owned();
    if !id.is_empty()
        && id_marker == HEADWORD_MARKER
        && let Some(hm) = record.get_non_empty(HOMONYM_MARKER)
    {
        id = format!("{id}_{hm}");
    }
    id
}

/// Splits records into entry markers and the rest.
///
/// Each extracted entry gets a stable id derived from the id marker. When
/// that id is already taken or is not made of `[a-zA-Z0-9_-]`, a generated
/// `LX000001`-style id is used instead.
#[derive(Debug, Clone)]
pub struct EntryExtractor {
    id_marker: String,
    markers: BTreeSet<String>,
    ids: IdGenerator,
    taken: BTreeSet<String>,
    entries: Vec<ExtractedEntry>,
}

impl EntryExtractor {
    pub fn new(id_marker: impl Into<String>, markers: BTreeSet<String>) -> Self {
        Self {
            id_marker: id_marker.into(),
            markers,
            ids: IdGenerator::new(ENTRY_ID_PREFIX),
            taken: BTreeSet::new(),
            entries: Vec::new(),
        }
    }

    /// Extract the entry of `record`.
    ///
    /// Returns `None` when the record holds no entry marker; the record is
    /// then dropped.
    pub fn extract(&mut self, record: &MarkerRecord) -> Option<EntryRemainder> {
        let (entry, rest) = record.partition(|marker| self.markers.contains(marker));
        if entry.is_empty() {
            debug!(markers = record.len(), "record without entry markers dropped");
            return None;
        }

        let original_id = record.get(&self.id_marker).unwrap_or_default().to_string();
        let mut id = sanitize_entry_id(record, &self.id_marker);
        if self.taken.contains(&id) || !VALID_ID.is_match(&id) {
            let generated = self.ids.next_id();
            debug!(original = %original_id, id = %generated, "generated entry id");
            id = generated;
        }
        self.taken.insert(id.clone());

        self.entries
            .push(ExtractedEntry::new(id.clone(), original_id.clone(), entry));
        Some(EntryRemainder {
            entry_id: id,
            original_id,
            record: rest,
        })
    }

    pub fn entries(&self) -> &[ExtractedEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ExtractedEntry> {
        self.entries
    }
}
