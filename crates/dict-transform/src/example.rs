//! Example records: cited text, morpheme breakdown, gloss and translation.

use std::fmt;

use dict_model::MarkerRecord;
use md5::{Digest, Md5};
use unicode_normalization::UnicodeNormalization;

/// Canonical example markers in output order.
pub const EXAMPLE_MARKERS: &[&str] = &[
    "ref", "lemma", "rf", "tx", "mb", "gl", "ft", "ot", "ota", "sfx",
];

/// Markers whose repeated lines are joined into one value.
pub const MULTILINE_MARKERS: &[&str] = &["tx", "mb", "gl"];

pub const LEMMA_MARKER: &str = "lemma";
pub const REF_MARKER: &str = "ref";

/// Lowercase ASCII letters and digits of the compatibility decomposition.
pub fn slug(value: &str) -> String {
    value
        .nfkd()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

/// Content id: hex MD5 of the slug.
pub fn hash_id(value: &str) -> String {
    hex::encode(Md5::digest(slug(value).as_bytes()))
}

/// Tab-join whitespace-separated tokens, dropping ELAN comments (`#...`).
pub fn normalize_aligned(value: &str) -> String {
    value
        .split_whitespace()
        .filter(|token| !token.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Join repeated `\tx`, `\mb` and `\gl` lines with spaces, at the position of
/// the first occurrence.
pub fn concat_multilines(record: &MarkerRecord) -> MarkerRecord {
    let mut out = MarkerRecord::with_capacity(record.len());
    let mut merged: Vec<&str> = Vec::new();
    for (marker, value) in record.iter() {
        if merged.contains(&marker) {
            continue;
        }
        if MULTILINE_MARKERS.contains(&marker) {
            out.push(marker, record.get_all(marker).join(" "));
            merged.push(marker);
        } else {
            out.push(marker, value);
        }
    }
    out
}

/// One example.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Example {
    record: MarkerRecord,
}

impl Example {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &MarkerRecord {
        &self.record
    }

    pub fn into_record(self) -> MarkerRecord {
        self.record
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    pub fn get(&self, marker: &str) -> Option<&str> {
        self.record.get(marker)
    }

    pub fn get_non_empty(&self, marker: &str) -> Option<&str> {
        self.record.get_non_empty(marker)
    }

    pub fn contains(&self, marker: &str) -> bool {
        self.record.contains(marker)
    }

    pub fn push(&mut self, marker: impl Into<String>, value: impl Into<String>) {
        self.record.push(marker, value);
    }

    /// The `\ref` value, or a content id computed from text and translation.
    pub fn id(&self) -> String {
        match self.get_non_empty(REF_MARKER) {
            Some(id) => id.to_string(),
            None => hash_id(&format!(
                "{}{}",
                self.text().unwrap_or_default(),
                self.translation().unwrap_or_default()
            )),
        }
    }

    /// Like [`Example::id`], but stores a computed id as the leading `\ref`.
    pub fn ensure_id(&mut self) -> String {
        let id = self.id();
        if self.get_non_empty(REF_MARKER).is_none() {
            self.record.retain(|marker, _| marker != REF_MARKER);
            self.record.insert(0, REF_MARKER, id.clone());
        }
        id
    }

    /// Replace the first value of `marker`, or append it.
    ///
    /// `\lemma` accumulates instead: a non-empty value is joined to an
    /// existing non-empty lemma with `" ; "`. Empty values never overwrite
    /// a lemma.
    pub fn set(&mut self, marker: &str, value: impl Into<String>) {
        let value = value.into();
        if marker != LEMMA_MARKER {
            self.record.set(marker, value);
            return;
        }
        if value.is_empty() {
            return;
        }
        let existing = self
            .record
            .iter()
            .position(|(name, v)| name == LEMMA_MARKER && !v.is_empty());
        match existing {
            Some(index) => {
                let current = self.record.pair(index).map(|(_, v)| v).unwrap_or_default();
                let joined = format!("{current} ; {value}");
                self.record.replace_at(index, joined);
            }
            None => self.record.set(LEMMA_MARKER, value),
        }
    }

    /// Headwords citing this example.
    pub fn lemmas(&self) -> Vec<String> {
        self.get(LEMMA_MARKER)
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|lemma| !lemma.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn corpus_ref(&self) -> Option<&str> {
        self.get("rf")
    }

    pub fn text(&self) -> Option<&str> {
        self.get("tx")
    }

    pub fn translation(&self) -> Option<&str> {
        self.get("ft")
    }

    pub fn alt_translation(&self) -> Option<&str> {
        self.get("ot")
    }

    pub fn soundfile(&self) -> Option<&str> {
        self.get("sfx")
    }

    /// Morpheme breakdown, tab-separated.
    pub fn morphemes(&self) -> Option<String> {
        self.get("mb").map(normalize_aligned)
    }

    /// Interlinear gloss, tab-separated.
    pub fn gloss(&self) -> Option<String> {
        self.get("gl").map(normalize_aligned)
    }

    /// Merge repeated multi-line markers in place.
    pub fn concat_multilines(&mut self) {
        self.record = concat_multilines(&self.record);
    }
}

impl From<MarkerRecord> for Example {
    fn from(record: MarkerRecord) -> Self {
        Self { record }
    }
}

impl fmt::Display for Example {
    /// Every canonical marker on its own line, in canonical order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, marker) in EXAMPLE_MARKERS.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            let raw = self.get(marker).unwrap_or_default();
            let value = if *marker == "mb" || *marker == "gl" {
                normalize_aligned(raw)
            } else {
                raw.split_whitespace().collect::<Vec<_>>().join(" ")
            };
            if value.is_empty() {
                write!(f, "\\{marker}")?;
            } else {
                write!(f, "\\{marker} {value}")?;
            }
        }
        Ok(())
    }
}
