//! Rewriting entry labels into links.

use std::collections::BTreeMap;

use dict_map::{LINKS_WITH_NO_LABEL, LinkSettings};
use dict_model::{
    ExtractedEntry, ExtractedExample, ExtractedRecord, ExtractedSense, HEADWORD_MARKER,
    HOMONYM_MARKER, MarkerRecord,
};
use regex::Captures;
use tracing::debug;

/// Link target of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    id: String,
    label: String,
}

/// Entry labels and ids keyed by the names a link may use.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    targets: BTreeMap<String, Target>,
}

impl LinkIndex {
    /// Index entries by original id and by `"{lx} {hm}"`; the link text is
    /// the value of `display_label`.
    pub fn new(entries: &[ExtractedEntry], display_label: &str) -> Self {
        let mut targets = BTreeMap::new();
        for entry in entries {
            let target = Target {
                id: entry.id.clone(),
                label: entry.record.get(display_label).unwrap_or_default().to_string(),
            };
            targets.insert(entry.original_id.clone(), target.clone());
            let Some(lx) = entry.record.get_non_empty(HEADWORD_MARKER) else {
                continue;
            };
            let key = match entry.record.get_non_empty(HOMONYM_MARKER) {
                Some(hm) => format!("{lx} {hm}"),
                None => lx.to_string(),
            };
            targets.insert(key, target);
        }
        Self { targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// `[label](id)` for `key`, or the bare id when `bare` is set.
    pub fn link(&self, key: &str, bare: bool) -> Option<String> {
        let target = self.targets.get(key)?;
        Some(if bare {
            target.id.clone()
        } else {
            format!("[{}]({})", target.label, target.id)
        })
    }
}

/// Replaces entry labels found by the link regex with links.
#[derive(Debug, Clone)]
pub struct LinkProcessor {
    index: LinkIndex,
    settings: LinkSettings,
}

impl LinkProcessor {
    pub fn new(index: LinkIndex, settings: LinkSettings) -> Self {
        Self { index, settings }
    }

    fn process_value(&self, marker: &str, value: &str) -> String {
        let bare = LINKS_WITH_NO_LABEL.contains(&marker);
        self.settings
            .regex
            .replace_all(value, |caps: &Captures<'_>| {
                let found = &caps[0];
                self.index
                    .link(found.trim(), bare)
                    .unwrap_or_else(|| found.to_string())
            })
            .into_owned()
    }

    /// Copy of `record` with links in the configured markers.
    pub fn process_record(&self, record: &MarkerRecord) -> MarkerRecord {
        record
            .iter()
            .map(|(marker, value)| {
                if self.settings.markers.contains(marker) {
                    (marker.to_string(), self.process_value(marker, value))
                } else {
                    (marker.to_string(), value.to_string())
                }
            })
            .collect()
    }

    /// Rewrite the records in place; ids and media stay untouched.
    pub fn process<R: ExtractedRecord>(&self, records: &mut [R]) {
        for record in records.iter_mut() {
            let processed = self.process_record(record.record());
            *record.record_mut() = processed;
        }
    }
}

/// Rewrite links in every extracted record.
pub fn process_links(
    settings: &LinkSettings,
    entries: &mut [ExtractedEntry],
    senses: &mut [ExtractedSense],
    examples: &mut [ExtractedExample],
) {
    let index = LinkIndex::new(entries, &settings.display_label);
    debug!(keys = index.len(), markers = settings.markers.len(), "processing links");
    let processor = LinkProcessor::new(index, settings.clone());
    processor.process(entries);
    processor.process(senses);
    processor.process(examples);
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn settings() -> LinkSettings {
        LinkSettings {
            markers: ["de", "cf"].into_iter().map(String::from).collect(),
            display_label: "lx".to_string(),
            regex: Regex::new(r"\{[^}]+\}|\bcat 1\b").unwrap(),
        }
    }

    fn entries() -> Vec<ExtractedEntry> {
        vec![ExtractedEntry::new(
            "cat_1",
            "cat",
            MarkerRecord::from_iter([("lx", "cat"), ("hm", "1"), ("cf", "cat 1")]),
        )]
    }

    #[test]
    fn labels_become_links() {
        let mut entries = entries();
        let mut senses = vec![ExtractedSense::new(
            "SN000001",
            "cat_1",
            MarkerRecord::from_iter([("de", "see cat 1 or {dog}"), ("sy", "cat 1")]),
        )];
        process_links(&settings(), &mut entries, &mut senses, &mut []);

        assert_eq!(senses[0].record.get("de"), Some("see [cat](cat_1) or {dog}"));
        assert_eq!(senses[0].record.get("sy"), Some("cat 1"));
        assert_eq!(senses[0].id, "SN000001");
        assert_eq!(entries[0].record.get("cf"), Some("cat_1"));
    }

    #[test]
    fn processing_does_not_touch_the_input() {
        let entries = entries();
        let processor = LinkProcessor::new(LinkIndex::new(&entries, "lx"), settings());
        let record = MarkerRecord::from_iter([("de", "cat 1")]);
        let processed = processor.process_record(&record);
        assert_eq!(record.get("de"), Some("cat 1"));
        assert_eq!(processed.get("de"), Some("[cat](cat_1)"));
    }
}
