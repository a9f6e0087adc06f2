//! Sense extraction.

use std::collections::BTreeSet;

use dict_map::EXAMPLE_REF_MARKER;
use dict_model::{
    Category, Diagnostics, EntryRemainder, ExtractedSense, IdGenerator, MarkerRecord,
    SENSE_ID_PREFIX,
};

/// Cut `record` into groups that each start with `separator`.
///
/// The first group holds everything before the first separator and may be
/// empty.
fn group_by_separator(record: &MarkerRecord, separator: &str) -> Vec<MarkerRecord> {
    let mut groups = vec![MarkerRecord::new()];
    for (marker, value) in record.iter() {
        if marker == separator {
            groups.push(MarkerRecord::new());
        }
        if let Some(group) = groups.last_mut() {
            group.push(marker, value);
        }
    }
    groups
}

/// Splits entry remainders into senses at the sense separator.
///
/// A record without any separator forms a single sense. Otherwise markers
/// before the first separator are discarded with a structure warning, unless
/// they are all reference markers, which then belong to the first sense.
#[derive(Debug, Clone)]
pub struct SenseExtractor {
    separator: String,
    markers: BTreeSet<String>,
    references: BTreeSet<String>,
    ids: IdGenerator,
    senses: Vec<ExtractedSense>,
}

impl SenseExtractor {
    pub fn new(
        separator: impl Into<String>,
        markers: BTreeSet<String>,
        cross_references: &BTreeSet<String>,
    ) -> Self {
        let mut references = cross_references.clone();
        references.insert(EXAMPLE_REF_MARKER.to_string());
        Self {
            separator: separator.into(),
            markers,
            references,
            ids: IdGenerator::new(SENSE_ID_PREFIX),
            senses: Vec::new(),
        }
    }

    /// Extract the senses of one entry; returns the markers that belong to
    /// no table.
    pub fn extract(
        &mut self,
        remainder: &EntryRemainder,
        diagnostics: &mut Diagnostics,
    ) -> MarkerRecord {
        let (sense_markers, rest) = remainder
            .record
            .partition(|marker| self.markers.contains(marker));
        if sense_markers.is_empty() {
            return rest;
        }

        let mut groups = group_by_separator(&sense_markers, &self.separator);
        let leading = groups.remove(0);
        if groups.is_empty() {
            groups.push(leading);
        } else if !leading.is_empty() {
            if leading.iter().all(|(marker, _)| self.references.contains(marker)) {
                let mut first = leading;
                first.extend(groups[0].iter());
                groups[0] = first;
            } else {
                let stray: BTreeSet<&str> = leading
                    .iter()
                    .filter(|(marker, _)| !self.references.contains(*marker))
                    .map(|(marker, _)| marker)
                    .collect();
                diagnostics.warning(
                    Category::Structure,
                    Some(&format!("\\lx {}", remainder.original_id)),
                    format!(
                        "sense markers before the first \\{} discarded: {}",
                        self.separator,
                        stray.into_iter().collect::<Vec<_>>().join(", ")
                    ),
                );
            }
        }

        for group in groups {
            self.senses.push(ExtractedSense::new(
                self.ids.next_id(),
                remainder.entry_id.clone(),
                group,
            ));
        }
        rest
    }

    pub fn senses(&self) -> &[ExtractedSense] {
        &self.senses
    }

    pub fn into_senses(self) -> Vec<ExtractedSense> {
        self.senses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SenseExtractor {
        SenseExtractor::new(
            "sn",
            ["sn", "de", "xref", "sy"].into_iter().map(String::from).collect(),
            &["sy".to_string()].into_iter().collect(),
        )
    }

    fn remainder(pairs: &[(&str, &str)]) -> EntryRemainder {
        EntryRemainder {
            entry_id: "cat".to_string(),
            original_id: "cat".to_string(),
            record: pairs.iter().copied().collect(),
        }
    }

    #[test]
    fn one_sense_per_separator() {
        let mut extractor = extractor();
        let mut diagnostics = Diagnostics::new("test");
        let rest = extractor.extract(
            &remainder(&[
                ("sn", "1"),
                ("de", "feline"),
                ("zz", "?"),
                ("sn", "2"),
                ("de", "jazz fan"),
            ]),
            &mut diagnostics,
        );
        assert_eq!(rest.to_string(), "\\zz ?");
        let senses = extractor.senses();
        assert_eq!(senses.len(), 2);
        assert_eq!(senses[0].id, "SN000001");
        assert_eq!(senses[0].entry_id, "cat");
        assert_eq!(senses[1].record.get("de"), Some("jazz fan"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn record_without_separator_is_one_sense() {
        let mut extractor = extractor();
        let mut diagnostics = Diagnostics::new("test");
        extractor.extract(&remainder(&[("de", "feline"), ("xref", "XV000001")]), &mut diagnostics);
        assert_eq!(extractor.senses().len(), 1);
        assert_eq!(extractor.senses()[0].record.get("xref"), Some("XV000001"));
    }

    #[test]
    fn leading_sense_markers_are_discarded() {
        let mut extractor = extractor();
        let mut diagnostics = Diagnostics::new("test");
        extractor.extract(
            &remainder(&[("de", "stray"), ("sn", "1"), ("de", "feline")]),
            &mut diagnostics,
        );
        assert_eq!(extractor.senses().len(), 1);
        assert_eq!(extractor.senses()[0].record.get("de"), Some("feline"));
        insta::assert_snapshot!(
            diagnostics.render_log(),
            @r"WARNING \lx cat: sense markers before the first \sn discarded: de"
        );
    }

    #[test]
    fn leading_references_join_the_first_sense() {
        let mut extractor = extractor();
        let mut diagnostics = Diagnostics::new("test");
        extractor.extract(
            &remainder(&[("xref", "XV000001"), ("sn", "1"), ("de", "feline")]),
            &mut diagnostics,
        );
        let sense = &extractor.senses()[0];
        assert_eq!(sense.record.to_string(), "\\xref XV000001\n\\sn 1\n\\de feline");
        assert!(diagnostics.is_empty());
    }
}
