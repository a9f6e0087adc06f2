//! Homonym collision repair.

use std::collections::{BTreeMap, BTreeSet};

use dict_model::{Category, Diagnostics, HEADWORD_MARKER, HOMONYM_MARKER, MarkerRecord};

use crate::visit::{Outcome, Visitor};

/// Assigns the next free `\hm` number when an `lx`/`hm` pair was seen before.
///
/// The new `\hm` goes right after `\lx` when the entry has none. Non-numeric
/// homonym numbers count as `0` when computing the next free one.
#[derive(Debug, Clone, Default)]
pub struct RepairHomonyms {
    seen: BTreeMap<String, BTreeSet<String>>,
    repaired: usize,
}

impl RepairHomonyms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries that received a new homonym number.
    pub fn repaired(&self) -> usize {
        self.repaired
    }
}

impl Visitor for RepairHomonyms {
    fn visit(&mut self, record: &MarkerRecord, diagnostics: &mut Diagnostics) -> Outcome {
        let lx = record.get(HEADWORD_MARKER).unwrap_or_default().to_string();
        let hm = record.get(HOMONYM_MARKER).unwrap_or_default().to_string();
        let homonyms = self.seen.entry(lx.clone()).or_default();

        if !homonyms.contains(&hm) {
            homonyms.insert(hm);
            return Outcome::Keep;
        }

        let next = homonyms
            .iter()
            .map(|value| value.parse::<u64>().unwrap_or(0))
            .max()
            .unwrap_or(0)
            + 1;
        let next = next.to_string();
        let mut repaired = record.clone();
        repaired.upsert(HOMONYM_MARKER, next.clone(), Some(1));
        diagnostics.info(
            Category::Structure,
            Some(&format!("\\lx {lx}")),
            format!("homonym collision, assigned \\hm {next}"),
        );
        homonyms.insert(next);
        self.repaired += 1;
        Outcome::Replace(repaired)
    }

    fn visitor_name(&self) -> &str {
        "repair"
    }
}
