//! Curated Concepticon ids for senses.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CoreError, Result};

#[derive(Debug, Deserialize)]
struct ConceptRow {
    #[serde(default)]
    sense_id: String,
    #[serde(default)]
    concepticon_id: String,
    #[serde(default)]
    include: String,
}

/// Sense id -> Concepticon id, for rows marked `include = 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptMap {
    concepts: BTreeMap<String, String>,
}

impl ConceptMap {
    pub fn new(concepts: BTreeMap<String, String>) -> Self {
        Self { concepts }
    }

    /// Load `concepts.csv`; a missing file yields an empty map.
    pub fn from_csv(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let read_error = |source| CoreError::ConceptRead {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(read_error)?;
        let mut concepts = BTreeMap::new();
        for row in reader.deserialize::<ConceptRow>() {
            let row = row.map_err(read_error)?;
            if !row.sense_id.is_empty() && !row.concepticon_id.is_empty() && row.include == "1" {
                concepts.insert(row.sense_id, row.concepticon_id);
            }
        }
        debug!(path = %path.display(), concepts = concepts.len(), "loaded concept map");
        Ok(Self { concepts })
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Concepticon id for `sense_id`, unless the sense already has one in
    /// `current`.
    pub fn concepticon_id(&self, sense_id: &str, current: Option<&str>) -> Option<&str> {
        if current.is_some_and(|id| !id.trim().is_empty()) {
            return None;
        }
        self.concepts.get(sense_id).map(String::as_str)
    }
}
