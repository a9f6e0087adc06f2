//! Per-stage record types.
//!
//! Each extraction stage produces its own record type with a fixed field set
//! instead of hanging attributes off a generic record.

use serde::{Deserialize, Serialize};

use crate::record::MarkerRecord;

/// Common view over extracted records used by row building and link rewriting.
pub trait ExtractedRecord {
    /// Stable identifier within the record's table.
    fn id(&self) -> &str;
    fn record(&self) -> &MarkerRecord;
    fn record_mut(&mut self) -> &mut MarkerRecord;
    /// Owning entry, for records that have one.
    fn entry_id(&self) -> Option<&str> {
        None
    }
    /// Citing senses, for records that track them.
    fn sense_ids(&self) -> Option<&[String]> {
        None
    }
    fn media_ids(&self) -> &[String];
    fn media_ids_mut(&mut self) -> &mut Vec<String>;
}

/// Entry-scoped markers of one source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntry {
    pub id: String,
    /// Submission-local key the entry was known by before ID assignment.
    pub original_id: String,
    pub record: MarkerRecord,
    pub media_ids: Vec<String>,
}

impl ExtractedEntry {
    pub fn new(id: impl Into<String>, original_id: impl Into<String>, record: MarkerRecord) -> Self {
        Self {
            id: id.into(),
            original_id: original_id.into(),
            record,
            media_ids: Vec::new(),
        }
    }
}

/// Markers left over after entry extraction, tagged with their owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRemainder {
    pub entry_id: String,
    pub original_id: String,
    pub record: MarkerRecord,
}

/// One sense of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSense {
    pub id: String,
    pub entry_id: String,
    pub record: MarkerRecord,
    pub media_ids: Vec<String>,
}

impl ExtractedSense {
    pub fn new(id: impl Into<String>, entry_id: impl Into<String>, record: MarkerRecord) -> Self {
        Self {
            id: id.into(),
            entry_id: entry_id.into(),
            record,
            media_ids: Vec::new(),
        }
    }
}

/// A published example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedExample {
    pub id: String,
    /// Key the example was cited by (its `ref` value).
    pub original_id: String,
    pub record: MarkerRecord,
    pub sense_ids: Vec<String>,
    pub media_ids: Vec<String>,
}

impl ExtractedExample {
    pub fn new(id: impl Into<String>, original_id: impl Into<String>, record: MarkerRecord) -> Self {
        Self {
            id: id.into(),
            original_id: original_id.into(),
            record,
            sense_ids: Vec::new(),
            media_ids: Vec::new(),
        }
    }
}

impl ExtractedRecord for ExtractedEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn record(&self) -> &MarkerRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut MarkerRecord {
        &mut self.record
    }

    fn media_ids(&self) -> &[String] {
        &self.media_ids
    }

    fn media_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.media_ids
    }
}

impl ExtractedRecord for ExtractedSense {
    fn id(&self) -> &str {
        &self.id
    }

    fn record(&self) -> &MarkerRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut MarkerRecord {
        &mut self.record
    }

    fn entry_id(&self) -> Option<&str> {
        Some(&self.entry_id)
    }

    fn media_ids(&self) -> &[String] {
        &self.media_ids
    }

    fn media_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.media_ids
    }
}

impl ExtractedRecord for ExtractedExample {
    fn id(&self) -> &str {
        &self.id
    }

    fn record(&self) -> &MarkerRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut MarkerRecord {
        &mut self.record
    }

    fn sense_ids(&self) -> Option<&[String]> {
        Some(&self.sense_ids)
    }

    fn media_ids(&self) -> &[String] {
        &self.media_ids
    }

    fn media_ids_mut(&mut self) -> &mut Vec<String> {
        &mut self.media_ids
    }
}
