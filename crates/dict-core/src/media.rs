//! Media ids of extracted records and the media table.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use dict_ingest::MediaCatalog;
use dict_model::{Category, Diagnostics, ExtractedRecord, MarkerRecord};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::quoted_list;

static MEDIA_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*;\s*").expect("Invalid media separator regex"));

/// One row of the media table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MediaFile {
    pub filename: String,
    pub id: String,
    pub description: Option<String>,
}

/// Collects the media files referenced by extracted records.
///
/// A value is either a catalog checksum, which resolves to its file name, or
/// a file name (or its stem) of the submission's media, which resolves to
/// its checksum. Anything else is an orphan: it is reported and left out of
/// the record's media ids.
#[derive(Debug, Clone, Default)]
pub struct MediaExtractor {
    by_name: BTreeMap<String, String>,
    by_checksum: BTreeMap<String, String>,
    files: BTreeSet<(String, String)>,
    orphans: BTreeSet<String>,
}

impl MediaExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the catalog; names are looked up among the items of `sids` only.
    pub fn from_catalog(catalog: &MediaCatalog, sids: &[String]) -> Self {
        let mut extractor = Self::new();
        for (checksum, item) in catalog.items() {
            extractor.by_checksum.insert(checksum.clone(), item.fname.clone());
        }
        for (checksum, item) in catalog.items_for(sids) {
            extractor.add_name(&item.fname, checksum);
        }
        debug!(
            names = extractor.by_name.len(),
            checksums = extractor.by_checksum.len(),
            "indexed media files"
        );
        extractor
    }

    /// Make `fname` and its stem resolve to `checksum`.
    pub fn add_name(&mut self, fname: &str, checksum: &str) {
        self.by_name.insert(fname.to_string(), checksum.to_string());
        let stem = fname.split('.').next().unwrap_or(fname);
        self.by_name.insert(stem.to_string(), checksum.to_string());
    }

    /// Make `checksum` resolve to `fname`.
    pub fn add_checksum(&mut self, checksum: &str, fname: &str) {
        self.by_checksum.insert(checksum.to_string(), fname.to_string());
    }

    /// `(file name, file id)` of one media reference.
    pub fn resolve(&self, value: &str) -> Option<(String, String)> {
        if let Some(fname) = self.by_checksum.get(value) {
            return Some((fname.clone(), value.to_string()));
        }
        self.by_name
            .get(value)
            .map(|checksum| (value.to_string(), checksum.clone()))
    }

    /// Record the media of `marker` in each of `records`.
    pub fn extract<R: ExtractedRecord>(&mut self, marker: &str, records: &mut [R]) {
        for record in records.iter_mut() {
            let ids = self.media_ids(marker, record.record());
            record.media_ids_mut().extend(ids);
        }
    }

    fn media_ids(&mut self, marker: &str, record: &MarkerRecord) -> Vec<String> {
        let mut ids = Vec::new();
        for values in record.get_all(marker) {
            for value in MEDIA_SEPARATOR.split(values) {
                if value.trim().is_empty() {
                    continue;
                }
                match self.resolve(value) {
                    Some((filename, id)) => {
                        self.files.insert((filename, id.clone()));
                        ids.push(id);
                    }
                    None => {
                        self.orphans.insert(value.to_string());
                    }
                }
            }
        }
        ids
    }

    pub fn orphans(&self) -> &BTreeSet<String> {
        &self.orphans
    }

    pub fn report(&self, diagnostics: &mut Diagnostics) {
        if !self.orphans.is_empty() {
            diagnostics.warning(
                Category::Media,
                None,
                format!("Unknown media files: {}", quoted_list(&self.orphans)),
            );
        }
    }

    /// Media table rows sorted by file name, with captions attached.
    pub fn media_files(&self, captions: &Captions) -> Vec<MediaFile> {
        self.files
            .iter()
            .map(|(filename, id)| MediaFile {
                filename: filename.clone(),
                id: id.clone(),
                description: captions.get(id).map(str::to_string),
            })
            .collect()
    }
}

/// Media descriptions keyed by file id.
#[derive(Debug, Clone, Default)]
pub struct Captions {
    by_file: BTreeMap<String, String>,
}

impl Captions {
    pub fn get(&self, file_id: &str) -> Option<&str> {
        self.by_file.get(file_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_file.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }
}

/// Turns a caption marker directly after `\pc` into the picture's description.
#[derive(Debug, Clone)]
pub struct CaptionFinder {
    media_marker: String,
    caption_marker: String,
    captions: Captions,
}

impl CaptionFinder {
    pub fn new(media_marker: impl Into<String>, caption_marker: impl Into<String>) -> Self {
        Self {
            media_marker: media_marker.into(),
            caption_marker: caption_marker.into(),
            captions: Captions::default(),
        }
    }

    pub fn find(&mut self, record: &MarkerRecord, media: &MediaExtractor) {
        let pairs = record.pairs();
        for window in pairs.windows(2) {
            let [(marker, files), (next, caption)] = window else {
                continue;
            };
            if *marker != self.media_marker
                || *next != self.caption_marker
                || caption.trim().is_empty()
            {
                continue;
            }
            for value in MEDIA_SEPARATOR.split(files) {
                if let Some((_, id)) = media.resolve(value) {
                    self.captions.by_file.insert(id, caption.trim().to_string());
                }
            }
        }
    }

    pub fn captions(&self) -> &Captions {
        &self.captions
    }

    pub fn into_captions(self) -> Captions {
        self.captions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dict_ingest::CatalogItem;
    use dict_model::ExtractedSense;

    fn extractor() -> MediaExtractor {
        let mut extractor = MediaExtractor::new();
        extractor.add_checksum("abc123", "photo.jpg");
        extractor.add_name("photo.jpg", "abc123");
        extractor
    }

    #[test]
    fn resolves_checksums_names_and_stems() {
        let extractor = extractor();
        let expected = Some(("photo.jpg".to_string(), "abc123".to_string()));
        assert_eq!(extractor.resolve("abc123"), expected);
        assert_eq!(extractor.resolve("photo"), Some(("photo".to_string(), "abc123".to_string())));
        assert_eq!(extractor.resolve("other.png"), None);
    }

    #[test]
    fn orphans_are_reported_and_left_out() {
        let mut extractor = extractor();
        let mut senses = vec![ExtractedSense::new(
            "SN000001",
            "cat",
            MarkerRecord::from_iter([("pc", "abc123 ; lost.png")]),
        )];
        extractor.extract("pc", &mut senses);
        assert_eq!(senses[0].media_ids, vec!["abc123"]);

        let mut diagnostics = Diagnostics::new("test");
        extractor.report(&mut diagnostics);
        insta::assert_snapshot!(diagnostics.render_log(), @"WARNING Unknown media files: 'lost.png'");
    }

    #[test]
    fn captions_describe_the_preceding_picture() {
        let mut extractor = extractor();
        let record = MarkerRecord::from_iter([
            ("pc", "abc123"),
            ("cap", "A cat on a mat"),
            ("de", "feline"),
        ]);
        let mut senses = vec![ExtractedSense::new("SN000001", "cat", record.clone())];
        extractor.extract("pc", &mut senses);
        let mut finder = CaptionFinder::new("pc", "cap");
        finder.find(&record, &extractor);

        let files = extractor.media_files(finder.captions());
        assert_eq!(
            files,
            vec![MediaFile {
                filename: "photo.jpg".to_string(),
                id: "abc123".to_string(),
                description: Some("A cat on a mat".to_string()),
            }]
        );
    }

    #[test]
    fn catalog_names_are_scoped_to_the_submission() {
        let mut catalog = MediaCatalog::default();
        catalog.add(
            "abc123",
            CatalogItem {
                sid: "teop".to_string(),
                fname: "photo.jpg".to_string(),
                ..CatalogItem::default()
            },
        );
        catalog.add(
            "def456",
            CatalogItem {
                sid: "other".to_string(),
                fname: "meow.wav".to_string(),
                ..CatalogItem::default()
            },
        );
        let extractor = MediaExtractor::from_catalog(&catalog, &["teop".to_string()]);
        assert!(extractor.resolve("photo").is_some());
        assert!(extractor.resolve("meow.wav").is_none());
        assert!(extractor.resolve("def456").is_some());
    }
}
