//! Media references: lookup of file names in the media catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

use dict_ingest::{CatalogItem, IngestError, MediaCatalog, Result, Submission};
use dict_model::{Category, Diagnostics, MarkerRecord};
use md5::{Digest, Md5};
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

use crate::visit::{Outcome, Visitor};

/// Media types a marker may reference, in lookup order.
pub const MARKER_MEDIA_TYPES: &[(&str, &[&str])] = &[
    ("pc", &["image"]),
    ("sf", &["audio"]),
    ("sfx", &["image", "audio"]),
];

/// Media types looked up for `marker`, if it references media.
pub fn media_types(marker: &str) -> Option<&'static [&'static str]> {
    MARKER_MEDIA_TYPES
        .iter()
        .find(|(name, _)| *name == marker)
        .map(|(_, types)| *types)
}

fn nfc(value: &str) -> String {
    value.nfc().collect()
}

/// Split a file name into stem and suffix (with the leading dot).
fn split_suffix(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(0) | None => (name, ""),
        Some(index) => name.split_at(index),
    }
}

/// Last component of a path written with `/` or `\`.
fn base_name(reference: &str) -> &str {
    reference.rsplit(['/', '\\']).next().unwrap_or(reference)
}

fn latin(ch: char) -> Option<&'static str> {
    let out = match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' => "\"",
        'ы' => "y",
        'ь' => "'",
        'ю' => "ju",
        'я' => "ja",
        _ => return None,
    };
    Some(out)
}

/// Transliterate Cyrillic letters to Latin; other characters pass through.
pub fn transliterate(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        let lower = ch.to_lowercase().next().unwrap_or(ch);
        match latin(lower) {
            Some(mapped) if lower != ch => {
                let mut chars = mapped.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                }
            }
            Some(mapped) => out.push_str(mapped),
            None => out.push(ch),
        }
    }
    out
}

/// Hex MD5 of a file's content, the key of catalog items.
pub fn file_checksum(path: &Path) -> Result<String> {
    let read_error = |e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    };
    let mut file = File::open(path).map_err(read_error)?;
    let mut hasher = Md5::new();
    std::io::copy(&mut file, &mut hasher).map_err(read_error)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Add the submission's local media files that the catalog does not know yet.
///
/// Returns the number of added files.
pub fn register_local_media(catalog: &mut MediaCatalog, submission: &Submission) -> Result<usize> {
    let mut added = 0;
    for (media_type, files) in submission.media_files()? {
        for path in files {
            let checksum = file_checksum(&path)?;
            if catalog.contains(&checksum) {
                continue;
            }
            let fname = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let size = std::fs::metadata(&path).ok().map(|m| m.len());
            catalog.add(
                checksum,
                CatalogItem {
                    sid: submission.id().to_string(),
                    media_type: media_type.to_string(),
                    fname,
                    size,
                    ..CatalogItem::default()
                },
            );
            added += 1;
        }
    }
    if added > 0 {
        info!(submission = submission.id(), files = added, "registered local media");
    }
    Ok(added)
}

/// What [`MediaResolver`] does with resolved references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MediaMode {
    /// Replace file names with catalog checksums.
    #[default]
    Edit,
    /// Only collect missing files.
    Check,
}

/// A media reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MissingFile {
    /// Headword id of the entry.
    pub entry: String,
    pub marker: String,
    pub file: String,
}

/// Resolves file names in `\pc`, `\sf` and `\sfx` to catalog checksums.
#[derive(Debug, Clone, Default)]
pub struct MediaResolver {
    mode: MediaMode,
    files: BTreeMap<String, BTreeMap<String, String>>,
    missing: BTreeSet<MissingFile>,
}

impl MediaResolver {
    pub fn new(mode: MediaMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Index the catalog items uploaded for any of `sids`.
    pub fn from_catalog(catalog: &MediaCatalog, sids: &[String], mode: MediaMode) -> Self {
        let mut resolver = Self::new(mode);
        for (checksum, item) in catalog.items_for(sids) {
            resolver.register(&item.media_type, &item.fname, checksum);
        }
        debug!(
            types = resolver.files.len(),
            keys = resolver.files.values().map(BTreeMap::len).sum::<usize>(),
            "indexed media catalog"
        );
        resolver
    }

    /// Index one file under its name variants. Later files win, except for
    /// the transliterated name, which never overwrites a key.
    pub fn register(&mut self, media_type: &str, fname: &str, checksum: &str) {
        let files = self.files.entry(media_type.to_string()).or_default();
        let (stem, suffix) = split_suffix(fname);
        let stem = nfc(stem);
        files.insert(nfc(fname), checksum.to_string());
        files.insert(stem.clone(), checksum.to_string());
        files.insert(format!("{stem}{}", suffix.to_uppercase()), checksum.to_string());
        files.insert(format!("{stem}{}", suffix.to_lowercase()), checksum.to_string());
        files
            .entry(transliterate(fname))
            .or_insert_with(|| checksum.to_string());
    }

    /// Checksum for a file reference of `marker`.
    pub fn resolve(&self, marker: &str, reference: &str) -> Option<&str> {
        let name = nfc(base_name(reference.trim()));
        media_types(marker)?
            .iter()
            .filter_map(|media_type| self.files.get(*media_type))
            .find_map(|files| files.get(&name))
            .map(String::as_str)
    }

    #[must_use]
    pub fn with_mode(mut self, mode: MediaMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> MediaMode {
        self.mode
    }

    pub fn missing_files(&self) -> &BTreeSet<MissingFile> {
        &self.missing
    }

    /// Resolve all media references of `record`, recording missing files.
    ///
    /// Unresolved references are left out of the rewritten value.
    pub fn resolve_record(&mut self, record: &MarkerRecord) -> MarkerRecord {
        let mut out = MarkerRecord::with_capacity(record.len());
        for (marker, value) in record.iter() {
            if media_types(marker).is_none() {
                out.push(marker, value);
                continue;
            }
            let mut resolved = Vec::new();
            for reference in dict_model::split_ids(value) {
                match self.resolve(marker, &reference) {
                    Some(checksum) => resolved.push(checksum.to_string()),
                    None => {
                        self.missing.insert(MissingFile {
                            entry: record.headword_id(),
                            marker: marker.to_string(),
                            file: nfc(base_name(&reference)),
                        });
                    }
                }
            }
            out.push(marker, resolved.join(" ; "));
        }
        out
    }

    /// Report missing files as media diagnostics.
    pub fn report(&self, diagnostics: &mut Diagnostics) {
        for missing in &self.missing {
            diagnostics.warning(
                Category::Media,
                Some(&format!("\\lx {}", missing.entry)),
                format!("missing file: \\{} {}", missing.marker, missing.file),
            );
        }
    }
}

impl Visitor for MediaResolver {
    fn visit(&mut self, record: &MarkerRecord, _diagnostics: &mut Diagnostics) -> Outcome {
        let resolved = self.resolve_record(record);
        match self.mode {
            MediaMode::Edit if resolved != *record => Outcome::Replace(resolved),
            _ => Outcome::Keep,
        }
    }

    fn visitor_name(&self) -> &str {
        "media_resolver"
    }
}
