//! Media catalog (`cdstar.json`).
//!
//! The catalog maps content checksums to metadata about uploaded media files.
//! It is shared by all submissions of a repository, loaded once and written
//! back once. [`CatalogGuard`] writes it back on every exit path.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{IngestError, Result};

/// File name of the catalog at the repository root.
pub const CATALOG_FILE: &str = "cdstar.json";

/// One cataloged media file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Submission the file was uploaded for.
    #[serde(default)]
    pub sid: String,
    /// Media directory the file came from (`audio`, `image`, `docs`).
    #[serde(rename = "type", default)]
    pub media_type: String,
    #[serde(default)]
    pub fname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Fields this crate does not interpret, kept for the round trip.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Checksum-keyed media catalog.
#[derive(Debug, Clone, Default)]
pub struct MediaCatalog {
    path: PathBuf,
    items: BTreeMap<String, CatalogItem>,
    modified: bool,
}

impl MediaCatalog {
    /// Load the catalog at `path`; a missing file yields an empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.is_file() {
            let text = std::fs::read_to_string(&path).map_err(|e| IngestError::FileRead {
                path: path.clone(),
                source: e,
            })?;
            serde_json::from_str(&text).map_err(|source| IngestError::Json {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), items = items.len(), "loaded media catalog");
        Ok(Self {
            path,
            items,
            modified: false,
        })
    }

    /// Open the catalog under a guard that saves it when dropped.
    pub fn scoped(path: impl Into<PathBuf>) -> Result<CatalogGuard> {
        Ok(CatalogGuard {
            catalog: Self::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, checksum: &str) -> bool {
        self.items.contains_key(checksum)
    }

    pub fn get(&self, checksum: &str) -> Option<&CatalogItem> {
        self.items.get(checksum)
    }

    pub fn items(&self) -> &BTreeMap<String, CatalogItem> {
        &self.items
    }

    /// Items uploaded for any of the submission ids in `sids`.
    pub fn items_for<'a>(
        &'a self,
        sids: &'a [String],
    ) -> impl Iterator<Item = (&'a str, &'a CatalogItem)> + 'a {
        self.items
            .iter()
            .filter(move |(_, item)| sids.iter().any(|sid| *sid == item.sid))
            .map(|(checksum, item)| (checksum.as_str(), item))
    }

    /// Add or replace the item stored under `checksum`.
    pub fn add(&mut self, checksum: impl Into<String>, item: CatalogItem) {
        self.items.insert(checksum.into(), item);
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Write the catalog back to its file.
    pub fn save(&mut self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.items).map_err(|source| IngestError::Json {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, text).map_err(|e| IngestError::FileWrite {
            path: self.path.clone(),
            source: e,
        })?;
        self.modified = false;
        debug!(path = %self.path.display(), items = self.items.len(), "saved media catalog");
        Ok(())
    }
}

/// Scoped access to a [`MediaCatalog`].
///
/// A modified catalog is written back when the guard is dropped. Use
/// [`CatalogGuard::close`] to observe write errors; errors on drop can only
/// be logged.
#[derive(Debug)]
pub struct CatalogGuard {
    catalog: MediaCatalog,
}

impl CatalogGuard {
    /// Save (if modified) and release the catalog.
    pub fn close(mut self) -> Result<()> {
        let mut catalog = std::mem::take(&mut self.catalog);
        if catalog.is_modified() {
            catalog.save()?;
        }
        Ok(())
    }
}

impl Deref for CatalogGuard {
    type Target = MediaCatalog;

    fn deref(&self) -> &MediaCatalog {
        &self.catalog
    }
}

impl DerefMut for CatalogGuard {
    fn deref_mut(&mut self) -> &mut MediaCatalog {
        &mut self.catalog
    }
}

impl Drop for CatalogGuard {
    fn drop(&mut self) {
        if self.catalog.is_modified()
            && let Err(err) = self.catalog.save()
        {
            error!(error = %err, "failed to save media catalog");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(sid: &str, fname: &str) -> CatalogItem {
        CatalogItem {
            sid: sid.to_string(),
            media_type: "image".to_string(),
            fname: fname.to_string(),
            ..CatalogItem::default()
        }
    }

    #[test]
    fn missing_catalog_is_empty() {
        let dir = TempDir::new().unwrap();
        let catalog = MediaCatalog::open(dir.path().join(CATALOG_FILE)).unwrap();
        assert!(catalog.is_empty());
        assert!(!catalog.is_modified());
    }

    #[test]
    fn keeps_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        std::fs::write(
            &path,
            r#"{"abc123": {"sid": "teop", "type": "image", "fname": "photo.jpg",
                "objid": "EAEA0-1", "size": 12, "web": "web.jpg", "thumbnail": null}}"#,
        )
        .unwrap();
        let catalog = MediaCatalog::open(&path).unwrap();
        let photo = catalog.get("abc123").unwrap();
        assert_eq!(photo.fname, "photo.jpg");
        assert_eq!(photo.size, Some(12));
        assert_eq!(photo.extra["web"], "web.jpg");
    }

    #[test]
    fn filters_items_by_submission() {
        let mut catalog = MediaCatalog::default();
        catalog.add("a", item("teop", "a.jpg"));
        catalog.add("b", item("other", "b.jpg"));
        let sids = vec!["teop".to_string()];
        let names: Vec<_> = catalog.items_for(&sids).map(|(_, i)| i.fname.as_str()).collect();
        assert_eq!(names, vec!["a.jpg"]);
    }

    #[test]
    fn guard_saves_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        {
            let mut guard = MediaCatalog::scoped(&path).unwrap();
            guard.add("abc", item("teop", "x.wav"));
        }
        let catalog = MediaCatalog::open(&path).unwrap();
        assert!(catalog.contains("abc"));
    }

    #[test]
    fn unmodified_guard_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CATALOG_FILE);
        let guard = MediaCatalog::scoped(&path).unwrap();
        guard.close().unwrap();
        assert!(!path.exists());
    }
}
