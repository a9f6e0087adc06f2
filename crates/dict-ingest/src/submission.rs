//! Submission directories and their well-known files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dict_model::Metadata;

use crate::catalog::CATALOG_FILE;
use crate::error::{IngestError, Result};
use crate::metadata::load_metadata;

/// Media directories inside a submission, in lookup order.
pub const MEDIA_DIRS: &[&str] = &["audio", "image", "docs"];

/// A submission directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    dir: PathBuf,
    repos: PathBuf,
    id: String,
}

impl Submission {
    /// Open the submission in `dir`. The repository root defaults to the
    /// parent directory.
    pub fn open(dir: impl Into<PathBuf>, repos: Option<&Path>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(IngestError::DirectoryNotFound { path: dir });
        }
        let id = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let repos = match repos {
            Some(repos) => repos.to_path_buf(),
            None => dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.clone()),
        };
        Ok(Self { dir, repos, id })
    }

    /// Directory name, used as the submission id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn repos(&self) -> &Path {
        &self.repos
    }

    pub fn md_path(&self) -> PathBuf {
        self.dir.join("md.json")
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.join("db.sfm")
    }

    pub fn examples_path(&self) -> PathBuf {
        self.dir.join("examples.sfm")
    }

    pub fn glosses_path(&self) -> PathBuf {
        self.dir.join("glosses.flextext")
    }

    pub fn concepts_path(&self) -> PathBuf {
        self.dir.join("concepts.csv")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.dir.join("processed")
    }

    pub fn cldf_log_path(&self) -> PathBuf {
        self.dir.join("cldf.log")
    }

    pub fn examples_log_path(&self) -> PathBuf {
        self.dir.join("examples.log")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.repos.join(CATALOG_FILE)
    }

    pub fn has_sfm(&self) -> bool {
        self.db_path().is_file()
    }

    /// Metadata from `md.json`, or `None` when the file does not exist.
    pub fn metadata(&self) -> Result<Option<Metadata>> {
        let path = self.md_path();
        if !path.is_file() {
            return Ok(None);
        }
        load_metadata(&path).map(Some)
    }

    /// Catalog submission ids whose media this submission may reference.
    pub fn media_sids(&self, metadata: &Metadata) -> Vec<String> {
        let mut sids = vec![self.id.clone()];
        for sid in &metadata.properties.media_sids {
            if !sids.contains(sid) {
                sids.push(sid.clone());
            }
        }
        sids
    }

    /// Files in the `audio`, `image` and `docs` directories, sorted by name.
    pub fn media_files(&self) -> Result<BTreeMap<&'static str, Vec<PathBuf>>> {
        let mut media = BTreeMap::new();
        for kind in MEDIA_DIRS {
            let dir = self.dir.join(kind);
            let files = if dir.is_dir() {
                list_files(&dir, |_| true)?
            } else {
                Vec::new()
            };
            media.insert(*kind, files);
        }
        Ok(media)
    }

    /// ELAN corpus exports (`*.eaf.sfm`), sorted by name.
    pub fn corpus_files(&self) -> Result<Vec<PathBuf>> {
        list_files(&self.dir, |name| name.ends_with(".eaf.sfm"))
    }
}

fn list_files(dir: &Path, matches: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_match = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(&matches)
            .unwrap_or(false);
        if is_match {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Submission directories below `dir`, sorted by name.
///
/// Hidden directories are skipped.
pub fn list_submissions(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut dirs = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if path.is_dir() && !hidden {
            dirs.push(path);
        }
    }
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn submission_id_is_directory_name() {
        let repos = TempDir::new().unwrap();
        let dir = repos.path().join("teop");
        std::fs::create_dir(&dir).unwrap();
        let submission = Submission::open(&dir, None).unwrap();
        assert_eq!(submission.id(), "teop");
        assert_eq!(submission.catalog_path(), repos.path().join("cdstar.json"));
        assert!(submission.metadata().unwrap().is_none());
    }

    #[test]
    fn media_sids_include_aliases_once() {
        let repos = TempDir::new().unwrap();
        let dir = repos.path().join("teop");
        std::fs::create_dir(&dir).unwrap();
        let submission = Submission::open(&dir, None).unwrap();
        let mut md = Metadata::default();
        md.properties.media_sids = vec!["teop".to_string(), "teop-old".to_string()];
        assert_eq!(submission.media_sids(&md), vec!["teop", "teop-old"]);
    }

    #[test]
    fn finds_corpus_and_media_files() {
        let repos = TempDir::new().unwrap();
        let dir = repos.path().join("teop");
        std::fs::create_dir_all(dir.join("image")).unwrap();
        std::fs::write(dir.join("b.eaf.sfm"), "").unwrap();
        std::fs::write(dir.join("a.eaf.sfm"), "").unwrap();
        std::fs::write(dir.join("db.sfm"), "").unwrap();
        std::fs::write(dir.join("image").join("photo.jpg"), "x").unwrap();
        let submission = Submission::open(&dir, None).unwrap();

        let corpus = submission.corpus_files().unwrap();
        let names: Vec<_> = corpus
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(names, vec!["a.eaf.sfm", "b.eaf.sfm"]);

        let media = submission.media_files().unwrap();
        assert_eq!(media["image"].len(), 1);
        assert!(media["audio"].is_empty());
        assert!(submission.has_sfm());
    }

    #[test]
    fn lists_submission_directories() {
        let repos = TempDir::new().unwrap();
        for name in ["zz", "aa", ".git"] {
            std::fs::create_dir(repos.path().join(name)).unwrap();
        }
        std::fs::write(repos.path().join("cdstar.json"), "{}").unwrap();
        let dirs = list_submissions(repos.path()).unwrap();
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].ends_with("aa"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let repos = TempDir::new().unwrap();
        let result = Submission::open(repos.path().join("nope"), None);
        assert!(matches!(result, Err(IngestError::DirectoryNotFound { .. })));
    }
}
