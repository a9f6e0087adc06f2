//! Maintenance commands on a submission's `db.sfm`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use tracing::{info, info_span, warn};

use dict_ingest::{ReadOptions, Submission, list_submissions, read_sfm_file, write_sfm_file};
use dict_model::{Diagnostics, Metadata};
use dict_transform::{MarkerStats, MediaMode, RepairHomonyms, Stats};
use dict_validate::{Finding, check_submission, record_findings};

use crate::pipeline::{load, media_index, open_submission, visitor_chain};
use crate::types::SubmissionListing;

/// Findings of `dictionaria check`, plus everything reported while reading.
#[derive(Debug)]
pub struct CheckResult {
    pub findings: Vec<Finding>,
    pub diagnostics: Diagnostics,
}

/// Structural and media checks of `db.sfm`.
///
/// Records are checked after the record visitors ran and before media
/// references are rewritten.
pub fn run_check(dir: &Path, repos: Option<&Path>) -> Result<CheckResult> {
    let (submission, metadata) = open_submission(dir, repos)?;
    let _guard = info_span!("check", id = %submission.id()).entered();
    let mut diagnostics = Diagnostics::new(submission.id());
    let mut database = load(
        &submission,
        &ReadOptions::from_properties(&metadata.properties),
        &mut diagnostics,
    )?;
    visitor_chain(&metadata.properties).run(&mut database, &mut diagnostics);

    let media = media_index(&submission, &metadata, MediaMode::Check, false)?;
    let findings = check_submission(&media.resolver, database.records());
    record_findings(&findings, &mut diagnostics);
    info!(findings = findings.len(), "checked submission");
    Ok(CheckResult {
        findings,
        diagnostics,
    })
}

/// Marker statistics of `db.sfm`.
pub fn run_stat(dir: &Path, repos: Option<&Path>) -> Result<Vec<MarkerStats>> {
    let (submission, metadata) = open_submission(dir, repos)?;
    let mut diagnostics = Diagnostics::new(submission.id());
    let database = load(
        &submission,
        &ReadOptions::from_properties(&metadata.properties),
        &mut diagnostics,
    )?;
    let mut stats = Stats::new();
    for record in &database {
        stats.add(record);
    }
    Ok(stats.markers())
}

/// Renumber colliding homonyms and write `db.sfm` back.
///
/// Markers are read unmapped so that the file keeps its own marker names.
/// Returns the number of repaired entries.
pub fn run_repair(dir: &Path, repos: Option<&Path>) -> Result<usize> {
    let (submission, metadata) = open_submission(dir, repos)?;
    let mut diagnostics = Diagnostics::new(submission.id());
    let options = ReadOptions {
        marker_map: BTreeMap::new(),
        ..ReadOptions::from_properties(&metadata.properties)
    };
    let mut database = load(&submission, &options, &mut diagnostics)?;
    let mut repair = RepairHomonyms::new();
    database.visit(&mut repair, &mut diagnostics);
    if repair.repaired() == 0 {
        info!("no homonym collisions");
        return Ok(0);
    }
    let path = submission.db_path();
    write_sfm_file(&path, database.records())
        .with_context(|| format!("write {}", path.display()))?;
    info!(repaired = repair.repaired(), path = %path.display(), "repaired homonyms");
    Ok(repair.repaired())
}

/// Overview of every submission below `dir`.
pub fn run_ls(dir: &Path) -> Result<Vec<SubmissionListing>> {
    let dirs = list_submissions(dir).with_context(|| format!("list {}", dir.display()))?;
    let mut listings = Vec::with_capacity(dirs.len());
    for path in dirs {
        let submission = Submission::open(&path, None)
            .with_context(|| format!("open submission {}", path.display()))?;
        let modified = std::fs::metadata(submission.db_path())
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Local>::from);
        let listing = match submission.metadata() {
            Ok(Some(metadata)) => listing(&submission, &metadata, modified),
            Ok(None) => unlisted(&submission, modified, "missing md.json".to_string()),
            Err(error) => {
                warn!(id = submission.id(), %error, "unreadable md.json");
                unlisted(&submission, modified, error.to_string())
            }
        };
        listings.push(listing);
    }
    Ok(listings)
}

fn listing(
    submission: &Submission,
    metadata: &Metadata,
    modified: Option<DateTime<Local>>,
) -> SubmissionListing {
    SubmissionListing {
        id: submission.id().to_string(),
        language: metadata.language.name.clone(),
        glottocode: metadata.language.glottocode.clone(),
        authors: metadata.author_names(),
        published: metadata
            .date_published
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()),
        modified,
        problem: None,
    }
}

fn unlisted(
    submission: &Submission,
    modified: Option<DateTime<Local>>,
    problem: String,
) -> SubmissionListing {
    SubmissionListing {
        id: submission.id().to_string(),
        language: String::new(),
        glottocode: None,
        authors: String::new(),
        published: None,
        modified,
        problem: Some(problem),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MD: &str = r#"{
        "authors": [{"name": "Ann Author"}],
        "language": {"name": "Teop", "glottocode": "teop1238", "isocode": "tio"},
        "date_published": "2019-03-01"
    }"#;

    fn submission(root: &Path, id: &str, sfm: &str) -> std::path::PathBuf {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("md.json"), MD).unwrap();
        std::fs::write(dir.join("db.sfm"), sfm).unwrap();
        dir
    }

    #[test]
    fn repair_renumbers_and_rewrites() {
        let root = TempDir::new().unwrap();
        let dir = submission(
            root.path(),
            "teop",
            "\\lx cat\n\\de feline\n\n\\lx cat\n\\de tiger\n",
        );
        assert_eq!(run_repair(&dir, None).unwrap(), 1);
        let text = std::fs::read_to_string(dir.join("db.sfm")).unwrap();
        assert!(text.contains("\\lx cat\n\\hm 1\n\\de tiger"));
        assert_eq!(run_repair(&dir, None).unwrap(), 0);
    }

    #[test]
    fn stat_counts_markers() {
        let root = TempDir::new().unwrap();
        let dir = submission(
            root.path(),
            "teop",
            "\\lx cat\n\\de feline; pet\n\\de tiger\n\n\\lx dog\n\\de canine\n",
        );
        let stats = run_stat(&dir, None).unwrap();
        let de = stats.iter().find(|stat| stat.marker == "de").unwrap();
        assert_eq!(de.entries, 2);
        assert_eq!(de.total, 3);
        assert_eq!(de.max_per_entry, 2);
        assert!(de.implicit_multiple);
    }

    #[test]
    fn check_reports_duplicates_and_missing_media() {
        let root = TempDir::new().unwrap();
        let dir = submission(
            root.path(),
            "teop",
            "\\lx cat\n\\ps n\n\\de feline\n\\pc cat.jpg\n\n\\lx cat\n\\ps n\n\\de feline\n",
        );
        let result = run_check(&dir, None).unwrap();
        let rendered: Vec<String> = result.findings.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "\\lx cat: missing file \\pc cat.jpg",
                "\\lx cat: duplicate lemma",
            ]
        );
        assert!(result.diagnostics.has_errors());
    }

    #[test]
    fn ls_lists_metadata_and_problems() {
        let root = TempDir::new().unwrap();
        submission(root.path(), "teop", "\\lx cat\n");
        std::fs::create_dir_all(root.path().join("bare")).unwrap();

        let listings = run_ls(root.path()).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, "bare");
        assert_eq!(listings[0].problem.as_deref(), Some("missing md.json"));
        let teop = &listings[1];
        assert_eq!(teop.language, "Teop");
        assert_eq!(teop.authors, "Ann Author");
        assert_eq!(teop.published, NaiveDate::from_ymd_opt(2019, 3, 1));
        assert!(teop.modified.is_some());
    }
}
