//! End-to-end runs of the submission pipeline on small fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use dict_cli::pipeline::{ProcessOptions, process_submission};
use tempfile::TempDir;

const MD: &str = r#"{
    "authors": ["Ann Author"],
    "language": {"name": "Teop", "glottocode": "teop1238", "isocode": "tio"}
}"#;

const DB: &str = "\\_sh v3.0  Dictionary\n\
\n\
\\lx cat\n\
\\hm 1\n\
\\xv The cat sat.\n\
\\xe The cat sat.\n\
\\ps N\n\
\n\
\\lx dog\n\
\\ps N\n\
\\de canine\n";

fn submission(root: &Path, db: &str) -> PathBuf {
    let dir = root.join("teop");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("md.json"), MD).unwrap();
    fs::write(dir.join("db.sfm"), db).unwrap();
    dir
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn cat_scenario_writes_linked_tables() {
    let root = TempDir::new().unwrap();
    let dir = submission(root.path(), DB);

    let result = process_submission(&dir, &ProcessOptions::default()).unwrap();

    let processed = dir.join("processed");
    assert_eq!(result.output_dir, processed);
    assert_eq!(
        read(&processed.join("entries.csv")),
        "ID,Language_ID,Headword,Part_Of_Speech,Homonym,Media_IDs\n\
         cat_1,tio,cat,N,1,\n\
         dog,tio,dog,N,,\n"
    );
    assert_eq!(
        read(&processed.join("senses.csv")),
        "ID,Description,Entry_ID,Media_IDs\n\
         SN000001,,cat_1,\n\
         SN000002,canine,dog,\n"
    );
    assert_eq!(
        read(&processed.join("examples.csv")),
        "ID,Language_ID,Primary_Text,Analyzed_Word,Gloss,Translated_Text,Meta_Language_ID,Comment,Media_IDs,Sense_IDs\n\
         XV000001,tio,The cat sat.,,,The cat sat.,,,,SN000001\n"
    );
    assert_eq!(
        read(&processed.join("media.csv")),
        "ID,Language_ID,Filename,Description\n"
    );
    assert!(processed.join("cldf-md.json").is_file());
    assert_eq!(result.metadata_file, Some(processed.join("cldf-md.json")));

    let written: Vec<(&str, usize)> = result
        .tables
        .iter()
        .map(|table| (table.name.as_str(), table.written))
        .collect();
    assert_eq!(
        written,
        vec![
            ("EntryTable", 2),
            ("SenseTable", 2),
            ("ExampleTable", 1),
            ("media.csv", 0)
        ]
    );
    assert!(result.tables.iter().all(|table| table.path.is_some()));

    // In-line examples carry their headword in \lemma, which no column maps.
    let log = result.log_file.as_deref().unwrap();
    insta::assert_snapshot!(read(log), @"WARNING Unexpected markers: lemma");
    assert_eq!(read(&dir.join("examples.log")), "");
}

#[test]
fn entries_without_senses_are_dropped_and_logged() {
    let root = TempDir::new().unwrap();
    let db = format!("{DB}\n\\lx bird\n\\ps N\n");
    let dir = submission(root.path(), &db);

    let result = process_submission(&dir, &ProcessOptions::default()).unwrap();

    let entries = &result.tables[0];
    assert_eq!(entries.name, "EntryTable");
    assert_eq!((entries.built, entries.written, entries.dropped()), (3, 2, 1));
    assert!(!read(&dir.join("processed").join("entries.csv")).contains("bird"));
    assert!(result.diagnostics.has_errors());
    insta::assert_snapshot!(read(&dir.join("cldf.log")), @r"
    WARNING Unexpected markers: lemma
    ERROR no senses found for entry bird
    ");
}

#[test]
fn dry_run_writes_nothing() {
    let root = TempDir::new().unwrap();
    let dir = submission(root.path(), DB);
    let options = ProcessOptions {
        dry_run: true,
        ..ProcessOptions::default()
    };

    let result = process_submission(&dir, &options).unwrap();

    assert!(!dir.join("processed").exists());
    assert!(!dir.join("cldf.log").exists());
    assert!(!dir.join("examples.log").exists());
    assert!(result.log_file.is_none());
    assert!(result.tables.iter().all(|table| table.path.is_none()));
    assert_eq!(result.tables[2].written, 1);
}

#[test]
fn output_dir_overrides_processed() {
    let root = TempDir::new().unwrap();
    let dir = submission(root.path(), DB);
    let out = root.path().join("out");
    let options = ProcessOptions {
        output_dir: Some(out.clone()),
        ..ProcessOptions::default()
    };

    process_submission(&dir, &options).unwrap();

    assert!(out.join("entries.csv").is_file());
    assert!(!dir.join("processed").exists());
}

#[test]
fn missing_metadata_is_fatal() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("empty");
    fs::create_dir_all(&dir).unwrap();

    let error = process_submission(&dir, &ProcessOptions::default()).unwrap_err();
    assert!(error.to_string().contains("missing md.json"));
}

#[test]
fn link_processing_without_regex_is_fatal() {
    let root = TempDir::new().unwrap();
    let dir = submission(root.path(), DB);
    fs::write(
        dir.join("md.json"),
        r#"{
            "authors": ["Ann Author"],
            "language": {"name": "Teop", "glottocode": "teop1238", "isocode": "tio"},
            "properties": {"process_links_in_labels": ["de"]}
        }"#,
    )
    .unwrap();

    let error = process_submission(&dir, &ProcessOptions::default()).unwrap_err();
    assert_eq!(
        format!("{error:#}"),
        "could not process links: Missing property: entry_label_as_regex_for_link"
    );
    assert!(!dir.join("processed").exists());
    assert!(!dir.join("examples.log").exists());
}
