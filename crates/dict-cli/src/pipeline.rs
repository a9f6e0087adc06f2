//! Submission processing pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Load**: open the submission, read `md.json` and `db.sfm`
//! 2. **Normalize**: record visitors, then media references to catalog ids
//! 3. **Examples**: read `examples.sfm` or extract in-line examples
//! 4. **Extract**: entries, senses and examples per the derived spec
//! 5. **Resolve**: example references, cross-references, media, links
//! 6. **Rows**: dataset schema, rows, glosses, concepts and row filters
//! 7. **Output**: CSV tables, `cldf-md.json` and `cldf.log`
//!
//! Each stage takes the output of the previous stage and returns typed results.
//! Per-record problems go into the [`Diagnostics`] report; only I/O and
//! configuration failures end the run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, info_span, warn};

use dict_core::{
    CaptionFinder, Captions, ConceptMap, CrossRefIndex, EntryExtractor, ExampleReferencer,
    Glosses, MediaExtractor, MediaFile, SenseExtractor, check_for_missing_glosses,
    prepare_examples, prepare_glosses, process_links, prune_uncited, read_examples_file,
};
use dict_ingest::{MediaCatalog, ReadOptions, Submission, read_glosses, read_sfm_file};
use dict_map::{
    ENTRY_MEDIA_MARKER, EXAMPLE_MEDIA_MARKER, LinkSettings, SENSE_MEDIA_MARKER, Spec, TableKind,
    link_settings, make_spec,
};
use dict_model::{
    Category, Diagnostics, ExtractedEntry, ExtractedExample, ExtractedSense, Metadata, Properties,
};
use dict_output::{
    Column, CsvSink, Dataset, DatasetSink, MEDIA_TABLE, Row, TableRows, WriteSummary,
    add_gloss_columns, attach_column_titles, build_row, make_dataset, media_row, merge_gloss,
};
use dict_transform::{
    Corpus, Database, Example, ExampleExtractor, Examples, MarkerFallback, MediaMode,
    MediaResolver, MergeMarkers, MergePartsOfSpeech, Normalize, PartOfSpeechFilter, Rearrange,
    Visitor, VisitorChain, register_local_media,
};
use dict_validate::{RowFilter, remove_senseless_entries};

use crate::types::{ProcessResult, TableSummary};

/// Settings of one `process` run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Repository root holding the media catalog (default: parent directory).
    pub repos: Option<PathBuf>,
    /// Output directory (default: `<submission>/processed`).
    pub output_dir: Option<PathBuf>,
    /// Build everything but write no files.
    pub dry_run: bool,
}

// ============================================================================
// Stage 1: Load
// ============================================================================

/// Open a submission and its metadata.
pub fn open_submission(dir: &Path, repos: Option<&Path>) -> Result<(Submission, Metadata)> {
    let submission = Submission::open(dir, repos)
        .with_context(|| format!("open submission {}", dir.display()))?;
    let metadata = submission
        .metadata()
        .context("read md.json")?
        .ok_or_else(|| anyhow!("{}: missing md.json", submission.dir().display()))?;
    Ok((submission, metadata))
}

/// Read `db.sfm`.
pub fn load(
    submission: &Submission,
    options: &ReadOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Database> {
    if !submission.has_sfm() {
        bail!("{}: missing db.sfm", submission.dir().display());
    }
    let records =
        read_sfm_file(&submission.db_path(), options, diagnostics).context("read db.sfm")?;
    info!(records = records.len(), "loaded dictionary");
    Ok(Database::new(records))
}

// ============================================================================
// Stage 2: Normalize
// ============================================================================

/// Media lookups built from the catalog.
#[derive(Debug)]
pub struct MediaIndex {
    pub resolver: MediaResolver,
    pub extractor: MediaExtractor,
}

/// Build media lookups from the catalog.
///
/// With `register` set, local media files unknown to the catalog are added
/// and the catalog is written back.
pub fn media_index(
    submission: &Submission,
    metadata: &Metadata,
    mode: MediaMode,
    register: bool,
) -> Result<MediaIndex> {
    let mut catalog =
        MediaCatalog::scoped(submission.catalog_path()).context("open media catalog")?;
    if register {
        register_local_media(&mut catalog, submission).context("register local media")?;
    }
    let sids = submission.media_sids(metadata);
    let index = MediaIndex {
        resolver: MediaResolver::from_catalog(&catalog, &sids, mode),
        extractor: MediaExtractor::from_catalog(&catalog, &sids),
    };
    if register {
        catalog.close().context("write media catalog")?;
    }
    Ok(index)
}

/// Record visitors configured for a submission, in execution order.
pub fn visitor_chain(properties: &Properties) -> VisitorChain {
    let pos: Box<dyn Visitor> = if properties.required_parts_of_speech {
        Box::new(PartOfSpeechFilter::new(true))
    } else {
        Box::new(MergePartsOfSpeech)
    };
    VisitorChain::new()
        .add_visitor(Box::new(Normalize))
        .add_visitor(Box::new(Rearrange))
        .add_visitor(Box::new(MarkerFallback::new(
            properties.marker_fallbacks.clone(),
        )))
        .add_visitor(Box::new(MergeMarkers::new(properties.merge_markers.clone())))
        .add_visitor(pos)
}

/// Run the record visitors, then rewrite media references.
pub fn normalize(
    database: &mut Database,
    properties: &Properties,
    resolver: &mut MediaResolver,
    diagnostics: &mut Diagnostics,
) {
    let mut chain = visitor_chain(properties);
    chain.run(database, diagnostics);
    let report = database.visit(&mut *resolver, diagnostics);
    resolver.report(diagnostics);
    debug!(
        replaced = report.replaced,
        missing = resolver.missing_files().len(),
        "resolved media references"
    );
}

// ============================================================================
// Stage 3: Examples
// ============================================================================

/// Examples of a submission.
///
/// A standalone `examples.sfm` wins; examples no entry cites are pruned.
/// Otherwise examples are extracted from the entries, which are rewritten
/// to cite them with `\xref`, and problems are written to `examples.log`.
pub fn load_examples(
    submission: &Submission,
    options: &ReadOptions,
    database: &mut Database,
    keep_log: bool,
    diagnostics: &mut Diagnostics,
) -> Result<Examples> {
    let path = submission.examples_path();
    if path.is_file() {
        let mut examples =
            read_examples_file(&path, options, diagnostics).context("read examples.sfm")?;
        prune_uncited(&mut examples, database.records(), diagnostics);
        return Ok(examples);
    }

    let corpus_files = submission.corpus_files().context("list corpus files")?;
    let corpus = Corpus::from_files(&corpus_files, diagnostics).context("read corpus")?;
    debug!(files = corpus_files.len(), examples = corpus.len(), "loaded corpus");
    let mut extractor = ExampleExtractor::new(corpus);
    database.visit(&mut extractor, diagnostics);
    let (examples, log) = extractor.into_store().into_parts();
    if keep_log {
        let log_path = submission.examples_log_path();
        std::fs::write(&log_path, log)
            .with_context(|| format!("write {}", log_path.display()))?;
    }
    Ok(examples)
}

// ============================================================================
// Stage 4: Extract
// ============================================================================

/// Extracted records of one submission.
#[derive(Debug)]
pub struct Extracted {
    pub spec: Spec,
    pub entries: Vec<ExtractedEntry>,
    pub senses: Vec<ExtractedSense>,
    pub examples: Vec<ExtractedExample>,
}

/// Every marker used by entries and examples.
pub fn marker_set(database: &Database, examples: &Examples) -> BTreeSet<String> {
    database
        .iter()
        .chain(examples.iter().map(Example::record))
        .flat_map(|record| record.iter().map(|(marker, _)| marker.to_string()))
        .collect()
}

/// Split records into entries, senses and examples.
pub fn extract(
    database: &Database,
    examples: &Examples,
    properties: &Properties,
    diagnostics: &mut Diagnostics,
) -> Result<Extracted> {
    let spec = make_spec(properties, &marker_set(database, examples))
        .context("derive column mapping")?;

    let mut prepared = prepare_examples(&spec.example.markers, examples);
    let mut unexpected = std::mem::take(&mut prepared.unexpected_markers);

    let mut entry_extractor = EntryExtractor::new(spec.entry_id.clone(), spec.entry.markers.clone());
    let mut sense_extractor = SenseExtractor::new(
        spec.sense_sep.clone(),
        spec.sense.markers.clone(),
        &spec.cross_references,
    );
    for record in database {
        let Some(remainder) = entry_extractor.extract(record) else {
            continue;
        };
        let rest = sense_extractor.extract(&remainder, diagnostics);
        unexpected.extend(rest.iter().map(|(marker, _)| marker.to_string()));
    }
    if !unexpected.is_empty() {
        let markers = unexpected.into_iter().collect::<Vec<_>>().join(", ");
        diagnostics.warning(
            Category::Structure,
            None,
            format!("Unexpected markers: {markers}"),
        );
    }

    let senses = sense_extractor.into_senses();
    let mut referencer = ExampleReferencer::new();
    referencer.reference(&senses, &mut prepared);
    referencer.report(diagnostics);

    let extracted = Extracted {
        spec,
        entries: entry_extractor.into_entries(),
        senses,
        examples: prepared.into_examples(),
    };
    info!(
        entries = extracted.entries.len(),
        senses = extracted.senses.len(),
        examples = extracted.examples.len(),
        "extracted records"
    );
    Ok(extracted)
}

// ============================================================================
// Stage 5: Resolve
// ============================================================================

/// Resolve references between extracted records.
///
/// Returns the media files of the media table with their captions.
pub fn resolve(
    extracted: &mut Extracted,
    media: &mut MediaExtractor,
    links: Option<&LinkSettings>,
    diagnostics: &mut Diagnostics,
) -> Vec<MediaFile> {
    let Extracted {
        spec,
        entries,
        senses,
        examples,
    } = extracted;

    let mut xrefs = CrossRefIndex::new(entries.as_slice());
    xrefs.resolve(&spec.cross_references, entries.as_mut_slice());
    xrefs.resolve(&spec.cross_references, senses.as_mut_slice());
    xrefs.report(diagnostics);

    media.extract(ENTRY_MEDIA_MARKER, entries.as_mut_slice());
    media.extract(SENSE_MEDIA_MARKER, senses.as_mut_slice());
    media.extract(EXAMPLE_MEDIA_MARKER, examples.as_mut_slice());
    media.report(diagnostics);
    let captions = find_captions(spec, senses, &*media);

    if let Some(settings) = links {
        process_links(settings, entries, senses, examples);
    }

    media.media_files(&captions)
}

fn find_captions(spec: &Spec, senses: &[ExtractedSense], media: &MediaExtractor) -> Captions {
    let mut finder = CaptionFinder::new(SENSE_MEDIA_MARKER, spec.caption_marker.clone());
    for sense in senses {
        finder.find(&sense.record, media);
    }
    finder.into_captions()
}

/// Interlinear glosses, when the submission configures a gloss reference.
pub fn load_glosses(
    submission: &Submission,
    spec: &Spec,
    examples: &[ExtractedExample],
    diagnostics: &mut Diagnostics,
) -> Result<Option<Glosses>> {
    let Some(marker) = spec.gloss_ref.as_deref() else {
        return Ok(None);
    };
    let path = submission.glosses_path();
    let records = if path.is_file() {
        read_glosses(&path).context("read glosses.flextext")?
    } else {
        warn!(path = %path.display(), "gloss reference configured but no glosses file");
        Vec::new()
    };
    let glosses = prepare_glosses(records, marker, examples);
    check_for_missing_glosses(marker, &glosses, examples, diagnostics);
    Ok(Some(glosses))
}

// ============================================================================
// Stage 6: Rows
// ============================================================================

/// Dataset schema and filtered rows, ready to be written.
#[derive(Debug)]
pub struct Rows {
    pub dataset: Dataset,
    pub tables: TableRows,
    /// Rows per table before filtering, in `tables` order.
    pub built: Vec<usize>,
}

/// Build and filter the rows of every table.
pub fn build_rows(
    extracted: &Extracted,
    media_files: &[MediaFile],
    glosses: Option<&Glosses>,
    concepts: &ConceptMap,
    metadata: &Metadata,
    diagnostics: &mut Diagnostics,
) -> Result<Rows> {
    let spec = &extracted.spec;
    let language_id = metadata.language_id();

    let mut dataset = make_dataset(spec).context("declare dataset")?;
    if let Some(glosses) = glosses {
        add_gloss_columns(&mut dataset, glosses.columns()).context("declare gloss columns")?;
    }
    if !concepts.is_empty() {
        dataset
            .ensure_column(TableKind::Sense.component(), Column::new("Concepticon_ID"))
            .context("declare Concepticon_ID")?;
    }
    attach_column_titles(&mut dataset, spec, &metadata.properties.labels)
        .context("attach column titles")?;

    let entry_rows: Vec<Row> = extracted
        .entries
        .iter()
        .map(|entry| build_row(TableKind::Entry, &spec.entry, entry, Some(language_id)))
        .collect();
    let sense_rows: Vec<Row> = extracted
        .senses
        .iter()
        .map(|sense| {
            let mut row = build_row(TableKind::Sense, &spec.sense, sense, None);
            if let Some(id) = concepts
                .concepticon_id(&sense.id, row.text("Concepticon_ID"))
                .map(str::to_string)
            {
                row.insert("Concepticon_ID", id);
            }
            row
        })
        .collect();
    let example_rows: Vec<Row> = extracted
        .examples
        .iter()
        .map(|example| {
            let mut row = build_row(TableKind::Example, &spec.example, example, Some(language_id));
            if let Some(gloss) = glosses.and_then(|glosses| glosses.get(&example.id)) {
                merge_gloss(&mut row, gloss);
            }
            row
        })
        .collect();
    let media_rows: Vec<Row> = media_files
        .iter()
        .map(|file| media_row(file, language_id))
        .collect();

    let built = vec![
        entry_rows.len(),
        sense_rows.len(),
        example_rows.len(),
        media_rows.len(),
    ];
    let filter = |name: &str, rows: Vec<Row>, diagnostics: &mut Diagnostics| -> Result<Vec<Row>> {
        let table = dataset
            .table(name)
            .ok_or_else(|| anyhow!("dataset has no table {name}"))?;
        Ok(RowFilter::new(table).apply(rows, diagnostics))
    };
    let sense_rows = filter(TableKind::Sense.component(), sense_rows, diagnostics)?;
    let entry_rows = filter(TableKind::Entry.component(), entry_rows, diagnostics)?;
    // After the sense filter, so that entries whose senses were dropped go too.
    let entry_rows = remove_senseless_entries(&sense_rows, entry_rows, diagnostics);
    let example_rows = filter(TableKind::Example.component(), example_rows, diagnostics)?;
    let media_rows = filter(MEDIA_TABLE, media_rows, diagnostics)?;

    let tables = vec![
        (TableKind::Entry.component().to_string(), entry_rows),
        (TableKind::Sense.component().to_string(), sense_rows),
        (TableKind::Example.component().to_string(), example_rows),
        (MEDIA_TABLE.to_string(), media_rows),
    ];

    Ok(Rows {
        dataset,
        tables,
        built,
    })
}

// ============================================================================
// Stage 7: Output
// ============================================================================

/// Write tables and metadata into `dir`.
pub fn write_output(rows: &Rows, dir: &Path) -> Result<WriteSummary> {
    let mut sink = CsvSink::new(dir);
    sink.write(&rows.dataset, &rows.tables)
        .with_context(|| format!("write dataset to {}", dir.display()))
}

/// Write `cldf.log` when there are errors or warnings; remove a stale one
/// otherwise.
pub fn write_log(submission: &Submission, diagnostics: &Diagnostics) -> Result<Option<PathBuf>> {
    let path = submission.cldf_log_path();
    if diagnostics.error_count() + diagnostics.warning_count() == 0 {
        if path.is_file() {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove {}", path.display()))?;
        }
        return Ok(None);
    }
    std::fs::write(&path, diagnostics.render_log())
        .with_context(|| format!("write {}", path.display()))?;
    Ok(Some(path))
}

// ============================================================================
// Driver
// ============================================================================

/// Run every stage for the submission in `dir`.
pub fn process_submission(dir: &Path, options: &ProcessOptions) -> Result<ProcessResult> {
    let (submission, metadata) = open_submission(dir, options.repos.as_deref())?;
    let span = info_span!("submission", id = %submission.id());
    let _guard = span.enter();
    let start = Instant::now();
    let mut diagnostics = Diagnostics::new(submission.id());
    let properties = &metadata.properties;
    let read_options = ReadOptions::from_properties(properties);
    // Configuration errors end the run before anything is written.
    let links = link_settings(properties).context("could not process links")?;

    let mut database =
        info_span!("load").in_scope(|| load(&submission, &read_options, &mut diagnostics))?;

    let mut media = media_index(&submission, &metadata, MediaMode::Edit, !options.dry_run)?;
    info_span!("normalize").in_scope(|| {
        normalize(&mut database, properties, &mut media.resolver, &mut diagnostics);
    });

    let examples = info_span!("examples").in_scope(|| {
        load_examples(
            &submission,
            &read_options,
            &mut database,
            !options.dry_run,
            &mut diagnostics,
        )
    })?;

    let mut extracted = info_span!("extract")
        .in_scope(|| extract(&database, &examples, properties, &mut diagnostics))?;

    let media_files = info_span!("resolve").in_scope(|| {
        resolve(&mut extracted, &mut media.extractor, links.as_ref(), &mut diagnostics)
    });
    let glosses = load_glosses(
        &submission,
        &extracted.spec,
        &extracted.examples,
        &mut diagnostics,
    )?;
    let concepts = ConceptMap::from_csv(&submission.concepts_path()).context("read concepts.csv")?;

    let rows = info_span!("rows").in_scope(|| {
        build_rows(
            &extracted,
            &media_files,
            glosses.as_ref(),
            &concepts,
            &metadata,
            &mut diagnostics,
        )
    })?;

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| submission.processed_dir());
    let (written, log_file) = if options.dry_run {
        (None, None)
    } else {
        let summary = write_output(&rows, &output_dir)?;
        let log_file = write_log(&submission, &diagnostics)?;
        (Some(summary), log_file)
    };

    let tables = rows
        .tables
        .iter()
        .zip(&rows.built)
        .map(|((name, kept), built)| TableSummary {
            name: name.clone(),
            built: *built,
            written: kept.len(),
            path: written.as_ref().and_then(|summary| {
                let url = rows.dataset.table(name).map(|table| table.url.as_str())?;
                summary
                    .tables
                    .iter()
                    .find(|(path, _)| path.ends_with(url))
                    .map(|(path, _)| path.clone())
            }),
        })
        .collect();

    info!(
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        duration_ms = start.elapsed().as_millis(),
        "submission processed"
    );
    Ok(ProcessResult {
        submission_id: submission.id().to_string(),
        output_dir,
        tables,
        media_files: media_files.len(),
        log_file,
        metadata_file: written.and_then(|summary| summary.metadata),
        diagnostics,
    })
}
