//! Writing a dataset to disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{OutputError, Result};
use crate::row::Row;
use crate::schema::{Dataset, Table};

/// Metadata file name.
pub const METADATA_FILE: &str = "cldf-md.json";

/// Rows to write, per table name (component or url).
pub type TableRows = Vec<(String, Vec<Row>)>;

/// What a sink wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// `(file, rows)` per written table.
    pub tables: Vec<(PathBuf, usize)>,
    pub metadata: Option<PathBuf>,
}

/// Destination for a finished dataset.
pub trait DatasetSink {
    fn write(&mut self, dataset: &Dataset, rows: &TableRows) -> Result<WriteSummary>;
}

/// Ensure an output directory exists.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// One CSV file per table plus `cldf-md.json`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_table(&self, table: &Table, rows: &[Row]) -> Result<PathBuf> {
        let path = self.dir.join(&table.url);
        let csv_error = |source| OutputError::Csv {
            path: path.clone(),
            source,
        };
        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        writer
            .write_record(table.columns().iter().map(|column| column.name.as_str()))
            .map_err(csv_error)?;
        for row in rows {
            let record = table.columns().iter().map(|column| {
                let separator = column.separator.as_deref().unwrap_or(" ");
                row.get(&column.name)
                    .map(|value| value.render(separator))
                    .unwrap_or_default()
            });
            writer.write_record(record).map_err(csv_error)?;
        }
        writer.flush().map_err(|source| OutputError::FileWrite {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), rows = rows.len(), "wrote table");
        Ok(path)
    }

    fn write_metadata(&self, dataset: &Dataset) -> Result<PathBuf> {
        let path = self.dir.join(METADATA_FILE);
        let file = fs::File::create(&path).map_err(|source| OutputError::FileWrite {
            path: path.clone(),
            source,
        })?;
        serde_json::to_writer_pretty(file, &dataset.metadata()).map_err(|source| {
            OutputError::Json {
                path: path.clone(),
                source,
            }
        })?;
        Ok(path)
    }
}

impl DatasetSink for CsvSink {
    fn write(&mut self, dataset: &Dataset, rows: &TableRows) -> Result<WriteSummary> {
        ensure_output_dir(&self.dir)?;
        let mut summary = WriteSummary::default();
        for table in dataset.tables() {
            let table_rows = rows
                .iter()
                .find(|(name, _)| name == table.name() || *name == table.url)
                .map(|(_, rows)| rows.as_slice())
                .unwrap_or_default();
            let path = self.write_table(table, table_rows)?;
            summary.tables.push((path, table_rows.len()));
        }
        summary.metadata = Some(self.write_metadata(dataset)?);
        info!(
            dir = %self.dir.display(),
            tables = summary.tables.len(),
            "wrote dataset"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::CellValue;
    use tempfile::TempDir;

    #[test]
    fn writes_tables_and_metadata() {
        let dir = TempDir::new().unwrap();
        let mut dataset = Dataset::new();
        dataset.add_table("media.csv", &["ID", "Filename"]).unwrap();
        let mut entry = Row::new();
        entry.insert("ID", "cat");
        entry.insert("Headword", "cat, \"the\" animal");
        entry.insert(
            "Media_IDs",
            CellValue::List(vec!["a".to_string(), "b".to_string()]),
        );
        let rows: TableRows = vec![("EntryTable".to_string(), vec![entry])];

        let mut sink = CsvSink::new(dir.path().join("processed"));
        let summary = sink.write(&dataset, &rows).unwrap();
        assert_eq!(summary.tables.len(), 3);
        assert_eq!(summary.tables[0].1, 1);

        let entries = fs::read_to_string(dir.path().join("processed").join("entries.csv")).unwrap();
        insta::assert_snapshot!(entries, @r#"
        ID,Language_ID,Headword,Part_Of_Speech
        cat,,"cat, ""the"" animal",
        "#);
        let media = fs::read_to_string(dir.path().join("processed").join("media.csv")).unwrap();
        assert_eq!(media, "ID,Filename\n");
        assert!(dir.path().join("processed").join(METADATA_FILE).is_file());
    }
}
