//! Output rows built from extracted records.

use std::collections::BTreeMap;
use std::fmt;

use dict_core::MediaFile;
use dict_ingest::GlossRecord;
use dict_map::{DEFAULT_SEPARATOR, TableKind, TableSpec};
use dict_model::ExtractedRecord;
use serde::Serialize;

/// Entry columns holding entry ids.
pub const ENTRY_LIST_COLUMNS: &[&str] = &["Main_Entry", "Entry_IDs", "Contains"];

/// Example columns holding whitespace-separated tokens.
pub const EXAMPLE_LIST_COLUMNS: &[&str] = &["Gloss", "Analyzed_Word"];

/// One cell: a plain value or a list for separator columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    List(Vec<String>),
}

impl CellValue {
    /// Whether the cell holds nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Text(text) => text.trim().is_empty(),
            CellValue::List(items) => items.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            CellValue::List(_) => None,
        }
    }

    /// CSV rendering; list items are joined with `separator`.
    pub fn render(&self, separator: &str) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::List(items) => items.join(separator),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(text) => write!(f, "{text:?}"),
            CellValue::List(items) => write!(f, "{items:?}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Vec<String>> for CellValue {
    fn from(value: Vec<String>) -> Self {
        CellValue::List(value)
    }
}

/// Column name -> cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(CellValue::as_text)
    }

    /// Row id, or an empty string.
    pub fn id(&self) -> &str {
        self.text("ID").unwrap_or_default().trim()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(column.into(), value.into());
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    /// Whether `column` is missing or empty.
    pub fn is_blank(&self, column: &str) -> bool {
        self.get(column).is_none_or(CellValue::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(column, value)| (column.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<C: Into<String>, V: Into<CellValue>> FromIterator<(C, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// Trim and collapse runs of spaces; newlines become spaces.
pub fn single_spaces(value: &str) -> String {
    value
        .trim()
        .replace('\n', " ")
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the output row of one extracted record.
///
/// Repeated markers of one column are joined with `" ; "`. Source markers
/// add `value[Column]` citations to `Source`. Ids, sense ids and media ids
/// come from the record, not from its markers.
pub fn build_row<R: ExtractedRecord>(
    kind: TableKind,
    table: &TableSpec,
    record: &R,
    language_id: Option<&str>,
) -> Row {
    let mut values: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    let mut sources = Vec::new();
    for (marker, value) in record.record().iter() {
        if let Some(column) = table.refs.get(marker) {
            sources.extend(
                value
                    .split(';')
                    .map(|source| format!("{}[{column}]", source.trim())),
            );
        }
        if let Some(column) = table.column(marker)
            && !value.is_empty()
        {
            values.entry(column).or_default().push(single_spaces(value));
        }
    }

    let mut row: Row = values
        .into_iter()
        .map(|(column, parts)| (column, parts.join(DEFAULT_SEPARATOR)))
        .collect();
    row.insert("ID", record.id());
    if let Some(entry_id) = record.entry_id() {
        row.insert("Entry_ID", entry_id);
    }
    if let Some(sense_ids) = record.sense_ids() {
        row.insert("Sense_IDs", sense_ids.to_vec());
    }
    row.insert("Media_IDs", record.media_ids().to_vec());
    if let Some(language_id) = language_id.filter(|id| !id.is_empty()) {
        row.insert("Language_ID", language_id);
    }
    if !sources.is_empty() {
        row.insert("Source", sources);
    }

    match kind {
        TableKind::Example => {
            for &column in EXAMPLE_LIST_COLUMNS {
                if let Some(text) = row.text(column) {
                    let tokens = text.split_whitespace().map(str::to_string).collect::<Vec<_>>();
                    row.insert(column, tokens);
                }
            }
        }
        TableKind::Entry => {
            for &column in ENTRY_LIST_COLUMNS {
                if let Some(text) = row.text(column) {
                    let ids = text
                        .split(';')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>();
                    row.insert(column, ids);
                }
            }
        }
        TableKind::Sense => {}
    }
    row
}

/// Overlay gloss columns on an example row; gloss values win.
pub fn merge_gloss(row: &mut Row, gloss: &GlossRecord) {
    for (column, values) in &gloss.example {
        row.insert(column.clone(), values.clone());
    }
}

/// Media table row.
pub fn media_row(file: &MediaFile, language_id: &str) -> Row {
    let mut row = Row::new();
    row.insert("ID", file.id.as_str());
    row.insert("Language_ID", language_id);
    row.insert("Filename", file.filename.as_str());
    if let Some(description) = &file.description {
        row.insert("Description", description.as_str());
    }
    row
}
