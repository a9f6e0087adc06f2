//! Dataset schema: tables, columns and foreign keys.
//!
//! The schema serializes to a CSVW metadata document (`cldf-md.json`).

use serde::Serialize;

use crate::error::{OutputError, Result};

const TERMS: &str = "http://cldf.clld.org/v1.0/terms.rdf";

/// Dictionary module identifier.
pub const DICTIONARY_MODULE: &str = "Dictionary";

/// Media table url.
pub const MEDIA_TABLE: &str = "media.csv";

/// Separator of tab-separated columns (glosses, analyzed words).
pub const TAB_SEPARATOR: &str = "\t";

/// Property URL of a well-known column.
fn property_url(name: &str) -> Option<String> {
    let term = match name {
        "ID" => "id",
        "Language_ID" => "languageReference",
        "Headword" => "headword",
        "Part_Of_Speech" => "partOfSpeech",
        "Description" => "description",
        "Entry_ID" => "entryReference",
        "Primary_Text" => "primaryText",
        "Analyzed_Word" => "analyzedWord",
        "Gloss" => "gloss",
        "Translated_Text" => "translatedText",
        "Meta_Language_ID" => "metaLanguageReference",
        "Comment" => "comment",
        "Source" => "source",
        "Media_IDs" => "mediaReference",
        "Sense_IDs" => "senseReference",
        "Concepticon_ID" => "concepticonReference",
        _ => return None,
    };
    Some(format!("{TERMS}#{term}"))
}

fn is_false(value: &bool) -> bool {
    !*value
}

// =============================================================================
// Columns and keys
// =============================================================================

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "propertyUrl", skip_serializing_if = "Option::is_none")]
    pub property_url: Option<String>,
    pub datatype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titles: Option<String>,
}

impl Column {
    /// A string column; well-known names get their CLDF property.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            property_url: property_url(&name),
            name,
            datatype: "string".to_string(),
            separator: None,
            required: false,
            titles: None,
        }
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub resource: String,
    #[serde(rename = "columnReference")]
    pub column_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    #[serde(rename = "columnReference")]
    pub column_reference: String,
    pub reference: Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<Column>,
    #[serde(rename = "foreignKeys", skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(rename = "primaryKey")]
    pub primary_key: Vec<String>,
}

// =============================================================================
// Tables
// =============================================================================

/// One table: a CSV file and its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub url: String,
    #[serde(rename = "dc:conformsTo", skip_serializing_if = "Option::is_none")]
    pub conforms_to: Option<String>,
    #[serde(rename = "tableSchema")]
    pub schema: TableSchema,
    #[serde(skip)]
    component: Option<String>,
}

impl Table {
    pub fn new(url: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            url: url.into(),
            conforms_to: None,
            schema: TableSchema {
                columns,
                foreign_keys: Vec::new(),
                primary_key: vec!["ID".to_string()],
            },
            component: None,
        }
    }

    /// Table of a standard CLDF component with its default columns.
    pub fn component(name: &str) -> Option<Self> {
        let (url, columns): (&str, Vec<Column>) = match name {
            "EntryTable" => (
                "entries.csv",
                vec![
                    Column::new("ID").required(),
                    Column::new("Language_ID"),
                    Column::new("Headword"),
                    Column::new("Part_Of_Speech"),
                ],
            ),
            "SenseTable" => (
                "senses.csv",
                vec![
                    Column::new("ID").required(),
                    Column::new("Description"),
                    Column::new("Entry_ID").required(),
                ],
            ),
            "ExampleTable" => (
                "examples.csv",
                vec![
                    Column::new("ID").required(),
                    Column::new("Language_ID"),
                    Column::new("Primary_Text"),
                    Column::new("Analyzed_Word").with_separator(TAB_SEPARATOR),
                    Column::new("Gloss").with_separator(TAB_SEPARATOR),
                    Column::new("Translated_Text"),
                    Column::new("Meta_Language_ID"),
                    Column::new("Comment"),
                ],
            ),
            _ => return None,
        };
        let mut table = Self::new(url, columns);
        table.conforms_to = Some(format!("{TERMS}#{name}"));
        table.component = Some(name.to_string());
        Some(table)
    }

    /// Component name, or the url for plain tables.
    pub fn name(&self) -> &str {
        self.component.as_deref().unwrap_or(&self.url)
    }

    fn matches(&self, name: &str) -> bool {
        self.url == name || self.component.as_deref() == Some(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.columns.iter().find(|column| column.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.schema
            .columns
            .iter_mut()
            .find(|column| column.name == name)
    }

    pub fn columns(&self) -> &[Column] {
        &self.schema.columns
    }

    /// Names of required columns, in schema order.
    pub fn required_columns(&self) -> Vec<&str> {
        self.schema
            .columns
            .iter()
            .filter(|column| column.required)
            .map(|column| column.name.as_str())
            .collect()
    }
}

// =============================================================================
// Dataset
// =============================================================================

#[derive(Serialize)]
struct Document<'a> {
    #[serde(rename = "@context")]
    context: (&'static str, serde_json::Value),
    #[serde(rename = "dc:conformsTo")]
    conforms_to: String,
    tables: &'a [Table],
}

/// A dictionary dataset schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    tables: Vec<Table>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset {
    /// Dictionary with the entry and sense components.
    pub fn new() -> Self {
        Self {
            tables: ["EntryTable", "SenseTable"]
                .into_iter()
                .filter_map(Table::component)
                .collect(),
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|table| table.matches(name))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|table| table.matches(name))
            .ok_or_else(|| OutputError::UnknownTable {
                table: name.to_string(),
            })
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Add a standard component such as `ExampleTable`.
    pub fn add_component(&mut self, name: &str) -> Result<()> {
        if self.has_table(name) {
            return Err(OutputError::DuplicateTable {
                table: name.to_string(),
            });
        }
        let table = Table::component(name).ok_or_else(|| OutputError::UnknownTable {
            table: name.to_string(),
        })?;
        self.tables.push(table);
        Ok(())
    }

    /// Add a plain table with string columns; `ID` is required.
    pub fn add_table(&mut self, url: &str, columns: &[&str]) -> Result<()> {
        if self.has_table(url) {
            return Err(OutputError::DuplicateTable {
                table: url.to_string(),
            });
        }
        let columns = columns
            .iter()
            .map(|&name| match name {
                "ID" => Column::new(name).required(),
                _ => Column::new(name),
            })
            .collect();
        self.tables.push(Table::new(url, columns));
        Ok(())
    }

    /// Declare `column` on `table`; fails if the name is taken.
    pub fn add_column(&mut self, table: &str, column: Column) -> Result<()> {
        let target = self.table_mut(table)?;
        if target.column(&column.name).is_some() {
            return Err(OutputError::DuplicateColumn {
                table: table.to_string(),
                column: column.name,
            });
        }
        target.schema.columns.push(column);
        Ok(())
    }

    /// Declare `column` unless a column of that name exists.
    ///
    /// Returns whether the column was added.
    pub fn ensure_column(&mut self, table: &str, column: Column) -> Result<bool> {
        match self.add_column(table, column) {
            Ok(()) => Ok(true),
            Err(OutputError::DuplicateColumn { .. }) => Ok(false),
            Err(other) => Err(other),
        }
    }

    /// Reference the `ID` column of `resource` from `column`.
    pub fn add_foreign_key(&mut self, table: &str, column: &str, resource: &str) -> Result<()> {
        let target = self.table_mut(table)?;
        target.schema.foreign_keys.push(ForeignKey {
            column_reference: column.to_string(),
            reference: Reference {
                resource: resource.to_string(),
                column_reference: "ID".to_string(),
            },
        });
        Ok(())
    }

    /// Mark an existing column as required; unknown columns are ignored.
    pub fn set_required(&mut self, table: &str, column: &str) -> Result<()> {
        if let Some(column) = self.table_mut(table)?.column_mut(column) {
            column.required = true;
        }
        Ok(())
    }

    pub fn set_titles(&mut self, table: &str, column: &str, titles: &str) -> Result<()> {
        if let Some(column) = self.table_mut(table)?.column_mut(column) {
            column.titles = Some(titles.to_string());
        }
        Ok(())
    }

    /// CSVW metadata document.
    pub fn metadata(&self) -> impl Serialize + '_ {
        Document {
            context: (
                "http://www.w3.org/ns/csvw",
                serde_json::json!({ "@language": "en" }),
            ),
            conforms_to: format!("{TERMS}#{DICTIONARY_MODULE}"),
            tables: &self.tables,
        }
    }
}
