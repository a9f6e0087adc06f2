//! Dataset declaration for one submission.

use std::collections::{BTreeMap, BTreeSet};

use dict_map::{DEFAULT_SEPARATOR, Spec, TableKind, TableSpec};
use tracing::debug;

use crate::error::Result;
use crate::row::ENTRY_LIST_COLUMNS;
use crate::schema::{Column, Dataset, MEDIA_TABLE, TAB_SEPARATOR};

/// Columns holding `" ; "`-separated id lists.
pub const SEPARATOR_COLUMNS: &[&str] = &["Contains", "Entry_IDs", "Media_IDs", "Sense_IDs", "Main_Entry"];

/// Columns of the media table.
pub const MEDIA_COLUMNS: &[&str] = &["ID", "Language_ID", "Filename", "Description"];

/// Declare `columns` (sorted) on a table, with foreign keys for id lists.
pub fn add_columns(
    dataset: &mut Dataset,
    table: &str,
    columns: &BTreeSet<String>,
    has_refs: bool,
) -> Result<()> {
    for name in columns {
        if table == TableKind::Entry.component() && ENTRY_LIST_COLUMNS.contains(&name.as_str()) {
            dataset.add_foreign_key(table, name, "entries.csv")?;
        }
        if name == "Media_IDs" {
            dataset.add_foreign_key(table, name, MEDIA_TABLE)?;
        }
        let mut column = Column::new(name.as_str());
        if SEPARATOR_COLUMNS.contains(&name.as_str()) {
            column = column.with_separator(DEFAULT_SEPARATOR);
        }
        dataset.ensure_column(table, column)?;
    }
    if has_refs {
        dataset.ensure_column(table, Column::new("Source").with_separator(DEFAULT_SEPARATOR))?;
    }
    Ok(())
}

/// Declare the tables and columns the specification produces.
pub fn make_dataset(spec: &Spec) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    dataset.add_component(TableKind::Example.component())?;
    dataset.add_table(MEDIA_TABLE, MEDIA_COLUMNS)?;

    for kind in [TableKind::Entry, TableKind::Sense] {
        let table: &TableSpec = spec.table(kind);
        add_columns(&mut dataset, kind.component(), &table.columns, !table.refs.is_empty())?;
    }
    if !spec.example.columns.is_empty() {
        let component = TableKind::Example.component();
        add_columns(
            &mut dataset,
            component,
            &spec.example.columns,
            !spec.example.refs.is_empty(),
        )?;
        dataset.set_required(component, "Translated_Text")?;
    }
    debug!(tables = dataset.tables().len(), "declared dataset");
    Ok(dataset)
}

/// Declare gloss columns on the example table.
pub fn add_gloss_columns<'a>(
    dataset: &mut Dataset,
    columns: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let component = TableKind::Example.component();
    for name in columns {
        dataset.ensure_column(component, Column::new(name).with_separator(TAB_SEPARATOR))?;
    }
    Ok(())
}

/// Give mapped columns the display titles configured per marker.
pub fn attach_column_titles(
    dataset: &mut Dataset,
    spec: &Spec,
    labels: &BTreeMap<String, String>,
) -> Result<()> {
    for kind in [TableKind::Entry, TableKind::Sense, TableKind::Example] {
        let table = spec.table(kind);
        for (marker, label) in labels {
            if let Some(column) = table.column(marker) {
                dataset.set_titles(kind.component(), column, label)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dict_map::make_spec;
    use dict_model::Properties;

    fn spec(markers: &[&str], properties: &Properties) -> Spec {
        let markers = markers.iter().map(|m| m.to_string()).collect();
        make_spec(properties, &markers).unwrap()
    }

    #[test]
    fn declares_mapped_columns_and_keys() {
        let properties = Properties {
            references: BTreeMap::from([("bib".to_string(), "lx".to_string())]),
            ..Properties::default()
        };
        let spec = spec(&["lx", "ps", "cf", "de", "tx", "ft", "bib"], &properties);
        let dataset = make_dataset(&spec).unwrap();

        let entries = dataset.table("EntryTable").unwrap();
        let names: Vec<&str> = entries.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ID",
                "Language_ID",
                "Headword",
                "Part_Of_Speech",
                "Entry_IDs",
                "Media_IDs",
                "Source"
            ]
        );
        let keys: Vec<(&str, &str)> = entries
            .schema
            .foreign_keys
            .iter()
            .map(|key| (key.column_reference.as_str(), key.reference.resource.as_str()))
            .collect();
        assert_eq!(keys, vec![("Entry_IDs", "entries.csv"), ("Media_IDs", "media.csv")]);
        assert_eq!(
            entries.column("Entry_IDs").unwrap().separator.as_deref(),
            Some(" ; ")
        );

        let examples = dataset.table("ExampleTable").unwrap();
        assert_eq!(examples.required_columns(), vec!["ID", "Translated_Text"]);
        assert!(dataset.has_table("media.csv"));
    }

    #[test]
    fn gloss_columns_and_titles() {
        let spec = spec(&["lx", "de", "tx", "ft"], &Properties::default());
        let mut dataset = make_dataset(&spec).unwrap();
        add_gloss_columns(&mut dataset, ["Gloss", "Morphemes"]).unwrap();
        let labels = BTreeMap::from([("de".to_string(), "Meaning".to_string())]);
        attach_column_titles(&mut dataset, &spec, &labels).unwrap();

        let examples = dataset.table("ExampleTable").unwrap();
        assert_eq!(
            examples.column("Morphemes").unwrap().separator.as_deref(),
            Some("\t")
        );
        let senses = dataset.table("SenseTable").unwrap();
        assert_eq!(senses.column("Description").unwrap().titles.as_deref(), Some("Meaning"));
    }
}
