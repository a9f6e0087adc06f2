//! Row filters applied before tables are written.

use std::collections::BTreeSet;

use dict_model::{Category, Diagnostics};
use dict_output::{Row, Table};
use tracing::debug;

/// Drops rows that lack a value in any required column of their table.
#[derive(Debug, Clone)]
pub struct RowFilter {
    table: String,
    required: Vec<String>,
}

impl RowFilter {
    pub fn new(table: &Table) -> Self {
        Self {
            table: table.name().to_string(),
            required: table
                .required_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Required columns that are blank in `row`.
    pub fn missing_fields(&self, row: &Row) -> Vec<&str> {
        self.required
            .iter()
            .map(String::as_str)
            .filter(|column| row.is_blank(column))
            .collect()
    }

    /// Keep complete rows; each dropped row is logged with all its cells.
    pub fn apply(&self, rows: Vec<Row>, diagnostics: &mut Diagnostics) -> Vec<Row> {
        let before = rows.len();
        let kept: Vec<Row> = rows
            .into_iter()
            .filter(|row| {
                let missing = self.missing_fields(row);
                if missing.is_empty() {
                    return true;
                }
                let cells = row
                    .iter()
                    .map(|(column, value)| format!("{column}: {value}"))
                    .collect::<Vec<_>>()
                    .join("\n");
                diagnostics.error(
                    Category::Row,
                    None,
                    format!(
                        "{}: row dropped due to missing required fields ({}):\n{cells}",
                        self.table,
                        missing.join(",")
                    ),
                );
                false
            })
            .collect();
        debug!(table = %self.table, kept = kept.len(), dropped = before - kept.len(), "filtered rows");
        kept
    }
}

/// Drop entries that no sense row points to.
pub fn remove_senseless_entries(
    sense_rows: &[Row],
    entry_rows: Vec<Row>,
    diagnostics: &mut Diagnostics,
) -> Vec<Row> {
    let referenced: BTreeSet<&str> = sense_rows
        .iter()
        .filter_map(|row| row.text("Entry_ID"))
        .collect();
    entry_rows
        .into_iter()
        .filter(|entry| {
            let id = entry.id();
            if referenced.contains(id) {
                return true;
            }
            diagnostics.error(Category::Row, None, format!("no senses found for entry {id}"));
            false
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dict_output::Dataset;

    fn sense(id: &str, entry: &str) -> Row {
        Row::from_iter([("ID", id), ("Entry_ID", entry), ("Description", "x")])
    }

    #[test]
    fn drops_rows_missing_required_fields() {
        let dataset = Dataset::new();
        let filter = RowFilter::new(dataset.table("SenseTable").unwrap());
        let mut diagnostics = Diagnostics::new("test");
        let rows = vec![
            sense("SN000001", "LX000001"),
            Row::from_iter([("ID", "SN000002"), ("Description", "orphan")]),
        ];

        let kept = filter.apply(rows, &mut diagnostics);
        assert_eq!(kept.len(), 1);
        insta::assert_snapshot!(diagnostics.render_log(), @r#"
        ERROR SenseTable: row dropped due to missing required fields (Entry_ID):
        Description: "orphan"
        ID: "SN000002"
        "#);
    }

    #[test]
    fn removes_entries_without_senses() {
        let senses = vec![sense("SN000001", "LX000001")];
        let entries = vec![
            Row::from_iter([("ID", "LX000001")]),
            Row::from_iter([("ID", "LX000002")]),
        ];
        let mut diagnostics = Diagnostics::new("test");

        let kept = remove_senseless_entries(&senses, entries, &mut diagnostics);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), "LX000001");
        assert_eq!(
            diagnostics.render_log(),
            "ERROR no senses found for entry LX000002\n"
        );
    }
}
