use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dict_cli::types::{ProcessResult, SubmissionListing};
use dict_model::Severity;
use dict_transform::MarkerStats;
use dict_validate::Finding;

pub fn print_summary(result: &ProcessResult) {
    println!("Submission: {}", result.submission_id);
    println!("Output: {}", result.output_dir.display());
    if let Some(path) = &result.metadata_file {
        println!("Metadata: {}", path.display());
    }
    if let Some(path) = &result.log_file {
        println!("Log: {}", path.display());
    }

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Built"),
        header_cell("Written"),
        header_cell("Dropped"),
        header_cell("File"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for summary in &result.tables {
        table.add_row(vec![
            Cell::new(&summary.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.built),
            Cell::new(summary.written),
            count_cell(summary.dropped(), Color::Red),
            match &summary.path {
                Some(path) => Cell::new(path.display()),
                None => dim_cell("-"),
            },
        ]);
    }
    println!("{table}");

    let counts = result.diagnostics.counts_by_category();
    if counts.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Category"), header_cell("Problems")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (category, count) in counts {
        table.add_row(vec![Cell::new(category.as_str()), count_cell(count, Color::Yellow)]);
    }
    println!();
    println!("Problems:");
    println!("{table}");
}

pub fn print_findings(findings: &[Finding]) {
    if findings.is_empty() {
        println!("No problems found.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entry"),
        header_cell("Severity"),
        header_cell("Problem"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for finding in findings {
        table.add_row(vec![
            Cell::new(&finding.entry),
            severity_cell(finding.severity()),
            Cell::new(&finding.issue),
        ]);
    }
    println!("{table}");
}

pub fn print_stats(stats: &[MarkerStats]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Marker"),
        header_cell("Entries"),
        header_cell("Total"),
        header_cell("Max/entry"),
        header_cell("Separators"),
    ]);
    apply_table_style(&mut table);
    for index in 1..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 4, CellAlignment::Center);
    for stat in stats {
        table.add_row(vec![
            Cell::new(format!("\\{}", stat.marker)),
            Cell::new(stat.entries),
            Cell::new(stat.total),
            if stat.max_per_entry > 1 {
                Cell::new(stat.max_per_entry).fg(Color::Yellow)
            } else {
                Cell::new(stat.max_per_entry)
            },
            if stat.implicit_multiple {
                Cell::new("✓").fg(Color::Yellow)
            } else {
                dim_cell("-")
            },
        ]);
    }
    println!("{table}");
}

pub fn print_submissions(listings: &[SubmissionListing]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("ID"),
        header_cell("Language"),
        header_cell("Glottocode"),
        header_cell("Authors"),
        header_cell("Published"),
        header_cell("db.sfm modified"),
    ]);
    apply_summary_table_style(&mut table);
    for listing in listings {
        let language = match &listing.problem {
            Some(problem) => Cell::new(problem).fg(Color::Red),
            None => Cell::new(&listing.language),
        };
        table.add_row(vec![
            Cell::new(&listing.id)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            language,
            optional_cell(listing.glottocode.as_deref()),
            Cell::new(&listing.authors),
            optional_cell(listing.published.map(|date| date.to_string()).as_deref()),
            optional_cell(
                listing
                    .modified
                    .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
                    .as_deref(),
            ),
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR").fg(Color::Red),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
        Severity::Info => dim_cell("INFO"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) if !value.is_empty() => Cell::new(value),
        _ => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
