//! Terminal tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use fbg_model::{AnnotationRecord, BatchResult, ColumnKind, EditBuffer, PageInfo};
use fbg_sync::GridView;

/// Marker appended to overlay values that are not saved yet.
pub const PENDING_MARKER: &str = " *";

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// The visible page. Unsaved overlay values carry [`PENDING_MARKER`].
pub fn grid_table(view: &GridView, edits: &EditBuffer) -> Table {
    let mut table = Table::new();
    table.set_header(
        view.headers
            .iter()
            .map(|header| header_cell(&header.label))
            .collect::<Vec<_>>(),
    );
    apply_table_style(&mut table);
    for (index, header) in view.headers.iter().enumerate() {
        if header.kind == ColumnKind::Measure {
            align_column(&mut table, index, CellAlignment::Right);
        }
    }

    for row in &view.rows {
        let mut cells: Vec<Cell> = row
            .readonly
            .iter()
            .map(|field| Cell::new(&field.cell.text))
            .collect();
        for field in &row.overlay {
            let pending = row
                .natural_key()
                .and_then(|key| edits.get(key, &field.overlay))
                .is_some();
            cells.push(if pending {
                Cell::new(format!("{}{}", field.cell.text, PENDING_MARKER))
                    .fg(Color::Yellow)
                    .add_attribute(Attribute::Bold)
            } else {
                Cell::new(&field.cell.text)
            });
        }
        table.add_row(cells);
    }
    table
}

/// "Rows 101-200 of 250 (page 2 of 3)".
pub fn page_footer(page: &PageInfo) -> String {
    format!(
        "Rows {}-{} of {} (page {} of {})",
        page.first_row, page.last_row, page.total_rows, page.current_page, page.total_pages
    )
}

/// Every version of one key, oldest first.
pub fn history_table(records: &[AnnotationRecord]) -> Table {
    let mut ordered: Vec<&AnnotationRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.precedence(b));

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Version"),
        header_cell("Modified by"),
        header_cell("Modified at"),
        header_cell("Created by"),
        header_cell("Fields"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);

    for record in ordered {
        let fields = record
            .fields
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            Cell::new(record.version),
            Cell::new(&record.modified_by),
            Cell::new(record.modified_at.format("%Y-%m-%d %H:%M:%S")),
            dim_cell(&record.created_by),
            Cell::new(fields),
        ]);
    }
    table
}

/// Failed items of a save, or `None` when nothing failed.
pub fn batch_errors_table(result: &BatchResult) -> Option<Table> {
    if result.errors.is_empty() {
        return None;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Error"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for error in &result.errors {
        table.add_row(vec![
            Cell::new(&error.key),
            Cell::new(format!("{:?}", error.kind)).fg(Color::Red),
            Cell::new(&error.message),
        ]);
    }
    Some(table)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
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
