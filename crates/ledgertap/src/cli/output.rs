//! Table output helpers for the CLI.

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use ledgertap_protocol::RunReport;

/// Render a table with a cyan header row.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    println!("{table}");
}

/// Per-source run summary.
pub fn print_reports(reports: &[RunReport]) {
    let rows = reports
        .iter()
        .map(|r| {
            vec![
                r.source_key.clone(),
                r.new_messages.to_string(),
                r.classified.to_string(),
                r.deduplicated.to_string(),
                r.applied.to_string(),
                r.skipped_unmatched.to_string(),
                r.queued_review.to_string(),
                r.errors.to_string(),
            ]
        })
        .collect();

    print_table(
        &[
            "Source",
            "Messages",
            "Classified",
            "Deduped",
            "Applied",
            "Unmatched",
            "Review",
            "Errors",
        ],
        rows,
    );
}

/// Single-line preview of a multi-line message body.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let truncated: String = flat.chars().take(max_chars).collect();
    format!("{truncated}…")
}
