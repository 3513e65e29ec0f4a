//! Table helpers built on `comfy-table`.
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

/// A table with the shared preset and the given header row.
pub fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    table
}

/// Builds a table from string rows.
pub fn render_rows(headers: &[&str], rows: &[Vec<String>]) -> Table {
    let mut table = new_table(headers);
    for row in rows {
        table.add_row(row.clone());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_rows_contains_cells() {
        let table = render_rows(
            &["MODULE", "PORTS"],
            &[vec!["grafana".to_string(), "127.0.0.1:3000".to_string()]],
        );
        let text = table.to_string();
        assert!(text.contains("MODULE"));
        assert!(text.contains("grafana"));
        assert!(text.contains("127.0.0.1:3000"));
    }
}
