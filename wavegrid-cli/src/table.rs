//! Plain-text drawing of a grid page.

use wavegrid::prelude::*;

const MIN_CHARS: usize = 3;
const MAX_CHARS: usize = 32;
/// Logical width units per character.
const UNITS_PER_CHAR: u32 = 12;

fn char_width(column: &ColumnDef) -> usize {
    ((column.size / UNITS_PER_CHAR) as usize).clamp(MIN_CHARS, MAX_CHARS)
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        format!("{}{}", text, " ".repeat(width - count))
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn select_all_mark(state: CheckState) -> &'static str {
    match state {
        CheckState::Unchecked => "□",
        CheckState::Indeterminate => "▣",
        CheckState::Checked => "■",
    }
}

/// Draw the page as a table with a header, one line per row and a footer.
pub fn draw(view: &GridView) -> String {
    let widths: Vec<usize> = view.columns.iter().map(char_width).collect();
    let mut out = String::new();

    let header: Vec<String> = view
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, &width)| match column.structural_kind() {
            Some(StructuralKind::Select) => fit(select_all_mark(view.select_all), width),
            Some(StructuralKind::Index) => fit("#", width),
            _ if column.header.is_empty() => fit(&column.field, width),
            _ => fit(&column.header, width),
        })
        .collect();
    out.push_str(header.join(" │ ").trim_end());
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|&w| "─".repeat(w)).collect();
    out.push_str(&rule.join("─┼─"));
    out.push('\n');

    for row in &view.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| fit(&cell.text(), width))
            .collect();
        let marker = if row.active { "▸ " } else { "" };
        out.push_str(marker);
        out.push_str(cells.join(" │ ").trim_end());
        out.push('\n');
    }

    if view.rows.is_empty() {
        out.push_str("(no rows)\n");
    }
    out.push_str(&format!(
        "Page {} of {} · {} rows",
        if view.page_count == 0 { 0 } else { view.page_index + 1 },
        view.page_count,
        view.total_rows
    ));
    if view.adding {
        out.push_str(" · adding");
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdef", 4), "abc…");
    }

    #[test]
    fn test_draw_page() {
        let config = GridConfig::default()
            .primary_key("id")
            .selection_mode(SelectionMode::Multi)
            .page_size(2);
        let mut grid = Grid::from_value(config, json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        grid.click_row_control(&RowId::key("2"));
        let text = draw(&grid.view());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("▣"));
        assert!(!lines[2].contains('■'));
        assert!(lines[3].contains('■'));
        assert_eq!(lines[4], "Page 1 of 2 · 3 rows");
    }

    #[test]
    fn test_draw_empty() {
        let mut grid = Grid::from_value(GridConfig::default(), json!([]));
        assert!(draw(&grid.view()).contains("(no rows)"));
    }
}
