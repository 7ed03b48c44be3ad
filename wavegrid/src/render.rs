//! Cell renderer dispatch.
//!
//! Maps a column's widget type to a [`Cell`]. Checkbox cells read through the
//! edit overlay; every other widget is a read-only view of the row value.

use serde_json::Value;

use crate::column::{ColumnDef, StructuralKind, WidgetType};
use crate::dataset::RowId;
use crate::edit::EditSession;

/// A rendered cell, ready for a presentation layer to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Button { label: String },
    Checkbox { checked: bool },
    Link { text: String, href: String },
    Icon { name: String },
    Image { src: String },
    Label { text: String },
    /// Raw text from an inferred column.
    Text { text: String },
    /// Selection control for the row.
    Selector { selected: bool, multi: bool },
    /// Expansion toggle for the row.
    Expander { expanded: bool },
    /// 1-based row number.
    RowNumber { number: usize },
    /// Placeholder for action buttons the host supplies.
    Actions,
}

impl Cell {
    /// Plain-text form of the cell.
    pub fn text(&self) -> String {
        match self {
            Cell::Button { label } => format!("[{}]", label),
            Cell::Checkbox { checked } => if *checked { "■" } else { "□" }.to_string(),
            Cell::Link { text, .. } | Cell::Label { text } | Cell::Text { text } => text.clone(),
            Cell::Icon { name } => format!("<{}>", name),
            Cell::Image { src } => format!("img:{}", src),
            Cell::Selector { selected, multi } => match (multi, selected) {
                (true, true) => "■",
                (true, false) => "□",
                (false, true) => "●",
                (false, false) => "○",
            }
            .to_string(),
            Cell::Expander { expanded } => if *expanded { "▼" } else { "▶" }.to_string(),
            Cell::RowNumber { number } => number.to_string(),
            Cell::Actions => "…".to_string(),
        }
    }
}

/// Display text for a field value.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => match map.get("$date") {
            Some(inner) => display_value(inner),
            None => value.to_string(),
        },
        Value::Array(_) => value.to_string(),
    }
}

/// Truthiness of a field value for checkbox display.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}

/// Per-row facts the structural renderers need.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowFlags {
    /// Position in the full dataset.
    pub index: usize,
    pub selected: bool,
    pub expanded: bool,
}

/// Render one cell.
pub fn render_cell(
    column: &ColumnDef,
    row_id: &RowId,
    row: &Value,
    flags: RowFlags,
    edit: &EditSession,
) -> Cell {
    if let Some(kind) = column.structural_kind() {
        return match kind {
            StructuralKind::Select => Cell::Selector {
                selected: flags.selected,
                multi: true,
            },
            StructuralKind::Radio => Cell::Selector {
                selected: flags.selected,
                multi: false,
            },
            StructuralKind::Index => Cell::RowNumber {
                number: flags.index + 1,
            },
            StructuralKind::Expand => Cell::Expander {
                expanded: flags.expanded,
            },
            StructuralKind::Actions => Cell::Actions,
        };
    }

    let field = column.field.as_str();
    match &column.widget_type {
        WidgetType::Checkbox => Cell::Checkbox {
            checked: truthy(&edit.effective_value(row_id, row, field)),
        },
        widget => {
            let text = row.get(field).map(display_value).unwrap_or_default();
            match widget {
                WidgetType::Button => Cell::Button {
                    label: if text.is_empty() {
                        column.header.clone()
                    } else {
                        text
                    },
                },
                WidgetType::Link => Cell::Link {
                    href: text.clone(),
                    text,
                },
                WidgetType::Icon => Cell::Icon { name: text },
                WidgetType::Image => Cell::Image { src: text },
                WidgetType::Text => Cell::Text { text },
                WidgetType::Label | WidgetType::Unknown(_) | WidgetType::Checkbox => Cell::Label { text },
            }
        }
    }
}

/// Flip a checkbox cell through the overlay.
///
/// Returns false for non-checkbox columns or when editing is off; the row
/// itself is never touched.
pub fn toggle_checkbox(column: &ColumnDef, row_id: &RowId, row: &Value, edit: &EditSession) -> bool {
    if column.widget_type != WidgetType::Checkbox || !edit.is_active() {
        return false;
    }
    let current = truthy(&edit.effective_value(row_id, row, &column.field));
    edit.stage(row_id, &column.field, Value::Bool(!current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditMode;
    use crate::store::CellStore;
    use serde_json::json;

    fn session(mode: EditMode) -> EditSession {
        EditSession::new(mode, CellStore::new())
    }

    #[test]
    fn test_checkbox_prefers_overlay() {
        let row = json!({"id": 5, "active": false});
        let id = RowId::key("5");
        let column = ColumnDef::new("active").widget(WidgetType::Checkbox);
        let mut edit = session(EditMode::QuickEdit);

        edit.stage(&id, "active", json!(true));
        let cell = render_cell(&column, &id, &row, RowFlags::default(), &edit);
        assert_eq!(cell, Cell::Checkbox { checked: true });

        edit.set_mode(EditMode::None);
        let cell = render_cell(&column, &id, &row, RowFlags::default(), &edit);
        assert_eq!(cell, Cell::Checkbox { checked: false });
    }

    #[test]
    fn test_toggle_checkbox_never_touches_row() {
        let row = json!({"active": true});
        let id = RowId::Index(0);
        let column = ColumnDef::new("active").widget(WidgetType::Checkbox);
        let edit = session(EditMode::QuickEdit);
        assert!(toggle_checkbox(&column, &id, &row, &edit));
        assert_eq!(edit.pending(&id, "active"), Some(json!(false)));
        assert_eq!(row["active"], json!(true));

        let readonly = session(EditMode::None);
        assert!(!toggle_checkbox(&column, &id, &row, &readonly));
    }

    #[test]
    fn test_read_only_widgets() {
        let row = json!({"site": "https://example.com", "name": "Ada", "n": 3});
        let id = RowId::Index(0);
        let edit = session(EditMode::None);
        let flags = RowFlags::default();

        let link = ColumnDef::new("site").widget(WidgetType::Link);
        assert_eq!(
            render_cell(&link, &id, &row, flags, &edit),
            Cell::Link {
                text: "https://example.com".into(),
                href: "https://example.com".into()
            }
        );

        let text = ColumnDef::new("n").widget(WidgetType::Text);
        assert_eq!(
            render_cell(&text, &id, &row, flags, &edit),
            Cell::Text { text: "3".into() }
        );

        let button = ColumnDef::new("missing").header("Go").widget(WidgetType::Button);
        assert_eq!(
            render_cell(&button, &id, &row, flags, &edit),
            Cell::Button { label: "Go".into() }
        );
    }

    #[test]
    fn test_unknown_widget_falls_back_to_label() {
        let row = json!({"stars": 4});
        let column = ColumnDef::new("stars").widget(WidgetType::from_tag("rating"));
        let cell = render_cell(
            &column,
            &RowId::Index(0),
            &row,
            RowFlags::default(),
            &session(EditMode::None),
        );
        assert_eq!(cell, Cell::Label { text: "4".into() });
    }

    #[test]
    fn test_structural_cells() {
        let edit = session(EditMode::None);
        let flags = RowFlags {
            index: 4,
            selected: true,
            expanded: false,
        };
        let id = RowId::Index(4);
        let index = ColumnDef::structural(StructuralKind::Index);
        assert_eq!(
            render_cell(&index, &id, &Value::Null, flags, &edit),
            Cell::RowNumber { number: 5 }
        );
        let radio = ColumnDef::structural(StructuralKind::Radio);
        assert_eq!(
            render_cell(&radio, &id, &Value::Null, flags, &edit).text(),
            "●"
        );
    }
}
