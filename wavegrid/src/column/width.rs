//! Column width distribution.

use super::ColumnDef;

/// Assumed table width when the host does not supply one.
pub const DEFAULT_TABLE_WIDTH: u32 = 1200;

/// Smallest width handed to an auto-sized column.
pub const MIN_AUTO_WIDTH: u32 = 100;

/// Fill in `size` for every column.
///
/// Structural columns take their fixed width. Data columns with an explicit
/// width keep it. The remaining data columns split what is left evenly, never
/// going below [`MIN_AUTO_WIDTH`], and become resizable.
///
/// Pure: the same input always yields the same widths.
pub fn distribute_widths(columns: &[ColumnDef], total_width: u32) -> Vec<ColumnDef> {
    let mut used: u32 = 0;
    let mut auto_count: u32 = 0;
    for column in columns {
        match column.structural_kind() {
            Some(kind) => used = used.saturating_add(kind.default_width()),
            None if column.size > 0 => used = used.saturating_add(column.size),
            None => auto_count += 1,
        }
    }

    let auto_width = if auto_count == 0 {
        0
    } else {
        let leftover = total_width
            .saturating_sub(used)
            .max(auto_count.saturating_mul(MIN_AUTO_WIDTH));
        (leftover / auto_count).max(MIN_AUTO_WIDTH)
    };

    columns
        .iter()
        .map(|column| {
            let mut sized = column.clone();
            match column.structural_kind() {
                Some(kind) => sized.size = kind.default_width(),
                None if column.size > 0 => {}
                None => {
                    sized.size = auto_width;
                    sized.resizable = true;
                }
            }
            sized
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::StructuralKind;

    #[test]
    fn test_two_auto_columns_beside_selection() {
        let columns = vec![
            ColumnDef::structural(StructuralKind::Select),
            ColumnDef::new("col1"),
            ColumnDef::new("col2"),
        ];
        let sized = distribute_widths(&columns, DEFAULT_TABLE_WIDTH);
        let widths: Vec<u32> = sized.iter().map(|c| c.size).collect();
        assert_eq!(widths, [40, 580, 580]);
        assert!(sized[1].resizable && sized[2].resizable);
        assert!(!sized[0].resizable);
    }

    #[test]
    fn test_explicit_widths_are_kept() {
        let columns = vec![
            ColumnDef::new("wide").width(900),
            ColumnDef::new("rest"),
            ColumnDef::structural(StructuralKind::Actions),
        ];
        let sized = distribute_widths(&columns, 1200);
        assert_eq!(sized[0].size, 900);
        assert!(!sized[0].resizable);
        assert_eq!(sized[1].size, 240);
        assert_eq!(sized[2].size, 60);
    }

    #[test]
    fn test_overflow_clamps_to_minimum() {
        let columns = vec![
            ColumnDef::new("huge").width(1500),
            ColumnDef::new("a"),
            ColumnDef::new("b"),
            ColumnDef::new("c"),
        ];
        let sized = distribute_widths(&columns, 1200);
        assert!(sized[1..].iter().all(|c| c.size == MIN_AUTO_WIDTH));
    }

    #[test]
    fn test_is_deterministic() {
        let columns = vec![ColumnDef::new("a"), ColumnDef::new("b").width(10)];
        assert_eq!(
            distribute_widths(&columns, 777),
            distribute_widths(&columns, 777)
        );
    }
}
