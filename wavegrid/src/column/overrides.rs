//! Versioned column set with explicit property overrides.
//!
//! Live edits to column configuration go through
//! [`ColumnSet::apply_override`], which bumps a version counter. Derived
//! layouts are memoized against that version in [`LayoutCache`].

use serde_json::Value;

use super::{Breakpoint, ColumnDef, WidgetType, distribute_widths, filter_visible};
use crate::error::{GridError, Result};

/// Column list plus a change counter.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<ColumnDef>,
    version: u64,
}

impl ColumnSet {
    /// Create a column set.
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            version: 0,
        }
    }

    /// Current columns.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Change counter, bumped by every effective mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Replace the whole list.
    pub fn replace(&mut self, columns: Vec<ColumnDef>) {
        if self.columns != columns {
            self.columns = columns;
            self.version += 1;
        }
    }

    /// Override one property of one column.
    ///
    /// Recognized keys: `header`, `width`, `widget`, `sortable`,
    /// `resizable`, `show_mobile`, `show_tablet`, `show_laptop`,
    /// `show_desktop`.
    pub fn apply_override(&mut self, index: usize, key: &str, value: Value) -> Result<()> {
        let len = self.columns.len();
        let column = self
            .columns
            .get_mut(index)
            .ok_or_else(|| GridError::invalid_override(index, key, format!("only {} columns", len)))?;

        let before = column.clone();
        match key {
            "header" => column.header = expect_str(index, key, &value)?.to_string(),
            "widget" => column.widget_type = WidgetType::from_tag(expect_str(index, key, &value)?),
            "width" => {
                column.size = value
                    .as_u64()
                    .and_then(|w| u32::try_from(w).ok())
                    .ok_or_else(|| GridError::invalid_override(index, key, "expected a width"))?;
            }
            "sortable" => column.sortable = expect_bool(index, key, &value)?,
            "resizable" => column.resizable = expect_bool(index, key, &value)?,
            "show_mobile" => column
                .visibility
                .set(Breakpoint::Mobile, expect_bool(index, key, &value)?),
            "show_tablet" => column
                .visibility
                .set(Breakpoint::Tablet, expect_bool(index, key, &value)?),
            "show_laptop" => column
                .visibility
                .set(Breakpoint::SmallDesktop, expect_bool(index, key, &value)?),
            "show_desktop" => column
                .visibility
                .set(Breakpoint::LargeDesktop, expect_bool(index, key, &value)?),
            _ => return Err(GridError::invalid_override(index, key, "unknown key")),
        }

        if *column != before {
            self.version += 1;
            log::debug!("Column {} override '{}' -> version {}", index, key, self.version);
        }
        Ok(())
    }
}

fn expect_str<'a>(index: usize, key: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| GridError::invalid_override(index, key, "expected a string"))
}

fn expect_bool(index: usize, key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| GridError::invalid_override(index, key, "expected a boolean"))
}

/// Memo key for a computed layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutKey {
    /// Version of the column set the layout was derived from.
    pub version: u64,
    /// Field names of the input list, in order.
    pub shape: Vec<String>,
    pub total_width: u32,
    pub breakpoint: Breakpoint,
}

/// Memoized width distribution and visibility filtering.
///
/// Recomputes only when the column version, the column shape, the table
/// width or the breakpoint changes, not on data updates.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entry: Option<(LayoutKey, Vec<ColumnDef>)>,
}

impl LayoutCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sized and filtered columns for the given input.
    pub fn layout(
        &mut self,
        version: u64,
        columns: &[ColumnDef],
        total_width: u32,
        breakpoint: Breakpoint,
    ) -> Vec<ColumnDef> {
        let key = LayoutKey {
            version,
            shape: columns.iter().map(|c| c.field.clone()).collect(),
            total_width,
            breakpoint,
        };
        if let Some((cached_key, cached)) = &self.entry
            && *cached_key == key
        {
            return cached.clone();
        }
        let sized = distribute_widths(columns, total_width);
        let visible = filter_visible(&sized, breakpoint);
        self.entry = Some((key, visible.clone()));
        visible
    }

    /// Whether a layout is cached.
    pub fn is_warm(&self) -> bool {
        self.entry.is_some()
    }

    /// Drop the cached layout.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set() -> ColumnSet {
        ColumnSet::new(vec![ColumnDef::new("name"), ColumnDef::new("email")])
    }

    #[test]
    fn test_override_bumps_version() {
        let mut columns = set();
        columns.apply_override(1, "header", json!("E-mail")).unwrap();
        assert_eq!(columns.version(), 1);
        assert_eq!(columns.columns()[1].header, "E-mail");
    }

    #[test]
    fn test_unchanged_override_keeps_version() {
        let mut columns = set();
        columns.apply_override(0, "header", json!("Name")).unwrap();
        assert_eq!(columns.version(), 0);
    }

    #[test]
    fn test_invalid_overrides() {
        let mut columns = set();
        assert!(matches!(
            columns.apply_override(5, "header", json!("x")),
            Err(GridError::InvalidOverride { index: 5, .. })
        ));
        assert!(columns.apply_override(0, "colour", json!("red")).is_err());
        assert!(columns.apply_override(0, "width", json!("wide")).is_err());
        assert_eq!(columns.version(), 0);
    }

    #[test]
    fn test_visibility_override() {
        let mut columns = set();
        columns.apply_override(1, "show_mobile", json!(false)).unwrap();
        assert!(!columns.columns()[1].visibility.visible_on_mobile);
    }

    #[test]
    fn test_layout_cache_follows_version() {
        let mut columns = set();
        let mut cache = LayoutCache::new();
        let first = cache.layout(columns.version(), columns.columns(), 1200, Breakpoint::LargeDesktop);
        assert_eq!(first[0].size, 600);

        columns.apply_override(0, "width", json!(200)).unwrap();
        let second = cache.layout(columns.version(), columns.columns(), 1200, Breakpoint::LargeDesktop);
        assert_eq!(second[0].size, 200);
        assert_eq!(second[1].size, 1000);
    }
}
