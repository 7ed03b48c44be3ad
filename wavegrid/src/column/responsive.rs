//! Responsive column visibility.
//!
//! The breakpoint is detected once when a grid mounts and is not re-evaluated
//! on resize. Hosts that need resize behavior rebuild the grid.

use super::ColumnDef;

/// Viewport size classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Breakpoint {
    /// Up to 767 units.
    Mobile,
    /// 768 to 991 units.
    Tablet,
    /// 992 to 1199 units.
    SmallDesktop,
    /// 1200 units and wider.
    #[default]
    LargeDesktop,
}

impl Breakpoint {
    /// Classify a viewport width.
    pub fn from_width(width: u32) -> Self {
        match width {
            0..=767 => Breakpoint::Mobile,
            768..=991 => Breakpoint::Tablet,
            992..=1199 => Breakpoint::SmallDesktop,
            _ => Breakpoint::LargeDesktop,
        }
    }
}

/// Source of the viewport width.
pub trait ViewportSource {
    /// Current viewport width, or `None` when it cannot be read.
    fn width(&self) -> Option<u32>;
}

/// A source that reports a fixed width.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedViewport(pub Option<u32>);

impl ViewportSource for FixedViewport {
    fn width(&self) -> Option<u32> {
        self.0
    }
}

/// Detect the breakpoint, assuming a large desktop when the width is unknown.
pub fn detect_breakpoint(viewport: &dyn ViewportSource) -> Breakpoint {
    viewport
        .width()
        .map(Breakpoint::from_width)
        .unwrap_or_default()
}

/// A column entry the filter cannot interpret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Column {index} has no field name")]
pub struct MalformedColumn {
    pub index: usize,
}

/// Keep the columns visible at `breakpoint`.
///
/// A malformed entry abandons filtering and returns every column; hiding
/// columns is an enhancement, not something worth failing a render over.
pub fn filter_visible(columns: &[ColumnDef], breakpoint: Breakpoint) -> Vec<ColumnDef> {
    match try_filter_visible(columns, breakpoint) {
        Ok(visible) => visible,
        Err(e) => {
            log::warn!("Column visibility filter skipped: {}", e);
            columns.to_vec()
        }
    }
}

fn try_filter_visible(columns: &[ColumnDef], breakpoint: Breakpoint) -> Result<Vec<ColumnDef>, MalformedColumn> {
    let mut visible = Vec::with_capacity(columns.len());
    for (index, column) in columns.iter().enumerate() {
        if column.field.trim().is_empty() {
            return Err(MalformedColumn { index });
        }
        if column.visibility.at(breakpoint) {
            visible.push(column.clone());
        }
    }
    Ok(visible)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_boundaries() {
        assert_eq!(Breakpoint::from_width(767), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(768), Breakpoint::Tablet);
        assert_eq!(Breakpoint::from_width(991), Breakpoint::Tablet);
        assert_eq!(Breakpoint::from_width(992), Breakpoint::SmallDesktop);
        assert_eq!(Breakpoint::from_width(1199), Breakpoint::SmallDesktop);
        assert_eq!(Breakpoint::from_width(1200), Breakpoint::LargeDesktop);
    }

    #[test]
    fn test_unreadable_viewport_is_large_desktop() {
        assert_eq!(detect_breakpoint(&FixedViewport(None)), Breakpoint::LargeDesktop);
        assert_eq!(detect_breakpoint(&FixedViewport(Some(500))), Breakpoint::Mobile);
    }

    #[test]
    fn test_filters_by_breakpoint() {
        let columns = vec![
            ColumnDef::new("name"),
            ColumnDef::new("email").hidden_on(Breakpoint::Mobile),
        ];
        let mobile = filter_visible(&columns, Breakpoint::Mobile);
        assert_eq!(mobile.len(), 1);
        assert_eq!(filter_visible(&columns, Breakpoint::Tablet).len(), 2);
    }

    #[test]
    fn test_malformed_entry_returns_everything() {
        let columns = vec![
            ColumnDef::new("email").hidden_on(Breakpoint::Mobile),
            ColumnDef::default(),
        ];
        assert_eq!(filter_visible(&columns, Breakpoint::Mobile), columns);
    }
}
