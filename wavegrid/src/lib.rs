//! Data-grid engine for the wavegrid widget runtime.
//!
//! The engine owns the derived state of a table widget (column model,
//! selection, pagination window, row expansion and the pending cell edit
//! overlay) while treating the caller's dataset as read-only input.
//!
//! Presentation is left to the host: [`Grid::view`](grid::Grid::view)
//! produces plain [`Cell`](render::Cell) values that a renderer draws.

pub mod column;
pub mod config;
pub mod dataset;
pub mod edit;
pub mod error;
pub mod events;
pub mod expansion;
pub mod grid;
pub mod pagination;
pub mod persist;
pub mod render;
pub mod selection;
pub mod session;
pub mod sort;
pub mod store;
pub mod sync;

pub use error::{GridError, Result};
pub use grid::Grid;

pub mod prelude {
    pub use crate::column::{
        Breakpoint, ColumnDef, ColumnModel, ColumnSource, StructuralKind, ValueType, WidgetType,
    };
    pub use crate::config::GridConfig;
    pub use crate::dataset::{Dataset, Datasource, MemoryDatasource, RowId};
    pub use crate::edit::{EditMode, RowPatch};
    pub use crate::error::GridError;
    pub use crate::events::{Decision, GridEvent, GridListener};
    pub use crate::expansion::ExpansionConfig;
    pub use crate::grid::{Grid, GridView, RowView};
    pub use crate::pagination::{PageState, PagingMode, TableState};
    pub use crate::render::Cell;
    pub use crate::selection::{CheckState, SelectionMode};
    pub use crate::session::SessionContext;
    pub use crate::sort::SortDirection;
    pub use crate::store::CellStore;
}
