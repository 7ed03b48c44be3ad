//! Column definitions and the column model pipeline.
//!
//! Columns flow through three stages before they reach a renderer:
//!
//! 1. [`build_columns`] picks declared columns or infers them from data.
//! 2. [`distribute_widths`] fills in pixel widths.
//! 3. [`filter_visible`] drops columns hidden at the current breakpoint.

mod infer;
mod overrides;
mod responsive;
mod width;

pub use infer::*;
pub use overrides::*;
pub use responsive::*;
pub use width::*;

use serde::{Deserialize, Serialize};

/// Declared or inferred value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
}

/// Widget tag controlling how a column's cells render.
///
/// Unrecognized tags are kept verbatim in [`WidgetType::Unknown`] and render
/// as labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WidgetType {
    Button,
    Checkbox,
    Link,
    Icon,
    Image,
    #[default]
    Label,
    /// Raw text, used for inferred columns.
    Text,
    Unknown(String),
}

impl WidgetType {
    /// Parse a widget tag.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "button" => Self::Button,
            "checkbox" | "toggle" => Self::Checkbox,
            "link" | "anchor" => Self::Link,
            "icon" => Self::Icon,
            "image" | "picture" => Self::Image,
            "label" => Self::Label,
            "text" => Self::Text,
            _ => Self::Unknown(tag.to_string()),
        }
    }

    /// The tag this widget type was declared with.
    pub fn tag(&self) -> &str {
        match self {
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Link => "link",
            Self::Icon => "icon",
            Self::Image => "image",
            Self::Label => "label",
            Self::Text => "text",
            Self::Unknown(tag) => tag,
        }
    }
}

impl From<String> for WidgetType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<WidgetType> for String {
    fn from(widget: WidgetType) -> Self {
        widget.tag().to_string()
    }
}

/// Non-data columns the grid injects or reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralKind {
    /// Multi-select checkbox column.
    Select,
    /// Single-select radio column.
    Radio,
    /// Row number column.
    Index,
    /// Row action buttons.
    Actions,
    /// Row expansion toggle.
    Expand,
}

impl StructuralKind {
    /// All structural kinds.
    pub const ALL: [StructuralKind; 5] = [
        StructuralKind::Select,
        StructuralKind::Radio,
        StructuralKind::Index,
        StructuralKind::Actions,
        StructuralKind::Expand,
    ];

    /// Reserved field identifier.
    pub fn field(self) -> &'static str {
        match self {
            StructuralKind::Select => "__select",
            StructuralKind::Radio => "__radio",
            StructuralKind::Index => "__index",
            StructuralKind::Actions => "__actions",
            StructuralKind::Expand => "__expand",
        }
    }

    /// Look up the structural kind for a reserved field identifier.
    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.field() == field)
    }

    /// Fixed width for this kind of column.
    pub fn default_width(self) -> u32 {
        match self {
            StructuralKind::Select | StructuralKind::Radio | StructuralKind::Index => 40,
            StructuralKind::Actions | StructuralKind::Expand => 60,
        }
    }
}

/// Per-breakpoint visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Visibility {
    pub visible_on_mobile: bool,
    pub visible_on_tablet: bool,
    pub visible_on_laptop: bool,
    pub visible_on_desktop: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            visible_on_mobile: true,
            visible_on_tablet: true,
            visible_on_laptop: true,
            visible_on_desktop: true,
        }
    }
}

impl Visibility {
    /// Whether the column shows at the given breakpoint.
    pub fn at(&self, breakpoint: Breakpoint) -> bool {
        match breakpoint {
            Breakpoint::Mobile => self.visible_on_mobile,
            Breakpoint::Tablet => self.visible_on_tablet,
            Breakpoint::SmallDesktop => self.visible_on_laptop,
            Breakpoint::LargeDesktop => self.visible_on_desktop,
        }
    }

    /// Set the flag for one breakpoint.
    pub fn set(&mut self, breakpoint: Breakpoint, visible: bool) {
        match breakpoint {
            Breakpoint::Mobile => self.visible_on_mobile = visible,
            Breakpoint::Tablet => self.visible_on_tablet = visible,
            Breakpoint::SmallDesktop => self.visible_on_laptop = visible,
            Breakpoint::LargeDesktop => self.visible_on_desktop = visible,
        }
    }
}

/// Column configuration.
///
/// # Examples
///
/// ```
/// use wavegrid::column::{ColumnDef, ValueType, WidgetType};
///
/// let columns = vec![
///     ColumnDef::new("name").header("Customer"),
///     ColumnDef::new("active").widget(WidgetType::Checkbox).value_type(ValueType::Boolean),
///     ColumnDef::new("notes").width(320),
/// ];
/// assert_eq!(columns[2].size, 320);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnDef {
    /// Row field this column reads.
    pub field: String,
    /// Header label.
    pub header: String,
    /// Value type.
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Width in logical units; 0 means "distribute".
    #[serde(alias = "explicitWidth")]
    pub size: u32,
    /// Cell widget.
    pub widget_type: WidgetType,
    #[serde(flatten)]
    pub visibility: Visibility,
    pub sortable: bool,
    pub resizable: bool,
}

impl Default for ColumnDef {
    fn default() -> Self {
        Self {
            field: String::new(),
            header: String::new(),
            value_type: ValueType::String,
            size: 0,
            widget_type: WidgetType::Label,
            visibility: Visibility::default(),
            sortable: true,
            resizable: false,
        }
    }
}

impl ColumnDef {
    /// Create a label column for a field, titled after the field.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            header: title_case(&field),
            field,
            ..Default::default()
        }
    }

    /// Create a reserved structural column.
    pub fn structural(kind: StructuralKind) -> Self {
        Self {
            field: kind.field().to_string(),
            header: String::new(),
            size: kind.default_width(),
            sortable: false,
            ..Default::default()
        }
    }

    /// Set the header label.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Set an explicit width.
    pub fn width(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Set the cell widget.
    pub fn widget(mut self, widget: WidgetType) -> Self {
        self.widget_type = widget;
        self
    }

    /// Set the value type.
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    /// Disable sorting on this column.
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Hide the column at a breakpoint.
    pub fn hidden_on(mut self, breakpoint: Breakpoint) -> Self {
        self.visibility.set(breakpoint, false);
        self
    }

    /// Structural kind, if this is a reserved column.
    pub fn structural_kind(&self) -> Option<StructuralKind> {
        StructuralKind::from_field(&self.field)
    }

    /// Whether this column carries row data.
    pub fn is_data(&self) -> bool {
        self.structural_kind().is_none()
    }
}

/// Where a column list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// Declared by the caller.
    Static,
    /// Inferred from the dataset.
    Dynamic,
}

/// Output of the column model builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnModel {
    pub columns: Vec<ColumnDef>,
    pub source: ColumnSource,
}

impl ColumnModel {
    /// Whether columns are inferred from data.
    ///
    /// Stays true for an empty inferred list so callers can tell "no columns
    /// yet" apart from "no columns intended".
    pub fn is_dynamic(&self) -> bool {
        self.source == ColumnSource::Dynamic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_tag_round_trip() {
        assert_eq!(WidgetType::from_tag("Anchor"), WidgetType::Link);
        assert_eq!(
            WidgetType::from_tag("rating"),
            WidgetType::Unknown("rating".into())
        );
        assert_eq!(String::from(WidgetType::Unknown("rating".into())), "rating");
    }

    #[test]
    fn test_column_deserializes_from_config() {
        let column: ColumnDef = serde_json::from_str(
            r#"{"field":"active","widgetType":"checkbox","explicitWidth":80,"visibleOnMobile":false}"#,
        )
        .unwrap();
        assert_eq!(column.widget_type, WidgetType::Checkbox);
        assert_eq!(column.size, 80);
        assert!(!column.visibility.visible_on_mobile);
        assert!(column.visibility.visible_on_desktop);
        assert!(column.sortable);
    }

    #[test]
    fn test_structural_lookup() {
        let column = ColumnDef::structural(StructuralKind::Actions);
        assert_eq!(column.structural_kind(), Some(StructuralKind::Actions));
        assert_eq!(column.size, 60);
        assert!(!column.is_data());
        assert!(ColumnDef::new("name").is_data());
    }
}
