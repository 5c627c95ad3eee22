//! In-memory model of a template sheet: cell contents, named ranges and
//! column widths. Nothing here touches the xlsx format; see [`crate::writer`].

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::address::{AddressError, Area, CellRef, SheetTarget, Target, column_index};

pub const SHEET_NAME: &str = "Sheet1";

/// Fill colour of the item table header. Lowercase so umya keeps it as `rgb`
/// instead of folding it into an indexed palette entry.
pub const TABLE_HEADER_ARGB: &str = "ffcccccc";

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("named range {name:?} points at sheet {sheet:?}, layout only has {expected:?}")]
    UnknownSheet {
        name: String,
        sheet: String,
        expected: String,
    },
    #[error("invalid column {0:?}")]
    InvalidColumn(String),
    #[error("invalid width {width} for column {column}")]
    InvalidWidth { column: String, width: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    Solid { argb: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellStyle {
    pub bold: bool,
    pub fill: Option<Fill>,
}

impl CellStyle {
    pub fn bold() -> Self {
        CellStyle {
            bold: true,
            fill: None,
        }
    }

    pub fn with_solid_fill(mut self, argb: impl Into<String>) -> Self {
        self.fill = Some(Fill::Solid { argb: argb.into() });
        self
    }
}

/// A `${identifier}` marker resolved later by the template engine. The
/// identifier is not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    identifier: String,
}

impl Placeholder {
    pub fn new(identifier: impl Into<String>) -> Self {
        Placeholder {
            identifier: identifier.into(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn token(&self) -> String {
        format!("${{{}}}", self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    Text(String),
    StyledText { text: String, style: CellStyle },
    Placeholder(Placeholder),
}

impl CellContent {
    pub fn text(text: impl Into<String>) -> Self {
        CellContent::Text(text.into())
    }

    pub fn styled(text: impl Into<String>, style: CellStyle) -> Self {
        CellContent::StyledText {
            text: text.into(),
            style,
        }
    }

    pub fn placeholder(identifier: impl Into<String>) -> Self {
        CellContent::Placeholder(Placeholder::new(identifier))
    }

    /// The string stored in the cell.
    pub fn value(&self) -> String {
        match self {
            CellContent::Text(text) | CellContent::StyledText { text, .. } => text.clone(),
            CellContent::Placeholder(placeholder) => placeholder.token(),
        }
    }

    pub fn style(&self) -> Option<&CellStyle> {
        match self {
            CellContent::StyledText { style, .. } => Some(style),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRange {
    pub name: String,
    pub target: SheetTarget,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLayout {
    sheet: String,
    cells: BTreeMap<CellRef, CellContent>,
    names: Vec<NamedRange>,
    widths: BTreeMap<u32, f64>,
}

impl TemplateLayout {
    pub fn new(sheet: impl Into<String>) -> Self {
        TemplateLayout {
            sheet: sheet.into(),
            cells: BTreeMap::new(),
            names: Vec::new(),
            widths: BTreeMap::new(),
        }
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet
    }

    pub fn set_cell(&mut self, addr: &str, content: CellContent) -> Result<(), LayoutError> {
        let cell = CellRef::parse(addr)?;
        self.cells.insert(cell, content);
        Ok(())
    }

    pub fn cell(&self, addr: &str) -> Option<&CellContent> {
        let cell = CellRef::parse(addr).ok()?;
        self.cells.get(&cell)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (&CellRef, &CellContent)> {
        self.cells.iter()
    }

    /// Registers `name`. Reusing a name replaces the earlier target and keeps
    /// its position in the list.
    pub fn define_name(
        &mut self,
        name: impl Into<String>,
        target: SheetTarget,
        description: impl Into<String>,
    ) -> Result<(), LayoutError> {
        let name = name.into();
        if target.sheet != self.sheet {
            return Err(LayoutError::UnknownSheet {
                name,
                sheet: target.sheet,
                expected: self.sheet.clone(),
            });
        }
        let range = NamedRange {
            name,
            target,
            description: description.into(),
        };
        match self.names.iter_mut().find(|n| n.name == range.name) {
            Some(existing) => {
                warn!(
                    name = %range.name,
                    old = %existing.target,
                    new = %range.target,
                    "named range redefined"
                );
                *existing = range;
            }
            None => self.names.push(range),
        }
        Ok(())
    }

    pub fn named_range(&self, name: &str) -> Option<&NamedRange> {
        self.names.iter().find(|n| n.name == name)
    }

    pub fn named_ranges(&self) -> &[NamedRange] {
        &self.names
    }

    pub fn set_column_width(&mut self, column: &str, width: f64) -> Result<(), LayoutError> {
        let index = column_index(column)
            .filter(|&i| i <= crate::address::MAX_COLUMN)
            .ok_or_else(|| LayoutError::InvalidColumn(column.to_string()))?;
        if !width.is_finite() || width <= 0.0 {
            return Err(LayoutError::InvalidWidth {
                column: column.to_string(),
                width,
            });
        }
        self.widths.insert(index, width);
        Ok(())
    }

    pub fn column_width(&self, column: &str) -> Option<f64> {
        self.widths.get(&column_index(column)?).copied()
    }

    /// `(1-based column, width)` pairs, left to right.
    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.widths.iter().map(|(&col, &width)| (col, width))
    }
}

/// The example template: customer header, placeholders and an item table.
pub fn example() -> Result<TemplateLayout, LayoutError> {
    let mut layout = TemplateLayout::new(SHEET_NAME);
    write_header_cells(&mut layout)?;
    write_placeholder_cells(&mut layout)?;
    write_table_header(&mut layout)?;
    register_named_ranges(&mut layout)?;
    set_column_widths(&mut layout)?;
    debug!(
        cells = layout.cells.len(),
        names = layout.names.len(),
        "example layout built"
    );
    Ok(layout)
}

fn write_header_cells(layout: &mut TemplateLayout) -> Result<(), LayoutError> {
    layout.set_cell("A1", CellContent::styled("Customer Name", CellStyle::bold()))?;
    layout.set_cell("B1", CellContent::styled("Date", CellStyle::bold()))
}

fn write_placeholder_cells(layout: &mut TemplateLayout) -> Result<(), LayoutError> {
    layout.set_cell("A2", CellContent::placeholder("customerName"))?;
    layout.set_cell("B2", CellContent::placeholder("orderDate"))
}

fn write_table_header(layout: &mut TemplateLayout) -> Result<(), LayoutError> {
    let style = CellStyle::bold().with_solid_fill(TABLE_HEADER_ARGB);
    for (addr, title) in [("A4", "Item"), ("B4", "Qty"), ("C4", "Price")] {
        layout.set_cell(addr, CellContent::styled(title, style.clone()))?;
    }
    Ok(())
}

fn register_named_ranges(layout: &mut TemplateLayout) -> Result<(), LayoutError> {
    let single = |addr: &str| -> Result<SheetTarget, LayoutError> {
        Ok(SheetTarget::new(SHEET_NAME, CellRef::parse(addr)?))
    };

    layout.define_name(
        "customerName",
        single("A2")?,
        "FreeMarker: ${customerName}",
    )?;
    layout.define_name("orderDate", single("B2")?, "FreeMarker: ${orderDate}")?;
    layout.define_name(
        "items",
        SheetTarget::new(SHEET_NAME, Target::Area(Area::parse("A5:C10")?)),
        "table area",
    )
}

fn set_column_widths(layout: &mut TemplateLayout) -> Result<(), LayoutError> {
    layout.set_column_width("A", 15.0)?;
    layout.set_column_width("B", 15.0)?;
    layout.set_column_width("C", 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_token_is_opaque() {
        assert_eq!(Placeholder::new("customerName").token(), "${customerName}");
        // not validated
        assert_eq!(Placeholder::new("a b}").token(), "${a b}}");
    }

    #[test]
    fn example_cells() {
        let layout = example().unwrap();
        let value = |addr: &str| layout.cell(addr).map(CellContent::value);

        assert_eq!(layout.sheet_name(), "Sheet1");
        assert_eq!(value("A1").as_deref(), Some("Customer Name"));
        assert_eq!(value("B1").as_deref(), Some("Date"));
        assert_eq!(value("A2").as_deref(), Some("${customerName}"));
        assert_eq!(value("B2").as_deref(), Some("${orderDate}"));
        assert_eq!(value("A4").as_deref(), Some("Item"));
        assert_eq!(value("B4").as_deref(), Some("Qty"));
        assert_eq!(value("C4").as_deref(), Some("Price"));
        assert_eq!(layout.cells().count(), 7);
    }

    #[test]
    fn example_styles() {
        let layout = example().unwrap();
        let style = |addr: &str| layout.cell(addr).and_then(CellContent::style).cloned();

        assert_eq!(style("A1"), Some(CellStyle::bold()));
        assert_eq!(style("B1"), Some(CellStyle::bold()));
        assert_eq!(style("A2"), None);
        for addr in ["A4", "B4", "C4"] {
            let style = style(addr).unwrap();
            assert!(style.bold);
            assert_eq!(
                style.fill,
                Some(Fill::Solid {
                    argb: TABLE_HEADER_ARGB.to_string()
                })
            );
        }
    }

    #[test]
    fn example_named_ranges() {
        let layout = example().unwrap();
        let formulas: Vec<_> = layout
            .named_ranges()
            .iter()
            .map(|n| (n.name.as_str(), n.target.formula()))
            .collect();
        assert_eq!(
            formulas,
            [
                ("customerName", "Sheet1!$A$2".to_string()),
                ("orderDate", "Sheet1!$B$2".to_string()),
                ("items", "Sheet1!$A$5:$C$10".to_string()),
            ]
        );
    }

    #[test]
    fn example_widths() {
        let layout = example().unwrap();
        assert_eq!(layout.column_width("A"), Some(15.0));
        assert_eq!(layout.column_width("B"), Some(15.0));
        assert_eq!(layout.column_width("C"), Some(12.0));
        assert_eq!(layout.column_width("D"), None);
    }

    #[test]
    fn redefining_a_name_replaces_it_in_place() {
        let mut layout = example().unwrap();
        let moved = SheetTarget::new(SHEET_NAME, CellRef::parse("D2").unwrap());
        layout
            .define_name("customerName", moved.clone(), "moved")
            .unwrap();

        assert_eq!(layout.named_ranges().len(), 3);
        assert_eq!(layout.named_ranges()[0].name, "customerName");
        assert_eq!(layout.named_range("customerName").unwrap().target, moved);
    }

    #[test]
    fn names_must_target_the_layout_sheet() {
        let mut layout = TemplateLayout::new("Sheet1");
        let err = layout
            .define_name(
                "elsewhere",
                SheetTarget::new("Other", CellRef::parse("A1").unwrap()),
                "",
            )
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownSheet { .. }));
        assert!(layout.named_ranges().is_empty());
    }

    #[test]
    fn rejects_bad_cells_and_widths() {
        let mut layout = TemplateLayout::new("Sheet1");
        assert!(matches!(
            layout.set_cell("A0", CellContent::text("x")),
            Err(LayoutError::Address(_))
        ));
        assert!(matches!(
            layout.set_column_width("1", 10.0),
            Err(LayoutError::InvalidColumn(_))
        ));
        assert!(matches!(
            layout.set_column_width("A", 0.0),
            Err(LayoutError::InvalidWidth { .. })
        ));
        assert!(matches!(
            layout.set_column_width("A", f64::NAN),
            Err(LayoutError::InvalidWidth { .. })
        ));
    }
}
