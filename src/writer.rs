use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info};
use umya_spreadsheet::Spreadsheet;
use umya_spreadsheet::structs::PatternValues;

use crate::address::column_name;
use crate::layout::{CellStyle, Fill, TemplateLayout};

fn to_umya_style(style: &CellStyle) -> umya_spreadsheet::Style {
    let mut out = umya_spreadsheet::Style::default();
    if style.bold {
        out.get_font_mut().set_bold(true);
    }
    if let Some(Fill::Solid { argb }) = &style.fill {
        let pattern = out.get_fill_mut().get_pattern_fill_mut();
        pattern.set_pattern_type(PatternValues::Solid);
        pattern.get_foreground_color_mut().set_argb(argb);
        pattern.get_background_color_mut().set_argb(argb);
    }
    out
}

/// Builds the workbook for `layout`: one sheet, its cells and styles,
/// column widths and the named ranges as absolute sheet-qualified formulas.
pub fn render(layout: &TemplateLayout) -> Result<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| anyhow!("新建工作簿中没有工作表"))?;
    if sheet.get_name() != layout.sheet_name() {
        sheet.set_name(layout.sheet_name());
    }

    for (cell_ref, content) in layout.cells() {
        let addr = cell_ref.to_string();
        let cell = sheet.get_cell_mut(addr.as_str());
        cell.set_value(content.value());
        if let Some(style) = content.style() {
            cell.set_style(to_umya_style(style));
        }
        debug!(cell = %addr, value = %content.value(), "cell written");
    }

    for (col, width) in layout.column_widths() {
        let letters = column_name(col);
        sheet
            .get_column_dimension_mut(letters.as_str())
            .set_width(width);
    }

    for range in layout.named_ranges() {
        let formula = range.target.formula();
        sheet
            .add_defined_name(range.name.as_str(), formula.as_str())
            .map_err(|e| anyhow!("无法添加命名区域 {} -> {formula}: {e}", range.name))?;
        debug!(name = %range.name, %formula, "named range registered");
    }

    Ok(book)
}

/// Creates the parent directory chain of `path`; fine if it already exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .with_context(|| format!("无法创建目录: {}", dir.display())),
        _ => Ok(()),
    }
}

/// Renders `layout` and writes it to `path`, replacing any existing file.
pub fn write_layout(layout: &TemplateLayout, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let book = render(layout)?;
    umya_spreadsheet::writer::xlsx::write(&book, path)
        .with_context(|| format!("无法保存文件: {}", path.display()))?;
    info!(path = %path.display(), "template written");
    Ok(())
}
