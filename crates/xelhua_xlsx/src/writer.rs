//! XLSX writer kernel that serializes the workbook model through `rust_xlsxwriter`.
//!
//! Every style in the workbook table becomes one [`Format`]; cells carry
//! their style index into that list. Output is always OOXML.

use std::io::{Seek, Write};
use std::path::Path;

use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, FormatUnderline, Formula, Note,
    Workbook as XlsxWorkbook, Worksheet,
};
use tracing::{debug, info};

use crate::conf::{STR_FONT_NAME_DEFAULT, STR_NUM_FORMAT_GENERAL};
use crate::model::{Cell, Sheet, Workbook};
use crate::spec::{
    EnumBorderStyle, EnumCellValue, EnumFillPattern, EnumHorizontalAlignment, EnumIndexedColor,
    EnumVerticalAlignment, Result, SpecCellStyle,
};
use crate::style::StyleTable;

const N_FONT_SIZE_DEFAULT: f64 = 11.0;

////////////////////////////////////////////////////////////////////////////////
// #region WorkbookSave

/// Serialize the workbook into a seekable stream.
pub fn write_workbook<W: Write + Seek + Send>(workbook: &Workbook, writer: W) -> Result<()> {
    let mut book = derive_xlsx_workbook(workbook)?;
    book.save_to_writer(writer)?;
    Ok(())
}

/// Serialize the workbook to `path`, replacing any existing file.
pub fn save_workbook(workbook: &Workbook, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let mut book = derive_xlsx_workbook(workbook)?;
    book.save(path)?;
    info!(path = %path.display(), sheets = workbook.num_sheets(), "workbook saved");
    Ok(())
}

/// Serialize the workbook into memory.
pub fn workbook_to_buffer(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut book = derive_xlsx_workbook(workbook)?;
    Ok(book.save_to_buffer()?)
}

fn derive_xlsx_workbook(workbook: &Workbook) -> Result<XlsxWorkbook> {
    let mut book = XlsxWorkbook::new();
    let styles = workbook.styles();
    let l_formats: Vec<Format> = styles
        .styles()
        .iter()
        .map(|style| derive_rust_xlsx_format(style, styles))
        .collect();

    for sheet in workbook.sheets() {
        let worksheet = book.add_worksheet();
        worksheet.set_name(sheet.name())?;
        write_sheet(worksheet, sheet, &l_formats)?;
    }
    Ok(book)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetWrite

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, formats: &[Format]) -> Result<()> {
    if let Some(n_height) = sheet.default_row_height() {
        worksheet.set_default_row_height(n_height);
    }
    if let Some(n_width) = sheet.default_column_width()
        && let Some(n_col_last) = sheet.last_col_num()
    {
        for n_col in 0..=n_col_last {
            if sheet.explicit_column_width(n_col).is_none() {
                worksheet.set_column_width(n_col, n_width)?;
            }
        }
    }
    for (n_col, n_width) in sheet.column_widths() {
        worksheet.set_column_width(n_col, n_width)?;
    }

    // Merges go first: the anchor cell is rewritten with its real value below.
    for region in sheet.merged_regions() {
        let fmt_anchor = sheet
            .cell(region.first_row, region.first_col)
            .map_or(&formats[0], |cell| derive_cell_format(formats, cell));
        worksheet.merge_range(
            region.first_row,
            region.first_col,
            region.last_row,
            region.last_col,
            "",
            fmt_anchor,
        )?;
    }

    let mut n_rows = 0usize;
    let mut n_cells = 0usize;
    for row in sheet.rows() {
        if let Some(n_height) = row.height() {
            worksheet.set_row_height(row.row_num(), n_height)?;
        }
        for cell in row.cells().filter(|cell| !is_cell_skipped(cell)) {
            write_cell_with_format(worksheet, cell, derive_cell_format(formats, cell))?;
            n_cells += 1;
        }
        n_rows += 1;
    }

    debug!(
        sheet = sheet.name(),
        rows = n_rows,
        cells = n_cells,
        merges = sheet.merged_regions().len(),
        "sheet written"
    );
    Ok(())
}

/// Unstyled blank cells without a note carry nothing to serialize.
fn is_cell_skipped(cell: &Cell) -> bool {
    *cell.value() == EnumCellValue::Blank && cell.style() == 0 && cell.comment().is_none()
}

fn derive_cell_format<'a>(formats: &'a [Format], cell: &Cell) -> &'a Format {
    formats.get(cell.style()).unwrap_or(&formats[0])
}

fn write_cell_with_format(worksheet: &mut Worksheet, cell: &Cell, format: &Format) -> Result<()> {
    let n_row = cell.row_index();
    let n_col = cell.column_index();
    match cell.value() {
        EnumCellValue::Blank => {
            worksheet.write_blank(n_row, n_col, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, format)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, format)?;
        }
        EnumCellValue::Formula { expr, cached } => {
            let mut formula = Formula::new(expr);
            if let Some(value) = cached.as_deref() {
                formula = formula.set_result(derive_formula_result(value));
            }
            worksheet.write_formula_with_format(n_row, n_col, formula, format)?;
        }
        EnumCellValue::Error(val) => {
            worksheet.write_string_with_format(n_row, n_col, val.code(), format)?;
        }
    }

    if let Some(comment) = cell.comment() {
        let mut note = Note::new(&comment.text).add_author_prefix(false);
        if let Some(c_author) = &comment.author {
            note = note.set_author(c_author);
        }
        worksheet.insert_note(n_row, n_col, &note)?;
    }
    Ok(())
}

fn derive_formula_result(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        other => other.to_text(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormatMapping

fn derive_rust_xlsx_format(style: &SpecCellStyle, styles: &StyleTable) -> Format {
    let mut format = Format::new();

    if let Some(font) = styles.font_at(style.font) {
        if font.name != STR_FONT_NAME_DEFAULT {
            format = format.set_font_name(font.name.as_str());
        }
        if font.height_points() != N_FONT_SIZE_DEFAULT {
            format = format.set_font_size(font.height_points());
        }
        if font.bold {
            format = format.set_bold();
        }
        if font.italic {
            format = format.set_italic();
        }
        if font.strikeout {
            format = format.set_font_strikethrough();
        }
        if font.underline {
            format = format.set_underline(FormatUnderline::Single);
        }
        if let Some(val) = derive_color(font.color) {
            format = format.set_font_color(val);
        }
    }

    if let Some(align) = derive_format_align(style.align) {
        format = format.set_align(align);
    }
    if let Some(align) = derive_format_valign(style.valign) {
        format = format.set_align(align);
    }

    if style.num_format != STR_NUM_FORMAT_GENERAL {
        format = format.set_num_format(style.num_format.as_str());
    }

    match style.fill_pattern {
        EnumFillPattern::None => {}
        EnumFillPattern::Solid => {
            if let Some(val) = derive_color(style.fill_foreground) {
                format = format.set_background_color(val);
            }
        }
        pattern => {
            format = format.set_pattern(derive_format_pattern(pattern));
            if let Some(val) = derive_color(style.fill_foreground) {
                format = format.set_foreground_color(val);
            }
            if let Some(val) = derive_color(style.fill_background) {
                format = format.set_background_color(val);
            }
        }
    }

    if style.border_top != EnumBorderStyle::None {
        format = format.set_border_top(derive_format_border(style.border_top));
    }
    if style.border_bottom != EnumBorderStyle::None {
        format = format.set_border_bottom(derive_format_border(style.border_bottom));
    }
    if style.border_left != EnumBorderStyle::None {
        format = format.set_border_left(derive_format_border(style.border_left));
    }
    if style.border_right != EnumBorderStyle::None {
        format = format.set_border_right(derive_format_border(style.border_right));
    }
    if let Some(val) = derive_color(style.border_top_color) {
        format = format.set_border_top_color(val);
    }
    if let Some(val) = derive_color(style.border_bottom_color) {
        format = format.set_border_bottom_color(val);
    }
    if let Some(val) = derive_color(style.border_left_color) {
        format = format.set_border_left_color(val);
    }
    if let Some(val) = derive_color(style.border_right_color) {
        format = format.set_border_right_color(val);
    }

    if style.wrap_text {
        format = format.set_text_wrap();
    }

    format
}

fn derive_color(color: EnumIndexedColor) -> Option<Color> {
    color.rgb().map(Color::RGB)
}

fn derive_format_border(border: EnumBorderStyle) -> FormatBorder {
    match border {
        EnumBorderStyle::None => FormatBorder::None,
        EnumBorderStyle::Thin => FormatBorder::Thin,
        EnumBorderStyle::Medium => FormatBorder::Medium,
        EnumBorderStyle::Dashed => FormatBorder::Dashed,
        EnumBorderStyle::Dotted => FormatBorder::Dotted,
        EnumBorderStyle::Thick => FormatBorder::Thick,
        EnumBorderStyle::Double => FormatBorder::Double,
        EnumBorderStyle::Hair => FormatBorder::Hair,
        EnumBorderStyle::MediumDashed => FormatBorder::MediumDashed,
        EnumBorderStyle::DashDot => FormatBorder::DashDot,
        EnumBorderStyle::MediumDashDot => FormatBorder::MediumDashDot,
        EnumBorderStyle::DashDotDot => FormatBorder::DashDotDot,
        EnumBorderStyle::MediumDashDotDot => FormatBorder::MediumDashDotDot,
        EnumBorderStyle::SlantDashDot => FormatBorder::SlantDashDot,
    }
}

fn derive_format_align(align: EnumHorizontalAlignment) -> Option<FormatAlign> {
    match align {
        EnumHorizontalAlignment::General => None,
        EnumHorizontalAlignment::Left => Some(FormatAlign::Left),
        EnumHorizontalAlignment::Center => Some(FormatAlign::Center),
        EnumHorizontalAlignment::Right => Some(FormatAlign::Right),
        EnumHorizontalAlignment::Fill => Some(FormatAlign::Fill),
        EnumHorizontalAlignment::Justify => Some(FormatAlign::Justify),
        EnumHorizontalAlignment::CenterSelection => Some(FormatAlign::CenterAcross),
        EnumHorizontalAlignment::Distributed => Some(FormatAlign::Distributed),
    }
}

fn derive_format_valign(align: EnumVerticalAlignment) -> Option<FormatAlign> {
    match align {
        EnumVerticalAlignment::Bottom => None,
        EnumVerticalAlignment::Top => Some(FormatAlign::Top),
        EnumVerticalAlignment::Center => Some(FormatAlign::VerticalCenter),
        EnumVerticalAlignment::Justify => Some(FormatAlign::VerticalJustify),
        EnumVerticalAlignment::Distributed => Some(FormatAlign::VerticalDistributed),
    }
}

fn derive_format_pattern(pattern: EnumFillPattern) -> FormatPattern {
    match pattern {
        EnumFillPattern::None => FormatPattern::None,
        EnumFillPattern::Solid => FormatPattern::Solid,
        EnumFillPattern::MediumGray => FormatPattern::MediumGray,
        EnumFillPattern::DarkGray => FormatPattern::DarkGray,
        EnumFillPattern::LightGray => FormatPattern::LightGray,
        EnumFillPattern::DarkHorizontal => FormatPattern::DarkHorizontal,
        EnumFillPattern::DarkVertical => FormatPattern::DarkVertical,
        EnumFillPattern::DarkDown => FormatPattern::DarkDown,
        EnumFillPattern::DarkUp => FormatPattern::DarkUp,
        EnumFillPattern::DarkGrid => FormatPattern::DarkGrid,
        EnumFillPattern::DarkTrellis => FormatPattern::DarkTrellis,
        EnumFillPattern::LightHorizontal => FormatPattern::LightHorizontal,
        EnumFillPattern::LightVertical => FormatPattern::LightVertical,
        EnumFillPattern::LightDown => FormatPattern::LightDown,
        EnumFillPattern::LightUp => FormatPattern::LightUp,
        EnumFillPattern::LightGrid => FormatPattern::LightGrid,
        EnumFillPattern::LightTrellis => FormatPattern::LightTrellis,
        EnumFillPattern::Gray125 => FormatPattern::Gray125,
        EnumFillPattern::Gray0625 => FormatPattern::Gray0625,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{get_cell_at, get_sheet};
    use crate::spec::SpecComment;
    use crate::style::{CellStyleBuilder, FontBuilder};

    #[test]
    fn test_format_mapping_skips_defaults() {
        let styles = StyleTable::new();
        let format = derive_rust_xlsx_format(&SpecCellStyle::default(), &styles);
        assert_eq!(format, Format::new());
    }

    #[test]
    fn test_format_mapping_carries_font_fill_and_borders() {
        let mut styles = StyleTable::new();
        let n_font = FontBuilder::new()
            .name("Arial")
            .bold(true)
            .height(14.0)
            .color(EnumIndexedColor::Red)
            .build(&mut styles)
            .unwrap();
        let n_style = CellStyleBuilder::new()
            .font(n_font)
            .background(EnumIndexedColor::Yellow)
            .border(EnumBorderStyle::Thin)
            .align(EnumHorizontalAlignment::Center)
            .build(&mut styles)
            .unwrap();

        let format = derive_rust_xlsx_format(styles.style_at(n_style).unwrap(), &styles);
        let expected = Format::new()
            .set_font_name("Arial")
            .set_font_size(14.0)
            .set_bold()
            .set_font_color(Color::RGB(0xFF0000))
            .set_align(FormatAlign::Center)
            .set_background_color(Color::RGB(0xFFFF00))
            .set_border_top(FormatBorder::Thin)
            .set_border_bottom(FormatBorder::Thin)
            .set_border_left(FormatBorder::Thin)
            .set_border_right(FormatBorder::Thin);
        assert_eq!(format, expected);
    }

    #[test]
    fn test_only_styled_or_noted_blanks_are_written() {
        let mut workbook = Workbook::new();
        let n_style = CellStyleBuilder::new()
            .background(EnumIndexedColor::Yellow)
            .build(workbook.styles_mut())
            .unwrap();
        let sheet = get_sheet(&mut workbook, "Blanks").unwrap();
        get_cell_at(sheet, 0, 0).unwrap();
        get_cell_at(sheet, 0, 1).unwrap().set_style(n_style);
        get_cell_at(sheet, 0, 2)
            .unwrap()
            .set_comment(Some(SpecComment::new("empty")));
        get_cell_at(sheet, 0, 3).unwrap().set_string("");

        let row = sheet.row(0).unwrap();
        let l_skipped: Vec<bool> = row.cells().map(is_cell_skipped).collect();
        assert_eq!(l_skipped, vec![true, false, false, false]);
        assert_eq!(&workbook_to_buffer(&workbook).unwrap()[..2], b"PK");
    }

    #[test]
    fn test_buffer_and_file_output() {
        let mut workbook = Workbook::new();
        let sheet = get_sheet(&mut workbook, "Out").unwrap();
        get_cell_at(sheet, 0, 0).unwrap().set_string("a");
        get_cell_at(sheet, 0, 0)
            .unwrap()
            .set_comment(Some(SpecComment::new("note").with_author("Elex")));
        get_cell_at(sheet, 1, 1).unwrap().set_formula("=A1", None);
        sheet.set_default_column_width(12.0).unwrap();
        sheet.row_or_create(3).unwrap().set_height(30.0).unwrap();

        let l_bytes = workbook_to_buffer(&workbook).unwrap();
        assert_eq!(&l_bytes[..2], b"PK");

        let tmp = tempfile::tempdir().unwrap();
        let path_out = tmp.path().join("out.xlsx");
        save_workbook(&workbook, &path_out).unwrap();
        assert!(std::fs::metadata(&path_out).unwrap().len() > 0);

        let mut cursor = std::io::Cursor::new(Vec::new());
        write_workbook(&workbook, &mut cursor).unwrap();
        assert!(!cursor.into_inner().is_empty());
    }
}
