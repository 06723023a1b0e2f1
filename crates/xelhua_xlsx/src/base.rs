//! Workbook helper surface: get-or-create navigation, typed reads/writes,
//! merging, sizing and saving.
//!
//! Every helper operates on the model types in [`crate::model`]; functions
//! that need number formats take the workbook [`StyleTable`] explicitly, which
//! pairs with [`Workbook::sheet_and_styles_mut`].

use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::conf::{STR_FMT_DATE_DEFAULT, STR_FMT_DATE_TIME_DEFAULT, derive_default_autofit_policy};
use crate::model::{Cell, Row, Sheet, Workbook};
use crate::reader::{read_workbook, read_workbook_from_reader};
use crate::spec::{
    EnumCellType, EnumCellValue, EnumWorkbookKind, Result, SpecCellRange, SpecComment, XelhuaError,
};
use crate::style::StyleTable;
use crate::util::{
    cast_col_num, convert_date_time_to_serial, convert_date_to_serial,
    convert_serial_to_date_time, estimate_unicode_string_width, format_number_label,
    is_date_format, parse_cell_reference,
};
use crate::writer::{save_workbook, write_workbook};

////////////////////////////////////////////////////////////////////////////////
// #region WorkbookAccess

/// Open a workbook file; `.xls` selects the legacy reader, anything else OOXML.
pub fn get_workbook(path: impl AsRef<Path>) -> Result<Workbook> {
    read_workbook(path)
}

/// Open a legacy `.xls` workbook from a stream.
pub fn get_xls_workbook<R: Read + Seek>(reader: R) -> Result<Workbook> {
    read_workbook_from_reader(reader, EnumWorkbookKind::Xls)
}

/// Open an `.xlsx` workbook from a stream.
pub fn get_xlsx_workbook<R: Read + Seek>(reader: R) -> Result<Workbook> {
    read_workbook_from_reader(reader, EnumWorkbookKind::Xlsx)
}

/// Create a new, empty OOXML workbook.
pub fn create_workbook() -> Workbook {
    Workbook::new()
}

/// Named sheet, created when missing.
pub fn get_sheet<'a>(workbook: &'a mut Workbook, name: &str) -> Result<&'a mut Sheet> {
    let n_idx = match workbook.sheet_index(name) {
        Some(val) => val,
        None => workbook.create_sheet(Some(name))?,
    };
    sheet_at_checked(workbook, n_idx)
}

/// Named sheet, or `None`.
pub fn get_sheet_or_none<'a>(workbook: &'a Workbook, name: &str) -> Option<&'a Sheet> {
    workbook.sheet(name)
}

/// Sheet at `index`; a new auto-named sheet is appended when out of range.
pub fn get_sheet_at(workbook: &mut Workbook, index: usize) -> Result<&mut Sheet> {
    let n_idx = if index < workbook.num_sheets() {
        index
    } else {
        workbook.create_sheet(None)?
    };
    sheet_at_checked(workbook, n_idx)
}

/// Sheet at `index`, or `None`.
pub fn get_sheet_at_or_none(workbook: &Workbook, index: usize) -> Option<&Sheet> {
    workbook.sheet_at(index)
}

/// Append a new auto-named sheet.
pub fn create_sheet(workbook: &mut Workbook) -> Result<&mut Sheet> {
    let n_idx = workbook.create_sheet(None)?;
    sheet_at_checked(workbook, n_idx)
}

fn sheet_at_checked(workbook: &mut Workbook, index: usize) -> Result<&mut Sheet> {
    workbook
        .sheet_at_mut(index)
        .ok_or_else(|| XelhuaError::IndexOutOfBounds(format!("sheet index {index}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowAndCellAccess

/// Row at `row_num`, created when missing.
pub fn get_row(sheet: &mut Sheet, row_num: u32) -> Result<&mut Row> {
    sheet.row_or_create(row_num)
}

/// Row at `row_num`, or `None`.
pub fn get_row_or_none(sheet: &Sheet, row_num: u32) -> Option<&Row> {
    sheet.row(row_num)
}

/// Cell at `col_num`, created when missing.
pub fn get_cell(row: &mut Row, col_num: u16) -> Result<&mut Cell> {
    row.cell_or_create(col_num)
}

/// Cell at `col_num`, or `None`.
pub fn get_cell_or_none(row: &Row, col_num: u16) -> Option<&Cell> {
    row.cell(col_num)
}

/// Cell at `(row_num, col_num)`, creating the row and cell when missing.
pub fn get_cell_at(sheet: &mut Sheet, row_num: u32, col_num: u16) -> Result<&mut Cell> {
    sheet.row_or_create(row_num)?.cell_or_create(col_num)
}

/// Cell of row `row_num` in the column whose header (in `header_row_num`) reads `name`.
///
/// Header labels: numbers use their shortest decimal text, booleans
/// `true`/`false`, formulas their cached string, everything else the empty
/// string. The first matching column wins.
pub fn get_cell_by_header<'a>(
    sheet: &'a mut Sheet,
    row_num: u32,
    name: &str,
    header_row_num: u32,
) -> Result<&'a mut Cell> {
    let n_col = sheet
        .row(header_row_num)
        .and_then(|header_row| {
            header_row
                .cells()
                .find(|cell| derive_header_label(cell).is_some_and(|label| label == name))
        })
        .map(Cell::column_index)
        .ok_or_else(|| XelhuaError::HeaderNotFound(name.to_string()))?;

    get_cell_at(sheet, row_num, n_col)
}

fn derive_header_label(cell: &Cell) -> Option<String> {
    match cell.value() {
        EnumCellValue::Number(n) => Some(format_number_label(*n)),
        EnumCellValue::String(s) => Some(s.clone()),
        EnumCellValue::Boolean(b) => Some(b.to_string()),
        EnumCellValue::Formula { cached, .. } => match cached.as_deref() {
            Some(EnumCellValue::String(s)) => Some(s.clone()),
            None => Some(String::new()),
            Some(_) => None,
        },
        EnumCellValue::Blank | EnumCellValue::Error(_) => Some(String::new()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellRead

/// Value that typed reads look at: the cached result for formulas.
fn derive_effective_value(cell: &Cell) -> Option<&EnumCellValue> {
    match cell.value() {
        EnumCellValue::Formula { cached, .. } => cached.as_deref(),
        other => Some(other),
    }
}

fn derive_type_mismatch(cell: &Cell, expected: EnumCellType) -> XelhuaError {
    XelhuaError::CellTypeMismatch {
        expected,
        actual: derive_effective_value(cell)
            .map_or(EnumCellType::Blank, EnumCellValue::cell_type),
        address: cell.address(),
    }
}

/// String value; blank cells read as `""`.
pub fn read_string(cell: &Cell) -> Result<String> {
    match derive_effective_value(cell) {
        Some(EnumCellValue::String(s)) => Ok(s.clone()),
        Some(EnumCellValue::Blank) | None => Ok(String::new()),
        Some(_) => Err(derive_type_mismatch(cell, EnumCellType::String)),
    }
}

/// Numeric value; blank cells read as `0.0`.
pub fn read_numeric(cell: &Cell) -> Result<f64> {
    match derive_effective_value(cell) {
        Some(EnumCellValue::Number(n)) => Ok(*n),
        Some(EnumCellValue::Blank) | None => Ok(0.0),
        Some(_) => Err(derive_type_mismatch(cell, EnumCellType::Numeric)),
    }
}

/// Boolean value; blank cells read as `false`.
pub fn read_boolean(cell: &Cell) -> Result<bool> {
    match derive_effective_value(cell) {
        Some(EnumCellValue::Boolean(b)) => Ok(*b),
        Some(EnumCellValue::Blank) | None => Ok(false),
        Some(_) => Err(derive_type_mismatch(cell, EnumCellType::Boolean)),
    }
}

/// Whether the cell holds a number shown with a date/time number format.
pub fn is_cell_date_formatted(cell: &Cell, styles: &StyleTable) -> bool {
    matches!(derive_effective_value(cell), Some(EnumCellValue::Number(_)))
        && styles
            .style_at(cell.style())
            .is_some_and(|style| is_date_format(&style.num_format))
}

/// Date-time of a date-formatted numeric cell.
pub fn read_date_time(cell: &Cell, styles: &StyleTable) -> Result<NaiveDateTime> {
    if !is_cell_date_formatted(cell, styles) {
        return Err(XelhuaError::NotDateFormatted(cell.address()));
    }
    convert_serial_to_date_time(read_numeric(cell)?)
}

/// Date of a date-formatted numeric cell; the time part is dropped.
pub fn read_date(cell: &Cell, styles: &StyleTable) -> Result<NaiveDate> {
    read_date_time(cell, styles).map(|value| value.date())
}

/// Comment attached to the cell.
pub fn read_comment(cell: &Cell) -> Option<&SpecComment> {
    cell.comment()
}

/// Type of the cell's value.
pub fn get_cell_type(cell: &Cell) -> EnumCellType {
    cell.cell_type()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellWrite

/// Store text in the cell; the style is kept.
pub fn write_string(cell: &mut Cell, value: impl Into<String>) {
    cell.set_string(value);
}

/// Store a number in the cell; the style is kept.
pub fn write_numeric(cell: &mut Cell, value: f64) {
    cell.set_number(value);
}

/// Store a boolean in the cell; the style is kept.
pub fn write_boolean(cell: &mut Cell, value: bool) {
    cell.set_boolean(value);
}

/// Write a formula (leading `=` optional); the cached result is cleared.
pub fn write_formula(cell: &mut Cell, expr: &str) {
    cell.set_formula(expr, None);
}

/// Attach (or with `None`, remove) a comment.
pub fn write_comment(cell: &mut Cell, comment: Option<SpecComment>) {
    cell.set_comment(comment);
}

/// Write a date with the `yyyy-mm-dd` number format.
pub fn write_date(cell: &mut Cell, value: NaiveDate, styles: &mut StyleTable) -> Result<()> {
    write_date_with_format(cell, value, styles, STR_FMT_DATE_DEFAULT)
}

/// Write a date with a custom number format.
///
/// The cell keeps its other style attributes; only the number format changes.
pub fn write_date_with_format(
    cell: &mut Cell,
    value: NaiveDate,
    styles: &mut StyleTable,
    format: &str,
) -> Result<()> {
    let n_serial = convert_date_to_serial(value)?;
    apply_serial_with_format(cell, n_serial, styles, format)
}

/// Write a date-time with the `yyyy-mm-dd hh:mm:ss` number format.
pub fn write_date_time(
    cell: &mut Cell,
    value: NaiveDateTime,
    styles: &mut StyleTable,
) -> Result<()> {
    write_date_time_with_format(cell, value, styles, STR_FMT_DATE_TIME_DEFAULT)
}

/// Write a date-time with a custom number format.
pub fn write_date_time_with_format(
    cell: &mut Cell,
    value: NaiveDateTime,
    styles: &mut StyleTable,
    format: &str,
) -> Result<()> {
    let n_serial = convert_date_time_to_serial(value)?;
    apply_serial_with_format(cell, n_serial, styles, format)
}

fn apply_serial_with_format(
    cell: &mut Cell,
    serial: f64,
    styles: &mut StyleTable,
    format: &str,
) -> Result<()> {
    let n_style = styles.register_number_format(cell.style(), format)?;
    cell.set_style(n_style);
    cell.set_number(serial);
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Layout

/// Merge the inclusive rectangle; returns the merged region index.
pub fn merge_cells(
    sheet: &mut Sheet,
    first_row: u32,
    last_row: u32,
    first_col: u16,
    last_col: u16,
) -> Result<usize> {
    sheet.add_merged_region(SpecCellRange::new(first_row, last_row, first_col, last_col)?)
}

fn parse_address(address: &str) -> Result<(u32, u16)> {
    parse_cell_reference(address)
        .ok_or_else(|| XelhuaError::InvalidRange(format!("invalid cell reference {address:?}")))
}

/// Column width in characters.
pub fn set_width(sheet: &mut Sheet, col_num: u16, chars: f64) -> Result<()> {
    sheet.set_column_width(col_num, chars)
}

/// Width of the column containing the A1 `address`.
pub fn set_width_for_address(sheet: &mut Sheet, address: &str, chars: f64) -> Result<()> {
    let (_, n_col) = parse_address(address)?;
    set_width(sheet, n_col, chars)
}

/// Row height in points.
pub fn set_height(row: &mut Row, points: f64) -> Result<()> {
    row.set_height(points)
}

/// Height of row `row_num` (created when missing).
pub fn set_height_at(sheet: &mut Sheet, row_num: u32, points: f64) -> Result<()> {
    set_height(sheet.row_or_create(row_num)?, points)
}

/// Height of the row containing the A1 `address`.
pub fn set_height_for_address(sheet: &mut Sheet, address: &str, points: f64) -> Result<()> {
    let (n_row, _) = parse_address(address)?;
    set_height_at(sheet, n_row, points)
}

/// Default width of columns without an explicit width.
pub fn set_default_width(sheet: &mut Sheet, chars: f64) -> Result<()> {
    sheet.set_default_column_width(chars)
}

/// Default height of rows without an explicit height.
pub fn set_default_height(sheet: &mut Sheet, points: f64) -> Result<()> {
    sheet.set_default_row_height(points)
}

/// Fit a column's width to its content; returns the width applied.
///
/// Cells inside merged regions spanning several columns are ignored, and a
/// column without measurable content keeps its width.
pub fn auto_width(sheet: &mut Sheet, styles: &StyleTable, col_num: u16) -> Result<Option<f64>> {
    cast_col_num(col_num as usize)?;
    let policy = derive_default_autofit_policy();

    let n_width_max = sheet
        .rows()
        .filter_map(|row| row.cell(col_num))
        .filter(|cell| {
            !sheet.merged_regions().iter().any(|region| {
                region.first_col != region.last_col
                    && region.contains(cell.row_index(), cell.column_index())
            })
        })
        .map(|cell| estimate_cell_width(cell, styles))
        .max()
        .unwrap_or(0);
    if n_width_max == 0 {
        return Ok(None);
    }

    let n_width = (n_width_max + policy.width_cell_padding)
        .clamp(policy.width_cell_min, policy.width_cell_max) as f64;
    debug!(sheet = sheet.name(), col = col_num, width = n_width, "auto width");
    sheet.set_column_width(col_num, n_width)?;
    Ok(Some(n_width))
}

/// Fit the column containing the A1 `address`.
pub fn auto_width_for_address(
    sheet: &mut Sheet,
    styles: &StyleTable,
    address: &str,
) -> Result<Option<f64>> {
    let (_, n_col) = parse_address(address)?;
    auto_width(sheet, styles, n_col)
}

/// Fit every column that has a cell in the first row (row 0 is created if missing).
pub fn auto_width_all(sheet: &mut Sheet, styles: &StyleTable) -> Result<()> {
    let l_cols: Vec<u16> = sheet
        .row_or_create(0)?
        .cells()
        .map(Cell::column_index)
        .collect();
    for n_col in l_cols {
        auto_width(sheet, styles, n_col)?;
    }
    Ok(())
}

fn estimate_cell_width(cell: &Cell, styles: &StyleTable) -> usize {
    let style = styles.style_at(cell.style());
    let n_width = match (cell.value(), style) {
        (EnumCellValue::Number(_), Some(style)) if is_date_format(&style.num_format) => {
            estimate_unicode_string_width(&style.num_format.replace(['"', '\\'], ""))
        }
        _ => estimate_unicode_string_width(&cell.display_text()),
    };
    let n_scale = style
        .and_then(|style| styles.font_at(style.font))
        .map_or(1.0, |font| {
            let n_bold = if font.bold { 1.1 } else { 1.0 };
            n_bold * font.height_points() / 11.0
        });
    (n_width as f64 * n_scale.max(1.0)).ceil() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Save

/// Save the workbook as `.xlsx` into a seekable stream.
pub fn write_out<W: Write + Seek + Send>(workbook: &Workbook, writer: W) -> Result<()> {
    write_workbook(workbook, writer)
}

/// Save the workbook as `.xlsx` at exactly `path`.
pub fn write_out_file(workbook: &Workbook, path: impl AsRef<Path>) -> Result<()> {
    save_workbook(workbook, path)
}

/// Save the workbook as `.xlsx`, appending the extension when missing and
/// creating parent directories. Returns the final path.
pub fn write_out_named(workbook: &Workbook, file_name: impl AsRef<Path>) -> Result<PathBuf> {
    let path_in = file_name.as_ref();
    let c_ext = EnumWorkbookKind::Xlsx.extension();
    let path_out = if path_in
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(c_ext))
    {
        path_in.to_path_buf()
    } else {
        let mut c_name = path_in.as_os_str().to_owned();
        c_name.push(".");
        c_name.push(c_ext);
        PathBuf::from(c_name)
    };
    if workbook.kind() == EnumWorkbookKind::Xls {
        warn!(path = %path_out.display(), "legacy workbook is saved as xlsx");
    }

    if let Some(parent) = path_out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    save_workbook(workbook, &path_out)?;
    Ok(path_out)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::EnumCellError;
    use crate::style::{CellStyleBuilder, FontBuilder};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_xls_stream_with_garbage_is_read_error() {
        let result = get_xls_workbook(std::io::Cursor::new(b"garbage".to_vec()));
        assert!(matches!(result, Err(XelhuaError::Read(_))));
    }

    #[test]
    fn test_missing_xls_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path_in = tmp.path().join("legacy.xls");
        assert_eq!(
            crate::reader::derive_workbook_kind(&path_in).unwrap(),
            EnumWorkbookKind::Xls
        );
        assert!(matches!(get_workbook(&path_in), Err(XelhuaError::Io(_))));
    }

    #[test]
    fn test_get_sheet_is_get_or_create() {
        let mut workbook = create_workbook();
        get_sheet(&mut workbook, "Test 1").unwrap();
        get_sheet(&mut workbook, "Test 1").unwrap();
        assert_eq!(workbook.num_sheets(), 1);
        assert!(get_sheet_or_none(&workbook, "Missing").is_none());

        assert_eq!(get_sheet_at(&mut workbook, 0).unwrap().name(), "Test 1");
        assert_eq!(get_sheet_at(&mut workbook, 9).unwrap().name(), "Sheet2");
        assert!(get_sheet_at_or_none(&workbook, 9).is_none());
        assert_eq!(create_sheet(&mut workbook).unwrap().name(), "Sheet3");
    }

    #[test]
    fn test_get_row_and_cell_are_get_or_create() {
        let mut workbook = create_workbook();
        let sheet = get_sheet(&mut workbook, "s").unwrap();
        write_string(get_cell(get_row(sheet, 0).unwrap(), 0).unwrap(), "Hello");
        write_numeric(get_cell_at(sheet, 0, 0).unwrap(), 1.5);

        assert!(get_row_or_none(sheet, 1).is_none());
        let row = get_row_or_none(sheet, 0).unwrap();
        assert!(get_cell_or_none(row, 1).is_none());
        assert_eq!(read_numeric(get_cell_or_none(row, 0).unwrap()).unwrap(), 1.5);
    }

    #[test]
    fn test_get_cell_by_header() {
        let mut workbook = create_workbook();
        let sheet = get_sheet(&mut workbook, "s").unwrap();
        write_string(get_cell_at(sheet, 0, 0).unwrap(), "id");
        write_numeric(get_cell_at(sheet, 0, 1).unwrap(), 2.0);
        write_boolean(get_cell_at(sheet, 0, 2).unwrap(), true);
        get_cell_at(sheet, 0, 3)
            .unwrap()
            .set_formula("\"na\"&\"me\"", Some(EnumCellValue::String("name".to_string())));
        write_string(get_cell_at(sheet, 3, 3).unwrap(), "alice");

        assert_eq!(get_cell_by_header(sheet, 3, "name", 0).unwrap().column_index(), 3);
        assert_eq!(get_cell_by_header(sheet, 3, "2.0", 0).unwrap().column_index(), 1);
        assert!(get_cell_by_header(sheet, 3, "2", 0).is_err());
        assert_eq!(get_cell_by_header(sheet, 3, "true", 0).unwrap().column_index(), 2);
        assert_eq!(
            read_string(get_cell_by_header(sheet, 3, "name", 0).unwrap()).unwrap(),
            "alice"
        );
        assert!(matches!(
            get_cell_by_header(sheet, 3, "missing", 0),
            Err(XelhuaError::HeaderNotFound(_))
        ));
        assert!(get_cell_by_header(sheet, 3, "id", 7).is_err());
    }

    #[test]
    fn test_typed_reads_and_mismatches() {
        let mut workbook = create_workbook();
        let sheet = get_sheet(&mut workbook, "s").unwrap();
        let cell = get_cell_at(sheet, 0, 0).unwrap();

        assert_eq!(read_string(cell).unwrap(), "");
        assert_eq!(read_numeric(cell).unwrap(), 0.0);
        assert!(!read_boolean(cell).unwrap());

        write_numeric(cell, 123.45);
        assert_eq!(get_cell_type(cell), EnumCellType::Numeric);
        let result = read_string(cell);
        assert!(matches!(
            result,
            Err(XelhuaError::CellTypeMismatch {
                expected: EnumCellType::String,
                actual: EnumCellType::Numeric,
                ..
            })
        ));

        cell.set_formula("=1=1", Some(EnumCellValue::Boolean(true)));
        assert!(read_boolean(cell).unwrap());
        assert!(read_numeric(cell).is_err());

        cell.set_error(EnumCellError::NA);
        assert!(read_boolean(cell).is_err());
    }

    #[test]
    fn test_date_write_and_read() {
        let mut workbook = create_workbook();
        get_sheet(&mut workbook, "s").unwrap();
        let (sheet, styles) = workbook.sheet_and_styles_mut(0).unwrap();

        let cell = get_cell_at(sheet, 0, 1).unwrap();
        write_date(cell, ymd(2021, 1, 1), styles).unwrap();
        assert_eq!(read_numeric(cell).unwrap(), 44197.0);
        assert_eq!(read_date(cell, styles).unwrap(), ymd(2021, 1, 1));

        let dt = ymd(2021, 1, 1).and_hms_opt(6, 30, 15).unwrap();
        let cell = get_cell_at(sheet, 0, 2).unwrap();
        write_date_time(cell, dt, styles).unwrap();
        assert_eq!(read_date_time(cell, styles).unwrap(), dt);
        assert_eq!(
            styles.style_at(cell.style()).unwrap().num_format,
            "yyyy-mm-dd hh:mm:ss"
        );

        let cell = get_cell_at(sheet, 0, 3).unwrap();
        write_numeric(cell, 44197.0);
        assert!(matches!(
            read_date(cell, styles),
            Err(XelhuaError::NotDateFormatted(_))
        ));
    }

    #[test]
    fn test_date_read_of_huge_serial_is_error() {
        let mut workbook = create_workbook();
        get_sheet(&mut workbook, "s").unwrap();
        let (sheet, styles) = workbook.sheet_and_styles_mut(0).unwrap();

        let cell = get_cell_at(sheet, 0, 0).unwrap();
        write_date(cell, ymd(2021, 1, 1), styles).unwrap();
        write_numeric(cell, 1.0e15);
        assert!(matches!(
            read_date(cell, styles),
            Err(XelhuaError::InvalidDate(_))
        ));
        assert!(read_date_time(cell, styles).is_err());
    }

    #[test]
    fn test_date_write_keeps_existing_style() {
        let mut workbook = create_workbook();
        get_sheet(&mut workbook, "s").unwrap();
        let (sheet, styles) = workbook.sheet_and_styles_mut(0).unwrap();
        let n_font = FontBuilder::new().bold(true).build(styles).unwrap();
        let n_style = CellStyleBuilder::new().font(n_font).build(styles).unwrap();

        let cell = get_cell_at(sheet, 0, 0).unwrap();
        cell.set_style(n_style);
        write_date_with_format(cell, ymd(2020, 2, 29), styles, "dd/mm/yyyy").unwrap();

        let style = styles.style_at(cell.style()).unwrap();
        assert_eq!(style.font, n_font);
        assert_eq!(style.num_format, "dd/mm/yyyy");
    }

    #[test]
    fn test_comments() {
        let mut workbook = create_workbook();
        let sheet = get_sheet(&mut workbook, "s").unwrap();
        let cell = get_cell_at(sheet, 2, 2).unwrap();
        assert!(read_comment(cell).is_none());
        write_comment(cell, Some(SpecComment::new("check").with_author("Elex")));
        assert_eq!(read_comment(cell).unwrap().text, "check");
        assert_eq!(read_comment(cell).unwrap().author.as_deref(), Some("Elex"));
    }

    #[test]
    fn test_layout_helpers() {
        let mut workbook = create_workbook();
        let sheet = get_sheet(&mut workbook, "s").unwrap();

        merge_cells(sheet, 1, 2, 1, 1).unwrap();
        assert!(merge_cells(sheet, 2, 3, 1, 2).is_err());
        assert!(merge_cells(sheet, 3, 2, 1, 1).is_err());

        set_width(sheet, 0, 10.0).unwrap();
        set_width_for_address(sheet, "C1", 12.0).unwrap();
        assert_eq!(sheet.column_width(2), 12.0);
        assert!(set_width_for_address(sheet, "not a ref", 1.0).is_err());

        set_height_at(sheet, 4, 20.0).unwrap();
        set_height_for_address(sheet, "A6", 30.0).unwrap();
        assert_eq!(sheet.row(4).unwrap().height(), Some(20.0));
        assert_eq!(sheet.row(5).unwrap().height(), Some(30.0));

        set_default_width(sheet, 9.0).unwrap();
        set_default_height(sheet, 18.0).unwrap();
        assert_eq!(sheet.default_column_width(), Some(9.0));
        assert_eq!(sheet.default_row_height(), Some(18.0));
    }

    #[test]
    fn test_auto_width() {
        let mut workbook = create_workbook();
        get_sheet(&mut workbook, "s").unwrap();
        let (sheet, styles) = workbook.sheet_and_styles_mut(0).unwrap();

        write_string(get_cell_at(sheet, 0, 0).unwrap(), "Hello");
        write_string(get_cell_at(sheet, 5, 0).unwrap(), "a much longer value");
        write_date(get_cell_at(sheet, 0, 1).unwrap(), ymd(2021, 1, 1), styles).unwrap();
        write_string(get_cell_at(sheet, 0, 2).unwrap(), "merged text that is very wide");
        write_string(get_cell_at(sheet, 1, 2).unwrap(), "x");
        merge_cells(sheet, 0, 0, 2, 3).unwrap();

        auto_width_all(sheet, styles).unwrap();
        assert_eq!(sheet.explicit_column_width(0), Some(20.0));
        assert_eq!(sheet.explicit_column_width(1), Some(11.0));
        assert_eq!(sheet.explicit_column_width(2), Some(2.0));
        assert_eq!(auto_width(sheet, styles, 9).unwrap(), None);
        assert_eq!(auto_width_for_address(sheet, styles, "A1").unwrap(), Some(20.0));
    }

    #[test]
    fn test_write_out_named_appends_extension_and_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let mut workbook = create_workbook();
        write_string(
            get_cell_at(get_sheet(&mut workbook, "s").unwrap(), 0, 0).unwrap(),
            "x",
        );

        let path_out = write_out_named(&workbook, tmp.path().join("nested/dir/out")).unwrap();
        assert_eq!(path_out, tmp.path().join("nested/dir/out.xlsx"));
        assert!(path_out.exists());

        let path_out = write_out_named(&workbook, tmp.path().join("kept.XLSX")).unwrap();
        assert_eq!(path_out, tmp.path().join("kept.XLSX"));
    }
}
