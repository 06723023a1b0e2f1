//! Workbook loading through `calamine` for both `.xlsx` and legacy `.xls`.
//!
//! Values, cached formula results, formula text and merged regions are
//! recovered. Cells that `calamine` reports as date-times are stored as
//! serial numbers with a date number format so date reads keep working.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use calamine::{CellErrorType, Data, Dimensions, Reader, Xls, Xlsx};
use tracing::{debug, info, warn};

use crate::conf::{STR_FMT_DATE_DEFAULT, STR_FMT_DATE_TIME_DEFAULT, STR_FMT_DURATION_DEFAULT};
use crate::model::{Sheet, Workbook};
use crate::spec::{
    EnumCellError, EnumCellValue, EnumWorkbookKind, Result, SpecCellRange, XelhuaError,
};
use crate::style::StyleTable;
use crate::util::{cast_col_num, cast_row_num, normalize_formula};

////////////////////////////////////////////////////////////////////////////////
// #region WorkbookKind

/// Container kind implied by the file extension; `.xls` is legacy, the rest OOXML.
pub fn derive_workbook_kind(path: &Path) -> Result<EnumWorkbookKind> {
    let c_ext = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match c_ext.as_str() {
        "xls" => Ok(EnumWorkbookKind::Xls),
        "xlsb" | "ods" | "csv" => Err(XelhuaError::UnsupportedFormat(format!(
            "{} is not an xls/xlsx workbook",
            path.display()
        ))),
        _ => Ok(EnumWorkbookKind::Xlsx),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookRead

/// Load a workbook file, choosing the container kind from the extension.
pub fn read_workbook(path: impl AsRef<Path>) -> Result<Workbook> {
    let path = path.as_ref();
    let kind = derive_workbook_kind(path)?;
    info!(path = %path.display(), kind = kind.extension(), "reading workbook");

    let file = BufReader::new(File::open(path)?);
    read_workbook_from_reader(file, kind)
}

/// Load a workbook of the given kind from a seekable stream.
pub fn read_workbook_from_reader<R: Read + Seek>(
    reader: R,
    kind: EnumWorkbookKind,
) -> Result<Workbook> {
    match kind {
        EnumWorkbookKind::Xls => {
            let mut book: Xls<R> = Xls::new(reader).map_err(calamine::Error::from)?;
            load_workbook(&mut book, kind, |book, name| {
                Ok(book.worksheet_merge_cells(name).unwrap_or_default())
            })
        }
        EnumWorkbookKind::Xlsx => {
            let mut book: Xlsx<R> = Xlsx::new(reader).map_err(calamine::Error::from)?;
            book.load_merged_regions().map_err(calamine::Error::from)?;
            load_workbook(&mut book, kind, |book, name| {
                match book.worksheet_merge_cells(name) {
                    Some(result) => result.map_err(|e| calamine::Error::from(e).into()),
                    None => Ok(Vec::new()),
                }
            })
        }
    }
}

fn load_workbook<RS, B, F>(
    book: &mut B,
    kind: EnumWorkbookKind,
    mut read_merges: F,
) -> Result<Workbook>
where
    RS: Read + Seek,
    B: Reader<RS>,
    calamine::Error: From<B::Error>,
    F: FnMut(&mut B, &str) -> Result<Vec<Dimensions>>,
{
    let mut workbook = Workbook::with_kind(kind);

    for c_sheet_name in book.sheet_names() {
        let n_idx = workbook.create_sheet(Some(&c_sheet_name))?;
        let (sheet, styles) = workbook
            .sheet_and_styles_mut(n_idx)
            .ok_or_else(|| XelhuaError::SheetNotFound(c_sheet_name.clone()))?;

        let range = book
            .worksheet_range(&c_sheet_name)
            .map_err(calamine::Error::from)?;
        let tup_start = range.start().unwrap_or((0, 0));
        let mut n_cells = 0usize;
        for (n_row_rel, n_col_rel, value) in range.used_cells() {
            let Some((n_row, n_col)) = derive_absolute_position(tup_start, n_row_rel, n_col_rel)
            else {
                warn!(
                    sheet = %c_sheet_name,
                    row = n_row_rel,
                    col = n_col_rel,
                    "skipping out-of-bounds cell"
                );
                continue;
            };
            if apply_data(sheet, styles, n_row, n_col, value)? {
                n_cells += 1;
            }
        }

        match book.worksheet_formula(&c_sheet_name) {
            Ok(range_formula) => {
                let tup_start = range_formula.start().unwrap_or((0, 0));
                for (n_row_rel, n_col_rel, c_formula) in range_formula.used_cells() {
                    let c_expr = normalize_formula(c_formula);
                    if c_expr.is_empty() {
                        continue;
                    }
                    let Some((n_row, n_col)) =
                        derive_absolute_position(tup_start, n_row_rel, n_col_rel)
                    else {
                        continue;
                    };
                    let cell = sheet.row_or_create(n_row)?.cell_or_create(n_col)?;
                    let cached = match cell.value() {
                        EnumCellValue::Blank => None,
                        other => Some(other.clone()),
                    };
                    cell.set_formula(&c_expr, cached);
                }
            }
            Err(err) => {
                let err = calamine::Error::from(err);
                warn!(sheet = %c_sheet_name, error = %err, "failed to read formulas");
            }
        }

        for dim in read_merges(book, &c_sheet_name)? {
            apply_merge(sheet, &dim);
        }

        debug!(
            sheet = %c_sheet_name,
            cells = n_cells,
            merges = sheet.merged_regions().len(),
            "sheet loaded"
        );
    }

    Ok(workbook)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellConversion

/// `calamine` iterators yield positions relative to `range.start()`.
fn derive_absolute_position(start: (u32, u32), row: usize, col: usize) -> Option<(u32, u16)> {
    let n_row = (start.0 as usize).checked_add(row)?;
    let n_col = (start.1 as usize).checked_add(col)?;
    Some((cast_row_num(n_row).ok()?, cast_col_num(n_col).ok()?))
}

fn apply_data(
    sheet: &mut Sheet,
    styles: &mut StyleTable,
    row: u32,
    col: u16,
    value: &Data,
) -> Result<bool> {
    let (value, num_format) = match value {
        Data::Empty => return Ok(false),
        Data::Bool(b) => (EnumCellValue::Boolean(*b), None),
        Data::Int(n) => (EnumCellValue::Number(*n as f64), None),
        Data::Float(n) => (EnumCellValue::Number(*n), None),
        Data::String(s) => (EnumCellValue::String(s.clone()), None),
        Data::Error(e) => (EnumCellValue::Error(convert_cell_error(e)), None),
        Data::DateTime(dt) => {
            let n_serial = dt.as_f64();
            let c_format = if dt.is_duration() {
                STR_FMT_DURATION_DEFAULT
            } else if n_serial.fract() == 0.0 {
                STR_FMT_DATE_DEFAULT
            } else {
                STR_FMT_DATE_TIME_DEFAULT
            };
            (EnumCellValue::Number(n_serial), Some(c_format))
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => (EnumCellValue::String(s.clone()), None),
    };

    let cell = sheet.row_or_create(row)?.cell_or_create(col)?;
    if let Some(c_format) = num_format {
        let n_style = styles.register_number_format(cell.style(), c_format)?;
        cell.set_style(n_style);
    }
    cell.set_value(value);
    Ok(true)
}

fn convert_cell_error(err: &CellErrorType) -> EnumCellError {
    match err {
        CellErrorType::Div0 => EnumCellError::Div0,
        CellErrorType::NA => EnumCellError::NA,
        CellErrorType::Name => EnumCellError::Name,
        CellErrorType::Null => EnumCellError::Null,
        CellErrorType::Num => EnumCellError::Num,
        CellErrorType::Ref => EnumCellError::Ref,
        CellErrorType::Value => EnumCellError::Value,
        CellErrorType::GettingData => EnumCellError::GettingData,
    }
}

fn apply_merge(sheet: &mut Sheet, dim: &Dimensions) {
    let range = cast_col_num(dim.start.1 as usize)
        .and_then(|n_first_col| Ok((n_first_col, cast_col_num(dim.end.1 as usize)?)))
        .and_then(|(n_first_col, n_last_col)| {
            SpecCellRange::new(dim.start.0, dim.end.0, n_first_col, n_last_col)
        })
        .and_then(|range| sheet.add_merged_region(range));
    if let Err(err) = range {
        warn!(sheet = sheet.name(), error = %err, "skipping merged region");
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use super::*;
    use crate::base::{get_cell_at, get_sheet, merge_cells, read_date, write_date};
    use crate::writer::workbook_to_buffer;

    #[test]
    fn test_derive_workbook_kind() {
        let kind = derive_workbook_kind(&PathBuf::from("a/b.XLS")).unwrap();
        assert_eq!(kind, EnumWorkbookKind::Xls);
        let kind = derive_workbook_kind(&PathBuf::from("b.xlsx")).unwrap();
        assert_eq!(kind, EnumWorkbookKind::Xlsx);
        let kind = derive_workbook_kind(&PathBuf::from("no_extension")).unwrap();
        assert_eq!(kind, EnumWorkbookKind::Xlsx);
        assert!(matches!(
            derive_workbook_kind(&PathBuf::from("c.ods")),
            Err(XelhuaError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let result = read_workbook_from_reader(
            Cursor::new(b"not a workbook".to_vec()),
            EnumWorkbookKind::Xlsx,
        );
        assert!(matches!(result, Err(XelhuaError::Read(_))));
    }

    #[test]
    fn test_read_back_values_formulas_dates_and_merges() {
        let mut workbook = Workbook::new();
        {
            let sheet = get_sheet(&mut workbook, "Data").unwrap();
            get_cell_at(sheet, 0, 0).unwrap().set_string("Hello");
            get_cell_at(sheet, 0, 1).unwrap().set_number(2.5);
            get_cell_at(sheet, 1, 0).unwrap().set_boolean(true);
            get_cell_at(sheet, 1, 1)
                .unwrap()
                .set_formula("B1*2", Some(EnumCellValue::Number(5.0)));
            get_cell_at(sheet, 3, 3).unwrap().set_error(EnumCellError::NA);
            merge_cells(sheet, 4, 5, 0, 1).unwrap();
        }
        let date = chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        {
            let (sheet, styles) = workbook.sheet_and_styles_mut(0).unwrap();
            write_date(get_cell_at(sheet, 2, 0).unwrap(), date, styles).unwrap();
        }

        let l_bytes = workbook_to_buffer(&workbook).unwrap();
        let loaded =
            read_workbook_from_reader(Cursor::new(l_bytes), EnumWorkbookKind::Xlsx).unwrap();

        assert_eq!(loaded.sheet_names(), vec!["Data"]);
        let sheet = loaded.sheet("Data").unwrap();
        assert_eq!(
            sheet.cell(0, 0).unwrap().value(),
            &EnumCellValue::String("Hello".to_string())
        );
        assert_eq!(sheet.cell(0, 1).unwrap().value(), &EnumCellValue::Number(2.5));
        assert_eq!(sheet.cell(1, 0).unwrap().value(), &EnumCellValue::Boolean(true));
        match sheet.cell(1, 1).unwrap().value() {
            EnumCellValue::Formula { expr, cached } => {
                assert_eq!(expr, "B1*2");
                assert_eq!(cached.as_deref(), Some(&EnumCellValue::Number(5.0)));
            }
            other => panic!("expected formula, got {other:?}"),
        }
        assert_eq!(
            sheet.cell(3, 3).unwrap().value(),
            &EnumCellValue::String("#N/A".to_string())
        );
        assert_eq!(read_date(sheet.cell(2, 0).unwrap(), loaded.styles()).unwrap(), date);
        assert_eq!(
            sheet.merged_regions(),
            &[SpecCellRange::new(4, 5, 0, 1).unwrap()]
        );
    }
}
