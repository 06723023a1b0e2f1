//! Polars `DataFrame` export into a workbook sheet.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use tracing::info;

use crate::base::auto_width;
use crate::model::Workbook;
use crate::spec::{EnumCellValue, Result, XelhuaError};
use crate::style::{CellStyleBuilder, FontBuilder};
use crate::util::{cast_col_num, cast_row_num};

/// Placement and presentation options for [`write_dataframe`].
#[derive(Debug, Clone)]
pub struct SpecFrameWriteOptions {
    /// First row written (header row when enabled).
    pub row_start: u32,
    /// First column written.
    pub col_start: u16,
    /// Write column names as a header row.
    pub if_write_header: bool,
    /// Bold header font.
    pub if_header_bold: bool,
    /// Fit written columns to their content.
    pub if_autofit: bool,
    /// Text written for nulls; `None` leaves the cell absent.
    pub missing_value: Option<String>,
}

impl Default for SpecFrameWriteOptions {
    fn default() -> Self {
        Self {
            row_start: 0,
            col_start: 0,
            if_write_header: true,
            if_header_bold: true,
            if_autofit: true,
            missing_value: None,
        }
    }
}

/// Write a dataframe into the named sheet (created when missing).
///
/// Returns the sheet index.
pub fn write_dataframe(
    workbook: &mut Workbook,
    sheet_name: &str,
    df: &DataFrame,
    options: &SpecFrameWriteOptions,
) -> Result<usize> {
    let n_width_df = df.width();
    let n_height_df = df.height();
    let n_col_start = usize::from(options.col_start);
    if n_width_df > 0 {
        cast_col_num(n_col_start + n_width_df - 1)?;
    }
    let n_rows_header = usize::from(options.if_write_header);
    let n_row_start = options.row_start as usize;
    if n_height_df + n_rows_header > 0 {
        cast_row_num(n_row_start + n_rows_header + n_height_df - 1)?;
    }

    let n_idx = match workbook.sheet_index(sheet_name) {
        Some(val) => val,
        None => workbook.create_sheet(Some(sheet_name))?,
    };
    let (sheet, styles) = workbook
        .sheet_and_styles_mut(n_idx)
        .ok_or_else(|| XelhuaError::SheetNotFound(sheet_name.to_string()))?;

    if options.if_write_header {
        let n_style_header = if options.if_header_bold {
            let n_font = FontBuilder::new().bold(true).build(styles)?;
            CellStyleBuilder::new().font(n_font).build(styles)?
        } else {
            0
        };
        let row = sheet.row_or_create(cast_row_num(n_row_start)?)?;
        for (n_idx_col, c_name) in df.get_column_names_str().into_iter().enumerate() {
            let cell = row.cell_or_create(cast_col_num(n_col_start + n_idx_col)?)?;
            cell.set_string(c_name);
            cell.set_style(n_style_header);
        }
    }

    let l_cols = df.get_columns();
    for n_row_df in 0..n_height_df {
        let n_row = cast_row_num(n_row_start + n_rows_header + n_row_df)?;
        for (n_idx_col, col) in l_cols.iter().enumerate() {
            let value = derive_cell_value_from_any_value(
                col.get(n_row_df)?,
                options.missing_value.as_deref(),
            );
            if value == EnumCellValue::Blank {
                continue;
            }
            sheet
                .row_or_create(n_row)?
                .cell_or_create(cast_col_num(n_col_start + n_idx_col)?)?
                .set_value(value);
        }
    }

    if options.if_autofit {
        for n_idx_col in 0..n_width_df {
            auto_width(sheet, styles, cast_col_num(n_col_start + n_idx_col)?)?;
        }
    }

    info!(
        sheet = sheet.name(),
        rows = n_height_df,
        cols = n_width_df,
        "dataframe written"
    );
    Ok(n_idx)
}

/// Write one sheet from IPC-serialized dataframe bytes.
pub fn write_dataframe_from_ipc_bytes(
    workbook: &mut Workbook,
    sheet_name: &str,
    v_ipc_df: &[u8],
    options: &SpecFrameWriteOptions,
) -> Result<usize> {
    let df = IpcReader::new(Cursor::new(v_ipc_df)).finish()?;
    write_dataframe(workbook, sheet_name, &df, options)
}

fn derive_cell_value_from_any_value(
    value: AnyValue<'_>,
    missing_value: Option<&str>,
) -> EnumCellValue {
    let n_value = match value {
        AnyValue::Null => {
            return missing_value
                .map(|val| EnumCellValue::String(val.to_string()))
                .unwrap_or_default();
        }
        AnyValue::String(val) => return EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => return EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => return EnumCellValue::Boolean(val),
        AnyValue::UInt8(val) => val as f64,
        AnyValue::UInt16(val) => val as f64,
        AnyValue::UInt32(val) => val as f64,
        AnyValue::UInt64(val) => val as f64,
        AnyValue::Int8(val) => val as f64,
        AnyValue::Int16(val) => val as f64,
        AnyValue::Int32(val) => val as f64,
        AnyValue::Int64(val) => val as f64,
        AnyValue::Int128(val) => val as f64,
        AnyValue::Float32(val) => val as f64,
        AnyValue::Float64(val) => val,
        _ => return EnumCellValue::String(value.to_string()),
    };
    if n_value.is_finite() {
        EnumCellValue::Number(n_value)
    } else {
        EnumCellValue::String(n_value.to_string())
    }
}
