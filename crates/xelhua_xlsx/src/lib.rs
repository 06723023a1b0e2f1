//! `xelhua_xlsx` v1:
//! Base helpers for manipulating Excel workbooks.
//!
//! Modules:
//! - `conf`   : constants, default presets and artifact manifest
//! - `spec`   : error type, cell values, style specs and policies
//! - `util`   : pure helper functions (references, dates, number formats)
//! - `style`  : interned font/style table and the fluent builders
//! - `model`  : in-memory workbook, sheet, row and cell
//! - `base`   : get-or-create navigation, typed reads/writes, layout, save
//! - `reader` : `.xlsx`/`.xls` loading via `calamine`
//! - `writer` : `.xlsx` serialization via `rust_xlsxwriter`
//! - `frame`  : Polars `DataFrame` export into a sheet
pub mod base;
pub mod conf;
pub mod frame;
pub mod model;
pub mod reader;
pub mod spec;
pub mod style;
pub mod util;
pub mod writer;

pub use base::{
    auto_width, auto_width_all, auto_width_for_address, create_sheet, create_workbook,
    get_cell, get_cell_at, get_cell_by_header, get_cell_or_none, get_cell_type, get_row,
    get_row_or_none, get_sheet, get_sheet_at, get_sheet_at_or_none, get_sheet_or_none,
    get_workbook, get_xls_workbook, get_xlsx_workbook, is_cell_date_formatted, merge_cells,
    read_boolean, read_comment, read_date, read_date_time, read_numeric, read_string,
    set_default_height, set_default_width, set_height, set_height_at, set_height_for_address,
    set_width, set_width_for_address, write_boolean, write_comment, write_date,
    write_date_time, write_date_time_with_format, write_date_with_format, write_formula,
    write_numeric, write_out, write_out_file, write_out_named, write_string,
};
pub use conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, manifest,
};
pub use frame::{SpecFrameWriteOptions, write_dataframe, write_dataframe_from_ipc_bytes};
pub use model::{Cell, Row, Sheet, Workbook};
pub use reader::{read_workbook, read_workbook_from_reader};
pub use spec::{
    EnumBorderStyle, EnumCellError, EnumCellType, EnumCellValue, EnumFillPattern,
    EnumHorizontalAlignment, EnumIndexedColor, EnumVerticalAlignment, EnumWorkbookKind, Result,
    SpecAutofitPolicy, SpecCellRange, SpecCellStyle, SpecComment, SpecFont, XelhuaError,
};
pub use style::{CellStyleBuilder, FontBuilder, StyleTable};
pub use writer::{save_workbook, workbook_to_buffer, write_workbook};
