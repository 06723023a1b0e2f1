//! In-memory workbook model: sparse sheets, rows and cells.

use std::collections::BTreeMap;

use tracing::warn;

use crate::conf::{
    N_HEIGHT_ROW_DEFAULT, N_HEIGHT_ROW_MAX, N_WIDTH_COLUMN_DEFAULT, N_WIDTH_COLUMN_MAX,
    STR_SHEET_NAME_PREFIX,
};
use crate::spec::{
    EnumCellError, EnumCellType, EnumCellValue, EnumWorkbookKind, Result, SpecCellRange,
    SpecComment, XelhuaError,
};
use crate::style::StyleTable;
use crate::util::{
    cast_col_num, cast_row_num, create_sheet_identifier, derive_cell_reference, normalize_formula,
    sanitize_sheet_name,
};

////////////////////////////////////////////////////////////////////////////////
// #region Workbook

/// Workbook: ordered sheets plus the shared style table.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    kind: EnumWorkbookKind,
    l_sheets: Vec<Sheet>,
    styles: StyleTable,
}

impl Workbook {
    /// Empty OOXML workbook.
    pub fn new() -> Self {
        Self::with_kind(EnumWorkbookKind::Xlsx)
    }

    /// Empty workbook remembering the container it came from.
    pub fn with_kind(kind: EnumWorkbookKind) -> Self {
        Self {
            kind,
            l_sheets: Vec::new(),
            styles: StyleTable::new(),
        }
    }

    /// Container kind the workbook was read from or created as.
    pub fn kind(&self) -> EnumWorkbookKind {
        self.kind
    }

    /// Number of sheets.
    pub fn num_sheets(&self) -> usize {
        self.l_sheets.len()
    }

    /// Sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.l_sheets.iter().map(Sheet::name).collect()
    }

    /// Index of a sheet by name (case-insensitive, as Excel compares names).
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        let find = |c_name: &str| {
            self.l_sheets
                .iter()
                .position(|sheet| sheet.name.eq_ignore_ascii_case(c_name))
        };
        find(name).or_else(|| find(&sanitize_sheet_name(name, "_")))
    }

    /// Sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheet_index(name).map(|n_idx| &self.l_sheets[n_idx])
    }

    /// Mutable sheet by exact name.
    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheet_index(name).map(|n_idx| &mut self.l_sheets[n_idx])
    }

    /// Sheet by position.
    pub fn sheet_at(&self, index: usize) -> Option<&Sheet> {
        self.l_sheets.get(index)
    }

    /// Mutable sheet by position.
    pub fn sheet_at_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.l_sheets.get_mut(index)
    }

    /// All sheets in order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.l_sheets
    }

    /// Append a sheet and return its index.
    ///
    /// `None` picks the next free `SheetN` name. Invalid characters are
    /// replaced and a name already in use gets a numeric suffix.
    pub fn create_sheet(&mut self, name: Option<&str>) -> Result<usize> {
        let c_name = match name {
            Some(val) => self.derive_unique_sheet_name(&sanitize_sheet_name(val, "_")),
            None => {
                let mut n_idx = self.l_sheets.len() + 1;
                loop {
                    let candidate = format!("{STR_SHEET_NAME_PREFIX}{n_idx}");
                    if self.sheet_index(&candidate).is_none() {
                        break candidate;
                    }
                    n_idx += 1;
                }
            }
        };
        if let Some(val) = name
            && val != c_name
        {
            warn!(requested = val, actual = %c_name, "sheet name adjusted");
        }

        self.l_sheets.push(Sheet::new(c_name));
        Ok(self.l_sheets.len() - 1)
    }

    /// Remove and return the sheet at `index`.
    pub fn remove_sheet(&mut self, index: usize) -> Result<Sheet> {
        if index >= self.l_sheets.len() {
            return Err(XelhuaError::IndexOutOfBounds(format!(
                "sheet index {index} (workbook has {} sheets)",
                self.l_sheets.len()
            )));
        }
        Ok(self.l_sheets.remove(index))
    }

    /// Rename the sheet at `index`; the new name must be valid and unused.
    pub fn rename_sheet(&mut self, index: usize, name: &str) -> Result<()> {
        let c_name = sanitize_sheet_name(name, "_");
        if c_name != name {
            return Err(XelhuaError::InvalidSheetName(name.to_string()));
        }
        if let Some(n_idx) = self.sheet_index(&c_name)
            && n_idx != index
        {
            return Err(XelhuaError::InvalidSheetName(format!("{name} already exists")));
        }
        let sheet = self
            .l_sheets
            .get_mut(index)
            .ok_or_else(|| XelhuaError::IndexOutOfBounds(format!("sheet index {index}")))?;
        sheet.name = c_name;
        Ok(())
    }

    /// Font and style table shared by all sheets.
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Mutable font and style table.
    pub fn styles_mut(&mut self) -> &mut StyleTable {
        &mut self.styles
    }

    /// Borrow one sheet and the style table mutably at the same time.
    pub fn sheet_and_styles_mut(&mut self, index: usize) -> Option<(&mut Sheet, &mut StyleTable)> {
        let Self {
            l_sheets, styles, ..
        } = self;
        l_sheets.get_mut(index).map(|sheet| (sheet, styles))
    }

    fn derive_unique_sheet_name(&self, name: &str) -> String {
        if self.sheet_index(name).is_none() {
            return name.to_string();
        }
        let mut n_idx = 2usize;
        loop {
            let candidate = create_sheet_identifier(name, n_idx);
            if self.sheet_index(&candidate).is_none() {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sheet

/// Worksheet: sparse rows, column widths and merged regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    dict_rows: BTreeMap<u32, Row>,
    dict_col_widths: BTreeMap<u16, f64>,
    default_col_width: Option<f64>,
    default_row_height: Option<f64>,
    l_merged_regions: Vec<SpecCellRange>,
}

impl Sheet {
    fn new(name: String) -> Self {
        Self {
            name,
            dict_rows: BTreeMap::new(),
            dict_col_widths: BTreeMap::new(),
            default_col_width: None,
            default_row_height: None,
            l_merged_regions: Vec::new(),
        }
    }

    /// Sheet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row at `row_num`, if present.
    pub fn row(&self, row_num: u32) -> Option<&Row> {
        self.dict_rows.get(&row_num)
    }

    /// Mutable row at `row_num`, if present.
    pub fn row_mut(&mut self, row_num: u32) -> Option<&mut Row> {
        self.dict_rows.get_mut(&row_num)
    }

    /// Create an empty row, replacing any existing row at `row_num`.
    pub fn create_row(&mut self, row_num: u32) -> Result<&mut Row> {
        cast_row_num(row_num as usize)?;
        self.dict_rows.remove(&row_num);
        self.row_or_create(row_num)
    }

    /// Existing row at `row_num`, or a new empty one.
    pub fn row_or_create(&mut self, row_num: u32) -> Result<&mut Row> {
        cast_row_num(row_num as usize)?;
        Ok(self
            .dict_rows
            .entry(row_num)
            .or_insert_with(|| Row::new(row_num)))
    }

    /// Remove and return a row.
    pub fn remove_row(&mut self, row_num: u32) -> Option<Row> {
        self.dict_rows.remove(&row_num)
    }

    /// Rows in ascending order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.dict_rows.values()
    }

    /// Lowest present row number.
    pub fn first_row_num(&self) -> Option<u32> {
        self.dict_rows.keys().next().copied()
    }

    /// Highest present row number.
    pub fn last_row_num(&self) -> Option<u32> {
        self.dict_rows.keys().next_back().copied()
    }

    /// Number of rows actually present.
    pub fn physical_num_rows(&self) -> usize {
        self.dict_rows.len()
    }

    /// Highest column index holding a cell, over all rows.
    pub fn last_col_num(&self) -> Option<u16> {
        self.dict_rows.values().filter_map(Row::last_cell_num).max()
    }

    /// Cell at `(row_num, col_num)`, if present.
    pub fn cell(&self, row_num: u32, col_num: u16) -> Option<&Cell> {
        self.row(row_num).and_then(|row| row.cell(col_num))
    }

    /// Mutable cell at `(row_num, col_num)`, if present.
    pub fn cell_mut(&mut self, row_num: u32, col_num: u16) -> Option<&mut Cell> {
        self.row_mut(row_num).and_then(|row| row.cell_mut(col_num))
    }

    /// Add a merged region and return its index.
    ///
    /// Regions must span at least two cells and must not overlap others.
    pub fn add_merged_region(&mut self, range: SpecCellRange) -> Result<usize> {
        if range.num_cells() < 2 {
            return Err(XelhuaError::InvalidRange(format!(
                "merged region {range} must contain 2 or more cells"
            )));
        }
        if let Some(existing) = self
            .l_merged_regions
            .iter()
            .find(|existing| existing.overlaps(&range))
        {
            return Err(XelhuaError::OverlappingMergedRegion {
                new: range.to_string(),
                existing: existing.to_string(),
            });
        }
        self.l_merged_regions.push(range);
        Ok(self.l_merged_regions.len() - 1)
    }

    /// Merged regions in insertion order.
    pub fn merged_regions(&self) -> &[SpecCellRange] {
        &self.l_merged_regions
    }

    /// Remove and return the merged region at `index`.
    pub fn remove_merged_region(&mut self, index: usize) -> Option<SpecCellRange> {
        (index < self.l_merged_regions.len()).then(|| self.l_merged_regions.remove(index))
    }

    /// Set a column width in characters (0..=255).
    pub fn set_column_width(&mut self, col_num: u16, chars: f64) -> Result<()> {
        cast_col_num(col_num as usize)?;
        validate_width(chars)?;
        self.dict_col_widths.insert(col_num, chars);
        Ok(())
    }

    /// Width explicitly set for a column.
    pub fn explicit_column_width(&self, col_num: u16) -> Option<f64> {
        self.dict_col_widths.get(&col_num).copied()
    }

    /// Effective width of a column in characters.
    pub fn column_width(&self, col_num: u16) -> f64 {
        self.explicit_column_width(col_num)
            .or(self.default_col_width)
            .unwrap_or(N_WIDTH_COLUMN_DEFAULT)
    }

    /// Explicit column widths in ascending column order.
    pub fn column_widths(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.dict_col_widths.iter().map(|(col, width)| (*col, *width))
    }

    /// Sheet default column width in characters.
    pub fn default_column_width(&self) -> Option<f64> {
        self.default_col_width
    }

    /// Set the default column width in characters.
    pub fn set_default_column_width(&mut self, chars: f64) -> Result<()> {
        validate_width(chars)?;
        self.default_col_width = Some(chars);
        Ok(())
    }

    /// Effective height of a row in points.
    pub fn row_height(&self, row_num: u32) -> f64 {
        self.row(row_num)
            .and_then(Row::height)
            .or(self.default_row_height)
            .unwrap_or(N_HEIGHT_ROW_DEFAULT)
    }

    /// Sheet default row height in points.
    pub fn default_row_height(&self) -> Option<f64> {
        self.default_row_height
    }

    /// Set the default row height in points.
    pub fn set_default_row_height(&mut self, points: f64) -> Result<()> {
        validate_height(points)?;
        self.default_row_height = Some(points);
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Row

/// One worksheet row with sparse cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    num: u32,
    dict_cells: BTreeMap<u16, Cell>,
    height: Option<f64>,
}

impl Row {
    fn new(num: u32) -> Self {
        Self {
            num,
            dict_cells: BTreeMap::new(),
            height: None,
        }
    }

    /// Zero-based row index.
    pub fn row_num(&self) -> u32 {
        self.num
    }

    /// Cell at `col_num`, if present.
    pub fn cell(&self, col_num: u16) -> Option<&Cell> {
        self.dict_cells.get(&col_num)
    }

    /// Mutable cell at `col_num`, if present.
    pub fn cell_mut(&mut self, col_num: u16) -> Option<&mut Cell> {
        self.dict_cells.get_mut(&col_num)
    }

    /// Create a blank cell, replacing any existing cell at `col_num`.
    pub fn create_cell(&mut self, col_num: u16) -> Result<&mut Cell> {
        cast_col_num(col_num as usize)?;
        self.dict_cells.remove(&col_num);
        self.cell_or_create(col_num)
    }

    /// Existing cell at `col_num`, or a new blank one.
    pub fn cell_or_create(&mut self, col_num: u16) -> Result<&mut Cell> {
        cast_col_num(col_num as usize)?;
        let n_row = self.num;
        Ok(self
            .dict_cells
            .entry(col_num)
            .or_insert_with(|| Cell::new(n_row, col_num)))
    }

    /// Remove and return a cell.
    pub fn remove_cell(&mut self, col_num: u16) -> Option<Cell> {
        self.dict_cells.remove(&col_num)
    }

    /// Cells in ascending column order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.dict_cells.values()
    }

    /// Lowest present column number.
    pub fn first_cell_num(&self) -> Option<u16> {
        self.dict_cells.keys().next().copied()
    }

    /// Highest present column number.
    pub fn last_cell_num(&self) -> Option<u16> {
        self.dict_cells.keys().next_back().copied()
    }

    /// Explicit height in points.
    pub fn height(&self) -> Option<f64> {
        self.height
    }

    /// Set height in points (0..=409).
    pub fn set_height(&mut self, points: f64) -> Result<()> {
        validate_height(points)?;
        self.height = Some(points);
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Cell

/// One worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    row: u32,
    col: u16,
    value: EnumCellValue,
    style: usize,
    comment: Option<SpecComment>,
}

impl Cell {
    fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            value: EnumCellValue::Blank,
            style: 0,
            comment: None,
        }
    }

    /// Zero-based row number.
    pub fn row_index(&self) -> u32 {
        self.row
    }

    /// Zero-based column number.
    pub fn column_index(&self) -> u16 {
        self.col
    }

    /// A1-style address.
    pub fn address(&self) -> String {
        derive_cell_reference(self.row, self.col)
    }

    /// Kind of the stored value.
    pub fn cell_type(&self) -> EnumCellType {
        self.value.cell_type()
    }

    /// Stored value.
    pub fn value(&self) -> &EnumCellValue {
        &self.value
    }

    /// Replace the stored value.
    pub fn set_value(&mut self, value: EnumCellValue) {
        self.value = value;
    }

    /// Store text.
    pub fn set_string(&mut self, value: impl Into<String>) {
        self.value = EnumCellValue::String(value.into());
    }

    /// Store a number.
    pub fn set_number(&mut self, value: f64) {
        self.value = EnumCellValue::Number(value);
    }

    /// Store a boolean.
    pub fn set_boolean(&mut self, value: bool) {
        self.value = EnumCellValue::Boolean(value);
    }

    /// Set a formula; a leading `=` is dropped.
    pub fn set_formula(&mut self, expr: &str, cached: Option<EnumCellValue>) {
        self.value = EnumCellValue::Formula {
            expr: normalize_formula(expr),
            cached: cached.map(Box::new),
        };
    }

    /// Store an error value.
    pub fn set_error(&mut self, value: EnumCellError) {
        self.value = EnumCellValue::Error(value);
    }

    /// Clear the value; style and comment stay.
    pub fn set_blank(&mut self) {
        self.value = EnumCellValue::Blank;
    }

    /// Style index into the workbook [`StyleTable`].
    pub fn style(&self) -> usize {
        self.style
    }

    /// Assign a style index.
    pub fn set_style(&mut self, style: usize) {
        self.style = style;
    }

    /// Attached comment.
    pub fn comment(&self) -> Option<&SpecComment> {
        self.comment.as_ref()
    }

    /// Attach or clear the comment.
    pub fn set_comment(&mut self, comment: Option<SpecComment>) {
        self.comment = comment;
    }

    /// Text as shown without number formatting.
    pub fn display_text(&self) -> String {
        self.value.to_text()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

fn validate_width(chars: f64) -> Result<()> {
    if !(0.0..=N_WIDTH_COLUMN_MAX).contains(&chars) {
        return Err(XelhuaError::IndexOutOfBounds(format!(
            "column width {chars} must be within 0..={N_WIDTH_COLUMN_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_height(points: f64) -> Result<()> {
    if !(0.0..=N_HEIGHT_ROW_MAX).contains(&points) {
        return Err(XelhuaError::IndexOutOfBounds(format!(
            "row height {points} must be within 0..={N_HEIGHT_ROW_MAX} points"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sheet_names_are_unique_and_sanitized() {
        let mut workbook = Workbook::new();
        assert_eq!(workbook.create_sheet(None).unwrap(), 0);
        assert_eq!(workbook.create_sheet(Some("Data")).unwrap(), 1);
        assert_eq!(workbook.create_sheet(Some("data")).unwrap(), 2);
        assert_eq!(workbook.create_sheet(Some("a/b")).unwrap(), 3);
        assert_eq!(workbook.create_sheet(None).unwrap(), 4);

        assert_eq!(
            workbook.sheet_names(),
            vec!["Sheet1", "Data", "data_2", "a_b", "Sheet5"]
        );
        assert_eq!(workbook.sheet_index("DATA"), Some(1));
        assert_eq!(workbook.sheet_index("a/b"), Some(3));
    }

    #[test]
    fn test_rename_and_remove_sheet() {
        let mut workbook = Workbook::new();
        workbook.create_sheet(Some("One")).unwrap();
        workbook.create_sheet(Some("Two")).unwrap();

        assert!(workbook.rename_sheet(0, "Two").is_err());
        assert!(workbook.rename_sheet(0, "Bad:Name").is_err());
        workbook.rename_sheet(0, "First").unwrap();
        assert_eq!(workbook.sheet_names(), vec!["First", "Two"]);

        let sheet = workbook.remove_sheet(1).unwrap();
        assert_eq!(sheet.name(), "Two");
        assert!(workbook.remove_sheet(5).is_err());
    }

    #[test]
    fn test_rows_and_cells_are_sparse_and_ordered() {
        let mut workbook = Workbook::new();
        let n_sheet = workbook.create_sheet(None).unwrap();
        let sheet = workbook.sheet_at_mut(n_sheet).unwrap();

        sheet.row_or_create(5).unwrap().cell_or_create(3).unwrap().set_number(1.0);
        sheet.row_or_create(2).unwrap().cell_or_create(7).unwrap().set_string("x");

        assert_eq!(sheet.physical_num_rows(), 2);
        assert_eq!(sheet.first_row_num(), Some(2));
        assert_eq!(sheet.last_row_num(), Some(5));
        assert_eq!(sheet.last_col_num(), Some(7));
        assert_eq!(
            sheet.rows().map(Row::row_num).collect::<Vec<_>>(),
            vec![2, 5]
        );
        assert_eq!(sheet.cell(5, 3).unwrap().address(), "D6");

        sheet.create_row(5).unwrap();
        assert!(sheet.cell(5, 3).is_none());
        assert!(sheet.row_or_create(1_048_576).is_err());
    }

    #[test]
    fn test_merged_regions_reject_overlap_and_single_cell() {
        let mut workbook = Workbook::new();
        workbook.create_sheet(None).unwrap();
        let sheet = workbook.sheet_at_mut(0).unwrap();

        sheet
            .add_merged_region(SpecCellRange::new(1, 2, 1, 1).unwrap())
            .unwrap();
        let result = sheet.add_merged_region(SpecCellRange::new(2, 3, 0, 1).unwrap());
        assert!(matches!(
            result,
            Err(XelhuaError::OverlappingMergedRegion { .. })
        ));
        let result = sheet.add_merged_region(SpecCellRange::new(5, 5, 5, 5).unwrap());
        assert!(matches!(result, Err(XelhuaError::InvalidRange(_))));
        assert_eq!(sheet.merged_regions().len(), 1);
        assert!(sheet.remove_merged_region(0).is_some());
        assert!(sheet.remove_merged_region(0).is_none());
    }

    #[test]
    fn test_widths_and_heights() {
        let mut workbook = Workbook::new();
        workbook.create_sheet(None).unwrap();
        let sheet = workbook.sheet_at_mut(0).unwrap();

        assert_eq!(sheet.column_width(0), N_WIDTH_COLUMN_DEFAULT);
        sheet.set_default_column_width(12.0).unwrap();
        sheet.set_column_width(2, 20.0).unwrap();
        assert_eq!(sheet.column_width(0), 12.0);
        assert_eq!(sheet.column_width(2), 20.0);
        assert!(sheet.set_column_width(0, 300.0).is_err());

        let row = sheet.row_or_create(0).unwrap();
        row.set_height(20.0).unwrap();
        assert_eq!(row.height(), Some(20.0));
        assert!(row.set_height(-1.0).is_err());
        assert!(sheet.set_default_row_height(500.0).is_err());

        assert_eq!(sheet.row_height(0), 20.0);
        assert_eq!(sheet.row_height(1), N_HEIGHT_ROW_DEFAULT);
        sheet.set_default_row_height(18.0).unwrap();
        assert_eq!(sheet.row_height(1), 18.0);
    }

    #[test]
    fn test_sheet_and_styles_split_borrow() {
        let mut workbook = Workbook::new();
        workbook.create_sheet(None).unwrap();
        let (sheet, styles) = workbook.sheet_and_styles_mut(0).unwrap();
        let n_style = styles.register_number_format(0, "0.00").unwrap();
        let cell = sheet.row_or_create(0).unwrap().cell_or_create(0).unwrap();
        cell.set_style(n_style);
        cell.set_formula("=1+1", Some(EnumCellValue::Number(2.0)));

        let cell = workbook.sheet_at(0).unwrap().cell(0, 0).unwrap();
        assert_eq!(cell.style(), 1);
        assert_eq!(cell.cell_type(), EnumCellType::Formula);
        assert_eq!(cell.display_text(), "2");
        assert!(workbook.sheet_and_styles_mut(3).is_none());
    }
}
