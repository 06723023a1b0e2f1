//! Shared workbook specification models, enums and the crate error type.

use std::fmt;

use thiserror::Error;

use crate::conf::{
    N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, STR_FONT_NAME_DEFAULT, STR_NUM_FORMAT_GENERAL,
};
use crate::util::derive_cell_reference;

////////////////////////////////////////////////////////////////////////////////
// #region ErrorSpecification

/// Errors raised by workbook manipulation, reading and writing.
#[derive(Debug, Error)]
pub enum XelhuaError {
    /// Underlying filesystem/stream failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Failure while decoding a workbook container.
    #[error("xlsx read error: {0}")]
    Read(#[from] calamine::Error),
    /// Failure while encoding a workbook container.
    #[error("xlsx write error: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    /// Failure while reading a dataframe.
    #[error("dataframe error: {0}")]
    Frame(#[from] polars::prelude::PolarsError),
    /// File extension or container kind not handled.
    #[error("Unsupported workbook format: {0}")]
    UnsupportedFormat(String),
    /// Named sheet does not exist.
    #[error("Sheet not found: {0:?}")]
    SheetNotFound(String),
    /// Header row has no cell with that label.
    #[error("Couldn't find a cell with that name in header row: {0:?}")]
    HeaderNotFound(String),
    /// Cell holds a value of another type than requested.
    #[error("Cannot read a {expected} value from a {actual} cell at {address}")]
    CellTypeMismatch {
        /// Requested cell type.
        expected: EnumCellType,
        /// Actual cell type.
        actual: EnumCellType,
        /// A1 address of the cell.
        address: String,
    },
    /// Cell is not numeric with a date number format.
    #[error("Cell is not formatted as a date: {0}")]
    NotDateFormatted(String),
    /// Serial number or calendar value outside the supported date range.
    #[error("Invalid date value: {0}")]
    InvalidDate(String),
    /// Malformed cell range.
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),
    /// New merged region intersects an existing one.
    #[error("Merged region {new} overlaps existing region {existing}")]
    OverlappingMergedRegion {
        /// Region being added.
        new: String,
        /// Region already present in the sheet.
        existing: String,
    },
    /// Sheet name rejected.
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),
    /// Row/column/sheet/style index outside valid bounds.
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(String),
    /// Style or font table reached the Excel limit.
    #[error("Style table limit exceeded: {0}")]
    StyleLimitExceeded(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, XelhuaError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellValueSpecification

/// Type tag of a cell's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellType {
    /// No value.
    Blank,
    /// Text value.
    String,
    /// Numeric value (numbers and dates).
    Numeric,
    /// Boolean value.
    Boolean,
    /// Formula with an optional cached result.
    Formula,
    /// Error value.
    Error,
}

impl fmt::Display for EnumCellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            Self::Blank => "blank",
            Self::String => "string",
            Self::Numeric => "numeric",
            Self::Boolean => "boolean",
            Self::Formula => "formula",
            Self::Error => "error",
        };
        f.write_str(c_name)
    }
}

/// Excel error values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellError {
    /// `#DIV/0!`
    Div0,
    /// `#N/A`
    NA,
    /// `#NAME?`
    Name,
    /// `#NULL!`
    Null,
    /// `#NUM!`
    Num,
    /// `#REF!`
    Ref,
    /// `#VALUE!`
    Value,
    /// `#GETTING_DATA`
    GettingData,
}

impl EnumCellError {
    /// Excel display code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Div0 => "#DIV/0!",
            Self::NA => "#N/A",
            Self::Name => "#NAME?",
            Self::Null => "#NULL!",
            Self::Num => "#NUM!",
            Self::Ref => "#REF!",
            Self::Value => "#VALUE!",
            Self::GettingData => "#GETTING_DATA",
        }
    }
}

/// Value stored in a cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// No value.
    #[default]
    Blank,
    /// Text value.
    String(String),
    /// Numeric value. Dates are stored as Excel serial numbers.
    Number(f64),
    /// Boolean value.
    Boolean(bool),
    /// Formula text (without leading `=`) and last computed result.
    Formula {
        /// Formula expression.
        expr: String,
        /// Cached result, if known.
        cached: Option<Box<EnumCellValue>>,
    },
    /// Error value.
    Error(EnumCellError),
}

impl EnumCellValue {
    /// Type tag of this value.
    pub fn cell_type(&self) -> EnumCellType {
        match self {
            Self::Blank => EnumCellType::Blank,
            Self::String(_) => EnumCellType::String,
            Self::Number(_) => EnumCellType::Numeric,
            Self::Boolean(_) => EnumCellType::Boolean,
            Self::Formula { .. } => EnumCellType::Formula,
            Self::Error(_) => EnumCellType::Error,
        }
    }

    /// Plain text rendering used for header lookup and width estimation.
    pub fn to_text(&self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Formula { cached, .. } => {
                cached.as_deref().map(Self::to_text).unwrap_or_default()
            }
            Self::Error(e) => e.code().to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColorAndFormatEnums

/// Legacy indexed palette colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumIndexedColor {
    /// Index 8, `#000000`.
    Black,
    /// Index 9, `#FFFFFF`.
    White,
    /// Index 10, `#FF0000`.
    Red,
    /// Index 11, `#00FF00`.
    BrightGreen,
    /// Index 12, `#0000FF`.
    Blue,
    /// Index 13, `#FFFF00`.
    Yellow,
    /// Index 14, `#FF00FF`.
    Pink,
    /// Index 15, `#00FFFF`.
    Turquoise,
    /// Index 16, `#800000`.
    DarkRed,
    /// Index 17, `#008000`.
    Green,
    /// Index 18, `#000080`.
    DarkBlue,
    /// Index 19, `#808000`.
    DarkYellow,
    /// Index 20, `#800080`.
    Violet,
    /// Index 21, `#008080`.
    Teal,
    /// Index 22, `#C0C0C0`.
    Grey25Percent,
    /// Index 23, `#808080`.
    Grey50Percent,
    /// Index 24, `#9999FF`.
    CornflowerBlue,
    /// Index 25, `#993366`.
    Maroon,
    /// Index 26, `#FFFFCC`.
    LemonChiffon,
    /// Index 27, `#CCFFFF`.
    LightTurquoise1,
    /// Index 28, `#660066`.
    Orchid,
    /// Index 29, `#FF8080`.
    Coral,
    /// Index 30, `#0066CC`.
    RoyalBlue,
    /// Index 31, `#CCCCFF`.
    LightCornflowerBlue,
    /// Index 40, `#00CCFF`.
    SkyBlue,
    /// Index 41, `#CCFFFF`.
    LightTurquoise,
    /// Index 42, `#CCFFCC`.
    LightGreen,
    /// Index 43, `#FFFF99`.
    LightYellow,
    /// Index 44, `#99CCFF`.
    PaleBlue,
    /// Index 45, `#FF99CC`.
    Rose,
    /// Index 46, `#CC99FF`.
    Lavender,
    /// Index 47, `#FFCC99`.
    Tan,
    /// Index 48, `#3366FF`.
    LightBlue,
    /// Index 49, `#33CCCC`.
    Aqua,
    /// Index 50, `#99CC00`.
    Lime,
    /// Index 51, `#FFCC00`.
    Gold,
    /// Index 52, `#FF9900`.
    LightOrange,
    /// Index 53, `#FF6600`.
    Orange,
    /// Index 54, `#666699`.
    BlueGrey,
    /// Index 55, `#969696`.
    Grey40Percent,
    /// Index 56, `#003366`.
    DarkTeal,
    /// Index 57, `#339966`.
    SeaGreen,
    /// Index 58, `#003300`.
    DarkGreen,
    /// Index 59, `#333300`.
    OliveGreen,
    /// Index 60, `#993300`.
    Brown,
    /// Index 61, `#993366`.
    Plum,
    /// Index 62, `#333399`.
    Indigo,
    /// Index 63, `#333333`.
    Grey80Percent,
    /// System foreground/background color.
    #[default]
    Automatic,
}

impl EnumIndexedColor {
    /// Palette index as stored in legacy workbooks.
    pub fn index(self) -> u16 {
        self.palette_entry().0
    }

    /// Default palette RGB value; `None` for [`Self::Automatic`].
    pub fn rgb(self) -> Option<u32> {
        self.palette_entry().1
    }

    fn palette_entry(self) -> (u16, Option<u32>) {
        match self {
            Self::Black => (8, Some(0x000000)),
            Self::White => (9, Some(0xFFFFFF)),
            Self::Red => (10, Some(0xFF0000)),
            Self::BrightGreen => (11, Some(0x00FF00)),
            Self::Blue => (12, Some(0x0000FF)),
            Self::Yellow => (13, Some(0xFFFF00)),
            Self::Pink => (14, Some(0xFF00FF)),
            Self::Turquoise => (15, Some(0x00FFFF)),
            Self::DarkRed => (16, Some(0x800000)),
            Self::Green => (17, Some(0x008000)),
            Self::DarkBlue => (18, Some(0x000080)),
            Self::DarkYellow => (19, Some(0x808000)),
            Self::Violet => (20, Some(0x800080)),
            Self::Teal => (21, Some(0x008080)),
            Self::Grey25Percent => (22, Some(0xC0C0C0)),
            Self::Grey50Percent => (23, Some(0x808080)),
            Self::CornflowerBlue => (24, Some(0x9999FF)),
            Self::Maroon => (25, Some(0x993366)),
            Self::LemonChiffon => (26, Some(0xFFFFCC)),
            Self::LightTurquoise1 => (27, Some(0xCCFFFF)),
            Self::Orchid => (28, Some(0x660066)),
            Self::Coral => (29, Some(0xFF8080)),
            Self::RoyalBlue => (30, Some(0x0066CC)),
            Self::LightCornflowerBlue => (31, Some(0xCCCCFF)),
            Self::SkyBlue => (40, Some(0x00CCFF)),
            Self::LightTurquoise => (41, Some(0xCCFFFF)),
            Self::LightGreen => (42, Some(0xCCFFCC)),
            Self::LightYellow => (43, Some(0xFFFF99)),
            Self::PaleBlue => (44, Some(0x99CCFF)),
            Self::Rose => (45, Some(0xFF99CC)),
            Self::Lavender => (46, Some(0xCC99FF)),
            Self::Tan => (47, Some(0xFFCC99)),
            Self::LightBlue => (48, Some(0x3366FF)),
            Self::Aqua => (49, Some(0x33CCCC)),
            Self::Lime => (50, Some(0x99CC00)),
            Self::Gold => (51, Some(0xFFCC00)),
            Self::LightOrange => (52, Some(0xFF9900)),
            Self::Orange => (53, Some(0xFF6600)),
            Self::BlueGrey => (54, Some(0x666699)),
            Self::Grey40Percent => (55, Some(0x969696)),
            Self::DarkTeal => (56, Some(0x003366)),
            Self::SeaGreen => (57, Some(0x339966)),
            Self::DarkGreen => (58, Some(0x003300)),
            Self::OliveGreen => (59, Some(0x333300)),
            Self::Brown => (60, Some(0x993300)),
            Self::Plum => (61, Some(0x993366)),
            Self::Indigo => (62, Some(0x333399)),
            Self::Grey80Percent => (63, Some(0x333333)),
            Self::Automatic => (64, None),
        }
    }
}

/// Cell fill patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumFillPattern {
    /// No fill.
    #[default]
    None,
    /// Solid foreground fill.
    Solid,
    /// 50% gray dots.
    MediumGray,
    /// 75% gray dots.
    DarkGray,
    /// 25% gray dots.
    LightGray,
    /// Thick horizontal stripes.
    DarkHorizontal,
    /// Thick vertical stripes.
    DarkVertical,
    /// Thick diagonal stripes, top-left to bottom-right.
    DarkDown,
    /// Thick diagonal stripes, bottom-left to top-right.
    DarkUp,
    /// Thick crosshatch.
    DarkGrid,
    /// Thick diagonal crosshatch.
    DarkTrellis,
    /// Thin horizontal stripes.
    LightHorizontal,
    /// Thin vertical stripes.
    LightVertical,
    /// Thin diagonal stripes, top-left to bottom-right.
    LightDown,
    /// Thin diagonal stripes, bottom-left to top-right.
    LightUp,
    /// Thin crosshatch.
    LightGrid,
    /// Thin diagonal crosshatch.
    LightTrellis,
    /// 12.5% gray dots.
    Gray125,
    /// 6.25% gray dots.
    Gray0625,
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumHorizontalAlignment {
    /// Text left, numbers right.
    #[default]
    General,
    /// Left aligned.
    Left,
    /// Centered.
    Center,
    /// Right aligned.
    Right,
    /// Repeat content to fill the cell.
    Fill,
    /// Justified.
    Justify,
    /// Centered across the selection.
    CenterSelection,
    /// Distributed evenly.
    Distributed,
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumVerticalAlignment {
    /// Top aligned.
    Top,
    /// Vertically centered.
    Center,
    /// Bottom aligned.
    #[default]
    Bottom,
    /// Justified.
    Justify,
    /// Distributed evenly.
    Distributed,
}

/// Cell border line styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnumBorderStyle {
    /// No border.
    #[default]
    None,
    /// Thin line.
    Thin,
    /// Medium line.
    Medium,
    /// Dashed line.
    Dashed,
    /// Dotted line.
    Dotted,
    /// Thick line.
    Thick,
    /// Double line.
    Double,
    /// Hairline.
    Hair,
    /// Medium dashed line.
    MediumDashed,
    /// Dash-dot line.
    DashDot,
    /// Medium dash-dot line.
    MediumDashDot,
    /// Dash-dot-dot line.
    DashDotDot,
    /// Medium dash-dot-dot line.
    MediumDashDotDot,
    /// Slanted dash-dot line.
    SlantDashDot,
}

/// Workbook container flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumWorkbookKind {
    /// Zip-based OOXML workbook (`.xlsx`).
    #[default]
    Xlsx,
    /// Legacy compound binary workbook (`.xls`), read-only.
    Xls,
}

impl EnumWorkbookKind {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StyleSpecification

/// Font definition stored in the workbook font table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecFont {
    /// Font family name.
    pub name: String,
    /// Height in twentieths of a point.
    pub height_twips: u16,
    /// Font color.
    pub color: EnumIndexedColor,
    /// Bold style.
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Strikeout style.
    pub strikeout: bool,
    /// Single underline.
    pub underline: bool,
}

impl SpecFont {
    /// Height in points.
    pub fn height_points(&self) -> f64 {
        f64::from(self.height_twips) / 20.0
    }
}

impl Default for SpecFont {
    fn default() -> Self {
        Self {
            name: STR_FONT_NAME_DEFAULT.to_string(),
            height_twips: 220,
            color: EnumIndexedColor::Automatic,
            bold: false,
            italic: false,
            strikeout: false,
            underline: false,
        }
    }
}

/// Cell style definition stored in the workbook style table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecCellStyle {
    /// Index into the workbook font table.
    pub font: usize,
    /// Pattern (foreground) fill color.
    pub fill_foreground: EnumIndexedColor,
    /// Pattern background fill color.
    pub fill_background: EnumIndexedColor,
    /// Fill pattern.
    pub fill_pattern: EnumFillPattern,
    /// Horizontal alignment.
    pub align: EnumHorizontalAlignment,
    /// Vertical alignment.
    pub valign: EnumVerticalAlignment,
    /// Top border.
    pub border_top: EnumBorderStyle,
    /// Bottom border.
    pub border_bottom: EnumBorderStyle,
    /// Left border.
    pub border_left: EnumBorderStyle,
    /// Right border.
    pub border_right: EnumBorderStyle,
    /// Top border color.
    pub border_top_color: EnumIndexedColor,
    /// Bottom border color.
    pub border_bottom_color: EnumIndexedColor,
    /// Left border color.
    pub border_left_color: EnumIndexedColor,
    /// Right border color.
    pub border_right_color: EnumIndexedColor,
    /// Number format code.
    pub num_format: String,
    /// Text wrap.
    pub wrap_text: bool,
}

impl Default for SpecCellStyle {
    fn default() -> Self {
        Self {
            font: 0,
            fill_foreground: EnumIndexedColor::Automatic,
            fill_background: EnumIndexedColor::Automatic,
            fill_pattern: EnumFillPattern::None,
            align: EnumHorizontalAlignment::General,
            valign: EnumVerticalAlignment::Bottom,
            border_top: EnumBorderStyle::None,
            border_bottom: EnumBorderStyle::None,
            border_left: EnumBorderStyle::None,
            border_right: EnumBorderStyle::None,
            border_top_color: EnumIndexedColor::Automatic,
            border_bottom_color: EnumIndexedColor::Automatic,
            border_left_color: EnumIndexedColor::Automatic,
            border_right_color: EnumIndexedColor::Automatic,
            num_format: STR_NUM_FORMAT_GENERAL.to_string(),
            wrap_text: false,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RangeAndCommentSpecification

/// Inclusive rectangular cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecCellRange {
    /// First row (inclusive).
    pub first_row: u32,
    /// Last row (inclusive).
    pub last_row: u32,
    /// First column (inclusive).
    pub first_col: u16,
    /// Last column (inclusive).
    pub last_col: u16,
}

impl SpecCellRange {
    /// Build a validated range.
    pub fn new(first_row: u32, last_row: u32, first_col: u16, last_col: u16) -> Result<Self> {
        if first_row > last_row || first_col > last_col {
            return Err(XelhuaError::InvalidRange(format!(
                "first must not exceed last: rows {first_row}..={last_row}, cols {first_col}..={last_col}"
            )));
        }
        if last_row as usize >= N_NROWS_EXCEL_MAX || last_col as usize >= N_NCOLS_EXCEL_MAX {
            return Err(XelhuaError::InvalidRange(format!(
                "range exceeds Excel limits: rows ..={last_row}, cols ..={last_col}"
            )));
        }
        Ok(Self {
            first_row,
            last_row,
            first_col,
            last_col,
        })
    }

    /// Number of cells covered.
    pub fn num_cells(&self) -> u64 {
        u64::from(self.last_row - self.first_row + 1)
            * u64::from(self.last_col - self.first_col + 1)
    }

    /// Whether `(row, col)` lies inside the range.
    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }

    /// Whether two ranges share at least one cell.
    pub fn overlaps(&self, other: &SpecCellRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }
}

impl fmt::Display for SpecCellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            derive_cell_reference(self.first_row, self.first_col),
            derive_cell_reference(self.last_row, self.last_col)
        )
    }
}

/// Cell comment (note).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecComment {
    /// Comment body.
    pub text: String,
    /// Optional author.
    pub author: Option<String>,
}

impl SpecComment {
    /// Comment without author.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
        }
    }

    /// Set author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WritePolicySpecification

/// Bounds applied when inferring column widths from content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitPolicy {
    /// Minimum final width in characters.
    pub width_cell_min: usize,
    /// Maximum final width in characters.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitPolicy {
    fn default() -> Self {
        Self {
            width_cell_min: 1,
            width_cell_max: 255,
            width_cell_padding: 1,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
