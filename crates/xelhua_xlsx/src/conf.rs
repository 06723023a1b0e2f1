//! Workbook constants, default presets and artifact manifest.

use std::collections::BTreeMap;

use crate::spec::SpecAutofitPolicy;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Maximum number of cell styles in one workbook.
pub const N_STYLES_EXCEL_MAX: usize = 64_000;
/// Maximum column width in characters.
pub const N_WIDTH_COLUMN_MAX: f64 = 255.0;
/// Maximum row height in points.
pub const N_HEIGHT_ROW_MAX: f64 = 409.0;

/// Column width used when neither the column nor the sheet sets one.
pub const N_WIDTH_COLUMN_DEFAULT: f64 = 8.43;
/// Row height used when neither the row nor the sheet sets one.
pub const N_HEIGHT_ROW_DEFAULT: f64 = 15.0;

/// Default font family.
pub const STR_FONT_NAME_DEFAULT: &str = "Calibri";
/// Number format of unformatted cells.
pub const STR_NUM_FORMAT_GENERAL: &str = "General";
/// Number format applied by date writes.
pub const STR_FMT_DATE_DEFAULT: &str = "yyyy-mm-dd";
/// Number format applied by date-time writes.
pub const STR_FMT_DATE_TIME_DEFAULT: &str = "yyyy-mm-dd hh:mm:ss";
/// Number format given to duration cells found while reading.
pub const STR_FMT_DURATION_DEFAULT: &str = "[h]:mm:ss";

/// Name given to sheets created without one (`Sheet1`, `Sheet2`, ...).
pub const STR_SHEET_NAME_PREFIX: &str = "Sheet";

/// Artifact title.
pub const STR_IMPLEMENTATION_TITLE: &str = env!("CARGO_PKG_NAME");
/// Artifact version.
pub const STR_IMPLEMENTATION_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Artifact vendor.
pub const STR_IMPLEMENTATION_VENDOR: &str = "ELEX co.,pte.";
/// Stable module name of the artifact.
pub const STR_AUTOMATIC_MODULE_NAME: &str = "com.elex_project.dwarf";

/// Build-provenance attributes of this artifact.
pub fn manifest() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("Implementation-Title", STR_IMPLEMENTATION_TITLE),
        ("Implementation-Version", STR_IMPLEMENTATION_VERSION),
        ("Implementation-Vendor", STR_IMPLEMENTATION_VENDOR),
        ("Automatic-Module-Name", STR_AUTOMATIC_MODULE_NAME),
    ])
}

/// Build default autofit bounds used by [`crate::base::auto_width`].
pub fn derive_default_autofit_policy() -> SpecAutofitPolicy {
    SpecAutofitPolicy::default()
}
