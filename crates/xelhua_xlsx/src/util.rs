//! Stateless helper utilities shared by the workbook model, reader and writer.

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, STR_NUM_FORMAT_GENERAL,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{Result, XelhuaError};

////////////////////////////////////////////////////////////////////////////////
// #region IndexValidation

/// Convert and validate a zero-based row index.
pub fn cast_row_num(value: usize) -> Result<u32> {
    if value >= N_NROWS_EXCEL_MAX {
        return Err(XelhuaError::IndexOutOfBounds(format!(
            "row index {value} exceeds Excel limit {N_NROWS_EXCEL_MAX}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| XelhuaError::IndexOutOfBounds(format!("row index overflow: {value}")))
}

/// Convert and validate a zero-based column index.
pub fn cast_col_num(value: usize) -> Result<u16> {
    if value >= N_NCOLS_EXCEL_MAX {
        return Err(XelhuaError::IndexOutOfBounds(format!(
            "column index {value} exceeds Excel limit {N_NCOLS_EXCEL_MAX}"
        )));
    }
    u16::try_from(value)
        .map_err(|_| XelhuaError::IndexOutOfBounds(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellReference

/// Column letters for a zero-based column index (`0 -> A`, `27 -> AB`).
pub fn derive_column_letters(col: u16) -> String {
    let mut n_rest = u32::from(col) + 1;
    let mut l_chars = Vec::new();
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push(char::from(b'A' + n_rem as u8));
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

/// A1-style reference for zero-based `(row, col)`.
pub fn derive_cell_reference(row: u32, col: u16) -> String {
    format!("{}{}", derive_column_letters(col), u64::from(row) + 1)
}

/// Parse an A1-style reference (`$` anchors allowed) into zero-based `(row, col)`.
pub fn parse_cell_reference(reference: &str) -> Option<(u32, u16)> {
    let c_ref = reference.trim().replace('$', "");
    let n_split = c_ref.find(|chr: char| chr.is_ascii_digit())?;
    let (c_letters, c_digits) = c_ref.split_at(n_split);
    if c_letters.is_empty() || !c_letters.chars().all(|chr| chr.is_ascii_alphabetic()) {
        return None;
    }

    let mut n_col: usize = 0;
    for chr in c_letters.chars() {
        n_col = n_col * 26 + (chr.to_ascii_uppercase() as usize - 'A' as usize + 1);
        if n_col > N_NCOLS_EXCEL_MAX {
            return None;
        }
    }
    let n_row: usize = c_digits.parse().ok()?;
    if n_row == 0 {
        return None;
    }

    Some((cast_row_num(n_row - 1).ok()?, cast_col_num(n_col - 1).ok()?))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DateSerial

static DATE_EPOCH_1900: LazyLock<NaiveDateTime> = LazyLock::new(|| {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid 1900 epoch")
});

const N_MS_PER_DAY: i64 = 86_400_000;

/// Excel serial number (1900 date system) for a date-time.
///
/// Dates before 1900-03-01 shift by one day for the phantom 1900-02-29.
pub fn convert_date_time_to_serial(value: NaiveDateTime) -> Result<f64> {
    let n_days = (value.date() - DATE_EPOCH_1900.date()).num_days();
    let n_days = if n_days < 61 { n_days - 1 } else { n_days };
    if n_days < 0 {
        return Err(XelhuaError::InvalidDate(format!(
            "{value} precedes the 1900 date system"
        )));
    }

    let n_ms_of_day = i64::from(value.num_seconds_from_midnight()) * 1_000
        + i64::from(value.nanosecond() / 1_000_000);
    Ok(n_days as f64 + n_ms_of_day as f64 / N_MS_PER_DAY as f64)
}

/// Excel serial number (1900 date system) for a date at midnight.
pub fn convert_date_to_serial(value: NaiveDate) -> Result<f64> {
    let value = value
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| XelhuaError::InvalidDate(format!("{value} has no midnight")))?;
    convert_date_time_to_serial(value)
}

/// Date-time for an Excel serial number (1900 date system), millisecond precision.
pub fn convert_serial_to_date_time(serial: f64) -> Result<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return Err(XelhuaError::InvalidDate(format!(
            "serial {serial} is not a valid date"
        )));
    }

    let mut n_days = serial.floor() as i64;
    let mut n_ms = ((serial - serial.floor()) * N_MS_PER_DAY as f64).round() as i64;
    if n_ms >= N_MS_PER_DAY {
        n_days = n_days.saturating_add(1);
        n_ms -= N_MS_PER_DAY;
    }
    if n_days == 60 {
        return Err(XelhuaError::InvalidDate(
            "serial 60 is the nonexistent 1900-02-29".to_string(),
        ));
    }
    let n_days = if n_days < 60 { n_days + 1 } else { n_days };

    Duration::try_days(n_days)
        .zip(Duration::try_milliseconds(n_ms))
        .and_then(|(delta_days, delta_ms)| delta_days.checked_add(&delta_ms))
        .and_then(|delta| DATE_EPOCH_1900.checked_add_signed(delta))
        .ok_or_else(|| XelhuaError::InvalidDate(format!("serial {serial} out of range")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region NumberFormat

static RE_FMT_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|\\.|_.|\*."#).expect("valid literal regex"));
static RE_FMT_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").expect("valid bracket regex"));
static RE_FMT_ELAPSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(h+|m+|s+)$").expect("valid elapsed regex"));
static RE_FMT_DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[ydhms]").expect("valid date token regex"));

/// Whether a number format code renders its value as a date and/or time.
///
/// Literal text, escapes, colors and locale tags are ignored; elapsed-time
/// tokens such as `[h]` count as time.
pub fn is_date_format(code: &str) -> bool {
    let c_code = code.trim();
    if c_code.is_empty() || c_code.eq_ignore_ascii_case(STR_NUM_FORMAT_GENERAL) {
        return false;
    }

    let c_section = c_code.split(';').next().unwrap_or_default();
    let c_stripped = RE_FMT_QUOTED.replace_all(c_section, "");
    let c_stripped = RE_FMT_BRACKET.replace_all(&c_stripped, |caps: &regex::Captures<'_>| {
        if RE_FMT_ELAPSED.is_match(&caps[1]) {
            caps[1].to_string()
        } else {
            String::new()
        }
    });
    if c_stripped.contains('#') || c_stripped.contains('@') || c_stripped.contains('?') {
        return false;
    }
    RE_FMT_DATE_TOKEN.is_match(&c_stripped)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TextUtils

/// Number text in the `1.0` / `1.5E7` style: integral values keep a `.0`,
/// magnitudes outside `[1e-3, 1e7)` use an exponent.
pub fn format_number_label(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let c_text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return c_text.to_string();
    }

    let n_abs = value.abs();
    if n_abs == 0.0 || (1e-3..1e7).contains(&n_abs) {
        let c_text = value.to_string();
        return if c_text.contains('.') { c_text } else { format!("{c_text}.0") };
    }

    let c_text = format!("{value:e}");
    match c_text.split_once('e') {
        Some((c_mantissa, c_exp)) if c_mantissa.contains('.') => format!("{c_mantissa}E{c_exp}"),
        Some((c_mantissa, c_exp)) => format!("{c_mantissa}.0E{c_exp}"),
        None => c_text,
    }
}

/// Estimate displayed width (in characters) of a string; wide glyphs count ~1.6.
pub fn estimate_unicode_string_width(s: &str) -> usize {
    s.lines()
        .map(|line| {
            let n_ascii = line.chars().filter(|chr| chr.is_ascii()).count();
            let n_non_ascii = line.chars().count().saturating_sub(n_ascii);
            n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
        })
        .max()
        .unwrap_or(0)
}

/// Strip whitespace and a leading `=` from formula text.
pub fn normalize_formula(formula: &str) -> String {
    let c_trimmed = formula.trim();
    c_trimmed.strip_prefix('=').unwrap_or(c_trimmed).trim().to_string()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
