//! Deduplicated font/cell-style registry and the chainable style builders.

use std::collections::HashMap;

use tracing::debug;

use crate::conf::N_STYLES_EXCEL_MAX;
use crate::model::Cell;
use crate::spec::{
    EnumBorderStyle, EnumFillPattern, EnumHorizontalAlignment, EnumIndexedColor,
    EnumVerticalAlignment, Result, SpecCellStyle, SpecFont, XelhuaError,
};

////////////////////////////////////////////////////////////////////////////////
// #region StyleTable

/// Workbook-wide table of fonts and cell styles, referenced by index.
///
/// Index 0 of both tables is the workbook default and always exists.
/// Registering a spec equal to an existing entry returns that entry's index.
#[derive(Debug, Clone)]
pub struct StyleTable {
    l_fonts: Vec<SpecFont>,
    dict_font_idx: HashMap<SpecFont, usize>,
    l_styles: Vec<SpecCellStyle>,
    dict_style_idx: HashMap<SpecCellStyle, usize>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTable {
    /// Table holding only the default font and style.
    pub fn new() -> Self {
        let font_default = SpecFont::default();
        let style_default = SpecCellStyle::default();
        Self {
            l_fonts: vec![font_default.clone()],
            dict_font_idx: HashMap::from([(font_default, 0)]),
            l_styles: vec![style_default.clone()],
            dict_style_idx: HashMap::from([(style_default, 0)]),
        }
    }

    /// Intern a font and return its index.
    pub fn register_font(&mut self, font: SpecFont) -> Result<usize> {
        if let Some(n_idx) = self.dict_font_idx.get(&font) {
            return Ok(*n_idx);
        }
        if self.l_fonts.len() >= N_STYLES_EXCEL_MAX {
            return Err(XelhuaError::StyleLimitExceeded(format!(
                "font table is full ({N_STYLES_EXCEL_MAX})"
            )));
        }
        let n_idx = self.l_fonts.len();
        debug!(index = n_idx, name = %font.name, "registered font");
        self.dict_font_idx.insert(font.clone(), n_idx);
        self.l_fonts.push(font);
        Ok(n_idx)
    }

    /// Intern a cell style and return its index.
    ///
    /// The style's font index must refer to a registered font.
    pub fn register_style(&mut self, style: SpecCellStyle) -> Result<usize> {
        if style.font >= self.l_fonts.len() {
            return Err(XelhuaError::IndexOutOfBounds(format!(
                "style refers to font {} but only {} fonts exist",
                style.font,
                self.l_fonts.len()
            )));
        }
        if let Some(n_idx) = self.dict_style_idx.get(&style) {
            return Ok(*n_idx);
        }
        if self.l_styles.len() >= N_STYLES_EXCEL_MAX {
            return Err(XelhuaError::StyleLimitExceeded(format!(
                "cell style table is full ({N_STYLES_EXCEL_MAX})"
            )));
        }
        let n_idx = self.l_styles.len();
        debug!(index = n_idx, num_format = %style.num_format, "registered cell style");
        self.dict_style_idx.insert(style.clone(), n_idx);
        self.l_styles.push(style);
        Ok(n_idx)
    }

    /// Style index of `base` with its number format replaced by `code`.
    pub fn register_number_format(&mut self, base: usize, code: &str) -> Result<usize> {
        let mut style = self
            .style_at(base)
            .cloned()
            .ok_or_else(|| XelhuaError::IndexOutOfBounds(format!("style index {base}")))?;
        style.num_format = code.to_string();
        self.register_style(style)
    }

    /// Font at `index`.
    pub fn font_at(&self, index: usize) -> Option<&SpecFont> {
        self.l_fonts.get(index)
    }

    /// Cell style at `index`.
    pub fn style_at(&self, index: usize) -> Option<&SpecCellStyle> {
        self.l_styles.get(index)
    }

    /// Number of fonts, default included.
    pub fn num_fonts(&self) -> usize {
        self.l_fonts.len()
    }

    /// Number of cell styles, default included.
    pub fn num_styles(&self) -> usize {
        self.l_styles.len()
    }

    /// All cell styles in index order.
    pub fn styles(&self) -> &[SpecCellStyle] {
        &self.l_styles
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FontBuilder

/// Chainable font builder.
///
/// ```
/// use xelhua_xlsx::{EnumIndexedColor, FontBuilder, StyleTable};
///
/// let mut styles = StyleTable::new();
/// let n_font = FontBuilder::new()
///     .height(16.0)
///     .color(EnumIndexedColor::Red)
///     .bold(true)
///     .build(&mut styles)
///     .unwrap();
/// assert_eq!(n_font, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FontBuilder {
    font: SpecFont,
}

impl FontBuilder {
    /// Start from the default font.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the font at `index` of `styles`.
    pub fn from_index(styles: &StyleTable, index: usize) -> Result<Self> {
        let font = styles
            .font_at(index)
            .cloned()
            .ok_or_else(|| XelhuaError::IndexOutOfBounds(format!("font index {index}")))?;
        Ok(Self { font })
    }

    /// Start from an existing font spec.
    pub fn from_font(font: SpecFont) -> Self {
        Self { font }
    }

    /// Font family name.
    pub fn name(mut self, font_name: impl Into<String>) -> Self {
        self.font.name = font_name.into();
        self
    }

    /// Font color.
    pub fn color(mut self, color: EnumIndexedColor) -> Self {
        self.font.color = color;
        self
    }

    /// Bold weight.
    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    /// Italic slant.
    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    /// Strike-through line.
    pub fn strikeout(mut self, strikeout: bool) -> Self {
        self.font.strikeout = strikeout;
        self
    }

    /// Single underline on/off.
    pub fn underline(mut self, underline: bool) -> Self {
        self.font.underline = underline;
        self
    }

    /// Height in points; stored in twentieths of a point.
    pub fn height(mut self, points: f64) -> Self {
        self.font.height_twips = (points.max(0.0) * 20.0).round().min(f64::from(u16::MAX)) as u16;
        self
    }

    /// Finish building and return the spec.
    pub fn get(self) -> SpecFont {
        self.font
    }

    /// Register the font in `styles` and return its index.
    pub fn build(self, styles: &mut StyleTable) -> Result<usize> {
        styles.register_font(self.font)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellStyleBuilder

/// Chainable cell style builder.
///
/// Styles are interned values: building from an existing style and
/// registering yields a new index, the original stays untouched.
#[derive(Debug, Clone, Default)]
pub struct CellStyleBuilder {
    style: SpecCellStyle,
}

impl CellStyleBuilder {
    /// Start from the default style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the style at `index` of `styles`.
    pub fn from_index(styles: &StyleTable, index: usize) -> Result<Self> {
        let style = styles
            .style_at(index)
            .cloned()
            .ok_or_else(|| XelhuaError::IndexOutOfBounds(format!("style index {index}")))?;
        Ok(Self { style })
    }

    /// Start from the style currently applied to `cell`.
    pub fn from_cell(styles: &StyleTable, cell: &Cell) -> Result<Self> {
        Self::from_index(styles, cell.style())
    }

    /// Start from an existing style spec.
    pub fn from_style(style: SpecCellStyle) -> Self {
        Self { style }
    }

    /// Solid background fill.
    pub fn background(self, color: EnumIndexedColor) -> Self {
        self.background_with_pattern(color, EnumFillPattern::Solid)
    }

    /// Pattern fill with the given pattern color.
    pub fn background_with_pattern(
        mut self,
        color: EnumIndexedColor,
        pattern: EnumFillPattern,
    ) -> Self {
        self.style.fill_foreground = color;
        self.style.fill_pattern = pattern;
        self
    }

    /// Pattern fill with explicit pattern and background colors.
    pub fn background_with_colors(
        mut self,
        foreground: EnumIndexedColor,
        background: EnumIndexedColor,
        pattern: EnumFillPattern,
    ) -> Self {
        self.style.fill_foreground = foreground;
        self.style.fill_background = background;
        self.style.fill_pattern = pattern;
        self
    }

    /// Horizontal alignment.
    pub fn align(mut self, alignment: EnumHorizontalAlignment) -> Self {
        self.style.align = alignment;
        self
    }

    /// Vertical alignment.
    pub fn valign(mut self, alignment: EnumVerticalAlignment) -> Self {
        self.style.valign = alignment;
        self
    }

    /// Same border style on all four sides.
    pub fn border(self, border_style: EnumBorderStyle) -> Self {
        self.border_top(border_style)
            .border_bottom(border_style)
            .border_left(border_style)
            .border_right(border_style)
    }

    /// Top edge line style.
    pub fn border_top(mut self, border_style: EnumBorderStyle) -> Self {
        self.style.border_top = border_style;
        self
    }

    /// Top edge color.
    pub fn border_top_color(mut self, color: EnumIndexedColor) -> Self {
        self.style.border_top_color = color;
        self
    }

    /// Left edge line style.
    pub fn border_left(mut self, border_style: EnumBorderStyle) -> Self {
        self.style.border_left = border_style;
        self
    }

    /// Left edge color.
    pub fn border_left_color(mut self, color: EnumIndexedColor) -> Self {
        self.style.border_left_color = color;
        self
    }

    /// Right edge line style.
    pub fn border_right(mut self, border_style: EnumBorderStyle) -> Self {
        self.style.border_right = border_style;
        self
    }

    /// Right edge color.
    pub fn border_right_color(mut self, color: EnumIndexedColor) -> Self {
        self.style.border_right_color = color;
        self
    }

    /// Bottom edge line style.
    pub fn border_bottom(mut self, border_style: EnumBorderStyle) -> Self {
        self.style.border_bottom = border_style;
        self
    }

    /// Bottom edge color.
    pub fn border_bottom_color(mut self, color: EnumIndexedColor) -> Self {
        self.style.border_bottom_color = color;
        self
    }

    /// Font by index; see [`FontBuilder::build`].
    pub fn font(mut self, font_index: usize) -> Self {
        self.style.font = font_index;
        self
    }

    /// Number format code, e.g. `0.00` or `yyyy-mm-dd`.
    pub fn num_format(mut self, code: impl Into<String>) -> Self {
        self.style.num_format = code.into();
        self
    }

    /// Wrap text inside the cell.
    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.style.wrap_text = wrap;
        self
    }

    /// Finish building and return the spec.
    pub fn get(self) -> SpecCellStyle {
        self.style
    }

    /// Register the style in `styles` and return its index.
    pub fn build(self, styles: &mut StyleTable) -> Result<usize> {
        styles.register_style(self.style)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_table_defaults_exist() {
        let styles = StyleTable::new();
        assert_eq!(styles.num_fonts(), 1);
        assert_eq!(styles.num_styles(), 1);
        assert_eq!(styles.font_at(0), Some(&SpecFont::default()));
        assert_eq!(styles.style_at(0), Some(&SpecCellStyle::default()));
    }

    #[test]
    fn test_register_deduplicates() {
        let mut styles = StyleTable::new();
        let n_font_a = FontBuilder::new().bold(true).build(&mut styles).unwrap();
        let n_font_b = FontBuilder::new().bold(true).build(&mut styles).unwrap();
        assert_eq!(n_font_a, n_font_b);
        assert_eq!(styles.num_fonts(), 2);

        let n_style_a = CellStyleBuilder::new()
            .font(n_font_a)
            .background(EnumIndexedColor::Yellow)
            .build(&mut styles)
            .unwrap();
        let n_style_b = CellStyleBuilder::new()
            .background(EnumIndexedColor::Yellow)
            .font(n_font_b)
            .build(&mut styles)
            .unwrap();
        assert_eq!(n_style_a, n_style_b);

        assert_eq!(CellStyleBuilder::new().build(&mut styles).unwrap(), 0);
    }

    #[test]
    fn test_style_with_unknown_font_is_rejected() {
        let mut styles = StyleTable::new();
        let result = CellStyleBuilder::new().font(7).build(&mut styles);
        assert!(matches!(result, Err(XelhuaError::IndexOutOfBounds(_))));
    }

    #[test]
    fn test_font_builder_height_and_flags() {
        let font = FontBuilder::new()
            .name("Arial")
            .height(16.0)
            .italic(true)
            .strikeout(true)
            .underline(true)
            .get();
        assert_eq!(font.name, "Arial");
        assert_eq!(font.height_twips, 320);
        assert_eq!(font.height_points(), 16.0);
        assert!(font.italic && font.strikeout && font.underline);
        assert!(!font.bold);
    }

    #[test]
    fn test_derived_style_leaves_original_untouched() {
        let mut styles = StyleTable::new();
        let n_base = CellStyleBuilder::new()
            .align(EnumHorizontalAlignment::Center)
            .border(EnumBorderStyle::Thin)
            .build(&mut styles)
            .unwrap();
        let n_derived = CellStyleBuilder::from_index(&styles, n_base)
            .unwrap()
            .border_bottom(EnumBorderStyle::Double)
            .border_bottom_color(EnumIndexedColor::Red)
            .build(&mut styles)
            .unwrap();

        assert_ne!(n_base, n_derived);
        let style_base = styles.style_at(n_base).unwrap();
        let style_derived = styles.style_at(n_derived).unwrap();
        assert_eq!(style_base.border_bottom, EnumBorderStyle::Thin);
        assert_eq!(style_derived.border_bottom, EnumBorderStyle::Double);
        assert_eq!(style_derived.border_top, EnumBorderStyle::Thin);
        assert_eq!(style_derived.align, EnumHorizontalAlignment::Center);
    }

    #[test]
    fn test_register_number_format_keeps_other_attributes() {
        let mut styles = StyleTable::new();
        let n_base = CellStyleBuilder::new()
            .background_with_colors(
                EnumIndexedColor::Red,
                EnumIndexedColor::Blue,
                EnumFillPattern::LightGrid,
            )
            .build(&mut styles)
            .unwrap();
        let n_dated = styles.register_number_format(n_base, "yyyy-mm-dd").unwrap();
        let style = styles.style_at(n_dated).unwrap();
        assert_eq!(style.num_format, "yyyy-mm-dd");
        assert_eq!(style.fill_pattern, EnumFillPattern::LightGrid);
        assert_eq!(
            styles.register_number_format(n_base, "yyyy-mm-dd").unwrap(),
            n_dated
        );
        assert!(styles.register_number_format(99, "0").is_err());
    }
}
