//! Layout parameter set: arrangement mode, spacing fractions, and colors.
//!
//! Everything that reaches the layout calculator passes through this module
//! first. Out-of-range slider values are clamped here, so
//! [`compute_layout`](crate::layout::compute_layout) never has to handle them.
//!
//! # Example
//!
//! ```
//! use zencompose::params::{self, ArrangementMode};
//!
//! let result = params::parse("layout=grid&padding=20&bg=%23000000");
//! assert!(result.warnings.is_empty());
//! assert_eq!(result.params.arrangement, ArrangementMode::Grid);
//! assert_eq!(result.params.padding.get(), 0.2);
//! ```

mod color;
mod query;

pub use color::parse_hex;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::geometry::Rgb;

/// How images are arranged on the composite canvas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ArrangementMode {
    /// One row, every image scaled to the tallest height.
    #[default]
    Horizontal,
    /// One column, every image scaled to the widest width.
    Vertical,
    /// Square cells in row-major order, images letterboxed in each cell.
    Grid,
}

impl ArrangementMode {
    /// Lowercase name used on the parameter surface.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Grid => "grid",
        }
    }
}

impl fmt::Display for ArrangementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArrangementMode {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("horizontal") {
            Ok(Self::Horizontal)
        } else if s.eq_ignore_ascii_case("vertical") {
            Ok(Self::Vertical)
        } else if s.eq_ignore_ascii_case("grid") {
            Ok(Self::Grid)
        } else {
            Err(ParamError::InvalidArrangement(String::from(s)))
        }
    }
}

/// A normalized slider value, always within `0.0..=1.0`.
///
/// The UI reports sliders in raw units `0..=100`; [`from_slider`](Self::from_slider)
/// does the division and the clamping. NaN becomes zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Fraction(f64);

impl Fraction {
    /// No spacing.
    pub const ZERO: Self = Self(0.0);
    /// Full range: half of the largest image dimension.
    pub const ONE: Self = Self(1.0);

    /// Clamp a normalized value into `0.0..=1.0`.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    /// Convert raw slider units (`0..=100`) into a fraction.
    pub fn from_slider(raw: f64) -> Self {
        Self::new(raw / 100.0)
    }

    /// The normalized value.
    pub const fn get(self) -> f64 {
        self.0
    }

    /// The value in raw slider units (`0..=100`).
    pub fn to_slider(self) -> f64 {
        self.0 * 100.0
    }

    /// Whether this fraction produces no spacing at all.
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

/// User-adjustable styling for the composite.
///
/// Defaults match a freshly opened tool: horizontal, no padding, no border,
/// white background, white border color.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayoutParameters {
    /// Which layout algorithm to run.
    pub arrangement: ArrangementMode,
    /// Gap between images, relative to half the largest image dimension.
    pub padding: Fraction,
    /// Frame width, relative to half the largest image dimension.
    pub border_width: Fraction,
    /// Canvas fill.
    pub background: Rgb,
    /// Frame color.
    pub border_color: Rgb,
}

impl Default for LayoutParameters {
    fn default() -> Self {
        Self {
            arrangement: ArrangementMode::Horizontal,
            padding: Fraction::ZERO,
            border_width: Fraction::ZERO,
            background: Rgb::WHITE,
            border_color: Rgb::WHITE,
        }
    }
}

impl LayoutParameters {
    /// Default parameters with the given arrangement.
    pub fn new(arrangement: ArrangementMode) -> Self {
        Self {
            arrangement,
            ..Self::default()
        }
    }

    /// Set padding from raw slider units (`0..=100`, clamped).
    pub fn padding_slider(mut self, raw: f64) -> Self {
        self.padding = Fraction::from_slider(raw);
        self
    }

    /// Set border width from raw slider units (`0..=100`, clamped).
    pub fn border_slider(mut self, raw: f64) -> Self {
        self.border_width = Fraction::from_slider(raw);
        self
    }

    /// Set the background color.
    pub fn background(mut self, color: Rgb) -> Self {
        self.background = color;
        self
    }

    /// Set the border color.
    pub fn border_color(mut self, color: Rgb) -> Self {
        self.border_color = color;
        self
    }
}

/// The parameter surface exactly as a UI reports it: raw slider units and
/// hex strings.
///
/// With the `serde` feature this (de)serializes with camelCase keys, so a
/// JSON object from a web front end maps straight onto it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct RawParameters {
    /// `horizontal`, `vertical`, or `grid`.
    pub arrangement_mode: String,
    /// Slider units, `0..=100`.
    pub padding_fraction: f64,
    /// Slider units, `0..=100`.
    pub border_width_fraction: f64,
    /// Hex color.
    pub background_color: String,
    /// Hex color.
    pub border_color: String,
}

impl Default for RawParameters {
    fn default() -> Self {
        let defaults = LayoutParameters::default();
        Self::from(&defaults)
    }
}

impl From<&LayoutParameters> for RawParameters {
    fn from(p: &LayoutParameters) -> Self {
        use alloc::string::ToString;
        Self {
            arrangement_mode: String::from(p.arrangement.as_str()),
            padding_fraction: p.padding.to_slider(),
            border_width_fraction: p.border_width.to_slider(),
            background_color: p.background.to_string(),
            border_color: p.border_color.to_string(),
        }
    }
}

impl RawParameters {
    /// Validate and clamp into [`LayoutParameters`].
    ///
    /// Numbers are clamped; the mode and both colors must parse.
    pub fn to_params(&self) -> Result<LayoutParameters, ParamError> {
        let color = |s: &str| parse_hex(s).ok_or_else(|| ParamError::InvalidColor(String::from(s)));
        Ok(LayoutParameters {
            arrangement: self.arrangement_mode.parse()?,
            padding: Fraction::from_slider(self.padding_fraction),
            border_width: Fraction::from_slider(self.border_width_fraction),
            background: color(&self.background_color)?,
            border_color: color(&self.border_color)?,
        })
    }
}

/// A parameter value that can't be clamped into range.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// Not `#RGB` or `#RRGGBB`.
    #[error("invalid color {0:?}: expected #RGB or #RRGGBB")]
    InvalidColor(String),
    /// Not one of the arrangement mode names.
    #[error("invalid arrangement {0:?}: expected horizontal|vertical|grid")]
    InvalidArrangement(String),
}

/// Result of parsing a parameter query string.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed parameters, defaults where a key was missing or invalid.
    pub params: LayoutParameters,
    /// Non-fatal parse warnings.
    pub warnings: Vec<ParseWarning>,
}

/// Non-fatal warning from query string parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// A key appeared more than once (last value wins).
    DuplicateKey { key: String, value: String },
    /// A key that isn't a layout parameter.
    KeyNotRecognized { key: String, value: String },
    /// A key was recognized but its value could not be parsed.
    ValueInvalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Parse a parameter query string (with or without leading `?`).
///
/// Keys are case-insensitive: `layout` (aliases `arrangement`, `mode`),
/// `padding`, `border` (alias `borderwidth`), `bg` (aliases `background`,
/// `backgroundcolor`), and `bordercolor`. Slider values are raw `0..=100`
/// units and are clamped; colors are hex.
pub fn parse(query: &str) -> ParseResult {
    let (params, warnings) = query::parse_query(query);
    ParseResult { params, warnings }
}
