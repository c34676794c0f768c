//! Cell colors and tolerance-based color matching
//!
//! A cell holds an optional opaque RGB value; `None` is transparent. Colors
//! are written as upper-case `#RRGGBB` strings in project payloads.
//!
//! Parsing supports:
//! - Hex: `#RGB`, `#RRGGBB` (case-insensitive)
//! - Functional and named CSS colors: `rgb()`, `hsl()`, `red`, ...
//! - `transparent` / `none` for an absent cell (see [`parse_cell_color`])

use std::fmt;
use std::str::FromStr;

use lightningcss::traits::Parse;
use lightningcss::values::color::CssColor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 3 or 6 hex chars after #)
    #[error("invalid color length {0}, expected 3 or 6")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    /// CSS parsing error from lightningcss
    #[error("CSS parse error: {0}")]
    CssParse(String),
    /// A translucent color was given where an opaque one is required
    #[error("color '{0}' is not opaque; cells hold opaque colors only")]
    Translucent(String),
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// The value of one cell: `None` is transparent.
pub type Color = Option<Rgb>;

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Squared Euclidean distance in RGB space.
    pub fn distance_sq(self, other: Rgb) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }

    /// Format as `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Convert to an `image` pixel with the given alpha.
    pub fn to_rgba(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex_color(&s).map_err(serde::de::Error::custom)
    }
}

/// Compare two cell colors under a tolerance.
///
/// - Absent colors are equal only when both are absent and `tolerance` is 0.
///   An absent/present pair never matches.
/// - `tolerance <= 0` compares exactly.
/// - Otherwise the squared RGB distance must be within `tolerance²`.
///
/// ```
/// use pixology::color::{matches, Rgb};
///
/// let red = Some(Rgb::new(255, 0, 0));
/// let near = Some(Rgb::new(250, 3, 0));
/// assert!(!matches(red, near, 0.0));
/// assert!(matches(red, near, 6.0));
/// assert!(matches(None, None, 0.0));
/// assert!(!matches(None, None, 10.0));
/// ```
pub fn matches(target: Color, candidate: Color, tolerance: f64) -> bool {
    match (target, candidate) {
        (None, None) => tolerance <= 0.0,
        (Some(_), None) | (None, Some(_)) => false,
        (Some(a), Some(b)) => {
            if tolerance <= 0.0 {
                a == b
            } else {
                a.distance_sq(b) as f64 <= tolerance * tolerance
            }
        }
    }
}

/// Parse an opaque color string.
///
/// Hex input takes a fast path; everything else goes through lightningcss.
///
/// ```
/// use pixology::color::{parse_color, Rgb};
///
/// assert_eq!(parse_color("#ff0000").unwrap(), Rgb::new(255, 0, 0));
/// assert_eq!(parse_color("#0F0").unwrap(), Rgb::new(0, 255, 0));
/// assert_eq!(parse_color("blue").unwrap(), Rgb::new(0, 0, 255));
/// ```
pub fn parse_color(s: &str) -> Result<Rgb, ColorError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ColorError::Empty);
    }

    if s.starts_with('#') {
        return parse_hex_color(s);
    }

    parse_css_color(s)
}

/// Parse a cell value: a color, or `transparent`/`none` for an absent cell.
pub fn parse_cell_color(s: &str) -> Result<Color, ColorError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("transparent") || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_color(trimmed).map(Some)
}

/// Parse a hex color string (#RGB, #RRGGBB)
pub fn parse_hex_color(s: &str) -> Result<Rgb, ColorError> {
    let hex = s.strip_prefix('#').unwrap_or(s);

    for c in hex.chars() {
        if !c.is_ascii_hexdigit() {
            return Err(ColorError::InvalidHex(c));
        }
    }

    let digits: Vec<u8> = hex.bytes().map(hex_value).collect();
    match digits.as_slice() {
        [r, g, b] => Ok(Rgb::new(r * 17, g * 17, b * 17)),
        [r1, r0, g1, g0, b1, b0] => Ok(Rgb::new(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0)),
        _ => Err(ColorError::InvalidLength(hex.len())),
    }
}

/// Parse a CSS color using lightningcss (rgb, hsl, hwb, named colors)
fn parse_css_color(s: &str) -> Result<Rgb, ColorError> {
    use lightningcss::values::color::FloatColor;

    let css_color = CssColor::parse_string(s).map_err(|e| ColorError::CssParse(e.to_string()))?;
    let rgb_color = css_color
        .to_rgb()
        .map_err(|_| ColorError::CssParse("cannot convert color to RGB".to_string()))?;

    let (r, g, b, a) = match rgb_color {
        CssColor::RGBA(rgba) => (rgba.red, rgba.green, rgba.blue, rgba.alpha),
        CssColor::Float(float_color) => match float_color.as_ref() {
            FloatColor::RGB(rgb) => (
                (rgb.r * 255.0).round() as u8,
                (rgb.g * 255.0).round() as u8,
                (rgb.b * 255.0).round() as u8,
                (rgb.alpha * 255.0).round() as u8,
            ),
            _ => return Err(ColorError::CssParse("unexpected float color format".to_string())),
        },
        _ => return Err(ColorError::CssParse("color conversion did not produce RGB".to_string())),
    };

    if a != 255 {
        return Err(ColorError::Translucent(s.to_string()));
    }
    Ok(Rgb::new(r, g, b))
}

// Only called on validated ASCII hex digits.
fn hex_value(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn test_matches_exact() {
        assert!(matches(Some(RED), Some(RED), 0.0));
        assert!(!matches(Some(RED), Some(Rgb::new(254, 0, 0)), 0.0));
        assert!(matches(Some(RED), Some(RED), -1.0));
    }

    #[test]
    fn test_matches_absent_pairs() {
        assert!(matches(None, None, 0.0));
        assert!(!matches(None, None, 0.5));
        assert!(!matches(None, Some(RED), 0.0));
        assert!(!matches(Some(RED), None, 1000.0));
    }

    #[test]
    fn test_matches_tolerance_boundary() {
        // distance from (255,0,0) to (252,4,0) is exactly 5
        let other = Some(Rgb::new(252, 4, 0));
        assert!(matches(Some(RED), other, 5.0));
        assert!(!matches(Some(RED), other, 4.99));
    }

    #[test]
    fn test_parse_hex_case_insensitive() {
        assert_eq!(parse_color("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(parse_color("#FF8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(parse_color("#f80").unwrap(), Rgb::new(255, 136, 0));
    }

    #[test]
    fn test_parse_hex_errors() {
        assert_eq!(parse_color(""), Err(ColorError::Empty));
        assert_eq!(parse_color("#12345"), Err(ColorError::InvalidLength(5)));
        assert_eq!(parse_color("#GG0000"), Err(ColorError::InvalidHex('G')));
    }

    #[test]
    fn test_parse_css_colors() {
        assert_eq!(parse_color("rgb(0, 255, 0)").unwrap(), Rgb::new(0, 255, 0));
        assert_eq!(parse_color("hsl(0, 100%, 50%)").unwrap(), RED);
        assert!(matches!(parse_color("rgba(0, 0, 0, 0.5)"), Err(ColorError::Translucent(_))));
    }

    #[test]
    fn test_parse_cell_color_transparent() {
        assert_eq!(parse_cell_color("transparent").unwrap(), None);
        assert_eq!(parse_cell_color("NONE").unwrap(), None);
        assert_eq!(parse_cell_color("#F00").unwrap(), Some(RED));
    }

    #[test]
    fn test_hex_round_trip_is_upper_case() {
        let c = parse_color("#a1b2c3").unwrap();
        assert_eq!(c.to_hex(), "#A1B2C3");
        let json = serde_json::to_string(&Some(c)).unwrap();
        assert_eq!(json, "\"#A1B2C3\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Some(c));
        let absent: Color = serde_json::from_str("null").unwrap();
        assert_eq!(absent, None);
    }
}
