//! Hex color parsing: `#RGB` and `#RRGGBB`.

use crate::geometry::Rgb;

/// Parse a hex color string into an [`Rgb`].
///
/// Accepts:
/// - `#RGB` / `RGB`: 3-digit hex, each nibble doubled
/// - `#RRGGBB` / `RRGGBB`: 6-digit hex
///
/// Surrounding whitespace is ignored and digits are case-insensitive.
/// Alpha forms are rejected: the composite is always opaque.
pub fn parse_hex(s: &str) -> Option<Rgb> {
    let s = s.trim();
    let hex = s.strip_prefix('#').unwrap_or(s).as_bytes();

    match hex {
        &[r, g, b] => Some(Rgb::new(
            expand_nibble(r)?,
            expand_nibble(g)?,
            expand_nibble(b)?,
        )),
        &[r1, r2, g1, g2, b1, b2] => Some(Rgb::new(
            byte(r1, r2)?,
            byte(g1, g2)?,
            byte(b1, b2)?,
        )),
        _ => None,
    }
}

/// Expand a single hex nibble: 'f' → 0xFF, 'a' → 0xAA.
fn expand_nibble(ch: u8) -> Option<u8> {
    let n = hex_val(ch)?;
    Some(n << 4 | n)
}

fn byte(hi: u8, lo: u8) -> Option<u8> {
    Some(hex_val(hi)? << 4 | hex_val(lo)?)
}

fn hex_val(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}
