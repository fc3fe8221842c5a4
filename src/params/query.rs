//! Query string tokenizer and value parsers for the parameter surface.
//!
//! Minimal percent-decoding and key-value extraction without external dependencies.

use alloc::string::String;
use alloc::vec::Vec;

use super::color::parse_hex;
use super::{ArrangementMode, Fraction, LayoutParameters, ParseWarning};

/// Which fields have been set so far, for duplicate detection.
#[derive(Default)]
struct Seen {
    arrangement: bool,
    padding: bool,
    border: bool,
    background: bool,
    border_color: bool,
}

/// Parse a query string into parameters + warnings.
pub(crate) fn parse_query(query: &str) -> (LayoutParameters, Vec<ParseWarning>) {
    let mut params = LayoutParameters::default();
    let mut seen = Seen::default();
    let mut warnings = Vec::new();

    for pair in split_query(query) {
        let (raw_key, raw_value) = split_pair(pair);
        let key = percent_decode(raw_key);
        let value = percent_decode(raw_value);
        let key_lower = key.to_ascii_lowercase();

        dispatch_key(&key_lower, &value, &mut params, &mut seen, &mut warnings);
    }

    (params, warnings)
}

fn dispatch_key(
    key: &str,
    value: &str,
    params: &mut LayoutParameters,
    seen: &mut Seen,
    warnings: &mut Vec<ParseWarning>,
) {
    match key {
        "layout" | "arrangement" | "mode" => match value.parse::<ArrangementMode>() {
            Ok(mode) => {
                note_duplicate(&mut seen.arrangement, key, value, warnings);
                params.arrangement = mode;
            }
            Err(_) => invalid("layout", value, "expected horizontal|vertical|grid", warnings),
        },

        "padding" => match parse_slider(value) {
            Some(f) => {
                note_duplicate(&mut seen.padding, key, value, warnings);
                params.padding = f;
            }
            None => invalid("padding", value, "expected a number in 0..=100", warnings),
        },

        "border" | "borderwidth" => match parse_slider(value) {
            Some(f) => {
                note_duplicate(&mut seen.border, key, value, warnings);
                params.border_width = f;
            }
            None => invalid("border", value, "expected a number in 0..=100", warnings),
        },

        "bg" | "background" | "backgroundcolor" => match parse_hex(value) {
            Some(c) => {
                note_duplicate(&mut seen.background, key, value, warnings);
                params.background = c;
            }
            None => invalid("bg", value, "expected #RGB or #RRGGBB", warnings),
        },

        "bordercolor" => match parse_hex(value) {
            Some(c) => {
                note_duplicate(&mut seen.border_color, key, value, warnings);
                params.border_color = c;
            }
            None => invalid("bordercolor", value, "expected #RGB or #RRGGBB", warnings),
        },

        _ => warnings.push(ParseWarning::KeyNotRecognized {
            key: String::from(key),
            value: String::from(value),
        }),
    }
}

fn note_duplicate(seen: &mut bool, key: &str, value: &str, warnings: &mut Vec<ParseWarning>) {
    if *seen {
        warnings.push(ParseWarning::DuplicateKey {
            key: String::from(key),
            value: String::from(value),
        });
    }
    *seen = true;
}

fn invalid(
    key: &'static str,
    value: &str,
    reason: &'static str,
    warnings: &mut Vec<ParseWarning>,
) {
    warnings.push(ParseWarning::ValueInvalid {
        key,
        value: String::from(value),
        reason,
    });
}

// ---- Value parsers ----

/// Raw slider units. Finite numbers clamp into range; NaN and garbage don't parse.
fn parse_slider(s: &str) -> Option<Fraction> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .map(Fraction::from_slider)
}

// ---- Tokenizer ----

fn split_query(query: &str) -> impl Iterator<Item = &str> {
    let query = query.strip_prefix('?').unwrap_or(query);
    query.split('&').filter(|s| !s.is_empty())
}

/// Split a single "key=value" pair on the first '='.
fn split_pair(pair: &str) -> (&str, &str) {
    pair.split_once('=').unwrap_or((pair, ""))
}

/// Percent-decode a URL component. Also handles '+' as space.
///
/// Decoded bytes are read as UTF-8; invalid sequences become U+FFFD.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                    out.push(hi << 4 | lo);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
