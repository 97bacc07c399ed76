//! Font loading: glyph widths and character code decoding.
//!
//! Only what text placement needs is read from a font dictionary: whether
//! codes are one or two bytes, the advance width of each code and an
//! optional `/ToUnicode` CMap for decoding.

use std::collections::HashMap;

use crate::cmap::CMap;
use crate::lopdf_backend::{decode_stream, object_to_f64, resolve_ref};

/// Width used when a font gives none, in glyph units (1/1000 em).
pub const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// Width used for Courier variants without explicit widths.
pub const MONOSPACE_GLYPH_WIDTH: f64 = 600.0;

#[derive(Debug, Clone)]
enum Widths {
    /// `/FirstChar` + `/Widths` of a simple font.
    Simple { first_char: u32, widths: Vec<f64> },
    /// `/W` entries of a CID font's descendant.
    Cid(HashMap<u32, f64>),
}

/// A font ready for text placement.
#[derive(Debug, Clone)]
pub struct LoadedFont {
    name: String,
    two_byte: bool,
    widths: Widths,
    missing_width: f64,
    to_unicode: Option<CMap>,
}

impl LoadedFont {
    /// Font used when `Tf` names a resource that does not exist.
    pub fn fallback(name: &str) -> Self {
        Self {
            name: name.to_string(),
            two_byte: false,
            widths: Widths::Simple {
                first_char: 0,
                widths: Vec::new(),
            },
            missing_width: default_width_for(name),
            to_unicode: None,
        }
    }

    /// Read a font dictionary (`/Type /Font`).
    pub fn load(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Self {
        let name = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|o| o.as_name().ok())
            .map(|n| strip_subset_prefix(&String::from_utf8_lossy(n)).to_string())
            .unwrap_or_default();
        let to_unicode = dict
            .get(b"ToUnicode")
            .ok()
            .map(|o| resolve_ref(doc, o))
            .and_then(|o| o.as_stream().ok())
            .and_then(|s| decode_stream(s).ok())
            .map(|data| CMap::parse(&data));

        let is_type0 = dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Type0");

        if is_type0 {
            let descendant = dict
                .get(b"DescendantFonts")
                .ok()
                .map(|o| resolve_ref(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|o| resolve_ref(doc, o))
                .and_then(|o| o.as_dict().ok());
            let (widths, missing_width) = match descendant {
                Some(cid_font) => {
                    let default = cid_font
                        .get(b"DW")
                        .ok()
                        .and_then(|o| object_to_f64(resolve_ref(doc, o)).ok())
                        .unwrap_or(1000.0);
                    let widths = cid_font
                        .get(b"W")
                        .ok()
                        .map(|o| resolve_ref(doc, o))
                        .and_then(|o| o.as_array().ok())
                        .map(|arr| parse_w_array(doc, arr))
                        .unwrap_or_default();
                    (widths, default)
                }
                None => (HashMap::new(), 1000.0),
            };
            return Self {
                name,
                two_byte: true,
                widths: Widths::Cid(widths),
                missing_width,
                to_unicode,
            };
        }

        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| object_to_f64(o).ok())
            .map_or(0, |v| v.max(0.0) as u32);
        let widths = dict
            .get(b"Widths")
            .ok()
            .map(|o| resolve_ref(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|o| object_to_f64(resolve_ref(doc, o)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();
        let missing_width = dict
            .get(b"FontDescriptor")
            .ok()
            .map(|o| resolve_ref(doc, o))
            .and_then(|o| o.as_dict().ok())
            .and_then(|d| d.get(b"MissingWidth").ok())
            .and_then(|o| object_to_f64(o).ok())
            .filter(|w| *w > 0.0)
            .unwrap_or_else(|| default_width_for(&name));

        Self {
            name,
            two_byte: false,
            widths: Widths::Simple { first_char, widths },
            missing_width,
            to_unicode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether character codes are two bytes wide (Type0 fonts).
    pub fn is_two_byte(&self) -> bool {
        self.two_byte
    }

    /// Split a shown string into character codes.
    pub fn codes<'a>(&self, bytes: &'a [u8]) -> impl Iterator<Item = u32> + 'a {
        let step = if self.two_byte { 2 } else { 1 };
        bytes
            .chunks(step)
            .map(|chunk| chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
    }

    /// Advance width of a code in glyph units.
    pub fn width(&self, code: u32) -> f64 {
        match &self.widths {
            Widths::Simple { first_char, widths } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(self.missing_width),
            Widths::Cid(widths) => widths.get(&code).copied().unwrap_or(self.missing_width),
        }
    }

    /// Unicode text for a code.
    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|c| c.lookup(code)) {
            return text.to_string();
        }
        if self.two_byte {
            char::from_u32(code)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string()
        } else {
            // Latin-1: every byte maps to the code point of the same value.
            char::from(code as u8).to_string()
        }
    }
}

fn default_width_for(name: &str) -> f64 {
    if name.contains("Courier") {
        MONOSPACE_GLYPH_WIDTH
    } else {
        DEFAULT_GLYPH_WIDTH
    }
}

/// Drop a subset tag such as `ABCDEF+` from a base font name.
fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

/// Parse a CID font `/W` array: `c [w1 w2 ...]` or `c_first c_last w`.
fn parse_w_array(doc: &lopdf::Document, objects: &[lopdf::Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let number = |o: &lopdf::Object| object_to_f64(resolve_ref(doc, o)).ok();
    let mut i = 0;
    while i < objects.len() {
        let Some(start) = number(&objects[i]) else {
            i += 1;
            continue;
        };
        let start = start.max(0.0) as u32;
        match objects.get(i + 1).map(|o| resolve_ref(doc, o)) {
            Some(lopdf::Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = number(w) {
                        widths.insert(start + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(end) => {
                if let (Ok(end), Some(w)) = (object_to_f64(end), objects.get(i + 2).and_then(number))
                {
                    // Cap pathological ranges.
                    let end = (end.max(0.0) as u32).min(start.saturating_add(0xFFFF));
                    for cid in start..=end {
                        widths.insert(cid, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}
