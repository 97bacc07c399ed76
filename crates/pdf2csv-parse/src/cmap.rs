//! ToUnicode CMap parser for mapping character codes to Unicode strings.
//!
//! Reads the `beginbfchar`/`endbfchar` and `beginbfrange`/`endbfrange`
//! sections of a `/ToUnicode` stream. Destination values are UTF-16BE hex
//! strings; malformed entries are skipped rather than failing the font.

use std::collections::HashMap;

/// A parsed ToUnicode CMap.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    mappings: HashMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Hex(&'a str),
    OpenArray,
    CloseArray,
    Keyword(&'a str),
}

impl CMap {
    /// Parse a ToUnicode CMap from its raw (decompressed) bytes.
    pub fn parse(data: &[u8]) -> Self {
        let text = String::from_utf8_lossy(data);
        let tokens = tokenize(&text);
        let mut mappings = HashMap::new();

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                Token::Keyword("beginbfchar") => {
                    i += 1;
                    while let (Some(Token::Hex(src)), Some(Token::Hex(dst))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        if let (Some(code), Some(units)) = (hex_code(src), utf16_units(dst)) {
                            mappings.insert(code, String::from_utf16_lossy(&units));
                        }
                        i += 2;
                    }
                }
                Token::Keyword("beginbfrange") => {
                    i += 1;
                    while let (Some(Token::Hex(lo)), Some(Token::Hex(hi))) =
                        (tokens.get(i), tokens.get(i + 1))
                    {
                        i += 2;
                        let (Some(lo), Some(hi)) = (hex_code(lo), hex_code(hi)) else {
                            continue;
                        };
                        match tokens.get(i) {
                            Some(Token::Hex(dst)) => {
                                i += 1;
                                if let Some(units) = utf16_units(dst) {
                                    insert_incrementing(&mut mappings, lo, hi, units);
                                }
                            }
                            Some(Token::OpenArray) => {
                                i += 1;
                                let mut code = lo;
                                while let Some(Token::Hex(dst)) = tokens.get(i) {
                                    if code <= hi {
                                        if let Some(units) = utf16_units(dst) {
                                            mappings.insert(code, String::from_utf16_lossy(&units));
                                        }
                                    }
                                    code = code.saturating_add(1);
                                    i += 1;
                                }
                                if tokens.get(i) == Some(&Token::CloseArray) {
                                    i += 1;
                                }
                            }
                            _ => break,
                        }
                    }
                }
                _ => i += 1,
            }
        }

        CMap { mappings }
    }

    /// Look up the Unicode string for a character code.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Map `lo..=hi` to consecutive values, incrementing the last UTF-16 unit.
fn insert_incrementing(mappings: &mut HashMap<u32, String>, lo: u32, hi: u32, units: Vec<u16>) {
    // Guard against absurd ranges in broken files.
    let hi = hi.min(lo.saturating_add(0xFFFF));
    for (offset, code) in (lo..=hi).enumerate() {
        let mut units = units.clone();
        if let Some(last) = units.last_mut() {
            *last = last.wrapping_add(offset as u16);
        }
        mappings.insert(code, String::from_utf16_lossy(&units));
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
            }
            b'<' if bytes.get(i + 1) == Some(&b'<') => i += 2,
            b'>' if bytes.get(i + 1) == Some(&b'>') => i += 2,
            b'<' => {
                let start = i + 1;
                let end = text[start..].find('>').map_or(bytes.len(), |p| start + p);
                tokens.push(Token::Hex(&text[start..end]));
                i = end + 1;
            }
            b'[' => {
                tokens.push(Token::OpenArray);
                i += 1;
            }
            b']' => {
                tokens.push(Token::CloseArray);
                i += 1;
            }
            b if b.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
                    i += 1;
                }
                tokens.push(Token::Keyword(&text[start..i]));
            }
            _ => i += 1,
        }
    }
    tokens
}

fn hex_code(hex: &str) -> Option<u32> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.is_empty() || digits.len() > 8 {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok()
}

/// Decode a hex string into UTF-16BE code units. Two-digit values (seen in
/// some generators) are widened to one unit.
fn utf16_units(hex: &str) -> Option<Vec<u16>> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() == 2 {
        return u16::from_str_radix(&digits, 16).ok().map(|u| vec![u]);
    }
    if digits.is_empty() || digits.len() % 4 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&digits[i..i + 4], 16).ok())
        .collect()
}
