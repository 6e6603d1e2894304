//! Bitmap glyph tables
//!
//! `font8x8` covers ASCII and Latin-1. The Kannada block comes from GNU
//! Unifont (`assets/unifont-kannada.hex`, GPL with the font embedding
//! exception), one 16 px tall glyph per code point and no shaping.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Indian rupee sign, which none of the font8x8 tables carry
const RUPEE: [u8; 8] = [0x7E, 0x60, 0x7E, 0x60, 0x38, 0x0C, 0x18, 0x30];

static KANNADA_HEX: &str = include_str!("../../assets/unifont-kannada.hex");

/// 8x8 glyph rows, least significant bit leftmost
pub fn latin(c: char) -> Option<[u8; 8]> {
    if c == '₹' {
        return Some(RUPEE);
    }
    BASIC_FONTS.get(c).or_else(|| LATIN_FONTS.get(c))
}

/// A Unifont glyph: 16 rows, `width` (8 or 16) pixels each, most significant bit leftmost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideGlyph {
    pub width: u32,
    pub rows: [u16; 16],
}

impl WideGlyph {
    pub const HEIGHT: u32 = 16;

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width && y < Self::HEIGHT && self.rows[y as usize] & (1 << (self.width - 1 - x)) != 0
    }
}

/// One `XXXX:bits` line of a Unifont `.hex` file
fn parse_hex_line(line: &str) -> Option<(char, WideGlyph)> {
    let (code, bits) = line.trim().split_once(':')?;
    let c = char::from_u32(u32::from_str_radix(code, 16).ok()?)?;
    let (width, step) = match bits.len() {
        32 => (8, 2),
        64 => (16, 4),
        _ => return None,
    };
    let mut rows = [0u16; 16];
    for (i, row) in rows.iter_mut().enumerate() {
        *row = u16::from_str_radix(bits.get(i * step..(i + 1) * step)?, 16).ok()?;
    }
    Some((c, WideGlyph { width, rows }))
}

pub fn kannada(c: char) -> Option<WideGlyph> {
    static TABLE: OnceLock<HashMap<char, WideGlyph>> = OnceLock::new();
    TABLE
        .get_or_init(|| KANNADA_HEX.lines().filter_map(parse_hex_line).collect())
        .get(&c)
        .copied()
}

/// Kannada signs drawn over the preceding letter instead of in a cell of their own
pub fn is_overlay_mark(c: char) -> bool {
    matches!(
        c,
        '\u{0C81}' | '\u{0CBC}' | '\u{0CBF}' | '\u{0CC6}' | '\u{0CCC}' | '\u{0CCD}' | '\u{0CE2}' | '\u{0CE3}'
    )
}

/// Zero-width joiners steer shaping and are never drawn on their own
pub fn is_joiner(c: char) -> bool {
    matches!(c, '\u{200C}' | '\u{200D}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_table_has_rupee_and_ascii() {
        assert_eq!(latin('₹'), Some(RUPEE));
        assert!(latin('A').is_some());
        assert!(latin('ಕ').is_none());
    }

    #[test]
    fn whole_kannada_block_is_loaded() {
        let loaded = ('\u{0C80}'..='\u{0CFF}').filter(|c| kannada(*c).is_some()).count();
        assert_eq!(loaded, 128);
        assert!(kannada('A').is_none());
    }

    #[test]
    fn kannada_letters_have_distinct_shapes() {
        let ka = kannada('ಕ').unwrap();
        let ga = kannada('ಗ').unwrap();
        assert_eq!(ka.width, 16);
        assert_ne!(ka, ga);
        assert!((0..16).any(|y| (0..16).any(|x| ka.is_set(x, y))));
    }

    #[test]
    fn hex_lines_parse_both_widths() {
        let (c, narrow) = parse_hex_line("0041:0000000018242442427E424242420000").unwrap();
        assert_eq!(c, 'A');
        assert_eq!(narrow.width, 8);
        assert!(narrow.is_set(3, 4));
        assert!(!narrow.is_set(0, 0));
        assert!(parse_hex_line("0041:00").is_none());
        assert!(parse_hex_line("zzzz:0000000018242442427E424242420000").is_none());
    }
}
