//! Inline-style reading for the built-in layout.
//!
//! Only the handful of properties the receipt template sets on text
//! elements are understood; everything else is ignored.

use scraper::ElementRef;

/// Width of one glyph cell relative to the font size
pub const GLYPH_ASPECT: f32 = 0.6;
/// Line height used when the element does not set one
pub const DEFAULT_LINE_HEIGHT: f32 = 1.3;

pub const BLACKISH: [u8; 4] = [0x33, 0x33, 0x33, 0xff];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub bold: bool,
    pub color: [u8; 4],
    pub uppercase: bool,
    pub letter_spacing: f32,
    /// Multiple of `font_size`
    pub line_height: f32,
    pub align: TextAlign,
}

/// `property: value` pairs of a style attribute, property names lowercased
pub fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Last value of `property` in a style attribute (later declarations win)
pub fn property(style: &str, name: &str) -> Option<String> {
    declarations(style)
        .into_iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v)
        .last()
}

/// `12px`, `12` or `0` as pixels
pub fn parse_px(value: &str) -> Option<f32> {
    let v = value.trim();
    let num = v.strip_suffix("px").unwrap_or(v).trim();
    num.parse::<f32>().ok().filter(|n| n.is_finite())
}

/// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`
pub fn parse_color(value: &str) -> Option<[u8; 4]> {
    let hex = value.trim().strip_prefix('#')?;
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<Vec<u8>>>()?;
    match digits.len() {
        3 | 4 => {
            let mut out = [0xff; 4];
            for (slot, d) in out.iter_mut().zip(digits.iter()) {
                *slot = d * 17;
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [0xff; 4];
            for (slot, pair) in out.iter_mut().zip(digits.chunks(2)) {
                *slot = pair[0] * 16 + pair[1];
            }
            Some(out)
        }
        _ => None,
    }
}

impl TextStyle {
    pub fn with_size(font_size: f32) -> Self {
        Self {
            font_size,
            bold: false,
            color: BLACKISH,
            uppercase: false,
            letter_spacing: 0.0,
            line_height: DEFAULT_LINE_HEIGHT,
            align: TextAlign::Left,
        }
    }

    /// Style from an inline `style` attribute; unset properties keep the defaults.
    pub fn from_inline(style: Option<&str>, default_size: f32) -> Self {
        let mut out = Self::with_size(default_size);
        let Some(style) = style else { return out };
        for (name, value) in declarations(style) {
            match name.as_str() {
                "font-size" => {
                    if let Some(px) = parse_px(&value) {
                        out.font_size = px.max(1.0);
                    }
                }
                "font-weight" => {
                    out.bold = value == "bold" || value.parse::<u32>().map(|w| w >= 600).unwrap_or(false);
                }
                "color" => {
                    if let Some(c) = parse_color(&value) {
                        out.color = c;
                    }
                }
                "text-transform" => out.uppercase = value == "uppercase",
                "letter-spacing" => out.letter_spacing = parse_px(&value).unwrap_or(0.0),
                "text-align" => {
                    out.align = match value.as_str() {
                        "center" => TextAlign::Center,
                        "right" => TextAlign::Right,
                        _ => TextAlign::Left,
                    }
                }
                "line-height" => {
                    if let Some(px) = value.strip_suffix("px").and_then(|v| v.trim().parse::<f32>().ok()) {
                        out.line_height = px / out.font_size;
                    } else if let Ok(mult) = value.parse::<f32>() {
                        out.line_height = mult;
                    }
                }
                _ => {}
            }
        }
        out
    }

    pub fn from_element(el: &ElementRef<'_>, default_size: f32) -> Self {
        Self::from_inline(el.value().attr("style"), default_size)
    }

    /// Horizontal distance between glyph origins
    pub fn advance(&self) -> f32 {
        self.font_size * GLYPH_ASPECT + self.letter_spacing
    }

    pub fn line_px(&self) -> f32 {
        self.font_size * self.line_height
    }

    pub fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance()
    }

    /// Height of a block of `lines` lines; an empty block still takes one line
    pub fn block_height(&self, lines: usize) -> i32 {
        (lines.max(1) as f32 * self.line_px()).ceil() as i32
    }

    pub fn transform(&self, text: &str) -> String {
        if self.uppercase {
            text.to_uppercase()
        } else {
            text.to_string()
        }
    }

    /// Greedy word wrap into lines no wider than `max_width`; words longer
    /// than a line are split.
    pub fn wrap(&self, text: &str, max_width: f32) -> Vec<String> {
        let per_line = ((max_width / self.advance()).floor() as usize).max(1);
        let mut lines = Vec::new();
        let mut cur = String::new();
        let mut cur_len = 0usize;
        for word in text.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > per_line {
                if cur_len > 0 {
                    lines.push(std::mem::take(&mut cur));
                    cur_len = 0;
                }
                let rest = word.split_off(per_line);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if cur_len > 0 && cur_len + 1 + word.len() > per_line {
                lines.push(std::mem::take(&mut cur));
                cur_len = 0;
            }
            if cur_len > 0 {
                cur.push(' ');
                cur_len += 1;
            }
            cur_len += word.len();
            cur.extend(word);
        }
        if cur_len > 0 {
            lines.push(cur);
        }
        lines
    }
}
