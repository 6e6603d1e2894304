//! Outline fonts for text the bitmap glyphs cannot set
//!
//! A run is shaped with `rustybuzz`, so Kannada conjuncts and vowel signs
//! come out as the font draws them, and filled with `tiny-skia` into a
//! coverage mask the rasterizer blends onto the page.

use rustybuzz::ttf_parser::{GlyphId, OutlineBuilder};
use rustybuzz::{Face, UnicodeBuffer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use super::glyphs::is_joiner;
use crate::{Error, RendererConfig, Result};

/// Font file names that suggest Kannada coverage
const KANNADA_FONT_HINTS: &[&str] = &["kannada", "tunga", "gubbi", "navilu", "kedage", "mallige"];

/// Directories searched when `system_fonts` is enabled
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("C:\\Windows\\Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join(".fonts"));
    }
    dirs
}

/// A parsed TrueType/OpenType font held in memory
#[derive(Clone)]
pub struct OutlineFont {
    name: String,
    data: Arc<Vec<u8>>,
}

impl fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutlineFont").field("name", &self.name).finish()
    }
}

/// Coverage of a shaped run, one alpha byte per pixel, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub width: u32,
    pub height: u32,
    pub alpha: Vec<u8>,
}

impl Coverage {
    pub fn at(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y * self.width + x) as usize]
    }
}

impl OutlineFont {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        if Face::from_slice(&data, 0).is_none() {
            return Err(Error::ConfigError(format!("{}: not a TrueType or OpenType font", name)));
        }
        Ok(Self {
            name,
            data: Arc::new(data),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(path.display().to_string(), data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::from_slice(&self.data, 0)
    }

    /// Whether every drawable character of `text` has a glyph
    pub fn covers(&self, text: &str) -> bool {
        let Some(face) = self.face() else {
            return false;
        };
        text.chars()
            .filter(|c| !is_joiner(*c))
            .all(|c| face.glyph_index(c).is_some())
    }

    /// Shape `text` and fill it into a mask `height` px tall.
    ///
    /// The font's ascender-to-descender extent is fitted to `height`. Runs
    /// wider than `max_width` are narrowed to fit it.
    pub fn rasterize_run(&self, text: &str, height: u32, max_width: f32, embolden: f32) -> Option<Coverage> {
        let face = self.face()?;
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();
        let shaped = rustybuzz::shape(&face, &[], buffer);
        let infos = shaped.glyph_infos();
        let positions = shaped.glyph_positions();
        if infos.is_empty() || infos.len() != positions.len() {
            return None;
        }

        let ascent = face.ascender() as f32;
        let extent = (ascent - face.descender() as f32).max(1.0);
        let scale = height.max(1) as f32 / extent;
        let natural: f32 = positions.iter().map(|p| p.x_advance as f32 * scale).sum();
        let squeeze = if natural > max_width && max_width > 0.0 {
            max_width / natural
        } else {
            1.0
        };
        let width = ((natural * squeeze + embolden).ceil() as u32).max(1);
        let mut pixmap = Pixmap::new(width, height.max(1))?;

        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;

        let mut pen = 0.0;
        for (info, pos) in infos.iter().zip(positions) {
            let mut outline = GlyphOutline {
                path: PathBuilder::new(),
                sx: scale * squeeze,
                sy: scale,
                ox: pen + pos.x_offset as f32 * scale * squeeze,
                oy: (ascent - pos.y_offset as f32) * scale,
            };
            if face.outline_glyph(GlyphId(info.glyph_id as u16), &mut outline).is_some() {
                if let Some(path) = outline.path.finish() {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
                    if embolden > 0.0 {
                        let shifted = Transform::from_translate(embolden, 0.0);
                        pixmap.fill_path(&path, &paint, FillRule::Winding, shifted, None);
                    }
                }
            }
            pen += pos.x_advance as f32 * scale * squeeze;
        }

        Some(Coverage {
            width: pixmap.width(),
            height: pixmap.height(),
            alpha: pixmap.data().chunks_exact(4).map(|px| px[3]).collect(),
        })
    }
}

/// Maps font units onto the run's pixmap, flipping the y axis
struct GlyphOutline {
    path: PathBuilder,
    sx: f32,
    sy: f32,
    ox: f32,
    oy: f32,
}

impl GlyphOutline {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.ox + x * self.sx, self.oy - y * self.sy)
    }
}

impl OutlineBuilder for GlyphOutline {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.path.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.path.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.path.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.path.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.path.close();
    }
}

/// Outline fonts consulted in order for runs the bitmap glyphs lack
#[derive(Debug, Clone, Default)]
pub struct FontBook {
    fonts: Vec<OutlineFont>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, font: OutlineFont) {
        self.fonts.push(font);
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Fonts named in `config.fonts`, then Kannada fonts installed on the system.
    ///
    /// A configured font that cannot be loaded is a configuration error;
    /// unreadable system fonts are skipped.
    pub fn from_config(config: &RendererConfig) -> Result<Self> {
        let mut book = Self::new();
        for path in &config.fonts {
            book.push(OutlineFont::from_file(path)?);
        }
        if config.system_fonts {
            book.fonts.extend(Self::discover(&system_font_dirs()).fonts);
        }
        log::debug!("{} outline font(s) available", book.len());
        Ok(book)
    }

    /// Kannada fonts found under `dirs`, by file name
    pub fn discover(dirs: &[PathBuf]) -> Self {
        let mut paths = Vec::new();
        for dir in dirs {
            collect_font_files(dir, 4, &mut paths);
        }
        paths.sort();

        let mut book = Self::new();
        for path in paths {
            match OutlineFont::from_file(&path) {
                Ok(font) => {
                    log::debug!("found outline font {}", font.name());
                    book.push(font);
                }
                Err(e) => log::debug!("skipping {}: {}", path.display(), e),
            }
        }
        book
    }

    /// First font covering all of `text`
    pub fn for_text(&self, text: &str) -> Option<&OutlineFont> {
        self.fonts.iter().find(|f| f.covers(text))
    }
}

fn is_kannada_font_file(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(ext.as_deref(), Some("ttf") | Some("otf")) {
        return false;
    }
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    KANNADA_FONT_HINTS.iter().any(|hint| stem.contains(hint))
}

fn collect_font_files(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth > 0 {
                collect_font_files(&path, depth - 1, out);
            }
        } else if is_kannada_font_file(&path) {
            out.push(path);
        }
    }
}
