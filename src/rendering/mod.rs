//! Built-in rasterizer
//!
//! The receipt fragment goes through three small stages:
//! [`layout`] stacks the template's sections in CSS pixels, [`paint`] turns
//! the layout into device-pixel commands and [`raster`] draws them.
//! Text the bitmap glyphs lack is shaped with the outline fonts in [`font`].

pub mod font;
pub mod glyphs;
pub mod layout;
pub mod paint;
pub mod raster;
pub mod style;

use image::RgbaImage;
use scraper::Html;
use sha2::{Digest, Sha256};

use crate::{Error, PageGeometry, Result};
use font::FontBook;

/// An RGBA raster of a rendered page
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

impl Bitmap {
    /// White bitmap of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_rgba(RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255])))
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self { width, height, pixels }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels.get_pixel(x, y).0
    }

    /// Packed RGB samples composited over white
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.width * self.height * 3) as usize);
        for p in self.pixels.pixels() {
            let a = p.0[3] as u32;
            for c in &p.0[..3] {
                out.push(((*c as u32 * a + 255 * (255 - a)) / 255) as u8);
            }
        }
        out
    }

    /// SHA-256 of the dimensions and pixel data, hex encoded
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.pixels.as_raw());
        hex::encode(hasher.finalize())
    }
}

/// Turns a receipt HTML fragment into a bitmap of `page` scaled by `scale`
pub trait Rasterizer: Send + Sync {
    fn render_template_to_bitmap(&self, html: &str, page: PageGeometry, scale: u32) -> Result<Bitmap>;
}

/// Rasterizer backed by the layout/paint/raster stages in this module
#[derive(Debug, Clone, Default)]
pub struct BuiltinRasterizer {
    fonts: FontBook,
}

impl BuiltinRasterizer {
    /// Bitmap glyphs only
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fonts(fonts: FontBook) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }
}

impl Rasterizer for BuiltinRasterizer {
    fn render_template_to_bitmap(&self, html: &str, page: PageGeometry, scale: u32) -> Result<Bitmap> {
        if scale == 0 {
            return Err(Error::RenderError("scale must be at least 1".into()));
        }
        let (width, height) = page.scaled(scale)?;
        let document = Html::parse_fragment(html);
        let nodes = layout::layout_receipt(&document, page)?;
        let commands = paint::display_list(&nodes, scale);
        log::debug!("rasterizing {} paint commands at {}x{}", commands.len(), width, height);
        Ok(raster::rasterize(&commands, width, height, &self.fonts))
    }
}
