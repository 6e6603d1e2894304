//! Software rasterizer for the paint commands
//!
//! Text is set per run. Characters `font8x8` has are drawn from its 8x8
//! cells scaled to the requested size. Runs it lacks go to the first outline
//! font in the [`FontBook`] that covers them, then to the Unifont Kannada
//! glyphs. Anything left is drawn as an outlined box.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::font::{Coverage, FontBook};
use super::glyphs::{self, WideGlyph};
use super::paint::PaintCommand;
use super::style::GLYPH_ASPECT;
use super::Bitmap;

fn blend(img: &mut RgbaImage, x: i32, y: i32, rgba: [u8; 4]) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let dst = img.get_pixel_mut(x as u32, y as u32);
    let a = rgba[3] as u32;
    if a == 255 {
        *dst = Rgba(rgba);
        return;
    }
    for i in 0..3 {
        dst.0[i] = ((rgba[i] as u32 * a + dst.0[i] as u32 * (255 - a)) / 255) as u8;
    }
    dst.0[3] = dst.0[3].max(rgba[3]);
}

fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, rgba: [u8; 4]) {
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + width).min(img.width() as i32);
    let y_end = (y + height).min(img.height() as i32);
    for py in y_start..y_end {
        for px in x_start..x_end {
            blend(img, px, py, rgba);
        }
    }
}

fn stroke_rect(img: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, t: i32, rgba: [u8; 4]) {
    let t = t.max(1).min(width / 2 + 1).min(height / 2 + 1);
    fill_rect(img, x, y, width, t, rgba);
    fill_rect(img, x, y + height - t, width, t, rgba);
    fill_rect(img, x, y + t, t, height - 2 * t, rgba);
    fill_rect(img, x + width - t, y + t, t, height - 2 * t, rgba);
}

/// Text position and size shared by the glyph drawers
struct Pen {
    y: i32,
    size: u32,
    cell_w: f32,
    embolden: i32,
    rgba: [u8; 4],
}

impl Pen {
    fn latin(&self, img: &mut RgbaImage, cx: f32, rows: [u8; 8]) {
        let cell_h = self.size as f32;
        for (gy, row) in rows.iter().enumerate() {
            let y0 = (self.y as f32 + gy as f32 * cell_h / 8.0).round() as i32;
            let y1 = (self.y as f32 + (gy + 1) as f32 * cell_h / 8.0).round() as i32;
            for gx in 0..8 {
                if row & (1 << gx) == 0 {
                    continue;
                }
                let x0 = (cx + gx as f32 * self.cell_w / 8.0).round() as i32;
                let x1 = (cx + (gx + 1) as f32 * self.cell_w / 8.0).round() as i32;
                fill_rect(img, x0, y0, (x1 - x0).max(1) + self.embolden, (y1 - y0).max(1), self.rgba);
            }
        }
    }

    fn wide(&self, img: &mut RgbaImage, cx: f32, glyph: &WideGlyph) {
        let cell_h = self.size as f32;
        let rows = WideGlyph::HEIGHT as f32;
        let cols = glyph.width as f32;
        for gy in 0..WideGlyph::HEIGHT {
            let y0 = (self.y as f32 + gy as f32 * cell_h / rows).round() as i32;
            let y1 = (self.y as f32 + (gy + 1) as f32 * cell_h / rows).round() as i32;
            for gx in 0..glyph.width {
                if !glyph.is_set(gx, gy) {
                    continue;
                }
                let x0 = (cx + gx as f32 * self.cell_w / cols).round() as i32;
                let x1 = (cx + (gx + 1) as f32 * self.cell_w / cols).round() as i32;
                fill_rect(img, x0, y0, (x1 - x0).max(1) + self.embolden, (y1 - y0).max(1), self.rgba);
            }
        }
    }

    fn tofu(&self, img: &mut RgbaImage, cx: f32) {
        let inset = (self.cell_w / 8.0).round() as i32;
        let t = ((self.size / 12) as i32).max(1);
        stroke_rect(
            img,
            cx.round() as i32 + inset,
            self.y + inset,
            self.cell_w.round() as i32 - 2 * inset,
            self.size as i32 - 2 * inset,
            t,
            self.rgba,
        );
    }

    fn coverage(&self, img: &mut RgbaImage, cx: f32, mask: &Coverage) {
        let x = cx.round() as i32;
        let [r, g, b, a] = self.rgba;
        for my in 0..mask.height {
            for mx in 0..mask.width {
                let cov = mask.at(mx, my) as u32;
                if cov == 0 {
                    continue;
                }
                let alpha = (a as u32 * cov / 255) as u8;
                blend(img, x + mx as i32, self.y + my as i32, [r, g, b, alpha]);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    text: &str,
    size: u32,
    advance: f32,
    bold: bool,
    rgba: [u8; 4],
    fonts: &FontBook,
) {
    let cell_w = size as f32 * GLYPH_ASPECT;
    let pen = Pen {
        y,
        size,
        cell_w,
        embolden: if bold { ((cell_w / 12.0).round() as i32).max(1) } else { 0 },
        rgba,
    };
    let chars: Vec<char> = text.chars().collect();
    let cell_x = |i: usize| x as f32 + i as f32 * advance;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if let Some(rows) = glyphs::latin(c) {
            pen.latin(img, cell_x(i), rows);
            i += 1;
            continue;
        }

        // Run of characters the bitmap font lacks, up to the next space or Latin glyph
        let end = (i..chars.len())
            .find(|&j| chars[j].is_whitespace() || glyphs::latin(chars[j]).is_some())
            .unwrap_or(chars.len());
        let run = &chars[i..end];
        let text: String = run.iter().collect();
        let slot = run.len() as f32 * advance;

        let shaped = fonts
            .for_text(&text)
            .and_then(|font| font.rasterize_run(&text, size, slot, pen.embolden as f32));
        match shaped {
            Some(mask) => pen.coverage(img, cell_x(i), &mask),
            None => {
                for (k, c) in run.iter().enumerate() {
                    if glyphs::is_joiner(*c) {
                        continue;
                    }
                    let at = if k > 0 && glyphs::is_overlay_mark(*c) { k - 1 } else { k };
                    match glyphs::kannada(*c) {
                        Some(glyph) => pen.wide(img, cell_x(i + at), &glyph),
                        None => pen.tofu(img, cell_x(i + at)),
                    }
                }
            }
        }
        i = end;
    }
}

fn draw_image(img: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, src: &RgbaImage) {
    if width == 0 || height == 0 {
        return;
    }
    let scaled;
    let src = if src.dimensions() == (width, height) {
        src
    } else {
        scaled = imageops::resize(src, width, height, FilterType::Triangle);
        &scaled
    };
    for (sx, sy, p) in src.enumerate_pixels() {
        blend(img, x + sx as i32, y + sy as i32, p.0);
    }
}

/// Execute `commands` in order onto a white `width` x `height` canvas.
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32, fonts: &FontBook) -> Bitmap {
    let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    for cmd in commands {
        match cmd {
            PaintCommand::SolidRect { x, y, width, height, rgba } => {
                fill_rect(&mut img, *x, *y, *width as i32, *height as i32, *rgba)
            }
            PaintCommand::StrokeRect { x, y, width, height, thickness, rgba } => {
                stroke_rect(&mut img, *x, *y, *width as i32, *height as i32, *thickness as i32, *rgba)
            }
            PaintCommand::Text { x, y, text, size, advance, bold, rgba } => {
                draw_text(&mut img, *x, *y, text, *size, *advance, *bold, *rgba, fonts)
            }
            PaintCommand::Image { x, y, width, height, image } => draw_image(&mut img, *x, *y, *width, *height, image),
        }
    }
    Bitmap::from_rgba(img)
}
