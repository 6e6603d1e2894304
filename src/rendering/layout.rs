//! Block layout of the receipt template.
//!
//! Walks the fragment with `scraper` selectors and stacks the receipt's
//! sections top to bottom inside the certificate frame. Coordinates are CSS
//! pixels; the paint stage applies the device scale.

use image::RgbaImage;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;

use super::style::{parse_color, parse_px, property, TextStyle};
use crate::banner::decode_data_uri;
use crate::template::{ACCENT, PANEL_BORDER, PANEL_FILL, ROW_RULE, TABLE_BORDER, TABLE_HEADER_FILL};
use crate::{Error, PageGeometry, Result};

const PAGE_PADDING: i32 = 40;
const FRAME_BORDER: i32 = 4;
const FRAME_PADDING: i32 = 40;
const BANNER_MAX_HEIGHT: u32 = 120;
const PANEL_PADDING: i32 = 25;
const ROW_SPACING: i32 = 12;
const CELL_PADDING: i32 = 10;
const SERIAL_COL: i32 = 50;
const QUANTITY_COL: i32 = 100;

pub const WHITE: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

#[derive(Debug, Clone, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(0) as u32,
            height: height.max(0) as u32,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// What a layout node is on the receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Page,
    Frame,
    CopyMark,
    Banner,
    Rule,
    Title,
    ReceiptNo,
    DetailsPanel,
    DetailLabel,
    DetailValue,
    ItemsBox,
    ItemsTitle,
    ItemsHeading,
    ItemCell,
    AmountLabel,
    AmountValue,
    Footer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Fill([u8; 4]),
    Stroke { color: [u8; 4], thickness: u32 },
    Text { lines: Vec<String>, style: TextStyle },
    Image(Arc<RgbaImage>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub rect: Rect,
    pub kind: NodeKind,
    pub role: Role,
}

impl LayoutNode {
    /// Text lines of a text node, empty for other kinds
    pub fn lines(&self) -> &[String] {
        match &self.kind {
            NodeKind::Text { lines, .. } => lines,
            _ => &[],
        }
    }
}

fn color(hex: &str) -> [u8; 4] {
    parse_color(hex).unwrap_or(WHITE)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::RenderError(format!("bad selector {}: {:?}", css, e)))
}

fn select_first<'a>(document: &'a Html, css: &str) -> Result<Option<ElementRef<'a>>> {
    Ok(document.select(&selector(css)?).next())
}

/// Element text with whitespace runs collapsed
fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fill(role: Role, rect: Rect, rgba: [u8; 4]) -> LayoutNode {
    LayoutNode { rect, kind: NodeKind::Fill(rgba), role }
}

fn stroke(role: Role, rect: Rect, rgba: [u8; 4], thickness: u32) -> LayoutNode {
    LayoutNode {
        rect,
        kind: NodeKind::Stroke { color: rgba, thickness },
        role,
    }
}

/// A wrapped text block measured for a column of `width` px
struct TextBlock {
    lines: Vec<String>,
    style: TextStyle,
    height: i32,
}

impl TextBlock {
    fn measure(el: &ElementRef<'_>, default_size: f32, width: i32) -> Self {
        let style = TextStyle::from_element(el, default_size);
        let text = style.transform(&element_text(el));
        let lines = style.wrap(&text, width.max(1) as f32);
        let height = style.block_height(lines.len());
        Self { lines, style, height }
    }

    fn place(self, role: Role, x: i32, y: i32, width: i32) -> LayoutNode {
        LayoutNode {
            rect: Rect::new(x, y, width, self.height),
            kind: NodeKind::Text { lines: self.lines, style: self.style },
            role,
        }
    }
}

/// Serial / item / quantity columns of the grocery table
struct ItemColumns {
    x: i32,
    width: i32,
    spans: [(i32, i32); 3],
}

impl ItemColumns {
    fn new(x: i32, width: i32) -> Self {
        let name_w = width - SERIAL_COL - QUANTITY_COL;
        Self {
            x,
            width,
            spans: [(x, SERIAL_COL), (x + SERIAL_COL, name_w), (x + SERIAL_COL + name_w, QUANTITY_COL)],
        }
    }

    /// Lay out one table row at `y` followed by a rule `rule` px thick; returns the next row's y.
    fn row(&self, out: &mut Vec<LayoutNode>, row: ElementRef<'_>, cells: &Selector, role: Role, rule: i32, y: i32) -> i32 {
        let blocks: Vec<(TextBlock, (i32, i32))> = row
            .select(cells)
            .zip(self.spans.iter().copied())
            .map(|(cell, (cx, w))| (TextBlock::measure(&cell, 14.0, w - 2 * CELL_PADDING), (cx, w)))
            .collect();
        let content_h = blocks.iter().map(|(b, _)| b.height).max().unwrap_or(0);
        for (block, (cx, w)) in blocks {
            out.push(block.place(role, cx + CELL_PADDING, y + CELL_PADDING, w - 2 * CELL_PADDING));
        }
        let row_h = content_h + 2 * CELL_PADDING;
        out.push(fill(Role::Rule, Rect::new(self.x, y + row_h, self.width, rule), color(ROW_RULE)));
        y + row_h + rule
    }
}

/// Size of an image drawn at full `max_width` with `object-fit: contain` under `max_height`
fn contain(iw: u32, ih: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let scale = (max_width as f32 / iw as f32).min(max_height as f32 / ih as f32);
    let w = ((iw as f32 * scale).round() as u32).max(1);
    let h = ((ih as f32 * scale).round() as u32).max(1);
    (w, h)
}

/// Compute the receipt layout for a template fragment.
///
/// Sections missing from the fragment are skipped; a fragment without a
/// `.receipt-frame` is not a receipt and is rejected.
pub fn layout_receipt(document: &Html, page: PageGeometry) -> Result<Vec<LayoutNode>> {
    if select_first(document, ".receipt-frame")?.is_none() {
        return Err(Error::RenderError("fragment has no .receipt-frame".into()));
    }

    let pw = page.width as i32;
    let ph = page.height as i32;
    let mut nodes = vec![fill(Role::Page, Rect::new(0, 0, pw, ph), WHITE)];

    let frame = Rect::new(PAGE_PADDING, PAGE_PADDING, pw - 2 * PAGE_PADDING, ph - 2 * PAGE_PADDING);
    nodes.push(stroke(Role::Frame, frame.clone(), color(ACCENT), FRAME_BORDER as u32));

    let inset = PAGE_PADDING + FRAME_BORDER + FRAME_PADDING;
    let x0 = inset;
    let width = (pw - 2 * inset).max(0);
    let bottom = ph - inset;
    let mut y = inset;

    // "Original Copy" mark pinned to the frame's top-right corner
    if let Some(el) = select_first(document, ".copy-mark")? {
        let block = TextBlock::measure(&el, 11.0, width);
        let text_w = block
            .lines
            .iter()
            .map(|l| block.style.text_width(l).ceil() as i32)
            .max()
            .unwrap_or(0);
        let box_right = frame.right() - FRAME_BORDER - 15;
        let box_x = box_right - text_w - 16;
        let top = frame.y + FRAME_BORDER + 12;
        nodes.push(fill(Role::CopyMark, Rect::new(box_x, top, text_w + 16, block.height), WHITE));
        nodes.push(block.place(Role::CopyMark, box_x + 8, top, text_w));
    }

    if let Some(img) = select_first(document, ".banner img")? {
        let src = img
            .value()
            .attr("src")
            .ok_or_else(|| Error::RenderError("banner image has no src".into()))?;
        let (_, bytes) = decode_data_uri(src)?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| Error::RenderError(format!("failed to decode banner: {}", e)))?
            .to_rgba8();
        let (iw, ih) = decoded.dimensions();
        if iw == 0 || ih == 0 {
            return Err(Error::RenderError("banner image is empty".into()));
        }
        let (dw, dh) = contain(iw, ih, width as u32, BANNER_MAX_HEIGHT);
        let bx = x0 + (width - dw as i32) / 2;
        nodes.push(LayoutNode {
            rect: Rect::new(bx, y, dw as i32, dh as i32),
            kind: NodeKind::Image(Arc::new(decoded)),
            role: Role::Banner,
        });
        y += dh as i32 + 20;
        nodes.push(fill(Role::Rule, Rect::new(x0, y, width, 2), color(ACCENT)));
        y += 2 + 30;
    }

    // Header: title on the left, receipt number block on the right, centered vertically
    {
        let left_w = width * 3 / 5;
        let right_w = width - left_w;
        let title = select_first(document, ".receipt-title")?.map(|el| TextBlock::measure(&el, 22.0, left_w));
        let label = select_first(document, ".receipt-no-label")?.map(|el| TextBlock::measure(&el, 14.0, right_w));
        let number = select_first(document, ".receipt-no")?.map(|el| TextBlock::measure(&el, 16.0, right_w));

        let title_h = title.as_ref().map(|b| b.height).unwrap_or(0);
        let right_h = label.as_ref().map(|b| b.height).unwrap_or(0)
            + number.as_ref().map(|b| b.height + 2).unwrap_or(0);
        let header_h = title_h.max(right_h);

        if let Some(block) = title {
            nodes.push(block.place(Role::Title, x0, y + (header_h - title_h) / 2, left_w));
        }
        let mut ry = y + (header_h - right_h) / 2;
        if let Some(block) = label {
            let h = block.height;
            nodes.push(block.place(Role::ReceiptNo, x0 + left_w, ry, right_w));
            ry += h + 2;
        }
        if let Some(block) = number {
            nodes.push(block.place(Role::ReceiptNo, x0 + left_w, ry, right_w));
        }
        if header_h > 0 {
            y += header_h + 30;
        }
    }

    // Margin below the last block; adjacent vertical margins collapse
    let mut trailing_margin = 0;

    if let Some(panel) = select_first(document, ".details")? {
        let margin_bottom = panel
            .value()
            .attr("style")
            .and_then(|s| property(s, "margin-bottom"))
            .and_then(|v| parse_px(&v))
            .map(|px| px.round() as i32)
            .unwrap_or(30);

        let inner_x = x0 + 1 + PANEL_PADDING;
        let inner_w = width - 2 * (PANEL_PADDING + 1);
        let label_w = inner_w * 2 / 5;
        let value_w = inner_w - label_w;

        let row_sel = selector("tr")?;
        let label_sel = selector("td.label")?;
        let value_sel = selector("td.value")?;

        let mut rows = Vec::new();
        let mut ry = y + 1 + PANEL_PADDING + ROW_SPACING;
        for row in panel.select(&row_sel) {
            let label = row.select(&label_sel).next().map(|el| TextBlock::measure(&el, 14.0, label_w - 8));
            let value = row.select(&value_sel).next().map(|el| TextBlock::measure(&el, 15.0, value_w));
            let lh = label.as_ref().map(|b| b.height).unwrap_or(0);
            let vh = value.as_ref().map(|b| b.height).unwrap_or(0);
            let row_h = lh.max(vh);
            if let Some(block) = label {
                rows.push(block.place(Role::DetailLabel, inner_x, ry + (row_h - lh) / 2, label_w));
            }
            if let Some(block) = value {
                rows.push(block.place(Role::DetailValue, inner_x + label_w, ry + (row_h - vh) / 2, value_w));
            }
            ry += row_h + ROW_SPACING;
        }

        let panel_rect = Rect::new(x0, y, width, ry + PANEL_PADDING + 1 - y);
        nodes.push(fill(Role::DetailsPanel, panel_rect.clone(), color(PANEL_FILL)));
        nodes.push(stroke(Role::DetailsPanel, panel_rect.clone(), color(PANEL_BORDER), 1));
        nodes.extend(rows);
        y = panel_rect.bottom() + margin_bottom;
        trailing_margin = margin_bottom;
    }

    if let Some(items) = select_first(document, ".items")? {
        y += (20 - trailing_margin).max(0);
        let top = y;
        let inner_x = x0 + 1;
        let inner_w = width - 2;
        let mut cells = Vec::new();

        let mut cy = top + 1;
        if let Some(el) = items.select(&selector(".items-title")?).next() {
            let block = TextBlock::measure(&el, 15.0, inner_w - 30);
            let strip_h = block.height + 2 * CELL_PADDING;
            cells.push(fill(Role::ItemsTitle, Rect::new(inner_x, cy, inner_w, strip_h), color(TABLE_HEADER_FILL)));
            cells.push(block.place(Role::ItemsTitle, inner_x + 15, cy + CELL_PADDING, inner_w - 30));
            cy += strip_h;
            cells.push(fill(Role::Rule, Rect::new(inner_x, cy, inner_w, 1), color(TABLE_BORDER)));
            cy += 1;
        }

        let columns = ItemColumns::new(inner_x, inner_w);
        let th = selector("th")?;
        let td = selector("td")?;
        for head in items.select(&selector("thead tr")?) {
            cy = columns.row(&mut cells, head, &th, Role::ItemsHeading, 2, cy);
        }
        for row in items.select(&selector("tbody tr")?) {
            cy = columns.row(&mut cells, row, &td, Role::ItemCell, 1, cy);
        }

        let box_rect = Rect::new(x0, top, width, cy + 1 - top);
        nodes.push(fill(Role::ItemsBox, box_rect.clone(), WHITE));
        nodes.extend(cells);
        nodes.push(stroke(Role::ItemsBox, box_rect.clone(), color(TABLE_BORDER), 1));
        y = box_rect.bottom();
    }

    if let Some(amount) = select_first(document, ".amount")? {
        nodes.push(fill(Role::Rule, Rect::new(x0, y, width, 2), color(TABLE_BORDER)));
        y += 2 + 20;
        if let Some(el) = amount.select(&selector(".amount-label")?).next() {
            let block = TextBlock::measure(&el, 14.0, width);
            let h = block.height;
            nodes.push(block.place(Role::AmountLabel, x0, y, width));
            y += h + 5;
        }
        if let Some(el) = amount.select(&selector(".amount-value")?).next() {
            let block = TextBlock::measure(&el, 36.0, width);
            let h = block.height;
            nodes.push(block.place(Role::AmountValue, x0, y, width));
            y += h;
        }
    } else if select_first(document, ".amount-spacer")?.is_some() {
        y += 10;
    }

    // Footer sits at the bottom of the frame unless the body already reaches it
    let thank_you = select_first(document, ".thank-you")?.map(|el| TextBlock::measure(&el, 16.0, width));
    let trust = select_first(document, ".trust-name")?.map(|el| TextBlock::measure(&el, 13.0, width));
    let footer_h = thank_you.as_ref().map(|b| b.height + 8).unwrap_or(0) + trust.as_ref().map(|b| b.height).unwrap_or(0);
    if footer_h > 0 {
        let mut fy = (bottom - footer_h).max(y + 16);
        if let Some(block) = thank_you {
            let h = block.height;
            nodes.push(block.place(Role::Footer, x0, fy, width));
            fy += h + 8;
        }
        if let Some(block) = trust {
            nodes.push(block.place(Role::Footer, x0, fy, width));
        }
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_uri(w: u32, h: u32) -> String {
        use base64::Engine as _;
        let img = RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageOutputFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", base64::engine::general_purpose::STANDARD.encode(out))
    }

    fn roles(nodes: &[LayoutNode], role: Role) -> Vec<&LayoutNode> {
        nodes.iter().filter(|n| n.role == role).collect()
    }

    #[test]
    fn rejects_fragments_without_frame() {
        let doc = Html::parse_fragment("<p>hello</p>");
        assert!(layout_receipt(&doc, PageGeometry::default()).is_err());
    }

    #[test]
    fn banner_is_contained_under_max_height() {
        let html = format!(
            r#"<div class="receipt-frame"><div class="banner"><img src="{}"></div></div>"#,
            png_data_uri(400, 100)
        );
        let doc = Html::parse_fragment(&html);
        let nodes = layout_receipt(&doc, PageGeometry::default()).unwrap();
        let banner = roles(&nodes, Role::Banner);
        assert_eq!(banner.len(), 1);
        // 626px content width would make it 156px tall, so height caps at 120
        assert_eq!(banner[0].rect.height, 120);
        assert_eq!(banner[0].rect.width, 480);
        assert_eq!(banner[0].rect.x, 84 + (626 - 480) / 2);
    }

    #[test]
    fn title_is_uppercased_from_inline_style() {
        let html = r#"<div class="receipt-frame"><h2 class="receipt-title" style="font-size: 28px; text-transform: uppercase;">Donation Collection</h2><p class="receipt-no">#123456</p></div>"#;
        let doc = Html::parse_fragment(html);
        let nodes = layout_receipt(&doc, PageGeometry::default()).unwrap();
        let title = roles(&nodes, Role::Title);
        assert_eq!(title[0].lines(), ["DONATION COLLECTION".to_string()]);
    }

    #[test]
    fn detail_rows_stack_inside_panel() {
        let html = r#"<div class="receipt-frame"><div class="details" style="margin-bottom: 20px;"><table>
            <tr><td class="label">Date</td><td class="value">01/01/2026</td></tr>
            <tr><td class="label">Donor Name</td><td class="value">Asha</td></tr>
        </table></div></div>"#;
        let doc = Html::parse_fragment(html);
        let nodes = layout_receipt(&doc, PageGeometry::default()).unwrap();
        let panel = &roles(&nodes, Role::DetailsPanel)[0].rect;
        let values = roles(&nodes, Role::DetailValue);
        assert_eq!(values.len(), 2);
        assert!(values[0].rect.y < values[1].rect.y);
        for v in values {
            assert!(v.rect.y > panel.y && v.rect.bottom() < panel.bottom());
        }
    }

    #[test]
    fn contain_keeps_aspect() {
        assert_eq!(contain(100, 100, 626, 120), (120, 120));
        assert_eq!(contain(1000, 100, 500, 120), (500, 50));
    }
}
