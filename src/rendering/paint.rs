//! Paint commands in device pixels, produced from the layout

use image::RgbaImage;
use std::sync::Arc;

use super::layout::{LayoutNode, NodeKind};
use super::style::TextAlign;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: [u8; 4],
    },
    StrokeRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        thickness: u32,
        rgba: [u8; 4],
    },
    /// One line of text; glyph cells are `size` px tall and `advance` px apart
    Text {
        x: i32,
        y: i32,
        text: String,
        size: u32,
        advance: f32,
        bold: bool,
        rgba: [u8; 4],
    },
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        image: Arc<RgbaImage>,
    },
}

fn px(v: f32, scale: u32) -> i32 {
    (v * scale as f32).round() as i32
}

/// Flatten layout nodes into paint commands at `scale` device pixels per CSS pixel.
pub fn display_list(nodes: &[LayoutNode], scale: u32) -> Vec<PaintCommand> {
    let s = scale.max(1);
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let r = &node.rect;
        let (x, y) = (r.x * s as i32, r.y * s as i32);
        let (width, height) = (r.width * s, r.height * s);
        match &node.kind {
            NodeKind::Fill(rgba) => out.push(PaintCommand::SolidRect { x, y, width, height, rgba: *rgba }),
            NodeKind::Stroke { color, thickness } => out.push(PaintCommand::StrokeRect {
                x,
                y,
                width,
                height,
                thickness: thickness * s,
                rgba: *color,
            }),
            NodeKind::Image(image) => out.push(PaintCommand::Image {
                x,
                y,
                width,
                height,
                image: image.clone(),
            }),
            NodeKind::Text { lines, style } => {
                let line_px = style.line_px();
                let half_leading = (line_px - style.font_size) / 2.0;
                for (i, line) in lines.iter().enumerate() {
                    let text_w = style.text_width(line);
                    let offset = match style.align {
                        TextAlign::Left => 0.0,
                        TextAlign::Center => (r.width as f32 - text_w) / 2.0,
                        TextAlign::Right => r.width as f32 - text_w,
                    };
                    out.push(PaintCommand::Text {
                        x: px(r.x as f32 + offset, s),
                        y: px(r.y as f32 + i as f32 * line_px + half_leading, s),
                        text: line.clone(),
                        size: px(style.font_size, s).max(1) as u32,
                        advance: style.advance() * s as f32,
                        bold: style.bold,
                        rgba: style.color,
                    });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::layout::{Rect, Role};
    use crate::rendering::style::TextStyle;

    #[test]
    fn fills_are_scaled() {
        let nodes = vec![LayoutNode {
            rect: Rect::new(10, 20, 30, 40),
            kind: NodeKind::Fill([1, 2, 3, 255]),
            role: Role::Page,
        }];
        let cmds = display_list(&nodes, 2);
        assert_eq!(
            cmds,
            vec![PaintCommand::SolidRect { x: 20, y: 40, width: 60, height: 80, rgba: [1, 2, 3, 255] }]
        );
    }

    #[test]
    fn right_aligned_text_ends_at_box_edge() {
        let mut style = TextStyle::with_size(10.0);
        style.align = TextAlign::Right;
        style.line_height = 1.0;
        let nodes = vec![LayoutNode {
            rect: Rect::new(0, 0, 100, 10),
            kind: NodeKind::Text { lines: vec!["abcde".into()], style },
            role: Role::AmountValue,
        }];
        match &display_list(&nodes, 1)[0] {
            PaintCommand::Text { x, y, size, .. } => {
                assert_eq!(*x, 70);
                assert_eq!(*y, 0);
                assert_eq!(*size, 10);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn one_command_per_line() {
        let nodes = vec![LayoutNode {
            rect: Rect::new(0, 0, 50, 40),
            kind: NodeKind::Text {
                lines: vec!["a".into(), "b".into()],
                style: TextStyle::with_size(10.0),
            },
            role: Role::DetailValue,
        }];
        let cmds = display_list(&nodes, 2);
        assert_eq!(cmds.len(), 2);
        let ys: Vec<i32> = cmds
            .iter()
            .map(|c| match c {
                PaintCommand::Text { y, .. } => *y,
                _ => -1,
            })
            .collect();
        assert!(ys[1] > ys[0]);
    }
}
