//! Shared fixtures for the integration tests

#![allow(dead_code)]

use receipt_renderer::{
    DonationRecord, GroceryItem, PaymentMode, ReceiptRenderer, RendererConfig, StaticBanner,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// A small orange PNG standing in for the trust banner
pub fn banner_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(64, 16, image::Rgba([234, 88, 12, 255]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageOutputFormat::Png)
        .expect("encode banner");
    out
}

/// Fresh scratch directory, removed when dropped
pub fn scratch_dir(name: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("receipt-renderer-{}-", name))
        .tempdir()
        .expect("scratch dir")
}

pub fn config_in(dir: PathBuf) -> RendererConfig {
    RendererConfig {
        output_dir: dir,
        ..Default::default()
    }
}

/// Renderer with an in-memory banner, writing into `dir`
pub fn renderer_in(dir: PathBuf) -> ReceiptRenderer {
    ReceiptRenderer::new(config_in(dir))
        .expect("renderer")
        .with_banner_source(Box::new(StaticBanner::new(banner_png())))
}

pub fn renderer() -> ReceiptRenderer {
    renderer_in(std::env::temp_dir())
}

pub fn asha() -> DonationRecord {
    DonationRecord::new("Asha", "500", PaymentMode::Cash, "9999999999")
}

pub fn groceries(n: usize) -> DonationRecord {
    let mut record = DonationRecord::new("Ravi", "", PaymentMode::Groceries, "9876543210");
    for i in 0..n {
        record = record.with_item(GroceryItem::new(format!("Item {}", i + 1), format!("{}", i + 2), "kg"));
    }
    record
}
