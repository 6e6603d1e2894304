//! Document encoding.
//!
//! The rasterized receipt is placed as one image covering a single A4 page.

use chrono::{DateTime, Datelike, Timelike, Utc};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Date, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use std::io::Write;

use crate::rendering::Bitmap;
use crate::{Error, Result};

/// A4 width in points
pub const A4_WIDTH_PT: f32 = 595.28;
/// A4 height in points
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Metadata written to the document information dictionary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub created: Option<DateTime<Utc>>,
}

/// Wraps a bitmap into a document file
pub trait DocumentEncoder: Send + Sync {
    fn embed_bitmap_in_document(&self, bitmap: &Bitmap, info: &DocumentInfo) -> Result<Vec<u8>>;

    /// MIME type of the produced bytes
    fn mime_type(&self) -> &'static str {
        "application/pdf"
    }

    /// File extension without the dot
    fn extension(&self) -> &'static str {
        "pdf"
    }
}

/// Single-page PDF encoder using `pdf-writer`
#[derive(Debug, Clone, Copy)]
pub struct PdfEncoder {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
}

impl Default for PdfEncoder {
    fn default() -> Self {
        Self {
            page_width_pt: A4_WIDTH_PT,
            page_height_pt: A4_HEIGHT_PT,
        }
    }
}

fn flate_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::EncodingError(format!("flate failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| Error::EncodingError(format!("flate failed: {}", e)))
}

fn pdf_date(when: DateTime<Utc>) -> Date {
    Date::new(when.year().clamp(0, 9999) as u16)
        .month(when.month() as u8)
        .day(when.day() as u8)
        .hour(when.hour() as u8)
        .minute(when.minute() as u8)
        .second(when.second() as u8)
        .utc_offset_hour(0)
}

impl PdfEncoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentEncoder for PdfEncoder {
    fn embed_bitmap_in_document(&self, bitmap: &Bitmap, info: &DocumentInfo) -> Result<Vec<u8>> {
        if bitmap.width == 0 || bitmap.height == 0 {
            return Err(Error::EncodingError("bitmap is empty".into()));
        }
        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let page_id = Ref::new(3);
        let image_id = Ref::new(4);
        let content_id = Ref::new(5);
        let info_id = Ref::new(6);
        let image_name = Name(b"Im1");

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id).kids([page_id]).count(1);

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, self.page_width_pt, self.page_height_pt));
        page.parent(page_tree_id);
        page.contents(content_id);
        page.resources().x_objects().pair(image_name, image_id);
        page.finish();

        let samples = flate_compress(&bitmap.to_rgb_bytes())?;
        let mut image = pdf.image_xobject(image_id, &samples);
        image.filter(Filter::FlateDecode);
        image.width(bitmap.width as i32);
        image.height(bitmap.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        image.finish();

        // Stretch the unit-square image over the whole page
        let mut content = Content::new();
        content.save_state();
        content.transform([self.page_width_pt, 0.0, 0.0, self.page_height_pt, 0.0, 0.0]);
        content.x_object(image_name);
        content.restore_state();
        pdf.stream(content_id, &content.finish());

        {
            let mut doc_info = pdf.document_info(info_id);
            doc_info.title(TextStr(&info.title));
            doc_info.author(TextStr(&info.author));
            doc_info.subject(TextStr(&info.subject));
            doc_info.creator(TextStr(concat!("receipt-renderer ", env!("CARGO_PKG_VERSION"))));
            doc_info.producer(TextStr("pdf-writer"));
            if let Some(created) = info.created {
                doc_info.creation_date(pdf_date(created));
            }
        }

        let bytes = pdf.finish();
        log::debug!(
            "encoded {}x{} bitmap into {} byte PDF",
            bitmap.width,
            bitmap.height,
            bytes.len()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn produces_single_page_pdf() {
        let bitmap = Bitmap::new(20, 30);
        let info = DocumentInfo {
            title: "Donation Receipt".into(),
            author: "Trust".into(),
            subject: "Receipt 123456".into(),
            created: None,
        };
        let bytes = PdfEncoder::new().embed_bitmap_in_document(&bitmap, &info).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let pages = count(&bytes, b"/Type /Page") - count(&bytes, b"/Type /Pages");
        assert_eq!(pages, 1);
        assert_eq!(count(&bytes, b"/Subtype /Image"), 1);
        assert!(count(&bytes, b"/Title") >= 1);
        assert!(count(&bytes, b"/FlateDecode") >= 1);
    }

    #[test]
    fn rejects_empty_bitmap() {
        let bitmap = Bitmap::new(0, 0);
        let err = PdfEncoder::new()
            .embed_bitmap_in_document(&bitmap, &DocumentInfo::default())
            .unwrap_err();
        assert!(matches!(err, Error::EncodingError(_)));
    }

    #[test]
    fn compression_shrinks_flat_pages() {
        let flat = vec![255u8; 3 * 100 * 100];
        assert!(flate_compress(&flat).unwrap().len() < flat.len() / 10);
    }
}
