//! Render surfaces are released on every exit path

mod common;

use common::{asha, banner_png, config_in, renderer, scratch_dir};
use receipt_renderer::{
    Bitmap, BannerImage, BannerSource, DocumentEncoder, DocumentInfo, Error, Locale, OutputMode,
    PageGeometry, Rasterizer, ReceiptRenderer, Result, StaticBanner, SurfaceHost,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct UnreachableBanner;

impl BannerSource for UnreachableBanner {
    fn fetch(&self) -> Result<BannerImage> {
        Err(Error::FetchError("connection refused".into()))
    }

    fn describe(&self) -> String {
        "unreachable".into()
    }
}

/// Fails after checking its surface is attached
struct FailingRasterizer {
    host: SurfaceHost,
    seen_attached: Arc<AtomicUsize>,
}

impl Rasterizer for FailingRasterizer {
    fn render_template_to_bitmap(&self, _html: &str, _page: PageGeometry, _scale: u32) -> Result<Bitmap> {
        self.seen_attached.store(self.host.attached_count(), Ordering::SeqCst);
        Err(Error::RenderError("canvas exploded".into()))
    }
}

struct PanickingRasterizer;

impl Rasterizer for PanickingRasterizer {
    fn render_template_to_bitmap(&self, _html: &str, _page: PageGeometry, _scale: u32) -> Result<Bitmap> {
        panic!("rasterizer bug");
    }
}

struct FailingEncoder;

impl DocumentEncoder for FailingEncoder {
    fn embed_bitmap_in_document(&self, _bitmap: &Bitmap, _info: &DocumentInfo) -> Result<Vec<u8>> {
        Err(Error::EncodingError("out of paper".into()))
    }
}

#[test]
fn fetch_failure_attaches_nothing() {
    let host = SurfaceHost::new();
    let r = renderer()
        .with_surface_host(host.clone())
        .with_banner_source(Box::new(UnreachableBanner));
    let err = r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile).unwrap_err();
    assert!(matches!(err, Error::FetchError(_)));
    assert_eq!(host.attached_count(), 0);
}

#[test]
fn raster_failure_detaches_surface() {
    let host = SurfaceHost::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let r = renderer().with_surface_host(host.clone()).with_rasterizer(Box::new(FailingRasterizer {
        host: host.clone(),
        seen_attached: seen.clone(),
    }));
    let err = r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile).unwrap_err();
    assert!(matches!(err, Error::RenderError(_)));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(host.attached_count(), 0);
}

#[test]
fn raster_panic_detaches_surface() {
    let host = SurfaceHost::new();
    let r = renderer()
        .with_surface_host(host.clone())
        .with_rasterizer(Box::new(PanickingRasterizer));
    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile)
    }));
    assert!(res.is_err());
    assert_eq!(host.attached_count(), 0);
}

#[test]
fn encoding_failure_writes_nothing() {
    let scratch = scratch_dir("encode-fail");
    let dir = scratch.path().join("receipts");
    let r = ReceiptRenderer::new(config_in(dir.clone()))
        .unwrap()
        .with_banner_source(Box::new(StaticBanner::new(banner_png())))
        .with_encoder(Box::new(FailingEncoder));
    let err = r.render_localized(&asha(), Locale::En, OutputMode::SaveToDisk).unwrap_err();
    assert!(matches!(err, Error::EncodingError(_)));
    assert!(!dir.exists() || std::fs::read_dir(&dir).unwrap().next().is_none());
    assert_eq!(r.surface_host().attached_count(), 0);
}

#[test]
fn invalid_record_is_rejected_before_rendering() {
    let r = renderer();
    let record = receipt_renderer::DonationRecord::new("  ", "500", receipt_renderer::PaymentMode::Cash, "999");
    let err = r.render_localized(&record, Locale::En, OutputMode::ReturnFile).unwrap_err();
    assert!(matches!(err, Error::InvalidRecord(_)));

    let no_amount = receipt_renderer::DonationRecord::new("Asha", "", receipt_renderer::PaymentMode::Upi, "999");
    assert!(matches!(
        r.render_localized(&no_amount, Locale::En, OutputMode::ReturnFile),
        Err(Error::InvalidRecord(_))
    ));
    assert_eq!(r.surface_host().attached_count(), 0);
}

#[test]
fn undecodable_banner_is_a_fetch_error() {
    let r = renderer().with_banner_source(Box::new(StaticBanner::new(b"<html>not an image</html>".to_vec())));
    let err = r.render_localized(&asha(), Locale::En, OutputMode::ReturnFile).unwrap_err();
    assert!(matches!(err, Error::FetchError(_)));
}
