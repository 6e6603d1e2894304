//! Async facade over the blocking renderer

mod common;

use common::{asha, groceries, renderer};
use receipt_renderer::{
    AsyncReceiptRenderer, BannerImage, BannerSource, DonationRecord, Error, Locale, OutputMode,
    PaymentMode, Result, StaticBanner,
};
use std::time::Duration;

/// Banner source that takes its time
struct SlowBanner(StaticBanner, Duration);

impl BannerSource for SlowBanner {
    fn fetch(&self) -> Result<BannerImage> {
        std::thread::sleep(self.1);
        self.0.fetch()
    }

    fn describe(&self) -> String {
        "slow".into()
    }
}

#[tokio::test]
async fn renders_off_the_executor() {
    let r = AsyncReceiptRenderer::from_renderer(renderer());
    let out = r.render(asha(), Locale::En, OutputMode::ReturnFile).await.unwrap();
    assert!(out.filename().ends_with("_en.pdf"));
    assert_eq!(r.surface_host().attached_count(), 0);
}

#[tokio::test]
async fn preview_returns_bitmap() {
    let r = AsyncReceiptRenderer::from_renderer(renderer());
    let preview = r.preview(groceries(2), Locale::Kn).await.unwrap();
    assert_eq!(preview.bitmap.width, 794 * 2);
    assert!(preview.html.contains("lang=\"kn\""));
}

#[tokio::test]
async fn render_all_keeps_input_order() {
    let r = AsyncReceiptRenderer::from_renderer(renderer());
    let records = vec![
        DonationRecord::new("First", "1", PaymentMode::Cash, "1"),
        DonationRecord::new("", "2", PaymentMode::Cash, "2"),
        DonationRecord::new("Third", "3", PaymentMode::Cash, "3"),
    ];
    let results = r.render_all(records, Locale::En, OutputMode::ReturnFile).await;
    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().filename().contains("_First_"));
    assert!(matches!(results[1], Err(Error::InvalidRecord(_))));
    assert!(results[2].as_ref().unwrap().filename().contains("_Third_"));
}

#[tokio::test]
async fn timeout_is_reported() {
    let slow = SlowBanner(StaticBanner::new(common::banner_png()), Duration::from_millis(500));
    let r = AsyncReceiptRenderer::from_renderer(renderer().with_banner_source(Box::new(slow)));
    let err = r
        .render_with_timeout(asha(), Locale::En, OutputMode::ReturnFile, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(20)));
}

#[tokio::test]
async fn generous_timeout_lets_render_finish() {
    let r = AsyncReceiptRenderer::from_renderer(renderer());
    let out = r
        .render_with_timeout(asha(), Locale::En, OutputMode::ReturnFile, Duration::from_secs(60))
        .await;
    assert!(out.is_ok());
}
