//! Donation Receipt Renderer
//!
//! Turns a donation record into a single-page, bilingual PDF receipt for the
//! Paramashakthi Sri Guru Kottureshwara Trust.
//!
//! Rendering is a three-stage pipeline:
//!
//! - **Template**: the record becomes an HTML fragment ([`template`])
//! - **Raster**: the fragment is attached to an off-screen surface and
//!   rasterized at 2x ([`rendering`], [`surface`])
//! - **Document**: the bitmap is embedded full-page into a PDF ([`pdf`])
//!
//! Each stage sits behind a trait so other backends (a headless browser, a
//! native PDF layout library) can replace the built-in ones.
//!
//! # Example
//!
//! ```no_run
//! use receipt_renderer::{DonationRecord, Locale, OutputMode, PaymentMode, ReceiptRenderer, RendererConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RendererConfig {
//!     banner_url: "assets/banner-kn.jpg".to_string(),
//!     output_dir: "receipts".into(),
//!     ..Default::default()
//! };
//!
//! let renderer = ReceiptRenderer::new(config)?;
//! let record = DonationRecord::new("Asha", "500", PaymentMode::Cash, "9999999999");
//! let output = renderer.render_localized(&record, Locale::En, OutputMode::SaveToDisk)?;
//! println!("{}", output.filename());
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, Result};

pub mod banner;
pub mod i18n;
pub mod model;
pub mod pdf;
pub mod receipt;
pub mod share;
pub mod surface;
pub mod template;

// Layout, paint and raster stages of the built-in rasterizer
pub mod rendering;

// Async facade (worker thread per render, oneshot reply)
pub mod async_api;

pub use async_api::AsyncReceiptRenderer;
pub use banner::{BannerImage, BannerSource, FileBanner, StaticBanner};
pub use i18n::{Catalog, Locale, Translate};
pub use model::{DonationRecord, GroceryItem, PaymentMode};
pub use pdf::{DocumentEncoder, DocumentInfo, PdfEncoder};
pub use receipt::{OutputMode, ReceiptFile, ReceiptOutput, ReceiptRenderer, RenderedReceipt};
pub use rendering::font::{FontBook, OutlineFont};
pub use rendering::{Bitmap, BuiltinRasterizer, Rasterizer};
pub use surface::{SurfaceGuard, SurfaceHost};

/// Largest page side accepted, in CSS pixels
pub const MAX_PAGE_PX: u32 = 10_000;

/// Largest raster scale factor accepted
pub const MAX_DEVICE_SCALE: u32 = 4;

/// Configuration for the receipt renderer
///
/// The defaults reproduce the trust's printed receipt:
/// - a 794 x 1123 px page (A4 at 96 dpi) rasterized at 2x
/// - dates shown in Indian Standard Time
///
/// # Examples
///
/// ```
/// let cfg = receipt_renderer::RendererConfig::default();
/// assert_eq!(cfg.device_scale, 2);
/// assert_eq!(cfg.page.width, 794);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Banner image location: `http(s)://` URL, `file://` URL or local path
    pub banner_url: String,
    /// Page size in CSS pixels
    pub page: PageGeometry,
    /// Raster scale factor applied to the page size
    pub device_scale: u32,
    /// Timeout for the banner fetch in milliseconds
    pub timeout_ms: u64,
    /// User agent string sent with banner requests
    pub user_agent: String,
    /// Offset from UTC used to display `createdAt` dates, in minutes
    pub utc_offset_minutes: i32,
    /// Directory receipts are written to in [`OutputMode::SaveToDisk`]
    pub output_dir: PathBuf,
    /// Prefix of the amount block
    pub currency_symbol: String,
    /// Author recorded in the PDF document information
    pub document_author: String,
    /// Outline font files used for text the bitmap glyphs lack, in order
    pub fonts: Vec<PathBuf>,
    /// Also use Kannada fonts installed on the system
    pub system_fonts: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            banner_url: "assets/banner-kn.jpg".to_string(),
            page: PageGeometry::default(),
            device_scale: 2,
            timeout_ms: 30000,
            user_agent: concat!("receipt-renderer/", env!("CARGO_PKG_VERSION")).to_string(),
            utc_offset_minutes: 330,
            output_dir: PathBuf::from("."),
            currency_symbol: "₹".to_string(),
            document_author: "Paramashakthi Sri Guru Kottureshwara Trust (R)".to_string(),
            fonts: Vec::new(),
            system_fonts: true,
        }
    }
}

impl RendererConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config: RendererConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page.width == 0 || self.page.height == 0 {
            return Err(Error::ConfigError("page dimensions must be non-zero".into()));
        }
        if self.page.width > MAX_PAGE_PX || self.page.height > MAX_PAGE_PX {
            return Err(Error::ConfigError(format!(
                "page {}x{} exceeds {} px per side",
                self.page.width, self.page.height, MAX_PAGE_PX
            )));
        }
        if !(1..=MAX_DEVICE_SCALE).contains(&self.device_scale) {
            return Err(Error::ConfigError(format!(
                "device_scale must be between 1 and {}, got {}",
                MAX_DEVICE_SCALE, self.device_scale
            )));
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(Error::ConfigError("utc_offset_minutes out of range".into()));
        }
        if self.banner_url.trim().is_empty() {
            return Err(Error::ConfigError("banner_url is empty".into()));
        }
        Ok(())
    }

    /// Display time zone derived from `utc_offset_minutes`
    pub fn display_offset(&self) -> chrono::FixedOffset {
        use chrono::Offset;
        chrono::FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| chrono::Utc.fix())
    }
}

/// Page dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 794,
            height: 1123,
        }
    }
}

impl PageGeometry {
    /// Pixel size of the bitmap at `scale`.
    ///
    /// Fails when the page or the scaled bitmap is larger than the renderer accepts.
    pub fn scaled(&self, scale: u32) -> Result<(u32, u32)> {
        let limit = MAX_PAGE_PX * MAX_DEVICE_SCALE;
        let too_large = || {
            Error::ConfigError(format!(
                "page {}x{} at scale {} exceeds {} px per side",
                self.width, self.height, scale, limit
            ))
        };
        let width = self.width.checked_mul(scale).ok_or_else(too_large)?;
        let height = self.height.checked_mul(scale).ok_or_else(too_large)?;
        if self.width > MAX_PAGE_PX || self.height > MAX_PAGE_PX || width > limit || height > limit {
            return Err(too_large());
        }
        Ok((width, height))
    }
}
