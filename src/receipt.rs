//! The receipt pipeline: template, raster, document.

use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::banner::{banner_source_for, BannerSource};
use crate::i18n::{Catalog, Locale, Translate};
use crate::model::DonationRecord;
use crate::pdf::{DocumentEncoder, DocumentInfo, PdfEncoder};
use crate::rendering::font::FontBook;
use crate::rendering::{Bitmap, BuiltinRasterizer, Rasterizer};
use crate::surface::SurfaceHost;
use crate::template::{self, TemplateContext};
use crate::{RendererConfig, Result};

/// What to do with the finished document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Write into the configured output directory
    SaveToDisk,
    /// Hand the bytes back to the caller
    ReturnFile,
}

/// A finished receipt document held in memory
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
}

impl ReceiptFile {
    /// Write into `dir`, creating it if needed. Returns the written path.
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        write_atomically(dir.as_ref(), &self.filename, &self.bytes)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiptOutput {
    Saved { path: PathBuf, filename: String },
    File(ReceiptFile),
}

impl ReceiptOutput {
    pub fn filename(&self) -> &str {
        match self {
            ReceiptOutput::Saved { filename, .. } => filename,
            ReceiptOutput::File(file) => &file.filename,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ReceiptOutput::Saved { path, .. } => Some(path),
            ReceiptOutput::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<ReceiptFile> {
        match self {
            ReceiptOutput::File(file) => Some(file),
            ReceiptOutput::Saved { .. } => None,
        }
    }
}

/// A rasterized receipt before document encoding
#[derive(Debug, Clone)]
pub struct RenderedReceipt {
    pub html: String,
    pub receipt_no: String,
    pub date: String,
    pub issued_at: DateTime<Utc>,
    pub bitmap: Bitmap,
}

impl RenderedReceipt {
    /// Text nodes of the template in document order
    pub fn visible_text(&self) -> Vec<String> {
        template::visible_text(&self.html)
    }

    pub fn digest(&self) -> String {
        self.bitmap.digest()
    }
}

/// Characters that cannot appear in a file name on common filesystems
fn is_path_illegal(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// `Donation_Receipt_<donor>_<millis>_<locale>.<ext>` with illegal characters replaced by `_`
pub fn receipt_filename(donor_name: &str, millis: i64, locale: Locale, extension: &str) -> String {
    let donor: String = donor_name
        .trim()
        .chars()
        .map(|c| if is_path_illegal(c) { '_' } else { c })
        .collect();
    format!("Donation_Receipt_{}_{}_{}.{}", donor, millis, locale.code(), extension)
}

/// Write to a uniquely named temp file in `dir`, then persist it under `filename`.
///
/// Readers never see a partly written receipt; the temp file is removed if
/// anything fails before the rename.
fn write_atomically(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| e.error)?;
    Ok(path)
}

/// Blocking receipt renderer
///
/// Holds the banner source, rasterizer and document encoder; each is
/// replaceable. Safe to share across threads.
pub struct ReceiptRenderer {
    config: RendererConfig,
    catalog: Catalog,
    banner: Box<dyn BannerSource>,
    rasterizer: Box<dyn Rasterizer>,
    encoder: Box<dyn DocumentEncoder>,
    host: SurfaceHost,
}

impl std::fmt::Debug for ReceiptRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiptRenderer")
            .field("config", &self.config)
            .field("banner", &self.banner.describe())
            .field("attached_surfaces", &self.host.attached_count())
            .finish()
    }
}

impl ReceiptRenderer {
    /// Renderer with the built-in rasterizer, PDF encoder and catalog.
    /// The banner source is picked from `config.banner_url`.
    pub fn new(config: RendererConfig) -> Result<Self> {
        config.validate()?;
        let banner = banner_source_for(&config.banner_url, &config)?;
        log::debug!("banner source: {}", banner.describe());
        let fonts = FontBook::from_config(&config)?;
        if fonts.is_empty() {
            log::info!("no outline fonts found; Kannada text uses bitmap glyphs");
        }
        Ok(Self {
            config,
            catalog: Catalog::builtin(),
            banner,
            rasterizer: Box::new(BuiltinRasterizer::with_fonts(fonts)),
            encoder: Box::new(PdfEncoder::new()),
            host: SurfaceHost::new(),
        })
    }

    pub fn with_banner_source(mut self, banner: Box<dyn BannerSource>) -> Self {
        self.banner = banner;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn DocumentEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Share a surface host, e.g. to observe attached surfaces from outside
    pub fn with_surface_host(mut self, host: SurfaceHost) -> Self {
        self.host = host;
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn surface_host(&self) -> &SurfaceHost {
        &self.host
    }

    /// Fetch the banner and assemble the template for `record`.
    pub fn render_html(
        &self,
        record: &DonationRecord,
        locale: Locale,
        t: &dyn Translate,
        issued_at: DateTime<Utc>,
    ) -> Result<String> {
        let banner = self.banner.fetch()?;
        let banner_src = banner.to_data_uri();
        let ctx = TemplateContext {
            locale,
            text: t,
            banner_src: &banner_src,
            currency_symbol: &self.config.currency_symbol,
            issued_at,
            display_offset: self.config.display_offset(),
        };
        Ok(template::build_receipt_html(record, &ctx))
    }

    /// Rasterize a receipt without encoding it, as of `issued_at`.
    ///
    /// The render surface is attached only while the rasterizer runs.
    pub fn preview_at(
        &self,
        record: &DonationRecord,
        locale: Locale,
        t: &dyn Translate,
        issued_at: DateTime<Utc>,
    ) -> Result<RenderedReceipt> {
        record.check_renderable()?;
        let html = self.render_html(record, locale, t, issued_at)?;

        let bitmap = {
            let label = format!("receipt:{}:{}", record.donor_name.trim(), locale);
            let surface = self.host.attach(label, html.clone(), self.config.page);
            self.rasterizer
                .render_template_to_bitmap(surface.html(), surface.page(), self.config.device_scale)?
        };

        Ok(RenderedReceipt {
            html,
            receipt_no: template::resolve_receipt_no(record, issued_at),
            date: template::resolve_date(record, locale, issued_at, self.config.display_offset()),
            issued_at,
            bitmap,
        })
    }

    pub fn preview(&self, record: &DonationRecord, locale: Locale, t: &dyn Translate) -> Result<RenderedReceipt> {
        self.preview_at(record, locale, t, Utc::now())
    }

    /// Render `record` into a document and save or return it.
    pub fn render(
        &self,
        record: &DonationRecord,
        locale: Locale,
        t: &dyn Translate,
        mode: OutputMode,
    ) -> Result<ReceiptOutput> {
        let result = self.render_inner(record, locale, t, mode);
        match &result {
            Ok(output) => log::info!("receipt ready: {}", output.filename()),
            Err(e) => log::error!("receipt for '{}' ({}) failed: {}", record.donor_name.trim(), locale, e),
        }
        result
    }

    /// [`render`](Self::render) with text from the renderer's catalog
    pub fn render_localized(&self, record: &DonationRecord, locale: Locale, mode: OutputMode) -> Result<ReceiptOutput> {
        let text = self.catalog.translator(locale);
        self.render(record, locale, &text, mode)
    }

    fn render_inner(
        &self,
        record: &DonationRecord,
        locale: Locale,
        t: &dyn Translate,
        mode: OutputMode,
    ) -> Result<ReceiptOutput> {
        let rendered = self.preview_at(record, locale, t, Utc::now())?;

        let info = DocumentInfo {
            title: format!("{} #{}", t.text_or("receipt_title", "Donation Receipt"), rendered.receipt_no),
            author: self.config.document_author.clone(),
            subject: record.donor_name.trim().to_string(),
            created: Some(rendered.issued_at),
        };
        let bytes = self.encoder.embed_bitmap_in_document(&rendered.bitmap, &info)?;
        let filename = receipt_filename(
            &record.donor_name,
            rendered.issued_at.timestamp_millis(),
            locale,
            self.encoder.extension(),
        );

        let file = ReceiptFile {
            bytes,
            filename,
            mime: self.encoder.mime_type(),
        };
        match mode {
            OutputMode::ReturnFile => Ok(ReceiptOutput::File(file)),
            OutputMode::SaveToDisk => {
                let path = file.save_to(&self.config.output_dir)?;
                Ok(ReceiptOutput::Saved {
                    path,
                    filename: file.filename,
                })
            }
        }
    }
}
