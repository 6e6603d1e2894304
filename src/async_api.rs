use crate::{
    DonationRecord, Error, Locale, OutputMode, ReceiptOutput, ReceiptRenderer, RenderedReceipt,
    RendererConfig, Result, SurfaceHost,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;

/// An async-friendly receipt renderer.
///
/// Each call runs the blocking pipeline on its own worker thread and
/// delivers the result through a oneshot channel, so async callers never
/// block their executor on banner fetches or rasterization.
#[derive(Clone)]
pub struct AsyncReceiptRenderer {
    inner: Arc<ReceiptRenderer>,
}

impl AsyncReceiptRenderer {
    /// Create a renderer with the built-in backends.
    pub fn new(config: RendererConfig) -> Result<Self> {
        Ok(Self::from_renderer(ReceiptRenderer::new(config)?))
    }

    pub fn from_renderer(renderer: ReceiptRenderer) -> Self {
        Self {
            inner: Arc::new(renderer),
        }
    }

    pub fn renderer(&self) -> &ReceiptRenderer {
        &self.inner
    }

    pub fn surface_host(&self) -> &SurfaceHost {
        self.inner.surface_host()
    }

    fn spawn<T, F>(&self, what: &'static str, job: F) -> impl std::future::Future<Output = Result<T>>
    where
        T: Send + 'static,
        F: FnOnce(&ReceiptRenderer) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let renderer = self.inner.clone();
        thread::spawn(move || {
            let _ = tx.send(job(&renderer));
        });
        async move {
            match rx.await {
                Ok(res) => res,
                Err(e) => Err(Error::Other(format!("{} canceled: {}", what, e))),
            }
        }
    }

    /// Render using the renderer's catalog for `locale`
    pub async fn render(&self, record: DonationRecord, locale: Locale, mode: OutputMode) -> Result<ReceiptOutput> {
        self.spawn("Render", move |r| r.render_localized(&record, locale, mode))
            .await
    }

    /// Rasterize without encoding
    pub async fn preview(&self, record: DonationRecord, locale: Locale) -> Result<RenderedReceipt> {
        self.spawn("Preview", move |r| {
            let text = r.catalog().translator(locale);
            r.preview(&record, locale, &text)
        })
        .await
    }

    /// Like [`render`](Self::render) but gives up after `limit`.
    ///
    /// The worker thread is not interrupted; it finishes in the background
    /// and its surface is still detached when it does.
    pub async fn render_with_timeout(
        &self,
        record: DonationRecord,
        locale: Locale,
        mode: OutputMode,
        limit: Duration,
    ) -> Result<ReceiptOutput> {
        match tokio::time::timeout(limit, self.render(record, locale, mode)).await {
            Ok(res) => res,
            Err(_) => {
                log::warn!("receipt render exceeded {}ms", limit.as_millis());
                Err(Error::Timeout(limit.as_millis() as u64))
            }
        }
    }

    /// Render several records concurrently; results keep the input order.
    pub async fn render_all(
        &self,
        records: Vec<DonationRecord>,
        locale: Locale,
        mode: OutputMode,
    ) -> Vec<Result<ReceiptOutput>> {
        let jobs = records
            .into_iter()
            .map(|record| self.render(record, locale, mode));
        futures::future::join_all(jobs).await
    }
}
