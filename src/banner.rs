//! Banner image sources.
//!
//! The trust banner is fetched fresh on every render (no cache) and inlined
//! into the receipt template as a base64 `data:` URI.

use base64::Engine as _;
use std::path::PathBuf;

use crate::{Error, RendererConfig, Result};

/// An image payload with its sniffed MIME type
#[derive(Debug, Clone, PartialEq)]
pub struct BannerImage {
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl BannerImage {
    /// Wrap raw bytes, rejecting anything that is not a PNG or JPEG image.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mime = match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => "image/png",
            Ok(image::ImageFormat::Jpeg) => "image/jpeg",
            Ok(other) => {
                return Err(Error::FetchError(format!("unsupported banner format {:?}", other)))
            }
            Err(_) => return Err(Error::FetchError("banner payload is not an image".into())),
        };
        Ok(Self { mime, bytes })
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Decode a `data:` URI produced by [`BannerImage::to_data_uri`].
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::RenderError("image source is not a data URI".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::RenderError("data URI has no payload".into()))?;
    let mime = header.split(';').next().unwrap_or("application/octet-stream").to_string();
    if !header.contains(";base64") {
        return Err(Error::RenderError("only base64 data URIs are supported".into()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::RenderError(format!("invalid base64 in data URI: {}", e)))?;
    Ok((mime, bytes))
}

/// Where the banner comes from. Implementations must not cache between calls.
pub trait BannerSource: Send + Sync {
    fn fetch(&self) -> Result<BannerImage>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// Banner bytes held in memory
#[derive(Debug, Clone)]
pub struct StaticBanner {
    bytes: Vec<u8>,
}

impl StaticBanner {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl BannerSource for StaticBanner {
    fn fetch(&self) -> Result<BannerImage> {
        BannerImage::from_bytes(self.bytes.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} bytes)", self.bytes.len())
    }
}

/// Banner read from the local filesystem on each fetch
#[derive(Debug, Clone)]
pub struct FileBanner {
    path: PathBuf,
}

impl FileBanner {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BannerSource for FileBanner {
    fn fetch(&self) -> Result<BannerImage> {
        let bytes = std::fs::read(&self.path)
            .map_err(|e| Error::FetchError(format!("{}: {}", self.path.display(), e)))?;
        BannerImage::from_bytes(bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Banner fetched over HTTP(S) with the configured timeout and user agent
#[cfg(feature = "http")]
pub struct HttpBanner {
    client: reqwest::blocking::Client,
    url: String,
    user_agent: String,
}

#[cfg(feature = "http")]
impl HttpBanner {
    pub fn new(url: impl Into<String>, config: &RendererConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            user_agent: config.user_agent.clone(),
        })
    }
}

#[cfg(feature = "http")]
impl BannerSource for HttpBanner {
    fn fetch(&self) -> Result<BannerImage> {
        let resp = self
            .client
            .get(&self.url)
            .header("User-Agent", self.user_agent.clone())
            .send()
            .map_err(|e| Error::FetchError(format!("Failed to fetch {}: {}", self.url, e)))?
            .error_for_status()
            .map_err(|e| Error::FetchError(format!("Failed to fetch {}: {}", self.url, e)))?;

        let body = resp
            .bytes()
            .map_err(|e| Error::FetchError(format!("Failed to read response body: {}", e)))?;
        log::debug!("fetched banner {} ({} bytes)", self.url, body.len());
        BannerImage::from_bytes(body.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Pick a source for `location`: `http(s)://` URLs, `file://` URLs, or plain paths.
pub fn banner_source_for(location: &str, config: &RendererConfig) -> Result<Box<dyn BannerSource>> {
    if let Ok(parsed) = url::Url::parse(location) {
        match parsed.scheme() {
            "http" | "https" => {
                #[cfg(feature = "http")]
                {
                    return Ok(Box::new(HttpBanner::new(location, config)?));
                }
                #[cfg(not(feature = "http"))]
                {
                    let _ = config;
                    return Err(Error::ConfigError(format!(
                        "banner URL {} needs the `http` feature",
                        location
                    )));
                }
            }
            "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| Error::ConfigError(format!("invalid file URL {}", location)))?;
                return Ok(Box::new(FileBanner::new(path)));
            }
            // Windows drive letters parse as a one-letter scheme
            s if s.len() == 1 => {}
            other => {
                return Err(Error::ConfigError(format!("unsupported banner scheme '{}'", other)))
            }
        }
    }
    Ok(Box::new(FileBanner::new(location)))
}
