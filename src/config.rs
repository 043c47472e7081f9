//! Configuration for a flyer batch.
//!
//! Everything a run needs besides the fonts and the product data lives in
//! [`FlyerConfig`], built once by the driver through [`FlyerConfigBuilder`]
//! and shared read-only by every store task. The generation timestamp is a
//! field like any other, so two renders with the same config are
//! pixel-identical.

use crate::error::FlyerError;
use crate::pipeline::acquire::ImageSource;
use crate::progress::ProgressCallback;
use chrono::{Duration, NaiveDateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default worker pool size for concurrent stores.
pub const DEFAULT_WORKERS: usize = 4;

/// Configuration for a flyer batch.
///
/// # Example
/// ```rust
/// use lento_flyers::FlyerConfig;
///
/// let config = FlyerConfig::builder()
///     .output_dir("docs/flyers")
///     .public_base_url("https://example.github.io/flyers/")
///     .workers(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.workers, 8);
/// ```
#[derive(Clone)]
pub struct FlyerConfig {
    /// Directory the PDF documents are written to. Default: `docs/flyers`.
    pub output_dir: PathBuf,

    /// Prefix joined with the percent-encoded file name to form each
    /// document's public URL. Default: empty (URL = encoded file name).
    pub public_base_url: String,

    /// File name prefix for every document. Default: `LENTO_`.
    pub file_prefix: String,

    /// Directory holding the logo and header images. Default: `.`.
    pub asset_dir: PathBuf,

    /// Number of stores processed concurrently. Default: 4.
    pub workers: usize,

    /// Timeout for a single product image download, in seconds. Default: 10.
    pub fetch_timeout_secs: u64,

    /// `User-Agent` sent with image downloads. Default: `Mozilla/5.0`.
    ///
    /// Several image CDNs answer 403 to clients that do not look like a
    /// browser.
    pub user_agent: String,

    /// Local time printed in the "generated at" badge.
    pub generated_at: NaiveDateTime,

    /// Label before the timestamp. Default: `Generado`.
    pub timestamp_label: String,

    /// Text of the slogan band.
    pub slogan: String,

    /// JPEG quality of the pages embedded in the PDF (1–100). Default: 90.
    pub jpeg_quality: u8,

    /// Pixels per inch used to size the PDF pages. Default: 72, so one pixel
    /// maps to one PDF point.
    pub page_dpi: u32,

    /// Pre-constructed image source. If None, an HTTP source is built from
    /// `fetch_timeout_secs` and `user_agent`.
    pub image_source: Option<Arc<dyn ImageSource>>,

    /// Per-store progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for FlyerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("docs/flyers"),
            public_base_url: String::new(),
            file_prefix: "LENTO_".to_string(),
            asset_dir: PathBuf::from("."),
            workers: DEFAULT_WORKERS,
            fetch_timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            generated_at: local_now(-5),
            timestamp_label: "Generado".to_string(),
            slogan: "¡APROVECHA ESTAS INCREÍBLES OFERTAS!".to_string(),
            jpeg_quality: 90,
            page_dpi: 72,
            image_source: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for FlyerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlyerConfig")
            .field("output_dir", &self.output_dir)
            .field("public_base_url", &self.public_base_url)
            .field("file_prefix", &self.file_prefix)
            .field("asset_dir", &self.asset_dir)
            .field("workers", &self.workers)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("generated_at", &self.generated_at)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("page_dpi", &self.page_dpi)
            .field(
                "image_source",
                &self.image_source.as_ref().map(|_| "<dyn ImageSource>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl FlyerConfig {
    /// Create a new builder for `FlyerConfig`.
    pub fn builder() -> FlyerConfigBuilder {
        FlyerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The "generated at" badge text, e.g. `Generado: 17/10/2026 09:30 AM`.
    pub fn timestamp_text(&self) -> String {
        format!(
            "{}: {}",
            self.timestamp_label,
            self.generated_at.format("%d/%m/%Y %I:%M %p")
        )
    }
}

/// Current wall-clock time shifted to a fixed UTC offset.
pub fn local_now(utc_offset_hours: i32) -> NaiveDateTime {
    Utc::now().naive_utc() + Duration::hours(i64::from(utc_offset_hours))
}

/// Builder for [`FlyerConfig`].
#[derive(Debug)]
pub struct FlyerConfigBuilder {
    config: FlyerConfig,
}

impl FlyerConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.public_base_url = url.into();
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    pub fn asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.asset_dir = dir.into();
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.config.workers = n.max(1);
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn generated_at(mut self, at: NaiveDateTime) -> Self {
        self.config.generated_at = at;
        self
    }

    /// Stamp the current time at the given UTC offset (e.g. -5 for Lima).
    pub fn utc_offset_hours(mut self, hours: i32) -> Self {
        self.config.generated_at = local_now(hours.clamp(-12, 14));
        self
    }

    pub fn timestamp_label(mut self, label: impl Into<String>) -> Self {
        self.config.timestamp_label = label.into();
        self
    }

    pub fn slogan(mut self, slogan: impl Into<String>) -> Self {
        self.config.slogan = slogan.into();
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn page_dpi(mut self, dpi: u32) -> Self {
        self.config.page_dpi = dpi.clamp(36, 600);
        self
    }

    pub fn image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.config.image_source = Some(source);
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FlyerConfig, FlyerError> {
        let c = &self.config;
        if c.workers == 0 {
            return Err(FlyerError::InvalidConfig("Workers must be ≥ 1".into()));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(FlyerError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(FlyerError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn defaults_match_flyer_conventions() {
        let c = FlyerConfig::default();
        assert_eq!(c.workers, 4);
        assert_eq!(c.fetch_timeout_secs, 10);
        assert_eq!(c.user_agent, "Mozilla/5.0");
        assert_eq!(c.file_prefix, "LENTO_");
    }

    #[test]
    fn builder_clamps_workers() {
        let c = FlyerConfig::builder().workers(0).build().unwrap();
        assert_eq!(c.workers, 1);
    }

    #[test]
    fn empty_output_dir_is_rejected() {
        let err = FlyerConfig::builder().output_dir("").build().unwrap_err();
        assert!(matches!(err, FlyerError::InvalidConfig(_)));
    }

    #[test]
    fn timestamp_text_uses_twelve_hour_clock() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(15, 4, 0)
            .unwrap();
        let c = FlyerConfig::builder().generated_at(at).build().unwrap();
        assert_eq!(c.timestamp_text(), "Generado: 07/03/2026 03:04 PM");
    }

    #[test]
    fn debug_hides_trait_objects() {
        let c = FlyerConfig::default();
        let s = format!("{c:?}");
        assert!(s.contains("FlyerConfig"));
        assert!(s.contains("workers: 4"));
    }
}
