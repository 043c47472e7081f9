//! Image acquisition: turn a product image reference into a pasteable image.
//!
//! Every failure here is recoverable by definition. A reference that is
//! blank or the feed's `nan` marker short-circuits before any network
//! access; anything else gets exactly one GET bounded by the configured
//! timeout. There is no retry: the engine would rather print a card without
//! a photo than hold up the whole store.

use crate::config::FlyerConfig;
use crate::error::{AcquisitionError, FlyerError};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Where product images come from.
///
/// The default is [`HttpImageSource`]; tests and offline runs inject their
/// own through [`crate::config::FlyerConfigBuilder::image_source`].
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch and decode one image. `reference` is already known to be usable.
    async fn fetch(&self, reference: &str) -> Result<DynamicImage, AcquisitionError>;
}

/// Return the trimmed reference, or `None` for the missing-data markers the
/// feed produces (absent, empty, whitespace, `nan`).
pub fn usable_reference(reference: Option<&str>) -> Option<&str> {
    let r = reference?.trim();
    if r.is_empty() || r.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(r)
    }
}

/// Fetch a product image, rejecting unusable references without calling the
/// source.
pub async fn fetch_image(
    source: &dyn ImageSource,
    reference: Option<&str>,
) -> Result<DynamicImage, AcquisitionError> {
    let Some(reference) = usable_reference(reference) else {
        return Err(AcquisitionError::MissingReference);
    };
    source.fetch(reference).await
}

/// Plain HTTP(S) GET with a browser-like user agent.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpImageSource {
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FlyerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| FlyerError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, AcquisitionError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AcquisitionError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                AcquisitionError::Request {
                    url: url.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        if !response.status().is_success() {
            return Err(AcquisitionError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                AcquisitionError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                AcquisitionError::Request {
                    url: url.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let image = image::load_from_memory(&bytes).map_err(|e| AcquisitionError::Decode {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        debug!("Fetched {} → {}x{} px", url, image.width(), image.height());

        Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
    }
}

/// Resolve the image source: the injected one, else an HTTP source.
pub fn resolve_image_source(config: &FlyerConfig) -> Result<Arc<dyn ImageSource>, FlyerError> {
    if let Some(ref source) = config.image_source {
        return Ok(Arc::clone(source));
    }
    let http = HttpImageSource::new(config.fetch_timeout_secs, &config.user_agent)?;
    Ok(Arc::new(http))
}

/// Load a local template asset (logo or header photo) as RGBA.
pub fn load_asset(path: &Path) -> Result<DynamicImage, AcquisitionError> {
    let image = image::open(path).map_err(|e| AcquisitionError::Asset {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageSource for CountingSource {
        async fn fetch(&self, _reference: &str) -> Result<DynamicImage, AcquisitionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DynamicImage::new_rgba8(4, 4))
        }
    }

    #[test]
    fn usable_reference_filters_markers() {
        assert_eq!(usable_reference(None), None);
        assert_eq!(usable_reference(Some("")), None);
        assert_eq!(usable_reference(Some("   ")), None);
        assert_eq!(usable_reference(Some("nan")), None);
        assert_eq!(usable_reference(Some("NaN")), None);
        assert_eq!(
            usable_reference(Some(" https://img.example/a.jpg ")),
            Some("https://img.example/a.jpg")
        );
    }

    #[tokio::test]
    async fn missing_references_never_reach_the_source() {
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        for r in [None, Some(""), Some("nan"), Some("  ")] {
            let result = fetch_image(&source, r).await;
            assert_eq!(result.unwrap_err(), AcquisitionError::MissingReference);
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        assert!(fetch_image(&source, Some("https://img.example/1.png"))
            .await
            .is_ok());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_asset_is_recoverable() {
        let err = load_asset(Path::new("/no/such/logo.png")).unwrap_err();
        assert!(matches!(err, AcquisitionError::Asset { .. }));
    }

    #[test]
    fn injected_source_takes_priority() {
        let source: Arc<dyn ImageSource> = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let config = FlyerConfig::builder()
            .image_source(Arc::clone(&source))
            .build()
            .unwrap();
        let resolved = resolve_image_source(&config).unwrap();
        assert!(Arc::ptr_eq(&resolved, &source));
    }
}
