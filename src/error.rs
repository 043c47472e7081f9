//! Error types for the lento-flyers library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FlyerError`]: **Fatal** for the scope it is raised in: a missing font
//!   stops the run before it starts, a failed document write drops one store.
//!   Returned as `Err(FlyerError)` from the batch and document functions.
//!
//! * [`AcquisitionError`]: **Non-fatal**: a product photo, logo or header
//!   image could not be obtained. The composition engine consumes it by
//!   leaving that visual element out; it never reaches the caller.
//!
//! A third, reporting-only type, [`StoreFailure`], records which store was
//! dropped from a batch and why.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the lento-flyers library.
#[derive(Debug, Error)]
pub enum FlyerError {
    // ── Resource errors ───────────────────────────────────────────────────
    /// A font file was not found at the given path.
    #[error("Font file not found: '{path}'\nCheck --fonts points at the directory holding the typefaces.")]
    FontNotFound { path: PathBuf },

    /// A font file exists but could not be parsed.
    #[error("Font file '{path}' is not a valid TrueType/OpenType font: {detail}")]
    FontInvalid { path: PathBuf, detail: String },

    // ── Feed errors ───────────────────────────────────────────────────────
    /// The product feed or image lookup could not be read.
    #[error("Failed to read feed '{path}': {source}")]
    FeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The product feed or image lookup is not in the expected JSON shape.
    #[error("Failed to parse feed '{path}': {detail}")]
    FeedParse { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write a store's PDF document.
    #[error("Failed to write document '{path}': {source}")]
    DocumentWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A rendered page could not be encoded into the PDF.
    #[error("PDF encoding failed for store '{store}': {detail}")]
    PdfEncodeFailed { store: String, detail: String },

    /// The blocking render task for a store panicked or was cancelled.
    #[error("Render task for store '{store}' did not complete: {detail}")]
    RenderTaskFailed { store: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure to obtain an image.
///
/// Produced by [`crate::pipeline::acquire`] and by local asset loading; the
/// composition engine skips the corresponding element when it sees one.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcquisitionError {
    /// The reference was absent, blank, or the feed's `nan` marker.
    #[error("no image reference")]
    MissingReference,

    /// The HTTP client could not be built or the request failed in transit.
    #[error("request for '{url}' failed: {detail}")]
    Request { url: String, detail: String },

    /// The request exceeded the fetch timeout.
    #[error("request for '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The server answered with a non-success status.
    #[error("request for '{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    /// The payload could not be decoded as a raster image.
    #[error("payload from '{url}' is not a decodable image: {detail}")]
    Decode { url: String, detail: String },

    /// A local template asset (logo, header photo) could not be loaded.
    #[error("asset '{path}' could not be loaded: {detail}")]
    Asset { path: PathBuf, detail: String },
}

/// A store that was dropped from a batch.
///
/// Emitted by [`crate::stream::run_stream`] and passed to
/// [`crate::progress::BatchProgressCallback::on_store_error`]. The batch
/// itself carries on; this is purely a report.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("Store '{store}': {detail}")]
pub struct StoreFailure {
    pub store: String,
    pub detail: String,
}

impl StoreFailure {
    pub fn new(store: impl Into<String>, error: &FlyerError) -> Self {
        Self {
            store: store.into(),
            detail: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_not_found_mentions_path() {
        let e = FlyerError::FontNotFound {
            path: PathBuf::from("/fonts/missing.otf"),
        };
        assert!(e.to_string().contains("/fonts/missing.otf"));
    }

    #[test]
    fn timeout_display() {
        let e = AcquisitionError::Timeout {
            url: "https://img.example/1.jpg".into(),
            secs: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("10s"), "got: {msg}");
        assert!(msg.contains("img.example"));
    }

    #[test]
    fn http_status_display() {
        let e = AcquisitionError::HttpStatus {
            url: "https://img.example/2.jpg".into(),
            status: 404,
        };
        assert!(e.to_string().contains("404"));
    }

    #[test]
    fn store_failure_carries_source_message() {
        let err = FlyerError::PdfEncodeFailed {
            store: "EFE Lima".into(),
            detail: "jpeg encoder".into(),
        };
        let failure = StoreFailure::new("EFE Lima", &err);
        assert_eq!(failure.store, "EFE Lima");
        assert!(failure.detail.contains("jpeg encoder"));
        assert!(failure.to_string().starts_with("Store 'EFE Lima'"));
    }
}
