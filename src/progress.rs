//! Progress-callback trait for per-store batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::FlyerConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the stores.
//!
//! # Example
//!
//! ```rust
//! use lento_flyers::{BatchProgressCallback, FlyerConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for PageCounter {
//!     fn on_store_complete(&self, store: &str, pages: usize, _url: &str) {
//!         self.pages.fetch_add(pages, Ordering::SeqCst);
//!         eprintln!("{store}: {pages} pages");
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//! let config = FlyerConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each store.
///
/// Stores run concurrently, so every method except the batch-level ones may
/// be called from several threads at once. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any store is started.
    fn on_batch_start(&self, total_stores: usize) {
        let _ = total_stores;
    }

    /// Called when a store's task begins.
    fn on_store_start(&self, store: &str, products: usize) {
        let _ = (store, products);
    }

    /// Called after a store's document has been written.
    fn on_store_complete(&self, store: &str, pages: usize, document_url: &str) {
        let _ = (store, pages, document_url);
    }

    /// Called for a store with no products; it produces no document.
    fn on_store_skipped(&self, store: &str) {
        let _ = store;
    }

    /// Called when a store's task fails and the store is dropped.
    fn on_store_error(&self, store: &str, error: &str) {
        let _ = (store, error);
    }

    /// Called once after every store has been attempted.
    fn on_batch_complete(&self, total_stores: usize, produced: usize) {
        let _ = (total_stores, produced);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::FlyerConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        skipped: AtomicUsize,
        errors: AtomicUsize,
        pages: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_store_start(&self, _store: &str, _products: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_store_complete(&self, _store: &str, pages: usize, _url: &str) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.pages.fetch_add(pages, Ordering::SeqCst);
        }

        fn on_store_skipped(&self, _store: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_store_error(&self, _store: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(3);
        cb.on_store_start("A", 2);
        cb.on_store_complete("A", 1, "https://x/LENTO_A.pdf");
        cb.on_store_skipped("B");
        cb.on_store_error("C", "disk full");
        cb.on_batch_complete(3, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_store_start("A", 7);
        tracker.on_store_complete("A", 2, "u");
        tracker.on_store_start("B", 0);
        tracker.on_store_skipped("B");
        tracker.on_store_start("C", 1);
        tracker.on_store_error("C", "write failed");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(10);
        cb.on_store_start("EFE Centro", 12);
    }
}
