//! # lento-flyers
//!
//! Render per-store promotional flyers ("Lento Movimiento" slow-mover
//! offers) from a product feed into multi-page PDF documents.
//!
//! ## Why this crate?
//!
//! Every store of the retail chain gets its own printable catalogue of
//! products to push: six cards per page, each with the product photo, SKU,
//! brand and title, on a page branded for the store's chain. Stores are
//! independent, so the batch renders several of them at once and publishes
//! one PDF per store plus a link table for the spreadsheet the stores read.
//!
//! ## Pipeline Overview
//!
//! ```text
//! feed rows
//!  │
//!  ├─ 1. Feed      clean SKUs, attach image URLs, group by store
//!  ├─ 2. Batch     one task per store, `workers` in flight
//!  ├─ 3. Acquire   fetch product photos (HTTP, 10 s timeout, never fatal)
//!  ├─ 4. Compose   2500 × 3750 raster per page (CPU-bound, spawn_blocking)
//!  ├─ 5. Document  JPEG pages → one PDF, atomic write
//!  └─ 6. Output    (store name, public URL) per produced document
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lento_flyers::{feed, run_all, FlyerConfig, FontSet};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rows = feed::load_feed(Path::new("rows.json"))?;
//!     let groups = feed::group_by_store(rows, None);
//!
//!     let fonts = FontSet::load_dir(Path::new("fonts"))?;
//!     let config = FlyerConfig::builder()
//!         .asset_dir("assets")
//!         .output_dir("docs/flyers")
//!         .public_base_url("https://example.github.io/flyers/")
//!         .build()?;
//!
//!     for entry in run_all(&groups, &config, &fonts).await? {
//!         println!("{} → {}", entry.store_name, entry.document_url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flyers` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! lento-flyers = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod brand;
pub mod config;
pub mod error;
pub mod feed;
pub mod fonts;
pub mod output;
pub mod pipeline;
pub mod product;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{paginate, produce_document, run_all, run_batch, run_batch_sync};
pub use brand::BrandVariant;
pub use config::{FlyerConfig, FlyerConfigBuilder};
pub use error::{AcquisitionError, FlyerError, StoreFailure};
pub use feed::{clean_sku, group_by_store, FeedRow};
pub use fonts::{FontFiles, FontSet};
pub use output::{BatchOutput, BatchStats, ResultEntry};
pub use pipeline::acquire::{HttpImageSource, ImageSource};
pub use pipeline::compose::{render_page, FlyerPage};
pub use product::{ProductRecord, StoreGroups};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{run_stream, ResultStream};
