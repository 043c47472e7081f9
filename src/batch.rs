//! Batch orchestration: paginate each store, render its pages, write one
//! document per store.
//!
//! Stores are independent. Each one runs as its own future; at most
//! `config.workers` are in flight at a time, and the CPU-heavy composition of
//! each page happens on tokio's blocking pool. Results come back in
//! completion order. A store that fails for an unexpected reason (disk
//! write, a panic while rendering) is logged, reported to the progress
//! callback and left out of the results; its siblings are unaffected.

use crate::config::FlyerConfig;
use crate::error::{FlyerError, StoreFailure};
use crate::fonts::FontSet;
use crate::output::{BatchOutput, BatchStats, ResultEntry};
use crate::pipeline::acquire::{resolve_image_source, ImageSource};
use crate::pipeline::compose::{compose_page, prepare_page, PRODUCTS_PER_PAGE};
use crate::pipeline::document::{document_file_name, document_url, EncodedPage, FlyerDocument};
use crate::product::{ProductRecord, StoreGroups};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How a single store's task ended.
#[derive(Debug)]
pub(crate) enum StoreOutcome {
    Produced { entry: ResultEntry, pages: usize },
    Skipped { store: String },
    Failed(StoreFailure),
}

/// Split a store's products into consecutive pages of at most six.
pub fn paginate(products: &[ProductRecord]) -> std::slice::Chunks<'_, ProductRecord> {
    products.chunks(PRODUCTS_PER_PAGE)
}

/// Render, assemble and write the document for one store.
///
/// # Returns
/// `Ok(None)` when `products` is empty: no document is written and the
/// store is simply absent from the results.
///
/// # Errors
/// Only unexpected failures: the document could not be written or a render
/// task died. Missing images never surface here.
pub async fn produce_document(
    store_name: &str,
    products: &[ProductRecord],
    config: &FlyerConfig,
    fonts: &FontSet,
) -> Result<Option<ResultEntry>, FlyerError> {
    let source = resolve_image_source(config)?;
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| FlyerError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;
    let produced = produce_with_source(store_name, products, config, fonts, source.as_ref()).await?;
    Ok(produced.map(|(entry, _)| entry))
}

/// Render every page of a store into an in-memory document.
///
/// Returns an empty document when `products` is empty.
pub async fn compose_document(
    store_name: &str,
    products: &[ProductRecord],
    config: &FlyerConfig,
    fonts: &FontSet,
    source: &dyn ImageSource,
) -> Result<FlyerDocument, FlyerError> {
    let mut document = FlyerDocument::new(store_name);

    for (i, chunk) in paginate(products).enumerate() {
        let input = prepare_page(chunk, store_name, i + 1, source).await;
        let config = config.clone();
        let fonts = fonts.clone();
        let store = store_name.to_string();

        let encoded = tokio::task::spawn_blocking(move || {
            let page = compose_page(&input, &config, &fonts);
            EncodedPage::encode(&page, config.jpeg_quality).map_err(|e| {
                FlyerError::PdfEncodeFailed {
                    store,
                    detail: format!("page {}: {e}", page.page_number),
                }
            })
        })
        .await
        .map_err(|e| FlyerError::RenderTaskFailed {
            store: store_name.to_string(),
            detail: e.to_string(),
        })??;

        document.push(encoded);
    }

    Ok(document)
}

/// Write `document` to the output directory and return its entry.
///
/// The PDF is serialised and written on the blocking pool. Each write goes
/// to its own temp file in the output directory and is then renamed over
/// the public name, so stores whose names sanitise to the same file never
/// share a temp file; the last one to finish owns the document.
pub async fn write_document(
    document: FlyerDocument,
    config: &FlyerConfig,
) -> Result<ResultEntry, FlyerError> {
    let file_name = document_file_name(&config.file_prefix, &document.store_name);
    let path = config.output_dir.join(&file_name);
    let output_dir = config.output_dir.clone();
    let dpi = config.page_dpi;
    let store_name = document.store_name.clone();

    let target = path.clone();
    let written = tokio::task::spawn_blocking(move || {
        let bytes = document.to_pdf(dpi);
        let write_err = |e: std::io::Error| FlyerError::DocumentWriteFailed {
            path: target.clone(),
            source: e,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&output_dir).map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.persist(&target).map_err(|e| write_err(e.error))?;
        Ok::<usize, FlyerError>(bytes.len())
    })
    .await
    .map_err(|e| FlyerError::RenderTaskFailed {
        store: store_name.clone(),
        detail: e.to_string(),
    })??;

    debug!("Wrote {} ({} bytes)", path.display(), written);
    Ok(ResultEntry {
        store_name,
        document_url: document_url(&config.public_base_url, &file_name),
    })
}

async fn produce_with_source(
    store_name: &str,
    products: &[ProductRecord],
    config: &FlyerConfig,
    fonts: &FontSet,
    source: &dyn ImageSource,
) -> Result<Option<(ResultEntry, usize)>, FlyerError> {
    if products.is_empty() {
        return Ok(None);
    }
    let document = compose_document(store_name, products, config, fonts, source).await?;
    let pages = document.page_count();
    let entry = write_document(document, config).await?;
    Ok(Some((entry, pages)))
}

/// Run one store end to end, reporting through the progress callback.
pub(crate) async fn run_store(
    store_name: &str,
    products: &[ProductRecord],
    config: &FlyerConfig,
    fonts: &FontSet,
    source: &dyn ImageSource,
) -> StoreOutcome {
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_store_start(store_name, products.len());
    }
    let start = Instant::now();
    info!("Generating PDF: {} ({} products)", store_name, products.len());

    match produce_with_source(store_name, products, config, fonts, source).await {
        Ok(Some((entry, pages))) => {
            info!(
                "Store '{}': {} pages in {}ms",
                store_name,
                pages,
                start.elapsed().as_millis()
            );
            if let Some(cb) = cb {
                cb.on_store_complete(store_name, pages, &entry.document_url);
            }
            StoreOutcome::Produced { entry, pages }
        }
        Ok(None) => {
            debug!("Store '{}' has no products, skipped", store_name);
            if let Some(cb) = cb {
                cb.on_store_skipped(store_name);
            }
            StoreOutcome::Skipped {
                store: store_name.to_string(),
            }
        }
        Err(e) => {
            warn!("Store '{}' dropped: {}", store_name, e);
            let failure = StoreFailure::new(store_name, &e);
            if let Some(cb) = cb {
                cb.on_store_error(store_name, &failure.detail);
            }
            StoreOutcome::Failed(failure)
        }
    }
}

/// Produce documents for every store group.
///
/// # Returns
/// `Ok(BatchOutput)` even when some stores failed (see
/// `output.stats.failed_stores`); entries are in completion order.
///
/// # Errors
/// Only if the output directory cannot be created or the HTTP client cannot
/// be built.
pub async fn run_batch(
    groups: &StoreGroups,
    config: &FlyerConfig,
    fonts: &FontSet,
) -> Result<BatchOutput, FlyerError> {
    let start = Instant::now();
    let total_stores = groups.len();
    info!(
        "Starting batch: {} stores, {} workers",
        total_stores, config.workers
    );

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| FlyerError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;
    let source = resolve_image_source(config)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total_stores);
    }

    let outcomes: Vec<StoreOutcome> = stream::iter(groups.iter().map(|(store, products)| {
        let source = Arc::clone(&source);
        async move { run_store(store, products, config, fonts, source.as_ref()).await }
    }))
    .buffer_unordered(config.workers)
    .collect()
    .await;

    let mut stats = BatchStats {
        total_stores,
        ..Default::default()
    };
    let mut entries = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            StoreOutcome::Produced { entry, pages } => {
                stats.produced_stores += 1;
                stats.total_pages += pages;
                entries.push(entry);
            }
            StoreOutcome::Skipped { store } => {
                debug!("No document for '{}'", store);
                stats.skipped_stores += 1;
            }
            StoreOutcome::Failed(failure) => {
                debug!("{}", failure);
                stats.failed_stores += 1;
            }
        }
    }
    stats.total_duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Batch complete: {}/{} stores, {} pages, {}ms",
        stats.produced_stores, total_stores, stats.total_pages, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total_stores, stats.produced_stores);
    }

    Ok(BatchOutput { entries, stats })
}

/// Produce documents for every store group and return the entries.
///
/// Stores with no products, and stores whose task failed, have no entry.
pub async fn run_all(
    groups: &StoreGroups,
    config: &FlyerConfig,
    fonts: &FontSet,
) -> Result<Vec<ResultEntry>, FlyerError> {
    run_batch(groups, config, fonts)
        .await
        .map(|output| output.entries)
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_batch_sync(
    groups: &StoreGroups,
    config: &FlyerConfig,
    fonts: &FontSet,
) -> Result<BatchOutput, FlyerError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FlyerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(groups, config, fonts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn products(n: usize) -> Vec<ProductRecord> {
        (0..n)
            .map(|i| ProductRecord::new("LG", format!("{i}"), "Lavadora"))
            .collect()
    }

    #[test]
    fn paginate_counts() {
        for (n, pages) in [(0, 0), (1, 1), (6, 1), (7, 2), (12, 2), (13, 3)] {
            assert_eq!(paginate(&products(n)).count(), pages, "n = {n}");
        }
    }

    #[test]
    fn paginate_preserves_order_and_sizes() {
        let items = products(14);
        let chunks: Vec<_> = paginate(&items).collect();
        assert_eq!(
            chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
            vec![6, 6, 2]
        );
        let flattened: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.iter().map(|p| p.sku.as_str()))
            .collect();
        let expected: Vec<String> = (0..14).map(|i| i.to_string()).collect();
        assert_eq!(flattened, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
