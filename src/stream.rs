//! Streaming batch API: emit stores as their documents are written.
//!
//! Unlike [`crate::batch::run_batch`], which returns once every store has
//! finished, [`run_stream`] yields each store's outcome as soon as it is
//! known, in completion order. Stores with no products produce nothing.

use crate::batch::{run_store, StoreOutcome};
use crate::config::FlyerConfig;
use crate::error::{FlyerError, StoreFailure};
use crate::fonts::FontSet;
use crate::output::ResultEntry;
use crate::pipeline::acquire::resolve_image_source;
use crate::product::StoreGroups;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-store results.
pub type ResultStream = Pin<Box<dyn Stream<Item = Result<ResultEntry, StoreFailure>> + Send>>;

/// Produce documents for every store, streaming entries as they complete.
///
/// # Returns
/// - `Ok(ResultStream)`: one item per store that produced a document or
///   failed; empty stores are omitted
/// - `Err(FlyerError)`: the output directory or HTTP client could not be
///   set up
pub async fn run_stream(
    groups: StoreGroups,
    config: &FlyerConfig,
    fonts: &FontSet,
) -> Result<ResultStream, FlyerError> {
    info!("Starting streaming batch: {} stores", groups.len());

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| FlyerError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;
    let source = resolve_image_source(config)?;

    let workers = config.workers;
    let config = config.clone();
    let fonts = fonts.clone();

    let s = stream::iter(groups.into_iter().map(move |(store, products)| {
        let source = Arc::clone(&source);
        let config = config.clone();
        let fonts = fonts.clone();
        async move { run_store(&store, &products, &config, &fonts, source.as_ref()).await }
    }))
    .buffer_unordered(workers)
    .filter_map(|outcome| async move {
        match outcome {
            StoreOutcome::Produced { entry, .. } => Some(Ok(entry)),
            StoreOutcome::Skipped { .. } => None,
            StoreOutcome::Failed(failure) => Some(Err(failure)),
        }
    });

    Ok(Box::pin(s))
}
