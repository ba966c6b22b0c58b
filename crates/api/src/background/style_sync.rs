//! Keeps the style catalogue aligned with the transformer.
//!
//! Runs once at startup (the first interval tick fires immediately) and then
//! every `interval`. An empty list from the transformer is treated as a
//! transient outage and skipped rather than deactivating every style.

use std::sync::Arc;
use std::time::Duration;

use stylist_db::models::style::StyleSyncSummary;
use stylist_db::store::StyleStore;
use stylist_transformer::{Transformer, TransformerError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum StyleSyncError {
    #[error("Failed to fetch styles: {0}")]
    Fetch(#[from] TransformerError),

    #[error("Failed to store styles: {0}")]
    Store(#[from] sqlx::Error),
}

/// One sync pass. Returns `None` when the transformer offered no styles.
pub async fn sync_once(
    styles: &dyn StyleStore,
    transformer: &dyn Transformer,
) -> Result<Option<StyleSyncSummary>, StyleSyncError> {
    let available = transformer.styles().await?;
    if available.is_empty() {
        tracing::warn!("Transformer returned no styles, skipping sync");
        return Ok(None);
    }
    let summary = styles.sync(&available).await?;
    Ok(Some(summary))
}

/// Run the style sync loop until `cancel` is triggered.
pub async fn run(
    styles: Arc<dyn StyleStore>,
    transformer: Arc<dyn Transformer>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Style sync job started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Style sync job stopping");
                break;
            }
            _ = ticker.tick() => {
                match sync_once(styles.as_ref(), transformer.as_ref()).await {
                    Ok(Some(summary)) => tracing::info!(
                        inserted = summary.inserted,
                        activated = summary.activated,
                        deactivated = summary.deactivated,
                        "Style catalogue synced",
                    ),
                    Ok(None) => {}
                    Err(e) => tracing::error!(error = %e, "Style sync failed"),
                }
            }
        }
    }
}
