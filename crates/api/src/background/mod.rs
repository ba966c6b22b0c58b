//! Background tasks and scheduled jobs.
//!
//! Each submodule provides a long-running async function intended to be
//! spawned via `tokio::spawn`, plus a single-pass function the loop calls on
//! every tick. All loops accept a [`CancellationToken`] for graceful
//! shutdown.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod long_processing;
pub mod result_retention;
pub mod style_sync;

use std::time::Duration;

use chrono::{DateTime, Utc};
use stylist_core::types::Timestamp;

/// `now - age`, saturating at the earliest representable instant.
fn cutoff(age: Duration) -> Timestamp {
    chrono::Duration::from_std(age)
        .ok()
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
