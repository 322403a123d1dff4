//! # Bounded Scan
//!
//! The contracts expose their collections as indexed reads with no length for polls, so
//! lists are built by reading index 0, 1, 2, ... up to a cap and stopping at the first
//! failed read.
//!
//! A failed read is ambiguous: it is either the end of the collection (the contract
//! reverts on an out-of-range index) or a transient provider failure. Callers that know
//! the collection length pass it as the limit, so any failure below it is a real error
//! and is logged as one; callers that don't get [`ScanStop::ReadFailed`] back and treat
//! it as the end of the list.

use std::future::Future;

use lib_core::AppError;
use tracing::debug;

/// Why a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStop {
    /// Every index below the limit was read
    Exhausted,
    /// The read at `index` failed; nothing at or after it was attempted
    ReadFailed { index: u64, error: AppError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome<T> {
    /// Items from indexes `0..items.len()`, in order
    pub items: Vec<T>,
    pub stop: ScanStop,
}

impl<T> ScanOutcome<T> {
    pub fn failed_at(&self) -> Option<u64> {
        match &self.stop {
            ScanStop::ReadFailed { index, .. } => Some(*index),
            ScanStop::Exhausted => None,
        }
    }
}

/// Read indexes `0..limit` in order, stopping at the first failure.
pub async fn bounded_scan<T, F, Fut>(limit: u64, mut read: F) -> ScanOutcome<T>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut items = Vec::new();

    for index in 0..limit {
        match read(index).await {
            Ok(item) => items.push(item),
            Err(error) => {
                debug!(index, %error, "scan stopped");
                return ScanOutcome {
                    items,
                    stop: ScanStop::ReadFailed { index, error },
                };
            }
        }
    }

    ScanOutcome {
        items,
        stop: ScanStop::Exhausted,
    }
}
