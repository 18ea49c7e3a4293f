//! Chunked cooperative processing of large lists
//!
//! Applies a per-item transform to an ordered list without holding the event
//! loop for more than a bounded slice: after `slice_budget` of continuous
//! work the task sleeps for `yield_interval`, letting other callbacks run,
//! then resumes where it left off. Output order always matches input order;
//! slices never overlap - this is one cooperative task, not a worker pool.
//!
//! Cancellation is not provided by this primitive. A caller that needs it
//! must track an external cancellation flag checked between slices and
//! discard the eventual result. This is a documented limitation.

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default bound on continuous work before yielding.
pub const DEFAULT_SLICE_BUDGET: Duration = Duration::from_millis(50);
/// Default pause between slices.
pub const DEFAULT_YIELD_INTERVAL: Duration = Duration::from_millis(25);

/// Slice bounds for chunked processing.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Maximum continuous work per slice
    pub slice_budget: Duration,
    /// How long control is yielded between slices
    pub yield_interval: Duration,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            slice_budget: DEFAULT_SLICE_BUDGET,
            yield_interval: DEFAULT_YIELD_INTERVAL,
        }
    }
}

impl ChunkConfig {
    fn validate(&self) -> Result<()> {
        if self.slice_budget.is_zero() {
            return Err(Error::InvalidInput("slice budget must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Apply `transform` to every element of `items`, yielding between slices.
///
/// Resolves with the results in input order only after the last item has
/// been processed. An empty list resolves immediately.
pub async fn process_all<T, U, F>(config: &ChunkConfig, items: Vec<T>, mut transform: F) -> Result<Vec<U>>
where
    F: FnMut(T) -> U,
{
    config.validate()?;

    if items.is_empty() {
        return Ok(Vec::new());
    }

    let total = items.len();
    let mut results = Vec::with_capacity(total);
    let mut slices = 1u32;
    let mut slice_start = Instant::now();

    for item in items {
        results.push(transform(item));

        if results.len() < total && slice_start.elapsed() >= config.slice_budget {
            tokio::time::sleep(config.yield_interval).await;
            slices += 1;
            slice_start = Instant::now();
        }
    }

    debug!(items = total, slices, "Chunked processing complete");

    Ok(results)
}

/// Fast-path variant: with no transform the list resolves immediately,
/// unchanged. Mirrors the no-op behavior for a non-callable transform.
pub async fn process_all_or_passthrough<T, F>(
    config: &ChunkConfig,
    items: Vec<T>,
    transform: Option<F>,
) -> Result<Vec<T>>
where
    F: FnMut(T) -> T,
{
    match transform {
        Some(f) => process_all(config, items, f).await,
        None => Ok(items),
    }
}
