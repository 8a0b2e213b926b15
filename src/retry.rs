//! Bounded retry with randomized backoff, shared by the challenge handler
//! and the extractor so neither carries an ad hoc attempt counter.

use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

/// Sleeps a random duration drawn from `range` (milliseconds). Models human
/// latency between scripted page interactions.
pub async fn human_delay(range: RangeInclusive<u64>) {
    let millis = rand::rng().random_range(range);
    sleep(Duration::from_millis(millis)).await;
}

/// Runs `op` until it yields `Some`, up to `max_attempts` times, sleeping a
/// random backoff from `backoff_ms` between failed attempts. Returns `None`
/// once the budget is spent. Total time is bounded by
/// `max_attempts * (op timeout + max backoff)`; `op` must bound its own
/// waits.
pub async fn retry_bounded<T, F, Fut>(
    what: &str,
    max_attempts: u32,
    backoff_ms: RangeInclusive<u64>,
    mut op: F,
) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=max_attempts {
        if let Some(value) = op(attempt).await {
            return Some(value);
        }
        debug!(what, attempt, max_attempts, "attempt produced nothing");
        if attempt < max_attempts {
            human_delay(backoff_ms.clone()).await;
        }
    }
    None
}
