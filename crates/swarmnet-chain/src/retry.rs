//! Gateway-level retry combinator (§4.1, §9): replaces the source's
//! `retry(...)` decorator with a plain bounded-policy loop. An exhausted
//! retry is not an error — it is "missing," so callers get `None`.

use std::future::Future;
use std::time::Duration;
use swarmnet_core::constants::{RETRY_MAX_ATTEMPTS, RETRY_MAX_BACKOFF, RETRY_MIN_BACKOFF};
use tracing::warn;

/// Run `op` up to `RETRY_MAX_ATTEMPTS` times with exponential backoff
/// between `RETRY_MIN_BACKOFF` and `RETRY_MAX_BACKOFF`. Returns `None` once
/// every attempt has failed; never panics, never propagates the error.
pub async fn retry<T, E, F, Fut>(label: &str, mut op: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut backoff = RETRY_MIN_BACKOFF;
    for attempt in 1..=RETRY_MAX_ATTEMPTS {
        match op().await {
            Ok(value) => return Some(value),
            Err(err) => {
                warn!(%label, attempt, %err, "📡 chain rpc call failed, retrying");
                if attempt == RETRY_MAX_ATTEMPTS {
                    break;
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(RETRY_MAX_BACKOFF);
            }
        }
    }
    warn!(%label, "📡 chain rpc call exhausted retries, treating as missing");
    None
}
