//! Fixed parameters of the epoch/incentives protocol (§3, §4, §5 of the spec).

use std::time::Duration;

/// Nominal chain block time. All sleeps are parameterized on this; the loop
/// never relies on wall clock beyond it.
pub const BLOCK_SECS: u64 = 6;

pub fn block_duration() -> Duration {
    Duration::from_secs(BLOCK_SECS)
}

/// Chain Gateway retry policy (§4.1): exponential backoff, 4s..10s, 4 attempts.
pub const RETRY_MAX_ATTEMPTS: u32 = 4;
pub const RETRY_MIN_BACKOFF: Duration = Duration::from_secs(4);
pub const RETRY_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Attest sub-loop bound (§4.5.c).
pub const MAX_ATTEST_CHECKS: u32 = 3;

/// Super-majority the chain requires for reward finalization (§4.6 rule 4).
/// Configurable; this is the default.
pub const DEFAULT_RATIFICATION_THRESHOLD_BPS: u32 = 8_750; // 87.5%

/// RPS Probe parameters (§4.3).
pub const RPS_MIN_STEPS: u32 = 24;
pub const RPS_WARMUP_STEPS: u32 = 5;
pub const RPS_UPPER_IQR_MULTIPLIER: f64 = 1.5;

/// Incentives Engine block-weight curve and block+RPS blend (§4.4).
pub const BLOCK_WEIGHT: f64 = 0.5;
pub const RPS_WEIGHT: f64 = 0.5;

/// Scale for the block-weight-only score curve: `score = floor((k*share^2 + share) * SCORE_SCALE)`.
pub const SCORE_SCALE: u128 = 1_000_000_000_000_000_000; // 10^18
