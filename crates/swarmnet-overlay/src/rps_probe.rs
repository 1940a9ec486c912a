//! C3 RPS Probe (§4.3): driven benchmarking of a single remote peer's
//! inference latency over its advertised span, with IQR outlier removal.

use async_trait::async_trait;
use std::time::Duration;
use swarmnet_core::constants::{RPS_UPPER_IQR_MULTIPLIER, RPS_WARMUP_STEPS};
use swarmnet_core::{RpsSample, ServerRow};

/// The transformer block cache / inference session is an external
/// collaborator (§1): "treated as an RPC endpoint `timed_step(tensor) ->
/// (latency, tensor)` per peer." `n_tokens` is the hidden-size-shaped
/// tensor's token count for one step (always 1 for single-token decode).
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    /// Runs one single-token step against `peer`'s advertised span. Returns
    /// the wall-clock latency of that step, or an error if the pipe broke.
    async fn timed_step(&self, peer: &ServerRow) -> Result<Duration, String>;
}

pub struct RpsProbeConfig {
    pub n_tokens: f64,
}

impl Default for RpsProbeConfig {
    fn default() -> Self {
        Self { n_tokens: 1.0 }
    }
}

pub struct RpsProbe<'a, E: InferenceEndpoint> {
    endpoint: &'a E,
    config: RpsProbeConfig,
}

fn n_steps(blocks_served_ratio: f64) -> u32 {
    let lower_bound = (24.0 / blocks_served_ratio).ceil() as u32;
    lower_bound.max(24)
}

fn scaling_factor(blocks_served_ratio: f64) -> f64 {
    if blocks_served_ratio >= 1.0 {
        1.0
    } else {
        blocks_served_ratio / blocks_served_ratio.powf(1.0 - blocks_served_ratio.sqrt())
    }
}

/// IQR outlier removal (§4.3): lower multiplier derived from the data
/// (`Q1 / IQR`), upper multiplier fixed at 1.5.
fn remove_outliers(mut samples: Vec<f64>) -> Vec<f64> {
    if samples.len() < 4 {
        return samples;
    }
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let q1 = percentile(&samples, 0.25);
    let q3 = percentile(&samples, 0.75);
    let iqr = q3 - q1;
    if iqr <= 0.0 {
        return samples;
    }
    let lower_multiplier = q1 / iqr;
    let lower_bound = q1 - lower_multiplier * iqr;
    let upper_bound = q3 + RPS_UPPER_IQR_MULTIPLIER * iqr;
    samples.into_iter().filter(|&v| v >= lower_bound && v <= upper_bound).collect()
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx]
}

impl<'a, E: InferenceEndpoint> RpsProbe<'a, E> {
    pub fn new(endpoint: &'a E, config: RpsProbeConfig) -> Self {
        Self { endpoint, config }
    }

    /// Benchmarks one `ServerRow` over its advertised span. Returns `None`
    /// on any inference-pipe error (§4.3: "the probe aborts this peer and
    /// publishes no sample").
    pub async fn probe(&self, row: &ServerRow, num_blocks: u32) -> Option<RpsSample> {
        let blocks_served_ratio = row.span.blocks_served_ratio(num_blocks);
        let steps = n_steps(blocks_served_ratio);
        let warmup = RPS_WARMUP_STEPS;

        let mut latencies = Vec::with_capacity(steps as usize);
        for step in 0..steps {
            match self.endpoint.timed_step(row).await {
                Ok(latency) => {
                    if step >= warmup {
                        latencies.push(latency.as_secs_f64());
                    }
                }
                Err(_) => return None,
            }
        }

        let survivors = remove_outliers(latencies);
        let elapsed: f64 = survivors.iter().sum();
        if elapsed <= 0.0 || survivors.is_empty() {
            return None;
        }

        let measured_steps = survivors.len() as u32;
        let scale = scaling_factor(blocks_served_ratio);
        let device_rps = (measured_steps as f64) * self.config.n_tokens / elapsed * scale;

        Some(RpsSample {
            peer_id: row.peer_id,
            start: row.span.start,
            end: row.span.end,
            elapsed_secs: elapsed,
            device_rps,
            blocks_served_ratio,
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_steps_respects_floor_of_24() {
        assert_eq!(n_steps(1.0), 24);
        assert_eq!(n_steps(0.5), 48);
    }

    #[test]
    fn scaling_factor_is_one_at_full_span() {
        assert_eq!(scaling_factor(1.0), 1.0);
    }

    #[test]
    fn scaling_factor_is_below_one_for_partial_span() {
        let factor = scaling_factor(0.5);
        assert!(factor > 0.0 && factor < 1.0);
    }

    #[test]
    fn remove_outliers_drops_extreme_high_value() {
        let samples = vec![1.0, 1.1, 1.0, 0.9, 1.05, 50.0];
        let survivors = remove_outliers(samples);
        assert!(!survivors.contains(&50.0));
    }

    #[test]
    fn remove_outliers_is_noop_under_four_samples() {
        let samples = vec![1.0, 2.0];
        assert_eq!(remove_outliers(samples.clone()), samples);
    }

    struct FlakyEndpoint;

    #[async_trait]
    impl InferenceEndpoint for FlakyEndpoint {
        async fn timed_step(&self, _peer: &ServerRow) -> Result<Duration, String> {
            Err("pipe broken".into())
        }
    }

    #[tokio::test]
    async fn probe_returns_none_on_pipe_error() {
        let endpoint = FlakyEndpoint;
        let probe = RpsProbe::new(&endpoint, RpsProbeConfig::default());
        let row = ServerRow::new(
            swarmnet_core::PeerId::random(),
            swarmnet_core::Span::new(0, 16, 32).unwrap(),
            false,
        );
        assert!(probe.probe(&row, 32).await.is_none());
    }
}
