//! C4 Incentives Engine (§4.4): combines the Overlay View and the RPS Probe
//! into a per-peer score vector, filtered by the on-chain membership set.

use std::collections::HashMap;
use swarmnet_core::constants::{BLOCK_WEIGHT, RPS_WEIGHT, SCORE_SCALE};
use swarmnet_core::{incentives::peer_id_bytes, IncentivesEntry, IncentivesVector, RpsSample, ServerRow};

#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// `num_blocks_per_layer` in §4.4's `k` term; 1 unless the model
    /// definition groups multiple transformer blocks per scored layer.
    pub num_blocks_per_layer: u32,
    /// Relay penalty multiplier applied to nodes serving via relay (§8 S4).
    pub relay_penalty: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { num_blocks_per_layer: 1, relay_penalty: 0.67 }
    }
}

fn k_factor(config: &ScoringConfig, total_blocks: u32) -> f64 {
    100.0 * (config.num_blocks_per_layer as f64 / total_blocks as f64)
}

/// Block-weight-only score curve (§4.4 default mode, §8 score-curve
/// monotonicity property): `floor((k*share^2 + share) * 10^18)`, penalized
/// by `relay_penalty` when the row is served through a relay.
pub fn block_weight_score(row: &ServerRow, num_blocks: u32, config: &ScoringConfig) -> u128 {
    let share = row.span.blocks_served_ratio(num_blocks);
    let k = k_factor(config, num_blocks);
    let mut raw = k * share * share + share;
    if row.using_relay {
        raw *= config.relay_penalty;
    }
    (raw * SCORE_SCALE as f64) as u128
}

/// Builds the incentives vector in block-weight-only mode, ordered per
/// §4.4's "Output ordering" invariant.
pub fn build_vector_block_weight(rows: &[ServerRow], num_blocks: u32, config: &ScoringConfig) -> IncentivesVector {
    let entries = rows
        .iter()
        .map(|row| IncentivesEntry {
            peer_id_bytes: peer_id_bytes(&row.peer_id),
            score: block_weight_score(row, num_blocks, config),
        })
        .collect();
    IncentivesVector::from_unsorted(entries)
}

/// Removes outliers from a sample set, choosing the method by sample count
/// per §4.4: MAD below 10 samples, z-score below 30, IQR otherwise.
pub fn remove_outliers_adaptive(mut samples: Vec<f64>) -> Vec<f64> {
    if samples.len() < 10 {
        remove_outliers_mad(samples)
    } else if samples.len() < 30 {
        remove_outliers_zscore(samples)
    } else {
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
        remove_outliers_iqr(samples)
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn remove_outliers_mad(samples: Vec<f64>) -> Vec<f64> {
    if samples.len() < 3 {
        return samples;
    }
    let mut sorted = samples.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let med = median(&sorted);
    let mut deviations: Vec<f64> = sorted.iter().map(|v| (v - med).abs()).collect();
    deviations.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mad = median(&deviations);
    if mad == 0.0 {
        return samples;
    }
    const CONSISTENCY_CONSTANT: f64 = 1.4826;
    const MAD_THRESHOLD: f64 = 3.5;
    samples
        .into_iter()
        .filter(|v| ((v - med).abs() / (mad * CONSISTENCY_CONSTANT)) <= MAD_THRESHOLD)
        .collect()
}

fn remove_outliers_zscore(samples: Vec<f64>) -> Vec<f64> {
    let n = samples.len() as f64;
    if n < 2.0 {
        return samples;
    }
    let mean: f64 = samples.iter().sum::<f64>() / n;
    let variance: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    if stddev == 0.0 {
        return samples;
    }
    const Z_THRESHOLD: f64 = 3.0;
    samples.into_iter().filter(|v| ((v - mean) / stddev).abs() <= Z_THRESHOLD).collect()
}

fn remove_outliers_iqr(sorted: Vec<f64>) -> Vec<f64> {
    let q1 = sorted[(sorted.len() as f64 * 0.25) as usize];
    let q3 = sorted[(sorted.len() as f64 * 0.75) as usize];
    let iqr = q3 - q1;
    if iqr <= 0.0 {
        return sorted;
    }
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    sorted.into_iter().filter(|v| *v >= lower && *v <= upper).collect()
}

/// Aggregates raw `RpsSample`s (merged across DHT writer subkeys) into one
/// mean RPS per subject peer, dropping samples for peers outside the
/// current `ServerRow` set (§4.4).
pub fn aggregate_rps_samples(
    samples: Vec<RpsSample>,
    rows: &[ServerRow],
) -> HashMap<swarmnet_core::PeerId, f64> {
    let valid: std::collections::HashSet<_> = rows.iter().map(|r| r.peer_id).collect();
    let mut by_peer: HashMap<swarmnet_core::PeerId, Vec<f64>> = HashMap::new();
    for sample in samples {
        if !valid.contains(&sample.peer_id) {
            continue;
        }
        by_peer.entry(sample.peer_id).or_default().push(sample.device_rps);
    }
    by_peer
        .into_iter()
        .map(|(peer, values)| {
            let survivors = remove_outliers_adaptive(values);
            let mean = if survivors.is_empty() {
                0.0
            } else {
                survivors.iter().sum::<f64>() / survivors.len() as f64
            };
            (peer, mean)
        })
        .collect()
}

/// Block+RPS-weighted scoring mode (§4.4 optional mode). A peer with no RPS
/// samples receives `rps = 0` and is still weighted by its block share.
pub fn build_vector_block_rps_weighted(
    rows: &[ServerRow],
    rps_by_peer: &HashMap<swarmnet_core::PeerId, f64>,
) -> IncentivesVector {
    let total_rps: f64 = rows.iter().map(|r| rps_by_peer.get(&r.peer_id).copied().unwrap_or(0.0)).sum();
    let total_span: u32 = rows.iter().map(|r| r.span.len()).sum();

    let entries = rows
        .iter()
        .map(|row| {
            let rps = rps_by_peer.get(&row.peer_id).copied().unwrap_or(0.0);
            let rps_share = if total_rps > 0.0 { rps / total_rps } else { 0.0 };
            let span_share = if total_span > 0 { row.span.len() as f64 / total_span as f64 } else { 0.0 };

            let rps_term = (rps_share * 10_000.0).round() * RPS_WEIGHT;
            let span_term = (span_share * 10_000.0).round() * BLOCK_WEIGHT;
            let final_score_bps = rps_term + span_term;

            IncentivesEntry {
                peer_id_bytes: peer_id_bytes(&row.peer_id),
                score: ((final_score_bps / 10_000.0) * SCORE_SCALE as f64) as u128,
            }
        })
        .collect();
    IncentivesVector::from_unsorted(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarmnet_core::Span;

    fn row(peer: swarmnet_core::PeerId, start: u32, end: u32, relay: bool) -> ServerRow {
        ServerRow::new(peer, Span::new(start, end, 32).unwrap(), relay)
    }

    #[test]
    fn score_curve_is_strictly_increasing_in_span() {
        let config = ScoringConfig::default();
        let peer = swarmnet_core::PeerId::random();
        let small = block_weight_score(&row(peer, 0, 4, false), 32, &config);
        let large = block_weight_score(&row(peer, 0, 16, false), 32, &config);
        assert!(large > small);
    }

    #[test]
    fn full_span_score_matches_closed_form() {
        let config = ScoringConfig::default();
        let peer = swarmnet_core::PeerId::random();
        let score = block_weight_score(&row(peer, 0, 32, false), 32, &config);
        let k = k_factor(&config, 32);
        let expected = ((k * 1.0 + 1.0) * SCORE_SCALE as f64) as u128;
        assert_eq!(score, expected);
    }

    #[test]
    fn relay_penalty_matches_scenario_s4() {
        let config = ScoringConfig::default();
        let peer = swarmnet_core::PeerId::random();
        let score = block_weight_score(&row(peer, 0, 32, true), 32, &config);
        let k = k_factor(&config, 32);
        let expected = ((0.67 * (k + 1.0)) * SCORE_SCALE as f64) as u128;
        assert_eq!(score, expected);
    }

    #[test]
    fn output_ordering_is_stable_by_peer_id() {
        let config = ScoringConfig::default();
        let mut peers: Vec<_> = (0..5).map(|_| swarmnet_core::PeerId::random()).collect();
        let rows: Vec<ServerRow> = peers.iter().map(|p| row(*p, 0, 16, false)).collect();
        let vector_a = build_vector_block_weight(&rows, 32, &config);

        peers.reverse();
        let rows_rev: Vec<ServerRow> = peers.iter().map(|p| row(*p, 0, 16, false)).collect();
        let vector_b = build_vector_block_weight(&rows_rev, 32, &config);

        assert_eq!(vector_a, vector_b);
    }

    #[test]
    fn peer_with_no_rps_samples_still_scores_via_block_share() {
        let peer = swarmnet_core::PeerId::random();
        let rows = vec![row(peer, 0, 16, false)];
        let rps_by_peer = HashMap::new();
        let vector = build_vector_block_rps_weighted(&rows, &rps_by_peer);
        assert_eq!(vector.len(), 1);
        assert!(vector.0[0].score > 0);
    }

    #[test]
    fn mad_outlier_removal_drops_spike() {
        let samples = vec![10.0, 10.2, 9.8, 10.1, 9.9, 500.0];
        let survivors = remove_outliers_mad(samples);
        assert!(!survivors.contains(&500.0));
    }
}
