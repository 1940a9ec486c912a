//! `RpsSample`: the signed, DHT-published output of the RPS Probe (C3).

use crate::types::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpsSample {
    pub peer_id: PeerId,
    pub start: u32,
    pub end: u32,
    pub elapsed_secs: f64,
    pub device_rps: f64,
    pub blocks_served_ratio: f64,
    pub steps: u32,
}

impl RpsSample {
    /// A well-formed sample has `steps > warmup`, `elapsed > 0`, and
    /// `device_rps` consistent with the declared inputs (§3, RpsSample invariant).
    pub fn is_well_formed(&self, warmup: u32) -> bool {
        self.steps > warmup && self.elapsed_secs > 0.0 && self.device_rps.is_finite() && self.device_rps >= 0.0
    }
}
