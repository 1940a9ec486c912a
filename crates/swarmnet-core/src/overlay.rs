//! Overlay (DHT) data model shared between the Overlay View (C2) and the
//! Incentives Engine (C4): module-info records and the derived `ServerRow`.

use crate::types::{PeerId, Span};
use serde::{Deserialize, Serialize};

/// Liveness state a peer publishes for one block-uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleState {
    Offline,
    Joining,
    Online,
}

impl ModuleState {
    /// Whether a peer in this state counts toward a contiguous span (§4.2.2).
    pub fn counts_toward_span(&self) -> bool {
        matches!(self, ModuleState::Joining | ModuleState::Online)
    }
}

/// One peer's published record at a single block-uid `prefix.i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub peer_id: PeerId,
    pub state: ModuleState,
    pub span: Span,
    pub using_relay: bool,
}

/// One row of the overlay snapshot the Incentives Engine scores: an ONLINE
/// peer whose on-chain classification is Included or Submittable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRow {
    pub peer_id: PeerId,
    pub span: Span,
    pub using_relay: bool,
    pub rps: Option<f64>,
}

impl ServerRow {
    pub fn new(peer_id: PeerId, span: Span, using_relay: bool) -> Self {
        Self { peer_id, span, using_relay, rps: None }
    }
}

/// The health report the Epoch Loop consults before attempting activation.
/// Modeled as a tagged record (never a stringly-keyed map) so every
/// consumer pattern-matches on `state` instead of probing field presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub state: HealthState,
    pub num_blocks: u32,
    pub server_rows: Vec<ServerRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Healthy,
    Broken,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        matches!(self.state, HealthState::Healthy)
    }
}
