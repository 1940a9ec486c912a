//! C2 Overlay View (§4.2): snapshot of currently reachable peers and the
//! block-span each one serves, derived from DHT module-info records plus a
//! reachability probe, intersected with the chain's Included set.

use crate::dht::{module_uid, DhtHandle, ReachabilityProbe};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use swarmnet_core::{ModuleState, PeerId, ServerRow, Span, SubnetNodeRecord};

/// One peer's self-published entry at a single block-uid (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleInfoEntry {
    pub state: ModuleState,
    pub span_start: u32,
    pub span_end: u32,
    pub using_relay: bool,
}

pub struct OverlayView<'a, D: DhtHandle, R: ReachabilityProbe> {
    dht: &'a D,
    probe: &'a R,
    bootstrap_peers: &'a [PeerId],
}

impl<'a, D: DhtHandle, R: ReachabilityProbe> OverlayView<'a, D, R> {
    pub fn new(dht: &'a D, probe: &'a R, bootstrap_peers: &'a [PeerId]) -> Self {
        Self { dht, probe, bootstrap_peers }
    }

    /// Computes the current `ServerRow` list (§4.2 steps 1-5).
    pub async fn snapshot(
        &self,
        prefix: &str,
        num_blocks: u32,
        included_nodes: &[SubnetNodeRecord],
    ) -> Vec<ServerRow> {
        let per_block = self.fetch_module_info(prefix, num_blocks).await;
        let claims = self.collect_claims(&per_block);
        let validated = self.validate_spans(&claims, &per_block, num_blocks);

        let included: HashSet<PeerId> =
            included_nodes.iter().filter_map(|n| n.peer_id).collect();

        let mut rows = Vec::new();
        for (peer_id, (span, using_relay)) in validated {
            if !included.contains(&peer_id) {
                continue;
            }
            if !self.is_reachable(&peer_id).await {
                continue;
            }
            rows.push(ServerRow::new(peer_id, span, using_relay));
        }
        rows
    }

    async fn fetch_module_info(
        &self,
        prefix: &str,
        num_blocks: u32,
    ) -> Vec<HashMap<PeerId, ModuleInfoEntry>> {
        let mut per_block = Vec::with_capacity(num_blocks as usize);
        for i in 0..num_blocks {
            let uid = module_uid(prefix, i);
            let entries: Vec<(String, ModuleInfoEntry)> = self.dht.get_all(&uid).await;
            let mut map = HashMap::new();
            for (subkey, entry) in entries {
                if let Ok(peer_id) = subkey.parse::<PeerId>() {
                    map.insert(peer_id, entry);
                }
            }
            per_block.push(map);
        }
        per_block
    }

    /// Each peer claims a span in every record it publishes; take the most
    /// recently seen claim (any block index works, they should agree).
    fn collect_claims(
        &self,
        per_block: &[HashMap<PeerId, ModuleInfoEntry>],
    ) -> HashMap<PeerId, (u32, u32, bool)> {
        let mut claims = HashMap::new();
        for block in per_block {
            for (peer_id, entry) in block {
                claims.insert(*peer_id, (entry.span_start, entry.span_end, entry.using_relay));
            }
        }
        claims
    }

    /// Validates that a peer's claimed span holds at every index within it
    /// with state ∈ {JOINING, ONLINE} (§4.2 step 2, §3 span invariant).
    fn validate_spans(
        &self,
        claims: &HashMap<PeerId, (u32, u32, bool)>,
        per_block: &[HashMap<PeerId, ModuleInfoEntry>],
        num_blocks: u32,
    ) -> HashMap<PeerId, (Span, bool)> {
        let mut validated = HashMap::new();
        for (peer_id, &(start, end, using_relay)) in claims {
            if start >= end || end > num_blocks {
                continue;
            }
            let holds = (start..end).all(|i| {
                per_block[i as usize]
                    .get(peer_id)
                    .map(|e| e.state.counts_toward_span())
                    .unwrap_or(false)
            });
            if !holds {
                continue;
            }
            if let Ok(span) = Span::new(start, end, num_blocks) {
                validated.insert(*peer_id, (span, using_relay));
            }
        }
        validated
    }

    async fn is_reachable(&self, peer_id: &PeerId) -> bool {
        if self.bootstrap_peers.contains(peer_id) {
            return true;
        }
        self.probe.is_reachable(peer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dht::rps_key;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeDht {
        blocks: Vec<HashMap<String, ModuleInfoEntry>>,
    }

    #[async_trait]
    impl DhtHandle for FakeDht {
        async fn get<T: serde::de::DeserializeOwned + Send>(&self, _key: &str) -> Option<T> {
            None
        }

        async fn get_all<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> Vec<(String, T)> {
            let index: usize = key.rsplit('.').next().unwrap().parse().unwrap();
            let block = &self.blocks[index];
            block
                .iter()
                .map(|(k, v)| {
                    let json = serde_json::to_value(v).unwrap();
                    (k.clone(), serde_json::from_value(json).unwrap())
                })
                .collect()
        }

        async fn put<T: serde::Serialize + Send + Sync>(
            &self,
            _key: &str,
            _subkey: &str,
            _value: &T,
            _ttl: Duration,
        ) {
        }
    }

    struct AlwaysReachable;

    #[async_trait]
    impl ReachabilityProbe for AlwaysReachable {
        async fn is_reachable(&self, _peer: &PeerId) -> bool {
            true
        }
    }

    fn node(peer_id: PeerId, classification: swarmnet_core::Classification) -> SubnetNodeRecord {
        SubnetNodeRecord {
            coldkey: [0u8; 32],
            hotkey: [0u8; 32],
            peer_id: Some(peer_id),
            initialized_epoch: 0,
            classification,
            a: 0,
            b: 0,
            c: 0,
        }
    }

    #[tokio::test]
    async fn validated_span_produces_server_row() {
        let peer = PeerId::random();
        let entry = ModuleInfoEntry {
            state: ModuleState::Online,
            span_start: 0,
            span_end: 4,
            using_relay: false,
        };
        let mut blocks = Vec::new();
        for _ in 0..4 {
            let mut m = HashMap::new();
            m.insert(peer.to_string(), entry.clone());
            blocks.push(m);
        }
        let dht = FakeDht { blocks };
        let probe = AlwaysReachable;
        let view = OverlayView::new(&dht, &probe, &[]);
        let included = vec![node(peer, swarmnet_core::Classification::Included)];
        let rows = view.snapshot("swarm.layer", 4, &included).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].span.len(), 4);
        let _ = rps_key(1);
    }

    #[tokio::test]
    async fn span_broken_mid_range_is_rejected() {
        let peer = PeerId::random();
        let online = ModuleInfoEntry { state: ModuleState::Online, span_start: 0, span_end: 4, using_relay: false };
        let offline = ModuleInfoEntry { state: ModuleState::Offline, span_start: 0, span_end: 4, using_relay: false };
        let mut blocks = Vec::new();
        for i in 0..4 {
            let mut m = HashMap::new();
            m.insert(peer.to_string(), if i == 2 { offline.clone() } else { online.clone() });
            blocks.push(m);
        }
        let dht = FakeDht { blocks };
        let probe = AlwaysReachable;
        let view = OverlayView::new(&dht, &probe, &[]);
        let included = vec![node(peer, swarmnet_core::Classification::Included)];
        let rows = view.snapshot("swarm.layer", 4, &included).await;
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn peer_not_in_included_set_is_dropped() {
        let peer = PeerId::random();
        let entry = ModuleInfoEntry { state: ModuleState::Online, span_start: 0, span_end: 2, using_relay: false };
        let mut blocks = Vec::new();
        for _ in 0..2 {
            let mut m = HashMap::new();
            m.insert(peer.to_string(), entry.clone());
            blocks.push(m);
        }
        let dht = FakeDht { blocks };
        let probe = AlwaysReachable;
        let view = OverlayView::new(&dht, &probe, &[]);
        let rows = view.snapshot("swarm.layer", 2, &[]).await;
        assert!(rows.is_empty());
    }
}
