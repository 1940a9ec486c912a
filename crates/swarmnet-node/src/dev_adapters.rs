//! Stand-in implementations of the external collaborators the core treats
//! as out of scope (§1): the DHT/identity layer and the transformer
//! inference pipe. These let the binary run end-to-end without a real
//! overlay network or model server wired in; a production deployment
//! replaces them with the actual DHT client and inference session.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use swarmnet_core::{PeerId, ServerRow};
use swarmnet_overlay::{DhtHandle, InferenceEndpoint, ReachabilityProbe};

struct Record {
    value: Vec<u8>,
    expires_at: Instant,
}

/// Single-process DHT stand-in: a keyed, subkey-per-writer store with TTL
/// expiry, matching the interface contract in §6 without any networking.
#[derive(Default)]
pub struct InMemoryDht {
    records: RwLock<HashMap<String, HashMap<String, Record>>>,
}

impl InMemoryDht {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DhtHandle for InMemoryDht {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        let records = self.records.read();
        let by_subkey = records.get(key)?;
        let now = Instant::now();
        let (_, record) = by_subkey.iter().find(|(_, r)| r.expires_at > now)?;
        serde_json::from_slice(&record.value).ok()
    }

    async fn get_all<T: DeserializeOwned + Send>(&self, key: &str) -> Vec<(String, T)> {
        let records = self.records.read();
        let Some(by_subkey) = records.get(key) else {
            return Vec::new();
        };
        let now = Instant::now();
        let mut out: Vec<(String, T)> = by_subkey
            .iter()
            .filter(|(_, r)| r.expires_at > now)
            .filter_map(|(subkey, r)| serde_json::from_slice(&r.value).ok().map(|v| (subkey.clone(), v)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    async fn put<T: Serialize + Send + Sync>(&self, key: &str, subkey: &str, value: &T, ttl: Duration) {
        let Ok(bytes) = serde_json::to_vec(value) else { return };
        let mut records = self.records.write();
        records
            .entry(key.to_string())
            .or_default()
            .insert(subkey.to_string(), Record { value: bytes, expires_at: Instant::now() + ttl });
    }
}

/// Always reports peers reachable. A real probe dials the peer's advertised
/// multiaddr and checks for a liveness response.
pub struct AlwaysReachableProbe;

#[async_trait]
impl ReachabilityProbe for AlwaysReachableProbe {
    async fn is_reachable(&self, _peer: &PeerId) -> bool {
        true
    }
}

/// Returns a fixed per-step latency instead of driving a real inference
/// session. Useful for exercising the RPS Probe's math without a model.
pub struct FixedLatencyEndpoint {
    pub latency: Duration,
}

impl Default for FixedLatencyEndpoint {
    fn default() -> Self {
        Self { latency: Duration::from_millis(20) }
    }
}

#[async_trait]
impl InferenceEndpoint for FixedLatencyEndpoint {
    async fn timed_step(&self, _peer: &ServerRow) -> Result<Duration, String> {
        tokio::time::sleep(self.latency).await;
        Ok(self.latency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_all_round_trips() {
        let dht = InMemoryDht::new();
        dht.put("k", "subkey-a", &42u32, Duration::from_secs(60)).await;
        let all: Vec<(String, u32)> = dht.get_all("k").await;
        assert_eq!(all, vec![("subkey-a".to_string(), 42)]);
    }

    #[tokio::test]
    async fn expired_record_is_not_returned() {
        let dht = InMemoryDht::new();
        dht.put("k", "subkey-a", &42u32, Duration::from_millis(0)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let value: Option<u32> = dht.get("k").await;
        assert_eq!(value, None);
    }
}
