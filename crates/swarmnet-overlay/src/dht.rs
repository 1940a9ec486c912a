//! The DHT is an external collaborator (§1 Out of scope): "a keyed
//! authenticated record store with subkey-per-writer semantics,
//! expirations, and a reachability probe." This module defines the narrow
//! interface the overlay/RPS components need from it, so the rest of the
//! crate never depends on a concrete DHT implementation.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use swarmnet_core::PeerId;

/// A single module-info entry as published by a serving peer (§3, §6).
pub type ModuleInfoKey = String;

/// Builds the DHT key for block-uid `{prefix}.{block_index}` (§4.2 step 1).
pub fn module_uid(prefix: &str, block_index: u32) -> ModuleInfoKey {
    format!("{prefix}.{block_index}")
}

/// Builds the DHT key for RPS samples at a given epoch (§3, §4.3: `"rps" ||
/// epoch`).
pub fn rps_key(epoch: u64) -> ModuleInfoKey {
    format!("rps{epoch}")
}

/// Embeds the writer's public key into a subkey per §6 ("`[owner:<pubkey>]`
/// embedded into the subkey"), giving subkey-per-writer semantics.
pub fn owner_subkey(pubkey: &[u8; 32]) -> String {
    format!("[owner:{}]", hex::encode(pubkey))
}

/// A keyed, authenticated record store: get, put-with-subkey, and list by
/// key (merging across subkeys). Implementations own TTL and signature
/// verification; callers here only see already-verified values.
#[async_trait]
pub trait DhtHandle: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T>;

    /// Returns every (subkey, value) pair stored under `key`, across all
    /// writers, sorted by subkey lex order (§9: "explicit ordering keyed by
    /// subkey lex-order; never index into an implicit hash order").
    async fn get_all<T: DeserializeOwned + Send>(&self, key: &str) -> Vec<(String, T)>;

    async fn put<T: Serialize + Send + Sync>(&self, key: &str, subkey: &str, value: &T, ttl: Duration);
}

/// Reachability probe against bootstrap peers and ONLINE overlay peers
/// (§4.2 step 3). An external collaborator; the overlay treats a failed
/// probe as "unreachable," dropping that peer from this epoch's view.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self, peer: &PeerId) -> bool;
}
