//! C1 Chain Gateway: typed, retry-wrapped access to the `Network` pallet
//! (§4.1, §6). Talks JSON-RPC to a Substrate-style node; storage values
//! come back as SCALE-encoded hex and are decoded here.

use crate::retry::retry;
use crate::types::{ChainConstants, Receipt, RewardsSubmission};
use crate::{ChainError, Result};
use parity_scale_codec::Decode;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use swarmnet_core::{Coldkey, IncentivesVector, SubnetDescriptor, SubnetId, SubnetNodeRecord};
use tracing::{info, instrument};

/// Stateless beyond connection handles and the cached chain constants (§3:
/// "The Chain Gateway is process-wide and stateless beyond connection
/// handles"). Cheap to clone — share one instance across the node.
#[derive(Clone)]
pub struct ChainGateway {
    http: reqwest::Client,
    rpc_url: String,
    constants: std::sync::Arc<RwLock<Option<ChainConstants>>>,
}

impl ChainGateway {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            constants: std::sync::Arc::new(RwLock::new(None)),
        }
    }

    async fn call_raw(&self, method: &str, params: Value) -> std::result::Result<Value, String> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let payload: Value = resp.json().await.map_err(|e| e.to_string())?;
        if let Some(err) = payload.get("error") {
            return Err(err.to_string());
        }
        payload
            .get("result")
            .cloned()
            .ok_or_else(|| "missing result field".to_string())
    }

    async fn call_json<T: DeserializeOwned>(&self, method: &str, params: Value) -> std::result::Result<T, String> {
        let raw = self.call_raw(method, params).await?;
        serde_json::from_value(raw).map_err(|e| e.to_string())
    }

    /// SCALE-decode a hex-encoded storage value (`0x`-prefixed), tolerant of
    /// an empty/absent response (§4.1: "the decoder must tolerate an empty
    /// response").
    fn decode_scale<T: Decode>(hex_value: &str) -> Result<Option<T>> {
        let trimmed = hex_value.trim_start_matches("0x");
        if trimmed.is_empty() {
            return Ok(None);
        }
        let bytes = hex::decode(trimmed).map_err(|e| ChainError::Decode(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(None);
        }
        T::decode(&mut &bytes[..])
            .map(Some)
            .map_err(|e| ChainError::Decode(e.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_block_number(&self) -> Option<u64> {
        retry("get_block_number", || self.call_json::<u64>("chain_blockNumber", json!([]))).await
    }

    #[instrument(skip(self))]
    pub async fn get_epoch_length(&self) -> Option<u64> {
        if let Some(c) = *self.constants.read() {
            return Some(c.epoch_length);
        }
        let constants = self.fetch_constants().await?;
        Some(constants.epoch_length)
    }

    async fn fetch_constants(&self) -> Option<ChainConstants> {
        let fetched: ChainConstants =
            retry("chain_constants", || self.call_json("network_constants", json!([]))).await?;
        *self.constants.write() = Some(fetched);
        Some(fetched)
    }

    #[instrument(skip(self))]
    pub async fn get_subnet_id_by_path(&self, path: &str) -> Option<SubnetId> {
        retry("get_subnet_id_by_path", || {
            self.call_json::<Option<SubnetId>>("network_subnetPaths", json!([path]))
        })
        .await
        .flatten()
    }

    #[instrument(skip(self))]
    pub async fn get_subnet_data(&self, subnet_id: SubnetId) -> Option<SubnetDescriptor> {
        let hex: String = retry("get_subnet_data", || {
            self.call_json::<String>("network_subnetsData", json!([subnet_id]))
        })
        .await?;
        Self::decode_scale(&hex).ok().flatten()
    }

    #[instrument(skip(self))]
    pub async fn get_included_nodes(&self, subnet_id: SubnetId) -> Vec<SubnetNodeRecord> {
        self.get_nodes_by_query("network_subnetNodesIncluded", subnet_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_submittable_nodes(&self, subnet_id: SubnetId) -> Vec<SubnetNodeRecord> {
        self.get_nodes_by_query("network_subnetNodesSubmittable", subnet_id).await
    }

    async fn get_nodes_by_query(&self, method: &'static str, subnet_id: SubnetId) -> Vec<SubnetNodeRecord> {
        let Some(hex) = retry(method, || self.call_json::<String>(method, json!([subnet_id]))).await else {
            return Vec::new();
        };
        Self::decode_scale::<Vec<SubnetNodeRecord>>(&hex)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    #[instrument(skip(self))]
    pub async fn get_rewards_validator(&self, subnet_id: SubnetId, epoch: u64) -> Option<Coldkey> {
        let hex: String = retry("get_rewards_validator", || {
            self.call_json::<String>("network_subnetRewardsValidator", json!([subnet_id, epoch]))
        })
        .await?;
        Self::decode_scale::<Coldkey>(&hex).ok().flatten()
    }

    #[instrument(skip(self))]
    pub async fn get_rewards_submission(&self, subnet_id: SubnetId, epoch: u64) -> Option<RewardsSubmission> {
        retry("get_rewards_submission", || {
            self.call_json::<Option<RewardsSubmission>>("network_subnetRewardsSubmission", json!([subnet_id, epoch]))
        })
        .await
        .flatten()
    }

    /// State-changing extrinsic: never retried across a single logical call
    /// (§4.1 — the chain's rate-limit guards duplicate submission; the loop
    /// re-checks via `get_rewards_submission`).
    #[instrument(skip(self, vector))]
    pub async fn submit_validate(&self, subnet_id: SubnetId, vector: &IncentivesVector) -> Result<Receipt> {
        let encoded = parity_scale_codec::Encode::encode(&vector.0);
        let receipt: Receipt = self
            .call_json("network_validate", json!([subnet_id, hex::encode(encoded)]))
            .await
            .map_err(ChainError::Transport)?;
        info!(subnet_id, success = receipt.is_success, "submitted validate extrinsic");
        Ok(receipt)
    }

    #[instrument(skip(self))]
    pub async fn submit_attest(&self, subnet_id: SubnetId) -> Result<Receipt> {
        let receipt: Receipt = self
            .call_json("network_attest", json!([subnet_id]))
            .await
            .map_err(ChainError::Transport)?;
        info!(subnet_id, success = receipt.is_success, "submitted attest extrinsic");
        Ok(receipt)
    }

    #[instrument(skip(self))]
    pub async fn activate_subnet(&self, subnet_id: SubnetId) -> Result<Receipt> {
        let receipt: Receipt = self
            .call_json("network_activateSubnet", json!([subnet_id]))
            .await
            .map_err(ChainError::Transport)?;
        info!(subnet_id, activated = receipt.activated(), "submitted activate_subnet extrinsic");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_scale_tolerates_empty_hex() {
        let decoded: Option<u64> = ChainGateway::decode_scale("0x").unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn decode_scale_tolerates_bare_prefix_without_0x() {
        let decoded: Option<u64> = ChainGateway::decode_scale("").unwrap();
        assert_eq!(decoded, None);
    }

    #[test]
    fn decode_scale_decodes_well_formed_value() {
        let encoded = parity_scale_codec::Encode::encode(&42u64);
        let hex_value = format!("0x{}", hex::encode(encoded));
        let decoded: Option<u64> = ChainGateway::decode_scale(&hex_value).unwrap();
        assert_eq!(decoded, Some(42));
    }
}
