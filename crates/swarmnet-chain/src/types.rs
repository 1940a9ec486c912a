//! Wire-level shapes returned by the `Network` pallet (§6). These are the
//! SCALE-decoded view of chain state; the gateway hands callers these types
//! or the shared `swarmnet_core` domain types derived from them.

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use swarmnet_core::{Coldkey, Epoch, IncentivesEntry};

/// Result of submitting an extrinsic. `events` names every event the chain
/// attached to the block the extrinsic landed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub is_success: bool,
    pub events: Vec<String>,
    pub block_number: Option<u64>,
}

impl Receipt {
    pub fn has_event(&self, name: &str) -> bool {
        self.events.iter().any(|e| e == name)
    }

    /// Activation succeeds iff the extrinsic itself succeeded *and* the
    /// chain emitted `SubnetActivated` (§4.1).
    pub fn activated(&self) -> bool {
        self.is_success && self.has_event("SubnetActivated")
    }
}

/// One attestor's entry inside a `SubnetRewardsSubmission` (§4.1, §6).
#[derive(Debug, Clone, Encode, Decode, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attestation {
    pub coldkey: Coldkey,
}

/// `get_rewards_submission` response (§4.1): the validator's submitted
/// vector plus whoever has attested it so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsSubmission {
    pub data: Vec<IncentivesEntry>,
    pub attests: Vec<Attestation>,
}

impl RewardsSubmission {
    pub fn attested_by(&self, coldkey: &Coldkey) -> bool {
        self.attests.iter().any(|a| &a.coldkey == coldkey)
    }

    /// Fraction of submittable nodes (`total_submittable`) that have
    /// attested, in basis points. Used against
    /// `DEFAULT_RATIFICATION_THRESHOLD_BPS` (§4.6, §9).
    pub fn attestation_bps(&self, total_submittable: usize) -> u32 {
        if total_submittable == 0 {
            return 0;
        }
        ((self.attests.len() as u64 * 10_000) / total_submittable as u64) as u32
    }
}

/// Chain constants cached by the gateway after first read (§4.1: "a chain
/// constant, cache safely").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChainConstants {
    pub epoch_length: u64,
    pub min_subnet_registration_blocks: u64,
    pub max_subnet_registration_blocks: u64,
}

/// A previous epoch's ratified validator submission, used by C6 rule 4.
#[derive(Debug, Clone)]
pub struct RatifiedSubmission {
    pub epoch: Epoch,
    pub vector: Vec<IncentivesEntry>,
    pub attestation_bps: u32,
}
