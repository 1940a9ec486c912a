//! On-chain subnet and subnet-node data model (§3 of the incentives spec).
//!
//! These types mirror what the Chain Gateway decodes from the chain's
//! `Network` pallet. The chain itself is external; this module only
//! describes the shape of its read-mostly records.

use crate::error::{CoreError, Result};
use crate::types::{BlockNumber, Coldkey, Hotkey, PeerId, SubnetId};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Read-mostly subnet metadata. `activated_block` is `0` until the subnet
/// has been activated; activation is terminal (no deactivation in-scope).
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SubnetDescriptor {
    pub subnet_id: SubnetId,
    pub path: String,
    pub memory_mb: u64,
    pub initialized_block: BlockNumber,
    pub registration_blocks: BlockNumber,
    pub activated_block: BlockNumber,
}

impl SubnetDescriptor {
    pub fn is_activated(&self) -> bool {
        self.activated_block > 0
    }

    pub fn activation_block(&self) -> BlockNumber {
        self.initialized_block + self.registration_blocks
    }

    pub fn registration_window(&self) -> std::ops::Range<BlockNumber> {
        self.initialized_block..self.activation_block()
    }
}

/// Classification is monotonic along this order within a node's lifetime in
/// a subnet: a node may only move forward, never backward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub enum Classification {
    Registered,
    Idle,
    Included,
    Submittable,
    Accountant,
}

impl Classification {
    /// Only Submittable nodes may validate/attest.
    pub fn can_validate_or_attest(&self) -> bool {
        matches!(self, Classification::Submittable)
    }

    /// Included and Submittable nodes participate in scoring.
    pub fn participates_in_scoring(&self) -> bool {
        matches!(self, Classification::Included | Classification::Submittable)
    }

    /// Validate a proposed transition is monotone; used by test fixtures and
    /// anywhere a gateway decodes two snapshots of the same node.
    pub fn validate_transition(from: Classification, to: Classification) -> Result<()> {
        if to < from {
            return Err(CoreError::ClassificationRegression { from, to });
        }
        Ok(())
    }
}

/// One subnet-node's on-chain record.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SubnetNodeRecord {
    pub coldkey: Coldkey,
    pub hotkey: Hotkey,
    #[codec(skip)]
    #[serde(skip)]
    pub peer_id: Option<PeerId>,
    pub initialized_epoch: u64,
    pub classification: Classification,
    pub a: u128,
    pub b: u128,
    pub c: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_monotone() {
        assert!(Classification::validate_transition(
            Classification::Registered,
            Classification::Included
        )
        .is_ok());
        assert!(Classification::validate_transition(
            Classification::Submittable,
            Classification::Included
        )
        .is_err());
    }

    #[test]
    fn activation_block_is_init_plus_registration() {
        let d = SubnetDescriptor {
            subnet_id: 1,
            path: "swarm/7b".into(),
            memory_mb: 14_000,
            initialized_block: 1000,
            registration_blocks: 100,
            activated_block: 0,
        };
        assert_eq!(d.activation_block(), 1100);
        assert!(!d.is_activated());
    }
}
