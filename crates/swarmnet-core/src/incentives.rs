//! The incentives vector submitted on-chain per validator per epoch (§3),
//! and the equality semantics the attestation predicate (C6) relies on.
//!
//! The source this spec is drawn from compared score vectors via
//! `frozenset(asdict(...).items())`. We instead represent each entry as a
//! plain, totally-ordered struct and compare *sorted* vectors element-wise —
//! same equality semantics, no reliance on a hashable-map trick.

use crate::types::PeerId;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize)]
pub struct IncentivesEntry {
    pub peer_id_bytes: [u8; 32],
    pub score: u128,
}

/// Ordered incentives vector, stable-sorted by peer-id (byte-lex) so two
/// honest nodes observing the same `ServerRow`s produce byte-identical
/// output (§4.4 "Output ordering").
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct IncentivesVector(pub Vec<IncentivesEntry>);

impl IncentivesVector {
    pub fn from_unsorted(mut entries: Vec<IncentivesEntry>) -> Self {
        entries.sort_by(|a, b| a.peer_id_bytes.cmp(&b.peer_id_bytes));
        Self(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains_peer(&self, peer: &PeerId) -> bool {
        let bytes = peer_id_bytes(peer);
        self.0.iter().any(|e| e.peer_id_bytes == bytes)
    }

    /// Symmetric difference `V △ M` as used by the attestation equivalence
    /// rule (§4.6): entries present in exactly one of the two vectors.
    pub fn symmetric_difference(&self, other: &Self) -> Vec<IncentivesEntry> {
        let mut diff: Vec<IncentivesEntry> = self
            .0
            .iter()
            .filter(|e| !other.0.contains(e))
            .chain(other.0.iter().filter(|e| !self.0.contains(e)))
            .copied()
            .collect();
        diff.sort_by(|a, b| a.peer_id_bytes.cmp(&b.peer_id_bytes));
        diff
    }

    pub fn is_subset_of(&self, other: &[IncentivesEntry]) -> bool {
        self.0.iter().all(|e| other.contains(e))
    }
}

pub fn peer_id_bytes(peer: &PeerId) -> [u8; 32] {
    // libp2p::PeerId has no fixed 32-byte representation in general (it is a
    // multihash of arbitrary key encodings), so we hash its canonical bytes
    // down to a fixed-width, stably-ordered key for vector comparisons.
    let digest = blake3::hash(&peer.to_bytes());
    *digest.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(b: u8, score: u128) -> IncentivesEntry {
        IncentivesEntry { peer_id_bytes: [b; 32], score }
    }

    #[test]
    fn from_unsorted_sorts_by_peer_id() {
        let v = IncentivesVector::from_unsorted(vec![entry(2, 10), entry(1, 20)]);
        assert_eq!(v.0[0].peer_id_bytes, [1u8; 32]);
        assert_eq!(v.0[1].peer_id_bytes, [2u8; 32]);
    }

    #[test]
    fn symmetric_difference_is_empty_for_equal_vectors() {
        let a = IncentivesVector::from_unsorted(vec![entry(1, 10), entry(2, 20)]);
        let b = IncentivesVector::from_unsorted(vec![entry(2, 20), entry(1, 10)]);
        assert!(a.symmetric_difference(&b).is_empty());
    }

    #[test]
    fn symmetric_difference_finds_disjoint_peers() {
        let a = IncentivesVector::from_unsorted(vec![entry(1, 10), entry(2, 20)]);
        let b = IncentivesVector::from_unsorted(vec![entry(2, 20), entry(3, 30)]);
        let diff = a.symmetric_difference(&b);
        assert_eq!(diff.len(), 2);
    }
}
