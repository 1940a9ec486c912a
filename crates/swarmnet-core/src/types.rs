use serde::{Deserialize, Serialize};

/// A 32-byte Ed25519 public key identifying a peer at the protocol level.
/// The overlay peer-id (`libp2p::PeerId`) is a derivation of this, not the
/// same bytes — see `swarmnet-crypto::identity` for the derivation.
pub type Ed25519PublicKey = [u8; 32];

/// Overlay peer-id, as derived by the DHT/identity layer from a node's
/// Ed25519 public key. Re-exported so callers never depend on `libp2p`
/// directly for this one type.
pub type PeerId = libp2p::PeerId;

/// SS58 account address (prefix 42). The coldkey is the signing entity for
/// extrinsics; the hotkey is an optional distinct key used only for
/// consensus operations (validate/attest).
pub type Coldkey = [u8; 32];
pub type Hotkey = [u8; 32];

pub type SubnetId = u32;
pub type BlockNumber = u64;
pub type Epoch = u64;

/// Contiguous `[start, end)` range of transformer-block indices a peer serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32, num_blocks: u32) -> crate::error::Result<Self> {
        if start >= end || end > num_blocks {
            return Err(crate::error::CoreError::InvalidSpan { start, end, num_blocks });
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// `(end - start) / num_blocks`, the fraction of the model this span covers.
    pub fn blocks_served_ratio(&self, num_blocks: u32) -> f64 {
        self.len() as f64 / num_blocks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_rejects_empty_and_out_of_range() {
        assert!(Span::new(4, 4, 32).is_err());
        assert!(Span::new(0, 33, 32).is_err());
        assert!(Span::new(0, 16, 32).is_ok());
    }

    #[test]
    fn blocks_served_ratio_is_fractional() {
        let span = Span::new(0, 16, 32).unwrap();
        assert_eq!(span.blocks_served_ratio(32), 0.5);
    }
}
