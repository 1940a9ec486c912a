//! Peer-id derivation for the overlay (§3): `libp2p::PeerId` is a multihash
//! over an encoded public key, not the raw 32 Ed25519 bytes, so this is a
//! derivation rather than a cast.

use crate::{CryptoError, Result};
use swarmnet_core::PeerId;

pub fn derive_peer_id(public_key_bytes: &[u8; 32]) -> Result<PeerId> {
    let ed25519_public = libp2p::identity::ed25519::PublicKey::try_from_bytes(public_key_bytes)
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    let public_key = libp2p::identity::PublicKey::from(ed25519_public);
    Ok(PeerId::from_public_key(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn derivation_is_deterministic() {
        let kp = KeyPair::generate();
        let a = derive_peer_id(&kp.public_key_bytes()).unwrap();
        let b = derive_peer_id(&kp.public_key_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_keys_derive_different_peer_ids() {
        let a = derive_peer_id(&KeyPair::generate().public_key_bytes()).unwrap();
        let b = derive_peer_id(&KeyPair::generate().public_key_bytes()).unwrap();
        assert_ne!(a, b);
    }
}
