pub type Hash = [u8; 32];

/// Blake3 hash function, used for DHT record keys and vector peer-id ordering.
pub fn blake3_hash(data: &[u8]) -> Hash {
    let hash = blake3::hash(data);
    *hash.as_bytes()
}

/// SHA256 hash function, used in the SS58 address checksum (blake2b in the
/// original chain's implementation; see `ss58.rs` for the exact scheme used here).
pub fn sha256(data: &[u8]) -> Hash {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}
