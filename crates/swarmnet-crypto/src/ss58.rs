//! SS58 address encoding (prefix 42), used for the on-chain coldkey/hotkey
//! account addresses (§3, §6). Same scheme the Substrate ecosystem uses:
//! `base58(prefix_bytes || public_key || checksum)` where the checksum is
//! the first 2 bytes of `blake2b-512("SS58PRE" || prefix_bytes || public_key)`.

use crate::CryptoError;
use blake2::Blake2b512;
use blake2::Digest;

pub const SS58_PREFIX: u8 = 42;

fn ss58_checksum(payload: &[u8]) -> [u8; 2] {
    let mut hasher = Blake2b512::new();
    hasher.update(b"SS58PRE");
    hasher.update(payload);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

pub fn encode(public_key: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(1 + 32 + 2);
    payload.push(SS58_PREFIX);
    payload.extend_from_slice(public_key);
    let checksum = ss58_checksum(&payload);
    payload.extend_from_slice(&checksum);
    bs58::encode(payload).into_string()
}

pub fn decode(address: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = bs58::decode(address)
        .into_vec()
        .map_err(|e| CryptoError::Ss58Decode(e.to_string()))?;
    if bytes.len() != 35 {
        return Err(CryptoError::Ss58Decode(format!(
            "expected 35 decoded bytes, got {}",
            bytes.len()
        )));
    }
    if bytes[0] != SS58_PREFIX {
        return Err(CryptoError::Ss58Decode(format!(
            "unexpected network prefix {}, expected {SS58_PREFIX}",
            bytes[0]
        )));
    }
    let (payload, checksum) = bytes.split_at(33);
    if ss58_checksum(payload) != checksum {
        return Err(CryptoError::Ss58Decode("checksum mismatch".into()));
    }
    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&payload[1..]);
    Ok(public_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips() {
        let pk = [7u8; 32];
        let addr = encode(&pk);
        assert_eq!(decode(&addr).unwrap(), pk);
    }

    #[test]
    fn rejects_corrupted_checksum() {
        let pk = [7u8; 32];
        let mut addr = encode(&pk);
        addr.push('x');
        assert!(decode(&addr).is_err());
    }

    #[test]
    fn rejects_wrong_prefix() {
        // Re-encode with prefix 0 (a different network) and confirm our
        // prefix-42 decoder rejects it.
        let pk = [3u8; 32];
        let mut payload = vec![0u8];
        payload.extend_from_slice(&pk);
        let checksum = ss58_checksum(&payload);
        payload.extend_from_slice(&checksum);
        let addr = bs58::encode(payload).into_string();
        assert!(decode(&addr).is_err());
    }
}
