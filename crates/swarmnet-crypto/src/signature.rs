//! Ed25519 node identity: key generation, the on-disk key file (§6), and
//! peer-id derivation for the overlay.

use crate::{CryptoError, Result};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use zeroize::Zeroize;

/// `key_type` tag written into the peer identity key file. The source this
/// spec is drawn from mixed `is`/`==` string comparisons for this field
/// (`key_type is "rsa"`, always false) and one path even reused
/// `args.path.lower()` as the key type by mistake. We fix both: `KeyType` is
/// a real enum, compared structurally, and the only field that can supply it
/// is `args.key_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Ed25519,
}

/// A node's signing identity. Wraps `ed25519_dalek::SigningKey`; the secret
/// scalar is zeroized on drop.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self { signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()) }
    }
}

impl KeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self { signing_key: SigningKey::from_bytes(seed) }
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn seed_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

/// Verify a signature against a message and a raw 32-byte Ed25519 public key.
pub fn verify_signature(message: &[u8], signature: &[u8; 64], public_key: &[u8; 32]) -> Result<bool> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key).map_err(|_| CryptoError::InvalidPublicKey)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature);
    Ok(verifying_key.verify(message, &sig).is_ok())
}

/// Protobuf-serialized `{key_type, data}` key file (§6): `key_type = Ed25519`,
/// `data` = 32-byte seed || 32-byte public key. Created with permission 0400.
pub mod key_file {
    use super::*;
    use std::fs;
    use std::io::Write;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// Minimal hand-rolled protobuf encoding for the two-field message
    /// `{key_type: varint, data: bytes}` — avoids pulling a full protobuf
    /// toolchain for a single fixed-shape record.
    pub fn write(path: &Path, keypair: &KeyPair) -> Result<()> {
        let mut data = Vec::with_capacity(64);
        data.extend_from_slice(&keypair.seed_bytes());
        data.extend_from_slice(&keypair.public_key_bytes());

        let mut buf = Vec::new();
        buf.push(0x08); // field 1 (key_type), varint wire type
        buf.push(KeyType::Ed25519 as u8);
        buf.push(0x12); // field 2 (data), length-delimited
        buf.push(data.len() as u8);
        buf.extend_from_slice(&data);

        let mut file = fs::File::create(path)?;
        file.write_all(&buf)?;
        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(0o400))?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<KeyPair> {
        let buf = fs::read(path)?;
        if buf.len() < 2 || buf[0] != 0x08 || buf[1] != KeyType::Ed25519 as u8 {
            return Err(CryptoError::KeyFileMalformed("unexpected key_type tag".into()));
        }
        if buf.len() < 4 || buf[2] != 0x12 {
            return Err(CryptoError::KeyFileMalformed("missing data field".into()));
        }
        let len = buf[3] as usize;
        let data = &buf[4..];
        if data.len() != len || len != 64 {
            return Err(CryptoError::KeyFileMalformed(format!(
                "expected 64-byte seed||pubkey, got {len}"
            )));
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&data[..32]);
        let keypair = KeyPair::from_seed(&seed);
        if keypair.public_key_bytes() != data[32..64] {
            return Err(CryptoError::KeyFileMalformed(
                "embedded public key does not match seed".into(),
            ));
        }
        Ok(keypair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"epoch 100 incentives vector";
        let sig = kp.sign(msg);
        assert!(verify_signature(msg, &sig, &kp.public_key_bytes()).unwrap());
    }

    #[test]
    fn tampered_message_fails_verification() {
        let kp = KeyPair::generate();
        let sig = kp.sign(b"original");
        assert!(!verify_signature(b"tampered", &sig, &kp.public_key_bytes()).unwrap());
    }

    #[test]
    fn key_file_roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.key");
        let kp = KeyPair::generate();
        key_file::write(&path, &kp).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o400);
        }

        let loaded = key_file::read(&path).unwrap();
        assert_eq!(loaded.public_key_bytes(), kp.public_key_bytes());
    }

    #[test]
    fn key_file_rejects_wrong_key_type_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.key");
        std::fs::write(&path, [0x08, 0x99, 0x12, 2, 0, 0]).unwrap();
        assert!(key_file::read(&path).is_err());
    }
}
