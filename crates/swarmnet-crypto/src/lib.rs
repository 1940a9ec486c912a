//! Node identity and signing primitives: Ed25519 keypairs, the on-disk
//! peer identity key file, SS58 address formatting, and the hash functions
//! used to derive DHT keys and order incentives vectors.

pub mod error;
pub mod hash;
pub mod identity;
pub mod signature;
pub mod ss58;

pub use error::{CryptoError, Result};
pub use hash::{blake3_hash, sha256, Hash};
pub use identity::derive_peer_id;
pub use signature::{key_file, verify_signature, KeyPair, KeyType};
