use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("key file malformed: {0}")]
    KeyFileMalformed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ss58 decode error: {0}")]
    Ss58Decode(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
