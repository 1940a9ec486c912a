use thiserror::Error;

/// Errors the gateway can surface to a caller. Transient RPC failures are
/// *not* represented here — §4.1/§9 require the retry combinator to swallow
/// those and hand the caller `None`; only failures the loop must act on
/// reach this type.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(String),

    #[error("scale decode error: {0}")]
    Decode(String),

    #[error("chain returned malformed response: {0}")]
    MalformedResponse(String),

    #[error("fatal configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
