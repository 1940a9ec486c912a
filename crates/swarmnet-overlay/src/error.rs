use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("dht error: {0}")]
    Dht(String),

    #[error("reachability probe failed for {0}")]
    Unreachable(String),

    #[error("inference pipe error: {0}")]
    InferencePipe(String),

    #[error("record signature invalid")]
    InvalidSignature,
}

pub type Result<T> = std::result::Result<T, OverlayError>;
