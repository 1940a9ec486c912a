use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("span [{start}, {end}) is empty or exceeds {num_blocks} blocks")]
    InvalidSpan {
        start: u32,
        end: u32,
        num_blocks: u32,
    },

    #[error("classification cannot move backwards: {from:?} -> {to:?}")]
    ClassificationRegression { from: Classification, to: Classification },

    #[error("malformed rps sample: {0}")]
    MalformedRpsSample(String),

    #[error("scale codec error: {0}")]
    Codec(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

use crate::subnet::Classification;
