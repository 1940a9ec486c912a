use thiserror::Error;

#[derive(Error, Debug)]
pub enum IncentivesError {
    #[error("no server rows to score")]
    EmptyView,

    #[error("rps sample malformed: {0}")]
    MalformedSample(String),
}

pub type Result<T> = std::result::Result<T, IncentivesError>;
