//! C1 Chain Gateway: typed, retry-wrapped access to the blockchain (§4.1).
//! Every read is retried with exponential backoff and degrades to `None`
//! rather than propagating an error; state-changing extrinsics are
//! submitted once per call and return a `Receipt`.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::ChainGateway;
pub use error::{ChainError, Result};
pub use types::{Attestation, ChainConstants, RatifiedSubmission, Receipt, RewardsSubmission};
