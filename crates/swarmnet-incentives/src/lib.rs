//! C4 Incentives Engine and C6 Attestation Equivalence (§4.4, §4.6).

pub mod equivalence;
pub mod error;
pub mod scoring;

pub use equivalence::{should_attest, AttestDecision, PreviousRatifiedSubmission};
pub use error::{IncentivesError, Result};
pub use scoring::{
    aggregate_rps_samples, build_vector_block_rps_weighted, build_vector_block_weight,
    block_weight_score, remove_outliers_adaptive, ScoringConfig,
};
