//! C6 Attestation Equivalence (§4.6): the deterministic "should I attest
//! this vector?" predicate with three-tier fallback.

use swarmnet_core::{IncentivesEntry, IncentivesVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestDecision {
    Attest,
    DoNotAttest,
}

/// The attestor's view of the chain needed to evaluate rule 4: the previous
/// epoch's validator submission, if it was ratified, plus the threshold at
/// which the chain itself requires ratification.
pub struct PreviousRatifiedSubmission {
    pub vector: Vec<IncentivesEntry>,
    pub attestation_bps: u32,
}

/// Evaluates §4.6 rules 1-5 in order. `previous_epoch_data` is this node's
/// own `M` from the previous epoch (`None` on first epoch after restart).
/// `ratification_threshold_bps` is the configurable 87.5% super-majority.
pub fn should_attest(
    validator_vector: &IncentivesVector,
    my_vector: &IncentivesVector,
    previous_epoch_data: Option<&IncentivesVector>,
    previous_ratified: Option<&PreviousRatifiedSubmission>,
    ratification_threshold_bps: u32,
) -> AttestDecision {
    // Rule 1: both empty.
    if validator_vector.is_empty() && my_vector.is_empty() {
        return AttestDecision::Attest;
    }

    // Rule 2: exact equality (sorted-vector element-wise comparison, §9).
    if validator_vector == my_vector {
        return AttestDecision::Attest;
    }

    let diff = validator_vector.symmetric_difference(my_vector);

    // Rule 3: disagreement tolerated if confined to peers present last epoch.
    if let Some(previous) = previous_epoch_data {
        if diff.iter().all(|entry| previous.0.contains(entry)) {
            return AttestDecision::Attest;
        }
        return AttestDecision::DoNotAttest;
    }

    // Rule 4: no local history — fall back to the last ratified submission.
    if let Some(previous_ratified) = previous_ratified {
        if previous_ratified.attestation_bps >= ratification_threshold_bps
            && diff.iter().all(|entry| previous_ratified.vector.contains(entry))
        {
            return AttestDecision::Attest;
        }
    }

    // Rule 5: default.
    AttestDecision::DoNotAttest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(b: u8, score: u128) -> IncentivesEntry {
        IncentivesEntry { peer_id_bytes: [b; 32], score }
    }

    fn vec_of(entries: Vec<IncentivesEntry>) -> IncentivesVector {
        IncentivesVector::from_unsorted(entries)
    }

    #[test]
    fn s1_validator_and_attestor_agree() {
        let v = vec_of(vec![entry(1, 100), entry(2, 200)]);
        let m = vec_of(vec![entry(2, 200), entry(1, 100)]);
        assert_eq!(should_attest(&v, &m, None, None, 8_750), AttestDecision::Attest);
    }

    #[test]
    fn s2_disagreement_within_previous_epoch_tolerance() {
        let validator = vec_of(vec![entry(1, 100), entry(2, 200)]);
        let mine = vec_of(vec![entry(2, 200)]);
        let previous = vec_of(vec![entry(1, 100), entry(2, 200)]);
        assert_eq!(
            should_attest(&validator, &mine, Some(&previous), None, 8_750),
            AttestDecision::Attest
        );
    }

    #[test]
    fn s2_next_epoch_without_tolerance_rejects() {
        let validator = vec_of(vec![entry(1, 100), entry(2, 200)]);
        let mine = vec_of(vec![entry(2, 200)]);
        // previous_epoch_data no longer contains peer 1.
        let previous = vec_of(vec![entry(2, 200)]);
        assert_eq!(
            should_attest(&validator, &mine, Some(&previous), None, 8_750),
            AttestDecision::DoNotAttest
        );
    }

    #[test]
    fn s3_unhealthy_subnet_both_empty() {
        let empty = IncentivesVector::default();
        assert_eq!(should_attest(&empty, &empty, None, None, 8_750), AttestDecision::Attest);
    }

    #[test]
    fn rule4_falls_back_to_ratified_previous_submission() {
        let validator = vec_of(vec![entry(1, 100), entry(2, 200)]);
        let mine = vec_of(vec![entry(2, 200)]);
        let ratified = PreviousRatifiedSubmission {
            vector: vec![entry(1, 100), entry(2, 200)],
            attestation_bps: 9_000,
        };
        assert_eq!(
            should_attest(&validator, &mine, None, Some(&ratified), 8_750),
            AttestDecision::Attest
        );
    }

    #[test]
    fn rule4_rejects_if_ratification_below_threshold() {
        let validator = vec_of(vec![entry(1, 100), entry(2, 200)]);
        let mine = vec_of(vec![entry(2, 200)]);
        let ratified = PreviousRatifiedSubmission {
            vector: vec![entry(1, 100), entry(2, 200)],
            attestation_bps: 5_000,
        };
        assert_eq!(
            should_attest(&validator, &mine, None, Some(&ratified), 8_750),
            AttestDecision::DoNotAttest
        );
    }

    #[test]
    fn no_history_and_no_ratified_submission_rejects() {
        let validator = vec_of(vec![entry(1, 100)]);
        let mine = vec_of(vec![entry(2, 200)]);
        assert_eq!(should_attest(&validator, &mine, None, None, 8_750), AttestDecision::DoNotAttest);
    }
}
