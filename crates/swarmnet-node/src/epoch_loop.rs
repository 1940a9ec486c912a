//! C5 Epoch Loop (§4.5): the per-node state machine that ties the Chain
//! Gateway, Overlay View, RPS Probe, Incentives Engine, and Attestation
//! Equivalence together into one reproducible per-epoch decision.

use crate::shutdown::ShutdownReceiver;
use swarmnet_chain::ChainGateway;
use swarmnet_core::constants::{block_duration, BLOCK_SECS, MAX_ATTEST_CHECKS};
use swarmnet_core::{BlockNumber, Coldkey, Ed25519PublicKey, Epoch, IncentivesVector, PeerId, SubnetId};
use swarmnet_incentives::{
    aggregate_rps_samples, build_vector_block_rps_weighted, build_vector_block_weight, should_attest,
    AttestDecision, ScoringConfig,
};
use swarmnet_overlay::{
    owner_subkey, rps_key, DhtHandle, InferenceEndpoint, OverlayView, ReachabilityProbe, RpsProbe, RpsProbeConfig,
};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Booting,
    WaitingForActivation,
    Eligible,
    Running,
    Stopped,
}

/// §3 "Epoch cursor": the Epoch Loop's exclusive, non-persistent state.
#[derive(Debug, Clone, Default)]
pub struct EpochCursor {
    pub last_validated_or_attested_epoch: Option<Epoch>,
    pub previous_epoch_data: Option<IncentivesVector>,
    pub subnet_id: Option<SubnetId>,
    pub activated_at: Option<BlockNumber>,
    pub subnet_accepting_consensus: bool,
    pub node_is_eligible: bool,
    pub module_container_healthy: bool,
}

pub struct NodeIdentity {
    pub coldkey: Coldkey,
    pub public_key: Ed25519PublicKey,
    pub peer_id: PeerId,
}

pub struct EpochLoopConfig {
    pub subnet_path: String,
    pub dht_prefix: String,
    pub num_blocks: u32,
    pub ratification_threshold_bps: u32,
    pub bootstrap_peers: Vec<PeerId>,
    pub rps_weighted_scoring: bool,
}

/// Reason the attest sub-loop exited (§4.5.c), surfaced for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttestOutcome {
    Attested,
    Waiting,
    ShouldNotAttest,
    AttestFailed,
    ValidatorNeverSubmitted,
    Demoted,
}

pub struct EpochLoop<'a, D: DhtHandle, R: ReachabilityProbe, E: InferenceEndpoint> {
    chain: ChainGateway,
    dht: &'a D,
    probe: &'a R,
    endpoint: &'a E,
    identity: NodeIdentity,
    config: EpochLoopConfig,
    cursor: EpochCursor,
    state: LoopState,
}

impl<'a, D: DhtHandle, R: ReachabilityProbe, E: InferenceEndpoint> EpochLoop<'a, D, R, E> {
    pub fn new(
        chain: ChainGateway,
        dht: &'a D,
        probe: &'a R,
        endpoint: &'a E,
        identity: NodeIdentity,
        config: EpochLoopConfig,
    ) -> Self {
        Self { chain, dht, probe, endpoint, identity, config, cursor: EpochCursor::default(), state: LoopState::Booting }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn cursor(&self) -> &EpochCursor {
        &self.cursor
    }

    /// Drives the state machine until it reaches `Stopped`, checking the
    /// cooperative shutdown flag at every block boundary (§5).
    pub async fn run(&mut self, mut shutdown: ShutdownReceiver) -> LoopState {
        loop {
            if shutdown.try_recv().is_ok() {
                info!("shutdown signal received, stopping epoch loop");
                self.state = LoopState::Stopped;
            }
            match self.state {
                LoopState::Booting => self.step_booting().await,
                LoopState::WaitingForActivation => self.step_waiting_for_activation().await,
                LoopState::Eligible => self.step_eligible().await,
                LoopState::Running => self.step_running().await,
                LoopState::Stopped => return LoopState::Stopped,
            }
        }
    }

    async fn step_booting(&mut self) {
        // Model download, tokenizer setup, and server bring-up are out of
        // scope (§1); the module container is assumed healthy once this
        // loop has been constructed around a live inference endpoint.
        self.cursor.module_container_healthy = true;
        self.state = LoopState::WaitingForActivation;
    }

    /// §4.5.a. Activation fairness (§8): node `i` at position `n` gets
    /// window `[activation_block + 2·BLOCK_SECS·(n−1), activation_block +
    /// 2·BLOCK_SECS·n)`, so windows never overlap between nodes.
    #[instrument(skip(self))]
    async fn step_waiting_for_activation(&mut self) {
        let Some(subnet_id) = self.chain.get_subnet_id_by_path(&self.config.subnet_path).await else {
            warn!(path = %self.config.subnet_path, "subnet not found, fatal");
            self.state = LoopState::Stopped;
            return;
        };
        self.cursor.subnet_id = Some(subnet_id);

        let Some(descriptor) = self.chain.get_subnet_data(subnet_id).await else {
            warn!(subnet_id, "subnet data unavailable, fatal");
            self.state = LoopState::Stopped;
            return;
        };

        if descriptor.is_activated() {
            self.cursor.activated_at = Some(descriptor.activated_block);
            self.state = LoopState::Eligible;
            return;
        }

        let submittable = self.chain.get_submittable_nodes(subnet_id).await;
        let Some(position) = submittable.iter().position(|n| n.coldkey == self.identity.coldkey) else {
            tokio::time::sleep(block_duration()).await;
            return;
        };
        let n = (position + 1) as u64;

        let Some(current_block) = self.chain.get_block_number().await else {
            tokio::time::sleep(block_duration()).await;
            return;
        };

        let activation_block = descriptor.activation_block();
        let window_width = 2 * BLOCK_SECS;
        let window_start = activation_block + window_width * (n - 1);
        let window_end = activation_block + window_width * n;

        if current_block < window_start {
            tokio::time::sleep(block_duration()).await;
            return;
        }

        if current_block < window_end {
            let Some(recheck) = self.chain.get_subnet_data(subnet_id).await else {
                tokio::time::sleep(block_duration()).await;
                return;
            };
            if recheck.is_activated() {
                self.cursor.activated_at = Some(recheck.activated_block);
                self.state = LoopState::Eligible;
                return;
            }
            match self.chain.activate_subnet(subnet_id).await {
                Ok(receipt) if receipt.activated() => {
                    info!(subnet_id, block = current_block, "activated subnet");
                    self.cursor.activated_at = Some(current_block);
                    self.state = LoopState::Eligible;
                }
                _ => tokio::time::sleep(block_duration()).await,
            }
            return;
        }

        warn!(subnet_id, n, "activation window passed without activation by this node, retrying");
        tokio::time::sleep(block_duration()).await;
    }

    #[instrument(skip(self))]
    async fn step_eligible(&mut self) {
        let Some(subnet_id) = self.cursor.subnet_id else {
            self.state = LoopState::Stopped;
            return;
        };

        let submittable = self.chain.get_submittable_nodes(subnet_id).await;
        if submittable.iter().any(|n| n.coldkey == self.identity.coldkey) {
            self.cursor.node_is_eligible = true;
            self.state = LoopState::Running;
            return;
        }

        let (Some(current_block), Some(epoch_length)) =
            (self.chain.get_block_number().await, self.chain.get_epoch_length().await)
        else {
            tokio::time::sleep(block_duration()).await;
            return;
        };

        let included = self.chain.get_included_nodes(subnet_id).await;
        if included.iter().any(|n| n.coldkey == self.identity.coldkey) {
            let epoch = current_block / epoch_length;
            let vector = self.build_incentives_vector(subnet_id, epoch).await;
            self.cursor.previous_epoch_data = Some(vector);
        }

        self.sleep_until_next_epoch(current_block, epoch_length).await;
    }

    /// §4.5.b Per-epoch dispatch.
    #[instrument(skip(self))]
    async fn step_running(&mut self) {
        let Some(subnet_id) = self.cursor.subnet_id else {
            self.state = LoopState::Stopped;
            return;
        };
        let Some(current_block) = self.chain.get_block_number().await else {
            tokio::time::sleep(block_duration()).await;
            return;
        };
        let Some(epoch_length) = self.chain.get_epoch_length().await else {
            tokio::time::sleep(block_duration()).await;
            return;
        };
        let epoch = current_block / epoch_length;

        if let Some(last) = self.cursor.last_validated_or_attested_epoch {
            if epoch <= last && self.cursor.subnet_accepting_consensus {
                self.sleep_until_next_epoch(current_block, epoch_length).await;
                return;
            }
        }

        let Some(validator) = self.chain.get_rewards_validator(subnet_id, epoch).await else {
            tokio::time::sleep(block_duration()).await;
            return;
        };

        if validator == self.identity.coldkey {
            self.run_as_validator(subnet_id, epoch).await;
            return;
        }

        match self.attest_sub_loop(subnet_id, epoch).await {
            AttestOutcome::Attested => {
                self.cursor.last_validated_or_attested_epoch = Some(epoch);
                self.cursor.subnet_accepting_consensus = true;
            }
            AttestOutcome::Demoted => {
                warn!(epoch, "no longer submittable, shutting down");
                self.state = LoopState::Stopped;
            }
            AttestOutcome::ValidatorNeverSubmitted
            | AttestOutcome::Waiting
            | AttestOutcome::ShouldNotAttest
            | AttestOutcome::AttestFailed => {
                self.sleep_until_next_epoch(current_block, epoch_length).await;
            }
        }
    }

    async fn run_as_validator(&mut self, subnet_id: SubnetId, epoch: Epoch) {
        if self.chain.get_rewards_submission(subnet_id, epoch).await.is_some() {
            self.cursor.last_validated_or_attested_epoch = Some(epoch);
            self.cursor.subnet_accepting_consensus = true;
            return;
        }

        let vector = self.build_incentives_vector(subnet_id, epoch).await;
        match self.chain.submit_validate(subnet_id, &vector).await {
            Ok(receipt) if receipt.is_success => {
                info!(epoch, entries = vector.len(), "submitted validator vector");
                self.cursor.last_validated_or_attested_epoch = Some(epoch);
                self.cursor.subnet_accepting_consensus = true;
                self.cursor.previous_epoch_data = Some(vector);
            }
            _ => {
                warn!(epoch, "validate submission failed, retrying within epoch");
                tokio::time::sleep(block_duration()).await;
            }
        }
    }

    /// §4.5.c, bounded by `MAX_ATTEST_CHECKS` and end-of-epoch.
    async fn attest_sub_loop(&mut self, subnet_id: SubnetId, epoch: Epoch) -> AttestOutcome {
        for _ in 0..MAX_ATTEST_CHECKS {
            tokio::time::sleep(block_duration()).await;

            let (Some(current_block), Some(epoch_length)) =
                (self.chain.get_block_number().await, self.chain.get_epoch_length().await)
            else {
                continue;
            };
            if current_block / epoch_length != epoch {
                warn!(epoch, "validator never submitted before epoch advanced");
                return AttestOutcome::ValidatorNeverSubmitted;
            }

            let Some(submission) = self.chain.get_rewards_submission(subnet_id, epoch).await else {
                continue;
            };
            if submission.attested_by(&self.identity.coldkey) {
                return AttestOutcome::Attested;
            }

            let validator_vector = IncentivesVector::from_unsorted(submission.data.clone());
            let my_vector = self.build_incentives_vector(subnet_id, epoch).await;

            if !validator_vector.contains_peer(&self.identity.peer_id) {
                let submittable = self.chain.get_submittable_nodes(subnet_id).await;
                let still_submittable = submittable.iter().any(|n| n.coldkey == self.identity.coldkey);
                if !still_submittable {
                    return AttestOutcome::Demoted;
                }
            }

            // Rule 4 (no local history) needs the previous epoch's ratified
            // submission from the chain; this loop does not yet fetch that
            // reward-result history, so rule 4 never fires here and falls
            // through to rule 5 (do not attest) when previous_epoch_data is
            // unset — conservative but never produces a false attestation.
            let decision = should_attest(
                &validator_vector,
                &my_vector,
                self.cursor.previous_epoch_data.as_ref(),
                None,
                self.config.ratification_threshold_bps,
            );
            self.cursor.previous_epoch_data = Some(my_vector);

            match decision {
                AttestDecision::Attest => match self.chain.submit_attest(subnet_id).await {
                    Ok(receipt) if receipt.is_success => return AttestOutcome::Attested,
                    _ => continue,
                },
                AttestDecision::DoNotAttest => continue,
            }
        }
        AttestOutcome::Waiting
    }

    async fn sleep_until_next_epoch(&self, current_block: BlockNumber, epoch_length: u64) {
        let remainder = current_block % epoch_length;
        let blocks_left = (epoch_length - remainder).max(1);
        tokio::time::sleep(block_duration() * blocks_left as u32).await;
    }

    /// C4: combines the Overlay View and RPS Probe into a scored vector
    /// (§4.4). In block+RPS-weighted mode, also publishes this node's raw
    /// samples to the DHT and reads back the merged cross-writer set.
    async fn build_incentives_vector(&self, subnet_id: SubnetId, epoch: Epoch) -> IncentivesVector {
        let included = self.chain.get_included_nodes(subnet_id).await;
        let view = OverlayView::new(self.dht, self.probe, &self.config.bootstrap_peers);
        let rows = view.snapshot(&self.config.dht_prefix, self.config.num_blocks, &included).await;

        if !self.config.rps_weighted_scoring {
            return build_vector_block_weight(&rows, self.config.num_blocks, &ScoringConfig::default());
        }

        let probe = RpsProbe::new(self.endpoint, RpsProbeConfig::default());
        let mut my_samples = Vec::new();
        for row in &rows {
            if let Some(sample) = probe.probe(row, self.config.num_blocks).await {
                my_samples.push(sample);
            }
        }

        let key = rps_key(epoch);
        let subkey = owner_subkey(&self.identity.public_key);
        let epoch_length = self.chain.get_epoch_length().await.unwrap_or(100);
        self.dht.put(&key, &subkey, &my_samples, block_duration() * epoch_length as u32).await;

        let merged: Vec<(String, Vec<swarmnet_core::RpsSample>)> = self.dht.get_all(&key).await;
        let all_samples: Vec<swarmnet_core::RpsSample> = merged.into_iter().flat_map(|(_, v)| v).collect();
        let rps_by_peer = aggregate_rps_samples(all_samples, &rows);
        build_vector_block_rps_weighted(&rows, &rps_by_peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct EmptyDht;

    #[async_trait]
    impl DhtHandle for EmptyDht {
        async fn get<T: serde::de::DeserializeOwned + Send>(&self, _key: &str) -> Option<T> {
            None
        }
        async fn get_all<T: serde::de::DeserializeOwned + Send>(&self, _key: &str) -> Vec<(String, T)> {
            Vec::new()
        }
        async fn put<T: serde::Serialize + Send + Sync>(
            &self,
            _key: &str,
            _subkey: &str,
            _value: &T,
            _ttl: Duration,
        ) {
        }
    }

    struct AlwaysReachable;

    #[async_trait]
    impl ReachabilityProbe for AlwaysReachable {
        async fn is_reachable(&self, _peer: &PeerId) -> bool {
            true
        }
    }

    struct NoopEndpoint;

    #[async_trait]
    impl InferenceEndpoint for NoopEndpoint {
        async fn timed_step(&self, _peer: &swarmnet_core::ServerRow) -> Result<Duration, String> {
            Ok(Duration::from_millis(1))
        }
    }

    fn config() -> EpochLoopConfig {
        EpochLoopConfig {
            subnet_path: "swarm/7b".into(),
            dht_prefix: "swarm.7b.layer".into(),
            num_blocks: 32,
            ratification_threshold_bps: 8_750,
            bootstrap_peers: vec![],
            rps_weighted_scoring: false,
        }
    }

    fn identity() -> NodeIdentity {
        NodeIdentity { coldkey: [1u8; 32], public_key: [2u8; 32], peer_id: PeerId::random() }
    }

    #[test]
    fn fresh_loop_starts_booting() {
        let dht = EmptyDht;
        let probe = AlwaysReachable;
        let endpoint = NoopEndpoint;
        let chain = ChainGateway::new("http://localhost:9944");
        let loop_ = EpochLoop::new(chain, &dht, &probe, &endpoint, identity(), config());
        assert_eq!(loop_.state(), LoopState::Booting);
    }

    #[tokio::test]
    async fn booting_transitions_to_waiting_for_activation() {
        let dht = EmptyDht;
        let probe = AlwaysReachable;
        let endpoint = NoopEndpoint;
        let chain = ChainGateway::new("http://localhost:9944");
        let mut loop_ = EpochLoop::new(chain, &dht, &probe, &endpoint, identity(), config());
        loop_.step_booting().await;
        assert_eq!(loop_.state(), LoopState::WaitingForActivation);
        assert!(loop_.cursor().module_container_healthy);
    }
}
