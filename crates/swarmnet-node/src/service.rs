//! Wires the Chain Gateway, dev overlay/inference adapters, and the Epoch
//! Loop together into the single logical control thread the node runs
//! (§5: "Single logical control thread per node runs the Epoch Loop").

use crate::config::Config;
use crate::dev_adapters::{AlwaysReachableProbe, FixedLatencyEndpoint, InMemoryDht};
use crate::epoch_loop::{EpochLoop, EpochLoopConfig, LoopState, NodeIdentity};
use crate::shutdown::ShutdownHandler;
use anyhow::Result;
use swarmnet_chain::ChainGateway;
use swarmnet_core::{Coldkey, Ed25519PublicKey, PeerId};
use swarmnet_crypto::{key_file, ss58, KeyPair};
use tracing::info;

/// Node service that owns every component the epoch loop borrows.
pub struct NodeService {
    config: Config,
    chain: ChainGateway,
    dht: InMemoryDht,
    probe: AlwaysReachableProbe,
    endpoint: FixedLatencyEndpoint,
    coldkey: Coldkey,
    public_key: Ed25519PublicKey,
    peer_id: PeerId,
    shutdown: ShutdownHandler,
}

impl NodeService {
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing swarm node v{}", env!("CARGO_PKG_VERSION"));
        config.validate()?;

        let keypair = load_or_generate_identity(&config.node.key_file_path)?;
        let public_key = keypair.public_key_bytes();
        let peer_id = swarmnet_crypto::derive_peer_id(&public_key)?;
        info!(coldkey = %ss58::encode(&public_key), %peer_id, "node identity loaded");

        Ok(Self {
            chain: ChainGateway::new(config.chain.rpc_url.clone()),
            dht: InMemoryDht::new(),
            probe: AlwaysReachableProbe,
            endpoint: FixedLatencyEndpoint::default(),
            coldkey: public_key,
            public_key,
            peer_id,
            shutdown: ShutdownHandler::new(),
            config,
        })
    }

    pub fn shutdown_handler(&self) -> &ShutdownHandler {
        &self.shutdown
    }

    /// Runs the Epoch Loop to completion (i.e. until `Stopped`).
    pub async fn run(&self) -> LoopState {
        let identity = NodeIdentity { coldkey: self.coldkey, public_key: self.public_key, peer_id: self.peer_id };
        let loop_config = EpochLoopConfig {
            subnet_path: self.config.node.subnet_path.clone(),
            dht_prefix: self.config.overlay.dht_prefix.clone(),
            num_blocks: self.config.node.num_blocks,
            ratification_threshold_bps: self.config.node.ratification_threshold_bps,
            bootstrap_peers: parse_bootstrap_peers(&self.config.overlay.bootstrap_peers),
            rps_weighted_scoring: self.config.node.rps_weighted_scoring,
        };

        let mut epoch_loop =
            EpochLoop::new(self.chain.clone(), &self.dht, &self.probe, &self.endpoint, identity, loop_config);
        epoch_loop.run(self.shutdown.subscribe()).await
    }
}

fn load_or_generate_identity(path: &std::path::Path) -> Result<KeyPair> {
    if path.exists() {
        return Ok(key_file::read(path)?);
    }
    let keypair = KeyPair::generate();
    key_file::write(path, &keypair)?;
    info!(path = %path.display(), "generated new node identity key file");
    Ok(keypair)
}

/// Bootstrap peers are configured as multiaddrs (e.g.
/// `/ip4/.../tcp/.../p2p/<peer-id>`); only the trailing peer-id matters to
/// the Overlay View's reachability bypass (§4.2 step 3).
fn parse_bootstrap_peers(multiaddrs: &[String]) -> Vec<PeerId> {
    multiaddrs
        .iter()
        .filter_map(|addr| addr.rsplit('/').next())
        .filter_map(|tail| tail.parse::<PeerId>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_peer_id_suffix_from_multiaddr() {
        let peer_id = PeerId::random();
        let addr = format!("/ip4/127.0.0.1/tcp/4001/p2p/{peer_id}");
        let parsed = parse_bootstrap_peers(&[addr]);
        assert_eq!(parsed, vec![peer_id]);
    }

    #[test]
    fn drops_unparseable_multiaddrs() {
        assert!(parse_bootstrap_peers(&["not-a-multiaddr".to_string()]).is_empty());
    }

    #[tokio::test]
    async fn node_service_generates_identity_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.node.key_file_path = dir.path().join("node.key");

        let service = NodeService::new(config).await.unwrap();
        assert!(service.coldkey != [0u8; 32]);
    }
}
