//! C2 Overlay View and C3 RPS Probe (§4.2, §4.3): the overlay-facing half
//! of the incentives core. The DHT and the inference pipe are external
//! collaborators, so this crate only defines the narrow traits it needs
//! from them (`dht::DhtHandle`, `dht::ReachabilityProbe`,
//! `rps_probe::InferenceEndpoint`) plus the logic layered on top.

pub mod dht;
pub mod error;
pub mod overlay_view;
pub mod rps_probe;

pub use dht::{module_uid, owner_subkey, rps_key, DhtHandle, ReachabilityProbe};
pub use error::{OverlayError, Result};
pub use overlay_view::{ModuleInfoEntry, OverlayView};
pub use rps_probe::{InferenceEndpoint, RpsProbe, RpsProbeConfig};
