pub mod constants;
pub mod error;
pub mod incentives;
pub mod overlay;
pub mod rps;
pub mod subnet;
pub mod types;

pub use error::{CoreError, Result};
pub use incentives::{peer_id_bytes, IncentivesEntry, IncentivesVector};
pub use overlay::{HealthReport, HealthState, ModuleState, ServerInfo, ServerRow};
pub use rps::RpsSample;
pub use subnet::{Classification, SubnetDescriptor, SubnetNodeRecord};
pub use types::{BlockNumber, Coldkey, Ed25519PublicKey, Epoch, Hotkey, PeerId, Span, SubnetId};
