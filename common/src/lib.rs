pub mod config;
pub mod error;
pub mod presenter;
pub mod types;
pub mod zone;

pub use config::{ControllerConfig, TargetBounds, ZoneConfig};
pub use error::{ConfigError, GatewayError, ValidationError};
pub use presenter::StatusPresenter;
pub use types::{StatusPayload, TargetEntry, TargetsRequest, ZoneStatus};
pub use zone::{next_relay_state, Snapshot, ZoneEvent, ZoneId, ZoneState};
