use thiserror::Error;

use crate::zone::ZoneId;

/// Failure of a single sensor or actuator call for one zone.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("sensor {line} unavailable: {reason}")]
    SensorUnavailable { line: String, reason: String },
    #[error("relay line {line} write failed: {reason}")]
    ActuatorWriteFailed { line: u8, reason: String },
    #[error("door line {line} read failed: {reason}")]
    DoorReadFailed { line: u8, reason: String },
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

/// Rejection of a target update. No zone is modified when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown zone id {zone_id}")]
    UnknownZone { zone_id: ZoneId },
    #[error("target {value} for zone {zone_id} is outside {min}..={max}")]
    OutOfRange {
        zone_id: ZoneId,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("zone id {zone_id} appears more than once")]
    DuplicateZone { zone_id: ZoneId },
    #[error("malformed request: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownZone { .. } => "unknown_zone",
            Self::OutOfRange { .. } => "out_of_range",
            Self::DuplicateZone { .. } => "duplicate_zone",
            Self::Malformed(_) => "malformed",
        }
    }

    pub fn zone_id(&self) -> Option<ZoneId> {
        match self {
            Self::UnknownZone { zone_id }
            | Self::OutOfRange { zone_id, .. }
            | Self::DuplicateZone { zone_id } => Some(*zone_id),
            Self::Malformed(_) => None,
        }
    }
}

/// Startup configuration problems. Any of these prevents the controller from starting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("configuration could not be parsed: {0}")]
    Parse(String),
    #[error("at least one zone must be configured")]
    NoZones,
    #[error("zone {index} has an empty name")]
    EmptyName { index: usize },
    #[error("sensor id {0:?} is assigned to more than one zone")]
    DuplicateSensor(String),
    #[error("relay line {0} is assigned to more than one zone")]
    DuplicateRelayLine(u8),
    #[error("door line {0} is assigned to more than one zone")]
    DuplicateDoorLine(u8),
    #[error("line {0} is used both as a relay output and a door input")]
    LineConflict(u8),
    #[error("cycle period must be positive")]
    NonPositiveCyclePeriod,
    #[error("io timeout must be positive")]
    NonPositiveIoTimeout,
    #[error("hysteresis margin must be a positive number, got {0}")]
    InvalidHysteresis(f32),
    #[error("target bounds {min}..={max} are invalid")]
    InvalidBounds { min: f32, max: f32 },
    #[error("initial target {value} of zone {index} is outside {min}..={max}")]
    InitialTargetOutOfRange {
        index: usize,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("listen address {0:?} is not a valid socket address")]
    InvalidListenAddr(String),
}
