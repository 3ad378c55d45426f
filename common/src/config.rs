use std::{collections::HashSet, net::SocketAddr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneConfig {
    pub name: String,
    pub target_c: f32,
    /// One-wire sensor identifier, e.g. `28-0316a2795aff`.
    pub sensor_id: String,
    pub relay_line: u8,
    pub door_line: u8,
    /// Overrides [`ControllerConfig::hysteresis_c`] for this zone only.
    #[serde(default)]
    pub hysteresis_c: Option<f32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TargetBounds {
    pub min_c: f32,
    pub max_c: f32,
}

impl TargetBounds {
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && (self.min_c..=self.max_c).contains(&value)
    }
}

impl Default for TargetBounds {
    fn default() -> Self {
        Self {
            min_c: 0.0,
            max_c: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    pub zones: Vec<ZoneConfig>,
    pub hysteresis_c: f32,
    #[serde(default)]
    pub target_bounds: TargetBounds,
    pub cycle_period_ms: u64,
    pub io_timeout_ms: u64,
    pub listen_addr: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let zone = |n: u8, target_c: f32, relay_line: u8, door_line: u8| ZoneConfig {
            name: format!("vak {n}"),
            target_c,
            sensor_id: format!("28-00000000000{n}"),
            relay_line,
            door_line,
            hysteresis_c: None,
        };

        Self {
            zones: vec![zone(1, 7.0, 17, 23), zone(2, 8.0, 18, 24), zone(3, 9.0, 19, 25)],
            hysteresis_c: 1.0,
            target_bounds: TargetBounds::default(),
            cycle_period_ms: 5_000,
            io_timeout_ms: 1_000,
            listen_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

impl ControllerConfig {
    pub fn from_json(raw: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zones.is_empty() {
            return Err(ConfigError::NoZones);
        }
        if self.cycle_period_ms == 0 {
            return Err(ConfigError::NonPositiveCyclePeriod);
        }
        if self.io_timeout_ms == 0 {
            return Err(ConfigError::NonPositiveIoTimeout);
        }
        if !valid_margin(self.hysteresis_c) {
            return Err(ConfigError::InvalidHysteresis(self.hysteresis_c));
        }

        let TargetBounds { min_c, max_c } = self.target_bounds;
        if !min_c.is_finite() || !max_c.is_finite() || min_c > max_c {
            return Err(ConfigError::InvalidBounds {
                min: min_c,
                max: max_c,
            });
        }

        let mut sensors = HashSet::new();
        let mut relays = HashSet::new();
        let mut doors = HashSet::new();

        for (index, zone) in self.zones.iter().enumerate() {
            if zone.name.trim().is_empty() {
                return Err(ConfigError::EmptyName { index });
            }
            if !self.target_bounds.contains(zone.target_c) {
                return Err(ConfigError::InitialTargetOutOfRange {
                    index,
                    value: zone.target_c,
                    min: min_c,
                    max: max_c,
                });
            }
            if let Some(margin) = zone.hysteresis_c {
                if !valid_margin(margin) {
                    return Err(ConfigError::InvalidHysteresis(margin));
                }
            }
            if !sensors.insert(zone.sensor_id.as_str()) {
                return Err(ConfigError::DuplicateSensor(zone.sensor_id.clone()));
            }
            if !relays.insert(zone.relay_line) {
                return Err(ConfigError::DuplicateRelayLine(zone.relay_line));
            }
            if !doors.insert(zone.door_line) {
                return Err(ConfigError::DuplicateDoorLine(zone.door_line));
            }
        }

        if let Some(line) = relays.intersection(&doors).min() {
            return Err(ConfigError::LineConflict(*line));
        }

        self.listen_addr()?;
        Ok(())
    }

    pub fn margin_for(&self, zone: &ZoneConfig) -> f32 {
        zone.hysteresis_c.unwrap_or(self.hysteresis_c)
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(self.listen_addr.clone()))
    }
}

fn valid_margin(margin: f32) -> bool {
    margin.is_finite() && margin > 0.0
}
