use async_trait::async_trait;
use tokio::sync::Mutex;

use thermaguard_common::{ControllerConfig, GatewayError};

/// Temperature sensor driver.
#[async_trait]
pub trait SensorGateway: Send + Sync {
    async fn read_temperature(&self, sensor_id: &str) -> Result<f32, GatewayError>;
}

/// Relay outputs and door-contact inputs.
#[async_trait]
pub trait ActuatorGateway: Send + Sync {
    async fn set_relay(&self, line: u8, engaged: bool) -> Result<(), GatewayError>;

    /// `true` when the door on this contact line is open.
    async fn read_door(&self, line: u8) -> Result<bool, GatewayError>;
}

const HEAT_RATE_C: f32 = 0.4;
const COOL_RATE_C: f32 = 0.25;
const DOOR_PERIOD_READS: u64 = 12;
const DOOR_OPEN_READS: u64 = 3;

#[derive(Debug)]
struct SimulatedZone {
    sensor_id: String,
    relay_line: u8,
    door_line: u8,
    temp_c: f32,
    relay_on: bool,
    door_reads: u64,
}

/// Stand-in for the one-wire sensors and GPIO lines when running off-target.
///
/// Each compartment warms while its relay is engaged and cools otherwise;
/// doors open for a few reads at a time, staggered per zone.
#[derive(Debug)]
pub struct SimulatedPlant {
    zones: Mutex<Vec<SimulatedZone>>,
}

impl SimulatedPlant {
    pub fn new(config: &ControllerConfig) -> Self {
        let zones = config
            .zones
            .iter()
            .enumerate()
            .map(|(index, zone)| SimulatedZone {
                sensor_id: zone.sensor_id.clone(),
                relay_line: zone.relay_line,
                door_line: zone.door_line,
                temp_c: zone.target_c + 2.0,
                relay_on: false,
                door_reads: index as u64 * (DOOR_PERIOD_READS / 3),
            })
            .collect();

        Self {
            zones: Mutex::new(zones),
        }
    }
}

#[async_trait]
impl SensorGateway for SimulatedPlant {
    async fn read_temperature(&self, sensor_id: &str) -> Result<f32, GatewayError> {
        let mut zones = self.zones.lock().await;
        let zone = zones
            .iter_mut()
            .find(|zone| zone.sensor_id == sensor_id)
            .ok_or_else(|| GatewayError::SensorUnavailable {
                line: sensor_id.to_string(),
                reason: "no such sensor".to_string(),
            })?;

        if zone.relay_on {
            zone.temp_c += HEAT_RATE_C;
        } else {
            zone.temp_c -= COOL_RATE_C;
        }
        Ok((zone.temp_c * 16.0).round() / 16.0)
    }
}

#[async_trait]
impl ActuatorGateway for SimulatedPlant {
    async fn set_relay(&self, line: u8, engaged: bool) -> Result<(), GatewayError> {
        let mut zones = self.zones.lock().await;
        let zone = zones
            .iter_mut()
            .find(|zone| zone.relay_line == line)
            .ok_or_else(|| GatewayError::ActuatorWriteFailed {
                line,
                reason: "line not configured as output".to_string(),
            })?;
        zone.relay_on = engaged;
        Ok(())
    }

    async fn read_door(&self, line: u8) -> Result<bool, GatewayError> {
        let mut zones = self.zones.lock().await;
        let zone = zones
            .iter_mut()
            .find(|zone| zone.door_line == line)
            .ok_or_else(|| GatewayError::DoorReadFailed {
                line,
                reason: "line not configured as input".to_string(),
            })?;
        zone.door_reads = zone.door_reads.wrapping_add(1);
        Ok(zone.door_reads % DOOR_PERIOD_READS < DOOR_OPEN_READS)
    }
}
