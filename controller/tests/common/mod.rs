//! Scriptable sensor/relay hardware for controller tests.
//!
//! Every sensor reading, door level and relay failure is set by the test;
//! successful relay writes are recorded in order.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;

use thermaguard_common::{ControllerConfig, GatewayError, TargetBounds, ZoneConfig};
use thermaguard_controller::{ActuatorGateway, ManualClock, SensorGateway, ThermostatController};

pub const RELAY_LINES: [u8; 3] = [17, 18, 19];
pub const DOOR_LINES: [u8; 3] = [23, 24, 25];

pub fn sensor_id(zone: usize) -> String {
    format!("28-test-{zone}")
}

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        zones: (0..3)
            .map(|zone| ZoneConfig {
                name: format!("vak {}", zone + 1),
                target_c: 8.0,
                sensor_id: sensor_id(zone),
                relay_line: RELAY_LINES[zone],
                door_line: DOOR_LINES[zone],
                hysteresis_c: None,
            })
            .collect(),
        hysteresis_c: 1.0,
        target_bounds: TargetBounds::default(),
        cycle_period_ms: 10,
        io_timeout_ms: 200,
        listen_addr: "127.0.0.1:0".to_string(),
    }
}

#[derive(Default)]
pub struct MockPlant {
    temperatures: Mutex<HashMap<String, Option<f32>>>,
    hanging_sensors: Mutex<HashSet<String>>,
    doors: Mutex<HashMap<u8, Option<bool>>>,
    failing_relays: Mutex<HashSet<u8>>,
    relay_delays: Mutex<HashMap<u8, Duration>>,
    relay_writes: Mutex<Vec<(u8, bool)>>,
}

impl MockPlant {
    /// Every zone reads 8.5C (inside the default dead band) with its door closed.
    pub fn new() -> Self {
        let plant = Self::default();
        for zone in 0..3 {
            plant.set_temperature(zone, 8.5);
            plant.set_door(zone, false);
        }
        plant
    }

    pub fn set_temperature(&self, zone: usize, value: f32) {
        self.temperatures
            .lock()
            .unwrap()
            .insert(sensor_id(zone), Some(value));
    }

    pub fn fail_sensor(&self, zone: usize) {
        self.temperatures.lock().unwrap().insert(sensor_id(zone), None);
    }

    pub fn hang_sensor(&self, zone: usize) {
        self.hanging_sensors.lock().unwrap().insert(sensor_id(zone));
    }

    pub fn set_door(&self, zone: usize, open: bool) {
        self.doors
            .lock()
            .unwrap()
            .insert(DOOR_LINES[zone], Some(open));
    }

    pub fn fail_door(&self, zone: usize) {
        self.doors.lock().unwrap().insert(DOOR_LINES[zone], None);
    }

    pub fn fail_relay(&self, zone: usize, failing: bool) {
        let mut relays = self.failing_relays.lock().unwrap();
        if failing {
            relays.insert(RELAY_LINES[zone]);
        } else {
            relays.remove(&RELAY_LINES[zone]);
        }
    }

    pub fn slow_relay(&self, zone: usize, delay: Duration) {
        self.relay_delays
            .lock()
            .unwrap()
            .insert(RELAY_LINES[zone], delay);
    }

    pub fn relay_writes(&self, zone: usize) -> Vec<bool> {
        self.relay_writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(line, _)| *line == RELAY_LINES[zone])
            .map(|(_, engaged)| *engaged)
            .collect()
    }
}

#[async_trait]
impl SensorGateway for MockPlant {
    async fn read_temperature(&self, sensor_id: &str) -> Result<f32, GatewayError> {
        let hanging = self.hanging_sensors.lock().unwrap().contains(sensor_id);
        if hanging {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        let value = self.temperatures.lock().unwrap().get(sensor_id).copied();
        match value {
            Some(Some(value)) => Ok(value),
            _ => Err(GatewayError::SensorUnavailable {
                line: sensor_id.to_string(),
                reason: "no response".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ActuatorGateway for MockPlant {
    async fn set_relay(&self, line: u8, engaged: bool) -> Result<(), GatewayError> {
        let delay = self.relay_delays.lock().unwrap().get(&line).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_relays.lock().unwrap().contains(&line) {
            return Err(GatewayError::ActuatorWriteFailed {
                line,
                reason: "gpio busy".to_string(),
            });
        }
        self.relay_writes.lock().unwrap().push((line, engaged));
        Ok(())
    }

    async fn read_door(&self, line: u8) -> Result<bool, GatewayError> {
        let level = self.doors.lock().unwrap().get(&line).copied().flatten();
        level.ok_or_else(|| GatewayError::DoorReadFailed {
            line,
            reason: "no response".to_string(),
        })
    }
}

pub fn build_controller(
    config: &ControllerConfig,
    plant: &Arc<MockPlant>,
    clock: &Arc<ManualClock>,
) -> Arc<ThermostatController> {
    Arc::new(
        ThermostatController::new(config, plant.clone(), plant.clone(), clock.clone())
            .expect("test config is valid"),
    )
}
