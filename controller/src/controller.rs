use std::{collections::HashSet, future::Future, sync::Arc, time::Duration};

use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use thermaguard_common::{
    ConfigError, ControllerConfig, GatewayError, Snapshot, TargetBounds, TargetEntry,
    ValidationError, ZoneEvent, ZoneState,
};

use crate::{
    clock::Clock,
    gateway::{ActuatorGateway, SensorGateway},
};

#[derive(Debug, Clone)]
struct ZoneLines {
    sensor_id: String,
    relay_line: u8,
    door_line: u8,
}

/// Outcome counters for one pass over all zones.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub zones: usize,
    pub sensor_faults: usize,
    pub actuator_faults: usize,
    pub door_faults: usize,
    pub relay_writes: usize,
}

/// Owns every [`ZoneState`] and is the only thing allowed to mutate them.
///
/// All zone records sit behind one mutex. Gateway I/O is always performed
/// with the mutex released, so a hanging sensor never blocks status reads
/// or target updates.
pub struct ThermostatController {
    zones: Mutex<Vec<ZoneState>>,
    lines: Vec<ZoneLines>,
    bounds: TargetBounds,
    io_timeout: Duration,
    sensors: Arc<dyn SensorGateway>,
    actuators: Arc<dyn ActuatorGateway>,
    clock: Arc<dyn Clock>,
}

impl ThermostatController {
    pub fn new(
        config: &ControllerConfig,
        sensors: Arc<dyn SensorGateway>,
        actuators: Arc<dyn ActuatorGateway>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let zones = config
            .zones
            .iter()
            .enumerate()
            .map(|(id, zone)| ZoneState::from_config(id, zone, config.margin_for(zone)))
            .collect();
        let lines = config
            .zones
            .iter()
            .map(|zone| ZoneLines {
                sensor_id: zone.sensor_id.clone(),
                relay_line: zone.relay_line,
                door_line: zone.door_line,
            })
            .collect();

        Ok(Self {
            zones: Mutex::new(zones),
            lines,
            bounds: config.target_bounds,
            io_timeout: config.io_timeout(),
            sensors,
            actuators,
            clock,
        })
    }

    pub fn zone_count(&self) -> usize {
        self.lines.len()
    }

    pub fn bounds(&self) -> TargetBounds {
        self.bounds
    }

    /// Read, decide and actuate every zone in index order. Failures are
    /// logged and counted per zone; the cycle itself never fails.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport {
            zones: self.lines.len(),
            ..CycleReport::default()
        };

        for index in 0..self.lines.len() {
            self.run_zone(index, &mut report).await;
        }

        report
    }

    async fn run_zone(&self, index: usize, report: &mut CycleReport) {
        let lines = &self.lines[index];

        let reading = self
            .guarded("sensor read", self.sensors.read_temperature(&lines.sensor_id))
            .await;
        if let Err(err) = &reading {
            report.sensor_faults += 1;
            warn!("zone {index} sensor {}: {err}", lines.sensor_id);
        }

        let door = self
            .guarded("door read", self.actuators.read_door(lines.door_line))
            .await;
        if let Err(err) = &door {
            report.door_faults += 1;
            warn!("zone {index} door {}: {err}", lines.door_line);
        }

        // Reading, door and relay decision land in one critical section.
        let command = {
            let mut zones = self.zones.lock().await;
            let now_ms = self.clock.now_ms();
            let zone = &mut zones[index];

            let command = match &reading {
                Ok(reading_c) => {
                    if let Some(event) = zone.apply_reading(*reading_c) {
                        log_event(zone, event);
                    }
                    zone.pending_relay_command()
                }
                Err(_) => {
                    zone.record_sensor_fault();
                    None
                }
            };
            if let Ok(open) = door {
                if let Some(event) = zone.observe_door(open, now_ms) {
                    log_event(zone, event);
                }
            }
            command
        };

        let Some(engaged) = command else {
            return;
        };
        match self
            .guarded("relay write", self.actuators.set_relay(lines.relay_line, engaged))
            .await
        {
            Ok(()) => {
                report.relay_writes += 1;
                self.zones.lock().await[index].mark_relay_applied(engaged);
            }
            Err(err) => {
                report.actuator_faults += 1;
                warn!("zone {index} relay {}: {err}", lines.relay_line);
            }
        }
    }

    /// Value copy of every zone, stamped with the time it was taken.
    pub async fn snapshot(&self) -> Snapshot {
        let zones = self.zones.lock().await;
        Snapshot {
            captured_at_ms: self.clock.now_ms(),
            zones: zones.clone(),
        }
    }

    /// Applies all targets or none of them.
    pub async fn set_targets(&self, targets: &[TargetEntry]) -> Result<(), ValidationError> {
        self.validate_targets(targets)?;

        let mut zones = self.zones.lock().await;
        for entry in targets {
            zones[entry.zone_id].set_target(entry.value);
        }
        drop(zones);

        for entry in targets {
            info!("zone {} target set to {:.1}C", entry.zone_id, entry.value);
        }
        Ok(())
    }

    fn validate_targets(&self, targets: &[TargetEntry]) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(targets.len());
        for entry in targets {
            if entry.zone_id >= self.lines.len() {
                return Err(ValidationError::UnknownZone {
                    zone_id: entry.zone_id,
                });
            }
            if !seen.insert(entry.zone_id) {
                return Err(ValidationError::DuplicateZone {
                    zone_id: entry.zone_id,
                });
            }
            if !self.bounds.contains(entry.value) {
                return Err(ValidationError::OutOfRange {
                    zone_id: entry.zone_id,
                    value: entry.value,
                    min: self.bounds.min_c,
                    max: self.bounds.max_c,
                });
            }
        }
        Ok(())
    }

    async fn guarded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.io_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                operation,
                timeout_ms: self.io_timeout.as_millis().try_into().unwrap_or(u64::MAX),
            }),
        }
    }
}

fn log_event(zone: &ZoneState, event: ZoneEvent) {
    info!(
        "zone {} ({}) {}: reading {:?}, target {:.1}C",
        zone.id(),
        zone.name(),
        event.as_str(),
        zone.last_reading_c(),
        zone.target_c()
    );
}

/// Runs [`ThermostatController::run_cycle`] every `period` until the runtime shuts down.
pub fn spawn_control_loop(controller: Arc<ThermostatController>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let report = controller.run_cycle().await;
            debug!("control cycle finished: {report:?}");
        }
    })
}
