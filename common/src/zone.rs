use crate::config::ZoneConfig;

pub type ZoneId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneEvent {
    RelayEngaged,
    RelayReleased,
    DoorOpened,
    DoorClosed,
}

impl ZoneEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RelayEngaged => "RELAY_ENGAGED",
            Self::RelayReleased => "RELAY_RELEASED",
            Self::DoorOpened => "DOOR_OPENED",
            Self::DoorClosed => "DOOR_CLOSED",
        }
    }
}

/// Authoritative record of one compartment.
///
/// `relay_engaged` is the state the thermostat wants; `relay_applied` is the
/// state last confirmed on the relay line. They differ after a failed write,
/// which is what makes the next cycle retry it.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneState {
    id: ZoneId,
    name: String,
    target_c: f32,
    margin_c: f32,

    relay_engaged: bool,
    relay_applied: Option<bool>,

    last_reading_c: Option<f32>,
    sensor_fault: bool,

    door_open: bool,
    door_opened_at_ms: Option<u64>,
}

impl ZoneState {
    pub fn new(id: ZoneId, name: impl Into<String>, target_c: f32, margin_c: f32) -> Self {
        Self {
            id,
            name: name.into(),
            target_c,
            margin_c,
            relay_engaged: false,
            relay_applied: None,
            last_reading_c: None,
            sensor_fault: false,
            door_open: false,
            door_opened_at_ms: None,
        }
    }

    pub fn from_config(id: ZoneId, zone: &ZoneConfig, margin_c: f32) -> Self {
        Self::new(id, zone.name.clone(), zone.target_c, margin_c)
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_c(&self) -> f32 {
        self.target_c
    }

    pub fn margin_c(&self) -> f32 {
        self.margin_c
    }

    pub fn relay_engaged(&self) -> bool {
        self.relay_engaged
    }

    pub fn relay_applied(&self) -> Option<bool> {
        self.relay_applied
    }

    pub fn last_reading_c(&self) -> Option<f32> {
        self.last_reading_c
    }

    /// Reading as callers should see it: `None` while the latest read failed.
    pub fn current_reading_c(&self) -> Option<f32> {
        if self.sensor_fault {
            None
        } else {
            self.last_reading_c
        }
    }

    pub fn sensor_fault(&self) -> bool {
        self.sensor_fault
    }

    pub fn door_open(&self) -> bool {
        self.door_open
    }

    pub fn door_opened_at_ms(&self) -> Option<u64> {
        self.door_opened_at_ms
    }

    pub fn door_open_ms(&self, now_ms: u64) -> Option<u64> {
        self.door_opened_at_ms
            .map(|opened| now_ms.saturating_sub(opened))
    }

    pub fn set_target(&mut self, target_c: f32) {
        self.target_c = target_c;
    }

    /// Stores a successful reading and runs the hysteresis decision on it.
    pub fn apply_reading(&mut self, reading_c: f32) -> Option<ZoneEvent> {
        self.last_reading_c = Some(reading_c);
        self.sensor_fault = false;

        let next = next_relay_state(self.relay_engaged, reading_c, self.target_c, self.margin_c);
        if next == self.relay_engaged {
            return None;
        }
        self.relay_engaged = next;
        Some(if next {
            ZoneEvent::RelayEngaged
        } else {
            ZoneEvent::RelayReleased
        })
    }

    /// The previous reading is kept and no relay decision is made.
    pub fn record_sensor_fault(&mut self) {
        self.sensor_fault = true;
    }

    pub fn observe_door(&mut self, open: bool, now_ms: u64) -> Option<ZoneEvent> {
        match (self.door_open, open) {
            (false, true) => {
                self.door_open = true;
                self.door_opened_at_ms = Some(now_ms);
                Some(ZoneEvent::DoorOpened)
            }
            (true, false) => {
                self.door_open = false;
                self.door_opened_at_ms = None;
                Some(ZoneEvent::DoorClosed)
            }
            _ => None,
        }
    }

    /// Relay command still owed to the relay line, if any.
    pub fn pending_relay_command(&self) -> Option<bool> {
        if self.relay_applied == Some(self.relay_engaged) {
            None
        } else {
            Some(self.relay_engaged)
        }
    }

    pub fn mark_relay_applied(&mut self, engaged: bool) {
        self.relay_applied = Some(engaged);
    }
}

/// Hysteresis thermostat: engage below the dead band, release above it,
/// otherwise keep whatever the relay was doing.
pub fn next_relay_state(engaged: bool, reading_c: f32, target_c: f32, margin_c: f32) -> bool {
    if reading_c < target_c - margin_c {
        true
    } else if reading_c > target_c + margin_c {
        false
    } else {
        engaged
    }
}

/// Point-in-time copy of every zone. Holds no reference into the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub captured_at_ms: u64,
    pub zones: Vec<ZoneState>,
}
