pub mod api;
pub mod clock;
pub mod controller;
pub mod gateway;
pub mod host;

pub use api::{router, ControlApi};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::{spawn_control_loop, CycleReport, ThermostatController};
pub use gateway::{ActuatorGateway, SensorGateway, SimulatedPlant};
