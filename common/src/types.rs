use serde::{Deserialize, Serialize};

use crate::zone::ZoneId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneStatus {
    pub id: ZoneId,
    pub name: String,
    pub temperature: Option<f32>,
    #[serde(rename = "relayOn")]
    pub relay_on: bool,
    #[serde(rename = "doorOpen")]
    pub door_open: bool,
    #[serde(rename = "doorOpenSeconds")]
    pub door_open_seconds: Option<f64>,
    pub target: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub zones: Vec<ZoneStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetEntry {
    #[serde(rename = "zoneId")]
    pub zone_id: ZoneId,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetsRequest {
    pub targets: Vec<TargetEntry>,
}
