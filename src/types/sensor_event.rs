use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of motion sensor a manager can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Accelerometer,
    LinearAcceleration,
    Gyroscope,
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorType::Accelerometer => "accelerometer",
            SensorType::LinearAcceleration => "linear acceleration",
            SensorType::Gyroscope => "gyroscope",
        };
        f.write_str(name)
    }
}

/// Requested delivery rate for sensor callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDelay {
    Fastest,
    Game,
    Ui,
    Normal,
}

impl SensorDelay {
    pub fn interval(&self) -> Duration {
        match self {
            SensorDelay::Fastest => Duration::ZERO,
            SensorDelay::Game => Duration::from_micros(20_000),
            SensorDelay::Ui => Duration::from_micros(66_667),
            SensorDelay::Normal => Duration::from_micros(200_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorAccuracy {
    Unreliable,
    Medium,
    High,
}

/// Handle to a concrete sensor returned by a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sensor {
    pub kind: SensorType,
    pub name: String,
    pub vendor: String,
}

impl Sensor {
    pub fn new(kind: SensorType, name: impl Into<String>, vendor: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            vendor: vendor.into(),
        }
    }
}

/// Payload of one sensor callback: x, y, z plus the source timestamp in ms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorEvent {
    pub values: [f32; 3],
    pub timestamp: i64,
}

impl SensorEvent {
    pub fn new(values: [f32; 3], timestamp: i64) -> Self {
        Self { values, timestamp }
    }
}
