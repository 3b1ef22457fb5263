use super::SensorEvent;

/// Accelerometer sample as published by the phone over MQTT.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp: i64,
}

impl DataPoint {
    pub fn into_event(self) -> SensorEvent {
        SensorEvent::new([self.x as f32, self.y as f32, self.z as f32], self.timestamp)
    }
}
