//! Sensor manager abstraction and its backends.
//!
//! A [`SensorManager`] hands out sensors and delivers readings to registered
//! [`SensorEventListener`]s on a thread of its choosing. The
//! [`ObservableSensorListener`] adapter turns that callback API into a stream.

pub mod observable;
pub mod simulated;

use std::fmt;
use std::sync::Arc;

use crate::config::{MqttConfig, SensorBackend, SensorConfig};
use crate::mqtt::MqttSensorManager;
use crate::types::{Sensor, SensorAccuracy, SensorDelay, SensorEvent, SensorType};

pub use observable::ObservableSensorListener;
pub use simulated::SimulatedSensorManager;

/// Identifies one listener registration inside a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

pub trait SensorEventListener: Send + Sync {
    fn on_sensor_changed(&self, event: &SensorEvent);

    fn on_accuracy_changed(&self, _sensor: &Sensor, _accuracy: SensorAccuracy) {}
}

/// `unregister_listener` must not return while a callback for that listener
/// is still running on another thread; a callback on the calling thread
/// itself is fine.
pub trait SensorManager: Send + Sync {
    fn default_sensor(&self, kind: SensorType) -> Option<Sensor>;

    fn register_listener(
        &self,
        listener: Arc<dyn SensorEventListener>,
        sensor: &Sensor,
        delay: SensorDelay,
    ) -> Result<ListenerId, SensorError>;

    fn unregister_listener(&self, id: ListenerId);
}

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("no default {0} sensor available")]
    NoDefaultSensor(SensorType),
    #[error("sensor listener has been disposed")]
    Disposed,
    #[error("sensor backend error: {0}")]
    Backend(String),
    #[error("invalid sensor payload: {0}")]
    InvalidPayload(String),
}

/// Builds the manager selected in the configuration.
pub fn create_manager(sensor: &SensorConfig, mqtt: &MqttConfig) -> Arc<dyn SensorManager> {
    match sensor.backend {
        SensorBackend::Simulated => Arc::new(SimulatedSensorManager::new(sensor.simulated.clone())),
        SensorBackend::Mqtt => Arc::new(MqttSensorManager::new(mqtt.clone())),
    }
}
