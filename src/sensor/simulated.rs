use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{error, info};
use rand::Rng;

use super::{ListenerId, SensorError, SensorEventListener, SensorManager};
use crate::config::SimulatedSensorConfig;
use crate::stream::lock;
use crate::types::{Sensor, SensorAccuracy, SensorDelay, SensorEvent, SensorType};

/// Shortest period between synthetic samples, used for `SensorDelay::Fastest`.
const MIN_PERIOD: Duration = Duration::from_millis(5);

struct Worker {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Desktop stand-in for a phone's motion sensors: each registration gets a
/// thread that synthesises a noisy sine wave on every axis.
pub struct SimulatedSensorManager {
    settings: SimulatedSensorConfig,
    workers: Mutex<HashMap<ListenerId, Worker>>,
    next_id: AtomicU64,
}

impl SimulatedSensorManager {
    pub fn new(settings: SimulatedSensorConfig) -> Self {
        Self {
            settings,
            workers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl SensorManager for SimulatedSensorManager {
    fn default_sensor(&self, kind: SensorType) -> Option<Sensor> {
        match kind {
            SensorType::Accelerometer | SensorType::LinearAcceleration => {
                Some(Sensor::new(kind, format!("Simulated {}", kind), "SensePlot"))
            }
            SensorType::Gyroscope => None,
        }
    }

    fn register_listener(
        &self,
        listener: Arc<dyn SensorEventListener>,
        sensor: &Sensor,
        delay: SensorDelay,
    ) -> Result<ListenerId, SensorError> {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let period = delay.interval().max(MIN_PERIOD);
        let settings = self.settings.clone();
        let (stop, stop_rx) = bounded::<()>(1);
        let sensor_handle = sensor.clone();

        let handle = thread::Builder::new()
            .name(format!("sim-{}", sensor.kind).replace(' ', "-"))
            .spawn(move || {
                let mut rng = rand::rng();
                let started = Instant::now();
                listener.on_accuracy_changed(&sensor_handle, SensorAccuracy::High);
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    let t = started.elapsed().as_secs_f64();
                    let mut values = [0.0f32; 3];
                    for (axis, value) in values.iter_mut().enumerate() {
                        let phase = axis as f64 * TAU / 3.0;
                        let wave = settings.amplitude * (TAU * settings.frequency_hz * t + phase).sin();
                        let noise = if settings.noise > 0.0 {
                            rng.random_range(-settings.noise..settings.noise)
                        } else {
                            0.0
                        };
                        *value = (wave + noise) as f32;
                    }

                    let timestamp = chrono::Local::now().timestamp_millis();
                    listener.on_sensor_changed(&SensorEvent::new(values, timestamp));
                }
            })
            .map_err(|e| SensorError::Backend(format!("failed to spawn simulator thread: {}", e)))?;

        lock(&self.workers).insert(id, Worker { stop, handle });
        info!("Simulated {} started for {} every {:?}", sensor.kind, id, period);
        Ok(id)
    }

    fn unregister_listener(&self, id: ListenerId) {
        let Some(worker) = lock(&self.workers).remove(&id) else {
            return;
        };
        drop(worker.stop);

        // Unregistering from inside a callback must not wait on itself.
        if worker.handle.thread().id() == thread::current().id() {
            return;
        }
        if worker.handle.join().is_err() {
            error!("Simulator thread for {} panicked", id);
        }
    }
}

impl Drop for SimulatedSensorManager {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = lock(&self.workers).keys().copied().collect();
        for id in ids {
            self.unregister_listener(id);
        }
    }
}
