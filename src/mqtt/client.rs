use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use dotenv::dotenv;
use log::{debug, error, info, warn};
use rumqttc::{Client, Event, MqttOptions, Packet, QoS};

use crate::config::MqttConfig;
use crate::sensor::{ListenerId, SensorError, SensorEventListener, SensorManager};
use crate::stream::lock;
use crate::types::{DataPoint, Sensor, SensorAccuracy, SensorDelay, SensorEvent, SensorType};

struct Session {
    client: Client,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Sensor manager fed by a phone publishing accelerometer samples as JSON
/// to an MQTT topic. Every registration opens its own broker session.
pub struct MqttSensorManager {
    settings: MqttConfig,
    sessions: Mutex<HashMap<ListenerId, Session>>,
    next_id: AtomicU64,
}

impl MqttSensorManager {
    pub fn new(settings: MqttConfig) -> Self {
        Self {
            settings,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn options(&self, id: ListenerId) -> Result<MqttOptions, SensorError> {
        dotenv().ok();

        let host = env::var("MQTT_HOST").unwrap_or_else(|_| self.settings.broker.clone());
        let port = match env::var("MQTT_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|e| SensorError::Backend(format!("invalid MQTT_PORT: {}", e)))?,
            Err(_) => self.settings.port,
        };

        let mut options = MqttOptions::new(format!("{}-{}", self.settings.client_id, id.0), host, port);
        options.set_keep_alive(Duration::from_secs(u64::from(self.settings.keep_alive)));
        if let (Ok(user), Ok(pass)) = (env::var("MQTT_USER"), env::var("MQTT_PASS")) {
            options.set_credentials(user, pass);
        }
        Ok(options)
    }
}

impl SensorManager for MqttSensorManager {
    fn default_sensor(&self, kind: SensorType) -> Option<Sensor> {
        match kind {
            SensorType::Accelerometer | SensorType::LinearAcceleration => Some(Sensor::new(
                kind,
                format!("MQTT {} ({})", kind, self.settings.topic),
                self.settings.broker.clone(),
            )),
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
        debug!("MQTT delivery rate is publisher driven, ignoring {:?}", delay);

        let options = self.options(id)?;
        let (client, mut connection) = Client::new(options, 10);
        client
            .subscribe(self.settings.topic.as_str(), qos(self.settings.qos))
            .map_err(|e| SensorError::Backend(e.to_string()))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = Arc::clone(&shutdown);
        let topic = self.settings.topic.clone();
        let sensor = sensor.clone();

        let handle = thread::Builder::new()
            .name("mqtt-sensor".to_string())
            .spawn(move || {
                for event in connection.iter() {
                    if thread_shutdown.load(Ordering::Relaxed) {
                        info!("MQTT sensor thread received shutdown signal, exiting gracefully");
                        break;
                    }

                    match event {
                        Ok(Event::Incoming(Packet::Publish(publish))) if publish.topic == topic => {
                            match parse_sensor_data(&publish.payload) {
                                Ok(event) => listener.on_sensor_changed(&event),
                                Err(e) => warn!("{}", e),
                            }
                        }
                        Ok(Event::Incoming(Packet::ConnAck(_))) => {
                            listener.on_accuracy_changed(&sensor, SensorAccuracy::Medium);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            if !thread_shutdown.load(Ordering::Relaxed) {
                                error!("MQTT connection error: {}", e);
                                listener.on_accuracy_changed(&sensor, SensorAccuracy::Unreliable);
                            }
                            break;
                        }
                    }
                }
            })
            .map_err(|e| SensorError::Backend(format!("failed to spawn MQTT thread: {}", e)))?;

        lock(&self.sessions).insert(id, Session { client, shutdown, handle });
        info!("Subscribed to MQTT topic '{}' for {}", self.settings.topic, id);
        Ok(id)
    }

    fn unregister_listener(&self, id: ListenerId) {
        let Some(session) = lock(&self.sessions).remove(&id) else {
            return;
        };
        session.shutdown.store(true, Ordering::Relaxed);
        if let Err(e) = session.client.disconnect() {
            debug!("MQTT disconnect for {} failed: {}", id, e);
        }

        if session.handle.thread().id() == thread::current().id() {
            return;
        }
        if session.handle.join().is_err() {
            error!("MQTT sensor thread for {} panicked", id);
        }
    }
}

impl Drop for MqttSensorManager {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = lock(&self.sessions).keys().copied().collect();
        for id in ids {
            self.unregister_listener(id);
        }
    }
}

fn qos(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtLeastOnce,
    }
}

pub(crate) fn parse_sensor_data(payload: &[u8]) -> Result<SensorEvent, SensorError> {
    let payload_str = std::str::from_utf8(payload)
        .map_err(|e| SensorError::InvalidPayload(format!("invalid UTF-8: {}", e)))?;

    serde_json::from_str::<DataPoint>(payload_str)
        .map(DataPoint::into_event)
        .map_err(|e| SensorError::InvalidPayload(format!("JSON parsing error: {}", e)))
}
