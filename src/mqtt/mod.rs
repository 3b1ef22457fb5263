pub mod client;

pub use client::MqttSensorManager;
