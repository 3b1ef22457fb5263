use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{SensorDelay, SensorType};

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "senseplot.toml";

/// Application configuration. Every section falls back to its defaults, so a
/// config file only needs the keys it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub sensor: SensorConfig,
    pub smoothing: SmoothingConfig,
    pub render: RenderConfig,
    pub plot: PlotConfig,
    pub mqtt: MqttConfig,
    pub channels: ChannelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    pub resizable: bool,
    pub vsync: bool,
    pub hardware_acceleration: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorBackend {
    Simulated,
    Mqtt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub backend: SensorBackend,
    pub sensor_type: SensorType,
    pub delay: SensorDelay,
    /// Index into the event's x/y/z values.
    pub axis: usize,
    pub simulated: SimulatedSensorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedSensorConfig {
    pub amplitude: f64,
    pub frequency_hz: f64,
    pub noise: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub window_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub tick_interval_ms: u64,
    pub max_plot_length_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub plot_height: f32,
    pub line_width: f32,
    pub show_axes: bool,
    pub show_legend: bool,
    pub allow_drag: bool,
    pub allow_zoom: bool,
    pub colors: PlotColors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotColors {
    pub raw: [u8; 3],
    pub smoothed: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    pub qos: u8,
    pub keep_alive: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub ui_queue_capacity: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
            title: "SensePlot - Linear Acceleration".to_string(),
            resizable: true,
            vsync: true,
            hardware_acceleration: true,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            backend: SensorBackend::Simulated,
            sensor_type: SensorType::LinearAcceleration,
            delay: SensorDelay::Normal,
            axis: 0,
            simulated: SimulatedSensorConfig::default(),
        }
    }
}

impl Default for SimulatedSensorConfig {
    fn default() -> Self {
        Self {
            amplitude: 1.5,
            frequency_hz: 0.25,
            noise: 0.6,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { window_size: 8 }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            max_plot_length_seconds: 10,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            plot_height: 400.0,
            line_width: 1.5,
            show_axes: true,
            show_legend: true,
            allow_drag: false,
            allow_zoom: false,
            colors: PlotColors::default(),
        }
    }
}

impl Default for PlotColors {
    fn default() -> Self {
        Self {
            raw: [160, 160, 160],    // grey
            smoothed: [220, 40, 40], // red
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: "localhost".to_string(),
            port: 1883,
            client_id: "senseplot".to_string(),
            topic: "sensors".to_string(),
            qos: 1,
            keep_alive: 5,
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            ui_queue_capacity: 5000,
        }
    }
}

impl RenderConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn clear_every_ticks(&self) -> u64 {
        (self.max_plot_length_seconds * 1000 / self.tick_interval_ms.max(1)).max(1)
    }

    pub fn max_plot_length_ms(&self) -> f64 {
        (self.max_plot_length_seconds * 1000) as f64
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;
        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;
        std::fs::write(path, content).map_err(ConfigError::IoError)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(ConfigError::ValidationError("Window dimensions must be positive".to_string()));
        }

        if self.sensor.axis > 2 {
            return Err(ConfigError::ValidationError("Sensor axis must be 0 (x), 1 (y) or 2 (z)".to_string()));
        }

        if self.smoothing.window_size == 0 {
            return Err(ConfigError::ValidationError("Smoothing window must hold at least one reading".to_string()));
        }

        if self.render.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError("Tick interval must be positive".to_string()));
        }

        if self.render.max_plot_length_seconds * 1000 < self.render.tick_interval_ms {
            return Err(ConfigError::ValidationError("Plot length must span at least one tick".to_string()));
        }

        if self.channels.ui_queue_capacity == 0 {
            return Err(ConfigError::ValidationError("UI queue capacity must be positive".to_string()));
        }

        if self.mqtt.qos > 2 {
            return Err(ConfigError::ValidationError("MQTT QoS must be 0, 1 or 2".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub struct ConfigManager {
    config: AppConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            config_path: None,
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = AppConfig::load_from_file(&path)?;
        Ok(Self {
            config,
            config_path: Some(path.as_ref().to_path_buf()),
        })
    }

    /// Loads `path` if given, else [`DEFAULT_CONFIG_FILE`] when it exists,
    /// else the built-in defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load_from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::new()),
        }
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.config.save_to_file(path)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("senseplot-{}-{}.toml", name, std::process::id()))
    }

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn default_clear_cadence_is_ten_seconds_of_ticks() {
        let render = RenderConfig::default();
        assert_eq!(render.tick_interval(), Duration::from_millis(250));
        assert_eq!(render.clear_every_ticks(), 40);
        assert_eq!(render.max_plot_length_ms(), 10_000.0);
    }

    #[test]
    fn clear_cadence_follows_plot_length() {
        let render = RenderConfig {
            tick_interval_ms: 100,
            max_plot_length_seconds: 5,
        };
        assert_eq!(render.clear_every_ticks(), 50);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = AppConfig::default();
        config.smoothing.window_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = AppConfig::default();
        config.render.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.sensor.axis = 3;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.render.max_plot_length_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let path = temp_path("partial");
        std::fs::write(
            &path,
            "[sensor]\nbackend = \"mqtt\"\ndelay = \"game\"\n\n[smoothing]\nwindow_size = 4\n",
        )
        .unwrap();

        let manager = ConfigManager::load_from_file(&path).unwrap();
        let config = manager.get_config();
        assert_eq!(config.sensor.backend, SensorBackend::Mqtt);
        assert_eq!(config.sensor.delay, SensorDelay::Game);
        assert_eq!(config.smoothing.window_size, 4);
        assert_eq!(config.render.tick_interval_ms, 250);
        assert_eq!(manager.config_path(), Some(path.as_path()));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn saved_config_loads_back() {
        let path = temp_path("saved");
        let mut manager = ConfigManager::new();
        manager.config.render.max_plot_length_seconds = 20;
        manager.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.render.clear_every_ticks(), 80);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn broken_toml_is_a_parse_error() {
        let path = temp_path("broken");
        std::fs::write(&path, "[render\ntick_interval_ms = ").unwrap();

        assert!(matches!(AppConfig::load_from_file(&path), Err(ConfigError::ParseError(_))));

        std::fs::remove_file(path).ok();
    }
}
