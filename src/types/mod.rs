pub mod data_point;
pub mod reading;
pub mod sensor_event;

pub use data_point::DataPoint;
pub use reading::{PlottedPoint, Reading};
pub use sensor_event::{Sensor, SensorAccuracy, SensorDelay, SensorEvent, SensorType};
