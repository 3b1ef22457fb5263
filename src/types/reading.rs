use std::time::Instant;

/// One scalar sample from the motion sensor, stamped when it arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub at: Instant,
}

impl Reading {
    pub fn new(value: f64, at: Instant) -> Self {
        Self { value, at }
    }

    // Readings stamped before the origin count as zero.
    pub fn elapsed_ms(&self, origin: Instant) -> f64 {
        self.at.saturating_duration_since(origin).as_secs_f64() * 1000.0
    }
}

/// A point on the chart: x is milliseconds since the time origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlottedPoint {
    pub elapsed_ms: f64,
    pub value: f64,
}

impl PlottedPoint {
    pub fn new(elapsed_ms: f64, value: f64) -> Self {
        Self { elapsed_ms, value }
    }

    pub fn as_array(&self) -> [f64; 2] {
        [self.elapsed_ms, self.value]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn elapsed_is_measured_from_origin() {
        let origin = Instant::now();
        let reading = Reading::new(1.0, origin + Duration::from_millis(1500));
        assert!((reading.elapsed_ms(origin) - 1500.0).abs() < 1e-6);
    }

    #[test]
    fn readings_before_origin_clamp_to_zero() {
        let origin = Instant::now() + Duration::from_secs(1);
        let reading = Reading::new(1.0, origin - Duration::from_millis(10));
        assert_eq!(reading.elapsed_ms(origin), 0.0);
    }
}
