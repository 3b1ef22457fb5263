/// Axis label for elapsed milliseconds since the time origin, e.g. `+3.5s`.
pub fn format_elapsed(elapsed_ms: f64) -> String {
    format!("+{:.1}s", elapsed_ms.max(0.0) / 1000.0)
}

/// Fixed-width value label so the plot does not shift as the y range changes.
pub fn format_fixed_width(value: f64) -> String {
    let abs_value = value.abs();
    if abs_value >= 1000.0 {
        format!("{:6.1e}", value)
    } else if abs_value >= 100.0 {
        format!("{:6.0}", value)
    } else if abs_value >= 10.0 {
        format!("{:6.1}", value)
    } else {
        format!("{:6.2}", value)
    }
}
