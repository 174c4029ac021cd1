//! Scaling raw byte counts and durations into the units the progress
//! reporter prints. Purely cosmetic — nothing here feeds back into the
//! protocol.

/// Binary (1024-based) byte units, largest-fitting.
const BYTE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

/// Render `bytes` as e.g. `"7.25 MB"`, picking the largest unit that keeps
/// the value `>= 1.0`.
pub fn format_bytes(bytes: f64) -> String {
    let mut value = bytes.abs();
    let mut unit = BYTE_UNITS[0];
    for candidate in &BYTE_UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = candidate;
    }
    if unit == "B" {
        format!("{:.0} {}", bytes, unit)
    } else {
        format!("{:.2} {}", value.copysign(bytes), unit)
    }
}

/// Time units and the scale factor to the *next* one:
/// s -> min (x60) -> h (x60) -> d (x24) -> m (x30) -> y (x12).
const TIME_UNITS: &[(&str, f64)] = &[
    ("s", 60.0),
    ("min", 60.0),
    ("h", 24.0),
    ("d", 30.0),
    ("m", 12.0),
    ("y", f64::INFINITY),
];

/// Render a duration given in seconds as e.g. `"1.50 min"`.
pub fn format_duration_secs(mut seconds: f64) -> String {
    seconds = seconds.max(0.0);
    let mut unit = TIME_UNITS[0].0;
    for &(name, scale) in TIME_UNITS {
        unit = name;
        if seconds < scale {
            break;
        }
        seconds /= scale;
    }
    format!("{:.2} {}", seconds, unit)
}

/// Bytes-per-second as a human rate string, e.g. `"3.40 MB/s"`.
pub fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_sec))
}
