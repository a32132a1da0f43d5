//! Number formatting shared by every weather readout.

/// Rounds half-way values toward positive infinity.
///
/// `-2.5` becomes `-2`, matching how the server-side templates and the
/// browser round readings.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn celsius(temp: f64) -> String {
    format!("{}°C", round_half_up(temp))
}

pub fn km_per_hour(meters_per_second: f64) -> i64 {
    round_half_up(meters_per_second * 3.6)
}

pub fn visibility_km(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}
