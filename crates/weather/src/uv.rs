use std::fmt;

use api::CurrentWeather;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UvLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl UvLevel {
    pub fn for_index(uv: u8) -> Self {
        match uv {
            11.. => UvLevel::Extreme,
            8..=10 => UvLevel::VeryHigh,
            6..=7 => UvLevel::High,
            3..=5 => UvLevel::Moderate,
            _ => UvLevel::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UvLevel::Low => "Low",
            UvLevel::Moderate => "Moderate",
            UvLevel::High => "High",
            UvLevel::VeryHigh => "Very High",
            UvLevel::Extreme => "Extreme",
        }
    }
}

/// Estimated UV index. Not a measurement: the current-weather endpoint
/// carries no UV reading, so it is inferred from latitude and cloud cover.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UvEstimate {
    pub index: u8,
    pub level: UvLevel,
}

impl fmt::Display for UvEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index, self.level.label())
    }
}

fn base_uv(lat: f64) -> f64 {
    let abs_lat = lat.abs();
    if abs_lat < 23.0 {
        7.0
    } else if abs_lat < 40.0 {
        5.0
    } else if abs_lat < 66.0 {
        3.0
    } else {
        2.0
    }
}

/// Latitude band base value attenuated by `1 - clouds/150`, clamped to 1..=11.
pub fn calculate_uv_index(lat: f64, cloud_cover_percent: f64) -> UvEstimate {
    let cloud_factor = 1.0 - cloud_cover_percent / 150.0;
    let raw = crate::units::round_half_up(base_uv(lat) * cloud_factor);
    let index = raw.clamp(1, 11) as u8;
    UvEstimate {
        index,
        level: UvLevel::for_index(index),
    }
}

/// Missing coordinates or clouds count as zero.
pub fn uv_for_current(current: &CurrentWeather) -> UvEstimate {
    let lat = current.coord.as_ref().map_or(0.0, |c| c.lat);
    let clouds = current.clouds.as_ref().map_or(0.0, |c| c.all);
    calculate_uv_index(lat, clouds)
}
