//! Fixed lookup tables for weather readouts.

pub fn weather_icon(condition_main: &str) -> &'static str {
    match condition_main {
        "Clear" => "☀️",
        "Clouds" => "☁️",
        "Rain" => "🌧️",
        "Drizzle" => "🌦️",
        "Thunderstorm" => "⛈️",
        "Snow" => "❄️",
        "Mist" | "Fog" | "Haze" => "🌫️",
        _ => "🌤️",
    }
}

/// OpenWeatherMap AQI scale 1..=5; anything else is `--`.
pub fn air_quality_label(aqi: Option<u8>) -> &'static str {
    match aqi {
        Some(1) => "Good",
        Some(2) => "Fair",
        Some(3) => "Moderate",
        Some(4) => "Poor",
        Some(5) => "Very Poor",
        _ => "--",
    }
}

pub fn humidity_status(humidity: f64) -> &'static str {
    if humidity < 30.0 {
        "Low"
    } else if humidity < 60.0 {
        "Normal"
    } else if humidity < 80.0 {
        "High"
    } else {
        "Very High"
    }
}

pub fn pressure_status(hpa: f64) -> &'static str {
    if hpa < 1000.0 {
        "Low"
    } else if hpa < 1020.0 {
        "Normal"
    } else {
        "High"
    }
}

pub fn visibility_status(km: f64) -> &'static str {
    if km < 2.0 {
        "Poor"
    } else if km < 10.0 {
        "Moderate"
    } else {
        "Good"
    }
}

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

pub fn wind_direction(degrees: f64) -> &'static str {
    let idx = crate::units::round_half_up(degrees / 45.0).rem_euclid(8) as usize;
    COMPASS[idx]
}
