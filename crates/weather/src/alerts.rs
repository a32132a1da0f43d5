use std::fmt;

use api::CurrentWeather;

use crate::units::{km_per_hour, round_half_up};

/// The single condition shown in the weather-alert banner.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WeatherAlert {
    StrongWind { km_per_hour: i64 },
    HighHumidity,
    PoorVisibility,
    ExtremeHeat,
    Cold,
}

impl fmt::Display for WeatherAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherAlert::StrongWind { km_per_hour } => {
                write!(f, "⚠️ Strong winds: {km_per_hour} km/h")
            }
            WeatherAlert::HighHumidity => f.write_str("💧 High humidity levels detected"),
            WeatherAlert::PoorVisibility => f.write_str("🌫️ Poor visibility conditions"),
            WeatherAlert::ExtremeHeat => f.write_str("🔥 Extreme heat warning"),
            WeatherAlert::Cold => f.write_str("❄️ Cold weather alert"),
        }
    }
}

/// First matching condition wins: wind, humidity, visibility, heat, cold.
pub fn check_weather_alerts(current: &CurrentWeather) -> Option<WeatherAlert> {
    if let Some(speed) = current.wind.as_ref().map(|w| w.speed).filter(|s| *s > 10.0) {
        return Some(WeatherAlert::StrongWind {
            km_per_hour: km_per_hour(speed),
        });
    }
    let main = current.main.as_ref();
    if main.is_some_and(|m| m.humidity > 90.0) {
        return Some(WeatherAlert::HighHumidity);
    }
    if current.visibility.is_some_and(|v| v < 1000.0) {
        return Some(WeatherAlert::PoorVisibility);
    }
    let temp = main?.temp;
    if temp > 35.0 {
        return Some(WeatherAlert::ExtremeHeat);
    }
    if temp < 5.0 {
        return Some(WeatherAlert::Cold);
    }
    None
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlertSeverity {
    Danger,
    Warning,
    Info,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Danger => "danger",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Info => "info",
        }
    }

    /// Unknown alert types render as informational.
    pub fn parse(s: &str) -> Self {
        match s {
            "danger" => AlertSeverity::Danger,
            "warning" => AlertSeverity::Warning,
            _ => AlertSeverity::Info,
        }
    }

    pub fn notification_title(self) -> &'static str {
        match self {
            AlertSeverity::Danger => "WEATHER ALERT",
            _ => "Weather Update",
        }
    }
}

/// Draft alert an admin reviews before sending it to one user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAlertDraft {
    pub severity: AlertSeverity,
    pub level: String,
    pub icon: &'static str,
    pub message: String,
}

pub fn compose_user_alert(temp: f64, condition_main: &str, description: &str) -> UserAlertDraft {
    let t = round_half_up(temp);
    let readings = format!("Temperature: {t}°C\nCondition: {description}");

    if temp >= 35.0 {
        UserAlertDraft {
            severity: AlertSeverity::Danger,
            level: "Extreme Heat".into(),
            icon: "🔥",
            message: format!(
                "⚠️ EXTREME HEAT WARNING\n\n{readings}\n\nStay indoors, drink plenty of water, and avoid prolonged sun exposure!"
            ),
        }
    } else if temp >= 30.0 {
        UserAlertDraft {
            severity: AlertSeverity::Warning,
            level: "High Temperature".into(),
            icon: "☀️",
            message: format!(
                "☀️ HIGH TEMPERATURE ALERT\n\n{readings}\n\nStay cool and drink plenty of water."
            ),
        }
    } else if temp <= 10.0 {
        UserAlertDraft {
            severity: AlertSeverity::Warning,
            level: "Cold Weather".into(),
            icon: "❄️",
            message: format!(
                "❄️ COLD WEATHER ALERT\n\n{readings}\n\nDress warmly and protect yourself from the cold."
            ),
        }
    } else if condition_main == "Rain" || condition_main == "Thunderstorm" {
        UserAlertDraft {
            severity: AlertSeverity::Warning,
            level: condition_main.to_string(),
            icon: if condition_main == "Thunderstorm" { "⛈️" } else { "🌧️" },
            message: format!(
                "🌧️ {} ALERT\n\n{readings}\n\nCarry an umbrella and be cautious when traveling.",
                condition_main.to_uppercase()
            ),
        }
    } else {
        UserAlertDraft {
            severity: AlertSeverity::Info,
            level: "Normal".into(),
            icon: "✅",
            message: format!("🌤️ WEATHER UPDATE\n\n{readings}\n\nStay informed and plan accordingly."),
        }
    }
}
