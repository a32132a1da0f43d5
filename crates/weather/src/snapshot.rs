//! Projection of raw OpenWeatherMap payloads into display text.

use api::{AirQuality, ChatWeatherInfo, Coordinates, CurrentWeather, Forecast, UserWeatherData};
use chrono::{DateTime, FixedOffset, Timelike};
use foundation::capitalize_first;

use crate::labels::{air_quality_label, weather_icon};
use crate::units::{celsius, km_per_hour, round_half_up, visibility_km};
use crate::uv::uv_for_current;

/// Everything the weather side panel shows for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub location: String,
    pub temperature: String,
    pub feels_like: String,
    pub condition: String,
    pub humidity: String,
    pub wind_speed: String,
    pub pressure: String,
    pub visibility: String,
    pub precipitation: String,
    pub cloud_cover: String,
    pub uv_index: String,
    pub air_quality: String,
}

impl WeatherSnapshot {
    /// `None` when the payload is not a successful (`cod == 200`) reading.
    pub fn project(current: &CurrentWeather, air: Option<&AirQuality>) -> Option<Self> {
        if !current.is_ok() {
            return None;
        }
        let main = current.main.as_ref()?;
        let condition = current
            .primary_condition()
            .map(|c| c.description.clone())
            .unwrap_or_default();
        let wind = current.wind.as_ref().map_or(0.0, |w| w.speed);
        let precipitation = current
            .rain
            .as_ref()
            .map_or(0.0, |r| r.one_hour.unwrap_or(0.0));

        Some(Self {
            location: location_label(current),
            temperature: celsius(main.temp),
            feels_like: celsius(main.feels_like),
            condition,
            humidity: format!("{}%", main.humidity),
            wind_speed: format!("{} km/h", km_per_hour(wind)),
            pressure: format!("{} hPa", main.pressure),
            visibility: visibility_km(current.visibility.unwrap_or(0.0)),
            precipitation: format!("{precipitation} mm"),
            cloud_cover: format!("{}%", current.clouds.as_ref().map_or(0.0, |c| c.all)),
            uv_index: uv_for_current(current).to_string(),
            air_quality: air_quality_label(air.and_then(AirQuality::aqi)).to_string(),
        })
    }

    /// `(element id, text)` pairs for the fixed panel fields.
    pub fn fields(&self) -> [(&'static str, &str); 13] {
        [
            ("selected-location", self.location.as_str()),
            ("current-temp", self.temperature.as_str()),
            ("current-humidity", self.humidity.as_str()),
            ("weather-condition", self.condition.as_str()),
            ("feels-like", self.feels_like.as_str()),
            ("humidity", self.humidity.as_str()),
            ("wind-speed", self.wind_speed.as_str()),
            ("pressure", self.pressure.as_str()),
            ("visibility", self.visibility.as_str()),
            ("precipitation", self.precipitation.as_str()),
            ("cloud-cover", self.cloud_cover.as_str()),
            ("uv-index", self.uv_index.as_str()),
            ("air-quality", self.air_quality.as_str()),
        ]
    }
}

/// `"{name}, {country}"`, or `"Selected Location"` for unnamed points.
pub fn location_label(current: &CurrentWeather) -> String {
    match current.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => {
            let country = current
                .sys
                .as_ref()
                .and_then(|s| s.country.as_deref())
                .unwrap_or("");
            format!("{name}, {country}")
        }
        None => "Selected Location".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyRow {
    pub hour: String,
    pub icon: &'static str,
    pub temperature: i64,
}

pub const HOURLY_ROWS: usize = 8;

/// First eight 3-hour steps in the viewer's local offset; `None` when the
/// forecast carried no list.
pub fn hourly_rows(forecast: &Forecast, offset: FixedOffset) -> Option<Vec<HourlyRow>> {
    let list = forecast.list.as_ref()?;
    Some(
        list.iter()
            .take(HOURLY_ROWS)
            .map(|entry| {
                let hour = DateTime::from_timestamp(entry.dt, 0)
                    .map(|t| t.with_timezone(&offset).hour())
                    .unwrap_or(0);
                let main = entry.weather.first().map_or("", |c| c.main.as_str());
                HourlyRow {
                    hour: format!("{hour:02}:00"),
                    icon: weather_icon(main),
                    temperature: round_half_up(entry.main.temp),
                }
            })
            .collect(),
    )
}

/// Chat panel view of a current reading, with the condition capitalized.
pub fn chat_weather_info(current: &CurrentWeather) -> Option<ChatWeatherInfo> {
    let main = current.main.as_ref()?;
    let cond = current.primary_condition();
    Some(ChatWeatherInfo {
        location: format!(
            "{}, {}",
            current.name.as_deref().unwrap_or(""),
            current
                .sys
                .as_ref()
                .and_then(|s| s.country.as_deref())
                .unwrap_or("")
        ),
        temperature: celsius(main.temp),
        feels_like: celsius(main.feels_like),
        condition: capitalize_first(cond.map_or("", |c| c.description.as_str())),
        condition_main: cond.map(|c| c.main.clone()).unwrap_or_default(),
        humidity: format!("{}%", main.humidity),
        wind_speed: format!(
            "{} km/h",
            km_per_hour(current.wind.as_ref().map_or(0.0, |w| w.speed))
        ),
        pressure: format!("{} hPa", main.pressure),
        coordinates: current.coord.as_ref().map(|c| Coordinates {
            lat: c.lat,
            lon: c.lon,
        }),
    })
}

/// Raw readings for a named user, attached to admin chatbot requests.
pub fn user_weather_data(
    username: &str,
    location_name: Option<&str>,
    current: &CurrentWeather,
) -> Option<UserWeatherData> {
    let main = current.main.as_ref()?;
    Some(UserWeatherData {
        username: username.to_string(),
        location: location_name
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown")
            .to_string(),
        temperature: main.temp,
        feels_like: main.feels_like,
        condition: current
            .primary_condition()
            .map(|c| c.description.clone())
            .unwrap_or_default(),
        humidity: main.humidity,
        wind_speed: current.wind.as_ref().map_or(0.0, |w| w.speed),
        pressure: main.pressure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn manila() -> CurrentWeather {
        serde_json::from_value(serde_json::json!({
            "cod": 200,
            "name": "Manila",
            "coord": {"lat": 14.6, "lon": 121.0},
            "sys": {"country": "PH"},
            "main": {"temp": 31.5, "feels_like": 36.2, "humidity": 70, "pressure": 1008},
            "weather": [{"main": "Clouds", "description": "broken clouds"}],
            "wind": {"speed": 4.1},
            "visibility": 10000,
            "clouds": {"all": 75},
            "rain": {"1h": 0.25}
        }))
        .unwrap()
    }

    #[test]
    fn projects_panel_fields() {
        let air: AirQuality =
            serde_json::from_value(serde_json::json!({"list": [{"main": {"aqi": 2}}]})).unwrap();
        let snap = WeatherSnapshot::project(&manila(), Some(&air)).unwrap();
        assert_eq!(
            snap,
            WeatherSnapshot {
                location: "Manila, PH".into(),
                temperature: "32°C".into(),
                feels_like: "36°C".into(),
                condition: "broken clouds".into(),
                humidity: "70%".into(),
                wind_speed: "15 km/h".into(),
                pressure: "1008 hPa".into(),
                visibility: "10.0 km".into(),
                precipitation: "0.25 mm".into(),
                cloud_cover: "75%".into(),
                uv_index: "4 (Moderate)".into(),
                air_quality: "Fair".into(),
            }
        );
    }

    #[test]
    fn missing_air_quality_degrades() {
        let snap = WeatherSnapshot::project(&manila(), None).unwrap();
        assert_eq!(snap.air_quality, "--");
    }

    #[test]
    fn non_200_is_no_data() {
        let mut c = manila();
        c.cod = serde_json::json!("404");
        assert!(WeatherSnapshot::project(&c, None).is_none());
    }

    #[test]
    fn unnamed_point() {
        let mut c = manila();
        c.name = Some(String::new());
        assert_eq!(location_label(&c), "Selected Location");
    }

    #[test]
    fn hourly_rows_use_offset() {
        let forecast: Forecast = serde_json::from_value(serde_json::json!({"list": [
            {"dt": 0, "main": {"temp": 25.5}, "weather": [{"main": "Rain"}]},
            {"dt": 10800, "main": {"temp": 24.4}, "weather": []}
        ]}))
        .unwrap();
        let plus8 = FixedOffset::east_opt(8 * 3600).unwrap();
        let rows = hourly_rows(&forecast, plus8).unwrap();
        assert_eq!(
            rows,
            vec![
                HourlyRow { hour: "08:00".into(), icon: "🌧️", temperature: 26 },
                HourlyRow { hour: "11:00".into(), icon: "🌤️", temperature: 24 },
            ]
        );
        assert!(hourly_rows(&Forecast::default(), plus8).is_none());
    }

    #[test]
    fn chat_info_capitalizes_condition() {
        let info = chat_weather_info(&manila()).unwrap();
        assert_eq!(info.condition, "Broken clouds");
        assert_eq!(info.condition_main, "Clouds");
        assert_eq!(info.coordinates, Some(Coordinates { lat: 14.6, lon: 121.0 }));
    }

    #[test]
    fn user_weather_defaults_location() {
        let data = user_weather_data("ana", None, &manila()).unwrap();
        assert_eq!(data.location, "Unknown");
        assert_eq!(data.condition, "broken clouds");
        assert_eq!(data.wind_speed, 4.1);
    }
}
