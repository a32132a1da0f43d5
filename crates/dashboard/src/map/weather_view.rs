use api::{AirQuality, CurrentWeather, Forecast, HttpClient};
use foundation::LatLng;
use futures_util::future::join3;
use tracing::error;
use weather::{check_weather_alerts, hourly_rows, HourlyRow, WeatherSnapshot};

use super::WeatherMap;
use crate::env::local_timestamp;
use crate::ui::ToastKind;

pub const LOADING_FIELDS: [&str; 8] = [
    "current-temp",
    "current-humidity",
    "weather-condition",
    "humidity",
    "wind-speed",
    "pressure",
    "visibility",
    "air-quality",
];

const FORECAST_UNAVAILABLE: &str =
    r#"<div class="text-xs text-gray-500">Forecast not available</div>"#;

fn hourly_row_html(row: &HourlyRow) -> String {
    format!(
        r#"<div class="flex items-center justify-between text-xs py-1.5 px-2 hover:bg-blue-50 rounded transition-colors"><span class="text-gray-600 font-medium">{}</span><span class="text-lg">{}</span><span class="text-gray-800 font-medium">{}°</span></div>"#,
        row.hour, row.icon, row.temperature
    )
}

impl<H: HttpClient> WeatherMap<H> {
    /// Fetches current weather, forecast and air quality together and fills
    /// the panel once all three have settled.
    pub async fn show_weather_details(&self, at: LatLng) {
        self.show_loading_state();
        self.update_coordinates(at);

        if !self.ctx.config.has_api_key() {
            self.ctx.toast(
                ToastKind::Error,
                "Please set your OpenWeatherMap API key to get real weather data",
            );
            return;
        }

        let ow = self.ctx.openweather();
        let (current, forecast, air) = join3(
            ow.current(at.lat, at.lng),
            ow.forecast(at.lat, at.lng),
            ow.air_quality(at.lat, at.lng),
        )
        .await;

        match (current, forecast) {
            (Ok(current), Ok(forecast)) => {
                self.update_weather_display(&current, &forecast, air.as_ref());
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("weather api error: {e}");
                self.ctx.toast(
                    ToastKind::Error,
                    "Error fetching weather data. Please try again.",
                );
            }
        }
    }

    pub fn update_weather_display(
        &self,
        current: &CurrentWeather,
        forecast: &Forecast,
        air: Option<&AirQuality>,
    ) {
        let Some(snapshot) = WeatherSnapshot::project(current, air) else {
            self.ctx.toast(
                ToastKind::Error,
                "Weather data not available for this location",
            );
            return;
        };
        let ui = self.ctx.ui();
        for (id, text) in snapshot.fields() {
            ui.set_text(id, text);
        }
        self.ctx.trace("weather", snapshot.location.as_str());
        self.update_hourly_forecast(forecast);
        self.show_weather_alert(current);
    }

    fn update_hourly_forecast(&self, forecast: &Forecast) {
        let ui = self.ctx.ui();
        if !ui.exists("hourly-forecast") {
            return;
        }
        match hourly_rows(forecast, self.ctx.clock.local_offset()) {
            Some(rows) => {
                let html: String = rows.iter().map(hourly_row_html).collect();
                ui.set_html("hourly-forecast", &html);
            }
            None => {
                ui.set_html("hourly-forecast", FORECAST_UNAVAILABLE);
            }
        }
    }

    fn show_weather_alert(&self, current: &CurrentWeather) {
        let ui = self.ctx.ui();
        if !ui.exists("weather-alerts") || !ui.exists("alert-message") {
            return;
        }
        match check_weather_alerts(current) {
            Some(alert) => {
                ui.set_text("alert-message", &alert.to_string());
                ui.set_class("weather-alerts", "hidden", false);
            }
            None => {
                ui.set_class("weather-alerts", "hidden", true);
            }
        }
    }

    pub fn show_loading_state(&self) {
        let ui = self.ctx.ui();
        for id in LOADING_FIELDS {
            ui.set_text(id, "...");
        }
    }

    pub fn update_coordinates(&self, at: LatLng) {
        let ui = self.ctx.ui();
        ui.set_text("selected-coords", &at.display_coords());
        ui.set_text("selected-time", &local_timestamp(self.ctx.clock.as_ref()));
    }
}
