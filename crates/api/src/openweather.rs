use tracing::warn;

use crate::config::DashboardConfig;
use crate::error::ApiError;
use crate::http::{HttpClient, HttpRequest};
use crate::wire::{AirQuality, CurrentWeather, Forecast, GeoPlace, NominatimReverse};

/// Percent-encodes a query component the way `encodeURIComponent` does.
pub fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Typed access to the OpenWeatherMap and Nominatim endpoints.
pub struct OpenWeather<'a, H> {
    http: &'a H,
    config: &'a DashboardConfig,
}

impl<'a, H: HttpClient> OpenWeather<'a, H> {
    pub fn new(http: &'a H, config: &'a DashboardConfig) -> Self {
        Self { http, config }
    }

    pub fn current_url(&self, lat: f64, lng: f64) -> String {
        format!(
            "{}/weather?lat={lat}&lon={lng}&appid={}&units=metric",
            self.config.openweather_base_url, self.config.openweather_api_key
        )
    }

    pub fn forecast_url(&self, lat: f64, lng: f64) -> String {
        format!(
            "{}/forecast?lat={lat}&lon={lng}&appid={}&units=metric",
            self.config.openweather_base_url, self.config.openweather_api_key
        )
    }

    pub fn air_quality_url(&self, lat: f64, lng: f64) -> String {
        format!(
            "{}/air_pollution?lat={lat}&lon={lng}&appid={}",
            self.config.openweather_base_url, self.config.openweather_api_key
        )
    }

    pub fn geocode_url(&self, query: &str) -> String {
        format!(
            "{}/direct?q={}&limit=1&appid={}",
            self.config.openweather_geo_url,
            encode_component(query),
            self.config.openweather_api_key
        )
    }

    pub fn reverse_geocode_url(&self, lat: f64, lng: f64) -> String {
        format!(
            "{}/reverse?lat={lat}&lon={lng}&limit=1&appid={}",
            self.config.openweather_geo_url, self.config.openweather_api_key
        )
    }

    pub fn nominatim_reverse_url(&self, lat: f64, lng: f64) -> String {
        format!(
            "{}/reverse?format=json&lat={lat}&lon={lng}&zoom=10",
            self.config.nominatim_url
        )
    }

    pub async fn current(&self, lat: f64, lng: f64) -> Result<CurrentWeather, ApiError> {
        let resp = self.http.send(HttpRequest::get(self.current_url(lat, lng))).await?;
        resp.ok_json()
    }

    pub async fn forecast(&self, lat: f64, lng: f64) -> Result<Forecast, ApiError> {
        let resp = self.http.send(HttpRequest::get(self.forecast_url(lat, lng))).await?;
        resp.ok_json()
    }

    /// Air quality is optional everywhere it is shown; failures become `None`.
    pub async fn air_quality(&self, lat: f64, lng: f64) -> Option<AirQuality> {
        let result = async {
            let resp = self
                .http
                .send(HttpRequest::get(self.air_quality_url(lat, lng)))
                .await?;
            resp.json::<AirQuality>()
        }
        .await;
        match result {
            Ok(aq) => Some(aq),
            Err(e) => {
                warn!("air quality data not available: {e}");
                None
            }
        }
    }

    pub async fn geocode(&self, query: &str) -> Result<Vec<GeoPlace>, ApiError> {
        let resp = self.http.send(HttpRequest::get(self.geocode_url(query))).await?;
        resp.json()
    }

    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Vec<GeoPlace>, ApiError> {
        let resp = self
            .http
            .send(HttpRequest::get(self.reverse_geocode_url(lat, lng)))
            .await?;
        resp.json()
    }

    pub async fn nominatim_reverse(&self, lat: f64, lng: f64) -> Result<NominatimReverse, ApiError> {
        let resp = self
            .http
            .send(HttpRequest::get(self.nominatim_reverse_url(lat, lng)))
            .await?;
        resp.json()
    }
}
