//! JSON shapes exchanged with the dashboard server, OpenWeatherMap and Nominatim.
//!
//! Inbound types are lenient (`#[serde(default)]` on optional fields) so a
//! missing key degrades to a placeholder instead of failing the whole payload.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OpenWeatherMap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub feels_like: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    #[serde(default)]
    pub all: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    pub three_hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

/// `/data/2.5/weather` response.
///
/// `cod` is numeric on success and sometimes a string on errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub cod: serde_json::Value,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coord: Option<Coord>,
    #[serde(default)]
    pub sys: Option<Sys>,
    #[serde(default)]
    pub main: Option<MainReadings>,
    #[serde(default)]
    pub weather: Vec<Condition>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub visibility: Option<f64>,
    #[serde(default)]
    pub clouds: Option<Clouds>,
    #[serde(default)]
    pub rain: Option<Precipitation>,
    #[serde(default)]
    pub dt: Option<i64>,
}

impl CurrentWeather {
    pub fn is_ok(&self) -> bool {
        self.cod.as_i64() == Some(200) && self.main.is_some()
    }

    pub fn primary_condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainReadings,
    #[serde(default)]
    pub weather: Vec<Condition>,
}

/// `/data/2.5/forecast` (5 days, 3-hour steps).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub list: Option<Vec<ForecastEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityIndex {
    pub aqi: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityEntry {
    pub main: AirQualityIndex,
}

/// `/data/2.5/air_pollution`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    #[serde(default)]
    pub list: Vec<AirQualityEntry>,
}

impl AirQuality {
    pub fn aqi(&self) -> Option<u8> {
        self.list.first().map(|e| e.main.aqi)
    }
}

/// `/geo/1.0/direct` and `/geo/1.0/reverse` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPlace {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

// ---------------------------------------------------------------------------
// Nominatim
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NominatimAddress {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl NominatimAddress {
    /// Most specific populated place name.
    pub fn place_name(&self) -> Option<&str> {
        [
            &self.city,
            &self.town,
            &self.village,
            &self.municipality,
            &self.county,
            &self.state,
            &self.country,
        ]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NominatimReverse {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<NominatimAddress>,
}

// ---------------------------------------------------------------------------
// Dashboard server
// ---------------------------------------------------------------------------

/// `{success, error?, message?}` acknowledgement used by most POST endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserLocationsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub locations: Vec<UserLocation>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocationUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Pre-formatted weather panel data (`"31°C"`, `"12 km/h"`) shared by the
/// user chat and the server's chatbot replies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatWeatherInfo {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub temperature: String,
    #[serde(default)]
    pub feels_like: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub condition_main: String,
    #[serde(default)]
    pub humidity: String,
    #[serde(default)]
    pub wind_speed: String,
    #[serde(default)]
    pub pressure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Raw readings for one user's location, attached by the admin chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWeatherData {
    pub username: String,
    pub location: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatbotRequest {
    pub message: String,
    pub conversation_history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_locations: Option<Vec<UserLocation>>,
    /// Sent as `null` when no user was mentioned.
    pub user_weather_data: Option<UserWeatherData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_weather_data: Option<ChatWeatherInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_to_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatbotResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub fallback: bool,
    #[serde(default)]
    pub weather_info: Option<ChatWeatherInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminChatTurn {
    pub message: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub user_mentioned: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminConversation {
    pub session_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub message_count: Option<u32>,
    #[serde(default)]
    pub first_message: Option<String>,
    #[serde(default)]
    pub user_mentioned: Option<String>,
    #[serde(default)]
    pub messages: Vec<AdminChatTurn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminChatHistoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub conversations: Vec<AdminConversation>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteSessionRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub alert_type: String,
    #[serde(default)]
    pub weather_condition: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub sent_by: Option<String>,
    #[serde(default)]
    pub sent_at: String,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkReadRequest {
    pub notification_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAlertRequest {
    pub temperature: f64,
    pub location: String,
    pub weather_condition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAlert {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub color: String,
    #[serde(rename = "textColor", default)]
    pub text_color: String,
    #[serde(rename = "borderColor", default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub icon: String,
    #[serde(rename = "isExtreme", default)]
    pub is_extreme: bool,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureAlertResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub alert: Option<TemperatureAlert>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/admin/send-weather-alert/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlertRequest {
    pub username: String,
    pub email: String,
    pub alert_type: String,
    pub title: String,
    pub message: String,
    pub temperature: Option<f64>,
    pub weather_condition: Option<String>,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// `GET /admin-users/{id}/` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub date_joined: String,
    #[serde(default)]
    pub last_login: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub coordinates: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminUserResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<AdminUser>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `POST /admin-users/{id}/edit/` body; every field is a form string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEditForm {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
    pub is_active: String,
    pub new_password: String,
}

impl UserEditForm {
    /// The form as it is populated from a freshly loaded user.
    pub fn from_user(user: &AdminUser) -> Self {
        Self {
            first_name: user.first_name.clone(),
            middle_name: user.middle_name.clone().unwrap_or_default(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone_number: user.phone_number.clone().unwrap_or_default(),
            role: if user.is_staff { "admin" } else { "user" }.to_string(),
            is_active: if user.is_active { "true" } else { "false" }.to_string(),
            new_password: String::new(),
        }
    }
}
