//! Command implementations behind `dashctl`. Each command talks to the same
//! typed clients the browser dashboard uses and renders a plain-text report.

use std::fmt;
use std::fmt::Write as _;

use api::{
    ApiError, ChatbotRequest, DashboardConfig, GeoPlace, HttpClient, HttpRequest, HttpResponse,
    Method, NotificationsResponse, OpenWeather, RequestBody, ServerApi, UserLocation,
};
use clap::Subcommand;
use tracing::debug;
use weather::{WeatherSnapshot, check_weather_alerts};

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Current conditions, UV estimate and alert for a point.
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Geocode a place name.
    Search { query: String },
    /// Notifications for the signed-in user.
    Notifications,
    /// Last known location of every user (admin only).
    UserLocations,
    /// Ask the dashboard chatbot a question.
    Chat { message: String },
}

#[derive(Debug)]
pub enum CliError {
    MissingApiKey,
    NoReading { lat: f64, lng: f64 },
    Api(ApiError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::MissingApiKey => {
                f.write_str("OpenWeatherMap API key not configured (use --api-key)")
            }
            CliError::NoReading { lat, lng } => {
                write!(f, "no weather reading for {lat:.4}, {lng:.4}")
            }
            CliError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        CliError::Api(e)
    }
}

/// `reqwest` transport. `cookie` is forwarded verbatim so server calls can
/// reuse a browser session.
pub struct ReqwestHttp {
    client: reqwest::Client,
    cookie: Option<String>,
}

impl ReqwestHttp {
    pub fn new(cookie: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            cookie,
        }
    }

    /// CSRF token carried by the forwarded cookie, if any.
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie.as_deref().and_then(api::csrf_token)
    }
}

impl HttpClient for ReqwestHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(cookie) = &self.cookie {
            builder = builder.header("Cookie", cookie);
        }
        if let RequestBody::Json(body) = &request.body {
            builder = builder.body(serde_json::to_string(body)?);
        }
        debug!(url = %request.url, "sending");
        let resp = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(HttpResponse::new(status, body))
    }
}

/// Runs one command and returns the report to print.
pub async fn run<H: HttpClient>(
    http: &H,
    config: &DashboardConfig,
    csrf_token: Option<String>,
    command: &Command,
) -> Result<String, CliError> {
    match command {
        Command::Weather { lat, lng } => {
            if !config.has_api_key() {
                return Err(CliError::MissingApiKey);
            }
            let ow = OpenWeather::new(http, config);
            let current = ow.current(*lat, *lng).await?;
            let air = ow.air_quality(*lat, *lng).await;
            let snapshot = WeatherSnapshot::project(&current, air.as_ref())
                .ok_or(CliError::NoReading { lat: *lat, lng: *lng })?;
            let alert = check_weather_alerts(&current).map(|a| a.to_string());
            Ok(weather_report(&snapshot, alert.as_deref()))
        }
        Command::Search { query } => {
            if !config.has_api_key() {
                return Err(CliError::MissingApiKey);
            }
            let places = OpenWeather::new(http, config).geocode(query).await?;
            Ok(places_report(query, &places))
        }
        Command::Notifications => {
            let server = ServerApi::new(http, &config.server_base_url, csrf_token);
            Ok(notifications_report(&server.notifications().await?))
        }
        Command::UserLocations => {
            let server = ServerApi::new(http, &config.server_base_url, csrf_token);
            Ok(user_locations_report(&server.user_locations().await?))
        }
        Command::Chat { message } => {
            let server = ServerApi::new(http, &config.server_base_url, csrf_token);
            let request = ChatbotRequest {
                message: message.clone(),
                ..Default::default()
            };
            let reply = server.chatbot(&request).await?;
            let mut out = reply.response.unwrap_or_default();
            if let Some(info) = reply.weather_info.filter(|i| !i.location.is_empty()) {
                let _ = write!(
                    out,
                    "\n\n{}: {}, {}",
                    info.location, info.temperature, info.condition
                );
            }
            if reply.fallback {
                out.push_str("\n(offline fallback reply)");
            }
            Ok(out)
        }
    }
}

pub fn weather_report(snapshot: &WeatherSnapshot, alert: Option<&str>) -> String {
    let mut out = String::new();
    for (id, text) in snapshot.fields() {
        // The header repeats humidity next to the temperature.
        if id == "current-humidity" {
            continue;
        }
        let _ = writeln!(out, "{id:<18} {text}");
    }
    let _ = write!(out, "{:<18} {}", "alert", alert.unwrap_or("none"));
    out
}

pub fn places_report(query: &str, places: &[GeoPlace]) -> String {
    if places.is_empty() {
        return format!("Location not found: {query}");
    }
    places
        .iter()
        .map(|p| {
            let mut name = p.name.clone();
            for part in [&p.state, &p.country].into_iter().flatten() {
                name.push_str(", ");
                name.push_str(part);
            }
            format!("{name} ({:.4}, {:.4})", p.lat, p.lon)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn notifications_report(resp: &NotificationsResponse) -> String {
    let mut out = format!("{} unread", resp.unread_count);
    for n in &resp.notifications {
        let mark = if n.read { ' ' } else { '*' };
        let _ = write!(out, "\n{mark} [{}] {}: {} ({})", n.id, n.title, n.message, n.sent_at);
    }
    out
}

pub fn user_locations_report(locations: &[UserLocation]) -> String {
    if locations.is_empty() {
        return "No user locations recorded".to_string();
    }
    locations
        .iter()
        .map(|l| {
            format!(
                "{} <{}> {} ({:.4}, {:.4}) updated {}",
                l.username,
                l.email,
                l.location_name.as_deref().unwrap_or("Unknown"),
                l.latitude,
                l.longitude,
                l.updated_at
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
