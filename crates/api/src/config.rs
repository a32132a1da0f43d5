use foundation::LatLng;

pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Runtime configuration for every dashboard surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_geo_url: String,
    pub openweather_tile_url: String,
    pub nominatim_url: String,
    /// Empty means same-origin relative URLs.
    pub server_base_url: String,
    pub default_center: LatLng,
    pub default_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub overlay_opacity: f64,
    pub notification_poll_ms: u32,
    pub user_marker_poll_ms: u32,
    pub minimap_poll_ms: u32,
    pub chat_context_limit: usize,
    pub saved_sessions_limit: usize,
    pub admin_history_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: API_KEY_PLACEHOLDER.to_string(),
            openweather_base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            openweather_geo_url: "https://api.openweathermap.org/geo/1.0".to_string(),
            openweather_tile_url: "https://tile.openweathermap.org/map".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org".to_string(),
            server_base_url: String::new(),
            default_center: LatLng::new(14.651, 121.0437),
            default_zoom: 6,
            min_zoom: 3,
            max_zoom: 19,
            overlay_opacity: 0.6,
            notification_poll_ms: 30_000,
            user_marker_poll_ms: 30_000,
            minimap_poll_ms: 30_000,
            chat_context_limit: 20,
            saved_sessions_limit: 50,
            admin_history_limit: 50,
        }
    }
}

impl DashboardConfig {
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.openweather_api_key = key;
        }
        self
    }

    pub fn with_server_base_url(mut self, url: impl Into<String>) -> Self {
        self.server_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// False for an empty key or the literal placeholder.
    pub fn has_api_key(&self) -> bool {
        let key = self.openweather_api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_key_is_the_placeholder() {
        let cfg = DashboardConfig::default();
        assert!(!cfg.has_api_key());
        assert_eq!(cfg.default_zoom, 6);
        assert_eq!(cfg.chat_context_limit, 20);
    }

    #[test]
    fn blank_override_keeps_placeholder() {
        let cfg = DashboardConfig::default().with_api_key(Some("  ".into()));
        assert!(!cfg.has_api_key());
        let cfg = DashboardConfig::default().with_api_key(Some("abc".into()));
        assert!(cfg.has_api_key());
    }

    #[test]
    fn server_base_url_drops_trailing_slash() {
        let cfg = DashboardConfig::default().with_server_base_url("http://localhost:8000/");
        assert_eq!(cfg.server_base_url, "http://localhost:8000");
    }
}
