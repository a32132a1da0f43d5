use api::HttpClient;
use foundation::LatLng;
use tracing::{error, info, warn};

use super::WeatherMap;
use crate::env::GeoError;
use crate::ui::ToastKind;

const LOCATE_ZOOM: u8 = 12;
const SEARCH_ZOOM: u8 = 10;

impl<H: HttpClient> WeatherMap<H> {
    /// Centers on the browser's position; failures leave the default view.
    pub async fn get_current_location(&self) {
        match self.ctx.geo.locate().await {
            Ok(at) => {
                self.map.set_view(at, LOCATE_ZOOM);
                self.place_marker(at);
                self.state.borrow_mut().selected = Some(at);
                self.show_weather_popup();
                self.show_weather_details(at).await;
                self.ctx.toast(ToastKind::Success, "Located your position!");
            }
            Err(GeoError::Unsupported) => {
                self.ctx.toast(
                    ToastKind::Error,
                    "Geolocation is not supported by your browser",
                );
            }
            Err(e) => {
                error!("geolocation error: {e}");
                self.ctx.toast(
                    ToastKind::Warning,
                    "Unable to get location. Using default view.",
                );
            }
        }
    }

    pub async fn on_map_click(&self, at: LatLng) {
        self.place_marker(at);
        let alert_mode = {
            let mut state = self.state.borrow_mut();
            state.selected = Some(at);
            state.alert_mode
        };
        self.show_weather_popup();
        self.update_users_in_area();
        if alert_mode {
            self.toggle_alert_overlay(true);
        }
        self.show_weather_details(at).await;
    }

    pub async fn search_location(&self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            self.ctx
                .toast(ToastKind::Warning, "Please enter a location to search");
            return;
        }
        if !self.ctx.config.has_api_key() {
            self.ctx.toast(
                ToastKind::Error,
                "Please set your API key to use search functionality",
            );
            return;
        }

        self.ctx.toast(ToastKind::Info, "Searching...");
        let places = match self.ctx.openweather().geocode(query).await {
            Ok(places) => places,
            Err(e) => {
                error!("geocoding error: {e}");
                self.ctx.toast(
                    ToastKind::Error,
                    "Error searching for location. Please try again.",
                );
                return;
            }
        };

        let Some(place) = places.first() else {
            self.ctx.toast(
                ToastKind::Error,
                "Location not found. Please try a different search term.",
            );
            return;
        };
        let at = LatLng::new(place.lat, place.lon);
        self.map.set_view(at, SEARCH_ZOOM);
        self.place_marker(at);
        self.state.borrow_mut().selected = Some(at);
        let country = place.country.as_deref().unwrap_or("");
        self.ctx
            .toast(ToastKind::Info, &format!("Found: {}, {country}", place.name));
        self.show_weather_details(at).await;
    }

    pub async fn refresh_weather_data(&self) {
        let at = self.state.borrow().marker_at;
        match at {
            Some(at) => {
                self.ctx.toast(ToastKind::Info, "Weather data refreshed!");
                self.show_weather_details(at).await;
            }
            None => self
                .ctx
                .toast(ToastKind::Warning, "Please select a location first"),
        }
    }

    /// Per-area user counts are not served yet; the panel shows a placeholder.
    pub fn update_users_in_area(&self) {
        if self.state.borrow().selected.is_some() {
            self.ctx.ui().set_text("users-in-area", "-- users");
        }
    }

    pub fn show_weather_popup(&self) {
        self.ctx.ui().set_hidden("weather-info-popup", false);
    }

    pub fn hide_weather_popup(&self) {
        if !self.ctx.ui().set_hidden("weather-info-popup", true) {
            warn!("weather popup element missing");
        }
        info!("weather popup closed");
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::page;
    use crate::env::GeoError;
    use crate::map::MapAction;
    use crate::testing::*;
    use crate::ui::ToastKind;
    use foundation::LatLng;
    use layers::{MapSurface, MemoryMapSurface};
    use std::rc::Rc;

    fn weather_http() -> FakeHttp {
        FakeHttp::new()
            .route("/weather?", 200, MANILA_WEATHER)
            .route("/forecast?", 200, MANILA_FORECAST)
            .route("/air_pollution?", 200, AIR_FAIR)
    }

    #[test]
    fn click_replaces_marker_and_fetches_three_endpoints() {
        let (h, map, wm) = page(weather_http(), false);
        wm.init();
        pollster::block_on(wm.on_map_click(LatLng::new(14.6, 121.0)));
        pollster::block_on(wm.on_map_click(LatLng::new(10.3, 123.9)));
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.markers()[0].position, LatLng::new(10.3, 123.9));
        assert_eq!(wm.state().selected, Some(LatLng::new(10.3, 123.9)));
        assert_eq!(h.http().count("/weather?"), 2);
        assert_eq!(h.http().count("/forecast?"), 2);
        assert_eq!(h.http().count("/air_pollution?"), 2);
        assert!(!h.ui.is_hidden("weather-info-popup"));
        assert_eq!(h.ui.text("users-in-area"), "-- users");
    }

    #[test]
    fn denied_geolocation_warns_and_keeps_default_view() {
        let h = Harness::build(
            FakeHttp::new(),
            FakeUi::new(),
            FakeClock::at_ms(NOW_MS),
            Err(GeoError::Denied("User denied Geolocation".into())),
        );
        let cfg = h.ctx.config.clone();
        let map = Rc::new(MemoryMapSurface::new(cfg.default_center, cfg.default_zoom));
        let wm = crate::map::WeatherMap::new(h.ctx.clone(), map.clone(), false);
        wm.init();
        pollster::block_on(wm.get_current_location());
        assert_eq!(map.view(), (cfg.default_center, 6));
        assert!(map.markers().is_empty());
        assert_eq!(
            h.ui.last_toast(),
            Some((ToastKind::Warning, "Unable to get location. Using default view.".into()))
        );
        assert!(h.http().requests().is_empty());
    }

    #[test]
    fn located_position_zooms_in_and_loads_weather() {
        let (h, map, wm) = page(weather_http(), false);
        pollster::block_on(wm.handle(MapAction::LocateMe));
        assert_eq!(map.view(), (LatLng::new(14.5995, 120.9842), 12));
        assert_eq!(h.ui.text("selected-location"), "Manila, PH");
        assert_eq!(h.ui.toast_count(ToastKind::Success), 1);
    }

    #[test]
    fn blank_search_is_rejected_without_a_request() {
        let (h, _map, wm) = page(FakeHttp::new(), false);
        pollster::block_on(wm.search_location("   "));
        assert_eq!(
            h.ui.last_toast(),
            Some((ToastKind::Warning, "Please enter a location to search".into()))
        );
        assert!(h.http().requests().is_empty());
    }

    #[test]
    fn empty_geocode_result_reports_not_found() {
        let (h, map, wm) = page(FakeHttp::new().route("/direct?", 200, "[]"), false);
        pollster::block_on(wm.search_location("Atlantis"));
        assert!(map.markers().is_empty());
        assert_eq!(
            h.ui.last_toast().map(|t| t.1),
            Some("Location not found. Please try a different search term.".into())
        );
    }

    #[test]
    fn search_centers_on_first_result_only() {
        let http = weather_http().route(
            "/direct?",
            200,
            r#"[{"name": "Cebu City", "lat": 10.3, "lon": 123.9, "country": "PH"},
                {"name": "Cebu", "lat": 10.0, "lon": 123.0, "country": "PH"}]"#,
        );
        let (h, map, wm) = page(http, false);
        h.ui.type_into("location-search", "  Cebu ");
        pollster::block_on(wm.handle(MapAction::Search));
        assert_eq!(map.view(), (LatLng::new(10.3, 123.9), 10));
        assert_eq!(map.markers().len(), 1);
        assert_eq!(wm.state().selected, Some(LatLng::new(10.3, 123.9)));
        assert!(h.ui.toasts().iter().any(|(_, m)| m == "Found: Cebu City, PH"));
        assert_eq!(h.ui.element("location-search").value, "");
        assert!(h.http().last("/direct?").unwrap().url.contains("q=Cebu&"));
    }

    #[test]
    fn refresh_without_marker_warns() {
        let (h, _map, wm) = page(weather_http(), false);
        pollster::block_on(wm.handle(MapAction::Refresh));
        assert_eq!(
            h.ui.last_toast(),
            Some((ToastKind::Warning, "Please select a location first".into()))
        );
        pollster::block_on(wm.on_map_click(LatLng::new(1.0, 2.0)));
        pollster::block_on(wm.handle(MapAction::Refresh));
        assert_eq!(h.http().count("/weather?"), 2);
    }
}
