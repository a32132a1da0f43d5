//! The weather map page: base layers, the weather overlay, the selected point
//! and the side panel that shows its readings.

mod admin;
mod controls;
mod weather_view;

use std::cell::RefCell;
use std::rc::Rc;

use api::{DashboardConfig, HttpClient};
use foundation::LatLng;
use layers::{BaseLayerName, MapLayers, MapSurface, OverlayKind, SelectionMarker, WeatherOverlays};
use runtime::SubscriptionTable;
use tracing::{info, warn};

use crate::context::Context;

pub use weather_view::LOADING_FIELDS;

/// Id of the base-layer `<select>` placed in the map's top-right control.
pub const LAYER_SELECT_ID: &str = "map-layer-select";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapAction {
    Search,
    ChangeOverlay,
    ChangeBaseLayer,
    LocateMe,
    Refresh,
    ClosePopup,
    ToggleAlertMode,
    CloseAlertOverlay,
    SendQuickAlert,
    CancelQuickAlert,
    CreateAlert,
    ViewUsers,
}

/// Mutable state of one map page.
#[derive(Debug)]
pub struct MapState {
    pub selected: Option<LatLng>,
    pub alert_mode: bool,
    marker: SelectionMarker,
    marker_at: Option<LatLng>,
    layers: MapLayers,
    overlays: WeatherOverlays,
}

impl MapState {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            selected: None,
            alert_mode: false,
            marker: SelectionMarker::new(),
            marker_at: None,
            layers: MapLayers::new(),
            overlays: WeatherOverlays::new(
                config.openweather_tile_url.clone(),
                config.openweather_api_key.clone(),
            ),
        }
    }

    pub fn base_layer(&self) -> BaseLayerName {
        self.layers.current()
    }

    pub fn overlay(&self) -> Option<OverlayKind> {
        self.overlays.active_kind()
    }

    pub fn marker_position(&self) -> Option<LatLng> {
        self.marker_at
    }
}

pub struct WeatherMap<H> {
    ctx: Rc<Context<H>>,
    map: Rc<dyn MapSurface>,
    state: RefCell<MapState>,
    admin: bool,
}

impl<H: HttpClient> WeatherMap<H> {
    pub fn new(ctx: Rc<Context<H>>, map: Rc<dyn MapSurface>, admin: bool) -> Self {
        let state = RefCell::new(MapState::new(&ctx.config));
        Self {
            ctx,
            map,
            state,
            admin,
        }
    }

    pub fn subscriptions(admin: bool) -> SubscriptionTable<MapAction> {
        let mut table = SubscriptionTable::new()
            .on("location-search", "keypress", MapAction::Search)
            .on("weather-layer-select", "change", MapAction::ChangeOverlay)
            .on(LAYER_SELECT_ID, "change", MapAction::ChangeBaseLayer)
            .on("current-location-btn", "click", MapAction::LocateMe)
            .on("refresh-btn", "click", MapAction::Refresh)
            .on("close-popup", "click", MapAction::ClosePopup);
        if admin {
            table.push("alert-mode-toggle", "click", MapAction::ToggleAlertMode);
            table.push("close-alert-overlay", "click", MapAction::CloseAlertOverlay);
            table.push("send-quick-alert", "click", MapAction::SendQuickAlert);
            table.push("cancel-quick-alert", "click", MapAction::CancelQuickAlert);
            table.push("create-alert-btn", "click", MapAction::CreateAlert);
            table.push("view-users-btn", "click", MapAction::ViewUsers);
        }
        table
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn state(&self) -> std::cell::Ref<'_, MapState> {
        self.state.borrow()
    }

    /// Attaches the default base layer and temperature overlay.
    ///
    /// Geolocation is started separately with [`Self::get_current_location`]
    /// so a slow or denied prompt never holds up the page.
    pub fn init(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.layers.attach_initial(self.map.as_ref());
        }
        self.add_weather_layer("temp");
        self.hide_loading();
        info!(admin = self.admin, "weather map initialized");
    }

    /// Markup for the base-layer switcher control.
    pub fn layer_control_html() -> String {
        let options: String = BaseLayerName::ALL
            .iter()
            .map(|l| format!(r#"<option value="{}">{}</option>"#, l.as_str(), l.label()))
            .collect();
        format!(
            r#"<select id="{LAYER_SELECT_ID}" class="bg-white border border-gray-300 rounded px-3 py-2 text-sm focus:outline-none focus:ring-2 focus:ring-blue-500">{options}</select>"#
        )
    }

    pub fn switch_layer(&self, name: &str) -> BaseLayerName {
        let name = self
            .state
            .borrow_mut()
            .layers
            .switch_layer(self.map.as_ref(), name);
        self.ctx.trace("base-layer", name.as_str());
        name
    }

    /// Replaces the weather overlay; unknown names just clear it.
    pub fn add_weather_layer(&self, name: &str) {
        let result = {
            let mut state = self.state.borrow_mut();
            match OverlayKind::parse(name) {
                Some(kind) => Some(state.overlays.add_weather_layer(self.map.as_ref(), kind)),
                None => {
                    state.overlays.remove_weather_layer(self.map.as_ref());
                    None
                }
            }
        };
        match result {
            Some(Ok(code)) => {
                self.ctx.ui().show_legend(Some(code));
                self.ctx.trace("overlay", code);
            }
            Some(Err(e)) => warn!("weather overlay not added: {e}"),
            None => {
                self.ctx.ui().show_legend(None);
                self.ctx.trace("overlay", "none");
            }
        }
    }

    pub fn toggle_weather_layer(&self) -> bool {
        self.state
            .borrow_mut()
            .overlays
            .toggle_visibility(self.map.as_ref())
    }

    pub async fn handle(&self, action: MapAction) {
        let ui = self.ctx.ui();
        match action {
            MapAction::Search => {
                let query = crate::ui::trimmed_value(ui, "location-search");
                if query.is_empty() {
                    return;
                }
                ui.set_value("location-search", "");
                self.search_location(&query).await;
            }
            MapAction::ChangeOverlay => {
                let value = ui.value("weather-layer-select").unwrap_or_default();
                self.add_weather_layer(&value);
            }
            MapAction::ChangeBaseLayer => {
                let value = ui.value(LAYER_SELECT_ID).unwrap_or_default();
                self.switch_layer(&value);
            }
            MapAction::LocateMe => self.get_current_location().await,
            MapAction::Refresh => self.refresh_weather_data().await,
            MapAction::ClosePopup => self.hide_weather_popup(),
            MapAction::ToggleAlertMode => self.toggle_alert_mode(),
            MapAction::CloseAlertOverlay | MapAction::CancelQuickAlert => {
                self.toggle_alert_overlay(false)
            }
            MapAction::SendQuickAlert => self.send_quick_alert().await,
            MapAction::CreateAlert => self.create_alert_click(),
            MapAction::ViewUsers => self.view_users_click(),
        }
    }

    fn place_marker(&self, at: LatLng) {
        let mut state = self.state.borrow_mut();
        state
            .marker
            .place(self.map.as_ref(), &layers::MarkerSpec::pin(at));
        state.marker_at = Some(at);
    }

    fn hide_loading(&self) {
        self.ctx.ui().set_hidden("map-loading", true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHttp, Harness};
    use layers::{MemoryMapSurface, TileRole};

    pub(super) fn page(http: FakeHttp, admin: bool) -> (Harness, Rc<MemoryMapSurface>, WeatherMap<FakeHttp>) {
        let h = Harness::new(http);
        let cfg = &h.ctx.config;
        let map = Rc::new(MemoryMapSurface::new(cfg.default_center, cfg.default_zoom));
        let wm = WeatherMap::new(h.ctx.clone(), map.clone(), admin);
        (h, map, wm)
    }

    #[test]
    fn init_attaches_streets_and_temperature() {
        let (h, map, wm) = page(FakeHttp::new(), false);
        wm.init();
        assert_eq!(map.tile_layers(TileRole::Base).len(), 1);
        assert_eq!(map.tile_layers(TileRole::Overlay).len(), 1);
        assert_eq!(wm.state().overlay(), Some(OverlayKind::Temp));
        assert_eq!(h.ui.legend(), Some(Some("temp".to_string())));
        assert!(h.ui.is_hidden("map-loading"));
    }

    #[test]
    fn admin_rows_only_on_admin_pages() {
        let user = WeatherMap::<FakeHttp>::subscriptions(false);
        let admin = WeatherMap::<FakeHttp>::subscriptions(true);
        assert_eq!(user.lookup("alert-mode-toggle", "click"), None);
        assert_eq!(
            admin.lookup("alert-mode-toggle", "click"),
            Some(MapAction::ToggleAlertMode)
        );
        assert_eq!(admin.len(), user.len() + 6);
    }

    #[test]
    fn overlay_select_tracks_last_choice_and_none_clears() {
        let (h, map, wm) = page(FakeHttp::new(), false);
        wm.init();
        for value in ["wind", "clouds", "pressure"] {
            h.ui.type_into("weather-layer-select", value);
            pollster::block_on(wm.handle(MapAction::ChangeOverlay));
            assert_eq!(map.tile_layers(TileRole::Overlay).len(), 1);
        }
        assert_eq!(h.ui.legend(), Some(Some("pressure".to_string())));
        h.ui.type_into("weather-layer-select", "none");
        pollster::block_on(wm.handle(MapAction::ChangeOverlay));
        assert!(map.tile_layers(TileRole::Overlay).is_empty());
        assert_eq!(h.ui.legend(), Some(None));
    }

    #[test]
    fn base_layer_select_switches_layer() {
        let (h, map, wm) = page(FakeHttp::new(), false);
        wm.init();
        h.ui.type_into(LAYER_SELECT_ID, "satellite");
        pollster::block_on(wm.handle(MapAction::ChangeBaseLayer));
        assert_eq!(wm.state().base_layer(), BaseLayerName::Satellite);
        assert_eq!(map.tile_layers(TileRole::Base).len(), 1);
        assert!(WeatherMap::<FakeHttp>::layer_control_html().contains(r#"value="dark""#));
    }
}
