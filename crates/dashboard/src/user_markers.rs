//! User-location markers for the admin map, the admin minimap and the chat
//! page's user-map widget. All three poll the same endpoint and redraw from
//! scratch on every tick.

use std::cell::RefCell;
use std::rc::Rc;

use api::{HttpClient, UserLocation};
use chrono::{DateTime, FixedOffset};
use foundation::{escape_html, initial, LatLng};
use layers::{MapSurface, MarkerIcon, MarkerSet, MarkerSpec, TileLayerSpec};
use runtime::{PollSchedule, SubscriptionTable};
use tracing::{error, info};

use crate::context::Context;

pub const PHILIPPINES_CENTER: LatLng = LatLng::new(14.5995, 120.9842);
pub const OVERVIEW_ZOOM: u8 = 6;
pub const USER_ZOOM: u8 = 14;
const OSM_TILES: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

const CHEVRON_UP: &str = r#"<svg class="w-4 h-4" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M5 15l7-7 7 7"></path></svg>"#;
const CHEVRON_DOWN: &str = r#"<svg class="w-4 h-4" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M19 9l-7 7-7-7"></path></svg>"#;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Full admin weather map; popups carry a "Send Weather Alert" button.
    AdminMap,
    Minimap,
    ChatWidget,
}

impl MarkerStyle {
    pub fn map_element(self) -> &'static str {
        match self {
            MarkerStyle::AdminMap => "weather-map",
            MarkerStyle::Minimap => "user-locations-minimap",
            MarkerStyle::ChatWidget => "admin-chat-user-map",
        }
    }

    fn badge_px(self) -> u32 {
        match self {
            MarkerStyle::AdminMap => 36,
            MarkerStyle::Minimap => 20,
            MarkerStyle::ChatWidget => 22,
        }
    }

    fn class_name(self) -> &'static str {
        match self {
            MarkerStyle::Minimap => "minimap-marker",
            _ => "user-marker-icon",
        }
    }

    fn fit_padding(self) -> Option<u32> {
        match self {
            MarkerStyle::AdminMap => None,
            MarkerStyle::Minimap => Some(20),
            MarkerStyle::ChatWidget => Some(30),
        }
    }

    fn count_element(self) -> Option<&'static str> {
        match self {
            MarkerStyle::AdminMap => None,
            MarkerStyle::Minimap => Some("minimap-user-count"),
            MarkerStyle::ChatWidget => Some("active-users-count"),
        }
    }

    /// `(toggle button, collapsible content)`.
    fn collapse_elements(self) -> Option<(&'static str, &'static str)> {
        match self {
            MarkerStyle::AdminMap => None,
            MarkerStyle::Minimap => Some(("toggle-minimap", "minimap-content")),
            MarkerStyle::ChatWidget => Some(("toggle-chat-map", "chat-map-content")),
        }
    }

    /// Base tiles for the small maps; the admin map brings its own layers.
    pub fn base_tiles(self) -> Option<TileLayerSpec> {
        match self {
            MarkerStyle::AdminMap => None,
            MarkerStyle::Minimap => Some(TileLayerSpec::base(OSM_TILES, "", 10)),
            MarkerStyle::ChatWidget => Some(TileLayerSpec::base(OSM_TILES, "", 18)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MarkerAction {
    Refresh,
    ToggleCollapse,
}

#[derive(Debug, Default)]
struct MarkerState {
    markers: MarkerSet,
    users: Vec<UserLocation>,
    collapsed: bool,
}

pub struct UserMarkers<H> {
    ctx: Rc<Context<H>>,
    map: Rc<dyn MapSurface>,
    style: MarkerStyle,
    state: RefCell<MarkerState>,
}

impl<H: HttpClient> UserMarkers<H> {
    pub fn new(ctx: Rc<Context<H>>, map: Rc<dyn MapSurface>, style: MarkerStyle) -> Self {
        Self {
            ctx,
            map,
            style,
            state: RefCell::new(MarkerState::default()),
        }
    }

    pub fn style(&self) -> MarkerStyle {
        self.style
    }

    pub fn subscriptions(style: MarkerStyle) -> SubscriptionTable<MarkerAction> {
        let mut table = SubscriptionTable::new();
        if style == MarkerStyle::ChatWidget {
            table.push("refresh-user-map", "click", MarkerAction::Refresh);
        }
        if let Some((toggle, _)) = style.collapse_elements() {
            table.push(toggle, "click", MarkerAction::ToggleCollapse);
        }
        table
    }

    pub fn schedule(&self) -> PollSchedule {
        let cfg = &self.ctx.config;
        match self.style {
            MarkerStyle::AdminMap => PollSchedule::every("user-markers", cfg.user_marker_poll_ms),
            MarkerStyle::Minimap => PollSchedule::every("minimap", cfg.minimap_poll_ms),
            MarkerStyle::ChatWidget => {
                PollSchedule::every("chat-user-map", cfg.user_marker_poll_ms)
            }
        }
    }

    pub fn init(&self) {
        if let Some(tiles) = self.style.base_tiles() {
            self.map.add_tile_layer(&tiles);
        }
    }

    pub async fn handle(&self, action: MarkerAction) {
        match action {
            MarkerAction::Refresh => self.load_user_locations().await,
            MarkerAction::ToggleCollapse => {
                self.toggle();
            }
        }
    }

    pub fn user_count(&self) -> usize {
        self.state.borrow().users.len()
    }

    pub fn marker_count(&self) -> usize {
        self.state.borrow().markers.len()
    }

    pub async fn load_user_locations(&self) {
        let ui = self.ctx.ui();
        if self.style == MarkerStyle::ChatWidget {
            ui.set_class("chat-map-loading", "hidden", false);
        }
        match self.ctx.server().user_locations().await {
            Ok(users) => {
                self.display_users(users);
                info!(style = ?self.style, count = self.user_count(), "loaded user locations");
            }
            Err(e) => error!("failed to load user locations: {e}"),
        }
        if self.style == MarkerStyle::ChatWidget {
            ui.set_class("chat-map-loading", "hidden", true);
        }
    }

    fn display_users(&self, users: Vec<UserLocation>) {
        let offset = self.ctx.clock.local_offset();
        let specs: Vec<MarkerSpec> = users
            .iter()
            .map(|u| self.marker_spec(u, offset))
            .collect();
        let bounds = {
            let mut state = self.state.borrow_mut();
            let bounds = state.markers.replace_all(self.map.as_ref(), &specs);
            state.users = users;
            bounds
        };
        if let (Some(bounds), Some(padding)) = (bounds, self.style.fit_padding()) {
            self.map.fit_bounds(bounds, padding);
        }

        let state = self.state.borrow();
        let ui = self.ctx.ui();
        if let Some(id) = self.style.count_element() {
            ui.set_text(id, &state.users.len().to_string());
        }
        if self.style == MarkerStyle::ChatWidget && ui.exists("user-list") {
            ui.set_html("user-list", &user_list_html(&state.users, offset));
        }
        self.ctx
            .trace("user-markers", format!("{} users", state.users.len()));
    }

    fn marker_spec(&self, user: &UserLocation, offset: FixedOffset) -> MarkerSpec {
        let at = LatLng::new(user.latitude, user.longitude);
        let spec = MarkerSpec::pin(at).with_icon(MarkerIcon::Badge {
            label: initial(&user.username),
            class_name: self.style.class_name().to_string(),
            size_px: self.style.badge_px(),
        });
        match self.style {
            MarkerStyle::Minimap => spec.with_tooltip(user.username.clone()),
            MarkerStyle::AdminMap => spec.with_popup(admin_popup_html(user, offset), false),
            MarkerStyle::ChatWidget => spec.with_popup(widget_popup_html(user, offset), false),
        }
    }

    /// Collapses or expands the map body; returns the new collapsed flag.
    pub fn toggle(&self) -> bool {
        let Some((button, content)) = self.style.collapse_elements() else {
            return false;
        };
        let ui = self.ctx.ui();
        if !ui.exists(button) || !ui.exists(content) {
            return self.state.borrow().collapsed;
        }
        let collapsed = {
            let mut state = self.state.borrow_mut();
            state.collapsed = !state.collapsed;
            state.collapsed
        };
        ui.set_hidden(content, collapsed);
        ui.set_html(button, if collapsed { CHEVRON_UP } else { CHEVRON_DOWN });
        collapsed
    }

    /// Centers on a user's marker and opens its popup.
    pub fn zoom_to_user(&self, username: &str) -> bool {
        let state = self.state.borrow();
        let Some(idx) = state.users.iter().position(|u| u.username == username) else {
            return false;
        };
        let user = &state.users[idx];
        self.map
            .set_view(LatLng::new(user.latitude, user.longitude), USER_ZOOM);
        if let Some(id) = state.markers.ids().get(idx) {
            self.map.open_popup(*id);
        }
        true
    }
}

fn parse_timestamp(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&offset))
}

pub fn last_seen(raw: &str, offset: FixedOffset) -> String {
    parse_timestamp(raw, offset)
        .map(|t| t.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn clock_time(raw: &str, offset: FixedOffset) -> String {
    parse_timestamp(raw, offset)
        .map(|t| t.format("%I:%M %p").to_string())
        .unwrap_or_default()
}

fn admin_popup_html(user: &UserLocation, offset: FixedOffset) -> String {
    let username = escape_html(&user.username);
    let email = escape_html(&user.email);
    let place = user
        .location_name
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| {
            format!(
                r#"<p style="margin: 4px 0 0 0; font-size: 11px; color: #9ca3af;">📍 {}</p>"#,
                escape_html(p)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div style="padding: 12px; min-width: 200px;"><h3 style="margin: 0 0 8px 0; font-size: 14px; font-weight: 600; color: #1f2937;">{username}</h3><p style="margin: 0; font-size: 12px; color: #6b7280;">{email}</p>{place}<p style="margin: 8px 0 12px 0; font-size: 10px; color: #d1d5db;">Last seen: {seen}</p><button class="send-weather-alert-btn" data-username="{username}" data-email="{email}" data-lat="{lat}" data-lng="{lng}" style="width: 100%; background: linear-gradient(to right, #ef4444, #dc2626); color: white; padding: 8px 12px; border: none; border-radius: 6px; font-size: 12px; font-weight: 600; cursor: pointer;">Send Weather Alert</button></div>"#,
        seen = last_seen(&user.updated_at, offset),
        lat = user.latitude,
        lng = user.longitude,
    )
}

fn widget_popup_html(user: &UserLocation, offset: FixedOffset) -> String {
    format!(
        r#"<div style="padding: 8px; min-width: 160px;"><h4 style="margin: 0 0 6px 0; font-size: 14px; font-weight: 600;">{}</h4><p style="margin: 0; font-size: 12px; color: #6b7280;">{}</p><p style="margin: 6px 0 0 0; font-size: 11px; color: #d1d5db;">Last seen: {}</p></div>"#,
        escape_html(&user.username),
        escape_html(&user.email),
        last_seen(&user.updated_at, offset)
    )
}

fn user_list_html(users: &[UserLocation], offset: FixedOffset) -> String {
    if users.is_empty() {
        return r#"<p class="text-xs text-gray-500 text-center">No users online</p>"#.to_string();
    }
    users
        .iter()
        .map(|u| {
            format!(
                r#"<div class="flex items-center justify-between p-1.5 bg-white rounded hover:bg-gray-50 transition-colors" data-username="{name}"><div class="flex items-center space-x-2"><div class="w-5 h-5 bg-green-500 rounded-full flex items-center justify-center"><span class="text-white text-xs font-medium">{initial}</span></div><span class="text-xs font-medium text-gray-900">{name}</span></div><span class="text-xs text-gray-400">{time}</span></div>"#,
                name = escape_html(&u.username),
                initial = escape_html(&initial(&u.username)),
                time = clock_time(&u.updated_at, offset),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use layers::{MemoryMapSurface, TileRole};

    fn widget(http: FakeHttp, style: MarkerStyle) -> (Harness, Rc<MemoryMapSurface>, UserMarkers<FakeHttp>) {
        let h = Harness::new(http);
        let map = Rc::new(MemoryMapSurface::new(PHILIPPINES_CENTER, OVERVIEW_ZOOM));
        let markers = UserMarkers::new(h.ctx.clone(), map.clone(), style);
        markers.init();
        (h, map, markers)
    }

    #[test]
    fn redraw_replaces_markers_and_fits_minimap() {
        let (h, map, markers) = widget(
            FakeHttp::new().route("/api/admin/user-locations/", 200, TWO_USERS),
            MarkerStyle::Minimap,
        );
        pollster::block_on(markers.load_user_locations());
        pollster::block_on(markers.load_user_locations());
        assert_eq!(map.markers().len(), 2);
        assert_eq!(map.tile_layers(TileRole::Base)[0].max_zoom, 10);
        let (bounds, padding) = map.last_fit().unwrap();
        assert_eq!(padding, 20);
        assert_eq!(bounds.north_east, LatLng::new(14.6, 123.9));
        assert_eq!(h.ui.text("minimap-user-count"), "2");
        assert_eq!(map.markers()[0].tooltip.as_deref(), Some("maria"));
    }

    #[test]
    fn empty_list_clears_markers_and_shows_no_users() {
        let (h, map, markers) = widget(
            FakeHttp::new().route("/api/admin/user-locations/", 200, TWO_USERS),
            MarkerStyle::ChatWidget,
        );
        pollster::block_on(markers.handle(MarkerAction::Refresh));
        assert_eq!(map.markers().len(), 2);
        h.http().set_route(
            "/api/admin/user-locations/",
            200,
            r#"{"success": true, "locations": []}"#,
        );
        pollster::block_on(markers.handle(MarkerAction::Refresh));
        assert!(map.markers().is_empty());
        assert_eq!(h.ui.text("active-users-count"), "0");
        assert!(h.ui.html("user-list").contains("No users online"));
        assert!(h.ui.has_class("chat-map-loading", "hidden"));
    }

    #[test]
    fn long_polling_keeps_trace_bounded() {
        let (h, _map, markers) = widget(
            FakeHttp::new().route("/api/admin/user-locations/", 200, TWO_USERS),
            MarkerStyle::AdminMap,
        );
        for _ in 0..1000 {
            pollster::block_on(markers.load_user_locations());
        }
        let events = h.ctx.events();
        assert_eq!(events.len(), runtime::DEFAULT_CAPACITY);
        assert_eq!(events.last().map(|e| e.seq), Some(999));
    }

    #[test]
    fn failed_poll_keeps_previous_markers() {
        let (h, map, markers) = widget(
            FakeHttp::new().route("/api/admin/user-locations/", 200, TWO_USERS),
            MarkerStyle::AdminMap,
        );
        pollster::block_on(markers.load_user_locations());
        h.http().set_route(
            "/api/admin/user-locations/",
            200,
            r#"{"success": false, "error": "boom"}"#,
        );
        pollster::block_on(markers.load_user_locations());
        assert_eq!(map.markers().len(), 2);
        assert!(map.last_fit().is_none());
    }

    #[test]
    fn admin_popup_escapes_user_text_and_carries_alert_button() {
        let user = UserLocation {
            username: "<b>eve</b>".into(),
            email: "eve@example.com".into(),
            latitude: 1.0,
            longitude: 2.0,
            location_name: Some("Baguio".into()),
            updated_at: "2024-05-01T08:00:00Z".into(),
        };
        let html = admin_popup_html(&user, FixedOffset::east_opt(8 * 3600).unwrap());
        assert!(html.contains("&lt;b&gt;eve&lt;/b&gt;"));
        assert!(!html.contains("<b>eve"));
        assert!(html.contains(r#"class="send-weather-alert-btn""#));
        assert!(html.contains("📍 Baguio"));
        assert!(html.contains("Last seen: 5/1/2024, 4:00:00 PM"));
    }

    #[test]
    fn zoom_to_user_centers_and_opens_popup() {
        let (_h, map, markers) = widget(
            FakeHttp::new().route("/api/admin/user-locations/", 200, TWO_USERS),
            MarkerStyle::ChatWidget,
        );
        pollster::block_on(markers.load_user_locations());
        assert!(markers.zoom_to_user("jose"));
        assert_eq!(map.view(), (LatLng::new(10.3, 123.9), 14));
        assert!(map.open_popup_id().is_some());
        assert!(!markers.zoom_to_user("nobody"));
    }

    #[test]
    fn collapse_toggles_content() {
        let (h, _map, markers) = widget(FakeHttp::new(), MarkerStyle::Minimap);
        assert!(pollster::block_on(async {
            markers.handle(MarkerAction::ToggleCollapse).await;
            h.ui.is_hidden("minimap-content")
        }));
        assert!(!markers.toggle());
        assert!(!h.ui.is_hidden("minimap-content"));
        assert_eq!(
            UserMarkers::<FakeHttp>::subscriptions(MarkerStyle::Minimap).lookup("toggle-minimap", "click"),
            Some(MarkerAction::ToggleCollapse)
        );
    }
}
