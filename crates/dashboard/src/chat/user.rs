use std::cell::RefCell;
use std::rc::Rc;

use api::{ChatMessage, ChatWeatherInfo, ChatbotRequest, HttpClient};
use foundation::{escape_html, time_ago_long, LatLng, SessionId};
use history::{ChatSession, SessionHistory, SessionStore, StoreError};
use layers::{BaseLayerName, MapSurface, MarkerSpec, OverlayKind, SelectionMarker, WeatherOverlays};
use runtime::SubscriptionTable;
use tracing::{debug, error, info, warn};
use weather::{chat_weather_info, parse_degrees, weather_icon, TemperatureBand};

use super::{cap_context, ChatPhase, ChatShell, HistorySidebar, TemperatureAlertDialog, CHAT_INPUT, CLIMACHAT, SEND_BUTTON};
use crate::context::Context;
use crate::ui::trimmed_value;
use crate::user_markers::{OVERVIEW_ZOOM, PHILIPPINES_CENTER};

pub const USER_WELCOME: &str = "Hello! I'm ClimaChat, your personal weather assistant. I can help you with current weather, forecasts, safety tips, and more. What would you like to know?";
const APOLOGY: &str = "I'm experiencing some technical difficulties right now. Please try again in a moment!";

const WEATHER_PANEL: &str = "weather-map-panel";
const WEATHER_DISPLAY: &str = "weather-data-display";
const HISTORY_SEARCH: &str = "history-search";

const WEATHER_ZOOM: u8 = 10;

const LOCATION_PHRASES: [&str; 7] = [
    "my location",
    "my current location",
    "current location",
    "here",
    "my area",
    "my place",
    "where i am",
];
const GENERAL_PHRASES: [&str; 9] = [
    "weather today",
    "current weather",
    "weather now",
    "what is the weather",
    "whats the weather",
    "what's the weather",
    "how is the weather",
    "hows the weather",
    "how's the weather",
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UserChatAction {
    Send,
    ToggleHistory,
    CloseHistory,
    NewChat,
    SearchHistory,
}

/// What kind of weather a message asks about, if any.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContextKind {
    /// The user's own geolocated spot.
    OwnLocation,
    /// Whatever the panel currently shows.
    General,
    None,
}

impl ContextKind {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if LOCATION_PHRASES.iter().any(|p| lower.contains(p)) {
            ContextKind::OwnLocation
        } else if GENERAL_PHRASES.iter().any(|p| lower.contains(p)) {
            ContextKind::General
        } else {
            ContextKind::None
        }
    }

    /// Picks the readings to attach to a request.
    ///
    /// A location question without a geolocated reading falls back to the
    /// panel when the message also reads as a general question.
    pub fn pick<'a>(
        message: &str,
        own: Option<&'a ChatWeatherInfo>,
        shown: Option<&'a ChatWeatherInfo>,
    ) -> Option<&'a ChatWeatherInfo> {
        let lower = message.to_lowercase();
        let general = GENERAL_PHRASES.iter().any(|p| lower.contains(p));
        match (Self::classify(message), own) {
            (ContextKind::OwnLocation, Some(own)) => Some(own),
            (ContextKind::OwnLocation, None) if general => shown,
            (ContextKind::General, _) => shown,
            _ => None,
        }
    }
}

fn panel_row(label: &str, value: &str) -> String {
    format!(
        r#"<div class="flex justify-between text-sm"><span class="text-gray-600">{label}</span><span class="font-medium text-gray-900">{}</span></div>"#,
        escape_html(value)
    )
}

/// The side panel card for a reading, with its comfort band badge.
pub fn weather_panel_html(info: &ChatWeatherInfo) -> String {
    let badge = TemperatureBand::for_text(&info.temperature)
        .map(|band| {
            format!(
                r#"<div class="{} {} rounded-lg px-3 py-2 mb-3"><div class="flex items-center gap-2"><span class="text-lg">{}</span><span class="font-semibold text-sm">{}</span></div><p class="text-xs mt-1">{}</p></div>"#,
                band.background_class(),
                band.text_class(),
                band.icon(),
                band.level(),
                band.message()
            )
        })
        .unwrap_or_default();
    let rows: String = [
        ("Feels like", info.feels_like.as_str()),
        ("Humidity", info.humidity.as_str()),
        ("Wind", info.wind_speed.as_str()),
        ("Pressure", info.pressure.as_str()),
    ]
    .iter()
    .map(|(label, value)| panel_row(label, value))
    .collect();
    format!(
        r#"<div class="text-center mb-3"><p class="text-sm font-semibold text-gray-700">{location}</p><div class="text-4xl my-2">{icon}</div><p class="text-3xl font-bold text-gray-900">{temp}</p><p class="text-sm text-gray-600">{condition}</p></div>{badge}<div class="space-y-1">{rows}</div>"#,
        location = escape_html(&info.location),
        icon = weather_icon(&info.condition_main),
        temp = escape_html(&info.temperature),
        condition = escape_html(&info.condition),
    )
}

fn session_card_html(session: &ChatSession, active: bool, now_ms: i64) -> String {
    let ago = time_ago_long((now_ms - session.timestamp) / 1000);
    let (frame, marker) = if active {
        (
            "bg-blue-50 border-blue-300",
            r#"<span class="text-xs text-blue-600 font-medium">● Active</span>"#,
        )
    } else {
        ("bg-gray-50 border-gray-200 hover:bg-gray-100", "")
    };
    format!(
        r#"<div class="{frame} rounded-lg p-3 border transition-colors relative group"><button class="absolute top-2 right-2 opacity-0 group-hover:opacity-100 transition-opacity bg-red-500 hover:bg-red-600 text-white rounded p-1 z-10" data-delete-session="{id}" title="Delete conversation">✕</button><div class="cursor-pointer" data-session-id="{id}"><div class="flex items-center justify-between mb-1"><p class="text-xs font-medium text-gray-500">{ago}</p>{marker}</div><p class="text-sm text-gray-800 font-medium mb-1 line-clamp-1">{title}</p><p class="text-xs text-gray-600 line-clamp-2">{preview}</p></div></div>"#,
        id = escape_html(&session.id),
        title = escape_html(session.display_title()),
        preview = escape_html(&session.preview()),
    )
}

struct UserChatState {
    conversation: Vec<ChatMessage>,
    session: SessionId,
    user_location: Option<String>,
    shown: Option<ChatWeatherInfo>,
    own: Option<ChatWeatherInfo>,
    marker: SelectionMarker,
    overlays: WeatherOverlays,
}

/// The signed-in user's assistant, with its weather side panel and the
/// conversations saved in the browser.
pub struct UserChat<H> {
    ctx: Rc<Context<H>>,
    shell: ChatShell,
    sidebar: HistorySidebar,
    history: RefCell<SessionHistory>,
    dialog: TemperatureAlertDialog<H>,
    map: Option<Rc<dyn MapSurface>>,
    state: RefCell<UserChatState>,
}

impl<H: HttpClient> UserChat<H> {
    pub fn new(ctx: Rc<Context<H>>, store: Box<dyn SessionStore>) -> Self {
        let history = SessionHistory::new(store).with_limit(ctx.config.saved_sessions_limit);
        let state = UserChatState {
            conversation: Vec::new(),
            session: new_session(&ctx),
            user_location: None,
            shown: None,
            own: None,
            marker: SelectionMarker::new(),
            overlays: WeatherOverlays::new(
                ctx.config.openweather_tile_url.clone(),
                ctx.config.openweather_api_key.clone(),
            ),
        };
        Self {
            dialog: TemperatureAlertDialog::new(ctx.clone()),
            ctx,
            shell: ChatShell::new(CLIMACHAT),
            sidebar: HistorySidebar::default(),
            history: RefCell::new(history),
            map: None,
            state: RefCell::new(state),
        }
    }

    /// Attaches the small map beside the weather panel.
    pub fn with_map(mut self, map: Rc<dyn MapSurface>) -> Self {
        self.map = Some(map);
        self
    }

    pub fn subscriptions() -> SubscriptionTable<UserChatAction> {
        SubscriptionTable::new()
            .on(SEND_BUTTON, "click", UserChatAction::Send)
            .on(CHAT_INPUT, "keypress", UserChatAction::Send)
            .on("toggle-history-btn", "click", UserChatAction::ToggleHistory)
            .on("close-history-sidebar", "click", UserChatAction::CloseHistory)
            .on("new-chat-btn", "click", UserChatAction::NewChat)
            .on(HISTORY_SEARCH, "input", UserChatAction::SearchHistory)
    }

    pub async fn handle(&self, action: UserChatAction) {
        match action {
            UserChatAction::Send => self.send_message().await,
            UserChatAction::ToggleHistory => self.toggle_history(),
            UserChatAction::CloseHistory => self.sidebar.close(self.ctx.ui()),
            UserChatAction::NewChat => self.new_chat(),
            UserChatAction::SearchHistory => self.search_history(),
        }
    }

    pub fn dialog(&self) -> &TemperatureAlertDialog<H> {
        &self.dialog
    }

    pub fn init(&self) {
        self.shell.clear(self.ctx.ui());
        self.shell
            .append(self.ctx.ui(), self.ctx.clock.as_ref(), USER_WELCOME, false);
        if let Some(map) = &self.map {
            map.set_view(PHILIPPINES_CENTER, OVERVIEW_ZOOM);
            map.add_tile_layer(&BaseLayerName::Streets.spec());
        }
    }

    pub fn phase(&self) -> ChatPhase {
        self.shell.phase()
    }

    pub fn session_id(&self) -> SessionId {
        self.state.borrow().session.clone()
    }

    pub fn conversation(&self) -> Vec<ChatMessage> {
        self.state.borrow().conversation.clone()
    }

    pub fn user_location(&self) -> Option<String> {
        self.state.borrow().user_location.clone()
    }

    pub fn shown_weather(&self) -> Option<ChatWeatherInfo> {
        self.state.borrow().shown.clone()
    }

    pub fn saved_sessions(&self) -> Result<Vec<ChatSession>, StoreError> {
        self.history.borrow().list()
    }

    /// Geolocates the user, names the place and shows its weather.
    pub async fn locate_user(&self) {
        let at = match self.ctx.geo.locate().await {
            Ok(at) => at,
            Err(e) => {
                warn!("{e}");
                return;
            }
        };
        match self.ctx.openweather().reverse_geocode(at.lat, at.lng).await {
            Ok(places) => {
                if let Some(place) = places.first() {
                    self.state.borrow_mut().user_location = Some(place.name.clone());
                }
            }
            Err(e) => error!("reverse geocoding failed: {e}"),
        }
        self.fetch_and_display_weather(at).await;
    }

    pub async fn fetch_and_display_weather(&self, at: LatLng) {
        match self.ctx.openweather().current(at.lat, at.lng).await {
            Ok(current) => {
                let Some(info) = chat_weather_info(&current) else {
                    warn!("weather reply without readings");
                    return;
                };
                self.state.borrow_mut().own = Some(info.clone());
                self.display_weather(info).await;
            }
            Err(e) => error!("error fetching weather: {e}"),
        }
    }

    /// Fills the side panel, moves the map and raises the temperature
    /// dialog for extreme readings.
    pub async fn display_weather(&self, info: ChatWeatherInfo) {
        let ui = self.ctx.ui();
        ui.set_class(WEATHER_PANEL, "hidden", false);
        ui.set_html(WEATHER_DISPLAY, &weather_panel_html(&info));

        if let (Some(map), Some(coords)) = (&self.map, info.coordinates.as_ref()) {
            let at = LatLng::new(coords.lat, coords.lon);
            map.set_view(at, WEATHER_ZOOM);
            let popup = format!(
                "<b>{}</b><br>{} - {}",
                escape_html(&info.location),
                escape_html(&info.temperature),
                escape_html(&info.condition)
            );
            let mut state = self.state.borrow_mut();
            state
                .marker
                .place(map.as_ref(), &MarkerSpec::pin(at).with_popup(popup, true));
            if let Err(e) = state.overlays.add_weather_layer(map.as_ref(), OverlayKind::Temp) {
                debug!("temperature overlay skipped: {e}");
            }
        }

        let extreme = TemperatureBand::for_text(&info.temperature).filter(|b| b.is_extreme());
        let degrees = parse_degrees(&info.temperature);
        let condition = (!info.condition_main.is_empty()).then_some(info.condition_main.as_str());
        self.state.borrow_mut().shown = Some(info.clone());
        if let (Some(_), Some(degrees)) = (extreme, degrees) {
            self.dialog
                .check_and_show(degrees, &info.location, condition)
                .await;
        }
    }

    pub async fn send_message(&self) {
        let (ui, clock) = (self.ctx.ui(), self.ctx.clock.as_ref());
        let Some(pending) = self.shell.begin(ui, clock) else {
            return;
        };
        let reply = self.ask(&pending.message).await;
        self.shell.finish(ui, clock, pending, &reply);
        self.save_current();
    }

    async fn ask(&self, message: &str) -> String {
        let request = {
            let state = self.state.borrow();
            ChatbotRequest {
                message: message.to_string(),
                conversation_history: state.conversation.clone(),
                user_location: state.user_location.clone(),
                current_weather_data: ContextKind::pick(message, state.own.as_ref(), state.shown.as_ref())
                    .cloned(),
                ..ChatbotRequest::default()
            }
        };
        if request.current_weather_data.is_some() {
            debug!("attaching current weather to chat request");
        }

        match self.ctx.server().chatbot(&request).await {
            Ok(reply) => {
                let text = reply.response.unwrap_or_default();
                {
                    let mut state = self.state.borrow_mut();
                    state.conversation.push(ChatMessage::user(message));
                    state.conversation.push(ChatMessage::assistant(text.clone()));
                    cap_context(&mut state.conversation, self.ctx.config.chat_context_limit);
                }
                if let Some(info) = reply.weather_info {
                    self.display_weather(info).await;
                }
                self.ctx.trace("chat", format!("user reply {} chars", text.len()));
                text
            }
            Err(e) => {
                error!("chatbot api error: {e}");
                APOLOGY.to_string()
            }
        }
    }

    fn save_current(&self) {
        let (id, conversation) = {
            let state = self.state.borrow();
            (state.session.to_string(), state.conversation.clone())
        };
        let now = self.ctx.clock.now_ms();
        if let Err(e) = self.history.borrow_mut().save(&id, &conversation, now) {
            warn!("could not save chat session: {e}");
        }
    }

    fn render_sessions(&self, sessions: Result<Vec<ChatSession>, StoreError>) {
        let ui = self.ctx.ui();
        let sessions = match sessions {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!("could not read saved sessions: {e}");
                Vec::new()
            }
        };
        if sessions.is_empty() {
            self.sidebar.show_empty(ui);
            return;
        }
        let current = self.session_id();
        let now = self.ctx.clock.now_ms();
        let html: String = sessions
            .iter()
            .map(|s| session_card_html(s, s.id == current.as_str(), now))
            .collect();
        self.sidebar.show_items(ui, &html);
    }

    pub fn is_history_open(&self) -> bool {
        self.sidebar.is_open()
    }

    pub fn toggle_history(&self) {
        if self.sidebar.toggle(self.ctx.ui()) {
            self.render_sessions(self.history.borrow().list());
        }
    }

    /// Filters the sidebar by the search box; a blank query lists everything.
    pub fn search_history(&self) {
        let query = trimmed_value(self.ctx.ui(), HISTORY_SEARCH);
        let found = if query.is_empty() {
            self.history.borrow().list()
        } else {
            self.history.borrow().search(&query)
        };
        self.render_sessions(found);
    }

    /// Saves the open conversation, then replays the stored one.
    pub fn load_session(&self, id: &str) -> bool {
        let session = match self.history.borrow().get(id) {
            Ok(session) => session,
            Err(e) => {
                error!(session = id, "could not load session: {e}");
                return false;
            }
        };
        self.save_current();
        {
            let mut state = self.state.borrow_mut();
            state.session = SessionId::from_string(session.id.clone());
            state.conversation = session.messages.clone();
        }
        let (ui, clock) = (self.ctx.ui(), self.ctx.clock.as_ref());
        self.shell.clear(ui);
        for (text, is_user) in session.replay() {
            self.shell.append(ui, clock, text, is_user);
        }
        self.sidebar.close(ui);
        info!(session = id, "chat session loaded");
        true
    }

    pub fn delete_session(&self, id: &str) {
        if !self
            .ctx
            .ui()
            .confirm("Are you sure you want to delete this conversation?")
        {
            return;
        }
        let deleted = self.history.borrow_mut().delete(id);
        match deleted {
            Ok(true) => {
                if self.session_id().as_str() == id {
                    self.start_fresh();
                }
                info!(session = id, "chat session deleted");
            }
            Ok(false) => debug!(session = id, "session already gone"),
            Err(e) => error!("could not delete session: {e}"),
        }
        self.render_sessions(self.history.borrow().list());
    }

    /// Saves the open conversation and starts an empty one.
    pub fn new_chat(&self) {
        if self.shell.phase() == ChatPhase::Sending {
            return;
        }
        self.save_current();
        self.start_fresh();
        self.sidebar.close(self.ctx.ui());
    }

    fn start_fresh(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.session = new_session(&self.ctx);
            state.conversation.clear();
        }
        let (ui, clock) = (self.ctx.ui(), self.ctx.clock.as_ref());
        self.shell.clear(ui);
        self.shell.append(ui, clock, USER_WELCOME, false);
    }
}

fn new_session<H>(ctx: &Context<H>) -> SessionId {
    SessionId::generate(ctx.clock.now_ms().max(0) as u64, ctx.clock.random())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{CHAT_MESSAGES, HISTORY_ITEMS};
    use crate::testing::*;
    use history::InMemorySessionStore;
    use layers::{MemoryMapSurface, TileRole};
    use pretty_assertions::assert_eq;
    use std::pin::pin;
    use std::task::Poll;

    const REPLY: &str = r#"{"success": true, "response": "It is warm and cloudy."}"#;

    fn setup(http: FakeHttp) -> (Harness, UserChat<FakeHttp>) {
        let h = Harness::new(http);
        let chat = UserChat::new(h.ctx.clone(), Box::new(InMemorySessionStore::new()));
        (h, chat)
    }

    fn say(h: &Harness, chat: &UserChat<FakeHttp>, text: &str) {
        h.ui.type_into(CHAT_INPUT, text);
        pollster::block_on(chat.handle(UserChatAction::Send));
    }

    fn info(temp: &str) -> ChatWeatherInfo {
        ChatWeatherInfo {
            location: "Manila, PH".into(),
            temperature: temp.into(),
            condition: "Broken clouds".into(),
            condition_main: "Clouds".into(),
            ..ChatWeatherInfo::default()
        }
    }

    #[test]
    fn classifies_context_phrases() {
        assert_eq!(ContextKind::classify("Is it raining where I am?"), ContextKind::OwnLocation);
        assert_eq!(ContextKind::classify("How's the weather in Cebu"), ContextKind::General);
        assert_eq!(ContextKind::classify("tell me a joke"), ContextKind::None);

        let (own, shown) = (info("29°C"), info("33°C"));
        assert_eq!(ContextKind::pick("weather in my area", Some(&own), Some(&shown)), Some(&own));
        assert_eq!(ContextKind::pick("current weather here", None, Some(&shown)), Some(&shown));
        assert_eq!(ContextKind::pick("my location please", None, Some(&shown)), None);
        assert_eq!(ContextKind::pick("weather now", Some(&own), None), None);
    }

    #[test]
    fn send_attaches_own_weather_and_saves() {
        let http = FakeHttp::new()
            .route("/weather?", 200, MANILA_WEATHER)
            .route("/geo/1.0/reverse", 200, r#"[{"name": "Ermita", "lat": 14.58, "lon": 120.98}]"#)
            .route_post("/api/chatbot/", 200, REPLY);
        let (h, chat) = setup(http);
        pollster::block_on(chat.locate_user());
        assert_eq!(chat.user_location().as_deref(), Some("Ermita"));

        say(&h, &chat, "What's it like in my location?");
        let body = h.http().last("/api/chatbot/").unwrap().json_body().unwrap().clone();
        assert_eq!(body["user_location"], "Ermita");
        assert_eq!(body["current_weather_data"]["temperature"], "31°C");
        assert!(body.get("is_admin").is_none());

        assert_eq!(chat.conversation().len(), 2);
        let saved = chat.saved_sessions().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, chat.session_id().as_str());
        assert_eq!(saved[0].title, "What's it like in my location?");
    }

    #[test]
    fn second_send_while_sending_is_ignored() {
        let http = FakeHttp::new().route_post("/api/chatbot/", 200, REPLY).hold("/api/chatbot/");
        let (h, chat) = setup(http);
        h.ui.type_into(CHAT_INPUT, "first");
        let mut first = pin!(chat.send_message());
        assert!(poll_once(first.as_mut()).is_pending());
        assert_eq!(chat.phase(), ChatPhase::Sending);

        h.ui.type_into(CHAT_INPUT, "second");
        pollster::block_on(chat.send_message());
        assert_eq!(h.http().count("/api/chatbot/"), 1);

        assert_eq!(poll_once(first.as_mut()), Poll::Ready(()));
        assert_eq!(chat.phase(), ChatPhase::Idle);
        assert_eq!(h.ui.nodes(CHAT_MESSAGES).len(), 2);
    }

    #[test]
    fn failed_send_apologises_and_keeps_context_empty() {
        let (h, chat) = setup(FakeHttp::new().fail("/api/chatbot/"));
        say(&h, &chat, "hello");
        let nodes = h.ui.nodes(CHAT_MESSAGES);
        assert_eq!(nodes.len(), 2);
        assert!(nodes[1].contains("technical difficulties"));
        assert!(chat.conversation().is_empty());
        assert!(chat.saved_sessions().unwrap().is_empty());
    }

    #[test]
    fn reply_weather_fills_panel_map_and_dialog() {
        let reply = r#"{"success": true, "response": "Hot in Manila.", "weather_info": {
            "location": "Manila, PH", "temperature": "36°C", "feels_like": "41°C",
            "condition": "Clear sky", "condition_main": "Clear", "humidity": "55%",
            "wind_speed": "9 km/h", "pressure": "1006 hPa", "coordinates": {"lat": 14.6, "lon": 121.0}}}"#;
        let alert = r#"{"success": true, "alert": {"level": "Very Hot", "color": "bg-red-600",
            "textColor": "text-white", "icon": "🔥", "isExtreme": true, "message": "Extreme heat!",
            "recommendations": [], "temperature": 36.0, "location": "Manila, PH"}}"#;
        let http = FakeHttp::new()
            .route_post("/api/chatbot/", 200, reply)
            .route_post("/api/temperature-alert/", 200, alert);
        let (h, chat) = setup(http);
        let map = Rc::new(MemoryMapSurface::new(LatLng::new(0.0, 0.0), 3));
        let chat = chat.with_map(map.clone());
        chat.init();
        say(&h, &chat, "weather in Manila?");

        assert!(!h.ui.has_class(WEATHER_PANEL, "hidden"));
        let panel = h.ui.html(WEATHER_DISPLAY);
        assert!(panel.contains("36°C"));
        assert!(panel.contains("Very Hot"));
        assert!(panel.contains("☀️"));
        assert_eq!(map.view(), (LatLng::new(14.6, 121.0), 10));
        assert_eq!(map.markers().len(), 1);
        assert_eq!(map.tile_layers(TileRole::Overlay).len(), 1);
        assert!(chat.dialog().is_open());
        assert_eq!(chat.shown_weather().unwrap().temperature, "36°C");
        let body = h.http().last("temperature-alert").unwrap().json_body().unwrap().clone();
        assert_eq!(body["weather_condition"], "Clear");
    }

    #[test]
    fn mild_reading_skips_the_dialog() {
        let (h, chat) = setup(FakeHttp::new());
        pollster::block_on(chat.display_weather(info("22°C")));
        assert!(h.ui.html(WEATHER_DISPLAY).contains("Comfortable"));
        assert_eq!(h.http().count("temperature-alert"), 0);
        assert!(!chat.dialog().is_open());
    }

    #[test]
    fn history_lists_searches_and_loads() {
        let (h, chat) = setup(FakeHttp::new().route_post("/api/chatbot/", 200, REPLY));
        say(&h, &chat, "rain in Davao?");
        let first = chat.session_id();
        h.clock.advance_ms(60_000);
        chat.new_chat();
        assert_ne!(chat.session_id(), first);
        say(&h, &chat, "typhoon tomorrow?");

        chat.toggle_history();
        assert!(chat.is_history_open());
        let items = h.ui.html(HISTORY_ITEMS);
        assert!(items.contains("● Active"));
        assert!(items.find("typhoon").unwrap() < items.find("Davao").unwrap());

        h.ui.type_into(HISTORY_SEARCH, "davao");
        chat.search_history();
        let items = h.ui.html(HISTORY_ITEMS);
        assert!(items.contains("Davao"));
        assert!(!items.contains("typhoon"));

        h.ui.type_into(HISTORY_SEARCH, "snowstorm");
        chat.search_history();
        assert!(!h.ui.has_class("history-empty", "hidden"));

        assert!(chat.load_session(first.as_str()));
        assert_eq!(chat.session_id(), first);
        assert_eq!(chat.conversation().len(), 2);
        assert_eq!(h.ui.nodes(CHAT_MESSAGES).len(), 2);
        assert!(!chat.is_history_open());
        assert!(!chat.load_session("session_missing"));
    }

    #[test]
    fn deleting_active_session_starts_fresh() {
        let (h, chat) = setup(FakeHttp::new().route_post("/api/chatbot/", 200, REPLY));
        say(&h, &chat, "hello");
        let active = chat.session_id();

        h.ui.answer_confirm(false);
        chat.delete_session(active.as_str());
        assert_eq!(chat.saved_sessions().unwrap().len(), 1);

        h.ui.answer_confirm(true);
        h.clock.advance_ms(5_000);
        chat.delete_session(active.as_str());
        assert!(chat.saved_sessions().unwrap().is_empty());
        assert_ne!(chat.session_id(), active);
        assert!(chat.conversation().is_empty());
        let nodes = h.ui.nodes(CHAT_MESSAGES);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].contains("personal weather assistant"));
        assert_eq!(
            h.ui.confirms(),
            vec!["Are you sure you want to delete this conversation?".to_string(); 2]
        );
    }
}
