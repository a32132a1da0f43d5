use std::cell::RefCell;
use std::rc::Rc;

use api::{DashboardConfig, csrf_token};
use console_error_panic_hook::set_once;
use dashboard::admin_users::{RowAction, TableAction, UsersTable};
use dashboard::alert_form::{AlertForm, AlertRecipient};
use dashboard::animations::{BACKGROUND, Season, WeatherAnimations};
use dashboard::chat::{AdminChat, AdminChatHistory, UserChat};
use dashboard::user_markers::{MarkerStyle, OVERVIEW_ZOOM, PHILIPPINES_CENTER, UserMarkers};
use dashboard::{
    AdminUserActions, Context, LocationTracker, Notifications, Ui, WeatherAlertModal, WeatherMap,
};
use foundation::LatLng;
use history::{InMemorySessionStore, LocalStorageSessionStore, SessionStore};
use runtime::TimerSet;
use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlDocument};

mod dom;
mod leaflet;
mod logging;
mod platform;
mod wiring;

use dom::{DomUi, document};
use leaflet::{LeafletMap, MapOptions};
use platform::{BrowserClock, BrowserGeolocator, GlooHttp};
use wiring::{bind, bind_async, closest_with, on_document, on_escape, poll};

type Ctx = Rc<Context<GlooHttp>>;

const RAIN_TICK_MS: u32 = 50;

/// Controllers that page templates reach through exported functions.
#[derive(Default)]
struct PageState {
    timers: TimerSet,
    users: Option<Rc<AdminUserActions<GlooHttp>>>,
    animations: Option<Rc<WeatherAnimations>>,
}

thread_local! {
    static PAGE: RefCell<PageState> = RefCell::new(PageState::default());
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    logging::init();
    Ok(())
}

fn config() -> DashboardConfig {
    let key = web_sys::window()
        .and_then(|w| js_sys::Reflect::get(&w, &JsValue::from_str("OPENWEATHER_API_KEY_FROM_ENV")).ok())
        .and_then(|v| v.as_string());
    let config = DashboardConfig::default().with_api_key(key);
    if !config.has_api_key() {
        warn!("OpenWeatherMap API key missing; weather overlays are disabled");
    }
    config
}

fn csrf(doc: &Document) -> Option<String> {
    let cookies = doc.dyn_ref::<HtmlDocument>()?.cookie().ok()?;
    let raw = csrf_token(&cookies)?;
    Some(
        js_sys::decode_uri_component(&raw)
            .map(String::from)
            .unwrap_or(raw),
    )
}

fn context(doc: &Document) -> Ctx {
    let ui: Rc<dyn Ui> = Rc::new(DomUi::new(doc.clone()));
    let ctx = Context::new(
        GlooHttp,
        config(),
        ui,
        Rc::new(BrowserClock),
        Rc::new(BrowserGeolocator),
    )
    .with_csrf(csrf(doc));
    Rc::new(ctx)
}

fn with_timers(f: impl FnOnce(&mut TimerSet)) {
    PAGE.with(|page| f(&mut page.borrow_mut().timers));
}

fn reload() {
    if let Some(location) = web_sys::window().map(|w| w.location()) {
        if let Err(e) = location.reload() {
            error!("page reload failed: {e:?}");
        }
    }
}

fn small_map(element_id: &str, max_zoom: u8) -> Rc<LeafletMap> {
    Rc::new(LeafletMap::create(
        element_id,
        &MapOptions {
            center: PHILIPPINES_CENTER,
            zoom: OVERVIEW_ZOOM,
            min_zoom: 3,
            max_zoom,
            zoom_control: false,
        },
    ))
}

/// Wires every widget present on the current page.
#[wasm_bindgen]
pub fn init_page() {
    let Some(doc) = document() else {
        error!("no document; dashboard not started");
        return;
    };
    let ctx = context(&doc);
    let ui = ctx.ui();

    if ui.exists("weather-map") {
        init_weather_map(&doc, &ctx);
    }
    if ui.exists(MarkerStyle::Minimap.map_element()) {
        init_user_markers(&doc, &ctx, MarkerStyle::Minimap, small_map(MarkerStyle::Minimap.map_element(), 10));
    }
    if ui.exists("chat-messages") {
        if ui.exists("weather-map-panel") {
            init_user_chat(&doc, &ctx);
        } else {
            init_admin_chat(&doc, &ctx);
        }
    }
    if ui.exists("notification-bell-btn") {
        init_notifications(&doc, &ctx);
    }
    if ui.exists("editUserForm") {
        init_user_actions(&doc, &ctx);
    }
    if ui.exists("users-table-body") {
        init_users_table(&doc, &ctx);
    }
    if ui.exists("alert-form") {
        init_alert_form(&doc, &ctx);
    }
    if ui.exists(BACKGROUND) {
        init_animations(&doc, &ctx);
    }
    if doc.body().is_some_and(|b| b.has_attribute("data-track-location")) {
        let tracker = LocationTracker::new(ctx.clone());
        spawn_local(async move {
            if let Err(e) = tracker.start().await {
                warn!("location tracking stopped: {e}");
            }
        });
    }
    info!("dashboard page initialized");
}

fn init_weather_map(doc: &Document, ctx: &Ctx) {
    let cfg = &ctx.config;
    let leaflet = Rc::new(LeafletMap::create(
        "weather-map",
        &MapOptions {
            center: cfg.default_center,
            zoom: cfg.default_zoom,
            min_zoom: cfg.min_zoom,
            max_zoom: cfg.max_zoom,
            zoom_control: true,
        },
    ));
    leaflet.add_control(&WeatherMap::<GlooHttp>::layer_control_html(), "topright");

    let admin = ctx.ui().exists("alert-mode-toggle");
    let map = Rc::new(WeatherMap::new(ctx.clone(), leaflet.clone(), admin));
    map.init();
    {
        let map = map.clone();
        bind_async(doc, &WeatherMap::<GlooHttp>::subscriptions(admin), move |action| {
            let map = map.clone();
            async move { map.handle(action).await }
        });
    }
    {
        let map = map.clone();
        leaflet.on_click(move |at| {
            let map = map.clone();
            spawn_local(async move { map.on_map_click(at).await });
        });
    }
    {
        let map = map.clone();
        spawn_local(async move { map.get_current_location().await });
    }

    if admin {
        init_user_markers(doc, ctx, MarkerStyle::AdminMap, leaflet);
        init_alert_modal(doc, ctx);
    }
}

fn init_user_markers(doc: &Document, ctx: &Ctx, style: MarkerStyle, leaflet: Rc<LeafletMap>) -> Rc<UserMarkers<GlooHttp>> {
    let markers = Rc::new(UserMarkers::new(ctx.clone(), leaflet, style));
    markers.init();
    {
        let markers = markers.clone();
        bind_async(doc, &UserMarkers::<GlooHttp>::subscriptions(style), move |action| {
            let markers = markers.clone();
            async move { markers.handle(action).await }
        });
    }
    let schedule = markers.schedule();
    let polled = markers.clone();
    with_timers(|timers| {
        poll(timers, schedule, move || {
            let markers = polled.clone();
            async move { markers.load_user_locations().await }
        })
    });
    markers
}

fn init_alert_modal(doc: &Document, ctx: &Ctx) {
    let modal = Rc::new(WeatherAlertModal::new(ctx.clone()));
    {
        let modal = modal.clone();
        bind_async(doc, &WeatherAlertModal::<GlooHttp>::subscriptions(), move |action| {
            let modal = modal.clone();
            async move { modal.handle(action).await }
        });
    }
    {
        let modal = modal.clone();
        on_document(doc, "click", move |_, target| {
            let Some((button, username)) = closest_with(target, "data-username") else {
                return;
            };
            let coord = |attr: &str| button.get_attribute(attr).and_then(|v| v.parse::<f64>().ok());
            let (Some(lat), Some(lng)) = (coord("data-lat"), coord("data-lng")) else {
                return;
            };
            let email = button.get_attribute("data-email").unwrap_or_default();
            let modal = modal.clone();
            spawn_local(async move { modal.open(&username, &email, LatLng::new(lat, lng)).await });
        });
    }
    on_escape(doc, move || modal.close());
}

fn init_user_chat(doc: &Document, ctx: &Ctx) {
    let store: Box<dyn SessionStore> = match LocalStorageSessionStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("chat history kept in memory only: {e}");
            Box::new(InMemorySessionStore::new())
        }
    };
    let mut chat = UserChat::new(ctx.clone(), store);
    if ctx.ui().exists("chat-weather-map") {
        chat = chat.with_map(small_map("chat-weather-map", 18));
    }
    let chat = Rc::new(chat);
    chat.init();
    {
        let chat = chat.clone();
        bind_async(doc, &UserChat::<GlooHttp>::subscriptions(), move |action| {
            let chat = chat.clone();
            async move { chat.handle(action).await }
        });
    }
    {
        let chat = chat.clone();
        bind_async(
            doc,
            &dashboard::TemperatureAlertDialog::<GlooHttp>::subscriptions(),
            move |action| {
                let chat = chat.clone();
                async move { chat.dialog().handle(action).await }
            },
        );
    }
    {
        let chat = chat.clone();
        on_document(doc, "click", move |ev, target| {
            if let Some((_, id)) = closest_with(target, "data-delete-session") {
                ev.stop_propagation();
                chat.delete_session(&id);
            } else if let Some((_, id)) = closest_with(target, "data-session-id") {
                chat.load_session(&id);
            }
        });
    }
    spawn_local(async move { chat.locate_user().await });
}

fn init_admin_chat(doc: &Document, ctx: &Ctx) {
    let mut chat = AdminChat::new(ctx.clone());
    if ctx.ui().exists(MarkerStyle::ChatWidget.map_element()) {
        let widget_map = small_map(MarkerStyle::ChatWidget.map_element(), 18);
        chat = chat.with_markers(init_user_markers(doc, ctx, MarkerStyle::ChatWidget, widget_map));
    }
    let chat = Rc::new(chat);
    chat.init();
    {
        let chat = chat.clone();
        bind_async(doc, &AdminChat::<GlooHttp>::subscriptions(), move |action| {
            let chat = chat.clone();
            async move { chat.handle(action).await }
        });
    }

    let history = Rc::new(AdminChatHistory::new(ctx.clone(), chat));
    {
        let history = history.clone();
        bind_async(doc, &AdminChatHistory::<GlooHttp>::subscriptions(), move |action| {
            let history = history.clone();
            async move { history.handle(action).await }
        });
    }
    on_document(doc, "click", move |ev, target| {
        let index = |attr: &str| closest_with(target, attr).and_then(|(_, v)| v.parse::<usize>().ok());
        if let Some(i) = index("data-delete-index") {
            ev.stop_propagation();
            let history = history.clone();
            spawn_local(async move { history.delete(i).await });
        } else if let Some(i) = index("data-load-index") {
            history.load(i);
        }
    });
}

fn init_notifications(doc: &Document, ctx: &Ctx) {
    let bell = Rc::new(Notifications::new(ctx.clone()));
    {
        let bell = bell.clone();
        bind_async(doc, &Notifications::<GlooHttp>::subscriptions(), move |action| {
            let bell = bell.clone();
            async move { bell.handle(action).await }
        });
    }
    {
        let bell = bell.clone();
        on_document(doc, "click", move |_, target| {
            if let Some((_, id)) = closest_with(target, "data-mark-read") {
                if let Ok(id) = id.parse::<i64>() {
                    let bell = bell.clone();
                    spawn_local(async move {
                        bell.mark_as_read(id).await;
                    });
                }
                return;
            }
            let inside = |sel: &str| target.closest(sel).ok().flatten().is_some();
            if bell.is_open() && !inside("#notification-dropdown") && !inside("#notification-bell-btn") {
                bell.close_dropdown();
            }
        });
    }
    let schedule = bell.schedule();
    with_timers(|timers| {
        poll(timers, schedule, move || {
            let bell = bell.clone();
            async move { bell.fetch().await }
        })
    });
}

fn init_user_actions(doc: &Document, ctx: &Ctx) {
    let actions = Rc::new(AdminUserActions::new(ctx.clone()));
    {
        let actions = actions.clone();
        bind_async(doc, &AdminUserActions::<GlooHttp>::subscriptions(), move |action| {
            let actions = actions.clone();
            async move {
                if actions.handle(action).await {
                    reload();
                }
            }
        });
    }
    {
        let actions = actions.clone();
        on_escape(doc, move || actions.close_all());
    }
    PAGE.with(|page| page.borrow_mut().users = Some(actions));
}

fn user_actions() -> Option<Rc<AdminUserActions<GlooHttp>>> {
    PAGE.with(|page| page.borrow().users.clone())
}

/// Opens the read-only user dialog; called from the rows' buttons.
#[wasm_bindgen]
pub fn view_user(user_id: i64) {
    if let Some(actions) = user_actions() {
        spawn_local(async move { actions.view(user_id).await });
    }
}

#[wasm_bindgen]
pub fn edit_user(user_id: i64) {
    if let Some(actions) = user_actions() {
        spawn_local(async move { actions.edit(user_id).await });
    }
}

#[wasm_bindgen]
pub fn delete_user(user_id: i64) {
    if let Some(actions) = user_actions() {
        spawn_local(async move { actions.delete(user_id).await });
    }
}

fn embedded_users(doc: &Document) -> Option<String> {
    doc.get_element_by_id("users-table-body")?
        .get_attribute("data-users")
}

fn init_users_table(doc: &Document, ctx: &Ctx) {
    let table = Rc::new(UsersTable::new(ctx.clone()));
    let load = {
        let table = table.clone();
        let doc = doc.clone();
        move || match embedded_users(&doc).map(|raw| table.load_json(&raw)) {
            Some(Ok(n)) => info!("users table loaded {n} rows"),
            Some(Err(e)) => error!("users table data unreadable: {e}"),
            None => warn!("users table has no embedded data"),
        }
    };
    load();
    {
        let table = table.clone();
        bind(doc, &UsersTable::<GlooHttp>::subscriptions(), move |action| {
            if action == TableAction::Refresh {
                load();
            }
            table.handle(action);
        });
    }
    on_document(doc, "click", move |_, target| {
        let Some((button, action)) = closest_with(target, "data-action") else {
            return;
        };
        let id = button.get_attribute("data-user-id").and_then(|v| v.parse::<i64>().ok());
        if let (Some(action), Some(id)) = (RowAction::parse(&action), id) {
            table.row_action(action, id);
        }
    });
}

fn picker_users(doc: &Document) -> Vec<AlertRecipient> {
    let Ok(items) = doc.query_selector_all(".user-item") else {
        return Vec::new();
    };
    (0..items.length())
        .filter_map(|i| items.item(i)?.dyn_into::<Element>().ok())
        .filter_map(|el| {
            let user = AlertRecipient {
                id: el.get_attribute("data-user-id")?,
                name: el.get_attribute("data-name").unwrap_or_default(),
                email: el.get_attribute("data-email").unwrap_or_default(),
            };
            el.set_id(&user.item_id());
            Some(user)
        })
        .collect()
}

fn init_alert_form(doc: &Document, ctx: &Ctx) {
    let form = Rc::new(AlertForm::new(ctx.clone(), picker_users(doc)));
    form.init();
    {
        let form = form.clone();
        bind(doc, &AlertForm::<GlooHttp>::subscriptions(), move |action| {
            form.handle(action);
        });
    }
    {
        let form = form.clone();
        on_document(doc, "click", move |ev, target| {
            if let Some((_, id)) = closest_with(target, "data-remove-user") {
                ev.stop_propagation();
                form.remove_user(&id);
            } else if let Some((item, id)) = closest_with(target, "data-user-id") {
                if item.class_list().contains("user-item") {
                    form.toggle_user(&id);
                }
            }
        });
    }
    on_escape(doc, move || form.hide());
}

fn init_animations(doc: &Document, ctx: &Ctx) {
    let anim = Rc::new(WeatherAnimations::new(ctx.ui.clone(), ctx.clock.clone()));
    anim.start();
    if let Some(background) = doc.get_element_by_id(BACKGROUND) {
        if let Some(season) = background.get_attribute("data-season").as_deref().and_then(Season::parse) {
            anim.set_season(season);
        }
        anim.set_raining(background.has_attribute("data-rain"));
    }
    {
        let anim = anim.clone();
        with_timers(|timers| {
            timers.insert(
                "animations",
                Box::new(platform::IntervalHandle::every(RAIN_TICK_MS, move || anim.tick())),
            )
        });
    }
    {
        let anim = anim.clone();
        on_document(doc, "keydown", move |ev, _| {
            let key = ev.dyn_ref::<web_sys::KeyboardEvent>().map(|k| k.key());
            if matches!(key.as_deref(), Some("t" | "T")) {
                anim.trigger_thunder();
            }
        });
    }
    PAGE.with(|page| page.borrow_mut().animations = Some(anim));
}

/// Fires the thunder flash by hand.
#[wasm_bindgen]
pub fn trigger_thunder() -> bool {
    PAGE.with(|page| page.borrow().animations.clone())
        .is_some_and(|anim| anim.trigger_thunder())
}

/// Cancels every poll and animation interval on the page.
#[wasm_bindgen]
pub fn stop_polling() {
    with_timers(|timers| timers.cancel_all());
    info!("page polling stopped");
}
