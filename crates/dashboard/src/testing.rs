//! In-memory doubles for the page, the network, the clock and geolocation.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context as TaskContext, Poll};

use api::{ApiError, DashboardConfig, HttpClient, HttpRequest, HttpResponse, Method};
use chrono::{DateTime, FixedOffset, Utc};
use foundation::LatLng;
use futures_util::future::LocalBoxFuture;

use crate::context::Context;
use crate::env::{Clock, GeoError, Geolocator};
use crate::ui::{ToastKind, Ui};

#[derive(Debug, Default, Clone)]
pub struct FakeElement {
    pub text: String,
    pub html: String,
    pub value: String,
    pub checked: bool,
    pub hidden: bool,
    pub disabled: bool,
    pub classes: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct FakeUiState {
    elements: BTreeMap<String, FakeElement>,
    missing: BTreeSet<String>,
    nodes: Vec<(String, String, String)>,
    next_node: u64,
    toasts: Vec<(ToastKind, String)>,
    confirms: Vec<String>,
    legend: Option<Option<String>>,
    focused: Option<String>,
}

/// Page double: every id exists unless marked missing.
#[derive(Debug)]
pub struct FakeUi {
    state: RefCell<FakeUiState>,
    confirm_answer: Cell<bool>,
}

impl Default for FakeUi {
    fn default() -> Self {
        Self {
            state: RefCell::new(FakeUiState::default()),
            confirm_answer: Cell::new(true),
        }
    }
}

impl FakeUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without(self, ids: &[&str]) -> Self {
        self.state
            .borrow_mut()
            .missing
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn answer_confirm(&self, yes: bool) {
        self.confirm_answer.set(yes);
    }

    pub fn type_into(&self, id: &str, value: &str) {
        self.with_element(id, |e| e.value = value.to_string());
    }

    pub fn set_checked(&self, id: &str, checked: bool) {
        self.with_element(id, |e| e.checked = checked);
    }

    fn with_element<R>(&self, id: &str, f: impl FnOnce(&mut FakeElement) -> R) -> Option<R> {
        let mut state = self.state.borrow_mut();
        if state.missing.contains(id) {
            return None;
        }
        Some(f(state.elements.entry(id.to_string()).or_default()))
    }

    pub fn element(&self, id: &str) -> FakeElement {
        self.state
            .borrow()
            .elements
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn text(&self, id: &str) -> String {
        self.element(id).text
    }

    pub fn html(&self, id: &str) -> String {
        self.element(id).html
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.element(id).hidden
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.element(id).classes.contains(class)
    }

    pub fn toasts(&self) -> Vec<(ToastKind, String)> {
        self.state.borrow().toasts.clone()
    }

    pub fn toast_count(&self, kind: ToastKind) -> usize {
        self.state
            .borrow()
            .toasts
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn last_toast(&self) -> Option<(ToastKind, String)> {
        self.state.borrow().toasts.last().cloned()
    }

    pub fn confirms(&self) -> Vec<String> {
        self.state.borrow().confirms.clone()
    }

    pub fn legend(&self) -> Option<Option<String>> {
        self.state.borrow().legend.clone()
    }

    pub fn focused(&self) -> Option<String> {
        self.state.borrow().focused.clone()
    }

    /// Markup of the live nodes appended to `container`, oldest first.
    pub fn nodes(&self, container: &str) -> Vec<String> {
        self.state
            .borrow()
            .nodes
            .iter()
            .filter(|(c, _, _)| c == container)
            .map(|(_, _, html)| html.clone())
            .collect()
    }
}

impl Ui for FakeUi {
    fn exists(&self, id: &str) -> bool {
        !self.state.borrow().missing.contains(id)
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        self.with_element(id, |e| e.text = text.to_string()).is_some()
    }

    fn set_html(&self, id: &str, html: &str) -> bool {
        let done = self.with_element(id, |e| e.html = html.to_string()).is_some();
        if done {
            self.state.borrow_mut().nodes.retain(|(c, _, _)| c != id);
        }
        done
    }

    fn set_value(&self, id: &str, value: &str) -> bool {
        self.with_element(id, |e| e.value = value.to_string()).is_some()
    }

    fn value(&self, id: &str) -> Option<String> {
        self.with_element(id, |e| e.value.clone())
    }

    fn checked(&self, id: &str) -> bool {
        self.with_element(id, |e| e.checked).unwrap_or(false)
    }

    fn set_hidden(&self, id: &str, hidden: bool) -> bool {
        self.with_element(id, |e| e.hidden = hidden).is_some()
    }

    fn set_class(&self, id: &str, class: &str, on: bool) -> bool {
        // `classList` throws on whitespace; so does the fake.
        if class.is_empty() || class.contains(char::is_whitespace) {
            return false;
        }
        self.with_element(id, |e| {
            if on {
                e.classes.insert(class.to_string());
            } else {
                e.classes.remove(class);
            }
        })
        .is_some()
    }

    fn set_disabled(&self, id: &str, disabled: bool) -> bool {
        self.with_element(id, |e| e.disabled = disabled).is_some()
    }

    fn focus(&self, id: &str) -> bool {
        if !self.exists(id) {
            return false;
        }
        self.state.borrow_mut().focused = Some(id.to_string());
        true
    }

    fn scroll_to_bottom(&self, id: &str) -> bool {
        self.exists(id)
    }

    fn append_html(&self, container: &str, html: &str) -> Option<String> {
        if !self.exists(container) {
            return None;
        }
        let mut state = self.state.borrow_mut();
        state.next_node += 1;
        let node = format!("node-{}", state.next_node);
        state
            .nodes
            .push((container.to_string(), node.clone(), html.to_string()));
        Some(node)
    }

    fn remove_node(&self, node_id: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.nodes.len();
        state.nodes.retain(|(_, n, _)| n != node_id);
        state.nodes.len() != before
    }

    fn toast(&self, kind: ToastKind, message: &str) {
        self.state
            .borrow_mut()
            .toasts
            .push((kind, message.to_string()));
    }

    fn confirm(&self, message: &str) -> bool {
        self.state.borrow_mut().confirms.push(message.to_string());
        self.confirm_answer.get()
    }

    fn show_legend(&self, key: Option<&str>) {
        self.state.borrow_mut().legend = Some(key.map(str::to_string));
    }
}

enum Reply {
    Respond(u16, String),
    Fail,
}

/// Network double routing by URL substring; later routes win.
#[derive(Default)]
pub struct FakeHttp {
    routes: RefCell<Vec<(String, Option<Method>, Reply)>>,
    seen: RefCell<Vec<HttpRequest>>,
    held: RefCell<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, needle: &str, status: u16, body: impl Into<String>) -> Self {
        self.add(needle, None, Reply::Respond(status, body.into()));
        self
    }

    pub fn route_post(self, needle: &str, status: u16, body: impl Into<String>) -> Self {
        self.add(needle, Some(Method::Post), Reply::Respond(status, body.into()));
        self
    }

    pub fn fail(self, needle: &str) -> Self {
        self.add(needle, None, Reply::Fail);
        self
    }

    /// Requests to matching URLs stay pending for one poll before answering.
    pub fn hold(self, needle: &str) -> Self {
        self.held.borrow_mut().push(needle.to_string());
        self
    }

    pub fn set_route(&self, needle: &str, status: u16, body: impl Into<String>) {
        self.add(needle, None, Reply::Respond(status, body.into()));
    }

    fn add(&self, needle: &str, method: Option<Method>, reply: Reply) {
        self.routes
            .borrow_mut()
            .push((needle.to_string(), method, reply));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.borrow().clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.seen
            .borrow()
            .iter()
            .filter(|r| r.url.contains(needle))
            .count()
    }

    pub fn last(&self, needle: &str) -> Option<HttpRequest> {
        self.seen
            .borrow()
            .iter()
            .rev()
            .find(|r| r.url.contains(needle))
            .cloned()
    }
}

impl HttpClient for FakeHttp {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.seen.borrow_mut().push(request.clone());
        let held = self
            .held
            .borrow()
            .iter()
            .any(|needle| request.url.contains(needle.as_str()));
        if held {
            YieldOnce(false).await;
        }
        let routes = self.routes.borrow();
        let hit = routes.iter().rev().find(|(needle, method, _)| {
            request.url.contains(needle.as_str()) && method.is_none_or(|m| m == request.method)
        });
        match hit {
            Some((_, _, Reply::Respond(status, body))) => Ok(HttpResponse::new(*status, body.clone())),
            Some((_, _, Reply::Fail)) => Err(ApiError::Network("connection refused".into())),
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }
}

struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Polls a future once with a no-op waker.
pub fn poll_once<F: Future>(fut: Pin<&mut F>) -> Poll<F::Output> {
    let mut cx = TaskContext::from_waker(std::task::Waker::noop());
    fut.poll(&mut cx)
}

#[derive(Debug)]
pub struct FakeClock {
    now_ms: Cell<i64>,
    offset_s: Cell<i32>,
    randoms: RefCell<VecDeque<f64>>,
}

impl FakeClock {
    pub fn at_ms(now_ms: i64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
            offset_s: Cell::new(0),
            randoms: RefCell::new(VecDeque::new()),
        }
    }

    pub fn with_offset_hours(self, hours: i32) -> Self {
        self.offset_s.set(hours * 3600);
        self
    }

    /// Queues values for `random()`; 0.5 once exhausted.
    pub fn with_randoms(self, values: &[f64]) -> Self {
        self.randoms.borrow_mut().extend(values.iter().copied());
        self
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.get()).unwrap_or_default()
    }

    fn random(&self) -> f64 {
        self.randoms.borrow_mut().pop_front().unwrap_or(0.5)
    }

    fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.offset_s.get()).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }

    /// Jumps the clock forward and resolves at once.
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        self.advance_ms(i64::from(ms));
        Box::pin(async {})
    }
}

pub struct FakeGeo(pub Result<LatLng, GeoError>);

impl Geolocator for FakeGeo {
    fn locate(&self) -> LocalBoxFuture<'_, Result<LatLng, GeoError>> {
        let result = self.0.clone();
        Box::pin(async move { result })
    }
}

pub const NOW_MS: i64 = 1_700_000_000_000;

pub struct Harness {
    pub ui: Rc<FakeUi>,
    pub clock: Rc<FakeClock>,
    pub ctx: Rc<Context<FakeHttp>>,
}

impl Harness {
    pub fn new(http: FakeHttp) -> Self {
        Self::build(http, FakeUi::new(), FakeClock::at_ms(NOW_MS), Ok(LatLng::new(14.5995, 120.9842)))
    }

    pub fn build(http: FakeHttp, ui: FakeUi, clock: FakeClock, geo: Result<LatLng, GeoError>) -> Self {
        let ui = Rc::new(ui);
        let clock = Rc::new(clock);
        let config = DashboardConfig::default().with_api_key(Some("KEY".into()));
        let ctx = Context::new(http, config, ui.clone(), clock.clone(), Rc::new(FakeGeo(geo)))
            .with_csrf(Some("tok".into()));
        Self {
            ui,
            clock,
            ctx: Rc::new(ctx),
        }
    }

    pub fn http(&self) -> &FakeHttp {
        &self.ctx.http
    }
}

pub const MANILA_WEATHER: &str = r#"{
    "cod": 200, "name": "Manila",
    "coord": {"lat": 14.5995, "lon": 120.9842},
    "sys": {"country": "PH"},
    "main": {"temp": 31.4, "feels_like": 37.2, "humidity": 70, "pressure": 1008},
    "weather": [{"main": "Clouds", "description": "broken clouds"}],
    "wind": {"speed": 3.1}, "visibility": 10000, "clouds": {"all": 75}
}"#;

pub const MANILA_FORECAST: &str = r#"{"list": [
    {"dt": 1700000000, "main": {"temp": 30.6, "feels_like": 35, "humidity": 70, "pressure": 1008}, "weather": [{"main": "Rain", "description": "light rain"}]},
    {"dt": 1700010800, "main": {"temp": 29.2, "feels_like": 33, "humidity": 72, "pressure": 1008}, "weather": [{"main": "Clouds", "description": "few clouds"}]}
]}"#;

pub const AIR_FAIR: &str = r#"{"list": [{"main": {"aqi": 2}}]}"#;

pub const TWO_USERS: &str = r#"{"success": true, "locations": [
    {"username": "maria", "email": "maria@example.com", "latitude": 14.6, "longitude": 121.0, "location_name": "Quezon City", "updated_at": "2024-05-01T08:00:00Z"},
    {"username": "jose", "email": "jose@example.com", "latitude": 10.3, "longitude": 123.9, "location_name": null, "updated_at": "2024-05-01T09:30:00Z"}
]}"#;

pub fn ok_ack() -> &'static str {
    r#"{"success": true}"#
}
