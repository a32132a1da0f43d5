use std::cell::RefCell;
use std::rc::Rc;

use api::{DashboardConfig, HttpClient, OpenWeather, ServerApi};
use runtime::{Event, EventBus};
use tracing::debug;

use crate::env::{Clock, Geolocator};
use crate::ui::{ToastKind, Ui};

/// Application state shared by every controller on a page.
///
/// Built once by the page entry point and handed to controllers by `Rc`;
/// nothing here is global.
pub struct Context<H> {
    pub http: H,
    pub config: DashboardConfig,
    pub csrf_token: Option<String>,
    pub ui: Rc<dyn Ui>,
    pub clock: Rc<dyn Clock>,
    pub geo: Rc<dyn Geolocator>,
    trace: RefCell<EventBus>,
}

impl<H: HttpClient> Context<H> {
    pub fn new(
        http: H,
        config: DashboardConfig,
        ui: Rc<dyn Ui>,
        clock: Rc<dyn Clock>,
        geo: Rc<dyn Geolocator>,
    ) -> Self {
        Self {
            http,
            config,
            csrf_token: None,
            ui,
            clock,
            geo,
            trace: RefCell::new(EventBus::new()),
        }
    }

    pub fn with_csrf(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }

    pub fn openweather(&self) -> OpenWeather<'_, H> {
        OpenWeather::new(&self.http, &self.config)
    }

    pub fn server(&self) -> ServerApi<'_, H> {
        ServerApi::new(&self.http, &self.config.server_base_url, self.csrf_token.clone())
    }

    pub fn ui(&self) -> &dyn Ui {
        self.ui.as_ref()
    }

    pub fn toast(&self, kind: ToastKind, message: &str) {
        self.trace(kind.as_str(), message);
        self.ui.toast(kind, message);
    }

    pub fn trace(&self, kind: &'static str, message: impl Into<String>) {
        let message = message.into();
        debug!(kind, "{message}");
        self.trace.borrow_mut().emit(kind, message);
    }

    pub fn events(&self) -> Vec<Event> {
        self.trace.borrow().events().iter().cloned().collect()
    }

    pub fn event_count(&self, kind: &str) -> usize {
        self.trace.borrow().count(kind)
    }
}
