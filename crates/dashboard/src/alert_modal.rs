use std::cell::{Cell, RefCell};
use std::rc::Rc;

use api::{HttpClient, WeatherAlertRequest};
use foundation::{capitalize_first, initial, LatLng};
use runtime::SubscriptionTable;
use tracing::{error, info};
use weather::{celsius, compose_user_alert, weather_icon, UserAlertDraft};

use crate::context::Context;
use crate::ui::ToastKind;

const MODAL: &str = "weather-alert-modal";
const MODAL_CONTENT: &str = "modal-content";
const MESSAGE: &str = "modal-alert-message";
const CONFIRM: &str = "confirm-send-alert-btn";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModalAction {
    Close,
    Send,
}

/// The user an admin is about to alert, and the reading the draft is built on.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertTarget {
    pub username: String,
    pub email: String,
    pub at: LatLng,
    pub temperature: f64,
    pub condition: String,
    pub description: String,
    pub draft: UserAlertDraft,
}

impl AlertTarget {
    pub fn request(&self, message: String) -> WeatherAlertRequest {
        WeatherAlertRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            alert_type: self.draft.severity.as_str().to_string(),
            title: self.draft.severity.notification_title().to_string(),
            message,
            temperature: Some(self.temperature),
            weather_condition: Some(self.condition.clone()),
            location: format!("{}, {}", self.at.lat, self.at.lng),
            latitude: self.at.lat,
            longitude: self.at.lng,
        }
    }
}

/// Review-and-send dialog opened from a user marker's popup.
pub struct WeatherAlertModal<H> {
    ctx: Rc<Context<H>>,
    target: RefCell<Option<AlertTarget>>,
    sending: Cell<bool>,
}

impl<H: HttpClient> WeatherAlertModal<H> {
    pub fn new(ctx: Rc<Context<H>>) -> Self {
        Self {
            ctx,
            target: RefCell::new(None),
            sending: Cell::new(false),
        }
    }

    pub fn subscriptions() -> SubscriptionTable<ModalAction> {
        SubscriptionTable::new()
            .on("close-modal-btn", "click", ModalAction::Close)
            .on("cancel-alert-btn", "click", ModalAction::Close)
            .on("modal-backdrop", "click", ModalAction::Close)
            .on(CONFIRM, "click", ModalAction::Send)
    }

    pub async fn handle(&self, action: ModalAction) {
        match action {
            ModalAction::Close => self.close(),
            ModalAction::Send => self.send().await,
        }
    }

    pub fn is_open(&self) -> bool {
        self.target.borrow().is_some()
    }

    pub fn target(&self) -> Option<AlertTarget> {
        self.target.borrow().clone()
    }

    /// Fetches the user's current weather and opens the prefilled dialog.
    pub async fn open(&self, username: &str, email: &str, at: LatLng) {
        let current = match self.ctx.openweather().current(at.lat, at.lng).await {
            Ok(c) => c,
            Err(e) => {
                error!("weather lookup for alert failed: {e}");
                self.ctx
                    .toast(ToastKind::Error, "Failed to fetch weather data");
                return;
            }
        };
        let (Some(main), Some(cond)) = (current.main.as_ref(), current.primary_condition()) else {
            self.ctx
                .toast(ToastKind::Error, "Failed to fetch weather data");
            return;
        };

        let target = AlertTarget {
            username: username.to_string(),
            email: email.to_string(),
            at,
            temperature: main.temp,
            condition: cond.main.clone(),
            description: cond.description.clone(),
            draft: compose_user_alert(main.temp, &cond.main, &cond.description),
        };
        self.populate(&target);
        *self.target.borrow_mut() = Some(target);
        self.ctx.trace("alert-modal", format!("open {username}"));
    }

    fn populate(&self, target: &AlertTarget) {
        let ui = self.ctx.ui();
        ui.set_text("modal-user-initial", &initial(&target.username));
        ui.set_text("modal-username", &target.username);
        ui.set_text("modal-email", &target.email);
        ui.set_text("modal-weather-icon", weather_icon(&target.condition));
        ui.set_text("modal-condition", &capitalize_first(&target.description));
        ui.set_text("modal-temperature", &celsius(target.temperature));
        ui.set_text("modal-alert-icon", target.draft.icon);
        ui.set_text("modal-alert-level", &target.draft.level);
        ui.set_value(MESSAGE, &target.draft.message);
        ui.set_class(MODAL, "hidden", false);
        for (class, on) in [("scale-95", false), ("opacity-0", false), ("scale-100", true), ("opacity-100", true)] {
            ui.set_class(MODAL_CONTENT, class, on);
        }
    }

    pub fn close(&self) {
        let ui = self.ctx.ui();
        for (class, on) in [("scale-95", true), ("opacity-0", true), ("scale-100", false), ("opacity-100", false)] {
            ui.set_class(MODAL_CONTENT, class, on);
        }
        ui.set_class(MODAL, "hidden", true);
        self.target.borrow_mut().take();
    }

    pub async fn send(&self) {
        if self.sending.get() {
            return;
        }
        let Some(target) = self.target() else {
            return;
        };
        let message = self.ctx.ui().value(MESSAGE).unwrap_or_default();
        let request = target.request(message);

        self.sending.set(true);
        self.ctx.ui().set_disabled(CONFIRM, true);
        let result = self.ctx.server().send_weather_alert(&request).await;
        match result {
            Ok(_) => {
                self.close();
                self.ctx.toast(
                    ToastKind::Success,
                    &format!("Weather alert sent to {}!", target.username),
                );
                info!(user = %target.username, severity = target.draft.severity.as_str(), "weather alert sent");
            }
            Err(e) => {
                error!("alert sending failed: {e}");
                self.ctx
                    .toast(ToastKind::Error, &format!("Failed to send alert: {e}"));
            }
        }
        self.ctx.ui().set_disabled(CONFIRM, false);
        self.sending.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use pretty_assertions::assert_eq;
    use weather::AlertSeverity;

    const HOT: &str = r#"{"cod": 200, "name": "Manila", "main": {"temp": 36.4, "feels_like": 41, "humidity": 60, "pressure": 1006},
        "weather": [{"main": "Clear", "description": "clear sky"}], "wind": {"speed": 2}}"#;

    #[test]
    fn open_prefills_danger_draft() {
        let h = Harness::new(FakeHttp::new().route("/weather?", 200, HOT));
        let modal = WeatherAlertModal::new(h.ctx.clone());
        pollster::block_on(modal.open("maria", "maria@example.com", LatLng::new(14.6, 121.0)));

        let target = modal.target().unwrap();
        assert_eq!(target.draft.severity, AlertSeverity::Danger);
        assert_eq!(h.ui.text("modal-user-initial"), "M");
        assert_eq!(h.ui.text("modal-temperature"), "36°C");
        assert_eq!(h.ui.text("modal-condition"), "Clear sky");
        assert_eq!(h.ui.text("modal-alert-level"), "Extreme Heat");
        assert!(h.ui.element(MESSAGE).value.starts_with("⚠️ EXTREME HEAT WARNING"));
        assert!(!h.ui.has_class(MODAL, "hidden"));
    }

    #[test]
    fn weather_failure_toasts_and_stays_closed() {
        let h = Harness::new(FakeHttp::new().route("/weather?", 401, r#"{"cod": 401}"#));
        let modal = WeatherAlertModal::new(h.ctx.clone());
        pollster::block_on(modal.open("maria", "m@example.com", LatLng::new(1.0, 2.0)));
        assert!(!modal.is_open());
        assert_eq!(
            h.ui.last_toast(),
            Some((ToastKind::Error, "Failed to fetch weather data".into()))
        );
    }

    #[test]
    fn send_posts_edited_message_and_closes() {
        let http = FakeHttp::new()
            .route("/weather?", 200, HOT)
            .route_post("/api/admin/send-weather-alert/", 200, ok_ack());
        let h = Harness::new(http);
        let modal = WeatherAlertModal::new(h.ctx.clone());
        pollster::block_on(modal.open("maria", "maria@example.com", LatLng::new(14.6, 121.0)));
        h.ui.type_into(MESSAGE, "Stay inside today");
        pollster::block_on(modal.handle(ModalAction::Send));

        let req = h.http().last("send-weather-alert").unwrap();
        let body = req.json_body().unwrap();
        assert_eq!(body["title"], "WEATHER ALERT");
        assert_eq!(body["alert_type"], "danger");
        assert_eq!(body["message"], "Stay inside today");
        assert_eq!(body["location"], "14.6, 121");
        assert_eq!(body["weather_condition"], "Clear");
        assert!(!modal.is_open());
        assert!(!h.ui.element(CONFIRM).disabled);
        assert_eq!(
            h.ui.last_toast(),
            Some((ToastKind::Success, "Weather alert sent to maria!".into()))
        );
    }

    #[test]
    fn rejected_send_keeps_dialog_open() {
        let http = FakeHttp::new()
            .route("/weather?", 200, HOT)
            .route_post("/api/admin/send-weather-alert/", 200, r#"{"success": false, "error": "User not found"}"#);
        let h = Harness::new(http);
        let modal = WeatherAlertModal::new(h.ctx.clone());
        pollster::block_on(modal.open("ghost", "g@example.com", LatLng::new(1.0, 2.0)));
        pollster::block_on(modal.send());
        assert!(modal.is_open());
        assert_eq!(
            h.ui.last_toast(),
            Some((ToastKind::Error, "Failed to send alert: User not found".into()))
        );
    }
}
