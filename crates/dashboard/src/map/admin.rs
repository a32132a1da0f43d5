use api::HttpClient;
use tracing::info;

use super::WeatherMap;
use crate::ui::{trimmed_value, ToastKind};

const ALERT_TOGGLE: &str = "alert-mode-toggle";
const ALERT_OVERLAY: &str = "alert-creation-overlay";
const QUICK_MESSAGE: &str = "quick-alert-message";
/// Delay before a quick alert is confirmed.
pub const QUICK_ALERT_CONFIRM_MS: u32 = 1_500;

impl<H: HttpClient> WeatherMap<H> {
    pub fn toggle_alert_mode(&self) {
        let on = {
            let mut state = self.state.borrow_mut();
            state.alert_mode = !state.alert_mode;
            state.alert_mode
        };
        self.ctx.trace("alert-mode", if on { "on" } else { "off" });

        let ui = self.ctx.ui();
        if !ui.exists(ALERT_TOGGLE) {
            return;
        }
        for class in ["alert-mode-active", "bg-red-600", "text-white"] {
            ui.set_class(ALERT_TOGGLE, class, on);
        }
        for class in ["bg-white", "text-gray-700"] {
            ui.set_class(ALERT_TOGGLE, class, !on);
        }
        if on {
            ui.set_text(ALERT_TOGGLE, "🚨 Alert Mode ON");
            self.ctx.toast(
                ToastKind::Info,
                "Alert mode activated. Click on map to create alerts.",
            );
        } else {
            ui.set_text(ALERT_TOGGLE, "🚨 Alert Mode");
            self.toggle_alert_overlay(false);
            self.ctx.toast(ToastKind::Info, "Alert mode deactivated.");
        }
    }

    pub fn toggle_alert_overlay(&self, show: bool) {
        self.ctx.ui().set_class(ALERT_OVERLAY, "hidden", !show);
    }

    /// Confirms a quick alert for the selected point locally; no request is
    /// sent.
    pub async fn send_quick_alert(&self) {
        let message = trimmed_value(self.ctx.ui(), QUICK_MESSAGE);
        if message.is_empty() {
            self.ctx
                .toast(ToastKind::Error, "Please enter an alert message.");
            return;
        }
        let Some(at) = self.state.borrow().selected else {
            self.ctx
                .toast(ToastKind::Error, "Please select a location on the map.");
            return;
        };

        self.ctx.toast(ToastKind::Info, "Sending alert...");
        self.ctx.clock.sleep(QUICK_ALERT_CONFIRM_MS).await;
        self.toggle_alert_overlay(false);
        self.ctx
            .toast(ToastKind::Success, "Alert sent successfully!");
        self.ctx.ui().set_value(QUICK_MESSAGE, "");
        info!(lat = at.lat, lng = at.lng, "quick alert confirmed");
    }

    pub fn create_alert_click(&self) {
        if self.state.borrow().selected.is_some() {
            self.toggle_alert_overlay(true);
        } else {
            self.ctx
                .toast(ToastKind::Error, "Please select a location first.");
        }
    }

    pub fn view_users_click(&self) {
        if self.state.borrow().selected.is_some() {
            self.ctx
                .toast(ToastKind::Info, "User management feature coming soon.");
            self.update_users_in_area();
        } else {
            self.ctx
                .toast(ToastKind::Error, "Please select a location first.");
        }
    }
}
