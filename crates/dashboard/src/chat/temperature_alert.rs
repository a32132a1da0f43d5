use std::cell::Cell;
use std::rc::Rc;

use api::{HttpClient, TemperatureAlert, TemperatureAlertRequest};
use foundation::escape_html;
use runtime::SubscriptionTable;
use tracing::{debug, error, info};
use weather::celsius;

use crate::context::Context;

pub const TEMPERATURE_DIALOG: &str = "temperature-alert-dialog";
const CONTENT: &str = "alert-dialog-content";
const HEADER: &str = "alert-dialog-header";
const MESSAGE_BOX: &str = "alert-message-box";
const TEMP_BOX: &str = "alert-temp-display";
const NO_RECOMMENDATIONS: &str =
    r#"<li class="text-gray-500 text-xs">No specific recommendations available.</li>"#;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DialogAction {
    Close,
}

fn recommendation_html(rec: &str) -> String {
    format!(
        r#"<li class="flex items-start"><span class="mr-1.5 text-green-500">✓</span><span>{}</span></li>"#,
        escape_html(rec)
    )
}

/// Server-written advice shown when a displayed temperature is extreme.
///
/// The server remembers dismissals per session, so asking again after a
/// dismissal simply yields no alert.
pub struct TemperatureAlertDialog<H> {
    ctx: Rc<Context<H>>,
    open: Cell<bool>,
}

impl<H: HttpClient> TemperatureAlertDialog<H> {
    pub fn new(ctx: Rc<Context<H>>) -> Self {
        Self {
            ctx,
            open: Cell::new(false),
        }
    }

    pub fn subscriptions() -> SubscriptionTable<DialogAction> {
        SubscriptionTable::new().on("close-alert-dialog", "click", DialogAction::Close)
    }

    pub async fn handle(&self, action: DialogAction) {
        match action {
            DialogAction::Close => self.close().await,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub async fn check_and_show(&self, temperature: f64, location: &str, condition: Option<&str>) {
        let request = TemperatureAlertRequest {
            temperature,
            location: location.to_string(),
            weather_condition: condition.map(str::to_string),
        };
        match self.ctx.server().temperature_alert(&request).await {
            Ok(Some(alert)) => {
                self.show(&alert);
            }
            Ok(None) => debug!("no temperature alert needed"),
            Err(e) => error!("error fetching temperature alert: {e}"),
        }
    }

    /// Returns whether the dialog was opened; mild readings never are.
    pub fn show(&self, alert: &TemperatureAlert) -> bool {
        if !alert.is_extreme {
            return false;
        }
        let ui = self.ctx.ui();
        if !ui.exists(TEMPERATURE_DIALOG) {
            error!("temperature alert dialog element not found");
            return false;
        }

        ui.set_classes(HEADER, &alert.color, true);
        ui.set_classes(HEADER, &alert.text_color, true);
        ui.set_text("alert-dialog-icon", &alert.icon);
        ui.set_text("alert-dialog-title", &format!("{} Alert", alert.level));
        ui.set_text("alert-temperature", &celsius(alert.temperature));
        ui.set_classes("alert-temperature", &alert.color.replacen("bg-", "text-", 1), true);
        let border = alert
            .border_color
            .clone()
            .unwrap_or_else(|| alert.color.replacen("bg-", "border-", 1));
        ui.set_classes(TEMP_BOX, &border, true);
        ui.set_text("alert-location", &alert.location);
        ui.set_text("alert-message", &alert.message);

        let hot = alert.temperature >= 30.0;
        for (class, on) in [
            ("bg-red-50", hot),
            ("border-red-400", hot),
            ("bg-blue-50", !hot),
            ("border-blue-400", !hot),
        ] {
            ui.set_class(MESSAGE_BOX, class, on);
        }

        let recommendations = if alert.recommendations.is_empty() {
            NO_RECOMMENDATIONS.to_string()
        } else {
            alert
                .recommendations
                .iter()
                .map(|r| recommendation_html(r))
                .collect()
        };
        ui.set_html("alert-recommendations", &recommendations);

        ui.set_class(TEMPERATURE_DIALOG, "hidden", false);
        ui.set_class(TEMPERATURE_DIALOG, "opacity-100", true);
        ui.set_class(CONTENT, "scale-95", false);
        ui.set_class(CONTENT, "scale-100", true);
        self.open.set(true);
        info!(level = %alert.level, "temperature alert shown");
        true
    }

    /// Records the dismissal server-side, then hides the dialog either way.
    pub async fn close(&self) {
        let ui = self.ctx.ui();
        if !ui.exists(TEMPERATURE_DIALOG) || !ui.exists(CONTENT) {
            return;
        }
        if let Err(e) = self.ctx.server().dismiss_alert().await {
            error!("error dismissing alert: {e}");
        }
        ui.set_class(TEMPERATURE_DIALOG, "opacity-100", false);
        ui.set_class(CONTENT, "scale-100", false);
        ui.set_class(CONTENT, "scale-95", true);
        ui.set_class(TEMPERATURE_DIALOG, "hidden", true);
        self.open.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use pretty_assertions::assert_eq;

    const HEAT: &str = r#"{"success": true, "alert": {
        "level": "Very Hot", "color": "bg-red-600", "textColor": "text-white", "icon": "🔥",
        "isExtreme": true, "message": "Extreme heat!", "recommendations": ["Drink water", "Stay <indoors>"],
        "temperature": 36.6, "location": "Manila, PH"}}"#;

    #[test]
    fn extreme_alert_opens_dialog() {
        let h = Harness::new(FakeHttp::new().route_post("/api/temperature-alert/", 200, HEAT));
        let dialog = TemperatureAlertDialog::new(h.ctx.clone());
        pollster::block_on(dialog.check_and_show(36.6, "Manila, PH", Some("Clear")));

        let body = h.http().last("temperature-alert").unwrap().json_body().unwrap().clone();
        assert_eq!(body["weather_condition"], "Clear");
        assert_eq!(h.ui.text("alert-dialog-title"), "Very Hot Alert");
        assert_eq!(h.ui.text("alert-temperature"), "37°C");
        assert!(h.ui.has_class("alert-temperature", "text-red-600"));
        assert!(h.ui.has_class(TEMP_BOX, "border-red-600"));
        assert!(h.ui.has_class(MESSAGE_BOX, "bg-red-50"));
        assert!(h.ui.html("alert-recommendations").contains("Stay &lt;indoors&gt;"));
        assert!(!h.ui.has_class(TEMPERATURE_DIALOG, "hidden"));
        assert!(dialog.is_open());
    }

    #[test]
    fn mild_or_missing_alert_keeps_dialog_closed() {
        let mild = HEAT.replace(r#""isExtreme": true"#, r#""isExtreme": false"#);
        let h = Harness::new(FakeHttp::new().route_post("/api/temperature-alert/", 200, mild));
        let dialog = TemperatureAlertDialog::new(h.ctx.clone());
        pollster::block_on(dialog.check_and_show(22.0, "Baguio", None));
        assert_eq!(h.ui.text("alert-dialog-title"), "");

        let h = Harness::new(FakeHttp::new().route_post("/api/temperature-alert/", 200, r#"{"success": true, "alert": null}"#));
        let dialog = TemperatureAlertDialog::new(h.ctx.clone());
        pollster::block_on(dialog.check_and_show(22.0, "Baguio", None));
        assert_eq!(h.ui.text("alert-dialog-title"), "");
    }

    #[test]
    fn close_dismisses_even_when_the_server_fails() {
        let h = Harness::new(
            FakeHttp::new()
                .route_post("/api/temperature-alert/", 200, HEAT)
                .fail("/api/dismiss-alert/"),
        );
        let dialog = TemperatureAlertDialog::new(h.ctx.clone());
        pollster::block_on(dialog.check_and_show(36.6, "Manila, PH", None));
        pollster::block_on(dialog.handle(DialogAction::Close));
        assert_eq!(h.http().count("/api/dismiss-alert/"), 1);
        assert!(h.ui.has_class(TEMPERATURE_DIALOG, "hidden"));
        assert!(h.ui.has_class(CONTENT, "scale-95"));
        assert!(!dialog.is_open());
    }

    #[test]
    fn cool_alert_uses_blue_message_box() {
        let cold = HEAT
            .replace(r#""temperature": 36.6"#, r#""temperature": 8.0"#)
            .replace("bg-red-600", "bg-indigo-700");
        let h = Harness::new(FakeHttp::new());
        let dialog = TemperatureAlertDialog::new(h.ctx.clone());
        let body: api::TemperatureAlertResponse = serde_json::from_str(&cold).unwrap();
        assert!(dialog.show(&body.alert.unwrap()));
        assert!(h.ui.has_class(MESSAGE_BOX, "bg-blue-50"));
        assert!(!h.ui.has_class(MESSAGE_BOX, "bg-red-50"));
    }
}
