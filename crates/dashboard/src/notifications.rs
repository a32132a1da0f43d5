//! The bell in the user navigation bar.
//!
//! Every fetch replaces the whole list and unread count. Marking one item read
//! only touches local state once the server has confirmed it.

use std::cell::RefCell;
use std::rc::Rc;

use api::{HttpClient, Notification};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use foundation::{escape_html, time_ago_compact};
use futures_util::future::join_all;
use runtime::{PollSchedule, SubscriptionTable};
use tracing::{debug, error, info};
use weather::{round_half_up, weather_icon};

use crate::context::Context;

const BADGE: &str = "notification-badge";
const DROPDOWN_BADGE: &str = "notification-badge-dropdown";
const DROPDOWN: &str = "notification-dropdown";
const CONTAINER: &str = "notifications-container";
const EMPTY: &str = "notifications-empty";
const LOADING: &str = "notifications-loading";
const CLOSE_ICON: &str = r#"<svg class="w-4 h-4" fill="currentColor" viewBox="0 0 20 20"><path fill-rule="evenodd" d="M4.293 4.293a1 1 0 011.414 0L10 8.586l4.293-4.293a1 1 0 111.414 1.414L11.414 10l4.293 4.293a1 1 0 01-1.414 1.414L10 11.414l-4.293 4.293a1 1 0 01-1.414-1.414L8.586 10 4.293 5.707a1 1 0 010-1.414z" clip-rule="evenodd"></path></svg>"#;
const SENDER_ICON: &str = r#"<svg class="w-3 h-3 mr-1" fill="currentColor" viewBox="0 0 20 20"><path fill-rule="evenodd" d="M10 9a3 3 0 100-6 3 3 0 000 6zm-7 9a7 7 0 1114 0H3z" clip-rule="evenodd"></path></svg>"#;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    ToggleDropdown,
    MarkAllRead,
    CloseDropdown,
}

/// Badge text: hidden at zero, capped at `99+`.
pub fn badge_text(unread: u32) -> Option<String> {
    match unread {
        0 => None,
        1..=99 => Some(unread.to_string()),
        _ => Some("99+".to_string()),
    }
}

/// `(text colour, background, icon)` for an alert type.
fn alert_style(alert_type: &str) -> (&'static str, &'static str, &'static str) {
    match alert_type {
        "danger" => ("text-red-600", "bg-red-50", "⚠️"),
        "warning" => ("text-orange-600", "bg-orange-50", "⚠️"),
        _ => ("text-blue-600", "bg-blue-50", "📢"),
    }
}

fn parse_sent_at(raw: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .and_then(|n| n.and_local_timezone(offset).single())
        })
}

/// "Just now", "5m ago" and so on; a local date once a week has passed.
pub fn sent_ago(raw: &str, now: DateTime<FixedOffset>) -> String {
    let Some(sent) = parse_sent_at(raw, *now.offset()) else {
        return raw.to_string();
    };
    let elapsed = (now - sent).num_seconds();
    time_ago_compact(elapsed).unwrap_or_else(|| {
        sent.with_timezone(now.offset())
            .format("%-m/%-d/%Y")
            .to_string()
    })
}

pub fn notification_html(n: &Notification, now: DateTime<FixedOffset>) -> String {
    let (color, bg, icon) = alert_style(&n.alert_type);
    let temperature = match n.temperature {
        Some(t) if t != 0.0 => format!(
            r#"<span class="flex items-center"><span class="mr-1">{}</span>{}°C</span>"#,
            weather_icon(n.weather_condition.as_deref().unwrap_or("")),
            round_half_up(t)
        ),
        _ => String::new(),
    };
    let sender = match n.sent_by.as_deref() {
        Some(by) if !by.is_empty() => format!(
            r#"<span class="flex items-center">{SENDER_ICON}{}</span>"#,
            escape_html(by)
        ),
        _ => String::new(),
    };
    format!(
        r#"<div class="p-4 hover:bg-gray-50 transition-colors cursor-pointer" data-notification-id="{id}"><div class="flex items-start space-x-3"><div class="flex-shrink-0 {bg} rounded-full w-10 h-10 flex items-center justify-center text-xl">{icon}</div><div class="flex-1 min-w-0"><div class="flex items-start justify-between"><h4 class="text-sm font-semibold {color} truncate">{title}</h4><button class="ml-2 text-gray-400 hover:text-gray-600 flex-shrink-0" data-mark-read="{id}">{CLOSE_ICON}</button></div><p class="text-xs text-gray-600 mt-1 line-clamp-2">{message}</p><div class="flex items-center justify-between mt-2"><div class="flex items-center space-x-3 text-xs text-gray-500">{temperature}{sender}</div><span class="text-xs text-gray-400">{ago}</span></div></div></div></div>"#,
        id = n.id,
        title = escape_html(&n.title),
        message = escape_html(&n.message),
        ago = sent_ago(&n.sent_at, now),
    )
}

#[derive(Debug, Default)]
struct NotificationState {
    items: Vec<Notification>,
    unread: u32,
    open: bool,
}

pub struct Notifications<H> {
    ctx: Rc<Context<H>>,
    state: RefCell<NotificationState>,
}

impl<H: HttpClient> Notifications<H> {
    pub fn new(ctx: Rc<Context<H>>) -> Self {
        Self {
            ctx,
            state: RefCell::new(NotificationState::default()),
        }
    }

    pub fn subscriptions() -> SubscriptionTable<NotificationAction> {
        SubscriptionTable::new()
            .on("notification-bell-btn", "click", NotificationAction::ToggleDropdown)
            .on("mark-all-read-btn", "click", NotificationAction::MarkAllRead)
    }

    pub fn schedule(&self) -> PollSchedule {
        PollSchedule::every("notifications", self.ctx.config.notification_poll_ms)
    }

    pub async fn handle(&self, action: NotificationAction) {
        match action {
            NotificationAction::ToggleDropdown => self.toggle_dropdown().await,
            NotificationAction::MarkAllRead => self.mark_all_as_read().await,
            NotificationAction::CloseDropdown => self.close_dropdown(),
        }
    }

    pub fn unread_count(&self) -> u32 {
        self.state.borrow().unread
    }

    pub fn ids(&self) -> Vec<i64> {
        self.state.borrow().items.iter().map(|n| n.id).collect()
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().open
    }

    /// Opening also refreshes the list.
    pub async fn toggle_dropdown(&self) {
        let ui = self.ctx.ui();
        if !ui.exists(DROPDOWN) {
            return;
        }
        let open = !self.state.borrow().open;
        self.state.borrow_mut().open = open;
        ui.set_class(DROPDOWN, "hidden", !open);
        if open {
            self.fetch().await;
        }
    }

    pub fn close_dropdown(&self) {
        if self.ctx.ui().set_class(DROPDOWN, "hidden", true) {
            self.state.borrow_mut().open = false;
        }
    }

    pub async fn fetch(&self) {
        match self.ctx.server().notifications().await {
            Ok(body) => {
                debug!(count = body.notifications.len(), unread = body.unread_count, "loaded notifications");
                {
                    let mut state = self.state.borrow_mut();
                    state.items = body.notifications;
                    state.unread = body.unread_count;
                }
                self.render();
            }
            Err(e) => {
                error!("error fetching notifications: {e}");
                self.ctx.ui().set_class(LOADING, "hidden", true);
            }
        }
    }

    fn render(&self) {
        let ui = self.ctx.ui();
        let state = self.state.borrow();
        match badge_text(state.unread) {
            Some(text) => {
                ui.set_class(BADGE, "hidden", false);
                ui.set_text(BADGE, &text);
            }
            None => {
                ui.set_class(BADGE, "hidden", true);
            }
        }
        ui.set_text(DROPDOWN_BADGE, &state.unread.to_string());

        if ui.exists(CONTAINER) && ui.exists(EMPTY) {
            if state.items.is_empty() {
                ui.set_class(CONTAINER, "hidden", true);
                ui.set_class(EMPTY, "hidden", false);
            } else {
                let now = self.ctx.clock.local_now();
                let html: String = state
                    .items
                    .iter()
                    .map(|n| notification_html(n, now))
                    .collect();
                ui.set_class(CONTAINER, "hidden", false);
                ui.set_class(EMPTY, "hidden", true);
                ui.set_html(CONTAINER, &html);
            }
        } else {
            error!("notification list elements not found");
        }
        ui.set_class(LOADING, "hidden", true);
    }

    /// Returns whether the server confirmed; on failure nothing changes locally.
    pub async fn mark_as_read(&self, id: i64) -> bool {
        match self.ctx.server().mark_notification_read(id).await {
            Ok(_) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.items.retain(|n| n.id != id);
                    state.unread = state.unread.saturating_sub(1);
                }
                self.render();
                true
            }
            Err(e) => {
                error!(id, "error marking notification as read: {e}");
                false
            }
        }
    }

    /// One request per listed notification, issued together.
    pub async fn mark_all_as_read(&self) {
        let ids = self.ids();
        let confirmed = join_all(ids.iter().map(|&id| self.mark_as_read(id)))
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();
        info!(confirmed, total = ids.len(), "marked notifications read");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const THREE: &str = r#"{"success": true, "unread_count": 3, "notifications": [
        {"id": 1, "title": "Heat <b>warning</b>", "message": "Stay cool", "alert_type": "danger",
         "weather_condition": "Clear", "temperature": 36.6, "sent_by": "admin", "sent_at": "2023-11-14T22:00:00Z"},
        {"id": 2, "title": "Rain", "message": "Bring an umbrella", "alert_type": "warning", "sent_at": "2023-11-14T12:13:20Z"},
        {"id": 3, "title": "Hello", "message": "Welcome", "alert_type": "info", "sent_at": "2023-11-01T00:00:00Z"}
    ]}"#;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_millis_opt(NOW_MS)
            .unwrap()
    }

    #[test]
    fn badge_caps_and_hides() {
        assert_eq!(badge_text(0), None);
        assert_eq!(badge_text(7).as_deref(), Some("7"));
        assert_eq!(badge_text(99).as_deref(), Some("99"));
        assert_eq!(badge_text(100).as_deref(), Some("99+"));
    }

    #[test]
    fn relative_times() {
        assert_eq!(sent_ago("2023-11-14T22:13:00Z", now()), "Just now");
        assert_eq!(sent_ago("2023-11-14T22:00:00Z", now()), "13m ago");
        assert_eq!(sent_ago("2023-11-14T12:13:20Z", now()), "10h ago");
        assert_eq!(sent_ago("2023-11-12T22:13:20Z", now()), "2d ago");
        assert_eq!(sent_ago("2023-11-01T00:00:00Z", now()), "11/1/2023");
    }

    #[test]
    fn item_markup_is_styled_and_escaped() {
        let body: api::NotificationsResponse = serde_json::from_str(THREE).unwrap();
        let html = notification_html(&body.notifications[0], now());
        assert!(html.contains("text-red-600"));
        assert!(html.contains("Heat &lt;b&gt;warning&lt;/b&gt;"));
        assert!(html.contains("☀️"));
        assert!(html.contains("37°C"));
        assert!(html.contains(r#"data-mark-read="1""#));
        let plain = notification_html(&body.notifications[2], now());
        assert!(plain.contains("📢"));
        assert!(!plain.contains("°C"));
    }

    #[test]
    fn fetch_replaces_list_and_badge() {
        let h = Harness::new(FakeHttp::new().route("/api/notifications/", 200, THREE));
        let bell = Notifications::new(h.ctx.clone());
        pollster::block_on(bell.fetch());
        assert_eq!(bell.ids(), vec![1, 2, 3]);
        assert_eq!(h.ui.text(BADGE), "3");
        assert!(!h.ui.has_class(BADGE, "hidden"));
        assert!(h.ui.has_class(EMPTY, "hidden"));
        assert!(h.ui.has_class(LOADING, "hidden"));

        h.http().set_route("/api/notifications/", 200, r#"{"success": true, "unread_count": 0, "notifications": []}"#);
        pollster::block_on(bell.fetch());
        assert!(bell.ids().is_empty());
        assert!(h.ui.has_class(BADGE, "hidden"));
        assert_eq!(h.ui.text(DROPDOWN_BADGE), "0");
        assert!(!h.ui.has_class(EMPTY, "hidden"));
    }

    #[test]
    fn large_count_shows_capped_badge_but_raw_dropdown_count() {
        let body = r#"{"success": true, "unread_count": 150, "notifications": []}"#;
        let h = Harness::new(FakeHttp::new().route("/api/notifications/", 200, body));
        let bell = Notifications::new(h.ctx.clone());
        pollster::block_on(bell.fetch());
        assert_eq!(h.ui.text(BADGE), "99+");
        assert_eq!(h.ui.text(DROPDOWN_BADGE), "150");
    }

    #[test]
    fn failed_mark_read_keeps_item_and_count() {
        let http = FakeHttp::new()
            .route("/api/notifications/", 200, THREE)
            .route_post("/api/notifications/", 500, "boom");
        let h = Harness::new(http);
        let bell = Notifications::new(h.ctx.clone());
        pollster::block_on(bell.fetch());
        assert!(!pollster::block_on(bell.mark_as_read(2)));
        assert_eq!(bell.ids(), vec![1, 2, 3]);
        assert_eq!(bell.unread_count(), 3);
    }

    #[test]
    fn mark_read_removes_after_confirmation() {
        let http = FakeHttp::new()
            .route("/api/notifications/", 200, THREE)
            .route_post("/api/notifications/", 200, ok_ack());
        let h = Harness::new(http);
        let bell = Notifications::new(h.ctx.clone());
        pollster::block_on(bell.fetch());
        assert!(pollster::block_on(bell.mark_as_read(2)));
        assert_eq!(bell.ids(), vec![1, 3]);
        assert_eq!(bell.unread_count(), 2);
        assert_eq!(h.ui.text(BADGE), "2");
        let body = h.http().last("/api/notifications/").unwrap();
        assert_eq!(body.json_body().unwrap()["notification_id"], 2);
    }

    #[test]
    fn mark_all_sends_one_request_each() {
        let http = FakeHttp::new()
            .route("/api/notifications/", 200, THREE)
            .route_post("/api/notifications/", 200, ok_ack());
        let h = Harness::new(http);
        let bell = Notifications::new(h.ctx.clone());
        pollster::block_on(bell.fetch());
        pollster::block_on(bell.handle(NotificationAction::MarkAllRead));
        let posts = h
            .http()
            .requests()
            .iter()
            .filter(|r| r.method == api::Method::Post)
            .count();
        assert_eq!(posts, 3);
        assert!(bell.ids().is_empty());
        assert_eq!(bell.unread_count(), 0);
        assert!(h.ui.has_class(BADGE, "hidden"));
    }

    #[test]
    fn opening_dropdown_refreshes() {
        let h = Harness::new(FakeHttp::new().route("/api/notifications/", 200, THREE));
        let bell = Notifications::new(h.ctx.clone());
        pollster::block_on(bell.handle(NotificationAction::ToggleDropdown));
        assert!(bell.is_open());
        assert!(!h.ui.has_class(DROPDOWN, "hidden"));
        assert_eq!(h.http().count("/api/notifications/"), 1);

        pollster::block_on(bell.handle(NotificationAction::ToggleDropdown));
        assert!(!bell.is_open());
        assert_eq!(h.http().count("/api/notifications/"), 1);

        pollster::block_on(bell.handle(NotificationAction::ToggleDropdown));
        bell.close_dropdown();
        assert!(h.ui.has_class(DROPDOWN, "hidden"));
    }
}
