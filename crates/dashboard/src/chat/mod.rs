//! Chat widgets: a shared transcript and send lifecycle, with the admin and
//! user variants layered on top.
//!
//! A widget is `Idle` until a send starts. While `Sending`, the input and the
//! send button are disabled and a thinking placeholder sits at the end of the
//! transcript. Finishing always removes the placeholder and appends exactly
//! one bot message before returning to `Idle`.

mod admin;
mod admin_history;
mod temperature_alert;
mod user;

pub use admin::{resolve_mention, AdminChat, Mention, ADMIN_WELCOME};
pub use admin_history::{conversation_card_html, AdminChatHistory, HistoryAction};
pub use temperature_alert::{DialogAction, TemperatureAlertDialog, TEMPERATURE_DIALOG};
pub use user::{weather_panel_html, ContextKind, UserChat, UserChatAction, USER_WELCOME};

use std::cell::Cell;

use api::ChatMessage;
use foundation::escape_html;
use runtime::SubscriptionTable;

use crate::env::Clock;
use crate::ui::Ui;

pub const CHAT_MESSAGES: &str = "chat-messages";
pub const CHAT_INPUT: &str = "chat-input";
pub const SEND_BUTTON: &str = "send-btn";

const SPINNER: &str = r#"<div class="w-4 h-4 border-2 border-white border-t-transparent rounded-full animate-spin"></div>"#;
const SEND_ICON: &str = r#"<svg class="w-4 h-4" fill="none" stroke="currentColor" viewBox="0 0 24 24"><path stroke-linecap="round" stroke-linejoin="round" stroke-width="2" d="M12 19l9 2-9-18-9 18 9-2zm0 0v-8"></path></svg>"#;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    Sending,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChatAction {
    Send,
}

/// Subscription rows shared by both chat widgets.
pub fn chat_subscriptions() -> SubscriptionTable<ChatAction> {
    SubscriptionTable::new()
        .on(SEND_BUTTON, "click", ChatAction::Send)
        .on(CHAT_INPUT, "keypress", ChatAction::Send)
}

/// How a widget labels and times its bot messages.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BotVoice {
    pub label: &'static str,
    pub thinking: &'static str,
    /// chrono format for the message timestamp.
    pub time_format: &'static str,
    pub send_label: Option<&'static str>,
}

pub const WEATHER_BOT: BotVoice = BotVoice {
    label: "Weather Bot",
    thinking: "Thinking...",
    time_format: "%H:%M",
    send_label: None,
};

pub const CLIMACHAT: BotVoice = BotVoice {
    label: "ClimaChat",
    thinking: "ClimaChat is thinking...",
    time_format: "%I:%M %p",
    send_label: Some("Send"),
};

/// Drops the oldest messages beyond the context window.
pub fn cap_context(history: &mut Vec<ChatMessage>, limit: usize) {
    if history.len() > limit {
        let excess = history.len() - limit;
        history.drain(..excess);
    }
}

pub fn message_html(voice: &BotVoice, content: &str, is_user: bool, time: &str) -> String {
    let (side, bubble, stamp) = if is_user {
        ("justify-end", "bg-blue-500 text-white", "text-blue-100")
    } else {
        ("justify-start", "bg-gray-100 text-gray-900", "text-gray-500")
    };
    let label = if is_user {
        String::new()
    } else {
        format!(r#"<p class="text-xs text-gray-500 mb-1">{}</p>"#, voice.label)
    };
    format!(
        r#"<div class="flex {side}"><div class="max-w-xs lg:max-w-md {bubble} rounded-lg px-3 py-2 break-words">{label}<p class="text-sm whitespace-pre-wrap">{}</p><p class="text-xs {stamp} mt-1">{time}</p></div></div>"#,
        escape_html(content)
    )
}

pub fn thinking_html(voice: &BotVoice) -> String {
    format!(
        r#"<div class="flex justify-start"><div class="max-w-xs lg:max-w-md bg-gray-100 text-gray-900 rounded-lg px-3 py-2"><div class="flex items-center space-x-1"><div class="flex space-x-1"><div class="w-2 h-2 bg-gray-400 rounded-full animate-bounce"></div><div class="w-2 h-2 bg-gray-400 rounded-full animate-bounce" style="animation-delay: 0.1s;"></div><div class="w-2 h-2 bg-gray-400 rounded-full animate-bounce" style="animation-delay: 0.2s;"></div></div><span class="text-xs text-gray-500 ml-2">{}</span></div></div></div>"#,
        voice.thinking
    )
}

pub const HISTORY_SIDEBAR: &str = "chat-history-sidebar";
pub const HISTORY_ITEMS: &str = "history-items";
const HISTORY_LOADING: &str = "history-loading";
const HISTORY_EMPTY: &str = "history-empty";
const SIDEBAR_CLOSED: &str = "translate-x-full";

/// The slide-out list of past conversations shared by both chat pages.
#[derive(Debug, Default)]
pub struct HistorySidebar {
    open: Cell<bool>,
}

impl HistorySidebar {
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// Flips the sidebar; returns whether it is now open.
    pub fn toggle(&self, ui: &dyn Ui) -> bool {
        let open = !self.open.get();
        if ui.set_class(HISTORY_SIDEBAR, SIDEBAR_CLOSED, !open) {
            self.open.set(open);
        }
        self.open.get()
    }

    pub fn close(&self, ui: &dyn Ui) {
        ui.set_class(HISTORY_SIDEBAR, SIDEBAR_CLOSED, true);
        self.open.set(false);
    }

    pub fn show_loading(&self, ui: &dyn Ui) {
        ui.set_class(HISTORY_ITEMS, "hidden", true);
        ui.set_class(HISTORY_LOADING, "hidden", false);
        ui.set_class(HISTORY_EMPTY, "hidden", true);
    }

    pub fn show_empty(&self, ui: &dyn Ui) {
        ui.set_class(HISTORY_LOADING, "hidden", true);
        ui.set_class(HISTORY_ITEMS, "hidden", true);
        ui.set_class(HISTORY_EMPTY, "hidden", false);
    }

    pub fn show_items(&self, ui: &dyn Ui, html: &str) {
        ui.set_class(HISTORY_LOADING, "hidden", true);
        ui.set_class(HISTORY_EMPTY, "hidden", true);
        ui.set_class(HISTORY_ITEMS, "hidden", false);
        ui.set_html(HISTORY_ITEMS, html);
    }
}

/// A send in flight; holds the placeholder node to remove on completion.
#[derive(Debug)]
#[must_use]
pub struct Pending {
    pub message: String,
    placeholder: Option<String>,
}

/// The transcript element plus the Idle/Sending switch.
#[derive(Debug)]
pub struct ChatShell {
    voice: BotVoice,
    phase: Cell<ChatPhase>,
}

impl ChatShell {
    pub fn new(voice: BotVoice) -> Self {
        Self {
            voice,
            phase: Cell::new(ChatPhase::Idle),
        }
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase.get()
    }

    pub fn voice(&self) -> &BotVoice {
        &self.voice
    }

    pub fn append(&self, ui: &dyn Ui, clock: &dyn Clock, content: &str, is_user: bool) -> Option<String> {
        let time = clock.local_now().format(self.voice.time_format).to_string();
        let node = ui.append_html(
            CHAT_MESSAGES,
            &message_html(&self.voice, content, is_user, &time),
        );
        ui.scroll_to_bottom(CHAT_MESSAGES);
        node
    }

    /// Empties the transcript, including any server-rendered placeholder.
    pub fn clear(&self, ui: &dyn Ui) {
        ui.set_html(CHAT_MESSAGES, "");
    }

    /// Starts a send of the input's trimmed text.
    ///
    /// Returns `None` without touching the page while a send is already in
    /// flight or when the input is blank.
    pub fn begin(&self, ui: &dyn Ui, clock: &dyn Clock) -> Option<Pending> {
        if self.phase.get() == ChatPhase::Sending {
            return None;
        }
        let message = crate::ui::trimmed_value(ui, CHAT_INPUT);
        if message.is_empty() {
            return None;
        }
        self.phase.set(ChatPhase::Sending);
        ui.set_disabled(CHAT_INPUT, true);
        ui.set_disabled(SEND_BUTTON, true);
        ui.set_html(SEND_BUTTON, SPINNER);

        self.append(ui, clock, &message, true);
        ui.set_value(CHAT_INPUT, "");
        let placeholder = ui.append_html(CHAT_MESSAGES, &thinking_html(&self.voice));
        ui.scroll_to_bottom(CHAT_MESSAGES);
        Some(Pending {
            message,
            placeholder,
        })
    }

    /// Replaces the placeholder with the reply and re-enables the input.
    pub fn finish(&self, ui: &dyn Ui, clock: &dyn Clock, pending: Pending, reply: &str) {
        if let Some(node) = pending.placeholder.as_deref() {
            ui.remove_node(node);
        }
        self.append(ui, clock, reply, false);

        self.phase.set(ChatPhase::Idle);
        ui.set_disabled(CHAT_INPUT, false);
        ui.set_disabled(SEND_BUTTON, false);
        let button = match self.voice.send_label {
            Some(label) => format!("{SEND_ICON}<span>{label}</span>"),
            None => SEND_ICON.to_string(),
        };
        ui.set_html(SEND_BUTTON, &button);
        ui.focus(CHAT_INPUT);
    }
}
