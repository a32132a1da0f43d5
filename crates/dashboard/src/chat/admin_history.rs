use std::cell::RefCell;
use std::rc::Rc;

use api::{AdminConversation, HttpClient};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use foundation::{escape_html, truncate_chars};
use runtime::SubscriptionTable;
use tracing::{error, info};

use super::{AdminChat, HistorySidebar};
use crate::context::Context;
use crate::ui::ToastKind;

const RESPONSE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    Toggle,
    Close,
    NewChat,
}

fn card_time(raw: &str, offset: FixedOffset) -> String {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&offset))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .and_then(|n| n.and_local_timezone(offset).single())
        });
    match parsed {
        Some(t) => t.format("%b %-d, %I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

/// Sidebar card for one saved admin conversation.
pub fn conversation_card_html(index: usize, convo: &AdminConversation, offset: FixedOffset) -> String {
    let first = convo
        .first_message
        .as_deref()
        .or(convo.messages.first().map(|m| m.message.as_str()))
        .unwrap_or("");
    let response = convo
        .messages
        .first()
        .map(|m| truncate_chars(&m.response, RESPONSE_PREVIEW_CHARS))
        .unwrap_or("");
    let mentioned = convo
        .user_mentioned
        .as_deref()
        .map(|u| {
            format!(
                r#"<span class="text-xs bg-green-100 text-green-700 px-2 py-0.5 rounded">{}</span>"#,
                escape_html(u)
            )
        })
        .unwrap_or_default();
    let count = convo.message_count.unwrap_or(1);
    let count_badge = if count > 1 {
        format!(r#"<span class="text-xs bg-blue-100 text-blue-700 px-2 py-0.5 rounded">{count} msgs</span>"#)
    } else {
        String::new()
    };
    format!(
        r#"<div class="bg-gray-50 rounded-lg p-3 hover:bg-gray-100 transition-colors border border-gray-200 relative group" data-conv-index="{index}"><button class="absolute top-2 right-2 opacity-0 group-hover:opacity-100 transition-opacity bg-red-500 hover:bg-red-600 text-white rounded p-1 z-10" data-delete-session="{session}" data-delete-index="{index}" title="Delete conversation">✕</button><div class="cursor-pointer" data-load-index="{index}"><div class="flex items-start justify-between mb-2"><p class="text-xs font-medium text-blue-600">{time}</p><div class="flex items-center gap-2">{mentioned}{count_badge}</div></div><p class="text-sm text-gray-800 font-medium mb-1 line-clamp-2">{first}</p><p class="text-xs text-gray-600 line-clamp-2">{response}...</p></div></div>"#,
        session = escape_html(&convo.session_id),
        time = card_time(&convo.timestamp, offset),
        first = escape_html(first),
        response = escape_html(response),
    )
}

/// Server-side conversation history for the admin assistant.
pub struct AdminChatHistory<H> {
    ctx: Rc<Context<H>>,
    chat: Rc<AdminChat<H>>,
    sidebar: HistorySidebar,
    conversations: RefCell<Vec<AdminConversation>>,
}

impl<H: HttpClient> AdminChatHistory<H> {
    pub fn new(ctx: Rc<Context<H>>, chat: Rc<AdminChat<H>>) -> Self {
        Self {
            ctx,
            chat,
            sidebar: HistorySidebar::default(),
            conversations: RefCell::new(Vec::new()),
        }
    }

    pub fn subscriptions() -> SubscriptionTable<HistoryAction> {
        SubscriptionTable::new()
            .on("toggle-history-btn", "click", HistoryAction::Toggle)
            .on("close-history-sidebar", "click", HistoryAction::Close)
            .on("new-chat-btn", "click", HistoryAction::NewChat)
    }

    pub async fn handle(&self, action: HistoryAction) {
        match action {
            HistoryAction::Toggle => {
                if self.sidebar.toggle(self.ctx.ui()) {
                    self.load_history().await;
                }
            }
            HistoryAction::Close => self.sidebar.close(self.ctx.ui()),
            HistoryAction::NewChat => self.chat.new_chat(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.sidebar.is_open()
    }

    pub fn len(&self) -> usize {
        self.conversations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.borrow().is_empty()
    }

    pub async fn load_history(&self) {
        let ui = self.ctx.ui();
        self.sidebar.show_loading(ui);
        match self.ctx.server().admin_chat_history(self.ctx.config.admin_history_limit).await {
            Ok(conversations) if !conversations.is_empty() => {
                *self.conversations.borrow_mut() = conversations;
                self.render();
            }
            Ok(_) => {
                self.conversations.borrow_mut().clear();
                self.sidebar.show_empty(ui);
            }
            Err(e) => {
                error!("failed to load chat history: {e}");
                self.sidebar.show_empty(ui);
            }
        }
    }

    fn render(&self) {
        let offset = self.ctx.clock.local_offset();
        let conversations = self.conversations.borrow();
        if conversations.is_empty() {
            self.sidebar.show_empty(self.ctx.ui());
            return;
        }
        let html: String = conversations
            .iter()
            .enumerate()
            .map(|(i, c)| conversation_card_html(i, c, offset))
            .collect();
        self.sidebar.show_items(self.ctx.ui(), &html);
    }

    /// Continues the conversation behind the card at `index`.
    pub fn load(&self, index: usize) -> bool {
        let Some(convo) = self.conversations.borrow().get(index).cloned() else {
            return false;
        };
        self.chat.load_conversation(&convo);
        self.sidebar.close(self.ctx.ui());
        info!(session = %convo.session_id, "conversation loaded");
        true
    }

    pub async fn delete(&self, index: usize) {
        let Some(session_id) = self
            .conversations
            .borrow()
            .get(index)
            .map(|c| c.session_id.clone())
        else {
            return;
        };
        if !self
            .ctx
            .ui()
            .confirm("Are you sure you want to delete this conversation?")
        {
            return;
        }
        match self.ctx.server().delete_admin_chat(&session_id).await {
            Ok(_) => {
                self.conversations
                    .borrow_mut()
                    .retain(|c| c.session_id != session_id);
                self.render();
                info!(session = %session_id, "conversation deleted");
            }
            Err(e) => {
                error!("delete error: {e}");
                self.ctx.toast(
                    ToastKind::Error,
                    &format!("Failed to delete conversation: {e}"),
                );
            }
        }
    }
}
