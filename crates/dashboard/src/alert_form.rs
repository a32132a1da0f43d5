//! The "new alert" dialog on the admin alerts page. Sending is simulated on
//! the client; the form only validates and collects recipients.

use std::cell::RefCell;
use std::rc::Rc;

use api::HttpClient;
use foundation::escape_html;
use runtime::SubscriptionTable;
use serde::Deserialize;
use tracing::info;

use crate::context::Context;
use crate::ui::{trimmed_value, ToastKind};

const MODAL: &str = "alert-modal";
const TITLE: &str = "alert-title";
const MESSAGE: &str = "alert-message";
const SEARCH: &str = "user-search";
const SUBMIT: &str = "send-alert";
const TAGS: &str = "user-tags";
const LOCATION_BOX: &str = "location-selection";
const SPECIFIC_BOX: &str = "specific-users-selection";
const SELECTED_ITEM: &str = "bg-blue-100";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlertFormAction {
    Show,
    Hide,
    Clear,
    Submit,
    SelectionChanged,
    SearchUsers,
}

/// Who the alert goes to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecipientMode {
    All,
    Location,
    Specific,
}

impl RecipientMode {
    const ALL: [RecipientMode; 3] = [RecipientMode::All, RecipientMode::Location, RecipientMode::Specific];

    /// Id of the radio button for this mode.
    pub fn radio_id(self) -> &'static str {
        match self {
            RecipientMode::All => "user-selection-all",
            RecipientMode::Location => "user-selection-location",
            RecipientMode::Specific => "user-selection-specific",
        }
    }
}

/// A user listed in the specific-users picker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlertRecipient {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl AlertRecipient {
    /// Element id of the picker row.
    pub fn item_id(&self) -> String {
        format!("user-item-{}", self.id)
    }

    fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q) || self.email.to_lowercase().contains(&q)
    }
}

/// Everything the form collects on a valid submit.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertFormData {
    pub alert_type: String,
    pub title: String,
    pub message: String,
    pub mode: RecipientMode,
    pub locations: Vec<String>,
    pub recipients: Vec<AlertRecipient>,
}

fn tag_html(user: &AlertRecipient) -> String {
    format!(
        r#"<span class="inline-flex items-center px-3 py-1 rounded-full text-xs font-medium bg-blue-100 text-blue-800">{}<button type="button" class="ml-1 text-blue-400 hover:text-blue-600" data-remove-user="{}">×</button></span>"#,
        escape_html(&user.name),
        escape_html(&user.id)
    )
}

#[derive(Debug, Default)]
struct FormState {
    users: Vec<AlertRecipient>,
    selected: Vec<AlertRecipient>,
}

pub struct AlertForm<H> {
    ctx: Rc<Context<H>>,
    state: RefCell<FormState>,
}

impl<H: HttpClient> AlertForm<H> {
    pub fn new(ctx: Rc<Context<H>>, users: Vec<AlertRecipient>) -> Self {
        Self {
            ctx,
            state: RefCell::new(FormState {
                users,
                selected: Vec::new(),
            }),
        }
    }

    pub fn subscriptions() -> SubscriptionTable<AlertFormAction> {
        let mut table = SubscriptionTable::new()
            .on("add-alert-btn", "click", AlertFormAction::Show)
            .on("close-alert-modal", "click", AlertFormAction::Hide)
            .on("clear-form", "click", AlertFormAction::Clear)
            .on("alert-form", "submit", AlertFormAction::Submit)
            .on(SEARCH, "input", AlertFormAction::SearchUsers);
        for mode in RecipientMode::ALL {
            table.push(mode.radio_id(), "change", AlertFormAction::SelectionChanged);
        }
        table
    }

    pub fn init(&self) {
        self.sync_selection_boxes();
    }

    /// Returns the collected form when a submit went through.
    pub fn handle(&self, action: AlertFormAction) -> Option<AlertFormData> {
        match action {
            AlertFormAction::Show => self.show(),
            AlertFormAction::Hide => self.hide(),
            AlertFormAction::Clear => self.clear(),
            AlertFormAction::Submit => return self.submit(),
            AlertFormAction::SelectionChanged => self.sync_selection_boxes(),
            AlertFormAction::SearchUsers => self.filter_users(),
        }
        None
    }

    pub fn show(&self) {
        self.ctx.ui().set_class(MODAL, "hidden", false);
    }

    pub fn hide(&self) {
        self.ctx.ui().set_class(MODAL, "hidden", true);
    }

    pub fn mode(&self) -> RecipientMode {
        let ui = self.ctx.ui();
        RecipientMode::ALL
            .into_iter()
            .find(|m| ui.checked(m.radio_id()))
            .unwrap_or(RecipientMode::All)
    }

    fn sync_selection_boxes(&self) {
        let ui = self.ctx.ui();
        let mode = self.mode();
        ui.set_class(LOCATION_BOX, "hidden", mode != RecipientMode::Location);
        ui.set_class(SPECIFIC_BOX, "hidden", mode != RecipientMode::Specific);
    }

    pub fn clear(&self) {
        let ui = self.ctx.ui();
        for id in [TITLE, MESSAGE, SEARCH] {
            ui.set_value(id, "");
        }
        let selected = std::mem::take(&mut self.state.borrow_mut().selected);
        for user in &selected {
            ui.set_class(&user.item_id(), SELECTED_ITEM, false);
        }
        self.render_tags();
        self.filter_users();
        self.sync_selection_boxes();
    }

    /// Hides picker rows whose name and email both miss the search text.
    pub fn filter_users(&self) {
        let ui = self.ctx.ui();
        let query = ui.value(SEARCH).unwrap_or_default();
        for user in &self.state.borrow().users {
            ui.set_hidden(&user.item_id(), !user.matches(&query));
        }
    }

    pub fn toggle_user(&self, id: &str) {
        let ui = self.ctx.ui();
        {
            let mut state = self.state.borrow_mut();
            if let Some(pos) = state.selected.iter().position(|u| u.id == id) {
                let user = state.selected.remove(pos);
                ui.set_class(&user.item_id(), SELECTED_ITEM, false);
            } else if let Some(user) = state.users.iter().find(|u| u.id == id).cloned() {
                ui.set_class(&user.item_id(), SELECTED_ITEM, true);
                state.selected.push(user);
            }
        }
        self.render_tags();
    }

    pub fn remove_user(&self, id: &str) {
        let removed = {
            let mut state = self.state.borrow_mut();
            let before = state.selected.len();
            state.selected.retain(|u| u.id != id);
            before != state.selected.len()
        };
        if removed {
            self.ctx
                .ui()
                .set_class(&format!("user-item-{id}"), SELECTED_ITEM, false);
        }
        self.render_tags();
    }

    pub fn selected(&self) -> Vec<AlertRecipient> {
        self.state.borrow().selected.clone()
    }

    fn render_tags(&self) {
        let html: String = self.state.borrow().selected.iter().map(tag_html).collect();
        self.ctx.ui().set_html(TAGS, &html);
    }

    fn collect(&self) -> AlertFormData {
        let ui = self.ctx.ui();
        AlertFormData {
            alert_type: ui.value("alert-type").unwrap_or_default(),
            title: trimmed_value(ui, TITLE),
            message: trimmed_value(ui, MESSAGE),
            mode: self.mode(),
            locations: ui
                .value("target-areas")
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            recipients: self.selected(),
        }
    }

    pub fn submit(&self) -> Option<AlertFormData> {
        let data = self.collect();
        if data.title.is_empty() || data.message.is_empty() {
            self.ctx
                .toast(ToastKind::Error, "Please fill in all required fields");
            return None;
        }
        let ui = self.ctx.ui();
        ui.set_text(SUBMIT, "Sending...");
        ui.set_disabled(SUBMIT, true);

        info!(mode = ?data.mode, recipients = data.recipients.len(), "alert form submitted");
        self.ctx.toast(ToastKind::Success, "Alert sent successfully!");
        self.clear();
        self.hide();

        ui.set_text(SUBMIT, "Send Alert");
        ui.set_disabled(SUBMIT, false);
        Some(data)
    }
}
