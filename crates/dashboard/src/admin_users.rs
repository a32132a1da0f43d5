//! Admin user management: the view, edit and delete dialogs backed by the
//! server, and the client-side filtered users table.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use api::{AdminUser, HttpClient, UserEditForm};
use foundation::{escape_html, initial};
use runtime::SubscriptionTable;
use serde::Deserialize;
use tracing::{error, info};

use crate::context::Context;
use crate::ui::ToastKind;

const VIEW_MODAL: &str = "viewUserModal";
const EDIT_MODAL: &str = "editUserModal";
const DELETE_MODAL: &str = "deleteUserModal";
const DELETE_CONFIRM: &str = "deleteConfirmText";
const CONFIRM_WORD: &str = "DELETE";

const STATUS_ACTIVE: &str = "px-3 py-1 text-xs font-semibold rounded-full bg-green-100 text-green-800";
const STATUS_INACTIVE: &str = "px-3 py-1 text-xs font-semibold rounded-full bg-red-100 text-red-800";

/// Edit dialog inputs, in `form_values` order.
const EDIT_FIELDS: [&str; 9] = [
    "editFirstName",
    "editMiddleName",
    "editLastName",
    "editUsername",
    "editEmail",
    "editPhone",
    "editRole",
    "editStatus",
    "editNewPassword",
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UserAction {
    CloseView,
    EditFromView,
    CloseEdit,
    SubmitEdit,
    DeleteFromEdit,
    CloseDelete,
    ConfirmDelete,
}

/// What happened to an edit submission.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Nothing differed from the loaded user; no request was made.
    Unchanged,
    Saved,
    Failed,
    NoUser,
}

fn full_name(user: &AdminUser) -> String {
    let name = format!("{} {}", user.first_name, user.last_name);
    if name.trim().is_empty() {
        user.username.clone()
    } else {
        name
    }
}

fn or_dashes(text: &str) -> &str {
    if text.trim().is_empty() { "--" } else { text }
}

/// The view/edit/delete dialogs on the user management page.
pub struct AdminUserActions<H> {
    ctx: Rc<Context<H>>,
    current: Cell<Option<i64>>,
    /// The edit form as populated, for change detection.
    snapshot: RefCell<Option<UserEditForm>>,
}

impl<H: HttpClient> AdminUserActions<H> {
    pub fn new(ctx: Rc<Context<H>>) -> Self {
        Self {
            ctx,
            current: Cell::new(None),
            snapshot: RefCell::new(None),
        }
    }

    pub fn subscriptions() -> SubscriptionTable<UserAction> {
        SubscriptionTable::new()
            .on("close-view-user-modal", "click", UserAction::CloseView)
            .on("edit-from-view-btn", "click", UserAction::EditFromView)
            .on("close-edit-user-modal", "click", UserAction::CloseEdit)
            .on("editUserForm", "submit", UserAction::SubmitEdit)
            .on("delete-from-edit-btn", "click", UserAction::DeleteFromEdit)
            .on("close-delete-user-modal", "click", UserAction::CloseDelete)
            .on("confirm-delete-user-btn", "click", UserAction::ConfirmDelete)
    }

    /// Returns whether the page should reload to show fresh data.
    pub async fn handle(&self, action: UserAction) -> bool {
        match action {
            UserAction::CloseView => self.close_view(),
            UserAction::EditFromView => {
                let id = self.current.get();
                self.close_view();
                if let Some(id) = id {
                    self.edit(id).await;
                }
            }
            UserAction::CloseEdit => self.close_edit(),
            UserAction::SubmitEdit => return self.submit_edit().await == EditOutcome::Saved,
            UserAction::DeleteFromEdit => {
                let id = self.current.get();
                self.close_edit();
                if let Some(id) = id {
                    self.delete(id).await;
                }
            }
            UserAction::CloseDelete => self.close_delete(),
            UserAction::ConfirmDelete => return self.confirm_delete().await,
        }
        false
    }

    pub fn current_user(&self) -> Option<i64> {
        self.current.get()
    }

    /// Escape closes whichever dialog is open.
    pub fn close_all(&self) {
        self.close_view();
        self.close_edit();
        self.close_delete();
    }

    async fn load(&self, id: i64) -> Option<AdminUser> {
        self.current.set(Some(id));
        match self.ctx.server().admin_user(id).await {
            Ok(user) => Some(user),
            Err(e) => {
                error!(user = id, "error loading user details: {e}");
                self.ctx
                    .toast(ToastKind::Error, &format!("Error loading user details: {e}"));
                None
            }
        }
    }

    pub async fn view(&self, id: i64) {
        let Some(user) = self.load(id).await else {
            return;
        };
        let ui = self.ctx.ui();
        ui.set_text("viewUserAvatar", &initial(&user.username));
        ui.set_text("viewUserName", &full_name(&user));
        ui.set_text("viewUserEmail", &user.email);
        if user.is_active {
            ui.set_classes("viewUserStatus", STATUS_INACTIVE, false);
            ui.set_classes("viewUserStatus", STATUS_ACTIVE, true);
            ui.set_text("viewUserStatus", "Active");
        } else {
            ui.set_classes("viewUserStatus", STATUS_ACTIVE, false);
            ui.set_classes("viewUserStatus", STATUS_INACTIVE, true);
            ui.set_text("viewUserStatus", "Inactive");
        }
        ui.set_text("viewUserRole", if user.is_staff { "Admin" } else { "User" });
        ui.set_text("viewUsername", &user.username);
        let full = format!(
            "{} {} {}",
            user.first_name,
            user.middle_name.as_deref().unwrap_or(""),
            user.last_name
        );
        ui.set_text("viewFullName", or_dashes(full.trim()));
        ui.set_text("viewEmail", &user.email);
        ui.set_text("viewPhone", or_dashes(user.phone_number.as_deref().unwrap_or("")));
        ui.set_text("viewDateJoined", &user.date_joined);
        ui.set_text("viewLastLogin", &user.last_login);
        ui.set_text("viewLocation", &user.location);
        ui.set_text("viewCoordinates", &user.coordinates);
        ui.set_class(VIEW_MODAL, "hidden", false);
    }

    pub fn close_view(&self) {
        self.ctx.ui().set_class(VIEW_MODAL, "hidden", true);
        self.current.set(None);
    }

    pub async fn edit(&self, id: i64) {
        let Some(user) = self.load(id).await else {
            return;
        };
        let form = UserEditForm::from_user(&user);
        let ui = self.ctx.ui();
        ui.set_value("editUserId", &user.id.to_string());
        for (field, value) in EDIT_FIELDS.iter().zip(form_values(&form)) {
            ui.set_value(field, value);
        }
        *self.snapshot.borrow_mut() = Some(form);
        ui.set_class(EDIT_MODAL, "hidden", false);
    }

    pub fn close_edit(&self) {
        self.ctx.ui().set_class(EDIT_MODAL, "hidden", true);
        self.current.set(None);
        self.snapshot.borrow_mut().take();
    }

    fn read_form(&self) -> UserEditForm {
        let ui = self.ctx.ui();
        let v = |id: &str| ui.value(id).unwrap_or_default();
        UserEditForm {
            first_name: v("editFirstName"),
            middle_name: v("editMiddleName"),
            last_name: v("editLastName"),
            username: v("editUsername"),
            email: v("editEmail"),
            phone_number: v("editPhone"),
            role: v("editRole"),
            is_active: v("editStatus"),
            new_password: v("editNewPassword"),
        }
    }

    /// Posts the edit form unless it matches what was loaded.
    pub async fn submit_edit(&self) -> EditOutcome {
        let Some(id) = self.current.get() else {
            return EditOutcome::NoUser;
        };
        let form = self.read_form();
        if self.snapshot.borrow().as_ref() == Some(&form) {
            self.ctx.toast(ToastKind::Info, "No changes detected");
            return EditOutcome::Unchanged;
        }
        match self.ctx.server().edit_admin_user(id, &form).await {
            Ok(_) => {
                self.ctx
                    .toast(ToastKind::Success, "User updated successfully!");
                self.close_edit();
                info!(user = id, "user updated");
                EditOutcome::Saved
            }
            Err(e) => {
                error!(user = id, "error updating user: {e}");
                self.ctx
                    .toast(ToastKind::Error, &format!("Error updating user: {e}"));
                EditOutcome::Failed
            }
        }
    }

    pub async fn delete(&self, id: i64) {
        let Some(user) = self.load(id).await else {
            return;
        };
        let ui = self.ctx.ui();
        ui.set_value("deleteUserId", &user.id.to_string());
        ui.set_text("deleteUserAvatar", &initial(&user.username));
        ui.set_text("deleteUserName", &full_name(&user));
        ui.set_text("deleteUserEmail", &user.email);
        ui.set_value(DELETE_CONFIRM, "");
        ui.set_class(DELETE_MODAL, "hidden", false);
    }

    pub fn close_delete(&self) {
        let ui = self.ctx.ui();
        ui.set_class(DELETE_MODAL, "hidden", true);
        ui.set_value(DELETE_CONFIRM, "");
        self.current.set(None);
    }

    /// Deletes only when the confirmation box holds exactly `DELETE`.
    pub async fn confirm_delete(&self) -> bool {
        let Some(id) = self.current.get() else {
            return false;
        };
        let typed = self.ctx.ui().value(DELETE_CONFIRM).unwrap_or_default();
        if typed != CONFIRM_WORD {
            self.ctx
                .toast(ToastKind::Error, "Please type DELETE to confirm");
            return false;
        }
        match self.ctx.server().delete_admin_user(id).await {
            Ok(ack) => {
                let message = ack
                    .message
                    .unwrap_or_else(|| "User deleted successfully!".to_string());
                self.ctx.toast(ToastKind::Success, &message);
                self.close_delete();
                info!(user = id, "user deleted");
                true
            }
            Err(e) => {
                error!(user = id, "error deleting user: {e}");
                self.ctx
                    .toast(ToastKind::Error, &format!("Error deleting user: {e}"));
                false
            }
        }
    }
}

fn form_values(form: &UserEditForm) -> [&str; 9] {
    [
        &form.first_name,
        &form.middle_name,
        &form.last_name,
        &form.username,
        &form.email,
        &form.phone_number,
        &form.role,
        &form.is_active,
        &form.new_password,
    ]
}

// ---------------------------------------------------------------------------
// Users table
// ---------------------------------------------------------------------------

/// One row of the users table, as embedded by the page in `data-users`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TableUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: String,
    pub role: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, rename = "lastActive")]
    pub last_active: String,
}

impl TableUser {
    fn initials(&self) -> String {
        self.name
            .split(' ')
            .filter_map(|part| part.chars().next())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFilters {
    pub search: String,
    /// `all`, `active`, `inactive` or `suspended`.
    pub status: String,
    /// `all`, `user` or `admin`.
    pub role: String,
}

impl Default for TableFilters {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: "all".to_string(),
            role: "all".to_string(),
        }
    }
}

impl TableFilters {
    pub fn matches(&self, user: &TableUser) -> bool {
        let q = self.search.to_lowercase();
        let search = q.is_empty()
            || user.name.to_lowercase().contains(&q)
            || user.email.to_lowercase().contains(&q);
        search
            && (self.status == "all" || user.status == self.status)
            && (self.role == "all" || user.role == self.role)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TableAction {
    Search,
    StatusFilter,
    RoleFilter,
    Refresh,
    CloseModal,
}

/// Row buttons, dispatched by the page from `data-action`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RowAction {
    View,
    Suspend,
    Delete,
}

impl RowAction {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "view" => Some(RowAction::View),
            "suspend" => Some(RowAction::Suspend),
            "delete" => Some(RowAction::Delete),
            _ => None,
        }
    }
}

fn status_class(status: &str) -> &'static str {
    match status {
        "active" => "bg-green-100 text-green-800",
        "suspended" => "bg-red-100 text-red-800",
        _ => "bg-gray-100 text-gray-800",
    }
}

pub fn user_row_html(user: &TableUser) -> String {
    let role_class = if user.role == "admin" {
        "bg-purple-100 text-purple-800"
    } else {
        "bg-gray-100 text-gray-800"
    };
    let suspend = if user.status == "suspended" {
        "Unsuspend"
    } else {
        "Suspend"
    };
    format!(
        r#"<tr class="hover:bg-gray-50"><td class="px-6 py-4"><input type="checkbox" class="user-checkbox" data-user-id="{id}"></td><td class="px-6 py-4"><div class="flex items-center"><div class="w-10 h-10 bg-blue-500 rounded-full flex items-center justify-center text-white font-medium">{initials}</div><div class="ml-4"><div class="text-sm font-medium text-gray-900">{name}</div><div class="text-sm text-gray-500">{email}</div></div></div></td><td class="px-6 py-4"><span class="inline-flex px-2 py-1 text-xs font-semibold rounded-full {status_class}">{status}</span></td><td class="px-6 py-4"><span class="inline-flex px-2 py-1 text-xs font-medium rounded-full {role_class}">{role}</span></td><td class="px-6 py-4 text-sm text-gray-500">{location}</td><td class="px-6 py-4 text-sm text-gray-500">{last_active}</td><td class="px-6 py-4 text-sm space-x-1"><button data-action="view" data-user-id="{id}" class="text-blue-600 hover:text-blue-800">View</button><button data-action="suspend" data-user-id="{id}" class="text-yellow-600 hover:text-yellow-800">{suspend}</button><button data-action="delete" data-user-id="{id}" class="text-red-600 hover:text-red-800">Delete</button></td></tr>"#,
        id = user.id,
        initials = escape_html(&user.initials()),
        name = escape_html(&user.name),
        email = escape_html(&user.email),
        status_class = status_class(&user.status),
        status = escape_html(&user.status),
        role = escape_html(&user.role),
        location = escape_html(&user.location),
        last_active = escape_html(&user.last_active),
    )
}

fn user_details_html(user: &TableUser) -> String {
    format!(
        r#"<div class="space-y-4"><div class="flex items-center space-x-4"><div class="w-16 h-16 bg-blue-500 rounded-full flex items-center justify-center text-white text-xl font-bold">{}</div><div><h4 class="text-lg font-semibold">{}</h4><p class="text-gray-600">{}</p></div></div><div class="grid grid-cols-2 gap-4 text-sm"><div><span class="font-medium">Status:</span> {}</div><div><span class="font-medium">Role:</span> {}</div><div><span class="font-medium">Location:</span> {}</div><div><span class="font-medium">Last Active:</span> {}</div></div></div>"#,
        escape_html(&user.initials()),
        escape_html(&user.name),
        escape_html(&user.email),
        escape_html(&user.status),
        escape_html(&user.role),
        escape_html(&user.location),
        escape_html(&user.last_active),
    )
}

/// The filterable users list. Suspend and delete here are local to the page.
pub struct UsersTable<H> {
    ctx: Rc<Context<H>>,
    users: RefCell<Vec<TableUser>>,
    filters: RefCell<TableFilters>,
}

impl<H: HttpClient> UsersTable<H> {
    pub fn new(ctx: Rc<Context<H>>) -> Self {
        Self {
            ctx,
            users: RefCell::new(Vec::new()),
            filters: RefCell::new(TableFilters::default()),
        }
    }

    pub fn subscriptions() -> SubscriptionTable<TableAction> {
        SubscriptionTable::new()
            .on("user-search", "input", TableAction::Search)
            .on("status-filter", "change", TableAction::StatusFilter)
            .on("role-filter", "change", TableAction::RoleFilter)
            .on("refresh-users", "click", TableAction::Refresh)
            .on("close-user-modal", "click", TableAction::CloseModal)
    }

    /// `Refresh` is handled by the page, which re-reads the embedded rows.
    pub fn handle(&self, action: TableAction) {
        let ui = self.ctx.ui();
        let read = |id: &str| ui.value(id).unwrap_or_default();
        match action {
            TableAction::Search => self.filters.borrow_mut().search = read("user-search"),
            TableAction::StatusFilter => self.filters.borrow_mut().status = read("status-filter"),
            TableAction::RoleFilter => self.filters.borrow_mut().role = read("role-filter"),
            TableAction::Refresh => {}
            TableAction::CloseModal => {
                ui.set_class("user-modal", "hidden", true);
                return;
            }
        }
        self.render();
    }

    /// Replaces the rows from the page's embedded JSON.
    pub fn load_json(&self, raw: &str) -> Result<usize, serde_json::Error> {
        let users: Vec<TableUser> = serde_json::from_str(raw)?;
        let count = users.len();
        self.load(users);
        Ok(count)
    }

    pub fn load(&self, users: Vec<TableUser>) {
        *self.users.borrow_mut() = users;
        self.render();
    }

    pub fn visible(&self) -> Vec<TableUser> {
        let filters = self.filters.borrow();
        self.users
            .borrow()
            .iter()
            .filter(|u| filters.matches(u))
            .cloned()
            .collect()
    }

    fn render(&self) {
        let visible = self.visible();
        let ui = self.ctx.ui();
        let html: String = visible.iter().map(user_row_html).collect();
        ui.set_html("users-table-body", &html);
        ui.set_text("total-count", &visible.len().to_string());
        ui.set_text("showing-count", &visible.len().to_string());
    }

    pub fn row_action(&self, action: RowAction, id: i64) {
        let Some(user) = self.users.borrow().iter().find(|u| u.id == id).cloned() else {
            return;
        };
        let ui = self.ctx.ui();
        match action {
            RowAction::View => {
                ui.set_html("user-details-content", &user_details_html(&user));
                ui.set_class("user-modal", "hidden", false);
            }
            RowAction::Suspend => {
                if let Some(u) = self.users.borrow_mut().iter_mut().find(|u| u.id == id) {
                    u.status = if u.status == "suspended" {
                        "active".to_string()
                    } else {
                        "suspended".to_string()
                    };
                }
                self.render();
            }
            RowAction::Delete => {
                if ui.confirm("Delete this user?") {
                    self.users.borrow_mut().retain(|u| u.id != id);
                    self.render();
                }
            }
        }
    }
}
