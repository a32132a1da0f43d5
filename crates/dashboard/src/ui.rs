/// Severity of a transient toast message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ToastKind {
    Error,
    Warning,
    Info,
    Success,
}

impl ToastKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
            ToastKind::Success => "success",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Error => "❌",
            ToastKind::Warning => "⚠️",
            ToastKind::Info => "ℹ️",
            ToastKind::Success => "✅",
        }
    }

    pub fn background_class(self) -> &'static str {
        match self {
            ToastKind::Error => "bg-red-500",
            ToastKind::Warning => "bg-yellow-500",
            ToastKind::Info => "bg-blue-500",
            ToastKind::Success => "bg-green-500",
        }
    }
}

pub const TOAST_DISMISS_MS: u32 = 5_000;

/// Everything controllers may do to the page.
///
/// Elements are addressed by id. Setters return `false` when the element is
/// missing so callers can skip dependent work; implementations log the miss.
pub trait Ui {
    fn exists(&self, id: &str) -> bool;
    fn set_text(&self, id: &str, text: &str) -> bool;
    fn set_html(&self, id: &str, html: &str) -> bool;
    fn set_value(&self, id: &str, value: &str) -> bool;
    fn value(&self, id: &str) -> Option<String>;
    fn checked(&self, id: &str) -> bool;
    fn set_hidden(&self, id: &str, hidden: bool) -> bool;
    /// Toggles one class name. Names containing whitespace are rejected.
    fn set_class(&self, id: &str, class: &str, on: bool) -> bool;
    fn set_disabled(&self, id: &str, disabled: bool) -> bool;
    fn focus(&self, id: &str) -> bool;
    fn scroll_to_bottom(&self, id: &str) -> bool;

    /// Appends markup to a container and returns an id for the new node.
    fn append_html(&self, container: &str, html: &str) -> Option<String>;
    fn remove_node(&self, node_id: &str) -> bool;

    fn toast(&self, kind: ToastKind, message: &str);
    fn confirm(&self, message: &str) -> bool;

    /// Shows the `[data-legend=key]` block and hides every other legend.
    fn show_legend(&self, key: Option<&str>);

    /// Toggles every class of a space-separated list such as a Tailwind
    /// badge style.
    fn set_classes(&self, id: &str, classes: &str, on: bool) -> bool {
        classes
            .split_whitespace()
            .fold(true, |ok, class| self.set_class(id, class, on) && ok)
    }
}

/// The trimmed input value, empty when the element is missing.
pub fn trimmed_value(ui: &dyn Ui, id: &str) -> String {
    ui.value(id).map(|v| v.trim().to_string()).unwrap_or_default()
}
