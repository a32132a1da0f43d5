use std::cell::Cell;

use dashboard::{ToastKind, Ui};
use dashboard::ui::TOAST_DISMISS_MS;
use gloo_timers::callback::Timeout;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlOptionElement,
    HtmlSelectElement, HtmlTextAreaElement,
};

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// The page's DOM, addressed by element id.
pub struct DomUi {
    doc: Document,
    next_node: Cell<u64>,
}

impl DomUi {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            next_node: Cell::new(0),
        }
    }

    fn element(&self, id: &str) -> Option<Element> {
        let found = self.doc.get_element_by_id(id);
        if found.is_none() {
            debug!("element #{id} not on this page");
        }
        found
    }

    fn html_element(&self, id: &str) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }
}

fn selected_values(select: &HtmlSelectElement) -> String {
    let options = select.selected_options();
    (0..options.length())
        .filter_map(|i| options.item(i))
        .filter_map(|o| o.dyn_into::<HtmlOptionElement>().ok())
        .map(|o| o.value())
        .collect::<Vec<_>>()
        .join(",")
}

impl Ui for DomUi {
    fn exists(&self, id: &str) -> bool {
        self.doc.get_element_by_id(id).is_some()
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        self.element(id).map(|e| e.set_text_content(Some(text))).is_some()
    }

    fn set_html(&self, id: &str, html: &str) -> bool {
        self.element(id).map(|e| e.set_inner_html(html)).is_some()
    }

    fn set_value(&self, id: &str, value: &str) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        } else {
            return false;
        }
        true
    }

    /// Multi-selects report their selected values joined with commas.
    fn value(&self, id: &str) -> Option<String> {
        let el = self.element(id)?;
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            Some(area.value())
        } else if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            Some(if select.multiple() {
                selected_values(select)
            } else {
                select.value()
            })
        } else {
            None
        }
    }

    fn checked(&self, id: &str) -> bool {
        self.element(id)
            .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
            .is_some_and(|i| i.checked())
    }

    fn set_hidden(&self, id: &str, hidden: bool) -> bool {
        let Some(el) = self.html_element(id) else {
            return false;
        };
        let style = el.style();
        let done = if hidden {
            style.set_property("display", "none")
        } else {
            style.remove_property("display").map(|_| ())
        };
        done.is_ok()
    }

    fn set_class(&self, id: &str, class: &str, on: bool) -> bool {
        if class.is_empty() || class.contains(char::is_whitespace) {
            warn!("class name {class:?} for #{id} is not a single token");
            return false;
        }
        self.element(id)
            .map(|e| e.class_list().toggle_with_force(class, on).is_ok())
            .unwrap_or(false)
    }

    fn set_disabled(&self, id: &str, disabled: bool) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        if let Some(button) = el.dyn_ref::<HtmlButtonElement>() {
            button.set_disabled(disabled);
        } else if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            input.set_disabled(disabled);
        } else if let Some(area) = el.dyn_ref::<HtmlTextAreaElement>() {
            area.set_disabled(disabled);
        } else {
            return false;
        }
        true
    }

    fn focus(&self, id: &str) -> bool {
        self.html_element(id).is_some_and(|e| e.focus().is_ok())
    }

    fn scroll_to_bottom(&self, id: &str) -> bool {
        self.element(id)
            .map(|e| e.set_scroll_top(e.scroll_height()))
            .is_some()
    }

    fn append_html(&self, container: &str, html: &str) -> Option<String> {
        let parent = self.element(container)?;
        if let Err(e) = parent.insert_adjacent_html("beforeend", html) {
            warn!("cannot append to #{container}: {e:?}");
            return None;
        }
        let node = parent.last_element_child()?;
        if node.id().is_empty() {
            let n = self.next_node.get() + 1;
            self.next_node.set(n);
            node.set_id(&format!("ui-node-{n}"));
        }
        Some(node.id())
    }

    fn remove_node(&self, node_id: &str) -> bool {
        match self.doc.get_element_by_id(node_id) {
            Some(el) => {
                el.remove();
                true
            }
            None => false,
        }
    }

    fn toast(&self, kind: ToastKind, message: &str) {
        let Some(body) = self.doc.body() else {
            return;
        };
        let Ok(toast) = self.doc.create_element("div") else {
            return;
        };
        toast.set_class_name(&format!(
            "fixed top-4 right-4 {} text-white px-6 py-3 rounded-lg shadow-lg z-50 transition-opacity",
            kind.background_class()
        ));
        toast.set_inner_html(&format!(
            r#"<div class="flex items-center"><span class="mr-2">{}</span><span></span></div>"#,
            kind.icon()
        ));
        if let Ok(Some(text)) = toast.query_selector("span:last-child") {
            text.set_text_content(Some(message));
        }
        if body.append_child(&toast).is_err() {
            return;
        }
        Timeout::new(TOAST_DISMISS_MS, move || toast.remove()).forget();
    }

    fn confirm(&self, message: &str) -> bool {
        web_sys::window()
            .and_then(|w| w.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    fn show_legend(&self, key: Option<&str>) {
        let Ok(legends) = self.doc.query_selector_all("[data-legend]") else {
            return;
        };
        for i in 0..legends.length() {
            let Some(el) = legends.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let show = key.is_some_and(|k| el.get_attribute("data-legend").as_deref() == Some(k));
            let _ = el.class_list().toggle_with_force("hidden", !show);
        }
    }
}
