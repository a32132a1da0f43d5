//! Turns subscription tables and polling schedules into live browser
//! listeners and intervals.

use std::future::Future;
use std::rc::Rc;

use runtime::{PollSchedule, SubscriptionTable, TimerSet};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, KeyboardEvent};

use crate::platform::IntervalHandle;

/// Attaches one listener per table row. `keypress` rows only fire on Enter,
/// and `submit` rows suppress the browser's own form submission.
pub fn bind<A, F>(doc: &Document, table: &SubscriptionTable<A>, dispatch: F)
where
    A: Copy + PartialEq + 'static,
    F: Fn(A) + 'static,
{
    let dispatch = Rc::new(dispatch);
    for row in table.rows() {
        let Some(el) = doc.get_element_by_id(row.element_id) else {
            debug!("#{} absent, {} listener skipped", row.element_id, row.event);
            continue;
        };
        let action = row.action;
        let event = row.event;
        let dispatch = dispatch.clone();
        let cb = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
            match event {
                "submit" => ev.prevent_default(),
                "keypress" => match ev.dyn_ref::<KeyboardEvent>() {
                    Some(k) if k.key() == "Enter" && !k.shift_key() => ev.prevent_default(),
                    _ => return,
                },
                _ => {}
            }
            dispatch(action);
        });
        if let Err(e) = el.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref()) {
            warn!("cannot listen for {event} on #{}: {e:?}", row.element_id);
        }
        cb.forget();
    }
}

/// Like [`bind`] for async handlers.
pub fn bind_async<A, F, Fut>(doc: &Document, table: &SubscriptionTable<A>, handle: F)
where
    A: Copy + PartialEq + 'static,
    F: Fn(A) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    bind(doc, table, move |action| spawn_local(handle(action)));
}

/// Routes document-level events to `f` with the event's target element.
pub fn on_document<F>(doc: &Document, event: &str, f: F)
where
    F: Fn(&Event, &Element) + 'static,
{
    let cb = Closure::<dyn FnMut(Event)>::new(move |ev: Event| {
        if let Some(target) = ev.target().and_then(|t| t.dyn_into::<Element>().ok()) {
            f(&ev, &target);
        }
    });
    if let Err(e) = doc.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref()) {
        warn!("cannot listen for document {event}: {e:?}");
    }
    cb.forget();
}

/// Calls `f` for every Escape key press on the page.
pub fn on_escape(doc: &Document, f: impl Fn() + 'static) {
    on_document(doc, "keydown", move |ev, _| {
        if ev.dyn_ref::<KeyboardEvent>().is_some_and(|k| k.key() == "Escape") {
            f();
        }
    });
}

/// Nearest ancestor (or self) carrying `attr`, with the attribute's value.
pub fn closest_with(target: &Element, attr: &str) -> Option<(Element, String)> {
    let el = target.closest(&format!("[{attr}]")).ok().flatten()?;
    let value = el.get_attribute(attr)?;
    Some((el, value))
}

/// Starts a poll: one tick right away when the schedule asks for it, then
/// one per interval, each tick spawned as its own task.
pub fn poll<F, Fut>(timers: &mut TimerSet, schedule: PollSchedule, tick: F)
where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    if schedule.fire_immediately {
        spawn_local(tick());
    }
    let handle = IntervalHandle::every(schedule.interval_ms, move || spawn_local(tick()));
    timers.insert(schedule.name, Box::new(handle));
    debug!(name = schedule.name, every_ms = schedule.interval_ms, "polling started");
}
