/// Something that can be cancelled exactly once, like a browser interval.
pub trait Disposable {
    fn dispose(&mut self);
}

/// Fixed-interval polling description; no backoff and no jitter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PollSchedule {
    pub name: &'static str,
    pub interval_ms: u32,
    /// Whether to run one tick immediately when polling starts.
    pub fire_immediately: bool,
}

impl PollSchedule {
    pub const fn every(name: &'static str, interval_ms: u32) -> Self {
        Self {
            name,
            interval_ms,
            fire_immediately: true,
        }
    }
}

/// Named set of live timer handles.
///
/// Inserting under a name that is already live disposes the older handle, so
/// a component never ends up with two intervals for the same poll.
#[derive(Default)]
pub struct TimerSet {
    handles: Vec<(&'static str, Box<dyn Disposable>)>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &'static str, handle: Box<dyn Disposable>) {
        self.cancel(name);
        self.handles.push((name, handle));
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.handles.iter().any(|(n, _)| *n == name)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn cancel(&mut self, name: &str) -> bool {
        let Some(idx) = self.handles.iter().position(|(n, _)| *n == name) else {
            return false;
        };
        let (_, mut handle) = self.handles.remove(idx);
        handle.dispose();
        true
    }

    pub fn cancel_all(&mut self) {
        for (_, mut handle) in self.handles.drain(..) {
            handle.dispose();
        }
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for TimerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.handles.iter().map(|(n, _)| *n).collect();
        f.debug_struct("TimerSet").field("active", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{Disposable, PollSchedule, TimerSet};
    use std::cell::Cell;
    use std::rc::Rc;

    struct Flag(Rc<Cell<u32>>);

    impl Disposable for Flag {
        fn dispose(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn replacing_a_named_timer_disposes_the_old_one() {
        let old = Rc::new(Cell::new(0));
        let new = Rc::new(Cell::new(0));
        let mut timers = TimerSet::new();
        timers.insert("notifications", Box::new(Flag(old.clone())));
        timers.insert("notifications", Box::new(Flag(new.clone())));
        assert_eq!(old.get(), 1);
        assert_eq!(new.get(), 0);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn cancel_all_and_drop_dispose_everything_once() {
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        {
            let mut timers = TimerSet::new();
            timers.insert("a", Box::new(Flag(a.clone())));
            timers.insert("b", Box::new(Flag(b.clone())));
            assert!(timers.cancel("a"));
            assert!(!timers.cancel("a"));
            assert!(timers.is_active("b"));
        }
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn poll_schedule_defaults_to_immediate_first_tick() {
        let s = PollSchedule::every("markers", 30_000);
        assert!(s.fire_immediately);
        assert_eq!(s.interval_ms, 30_000);
    }
}
