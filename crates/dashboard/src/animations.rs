//! Decorative background effects for the landing page.
//!
//! Everything is driven by [`WeatherAnimations::tick`], which the page calls
//! on a short interval; deadlines are read from the injected clock and all
//! randomness comes from [`Clock::random`].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::env::Clock;
use crate::ui::Ui;

pub const BACKGROUND: &str = "weather-background";

pub const FIRST_THUNDER_MS: i64 = 5_000;
pub const THUNDER_MIN_GAP_MS: f64 = 8_000.0;
pub const THUNDER_GAP_SPREAD_MS: f64 = 7_000.0;
pub const FLASH_MS: i64 = 300;

pub const LEAF_COUNT: usize = 3;
pub const PARTICLE_COUNT: usize = 5;
pub const SNOWFLAKE_COUNT: usize = 20;

pub const RAIN_EVERY_MS: i64 = 50;
pub const RAIN_LIFETIME_MS: i64 = 3_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Season {
    Winter,
    Autumn,
    Spring,
    Summer,
}

impl Season {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "winter" => Some(Season::Winter),
            "autumn" => Some(Season::Autumn),
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            _ => None,
        }
    }
}

fn leaf_html(clock: &dyn Clock) -> String {
    format!(
        r#"<div class="absolute w-3 h-3 bg-green-400 rounded-full floating-leaf opacity-60" style="left: {:.1}%; top: {:.1}%; animation-delay: {:.2}s; animation-duration: {:.2}s"></div>"#,
        clock.random() * 80.0 + 10.0,
        clock.random() * 60.0 + 20.0,
        clock.random() * 3.0,
        clock.random() * 3.0 + 6.0,
    )
}

fn particle_html(clock: &dyn Clock) -> String {
    format!(
        r#"<div class="absolute w-1 h-1 bg-white rounded-full opacity-40" style="left: {:.1}%; top: {:.1}%; animation: float {:.2}s ease-in-out infinite; animation-delay: {:.2}s"></div>"#,
        clock.random() * 100.0,
        clock.random() * 100.0,
        clock.random() * 2.0 + 4.0,
        clock.random() * 2.0,
    )
}

fn snowflake_html(clock: &dyn Clock) -> String {
    format!(
        r#"<div class="absolute w-2 h-2 bg-white rounded-full opacity-80" style="left: {:.1}%; animation: rain {:.2}s linear infinite; animation-delay: {:.2}s"></div>"#,
        clock.random() * 100.0,
        clock.random() * 3.0 + 2.0,
        clock.random() * 2.0,
    )
}

/// A rain drop: 15 to 35 px long, falling for 1 to 3 s.
fn raindrop_html(clock: &dyn Clock) -> String {
    format!(
        r#"<div class="rain-drop absolute w-0.5 bg-blue-200 opacity-60" style="left: {:.1}%; height: {:.0}px; animation: rain {:.2}s linear"></div>"#,
        clock.random() * 100.0,
        clock.random() * 20.0 + 15.0,
        clock.random() * 2.0 + 1.0,
    )
}

#[derive(Debug, Default)]
struct AnimationState {
    flash: Option<String>,
    flashing_until: Option<i64>,
    next_thunder_at: Option<i64>,
    raining: bool,
    next_drop_at: i64,
    drops: Vec<(String, i64)>,
}

pub struct WeatherAnimations {
    ui: Rc<dyn Ui>,
    clock: Rc<dyn Clock>,
    state: RefCell<AnimationState>,
}

impl WeatherAnimations {
    pub fn new(ui: Rc<dyn Ui>, clock: Rc<dyn Clock>) -> Self {
        Self {
            ui,
            clock,
            state: RefCell::new(AnimationState::default()),
        }
    }

    /// Adds the flash overlay and floating decorations, and arms the first
    /// thunder clap.
    pub fn start(&self) {
        let now = self.clock.now_ms();
        let flash = self
            .ui
            .append_html(BACKGROUND, r#"<div class="thunder-flash"></div>"#);
        if flash.is_none() {
            debug!("no animated background on this page");
            return;
        }
        {
            let mut state = self.state.borrow_mut();
            state.flash = flash;
            state.next_thunder_at = Some(now + FIRST_THUNDER_MS);
        }
        self.scatter(LEAF_COUNT, leaf_html);
        self.scatter(PARTICLE_COUNT, particle_html);
    }

    fn scatter(&self, count: usize, render: fn(&dyn Clock) -> String) {
        for _ in 0..count {
            let html = render(self.clock.as_ref());
            self.ui.append_html(BACKGROUND, &html);
        }
    }

    pub fn set_season(&self, season: Season) {
        match season {
            Season::Winter => self.scatter(SNOWFLAKE_COUNT, snowflake_html),
            other => debug!(?other, "no seasonal effect"),
        }
    }

    pub fn set_raining(&self, on: bool) {
        let now = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        state.raining = on;
        state.next_drop_at = now;
    }

    pub fn is_flashing(&self) -> bool {
        self.state.borrow().flashing_until.is_some()
    }

    pub fn next_thunder_at(&self) -> Option<i64> {
        self.state.borrow().next_thunder_at
    }

    pub fn drop_count(&self) -> usize {
        self.state.borrow().drops.len()
    }

    /// Lights the flash overlay unless it is already lit.
    pub fn trigger_thunder(&self) -> bool {
        let now = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        if state.flashing_until.is_some() {
            return false;
        }
        let Some(flash) = state.flash.clone() else {
            return false;
        };
        self.ui.set_class(&flash, "active", true);
        state.flashing_until = Some(now + FLASH_MS);
        true
    }

    pub fn tick(&self) {
        let now = self.clock.now_ms();

        let flash_done = {
            let mut state = self.state.borrow_mut();
            match state.flashing_until {
                Some(until) if now >= until => {
                    state.flashing_until = None;
                    state.flash.clone()
                }
                _ => None,
            }
        };
        if let Some(flash) = flash_done {
            self.ui.set_class(&flash, "active", false);
        }

        let thunder_due = matches!(self.next_thunder_at(), Some(at) if now >= at);
        if thunder_due {
            self.trigger_thunder();
            let gap = THUNDER_MIN_GAP_MS + self.clock.random() * THUNDER_GAP_SPREAD_MS;
            self.state.borrow_mut().next_thunder_at = Some(now + gap as i64);
        }

        self.rain(now);
    }

    fn rain(&self, now: i64) {
        let expired: Vec<String> = {
            let mut state = self.state.borrow_mut();
            let (gone, live): (Vec<_>, Vec<_>) =
                state.drops.drain(..).partition(|(_, until)| now >= *until);
            state.drops = live;
            gone.into_iter().map(|(node, _)| node).collect()
        };
        for node in expired {
            self.ui.remove_node(&node);
        }

        loop {
            {
                let state = self.state.borrow();
                if !state.raining || now < state.next_drop_at {
                    break;
                }
            }
            let html = raindrop_html(self.clock.as_ref());
            let node = self.ui.append_html(BACKGROUND, &html);
            let mut state = self.state.borrow_mut();
            state.next_drop_at += RAIN_EVERY_MS;
            if let Some(node) = node {
                state.drops.push((node, now + RAIN_LIFETIME_MS));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use pretty_assertions::assert_eq;

    fn animations(clock: FakeClock) -> (Rc<FakeUi>, Rc<FakeClock>, WeatherAnimations) {
        let ui = Rc::new(FakeUi::new());
        let clock = Rc::new(clock);
        let anim = WeatherAnimations::new(ui.clone(), clock.clone());
        (ui, clock, anim)
    }

    #[test]
    fn start_scatters_decorations() {
        let (ui, _, anim) = animations(FakeClock::at_ms(NOW_MS));
        anim.start();
        // flash overlay, leaves and particles
        assert_eq!(ui.nodes(BACKGROUND).len(), 1 + LEAF_COUNT + PARTICLE_COUNT);
        assert_eq!(anim.next_thunder_at(), Some(NOW_MS + FIRST_THUNDER_MS));

        anim.set_season(Season::Winter);
        assert_eq!(ui.nodes(BACKGROUND).len(), 1 + LEAF_COUNT + PARTICLE_COUNT + SNOWFLAKE_COUNT);
        anim.set_season(Season::Summer);
        assert_eq!(ui.nodes(BACKGROUND).len(), 1 + LEAF_COUNT + PARTICLE_COUNT + SNOWFLAKE_COUNT);
    }

    #[test]
    fn missing_background_disables_everything() {
        let ui = Rc::new(FakeUi::new().without(&[BACKGROUND]));
        let anim = WeatherAnimations::new(ui.clone(), Rc::new(FakeClock::at_ms(NOW_MS)));
        anim.start();
        assert_eq!(anim.next_thunder_at(), None);
        assert!(!anim.trigger_thunder());
    }

    #[test]
    fn thunder_schedule_and_flash() {
        // Four randoms per decoration go to placement; the next one picks the
        // thunder gap.
        let placement = [0.5; 4 * LEAF_COUNT + 4 * PARTICLE_COUNT];
        let mut randoms = placement.to_vec();
        randoms.push(1.0);
        let (ui, clock, anim) = animations(FakeClock::at_ms(NOW_MS).with_randoms(&randoms));
        anim.start();
        let flash = "node-1";

        clock.advance_ms(4_999);
        anim.tick();
        assert!(!anim.is_flashing());

        clock.advance_ms(1);
        anim.tick();
        assert!(anim.is_flashing());
        assert!(ui.has_class(flash, "active"));
        assert_eq!(anim.next_thunder_at(), Some(NOW_MS + 5_000 + 15_000));

        assert!(!anim.trigger_thunder());

        clock.advance_ms(FLASH_MS);
        anim.tick();
        assert!(!anim.is_flashing());
        assert!(!ui.has_class(flash, "active"));
    }

    #[test]
    fn rain_drops_fall_and_expire() {
        let (ui, clock, anim) = animations(FakeClock::at_ms(NOW_MS));
        anim.start();
        let decorations = ui.nodes(BACKGROUND).len();

        anim.set_raining(true);
        anim.tick();
        assert_eq!(anim.drop_count(), 1);
        let drop = ui.nodes(BACKGROUND).pop().unwrap();
        assert!(drop.contains("height: 25px"));
        assert!(drop.contains("animation: rain 2.00s"));

        clock.advance_ms(RAIN_EVERY_MS * 4);
        anim.tick();
        assert_eq!(anim.drop_count(), 5);

        clock.advance_ms(RAIN_LIFETIME_MS);
        anim.set_raining(false);
        anim.tick();
        assert_eq!(anim.drop_count(), 0);
        assert_eq!(ui.nodes(BACKGROUND).len(), decorations);
    }
}
